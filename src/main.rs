//! Ringwave - a circular audio visualizer
//!
//! A ring of geometry pulses with overall loudness and deforms along its
//! outline with the frequency spectrum of whatever the default input device
//! hears, redrawn on the GPU at a bounded frame rate.

mod audio;
mod cli;
mod geometry;
mod params;
mod rendering;
mod visualizer;

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use audio::AudioSystem;
use clap::Parser;
use cli::Args;
use params::*;
use rendering::RenderSystem;
use visualizer::Visualizer;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    visualizer: Option<Arc<Visualizer>>,
    audio: Option<AudioSystem>,

    // Configuration
    render_config: RenderConfig,
    visualizer_config: VisualizerConfig,
    analyzer_config: AnalyzerConfig,
}

impl App {
    fn new(args: &Args) -> Self {
        Self {
            window: None,
            visualizer: None,
            audio: None,
            render_config: args.render_config(),
            visualizer_config: args.visualizer_config(),
            analyzer_config: args.analyzer_config(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Ringwave - Circular Audio Visualizer")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        // Ring geometry is generated before the render system exists: the
        // vertex buffer is sized from it
        let ring = geometry::generate_ring();

        // Initialize rendering system
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &ring,
            self.visualizer_config.default_loudness,
        ))
        .unwrap();

        // Start the render thread and frame pacer
        let visualizer = Arc::new(Visualizer::new(
            Arc::new(render_system),
            &self.visualizer_config,
        ));

        // Start audio capture feeding the visualizer
        let audio =
            AudioSystem::new(self.analyzer_config.clone(), Arc::clone(&visualizer)).unwrap();

        println!("\nRingwave is running!");
        println!("Press ESC to quit\n");

        self.window = Some(window);
        self.visualizer = Some(visualizer);
        self.audio = Some(audio);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                // Host expose events go through the pacer like any other
                // request; all redraw cadence comes from audio updates
                if let Some(ref visualizer) = self.visualizer {
                    visualizer.request_draw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    let args = Args::parse();

    println!("Ringwave - circular audio visualizer");
    println!("Initializing systems...\n");

    let mut app = App::new(&args);
    let event_loop = EventLoop::new().unwrap();
    let _ = event_loop.run_app(&mut app);
}
