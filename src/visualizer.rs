//! Frame pacing and submission for the ring visualizer.
//!
//! Decouples the audio producer's update cadence from GPU frame submission:
//! buffer writes happen synchronously on the caller's thread, redraw requests
//! are coalesced to a bounded rate, and a dedicated render thread keeps at
//! most one frame in flight.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::params::VisualizerConfig;
use crate::rendering::RenderSystem;

/// Binary token bounding GPU work to one frame in flight.
///
/// Acquired by the render thread before encoding; released from the
/// completion callback the queue fires when that frame's GPU work is done.
/// There is no blocking acquire: a waiter must poll the device between
/// attempts so the completion callback can actually fire.
pub struct FrameToken {
    available: Mutex<u32>,
}

impl FrameToken {
    pub fn new() -> Self {
        Self {
            available: Mutex::new(1),
        }
    }

    /// Take the token if it is free; false means a frame is still in flight
    pub fn try_acquire(&self) -> bool {
        let mut count = self.available.lock().unwrap();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    /// Return the token; count may never exceed one
    pub fn release(&self) {
        let mut count = self.available.lock().unwrap();
        *count += 1;
        debug_assert!(*count <= 1, "frame token released twice");
    }
}

impl Default for FrameToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts an unbounded stream of redraw requests into a bounded stream of
/// draw dispatches.
///
/// This is a rate limiter, not a work queue: a request landing inside the
/// minimum frame period is dropped, and bursts collapse to the latest state
/// because each draw re-reads the current buffer contents.
pub struct FramePacer {
    min_frame_period: Duration,
    last_dispatch: Mutex<Option<Instant>>,
    draws: Sender<()>,
}

impl FramePacer {
    pub fn new(min_frame_period: Duration, draws: Sender<()>) -> Self {
        Self {
            min_frame_period,
            last_dispatch: Mutex::new(None),
            draws,
        }
    }

    /// Request a redraw; dispatches to the render thread unless the previous
    /// dispatch was less than one frame period ago. Never blocks on rendering.
    pub fn request_draw(&self) {
        let mut last = self.last_dispatch.lock().unwrap();
        let now = Instant::now();
        if let Some(previous) = *last {
            if now.duration_since(previous) < self.min_frame_period {
                return;
            }
        }
        *last = Some(now);

        // Render thread gone means shutdown; nothing left to draw to
        let _ = self.draws.send(());
    }
}

/// Core visualizer: GPU buffers, frame pacing, and the render thread.
///
/// Setters are callable from any thread at any rate. The copy into GPU
/// memory happens on the caller's thread before the redraw dispatch, so
/// updates made before a dispatch are visible to that frame.
pub struct Visualizer {
    render_system: Arc<RenderSystem>,
    pacer: FramePacer,
    _render_thread: thread::JoinHandle<()>,
}

impl Visualizer {
    /// Start the render thread and draw a first frame
    pub fn new(render_system: Arc<RenderSystem>, config: &VisualizerConfig) -> Self {
        let (draws, draw_requests) = mpsc::channel();
        let token = Arc::new(FrameToken::new());
        let render_thread = spawn_render_thread(Arc::clone(&render_system), token, draw_requests);
        let pacer = FramePacer::new(config.min_frame_period(), draws);

        let visualizer = Self {
            render_system,
            pacer,
            _render_thread: render_thread,
        };
        visualizer.request_draw();
        visualizer
    }

    /// Overwrite the loudness scalar and schedule a redraw
    pub fn set_loudness(&self, value: f32) {
        self.render_system.update_loudness(value);
        self.pacer.request_draw();
    }

    /// Upload the fixed analyzer window and schedule a redraw.
    ///
    /// `spectrum` must hold at least `MIN_SPECTRUM_LEN` bins; shorter input
    /// panics (producer contract).
    pub fn set_frequencies(&self, spectrum: &[f32]) {
        self.render_system.update_frequencies(spectrum);
        self.pacer.request_draw();
    }

    /// Schedule a redraw without new data (host expose events)
    pub fn request_draw(&self) {
        self.pacer.request_draw();
    }
}

/// Spawn the dedicated render thread.
///
/// Each dispatch acquires the frame token before encoding; while the previous
/// frame is still in flight the device is polled so its completion callback
/// can fire and release the token. Frames that cannot acquire a drawable are
/// skipped without retry.
fn spawn_render_thread(
    render_system: Arc<RenderSystem>,
    token: Arc<FrameToken>,
    draw_requests: Receiver<()>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("render".to_string())
        .spawn(move || {
            while draw_requests.recv().is_ok() {
                while !token.try_acquire() {
                    // Previous frame still in flight: wait for the GPU so the
                    // completion callback runs and releases the token
                    render_system.device.poll(wgpu::Maintain::Wait);
                }

                let completion_token = Arc::clone(&token);
                let result = render_system.render(move || completion_token.release());

                if let Err(e) = result {
                    // Nothing was submitted, so no callback will release it
                    token.release();
                    eprintln!("Frame skipped: {:?}", e);
                }
            }
        })
        .expect("Failed to spawn render thread")
}
