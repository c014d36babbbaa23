//! Command-line argument parsing.

use clap::Parser;

use crate::params::{AnalyzerConfig, RenderConfig, VisualizerConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Ringwave")]
#[command(about = "Circular audio visualizer", long_about = None)]
pub struct Args {
    /// Window width in pixels
    #[arg(long, value_name = "PIXELS", default_value = "800")]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, value_name = "PIXELS", default_value = "800")]
    pub height: u32,

    /// Maximum redraw rate (frames per second)
    #[arg(long, value_name = "FPS", default_value = "120")]
    pub fps_cap: f32,

    /// Loudness gain applied to the input signal's RMS
    #[arg(long, value_name = "GAIN", default_value = "4.0")]
    pub gain: f32,
}

impl Args {
    /// Build rendering configuration from command-line arguments
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
        }
    }

    /// Build visualizer configuration from command-line arguments
    pub fn visualizer_config(&self) -> VisualizerConfig {
        let mut config = VisualizerConfig::default();
        if self.fps_cap > 0.0 {
            config.max_fps = self.fps_cap;
        } else {
            eprintln!("Warning: fps cap must be positive, using {}", config.max_fps);
        }
        config
    }

    /// Build analyzer configuration from command-line arguments
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            loudness_gain: self.gain,
            ..AnalyzerConfig::default()
        }
    }
}
