//! Parameter definitions with documented semantics.
//!
//! All magic numbers from the prototype are extracted here with:
//! - Documented ranges and meanings
//! - Type safety where possible

use std::time::Duration;

use crate::params::ring_constants::MIN_SPECTRUM_LEN;

/// Ring geometry and GPU layout constants (compile-time, match shader.wgsl)
pub mod ring_constants {
    use std::ops::Range;

    /// Ring outline samples: one every 0.5 degrees, 0..=360 inclusive,
    /// so the loop closes on the sample where it started
    pub const RING_SAMPLES: usize = 721;

    /// Total vertex count: an origin point follows every second edge sample
    /// (360 origins), so consecutive triples form triangle-strip geometry
    pub const RING_VERTEX_COUNT: usize = RING_SAMPLES + RING_SAMPLES / 2;

    /// Analyzer bin window uploaded to the GPU on every spectrum update
    pub const FREQUENCY_SLICE: Range<usize> = 76..438;

    /// Bins held by the GPU-side frequency buffer (fixed at allocation)
    pub const FREQUENCY_BIN_COUNT: usize = FREQUENCY_SLICE.end - FREQUENCY_SLICE.start;

    /// Shortest spectrum the frequency setter accepts; anything shorter is a
    /// caller bug, not a runtime condition
    pub const MIN_SPECTRUM_LEN: usize = FREQUENCY_SLICE.end;
}

/// Visualizer pacing and initial-state parameters
#[derive(Debug, Clone)]
pub struct VisualizerConfig {
    /// Loudness uniform value before the first audio update arrives
    /// (normalized 0..1)
    pub default_loudness: f32,

    /// Maximum redraw rate (frames per second); requests arriving faster than
    /// this are coalesced, not queued
    pub max_fps: f32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            default_loudness: 0.3,
            max_fps: 120.0,
        }
    }
}

impl VisualizerConfig {
    /// Minimum wall-clock interval between two draw dispatches
    pub fn min_frame_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.max_fps)
    }
}

/// Audio capture and FFT analysis configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// FFT window size (must be power of 2)
    pub fft_size: usize,

    /// Analysis thread poll interval (milliseconds)
    pub update_interval_ms: u64,

    /// Scale factor applied to the RMS of the analysis window before
    /// clamping to 0..1
    pub loudness_gain: f32,

    /// Scale factor applied to normalized FFT magnitudes
    pub spectrum_gain: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            update_interval_ms: 16,
            loudness_gain: 4.0,
            spectrum_gain: 8.0,
        }
    }
}

impl AnalyzerConfig {
    /// Magnitude bins a single FFT pass produces (DC through Nyquist)
    pub fn spectrum_len(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Validate configuration (FFT size must be power of 2 and produce enough
    /// bins to cover the GPU frequency window)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.spectrum_len() < MIN_SPECTRUM_LEN {
            return Err(format!(
                "FFT size {} yields {} bins, need at least {}",
                self.fft_size,
                self.spectrum_len(),
                MIN_SPECTRUM_LEN
            ));
        }
        Ok(())
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ring_constants::*;
    use super::*;

    #[test]
    fn test_ring_constants_consistent() {
        // 721 edge samples plus one origin per odd sample
        assert_eq!(RING_VERTEX_COUNT, 1081);
        assert_eq!(FREQUENCY_BIN_COUNT, 362);
        assert_eq!(MIN_SPECTRUM_LEN, 438);
    }

    #[test]
    fn test_analyzer_config_default_covers_window() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.spectrum_len() >= MIN_SPECTRUM_LEN);
    }

    #[test]
    fn test_analyzer_config_rejects_non_power_of_two() {
        let config = AnalyzerConfig {
            fft_size: 1000,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_analyzer_config_rejects_short_spectrum() {
        // 512-point FFT yields 257 bins, short of the 438-bin window
        let config = AnalyzerConfig {
            fft_size: 512,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
