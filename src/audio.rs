//! Audio capture and FFT analysis system.
//!
//! Captures the default input device with cpal and runs a real-time FFT
//! analysis thread that feeds the visualizer a loudness scalar and a full
//! magnitude spectrum, satisfying the renderer's inbound data contract
//! (spectrum of at least `MIN_SPECTRUM_LEN` bins).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::params::AnalyzerConfig;
use crate::visualizer::Visualizer;

/// Audio system managing capture and FFT analysis
pub struct AudioSystem {
    /// Audio input stream (kept alive)
    _stream: cpal::Stream,

    /// Analysis thread handle (optional, for cleanup)
    _analysis_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Create and start the audio system, feeding `visualizer` with loudness
    /// and spectrum updates at the analyzer's cadence
    pub fn new(config: AnalyzerConfig, visualizer: Arc<Visualizer>) -> Result<Self, String> {
        // Validate analyzer configuration
        config
            .validate()
            .map_err(|e| format!("Invalid analyzer config: {}", e))?;

        // Shared sample buffer between the capture callback and the analysis
        // thread
        let sample_buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let sample_buffer_capture = Arc::clone(&sample_buffer);

        // Setup audio input device
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or("No audio input device found")?;

        let stream_config = device
            .default_input_config()
            .map_err(|e| format!("Failed to get audio config: {}", e))?;

        println!(
            "Audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            stream_config.sample_rate().0
        );

        let channels = stream_config.channels() as usize;

        // Build audio input stream: accumulate the first channel as mono
        let stream = device
            .build_input_stream(
                &stream_config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mut samples = sample_buffer_capture.lock().unwrap();
                    for frame in data.chunks(channels) {
                        samples.push(frame[0]);
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| format!("Failed to build audio stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        // Start FFT analysis thread
        let analysis_thread = spawn_analysis_thread(config, sample_buffer, visualizer);

        Ok(Self {
            _stream: stream,
            _analysis_thread: Some(analysis_thread),
        })
    }
}

/// Spawn the FFT analysis thread.
///
/// Loudness is copied to the GPU before the spectrum so a frame dispatched by
/// either update sees data no older than one analysis pass.
fn spawn_analysis_thread(
    config: AnalyzerConfig,
    sample_buffer: Arc<Mutex<Vec<f32>>>,
    visualizer: Arc<Visualizer>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let mut fft_input = vec![Complex::new(0.0, 0.0); config.fft_size];
        let mut spectrum = vec![0.0f32; config.spectrum_len()];

        loop {
            thread::sleep(Duration::from_millis(config.update_interval_ms));

            let mut samples = sample_buffer.lock().unwrap();
            if samples.len() < config.fft_size {
                continue;
            }

            let loudness = (rms(&samples[..config.fft_size]) * config.loudness_gain).min(1.0);

            // Apply Hann window
            for i in 0..config.fft_size {
                let window = hann_window(i, config.fft_size);
                fft_input[i] = Complex::new(samples[i] * window, 0.0);
            }

            advance_capture_buffer(&mut samples, config.fft_size);
            drop(samples);

            fft.process(&mut fft_input);

            // Normalized magnitudes, DC through Nyquist
            for (bin, value) in spectrum.iter_mut().enumerate() {
                *value =
                    fft_input[bin].norm() * 2.0 / config.fft_size as f32 * config.spectrum_gain;
            }

            visualizer.set_loudness(loudness);
            visualizer.set_frequencies(&spectrum);
        }
    })
}

/// Advance the capture buffer past an analyzed window.
///
/// Drops half the window (50% overlap) plus any backlog beyond one window.
/// The capture callback delivers samples faster than one analysis pass
/// consumes them, so without the backlog drop the buffer grows without bound
/// and the analyzed window falls ever further behind real time.
fn advance_capture_buffer(samples: &mut Vec<f32>, fft_size: usize) {
    let excess = samples.len().saturating_sub(fft_size);
    samples.drain(0..fft_size / 2 + excess);
}

/// Hann window function for FFT analysis
fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Root-mean-square amplitude of a sample window
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window() {
        let size = 1024;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_advance_keeps_half_window_overlap() {
        let fft_size = 1024;
        let mut samples: Vec<f32> = (0..fft_size).map(|i| i as f32).collect();

        advance_capture_buffer(&mut samples, fft_size);

        // Second half of the analyzed window is retained for the next pass
        assert_eq!(samples.len(), fft_size / 2);
        assert_eq!(samples[0], (fft_size / 2) as f32);
    }

    #[test]
    fn test_capture_buffer_stays_bounded_under_fast_inflow() {
        let fft_size = 1024;
        let mut samples = Vec::new();

        // Device delivers more samples per pass than the overlap drain alone
        // would remove; backlog beyond one window must be discarded
        for _ in 0..50 {
            samples.extend(std::iter::repeat(0.1f32).take(1600));
            if samples.len() >= fft_size {
                advance_capture_buffer(&mut samples, fft_size);
            }
            assert!(samples.len() <= fft_size, "capture buffer grew to {}", samples.len());
        }
    }

    #[test]
    fn test_advance_discards_backlog_but_keeps_freshest_samples() {
        let fft_size = 1024;
        // Three windows' worth of backlog piled up
        let mut samples: Vec<f32> = (0..3 * fft_size).map(|i| i as f32).collect();
        let freshest = samples[samples.len() - 1];

        advance_capture_buffer(&mut samples, fft_size);

        assert_eq!(samples.len(), fft_size / 2);
        assert_eq!(samples[samples.len() - 1], freshest);
    }

    #[test]
    fn test_rms_of_silence_is_zero() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0.0; 256]), 0.0);
    }

    #[test]
    fn test_rms_of_constant_signal() {
        let samples = [0.5f32; 256];
        assert!((rms(&samples) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rms_of_sine_wave() {
        // RMS of a full-scale sine is 1/sqrt(2)
        let samples: Vec<f32> = (0..1024)
            .map(|i| (2.0 * PI * i as f32 / 64.0).sin())
            .collect();
        assert!((rms(&samples) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
    }
}
