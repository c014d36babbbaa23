//! Ring geometry for the visualizer disc and outline.
//!
//! The ring is generated once at startup and never mutated; the vertex stage
//! deforms it per-frame from the loudness and frequency buffers.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::params::ring_constants::{FREQUENCY_BIN_COUNT, RING_SAMPLES, RING_VERTEX_COUNT};

/// Vertex data for the ring mesh (position in normalized device space)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
}

/// Outward displacement per unit of bin magnitude (matches shader.wgsl)
pub const FREQUENCY_DISPLACEMENT_SCALE: f32 = 0.1;

/// Generate the ring vertex set.
///
/// Walks the unit circle in 0.5-degree steps (721 samples, closing the loop
/// at 360 degrees) and drops an origin point after every second edge sample,
/// so the sequence draws as a filled disc with a triangle strip and as the
/// outline with a line strip over the same data.
pub fn generate_ring() -> Vec<Vertex> {
    let origin = Vertex {
        position: [0.0, 0.0],
    };

    let mut vertices = Vec::with_capacity(RING_VERTEX_COUNT);
    for i in 0..RING_SAMPLES {
        let angle = (i as f32 * 0.5).to_radians();
        let position = Vec2::new(angle.cos(), angle.sin());
        vertices.push(Vertex {
            position: position.to_array(),
        });
        if (i + 1) % 2 == 0 {
            vertices.push(origin);
        }
    }

    vertices
}

/// Ring edge sample index for a vertex index, undoing the origin interleave.
/// Only meaningful for non-origin vertices (index % 3 != 2); matches the
/// index arithmetic in shader.wgsl.
pub fn edge_sample_for_vertex(vertex_index: usize) -> usize {
    vertex_index - vertex_index / 3
}

/// Analyzer bin read by ring edge sample `k` (two samples share a bin)
pub fn bin_for_sample(sample: usize) -> usize {
    (sample / 2).min(FREQUENCY_BIN_COUNT - 1)
}

/// Radius the vertex stage applies to edge samples: loudness plus the
/// per-bin outward displacement. CPU mirror of shader.wgsl, used by tests
/// to rasterize the deformation without a GPU.
pub fn displaced_radius(loudness: f32, bin_magnitude: f32) -> f32 {
    loudness + bin_magnitude * FREQUENCY_DISPLACEMENT_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: [f32; 2] = [0.0, 0.0];

    #[test]
    fn test_ring_vertex_count() {
        let ring = generate_ring();
        assert_eq!(ring.len(), RING_VERTEX_COUNT);
        assert_eq!(ring.len(), 1081);
    }

    #[test]
    fn test_every_third_vertex_is_origin() {
        let ring = generate_ring();
        for (i, vertex) in ring.iter().enumerate() {
            if i % 3 == 2 {
                assert_eq!(vertex.position, ORIGIN, "vertex {} should be origin", i);
            } else {
                assert_ne!(vertex.position, ORIGIN, "vertex {} should be on the ring", i);
            }
        }
    }

    #[test]
    fn test_ring_closes_on_first_sample() {
        let ring = generate_ring();

        // Sample 720 sits at 360 degrees, wrapping onto sample 0
        let first = ring[0].position;
        let last = ring[ring.len() - 1].position;
        assert!((first[0] - last[0]).abs() < 1e-4);
        assert!((first[1] - last[1]).abs() < 1e-4);
    }

    #[test]
    fn test_edge_samples_on_unit_circle() {
        let ring = generate_ring();
        for (i, vertex) in ring.iter().enumerate() {
            if i % 3 == 2 {
                continue;
            }
            let [x, y] = vertex.position;
            let radius = (x * x + y * y).sqrt();
            assert!((radius - 1.0).abs() < 1e-5, "vertex {} off the circle", i);
        }
    }

    #[test]
    fn test_edge_sample_mapping_round_trip() {
        // Non-origin vertex indices recover consecutive edge samples
        let edge_indices: Vec<usize> = (0..RING_VERTEX_COUNT).filter(|i| i % 3 != 2).collect();
        assert_eq!(edge_indices.len(), RING_SAMPLES);
        for (sample, &vertex_index) in edge_indices.iter().enumerate() {
            assert_eq!(edge_sample_for_vertex(vertex_index), sample);
        }
    }

    #[test]
    fn test_loudness_scales_radius_linearly() {
        let quiet = displaced_radius(0.0, 0.0);
        let half = displaced_radius(0.5, 0.0);
        let full = displaced_radius(1.0, 0.0);
        assert_eq!(quiet, 0.0);
        assert_eq!(full, 2.0 * half);
        assert_eq!(full, 1.0);
    }

    #[test]
    fn test_zero_spectrum_renders_perfect_circle() {
        let ring = generate_ring();
        let spectrum = [0.0f32; FREQUENCY_BIN_COUNT];

        let mut radii = ring
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 3 != 2)
            .map(|(i, v)| {
                let bin = bin_for_sample(edge_sample_for_vertex(i));
                let r = displaced_radius(0.7, spectrum[bin]);
                let [x, y] = v.position;
                (x * x + y * y).sqrt() * r
            });
        let first = radii.next().unwrap();
        assert!(radii.all(|r| (r - first).abs() < 1e-5));
    }

    #[test]
    fn test_spiked_bin_bumps_matching_samples_only() {
        let spiked_bin = 100;
        let mut spectrum = [0.0f32; FREQUENCY_BIN_COUNT];
        spectrum[spiked_bin] = 1.0;

        let base = displaced_radius(0.5, 0.0);
        for sample in 0..RING_SAMPLES {
            let r = displaced_radius(0.5, spectrum[bin_for_sample(sample)]);
            if sample / 2 == spiked_bin {
                assert!(r > base, "sample {} should bulge outward", sample);
                assert!((r - (base + FREQUENCY_DISPLACEMENT_SCALE)).abs() < 1e-6);
            } else {
                assert_eq!(r, base, "sample {} should stay on the base circle", sample);
            }
        }
    }
}
