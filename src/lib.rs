//! Ringwave library - circular audio visualization

pub mod audio;
pub mod cli;
pub mod geometry;
pub mod params;
pub mod rendering;
pub mod visualizer;
