//! Per-tick frequency analysis and offline tempo estimation.

mod analyzer;
pub mod tempo;

pub use analyzer::{BandEnergy, FrequencyAnalyzer, SpectrumTap};

pub(crate) fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}
