//! Offline tempo estimation over a decoded buffer, and a beat grid for
//! mapping the playback timeline onto beat numbers and phases.

use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::audio::AudioBuffer;

use super::hann_window;

const FFT_SIZE: usize = 2048;
const HOP_SIZE: usize = 1024;
/// Fallback when too few onsets are found to vote on an interval.
pub const DEFAULT_BPM: f32 = 120.0;

/// Result of scanning a decoded buffer for tempo.
#[derive(Clone, Debug)]
pub struct TempoEstimate {
    pub bpm: f32,
    /// Onset times in seconds, in ascending order.
    pub beat_times: Vec<f32>,
}

/// Estimate tempo from spectral-flux onsets across the whole buffer.
pub fn estimate(buffer: &AudioBuffer) -> TempoEstimate {
    let sample_rate = buffer.sample_rate();
    let frames = buffer.frames();
    if sample_rate == 0 || frames < FFT_SIZE {
        return TempoEstimate {
            bpm: DEFAULT_BPM,
            beat_times: Vec::new(),
        };
    }

    let hann = hann_window(FFT_SIZE);
    let positions: Vec<usize> = (0..)
        .map(|i| i * HOP_SIZE)
        .take_while(|pos| pos + FFT_SIZE <= frames)
        .collect();

    // Magnitude spectrum per hop; planners are per task (rayon-safe)
    let spectra: Vec<Vec<f32>> = positions
        .par_iter()
        .map(|&pos| {
            let mut frame = vec![0.0f32; FFT_SIZE];
            buffer.fill_mono_window(pos, &mut frame);
            let mut fft_input: Vec<Complex<f32>> = frame
                .iter()
                .enumerate()
                .map(|(i, &s)| Complex::new(s * hann[i], 0.0))
                .collect();
            let mut planner = FftPlanner::<f32>::new();
            let fft = planner.plan_fft_forward(FFT_SIZE);
            fft.process(&mut fft_input);
            fft_input[..FFT_SIZE / 2].iter().map(|c| c.norm()).collect()
        })
        .collect();

    // Spectral flux between consecutive hops (positive changes only)
    let mut flux_values: Vec<(f32, f32)> = Vec::with_capacity(spectra.len());
    let mut prev = vec![0.0f32; FFT_SIZE / 2];
    for (idx, spectrum) in spectra.iter().enumerate() {
        let flux: f32 = spectrum
            .iter()
            .zip(prev.iter())
            .map(|(cur, p)| (cur - p).max(0.0))
            .sum();
        let time = (idx * HOP_SIZE) as f32 / sample_rate as f32;
        flux_values.push((time, flux));
        prev.clone_from(spectrum);
    }

    let beat_times = detect_onsets(&flux_values);
    let bpm = vote_interval(&beat_times);
    log::info!("tempo estimate: {:.1} BPM from {} onsets", bpm, beat_times.len());

    TempoEstimate { bpm, beat_times }
}

/// Adaptive-threshold peak picking over the flux curve.
fn detect_onsets(flux_values: &[(f32, f32)]) -> Vec<f32> {
    if flux_values.is_empty() {
        return Vec::new();
    }

    let window = 20; // ~200ms of hops on either side
    let mut onsets = Vec::new();

    for i in 0..flux_values.len() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(flux_values.len());
        let local_mean: f32 =
            flux_values[start..end].iter().map(|(_, f)| f).sum::<f32>() / (end - start) as f32;

        let threshold = local_mean * 1.5 + 0.01;
        if flux_values[i].1 <= threshold {
            continue;
        }

        let is_peak = (i == 0 || flux_values[i].1 >= flux_values[i - 1].1)
            && (i == flux_values.len() - 1 || flux_values[i].1 >= flux_values[i + 1].1);

        // 100ms refractory gap between onsets
        let far_enough = onsets
            .last()
            .map_or(true, |&last: &f32| flux_values[i].0 - last > 0.1);

        if is_peak && far_enough {
            onsets.push(flux_values[i].0);
        }
    }

    onsets
}

/// Median inter-onset interval, restricted to the 60-200 BPM range.
fn vote_interval(beat_times: &[f32]) -> f32 {
    if beat_times.len() < 2 {
        return DEFAULT_BPM;
    }

    let mut reasonable: Vec<f32> = beat_times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&i| (0.3..=1.0).contains(&i))
        .collect();

    if reasonable.is_empty() {
        return DEFAULT_BPM;
    }

    reasonable.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = reasonable[reasonable.len() / 2];
    60.0 / median
}

/// Position within a fixed-tempo beat grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Beat {
    /// Zero-based beat count since the start of the track.
    pub number: u64,
    /// Progress through the current beat, in [0, 1).
    pub phase: f32,
}

/// Maps playback timestamps onto a fixed-tempo grid. A pure function of the
/// timeline: no timers, no state to leak — the caller already polls every
/// frame.
#[derive(Clone, Copy, Debug)]
pub struct BeatGrid {
    seconds_per_beat: f64,
}

impl BeatGrid {
    pub fn new(bpm: f32) -> Self {
        let bpm = if bpm.is_finite() && bpm > 0.0 {
            bpm
        } else {
            DEFAULT_BPM
        };
        Self {
            seconds_per_beat: 60.0 / f64::from(bpm),
        }
    }

    pub fn seconds_per_beat(&self) -> f64 {
        self.seconds_per_beat
    }

    pub fn beat_at(&self, seconds: f64) -> Beat {
        let beats = seconds.max(0.0) / self.seconds_per_beat;
        Beat {
            number: beats.floor() as u64,
            phase: beats.fract() as f32,
        }
    }
}
