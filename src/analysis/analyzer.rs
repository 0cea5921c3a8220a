use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::config::AnalyzerConfig;

use super::hann_window;

/// Byte-magnitude ceiling of a frequency snapshot bin.
const MAX_MAGNITUDE: f32 = 255.0;
/// dB floor/ceiling mapped onto the 0..=255 magnitude range.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Normalized energies for the three perceptual bands, each in [0, 1].
///
/// The bands map roughly to kick/bass, mid-range instrumentation, and
/// cymbals/transients: three cheap modulation signals for the visual layer
/// instead of raw spectral data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BandEnergy {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

/// Read-only view of the live playback state the analyzer samples each tick.
pub trait SpectrumTap {
    /// Whether audio is currently playing; inactive taps are never read.
    fn is_active(&self) -> bool;

    fn sample_rate(&self) -> u32;

    /// Fill `out` with mono samples around the playhead. Returns false when
    /// no audio is loaded.
    fn fill_window(&self, out: &mut [f32]) -> bool;
}

/// Converts a frequency snapshot of the playing audio into smoothed
/// low/mid/high band energies, once per `update` call.
///
/// Band boundaries and FFT size are fixed at construction. The snapshot is a
/// fixed-length array of 8-bit magnitudes whose bins map linearly onto
/// `0..sample_rate/2`; it is overwritten in place on every update.
pub struct FrequencyAnalyzer {
    config: AnalyzerConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    frame: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    snapshot: Vec<u8>,
    bands: BandEnergy,
}

impl FrequencyAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let fft_size = config.fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft,
            window: hann_window(fft_size),
            frame: vec![0.0; fft_size],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            snapshot: vec![0; fft_size / 2],
            bands: BandEnergy::default(),
            config,
        }
    }

    /// The band energies computed by the most recent `update`.
    pub fn band_energy(&self) -> BandEnergy {
        self.bands
    }

    /// The most recent frequency snapshot (one byte per bin).
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }

    /// Refresh the snapshot and band energies from the tap.
    ///
    /// No-op while the tap is inactive, so the last computed energies stay
    /// stable instead of collapsing on a stopped graph; also a no-op when
    /// the tap reports no sample rate or no audio.
    pub fn update(&mut self, tap: &impl SpectrumTap) {
        if !tap.is_active() {
            return;
        }
        let sample_rate = tap.sample_rate();
        if sample_rate == 0 || self.snapshot.is_empty() {
            return;
        }
        if !tap.fill_window(&mut self.frame) {
            return;
        }
        self.capture_snapshot();
        self.bands = compute_bands(&self.snapshot, sample_rate, &self.config);
    }

    fn capture_snapshot(&mut self) {
        let n = self.frame.len();
        for i in 0..n {
            self.scratch[i] = Complex::new(self.frame[i] * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / n as f32;
        let tau = self.config.smoothing.clamp(0.0, 1.0);
        for (k, slot) in self.snapshot.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() * scale;
            let smoothed = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            self.smoothed[k] = smoothed;
            let db = 20.0 * smoothed.max(1e-12).log10();
            let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB) * MAX_MAGNITUDE;
            *slot = scaled.clamp(0.0, MAX_MAGNITUDE) as u8;
        }
    }
}

/// Average the snapshot over each band's inclusive bin range and normalize
/// by the maximum byte magnitude.
///
/// Bin index for a threshold f is `floor(f * N / sample_rate)`; the high
/// band runs from its threshold up to the last bin (Nyquist).
fn compute_bands(snapshot: &[u8], sample_rate: u32, config: &AnalyzerConfig) -> BandEnergy {
    let n = snapshot.len();
    if n == 0 || sample_rate == 0 {
        return BandEnergy::default();
    }
    let bin = |hz: f32| ((hz * n as f32) / sample_rate as f32).floor() as usize;

    let low_start = bin(config.low_hz);
    let mid_start = bin(config.mid_hz);
    let high_start = bin(config.high_hz);

    BandEnergy {
        low: normalize(range_average(snapshot, low_start, mid_start.saturating_sub(1))),
        mid: normalize(range_average(snapshot, mid_start, high_start.saturating_sub(1))),
        high: normalize(range_average(snapshot, high_start, n - 1)),
    }
}

fn range_average(snapshot: &[u8], start: usize, end: usize) -> f32 {
    if start > end || end >= snapshot.len() {
        return 0.0;
    }
    let sum: u32 = snapshot[start..=end].iter().map(|&v| u32::from(v)).sum();
    sum as f32 / (end - start + 1) as f32
}

fn normalize(value: f32) -> f32 {
    let v = value / MAX_MAGNITUDE;
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    struct FakeTap {
        active: bool,
        sample_rate: u32,
        samples: Vec<f32>,
    }

    impl SpectrumTap for FakeTap {
        fn is_active(&self) -> bool {
            self.active
        }
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }
        fn fill_window(&self, out: &mut [f32]) -> bool {
            out.fill(0.0);
            if self.samples.is_empty() {
                return false;
            }
            for (slot, s) in out.iter_mut().zip(self.samples.iter()) {
                *slot = *s;
            }
            true
        }
    }

    fn sine_tap(freq_hz: f32, sample_rate: u32, len: usize) -> FakeTap {
        let samples = (0..len)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate as f32).sin() * 0.8
            })
            .collect();
        FakeTap {
            active: true,
            sample_rate,
            samples,
        }
    }

    #[test]
    fn saturated_snapshot_normalizes_to_one() {
        let bands = compute_bands(&[255u8; 1024], 44100, &config());
        assert_relative_eq!(bands.low, 1.0, epsilon = 1e-6);
        assert_relative_eq!(bands.mid, 1.0, epsilon = 1e-6);
        assert_relative_eq!(bands.high, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn silent_snapshot_normalizes_to_zero() {
        let bands = compute_bands(&[0u8; 1024], 44100, &config());
        assert_eq!(bands, BandEnergy::default());
    }

    #[test]
    fn empty_snapshot_and_zero_rate_are_harmless() {
        assert_eq!(compute_bands(&[], 44100, &config()), BandEnergy::default());
        assert_eq!(
            compute_bands(&[128u8; 1024], 0, &config()),
            BandEnergy::default()
        );
    }

    #[test]
    fn degenerate_thresholds_yield_zero_not_nan() {
        // All three thresholds in the same bin: low and mid ranges are empty
        let mut cfg = config();
        cfg.low_hz = 100.0;
        cfg.mid_hz = 100.0;
        cfg.high_hz = 100.0;
        let bands = compute_bands(&[200u8; 1024], 44100, &cfg);
        assert_eq!(bands.low, 0.0);
        assert_eq!(bands.mid, 0.0);
        assert!(bands.high > 0.0);
    }

    #[test]
    fn update_is_noop_while_inactive() {
        let mut analyzer = FrequencyAnalyzer::new(config());
        let mut tap = sine_tap(100.0, 44100, 2048);
        analyzer.update(&tap);
        let playing = analyzer.band_energy();
        assert!(playing.low > 0.0);

        tap.active = false;
        analyzer.update(&tap);
        // Last energies stay stable on a stopped graph
        assert_eq!(analyzer.band_energy(), playing);
    }

    #[test]
    fn update_is_noop_without_sample_rate() {
        let mut analyzer = FrequencyAnalyzer::new(config());
        let tap = FakeTap {
            active: true,
            sample_rate: 0,
            samples: vec![0.5; 2048],
        };
        analyzer.update(&tap);
        assert_eq!(analyzer.band_energy(), BandEnergy::default());
    }

    #[test]
    fn bass_sine_lands_in_low_band() {
        let mut analyzer = FrequencyAnalyzer::new(config());
        let tap = sine_tap(100.0, 44100, 2048);
        // A few updates so the time smoothing settles
        for _ in 0..8 {
            analyzer.update(&tap);
        }
        let bands = analyzer.band_energy();
        assert!(bands.low > bands.high);
        assert!(bands.low > 0.3);
    }

    #[test]
    fn hiss_sine_lands_in_high_band() {
        let mut analyzer = FrequencyAnalyzer::new(config());
        let tap = sine_tap(8000.0, 44100, 2048);
        for _ in 0..8 {
            analyzer.update(&tap);
        }
        let bands = analyzer.band_energy();
        assert!(bands.high > bands.low);
    }
}
