use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Frequency-analysis settings, fixed at analyzer construction.
///
/// The three thresholds partition the spectrum: low = [low_hz, mid_hz),
/// mid = [mid_hz, high_hz), high = [high_hz, Nyquist].
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Lower edge of the low band in Hz: bass and kick drums.
    #[serde(default = "default_low_hz")]
    pub low_hz: f32,
    /// Low/mid boundary: snares, samples, melodic elements.
    #[serde(default = "default_mid_hz")]
    pub mid_hz: f32,
    /// Mid/high boundary: hi-hats, cymbals, upper harmonics.
    #[serde(default = "default_high_hz")]
    pub high_hz: f32,
    /// Time smoothing of bin magnitudes (0.0 = none, 1.0 = frozen).
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub looping: bool,
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            low_hz: default_low_hz(),
            mid_hz: default_mid_hz(),
            high_hz: default_high_hz(),
            smoothing: default_smoothing(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            looping: false,
            autoplay: default_autoplay(),
        }
    }
}

fn default_fft_size() -> usize { 2048 }
fn default_low_hz() -> f32 { 60.0 }
fn default_mid_hz() -> f32 { 600.0 }
fn default_high_hz() -> f32 { 6000.0 }
fn default_smoothing() -> f32 { 0.8 }
fn default_volume() -> f32 { 1.0 }
fn default_autoplay() -> bool { true }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_thresholds() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.fft_size, 2048);
        assert_eq!(cfg.low_hz, 60.0);
        assert_eq!(cfg.mid_hz, 600.0);
        assert_eq!(cfg.high_hz, 6000.0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [analyzer]
            low_hz = 80.0

            [playback]
            volume = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analyzer.low_hz, 80.0);
        assert_eq!(cfg.analyzer.mid_hz, 600.0);
        assert_eq!(cfg.playback.volume, 0.5);
        assert!(cfg.playback.autoplay);
    }
}
