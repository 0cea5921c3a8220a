//! Audio playback and frequency-band analysis for driving audio-reactive
//! visuals.
//!
//! Two cooperating pieces:
//!
//! - [`playback::PlaybackController`] owns the decoded track, a single
//!   active playback source, and the elapsed-seconds timeline
//!   (play/pause/seek/stop/change-track, plus a track-ended notification).
//! - [`analysis::FrequencyAnalyzer`] samples the playing audio once per
//!   render tick and produces normalized low/mid/high band energies for the
//!   visual layer.
//!
//! The controller is constructed explicitly with an injected clock and
//! output backend; nothing in the crate holds global audio state.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod playback;

#[cfg(test)]
pub(crate) mod testutil;

pub use analysis::{BandEnergy, FrequencyAnalyzer, SpectrumTap};
pub use config::{AnalyzerConfig, Config, PlaybackConfig};
pub use error::{DecodeError, OutputError};
pub use playback::{MonotonicClock, PlaybackController, PlayerEvent};
