//! Playback state machine, timeline accounting, and output seams.

mod clock;
mod controller;
#[cfg(feature = "device")]
mod device;
mod events;
mod output;

pub use clock::{Clock, MonotonicClock};
pub use controller::PlaybackController;
#[cfg(feature = "device")]
pub use device::RodioOutput;
pub use events::{EventHub, ListenerId, PlayerEvent};
pub use output::{AudioOutput, CompletionFn, SourceHandle, SourceSpec};
