use std::sync::Arc;

use crate::audio::AudioBuffer;
use crate::error::OutputError;

/// Completion hook wired into every source at creation time.
pub type CompletionFn = Box<dyn FnMut()>;

/// Parameters for starting a playback source.
#[derive(Clone, Copy, Debug)]
pub struct SourceSpec {
    /// Offset into the buffer, in seconds, where playback begins.
    pub offset_seconds: f64,
    /// Volume in [0, 1] applied at start.
    pub volume: f32,
    /// Looping sources restart at the buffer end instead of completing.
    pub looping: bool,
}

/// A live, playable instantiation of a decoded buffer.
///
/// Completion contract: the callback passed to [`AudioOutput::start`] fires
/// at most once per source — from `poll` once playback has consumed the
/// whole buffer (genuine end), or synchronously from `stop` if it has not
/// fired yet (synthetic end caused by manual teardown). Looping sources
/// never complete naturally.
pub trait SourceHandle {
    /// Halt playback. Dispatches the completion callback before returning
    /// if it has not already fired.
    fn stop(&mut self);

    /// Cooperative check for natural completion; dispatches the completion
    /// callback once the source has played to the end of its data.
    fn poll(&mut self);

    /// Adjust the volume of the live source.
    fn set_volume(&mut self, volume: f32);
}

/// Factory for playback sources: the injected seam to the host audio stack.
pub trait AudioOutput {
    type Handle: SourceHandle;

    fn start(
        &mut self,
        buffer: &Arc<AudioBuffer>,
        spec: SourceSpec,
        on_complete: CompletionFn,
    ) -> Result<Self::Handle, OutputError>;
}
