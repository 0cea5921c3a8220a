//! Rodio-backed output device (cargo feature `device`).
//!
//! One [`rodio::Sink`] per playback source. Natural end is detected by the
//! controller's cooperative poll; manual teardown dispatches the synthetic
//! completion synchronously, as the source-handle contract requires.

use std::sync::Arc;
use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source as _};

use crate::audio::AudioBuffer;
use crate::error::OutputError;
use crate::playback::output::{AudioOutput, CompletionFn, SourceHandle, SourceSpec};

/// System audio output bound to the default device.
pub struct RodioOutput {
    // The stream must outlive every sink playing into it
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioOutput {
    pub fn new() -> Result<Self, OutputError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| OutputError::Device(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

pub struct RodioSource {
    sink: Sink,
    on_complete: Option<CompletionFn>,
    looping: bool,
}

impl RodioSource {
    fn fire(&mut self) {
        if let Some(mut callback) = self.on_complete.take() {
            callback();
        }
    }
}

impl AudioOutput for RodioOutput {
    type Handle = RodioSource;

    fn start(
        &mut self,
        buffer: &Arc<AudioBuffer>,
        spec: SourceSpec,
        on_complete: CompletionFn,
    ) -> Result<Self::Handle, OutputError> {
        let sink = Sink::try_new(&self.handle).map_err(|e| OutputError::Start(e.to_string()))?;
        sink.set_volume(spec.volume);

        let samples = SamplesBuffer::new(
            buffer.channels() as u16,
            buffer.sample_rate(),
            buffer.samples().to_vec(),
        );
        let offset = Duration::from_secs_f64(spec.offset_seconds.max(0.0));
        if spec.looping {
            sink.append(samples.skip_duration(offset).repeat_infinite());
        } else {
            sink.append(samples.skip_duration(offset));
        }

        Ok(RodioSource {
            sink,
            on_complete: Some(on_complete),
            looping: spec.looping,
        })
    }
}

impl SourceHandle for RodioSource {
    fn stop(&mut self) {
        self.sink.stop();
        // Synthetic completion; the controller masks it during teardown
        self.fire();
    }

    fn poll(&mut self) {
        if !self.looping && self.sink.empty() {
            self.fire();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }
}
