//! Shared test doubles: a hand-cranked clock and an instrumented output
//! backend that records source creations and teardowns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::audio::AudioBuffer;
use crate::error::OutputError;
use crate::playback::{AudioOutput, Clock, CompletionFn, SourceHandle, SourceSpec};

/// Clock advanced explicitly by tests.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

struct SourceState {
    callback: RefCell<Option<CompletionFn>>,
    offset: f64,
    volume: Cell<f32>,
    stopped: Cell<bool>,
    finished: Cell<bool>,
}

impl SourceState {
    fn fire(&self) {
        let callback = self.callback.borrow_mut().take();
        if let Some(mut callback) = callback {
            callback();
        }
    }
}

#[derive(Default)]
struct MockState {
    started: Cell<usize>,
    stopped: Cell<usize>,
    sources: RefCell<Vec<Rc<SourceState>>>,
}

/// Instrumented output backend for controller tests.
#[derive(Clone, Default)]
pub struct MockOutput {
    inner: Rc<MockState>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources created so far.
    pub fn started(&self) -> usize {
        self.inner.started.get()
    }

    /// Sources manually torn down so far.
    pub fn stopped(&self) -> usize {
        self.inner.stopped.get()
    }

    /// Sources neither torn down nor naturally finished.
    pub fn live(&self) -> usize {
        self.inner
            .sources
            .borrow()
            .iter()
            .filter(|s| !s.stopped.get() && !s.finished.get())
            .count()
    }

    /// Start offset of the most recently created source.
    pub fn last_offset(&self) -> Option<f64> {
        self.inner.sources.borrow().last().map(|s| s.offset)
    }

    /// Volume of the most recently created source.
    pub fn last_volume(&self) -> Option<f32> {
        self.inner.sources.borrow().last().map(|s| s.volume.get())
    }

    /// Drive the most recent source to its natural end. Does nothing if it
    /// was already stopped or has already finished.
    pub fn complete_active(&self) {
        let state = self.inner.sources.borrow().last().cloned();
        if let Some(state) = state {
            if !state.stopped.get() && !state.finished.replace(true) {
                state.fire();
            }
        }
    }
}

pub struct MockHandle {
    state: Rc<SourceState>,
    mock: Rc<MockState>,
}

impl SourceHandle for MockHandle {
    fn stop(&mut self) {
        if !self.state.stopped.replace(true) {
            self.mock.stopped.set(self.mock.stopped.get() + 1);
            // Synthetic completion, dispatched synchronously from teardown
            self.state.fire();
        }
    }

    fn poll(&mut self) {}

    fn set_volume(&mut self, volume: f32) {
        self.state.volume.set(volume);
    }
}

impl AudioOutput for MockOutput {
    type Handle = MockHandle;

    fn start(
        &mut self,
        _buffer: &Arc<AudioBuffer>,
        spec: SourceSpec,
        on_complete: CompletionFn,
    ) -> Result<Self::Handle, OutputError> {
        let state = Rc::new(SourceState {
            callback: RefCell::new(Some(on_complete)),
            offset: spec.offset_seconds,
            volume: Cell::new(spec.volume),
            stopped: Cell::new(false),
            finished: Cell::new(false),
        });
        self.inner.started.set(self.inner.started.get() + 1);
        self.inner.sources.borrow_mut().push(Rc::clone(&state));
        Ok(MockHandle {
            state,
            mock: Rc::clone(&self.inner),
        })
    }
}

/// Minimal PCM16 mono WAV writer for decode and load tests.
pub fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}
