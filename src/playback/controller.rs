use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use crate::analysis::SpectrumTap;
use crate::audio::{decode_bytes, fetch_bytes, AudioBuffer};
use crate::config::PlaybackConfig;
use crate::error::DecodeError;
use crate::playback::clock::Clock;
use crate::playback::events::{EventHub, ListenerId, PlayerEvent};
use crate::playback::output::{AudioOutput, CompletionFn, SourceHandle as _, SourceSpec};

/// Keep resume offsets strictly inside the buffer so a source is never asked
/// to start at (or past) the very end.
const END_EPSILON: f64 = 0.001;

struct Track {
    url: Option<String>,
    buffer: Arc<AudioBuffer>,
}

/// Timeline and end-event state, shared with the completion callback of the
/// active source.
///
/// `paused_at` and `started_at` are mutually exclusive in authority: while
/// playing, elapsed time is `clock.now() - started_at`; while paused it is
/// the stored `paused_at`.
struct SessionShared {
    playing: Cell<bool>,
    paused_at: Cell<f64>,
    started_at: Cell<f64>,
    /// One-shot mask for the synthetic completion fired by a manual teardown.
    suppress_end_once: Cell<bool>,
    looping: Cell<bool>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            playing: Cell::new(false),
            paused_at: Cell::new(0.0),
            started_at: Cell::new(0.0),
            suppress_end_once: Cell::new(false),
            looping: Cell::new(false),
        }
    }

    fn reset(&self) {
        self.playing.set(false);
        self.paused_at.set(0.0);
        self.started_at.set(0.0);
        self.suppress_end_once.set(false);
    }
}

/// Deterministic control of a single audio source with elapsed-time
/// accounting that never trusts the source's own playback position.
///
/// At most one active source exists at any time; starting a new one always
/// tears down the previous one first, and a teardown never leaks a
/// `TrackEnded` notification. The output backend and clock are injected at
/// construction; there is no global audio state.
pub struct PlaybackController<O: AudioOutput, C: Clock> {
    output: O,
    clock: C,
    track: Option<Track>,
    active: Option<O::Handle>,
    session: Rc<SessionShared>,
    events: EventHub,
    volume: f32,
}

impl<O: AudioOutput, C: Clock> PlaybackController<O, C> {
    pub fn new(output: O, clock: C) -> Self {
        Self {
            output,
            clock,
            track: None,
            active: None,
            session: Rc::new(SessionShared::new()),
            events: EventHub::new(),
            volume: 1.0,
        }
    }

    pub fn with_config(output: O, clock: C, config: &PlaybackConfig) -> Self {
        let mut controller = Self::new(output, clock);
        controller.set_volume(config.volume);
        controller.set_loop(config.looping);
        controller
    }

    /// Fetch and decode `url`, replacing the loaded track.
    ///
    /// On failure the previously loaded track (if any) remains loaded and
    /// playable. On success the paused offset resets to zero.
    pub fn load_track(&mut self, url: &str) -> Result<(), DecodeError> {
        log::info!("loading track {}", url);
        let bytes = fetch_bytes(url)?;
        let buffer = decode_bytes(bytes, url)?;
        log::info!(
            "track ready: {:.1}s @ {}Hz",
            buffer.duration_seconds(),
            buffer.sample_rate()
        );
        self.track = Some(Track {
            url: Some(url.to_string()),
            buffer: Arc::new(buffer),
        });
        self.session.paused_at.set(0.0);
        Ok(())
    }

    /// Install an already-decoded buffer as the loaded track.
    pub fn load_buffer(&mut self, buffer: AudioBuffer) {
        self.track = Some(Track {
            url: None,
            buffer: Arc::new(buffer),
        });
        self.session.paused_at.set(0.0);
    }

    /// Start (or resume) playback from the stored offset.
    ///
    /// No-op without a loaded buffer, and a pure no-op when already playing.
    pub fn play(&mut self) {
        let (buffer, duration) = match &self.track {
            Some(track) => (Arc::clone(&track.buffer), track.buffer.duration_seconds()),
            None => return,
        };
        if self.session.playing.get() || duration <= 0.0 {
            return;
        }

        let offset = self
            .session
            .paused_at
            .get()
            .clamp(0.0, (duration - END_EPSILON).max(0.0));
        self.teardown_source();

        let spec = SourceSpec {
            offset_seconds: offset,
            volume: self.volume,
            looping: self.session.looping.get(),
        };
        let on_complete = self.completion_callback();
        match self.output.start(&buffer, spec, on_complete) {
            Ok(handle) => {
                self.active = Some(handle);
                self.session.started_at.set(self.clock.now() - offset);
                self.session.playing.set(true);
            }
            Err(err) => log::error!("failed to start playback source: {}", err),
        }
    }

    /// Freeze the timeline at the current elapsed position and tear down the
    /// active source. No-op if not playing.
    pub fn pause(&mut self) {
        if !self.session.playing.get() {
            return;
        }
        let elapsed = self.clock.now() - self.session.started_at.get();
        self.session.paused_at.set(elapsed);
        self.teardown_source();
        self.session.playing.set(false);
    }

    /// Jump to `target_seconds`, clamped into the track.
    ///
    /// Both the stored offset and the clock reference are updated so
    /// [`playback_seconds`](Self::playback_seconds) immediately reflects the
    /// new position in either play state. `autoplay` overrides whether
    /// playback resumes; `None` preserves the current play state.
    pub fn seek(&mut self, target_seconds: f64, autoplay: Option<bool>) {
        let duration = match &self.track {
            Some(track) => track.buffer.duration_seconds(),
            None => return,
        };
        if duration <= 0.0 {
            return;
        }

        let target = target_seconds.clamp(0.0, (duration - END_EPSILON).max(0.0));
        let was_playing = self.session.playing.get();

        self.session.paused_at.set(target);
        self.session.started_at.set(self.clock.now() - target);
        self.teardown_source();
        self.session.playing.set(false);

        if autoplay.unwrap_or(was_playing) {
            self.play();
        }
    }

    /// Replace the loaded track with `url` and reset the timeline to zero.
    ///
    /// The active source is torn down first; on load failure the previous
    /// track remains loaded (but playback stays stopped).
    pub fn change_audio(&mut self, url: &str, autoplay: bool) -> Result<(), DecodeError> {
        self.teardown_source();
        self.session.playing.set(false);

        self.load_track(url)?;

        self.session.paused_at.set(0.0);
        self.session.started_at.set(self.clock.now());

        if autoplay {
            self.play();
        }
        Ok(())
    }

    /// Pause and reset the position to zero.
    pub fn stop(&mut self) {
        self.pause();
        self.session.paused_at.set(0.0);
        self.session.started_at.set(self.clock.now());
    }

    /// Elapsed playback position in seconds.
    pub fn playback_seconds(&self) -> f64 {
        if self.session.playing.get() {
            self.clock.now() - self.session.started_at.get()
        } else {
            self.session.paused_at.get()
        }
    }

    /// Duration of the loaded track, or 0 when none is loaded.
    pub fn duration_seconds(&self) -> f64 {
        match &self.track {
            Some(track) => track.buffer.duration_seconds(),
            None => 0.0,
        }
    }

    /// Elapsed position formatted as `M:SS`, clamped to the duration.
    pub fn position_display(&self) -> String {
        let duration = self.duration_seconds();
        let mut elapsed = self.playback_seconds().max(0.0);
        if duration > 0.0 {
            elapsed = elapsed.min(duration);
        }
        let minutes = (elapsed / 60.0).floor() as u64;
        let seconds = (elapsed % 60.0).floor() as u64;
        format!("{}:{:02}", minutes, seconds)
    }

    pub fn is_playing(&self) -> bool {
        self.session.playing.get()
    }

    pub fn track_url(&self) -> Option<&str> {
        self.track.as_ref().and_then(|t| t.url.as_deref())
    }

    /// The decoded buffer of the loaded track, if any.
    pub fn buffer(&self) -> Option<&Arc<AudioBuffer>> {
        self.track.as_ref().map(|t| &t.buffer)
    }

    /// Volume in [0, 1]; applied to the active source immediately.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(handle) = self.active.as_mut() {
            handle.set_volume(self.volume);
        }
    }

    /// Looping takes effect when the next source starts.
    pub fn set_loop(&mut self, looping: bool) {
        self.session.looping.set(looping);
    }

    pub fn subscribe(
        &self,
        event: PlayerEvent,
        handler: impl Fn(PlayerEvent) + 'static,
    ) -> ListenerId {
        self.events.subscribe(event, handler)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Cooperative poll. Lets the active source report natural completion
    /// and releases the handle once it has finished.
    pub fn tick(&mut self) {
        if let Some(handle) = self.active.as_mut() {
            handle.poll();
            if !self.session.playing.get() {
                // The source completed naturally; drop the dead handle.
                self.active = None;
            }
        }
    }

    /// Tear down the active source and release everything. Idempotent.
    pub fn dispose(&mut self) {
        self.teardown_source();
        self.session.reset();
        self.track = None;
        self.events.clear();
    }

    /// Tear down the active source.
    ///
    /// The suppression flag is raised for the duration of the synchronous
    /// stop, so the synthetic completion the stop triggers is masked while a
    /// genuine end arriving on any later tick is not.
    fn teardown_source(&mut self) {
        if let Some(mut handle) = self.active.take() {
            self.session.suppress_end_once.set(true);
            handle.stop();
            self.session.suppress_end_once.set(false);
        }
    }

    fn completion_callback(&self) -> CompletionFn {
        let session = Rc::clone(&self.session);
        let events = self.events.clone();
        Box::new(move || {
            if session.suppress_end_once.get() {
                // Synthetic end from a manual teardown
                return;
            }
            if session.looping.get() {
                return;
            }
            session.playing.set(false);
            session.paused_at.set(0.0);
            events.emit(PlayerEvent::TrackEnded);
        })
    }
}

impl<O: AudioOutput, C: Clock> Drop for PlaybackController<O, C> {
    fn drop(&mut self) {
        self.teardown_source();
    }
}

impl<O: AudioOutput, C: Clock> SpectrumTap for PlaybackController<O, C> {
    fn is_active(&self) -> bool {
        self.session.playing.get()
    }

    fn sample_rate(&self) -> u32 {
        match &self.track {
            Some(track) => track.buffer.sample_rate(),
            None => 0,
        }
    }

    fn fill_window(&self, out: &mut [f32]) -> bool {
        let track = match &self.track {
            Some(track) => track,
            None => return false,
        };
        let sample_rate = track.buffer.sample_rate();
        if sample_rate == 0 {
            return false;
        }
        let playhead = self.playback_seconds().max(0.0);
        let center = (playhead * sample_rate as f64) as usize;
        let start = center.saturating_sub(out.len() / 2);
        track.buffer.fill_mono_window(start, out)
    }
}
