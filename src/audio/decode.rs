use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodeError;

/// Decoded PCM audio: interleaved f32 samples plus stream parameters.
///
/// Replaced wholesale on track change; never mutated after decode.
pub struct AudioBuffer {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Interleaved samples, `channels` values per frame.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }

    /// Fill `out` with mono-mixed frames starting at `start_frame`.
    /// Frames past the end of the buffer stay zero. Returns false when the
    /// buffer holds no audio at all.
    pub fn fill_mono_window(&self, start_frame: usize, out: &mut [f32]) -> bool {
        out.fill(0.0);
        if self.channels == 0 || self.samples.is_empty() {
            return false;
        }
        let frames = self.frames();
        for (i, slot) in out.iter_mut().enumerate() {
            let frame = start_frame + i;
            if frame >= frames {
                break;
            }
            let base = frame * self.channels;
            let sum: f32 = self.samples[base..base + self.channels].iter().sum();
            *slot = sum / self.channels as f32;
        }
        true
    }
}

/// Decode an in-memory audio resource into an [`AudioBuffer`].
///
/// `name_hint` is the resource name or URL; its extension (if any) guides
/// format probing.
pub fn decode_bytes(bytes: Vec<u8>, name_hint: &str) -> Result<AudioBuffer, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_of(name_hint) {
        hint.with_extension(&ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(DecodeError::Probe)?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::UnknownSampleRate)?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(DecodeError::Decode)?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(DecodeError::Decode(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Skip a corrupt packet, keep the rest of the stream
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(DecodeError::Decode(e)),
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }

    let buffer = AudioBuffer::new(samples, channels, sample_rate);
    log::debug!(
        "decoded {} frames @ {}Hz ({} ch, {:.1}s)",
        buffer.frames(),
        sample_rate,
        channels,
        buffer.duration_seconds()
    );
    Ok(buffer)
}

/// Extract a lowercase file extension from a path or URL, ignoring any
/// query string or fragment.
fn extension_of(name: &str) -> Option<String> {
    let no_query = name.split(['?', '#']).next().unwrap_or(name);
    let tail = no_query.rsplit('/').next().unwrap_or(no_query);
    let (stem, ext) = tail.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 4 {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
