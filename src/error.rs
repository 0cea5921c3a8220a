use thiserror::Error;

/// Failure to fetch or decode an audio resource.
///
/// Recovered locally: the controller keeps its previous track loaded and
/// playable when a load fails, so callers may retry or fall back.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// HTTP fetch of the resource failed.
    #[error("failed to fetch audio resource: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem read of the resource failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The container format could not be identified.
    #[error("unrecognized audio format: {0}")]
    Probe(symphonia::core::errors::Error),

    /// No decodable audio track in the resource.
    #[error("no decodable audio track in resource")]
    NoAudioTrack,

    /// The stream does not declare a sample rate.
    #[error("resource does not declare a sample rate")]
    UnknownSampleRate,

    /// Decoding the compressed stream failed.
    #[error("decode failed: {0}")]
    Decode(symphonia::core::errors::Error),

    /// The resource decoded to zero samples.
    #[error("decoded resource contains no samples")]
    Empty,
}

/// Failure to open or drive an audio output device.
///
/// `play()` treats these as logged no-ops; the timeline and loaded track
/// are left untouched.
#[derive(Debug, Error)]
pub enum OutputError {
    /// No usable output device / stream.
    #[error("no audio output device available: {0}")]
    Device(String),

    /// Creating or starting a playback source failed.
    #[error("failed to start playback source: {0}")]
    Start(String),
}
