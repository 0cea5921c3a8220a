use crate::error::DecodeError;

/// Fetch the raw bytes of a track resource.
///
/// HTTP(S) URLs go through the blocking client; anything else is treated as
/// a filesystem path (a `file://` prefix is stripped).
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>, DecodeError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        let response = reqwest::blocking::get(url)?.error_for_status()?;
        let bytes = response.bytes()?;
        log::debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    } else {
        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(std::fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_decode_error() {
        let err = fetch_bytes("/no/such/track.wav").unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }

    #[test]
    fn file_scheme_prefix_is_stripped() {
        // Same missing path, addressed through the file scheme
        assert!(fetch_bytes("file:///no/such/track.wav").is_err());
    }
}
