//! Track resource fetch and decode.

mod decode;
mod fetch;

pub use decode::{decode_bytes, AudioBuffer};
pub use fetch::fetch_bytes;
