//! Event codecs beyond the plain JSON one
//!
//! # Example
//!
//! ```
//! use ordo::prelude::*;
//! use ordo::event_format::CompressedCodec;
//!
//! # fn main() -> Result<()> {
//! let codec = CompressedCodec::new(JsonCodec);
//! let event = Event::new("user", "u1", 1, "Created")
//!     .with_payload(serde_json::json!({"name": "alice"}));
//!
//! let bytes = codec.encode(&event)?;
//! assert_eq!(codec.decode(&bytes)?, event);
//! # Ok(())
//! # }
//! ```

use crate::{Event, EventCodec, OrdoError, Result};

/// Default zstd level, favouring write latency over ratio
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 1;

/// Wraps another codec and zstd-compresses its output
pub struct CompressedCodec<C> {
    inner: C,
    level: i32,
    name: String,
}

impl<C: EventCodec> CompressedCodec<C> {
    pub fn new(inner: C) -> Self {
        let name = format!("zstd+{}", inner.name());
        Self {
            inner,
            level: DEFAULT_COMPRESSION_LEVEL,
            name,
        }
    }

    /// Set the zstd compression level (1-22)
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: EventCodec> EventCodec for CompressedCodec<C> {
    fn encode(&self, event: &Event) -> Result<Vec<u8>> {
        let raw = self.inner.encode(event)?;
        zstd::encode_all(raw.as_slice(), self.level).map_err(|e| OrdoError::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Event> {
        let raw = zstd::decode_all(bytes).map_err(|e| OrdoError::Codec(e.to_string()))?;
        self.inner.decode(&raw)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
