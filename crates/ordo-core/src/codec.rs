//! Built-in event codecs

use crate::error::{OrdoError, Result};
use crate::traits::EventCodec;
use crate::types::Event;

/// JSON codec (human-readable, larger size)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl EventCodec for JsonCodec {
    fn encode(&self, event: &Event) -> Result<Vec<u8>> {
        serde_json::to_vec(event).map_err(|e| OrdoError::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Event> {
        serde_json::from_slice(bytes).map_err(|e| OrdoError::Codec(e.to_string()))
    }

    fn name(&self) -> &str {
        "json"
    }
}
