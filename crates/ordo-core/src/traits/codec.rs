use crate::error::Result;
use crate::types::Event;

/// Event codec: convert events to and from stored bytes
///
/// `decode` must fail with [`OrdoError::Codec`](crate::OrdoError::Codec) on
/// malformed input rather than returning a partial event.
pub trait EventCodec: Send + Sync {
    /// Encode an event to bytes
    fn encode(&self, event: &Event) -> Result<Vec<u8>>;

    /// Decode an event from bytes
    fn decode(&self, bytes: &[u8]) -> Result<Event>;

    /// Codec name, recorded in the store meta
    fn name(&self) -> &str;
}
