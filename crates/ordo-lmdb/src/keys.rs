use ordo_core::{keyspace::key_to_sequence, Sequence};

/// Named LMDB databases
pub mod db_names {
    pub use ordo_core::keyspace::GLOBAL_EVENT_ORDER;
    pub const AGGREGATE_STREAMS: &str = "aggregate_streams";
    pub const KEYSPACES: &str = "keyspaces";
    pub const META: &str = "meta";
    pub const SNAPSHOTS: &str = "snapshots";

    /// Number of named databases opened by the store
    pub const COUNT: u32 = 5;
}

/// Meta keys used in the meta database
pub mod meta_keys {
    pub const GLOBAL_SEQUENCE: &str = "global_sequence";
    pub const NEXT_KEYSPACE_ID: &str = "next_keyspace_id";
    pub const SCHEMA_VERSION: &str = "schema_version";
    pub const GLOBAL_ENTRY_MODE: &str = "global_entry_mode";
    pub const CODEC: &str = "codec";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

pub const SCHEMA_VERSION: u32 = 1;

/// Registry record for one aggregate keyspace
///
/// `id` prefixes every key of the stream in the streams database and
/// `sequence` is the last local sequence handed out (0 for a fresh keyspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyspaceEntry {
    pub id: u64,
    pub sequence: Sequence,
}

impl KeyspaceEntry {
    pub fn new(id: u64) -> Self {
        Self { id, sequence: 0 }
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.id.to_be_bytes());
        out[8..].copy_from_slice(&self.sequence.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 16 {
            return None;
        }
        Some(Self {
            id: key_to_sequence(&bytes[..8])?,
            sequence: key_to_sequence(&bytes[8..])?,
        })
    }
}

/// Key of a stream entry: keyspace id followed by the local sequence
pub fn stream_key(keyspace_id: u64, seq: Sequence) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&keyspace_id.to_be_bytes());
    out[8..].copy_from_slice(&seq.to_be_bytes());
    out
}

/// Split a stream key into `(keyspace_id, sequence)`
pub fn split_stream_key(bytes: &[u8]) -> Option<(u64, Sequence)> {
    if bytes.len() != 16 {
        return None;
    }
    Some((key_to_sequence(&bytes[..8])?, key_to_sequence(&bytes[8..])?))
}
