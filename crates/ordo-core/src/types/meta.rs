use serde::{Deserialize, Serialize};

use crate::config::GlobalEntryMode;
use crate::types::event::{Sequence, Version};

/// Metadata about the event store state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    /// Highest global sequence assigned so far (0 when the log is empty)
    pub global_sequence: Sequence,

    /// Number of aggregate streams created
    pub stream_count: u64,

    /// How the global order log stores its entries
    pub global_entry_mode: GlobalEntryMode,

    /// Name of the codec the store was created with
    pub codec: String,

    /// Schema version of the on-disk layout
    pub schema_version: u32,

    /// Creation timestamp (ISO 8601)
    pub created_at: String,

    /// Last updated timestamp (ISO 8601)
    pub updated_at: String,
}

/// Identity and head of one aggregate stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub keyspace: String,
    pub aggregate_type: String,
    pub aggregate_root_id: String,
    pub last_version: Version,
}
