//! Ordo Prelude
//!
//! ```
//! use ordo::prelude::*;
//! ```

// Core types
pub use crate::{
    CommitInfo, Event, EventMetadata, GlobalEntry, OrdoDb, OrdoError, Result, Sequence, Snapshot,
    StoreMeta, StreamInfo, Version,
};

// Configs
pub use crate::{GlobalEntryMode, StoreConfig, SyncMode};

// Traits
pub use crate::{EventCodec, EventStore, SnapshotStore};

// Implementations
pub use crate::{CompressedCodec, EventBatch, JsonCodec, LmdbEventStore};

// Re-export common external deps
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;
