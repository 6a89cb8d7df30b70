//! Ordo: an embedded event store on LMDB
//!
//! Ordo keeps an append-only stream of events per aggregate and a global log
//! recording the order in which batches were committed across all
//! aggregates:
//! - **Append**: optimistic-concurrency checked, all-or-nothing batches
//! - **Get**: replay one aggregate from any version
//! - **Global replay**: page through the whole history in commit order
//! - **Snapshots**: save and load aggregate state beside the log
//!
//! # Quick Start
//!
//! ```no_run
//! use ordo::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let db = OrdoDb::open("./data")?;
//!
//! let batch = db
//!     .batch("user", "u1")?
//!     .push("Created", serde_json::json!({"name": "alice"}))
//!     .push("Renamed", serde_json::json!({"name": "alicia"}));
//! db.append(&batch)?;
//!
//! let history = db.get("u1", "user", 0)?;
//! assert_eq!(history.len(), 2);
//!
//! let page = db.global_get(1, 100)?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod db;
pub mod event_format;
pub mod prelude;

// Re-export core types
pub use ordo_core::{
    config::{GlobalEntryMode, StoreConfig, SyncMode},
    error::{OrdoError, Result},
    keyspace::{aggregate_keyspace, parse_aggregate_keyspace, GLOBAL_EVENT_ORDER},
    traits::{EventCodec, EventStore, SnapshotStore},
    types::{
        CommitInfo, Event, EventMetadata, GlobalEntry, Sequence, Snapshot, StoreMeta, StreamInfo,
        Version,
    },
    validate::validate_events,
    JsonCodec,
};

// Re-export implementations
pub use ordo_lmdb::{store::data_file, LmdbEventStore};

// Re-export main types from this crate
pub use batch::EventBatch;
pub use db::OrdoDb;
pub use event_format::CompressedCodec;
