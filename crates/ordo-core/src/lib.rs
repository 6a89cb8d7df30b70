//! Ordo Core: Traits, types and validation for the ordo event store
//!
//! This crate defines the storage-independent pieces:
//! - Event model: events, metadata, snapshots, commit information
//! - Keyspace naming: collision-free stream names and big-endian sequence keys
//! - Concurrency validation: the optimistic version check run on every append
//! - Codec trait with a JSON implementation
//! - Store traits implemented by engine backends (LMDB)

pub mod codec;
pub mod config;
pub mod error;
pub mod keyspace;
pub mod observe;
pub mod traits;
pub mod types;
pub mod validate;

pub use codec::JsonCodec;
pub use config::{GlobalEntryMode, StoreConfig, SyncMode};
pub use error::{OrdoError, Result};
pub use keyspace::{aggregate_keyspace, parse_aggregate_keyspace, GLOBAL_EVENT_ORDER};
pub use traits::{EventCodec, EventStore, SnapshotStore};
pub use types::{
    CommitInfo, Event, EventMetadata, GlobalEntry, Sequence, Snapshot, StoreMeta, StreamInfo,
    Version,
};
pub use validate::validate_events;
