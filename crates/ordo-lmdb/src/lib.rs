//! LMDB-backed event store implementation
//!
//! Persists per-aggregate event streams and a global commit-order log inside
//! one LMDB environment.
//!
//! Key features:
//! - Atomic commits over the aggregate stream + global order log
//! - Big-endian sequence keys for proper sort order
//! - Per-keyspace sequence counters updated inside the write transaction
//! - Copy or pointer representation for global log entries
//! - Snapshot keyspace beside the log

pub mod keys;
pub mod meta;
pub mod open_lock;
pub mod scan;
pub mod snapshot;
pub mod store;
pub mod txn;

pub use keys::KeyspaceEntry;
pub use store::LmdbEventStore;
pub use txn::AppendTxn;
