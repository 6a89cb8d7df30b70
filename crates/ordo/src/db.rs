//! Unified ordo database interface
//!
//! Bundles the LMDB event store with its codec and the helpers applications
//! reach for most: batch building and paged replay of the global order log.

use crate::{
    CommitInfo, Event, EventBatch, EventCodec, EventStore, GlobalEntry, JsonCodec, LmdbEventStore,
    Result, Sequence, Snapshot, SnapshotStore, StoreConfig, StoreMeta, StreamInfo, Version,
};
use std::path::Path;
use std::sync::Arc;

/// Default number of events fetched per page by [`OrdoDb::replay`]
pub const DEFAULT_REPLAY_PAGE: usize = 512;

/// Unified ordo database
pub struct OrdoDb {
    store: Arc<LmdbEventStore>,
}

impl OrdoDb {
    /// Open an ordo database at the given path with the JSON codec
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref()))
    }

    /// Open with a custom configuration and the JSON codec
    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        Self::open_with_codec(config, Arc::new(JsonCodec))
    }

    /// Open with a custom configuration and codec
    pub fn open_with_codec(config: StoreConfig, codec: Arc<dyn EventCodec>) -> Result<Self> {
        let store = Arc::new(LmdbEventStore::open(config, codec)?);
        Ok(Self { store })
    }

    /// Get reference to the underlying event store
    pub fn store(&self) -> &Arc<LmdbEventStore> {
        &self.store
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Append a batch of events for one aggregate
    pub fn append(&self, events: &[Event]) -> Result<CommitInfo> {
        self.store.append(events)
    }

    /// Events of an aggregate after `after_version`
    pub fn get(&self, id: &str, aggregate_type: &str, after_version: Version) -> Result<Vec<Event>> {
        self.store.get(id, aggregate_type, after_version)
    }

    /// Up to `count` events of the global order log from `start`
    pub fn global_get(&self, start: Sequence, count: usize) -> Result<Vec<Event>> {
        self.store.global_get(start, count)
    }

    pub fn global_entries(&self, start: Sequence, count: usize) -> Result<Vec<GlobalEntry>> {
        self.store.global_entries(start, count)
    }

    pub fn last_version(&self, id: &str, aggregate_type: &str) -> Result<Version> {
        self.store.last_version(id, aggregate_type)
    }

    /// Start a batch on top of the aggregate's current version
    pub fn batch(&self, aggregate_type: &str, id: &str) -> Result<EventBatch> {
        let current = self.store.last_version(id, aggregate_type)?;
        Ok(EventBatch::new(aggregate_type, id, current))
    }

    /// Feed every global log entry from `start` to `handler`, in commit order
    ///
    /// Reads in pages of `page_size` events, each page in its own read
    /// transaction. Returns the sequence to resume from next time.
    pub fn replay<F>(&self, start: Sequence, page_size: usize, mut handler: F) -> Result<Sequence>
    where
        F: FnMut(&GlobalEntry) -> Result<()>,
    {
        let page_size = page_size.max(1);
        let mut next = start.max(1);
        loop {
            let page = self.store.global_entries(next, page_size)?;
            for entry in &page {
                handler(entry)?;
                next = entry.sequence + 1;
            }
            tracing::debug!(events = page.len(), next, "Replayed page");
            if page.len() < page_size {
                return Ok(next);
            }
        }
    }

    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.store.save_snapshot(snapshot)
    }

    pub fn get_snapshot(&self, id: &str, aggregate_type: &str) -> Result<Option<Snapshot>> {
        self.store.get_snapshot(id, aggregate_type)
    }

    /// Aggregate streams known to the store
    pub fn streams(&self) -> Result<Vec<StreamInfo>> {
        self.store.streams()
    }

    pub fn stream_exists(&self, id: &str, aggregate_type: &str) -> Result<bool> {
        self.store.stream_exists(id, aggregate_type)
    }

    pub fn meta(&self) -> Result<StoreMeta> {
        self.store.meta()
    }

    /// Close the database. Later operations fail with `InvalidState`.
    pub fn close(&self) -> Result<()> {
        self.store.close()
    }
}
