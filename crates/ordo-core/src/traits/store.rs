use crate::error::Result;
use crate::types::{CommitInfo, Event, GlobalEntry, Sequence, Snapshot, Version};

/// Append-only event storage with a global commit order
///
/// Implementations must make each `append` all-or-nothing across the
/// aggregate stream and the global order log.
pub trait EventStore: Send + Sync {
    /// Append a batch of events for a single aggregate
    ///
    /// The first event's version must be exactly one past the stream's last
    /// stored version. An empty batch succeeds without touching storage.
    fn append(&self, events: &[Event]) -> Result<CommitInfo>;

    /// Events of one aggregate with a version strictly greater than `after_version`
    ///
    /// An aggregate that was never written yields an empty vector.
    fn get(&self, id: &str, aggregate_type: &str, after_version: Version) -> Result<Vec<Event>>;

    /// Up to `count` events from the global order log, starting at `start`
    fn global_get(&self, start: Sequence, count: usize) -> Result<Vec<Event>> {
        Ok(self
            .global_entries(start, count)?
            .into_iter()
            .map(|entry| entry.event)
            .collect())
    }

    /// Like [`EventStore::global_get`] but keeps each event's global sequence
    fn global_entries(&self, start: Sequence, count: usize) -> Result<Vec<GlobalEntry>>;

    /// Last stored version of an aggregate (0 if it has no events)
    fn last_version(&self, id: &str, aggregate_type: &str) -> Result<Version>;

    /// Release the underlying engine. Calling it again is a no-op.
    fn close(&self) -> Result<()>;
}

/// Save-and-load facility for aggregate state snapshots
pub trait SnapshotStore: Send + Sync {
    fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    fn get_snapshot(&self, id: &str, aggregate_type: &str) -> Result<Option<Snapshot>>;
}
