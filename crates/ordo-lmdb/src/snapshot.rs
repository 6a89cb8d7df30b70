//! Aggregate snapshots
//!
//! Stored as JSON in their own database, keyed by the aggregate keyspace
//! name. Saving a snapshot never touches the event log.

use lmdb::{Transaction, WriteFlags};
use ordo_core::{
    error::{OrdoError, Result},
    keyspace::aggregate_keyspace,
    traits::SnapshotStore,
    types::Snapshot,
};

use crate::keys::meta_keys;
use crate::meta;
use crate::store::LmdbEventStore;
use crate::txn::lookup_keyspace;

impl SnapshotStore for LmdbEventStore {
    fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.aggregate_type.is_empty() || snapshot.aggregate_root_id.is_empty() {
            return Err(OrdoError::Validation(
                "snapshot must name its aggregate type and id".into(),
            ));
        }

        let inner = self.inner()?;
        let keyspace = aggregate_keyspace(&snapshot.aggregate_type, &snapshot.aggregate_root_id);
        let bytes =
            serde_json::to_vec(snapshot).map_err(|e| OrdoError::Codec(e.to_string()))?;

        let mut txn = inner
            .env
            .begin_rw_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;

        let head = lookup_keyspace(&txn, inner.dbs, &keyspace)?
            .map(|entry| entry.sequence)
            .unwrap_or(0);
        if snapshot.version > head {
            return Err(OrdoError::Validation(format!(
                "snapshot of {} at version {} is ahead of the stream (version {})",
                keyspace, snapshot.version, head
            )));
        }

        txn.put(inner.dbs.snapshots, &keyspace, &bytes, WriteFlags::empty())
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;
        meta::set_meta(
            &mut txn,
            inner.dbs.meta,
            meta_keys::UPDATED_AT,
            &chrono::Utc::now().to_rfc3339(),
        )?;
        txn.commit()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;

        tracing::debug!(keyspace = %keyspace, version = snapshot.version, "Saved snapshot");
        Ok(())
    }

    fn get_snapshot(&self, id: &str, aggregate_type: &str) -> Result<Option<Snapshot>> {
        let inner = self.inner()?;
        let txn = inner
            .env
            .begin_ro_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;

        let keyspace = aggregate_keyspace(aggregate_type, id);
        match txn.get(inner.dbs.snapshots, &keyspace) {
            Ok(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| OrdoError::Codec(format!("snapshot of {}: {}", keyspace, e))),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(OrdoError::Transaction(e.to_string())),
        }
    }
}
