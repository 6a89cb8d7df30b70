use lmdb::{Environment, RwTransaction, Transaction, WriteFlags};
use ordo_core::{
    error::{OrdoError, Result},
    keyspace::sequence_key,
    Sequence,
};

use crate::keys::{meta_keys, stream_key, KeyspaceEntry};
use crate::meta;
use crate::store::Databases;

/// Write transaction for one append batch
///
/// Aborts on drop unless [`AppendTxn::commit`] succeeded, so every early
/// return leaves both the aggregate stream and the global log untouched.
pub struct AppendTxn<'env> {
    txn: Option<RwTransaction<'env>>,
    dbs: Databases,
    events_written: usize,
}

impl<'env> AppendTxn<'env> {
    /// Begin a write transaction (blocks while another writer is active)
    pub fn begin(env: &'env Environment, dbs: Databases) -> Result<Self> {
        let txn = env
            .begin_rw_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;
        Ok(Self {
            txn: Some(txn),
            dbs,
            events_written: 0,
        })
    }

    fn txn(&self) -> Result<&RwTransaction<'env>> {
        self.txn
            .as_ref()
            .ok_or_else(|| OrdoError::InvalidState("Transaction already committed".into()))
    }

    fn txn_mut(&mut self) -> Result<&mut RwTransaction<'env>> {
        self.txn
            .as_mut()
            .ok_or_else(|| OrdoError::InvalidState("Transaction already committed".into()))
    }

    /// Look up a keyspace, creating it if this is its first write
    ///
    /// Returns the registry entry and whether it was created.
    pub fn open_or_create_keyspace(&mut self, name: &str) -> Result<(KeyspaceEntry, bool)> {
        let dbs = self.dbs;
        if let Some(entry) = lookup_keyspace(self.txn()?, dbs, name)? {
            return Ok((entry, false));
        }

        let txn = self.txn_mut()?;
        let id = meta::increment_counter(txn, dbs.meta, meta_keys::NEXT_KEYSPACE_ID)?;
        let entry = KeyspaceEntry::new(id);
        txn.put(dbs.keyspaces, &name, &entry.to_bytes(), WriteFlags::NO_OVERWRITE)
            .map_err(|e| OrdoError::Transaction(format!("could not create keyspace {}: {}", name, e)))?;

        tracing::info!(keyspace = name, id, "Created aggregate keyspace");
        Ok((entry, true))
    }

    /// Bytes of the last event stored in a keyspace
    pub fn last_event(&self, entry: &KeyspaceEntry) -> Result<Option<&[u8]>> {
        if entry.sequence == 0 {
            return Ok(None);
        }
        let txn = self.txn()?;
        match txn.get(self.dbs.streams, &stream_key(entry.id, entry.sequence)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(lmdb::Error::NotFound) => Err(OrdoError::InvalidState(format!(
                "keyspace {} is missing its last event {}",
                entry.id, entry.sequence
            ))),
            Err(e) => Err(OrdoError::Transaction(e.to_string())),
        }
    }

    /// Write an event under the keyspace's next local sequence
    pub fn put_stream_event(
        &mut self,
        name: &str,
        entry: &mut KeyspaceEntry,
        event: &[u8],
    ) -> Result<Sequence> {
        let dbs = self.dbs;
        let txn = self.txn_mut()?;

        let seq = entry.sequence + 1;
        txn.put(dbs.streams, &stream_key(entry.id, seq), &event, WriteFlags::NO_OVERWRITE)
            .map_err(|e| OrdoError::Transaction(format!("could not save event in {}: {}", name, e)))?;

        entry.sequence = seq;
        txn.put(dbs.keyspaces, &name, &entry.to_bytes(), WriteFlags::empty())
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;

        self.events_written += 1;
        Ok(seq)
    }

    /// Append an entry to the global order log under the next global sequence
    pub fn put_global(&mut self, value: &[u8]) -> Result<Sequence> {
        let dbs = self.dbs;
        let txn = self.txn_mut()?;

        let seq = meta::increment_counter(txn, dbs.meta, meta_keys::GLOBAL_SEQUENCE)?;
        txn.put(dbs.global, &sequence_key(seq), &value, WriteFlags::APPEND)
            .map_err(|e| OrdoError::Transaction(format!("could not save global entry {}: {}", seq, e)))?;

        Ok(seq)
    }

    pub fn events_written(&self) -> usize {
        self.events_written
    }

    pub fn commit(mut self) -> Result<()> {
        let dbs = self.dbs;
        let txn = self.txn_mut()?;
        meta::set_meta(
            txn,
            dbs.meta,
            meta_keys::UPDATED_AT,
            &chrono::Utc::now().to_rfc3339(),
        )?;

        let txn = self
            .txn
            .take()
            .ok_or_else(|| OrdoError::InvalidState("Transaction already committed".into()))?;
        txn.commit()
            .map_err(|e| OrdoError::Transaction(e.to_string()))
    }

    pub fn abort(mut self) {
        if let Some(txn) = self.txn.take() {
            txn.abort();
        }
    }
}

impl<'env> Drop for AppendTxn<'env> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            txn.abort();
        }
    }
}

/// Read a keyspace registry entry
pub fn lookup_keyspace<T: Transaction>(
    txn: &T,
    dbs: Databases,
    name: &str,
) -> Result<Option<KeyspaceEntry>> {
    match txn.get(dbs.keyspaces, &name) {
        Ok(bytes) => KeyspaceEntry::from_bytes(bytes)
            .map(Some)
            .ok_or_else(|| OrdoError::Codec(format!("malformed registry entry for {}", name))),
        Err(lmdb::Error::NotFound) => Ok(None),
        Err(e) => Err(OrdoError::Transaction(e.to_string())),
    }
}
