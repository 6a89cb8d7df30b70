use lmdb::{Database, DatabaseFlags, Environment, EnvironmentFlags, Transaction};
use ordo_core::{
    error::{OrdoError, Result},
    keyspace::{
        aggregate_keyspace, format_pointer, key_to_sequence, parse_aggregate_keyspace,
        parse_pointer, sequence_key,
    },
    observe,
    traits::{EventCodec, EventStore},
    types::{CommitInfo, Event, GlobalEntry, Sequence, StoreMeta, StreamInfo, Version},
    validate_events, GlobalEntryMode, StoreConfig, SyncMode,
};
use parking_lot::RwLock;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::keys::{
    db_names, meta_keys, split_stream_key, stream_key, KeyspaceEntry, SCHEMA_VERSION,
};
use crate::meta;
use crate::open_lock::PathClaim;
use crate::scan;
use crate::txn::{lookup_keyspace, AppendTxn};

/// Handles of the named databases inside the environment
#[derive(Debug, Clone, Copy)]
pub struct Databases {
    pub global: Database,
    pub streams: Database,
    pub keyspaces: Database,
    pub meta: Database,
    pub snapshots: Database,
}

/// Open environment. Field order matters: the environment is closed before
/// the path claim is released.
pub(crate) struct StoreInner {
    pub(crate) env: Environment,
    pub(crate) dbs: Databases,
    pub(crate) mode: GlobalEntryMode,
    _claim: PathClaim,
}

/// LMDB-backed event store
///
/// One environment holds every aggregate stream, the global order log, the
/// keyspace registry and the snapshots. LMDB admits a single writer at a time
/// and gives readers a consistent snapshot, which is what keeps global
/// sequence numbers in commit order.
pub struct LmdbEventStore {
    inner: RwLock<Option<Arc<StoreInner>>>,
    codec: Arc<dyn EventCodec>,
    config: StoreConfig,
}

impl LmdbEventStore {
    /// Open (or create) the store described by `cfg`
    pub fn open(cfg: StoreConfig, codec: Arc<dyn EventCodec>) -> Result<Self> {
        cfg.validate()?;

        // Create directory if it doesn't exist
        std::fs::create_dir_all(&cfg.path)?;
        let claim = PathClaim::acquire(&cfg.path, cfg.open_timeout())?;

        // Configure LMDB environment
        let mut env_builder = Environment::new();
        env_builder.set_max_dbs(db_names::COUNT);
        env_builder.set_map_size(cfg.map_size);
        env_builder.set_max_readers(cfg.max_readers);

        let mut flags = EnvironmentFlags::empty();
        match cfg.sync_mode {
            SyncMode::Full => {}
            SyncMode::NoMetaSync => {
                flags.insert(EnvironmentFlags::NO_META_SYNC);
            }
            SyncMode::NoSync => {
                flags.insert(EnvironmentFlags::NO_SYNC);
            }
        }
        env_builder.set_flags(flags);

        let env = env_builder.open(&cfg.path).map_err(|e| {
            OrdoError::Config(format!("could not open store at {}: {}", cfg.path.display(), e))
        })?;

        // Global keyspace first, aggregate streams after it
        let create = |name: &str| {
            env.create_db(Some(name), DatabaseFlags::empty())
                .map_err(|e| OrdoError::Config(format!("could not create {} database: {}", name, e)))
        };
        let dbs = Databases {
            global: create(db_names::GLOBAL_EVENT_ORDER)?,
            streams: create(db_names::AGGREGATE_STREAMS)?,
            keyspaces: create(db_names::KEYSPACES)?,
            meta: create(db_names::META)?,
            snapshots: create(db_names::SNAPSHOTS)?,
        };

        let mode = Self::bootstrap(&env, dbs, &cfg, codec.name())?;

        tracing::info!(
            path = %cfg.path.display(),
            mode = %mode,
            codec = codec.name(),
            "Event store opened"
        );

        Ok(Self {
            inner: RwLock::new(Some(Arc::new(StoreInner {
                env,
                dbs,
                mode,
                _claim: claim,
            }))),
            codec,
            config: cfg,
        })
    }

    /// Initialize metadata in a single startup transaction
    ///
    /// The global entry mode and codec are fixed when the store is created;
    /// reopening with different settings would mix representations.
    fn bootstrap(
        env: &Environment,
        dbs: Databases,
        cfg: &StoreConfig,
        codec_name: &str,
    ) -> Result<GlobalEntryMode> {
        let mut txn = env
            .begin_rw_txn()
            .map_err(|e| OrdoError::Config(e.to_string()))?;

        let now = chrono::Utc::now().to_rfc3339();
        meta::init_meta(&mut txn, dbs.meta, meta_keys::GLOBAL_SEQUENCE, "0")?;
        meta::init_meta(&mut txn, dbs.meta, meta_keys::NEXT_KEYSPACE_ID, "0")?;
        meta::init_meta(&mut txn, dbs.meta, meta_keys::SCHEMA_VERSION, &SCHEMA_VERSION.to_string())?;
        meta::init_meta(&mut txn, dbs.meta, meta_keys::GLOBAL_ENTRY_MODE, cfg.global_entry_mode.as_str())?;
        meta::init_meta(&mut txn, dbs.meta, meta_keys::CODEC, codec_name)?;
        meta::init_meta(&mut txn, dbs.meta, meta_keys::CREATED_AT, &now)?;
        meta::init_meta(&mut txn, dbs.meta, meta_keys::UPDATED_AT, &now)?;

        let stored_mode = meta::get_meta(&txn, dbs.meta, meta_keys::GLOBAL_ENTRY_MODE)?
            .map(|s| GlobalEntryMode::parse(&s))
            .transpose()?
            .unwrap_or_default();
        if stored_mode != cfg.global_entry_mode {
            return Err(OrdoError::Config(format!(
                "store was created with global entry mode '{}', configured '{}'",
                stored_mode, cfg.global_entry_mode
            )));
        }

        let stored_codec = meta::get_meta(&txn, dbs.meta, meta_keys::CODEC)?;
        if stored_codec.as_deref() != Some(codec_name) {
            return Err(OrdoError::Config(format!(
                "store was created with codec '{}', opened with '{}'",
                stored_codec.unwrap_or_default(),
                codec_name
            )));
        }

        let schema_version = meta::get_counter(&txn, dbs.meta, meta_keys::SCHEMA_VERSION)?;
        if schema_version != u64::from(SCHEMA_VERSION) {
            return Err(OrdoError::Config(format!(
                "unsupported schema version {} (expected {})",
                schema_version, SCHEMA_VERSION
            )));
        }

        txn.commit()
            .map_err(|e| OrdoError::Config(e.to_string()))?;

        Ok(stored_mode)
    }

    pub(crate) fn inner(&self) -> Result<Arc<StoreInner>> {
        self.inner
            .read()
            .clone()
            .ok_or_else(|| OrdoError::InvalidState("store is closed".into()))
    }

    pub fn codec(&self) -> &Arc<dyn EventCodec> {
        &self.codec
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().is_none()
    }

    /// Representation used by the global order log
    pub fn global_entry_mode(&self) -> Result<GlobalEntryMode> {
        Ok(self.inner()?.mode)
    }

    /// Whether an aggregate stream has ever been written
    pub fn stream_exists(&self, id: &str, aggregate_type: &str) -> Result<bool> {
        let inner = self.inner()?;
        let txn = inner
            .env
            .begin_ro_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;
        let keyspace = aggregate_keyspace(aggregate_type, id);
        Ok(lookup_keyspace(&txn, inner.dbs, &keyspace)?.is_some())
    }

    /// Every aggregate stream with its last version, in keyspace name order
    pub fn streams(&self) -> Result<Vec<StreamInfo>> {
        let inner = self.inner()?;
        let txn = inner
            .env
            .begin_ro_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;

        let mut streams = Vec::new();
        scan::forward(&txn, inner.dbs.keyspaces, None, |key, value| {
            let keyspace = std::str::from_utf8(key)
                .map_err(|e| OrdoError::Codec(e.to_string()))?;
            let entry = KeyspaceEntry::from_bytes(value)
                .ok_or_else(|| OrdoError::Codec(format!("malformed registry entry for {}", keyspace)))?;
            let (aggregate_type, aggregate_root_id) = parse_aggregate_keyspace(keyspace)
                .ok_or_else(|| OrdoError::Codec(format!("unrecognised keyspace name {}", keyspace)))?;
            streams.push(StreamInfo {
                keyspace: keyspace.to_string(),
                aggregate_type,
                aggregate_root_id,
                last_version: entry.sequence,
            });
            Ok(true)
        })?;

        Ok(streams)
    }

    /// Store metadata
    pub fn meta(&self) -> Result<StoreMeta> {
        let inner = self.inner()?;
        let txn = inner
            .env
            .begin_ro_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;
        let db = inner.dbs.meta;

        let global_sequence = meta::get_counter(&txn, db, meta_keys::GLOBAL_SEQUENCE)?;
        let stream_count = meta::get_counter(&txn, db, meta_keys::NEXT_KEYSPACE_ID)?;
        let schema_version = meta::get_meta(&txn, db, meta_keys::SCHEMA_VERSION)?
            .and_then(|s| s.parse().ok())
            .unwrap_or(SCHEMA_VERSION);
        let codec = meta::get_meta(&txn, db, meta_keys::CODEC)?.unwrap_or_default();
        let created_at = meta::get_meta(&txn, db, meta_keys::CREATED_AT)?.unwrap_or_default();
        let updated_at = meta::get_meta(&txn, db, meta_keys::UPDATED_AT)?.unwrap_or_default();

        Ok(StoreMeta {
            global_sequence,
            stream_count,
            global_entry_mode: inner.mode,
            codec,
            schema_version,
            created_at,
            updated_at,
        })
    }

    /// Decode the last event of a keyspace to learn its current version
    fn current_version(&self, txn: &AppendTxn<'_>, entry: &KeyspaceEntry) -> Result<Version> {
        match txn.last_event(entry)? {
            Some(bytes) => Ok(self.codec.decode(bytes)?.version),
            None => Ok(0),
        }
    }

    fn read_last_version<T: Transaction>(
        &self,
        txn: &T,
        dbs: Databases,
        entry: &KeyspaceEntry,
    ) -> Result<Version> {
        if entry.sequence == 0 {
            return Ok(0);
        }
        let bytes = read_stream_event(txn, dbs, entry.id, entry.sequence)?;
        Ok(self.codec.decode(bytes)?.version)
    }

    /// Turn a global log value into an event
    fn resolve_global<T: Transaction>(
        &self,
        txn: &T,
        inner: &StoreInner,
        value: &[u8],
    ) -> Result<Event> {
        match inner.mode {
            GlobalEntryMode::Copy => self.codec.decode(value),
            GlobalEntryMode::Pointer => {
                let raw = std::str::from_utf8(value)
                    .map_err(|e| OrdoError::Codec(format!("global pointer is not UTF-8: {}", e)))?;
                let (keyspace, seq) = parse_pointer(raw)
                    .ok_or_else(|| OrdoError::Codec(format!("malformed global pointer '{}'", raw)))?;
                let entry = lookup_keyspace(txn, inner.dbs, keyspace)?
                    .ok_or_else(|| OrdoError::NotFound(format!("keyspace {} for pointer '{}'", keyspace, raw)))?;
                let bytes = read_stream_event(txn, inner.dbs, entry.id, seq)?;
                self.codec.decode(bytes)
            }
        }
    }

    /// Refuse bytes that would not read back as the same aggregate event
    ///
    /// A stored event that fails to decode blocks every later append to its
    /// stream, since the current version is read from the last event.
    fn check_decodes(&self, keyspace: &str, event: &Event, bytes: &[u8]) -> Result<()> {
        let decoded = self.codec.decode(bytes).map_err(|e| {
            OrdoError::Codec(format!(
                "event version {} of {} does not decode: {}",
                event.version, keyspace, e
            ))
        })?;
        if decoded.aggregate_type != event.aggregate_type
            || decoded.aggregate_root_id != event.aggregate_root_id
            || decoded.version != event.version
            || decoded.reason != event.reason
        {
            return Err(OrdoError::Codec(format!(
                "event version {} of {} decodes as {}/{} version {}",
                event.version,
                keyspace,
                decoded.aggregate_type,
                decoded.aggregate_root_id,
                decoded.version
            )));
        }
        Ok(())
    }

    fn append_inner(&self, events: &[Event]) -> Result<CommitInfo> {
        let first = &events[0];
        let keyspace = aggregate_keyspace(&first.aggregate_type, &first.aggregate_root_id);

        let inner = self.inner()?;
        let mut txn = AppendTxn::begin(&inner.env, inner.dbs)?;

        let (mut entry, keyspace_created) = txn.open_or_create_keyspace(&keyspace)?;
        let current_version = self.current_version(&txn, &entry)?;

        if let Err(e) = validate_events(&first.aggregate_root_id, current_version, events) {
            tracing::warn!(
                keyspace = %keyspace,
                current_version,
                error = %e,
                "Rejected event batch"
            );
            txn.abort();
            return Err(e);
        }

        let mut first_sequence = None;
        let mut last_sequence = None;
        for event in events {
            let bytes = self.codec.encode(event)?;
            if bytes.len() > self.config.max_event_size_bytes {
                return Err(OrdoError::Validation(format!(
                    "event version {} of {} is {} bytes (max {})",
                    event.version,
                    keyspace,
                    bytes.len(),
                    self.config.max_event_size_bytes
                )));
            }
            self.check_decodes(&keyspace, event, &bytes)?;

            let local = txn.put_stream_event(&keyspace, &mut entry, &bytes)?;

            let value: Cow<'_, [u8]> = match inner.mode {
                GlobalEntryMode::Copy => Cow::Borrowed(&bytes),
                GlobalEntryMode::Pointer => Cow::Owned(format_pointer(&keyspace, local).into_bytes()),
            };
            let global = txn.put_global(&value)?;

            first_sequence.get_or_insert(global);
            last_sequence = Some(global);
        }

        let events_written = txn.events_written();
        txn.commit()?;

        tracing::debug!(
            keyspace = %keyspace,
            events = events_written,
            first_sequence = ?first_sequence,
            last_sequence = ?last_sequence,
            "Appended events"
        );

        Ok(CommitInfo {
            events_written,
            first_sequence,
            last_sequence,
            last_version: Some(entry.sequence),
            keyspace_created,
        })
    }
}

impl EventStore for LmdbEventStore {
    fn append(&self, events: &[Event]) -> Result<CommitInfo> {
        if events.is_empty() {
            return Ok(CommitInfo::empty());
        }

        let started = Instant::now();
        match self.append_inner(events) {
            Ok(info) => {
                observe::record_append(started.elapsed(), info.events_written);
                Ok(info)
            }
            Err(e) => {
                observe::record_rejected(if e.is_conflict() {
                    "conflict"
                } else if matches!(e, OrdoError::Validation(_)) {
                    "invalid"
                } else {
                    "error"
                });
                Err(e)
            }
        }
    }

    fn get(&self, id: &str, aggregate_type: &str, after_version: Version) -> Result<Vec<Event>> {
        let inner = self.inner()?;
        let txn = inner
            .env
            .begin_ro_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;

        let keyspace = aggregate_keyspace(aggregate_type, id);
        let Some(entry) = lookup_keyspace(&txn, inner.dbs, &keyspace)? else {
            return Ok(Vec::new());
        };

        let mut events = Vec::new();
        let start = stream_key(entry.id, after_version.saturating_add(1));
        scan::forward(&txn, inner.dbs.streams, Some(&start), |key, value| {
            match split_stream_key(key) {
                Some((keyspace_id, _)) if keyspace_id == entry.id => {}
                _ => return Ok(false),
            }
            events.push(self.codec.decode(value)?);
            Ok(true)
        })?;

        tracing::debug!(keyspace = %keyspace, after_version, events = events.len(), "Read aggregate stream");
        observe::record_read("aggregate", events.len());
        Ok(events)
    }

    fn global_entries(&self, start: Sequence, count: usize) -> Result<Vec<GlobalEntry>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let inner = self.inner()?;
        let txn = inner
            .env
            .begin_ro_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;

        let mut entries = Vec::new();
        let start_key = sequence_key(start.max(1));
        scan::forward(&txn, inner.dbs.global, Some(&start_key), |key, value| {
            let sequence = key_to_sequence(key)
                .ok_or_else(|| OrdoError::Codec("malformed global sequence key".into()))?;
            let event = self.resolve_global(&txn, &inner, value)?;
            entries.push(GlobalEntry { sequence, event });
            Ok(entries.len() < count)
        })?;

        tracing::debug!(start, count, events = entries.len(), "Read global order log");
        observe::record_read("global", entries.len());
        Ok(entries)
    }

    fn last_version(&self, id: &str, aggregate_type: &str) -> Result<Version> {
        let inner = self.inner()?;
        let txn = inner
            .env
            .begin_ro_txn()
            .map_err(|e| OrdoError::Transaction(e.to_string()))?;

        let keyspace = aggregate_keyspace(aggregate_type, id);
        match lookup_keyspace(&txn, inner.dbs, &keyspace)? {
            Some(entry) => self.read_last_version(&txn, inner.dbs, &entry),
            None => Ok(0),
        }
    }

    fn close(&self) -> Result<()> {
        if self.inner.write().take().is_some() {
            tracing::info!(path = %self.config.path.display(), "Event store closed");
        }
        Ok(())
    }
}

/// Read one stream entry, failing if it is absent
pub(crate) fn read_stream_event<T: Transaction>(
    txn: &T,
    dbs: Databases,
    keyspace_id: u64,
    seq: Sequence,
) -> Result<&[u8]> {
    match txn.get(dbs.streams, &stream_key(keyspace_id, seq)) {
        Ok(bytes) => Ok(bytes),
        Err(lmdb::Error::NotFound) => Err(OrdoError::NotFound(format!(
            "event {} in keyspace {}",
            seq, keyspace_id
        ))),
        Err(e) => Err(OrdoError::Transaction(e.to_string())),
    }
}

/// LMDB data file inside a store directory
pub fn data_file(dir: &Path) -> PathBuf {
    dir.join("data.mdb")
}
