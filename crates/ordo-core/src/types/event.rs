use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{OrdoError, Result};
use crate::keyspace::aggregate_keyspace;

/// Aggregate version - gapless, starts at 1
pub type Version = u64;

/// Position in a keyspace (local stream or global order log) - starts at 1
pub type Sequence = u64;

/// One immutable fact recorded against an aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Schema/behaviour family of the aggregate (e.g. "user")
    pub aggregate_type: String,

    /// Identifier of the aggregate, stable for its lifetime
    pub aggregate_root_id: String,

    /// Position of this event in the aggregate's stream
    pub version: Version,

    /// Event kind used by consumers for dispatch (never empty)
    pub reason: String,

    /// Domain data, opaque to the store
    #[serde(default)]
    pub payload: serde_json::Value,

    #[serde(default)]
    pub metadata: EventMetadata,
}

/// Pass-through event metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,

    /// Custom fields, kept apart from the typed ones above
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom: HashMap<String, serde_json::Value>,
}

impl Event {
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_root_id: impl Into<String>,
        version: Version,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_root_id: aggregate_root_id.into(),
            version,
            reason: reason.into(),
            payload: serde_json::Value::Null,
            metadata: EventMetadata::default(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Serialize a typed payload into the event
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self> {
        self.payload = serde_json::to_value(data).map_err(|e| OrdoError::Codec(e.to_string()))?;
        Ok(self)
    }

    /// Deserialize the payload into a typed value
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| OrdoError::Codec(e.to_string()))
    }

    pub fn with_timestamp(mut self) -> Self {
        self.metadata.timestamp = Some(Utc::now());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    pub fn with_causation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.causation_id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.custom.insert(key.into(), value);
        self
    }

    /// Name of the keyspace holding this event's aggregate stream
    pub fn keyspace(&self) -> String {
        aggregate_keyspace(&self.aggregate_type, &self.aggregate_root_id)
    }
}

/// An event read from the global order log together with its position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalEntry {
    pub sequence: Sequence,
    pub event: Event,
}

/// Information about a committed append
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Number of events written in this commit
    pub events_written: usize,

    /// Global sequence of the first event written (if any)
    pub first_sequence: Option<Sequence>,

    /// Global sequence of the last event written (if any)
    pub last_sequence: Option<Sequence>,

    /// Aggregate version after the commit (if any events were written)
    pub last_version: Option<Version>,

    /// Whether the aggregate keyspace was created by this commit
    pub keyspace_created: bool,
}

impl CommitInfo {
    pub fn empty() -> Self {
        Self {
            events_written: 0,
            first_sequence: None,
            last_sequence: None,
            last_version: None,
            keyspace_created: false,
        }
    }
}
