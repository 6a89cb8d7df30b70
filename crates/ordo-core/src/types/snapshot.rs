use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{OrdoError, Result};
use crate::types::event::Version;

/// Saved aggregate state at a given version
///
/// Snapshots live beside the event log and are never consulted by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub aggregate_type: String,
    pub aggregate_root_id: String,

    /// Version of the last event folded into `state`
    pub version: Version,

    pub state: serde_json::Value,

    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new<T: Serialize>(
        aggregate_type: impl Into<String>,
        aggregate_root_id: impl Into<String>,
        version: Version,
        state: &T,
    ) -> Result<Self> {
        let state = serde_json::to_value(state).map_err(|e| OrdoError::Codec(e.to_string()))?;
        Ok(Self {
            aggregate_type: aggregate_type.into(),
            aggregate_root_id: aggregate_root_id.into(),
            version,
            state,
            taken_at: Utc::now(),
        })
    }

    /// Deserialize the saved state
    pub fn state<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.state.clone()).map_err(|e| OrdoError::Codec(e.to_string()))
    }
}
