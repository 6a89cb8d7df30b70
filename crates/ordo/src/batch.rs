//! Building append batches
//!
//! The store only accepts a batch whose first version is exactly one past the
//! stream's last version. `EventBatch` numbers events from the version the
//! caller last observed, so the usual optimistic cycle is:
//!
//! ```no_run
//! use ordo::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let db = OrdoDb::open("./data")?;
//!
//! loop {
//!     let batch = db
//!         .batch("user", "u1")?
//!         .push("Renamed", serde_json::json!({"name": "bob"}));
//!     match db.append(&batch) {
//!         Err(e) if e.is_conflict() => continue, // someone else wrote first
//!         result => {
//!             result?;
//!             break;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use serde::Serialize;

use crate::{Event, OrdoError, Result, Version};

/// Events for one aggregate with consecutive versions
#[derive(Debug, Clone)]
pub struct EventBatch {
    aggregate_type: String,
    aggregate_root_id: String,
    base_version: Version,
    events: Vec<Event>,
}

impl EventBatch {
    /// Start a batch on top of `current_version` (0 for a new aggregate)
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_root_id: impl Into<String>,
        current_version: Version,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_root_id: aggregate_root_id.into(),
            base_version: current_version,
            events: Vec::new(),
        }
    }

    /// Add an event with the next version
    pub fn push(mut self, reason: impl Into<String>, payload: serde_json::Value) -> Self {
        let event = self.next_event(reason).with_payload(payload);
        self.events.push(event);
        self
    }

    /// Add an event with a typed payload
    pub fn push_data<T: Serialize>(mut self, reason: impl Into<String>, data: &T) -> Result<Self> {
        let event = self.next_event(reason).with_data(data)?;
        self.events.push(event);
        Ok(self)
    }

    /// Add a fully built event, renumbering it to the next version
    ///
    /// The event must target this batch's aggregate.
    pub fn push_event(mut self, mut event: Event) -> Result<Self> {
        if event.aggregate_type != self.aggregate_type
            || event.aggregate_root_id != self.aggregate_root_id
        {
            return Err(OrdoError::MixedBatch(format!(
                "batch for {}/{} cannot take an event for {}/{}",
                self.aggregate_type,
                self.aggregate_root_id,
                event.aggregate_type,
                event.aggregate_root_id
            )));
        }
        event.version = self.next_version();
        self.events.push(event);
        Ok(self)
    }

    // Saturates at the top of the range; the store rejects such a batch.
    fn next_version(&self) -> Version {
        self.expected_version().saturating_add(1)
    }

    fn next_event(&self, reason: impl Into<String>) -> Event {
        Event::new(
            self.aggregate_type.clone(),
            self.aggregate_root_id.clone(),
            self.next_version(),
            reason,
        )
    }

    /// Version the stream will be at once this batch is committed
    pub fn expected_version(&self) -> Version {
        self.base_version.saturating_add(self.events.len() as Version)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::ops::Deref for EventBatch {
    type Target = [Event];

    fn deref(&self) -> &[Event] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_versions_continue_from_base() {
        let batch = EventBatch::new("user", "u1", 4)
            .push("Renamed", json!({"name": "a"}))
            .push("Renamed", json!({"name": "b"}));

        let versions: Vec<_> = batch.events().iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![5, 6]);
        assert_eq!(batch.expected_version(), 6);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_batch_passes_validation() {
        let batch = EventBatch::new("user", "u1", 0)
            .push("Created", json!({}))
            .push("Renamed", json!({"name": "b"}));
        assert!(crate::validate_events("u1", 0, &batch).is_ok());
    }

    #[test]
    fn test_push_event_renumbers() {
        let batch = EventBatch::new("user", "u1", 2)
            .push_event(Event::new("user", "u1", 99, "Renamed"))
            .unwrap();
        assert_eq!(batch.events()[0].version, 3);
    }

    #[test]
    fn test_push_event_rejects_other_aggregate() {
        let err = EventBatch::new("user", "u1", 0)
            .push_event(Event::new("user", "u2", 1, "Created"))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_versions_saturate_at_the_top() {
        let batch = EventBatch::new("user", "u1", Version::MAX - 1)
            .push("Renamed", json!({}))
            .push("Renamed", json!({}));

        let versions: Vec<_> = batch.events().iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![Version::MAX, Version::MAX]);
        assert!(matches!(
            crate::validate_events("u1", Version::MAX - 1, &batch),
            Err(OrdoError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_batch() {
        let batch = EventBatch::new("user", "u1", 7);
        assert!(batch.is_empty());
        assert_eq!(batch.expected_version(), 7);
    }
}
