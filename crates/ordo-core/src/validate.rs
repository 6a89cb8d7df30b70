//! Optimistic concurrency validation for append batches
//!
//! Must run inside the same write transaction that read `current_version`,
//! otherwise a concurrent writer can slip in between the read and the write.

use crate::error::{OrdoError, Result};
use crate::keyspace::aggregate_keyspace;
use crate::types::{Event, Version};

/// Check that `events` continue the stream of `aggregate_id` at `current_version`
///
/// Every event must belong to the same aggregate (id and type), carry the next
/// version in sequence and name a reason. The first failure is returned.
pub fn validate_events(aggregate_id: &str, current_version: Version, events: &[Event]) -> Result<()> {
    let Some(first) = events.first() else {
        return Ok(());
    };
    let aggregate_type = first.aggregate_type.as_str();
    let mut current_version = current_version;

    for event in events {
        if event.aggregate_root_id != aggregate_id {
            return Err(OrdoError::MixedBatch(format!(
                "expected aggregate id '{}', found '{}'",
                aggregate_id, event.aggregate_root_id
            )));
        }

        if event.aggregate_type != aggregate_type {
            return Err(OrdoError::MixedBatch(format!(
                "expected aggregate type '{}', found '{}'",
                aggregate_type, event.aggregate_type
            )));
        }

        let expected = current_version.checked_add(1).ok_or_else(|| {
            OrdoError::Validation(format!(
                "{} cannot grow past version {}",
                aggregate_keyspace(aggregate_type, aggregate_id),
                current_version
            ))
        })?;
        if event.version != expected {
            return Err(OrdoError::Concurrency {
                aggregate: aggregate_keyspace(aggregate_type, aggregate_id),
                expected,
                actual: event.version,
            });
        }

        if event.reason.is_empty() {
            return Err(OrdoError::Validation(format!(
                "event version {} holds no reason",
                event.version
            )));
        }

        current_version = event.version;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(id: &str, from: Version, reasons: &[&str]) -> Vec<Event> {
        reasons
            .iter()
            .enumerate()
            .map(|(i, reason)| Event::new("user", id, from + i as Version, *reason))
            .collect()
    }

    #[test]
    fn test_sequential_batch_passes() {
        let events = batch("u1", 1, &["Created", "Renamed", "Renamed"]);
        assert!(validate_events("u1", 0, &events).is_ok());

        let events = batch("u1", 4, &["Renamed"]);
        assert!(validate_events("u1", 3, &events).is_ok());
    }

    #[test]
    fn test_empty_batch_passes() {
        assert!(validate_events("u1", 9, &[]).is_ok());
    }

    #[test]
    fn test_stale_version_conflicts() {
        let events = batch("u1", 2, &["Renamed"]);
        match validate_events("u1", 2, &events) {
            Err(OrdoError::Concurrency {
                aggregate,
                expected,
                actual,
            }) => {
                assert_eq!(aggregate, "user_u1");
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected concurrency conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_gap_inside_batch_conflicts() {
        let mut events = batch("u1", 1, &["Created", "Renamed"]);
        events[1].version = 3;
        let err = validate_events("u1", 0, &events).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_foreign_aggregate_id_rejected() {
        let mut events = batch("u1", 1, &["Created"]);
        events.push(Event::new("user", "u2", 2, "Created"));
        let err = validate_events("u1", 0, &events).unwrap_err();
        assert!(matches!(err, OrdoError::MixedBatch(_)));
    }

    #[test]
    fn test_foreign_aggregate_type_rejected() {
        let mut events = batch("u1", 1, &["Created"]);
        events.push(Event::new("order", "u1", 2, "Placed"));
        let err = validate_events("u1", 0, &events).unwrap_err();
        assert!(matches!(err, OrdoError::MixedBatch(_)));
    }

    #[test]
    fn test_empty_reason_rejected() {
        let events = batch("u1", 1, &["Created", ""]);
        let err = validate_events("u1", 0, &events).unwrap_err();
        assert!(matches!(err, OrdoError::Validation(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_version_at_top_of_range_rejected() {
        let events = vec![Event::new("user", "u1", Version::MAX, "Renamed")];
        let err = validate_events("u1", Version::MAX, &events).unwrap_err();
        assert!(matches!(err, OrdoError::Validation(_)));
    }
}
