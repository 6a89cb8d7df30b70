//! End-to-end behaviour of appends, aggregate reads and the global order log

use ordo::aggregate_keyspace;
use ordo::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn open_db() -> (TempDir, OrdoDb) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db = OrdoDb::open(temp_dir.path()).unwrap();
    (temp_dir, db)
}

fn user(id: &str, version: Version, reason: &str) -> Event {
    Event::new("user", id, version, reason).with_payload(json!({ "id": id, "v": version }))
}

#[test]
fn test_fresh_stream_returns_batch_in_order() {
    let (_dir, db) = open_db();

    let batch: Vec<Event> = (1..=5).map(|v| user("u1", v, "Touched")).collect();
    let info = db.append(&batch).unwrap();

    assert_eq!(info.events_written, 5);
    assert_eq!(info.first_sequence, Some(1));
    assert_eq!(info.last_sequence, Some(5));
    assert_eq!(info.last_version, Some(5));
    assert!(info.keyspace_created);

    let events = db.get("u1", "user", 0).unwrap();
    assert_eq!(events, batch);
    assert_eq!(db.last_version("u1", "user").unwrap(), 5);
}

#[test]
fn test_created_then_renamed() {
    let (_dir, db) = open_db();

    let created = user("u1", 1, "Created");
    let renamed = user("u1", 2, "Renamed");
    db.append(&[created.clone(), renamed.clone()]).unwrap();

    assert_eq!(
        db.get("u1", "user", 0).unwrap(),
        vec![created.clone(), renamed.clone()]
    );
    assert_eq!(db.get("u1", "user", 1).unwrap(), vec![renamed.clone()]);
    assert!(db.get("u1", "user", 2).unwrap().is_empty());
    assert_eq!(db.global_get(1, 10).unwrap(), vec![created, renamed]);
}

#[test]
fn test_separate_appends_continue_the_stream() {
    let (_dir, db) = open_db();

    db.append(&[user("u1", 1, "Created")]).unwrap();
    let info = db.append(&[user("u1", 2, "Renamed"), user("u1", 3, "Renamed")]).unwrap();

    assert!(!info.keyspace_created);
    assert_eq!(info.first_sequence, Some(2));
    let versions: Vec<_> = db.get("u1", "user", 0).unwrap().iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

#[test]
fn test_two_aggregates_in_commit_order() {
    let (_dir, db) = open_db();

    let u1 = user("u1", 1, "Created");
    let u2 = user("u2", 1, "Created");
    db.append(&[u1.clone()]).unwrap();
    db.append(&[u2.clone()]).unwrap();

    assert_eq!(db.global_get(1, 2).unwrap(), vec![u1, u2]);
}

#[test]
fn test_interleaved_appends_keep_global_order() {
    let (_dir, db) = open_db();

    let ids = ["a", "b", "c"];
    let mut expected = Vec::new();
    for round in 1..=4u64 {
        for id in ids {
            let batch = vec![
                Event::new("account", id, round * 2 - 1, "Debited"),
                Event::new("account", id, round * 2, "Credited"),
            ];
            db.append(&batch).unwrap();
            expected.extend(batch);
        }
    }

    let total = expected.len();
    assert_eq!(total, 24);
    assert_eq!(db.global_get(1, total).unwrap(), expected);

    let entries = db.global_entries(1, total).unwrap();
    let sequences: Vec<_> = entries.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, (1..=total as u64).collect::<Vec<_>>());
}

#[test]
fn test_global_get_bounds() {
    let (_dir, db) = open_db();
    for id in ["u1", "u2", "u3", "u4"] {
        db.append(&[user(id, 1, "Created"), user(id, 2, "Renamed")]).unwrap();
    }

    let entries = db.global_entries(3, 4).unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.sequence >= 3));
    assert_eq!(entries[0].event.aggregate_root_id, "u2");

    // Past the head
    assert!(db.global_get(9, 10).unwrap().is_empty());
    // Asking for more than exists
    assert_eq!(db.global_get(7, 100).unwrap().len(), 2);
    // Zero count
    assert!(db.global_get(1, 0).unwrap().is_empty());
    // Start 0 reads from the first entry
    assert_eq!(db.global_entries(0, 1).unwrap()[0].sequence, 1);
}

#[test]
fn test_unknown_aggregate_is_empty() {
    let (_dir, db) = open_db();
    db.append(&[user("u1", 1, "Created")]).unwrap();

    assert!(db.get("nobody", "user", 0).unwrap().is_empty());
    assert!(db.get("u1", "order", 0).unwrap().is_empty());
    assert_eq!(db.last_version("nobody", "user").unwrap(), 0);
    assert!(!db.stream_exists("nobody", "user").unwrap());
}

#[test]
fn test_empty_batch_is_noop() {
    let (_dir, db) = open_db();

    let info = db.append(&[]).unwrap();
    assert_eq!(info, CommitInfo::empty());
    assert_eq!(db.meta().unwrap().global_sequence, 0);
}

#[test]
fn test_version_conflict_leaves_stream_unchanged() {
    let (_dir, db) = open_db();
    db.append(&[user("u1", 1, "Created"), user("u1", 2, "Renamed")]).unwrap();

    // Stale writer
    let err = db.append(&[user("u1", 2, "Renamed")]).unwrap_err();
    assert!(err.is_conflict());
    match err {
        OrdoError::Concurrency {
            aggregate,
            expected,
            actual,
        } => {
            assert_eq!(aggregate, aggregate_keyspace("user", "u1"));
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Gap
    let err = db.append(&[user("u1", 4, "Renamed")]).unwrap_err();
    assert!(err.is_conflict());

    // Gap inside the batch
    let err = db
        .append(&[user("u1", 3, "Renamed"), user("u1", 5, "Renamed")])
        .unwrap_err();
    assert!(err.is_conflict());

    assert_eq!(db.get("u1", "user", 0).unwrap().len(), 2);
    assert_eq!(db.global_get(1, 10).unwrap().len(), 2);
    assert_eq!(db.last_version("u1", "user").unwrap(), 2);
}

#[test]
fn test_first_event_must_be_version_one() {
    let (_dir, db) = open_db();

    let err = db.append(&[user("u1", 0, "Created")]).unwrap_err();
    assert!(err.is_conflict());
    let err = db.append(&[user("u1", 2, "Created")]).unwrap_err();
    assert!(err.is_conflict());

    assert!(!db.stream_exists("u1", "user").unwrap());
}

#[test]
fn test_empty_reason_rejects_whole_batch() {
    let (_dir, db) = open_db();

    let err = db
        .append(&[user("u1", 1, "Created"), user("u1", 2, ""), user("u1", 3, "Renamed")])
        .unwrap_err();
    assert!(matches!(err, OrdoError::Validation(_)));
    assert!(!err.is_conflict());

    assert!(db.get("u1", "user", 0).unwrap().is_empty());
    assert!(db.global_get(1, 10).unwrap().is_empty());
    assert!(!db.stream_exists("u1", "user").unwrap());

    let meta = db.meta().unwrap();
    assert_eq!(meta.global_sequence, 0);
    assert_eq!(meta.stream_count, 0);
}

#[test]
fn test_mixed_aggregate_batch_writes_nothing() {
    let (_dir, db) = open_db();

    let err = db
        .append(&[user("u1", 1, "Created"), user("u2", 2, "Created")])
        .unwrap_err();
    assert!(matches!(err, OrdoError::MixedBatch(_)));

    let err = db
        .append(&[user("u1", 1, "Created"), Event::new("order", "u1", 2, "Placed")])
        .unwrap_err();
    assert!(matches!(err, OrdoError::MixedBatch(_)));

    assert!(db.get("u1", "user", 0).unwrap().is_empty());
    assert!(db.get("u2", "user", 0).unwrap().is_empty());
    assert!(db.global_get(1, 10).unwrap().is_empty());
}

#[test]
fn test_separator_in_ids_keeps_streams_apart() {
    let (_dir, db) = open_db();

    db.append(&[Event::new("a_b", "c", 1, "Created")]).unwrap();
    db.append(&[Event::new("a", "b_c", 1, "Created")]).unwrap();

    assert_eq!(db.get("c", "a_b", 0).unwrap().len(), 1);
    assert_eq!(db.get("b_c", "a", 0).unwrap().len(), 1);
    assert_eq!(db.streams().unwrap().len(), 2);
}

#[test]
fn test_metadata_survives_storage() {
    let (_dir, db) = open_db();

    let event = user("u1", 1, "Created")
        .with_timestamp()
        .with_correlation_id("req-42")
        .with_causation_id("cmd-7")
        .with_metadata("tenant", json!("acme"));
    db.append(&[event.clone()]).unwrap();

    let stored = &db.get("u1", "user", 0).unwrap()[0];
    assert_eq!(stored, &event);
    assert_eq!(stored.metadata.custom["tenant"], json!("acme"));
}

#[test]
fn test_batch_builder_cycle() {
    let (_dir, db) = open_db();

    let batch = db
        .batch("user", "u1")
        .unwrap()
        .push("Created", json!({"name": "alice"}))
        .push("Renamed", json!({"name": "alicia"}));
    db.append(&batch).unwrap();

    let batch = db.batch("user", "u1").unwrap().push("Renamed", json!({"name": "al"}));
    assert_eq!(batch.expected_version(), 3);
    db.append(&batch).unwrap();

    // A batch built before the last append is stale
    let stale = EventBatch::new("user", "u1", 2).push("Renamed", json!({}));
    assert!(db.append(&stale).unwrap_err().is_conflict());

    let names: Vec<String> = db
        .get("u1", "user", 0)
        .unwrap()
        .iter()
        .map(|e| e.payload["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["alice", "alicia", "al"]);
}

#[test]
fn test_replay_pages_through_everything() {
    let (_dir, db) = open_db();
    for id in 0..7 {
        let batch = db
            .batch("sensor", &format!("s{id}"))
            .unwrap()
            .push("Reading", json!(id))
            .push("Reading", json!(id * 10));
        db.append(&batch).unwrap();
    }

    let mut seen = Vec::new();
    let next = db
        .replay(1, 3, |entry| {
            seen.push(entry.sequence);
            Ok(())
        })
        .unwrap();
    assert_eq!(seen, (1..=14).collect::<Vec<_>>());
    assert_eq!(next, 15);

    // Resume from the returned position
    let mut more = 0;
    db.append(&db.batch("sensor", "s0").unwrap().push("Reading", json!(1))).unwrap();
    let next = db
        .replay(next, 3, |_| {
            more += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(more, 1);
    assert_eq!(next, 16);
}

#[test]
fn test_replay_stops_on_handler_error() {
    let (_dir, db) = open_db();
    db.append(&[user("u1", 1, "Created"), user("u1", 2, "Renamed")]).unwrap();

    let mut calls = 0;
    let err = db
        .replay(1, 10, |_| {
            calls += 1;
            Err(OrdoError::InvalidState("projection failed".into()))
        })
        .unwrap_err();
    assert!(matches!(err, OrdoError::InvalidState(_)));
    assert_eq!(calls, 1);
}
