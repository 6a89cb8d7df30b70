//! Forward cursor scans
//!
//! Positions an LMDB cursor at the smallest key >= `start` (or the first key)
//! and walks forward until the visitor asks to stop or the database ends.
//! Cursor errors are propagated instead of panicking inside an iterator.

use lmdb::{Cursor, Database, Transaction};
use ordo_core::error::{OrdoError, Result};

/// Visit entries of `db` in key order starting at `start`
///
/// `visit` returns `Ok(true)` to continue and `Ok(false)` to stop.
pub fn forward<T, F>(txn: &T, db: Database, start: Option<&[u8]>, mut visit: F) -> Result<()>
where
    T: Transaction,
    F: FnMut(&[u8], &[u8]) -> Result<bool>,
{
    let cursor = txn
        .open_ro_cursor(db)
        .map_err(|e| OrdoError::Transaction(e.to_string()))?;

    let mut next = match start {
        Some(key) => cursor.get(Some(key), None, lmdb_sys::MDB_SET_RANGE),
        None => cursor.get(None, None, lmdb_sys::MDB_FIRST),
    };

    loop {
        match next {
            Ok((Some(key), value)) => {
                if !visit(key, value)? {
                    break;
                }
            }
            Ok((None, _)) | Err(lmdb::Error::NotFound) => break,
            Err(e) => return Err(OrdoError::Transaction(e.to_string())),
        }
        next = cursor.get(None, None, lmdb_sys::MDB_NEXT);
    }

    Ok(())
}
