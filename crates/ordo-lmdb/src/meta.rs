//! Meta database access
//!
//! Values are stored as UTF-8 strings. Counters are parsed as `u64`.

use lmdb::{Database, RwTransaction, Transaction, WriteFlags};
use ordo_core::error::{OrdoError, Result};

/// Get meta value
pub fn get_meta<T: Transaction>(txn: &T, db: Database, key: &str) -> Result<Option<String>> {
    match txn.get(db, &key) {
        Ok(bytes) => {
            let value = std::str::from_utf8(bytes)
                .map_err(|e| OrdoError::Codec(e.to_string()))?
                .to_string();
            Ok(Some(value))
        }
        Err(lmdb::Error::NotFound) => Ok(None),
        Err(e) => Err(OrdoError::Transaction(e.to_string())),
    }
}

/// Get a numeric meta value (0 when unset)
pub fn get_counter<T: Transaction>(txn: &T, db: Database, key: &str) -> Result<u64> {
    match get_meta(txn, db, key)? {
        Some(value) => value
            .parse::<u64>()
            .map_err(|e| OrdoError::Codec(format!("meta key '{}': {}", key, e))),
        None => Ok(0),
    }
}

/// Set meta value
pub fn set_meta(txn: &mut RwTransaction, db: Database, key: &str, value: &str) -> Result<()> {
    txn.put(db, &key, &value, WriteFlags::empty())
        .map_err(|e| OrdoError::Transaction(e.to_string()))
}

/// Set meta value only if the key is absent
pub fn init_meta(txn: &mut RwTransaction, db: Database, key: &str, value: &str) -> Result<()> {
    if get_meta(&*txn, db, key)?.is_none() {
        set_meta(txn, db, key, value)?;
    }
    Ok(())
}

/// Increment a counter and return the new value
pub fn increment_counter(txn: &mut RwTransaction, db: Database, key: &str) -> Result<u64> {
    let next = get_counter(&*txn, db, key)?
        .checked_add(1)
        .ok_or_else(|| OrdoError::InvalidState(format!("counter '{}' overflowed", key)))?;
    set_meta(txn, db, key, &next.to_string())?;
    Ok(next)
}
