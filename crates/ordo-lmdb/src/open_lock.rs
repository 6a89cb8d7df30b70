//! Process-wide exclusive claims on store directories
//!
//! LMDB forbids opening the same environment twice within one process, so a
//! second `open` on a path waits (bounded) until the first handle is dropped.

use ordo_core::error::{OrdoError, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

static CLAIMS: Mutex<BTreeSet<PathBuf>> = parking_lot::const_mutex(BTreeSet::new());
static RELEASED: Condvar = Condvar::new();

/// Exclusive claim on a store directory, released on drop
#[derive(Debug)]
pub struct PathClaim {
    path: PathBuf,
}

impl PathClaim {
    /// Claim `path`, waiting up to `timeout` for a current holder to release it
    ///
    /// The directory must exist; claims are keyed by its canonical path.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let path = path.canonicalize()?;
        let deadline = Instant::now() + timeout;

        let mut claims = CLAIMS.lock();
        while claims.contains(&path) {
            if RELEASED.wait_until(&mut claims, deadline).timed_out() && claims.contains(&path) {
                return Err(OrdoError::Timeout(format!(
                    "store at {} is already open (waited {:?})",
                    path.display(),
                    timeout
                )));
            }
        }
        claims.insert(path.clone());

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PathClaim {
    fn drop(&mut self) {
        CLAIMS.lock().remove(&self.path);
        RELEASED.notify_all();
    }
}
