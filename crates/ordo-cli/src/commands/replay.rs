//! Replay command implementation
//!
//! Walks the global order log page by page so large stores never have to be
//! held in memory at once.

use anyhow::{Context, Result};
use ordo::db::DEFAULT_REPLAY_PAGE;
use ordo::prelude::*;

use super::print_json_line;

pub fn execute(db: &OrdoDb, start: Sequence, count: Option<usize>) -> Result<()> {
    let mut out = std::io::stdout().lock();

    let next = match count {
        Some(count) => {
            let entries = db
                .global_entries(start, count)
                .context("Failed to read global order log")?;
            for entry in &entries {
                print_json_line(&mut out, entry)?;
            }
            entries.last().map(|e| e.sequence + 1).unwrap_or(start)
        }
        None => {
            let mut failed = None;
            let next = db
                .replay(start, DEFAULT_REPLAY_PAGE, |entry| {
                    if let Err(e) = print_json_line(&mut out, entry) {
                        failed = Some(e);
                        return Err(OrdoError::InvalidState("output closed".into()));
                    }
                    Ok(())
                });
            if let Some(e) = failed {
                return Err(e);
            }
            next.context("Failed to read global order log")?
        }
    };

    tracing::info!(next, "Replay finished");
    Ok(())
}
