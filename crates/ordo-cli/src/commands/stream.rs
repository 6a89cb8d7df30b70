//! Print one aggregate's events

use anyhow::{Context, Result};
use ordo::prelude::*;

use super::print_json_line;

pub fn execute(db: &OrdoDb, aggregate_type: &str, id: &str, after: Version) -> Result<()> {
    if !db.stream_exists(id, aggregate_type)? {
        tracing::warn!("No stream for {}/{}", aggregate_type, id);
        return Ok(());
    }

    let events = db
        .get(id, aggregate_type, after)
        .with_context(|| format!("Failed to read stream {}/{}", aggregate_type, id))?;

    let mut out = std::io::stdout().lock();
    for event in &events {
        print_json_line(&mut out, event)?;
    }
    Ok(())
}
