use anyhow::{Context, Result};
use ordo::prelude::*;

use super::print_json_line;

pub fn execute(db: &OrdoDb) -> Result<()> {
    let streams = db.streams().context("Failed to list streams")?;
    let mut out = std::io::stdout().lock();
    for stream in &streams {
        print_json_line(&mut out, stream)?;
    }
    tracing::debug!(streams = streams.len(), "Listed streams");
    Ok(())
}
