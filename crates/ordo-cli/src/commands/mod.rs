pub mod replay;
pub mod snapshot;
pub mod status;
pub mod stream;
pub mod streams;

use anyhow::{Context, Result};
use ordo::prelude::Serialize;
use std::io::Write;

/// Write one value as a JSON line on stdout
pub(crate) fn print_json_line<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("Failed to encode output")?;
    writeln!(out).context("Failed to write output")?;
    Ok(())
}
