//! Status command implementation

use anyhow::{Context, Result};
use ordo::prelude::*;

pub fn execute(db: &OrdoDb) -> Result<()> {
    tracing::info!("Checking store status: {}", db.path().display());

    let meta = db.meta().context("Failed to read store metadata")?;

    println!("\nStore Status");
    println!("{}", "=".repeat(60));
    println!("Path: {}", db.path().display());
    if let Ok(file) = std::fs::metadata(ordo::data_file(db.path())) {
        println!("Data File Size: {} bytes", file.len());
    }
    println!("Schema Version: {}", meta.schema_version);
    println!("Codec: {}", meta.codec);
    println!("Global Entry Mode: {}", meta.global_entry_mode);
    println!("Created: {}", meta.created_at);
    println!("Updated: {}", meta.updated_at);

    println!("\nGlobal Order Log:");
    println!("  Last Sequence: {}", meta.global_sequence);
    println!("  Aggregate Streams: {}", meta.stream_count);

    Ok(())
}
