use anyhow::{Context, Result};
use ordo::prelude::*;

use super::print_json_line;

pub fn execute(db: &OrdoDb, aggregate_type: &str, id: &str) -> Result<()> {
    match db
        .get_snapshot(id, aggregate_type)
        .context("Failed to read snapshot")?
    {
        Some(snapshot) => print_json_line(&mut std::io::stdout().lock(), &snapshot),
        None => {
            println!("No snapshot for {}/{}", aggregate_type, id);
            Ok(())
        }
    }
}
