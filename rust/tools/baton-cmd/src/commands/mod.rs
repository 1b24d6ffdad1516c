//! Command implementations for baton-cmd

use anyhow::{Context, Result};
use serde::Serialize;

pub mod exchange;
pub mod relay;

/// Prints a command summary as pretty JSON on stdout.
pub fn print_summary<T: Serialize>(summary: &T) -> Result<()> {
    let json =
        serde_json::to_string_pretty(summary).context("Failed to serialize summary to JSON")?;
    println!("{json}");
    Ok(())
}
