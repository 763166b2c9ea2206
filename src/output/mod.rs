// Output formatting: terminal display and JSON.

pub mod terminal;

use anyhow::Result;
use serde::Serialize;

/// Print any serializable result as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
