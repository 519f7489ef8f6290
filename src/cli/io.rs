//! JSON output for the CLI
//!
//! One pretty-printed JSON document per command, written to stdout.

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write `value` as JSON to stdout
pub fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json_to(&mut handle, value)
}

/// Write `value` as JSON followed by a newline
pub fn write_json_to<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
