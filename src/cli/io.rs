//! JSON output for the CLI
//!
//! - One JSON object per line on stdout
//! - Success: `{"status": "ok", "data": ...}`
//! - Failure: `{"status": "error", "code": ..., "message": ...}`

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

fn write_line(value: &serde_json::Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: &impl Serialize) -> CliResult<()> {
    let data = serde_json::to_value(data)?;
    write_line(&serde_json::json!({
        "status": "ok",
        "data": data
    }))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    }))
}
