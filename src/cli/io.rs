//! JSON output for the CLI
//!
//! One JSON object per command on stdout, UTF-8.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use super::errors::CliResult;

/// Wrap `data` in the success envelope
pub fn envelope<T: Serialize>(data: &T) -> CliResult<Value> {
    Ok(serde_json::json!({
        "status": "ok",
        "data": serde_json::to_value(data)?
    }))
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    let response = envelope(data)?;

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope() {
        let value = envelope(&vec!["personnel:t1:1"]).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"][0], "personnel:t1:1");
    }
}
