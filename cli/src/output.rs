//! JSON output for command results.

use std::io::Write;

use serde_json::Value;

use crate::error::CliError;

/// Writes one result per run, pretty-printed unless compact.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    compact: bool,
}

impl Output {
    #[must_use]
    pub const fn new(compact: bool) -> Self {
        Self { compact }
    }

    /// Write `value` followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W: Write>(&self, writer: &mut W, value: &Value) -> Result<(), CliError> {
        let written = if self.compact {
            serde_json::to_writer(&mut *writer, value)
        } else {
            serde_json::to_writer_pretty(&mut *writer, value)
        };
        written.map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
        writeln!(writer)?;
        Ok(())
    }
}
