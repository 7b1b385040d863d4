//! Annotation file writers

use crate::error::{DunyaError, Result};
use crate::types::scalar_text;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Write a single scalar as text
pub fn write_scalar_txt(data: &Value, location: &Path) -> Result<()> {
    let text = scalar_text(data)
        .ok_or_else(|| DunyaError::Parse(format!("expected a scalar, got {}", kind_of(data))))?;
    std::fs::write(location, text)?;

    debug!(path = %location.display(), "Wrote scalar annotation");
    Ok(())
}

/// Write data as pretty-printed JSON
pub fn write_json(data: &Value, location: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(location)?);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| DunyaError::Parse(e.to_string()))?;
    writer.flush()?;

    debug!(path = %location.display(), "Wrote JSON annotation");
    Ok(())
}

/// Write an array of rows as CSV (no header)
///
/// Each row is either an array of scalars or a single scalar.
pub fn write_csv(data: &Value, location: &Path) -> Result<()> {
    let rows = data
        .as_array()
        .ok_or_else(|| DunyaError::Parse(format!("expected rows, got {}", kind_of(data))))?;

    let mut writer = BufWriter::new(File::create(location)?);
    for (index, row) in rows.iter().enumerate() {
        let line = csv_line(row)
            .ok_or_else(|| DunyaError::Parse(format!("row {} is not a flat row", index)))?;
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    debug!(path = %location.display(), rows = rows.len(), "Wrote CSV annotation");
    Ok(())
}

fn csv_line(row: &Value) -> Option<String> {
    match row {
        Value::Array(cells) => cells
            .iter()
            .map(|cell| scalar_text(cell).map(|t| quote_csv(&t)))
            .collect::<Option<Vec<_>>>()
            .map(|cells| cells.join(",")),
        other => scalar_text(other).map(|t| quote_csv(&t)),
    }
}

fn quote_csv(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
