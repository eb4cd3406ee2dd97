use std::io;

use chrono::{DateTime, Utc};
use logrestore_models::logging::{LogEntry, LogEntryBatch, RESTORE_SOURCE, RESTORE_SUBJECT};
use serde::Serialize;
use serde_json::{Value, ser::Formatter};

use crate::error::LineError;

const ENTRY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Compact JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Drop every `{`, `}`, `"` and `\`; everything else is kept as is.
pub fn strip_structure(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '{' | '}' | '"' | '\\'))
        .collect()
}

/// Serialize `data` back to JSON text, keys in their original order, and
/// strip the structural characters. Lossy: the result is plain text.
pub fn flatten_data(data: &Value) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    data.serialize(&mut serializer)?;
    Ok(strip_structure(&String::from_utf8_lossy(&out)))
}

/// Turn one archived line `{"id", "time", "data", ...}` into a log entry.
pub fn reshape_line(line: &str) -> Result<LogEntry, LineError> {
    let value: Value = serde_json::from_str(line)?;
    let fields = value.as_object().ok_or(LineError::NotAnObject)?;

    let data = fields.get("data").ok_or(LineError::MissingField("data"))?;
    Ok(LogEntry {
        data: flatten_data(data)?,
        id: text_field(fields.get("id"), "id")?,
        time: text_field(fields.get("time"), "time")?,
    })
}

fn text_field(value: Option<&Value>, name: &'static str) -> Result<String, LineError> {
    match value {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Err(LineError::MissingField(name)),
        Some(other) => Ok(other.to_string()),
    }
}

/// The single batch an archive object is submitted as.
pub fn build_batch(entries: Vec<LogEntry>, now: DateTime<Utc>) -> LogEntryBatch {
    LogEntryBatch {
        entries,
        source: RESTORE_SOURCE.to_string(),
        kind: RESTORE_SOURCE.to_string(),
        subject: RESTORE_SUBJECT.to_string(),
        defaultlogentrytime: now.format(ENTRY_TIME_FORMAT).to_string(),
    }
}
