use crate::done_set::DoneSet;
use crate::errors::TrackerError;
use crate::window::CalendarDay;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EXPORT_FILE_NAME: &str = "day-tracker.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub done: Vec<CalendarDay>,
}

pub fn export(done: &DoneSet) -> ExportDocument {
    ExportDocument {
        done: done.all().collect(),
    }
}

pub fn export_json(done: &DoneSet) -> Result<Vec<u8>, TrackerError> {
    Ok(serde_json::to_vec_pretty(&export(done))?)
}

/// Validates an uploaded document without touching any state. Accepts a bare
/// array of ISO dates or an object with a `done` array; every entry must be a
/// valid date or the whole document is rejected.
pub fn parse_import(bytes: &[u8]) -> Result<Vec<CalendarDay>, TrackerError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|err| TrackerError::Parse(format!("Invalid JSON: {err}")))?;

    let entries = match &document {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("done") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(shape_error()),
        },
        _ => return Err(shape_error()),
    };

    entries
        .iter()
        .map(|entry| match entry {
            Value::String(raw) => raw.parse::<CalendarDay>(),
            other => Err(TrackerError::Parse(format!("expected an ISO date, found {other}"))),
        })
        .collect()
}

fn shape_error() -> TrackerError {
    TrackerError::Parse("JSON must be an array or {done: []}".to_string())
}
