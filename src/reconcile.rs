use crate::done_set::DoneSet;
use crate::window::CalendarDay;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Event fields that may carry the day an event happened on, in lookup order.
pub const EVENT_DATE_FIELDS: [&str; 4] = ["start", "start_time", "start_date", "start_date_time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayState {
    Done,
    NotDone,
    Neutral,
}

impl DayState {
    pub fn class(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::NotDone => "not-done",
            Self::Neutral => "neutral",
        }
    }
}

/// Display state of a single day. Depends only on its arguments, so it can be
/// re-derived after any mutation without leftover state from earlier passes.
pub fn day_state(day: CalendarDay, done: &DoneSet, today: CalendarDay) -> DayState {
    if done.contains(day) {
        DayState::Done
    } else if day < today {
        DayState::NotDone
    } else {
        DayState::Neutral
    }
}

/// Adds the day of every dated event to `done`, returning how many were new.
/// Events without a usable date are skipped; nothing is ever removed.
pub fn merge_events<'a>(done: &mut DoneSet, events: impl IntoIterator<Item = &'a Value>) -> usize {
    done.merge(events.into_iter().filter_map(event_day))
}

/// The first recognised start field that parses, as a calendar day.
pub fn event_day(event: &Value) -> Option<CalendarDay> {
    EVENT_DATE_FIELDS
        .iter()
        .filter_map(|field| event.get(field))
        .find_map(value_day)
}

fn value_day(value: &Value) -> Option<CalendarDay> {
    match value {
        Value::String(raw) => parse_day(raw),
        // Home Assistant nests the start as {"dateTime": ..} or {"date": ..}.
        Value::Object(map) => ["dateTime", "date"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .find_map(parse_day),
        _ => None,
    }
}

/// Accepts RFC 3339 timestamps, naive timestamps and plain dates. A timestamp
/// with an offset counts on its UTC day, whatever zone the server runs in.
pub fn parse_day(raw: &str) -> Option<CalendarDay> {
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(CalendarDay::from_date(stamp.with_timezone(&Utc).date_naive()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(CalendarDay::from_date(naive.date()));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(CalendarDay::from_date)
}
