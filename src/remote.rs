//! Best-effort event fetching from a Home Assistant style calendar API.
//!
//! Each entity is tried against an ordered list of transport strategies. A
//! strategy either yields events, yields nothing usable, or fails; only the
//! first case stops the chain. Failures are logged and never surfaced.

use crate::window::DateWindow;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error("{strategy}: request failed: {source}")]
    Request {
        strategy: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{strategy}: server answered {status}")]
    Status {
        strategy: &'static str,
        status: StatusCode,
    },
}

/// Names of the query parameters carrying the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeParams {
    StartEnd,
    StartTimeEndTime,
}

impl RangeParams {
    fn keys(self) -> (&'static str, &'static str) {
        match self {
            Self::StartEnd => ("start", "end"),
            Self::StartTimeEndTime => ("start_time", "end_time"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Bearer,
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub name: &'static str,
    pub params: RangeParams,
    pub auth: Auth,
}

pub const DEFAULT_STRATEGIES: [Strategy; 3] = [
    Strategy {
        name: "bearer-start-end",
        params: RangeParams::StartEnd,
        auth: Auth::Bearer,
    },
    Strategy {
        name: "bearer-start-time",
        params: RangeParams::StartTimeEndTime,
        auth: Auth::Bearer,
    },
    Strategy {
        name: "anonymous",
        params: RangeParams::StartTimeEndTime,
        auth: Auth::Anonymous,
    },
];

/// RFC 3339 bounds of a window: the first day at midnight to the last day at
/// 23:59:59, both in `tz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRange {
    pub start: String,
    pub end: String,
}

impl FetchRange {
    pub fn for_window<Tz: TimeZone>(window: &DateWindow, tz: &Tz) -> Option<Self>
    where
        Tz::Offset: std::fmt::Display,
    {
        let first = window.first_day()?.date().and_hms_opt(0, 0, 0)?;
        let last = window.last_day()?.date().and_hms_opt(23, 59, 59)?;
        let start = resolve_local(tz, first, tz.from_local_datetime(&first).earliest());
        let end = resolve_local(tz, last, tz.from_local_datetime(&last).latest());

        Some(Self {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        })
    }
}

/// A bound that falls in a DST gap is read as UTC instead.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime, found: Option<DateTime<Tz>>) -> DateTime<Tz> {
    found.unwrap_or_else(|| {
        warn!("{naive} does not exist in the local zone, using it as UTC");
        tz.from_utc_datetime(&naive)
    })
}

#[derive(Debug, Clone)]
pub struct CalendarClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    strategies: Vec<Strategy>,
}

impl CalendarClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            strategies: DEFAULT_STRATEGIES.to_vec(),
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Events for every entity, queried one after another. Entities with no
    /// usable data contribute nothing.
    pub async fn fetch_all(&self, entities: &[String], range: &FetchRange) -> Vec<Value> {
        let mut events = Vec::new();
        for entity in entities {
            match self.fetch_events(entity, range).await {
                Some(found) => {
                    debug!("{entity}: {} event(s)", found.len());
                    events.extend(found);
                }
                None => warn!("{entity}: no calendar data from any transport"),
            }
        }
        events
    }

    /// The first strategy that produces a usable event list wins.
    pub async fn fetch_events(&self, entity: &str, range: &FetchRange) -> Option<Vec<Value>> {
        for strategy in &self.strategies {
            if strategy.auth == Auth::Bearer && self.token.is_none() {
                debug!("{entity}: skipping {} without a token", strategy.name);
                continue;
            }
            match self.try_strategy(strategy, entity, range).await {
                Ok(Some(events)) => return Some(events),
                Ok(None) => debug!("{entity}: {} returned no usable data", strategy.name),
                Err(err) => debug!("{entity}: {err}"),
            }
        }
        None
    }

    pub async fn try_strategy(
        &self,
        strategy: &Strategy,
        entity: &str,
        range: &FetchRange,
    ) -> Result<Option<Vec<Value>>, TransportFailure> {
        let (start_key, end_key) = strategy.params.keys();
        let mut request = self
            .http
            .get(format!("{}/api/calendars/{entity}", self.base_url))
            .query(&[(start_key, range.start.as_str()), (end_key, range.end.as_str())]);
        if let (Auth::Bearer, Some(token)) = (strategy.auth, &self.token) {
            request = request.bearer_auth(token);
        }

        let failed = |source| TransportFailure::Request {
            strategy: strategy.name,
            source,
        };
        let response = request.send().await.map_err(failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::Status {
                strategy: strategy.name,
                status,
            });
        }

        let body: Value = response.json().await.map_err(failed)?;
        Ok(usable_events(body))
    }
}

/// A bare array, or an object wrapping one under `events`.
fn usable_events(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(events) => Some(events),
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(events)) => Some(events),
            _ => None,
        },
        _ => None,
    }
}
