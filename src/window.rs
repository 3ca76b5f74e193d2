use crate::errors::TrackerError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Number of months covered by the tracker, current month included.
pub const WINDOW_MONTHS: usize = 12;

/// A single local calendar date. The ISO form `YYYY-MM-DD` is its only
/// external representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// Builds a day from a 0-based month, returning `None` for impossible dates.
    pub fn new(year: i32, month0: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month0 + 1, day).map(Self)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month0(self) -> u32 {
        self.0.month0()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    /// Sunday starts a week in the rendered grid.
    pub fn is_week_start(self) -> bool {
        self.0.weekday().num_days_from_sunday() == 0
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDay {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|err| TrackerError::Parse(format!("invalid date '{s}': {err}")))
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBucket {
    pub year: i32,
    pub month0: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthBucket {
    /// Short human label such as `Mar 2024`.
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month0 + 1, 1) {
            Some(first) => first.format("%b %Y").to_string(),
            None => format!("{}-{:02}", self.year, self.month0 + 1),
        }
    }
}

/// The rolling window of months ending at the month containing `today`.
///
/// `buckets()[0]` is the current month and each following bucket is one
/// calendar month earlier. The current month keeps its future days; earlier
/// months only hold days up to `today`.
#[derive(Debug, Clone)]
pub struct DateWindow {
    today: CalendarDay,
    buckets: Vec<MonthBucket>,
}

impl DateWindow {
    pub fn ending_at(today: CalendarDay) -> Self {
        let anchor = today.year() * 12 + today.month0() as i32;
        let buckets = (0..WINDOW_MONTHS)
            .map(|offset| {
                let index = anchor - offset as i32;
                let year = index.div_euclid(12);
                let month0 = index.rem_euclid(12) as u32;
                let days = (1..=days_in_month(year, month0))
                    .filter_map(|day| CalendarDay::new(year, month0, day))
                    .take_while(|day| offset == 0 || *day <= today)
                    .collect();
                MonthBucket { year, month0, days }
            })
            .collect();

        Self { today, buckets }
    }

    pub fn today(&self) -> CalendarDay {
        self.today
    }

    /// Current month first.
    pub fn buckets(&self) -> &[MonthBucket] {
        &self.buckets
    }

    /// Oldest month first, the order rows are displayed in.
    pub fn chronological(&self) -> impl Iterator<Item = &MonthBucket> {
        self.buckets.iter().rev()
    }

    pub fn days(&self) -> impl Iterator<Item = CalendarDay> + '_ {
        self.chronological().flat_map(|bucket| bucket.days.iter().copied())
    }

    pub fn first_day(&self) -> Option<CalendarDay> {
        self.buckets.last().and_then(|bucket| bucket.days.first().copied())
    }

    pub fn last_day(&self) -> Option<CalendarDay> {
        self.buckets.first().and_then(|bucket| bucket.days.last().copied())
    }
}

fn days_in_month(year: i32, month0: u32) -> u32 {
    let (next_year, next_month) = if month0 == 11 { (year + 1, 1) } else { (year, month0 + 2) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}
