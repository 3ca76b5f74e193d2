use crate::errors::TrackerError;
use std::{env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TITLE: &str = "Day Tracker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub static_root: PathBuf,
    pub title: String,
    pub calendar: Option<CalendarConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, TrackerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TrackerError> {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = value("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_path = value("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/state.json"));
        let static_root = value("TRACKER_STATIC_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("public"));
        let title = value("TRACKER_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let calendar = match value("TRACKER_CALENDAR_URL") {
            Some(base_url) => {
                // The list, when given, replaces the single entity.
                let entities: Vec<String> = match value("TRACKER_ENTITIES") {
                    Some(list) => list
                        .split(',')
                        .map(str::trim)
                        .filter(|entity| !entity.is_empty())
                        .map(str::to_string)
                        .collect(),
                    None => value("TRACKER_ENTITY").into_iter().collect(),
                };
                if entities.is_empty() {
                    return Err(TrackerError::Config(
                        "TRACKER_CALENDAR_URL is set but no calendar entity is configured (TRACKER_ENTITY or TRACKER_ENTITIES)"
                            .to_string(),
                    ));
                }
                Some(CalendarConfig {
                    base_url,
                    token: value("TRACKER_CALENDAR_TOKEN"),
                    entities,
                })
            }
            None => None,
        };

        Ok(Self {
            port,
            data_path,
            static_root,
            title,
            calendar,
        })
    }
}
