use crate::config::Config;
use crate::remote::CalendarClient;
use crate::storage::FileStore;
use crate::tracker::Tracker;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tracker: Arc<Mutex<Tracker<FileStore>>>,
    pub calendar: Option<CalendarClient>,
}

impl AppState {
    pub fn new(config: Config, store: FileStore) -> Self {
        let calendar = config
            .calendar
            .as_ref()
            .map(|calendar| CalendarClient::new(&calendar.base_url, calendar.token.clone()));

        Self {
            config: Arc::new(config),
            tracker: Arc::new(Mutex::new(Tracker::load(store))),
            calendar,
        }
    }
}
