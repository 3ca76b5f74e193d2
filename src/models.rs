use crate::render::{Cell, Grid};
use crate::summary::Summary;
use crate::window::CalendarDay;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub date: CalendarDay,
    pub done: bool,
    /// `None` when the toggled day is outside the visible window.
    pub cell: Option<Cell>,
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub added: usize,
    pub grid: Grid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Preferences {
    pub show_week_separators: bool,
}
