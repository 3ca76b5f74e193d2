use crate::done_set::DoneSet;
use crate::reconcile::{day_state, DayState};
use crate::summary::Summary;
use crate::window::{CalendarDay, DateWindow};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub date: CalendarDay,
    pub week_start: bool,
    pub state: DayState,
}

impl Cell {
    pub fn classes(&self) -> String {
        let mut classes = String::from("day-square");
        if self.week_start {
            classes.push_str(" week-start");
        }
        if self.state != DayState::Neutral {
            classes.push(' ');
            classes.push_str(self.state.class());
        }
        classes
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

/// Toolkit-independent description of the tracker: one row per month,
/// oldest first, plus the summary derived from the cells.
#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub today: CalendarDay,
    pub rows: Vec<MonthRow>,
    pub summary: Summary,
}

pub fn render_grid(window: &DateWindow, done: &DoneSet) -> Grid {
    let today = window.today();
    let rows = window
        .chronological()
        .map(|bucket| MonthRow {
            label: bucket.label(),
            cells: bucket
                .days
                .iter()
                .map(|&date| Cell {
                    date,
                    week_start: date.is_week_start(),
                    state: day_state(date, done, today),
                })
                .collect(),
        })
        .collect();

    let mut grid = Grid {
        today,
        rows,
        summary: Summary::default(),
    };
    grid.summarize();
    grid
}

impl Grid {
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    pub fn cell(&self, date: CalendarDay) -> Option<&Cell> {
        self.cells().find(|cell| cell.date == date)
    }

    pub fn summarize(&mut self) {
        self.summary = Summary::from_states(self.cells().map(|cell| cell.state));
    }

    /// Re-derives one cell after its membership changed. Returns `None` when
    /// the day is not visible in this grid.
    pub fn refresh_cell(&mut self, date: CalendarDay, done: &DoneSet) -> Option<&Cell> {
        let today = self.today;
        let cell = self
            .rows
            .iter_mut()
            .flat_map(|row| row.cells.iter_mut())
            .find(|cell| cell.date == date)?;
        cell.state = day_state(date, done, today);
        Some(cell)
    }

    pub fn refresh_all(&mut self, done: &DoneSet) {
        let today = self.today;
        for cell in self.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
            cell.state = day_state(cell.date, done, today);
        }
        self.summarize();
    }
}
