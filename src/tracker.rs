use crate::done_set::DoneSet;
use crate::errors::TrackerError;
use crate::reconcile::merge_events;
use crate::render::{render_grid, Cell, Grid};
use crate::storage::KeyValueStore;
use crate::transfer::{self, ExportDocument};
use crate::window::{CalendarDay, DateWindow};
use serde_json::Value;
use tracing::warn;

pub const DAY_KEY_PREFIX: &str = "day-";
pub const WEEK_SEPARATOR_KEY: &str = "showWeekSeparators";
const DONE_MARKER: &str = "1";

/// Owns the done set and its backing store. Every mutation updates memory,
/// then the store, then the grid it was handed, before returning. A failed
/// write puts memory back the way it was and leaves the grid untouched.
#[derive(Debug)]
pub struct Tracker<S> {
    done: DoneSet,
    store: S,
}

impl<S: KeyValueStore> Tracker<S> {
    pub fn load(store: S) -> Self {
        let mut done = DoneSet::new();
        for key in store.keys() {
            let Some(iso) = key.strip_prefix(DAY_KEY_PREFIX) else {
                continue;
            };
            if store.get(&key) != Some(DONE_MARKER) {
                continue;
            }
            match iso.parse::<CalendarDay>() {
                Ok(day) => done.add(day),
                Err(err) => warn!("ignoring stored key {key}: {err}"),
            }
        }

        Self { done, store }
    }

    pub fn done(&self) -> &DoneSet {
        &self.done
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn grid(&self, today: CalendarDay) -> Grid {
        render_grid(&DateWindow::ending_at(today), &self.done)
    }

    /// Flips one day, persists it and refreshes that cell plus the summary.
    /// Returns the refreshed cell when the day is visible in `grid`.
    pub async fn toggle(&mut self, day: CalendarDay, grid: &mut Grid) -> Result<Option<Cell>, TrackerError> {
        let previous = self.done.clone();
        let key = day_key(day);
        if self.done.toggle(day) {
            self.store.set(&key, DONE_MARKER);
        } else {
            self.store.remove(&key);
        }
        self.persist(previous).await?;

        let cell = grid.refresh_cell(day, &self.done).cloned();
        grid.summarize();
        Ok(cell)
    }

    pub fn export(&self) -> ExportDocument {
        transfer::export(&self.done)
    }

    /// Replaces the whole done set. Callers validate the document first so a
    /// rejected import never reaches this point.
    pub async fn import(&mut self, days: Vec<CalendarDay>, grid: &mut Grid) -> Result<(), TrackerError> {
        let previous = self.done.clone();
        self.done.replace_all(days);
        self.sync_store();
        self.persist(previous).await?;
        grid.refresh_all(&self.done);
        Ok(())
    }

    /// Unions the days of remote events into the done set. Returns how many
    /// days were new; the store is only rewritten when something changed.
    pub async fn merge_remote(&mut self, events: &[Value]) -> Result<usize, TrackerError> {
        let previous = self.done.clone();
        let added = merge_events(&mut self.done, events);
        if added > 0 {
            self.sync_store();
            self.persist(previous).await?;
        }
        Ok(added)
    }

    pub fn show_week_separators(&self) -> bool {
        self.store.get(WEEK_SEPARATOR_KEY) == Some(DONE_MARKER)
    }

    pub async fn set_show_week_separators(&mut self, show: bool) -> Result<(), TrackerError> {
        let was_shown = self.show_week_separators();
        set_flag(&mut self.store, show);
        if let Err(err) = self.store.flush().await {
            set_flag(&mut self.store, was_shown);
            return Err(err);
        }
        Ok(())
    }

    /// Flushes the store, or restores `previous` in memory and in the store
    /// when the write fails.
    async fn persist(&mut self, previous: DoneSet) -> Result<(), TrackerError> {
        if let Err(err) = self.store.flush().await {
            warn!("write failed, keeping the previous {} day(s): {err}", previous.len());
            self.done = previous;
            self.sync_store();
            return Err(err);
        }
        Ok(())
    }

    fn sync_store(&mut self) {
        for key in self.store.keys() {
            if key.starts_with(DAY_KEY_PREFIX) {
                self.store.remove(&key);
            }
        }
        for day in self.done.all() {
            self.store.set(&day_key(day), DONE_MARKER);
        }
    }
}

fn day_key(day: CalendarDay) -> String {
    format!("{DAY_KEY_PREFIX}{day}")
}

fn set_flag<S: KeyValueStore>(store: &mut S, show: bool) {
    if show {
        store.set(WEEK_SEPARATOR_KEY, DONE_MARKER);
    } else {
        store.remove(WEEK_SEPARATOR_KEY);
    }
}
