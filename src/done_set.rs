use crate::window::CalendarDay;
use std::collections::BTreeSet;

/// Days marked complete. Membership is idempotent and keyed by the canonical
/// date, so two spellings of the same ISO date can never both be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoneSet {
    days: BTreeSet<CalendarDay>,
}

impl DoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, day: CalendarDay) -> bool {
        self.days.contains(&day)
    }

    pub fn add(&mut self, day: CalendarDay) {
        self.days.insert(day);
    }

    pub fn remove(&mut self, day: CalendarDay) {
        self.days.remove(&day);
    }

    /// Flips membership and returns whether the day is now done.
    pub fn toggle(&mut self, day: CalendarDay) -> bool {
        if self.days.remove(&day) {
            false
        } else {
            self.days.insert(day);
            true
        }
    }

    /// Ascending.
    pub fn all(&self) -> impl Iterator<Item = CalendarDay> + '_ {
        self.days.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn replace_all(&mut self, days: impl IntoIterator<Item = CalendarDay>) {
        self.days.clear();
        self.days.extend(days);
    }

    /// Union without clearing; returns how many days were newly added.
    pub fn merge(&mut self, days: impl IntoIterator<Item = CalendarDay>) -> usize {
        let before = self.days.len();
        self.days.extend(days);
        self.days.len() - before
    }
}

impl FromIterator<CalendarDay> for DoneSet {
    fn from_iter<I: IntoIterator<Item = CalendarDay>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}
