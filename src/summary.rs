use crate::reconcile::DayState;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Summary {
    pub done_count: usize,
    pub total_count: usize,
    pub percent: u8,
}

impl Summary {
    pub fn from_states(states: impl IntoIterator<Item = DayState>) -> Self {
        let (done_count, total_count) = states
            .into_iter()
            .fold((0usize, 0usize), |(done, total), state| {
                (done + usize::from(state == DayState::Done), total + 1)
            });
        Self::from_counts(done_count, total_count)
    }

    pub fn from_counts(done_count: usize, total_count: usize) -> Self {
        let percent = if total_count == 0 {
            0
        } else {
            (done_count as f64 / total_count as f64 * 100.0).round().clamp(0.0, 100.0) as u8
        };

        Self {
            done_count,
            total_count,
            percent,
        }
    }

    pub fn label(&self) -> String {
        format!(
            "{}/{} days \u{2014} {}% complete",
            self.done_count, self.total_count, self.percent
        )
    }
}
