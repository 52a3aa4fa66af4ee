//! Fixed-multiplier scheduling.
//!
//! The next interval depends on the outcome alone: `hard` resets to one
//! day, `good` doubles the current interval and `easy` quadruples it.
//! Elapsed time and review history play no part.

use super::{SchedulingResult, SpacedRepetitionAlgorithm};
use crate::types::{Outcome, ReviewCard};
use chrono::{Days, NaiveDate};

#[derive(Debug, Clone)]
pub struct FixedMultiplier {
    pub hard_interval: f64,
    pub good_multiplier: f64,
    pub easy_multiplier: f64,
}

impl Default for FixedMultiplier {
    fn default() -> Self {
        Self {
            hard_interval: 1.0,
            good_multiplier: 2.0,
            easy_multiplier: 4.0,
        }
    }
}

impl SpacedRepetitionAlgorithm for FixedMultiplier {
    fn name(&self) -> &'static str {
        "multiplier"
    }

    fn initial_interval(&self) -> f64 {
        1.0
    }

    fn schedule(&self, interval: f64, outcome: Outcome, today: NaiveDate) -> SchedulingResult {
        let interval = match outcome {
            Outcome::Hard => self.hard_interval,
            Outcome::Good => interval * self.good_multiplier,
            Outcome::Easy => interval * self.easy_multiplier,
        };

        // Never schedule into the past, even for a corrupted stored interval.
        let days = interval.round().max(0.0) as u64;
        let next_review = today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);

        SchedulingResult {
            interval,
            next_review,
        }
    }
}

/// Apply `algorithm` to `card`, returning the updated copy.
pub fn reschedule_card(
    algorithm: &dyn SpacedRepetitionAlgorithm,
    card: &ReviewCard,
    outcome: Outcome,
    today: NaiveDate,
) -> ReviewCard {
    let result = algorithm.schedule(card.interval, outcome, today);
    ReviewCard {
        interval: result.interval,
        review_date: result.next_review,
        ..card.clone()
    }
}
