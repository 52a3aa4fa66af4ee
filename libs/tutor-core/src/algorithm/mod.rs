//! Spaced repetition algorithm implementations.

pub mod multiplier;

use crate::types::Outcome;
use chrono::NaiveDate;

/// Result of scheduling a card after review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulingResult {
    pub interval: f64,
    pub next_review: NaiveDate,
}

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate the next interval and review date after a review.
    fn schedule(&self, interval: f64, outcome: Outcome, today: NaiveDate) -> SchedulingResult;

    /// Interval assigned to a card when it joins the review set.
    fn initial_interval(&self) -> f64;
}

/// Get algorithm by name.
pub fn get_algorithm(name: &str) -> Option<Box<dyn SpacedRepetitionAlgorithm>> {
    match name {
        "multiplier" => Some(Box::new(multiplier::FixedMultiplier::default())),
        _ => None,
    }
}
