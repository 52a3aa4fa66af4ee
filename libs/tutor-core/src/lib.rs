//! Core learning-content library shared by the backend service.
//!
//! Provides:
//! - Content types, levels and request fingerprints
//! - Structural validation of generated items
//! - Local pagination over cached pools
//! - Fixed-multiplier spaced repetition scheduling
//! - The timed exam state machine

pub mod algorithm;
pub mod error;
pub mod exam;
pub mod paging;
pub mod review;
pub mod types;
pub mod validation;

pub use algorithm::{get_algorithm, SchedulingResult, SpacedRepetitionAlgorithm};
pub use error::{ContentError, ExamError, Result};
pub use exam::{
    ExamMachine, ExamResult, ExamSession, ExamSnapshot, ExamState, FinishReason, Navigation,
    QuestionView, SectionScore, SubmitOutcome,
};
pub use paging::{page_count, page_slice};
pub use review::ReviewDeck;
pub use types::{
    Character, ContentItem, ContentKind, ContentPayload, ContentRequest, DictionaryEntry,
    ExamQuestion, Fingerprint, Level, Outcome, ReviewCard, Section, Translation, Vocabulary,
};
pub use validation::{validate_batch, validate_item, validate_question, ValidatedBatch};
