//! Error types for tutor-core.

use thiserror::Error;

use crate::exam::ExamState;

/// Result type alias using ContentError.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Structural problems with a generated content item or request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("level must be between 1 and 6, got {0}")]
    InvalidLevel(u8),

    #[error("unknown content kind: {0}")]
    UnknownKind(String),

    #[error("{field} is empty")]
    EmptyField { field: &'static str },

    #[error("writing item must be exactly one character, got {0:?}")]
    WrongCharacterCount(String),

    #[error("exam question must have exactly 4 options, got {0}")]
    WrongOptionCount(usize),

    #[error("correct answer {0:?} is not one of the options")]
    CorrectAnswerNotInOptions(String),

    #[error("expected {expected} payload, got {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors raised by the exam state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamError {
    #[error("cannot {action} while exam is {state:?}")]
    InvalidTransition {
        state: ExamState,
        action: &'static str,
    },

    #[error("question {index} out of range (exam has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("{choice:?} is not an option of question {index}")]
    OptionOutOfRange { index: usize, choice: String },

    #[error("exam needs at least one question")]
    EmptyQuestionSet,
}
