//! API request and response types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use tutor_core::exam::{ExamResult, ExamSnapshot, Navigation, SubmitOutcome};
pub use tutor_core::types::{ContentItem, ContentKind, Level, Outcome, ReviewCard};

pub use crate::services::pool_cache::PoolStatus;

// === Content Types ===

/// Query for GET /api/content/:kind/:level/page
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    pub page_size: Option<usize>,
    pub topic: Option<String>,
}

fn default_page() -> usize {
    1
}

/// Query carrying an optional topic
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicQuery {
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub items: Vec<ContentItem>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    /// The provider returned no usable items for this pool.
    pub empty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextResponse {
    pub item: Option<ContentItem>,
    pub empty: bool,
}

/// Query for GET /api/lookup/:kind/:term
#[derive(Debug, Clone, Deserialize)]
pub struct LookupQuery {
    pub level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub item: Option<ContentItem>,
    /// The provider had nothing usable for the term.
    pub empty: bool,
}

// === Review Types ===

/// Query for GET /api/reviews/due
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DueQuery {
    /// Defaults to today's study day.
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardListResponse {
    pub cards: Vec<ReviewCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCardRequest {
    pub item: ContentItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCardResponse {
    pub card: ReviewCard,
    /// False when a card with the same key already existed.
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub key: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleResponse {
    pub card: ReviewCard,
}

// === Exam Types ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartExamRequest {
    pub level: u8,
}

/// Body for POST /api/exam/answer. A missing choice clears the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub index: usize,
    pub choice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateResponse {
    pub cursor: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub results: Vec<ExamResult>,
}
