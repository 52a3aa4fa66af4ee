//! Core types shared by the content cache, review scheduler and exam runner.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// Kind of generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Vocabulary,
    WritingCharacter,
    ExamQuestion,
    Translation,
    DictionaryEntry,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        Self::Vocabulary,
        Self::WritingCharacter,
        Self::ExamQuestion,
        Self::Translation,
        Self::DictionaryEntry,
    ];

    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::WritingCharacter => "writing-character",
            Self::ExamQuestion => "exam-question",
            Self::Translation => "translation",
            Self::DictionaryEntry => "dictionary-entry",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ContentError::UnknownKind(s.to_string()))
    }
}

/// Proficiency level, an ordinal from 1 to 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(value: u8) -> Result<Self, ContentError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ContentError::InvalidLevel(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Level {
    type Error = ContentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a request for cacheable content.
///
/// Two reads with equal fingerprints share one pool. A fingerprint that
/// carries a free-text topic is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub kind: ContentKind,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl Fingerprint {
    pub fn new(kind: ContentKind, level: Level) -> Self {
        Self {
            kind,
            level,
            topic: None,
        }
    }

    /// Attach a free-text topic. Blank topics are ignored.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        let trimmed = topic.trim();
        self.topic = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Whether a pool for this fingerprint may be written to the store.
    pub fn is_persistable(&self) -> bool {
        self.topic.is_none()
    }

    /// Store key for the persisted pool: `pool:<kind>:<level>`.
    pub fn storage_key(&self) -> String {
        format!("pool:{}:{}", self.kind, self.level)
    }

    /// Build the provider request for a full pool of `count` items.
    pub fn request(&self, count: usize) -> ContentRequest {
        ContentRequest {
            kind: self.kind,
            level: self.level,
            count,
            topic: self.topic.clone(),
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.topic {
            Some(topic) => write!(f, "{}:{}:{:?}", self.kind, self.level, topic),
            None => write!(f, "{}:{}", self.kind, self.level),
        }
    }
}

/// Parameters sent to the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub kind: ContentKind,
    pub level: Level,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Vocabulary word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub word: String,
    pub pinyin: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Writing-practice character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub character: String,
    pub pinyin: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_count: Option<u32>,
}

/// Exam section a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Listening,
    Reading,
    Writing,
}

/// Multiple-choice exam question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub section: Section,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_script: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl ExamQuestion {
    pub const OPTION_COUNT: usize = 4;

    /// Scoring is plain byte equality with the correct option.
    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.correct_answer
    }

    pub fn has_option(&self, choice: &str) -> bool {
        self.options.iter().any(|o| o == choice)
    }
}

/// Sentence translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Dictionary entry for a single term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub term: String,
    pub pinyin: String,
    pub definitions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Payload of a content item, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPayload {
    Vocabulary(Vocabulary),
    WritingCharacter(Character),
    ExamQuestion(ExamQuestion),
    Translation(Translation),
    DictionaryEntry(DictionaryEntry),
}

impl ContentPayload {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Vocabulary(_) => ContentKind::Vocabulary,
            Self::WritingCharacter(_) => ContentKind::WritingCharacter,
            Self::ExamQuestion(_) => ContentKind::ExamQuestion,
            Self::Translation(_) => ContentKind::Translation,
            Self::DictionaryEntry(_) => ContentKind::DictionaryEntry,
        }
    }

    /// Stable identity text of the payload.
    pub fn key(&self) -> &str {
        match self {
            Self::Vocabulary(v) => &v.word,
            Self::WritingCharacter(c) => &c.character,
            Self::ExamQuestion(q) => &q.prompt,
            Self::Translation(t) => &t.source,
            Self::DictionaryEntry(d) => &d.term,
        }
    }
}

/// A generated item plus the request that produced it. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub request: ContentRequest,
    pub payload: ContentPayload,
}

impl ContentItem {
    pub fn new(request: ContentRequest, payload: ContentPayload) -> Self {
        Self { request, payload }
    }

    pub fn kind(&self) -> ContentKind {
        self.payload.kind()
    }

    pub fn key(&self) -> &str {
        self.payload.key()
    }

    pub fn as_exam_question(&self) -> Option<&ExamQuestion> {
        match &self.payload {
            ContentPayload::ExamQuestion(q) => Some(q),
            _ => None,
        }
    }
}

/// Learner's self-assessment after reviewing a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Hard,
    Good,
    Easy,
}

/// A learned item in the learner's review set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCard {
    /// Identity of the card, the item's key.
    pub key: String,
    pub item: ContentItem,
    pub review_date: NaiveDate,
    /// Days until the next review, always positive.
    pub interval: f64,
}

impl ReviewCard {
    pub fn new(item: ContentItem, review_date: NaiveDate, interval: f64) -> Self {
        Self {
            key: item.key().to_string(),
            item,
            review_date,
            interval,
        }
    }

    /// Due on or before `as_of`, compared by date only.
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.review_date <= as_of
    }
}
