//! Structural checks applied to provider output before it is cached.

use crate::error::{ContentError, Result};
use crate::types::{ContentItem, ContentKind, ContentPayload, ExamQuestion};

/// Validate a single item against the kind it was requested as.
///
/// Writing characters are trimmed before the single-character check, so
/// the returned item may differ from the input.
pub fn validate_item(expected: ContentKind, item: ContentItem) -> Result<ContentItem> {
    let actual = item.kind();
    if actual != expected {
        return Err(ContentError::KindMismatch {
            expected: expected.as_str(),
            actual: actual.as_str(),
        });
    }

    let ContentItem { request, payload } = item;
    let payload = match payload {
        ContentPayload::WritingCharacter(mut c) => {
            let trimmed = c.character.trim();
            if trimmed.chars().count() != 1 {
                return Err(ContentError::WrongCharacterCount(c.character));
            }
            c.character = trimmed.to_string();
            ContentPayload::WritingCharacter(c)
        }
        ContentPayload::ExamQuestion(q) => {
            validate_question(&q)?;
            ContentPayload::ExamQuestion(q)
        }
        ContentPayload::DictionaryEntry(d) => {
            if d.definitions.iter().all(|def| def.trim().is_empty()) {
                return Err(ContentError::EmptyField {
                    field: "definitions",
                });
            }
            ContentPayload::DictionaryEntry(d)
        }
        other => other,
    };

    if payload.key().trim().is_empty() {
        return Err(ContentError::EmptyField { field: "key" });
    }

    Ok(ContentItem::new(request, payload))
}

/// Exactly four options, and the correct answer is one of them byte-for-byte.
pub fn validate_question(question: &ExamQuestion) -> Result<()> {
    if question.prompt.trim().is_empty() {
        return Err(ContentError::EmptyField { field: "prompt" });
    }
    if question.options.len() != ExamQuestion::OPTION_COUNT {
        return Err(ContentError::WrongOptionCount(question.options.len()));
    }
    if !question.has_option(&question.correct_answer) {
        return Err(ContentError::CorrectAnswerNotInOptions(
            question.correct_answer.clone(),
        ));
    }
    Ok(())
}

/// Items that passed validation plus the reasons the rest were dropped.
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub items: Vec<ContentItem>,
    pub rejected: Vec<ContentError>,
}

/// Validate a provider batch item by item. Invalid items are dropped, never
/// failing the whole batch.
pub fn validate_batch(expected: ContentKind, items: Vec<ContentItem>) -> ValidatedBatch {
    let mut batch = ValidatedBatch::default();
    for item in items {
        match validate_item(expected, item) {
            Ok(item) => batch.items.push(item),
            Err(e) => batch.rejected.push(e),
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Character, ContentRequest, Level, Section, Vocabulary};
    use pretty_assertions::assert_eq;

    fn request(kind: ContentKind) -> ContentRequest {
        ContentRequest {
            kind,
            level: Level::new(1).unwrap(),
            count: 1,
            topic: None,
        }
    }

    fn character(text: &str) -> ContentItem {
        ContentItem::new(
            request(ContentKind::WritingCharacter),
            ContentPayload::WritingCharacter(Character {
                character: text.to_string(),
                pinyin: "shuǐ".to_string(),
                meaning: "water".to_string(),
                stroke_count: Some(4),
            }),
        )
    }

    fn question(options: &[&str], correct: &str) -> ExamQuestion {
        ExamQuestion {
            section: Section::Reading,
            prompt: "你好 means?".to_string(),
            audio_script: None,
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct.to_string(),
            explanation: String::new(),
        }
    }

    #[test]
    fn character_is_trimmed_to_one_char() {
        let item = validate_item(ContentKind::WritingCharacter, character(" 水 ")).unwrap();
        assert_eq!(item.key(), "水");
    }

    #[test]
    fn multi_character_word_is_rejected() {
        let result = validate_item(ContentKind::WritingCharacter, character("水果"));
        assert!(matches!(result, Err(ContentError::WrongCharacterCount(_))));
    }

    #[test]
    fn question_needs_four_options() {
        let q = question(&["a", "b", "c"], "a");
        assert_eq!(validate_question(&q), Err(ContentError::WrongOptionCount(3)));
    }

    #[test]
    fn correct_answer_must_match_exactly() {
        let q = question(&["hello", "bye", "thanks", "sorry"], "Hello");
        assert!(matches!(
            validate_question(&q),
            Err(ContentError::CorrectAnswerNotInOptions(_))
        ));
    }

    #[test]
    fn batch_drops_invalid_items_only() {
        let vocab = ContentItem::new(
            request(ContentKind::Vocabulary),
            ContentPayload::Vocabulary(Vocabulary {
                word: "学习".to_string(),
                pinyin: "xuéxí".to_string(),
                meaning: "to study".to_string(),
                example: None,
            }),
        );
        let batch = validate_batch(
            ContentKind::WritingCharacter,
            vec![character("水"), character(""), vocab],
        );
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.rejected.len(), 2);
    }
}
