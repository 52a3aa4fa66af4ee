//! Test fixtures and factory functions for creating test data.

use std::time::Duration;

use hsk_tutor_backend::config::TutorSettings;
use hsk_tutor_backend::services::exam::ExamSettings;
use hsk_tutor_backend::services::pool_cache::PoolSettings;
use hsk_tutor_backend::store::Lifetime;
use tutor_core::types::{
    Character, ContentItem, ContentKind, ContentPayload, ContentRequest, DictionaryEntry,
    ExamQuestion, Level, Section, Translation, Vocabulary,
};

/// Small pools and a short exam so tests stay quick.
pub fn test_settings() -> TutorSettings {
    TutorSettings {
        pool: PoolSettings {
            pool_size: 12,
            page_size: 5,
            lifetime: Lifetime::Durable,
        },
        exam: ExamSettings {
            question_count: 4,
            duration_secs: 30,
            tick: Duration::from_secs(1),
        },
        daily_reset_hour: 0,
    }
}

/// Item number `index` of provider call `call`. Keys are unique per call.
pub fn generated_item(request: &ContentRequest, call: usize, index: usize) -> ContentItem {
    let tag = format!("{}-{}", call, index);
    let payload = match request.kind {
        ContentKind::Vocabulary => ContentPayload::Vocabulary(Vocabulary {
            word: format!("词{}", tag),
            pinyin: format!("ci {}", tag),
            meaning: format!("word {}", tag),
            example: None,
        }),
        ContentKind::WritingCharacter => ContentPayload::WritingCharacter(Character {
            character: char::from_u32(0x4e00 + (call * 100 + index) as u32)
                .unwrap_or('字')
                .to_string(),
            pinyin: "zi".to_string(),
            meaning: format!("character {}", tag),
            stroke_count: Some(6),
        }),
        ContentKind::ExamQuestion => ContentPayload::ExamQuestion(exam_question(index)),
        ContentKind::Translation => ContentPayload::Translation(Translation {
            source: request.topic.clone().unwrap_or_else(|| format!("句子{}", tag)),
            target: format!("sentence {}", tag),
            notes: None,
        }),
        ContentKind::DictionaryEntry => ContentPayload::DictionaryEntry(DictionaryEntry {
            term: request.topic.clone().unwrap_or_else(|| format!("词{}", tag)),
            pinyin: "ci".to_string(),
            definitions: vec![format!("definition {}", tag)],
            examples: Vec::new(),
        }),
    };
    ContentItem::new(request.clone(), payload)
}

/// Question whose correct answer is always "A".
pub fn exam_question(index: usize) -> ExamQuestion {
    ExamQuestion {
        section: if index % 2 == 0 {
            Section::Reading
        } else {
            Section::Listening
        },
        prompt: format!("Question {}", index + 1),
        audio_script: None,
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: "A".to_string(),
        explanation: format!("Explanation {}", index + 1),
    }
}

/// A vocabulary item suitable for adding to the review set.
pub fn vocabulary_item(word: &str) -> ContentItem {
    let request = ContentRequest {
        kind: ContentKind::Vocabulary,
        level: Level::new(1).unwrap(),
        count: 1,
        topic: None,
    };
    ContentItem::new(
        request,
        ContentPayload::Vocabulary(Vocabulary {
            word: word.to_string(),
            pinyin: "pinyin".to_string(),
            meaning: "meaning".to_string(),
            example: None,
        }),
    )
}
