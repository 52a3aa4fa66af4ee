//! Store-backed review scheduler.
//!
//! The whole card collection is read, changed and written back as one
//! value under a single durable key. Writers are serialized so two
//! concurrent updates cannot drop each other's changes.

use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use thiserror::Error;
use tutor_core::algorithm::multiplier::{reschedule_card, FixedMultiplier};
use tutor_core::algorithm::SpacedRepetitionAlgorithm;
use tutor_core::review::ReviewDeck;
use tutor_core::types::{ContentItem, Outcome, ReviewCard};

use crate::store::{Lifetime, Storage, StoreError};

/// Durable key holding the full card collection.
pub const CARDS_KEY: &str = "review_cards";

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

pub struct ReviewScheduler {
    storage: Storage,
    algorithm: Box<dyn SpacedRepetitionAlgorithm>,
    write_lock: Mutex<()>,
}

impl ReviewScheduler {
    pub fn new(storage: Storage) -> Self {
        Self::with_algorithm(storage, Box::new(FixedMultiplier::default()))
    }

    pub fn with_algorithm(storage: Storage, algorithm: Box<dyn SpacedRepetitionAlgorithm>) -> Self {
        Self {
            storage,
            algorithm,
            write_lock: Mutex::new(()),
        }
    }

    /// All cards in insertion order.
    pub fn cards(&self) -> Result<Vec<ReviewCard>> {
        Ok(self.load()?.into_cards())
    }

    pub fn card(&self, key: &str) -> Result<Option<ReviewCard>> {
        Ok(self.load()?.get(key).cloned())
    }

    /// Cards whose review date is on or before `as_of`, in storage order.
    pub fn due_cards(&self, as_of: NaiveDate) -> Result<Vec<ReviewCard>> {
        Ok(self.load()?.due(as_of))
    }

    /// Add `item` to the review set, due `today`. Adding an item whose key
    /// is already present returns the existing card unchanged.
    pub fn add_card(&self, item: ContentItem, today: NaiveDate) -> Result<(ReviewCard, bool)> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut deck = self.load()?;
        let (card, created) = deck.add(item, today, self.algorithm.initial_interval());
        if created {
            self.save(&deck)?;
            tracing::info!(key = %card.key, "card added to review set");
        }
        Ok((card, created))
    }

    pub fn remove_card(&self, key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut deck = self.load()?;
        let removed = deck.remove(key);
        if removed {
            self.save(&deck)?;
        }
        Ok(removed)
    }

    /// Compute the next interval and date for `card` and store the result.
    /// A card with no stored counterpart is returned updated but not saved.
    pub fn reschedule(&self, card: &ReviewCard, outcome: Outcome, today: NaiveDate) -> Result<ReviewCard> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut deck = self.load()?;
        self.apply(&mut deck, card, outcome, today)
    }

    /// Reschedule the stored card with `key`. `None` when there is no such card.
    ///
    /// The card is read under the write lock, so concurrent reviews of one
    /// card each build on the previous result.
    pub fn reschedule_key(&self, key: &str, outcome: Outcome, today: NaiveDate) -> Result<Option<ReviewCard>> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut deck = self.load()?;
        let Some(card) = deck.get(key).cloned() else {
            return Ok(None);
        };
        self.apply(&mut deck, &card, outcome, today).map(Some)
    }

    /// Caller holds `write_lock`.
    fn apply(
        &self,
        deck: &mut ReviewDeck,
        card: &ReviewCard,
        outcome: Outcome,
        today: NaiveDate,
    ) -> Result<ReviewCard> {
        let updated = reschedule_card(self.algorithm.as_ref(), card, outcome, today);
        if deck.replace(updated.clone()) {
            self.save(deck)?;
            tracing::info!(
                key = %updated.key,
                ?outcome,
                interval = updated.interval,
                review_date = %updated.review_date,
                "card rescheduled"
            );
        } else {
            tracing::debug!(key = %card.key, "reschedule for unknown card ignored");
        }
        Ok(updated)
    }

    fn load(&self) -> Result<ReviewDeck> {
        Ok(self
            .storage
            .get_json::<ReviewDeck>(Lifetime::Durable, CARDS_KEY)?
            .unwrap_or_default())
    }

    fn save(&self, deck: &ReviewDeck) -> Result<()> {
        self.storage.set_json(Lifetime::Durable, CARDS_KEY, deck)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tutor_core::types::{ContentKind, ContentPayload, ContentRequest, Level, Vocabulary};

    fn word(text: &str) -> ContentItem {
        ContentItem::new(
            ContentRequest {
                kind: ContentKind::Vocabulary,
                level: Level::new(2).unwrap(),
                count: 10,
                topic: None,
            },
            ContentPayload::Vocabulary(Vocabulary {
                word: text.to_string(),
                pinyin: String::new(),
                meaning: "m".to_string(),
                example: None,
            }),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn added_card_is_due_today_not_before() {
        let scheduler = ReviewScheduler::new(Storage::in_memory());
        scheduler.add_card(word("电脑"), day(10)).unwrap();
        assert_eq!(scheduler.due_cards(day(10)).unwrap().len(), 1);
        assert!(scheduler.due_cards(day(9)).unwrap().is_empty());
    }

    #[test]
    fn reschedule_applies_multiplier_table() {
        let scheduler = ReviewScheduler::new(Storage::in_memory());
        let (mut card, _) = scheduler.add_card(word("电脑"), day(1)).unwrap();
        card.interval = 5.0;

        let good = scheduler.reschedule(&card, Outcome::Good, day(1)).unwrap();
        assert_eq!(good.interval, 10.0);
        assert_eq!(good.review_date, day(11));

        let easy = scheduler.reschedule(&card, Outcome::Easy, day(1)).unwrap();
        assert_eq!(easy.interval, 20.0);

        let hard = scheduler.reschedule(&card, Outcome::Hard, day(1)).unwrap();
        assert_eq!(hard.interval, 1.0);
        assert_eq!(scheduler.card("电脑").unwrap().unwrap().interval, 1.0);
    }

    #[test]
    fn reschedule_replaces_whole_card_in_place() {
        let scheduler = ReviewScheduler::new(Storage::in_memory());
        scheduler.add_card(word("一"), day(1)).unwrap();
        scheduler.add_card(word("二"), day(1)).unwrap();
        scheduler.add_card(word("三"), day(1)).unwrap();

        scheduler.reschedule_key("二", Outcome::Easy, day(1)).unwrap();
        let cards = scheduler.cards().unwrap();
        let keys: Vec<_> = cards.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["一", "二", "三"]);
        assert_eq!(cards[1].interval, 4.0);
        assert_eq!(cards[1].review_date, day(5));
        assert_eq!(cards[0].interval, 1.0);
    }

    #[test]
    fn unknown_card_is_noop() {
        let storage = Storage::in_memory();
        let scheduler = ReviewScheduler::new(storage.clone());
        scheduler.add_card(word("一"), day(1)).unwrap();
        let before = storage.scope(Lifetime::Durable).get(CARDS_KEY).unwrap();

        let stranger = ReviewCard::new(word("陌生"), day(1), 3.0);
        let updated = scheduler.reschedule(&stranger, Outcome::Good, day(1)).unwrap();
        assert_eq!(updated.interval, 6.0);
        assert_eq!(storage.scope(Lifetime::Durable).get(CARDS_KEY).unwrap(), before);
        assert_eq!(scheduler.reschedule_key("陌生", Outcome::Good, day(1)).unwrap(), None);
    }

    #[test]
    fn concurrent_reviews_of_one_card_compound() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        for _ in 0..50 {
            let scheduler = Arc::new(ReviewScheduler::new(Storage::in_memory()));
            scheduler.add_card(word("书"), day(1)).unwrap();
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let scheduler = scheduler.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        scheduler.reschedule_key("书", Outcome::Good, day(1)).unwrap()
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(scheduler.card("书").unwrap().unwrap().interval, 4.0);
        }
    }

    #[test]
    fn duplicate_add_keeps_one_card() {
        let scheduler = ReviewScheduler::new(Storage::in_memory());
        let (_, created) = scheduler.add_card(word("书"), day(1)).unwrap();
        assert!(created);
        let (_, created) = scheduler.add_card(word("书"), day(3)).unwrap();
        assert!(!created);
        assert_eq!(scheduler.cards().unwrap().len(), 1);
    }

    #[test]
    fn remove_card() {
        let scheduler = ReviewScheduler::new(Storage::in_memory());
        scheduler.add_card(word("书"), day(1)).unwrap();
        assert!(scheduler.remove_card("书").unwrap());
        assert!(!scheduler.remove_card("书").unwrap());
    }

    #[test]
    fn corrupt_collection_surfaces_persistence_error() {
        let storage = Storage::in_memory();
        storage.scope(Lifetime::Durable).set(CARDS_KEY, "oops").unwrap();
        let scheduler = ReviewScheduler::new(storage);
        assert!(matches!(
            scheduler.due_cards(day(1)),
            Err(SchedulerError::PersistenceFailed(_))
        ));
    }
}
