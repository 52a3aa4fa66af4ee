//! Review set operations over an in-memory card collection.
//!
//! Cards keep insertion order. There is at most one card per key.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{ContentItem, ReviewCard};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewDeck {
    cards: Vec<ReviewCard>,
}

impl ReviewDeck {
    pub fn new(cards: Vec<ReviewCard>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[ReviewCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ReviewCard> {
        self.cards.iter().find(|c| c.key == key)
    }

    /// Add a card for `item`, returning the stored card and whether it is new.
    pub fn add(&mut self, item: ContentItem, review_date: NaiveDate, interval: f64) -> (ReviewCard, bool) {
        if let Some(existing) = self.get(item.key()) {
            return (existing.clone(), false);
        }
        let card = ReviewCard::new(item, review_date, interval);
        self.cards.push(card.clone());
        (card, true)
    }

    /// Replace the card with the same key. Returns false when none matched.
    pub fn replace(&mut self, card: ReviewCard) -> bool {
        match self.cards.iter_mut().find(|c| c.key == card.key) {
            Some(slot) => {
                *slot = card;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c.key != key);
        self.cards.len() != before
    }

    /// Cards due on or before `as_of`, in storage order.
    pub fn due(&self, as_of: NaiveDate) -> Vec<ReviewCard> {
        self.cards.iter().filter(|c| c.is_due(as_of)).cloned().collect()
    }

    pub fn into_cards(self) -> Vec<ReviewCard> {
        self.cards
    }
}
