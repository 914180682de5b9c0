use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::state::{error::EngineError, stage::RoundConfig};

/// Cards laid out for each final-stage round.
pub const CARDS_PER_ROUND: usize = 5;

/// Face-down question card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Identifier, stable for the round regardless of slot.
    pub id: u8,
    /// Question category printed on the card.
    pub category: String,
    /// Whether the card has been turned.
    pub flipped: bool,
}

/// The five cards of a final-stage round and their round-scoped flip history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDeck {
    round: u8,
    cards: Vec<Card>,
    flip_history: Vec<u8>,
    open_card: Option<u8>,
}

impl CardDeck {
    /// Fresh deck for a round, cards ordered as the quota table lists them.
    pub fn for_round(round: &RoundConfig) -> Self {
        let mut categories = round.card_categories();
        categories.resize(CARDS_PER_ROUND, round.title.clone());
        let cards = categories
            .into_iter()
            .enumerate()
            .map(|(index, category)| Card {
                id: index as u8,
                category,
                flipped: false,
            })
            .collect();
        Self {
            round: round.number,
            cards,
            flip_history: Vec::new(),
            open_card: None,
        }
    }

    /// Round the deck belongs to.
    pub fn round(&self) -> u8 {
        self.round
    }

    /// Cards in slot order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Card ids in the order they were flipped.
    pub fn flip_history(&self) -> &[u8] {
        &self.flip_history
    }

    /// Card whose question is currently shown.
    pub fn open_card(&self) -> Option<u8> {
        self.open_card
    }

    /// Whether every card has been turned.
    pub fn all_flipped(&self) -> bool {
        self.cards.iter().all(|card| card.flipped)
    }

    /// Turn a card and open its question.
    pub fn flip(&mut self, card_id: u8) -> Result<&Card, EngineError> {
        if let Some(open) = self.open_card {
            return Err(EngineError::InvalidTransition(format!(
                "card {open} is still open"
            )));
        }
        let card = self
            .cards
            .iter_mut()
            .find(|card| card.id == card_id)
            .ok_or_else(|| EngineError::InvalidTransition(format!("no card {card_id}")))?;
        if card.flipped {
            return Err(EngineError::InvalidTransition(format!(
                "card {card_id} is already flipped"
            )));
        }

        card.flipped = true;
        self.flip_history.push(card_id);
        self.open_card = Some(card_id);
        Ok(card)
    }

    /// Close the open question; returns whether one was open.
    pub fn close_question(&mut self) -> bool {
        self.open_card.take().is_some()
    }

    /// Shuffle unflipped cards among the unflipped slots.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), EngineError> {
        if self.all_flipped() {
            return Err(EngineError::InvalidTransition(
                "every card is already flipped".into(),
            ));
        }

        let slots: Vec<usize> = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, card)| !card.flipped)
            .map(|(slot, _)| slot)
            .collect();
        let mut loose: Vec<Card> = slots.iter().map(|&slot| self.cards[slot].clone()).collect();
        loose.shuffle(rng);
        for (slot, card) in slots.into_iter().zip(loose) {
            self.cards[slot] = card;
        }
        Ok(())
    }

    /// Check a restored deck.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut ids: Vec<u8> = self.cards.iter().map(|card| card.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if self.cards.len() != CARDS_PER_ROUND || ids.len() != CARDS_PER_ROUND {
            return Err(EngineError::CorruptSnapshot(
                "card deck must hold five distinct cards".into(),
            ));
        }
        Ok(())
    }
}
