use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of physical cards tracked per session.
pub const DECK_SIZE: usize = 52;

/// Lifecycle of one physical card. Transitions only move forward:
/// InDeck -> OnTable -> Removed. OnTable lasts a single frame; Removed is
/// terminal for the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    #[default]
    InDeck,
    OnTable,
    Removed,
}

/// Slot of a card in the 52-entry table: ranks are grouped four at a time,
/// suits 0-3 within each rank.
pub fn card_slot(rank: u8, suit: u8) -> usize {
    (rank as usize - 1) * 4 + suit as usize
}

/// Blackjack value of a rank: ace counts 11, face cards 10.
pub fn card_score(rank: u8) -> u32 {
    if rank == 1 {
        11
    } else {
        rank.min(10) as u32
    }
}

/// Per-session status of every card in the deck.
///
/// Mutated only through the two-phase commit: `mark_on_table` when a card is
/// sighted in the current frame, `commit_removed` once the frame's report has
/// been taken. A removed card never returns to the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckTracker {
    slots: Vec<CardStatus>,
}

impl Default for DeckTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckTracker {
    pub fn new() -> Self {
        Self {
            slots: vec![CardStatus::InDeck; DECK_SIZE],
        }
    }

    pub fn status(&self, slot: usize) -> CardStatus {
        self.slots[slot]
    }

    pub fn statuses(&self) -> &[CardStatus] {
        &self.slots
    }

    /// Phase one: flag this frame's sightings. Only cards still in the deck
    /// change; a removed card stays removed.
    pub fn mark_on_table(&mut self, slots: &[usize]) {
        for &slot in slots {
            let Some(status) = self.slots.get_mut(slot) else {
                warn!("card slot {} out of range, ignored", slot);
                continue;
            };
            if *status == CardStatus::InDeck {
                *status = CardStatus::OnTable;
            }
        }
    }

    /// Phase two: retire this frame's sightings for the rest of the session.
    pub fn commit_removed(&mut self, slots: &[usize]) {
        for &slot in slots {
            let Some(status) = self.slots.get_mut(slot) else {
                warn!("card slot {} out of range, ignored", slot);
                continue;
            };
            *status = CardStatus::Removed;
        }
    }

    pub fn is_in_deck(&self, slot: usize) -> bool {
        self.slots.get(slot) == Some(&CardStatus::InDeck)
    }

    /// Cards still to be dealt.
    pub fn in_deck_count(&self) -> usize {
        self.in_deck_range(0..DECK_SIZE)
    }

    /// Cards still to be dealt within a slot range.
    pub fn in_deck_range(&self, range: std::ops::Range<usize>) -> usize {
        self.slots[range]
            .iter()
            .filter(|&&s| s == CardStatus::InDeck)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_scores() {
        assert_eq!(card_score(1), 11);
        assert_eq!(card_score(5), 5);
        assert_eq!(card_score(10), 10);
        assert_eq!(card_score(11), 10);
        assert_eq!(card_score(13), 10);
    }

    #[test]
    fn card_slots() {
        assert_eq!(card_slot(1, 0), 0);
        assert_eq!(card_slot(1, 3), 3);
        assert_eq!(card_slot(4, 2), 14);
        assert_eq!(card_slot(13, 3), 51);
    }

    #[test]
    fn fresh_tracker_has_full_pool() {
        let deck = DeckTracker::new();
        assert_eq!(deck.in_deck_count(), DECK_SIZE);
        assert!(deck.is_in_deck(0));
    }

    #[test]
    fn two_phase_commit() {
        let mut deck = DeckTracker::new();
        let seen = [card_slot(7, 1), card_slot(1, 2)];

        deck.mark_on_table(&seen);
        assert_eq!(deck.status(seen[0]), CardStatus::OnTable);
        assert_eq!(deck.status(seen[1]), CardStatus::OnTable);
        assert_eq!(deck.in_deck_count(), 50);

        deck.commit_removed(&seen);
        assert_eq!(deck.status(seen[0]), CardStatus::Removed);
        assert_eq!(deck.in_deck_count(), 50);
    }

    #[test]
    fn removed_never_regresses() {
        let mut deck = DeckTracker::new();
        let seen = [card_slot(12, 0)];
        deck.mark_on_table(&seen);
        deck.commit_removed(&seen);

        // Re-detections in later frames must not resurrect the card.
        for _ in 0..3 {
            deck.mark_on_table(&seen);
            assert_eq!(deck.status(seen[0]), CardStatus::Removed);
            deck.commit_removed(&seen);
            assert_eq!(deck.status(seen[0]), CardStatus::Removed);
        }
        assert_eq!(deck.in_deck_count(), 51);
    }

    #[test]
    fn out_of_range_slot_ignored() {
        let mut deck = DeckTracker::new();
        deck.mark_on_table(&[DECK_SIZE]);
        deck.commit_removed(&[DECK_SIZE + 5]);
        assert_eq!(deck.in_deck_count(), DECK_SIZE);
    }
}
