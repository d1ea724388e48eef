use bj_advisor::{draw_odds, DrawOdds};
use bj_state::{card_score, card_slot, CardStatus, DeckTracker};
use bj_vision::{process_frame, DetectedCard, SheetMatcher, VisionConfig};
use image::RgbaImage;
use serde::Serialize;
use tracing::debug;

/// All cross-frame state for one video session: the deck tracker, the
/// loaded template sheets, and the detection config. Built once when the
/// video opens, dropped when it ends; the deck is never reset mid-session.
pub struct CountingSession {
    deck: DeckTracker,
    matcher: SheetMatcher,
    config: VisionConfig,
    frames: u64,
}

/// What one frame produced, for whoever renders or logs it.
///
/// `deck` is the snapshot taken between the two commit phases, so cards
/// sighted this frame show as on-table here and as removed from the next
/// report on.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub cards: Vec<DetectedCard>,
    pub score: u32,
    pub residual: i32,
    pub odds: DrawOdds,
    pub deck: Vec<CardStatus>,
}

impl CountingSession {
    pub fn new(matcher: SheetMatcher, config: VisionConfig) -> Self {
        Self {
            deck: DeckTracker::new(),
            matcher,
            config,
            frames: 0,
        }
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Run one frame through detection, identification, the status commit
    /// and the odds computation.
    pub fn process_frame(&mut self, frame: &RgbaImage) -> FrameReport {
        self.frames += 1;
        let detections = process_frame(frame, &self.matcher, &self.config);

        let slots: Vec<usize> = detections
            .cards
            .iter()
            .map(|c| card_slot(c.rank, c.suit))
            .collect();

        // Phase one: this frame's sightings become visible as on-table.
        self.deck.mark_on_table(&slots);

        let score: u32 = detections.cards.iter().map(|c| card_score(c.rank)).sum();
        let residual = 21 - score as i32;
        let odds = draw_odds(residual, &self.deck);
        let deck = self.deck.statuses().to_vec();

        // Phase two: the first sighting retires a card for good; later
        // re-detections never put it back in the pool.
        self.deck.commit_removed(&slots);

        debug!(
            "frame {}: {} card(s), score {}, residual {}, pool {}",
            self.frames,
            detections.cards.len(),
            score,
            residual,
            self.deck.in_deck_count()
        );

        FrameReport {
            frame: self.frames,
            cards: detections.cards,
            score,
            residual,
            odds,
            deck,
        }
    }
}
