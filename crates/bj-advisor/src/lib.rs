use bj_state::{DeckTracker, DECK_SIZE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Odds for the next draw given the current hand.
///
/// `lose` is the probability the draw pushes the hand past 21, `win` that it
/// lands exactly on 21, `stay_under` that it stays below. The three sum to
/// at most one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawOdds {
    pub lose: f64,
    pub stay_under: f64,
    pub win: f64,
}

impl DrawOdds {
    pub const ZERO: DrawOdds = DrawOdds {
        lose: 0.0,
        stay_under: 0.0,
        win: 0.0,
    };
}

/// Compute next-draw odds from the residual (points left to reach 21) and
/// the cards still in the deck.
///
/// An exhausted pool is a defined boundary, not a division fault: when every
/// card has been seen the odds collapse to zero.
pub fn draw_odds(residual: i32, deck: &DeckTracker) -> DrawOdds {
    let pool = deck.in_deck_count();
    if pool == 0 {
        debug!("all {} cards seen, no draws left", DECK_SIZE);
        return DrawOdds::ZERO;
    }

    let lose = pr_losing(residual, deck, pool);
    let win = pr_winning(residual, deck, pool);
    let stay_under = (1.0 - lose - win).max(0.0);

    DrawOdds {
        lose,
        stay_under,
        win,
    }
}

/// Probability that the next draw pushes the hand past 21.
///
/// With the residual at one or below no draw is safe (the cheapest card is
/// worth two points); above eleven no single card can overshoot. In between,
/// the busting cards are the aces (worth eleven) plus every rank strictly
/// above the residual.
fn pr_losing(residual: i32, deck: &DeckTracker, pool: usize) -> f64 {
    if residual <= 1 {
        return 1.0;
    }
    if residual > 11 {
        return 0.0;
    }
    let mut busting = deck.in_deck_range(0..4);
    busting += deck.in_deck_range(residual as usize * 4..DECK_SIZE);
    busting as f64 / pool as f64
}

/// Probability that the next draw lands exactly on 21: the four cards whose
/// rank equals the residual.
fn pr_winning(residual: i32, deck: &DeckTracker, pool: usize) -> f64 {
    if residual <= 1 || residual > 11 {
        return 0.0;
    }
    let first = (residual as usize - 1) * 4;
    deck.in_deck_range(first..first + 4) as f64 / pool as f64
}
