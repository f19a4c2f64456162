//! Position-fading two-level quote ladder.
//!
//! The fair value is shifted against the current inventory so that holding
//! exactly `limit` contracts consumes half of `max_range`:
//!
//! ```text
//! fade          = (max_range / 2) / limit
//! adjusted_fair = fair - position * fade
//! bid1 = adjusted_fair - width/2          ask1 = adjusted_fair + width/2
//! bid2 = min(bid1 - tick, adjusted_fair - clip*fade - width/2)
//! ask2 = max(ask1 + tick, adjusted_fair + clip*fade + width/2)
//! ```
//!
//! Sizes fill `clip` per level from the remaining headroom on each side. Once
//! a side has no headroom left, its quotes are pulled and the other side is
//! collapsed onto the former touch price to work the position back inside
//! the limit.

use crate::core::{InstrumentSpec, Level, Position, Price, Side, Size};

/// One ladder level. `size == 0` means "do not quote".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quote {
    pub price: Price,
    pub size: Size,
}

impl Quote {
    pub fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }
}

/// Two levels on one side, indexed by [`Level`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideLadder {
    levels: [Quote; 2],
}

impl SideLadder {
    pub fn new(first: Quote, second: Quote) -> Self {
        Self {
            levels: [first, second],
        }
    }

    #[inline(always)]
    pub fn get(&self, level: Level) -> &Quote {
        &self.levels[level.index()]
    }

    pub fn total_size(&self) -> Size {
        self.levels.iter().map(|q| q.size).sum()
    }
}

/// Full bid/ask ladder for one instrument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ladder {
    pub bids: SideLadder,
    pub asks: SideLadder,
    pub fade: f64,
    pub adjusted_fair: Price,
}

impl Ladder {
    pub fn side(&self, side: Side) -> &SideLadder {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }
}

/// Compute the ladder for `fair` at inventory `position`. Pure.
pub fn compute_ladder(spec: &InstrumentSpec, fair: Price, position: Position) -> Ladder {
    let limit = Position::from(spec.limit);
    let clip = Position::from(spec.clip);
    let half_width = spec.width / 2.0;

    let fade = (spec.max_range / 2.0) / limit as f64;
    let adjusted_fair = fair - position as f64 * fade;

    let bid1 = adjusted_fair - half_width;
    let ask1 = adjusted_fair + half_width;
    let bid2 = f64::min(bid1 - spec.tick, adjusted_fair - clip as f64 * fade - half_width);
    let ask2 = f64::max(ask1 + spec.tick, adjusted_fair + clip as f64 * fade + half_width);

    let bids_left = limit - position;
    let asks_left = limit + position;

    let (bids, asks) = if bids_left <= 0 {
        // Long at or past the limit: only sell, starting at the old bid.
        (
            SideLadder::default(),
            SideLadder::new(
                Quote::new(bid1, spec.clip),
                Quote::new(bid1 + spec.tick, spec.clip),
            ),
        )
    } else if asks_left <= 0 {
        (
            SideLadder::new(
                Quote::new(ask1, spec.clip),
                Quote::new(ask1 - spec.tick, spec.clip),
            ),
            SideLadder::default(),
        )
    } else {
        let (b1, b2) = level_sizes(bids_left, clip);
        let (a1, a2) = level_sizes(asks_left, clip);
        (
            SideLadder::new(Quote::new(bid1, b1), Quote::new(bid2, b2)),
            SideLadder::new(Quote::new(ask1, a1), Quote::new(ask2, a2)),
        )
    };

    Ladder {
        bids,
        asks,
        fade,
        adjusted_fair,
    }
}

/// Split positive headroom into a first and second level of at most `clip`.
fn level_sizes(left: Position, clip: Position) -> (Size, Size) {
    let first = left.min(clip).max(0);
    let second = (left - clip).min(clip).max(0);
    (to_size(first), to_size(second))
}

fn to_size(n: Position) -> Size {
    Size::try_from(n).unwrap_or(Size::MAX)
}
