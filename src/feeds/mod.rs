//! Market data feeds - event types delivered to the engine, one at a time

pub mod json_lines;
pub mod message;

use serde::{Deserialize, Serialize};

use crate::core::{Instrument, Position, Price, PriceLevel, Side, Size};

pub use json_lines::read_json_lines;
pub use message::{parse_message, MessageEvent, RateUpdate};

/// Book levels for one instrument, best first on each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentBook {
    pub instrument: Instrument,
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
}

impl InstrumentBook {
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }
}

/// One of our orders traded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub instrument: Instrument,
    pub side: Side,
    pub quantity: Size,
    pub price: Price,
}

/// Feed update, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Market snapshot covering one or more instruments
    Book { books: Vec<InstrumentBook> },
    /// Free-text venue message (rates, announcements, chatter)
    Message { text: String },
    /// Our order was filled
    Fill(Fill),
    /// Venue-computed mark-to-market PnL
    Pnl { m2m: f64 },
    /// Externally supplied fair value
    Fair { instrument: Instrument, fair: Price },
    /// Venue-reported position, overriding the fill-tracked one
    Position { instrument: Instrument, position: Position },
}

impl FeedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedEvent::Book { .. } => "book",
            FeedEvent::Message { .. } => "message",
            FeedEvent::Fill(_) => "fill",
            FeedEvent::Pnl { .. } => "pnl",
            FeedEvent::Fair { .. } => "fair",
            FeedEvent::Position { .. } => "position",
        }
    }
}
