//! Execution layer - keeps resting orders in line with the computed ladders

pub mod paper;

use tracing::{debug, info, warn};

use crate::core::{
    Instrument, InstrumentSpec, Level, LimitOrder, OrderEntry, OrderHandle, Price, Side, Size,
};
use crate::strategy::Ladder;
use crate::tick::round_to_tick;

pub use paper::{PaperVenue, RestingOrder, VenueAction};

/// What we believe rests at one (instrument, side, level).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSlot {
    pub handle: Option<OrderHandle>,
    pub price: Price,
    pub size: Size,
}

impl OrderSlot {
    pub fn is_resting(&self) -> bool {
        self.handle.is_some()
    }

    fn matches(&self, price: Price, size: Size) -> bool {
        self.is_resting() && self.price == price && self.size == size
    }
}

#[derive(Debug, Clone, Default)]
struct SideSlots {
    levels: [OrderSlot; 2],
}

#[derive(Debug, Clone, Default)]
struct InstrumentSlots {
    bids: SideSlots,
    asks: SideSlots,
}

impl InstrumentSlots {
    fn side(&self, side: Side) -> &SideSlots {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideSlots {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}

/// Outcome counts of one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub placed: u32,
    pub modified: u32,
    pub cancelled: u32,
    pub unchanged: u32,
    pub failed: u32,
}

impl SyncReport {
    pub fn actions(&self) -> u32 {
        self.placed + self.modified + self.cancelled
    }

    fn merge(&mut self, other: SyncReport) {
        self.placed += other.placed;
        self.modified += other.modified;
        self.cancelled += other.cancelled;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }
}

/// Reconciles ladders against the orders we have resting.
///
/// - live level, same rounded price and size already resting: nothing sent
/// - live level otherwise: place-or-modify, storing the returned handle
/// - zero-size level with a resting order: cancel and clear the slot
///
/// Venue errors are logged and leave the slot as it was; the next update
/// re-evaluates.
#[derive(Debug, Clone, Default)]
pub struct OrderSlotSync {
    slots: [InstrumentSlots; Instrument::COUNT],
}

impl OrderSlotSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, instrument: Instrument, side: Side, level: Level) -> &OrderSlot {
        &self.slots[instrument.index()].side(side).levels[level.index()]
    }

    fn slot_mut(&mut self, instrument: Instrument, side: Side, level: Level) -> &mut OrderSlot {
        &mut self.slots[instrument.index()].side_mut(side).levels[level.index()]
    }

    /// Forget the last sent price and size of every `instrument` slot while
    /// keeping the handles. After a fill the venue may hold less than we
    /// sent, so the next sync re-sends every live level as a modify.
    pub fn invalidate(&mut self, instrument: Instrument) {
        let slots = &mut self.slots[instrument.index()];
        for slot in slots.bids.levels.iter_mut().chain(slots.asks.levels.iter_mut()) {
            slot.price = 0.0;
            slot.size = 0;
        }
    }

    /// Number of slots currently holding a handle
    pub fn resting_count(&self) -> usize {
        self.slots
            .iter()
            .flat_map(|s| s.bids.levels.iter().chain(s.asks.levels.iter()))
            .filter(|slot| slot.is_resting())
            .count()
    }

    /// Sync the given sides of `instrument` to `ladder`.
    pub async fn sync(
        &mut self,
        venue: &dyn OrderEntry,
        instrument: Instrument,
        spec: &InstrumentSpec,
        ladder: &Ladder,
        sides: &[Side],
    ) -> SyncReport {
        let mut report = SyncReport::default();
        for &side in sides {
            for level in Level::ALL {
                let quote = *ladder.side(side).get(level);
                let price = round_to_tick(quote.price, spec.tick);
                let step = self
                    .sync_slot(venue, instrument, side, level, price, quote.size)
                    .await;
                report.merge(step);
            }
        }

        if report.actions() > 0 {
            info!(
                "🔁 {} ladder sync: placed={} modified={} cancelled={} failed={}",
                instrument, report.placed, report.modified, report.cancelled, report.failed
            );
        }
        report
    }

    async fn sync_slot(
        &mut self,
        venue: &dyn OrderEntry,
        instrument: Instrument,
        side: Side,
        level: Level,
        price: Price,
        size: Size,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        let slot = self.slot_mut(instrument, side, level);

        if size == 0 {
            let Some(handle) = slot.handle.clone() else {
                report.unchanged += 1;
                return report;
            };
            match venue.cancel(&handle).await {
                Ok(()) => {
                    debug!("{} {} {} cancelled {}", instrument, side, level, handle);
                    *slot = OrderSlot::default();
                    report.cancelled += 1;
                }
                Err(e) => {
                    warn!("Cancel {} {} {} failed: {}", instrument, side, level, e);
                    report.failed += 1;
                }
            }
            return report;
        }

        if slot.matches(price, size) {
            report.unchanged += 1;
            return report;
        }

        let modifying = slot.is_resting();
        let order = LimitOrder {
            instrument,
            side,
            price,
            size,
            handle: slot.handle.clone(),
        };
        match venue.place_limit(order).await {
            Ok(handle) => {
                debug!("{} {} {} -> {}@{} ({})", instrument, side, level, size, price, handle);
                *slot = OrderSlot {
                    handle: Some(handle),
                    price,
                    size,
                };
                if modifying {
                    report.modified += 1;
                } else {
                    report.placed += 1;
                }
            }
            Err(e) => {
                warn!("Order {} {} {} {}@{} failed: {}", instrument, side, level, size, price, e);
                report.failed += 1;
            }
        }
        report
    }
}
