//! In-process paper venue.
//!
//! Accepts every order action (unless told to reject), keeps the resting
//! limit orders and records an action log. Market orders are acknowledged
//! but never generate fills; fills reach the engine through the feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::{
    Error, Instrument, LimitOrder, MarketOrder, OrderEntry, OrderHandle, Price, Result, Side, Size,
};

/// A limit order currently resting on the paper venue
#[derive(Debug, Clone, PartialEq)]
pub struct RestingOrder {
    pub instrument: Instrument,
    pub side: Side,
    pub price: Price,
    pub size: Size,
    pub updated_at: DateTime<Utc>,
}

/// Everything the venue was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum VenueAction {
    Place { order: LimitOrder, handle: OrderHandle },
    Modify { order: LimitOrder, handle: OrderHandle },
    Market(MarketOrder),
    Cancel(OrderHandle),
}

#[derive(Default)]
struct PaperBook {
    resting: HashMap<OrderHandle, RestingOrder>,
    actions: Vec<VenueAction>,
    reject_all: bool,
}

/// Paper venue - order entry without a network
#[derive(Default)]
pub struct PaperVenue {
    book: Mutex<PaperBook>,
}

impl PaperVenue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent action with an exchange error.
    pub fn set_reject_all(&self, reject: bool) {
        self.book.lock().reject_all = reject;
    }

    /// Copy of the action log
    pub fn actions(&self) -> Vec<VenueAction> {
        self.book.lock().actions.clone()
    }

    /// Drain the action log
    pub fn take_actions(&self) -> Vec<VenueAction> {
        std::mem::take(&mut self.book.lock().actions)
    }

    pub fn resting(&self, handle: &OrderHandle) -> Option<RestingOrder> {
        self.book.lock().resting.get(handle).cloned()
    }

    pub fn resting_count(&self) -> usize {
        self.book.lock().resting.len()
    }

    /// Resting orders for one instrument and side, best price first
    pub fn resting_on(&self, instrument: Instrument, side: Side) -> Vec<RestingOrder> {
        let mut orders: Vec<RestingOrder> = self
            .book
            .lock()
            .resting
            .values()
            .filter(|o| o.instrument == instrument && o.side == side)
            .cloned()
            .collect();
        orders.sort_by(|a, b| match side {
            Side::Buy => b.price.total_cmp(&a.price),
            Side::Sell => a.price.total_cmp(&b.price),
        });
        orders
    }
}

#[async_trait]
impl OrderEntry for PaperVenue {
    async fn place_limit(&self, order: LimitOrder) -> Result<OrderHandle> {
        let mut book = self.book.lock();
        if book.reject_all {
            return Err(Error::Exchange(format!(
                "paper venue rejected {} {} {}@{}",
                order.instrument, order.side, order.size, order.price
            )));
        }

        let handle = OrderHandle::new(Uuid::new_v4().to_string());
        let resting = RestingOrder {
            instrument: order.instrument,
            side: order.side,
            price: order.price,
            size: order.size,
            updated_at: Utc::now(),
        };

        let replaced = order
            .handle
            .as_ref()
            .and_then(|old| book.resting.remove(old));
        book.resting.insert(handle.clone(), resting);

        if let Some(old) = replaced {
            let rested_ms = (Utc::now() - old.updated_at).num_milliseconds();
            debug!(
                "📝 [paper] modify {} {} {}@{} -> {}@{} (rested {}ms)",
                order.instrument, order.side, old.size, old.price, order.size, order.price, rested_ms
            );
            book.actions.push(VenueAction::Modify {
                order,
                handle: handle.clone(),
            });
        } else {
            debug!("📝 [paper] place {} {} {}@{}", order.instrument, order.side, order.size, order.price);
            book.actions.push(VenueAction::Place {
                order,
                handle: handle.clone(),
            });
        }
        Ok(handle)
    }

    async fn place_market(&self, order: MarketOrder) -> Result<()> {
        let mut book = self.book.lock();
        if book.reject_all {
            return Err(Error::Exchange(format!(
                "paper venue rejected market {} {} {}",
                order.instrument, order.side, order.size
            )));
        }
        info!("📝 [paper] market {} {} {}", order.instrument, order.side, order.size);
        book.actions.push(VenueAction::Market(order));
        Ok(())
    }

    async fn cancel(&self, handle: &OrderHandle) -> Result<()> {
        let mut book = self.book.lock();
        if book.reject_all {
            return Err(Error::Exchange(format!("paper venue rejected cancel {}", handle)));
        }
        if book.resting.remove(handle).is_none() {
            return Err(Error::Exchange(format!("unknown order {}", handle)));
        }
        book.actions.push(VenueAction::Cancel(handle.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "paper"
    }
}
