//! Core traits - the order-entry seam between the engine and a venue

use async_trait::async_trait;

use crate::core::{LimitOrder, MarketOrder, OrderHandle, Result};

/// Order entry interface - implemented by venue transports
///
/// The engine awaits every call before touching the next feed event, so
/// implementations never see two concurrent requests from one engine.
#[async_trait]
pub trait OrderEntry: Send + Sync {
    /// Place (`handle == None`) or modify a limit order; returns the handle
    /// the order now rests under.
    async fn place_limit(&self, order: LimitOrder) -> Result<OrderHandle>;

    /// Send an immediate market order
    async fn place_market(&self, order: MarketOrder) -> Result<()>;

    /// Cancel a resting order
    async fn cancel(&self, handle: &OrderHandle) -> Result<()>;

    /// Venue name
    fn name(&self) -> &str;
}
