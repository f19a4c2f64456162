//! Error handling - flat, hierarchical errors for the engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Engine error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (invalid or inconsistent instrument table)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Venue rejected or failed an order action
    #[error("Exchange error: {0}")]
    Exchange(String),

    /// Feed transport errors (closed channel, unreadable input)
    #[error("Feed error: {0}")]
    Feed(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
