//! Typed parser for free-text venue messages.
//!
//! Two shapes are recognized:
//!
//! ```text
//! 1520, 0.0215, 0.0310, 0.0125          timestamp, ROR, HAP, USD
//! USD NEW FEDERAL FUNDS TARGET 0.0150    rate-target announcement
//! ```
//!
//! Anything else parses to [`MessageEvent::Unrecognized`].

use crate::core::RateCode;

const TARGET_MARKER: &str = " NEW FEDERAL FUNDS TARGET ";

/// Published annualized rates, in message order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateUpdate {
    pub timestamp: u64,
    pub ror: f64,
    pub hap: f64,
    pub usd: f64,
}

impl RateUpdate {
    /// `(code, rate)` pairs for every rate carried by the update.
    pub fn rates(&self) -> [(RateCode, f64); 3] {
        [
            (RateCode::Ror, self.ror),
            (RateCode::Hap, self.hap),
            (RateCode::Usd, self.usd),
        ]
    }
}

/// Result of parsing a text message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEvent {
    RateUpdate(RateUpdate),
    RateTarget { code: RateCode, target: f64 },
    Unrecognized,
}

/// Parse a text message into a typed event. Never fails.
pub fn parse_message(text: &str) -> MessageEvent {
    if let Some(update) = parse_rate_update(text) {
        return MessageEvent::RateUpdate(update);
    }
    if let Some((code, target)) = parse_rate_target(text) {
        return MessageEvent::RateTarget { code, target };
    }
    MessageEvent::Unrecognized
}

fn parse_rate_update(text: &str) -> Option<RateUpdate> {
    let mut fields = text.split(", ");
    let timestamp = fields.next().filter(|f| is_digits(f))?.parse().ok()?;
    let ror = parse_rate(fields.next()?)?;
    let hap = parse_rate(fields.next()?)?;
    let usd = parse_rate(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    Some(RateUpdate {
        timestamp,
        ror,
        hap,
        usd,
    })
}

fn parse_rate_target(text: &str) -> Option<(RateCode, f64)> {
    let (code, value) = text.split_once(TARGET_MARKER)?;
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let code = code.parse().ok()?;
    Some((code, parse_rate(value)?))
}

/// Unsigned decimal: digits and dots only, and it must parse as a finite f64.
fn parse_rate(field: &str) -> Option<f64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_digits(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_update() {
        let event = parse_message("1520, 0.0215, 0.031, 0.0125");
        assert_eq!(
            event,
            MessageEvent::RateUpdate(RateUpdate {
                timestamp: 1520,
                ror: 0.0215,
                hap: 0.031,
                usd: 0.0125,
            })
        );
    }

    #[test]
    fn test_rate_update_rejects_wrong_arity() {
        assert_eq!(parse_message("1520, 0.02, 0.03"), MessageEvent::Unrecognized);
        assert_eq!(
            parse_message("1520, 0.02, 0.03, 0.01, 0.04"),
            MessageEvent::Unrecognized
        );
    }

    #[test]
    fn test_rate_update_rejects_signs_and_spacing() {
        assert_eq!(parse_message("1520, -0.02, 0.03, 0.01"), MessageEvent::Unrecognized);
        assert_eq!(parse_message("1520,0.02,0.03,0.01"), MessageEvent::Unrecognized);
        assert_eq!(parse_message("t1, 0.02, 0.03, 0.01"), MessageEvent::Unrecognized);
        assert_eq!(parse_message("1520, 0.02, 0.03, 0.01 "), MessageEvent::Unrecognized);
    }

    #[test]
    fn test_rate_target() {
        assert_eq!(
            parse_message("USD NEW FEDERAL FUNDS TARGET 0.015"),
            MessageEvent::RateTarget {
                code: RateCode::Usd,
                target: 0.015
            }
        );
        assert_eq!(
            parse_message("HAP NEW FEDERAL FUNDS TARGET 2"),
            MessageEvent::RateTarget {
                code: RateCode::Hap,
                target: 2.0
            }
        );
    }

    #[test]
    fn test_rate_target_unknown_code() {
        assert_eq!(
            parse_message("EUR NEW FEDERAL FUNDS TARGET 0.015"),
            MessageEvent::Unrecognized
        );
        assert_eq!(
            parse_message("usd NEW FEDERAL FUNDS TARGET 0.015"),
            MessageEvent::Unrecognized
        );
    }

    #[test]
    fn test_free_text_is_unrecognized() {
        assert_eq!(parse_message("Round started"), MessageEvent::Unrecognized);
        assert_eq!(parse_message(""), MessageEvent::Unrecognized);
    }
}
