use serde::Serialize;

use super::signal::Signal;

/// One executed (simulated) trade in the live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub code: String,
    pub timestamp_ms: u64,
    pub signal: Signal,
    pub price: f64,
    /// Price after slippage and fees.
    pub execution_price: f64,
    /// Realized on SELL against the matching BUY execution price.
    pub profit: Option<f64>,
}
