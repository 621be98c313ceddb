use std::sync::Arc;

use serde::Deserialize;

use crate::error::EngineError;
use crate::model::tick::{Change, Tick};

/// Upbit ticker stream event. Fields the engine does not need are ignored;
/// the ones it does need are required.
#[derive(Debug, Deserialize)]
pub struct UpbitTicker {
    pub code: String,
    pub trade_price: f64,
    pub signed_change_price: f64,
    pub signed_change_rate: f64,
    pub change: Change,
    pub timestamp: u64,
}

impl TryFrom<UpbitTicker> for Tick {
    type Error = EngineError;

    fn try_from(t: UpbitTicker) -> Result<Self, Self::Error> {
        if t.code.trim().is_empty() {
            return Err(EngineError::Parse("empty code".to_string()));
        }
        if !t.trade_price.is_finite() || t.trade_price <= 0.0 {
            return Err(EngineError::Parse(format!(
                "trade_price must be positive, got {}",
                t.trade_price
            )));
        }
        if !t.signed_change_price.is_finite() || !t.signed_change_rate.is_finite() {
            return Err(EngineError::Parse("non-finite change values".to_string()));
        }
        Ok(Tick {
            code: Arc::from(t.code),
            trade_price: t.trade_price,
            signed_change_price: t.signed_change_price,
            signed_change_rate: t.signed_change_rate,
            change: t.change,
            timestamp_ms: t.timestamp,
        })
    }
}

/// Parse one ticker frame (Upbit sends JSON as text or binary) into a tick.
pub fn parse_ticker_frame(payload: &[u8]) -> Result<Tick, EngineError> {
    let ticker: UpbitTicker =
        serde_json::from_slice(payload).map_err(|e| EngineError::Parse(e.to_string()))?;
    Tick::try_from(ticker)
}
