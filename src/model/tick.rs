use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of the last trade relative to the previous reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Change {
    Rise,
    Fall,
    Even,
}

/// A single trade observation. `code` is shared so replays clone ticks
/// without reallocating the market name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub code: Arc<str>,
    pub trade_price: f64,
    pub signed_change_price: f64,
    pub signed_change_rate: f64,
    pub change: Change,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
}

impl Tick {
    /// Create a price-only tick, as stored in recorded history.
    pub fn from_price(code: &str, price: f64, timestamp_ms: u64) -> Self {
        Self {
            code: Arc::from(code),
            trade_price: price,
            signed_change_price: 0.0,
            signed_change_rate: 0.0,
            change: Change::Even,
            timestamp_ms,
        }
    }

    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_feed_field_names() {
        let tick = Tick::from_price("KRW-BTC", 100.0, 1_700_000_000_000);
        let v = serde_json::to_value(&tick).unwrap();
        assert_eq!(v["code"], "KRW-BTC");
        assert_eq!(v["change"], "EVEN");
        assert_eq!(v["timestamp"], 1_700_000_000_000u64);
        assert!(v.get("timestamp_ms").is_none());
    }

    #[test]
    fn event_time_is_utc_millis() {
        let tick = Tick::from_price("KRW-BTC", 1.0, 1_676_965_262_177);
        let at = tick.event_time().unwrap();
        assert_eq!(at.timestamp_millis(), 1_676_965_262_177);
    }

    #[test]
    fn clones_share_the_code() {
        let tick = Tick::from_price("KRW-BTC", 1.0, 0);
        let copy = tick.clone();
        assert!(Arc::ptr_eq(&tick.code, &copy.code));

        let parsed: Tick = serde_json::from_value(serde_json::to_value(&tick).unwrap()).unwrap();
        assert_eq!(parsed, tick);
    }
}
