use std::collections::HashMap;
use std::sync::Mutex;

use crate::engine::CostModel;
use crate::error::AppError;
use crate::model::signal::Signal;
use crate::model::trade::TradeRecord;

#[derive(Debug, Default)]
struct LedgerInner {
    trades: Vec<TradeRecord>,
    open_entries: HashMap<String, f64>,
}

/// Simulated fills of the live session, with realized profit per round trip.
#[derive(Debug)]
pub struct TradeLedger {
    cost: CostModel,
    inner: Mutex<LedgerInner>,
}

impl TradeLedger {
    pub fn new(cost: CostModel) -> Self {
        Self {
            cost,
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    pub fn record(
        &self,
        code: &str,
        signal: Signal,
        price: f64,
        timestamp_ms: u64,
    ) -> Result<TradeRecord, AppError> {
        let execution_price = self.cost.apply(signal, price);
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| AppError::StatePoisoned("trade ledger"))?;
        let profit = match signal {
            Signal::Buy => {
                guard.open_entries.insert(code.to_string(), execution_price);
                None
            }
            Signal::Sell => guard
                .open_entries
                .remove(code)
                .map(|entry| execution_price - entry),
            Signal::Hold => None,
        };
        let record = TradeRecord {
            code: code.to_string(),
            timestamp_ms,
            signal,
            price,
            execution_price,
            profit,
        };
        guard.trades.push(record.clone());
        Ok(record)
    }

    /// All trades, newest first.
    pub fn history(&self) -> Result<Vec<TradeRecord>, AppError> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| AppError::StatePoisoned("trade ledger"))?;
        Ok(guard.trades.iter().rev().cloned().collect())
    }

    pub fn realized_profit(&self) -> Result<f64, AppError> {
        Ok(self.history()?.iter().filter_map(|t| t.profit).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sell_realizes_against_buy_execution_price() {
        let ledger = TradeLedger::new(CostModel::frictionless());
        ledger.record("KRW-BTC", Signal::Buy, 100.0, 1).unwrap();
        let sell = ledger.record("KRW-BTC", Signal::Sell, 130.0, 2).unwrap();
        assert_eq!(sell.profit, Some(30.0));

        let history = ledger.history().unwrap();
        assert_eq!(history[0].signal, Signal::Sell);
        assert_eq!(history[1].signal, Signal::Buy);
        assert!((ledger.realized_profit().unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn positions_are_tracked_per_code() {
        let ledger = TradeLedger::new(CostModel::frictionless());
        ledger.record("KRW-BTC", Signal::Buy, 100.0, 1).unwrap();
        let sell = ledger.record("KRW-ETH", Signal::Sell, 50.0, 2).unwrap();
        assert_eq!(sell.profit, None);
    }
}
