use crate::model::signal::Signal;

/// Slippage and fee applied to simulated fills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub slippage_rate: f64,
    pub fee_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::frictionless()
    }
}

impl CostModel {
    pub fn new(slippage_rate: f64, fee_rate: f64) -> Self {
        Self {
            slippage_rate,
            fee_rate,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Effective execution price: buys pay up, sells receive less.
    pub fn apply(&self, signal: Signal, price: f64) -> f64 {
        match signal {
            Signal::Buy => price * (1.0 + self.slippage_rate) * (1.0 + self.fee_rate),
            Signal::Sell => price * (1.0 - self.slippage_rate) * (1.0 - self.fee_rate),
            Signal::Hold => price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_is_identity() {
        let cost = CostModel::frictionless();
        assert_eq!(cost.apply(Signal::Buy, 100.0), 100.0);
        assert_eq!(cost.apply(Signal::Sell, 100.0), 100.0);
    }

    #[test]
    fn costs_widen_the_round_trip() {
        let cost = CostModel::new(0.0002, 0.0005);
        let buy = cost.apply(Signal::Buy, 10_000.0);
        let sell = cost.apply(Signal::Sell, 10_000.0);
        assert!((buy - 10_000.0 * 1.0002 * 1.0005).abs() < 1e-9);
        assert!((sell - 10_000.0 * 0.9998 * 0.9995).abs() < 1e-9);
        assert!(sell < buy);
    }
}
