use serde::Serialize;

use crate::model::interval::IntervalResult;
use crate::model::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionState {
    Flat,
    Long,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalState {
    pub is_holding: bool,
    pub last_signal: Signal,
    pub last_average: Option<f64>,
    pub last_slope: Option<f64>,
}

impl Default for SignalState {
    fn default() -> Self {
        Self {
            is_holding: false,
            last_signal: Signal::Hold,
            last_average: None,
            last_slope: None,
        }
    }
}

/// Flat/long crossing detector driven by closed-interval slopes.
///
/// Only the sign of the newly closed slope and the holding flag matter; the
/// previous interval's slope plays no part.
#[derive(Debug, Default)]
pub struct SignalEngine {
    state: SignalState,
}

impl SignalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_interval_close(&mut self, result: &IntervalResult) -> Signal {
        self.state.last_average = Some(result.average_price);
        self.state.last_slope = Some(result.slope);

        let signal = match (self.position(), result.slope) {
            (PositionState::Flat, slope) if slope > 0.0 => Signal::Buy,
            (PositionState::Long, slope) if slope < 0.0 => Signal::Sell,
            _ => Signal::Hold,
        };

        match signal {
            Signal::Buy => self.state.is_holding = true,
            Signal::Sell => self.state.is_holding = false,
            Signal::Hold => return Signal::Hold,
        }
        self.state.last_signal = signal;
        signal
    }

    pub fn position(&self) -> PositionState {
        if self.state.is_holding {
            PositionState::Long
        } else {
            PositionState::Flat
        }
    }

    pub fn is_holding(&self) -> bool {
        self.state.is_holding
    }

    pub fn state(&self) -> &SignalState {
        &self.state
    }
}
