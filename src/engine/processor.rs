use std::time::Duration;

use serde::Serialize;

use super::aggregator::{Ingest, IntervalAggregator};
use super::signal_engine::SignalEngine;
use crate::error::{EngineError, EngineWarning};
use crate::model::interval::duration_ms;
use crate::model::signal::Signal;
use crate::model::tick::Tick;

/// Snapshot of one instrument's window and signal state after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketState {
    pub code: String,
    pub interval_buffer: Vec<Tick>,
    pub interval_start_time: Option<u64>,
    pub interval_duration_ms: u64,
    pub is_holding: bool,
    pub last_signal: Signal,
    pub last_average: Option<f64>,
    pub last_slope: Option<f64>,
}

/// Emitted once per ingested tick (`"tick_processed"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedTickEvent {
    pub new_state: MarketState,
    pub current_price: f64,
    pub interval_closed: bool,
    /// Only set when `interval_closed`; otherwise keep the previous value.
    pub current_average: Option<f64>,
    pub current_slope: Option<f64>,
    pub trade_signal: Option<Signal>,
    pub stale: bool,
    pub warning: Option<EngineWarning>,
}

/// Per-tick result without the state snapshot, used for replays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub interval_closed: bool,
    pub current_average: Option<f64>,
    pub current_slope: Option<f64>,
    pub trade_signal: Option<Signal>,
    pub warning: Option<EngineWarning>,
}

/// Runs one instrument's ticks through the aggregator and signal engine.
/// Not meant to be shared between writers; callers serialize access.
#[derive(Debug)]
pub struct TickProcessor {
    code: String,
    aggregator: IntervalAggregator,
    signals: SignalEngine,
}

impl TickProcessor {
    pub fn new(code: impl Into<String>, duration: Duration) -> Result<Self, EngineError> {
        Ok(Self {
            code: code.into(),
            aggregator: IntervalAggregator::new(duration)?,
            signals: SignalEngine::new(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_duration(&mut self, duration: Duration) -> Result<(), EngineError> {
        self.aggregator.set_duration(duration)
    }

    pub fn is_holding(&self) -> bool {
        self.signals.is_holding()
    }

    pub fn step(&mut self, tick: Tick) -> TickOutcome {
        let timestamp_ms = tick.timestamp_ms;
        match self.aggregator.ingest(tick) {
            Ingest::Accepted => TickOutcome::default(),
            Ingest::Stale { window_start_ms } => TickOutcome {
                warning: Some(EngineWarning::StaleTick {
                    timestamp_ms,
                    window_start_ms,
                }),
                ..TickOutcome::default()
            },
            Ingest::Closed { result, gap } => {
                let signal = self.signals.on_interval_close(&result);
                // a gap has zero slope and never transitions; it is only reported
                let warning = gap.map(|gap| EngineWarning::EmptyWindowOnClose {
                    windows: gap.spanned_windows,
                    from_ms: gap.opened_at_ms,
                    to_ms: gap.closed_at_ms,
                });
                TickOutcome {
                    interval_closed: true,
                    current_average: Some(result.average_price),
                    current_slope: Some(result.slope),
                    trade_signal: signal.actionable(),
                    warning,
                }
            }
        }
    }

    pub fn process(&mut self, tick: Tick) -> ProcessedTickEvent {
        let current_price = tick.trade_price;
        let outcome = self.step(tick);
        ProcessedTickEvent {
            new_state: self.snapshot(),
            current_price,
            interval_closed: outcome.interval_closed,
            current_average: outcome.current_average,
            current_slope: outcome.current_slope,
            trade_signal: outcome.trade_signal,
            stale: matches!(outcome.warning, Some(EngineWarning::StaleTick { .. })),
            warning: outcome.warning,
        }
    }

    pub fn snapshot(&self) -> MarketState {
        let state = self.signals.state();
        MarketState {
            code: self.code.clone(),
            interval_buffer: self.aggregator.buffer().to_vec(),
            interval_start_time: self.aggregator.window().map(|w| w.start_ms),
            interval_duration_ms: duration_ms(self.aggregator.duration()),
            is_holding: state.is_holding,
            last_signal: state.last_signal,
            last_average: state.last_average,
            last_slope: state.last_slope,
        }
    }
}
