pub mod aggregator;
pub mod cost;
pub mod processor;
pub mod signal_engine;

pub use aggregator::{interval_from_seconds, validate_duration, Ingest, IntervalAggregator};
pub use cost::CostModel;
pub use processor::{MarketState, ProcessedTickEvent, TickOutcome, TickProcessor};
pub use signal_engine::{PositionState, SignalEngine, SignalState};
