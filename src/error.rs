use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the aggregation / signal / optimizer core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid interval duration: {0}")]
    InvalidDuration(String),

    #[error("malformed tick payload: {0}")]
    Parse(String),

    #[error("optimizer worker pool: {0}")]
    WorkerPool(String),
}

/// Non-fatal conditions reported alongside a processed tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    StaleTick {
        timestamp_ms: u64,
        window_start_ms: u64,
    },
    EmptyWindowOnClose {
        windows: u64,
        from_ms: u64,
        to_ms: u64,
    },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleTick {
                timestamp_ms,
                window_start_ms,
            } => write!(
                f,
                "stale tick at {} precedes window start {}",
                timestamp_ms, window_start_ms
            ),
            Self::EmptyWindowOnClose {
                windows,
                from_ms,
                to_ms,
            } => write!(
                f,
                "{} empty window(s) closed between {} and {}",
                windows, from_ms, to_ms
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("runtime is no longer running")]
    RuntimeClosed,

    #[error("{0} lock poisoned")]
    StatePoisoned(&'static str),

    #[error("background task failed: {0}")]
    Task(String),
}
