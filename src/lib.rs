pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod optimizer;
pub mod runtime;

pub mod model {
    pub mod interval;
    pub mod optimization;
    pub mod signal;
    pub mod tick;
    pub mod trade;
}

pub mod upbit {
    pub mod types;
    pub mod ws;
}
