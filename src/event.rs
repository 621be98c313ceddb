use std::time::Duration;

use crate::engine::ProcessedTickEvent;
use crate::error::EngineWarning;
use crate::model::trade::TradeRecord;

#[derive(Debug, Clone)]
pub enum WsConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32, delay_ms: u64 },
}

/// Outbound events for the presentation layer.
#[derive(Debug, Clone)]
pub enum AppEvent {
    TickProcessed {
        code: String,
        event: ProcessedTickEvent,
    },
    Trade(TradeRecord),
    Warning {
        code: String,
        warning: EngineWarning,
    },
    ConfigUpdated {
        interval: Duration,
    },
    WsStatus(WsConnectionStatus),
    TickDropped,
    ParseError(String),
}

impl AppEvent {
    /// Event name as delivered to the presentation collaborator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TickProcessed { .. } => "tick_processed",
            Self::Trade(_) => "trade_event",
            Self::Warning { .. } => "warning",
            Self::ConfigUpdated { .. } => "config_updated",
            Self::WsStatus(_) => "ws_status",
            Self::TickDropped => "tick_dropped",
            Self::ParseError(_) => "parse_error",
        }
    }
}
