use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[default]
    #[serde(rename = "NONE")]
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "NONE",
        }
    }

    /// `Some(self)` for an actionable signal, `None` for `Hold`.
    pub fn actionable(self) -> Option<Self> {
        match self {
            Self::Hold => None,
            other => Some(other),
        }
    }
}
