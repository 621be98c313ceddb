use std::time::Duration;

use serde::{Serialize, Serializer};

fn duration_as_nanos<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
}

/// Outcome of replaying history under one candidate interval duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    #[serde(serialize_with = "duration_as_nanos")]
    pub interval_duration: Duration,
    pub profit: f64,
    pub trade_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStatus {
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    /// Ranked best-first, at most five entries.
    pub results: Vec<OptimizationResult>,
    pub status: SweepStatus,
    /// Candidates fully replayed before the sweep ended.
    pub evaluated: usize,
    pub total: usize,
}

impl OptimizationReport {
    pub fn is_partial(&self) -> bool {
        self.status == SweepStatus::Cancelled
    }

    pub fn best(&self) -> Option<&OptimizationResult> {
        self.results.first()
    }
}
