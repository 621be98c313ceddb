//! Interval-duration sweep over recorded history.
//!
//! Each candidate replays the full history through its own `TickProcessor`,
//! so candidates share nothing but the read-only tick slice and can run on
//! a rayon pool in any order.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;

use crate::engine::{validate_duration, CostModel, TickProcessor};
use crate::error::EngineError;
use crate::model::optimization::{OptimizationReport, OptimizationResult, SweepStatus};
use crate::model::signal::Signal;
use crate::model::tick::Tick;

pub const TOP_RESULTS: usize = 5;
pub const DEFAULT_MAX_WORKERS: usize = 10;
const CANCEL_CHECK_EVERY: usize = 4096;

/// Cooperative cancellation flag shared between a sweep and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 1s..59s by the second, then 1min..24h by the minute.
pub fn default_candidates() -> Vec<Duration> {
    (1..60)
        .map(Duration::from_secs)
        .chain((1..=24 * 60).map(|m| Duration::from_secs(m * 60)))
        .collect()
}

/// Sort best-first (profit descending, shorter duration on ties) and keep the top five.
pub fn rank(mut results: Vec<OptimizationResult>) -> Vec<OptimizationResult> {
    results.sort_by(|a, b| {
        b.profit
            .total_cmp(&a.profit)
            .then_with(|| a.interval_duration.cmp(&b.interval_duration))
    });
    results.truncate(TOP_RESULTS);
    results
}

/// Replay `history` under one interval duration.
///
/// Profit is realized only on BUY -> SELL pairs; a position still open when
/// history runs out is discarded. Returns `None` if cancelled mid-replay.
pub fn simulate(
    history: &[Tick],
    duration: Duration,
    cost: CostModel,
    cancel: &CancelToken,
) -> Result<Option<OptimizationResult>, EngineError> {
    let code = history.first().map(|t| &*t.code).unwrap_or_default();
    let mut processor = TickProcessor::new(code, duration)?;
    let mut profit = 0.0;
    let mut trade_count = 0u32;
    let mut entry_price: Option<f64> = None;

    for (i, tick) in history.iter().enumerate() {
        if i % CANCEL_CHECK_EVERY == 0 && cancel.is_cancelled() {
            return Ok(None);
        }
        let price = tick.trade_price;
        match processor.step(tick.clone()).trade_signal {
            Some(Signal::Buy) => entry_price = Some(cost.apply(Signal::Buy, price)),
            Some(Signal::Sell) => {
                if let Some(entry) = entry_price.take() {
                    profit += cost.apply(Signal::Sell, price) - entry;
                    trade_count += 1;
                }
            }
            _ => {}
        }
    }

    Ok(Some(OptimizationResult {
        interval_duration: duration,
        profit,
        trade_count,
    }))
}

#[derive(Debug, Clone)]
pub struct Optimizer {
    max_workers: usize,
    cost: CostModel,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

impl Optimizer {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            cost: CostModel::frictionless(),
        }
    }

    pub fn with_cost_model(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    pub fn optimize(
        &self,
        history: &[Tick],
        candidates: &[Duration],
        cancel: &CancelToken,
    ) -> Result<OptimizationReport, EngineError> {
        self.optimize_with_progress(history, candidates, cancel, |_| {})
    }

    /// Like [`optimize`](Self::optimize), calling `on_result` from the worker
    /// thread as each candidate finishes (in completion order).
    pub fn optimize_with_progress<F>(
        &self,
        history: &[Tick],
        candidates: &[Duration],
        cancel: &CancelToken,
        on_result: F,
    ) -> Result<OptimizationReport, EngineError>
    where
        F: Fn(&OptimizationResult) + Sync,
    {
        let candidates: Vec<Duration> = candidates
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(validate_duration)
            .collect::<Result<_, _>>()?;
        let total = candidates.len();
        if total == 0 {
            return Ok(OptimizationReport {
                results: Vec::new(),
                status: SweepStatus::Complete,
                evaluated: 0,
                total,
            });
        }

        tracing::info!(
            candidates = total,
            ticks = history.len(),
            workers = self.max_workers,
            "Starting interval sweep"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .thread_name(|i| format!("optimizer-{}", i))
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;

        let cost = self.cost;
        let completed: Vec<OptimizationResult> = pool.install(|| {
            candidates
                .par_iter()
                .map(|&duration| {
                    if cancel.is_cancelled() {
                        return Ok(None);
                    }
                    let result = simulate(history, duration, cost, cancel)?;
                    if let Some(result) = &result {
                        on_result(result);
                    }
                    Ok(result)
                })
                .collect::<Result<Vec<_>, EngineError>>()
        })?
        .into_iter()
        .flatten()
        .collect();

        let evaluated = completed.len();
        let status = if evaluated < total {
            SweepStatus::Cancelled
        } else {
            SweepStatus::Complete
        };
        let results = rank(completed);

        match status {
            SweepStatus::Complete => tracing::info!(
                evaluated,
                best_secs = results.first().map(|r| r.interval_duration.as_secs()),
                best_profit = results.first().map(|r| r.profit),
                "Interval sweep complete"
            ),
            SweepStatus::Cancelled => {
                tracing::warn!(evaluated, total, "Interval sweep cancelled")
            }
        }

        Ok(OptimizationReport {
            results,
            status,
            evaluated,
            total,
        })
    }
}
