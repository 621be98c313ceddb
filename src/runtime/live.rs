use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::history::TickHistory;
use super::ledger::TradeLedger;
use crate::config::Config;
use crate::engine::{interval_from_seconds, validate_duration, CostModel, TickProcessor};
use crate::error::AppError;
use crate::event::AppEvent;
use crate::model::optimization::OptimizationReport;
use crate::model::tick::Tick;
use crate::model::trade::TradeRecord;
use crate::optimizer::{default_candidates, CancelToken, Optimizer};

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub interval: Duration,
    pub cost: CostModel,
    pub history_limit: usize,
    pub max_workers: usize,
}

impl RuntimeSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let interval = config
            .trading
            .interval()
            .context("trading.interval is invalid")?;
        Ok(Self {
            interval,
            cost: config.trading.cost_model(),
            history_limit: config.runtime.history_limit,
            max_workers: config.optimizer.max_workers,
        })
    }
}

enum RuntimeCommand {
    UpdateInterval {
        interval: Duration,
        reply: oneshot::Sender<()>,
    },
}

/// Caller-side handle to a running [`spawn`]ed runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    cmd_tx: mpsc::Sender<RuntimeCommand>,
    history: Arc<TickHistory>,
    ledger: Arc<TradeLedger>,
    optimizer: Optimizer,
}

impl RuntimeHandle {
    /// Change the interval of every instrument's next window. Resolves once
    /// the consumer loop has applied it, between two ticks.
    pub async fn update_config(&self, interval_seconds: i64) -> Result<Duration, AppError> {
        let interval = interval_from_seconds(interval_seconds)?;
        let (reply, done) = oneshot::channel();
        self.cmd_tx
            .send(RuntimeCommand::UpdateInterval { interval, reply })
            .await
            .map_err(|_| AppError::RuntimeClosed)?;
        done.await.map_err(|_| AppError::RuntimeClosed)?;
        Ok(interval)
    }

    /// Sweep `candidates` (or the default grid) over the recorded history of
    /// `code` on a blocking thread, leaving live processing untouched.
    pub async fn run_optimizer(
        &self,
        code: &str,
        candidates: Option<Vec<Duration>>,
        cancel: CancelToken,
    ) -> Result<OptimizationReport, AppError> {
        let history = self.history.snapshot_for(code)?;
        let candidates = candidates.unwrap_or_else(default_candidates);
        let optimizer = self.optimizer.clone();
        let report = tokio::task::spawn_blocking(move || {
            optimizer.optimize(&history, &candidates, &cancel)
        })
        .await
        .map_err(|e| AppError::Task(e.to_string()))??;
        Ok(report)
    }

    pub fn trade_history(&self) -> Result<Vec<TradeRecord>, AppError> {
        self.ledger.history()
    }

    pub fn realized_profit(&self) -> Result<f64, AppError> {
        self.ledger.realized_profit()
    }

    pub fn history(&self) -> &TickHistory {
        &self.history
    }
}

struct Runtime {
    interval: Duration,
    processors: HashMap<String, TickProcessor>,
    history: Arc<TickHistory>,
    ledger: Arc<TradeLedger>,
    event_tx: mpsc::Sender<AppEvent>,
}

/// Start the single consumer loop that owns every instrument's processor.
pub fn spawn(
    settings: RuntimeSettings,
    tick_rx: mpsc::Receiver<Tick>,
    event_tx: mpsc::Sender<AppEvent>,
    shutdown: watch::Receiver<bool>,
) -> Result<(RuntimeHandle, JoinHandle<()>), AppError> {
    let interval = validate_duration(settings.interval)?;
    let history = Arc::new(TickHistory::new(settings.history_limit));
    let ledger = Arc::new(TradeLedger::new(settings.cost));
    let (cmd_tx, cmd_rx) = mpsc::channel(16);

    let runtime = Runtime {
        interval,
        processors: HashMap::new(),
        history: history.clone(),
        ledger: ledger.clone(),
        event_tx,
    };
    let task = tokio::spawn(runtime.run(tick_rx, cmd_rx, shutdown));

    let handle = RuntimeHandle {
        cmd_tx,
        history,
        ledger,
        optimizer: Optimizer::new(settings.max_workers).with_cost_model(settings.cost),
    };
    Ok((handle, task))
}

impl Runtime {
    async fn run(
        mut self,
        mut tick_rx: mpsc::Receiver<Tick>,
        mut cmd_rx: mpsc::Receiver<RuntimeCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut commands_open = true;
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Runtime shutting down");
                    break;
                }
                cmd = cmd_rx.recv(), if commands_open => match cmd {
                    Some(cmd) => self.apply(cmd).await,
                    None => commands_open = false,
                },
                tick = tick_rx.recv() => match tick {
                    Some(tick) => self.on_tick(tick).await,
                    None => {
                        tracing::info!("Tick channel closed, runtime exiting");
                        break;
                    }
                },
            }
        }
    }

    async fn apply(&mut self, cmd: RuntimeCommand) {
        match cmd {
            RuntimeCommand::UpdateInterval { interval, reply } => {
                self.interval = interval;
                for (code, processor) in self.processors.iter_mut() {
                    if let Err(e) = processor.set_duration(interval) {
                        tracing::error!(code = %code, error = %e, "Failed to update interval");
                    }
                }
                tracing::info!(interval_secs = interval.as_secs(), "Interval updated");
                let _ = self.event_tx.send(AppEvent::ConfigUpdated { interval }).await;
                let _ = reply.send(());
            }
        }
    }

    async fn on_tick(&mut self, tick: Tick) {
        if let Err(e) = self.history.record(tick.clone()) {
            tracing::error!(error = %e, "Failed to record tick");
        }

        let code = tick.code.to_string();
        let timestamp_ms = tick.timestamp_ms;
        let event_time = tick.event_time();
        let processor = match self.processors.entry(code.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => match TickProcessor::new(code.clone(), self.interval) {
                Ok(processor) => entry.insert(processor),
                Err(e) => {
                    tracing::error!(code = %code, error = %e, "Failed to create processor");
                    return;
                }
            },
        };
        let event = processor.process(tick);
        let trade_signal = event.trade_signal;
        let price = event.current_price;

        if let Some(warning) = &event.warning {
            tracing::warn!(code = %code, warning = %warning, "Engine warning");
            let _ = self
                .event_tx
                .send(AppEvent::Warning {
                    code: code.clone(),
                    warning: warning.clone(),
                })
                .await;
        }

        let _ = self
            .event_tx
            .send(AppEvent::TickProcessed {
                code: code.clone(),
                event,
            })
            .await;

        if let Some(signal) = trade_signal {
            match self.ledger.record(&code, signal, price, timestamp_ms) {
                Ok(record) => {
                    tracing::info!(
                        code = %code,
                        signal = signal.as_str(),
                        price,
                        execution_price = record.execution_price,
                        profit = ?record.profit,
                        at = ?event_time,
                        "Trade signal"
                    );
                    let _ = self.event_tx.send(AppEvent::Trade(record)).await;
                }
                Err(e) => tracing::error!(error = %e, "Failed to record trade"),
            }
        }
    }
}
