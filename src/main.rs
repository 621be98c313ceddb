use anyhow::Result;
use tokio::sync::{mpsc, watch};

use interval_trader::config::Config;
use interval_trader::event::{AppEvent, WsConnectionStatus};
use interval_trader::model::tick::Tick;
use interval_trader::optimizer::CancelToken;
use interval_trader::runtime::{self, RuntimeHandle, RuntimeSettings};
use interval_trader::upbit::ws::UpbitWsClient;

fn log_event(event: &AppEvent) {
    match event {
        AppEvent::TickProcessed { code, event } => {
            if event.interval_closed {
                tracing::info!(
                    code = %code,
                    price = event.current_price,
                    average = ?event.current_average,
                    slope = ?event.current_slope,
                    holding = event.new_state.is_holding,
                    "Interval closed"
                );
            } else {
                tracing::trace!(code = %code, price = event.current_price, "tick_processed");
            }
        }
        AppEvent::Trade(record) => tracing::info!(
            code = %record.code,
            signal = record.signal.as_str(),
            execution_price = record.execution_price,
            profit = ?record.profit,
            "trade_event"
        ),
        AppEvent::Warning { code, warning } => {
            tracing::debug!(code = %code, warning = %warning, "warning")
        }
        AppEvent::ConfigUpdated { interval } => {
            tracing::info!(interval_secs = interval.as_secs(), "config_updated")
        }
        AppEvent::WsStatus(WsConnectionStatus::Reconnecting { attempt, delay_ms }) => {
            tracing::info!(attempt, delay_ms, "Ticker feed reconnecting")
        }
        AppEvent::WsStatus(status) => tracing::info!(status = ?status, "Ticker feed status"),
        AppEvent::TickDropped => {}
        AppEvent::ParseError(e) => tracing::debug!(error = %e, "parse_error"),
    }
}

async fn final_sweep(handle: &RuntimeHandle, codes: &[String]) {
    let cancel = CancelToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received again, cancelling sweep");
            cancel_on_signal.cancel();
        }
    });

    for code in codes {
        match handle.run_optimizer(code, None, cancel.clone()).await {
            Ok(report) => {
                for (rank, result) in report.results.iter().enumerate() {
                    tracing::info!(
                        code = %code,
                        rank = rank + 1,
                        interval_secs = result.interval_duration.as_secs(),
                        profit = result.profit,
                        trades = result.trade_count,
                        partial = report.is_partial(),
                        "Sweep result"
                    );
                }
            }
            Err(e) => tracing::error!(code = %code, error = %e, "Sweep failed"),
        }
        if cancel.is_cancelled() {
            break;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    // Init tracing (JSON lines to file)
    let log_file = std::fs::File::create("interval-trader.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.logging.level.as_str())
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();

    let codes = config.upbit.tradable_codes();
    tracing::info!(
        codes = ?codes,
        ws_url = %config.upbit.ws_url,
        interval = %config.trading.interval,
        "Starting interval-trader"
    );

    let (tick_tx, tick_rx) = mpsc::channel::<Tick>(config.runtime.tick_channel_capacity);
    let (app_tx, mut app_rx) = mpsc::channel::<AppEvent>(config.runtime.event_channel_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let settings = RuntimeSettings::from_config(&config)?;
    let (handle, runtime_task) =
        runtime::spawn(settings, tick_rx, app_tx.clone(), shutdown_rx.clone())?;

    let ws_client = UpbitWsClient::new(&config.upbit.ws_url, codes.clone());
    let ws_shutdown = shutdown_rx.clone();
    let ws_task = tokio::spawn(async move {
        if let Err(e) = ws_client.connect_and_run(tick_tx, app_tx, ws_shutdown).await {
            tracing::error!(error = %e, "Ticker feed stopped");
        }
    });

    let log_task = tokio::spawn(async move {
        while let Some(event) = app_rx.recv().await {
            log_event(&event);
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl+C received");

    let _ = shutdown_tx.send(true);
    let _ = ws_task.await;
    let _ = runtime_task.await;

    tracing::info!(ticks = handle.history().len(), "Running final interval sweep");
    final_sweep(&handle, &codes).await;

    match (handle.trade_history(), handle.realized_profit()) {
        (Ok(trades), Ok(realized)) => {
            tracing::info!(trades = trades.len(), realized, "Session trades")
        }
        (Err(e), _) | (_, Err(e)) => tracing::warn!(error = %e, "Failed to read trade history"),
    }

    drop(handle);
    log_task.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}
