use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;

use super::types::parse_ticker_frame;
use crate::event::{AppEvent, WsConnectionStatus};
use crate::model::tick::Tick;

/// Exponential backoff for reconnection.
struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Build the `ticker` subscription request for `codes`.
pub fn subscribe_message(codes: &[String]) -> String {
    serde_json::json!([
        { "ticket": uuid::Uuid::new_v4().to_string() },
        { "type": "ticker", "codes": codes },
    ])
    .to_string()
}

pub struct UpbitWsClient {
    url: String,
    codes: Vec<String>,
}

impl UpbitWsClient {
    pub fn new(ws_url: &str, codes: Vec<String>) -> Self {
        Self {
            url: ws_url.to_string(),
            codes,
        }
    }

    /// Connect and run the WebSocket loop with automatic reconnection.
    /// Sends WsStatus events through `status_tx` and ticks through `tick_tx`.
    pub async fn connect_and_run(
        &self,
        tick_tx: mpsc::Sender<Tick>,
        status_tx: mpsc::Sender<AppEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 2.0);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self
                .connect_once(&tick_tx, &status_tx, &mut shutdown, &mut backoff)
                .await
            {
                Ok(()) => {
                    // Clean shutdown requested
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Disconnected))
                        .await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Ticker feed disconnected");
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Disconnected))
                        .await;

                    let delay = backoff.next_delay();
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Reconnecting {
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                        }))
                        .await;

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = shutdown.changed() => {
                            tracing::info!("Shutdown during reconnect");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn connect_once(
        &self,
        tick_tx: &mpsc::Sender<Tick>,
        status_tx: &mpsc::Sender<AppEvent>,
        shutdown: &mut watch::Receiver<bool>,
        backoff: &mut ExponentialBackoff,
    ) -> Result<()> {
        tracing::info!(url = %self.url, codes = ?self.codes, "Connecting to ticker feed");

        let (ws_stream, _resp) = tokio_tungstenite::connect_async(&self.url)
            .await
            .context("WebSocket connect failed")?;
        let (mut write, mut read) = ws_stream.split();

        write
            .send(tungstenite::Message::Text(subscribe_message(&self.codes)))
            .await
            .context("ticker subscription failed")?;

        backoff.reset();
        let _ = status_tx
            .send(AppEvent::WsStatus(WsConnectionStatus::Connected))
            .await;
        tracing::info!(codes = ?self.codes, "Subscribed to ticker feed");

        loop {
            tokio::select! {
                msg = read.next() => {
                    let payload = match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => text.into_bytes(),
                        Some(Ok(tungstenite::Message::Binary(bytes))) => bytes,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            return Err(anyhow::anyhow!("WebSocket read error: {}", e));
                        }
                        None => {
                            return Err(anyhow::anyhow!("WebSocket stream ended"));
                        }
                    };
                    match parse_ticker_frame(&payload) {
                        Ok(tick) => {
                            if tick_tx.try_send(tick).is_err() {
                                tracing::warn!("Tick channel full, dropping tick");
                                let _ = status_tx.try_send(AppEvent::TickDropped);
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "Rejected ticker frame");
                            let _ = status_tx.try_send(AppEvent::ParseError(e.to_string()));
                        }
                    }
                }
                _ = shutdown.changed() => {
                    return Ok(());
                }
            }
        }
    }
}
