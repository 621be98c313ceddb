use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::CostModel;

pub const CONFIG_PATH_ENV: &str = "INTERVAL_TRADER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub upbit: UpbitConfig,
    pub trading: TradingConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpbitConfig {
    pub ws_url: String,
    pub code: String,
    #[serde(default)]
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Interval such as "10s", "1m", "5m", "30m", "1h".
    pub interval: String,
    pub slippage_rate: f64,
    pub fee_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    pub max_workers: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { max_workers: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tick_channel_capacity: usize,
    pub event_channel_capacity: usize,
    pub history_limit: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_channel_capacity: 1000,
            event_channel_capacity: 256,
            history_limit: 500_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Parse an interval string (e.g. "10s", "1m", "1h", "1d") into whole seconds.
pub fn parse_interval_secs(s: &str) -> Result<u64> {
    if s.len() < 2 {
        bail!("invalid interval '{}': expected format like '1m'", s);
    }

    let (num_str, suffix) = s.split_at(s.len() - 1);
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid interval '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid interval '{}': quantity must be > 0", s);
    }

    let unit_secs = match suffix {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => bail!(
            "invalid interval '{}': unsupported suffix '{}', expected one of s/m/h/d",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_secs)
        .with_context(|| format!("invalid interval '{}': value is too large", s))
}

impl UpbitConfig {
    pub fn tradable_codes(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.code.trim().is_empty() {
            out.push(self.code.trim().to_ascii_uppercase());
        }
        for code in &self.codes {
            let c = code.trim().to_ascii_uppercase();
            if !c.is_empty() && !out.iter().any(|v| v == &c) {
                out.push(c);
            }
        }
        out
    }
}

impl TradingConfig {
    pub fn interval(&self) -> Result<Duration> {
        parse_interval_secs(&self.interval).map(Duration::from_secs)
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.slippage_rate, self.fee_rate)
    }
}

impl Config {
    /// Load from `$INTERVAL_TRADER_CONFIG` or `config/default.toml`, after `.env`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&config_str).with_context(|| format!("invalid {}", path.display()))
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.upbit.ws_url).context("upbit.ws_url is not a URL")?;
        ensure!(
            matches!(url.scheme(), "ws" | "wss"),
            "upbit.ws_url must use ws:// or wss://, got '{}'",
            url.scheme()
        );
        ensure!(
            !self.upbit.tradable_codes().is_empty(),
            "upbit.code or upbit.codes must name at least one market"
        );
        self.trading
            .interval()
            .context("trading.interval is invalid")?;
        for (name, rate) in [
            ("slippage_rate", self.trading.slippage_rate),
            ("fee_rate", self.trading.fee_rate),
        ] {
            ensure!(
                (0.0..1.0).contains(&rate),
                "trading.{} must be in [0, 1), got {}",
                name,
                rate
            );
        }
        ensure!(
            self.optimizer.max_workers > 0,
            "optimizer.max_workers must be > 0"
        );
        ensure!(
            self.runtime.tick_channel_capacity > 0 && self.runtime.event_channel_capacity > 0,
            "runtime channel capacities must be > 0"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_interval_valid() {
        assert_eq!(parse_interval_secs("10s").unwrap(), 10);
        assert_eq!(parse_interval_secs("1m").unwrap(), 60);
        assert_eq!(parse_interval_secs("30m").unwrap(), 1_800);
        assert_eq!(parse_interval_secs("1h").unwrap(), 3_600);
    }

    #[test]
    fn parse_interval_rejects_invalid_inputs() {
        assert!(parse_interval_secs("").is_err());
        assert!(parse_interval_secs("m").is_err());
        assert!(parse_interval_secs("0m").is_err());
        assert!(parse_interval_secs("1x").is_err());
        assert!(parse_interval_secs("-1m").is_err());
    }

    #[test]
    fn tradable_codes_dedup_and_include_primary() {
        let cfg = UpbitConfig {
            ws_url: "wss://api.upbit.com/websocket/v1".to_string(),
            code: "krw-btc".to_string(),
            codes: vec![
                "KRW-ETH".to_string(),
                "KRW-BTC".to_string(),
                "  ".to_string(),
            ],
        };
        assert_eq!(
            cfg.tradable_codes(),
            vec!["KRW-BTC".to_string(), "KRW-ETH".to_string()]
        );
    }
}
