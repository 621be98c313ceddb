use std::time::Duration;

use interval_trader::config::{parse_interval_secs, Config};
use interval_trader::runtime::RuntimeSettings;

const TOML: &str = r#"
[upbit]
ws_url = "wss://api.upbit.com/websocket/v1"
code = "KRW-BTC"
codes = ["KRW-ETH", "krw-btc"]

[trading]
interval = "5m"
slippage_rate = 0.0002
fee_rate = 0.0005

[optimizer]
max_workers = 4

[runtime]
tick_channel_capacity = 500
history_limit = 1000

[logging]
level = "debug"
"#;

#[test]
fn parse_full_toml() {
    let config = Config::from_toml(TOML).unwrap();
    assert_eq!(config.upbit.tradable_codes(), vec!["KRW-BTC", "KRW-ETH"]);
    assert_eq!(config.trading.interval().unwrap(), Duration::from_secs(300));
    assert_eq!(config.optimizer.max_workers, 4);
    assert_eq!(config.runtime.tick_channel_capacity, 500);
    // unspecified runtime keys fall back to defaults
    assert_eq!(config.runtime.event_channel_capacity, 256);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn optional_sections_default() {
    let toml_str = r#"
[upbit]
ws_url = "wss://api.upbit.com/websocket/v1"
code = "KRW-BTC"

[trading]
interval = "10s"
slippage_rate = 0.0
fee_rate = 0.0

[logging]
level = "info"
"#;
    let config = Config::from_toml(toml_str).unwrap();
    assert_eq!(config.optimizer.max_workers, 10);
    assert_eq!(config.runtime.tick_channel_capacity, 1000);
    assert!(config.upbit.codes.is_empty());
}

#[test]
fn runtime_settings_follow_config() {
    let config = Config::from_toml(TOML).unwrap();
    let settings = RuntimeSettings::from_config(&config).unwrap();
    assert_eq!(settings.interval, Duration::from_secs(300));
    assert_eq!(settings.history_limit, 1000);
    assert_eq!(settings.max_workers, 4);
    assert!((settings.cost.fee_rate - 0.0005).abs() < f64::EPSILON);
}

#[test]
fn rejects_invalid_values() {
    let bad_interval = TOML.replace("\"5m\"", "\"0m\"");
    assert!(Config::from_toml(&bad_interval).is_err());

    let bad_scheme = TOML.replace("wss://", "https://");
    assert!(Config::from_toml(&bad_scheme).is_err());

    let bad_fee = TOML.replace("fee_rate = 0.0005", "fee_rate = 1.5");
    assert!(Config::from_toml(&bad_fee).is_err());

    let no_workers = TOML.replace("max_workers = 4", "max_workers = 0");
    assert!(Config::from_toml(&no_workers).is_err());

    let no_codes = TOML
        .replace("code = \"KRW-BTC\"", "code = \"\"")
        .replace("codes = [\"KRW-ETH\", \"krw-btc\"]", "codes = []");
    assert!(Config::from_toml(&no_codes).is_err());
}

#[test]
fn ui_presets_parse() {
    let presets: Vec<u64> = ["10s", "1m", "5m", "30m", "1h"]
        .iter()
        .map(|s| parse_interval_secs(s).unwrap())
        .collect();
    assert_eq!(presets, vec![10, 60, 300, 1_800, 3_600]);
}

#[test]
fn shipped_default_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.trading.interval().unwrap(), Duration::from_secs(60));
}
