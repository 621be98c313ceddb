use std::time::Duration;

use interval_trader::engine::TickProcessor;
use interval_trader::model::signal::Signal;
use interval_trader::model::tick::Tick;

fn tick(price: f64, ts: u64) -> Tick {
    Tick::from_price("KRW-BTC", price, ts)
}

#[test]
/// Signals fire only on the tick that closes an interval, priced at that tick.
fn signals_fire_on_closing_ticks_only() {
    let mut p = TickProcessor::new("KRW-BTC", Duration::from_secs(10)).unwrap();
    let prices = [
        (90.0, 0),
        (95.0, 5_000),
        (100.0, 10_000),
        (98.0, 15_000),
        (150.0, 20_000),
    ];
    let events: Vec<_> = prices.iter().map(|&(px, ts)| p.process(tick(px, ts))).collect();

    let closed: Vec<bool> = events.iter().map(|e| e.interval_closed).collect();
    assert_eq!(closed, vec![false, false, true, false, true]);

    assert_eq!(events[2].trade_signal, Some(Signal::Buy));
    assert!((events[2].current_price - 100.0).abs() < f64::EPSILON);
    assert_eq!(events[2].current_average, Some(92.5));
    assert!(events[2].new_state.is_holding);

    assert_eq!(events[3].trade_signal, None);
    assert_eq!(events[3].current_slope, None);

    assert_eq!(events[4].trade_signal, Some(Signal::Sell));
    assert!(!events[4].new_state.is_holding);
    assert_eq!(events[4].new_state.last_signal, Signal::Sell);
}

#[test]
fn snapshot_exposes_current_buffer() {
    let mut p = TickProcessor::new("KRW-BTC", Duration::from_secs(60)).unwrap();
    p.process(tick(100.0, 1_000));
    let ev = p.process(tick(101.0, 2_000));
    let buffer: Vec<f64> = ev
        .new_state
        .interval_buffer
        .iter()
        .map(|t| t.trade_price)
        .collect();
    assert_eq!(buffer, vec![100.0, 101.0]);
    assert_eq!(ev.new_state.interval_duration_ms, 60_000);
    assert_eq!(ev.new_state.code, "KRW-BTC");
}

#[test]
/// The outbound payload keeps the field names the presentation layer reads.
fn processed_event_serializes_expected_fields() {
    let mut p = TickProcessor::new("KRW-BTC", Duration::from_secs(10)).unwrap();
    p.process(tick(100.0, 0));
    p.process(tick(110.0, 1_000));
    let ev = p.process(tick(120.0, 10_000));
    let v = serde_json::to_value(&ev).unwrap();
    assert_eq!(v["interval_closed"], true);
    assert_eq!(v["trade_signal"], "BUY");
    assert_eq!(v["new_state"]["is_holding"], true);
    assert_eq!(v["new_state"]["interval_buffer"].as_array().unwrap().len(), 1);
    assert_eq!(v["current_average"], 105.0);
}

#[test]
fn duration_change_applies_after_current_window() {
    let mut p = TickProcessor::new("KRW-BTC", Duration::from_secs(10)).unwrap();
    p.process(tick(100.0, 0));
    p.set_duration(Duration::from_secs(30)).unwrap();
    let ev = p.process(tick(101.0, 9_000));
    assert!(!ev.interval_closed);
    let ev = p.process(tick(102.0, 10_000));
    assert!(ev.interval_closed);
    assert_eq!(ev.new_state.interval_start_time, Some(10_000));
    assert_eq!(ev.new_state.interval_duration_ms, 30_000);
    let ev = p.process(tick(103.0, 35_000));
    assert!(!ev.interval_closed);
}
