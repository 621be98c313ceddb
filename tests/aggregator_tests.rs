use std::time::Duration;

use interval_trader::engine::{Ingest, IntervalAggregator};
use interval_trader::model::tick::Tick;

fn tick(price: f64, ts: u64) -> Tick {
    Tick::from_price("KRW-BTC", price, ts)
}

fn close_with(prices: &[f64], duration_secs: u64) -> interval_trader::model::interval::IntervalResult {
    let mut agg = IntervalAggregator::new(Duration::from_secs(duration_secs)).unwrap();
    for (i, &p) in prices.iter().enumerate() {
        assert_eq!(agg.ingest(tick(p, i as u64 * 100)), Ingest::Accepted);
    }
    match agg.ingest(tick(1.0, duration_secs * 1_000)) {
        Ingest::Closed { result, gap: None } => result,
        other => panic!("expected a plain close, got {:?}", other),
    }
}

#[test]
/// Average of a closed window is the exact arithmetic mean of its prices.
fn average_is_arithmetic_mean() {
    let result = close_with(&[100.0, 200.0, 300.0], 10);
    assert!((result.average_price - 200.0).abs() < f64::EPSILON);
    assert_eq!(result.tick_count, 3);
}

#[test]
fn slope_sign_follows_price_direction() {
    assert!(close_with(&[100.0, 101.0, 105.0], 10).slope > 0.0);
    assert!(close_with(&[105.0, 101.0, 100.0], 10).slope < 0.0);
    assert_eq!(close_with(&[100.0], 10).slope, 0.0);
}

#[test]
/// Slope is normalised by the window duration in seconds.
fn slope_is_price_change_per_second() {
    let result = close_with(&[100.0, 160.0], 60);
    assert!((result.slope - 1.0).abs() < 1e-12);
}

#[test]
fn no_tick_is_counted_in_two_windows() {
    let mut agg = IntervalAggregator::new(Duration::from_secs(1)).unwrap();
    let mut counted = 0usize;
    let timestamps: Vec<u64> = (0..50).map(|i| i * 370).collect();
    for &ts in &timestamps {
        if let Ingest::Closed { result, .. } = agg.ingest(tick(100.0, ts)) {
            counted += result.tick_count;
        }
    }
    counted += agg.buffer().len();
    assert_eq!(counted, timestamps.len());
}

#[test]
/// A window boundary tick opens the next window instead of closing into the old one.
fn boundary_tick_belongs_to_next_window() {
    let mut agg = IntervalAggregator::new(Duration::from_secs(10)).unwrap();
    agg.ingest(tick(100.0, 0));
    match agg.ingest(tick(200.0, 10_000)) {
        Ingest::Closed { result, .. } => {
            assert_eq!(result.tick_count, 1);
            assert!((result.average_price - 100.0).abs() < f64::EPSILON);
        }
        other => panic!("expected close, got {:?}", other),
    }
    assert_eq!(agg.buffer().len(), 1);
    assert_eq!(agg.window().unwrap().start_ms, 10_000);
}
