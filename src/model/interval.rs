use std::time::Duration;

use serde::Serialize;

use super::tick::Tick;

/// Summary of one closed interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalResult {
    pub average_price: f64,
    pub slope: f64,
    pub opened_at_ms: u64,
    pub closed_at_ms: u64,
    pub tick_count: usize,
    /// Set when the interval held no ticks and the average was carried forward.
    pub degraded: bool,
    /// Number of whole windows this result stands for (> 1 only for collapsed gaps).
    pub spanned_windows: u64,
}

impl IntervalResult {
    /// Result for a stretch of `windows` consecutive empty windows.
    pub fn gap(carried_average: f64, opened_at_ms: u64, closed_at_ms: u64, windows: u64) -> Self {
        Self {
            average_price: carried_average,
            slope: 0.0,
            opened_at_ms,
            closed_at_ms,
            tick_count: 0,
            degraded: true,
            spanned_windows: windows,
        }
    }
}

/// Whole milliseconds in `duration`, saturating.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Accumulates ticks falling in `[start_ms, start_ms + duration)`.
///
/// A window only exists once its first tick arrives, so the buffer is never
/// empty; stretches without ticks are described by [`IntervalResult::gap`].
#[derive(Debug, Clone)]
pub struct IntervalWindow {
    pub start_ms: u64,
    pub duration: Duration,
    buffer: Vec<Tick>,
}

impl IntervalWindow {
    /// Open a window at `start_ms` seeded with its first tick.
    pub fn open(start_ms: u64, duration: Duration, tick: Tick) -> Self {
        assert!(duration_ms(duration) > 0, "duration must be >= 1ms");
        let mut window = Self {
            start_ms,
            duration,
            buffer: Vec::new(),
        };
        window.push(tick);
        window
    }

    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(duration_ms(self.duration))
    }

    pub fn contains(&self, timestamp_ms: u64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms < self.end_ms()
    }

    pub fn buffer(&self) -> &[Tick] {
        &self.buffer
    }

    pub fn push(&mut self, tick: Tick) {
        debug_assert!(self.contains(tick.timestamp_ms));
        self.buffer.push(tick);
    }

    pub fn average_price(&self) -> f64 {
        let sum: f64 = self.buffer.iter().map(|t| t.trade_price).sum();
        sum / self.buffer.len() as f64
    }

    /// Price change per second between the first and last buffered tick.
    pub fn slope(&self) -> f64 {
        match (self.buffer.first(), self.buffer.last()) {
            (Some(first), Some(last)) if self.buffer.len() >= 2 => {
                (last.trade_price - first.trade_price) / self.duration.as_secs_f64()
            }
            _ => 0.0,
        }
    }

    pub fn close(self) -> IntervalResult {
        IntervalResult {
            average_price: self.average_price(),
            slope: self.slope(),
            opened_at_ms: self.start_ms,
            closed_at_ms: self.end_ms(),
            tick_count: self.buffer.len(),
            degraded: false,
            spanned_windows: 1,
        }
    }
}
