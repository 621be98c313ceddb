use std::time::Duration;

use crate::error::EngineError;
use crate::model::interval::{duration_ms, IntervalResult, IntervalWindow};
use crate::model::tick::Tick;

/// Validate an interval duration: it must span at least one millisecond.
pub fn validate_duration(duration: Duration) -> Result<Duration, EngineError> {
    if duration_ms(duration) == 0 {
        return Err(EngineError::InvalidDuration(format!(
            "{:?} is shorter than 1ms",
            duration
        )));
    }
    Ok(duration)
}

/// Convert a configuration-call interval in seconds into a duration.
pub fn interval_from_seconds(seconds: i64) -> Result<Duration, EngineError> {
    let secs = u64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| EngineError::InvalidDuration(format!("{}s is not positive", seconds)))?;
    Ok(Duration::from_secs(secs))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ingest {
    /// Tick appended to the open window.
    Accepted,
    /// The open window closed; the tick seeded the next one. `gap` covers
    /// whole windows that elapsed without ticks before the new window.
    Closed {
        result: IntervalResult,
        gap: Option<IntervalResult>,
    },
    /// Tick precedes the open window and was dropped.
    Stale { window_start_ms: u64 },
}

/// Folds an ordered tick stream into fixed-duration intervals.
///
/// The first window starts at the first tick's timestamp. Later windows start
/// on the ideal boundary `start + duration`, so boundaries never drift.
#[derive(Debug, Clone)]
pub struct IntervalAggregator {
    duration: Duration,
    pending_duration: Option<Duration>,
    window: Option<IntervalWindow>,
}

impl IntervalAggregator {
    pub fn new(duration: Duration) -> Result<Self, EngineError> {
        Ok(Self {
            duration: validate_duration(duration)?,
            pending_duration: None,
            window: None,
        })
    }

    /// Duration that the next opened window will use.
    pub fn duration(&self) -> Duration {
        self.pending_duration.unwrap_or(self.duration)
    }

    pub fn window(&self) -> Option<&IntervalWindow> {
        self.window.as_ref()
    }

    pub fn buffer(&self) -> &[Tick] {
        self.window.as_ref().map(IntervalWindow::buffer).unwrap_or(&[])
    }

    /// Change the duration of windows opened from now on. The open window
    /// keeps its original bounds.
    pub fn set_duration(&mut self, duration: Duration) -> Result<(), EngineError> {
        let duration = validate_duration(duration)?;
        if self.window.is_some() {
            self.pending_duration = Some(duration);
        } else {
            self.duration = duration;
            self.pending_duration = None;
        }
        Ok(())
    }

    pub fn ingest(&mut self, tick: Tick) -> Ingest {
        let ts = tick.timestamp_ms;
        let mut window = match self.window.take() {
            Some(window) => window,
            None => {
                self.window = Some(IntervalWindow::open(ts, self.duration, tick));
                return Ingest::Accepted;
            }
        };

        if ts < window.start_ms {
            let window_start_ms = window.start_ms;
            self.window = Some(window);
            return Ingest::Stale { window_start_ms };
        }

        if window.contains(ts) {
            window.push(tick);
            self.window = Some(window);
            return Ingest::Accepted;
        }

        let mut next_start = window.end_ms();
        let result = window.close();
        if let Some(duration) = self.pending_duration.take() {
            self.duration = duration;
        }

        let step = duration_ms(self.duration);
        let skipped = (ts - next_start) / step;
        let gap = if skipped > 0 {
            let gap_end = next_start + skipped * step;
            let gap = IntervalResult::gap(result.average_price, next_start, gap_end, skipped);
            next_start = gap_end;
            Some(gap)
        } else {
            None
        };

        self.window = Some(IntervalWindow::open(next_start, self.duration, tick));
        Ingest::Closed { result, gap }
    }
}
