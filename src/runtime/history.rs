use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::AppError;
use crate::model::tick::Tick;

/// Bounded, arrival-ordered record of live ticks; the optimizer's input.
#[derive(Debug)]
pub struct TickHistory {
    limit: usize,
    ticks: Mutex<VecDeque<Tick>>,
}

impl TickHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            ticks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, tick: Tick) -> Result<(), AppError> {
        let mut guard = self
            .ticks
            .lock()
            .map_err(|_| AppError::StatePoisoned("tick history"))?;
        if guard.len() == self.limit {
            guard.pop_front();
        }
        guard.push_back(tick);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ticks.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the recorded ticks for `code`, oldest first.
    pub fn snapshot_for(&self, code: &str) -> Result<Vec<Tick>, AppError> {
        let guard = self
            .ticks
            .lock()
            .map_err(|_| AppError::StatePoisoned("tick history"))?;
        Ok(guard.iter().filter(|t| &*t.code == code).cloned().collect())
    }
}
