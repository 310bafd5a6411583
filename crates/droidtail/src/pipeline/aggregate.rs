use std::collections::VecDeque;

use crate::parser::model::LogRecord;

/// Consumer-side aggregation buffer.
///
/// Absorbs bursts of scheduler batches behind a fixed-delay coalescing window
/// and merges them into a capacity-bounded ordered view. The window is opened
/// by the first batch after an idle period and is never extended by later
/// arrivals; it closes only when its own timer fires. Overflow evicts the
/// oldest records, never the newest.
///
/// The coalesce timer is owned by the driving task, same split as
/// `BatchScheduler`.
#[derive(Debug)]
pub struct AggregationBuffer {
    view: VecDeque<LogRecord>,
    staging: Vec<LogRecord>,
    timer_armed: bool,
    capacity: usize,
}

impl AggregationBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            view: VecDeque::new(),
            staging: Vec::new(),
            timer_armed: false,
            capacity,
        }
    }

    /// Stage an incoming batch. Returns true when the caller must arm the
    /// coalesce timer (first batch of a window); an already-open window is
    /// left untouched.
    pub fn on_batch(&mut self, records: Vec<LogRecord>) -> bool {
        self.staging.extend(records);
        if self.timer_armed || self.staging.is_empty() {
            false
        } else {
            self.timer_armed = true;
            true
        }
    }

    /// Close the window: append staged records to the view in order and
    /// enforce capacity. Returns true when the view changed.
    pub fn merge_staging(&mut self) -> bool {
        self.timer_armed = false;
        if self.staging.is_empty() {
            return false;
        }
        self.view.extend(self.staging.drain(..));
        while self.view.len() > self.capacity {
            self.view.pop_front();
        }
        true
    }

    /// Empty the view and staging buffer and disarm the window.
    pub fn clear(&mut self) {
        self.view.clear();
        self.staging.clear();
        self.timer_armed = false;
    }

    pub fn view(&self) -> &VecDeque<LogRecord> {
        &self.view
    }

    /// Owned copy of the current view for publishing to the display layer.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.view.iter().cloned().collect()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }
}
