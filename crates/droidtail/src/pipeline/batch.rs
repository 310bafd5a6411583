use crate::parser::model::LogRecord;

/// What the owning task must do after a `submit` call.
#[derive(Debug)]
pub enum SubmitAction {
    /// Size trigger hit: emit this batch now and disarm any armed timer.
    Flush(Vec<LogRecord>),
    /// Arm the one-shot interval timer.
    ArmTimer,
    /// Nothing to do: either a timer is already armed or nothing is pending.
    Wait,
}

/// Dual-trigger batch scheduler.
///
/// Accumulates parsed records and releases them as one batch when either the
/// count threshold is reached or the interval timer fires, whichever comes
/// first. The timer itself is owned by the async task driving this scheduler;
/// the scheduler only tracks whether one is armed, which keeps the trigger
/// logic synchronous and testable without a runtime.
///
/// Invariants: at most one timer is ever armed, and an empty batch is never
/// emitted.
#[derive(Debug)]
pub struct BatchScheduler {
    pending: Vec<LogRecord>,
    timer_armed: bool,
    batch_size: usize,
}

impl BatchScheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            pending: Vec::new(),
            timer_armed: false,
            batch_size,
        }
    }

    /// Append records to the pending batch and decide the trigger.
    pub fn submit(&mut self, records: Vec<LogRecord>) -> SubmitAction {
        self.pending.extend(records);

        if self.pending.is_empty() {
            return SubmitAction::Wait;
        }

        if self.pending.len() >= self.batch_size {
            self.timer_armed = false;
            return SubmitAction::Flush(std::mem::take(&mut self.pending));
        }

        if self.timer_armed {
            SubmitAction::Wait
        } else {
            self.timer_armed = true;
            SubmitAction::ArmTimer
        }
    }

    /// Release the pending batch. Called on timer fire and on shutdown.
    /// Idempotent when nothing is pending.
    pub fn flush(&mut self) -> Option<Vec<LogRecord>> {
        self.timer_armed = false;
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    /// Discard pending records and disarm. Nothing is emitted.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.timer_armed = false;
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }
}
