use std::panic::{self, AssertUnwindSafe};
use tokio::sync::mpsc::UnboundedSender;

/// Receives progress percentages from a merge or split.
///
/// Called synchronously between units of work, so implementations should
/// return quickly.
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Stream form: each call's events arrive on the channel. A dropped receiver
/// is ignored.
#[derive(Debug, Clone)]
pub struct ChannelProgress(pub UnboundedSender<u8>);

impl ProgressSink for ChannelProgress {
    fn report(&mut self, percent: u8) {
        let _ = self.0.send(percent);
    }
}

/// Turns "unit `done` of `total` finished" into the percentage contract:
/// one event per unit, non-decreasing, last event 100.
///
/// A sink that panics is cut off and the operation carries on.
pub struct ProgressTracker<'a> {
    sink: &'a mut (dyn ProgressSink + Send),
    total: usize,
    done: usize,
    last: u8,
    detached: bool,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a mut (dyn ProgressSink + Send), total: usize) -> Self {
        ProgressTracker {
            sink,
            total,
            done: 0,
            last: 0,
            detached: false,
        }
    }

    /// Record one finished unit of work and notify the sink.
    pub fn advance(&mut self) {
        self.done = (self.done + 1).min(self.total);
        let percent = percent_of(self.done, self.total).max(self.last);
        self.last = percent;

        if self.detached {
            return;
        }

        let sink = &mut *self.sink;
        if panic::catch_unwind(AssertUnwindSafe(|| sink.report(percent))).is_err() {
            tracing::warn!(percent, "progress observer panicked; further updates dropped");
            self.detached = true;
        }
    }

    pub fn last(&self) -> u8 {
        self.last
    }
}

/// `round(done / total * 100)`, with halves rounded up.
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((done * 200 + total) / (total * 2)) as u8
}
