//! Progress reporting and cooperative cancellation.
//!
//! Both are optional side channels. A [`ProgressSink`] receives percentage
//! deltas from whichever thread made the progress; a missing or
//! disconnected sink never affects the computation. A [`CancelFlag`] is
//! polled at row and tile boundaries; operations that observe it return
//! [`FilterError::Cancelled`] without touching the caller's buffer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::api::FilterError;

/// Receiver of best-effort progress updates.
///
/// `percent_delta` values reported over one operation add up to roughly
/// 100. Calls arrive from worker threads, so implementations must be
/// `Sync` and must not block.
pub trait ProgressSink: Sync {
    /// Record that another `percent_delta` percent of the work is done.
    fn report(&self, percent_delta: f32);
}

/// A sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    #[inline]
    fn report(&self, _percent_delta: f32) {}
}

impl<F> ProgressSink for F
where
    F: Fn(f32) + Sync,
{
    #[inline]
    fn report(&self, percent_delta: f32) {
        self(percent_delta)
    }
}

impl ProgressSink for Sender<f32> {
    fn report(&self, percent_delta: f32) {
        // A dropped receiver just means nobody is watching any more.
        let _ = self.send(percent_delta);
    }
}

/// Shared cancellation flag.
///
/// Clones share the same flag, so the UI side keeps one clone and hands
/// another to the operation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every operation observing this flag to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Rows between two progress reports.
pub(crate) const REPORT_INTERVAL: usize = 20;

/// Per-operation view of the optional progress and cancel channels.
///
/// `share` is the percentage each unit of work is worth; a blur with two
/// passes over `h` rows gives every row `50 / h` percent.
#[derive(Clone, Copy)]
pub(crate) struct Monitor<'a> {
    sink: Option<&'a dyn ProgressSink>,
    cancel: Option<&'a CancelFlag>,
    share: f32,
}

impl<'a> Monitor<'a> {
    pub(crate) fn new(
        sink: Option<&'a dyn ProgressSink>,
        cancel: Option<&'a CancelFlag>,
        total_units: usize,
    ) -> Self {
        let share = if total_units == 0 {
            0.0
        } else {
            100.0 / total_units as f32
        };
        Self {
            sink,
            cancel,
            share,
        }
    }

    /// Report `units` finished units of work.
    #[inline]
    pub(crate) fn advance(&self, units: usize) {
        if let Some(sink) = self.sink {
            if units > 0 {
                sink.report(units as f32 * self.share);
            }
        }
    }

    /// Fail with [`FilterError::Cancelled`] if cancellation was requested.
    #[inline]
    pub(crate) fn check(&self) -> Result<(), FilterError> {
        match self.cancel {
            Some(flag) if flag.is_cancelled() => Err(FilterError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Run `row` for every row in order, polling cancellation and reporting
/// progress every [`REPORT_INTERVAL`] rows.
pub(crate) fn scan_rows<F>(height: u32, monitor: &Monitor<'_>, mut row: F) -> Result<(), FilterError>
where
    F: FnMut(u32),
{
    let mut pending = 0;
    for y in 0..height {
        if pending == 0 {
            monitor.check()?;
        }
        row(y);
        pending += 1;
        if pending == REPORT_INTERVAL {
            monitor.advance(pending);
            pending = 0;
        }
    }
    monitor.advance(pending);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink_receives_updates() {
        let total = Mutex::new(0.0f32);
        let sink = |d: f32| *total.lock().unwrap() += d;
        let monitor = Monitor::new(Some(&sink), None, 4);
        for _ in 0..4 {
            monitor.advance(1);
        }
        assert!((*total.lock().unwrap() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_sender_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel::<f32>();
        drop(rx);
        tx.report(10.0);
    }

    #[test]
    fn test_cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        let monitor = Monitor::new(None, Some(&observer), 1);
        assert!(monitor.check().is_ok());

        flag.cancel();
        assert!(matches!(monitor.check(), Err(FilterError::Cancelled)));
    }

    #[test]
    fn test_missing_sink_is_silent() {
        let monitor = Monitor::new(None, None, 0);
        monitor.advance(10);
        assert!(monitor.check().is_ok());
    }
}
