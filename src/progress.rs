//! One-way notifications from the conversion worker to whoever started it.
//!
//! Delivery is fire-and-forget: a [`ProgressSink`] never blocks the worker and
//! a closed receiver is silently ignored.

use std::thread;

use futures::channel::mpsc::UnboundedSender;
use tracing::trace;

use crate::config::ConvertConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Percentage complete, monotonic within a run.
    Progress(u8),
    /// Terminal: the run produced these case ids.
    Finished(Vec<String>),
    /// Terminal: no convertible case under the root.
    NothingFound,
    /// Terminal: the run aborted.
    Failed,
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: ProgressEvent);
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn notify(&self, event: ProgressEvent) {
        if self.unbounded_send(event).is_err() {
            trace!("progress receiver dropped");
        }
    }
}

impl ProgressSink for std::sync::mpsc::Sender<ProgressEvent> {
    fn notify(&self, event: ProgressEvent) {
        if self.send(event).is_err() {
            trace!("progress receiver dropped");
        }
    }
}

/// Sink for callers that do not care about progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn notify(&self, _event: ProgressEvent) {}
}

/// Percentage of `total` that `examined` represents, capped at `cap`.
pub fn percent(examined: usize, total: usize, cap: u8) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = examined.saturating_mul(100) / total;
    pct.min(cap as usize) as u8
}

/// Counts examined files for one run and throttles progress reports.
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    config: &'a ConvertConfig,
    total: usize,
    examined: usize,
    last_reported: u8,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink, config: &'a ConvertConfig, total: usize) -> Self {
        Self {
            sink,
            config,
            total,
            examined: 0,
            last_reported: 0,
        }
    }

    pub fn examined(&self) -> usize {
        self.examined
    }

    /// Count one examined file; every `report_every`-th call reports and pauses.
    pub fn file_examined(&mut self) {
        self.examined += 1;
        if self.examined % self.config.report_every.max(1) == 0 {
            self.report();
            self.pause();
        }
    }

    /// Report the current percentage, never exceeding the cap.
    pub fn report(&mut self) {
        let pct = percent(self.examined, self.total, self.config.progress_cap);
        self.send(pct);
    }

    /// The last report of a run: 100%.
    pub fn finish(&mut self) {
        self.send(100);
    }

    /// Let the presentation side catch up.
    pub fn pause(&self) {
        if !self.config.pause.is_zero() {
            thread::sleep(self.config.pause);
        }
    }

    fn send(&mut self, pct: u8) {
        let pct = pct.max(self.last_reported);
        self.last_reported = pct;
        self.sink.notify(ProgressEvent::Progress(pct));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn percent_is_capped() {
        assert_eq!(percent(0, 10, 95), 0);
        assert_eq!(percent(5, 10, 95), 50);
        assert_eq!(percent(10, 10, 95), 95);
        assert_eq!(percent(25, 10, 95), 95);
        assert_eq!(percent(3, 0, 95), 0);
    }

    #[test]
    fn reports_every_nth_file_then_finishes_at_100() {
        let config = ConvertConfig::default()
            .with_report_every(2)
            .with_pause(Duration::ZERO);
        let (tx, rx) = mpsc::channel::<ProgressEvent>();
        let mut reporter = ProgressReporter::new(&tx, &config, 4);
        for _ in 0..5 {
            reporter.file_examined();
        }
        reporter.finish();
        assert_eq!(reporter.examined(), 5);
        drop(tx);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                ProgressEvent::Progress(50),
                ProgressEvent::Progress(95),
                ProgressEvent::Progress(100),
            ]
        );
    }

    #[test]
    fn closed_receiver_is_ignored() {
        let (tx, rx) = futures::channel::mpsc::unbounded::<ProgressEvent>();
        drop(rx);
        tx.notify(ProgressEvent::Progress(10));
        tx.notify(ProgressEvent::Failed);
    }
}
