use std::path::Path;

use tracing::debug;

use crate::config::ConvertConfig;
use crate::error::{Skip, SkipReason};
use crate::progress::{ProgressReporter, ProgressSink};

/// State owned by the worker for the duration of one run.
pub struct RunContext<'a> {
    pub config: &'a ConvertConfig,
    pub progress: ProgressReporter<'a>,
    pub skipped: Vec<Skip>,
}

impl<'a> RunContext<'a> {
    pub fn new(config: &'a ConvertConfig, sink: &'a dyn ProgressSink, total_files: usize) -> Self {
        Self {
            config,
            progress: ProgressReporter::new(sink, config, total_files),
            skipped: Vec::new(),
        }
    }

    /// Record a skipped input. Skips are logged and kept, never surfaced as errors.
    pub fn skip(&mut self, path: &Path, reason: SkipReason) {
        debug!(path = %path.display(), %reason, "skipped");
        self.skipped.push(Skip {
            path: path.to_path_buf(),
            reason,
        });
    }
}
