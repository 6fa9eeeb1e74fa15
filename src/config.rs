use std::path::PathBuf;
use std::time::Duration;

/// Settings for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Output workspace. Wiped and recreated at the start of every run.
    pub workspace: PathBuf,

    /// Extension of candidate files, compared case-insensitively
    pub extension: String,

    /// Files examined between two progress reports
    pub report_every: usize,

    /// Highest percentage reported while the run is still going
    pub progress_cap: u8,

    /// Voluntary pause after a progress report and inside the CT write loop
    pub pause: Duration,

    /// CT slices written between two pauses
    pub write_pause_every: usize,

    /// Case id used when the root directory itself is a case but has no basename
    pub root_case_name: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("temp_data"),
            extension: "dcm".to_string(),
            report_every: 10,
            progress_cap: 95,
            pause: Duration::from_millis(1),
            write_pause_every: 20,
            root_case_name: "Patient_Root".to_string(),
        }
    }
}

impl ConvertConfig {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            ..Self::default()
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_report_every(mut self, files: usize) -> Self {
        self.report_every = files.max(1);
        self
    }

    pub fn with_progress_cap(mut self, percent: u8) -> Self {
        self.progress_cap = percent.min(99);
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_write_pause_every(mut self, slices: usize) -> Self {
        self.write_pause_every = slices.max(1);
        self
    }

    pub fn with_root_case_name(mut self, name: impl Into<String>) -> Self {
        self.root_case_name = name.into();
        self
    }

    /// Whether `path` carries the candidate extension.
    pub fn is_candidate(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn extension_match_ignores_case() {
        let config = ConvertConfig::default();
        assert!(config.is_candidate(Path::new("a/b/CT1.dcm")));
        assert!(config.is_candidate(Path::new("CT1.DCM")));
        assert!(!config.is_candidate(Path::new("CT1.dcm.bak")));
        assert!(!config.is_candidate(Path::new("dcm")));
    }

    #[test]
    fn builder_clamps_degenerate_values() {
        let config = ConvertConfig::new("out")
            .with_report_every(0)
            .with_write_pause_every(0)
            .with_progress_cap(100);
        assert_eq!(config.report_every, 1);
        assert_eq!(config.write_pause_every, 1);
        assert_eq!(config.progress_cap, 99);
        assert_eq!(config.workspace, PathBuf::from("out"));
    }
}
