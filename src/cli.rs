use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use dicom_rt_ingest::ConvertConfig;

#[derive(Parser, Debug)]
#[command(
    name = "dicom-rt-ingest",
    version,
    about = "Convert a folder of radiotherapy DICOM cases into viewer datasets"
)]
pub struct Cli {
    /// Folder to scan for DICOM cases
    pub root: PathBuf,

    #[arg(long, default_value = "temp_data")]
    pub workspace: PathBuf,

    #[arg(long, default_value = "dcm")]
    pub extension: String,

    #[arg(long, default_value_t = 10, help = "Files examined between progress reports")]
    pub report_every: usize,

    #[arg(long, default_value_t = 1, help = "Pause after each progress report (ms)")]
    pub pause_ms: u64,

    #[arg(long, default_value_t = 20, help = "CT slices written between pauses")]
    pub write_pause_every: usize,
}

impl Cli {
    pub fn config(&self) -> ConvertConfig {
        ConvertConfig::new(&self.workspace)
            .with_extension(&self.extension)
            .with_report_every(self.report_every)
            .with_pause(Duration::from_millis(self.pause_ms))
            .with_write_pause_every(self.write_pause_every)
    }
}
