use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::classifier::classify_case;
use crate::config::ConvertConfig;
use crate::context::RunContext;
use crate::dose::extract_doses;
use crate::error::{ConvertError, Skip, SkipReason};
use crate::manifest::{Manifest, write_case_index};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::scanner::{self, CaseDir, CaseIds};
use crate::structure_set::extract_structure_sets;
use crate::volume_loader::VolumeLoader;
use crate::workspace::Workspace;

/// Outcome of a run that did not abort.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    /// Accepted case ids, in discovery order
    pub cases: Vec<String>,
    /// Inputs left out, with the reason
    pub skipped: Vec<Skip>,
    /// Candidate files found under the root
    pub total_files: usize,
    /// Files whose header was examined
    pub files_examined: usize,
}

impl RunReport {
    /// No case could be converted, including the case of an empty root.
    pub fn nothing_found(&self) -> bool {
        self.cases.is_empty()
    }

    /// The terminal notification matching this report.
    pub fn terminal_event(&self) -> ProgressEvent {
        if self.nothing_found() {
            ProgressEvent::NothingFound
        } else {
            ProgressEvent::Finished(self.cases.clone())
        }
    }
}

/// Runs conversions into one workspace, one run at a time.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.config.workspace)
    }

    /// Convert every case under `root`, blocking the calling thread.
    ///
    /// Progress goes to `sink`; the terminal event is left to the caller (see
    /// [`Converter::run_to_completion`]).
    ///
    /// # Errors
    ///
    /// Fails when another run holds the workspace, or on any error outside the
    /// per-file skip policy. The workspace is left as-is on failure.
    pub fn run(&self, root: &Path, sink: &dyn ProgressSink) -> Result<RunReport, ConvertError> {
        let start = Instant::now();
        let workspace = self.workspace();
        let lock = workspace.lock()?;
        workspace.reset(&lock)?;

        let total_files = scanner::count_candidates(root, &self.config);
        if total_files == 0 {
            info!(root = %root.display(), "no DICOM files found");
            return Ok(RunReport::default());
        }

        let cases = scanner::partition_cases(root, &self.config);
        info!(
            root = %root.display(),
            files = total_files,
            directories = cases.len(),
            "conversion started"
        );

        let mut ctx = RunContext::new(&self.config, sink, total_files);
        let mut ids = CaseIds::default();
        let mut accepted = Vec::new();
        for case in &cases {
            let id = ids.next_free(&case.name);
            if convert_case(case, &id, &workspace, &mut ctx)? {
                ids.accept(&id);
                accepted.push(id);
            }
        }

        if !accepted.is_empty() {
            write_case_index(workspace.path(), &accepted)?;
            ctx.progress.finish();
        }

        info!(
            cases = accepted.len(),
            skipped = ctx.skipped.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "conversion finished"
        );

        Ok(RunReport {
            cases: accepted,
            files_examined: ctx.progress.examined(),
            total_files,
            skipped: ctx.skipped,
        })
    }

    /// [`Converter::run`] followed by exactly one terminal event.
    ///
    /// Errors and panics are reported to `sink` as [`ProgressEvent::Failed`].
    pub fn run_to_completion(
        &self,
        root: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<RunReport, ConvertError> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run(root, sink)))
            .unwrap_or(Err(ConvertError::WorkerPanicked));

        match &result {
            Ok(report) => sink.notify(report.terminal_event()),
            Err(err) => {
                error!(error = %err, "conversion failed");
                sink.notify(ProgressEvent::Failed);
            }
        }
        result
    }

    /// Start a run on the blocking pool and return immediately.
    pub fn spawn<S>(self, root: PathBuf, sink: S) -> JoinHandle<Result<RunReport, ConvertError>>
    where
        S: ProgressSink + 'static,
    {
        tokio::task::spawn_blocking(move || self.run_to_completion(&root, &sink))
    }
}

/// Classify and convert one case directory.
///
/// Returns whether the case was accepted under `id`, i.e. had at least one
/// CT slice.
fn convert_case(
    case: &CaseDir,
    id: &str,
    workspace: &Workspace,
    ctx: &mut RunContext<'_>,
) -> Result<bool, ConvertError> {
    let files = match classify_case(&case.dir, ctx) {
        Ok(files) => files,
        Err(e) => {
            warn!(case = %case.name, error = %e, "cannot list case directory");
            ctx.skip(&case.dir, SkipReason::CaseUnreadable(e.to_string()));
            return Ok(false);
        }
    };
    if files.ct.is_empty() {
        ctx.skip(&case.dir, SkipReason::NoCtSlices);
        return Ok(false);
    }

    let out_dir = workspace.create_case_dir(id)?;
    let Some(ct) = VolumeLoader::build(files.ct, &out_dir, ctx)? else {
        return Ok(false);
    };

    let doses = extract_doses(&files.doses, &out_dir, ctx);
    let structs = extract_structure_sets(&files.structs, &ct.pixel_transform(), &out_dir, ctx);

    let manifest = Manifest {
        id: id.to_string(),
        ct,
        doses,
        structs,
    };
    manifest.write(&out_dir)?;

    info!(
        case = %id,
        slices = manifest.ct.count,
        doses = manifest.doses.len(),
        structs = manifest.structs.len(),
        "case converted"
    );
    Ok(true)
}
