use std::path::PathBuf;

use thiserror::Error;

use crate::attrs::AttrError;

/// Errors that abort a whole conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Another conversion run holds the workspace lock {0}")]
    RunInProgress(PathBuf),

    #[error("Attribute error in {path}: {source}")]
    Attribute {
        path: PathBuf,
        #[source]
        source: AttrError,
    },

    #[error("Pixel data error: {0}")]
    PixelData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Conversion worker panicked")]
    WorkerPanicked,
}

impl ConvertError {
    pub(crate) fn attribute(path: impl Into<PathBuf>, source: AttrError) -> Self {
        Self::Attribute {
            path: path.into(),
            source,
        }
    }
}

/// Why a file, slice or case was left out of the output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("unreadable DICOM header: {0}")]
    Unreadable(String),

    #[error("unsupported modality {0:?}")]
    UnsupportedModality(String),

    #[error("CT slice without image position")]
    MissingSlicePosition,

    #[error("case directory could not be listed: {0}")]
    CaseUnreadable(String),

    #[error("case has no CT slices")]
    NoCtSlices,

    #[error("slice decode failed, zero-filled: {0}")]
    SliceZeroFilled(String),

    #[error("dose grid failed: {0}")]
    DoseFailed(String),

    #[error("structure set failed: {0}")]
    StructureSetFailed(String),

    #[error("structure set has no contours")]
    EmptyStructureSet,

    #[error("artifact name {0:?} is reserved")]
    ReservedArtifactName(String),
}

/// A skipped input together with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Skip {
    pub path: PathBuf,
    pub reason: SkipReason,
}
