use std::fs;
use std::path::{Path, PathBuf};

use dicom::object::OpenFileOptions;
use dicom_dictionary_std::tags;

use crate::attrs::AttrAccess;
use crate::context::RunContext;
use crate::enums::Modality;
use crate::error::SkipReason;

/// A file whose header was read successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFile {
    pub modality: Modality,
    pub path: PathBuf,
    /// Patient-space z of the slice, only set for CT.
    pub z: Option<f64>,
}

/// Files of one case directory, grouped by role.
#[derive(Debug, Default)]
pub struct CaseFiles {
    pub ct: Vec<ClassifiedFile>,
    pub doses: Vec<PathBuf>,
    pub structs: Vec<PathBuf>,
}

/// Read a file's header, stopping before the pixel payload, and decide its role.
pub fn classify(path: &Path) -> Result<ClassifiedFile, SkipReason> {
    let obj = OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;

    let code = obj
        .opt_string(tags::MODALITY, "Modality")
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?
        .ok_or_else(|| SkipReason::Unreadable("missing Modality".to_string()))?;
    let modality =
        Modality::from_code(&code).ok_or_else(|| SkipReason::UnsupportedModality(code.clone()))?;

    let z = match modality {
        Modality::Ct => {
            let position = obj
                .opt_f64s(tags::IMAGE_POSITION_PATIENT, "ImagePositionPatient")
                .ok()
                .flatten()
                .unwrap_or_default();
            Some(*position.get(2).ok_or(SkipReason::MissingSlicePosition)?)
        }
        Modality::RtDose | Modality::RtStruct => None,
    };

    Ok(ClassifiedFile {
        modality,
        path: path.to_path_buf(),
        z,
    })
}

/// Regular files directly inside `dir`, in file-name order.
pub fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Classify every file of a case directory, counting each one towards progress.
pub fn classify_case(dir: &Path, ctx: &mut RunContext<'_>) -> std::io::Result<CaseFiles> {
    let mut case = CaseFiles::default();

    for path in list_files(dir)? {
        ctx.progress.file_examined();

        match classify(&path) {
            Ok(file) => match file.modality {
                Modality::Ct => case.ct.push(file),
                Modality::RtDose => case.doses.push(file.path),
                Modality::RtStruct => case.structs.push(file.path),
            },
            Err(reason) => ctx.skip(&path, reason),
        }
    }

    Ok(case)
}
