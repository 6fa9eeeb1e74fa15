use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artifact::{CASE_INDEX_FILE, MANIFEST_FILE, read_json, write_json};
use crate::dose::DoseGrid;
use crate::error::ConvertError;
use crate::volume::CtVolume;

/// Everything a viewer needs to load one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    pub ct: CtVolume,
    /// Dose artifact name to its grid description
    pub doses: BTreeMap<String, DoseGrid>,
    /// Structure-set name to its JSON file name
    pub structs: BTreeMap<String, String>,
}

impl Manifest {
    /// Write `manifest.json` into the case directory.
    pub fn write(&self, case_dir: &Path) -> Result<PathBuf, ConvertError> {
        let path = case_dir.join(MANIFEST_FILE);
        write_json(&path, self)?;
        Ok(path)
    }

    pub fn read(case_dir: &Path) -> Result<Self, ConvertError> {
        read_json(&case_dir.join(MANIFEST_FILE))
    }
}

/// Write `cases.json`, the ordered list of case ids of a run.
pub fn write_case_index(workspace: &Path, ids: &[String]) -> Result<PathBuf, ConvertError> {
    let path = workspace.join(CASE_INDEX_FILE);
    write_json(&path, ids)?;
    Ok(path)
}

pub fn read_case_index(workspace: &Path) -> Result<Vec<String>, ConvertError> {
    read_json(&workspace.join(CASE_INDEX_FILE))
}
