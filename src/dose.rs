use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dicom::object::open_file;
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use dicom_dictionary_std::tags;
use ndarray::s;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{is_reserved, write_f32_le};
use crate::attrs::{AttrAccess, AttrError};
use crate::context::RunContext;
use crate::error::{ConvertError, SkipReason};

/// Manifest entry for one dose grid artifact.
///
/// The artifact holds the scaled grid as little-endian `f32` values, row-major,
/// one `rows * cols` frame per entry of `z_positions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseGrid {
    pub filename: String,
    pub rows: u32,
    pub cols: u32,
    pub origin: [f64; 3],
    /// `[column spacing, row spacing]`
    pub spacing: [f64; 2],
    pub max_dose: f64,
    pub z_positions: Vec<f64>,
    pub chunks: u32,
    pub prescription: f64,
}

/// Prescription encoded in a dose file name, e.g. `RD_plan_4500cGy` yields 4500.
///
/// Only the last `_`-separated token is considered, with everything but digits
/// and `.` removed.
pub fn prescription_from_name(stem: &str) -> Option<f64> {
    let token = stem.rsplit('_').next().unwrap_or(stem);
    let numeric: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Manifest key and artifact file name of a dose file: `<stem>` and `<stem>.bin`.
pub fn artifact_names(path: &Path) -> (String, String) {
    let artifact = Path::new(path.file_name().unwrap_or(path.as_os_str())).with_extension("bin");
    let name = artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (name, artifact.to_string_lossy().into_owned())
}

/// Convert every dose file of a case; a failing file only drops its own entry.
///
/// A file whose artifact would take the name of `ct.bin` or a JSON index is
/// skipped before anything is written.
pub fn extract_doses(
    files: &[PathBuf],
    out_dir: &Path,
    ctx: &mut RunContext<'_>,
) -> BTreeMap<String, DoseGrid> {
    let mut doses = BTreeMap::new();
    for path in files {
        let (_, filename) = artifact_names(path);
        if is_reserved(&filename) {
            ctx.skip(path, SkipReason::ReservedArtifactName(filename));
            continue;
        }
        match extract_dose(path, out_dir) {
            Ok((name, grid)) => {
                debug!(%name, frames = grid.z_positions.len(), max_dose = grid.max_dose, "wrote dose grid");
                doses.insert(name, grid);
            }
            Err(err) => ctx.skip(path, SkipReason::DoseFailed(err.to_string())),
        }
    }
    doses
}

/// Convert one RTDOSE file into `<stem>.bin` and its manifest entry.
pub fn extract_dose(path: &Path, out_dir: &Path) -> Result<(String, DoseGrid), ConvertError> {
    let obj = open_file(path)?;
    let attr = |e: AttrError| ConvertError::attribute(path, e);

    let scaling = obj
        .opt_f64(tags::DOSE_GRID_SCALING, "DoseGridScaling")
        .map_err(attr)?
        .unwrap_or(1.0);
    let rows = obj.req_u32(tags::ROWS, "Rows").map_err(attr)?;
    let cols = obj.req_u32(tags::COLUMNS, "Columns").map_err(attr)?;
    let origin: [f64; 3] = obj
        .req_f64_array(tags::IMAGE_POSITION_PATIENT, "ImagePositionPatient")
        .map_err(attr)?;
    let pixel_spacing: [f64; 2] = obj
        .req_f64_array(tags::PIXEL_SPACING, "PixelSpacing")
        .map_err(attr)?;
    let offsets = obj
        .opt_f64s(tags::GRID_FRAME_OFFSET_VECTOR, "GridFrameOffsetVector")
        .map_err(attr)?
        .unwrap_or_else(|| vec![0.0]);

    let pixel_data = obj
        .decode_pixel_data()
        .map_err(|e| ConvertError::PixelData(e.to_string()))?;
    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let raw = pixel_data
        .to_ndarray_with_options::<f64>(&options)
        .map_err(|e| ConvertError::PixelData(e.to_string()))?;
    if raw.shape()[3] == 0 {
        return Err(ConvertError::PixelData("pixel data holds no samples".to_string()));
    }
    let dose: Vec<f32> = raw
        .slice(s![.., .., .., 0])
        .iter()
        .map(|&v| (v * scaling) as f32)
        .collect();
    let max_dose = dose
        .iter()
        .copied()
        .reduce(f32::max)
        .ok_or_else(|| ConvertError::PixelData("empty dose grid".to_string()))?;

    let (name, filename) = artifact_names(path);
    let mut writer = BufWriter::new(File::create(out_dir.join(&filename))?);
    write_f32_le(&mut writer, dose)?;
    writer.flush()?;

    let max_dose = f64::from(max_dose);
    let grid = DoseGrid {
        filename,
        rows,
        cols,
        origin,
        spacing: [pixel_spacing[1], pixel_spacing[0]],
        max_dose,
        z_positions: offsets.iter().map(|offset| origin[2] + offset).collect(),
        chunks: 1,
        prescription: prescription_from_name(&name).unwrap_or(max_dose),
    };
    Ok((name, grid))
}
