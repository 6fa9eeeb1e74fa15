//! RTSTRUCT contours in CT pixel space.
//!
//! Each structure-set file becomes `<stem>.json`:
//!
//! ```json
//! { "PTV": { "color": "#ff0000", "contours": { "12.50": [[[x, y], ...], ...] } } }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use dicom::object::open_file;
use dicom_dictionary_std::tags;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{is_reserved, write_json};
use crate::attrs::{AttrAccess, AttrError};
use crate::context::RunContext;
use crate::error::{ConvertError, SkipReason};
use crate::volume::PixelTransform;

pub const DEFAULT_ROI_COLOR: &str = "#00FFFF";

/// One closed polygon in pixel coordinates.
pub type Polygon = Vec<[f64; 2]>;

/// Slice key: the contour's z coordinate printed with two decimals.
///
/// Contours whose z values print the same share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZKey(String);

impl ZKey {
    pub fn from_z(z: f64) -> Self {
        Self(format!("{z:.2}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiContours {
    pub color: String,
    pub contours: BTreeMap<ZKey, Vec<Polygon>>,
}

/// ROI name to its per-slice contours.
pub type StructureSet = BTreeMap<String, RoiContours>;

#[derive(Debug, Clone)]
struct Roi {
    name: String,
    color: String,
}

/// `#rrggbb` from a three-component display color.
pub fn hex_color(components: &[i64]) -> Result<String, AttrError> {
    let malformed = |message: String| AttrError::Malformed {
        name: "ROIDisplayColor",
        message,
    };
    let [r, g, b] = <[i64; 3]>::try_from(components.get(..3).unwrap_or(components))
        .map_err(|_| malformed(format!("expected 3 components, got {}", components.len())))?;
    let channel = |v: i64| u8::try_from(v).map_err(|e| malformed(e.to_string()));
    Ok(format!("#{:02x}{:02x}{:02x}", channel(r)?, channel(g)?, channel(b)?))
}

/// Turn flat `x\y\z` contour data into a pixel-space polygon and its slice key.
pub fn contour_to_pixels(
    data: &[f64],
    transform: &PixelTransform,
) -> Result<(ZKey, Polygon), AttrError> {
    if data.is_empty() || data.len() % 3 != 0 {
        return Err(AttrError::Malformed {
            name: "ContourData",
            message: format!("{} values is not a list of 3-D points", data.len()),
        });
    }
    let polygon = data
        .chunks_exact(3)
        .map(|p| transform.to_pixel(p[0], p[1]))
        .collect();
    Ok((ZKey::from_z(data[2]), polygon))
}

/// Read one RTSTRUCT file into contours keyed by ROI name.
///
/// ROIs without a single contour are left out.
pub fn read_structure_set(
    path: &Path,
    transform: &PixelTransform,
) -> Result<StructureSet, ConvertError> {
    let obj = open_file(path)?;
    let attr = |e: AttrError| ConvertError::attribute(path, e);

    let mut rois = HashMap::new();
    for item in obj.sequence(tags::STRUCTURE_SET_ROI_SEQUENCE) {
        let number = item.req_i64(tags::ROI_NUMBER, "ROINumber").map_err(attr)?;
        let name = item.req_string(tags::ROI_NAME, "ROIName").map_err(attr)?;
        rois.insert(
            number,
            Roi {
                name,
                color: DEFAULT_ROI_COLOR.to_string(),
            },
        );
    }

    let mut set = StructureSet::new();
    for item in obj.sequence(tags::ROI_CONTOUR_SEQUENCE) {
        let number = item
            .req_i64(tags::REFERENCED_ROI_NUMBER, "ReferencedROINumber")
            .map_err(attr)?;
        let Some(roi) = rois.get_mut(&number) else {
            continue;
        };
        if let Some(color) = item
            .opt_i64s(tags::ROI_DISPLAY_COLOR, "ROIDisplayColor")
            .map_err(attr)?
        {
            roi.color = hex_color(&color).map_err(attr)?;
        }

        let mut contours: BTreeMap<ZKey, Vec<Polygon>> = BTreeMap::new();
        for contour in item.sequence(tags::CONTOUR_SEQUENCE) {
            let data = contour
                .req_f64s(tags::CONTOUR_DATA, "ContourData")
                .map_err(attr)?;
            let (key, polygon) = contour_to_pixels(&data, transform).map_err(attr)?;
            contours.entry(key).or_default().push(polygon);
        }

        if !contours.is_empty() {
            set.insert(
                roi.name.clone(),
                RoiContours {
                    color: roi.color.clone(),
                    contours,
                },
            );
        }
    }

    Ok(set)
}

/// Convert every structure-set file of a case into `<stem>.json`.
///
/// Returns artifact names (`<stem>`) mapped to their file names. A failing or
/// empty file is skipped without touching the others, as is one whose
/// artifact would be named like `manifest.json` or `cases.json`.
pub fn extract_structure_sets(
    files: &[PathBuf],
    transform: &PixelTransform,
    out_dir: &Path,
    ctx: &mut RunContext<'_>,
) -> BTreeMap<String, String> {
    let mut structs = BTreeMap::new();
    for path in files {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = format!("{stem}.json");
        if is_reserved(&filename) {
            ctx.skip(path, SkipReason::ReservedArtifactName(filename));
            continue;
        }

        let set = match read_structure_set(path, transform) {
            Ok(set) if set.is_empty() => {
                ctx.skip(path, SkipReason::EmptyStructureSet);
                continue;
            }
            Ok(set) => set,
            Err(err) => {
                ctx.skip(path, SkipReason::StructureSetFailed(err.to_string()));
                continue;
            }
        };

        match write_json(&out_dir.join(&filename), &set) {
            Ok(()) => {
                debug!(name = %stem, rois = set.len(), "wrote structure set");
                structs.insert(stem, filename);
            }
            Err(err) => ctx.skip(path, SkipReason::StructureSetFailed(err.to_string())),
        }
    }
    structs
}
