use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::iter;
use std::path::Path;

use dicom::object::{OpenFileOptions, open_file};
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use dicom_dictionary_std::tags;
use ndarray::{Array2, s};
use tracing::{debug, warn};

use crate::artifact::{CT_VOLUME_FILE, write_i16_le};
use crate::attrs::{AttrAccess, AttrError};
use crate::classifier::ClassifiedFile;
use crate::context::RunContext;
use crate::enums::{Modality, VoxelType};
use crate::error::{ConvertError, SkipReason};
use crate::volume::{CtVolume, Rescale};

/// Geometry shared by every slice, read from the first slice in z order.
#[derive(Debug, Clone, PartialEq)]
struct SliceGeometry {
    rows: u32,
    cols: u32,
    spacing: [f64; 2],
    origin: [f64; 3],
    rescale: Rescale,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Write `ct.bin` for one case and describe it.
    ///
    /// Returns `Ok(None)` when `slices` is empty, which rejects the case.
    /// A slice that cannot be decoded is written as zeros so the volume stays
    /// rectangular.
    ///
    /// # Errors
    ///
    /// Fails when the first slice lacks geometry or the artifact cannot be written.
    pub fn build(
        mut slices: Vec<ClassifiedFile>,
        out_dir: &Path,
        ctx: &mut RunContext<'_>,
    ) -> Result<Option<CtVolume>, ConvertError> {
        if slices.is_empty() {
            return Ok(None);
        }

        Self::sort_slices(&mut slices);
        let geometry = Self::read_geometry(&slices[0].path)?;
        let (rows, cols) = (geometry.rows as usize, geometry.cols as usize);

        let mut writer = BufWriter::new(File::create(out_dir.join(CT_VOLUME_FILE))?);
        for (i, slice) in slices.iter().enumerate() {
            match Self::decode_slice(&slice.path, rows, cols) {
                Ok(raw) => {
                    write_i16_le(&mut writer, raw.iter().map(|&v| geometry.rescale.apply(v)))?;
                }
                Err(reason) => {
                    warn!(path = %slice.path.display(), %reason, "zero-filling CT slice");
                    write_i16_le(&mut writer, iter::repeat_n(0, rows * cols))?;
                    ctx.skip(&slice.path, SkipReason::SliceZeroFilled(reason));
                }
            }

            if i % ctx.config.write_pause_every.max(1) == 0 {
                ctx.progress.pause();
            }
        }
        writer.flush()?;

        let z_positions: Vec<f64> = slices.iter().map(|s| s.z.unwrap_or_default()).collect();
        debug!(slices = z_positions.len(), rows, cols, "wrote CT volume");

        Ok(Some(CtVolume {
            modality: Modality::Ct,
            rows: geometry.rows,
            cols: geometry.cols,
            spacing: geometry.spacing,
            origin: geometry.origin,
            count: z_positions.len(),
            z_positions,
            data_type: VoxelType::Int16,
            chunks: 1,
        }))
    }

    /// Order slices by patient z, highest first. Ties keep their incoming order.
    pub fn sort_slices(slices: &mut [ClassifiedFile]) {
        slices.sort_by(|a, b| b.z.partial_cmp(&a.z).unwrap_or(Ordering::Equal));
    }

    fn read_geometry(path: &Path) -> Result<SliceGeometry, ConvertError> {
        let obj = OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .open_file(path)?;
        let attr = |e: AttrError| ConvertError::attribute(path, e);

        let pixel_spacing: [f64; 2] = obj
            .req_f64_array(tags::PIXEL_SPACING, "PixelSpacing")
            .map_err(attr)?;
        let slope = obj
            .opt_f64(tags::RESCALE_SLOPE, "RescaleSlope")
            .map_err(attr)?
            .unwrap_or(1.0);
        let intercept = obj
            .opt_f64(tags::RESCALE_INTERCEPT, "RescaleIntercept")
            .map_err(attr)?
            .unwrap_or(0.0);

        Ok(SliceGeometry {
            rows: obj.req_u32(tags::ROWS, "Rows").map_err(attr)?,
            cols: obj.req_u32(tags::COLUMNS, "Columns").map_err(attr)?,
            spacing: [pixel_spacing[1], pixel_spacing[0]],
            origin: obj
                .req_f64_array(tags::IMAGE_POSITION_PATIENT, "ImagePositionPatient")
                .map_err(attr)?,
            rescale: Rescale {
                slope: slope as f32,
                intercept: intercept as f32,
            },
        })
    }

    /// Decode the stored (not rescaled) values of the first frame.
    fn decode_slice(path: &Path, rows: usize, cols: usize) -> Result<Array2<f32>, String> {
        let dicom_object = open_file(path).map_err(|e| e.to_string())?;
        let pixel_data = dicom_object
            .decode_pixel_data()
            .map_err(|e| e.to_string())?;
        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        let frames = pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .map_err(|e| e.to_string())?;

        let shape = frames.shape();
        if shape[0] == 0 || shape[3] == 0 {
            return Err("pixel data holds no samples".to_string());
        }
        let image: Array2<f32> = frames.slice_move(s![0, .., .., 0]);
        if image.dim() != (rows, cols) {
            return Err(format!(
                "expected {rows}x{cols} pixels, got {}x{}",
                image.dim().0,
                image.dim().1
            ));
        }
        Ok(image)
    }
}
