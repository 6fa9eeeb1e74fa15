use serde::{Deserialize, Serialize};

use crate::enums::{Modality, VoxelType};

/// Geometry and layout of a case's `ct.bin`.
///
/// `ct.bin` holds `count` slices of `rows * cols` little-endian `i16` values,
/// row-major, in the same order as `z_positions` (descending z).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtVolume {
    #[serde(rename = "type")]
    pub modality: Modality,
    pub rows: u32,
    pub cols: u32,
    /// `[column spacing, row spacing]`, i.e. x then y.
    pub spacing: [f64; 2],
    /// Patient-space position of the first voxel of the first slice
    pub origin: [f64; 3],
    pub z_positions: Vec<f64>,
    pub count: usize,
    #[serde(rename = "dataType")]
    pub data_type: VoxelType,
    pub chunks: u32,
}

impl CtVolume {
    /// Number of voxels in one slice.
    pub fn slice_len(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Size of `ct.bin` in bytes.
    pub fn byte_len(&self) -> usize {
        self.count * self.slice_len() * std::mem::size_of::<i16>()
    }

    pub fn pixel_transform(&self) -> PixelTransform {
        PixelTransform {
            origin: [self.origin[0], self.origin[1]],
            spacing: self.spacing,
        }
    }
}

/// Maps patient-space x/y onto the CT's pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTransform {
    pub origin: [f64; 2],
    pub spacing: [f64; 2],
}

impl PixelTransform {
    #[inline]
    pub fn to_pixel(&self, x: f64, y: f64) -> [f64; 2] {
        [
            (x - self.origin[0]) / self.spacing[0],
            (y - self.origin[1]) / self.spacing[1],
        ]
    }
}

/// Linear map from stored pixel values to CT numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescale {
    pub slope: f32,
    pub intercept: f32,
}

impl Default for Rescale {
    fn default() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
        }
    }
}

impl Rescale {
    /// Rescale and truncate toward zero; out-of-range values saturate.
    #[inline]
    pub fn apply(&self, raw: f32) -> i16 {
        (raw * self.slope + self.intercept) as i16
    }
}
