#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dicom::core::value::DataSetSequence;
use dicom::core::{DataElement, PrimitiveValue, VR, dicom_value};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};

use dicom_rt_ingest::ConvertConfig;
use dicom_rt_ingest::artifact::{read_f32_le, read_i16_le};

pub fn test_config(workspace: &Path) -> ConvertConfig {
    ConvertConfig::new(workspace).with_pause(Duration::ZERO)
}

fn strs(values: &[&str]) -> PrimitiveValue {
    PrimitiveValue::Strs(values.iter().map(|v| v.to_string()).collect())
}

fn decimals(values: &[f64]) -> PrimitiveValue {
    let text: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    PrimitiveValue::Strs(text.into_iter().collect())
}

fn pixel_elements(rows: u16, cols: u16, signed: bool) -> Vec<DataElement<InMemDicomObject>> {
    vec![
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(cols)),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)),
        DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(u16::from(signed)),
        ),
    ]
}

fn save(obj: InMemDicomObject, sop_class: &str, path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let instance = format!("2.25.{}", path.to_string_lossy().len());
    obj.with_meta(
        FileMetaTableBuilder::new()
            .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
            .media_storage_sop_class_uid(sop_class)
            .media_storage_sop_instance_uid(instance),
    )
    .unwrap()
    .write_to_file(path)
    .unwrap();
}

/// A CT slice description for [`write_ct`].
#[derive(Debug, Clone)]
pub struct CtSlice {
    pub z: f64,
    pub rows: u16,
    pub cols: u16,
    pub pixels: Vec<u16>,
    pub rescale: Option<(f64, f64)>,
}

impl CtSlice {
    /// A 2x2 slice at `z` filled with `value`.
    pub fn flat(z: f64, value: u16) -> Self {
        Self {
            z,
            rows: 2,
            cols: 2,
            pixels: vec![value; 4],
            rescale: None,
        }
    }
}

pub fn write_ct(path: &Path, slice: &CtSlice) {
    let mut elements = vec![
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("CT")),
        DataElement::new(
            tags::IMAGE_POSITION_PATIENT,
            VR::DS,
            decimals(&[-10.0, -20.0, slice.z]),
        ),
        DataElement::new(tags::PIXEL_SPACING, VR::DS, dicom_value!(Strs, ["0.5", "0.75"])),
    ];
    if let Some((slope, intercept)) = slice.rescale {
        elements.push(DataElement::new(tags::RESCALE_SLOPE, VR::DS, decimals(&[slope])));
        elements.push(DataElement::new(
            tags::RESCALE_INTERCEPT,
            VR::DS,
            decimals(&[intercept]),
        ));
    }
    elements.extend(pixel_elements(slice.rows, slice.cols, false));
    elements.push(DataElement::new(
        tags::PIXEL_DATA,
        VR::OW,
        PrimitiveValue::U16(slice.pixels.clone().into()),
    ));

    save(
        InMemDicomObject::from_element_iter(elements),
        uids::CT_IMAGE_STORAGE,
        path,
    );
}

/// An RTDOSE grid description for [`write_dose`].
#[derive(Debug, Clone)]
pub struct DoseFixture {
    pub rows: u16,
    pub cols: u16,
    pub origin: [f64; 3],
    pub values: Vec<u16>,
    pub frames: usize,
    pub scaling: Option<f64>,
    pub offsets: Option<Vec<f64>>,
}

impl DoseFixture {
    /// A single 2x2 frame without scaling or offsets.
    pub fn single(values: [u16; 4]) -> Self {
        Self {
            rows: 2,
            cols: 2,
            origin: [-5.0, -5.0, 12.5],
            values: values.to_vec(),
            frames: 1,
            scaling: None,
            offsets: None,
        }
    }
}

pub fn write_dose(path: &Path, dose: &DoseFixture) {
    let mut elements = vec![
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("RTDOSE")),
        DataElement::new(
            tags::IMAGE_POSITION_PATIENT,
            VR::DS,
            decimals(&dose.origin),
        ),
        DataElement::new(tags::PIXEL_SPACING, VR::DS, dicom_value!(Strs, ["2", "3"])),
        DataElement::new(
            tags::NUMBER_OF_FRAMES,
            VR::IS,
            PrimitiveValue::from(dose.frames.to_string()),
        ),
    ];
    if let Some(scaling) = dose.scaling {
        elements.push(DataElement::new(
            tags::DOSE_GRID_SCALING,
            VR::DS,
            decimals(&[scaling]),
        ));
    }
    if let Some(offsets) = &dose.offsets {
        elements.push(DataElement::new(
            tags::GRID_FRAME_OFFSET_VECTOR,
            VR::DS,
            decimals(offsets),
        ));
    }
    elements.extend(pixel_elements(dose.rows, dose.cols, false));
    elements.push(DataElement::new(
        tags::PIXEL_DATA,
        VR::OW,
        PrimitiveValue::U16(dose.values.clone().into()),
    ));

    save(
        InMemDicomObject::from_element_iter(elements),
        uids::RT_DOSE_STORAGE,
        path,
    );
}

/// One ROI of an RTSTRUCT fixture. Each contour is a flat `x\y\z` list.
#[derive(Debug, Clone)]
pub struct RoiFixture {
    pub number: i32,
    pub name: &'static str,
    pub color: Option<[i32; 3]>,
    pub contours: Vec<Vec<f64>>,
}

pub fn write_struct(path: &Path, rois: &[RoiFixture]) {
    write_struct_parts(path, rois, rois);
}

/// An RTSTRUCT whose ROI registry lists `registered` but whose
/// ROIContourSequence only has items for `contoured`.
pub fn write_struct_parts(path: &Path, registered: &[RoiFixture], contoured: &[RoiFixture]) {
    let registry: Vec<InMemDicomObject> = registered
        .iter()
        .map(|roi| {
            InMemDicomObject::from_element_iter([
                DataElement::new(
                    tags::ROI_NUMBER,
                    VR::IS,
                    PrimitiveValue::from(roi.number.to_string()),
                ),
                DataElement::new(tags::ROI_NAME, VR::LO, PrimitiveValue::from(roi.name)),
            ])
        })
        .collect();

    let contours: Vec<InMemDicomObject> = contoured
        .iter()
        .map(|roi| {
            let items: Vec<InMemDicomObject> = roi
                .contours
                .iter()
                .map(|data| {
                    InMemDicomObject::from_element_iter([DataElement::new(
                        tags::CONTOUR_DATA,
                        VR::DS,
                        decimals(data),
                    )])
                })
                .collect();

            let mut elements = vec![
                DataElement::new(
                    tags::REFERENCED_ROI_NUMBER,
                    VR::IS,
                    PrimitiveValue::from(roi.number.to_string()),
                ),
                DataElement::new(tags::CONTOUR_SEQUENCE, VR::SQ, DataSetSequence::from(items)),
            ];
            if let Some([r, g, b]) = roi.color {
                elements.push(DataElement::new(
                    tags::ROI_DISPLAY_COLOR,
                    VR::IS,
                    strs(&[&r.to_string(), &g.to_string(), &b.to_string()]),
                ));
            }
            InMemDicomObject::from_element_iter(elements)
        })
        .collect();

    let obj = InMemDicomObject::from_element_iter([
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("RTSTRUCT")),
        DataElement::new(
            tags::STRUCTURE_SET_ROI_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(registry),
        ),
        DataElement::new(
            tags::ROI_CONTOUR_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(contours),
        ),
    ]);
    save(obj, uids::RT_STRUCTURE_SET_STORAGE, path);
}

/// Three 2x2 CT slices at z = 0, 1, 2 written in an order unrelated to z.
pub fn write_ct_series(dir: &Path) -> Vec<PathBuf> {
    let slices = [("b.dcm", 0.0, 100), ("a.dcm", 2.0, 300), ("c.dcm", 1.0, 200)];
    slices
        .iter()
        .map(|(name, z, value)| {
            let path = dir.join(name);
            write_ct(&path, &CtSlice::flat(*z, *value));
            path
        })
        .collect()
}

pub fn read_i16s(path: &Path) -> Vec<i16> {
    read_i16_le(&fs::read(path).unwrap())
}

pub fn read_f32s(path: &Path) -> Vec<f32> {
    read_f32_le(&fs::read(path).unwrap())
}
