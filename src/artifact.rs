//! On-disk artifact names and writers.
//!
//! Binary artifacts carry no header: little-endian values only, with shape
//! and geometry kept in the sibling `manifest.json`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ConvertError;

pub const CT_VOLUME_FILE: &str = "ct.bin";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const CASE_INDEX_FILE: &str = "cases.json";

/// File names a dose or structure-set artifact must not take.
pub const RESERVED_FILES: [&str; 3] = [CT_VOLUME_FILE, MANIFEST_FILE, CASE_INDEX_FILE];

/// Whether `file_name` would overwrite one of the run's own artifacts.
///
/// Compared case-insensitively, since `CT.bin` and `ct.bin` are the same file
/// on some filesystems.
pub fn is_reserved(file_name: &str) -> bool {
    RESERVED_FILES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(file_name))
}

pub fn write_i16_le<W: Write>(writer: &mut W, values: impl IntoIterator<Item = i16>) -> io::Result<()> {
    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

pub fn write_f32_le<W: Write>(writer: &mut W, values: impl IntoIterator<Item = f32>) -> io::Result<()> {
    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ConvertError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConvertError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Decode a `ct.bin` payload.
pub fn read_i16_le(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// Decode a dose grid payload.
pub fn read_f32_le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
