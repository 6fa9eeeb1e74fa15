//! Typed attribute access on top of [`InMemDicomObject`].
//!
//! Absent attributes come back as `None` (or an empty sequence) so callers
//! can apply defaults, while attributes that are present but cannot be
//! converted are reported as [`AttrError::Malformed`].

use dicom::core::Tag;
use dicom::object::InMemDicomObject;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttrError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("malformed {name}: {message}")]
    Malformed { name: &'static str, message: String },
}

fn malformed(name: &'static str, err: impl std::fmt::Display) -> AttrError {
    AttrError::Malformed {
        name,
        message: err.to_string(),
    }
}

pub(crate) trait AttrAccess {
    fn opt_f64(&self, tag: Tag, name: &'static str) -> Result<Option<f64>, AttrError>;

    fn opt_f64s(&self, tag: Tag, name: &'static str) -> Result<Option<Vec<f64>>, AttrError>;

    fn opt_i64(&self, tag: Tag, name: &'static str) -> Result<Option<i64>, AttrError>;

    fn opt_i64s(&self, tag: Tag, name: &'static str) -> Result<Option<Vec<i64>>, AttrError>;

    fn opt_string(&self, tag: Tag, name: &'static str) -> Result<Option<String>, AttrError>;

    /// Items of a sequence attribute, empty when the attribute is absent.
    fn sequence(&self, tag: Tag) -> &[InMemDicomObject];

    fn req_f64s(&self, tag: Tag, name: &'static str) -> Result<Vec<f64>, AttrError> {
        self.opt_f64s(tag, name)?.ok_or(AttrError::Missing(name))
    }

    fn req_i64(&self, tag: Tag, name: &'static str) -> Result<i64, AttrError> {
        self.opt_i64(tag, name)?.ok_or(AttrError::Missing(name))
    }

    fn req_string(&self, tag: Tag, name: &'static str) -> Result<String, AttrError> {
        self.opt_string(tag, name)?.ok_or(AttrError::Missing(name))
    }

    /// The first `N` values of a multi-valued decimal attribute.
    fn req_f64_array<const N: usize>(
        &self,
        tag: Tag,
        name: &'static str,
    ) -> Result<[f64; N], AttrError> {
        let values = self.req_f64s(tag, name)?;
        values
            .get(..N)
            .and_then(|head| <[f64; N]>::try_from(head).ok())
            .ok_or_else(|| malformed(name, format!("expected {N} values, got {}", values.len())))
    }

    fn req_u32(&self, tag: Tag, name: &'static str) -> Result<u32, AttrError> {
        let value = self.req_i64(tag, name)?;
        u32::try_from(value).map_err(|e| malformed(name, e))
    }
}

impl AttrAccess for InMemDicomObject {
    fn opt_f64(&self, tag: Tag, name: &'static str) -> Result<Option<f64>, AttrError> {
        self.element(tag)
            .ok()
            .map(|e| e.to_float64().map_err(|err| malformed(name, err)))
            .transpose()
    }

    fn opt_f64s(&self, tag: Tag, name: &'static str) -> Result<Option<Vec<f64>>, AttrError> {
        self.element(tag)
            .ok()
            .map(|e| e.to_multi_float64().map_err(|err| malformed(name, err)))
            .transpose()
    }

    fn opt_i64(&self, tag: Tag, name: &'static str) -> Result<Option<i64>, AttrError> {
        self.element(tag)
            .ok()
            .map(|e| e.to_int::<i64>().map_err(|err| malformed(name, err)))
            .transpose()
    }

    fn opt_i64s(&self, tag: Tag, name: &'static str) -> Result<Option<Vec<i64>>, AttrError> {
        self.element(tag)
            .ok()
            .map(|e| e.to_multi_int::<i64>().map_err(|err| malformed(name, err)))
            .transpose()
    }

    fn opt_string(&self, tag: Tag, name: &'static str) -> Result<Option<String>, AttrError> {
        self.element(tag)
            .ok()
            .map(|e| {
                e.to_str()
                    .map(|s| s.trim_end_matches(['\0', ' ']).to_string())
                    .map_err(|err| malformed(name, err))
            })
            .transpose()
    }

    fn sequence(&self, tag: Tag) -> &[InMemDicomObject] {
        self.element(tag)
            .ok()
            .and_then(|e| e.items())
            .unwrap_or(&[])
    }
}
