use serde::{Deserialize, Serialize};

/// Role of a file inside a case, taken from its Modality attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "CT")]
    Ct,
    #[serde(rename = "RTDOSE")]
    RtDose,
    #[serde(rename = "RTSTRUCT")]
    RtStruct,
}

impl Modality {
    /// Map a Modality code string onto one of the supported roles.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim_end_matches(['\0', ' ']) {
            "CT" => Some(Self::Ct),
            "RTDOSE" => Some(Self::RtDose),
            "RTSTRUCT" => Some(Self::RtStruct),
            _ => None,
        }
    }
}

/// Element type of the CT volume artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoxelType {
    #[default]
    #[serde(rename = "int16")]
    Int16,
}
