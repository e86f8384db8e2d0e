//! Error types for the scene grammar.

use gex_ddl::{DescriptionError, StructureError};
use thiserror::Error;

/// Semantic failures raised while processing scene structures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GexError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("up direction is not \"z\" or \"y\"")]
    InvalidUpDirection,

    #[error("forward direction is not one of x, y, z, -x, -y, -z")]
    InvalidForwardDirection,

    #[error("translation kind is invalid")]
    InvalidTranslationKind,

    #[error("rotation kind is invalid")]
    InvalidRotationKind,

    #[error("scale kind is invalid")]
    InvalidScaleKind,

    #[error("two meshes share the same level of detail")]
    DuplicateLod,

    #[error("some levels of detail have a skin and others do not")]
    MissingLodSkin,

    #[error("two morph targets share the same index")]
    DuplicateMorph,

    #[error("light type is undefined")]
    UndefinedLightType,

    #[error("attenuation curve is undefined")]
    UndefinedCurve,

    #[error("attenuation kind is undefined")]
    UndefinedAtten,

    #[error("two vertex arrays share the same attrib, index and morph")]
    DuplicateVertexArray,

    #[error("mesh has no position array")]
    PositionArrayRequired,

    #[error("index value does not fit the supported range")]
    IndexValueUnsupported,

    #[error("vertex arrays have different vertex counts")]
    VertexCountMismatch,

    #[error("bone reference count differs from bind transform count")]
    BoneCountMismatch,

    #[error("bone weight count differs from bone index count")]
    BoneWeightCountMismatch,

    #[error("bone reference does not point at a BoneNode")]
    InvalidBoneRef,

    #[error("object reference points at the wrong kind of object")]
    InvalidObjectRef,

    #[error("material reference does not point at a Material")]
    InvalidMaterialRef,

    #[error("material index is larger than 255")]
    MaterialIndexUnsupported,

    #[error("two material references share the same index")]
    DuplicateMaterialRef,

    #[error("material indexes are not contiguous")]
    MissingMaterialRef,

    #[error("track target is not a local reference")]
    TargetRefNotLocal,

    #[error("track target cannot be animated")]
    InvalidTargetStruct,

    #[error("key kind is invalid for its curve")]
    InvalidKeyKind,

    #[error("curve type is invalid")]
    InvalidCurveType,

    #[error("key counts do not match")]
    KeyCountMismatch,

    #[error("key has no data")]
    EmptyKeyStructure,
}

/// Result type for scene processing.
pub type GexResult<T> = Result<T, GexError>;

/// Error returned by the file and string loaders.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] DescriptionError<GexError>),

    #[error("Invalid load options: {0}")]
    Options(#[from] serde_json::Error),
}

/// Result type for the loaders.
pub type LoadResult<T> = Result<T, LoadError>;

impl LoadError {
    /// Source line of a parse failure.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoadError::Parse(e) => Some(e.line()),
            _ => None,
        }
    }

    /// Scene error code of a processing failure.
    pub fn gex_error(&self) -> Option<GexError> {
        match self {
            LoadError::Parse(DescriptionError::Process { source, .. }) => Some(*source),
            _ => None,
        }
    }
}
