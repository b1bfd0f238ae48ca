use crate::tensor::TensorType;
use preprocess::PreprocessError;
use thiserror::Error;

/// Broad class of an [`InferenceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The model or the detector settings cannot be used as declared.
    Configuration,
    /// A buffer does not match the shape it claims to have.
    MalformedInput,
    /// The engine itself failed while running.
    Backend,
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Unsupported tensor type {0:?}: expected Float32, Float16, Int8 or UInt8")]
    UnsupportedTensorType(TensorType),

    #[error("Invalid quantization scale {scale}: must be finite and greater than zero")]
    InvalidQuantization { scale: f32 },

    #[error("{tensor} tensor of type {tensor_type:?} has no quantization parameters")]
    MissingQuantization {
        tensor: &'static str,
        tensor_type: TensorType,
    },

    #[error("Invalid output row width {0}: need 4 box values, objectness and at least one class")]
    InvalidRowWidth(usize),

    #[error("Invalid output shape {0:?}: expected [anchors, row] or [1, anchors, row]")]
    InvalidOutputShape(Vec<usize>),

    #[error(
        "Output size mismatch: expected {expected} values ({anchors} anchors x {row_width}), got {actual}"
    )]
    OutputSizeMismatch {
        anchors: usize,
        row_width: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("Inference backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::UnsupportedTensorType(_)
            | InferenceError::InvalidQuantization { .. }
            | InferenceError::MissingQuantization { .. }
            | InferenceError::InvalidRowWidth(_)
            | InferenceError::InvalidOutputShape(_)
            | InferenceError::InvalidConfig(_) => ErrorKind::Configuration,
            InferenceError::OutputSizeMismatch { .. } | InferenceError::Preprocess(_) => {
                ErrorKind::MalformedInput
            }
            InferenceError::Backend(_) => ErrorKind::Backend,
        }
    }
}

impl From<anyhow::Error> for InferenceError {
    fn from(err: anyhow::Error) -> Self {
        InferenceError::Backend(err.into())
    }
}
