use crate::error::InferenceError;

/// Element type a model declares for one of its tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorType {
    Float32,
    Float16,
    Int8,
    UInt8,
    Int16,
    Int32,
    Int64,
    Bool,
}

/// Affine quantization parameters of an integer tensor.
///
/// `q = round(v / scale) + zero_point`, `v = (q - zero_point) * scale`.
/// The scale is always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantization {
    scale: f32,
    zero_point: i32,
}

impl Quantization {
    pub fn new(scale: f32, zero_point: i32) -> Result<Self, InferenceError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(InferenceError::InvalidQuantization { scale });
        }
        Ok(Self { scale, zero_point })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn zero_point(&self) -> i32 {
        self.zero_point
    }
}

/// Metadata the engine reports for one tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorInfo {
    pub tensor_type: TensorType,
    pub shape: Vec<usize>,
    pub quantization: Option<Quantization>,
}

impl TensorInfo {
    pub fn new(tensor_type: TensorType, shape: impl Into<Vec<usize>>) -> Self {
        Self {
            tensor_type,
            shape: shape.into(),
            quantization: None,
        }
    }

    pub fn with_quantization(mut self, quantization: Quantization) -> Self {
        self.quantization = Some(quantization);
        self
    }
}

/// Borrowed input buffer handed to the engine.
#[derive(Debug, Clone, Copy)]
pub enum TensorView<'a> {
    F32(&'a [f32]),
    I8(&'a [i8]),
    U8(&'a [u8]),
}

impl TensorView<'_> {
    pub fn len(&self) -> usize {
        match self {
            TensorView::F32(v) => v.len(),
            TensorView::I8(v) => v.len(),
            TensorView::U8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned output buffer returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    I8(Vec<i8>),
    U8(Vec<u8>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(v) => v.len(),
            TensorData::I8(v) => v.len(),
            TensorData::U8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
