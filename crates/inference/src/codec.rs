//! Affine quantize/dequantize between `f32` tensors and 8-bit integer tensors.
//!
//! Both directions are total: the scale is validated when the
//! [`Quantization`] is built, and out-of-range values saturate at the
//! integer type's bounds on cast.

use crate::tensor::Quantization;
use num_traits::{AsPrimitive, PrimInt};

/// `round(v / scale) + zero_point` for every value, cast to `T`.
pub fn quantize<T>(values: &[f32], quant: Quantization) -> Vec<T>
where
    T: PrimInt + 'static,
    f32: AsPrimitive<T>,
{
    let scale = quant.scale();
    let zero_point = quant.zero_point() as f32;
    values
        .iter()
        .map(|&v| ((v / scale).round() + zero_point).as_())
        .collect()
}

/// `(q - zero_point) * scale` for every value.
pub fn dequantize<T>(values: &[T], quant: Quantization) -> Vec<f32>
where
    T: PrimInt + AsPrimitive<i64>,
{
    let scale = quant.scale();
    let zero_point = quant.zero_point() as i64;
    values
        .iter()
        .map(|&q| (q.as_() - zero_point) as f32 * scale)
        .collect()
}
