use crate::{ColorFormat, Preprocess, PreprocessError, RGB_CHANNELS};
use common::span;
use std::borrow::Cow;

const PIXEL_MAX: f32 = 255.0;

/// Reorder interleaved pixels to R,G,B. RGB input is borrowed untouched.
pub fn to_rgb(pixels: &[u8], format: ColorFormat) -> Cow<'_, [u8]> {
    match format {
        ColorFormat::Rgb => Cow::Borrowed(pixels),
        ColorFormat::Bgr => {
            let mut rgb = Vec::with_capacity(pixels.len());
            for px in pixels.chunks_exact(RGB_CHANNELS) {
                rgb.extend_from_slice(&[px[2], px[1], px[0]]);
            }
            Cow::Owned(rgb)
        }
    }
}

#[inline]
fn normalize_byte(&v: &u8) -> f32 {
    v as f32 / PIXEL_MAX
}

/// Map raw channel bytes into `[0, 1]`, preserving order.
pub fn normalize(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(normalize_byte).collect()
}

/// CPU preprocessor for frames that are already sized to the model input.
///
/// Keeps its output buffer between calls so repeated frames do not allocate.
pub struct CpuPreProcessor {
    pub input_size: (u32, u32),
    output_buffer: Vec<f32>,
}

impl CpuPreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            output_buffer: Vec::with_capacity(Self::expected_len(input_size)),
        }
    }

    fn expected_len(input_size: (u32, u32)) -> usize {
        input_size.0 as usize * input_size.1 as usize * RGB_CHANNELS
    }

    fn check_size(&self, pixels: &[u8]) -> Result<(), PreprocessError> {
        let expected = Self::expected_len(self.input_size);
        if pixels.len() != expected {
            return Err(PreprocessError::SizeMismatch {
                width: self.input_size.0,
                height: self.input_size.1,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(())
    }
}

impl Default for CpuPreProcessor {
    fn default() -> Self {
        Self::new((640, 640))
    }
}

impl Preprocess for CpuPreProcessor {
    fn preprocess(
        &mut self,
        pixels: &[u8],
        format: ColorFormat,
    ) -> Result<&[f32], PreprocessError> {
        let _s = span!("preprocess_frame");

        tracing::trace!(
            width = self.input_size.0,
            height = self.input_size.1,
            format = ?format,
            pixel_bytes = pixels.len(),
            "Preprocessing frame"
        );

        self.check_size(pixels)?;

        let rgb = to_rgb(pixels, format);
        self.output_buffer.clear();
        self.output_buffer.extend(rgb.iter().map(normalize_byte));

        Ok(&self.output_buffer)
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }
}
