pub mod cpu;
pub mod error;

pub use cpu::{CpuPreProcessor, normalize, to_rgb};
pub use error::PreprocessError;

/// Channel order of the interleaved pixels handed to the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
    #[default]
    Rgb,
    Bgr,
}

pub const RGB_CHANNELS: usize = 3;

/// Trait for image preprocessing implementations
pub trait Preprocess {
    /// Turn an already letterboxed frame into model input.
    ///
    /// # Arguments
    /// * `pixels` - Interleaved pixel data in HWC order
    /// * `format` - Channel order of `pixels`
    ///
    /// # Returns
    /// Normalized `[0, 1]` floats in interleaved R,G,B order
    fn preprocess(&mut self, pixels: &[u8], format: ColorFormat)
    -> Result<&[f32], PreprocessError>;

    /// Get the `(width, height)` this preprocessor expects
    fn input_size(&self) -> (u32, u32);
}
