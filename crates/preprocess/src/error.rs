use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("Buffer size mismatch: expected {expected} bytes for {width}x{height} RGB, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}
