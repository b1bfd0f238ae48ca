pub mod backend;
pub mod codec;
pub mod config;
pub mod detection;
pub mod error;
pub mod labels;
pub mod logging;
pub mod processing;
pub mod service;
pub mod tensor;

// Re-export commonly used types for convenience
pub use backend::InferenceBackend;
pub use config::InferenceConfig;
pub use detection::Detection;
pub use error::{ErrorKind, InferenceError};
pub use labels::{LabelLookup, LabelMap};
pub use preprocess::ColorFormat;
pub use service::{InferenceService, infer};
pub use tensor::{Quantization, TensorData, TensorInfo, TensorType, TensorView};
