use crate::error::InferenceError;
use common::env_or;

pub use common::Environment;

pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

/// Inference settings. Fixed once the service is built.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub environment: Environment,
    /// Minimum objectness for an anchor to be considered
    pub obj_threshold: f32,
    /// Minimum best-class confidence
    pub cls_threshold: f32,
    /// Overlap above which the lower-scored box is suppressed
    pub iou_threshold: f32,
    /// `(width, height)` of the letterboxed model input
    pub input_size: (u32, u32),
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            obj_threshold: 0.25,
            cls_threshold: 0.20,
            iou_threshold: 0.45,
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            environment: Environment::from_env(),
            obj_threshold: env_or("OBJ_THRESHOLD", defaults.obj_threshold),
            cls_threshold: env_or("CLS_THRESHOLD", defaults.cls_threshold),
            iou_threshold: env_or("IOU_THRESHOLD", defaults.iou_threshold),
            input_size: (
                env_or("INPUT_WIDTH", defaults.input_size.0),
                env_or("INPUT_HEIGHT", defaults.input_size.1),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        let thresholds = [
            ("obj_threshold", self.obj_threshold),
            ("cls_threshold", self.cls_threshold),
            ("iou_threshold", self.iou_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(InferenceError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            return Err(InferenceError::InvalidConfig(format!(
                "input size must be non-zero, got {}x{}",
                self.input_size.0, self.input_size.1
            )));
        }

        Ok(())
    }
}
