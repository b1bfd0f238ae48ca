use crate::tensor::{TensorData, TensorInfo, TensorView};

/// A loaded model the inference service can run.
///
/// Model loading, accelerator delegation and threading belong to the
/// implementation. The service only reads tensor metadata and calls
/// [`InferenceBackend::run`] once per frame.
pub trait InferenceBackend {
    /// Metadata of the model's image input tensor
    fn input_info(&self) -> &TensorInfo;

    /// Metadata of the model's detection output tensor
    fn output_info(&self) -> &TensorInfo;

    /// Run the model on one input buffer and return the raw output tensor.
    ///
    /// The input variant matches `input_info().tensor_type`: `F32` for
    /// float models, `I8`/`U8` for quantized ones.
    fn run(&mut self, input: TensorView<'_>) -> anyhow::Result<TensorData>;
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for Box<B> {
    fn input_info(&self) -> &TensorInfo {
        (**self).input_info()
    }

    fn output_info(&self) -> &TensorInfo {
        (**self).output_info()
    }

    fn run(&mut self, input: TensorView<'_>) -> anyhow::Result<TensorData> {
        (**self).run(input)
    }
}
