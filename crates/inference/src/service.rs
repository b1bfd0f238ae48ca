use crate::{
    backend::InferenceBackend,
    codec::{dequantize, quantize},
    config::InferenceConfig,
    detection::Detection,
    error::InferenceError,
    labels::LabelLookup,
    processing::{PostProcessor, suppress},
    tensor::{Quantization, TensorData, TensorInfo, TensorType, TensorView},
};
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use preprocess::{ColorFormat, CpuPreProcessor, Preprocess};
use std::time::Instant;

/// Runs frames through preprocessing, the engine, decoding and suppression.
///
/// Configuration is fixed at construction. Each call to [`InferenceService::infer`]
/// makes exactly one engine call and keeps no per-frame state afterwards.
pub struct InferenceService<B: InferenceBackend, L: LabelLookup> {
    backend: B,
    labels: L,
    config: InferenceConfig,
    preprocessor: CpuPreProcessor,
    postprocessor: PostProcessor,
    metrics: Metrics,
}

struct Metrics {
    duration: Histogram<f64>,
    runs: Counter<u64>,
    candidates: Counter<u64>,
    detections: Counter<u64>,
}

fn init_metrics(meter_name: &'static str) -> Metrics {
    let meter = global::meter(meter_name);
    let latency_buckets = [
        0.001, 0.002, 0.005, 0.01, 0.02, 0.03, 0.05, 0.075, 0.1, 0.15, 0.2, 0.5, 1.0,
    ];
    Metrics {
        duration: meter
            .f64_histogram("inference_duration_seconds")
            .with_description("Time to process a single frame (preprocess + infer + postprocess)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build(),
        runs: meter
            .u64_counter("inference_runs_total")
            .with_description("Total frames run through the inference service")
            .build(),
        candidates: meter
            .u64_counter("inference_candidates_total")
            .with_description("Anchors passing the confidence thresholds")
            .build(),
        detections: meter
            .u64_counter("inference_detections_total")
            .with_description("Detections remaining after suppression")
            .build(),
    }
}

impl<B: InferenceBackend, L: LabelLookup> InferenceService<B, L> {
    pub fn new(backend: B, labels: L, config: InferenceConfig) -> Result<Self, InferenceError> {
        config.validate()?;

        let input = backend.input_info();
        let output = backend.output_info();
        tracing::info!(
            input_type = ?input.tensor_type,
            input_shape = ?input.shape,
            output_type = ?output.tensor_type,
            output_shape = ?output.shape,
            "Inference service created"
        );

        let preprocessor = CpuPreProcessor::new(config.input_size);
        let postprocessor = PostProcessor::new(&config);
        Ok(Self {
            backend,
            labels,
            config,
            preprocessor,
            postprocessor,
            metrics: init_metrics("inference"),
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Detect objects in one letterboxed frame of `config.input_size`.
    pub fn infer(
        &mut self,
        pixels: &[u8],
        format: ColorFormat,
    ) -> Result<Vec<Detection>, InferenceError> {
        let start = Instant::now();

        let result = run_pipeline(
            &mut self.backend,
            &self.labels,
            &mut self.preprocessor,
            &self.postprocessor,
            self.config.iou_threshold,
            pixels,
            format,
        );

        self.metrics
            .duration
            .record(start.elapsed().as_secs_f64(), &[]);
        self.metrics.runs.add(1, &[]);

        let (detections, candidates) = result?;
        self.metrics.candidates.add(candidates as u64, &[]);
        self.metrics.detections.add(detections.len() as u64, &[]);

        Ok(detections)
    }
}

/// One-shot detection with an explicit configuration.
pub fn infer<B, L>(
    backend: &mut B,
    labels: &L,
    config: &InferenceConfig,
    pixels: &[u8],
    format: ColorFormat,
) -> Result<Vec<Detection>, InferenceError>
where
    B: InferenceBackend + ?Sized,
    L: LabelLookup + ?Sized,
{
    config.validate()?;
    let mut preprocessor = CpuPreProcessor::new(config.input_size);
    let postprocessor = PostProcessor::new(config);

    let (detections, _) = run_pipeline(
        backend,
        labels,
        &mut preprocessor,
        &postprocessor,
        config.iou_threshold,
        pixels,
        format,
    )?;
    Ok(detections)
}

#[tracing::instrument(skip_all, fields(pixel_bytes = pixels.len()))]
fn run_pipeline<B, L>(
    backend: &mut B,
    labels: &L,
    preprocessor: &mut CpuPreProcessor,
    postprocessor: &PostProcessor,
    iou_threshold: f32,
    pixels: &[u8],
    format: ColorFormat,
) -> Result<(Vec<Detection>, usize), InferenceError>
where
    B: InferenceBackend + ?Sized,
    L: LabelLookup + ?Sized,
{
    let (num_anchors, row_width) = output_layout(backend.output_info())?;

    let input = preprocessor.preprocess(pixels, format)?;
    let output = forward(backend, input)?;

    let candidates = postprocessor.decode_flat(&output, num_anchors, row_width, labels)?;
    let candidate_count = candidates.len();
    let detections = suppress(candidates, iou_threshold);

    tracing::debug!(
        candidates = candidate_count,
        detections = detections.len(),
        "Frame processed"
    );

    Ok((detections, candidate_count))
}

/// `(num_anchors, row_width)` from an output shape of `[anchors, row]` or `[1, anchors, row]`.
fn output_layout(info: &TensorInfo) -> Result<(usize, usize), InferenceError> {
    let (num_anchors, row_width) = match info.shape.as_slice() {
        [anchors, row] => (*anchors, *row),
        [1, anchors, row] => (*anchors, *row),
        other => return Err(InferenceError::InvalidOutputShape(other.to_vec())),
    };

    if row_width <= crate::processing::post::ROW_PREFIX {
        return Err(InferenceError::InvalidRowWidth(row_width));
    }
    if num_anchors.checked_mul(row_width).is_none() {
        return Err(InferenceError::InvalidOutputShape(info.shape.clone()));
    }

    Ok((num_anchors, row_width))
}

/// Run the engine in its declared numeric domain and bring the output back to `f32`.
fn forward<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    input: &[f32],
) -> Result<Vec<f32>, InferenceError> {
    let input_info = backend.input_info();
    let input_type = input_info.tensor_type;
    let declared_quant = input_info.quantization;
    let input_quant = match input_type {
        TensorType::Float32 | TensorType::Float16 => None,
        TensorType::Int8 | TensorType::UInt8 => {
            Some(require_quantization("input", input_type, declared_quant)?)
        }
        other => return Err(InferenceError::UnsupportedTensorType(other)),
    };

    let output_info = backend.output_info();
    let output_type = output_info.tensor_type;
    // Models that only declare input parameters share them with the output.
    let output_quant = output_info.quantization.or(declared_quant);
    if is_quantized(output_type) {
        require_quantization("output", output_type, output_quant)?;
    }

    let start = Instant::now();
    let output = match (input_type, input_quant) {
        (TensorType::Int8, Some(quant)) => {
            backend.run(TensorView::I8(&quantize::<i8>(input, quant)))?
        }
        (TensorType::UInt8, Some(quant)) => {
            backend.run(TensorView::U8(&quantize::<u8>(input, quant)))?
        }
        _ => backend.run(TensorView::F32(input))?,
    };
    tracing::debug!(elapsed = ?start.elapsed(), input_type = ?input_type, "Engine run complete");

    // The engine may hand back integers even when the output is declared as float.
    match output {
        TensorData::F32(values) => Ok(values),
        TensorData::I8(values) => {
            let quant = require_quantization("output", output_type, output_quant)?;
            Ok(dequantize(&values, quant))
        }
        TensorData::U8(values) => {
            let quant = require_quantization("output", output_type, output_quant)?;
            Ok(dequantize(&values, quant))
        }
    }
}

fn is_quantized(tensor_type: TensorType) -> bool {
    matches!(tensor_type, TensorType::Int8 | TensorType::UInt8)
}

fn require_quantization(
    tensor: &'static str,
    tensor_type: TensorType,
    quantization: Option<Quantization>,
) -> Result<Quantization, InferenceError> {
    quantization.ok_or(InferenceError::MissingQuantization {
        tensor,
        tensor_type,
    })
}
