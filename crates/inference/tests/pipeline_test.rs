use inference::{
    ColorFormat, ErrorKind, InferenceBackend, InferenceConfig, InferenceError, InferenceService,
    LabelMap, Quantization, TensorData, TensorInfo, TensorType, TensorView, infer,
};

const LABELS: &[&str] = &["person", "bicycle", "car"];

/// The two-anchor, three-class output with identical boxes.
const TWO_ANCHORS: [f32; 16] = [
    0.5, 0.5, 0.2, 0.2, 0.9, 0.1, 0.8, 0.05, //
    0.5, 0.5, 0.2, 0.2, 0.9, 0.05, 0.1, 0.8,
];

/// Engine double that returns a canned output and records what it was fed.
struct MockBackend {
    input: TensorInfo,
    output: TensorInfo,
    response: Result<TensorData, String>,
    calls: usize,
    last_input: Option<TensorData>,
}

impl MockBackend {
    fn new(input: TensorInfo, output: TensorInfo, response: TensorData) -> Self {
        Self {
            input,
            output,
            response: Ok(response),
            calls: 0,
            last_input: None,
        }
    }

    fn float(tensor_type: TensorType, response: Vec<f32>) -> Self {
        Self::new(
            TensorInfo::new(tensor_type, [1, 100, 100, 3]),
            TensorInfo::new(TensorType::Float32, [1, 2, 8]),
            TensorData::F32(response),
        )
    }
}

impl InferenceBackend for MockBackend {
    fn input_info(&self) -> &TensorInfo {
        &self.input
    }

    fn output_info(&self) -> &TensorInfo {
        &self.output
    }

    fn run(&mut self, input: TensorView<'_>) -> anyhow::Result<TensorData> {
        self.calls += 1;
        assert_eq!(
            input.len(),
            self.input.shape.iter().product::<usize>(),
            "Engine input must match the declared input shape"
        );
        self.last_input = Some(match input {
            TensorView::F32(v) => TensorData::F32(v.to_vec()),
            TensorView::I8(v) => TensorData::I8(v.to_vec()),
            TensorView::U8(v) => TensorData::U8(v.to_vec()),
        });
        match &self.response {
            Ok(data) => Ok(data.clone()),
            Err(msg) => Err(anyhow::anyhow!(msg.clone())),
        }
    }
}

fn test_config() -> InferenceConfig {
    InferenceConfig {
        input_size: (100, 100),
        ..Default::default()
    }
}

fn gray_image() -> Vec<u8> {
    vec![0u8; 100 * 100 * 3]
}

fn quant(scale: f32, zero_point: i32) -> Quantization {
    Quantization::new(scale, zero_point).unwrap()
}

#[test]
fn test_float_end_to_end_keeps_first_of_tied_scores() {
    let mut backend = MockBackend::float(TensorType::Float32, TWO_ANCHORS.to_vec());

    let detections = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap();

    assert_eq!(backend.calls, 1, "Exactly one engine call per frame");
    assert_eq!(
        backend.last_input.as_ref().map(TensorData::len),
        Some(100 * 100 * 3)
    );
    assert_eq!(detections.len(), 1, "Identical boxes collapse to one");

    let det = &detections[0];
    assert_eq!(det.class_index, 1);
    assert_eq!(det.class_label.as_deref(), Some("bicycle"));
    assert!((det.score - 0.72).abs() < 1e-6, "score = {}", det.score);
    assert!((det.x1 - 40.0).abs() < 1e-4);
    assert!((det.y1 - 40.0).abs() < 1e-4);
    assert!((det.x2 - 60.0).abs() < 1e-4);
    assert!((det.y2 - 60.0).abs() < 1e-4);
}

#[test]
fn test_float16_uses_float_path() {
    let mut backend = MockBackend::float(TensorType::Float16, TWO_ANCHORS.to_vec());

    let detections = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap();

    assert_eq!(detections.len(), 1);
    assert!(matches!(backend.last_input, Some(TensorData::F32(_))));
}

#[test]
fn test_bgr_frame_is_normalized_as_rgb() {
    let mut backend = MockBackend::float(TensorType::Float32, TWO_ANCHORS.to_vec());
    // Pure red in BGR order.
    let pixels: Vec<u8> = [0u8, 0, 255].repeat(100 * 100);

    infer(&mut backend, LABELS, &test_config(), &pixels, ColorFormat::Bgr).unwrap();

    let Some(TensorData::F32(input)) = &backend.last_input else {
        panic!("Expected float input");
    };
    assert_eq!(input.len(), 100 * 100 * 3);
    assert_eq!(&input[..6], &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_int8_model_quantizes_and_dequantizes() {
    let output: Vec<i8> = vec![
        50, 50, 20, 20, 90, 10, 80, 5, //
        50, 50, 20, 20, 90, 5, 10, 80,
    ];
    let mut backend = MockBackend::new(
        TensorInfo::new(TensorType::Int8, [1, 100, 100, 3])
            .with_quantization(quant(1.0 / 255.0, -128)),
        TensorInfo::new(TensorType::Int8, [1, 2, 8]).with_quantization(quant(0.01, 0)),
        TensorData::I8(output),
    );

    let detections = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap();

    let Some(TensorData::I8(input)) = &backend.last_input else {
        panic!("Expected int8 input");
    };
    assert!(
        input.iter().all(|&q| q == -128),
        "Black pixels quantize to the zero point"
    );

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_index, 1);
    assert!((detections[0].score - 0.72).abs() < 1e-4);
}

#[test]
fn test_uint8_output_falls_back_to_input_quantization() {
    let output: Vec<u8> = vec![
        50, 50, 20, 20, 90, 5, 10, 80, //
        20, 20, 10, 10, 10, 90, 0, 0,
    ];
    let mut backend = MockBackend::new(
        TensorInfo::new(TensorType::UInt8, [1, 100, 100, 3]).with_quantization(quant(0.01, 0)),
        TensorInfo::new(TensorType::UInt8, [2, 8]),
        TensorData::U8(output),
    );
    let pixels = vec![255u8; 100 * 100 * 3];

    let detections =
        infer(&mut backend, LABELS, &test_config(), &pixels, ColorFormat::Rgb).unwrap();

    let Some(TensorData::U8(input)) = &backend.last_input else {
        panic!("Expected uint8 input");
    };
    assert!(input.iter().all(|&q| q == 100), "White pixels quantize to 1.0 / 0.01");

    // Second anchor has objectness 0.1 and is filtered before the class scan.
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_index, 2);
    assert_eq!(detections[0].class_label.as_deref(), Some("car"));
}

#[test]
fn test_unsupported_tensor_type_is_a_configuration_error() {
    let mut backend = MockBackend::float(TensorType::Int32, TWO_ANCHORS.to_vec());

    let err = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        InferenceError::UnsupportedTensorType(TensorType::Int32)
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(backend.calls, 0, "Engine must not run for unsupported types");
}

#[test]
fn test_quantized_model_without_parameters_is_rejected() {
    let mut backend = MockBackend::new(
        TensorInfo::new(TensorType::Int8, [1, 100, 100, 3]),
        TensorInfo::new(TensorType::Int8, [1, 2, 8]),
        TensorData::I8(vec![0; 16]),
    );

    let err = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        InferenceError::MissingQuantization { tensor: "input", .. }
    ));
    assert_eq!(backend.calls, 0);
}

#[test]
fn test_quantized_output_without_parameters_fails_before_running() {
    let mut backend = MockBackend::new(
        TensorInfo::new(TensorType::Float32, [1, 100, 100, 3]),
        TensorInfo::new(TensorType::Int8, [1, 2, 8]),
        TensorData::I8(vec![0; 16]),
    );

    let err = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        InferenceError::MissingQuantization {
            tensor: "output",
            tensor_type: TensorType::Int8
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(backend.calls, 0, "Engine must not run without output parameters");
}

#[test]
fn test_huge_declared_anchor_count_is_rejected() {
    let mut backend = MockBackend::new(
        TensorInfo::new(TensorType::Float32, [1, 100, 100, 3]),
        TensorInfo::new(TensorType::Float32, [1, usize::MAX / 2, 6]),
        TensorData::F32(vec![0.0; 6]),
    );

    let err = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap_err();

    assert!(matches!(err, InferenceError::InvalidOutputShape(_)));
    assert_eq!(backend.calls, 0);
}

#[test]
fn test_short_output_buffer_is_malformed_input() {
    let mut backend = MockBackend::float(TensorType::Float32, TWO_ANCHORS[..15].to_vec());

    let err = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        InferenceError::OutputSizeMismatch {
            anchors: 2,
            row_width: 8,
            expected: 16,
            actual: 15
        }
    ));
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_narrow_output_rows_fail_before_running() {
    let mut backend = MockBackend::new(
        TensorInfo::new(TensorType::Float32, [1, 100, 100, 3]),
        TensorInfo::new(TensorType::Float32, [1, 2, 5]),
        TensorData::F32(vec![0.0; 10]),
    );

    let err = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap_err();

    assert!(matches!(err, InferenceError::InvalidRowWidth(5)));
    assert_eq!(backend.calls, 0);
}

#[test]
fn test_wrong_image_size_is_malformed_input() {
    let mut backend = MockBackend::float(TensorType::Float32, TWO_ANCHORS.to_vec());

    let err = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &[0u8; 99],
        ColorFormat::Rgb,
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert!(err.to_string().contains("mismatch"));
    assert_eq!(backend.calls, 0);
}

#[test]
fn test_engine_failure_is_propagated_without_retry() {
    let mut backend = MockBackend::float(TensorType::Float32, Vec::new());
    backend.response = Err("delegate crashed".to_string());

    let err = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(err.to_string().contains("delegate crashed"));
    assert_eq!(backend.calls, 1);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut backend = MockBackend::float(TensorType::Float32, TWO_ANCHORS.to_vec());
    let config = InferenceConfig {
        obj_threshold: -0.1,
        ..test_config()
    };

    let err = infer(&mut backend, LABELS, &config, &gray_image(), ColorFormat::Rgb).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = InferenceService::new(backend, LABELS, config).err().unwrap();
    assert!(matches!(err, InferenceError::InvalidConfig(_)));
}

#[test]
fn test_service_repeated_frames_are_independent() {
    let backend = MockBackend::float(TensorType::Float32, TWO_ANCHORS.to_vec());
    let labels: LabelMap = [(1, "bicycle".to_string())].into_iter().collect();
    let mut service = InferenceService::new(backend, labels, test_config()).unwrap();

    let first = service.infer(&gray_image(), ColorFormat::Rgb).unwrap();
    let second = service.infer(&gray_image(), ColorFormat::Rgb).unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].class_label.as_deref(), Some("bicycle"));
    assert_eq!(service.backend().calls, 2);
    assert_eq!(service.config().iou_threshold, 0.45);
}

#[test]
fn test_service_reports_missing_labels_as_none() {
    let backend = MockBackend::float(TensorType::Float32, TWO_ANCHORS.to_vec());
    let mut service = InferenceService::new(backend, LabelMap::default(), test_config()).unwrap();

    let detections = service.infer(&gray_image(), ColorFormat::Rgb).unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_label, None);
}

#[test]
fn test_boxed_backend() {
    let mut backend: Box<dyn InferenceBackend> =
        Box::new(MockBackend::float(TensorType::Float32, TWO_ANCHORS.to_vec()));

    let detections = infer(
        &mut backend,
        LABELS,
        &test_config(),
        &gray_image(),
        ColorFormat::Rgb,
    )
    .unwrap();
    assert_eq!(detections.len(), 1);
}
