use crate::{
    config::InferenceConfig, detection::Detection, error::InferenceError, labels::LabelLookup,
};
use ndarray::{ArrayView1, ArrayView2, s};

/// Box regression values plus objectness at the start of every anchor row.
pub const ROW_PREFIX: usize = 5;
const OBJECTNESS: usize = 4;

pub struct PostProcessor {
    pub obj_threshold: f32,
    pub cls_threshold: f32,
    pub image_width: u32,
    pub image_height: u32,
}

impl PostProcessor {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            obj_threshold: config.obj_threshold,
            cls_threshold: config.cls_threshold,
            image_width: config.input_size.0,
            image_height: config.input_size.1,
        }
    }

    /// Decode a flat `[num_anchors * row_width]` buffer.
    ///
    /// The buffer length and row width are checked before any row is read.
    pub fn decode_flat<L: LabelLookup + ?Sized>(
        &self,
        output: &[f32],
        num_anchors: usize,
        row_width: usize,
        labels: &L,
    ) -> Result<Vec<Detection>, InferenceError> {
        if row_width <= ROW_PREFIX {
            return Err(InferenceError::InvalidRowWidth(row_width));
        }

        let expected = num_anchors
            .checked_mul(row_width)
            .ok_or_else(|| InferenceError::InvalidOutputShape(vec![num_anchors, row_width]))?;
        if output.len() != expected {
            return Err(InferenceError::OutputSizeMismatch {
                anchors: num_anchors,
                row_width,
                expected,
                actual: output.len(),
            });
        }

        let view = ArrayView2::from_shape((num_anchors, row_width), output).map_err(|_| {
            InferenceError::OutputSizeMismatch {
                anchors: num_anchors,
                row_width,
                expected,
                actual: output.len(),
            }
        })?;

        Ok(self.decode(view, labels))
    }

    /// Decode `[num_anchors, 5 + num_classes]` rows into detections, in anchor order.
    #[tracing::instrument(skip_all, fields(anchors = output.nrows(), classes = output.ncols().saturating_sub(ROW_PREFIX)))]
    pub fn decode<L: LabelLookup + ?Sized>(
        &self,
        output: ArrayView2<f32>,
        labels: &L,
    ) -> Vec<Detection> {
        debug_assert!(output.ncols() > ROW_PREFIX, "row width validated upstream");

        let detections: Vec<Detection> = output
            .rows()
            .into_iter()
            .filter_map(|row| self.decode_row(row, labels))
            .collect();

        tracing::debug!(candidates = detections.len(), "Decoded anchors");
        detections
    }

    fn decode_row<L: LabelLookup + ?Sized>(
        &self,
        row: ArrayView1<f32>,
        labels: &L,
    ) -> Option<Detection> {
        let obj_conf = row[OBJECTNESS];
        if obj_conf < self.obj_threshold {
            return None;
        }

        let (class_index, cls_conf) = best_class(row.slice(s![ROW_PREFIX..]));
        if cls_conf < self.cls_threshold {
            return None;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let (x1, y1, x2, y2) = cxcywh_to_xyxy(cx, cy, w, h);
        let width = self.image_width as f32;
        let height = self.image_height as f32;

        let class_label = labels.label(class_index).map(str::to_string);
        if class_label.is_none() {
            tracing::debug!(class_index, "No label for class index");
        }

        Some(Detection {
            center_x: cx,
            center_y: cy,
            width: w,
            height: h,
            x1: x1.clamp(0.0, 1.0) * width,
            y1: y1.clamp(0.0, 1.0) * height,
            x2: x2.clamp(0.0, 1.0) * width,
            y2: y2.clamp(0.0, 1.0) * height,
            score: obj_conf * cls_conf,
            class_index,
            class_label,
        })
    }
}

/// Argmax over class scores; ties keep the lowest index.
#[inline]
fn best_class(scores: ArrayView1<f32>) -> (usize, f32) {
    let mut max_conf = f32::NEG_INFINITY;
    let mut class_idx = 0usize;
    for (c, &conf) in scores.iter().enumerate() {
        if conf > max_conf {
            max_conf = conf;
            class_idx = c;
        }
    }
    (class_idx, max_conf)
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}
