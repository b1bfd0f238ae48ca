use crate::detection::Detection;

/// Intersection over union with the pixel-inclusive (`+1`) area convention.
pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let inter_x1 = a.x1.max(b.x1);
    let inter_y1 = a.y1.max(b.y1);
    let inter_x2 = a.x2.min(b.x2);
    let inter_y2 = a.y2.min(b.y2);

    let inter_w = (inter_x2 - inter_x1 + 1.0).max(0.0);
    let inter_h = (inter_y2 - inter_y1 + 1.0).max(0.0);
    let intersection = inter_w * inter_h;

    intersection / (a.area() + b.area() - intersection)
}

/// Greedy class-agnostic non-maximum suppression.
///
/// Candidates are visited by descending score (ties keep their input order)
/// and kept unless they overlap an already kept box by strictly more than
/// `iou_threshold`. The result is sorted by descending score.
pub fn suppress(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let _s = common::span_debug!("suppress");

    // sort_by is stable
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let candidates = detections.len();
    let mut kept: Vec<Detection> = Vec::with_capacity(candidates);
    for det in detections {
        if !kept.iter().any(|k| iou(&det, k) > iou_threshold) {
            kept.push(det);
        }
    }

    tracing::debug!(candidates, kept = kept.len(), "Suppression complete");
    kept
}
