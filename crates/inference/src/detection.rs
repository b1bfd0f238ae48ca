/// One decoded anchor that passed the confidence thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Box center and size in normalized `[0, 1]` model coordinates
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    /// Box corners in image pixels, clamped to the image
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// objectness * best class confidence
    pub score: f32,
    pub class_index: usize,
    /// `None` when the label lookup has no entry for `class_index`
    pub class_label: Option<String>,
}

impl Detection {
    /// Pixel-inclusive area: a box from 0 to 9 covers 10 pixels.
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1 + 1.0) * (self.y2 - self.y1 + 1.0)
    }

    pub fn label_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.class_label.as_deref().unwrap_or(placeholder)
    }
}
