pub mod nms;
pub mod post;

pub use nms::{iou, suppress};
pub use post::PostProcessor;
