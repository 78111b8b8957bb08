//! Data models for the Objectify client.

mod detection;
mod file;
pub(crate) mod number;
mod threshold;

pub use detection::{BoundingBox, Detection, DetectionResult};
pub use file::{LocalFile, PreviewUri};
pub use threshold::ConfidenceThreshold;
