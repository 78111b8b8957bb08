//! Detection results as returned by the detection service.

use serde::{Deserialize, Serialize};

use super::number::round_half_up;

/// Four coordinates locating a detection in source-image pixel space.
///
/// The service sends two corner points `[x1, y1, x2, y2]`. Which corner is the
/// minimum is not guaranteed, so nothing here assumes an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingBox(pub [f64; 4]);

impl BoundingBox {
    /// Create a bounding box from two corner points.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self([x1, y1, x2, y2])
    }

    /// Coordinates rounded to the nearest integer, halves rounding up.
    pub fn rounded(&self) -> [i64; 4] {
        self.0.map(|v| round_half_up(v) as i64)
    }

    /// Human readable form, e.g. `10, 21, 110, 211`.
    pub fn to_display_string(&self) -> String {
        self.rounded()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// One classified, localized object instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label, never empty
    pub class_name: String,
    /// Score in `[0, 1]`
    pub confidence: f64,
    /// Location in the source image
    #[serde(rename = "bbox")]
    pub bounding_box: BoundingBox,
}

impl Detection {
    /// Create a new detection.
    pub fn new(class_name: impl Into<String>, confidence: f64, bounding_box: BoundingBox) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
            bounding_box,
        }
    }

    /// Check the record against what the service promises.
    pub fn validate(&self) -> Result<(), String> {
        if self.class_name.trim().is_empty() {
            return Err("detection has an empty class name".to_string());
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence {} of '{}' is outside [0, 1]",
                self.confidence, self.class_name
            ));
        }
        if !self.bounding_box.is_finite() {
            return Err(format!("bounding box of '{}' is not finite", self.class_name));
        }
        Ok(())
    }
}

/// Structured response of one successful submission.
///
/// Values are only ever built whole, by deserializing and validating a
/// complete response body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Base64 encoded JPEG with the detections drawn in
    #[serde(rename = "annotated_image_base64", default)]
    pub annotated_image: Option<String>,
    /// Detections in the order the service produced them
    pub predictions: Vec<Detection>,
}

impl DetectionResult {
    /// Create a result from its parts.
    pub fn new(predictions: Vec<Detection>, annotated_image: Option<String>) -> Self {
        Self {
            annotated_image,
            predictions,
        }
    }

    /// Parse and validate a response body.
    pub fn from_json(body: &str) -> Result<Self, String> {
        let result: Self = serde_json::from_str(body).map_err(|e| e.to_string())?;
        result.validate()?;
        Ok(result)
    }

    /// Validate every prediction.
    pub fn validate(&self) -> Result<(), String> {
        for (i, detection) in self.predictions.iter().enumerate() {
            detection
                .validate()
                .map_err(|e| format!("prediction {}: {}", i, e))?;
        }
        Ok(())
    }

    /// The annotated image payload, treating an empty string as absent.
    pub fn annotated_image(&self) -> Option<&str> {
        self.annotated_image.as_deref().filter(|s| !s.is_empty())
    }

    /// Number of detections.
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    /// Whether the service found nothing.
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}
