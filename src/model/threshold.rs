//! Confidence threshold sent along with each submission.

use std::fmt;

use super::number::to_fixed;
use crate::constants::{DEFAULT_CONFIDENCE, MAX_CONFIDENCE, MIN_CONFIDENCE};

/// Minimum score the service should report, always within
/// `[MIN_CONFIDENCE, MAX_CONFIDENCE]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ConfidenceThreshold(f64);

impl ConfidenceThreshold {
    /// Lowest selectable threshold.
    pub const MIN: Self = Self(MIN_CONFIDENCE);
    /// Highest selectable threshold.
    pub const MAX: Self = Self(MAX_CONFIDENCE);

    /// Create a threshold, clamping into range. NaN maps to the default.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE))
    }

    /// The threshold as a number.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Readout with two decimals, as shown next to the slider.
    pub fn readout(&self) -> String {
        to_fixed(self.0, 2)
    }

    /// Decimal text for the `conf` form field.
    pub fn to_form_value(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        Self(DEFAULT_CONFIDENCE)
    }
}

impl fmt::Display for ConfidenceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.readout())
    }
}
