//! Session state and its transitions.
//!
//! [`Session`] is the single mutable record behind the client. Each user
//! operation maps to one method here; the methods are synchronous and free of
//! I/O so every transition can be unit tested without a UI or a network.
//! Side effects (creating and releasing previews, sending requests) are left
//! to the controller, which feeds their results back in.

use crate::error::{ServiceError, SubmitRejection};
use crate::model::{ConfidenceThreshold, DetectionResult, LocalFile, PreviewUri};

/// A selected file together with its live preview handle.
#[derive(Debug, Clone)]
struct Selection {
    file: LocalFile,
    preview: PreviewUri,
}

/// Everything one submission needs, captured when it starts.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// The file to upload
    pub file: LocalFile,
    /// Threshold at the moment of submission
    pub confidence: ConfidenceThreshold,
    /// Selection generation the request belongs to
    pub generation: u64,
}

/// What happened to a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The result was installed
    Installed {
        /// Number of detections in the new result
        detections: usize,
    },
    /// The selection changed while the request was outstanding, so the
    /// response was dropped
    Discarded,
}

/// State of one detection session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    selection: Option<Selection>,
    confidence: ConfidenceThreshold,
    result: Option<DetectionResult>,
    submitting: bool,
    generation: u64,
}

impl Session {
    /// Create an empty session with the default threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session starting from the given threshold.
    pub fn with_confidence(confidence: ConfidenceThreshold) -> Self {
        Self {
            confidence,
            ..Self::default()
        }
    }

    /// Currently selected file.
    pub fn selected_file(&self) -> Option<&LocalFile> {
        self.selection.as_ref().map(|s| &s.file)
    }

    /// Preview handle of the selected file.
    pub fn preview_uri(&self) -> Option<&PreviewUri> {
        self.selection.as_ref().map(|s| &s.preview)
    }

    /// Current confidence threshold.
    pub fn confidence_threshold(&self) -> ConfidenceThreshold {
        self.confidence
    }

    /// Result of the last successful submission, if still shown.
    pub fn detection_result(&self) -> Option<&DetectionResult> {
        self.result.as_ref()
    }

    /// Whether a request is outstanding.
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether a submission could start right now.
    pub fn can_submit(&self) -> bool {
        self.selection.is_some() && !self.submitting
    }

    /// Base64 annotated image of the current result.
    pub fn annotated_image(&self) -> Option<&str> {
        self.result.as_ref().and_then(DetectionResult::annotated_image)
    }

    /// Replace the selection and drop any shown result.
    ///
    /// Returns the superseded preview, which the caller must release.
    pub fn select_file(&mut self, file: LocalFile, preview: PreviewUri) -> Option<PreviewUri> {
        let previous = self.selection.replace(Selection { file, preview });
        self.result = None;
        self.generation += 1;
        previous.map(|s| s.preview)
    }

    /// Set the threshold, clamped into range. NaN leaves it unchanged.
    pub fn set_confidence_threshold(&mut self, value: f64) -> ConfidenceThreshold {
        if !value.is_nan() {
            self.confidence = ConfidenceThreshold::new(value);
        }
        self.confidence
    }

    /// Start a submission.
    ///
    /// On rejection the session is left exactly as it was.
    pub fn begin_submit(&mut self) -> Result<SubmitRequest, SubmitRejection> {
        if self.submitting {
            return Err(SubmitRejection::AlreadySubmitting);
        }
        let selection = self
            .selection
            .as_ref()
            .ok_or(SubmitRejection::NoFileSelected)?;

        let request = SubmitRequest {
            file: selection.file.clone(),
            confidence: self.confidence,
            generation: self.generation,
        };
        self.submitting = true;
        Ok(request)
    }

    /// Finish the outstanding submission with the service's answer.
    ///
    /// Success replaces the result in one step unless the selection changed
    /// since `generation` was issued. Failure leaves the result untouched.
    pub fn finish_submit(
        &mut self,
        generation: u64,
        outcome: Result<DetectionResult, ServiceError>,
    ) -> Result<SubmitOutcome, ServiceError> {
        self.submitting = false;
        let result = outcome?;

        if generation != self.generation {
            return Ok(SubmitOutcome::Discarded);
        }

        let detections = result.len();
        self.result = Some(result);
        Ok(SubmitOutcome::Installed { detections })
    }

    /// Clear file, preview and result. Returns the preview to release.
    pub fn reset(&mut self) -> Option<PreviewUri> {
        self.result = None;
        let previous = self.selection.take();
        if previous.is_some() {
            self.generation += 1;
        }
        previous.map(|s| s.preview)
    }

    /// Clear the result, keeping the selected file.
    pub fn clear_result(&mut self) {
        self.result = None;
    }

    /// Take the preview out when the session ends.
    pub(crate) fn take_preview(&mut self) -> Option<PreviewUri> {
        self.reset()
    }
}
