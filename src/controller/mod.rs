//! Detection session controller.
//!
//! The controller owns the [`Session`] and performs the side effects around
//! each transition: preview handles, the service call, downloads and user
//! notifications. Operations take `&self` so a browser front end can share
//! the controller between event handlers while a submission is suspended.

#[cfg(test)]
mod tests;

use std::cell::{Ref, RefCell};

use crate::config::ClientConfig;
use crate::constants::{ANNOTATED_FILE_NAME, ANNOTATED_MIME, messages};
use crate::download::decode_annotated;
use crate::error::{DownloadError, ServiceError, SubmitError, SubmitRejection};
use crate::model::{ConfidenceThreshold, LocalFile};
use crate::platform::{ArtifactSink, Feedback, PreviewFactory};
use crate::presenter::{ResultView, present_session};
use crate::service::{DetectionService, ServiceStatus};
use crate::session::{Session, SubmitOutcome};

/// Sole owner of the session state; mediates every transition.
pub struct DetectionController<S> {
    session: RefCell<Session>,
    service: S,
    previews: Box<dyn PreviewFactory>,
    artifacts: Box<dyn ArtifactSink>,
    feedback: Box<dyn Feedback>,
}

impl<S: DetectionService> DetectionController<S> {
    /// Create a controller with an empty session.
    pub fn new(
        config: &ClientConfig,
        service: S,
        previews: Box<dyn PreviewFactory>,
        artifacts: Box<dyn ArtifactSink>,
        feedback: Box<dyn Feedback>,
    ) -> Self {
        Self {
            session: RefCell::new(Session::with_confidence(config.initial_confidence())),
            service,
            previews,
            artifacts,
            feedback,
        }
    }

    /// Read access to the session.
    pub fn session(&self) -> Ref<'_, Session> {
        self.session.borrow()
    }

    /// Presentation of the current state.
    pub fn view(&self) -> ResultView {
        present_session(&self.session.borrow())
    }

    /// Select a new file. `None` (nothing picked, empty drop) is ignored.
    pub fn select_file(&self, file: Option<LocalFile>) {
        let Some(file) = file else {
            log::debug!("📂 Empty selection ignored");
            return;
        };

        log::info!("📂 Selected {} ({} bytes)", file.name(), file.len());
        let preview = self.previews.create(&file);
        let superseded = self.session.borrow_mut().select_file(file, preview);
        if let Some(old) = superseded {
            self.previews.release(old);
        }
        self.changed();
    }

    /// Set the confidence threshold, clamped into range.
    pub fn set_confidence_threshold(&self, value: f64) -> ConfidenceThreshold {
        let effective = self.session.borrow_mut().set_confidence_threshold(value);
        log::debug!("🎚️ Confidence threshold: {}", effective);
        self.changed();
        effective
    }

    /// Submit the selected file to the detection service.
    ///
    /// Sends exactly one request unless a precondition fails. Failures are
    /// reported through [`Feedback::notify`] and leave the shown result
    /// untouched.
    pub async fn submit(&self) -> Result<SubmitOutcome, SubmitError> {
        let begun = self.session.borrow_mut().begin_submit();
        let request = match begun {
            Ok(request) => request,
            Err(rejection) => {
                match rejection {
                    SubmitRejection::NoFileSelected => {
                        log::warn!("🚫 Submit without a file");
                        self.feedback.notify(&rejection.to_string());
                    }
                    SubmitRejection::AlreadySubmitting => {
                        log::debug!("🚫 Submit ignored, request already in flight");
                    }
                }
                return Err(rejection.into());
            }
        };
        self.changed();

        let generation = request.generation;
        let response = self.service.detect(request).await;
        let finished = self.session.borrow_mut().finish_submit(generation, response);
        self.changed();

        match finished {
            Ok(outcome) => {
                match outcome {
                    SubmitOutcome::Installed { detections } => {
                        log::info!("✅ Installed result with {} detections", detections);
                    }
                    SubmitOutcome::Discarded => {
                        log::info!("🗑️ Response for a replaced selection discarded");
                    }
                }
                Ok(outcome)
            }
            Err(err) => {
                log::error!("❌ Detection failed: {}", err);
                self.feedback.notify(&err.user_message());
                Err(err.into())
            }
        }
    }

    /// Clear file, preview and result.
    pub fn reset(&self) {
        let released = self.session.borrow_mut().reset();
        if let Some(preview) = released {
            self.previews.release(preview);
        }
        log::debug!("🔄 Session reset");
        self.changed();
    }

    /// Clear the result, keeping the selected file.
    pub fn clear_result(&self) {
        self.session.borrow_mut().clear_result();
        log::debug!("🧹 Result cleared");
        self.changed();
    }

    /// Save the annotated image of the current result as `annotated.jpg`.
    ///
    /// Returns `Ok(None)` when there is nothing to download.
    pub fn download_annotated(&self) -> Result<Option<String>, DownloadError> {
        let payload = self
            .session
            .borrow()
            .annotated_image()
            .map(str::to_owned);
        let Some(payload) = payload else {
            log::debug!("💾 No annotated image to download");
            return Ok(None);
        };

        let saved = decode_annotated(&payload).and_then(|bytes| {
            self.artifacts
                .save(ANNOTATED_FILE_NAME, ANNOTATED_MIME, &bytes)
        });

        match saved {
            Ok(location) => Ok(Some(location)),
            Err(err) => {
                log::error!("❌ Download failed: {}", err);
                self.feedback
                    .notify(&format!("{}{}", messages::DOWNLOAD_FAILED_PREFIX, err));
                Err(err)
            }
        }
    }

    /// Ask the service for its status. Does not touch the session.
    pub async fn check_service(&self) -> Result<ServiceStatus, ServiceError> {
        let status = self.service.status().await;
        match &status {
            Ok(s) => log::info!("🩺 Service status: {} (model: {:?})", s.status, s.model),
            Err(e) => log::warn!("🩺 Service unreachable: {}", e),
        }
        status
    }

    fn changed(&self) {
        self.feedback.session_changed(&self.session.borrow());
    }
}

impl<S> Drop for DetectionController<S> {
    fn drop(&mut self) {
        if let Some(preview) = self.session.get_mut().take_preview() {
            self.previews.release(preview);
        }
    }
}
