//! Detection service boundary.
//!
//! The controller only knows the [`DetectionService`] trait; the HTTP client
//! in this module is the production implementation.

mod http;

use std::future::Future;

use serde::Deserialize;

use crate::error::ServiceError;
use crate::model::DetectionResult;
use crate::session::SubmitRequest;

pub use http::HttpDetectionClient;

/// Health report of the detection service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    /// Free-form status, `ok` when healthy
    pub status: String,
    /// Name of the loaded model, if reported
    #[serde(default)]
    pub model: Option<String>,
}

impl ServiceStatus {
    /// Whether the service reports itself healthy.
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Something that can run detection on an uploaded image.
pub trait DetectionService {
    /// Send one request and wait for its complete answer.
    fn detect(
        &self,
        request: SubmitRequest,
    ) -> impl Future<Output = Result<DetectionResult, ServiceError>>;

    /// Ask the service whether it is up.
    fn status(&self) -> impl Future<Output = Result<ServiceStatus, ServiceError>>;
}
