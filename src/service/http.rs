//! reqwest-based client for the detection HTTP API.

use std::future::Future;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use web_time::Instant;

use super::{DetectionService, ServiceStatus};
use crate::error::ServiceError;
use crate::model::DetectionResult;
use crate::session::SubmitRequest;

/// Client for a detection service speaking multipart in, JSON out.
///
/// No timeout is configured: a hung service keeps the submission pending
/// until the transport gives up.
#[derive(Debug, Clone)]
pub struct HttpDetectionClient {
    client: Client,
    endpoint: Url,
}

impl HttpDetectionClient {
    /// Create a client posting to `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        log::info!("🌐 Detection client configured: endpoint={}", endpoint);
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Root of the service, where it reports its status.
    fn status_url(&self) -> Result<Url, ServiceError> {
        self.endpoint
            .join("/")
            .map_err(|e| ServiceError::Transport(format!("invalid status URL: {}", e)))
    }

    async fn post_image(&self, request: SubmitRequest) -> Result<DetectionResult, ServiceError> {
        let SubmitRequest {
            file, confidence, ..
        } = request;
        let started = Instant::now();

        log::info!(
            "📤 Uploading {} ({} bytes, {}) with conf={}",
            file.name(),
            file.len(),
            file.mime_type(),
            confidence.to_form_value()
        );

        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())?;
        let form = Form::new()
            .part("file", part)
            .text("conf", confidence.to_form_value());

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("📥 Detection service returned {}: {}", status, body);
            return Err(ServiceError::http(status.as_u16(), body));
        }

        let body = response.text().await?;
        let result = DetectionResult::from_json(&body).map_err(ServiceError::MalformedResponse)?;

        log::info!(
            "📥 {} detections in {:.0}ms",
            result.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(result)
    }

    async fn get_status(&self) -> Result<ServiceStatus, ServiceError> {
        let response = self.client.get(self.status_url()?).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::http(status.as_u16(), body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
    }
}

impl DetectionService for HttpDetectionClient {
    fn detect(
        &self,
        request: SubmitRequest,
    ) -> impl Future<Output = Result<DetectionResult, ServiceError>> {
        self.post_image(request)
    }

    fn status(&self) -> impl Future<Output = Result<ServiceStatus, ServiceError>> {
        self.get_status()
    }
}
