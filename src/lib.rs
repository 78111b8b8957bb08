//! Objectify - detection session client
//!
//! Lets a user pick an image, send it to a remote object-detection service and
//! inspect the returned detections and annotated image. Runs in the browser
//! (WASM) and as a native command-line client.

pub mod config;
pub mod constants;
pub mod controller;
pub mod download;
pub mod error;
pub mod model;
pub mod platform;
pub mod presenter;
pub mod service;
pub mod session;

pub use config::ClientConfig;
pub use controller::DetectionController;
pub use error::{DownloadError, ServiceError, SubmitError, SubmitRejection};
pub use model::{BoundingBox, ConfidenceThreshold, Detection, DetectionResult, LocalFile, PreviewUri};
pub use presenter::{ResultView, present};
pub use service::{DetectionService, HttpDetectionClient};
pub use session::{Session, SubmitOutcome};

// Native front end adapters
#[cfg(not(target_arch = "wasm32"))]
pub mod native;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;
#[cfg(target_arch = "wasm32")]
mod wasm_file;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
