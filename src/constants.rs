//! Global constants for the Objectify client

/// Detection endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/predict";

/// Environment variable that overrides the detection endpoint
pub const ENDPOINT_ENV_VAR: &str = "DETECTION_API_URL";

/// Lowest confidence threshold the user can pick
pub const MIN_CONFIDENCE: f64 = 0.05;

/// Highest confidence threshold the user can pick
pub const MAX_CONFIDENCE: f64 = 0.9;

/// Confidence threshold of a fresh session
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// Slider step for the confidence threshold
pub const CONFIDENCE_STEP: f64 = 0.01;

/// File name of the downloaded annotated image
pub const ANNOTATED_FILE_NAME: &str = "annotated.jpg";

/// MIME type of the annotated image returned by the service
pub const ANNOTATED_MIME: &str = "image/jpeg";

/// User-facing messages.
pub mod messages {
    /// Shown when submit is triggered before a file is chosen
    pub const NO_FILE_SELECTED: &str = "Choose an image first";

    /// Prefix of every failed submission notification
    pub const UPLOAD_FAILED_PREFIX: &str = "Upload failed: ";

    /// Fallback when the service gives no error text
    pub const GENERIC_SERVER_ERROR: &str = "Server error";

    /// Empty-state row of the detection table
    pub const NO_DETECTIONS: &str = "No detections";

    /// Annotated view placeholder before any result exists
    pub const NO_ANNOTATED_IMAGE: &str =
        "No annotated image yet — upload & predict to see results.";

    /// Submit button label while idle
    pub const SUBMIT_IDLE: &str = "Upload & Predict";

    /// Submit button label while a request is outstanding
    pub const SUBMIT_BUSY: &str = "Processing...";

    /// Prefix of a failed download notification
    pub const DOWNLOAD_FAILED_PREFIX: &str = "Download failed: ";
}
