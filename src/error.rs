//! Error types for submissions, service calls and downloads.

use thiserror::Error;

use crate::constants::messages;

/// Why a submission was refused before any request was sent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    /// No file has been selected
    #[error("{}", messages::NO_FILE_SELECTED)]
    NoFileSelected,

    /// A request from this session is still outstanding
    #[error("A submission is already in progress")]
    AlreadySubmitting,
}

/// Failures talking to the detection service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The service answered with a non-success status
    #[error("{message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Body text, or a generic message when the body was empty
        message: String,
    },

    /// The request never produced a response
    #[error("{0}")]
    Transport(String),

    /// The response body did not have the expected structure
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Build an HTTP error, substituting the generic message for an empty body.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.trim().is_empty() {
            messages::GENERIC_SERVER_ERROR.to_string()
        } else {
            body
        };
        Self::Http { status, message }
    }

    /// Notification text shown to the user.
    pub fn user_message(&self) -> String {
        format!("{}{}", messages::UPLOAD_FAILED_PREFIX, self)
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Errors returned by the controller's submit operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Precondition failed, nothing was sent
    #[error(transparent)]
    Rejected(#[from] SubmitRejection),

    /// The request was sent and failed
    #[error(transparent)]
    Failed(#[from] ServiceError),
}

/// Errors materializing the annotated image.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The payload was not valid base64
    #[error("Annotated image is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A browser API refused the download
    #[error("Browser error: {0}")]
    Browser(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_keeps_body() {
        let err = ServiceError::http(500, "Server error");
        assert_eq!(err.user_message(), "Upload failed: Server error");

        let err = ServiceError::http(422, "cannot identify image file");
        assert_eq!(err.to_string(), "cannot identify image file");
    }

    #[test]
    fn test_http_error_empty_body_is_generic() {
        let err = ServiceError::http(502, "  ");
        assert_eq!(
            err,
            ServiceError::Http {
                status: 502,
                message: "Server error".to_string()
            }
        );
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(SubmitRejection::NoFileSelected.to_string(), "Choose an image first");
        let err: SubmitError = SubmitRejection::AlreadySubmitting.into();
        assert!(matches!(err, SubmitError::Rejected(SubmitRejection::AlreadySubmitting)));
    }
}
