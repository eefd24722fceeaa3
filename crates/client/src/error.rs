// crates/client/src/error.rs
use thiserror::Error;

use demetsiiify_core::forms::{SubmitFailure, UNREACHABLE_MESSAGE};
use demetsiiify_core::ValidationError;
use demetsiiify_types::ErrorBody;

use crate::sse::SseError;

/// Errors from the conversion service API layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("API error ({status}): {raw}")]
    Api {
        status: u16,
        /// Parsed error body; empty if the body was not JSON.
        body: ErrorBody,
        /// Raw response body for debugging.
        raw: String,
    },

    /// A success response or stream event did not contain a valid job.
    #[error("Malformed job payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The event stream violated its framing.
    #[error(transparent)]
    Stream(#[from] SseError),

    #[error("Invalid server URL {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
}

impl ClientError {
    /// Map a failed import onto what the submission form should display.
    pub fn classify(&self) -> SubmitFailure {
        match self {
            Self::Api { body, .. } => {
                if let Some(message) = &body.message {
                    SubmitFailure::Rejected(message.clone())
                } else if let Some(traceback) = &body.traceback {
                    SubmitFailure::Crashed(traceback.clone())
                } else {
                    SubmitFailure::Unreachable(self.to_string())
                }
            }
            _ => SubmitFailure::Unreachable(self.to_string()),
        }
    }

    /// Short message for forms that only show a single line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                body: ErrorBody {
                    message: Some(message),
                    ..
                },
                ..
            } => message.clone(),
            _ => UNREACHABLE_MESSAGE.to_string(),
        }
    }
}

/// Why a monitor action (import, notification registration) did not succeed.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Rejected locally; no request was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The request was sent and failed.
    #[error("request failed: {0:?}")]
    Failed(SubmitFailure),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(body: &str) -> ClientError {
        ClientError::Api {
            status: 400,
            body: ErrorBody::from_body(body),
            raw: body.to_string(),
        }
    }

    #[test]
    fn test_classify_message() {
        let err = api_error(r#"{"message":"Not a METS document"}"#);
        assert_eq!(err.classify(), SubmitFailure::Rejected("Not a METS document".into()));
        assert_eq!(err.user_message(), "Not a METS document");
    }

    #[test]
    fn test_classify_traceback() {
        let err = api_error(r#"{"traceback":"Traceback (most recent call last): ..."}"#);
        assert_eq!(
            err.classify(),
            SubmitFailure::Crashed("Traceback (most recent call last): ...".into())
        );
        assert_eq!(err.user_message(), UNREACHABLE_MESSAGE);
    }

    #[test]
    fn test_classify_empty_body() {
        let err = api_error("<html>Bad Gateway</html>");
        assert!(matches!(err.classify(), SubmitFailure::Unreachable(_)));
    }

    #[test]
    fn test_classify_decode() {
        let err: ClientError = serde_json::from_str::<demetsiiify_types::Job>("{}").unwrap_err().into();
        assert!(matches!(err.classify(), SubmitFailure::Unreachable(_)));
    }
}
