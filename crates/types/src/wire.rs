// crates/types/src/wire.rs
//! Request and error bodies of the conversion service API.

use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Body of `POST /api/import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    /// METS document URL (or a DFG-Viewer URL pointing to one).
    pub url: String,
}

/// Body of `POST /api/tasks/notify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub recipient: String,
    pub jobs: Vec<JobId>,
}

/// Error body returned by the service.
///
/// `message` is set for expected, validated failures; `traceback` for
/// unexpected ones. Either may be absent when the body is not JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl ErrorBody {
    /// Parse a raw response body. Non-JSON bodies yield an empty `ErrorBody`.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_notify_request_serialize() {
        let req = NotifyRequest {
            recipient: "reader@example.org".into(),
            jobs: vec!["a".into(), "b".into()],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"recipient":"reader@example.org","jobs":["a","b"]}"#);
    }

    #[test]
    fn test_error_body_message() {
        let body = ErrorBody::from_body(r#"{"message":"Could not find METS at URL"}"#);
        assert_eq!(body.message.as_deref(), Some("Could not find METS at URL"));
        assert_eq!(body.traceback, None);
    }

    #[test]
    fn test_error_body_traceback() {
        let body = ErrorBody::from_body(r#"{"traceback":"Traceback (most recent call last):\n  ..."}"#);
        assert!(body.message.is_none());
        assert!(body.traceback.unwrap().starts_with("Traceback"));
    }

    #[test]
    fn test_error_body_non_json() {
        let body = ErrorBody::from_body("<html>502 Bad Gateway</html>");
        assert_eq!(body, ErrorBody::default());
    }
}
