// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Client-side validation failures. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a URL")]
    Empty,

    #[error("Not a valid http(s) URL: {input}")]
    MalformedUrl { input: String },

    #[error("Please enter an email address")]
    MissingRecipient,

    #[error("Not a valid email address: {input}")]
    MalformedEmail { input: String },

    #[error("A request is already in flight")]
    InFlight,

    #[error("The form is not accepting input")]
    Closed,

    #[error("There are no jobs to be notified about")]
    NoJobs,
}

/// Errors reading or writing the persisted preferences file.
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Permission denied accessing preferences: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error accessing preferences {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed preferences file {path}: {message}")]
    MalformedJson { path: PathBuf, message: String },
}

impl PreferencesError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::MalformedUrl {
            input: "foo bar".into(),
        };
        assert!(err.to_string().contains("foo bar"));
        assert_eq!(ValidationError::Empty.to_string(), "Please enter a URL");
    }

    #[test]
    fn test_preferences_error_io_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = PreferencesError::io("/test/prefs.json", io_err);
        assert!(matches!(err, PreferencesError::PermissionDenied { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout");
        let err = PreferencesError::io("/test/prefs.json", io_err);
        assert!(matches!(err, PreferencesError::Io { .. }));
        assert!(err.to_string().contains("/test/prefs.json"));
    }
}
