//! Client-side input validation for the submission and notification forms.

use std::sync::OnceLock;

use regex_lite::Regex;
use url::Url;

use crate::error::ValidationError;

/// Loose `local@domain.tld` shape, the same check a browser's
/// `type="email"` input performs.
fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern is valid")
    })
}

/// Validate a METS (or DFG-Viewer) URL. Returns the trimmed input.
pub fn validate_source_url(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let malformed = || ValidationError::MalformedUrl {
        input: trimmed.to_string(),
    };
    let url = Url::parse(trimmed).map_err(|_| malformed())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(malformed());
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(trimmed.to_string()),
        _ => Err(malformed()),
    }
}

/// Validate a notification recipient. Returns the trimmed address.
pub fn validate_recipient(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingRecipient);
    }
    if !email_pattern().is_match(trimmed) {
        return Err(ValidationError::MalformedEmail {
            input: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_string())
}
