//! Form state for submitting imports and registering for notifications.
//!
//! Forms are controlled: the value lives here and a view renders it, feeding
//! edits back through the setters. Network calls happen elsewhere; a form
//! hands out a validated request from `begin_submit` and is told the
//! outcome through `finish_success` / `finish_failure`.

use demetsiiify_types::{ImportRequest, JobId, NotifyRequest};

use crate::diagnostic::ErrorDisplay;
use crate::error::ValidationError;
use crate::validation::{validate_recipient, validate_source_url};

/// Shown when a request failed without any response from the server.
pub const UNREACHABLE_MESSAGE: &str = "Could not reach the server, please try again later.";

/// How a submission failed on the server side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    /// Expected failure with a short, human readable message.
    Rejected(String),
    /// Unexpected failure with a full server traceback.
    Crashed(String),
    /// No usable response at all (connection refused, timeout, ...).
    Unreachable(String),
}

// =============================================================================
// Submission form
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    mets_url: String,
    error_message: Option<String>,
    diagnostic: Option<ErrorDisplay>,
    invalid: bool,
    is_loading: bool,
}

impl SubmissionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mets_url(&self) -> &str {
        &self.mets_url
    }

    /// Change handler for the URL input. Editing clears any inline error.
    pub fn set_url(&mut self, value: impl Into<String>) {
        self.mets_url = value.into();
        self.error_message = None;
        self.invalid = false;
    }

    pub fn validate(&self) -> Result<String, ValidationError> {
        validate_source_url(&self.mets_url)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Diagnostic display of an unexpected failure. Never shown together
    /// with an inline error message.
    pub fn diagnostic(&self) -> Option<&ErrorDisplay> {
        if self.error_message.is_some() {
            return None;
        }
        self.diagnostic.as_ref()
    }

    pub fn diagnostic_mut(&mut self) -> Option<&mut ErrorDisplay> {
        if self.error_message.is_some() {
            return None;
        }
        self.diagnostic.as_mut()
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Whether the submit control is disabled.
    pub fn is_disabled(&self) -> bool {
        self.invalid || self.error_message.is_some() || self.is_loading
    }

    /// Validate and mark the form as loading. An `Err` means no request may
    /// be sent.
    ///
    /// While a server message is shown the control stays disabled until the
    /// URL is edited or the error dismissed.
    pub fn begin_submit(&mut self) -> Result<ImportRequest, ValidationError> {
        if self.is_loading {
            return Err(ValidationError::InFlight);
        }
        if self.error_message.is_some() {
            return Err(ValidationError::Closed);
        }
        match self.validate() {
            Ok(url) => {
                self.is_loading = true;
                Ok(ImportRequest { url })
            }
            Err(e) => {
                self.invalid = true;
                Err(e)
            }
        }
    }

    pub fn finish_success(&mut self) {
        self.mets_url.clear();
        self.error_message = None;
        self.diagnostic = None;
        self.invalid = false;
        self.is_loading = false;
    }

    pub fn finish_failure(&mut self, failure: SubmitFailure) {
        self.is_loading = false;
        match failure {
            SubmitFailure::Rejected(message) => {
                self.diagnostic = None;
                self.error_message = Some(message);
            }
            SubmitFailure::Crashed(traceback) => {
                self.error_message = None;
                let url = (!self.mets_url.trim().is_empty()).then(|| self.mets_url.trim().to_string());
                self.diagnostic = Some(ErrorDisplay::new(url, traceback));
            }
            SubmitFailure::Unreachable(detail) => {
                tracing::error!(%detail, "import request got no response");
                self.diagnostic = None;
                self.error_message = Some(UNREACHABLE_MESSAGE.to_string());
            }
        }
    }

    /// Close the diagnostic display and re-enable the form.
    pub fn dismiss_error(&mut self) {
        self.error_message = None;
        self.diagnostic = None;
        self.invalid = false;
    }
}

// =============================================================================
// Notification form
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPhase {
    #[default]
    Collapsed,
    Editing,
    Submitted,
    Dismissed,
}

/// One-shot opt-in for e-mail notification about the current jobs.
#[derive(Debug, Clone, Default)]
pub struct NotificationForm {
    phase: NotificationPhase,
    recipient: String,
    error_message: Option<String>,
    invalid: bool,
    is_loading: bool,
}

impl NotificationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> NotificationPhase {
        self.phase
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_disabled(&self) -> bool {
        self.invalid || self.error_message.is_some() || self.is_loading
    }

    /// The form is only offered while there are jobs to be notified about.
    pub fn is_visible(&self, has_jobs: bool) -> bool {
        has_jobs && self.phase != NotificationPhase::Dismissed
    }

    /// Expand the opt-in checkbox into the address input.
    pub fn open(&mut self) -> bool {
        if self.phase != NotificationPhase::Collapsed {
            return false;
        }
        self.phase = NotificationPhase::Editing;
        true
    }

    pub fn set_recipient(&mut self, value: impl Into<String>) {
        self.recipient = value.into();
        self.error_message = None;
        self.invalid = false;
    }

    pub fn begin_submit(&mut self, job_ids: &[JobId]) -> Result<NotifyRequest, ValidationError> {
        if self.phase != NotificationPhase::Editing {
            return Err(ValidationError::Closed);
        }
        if self.is_loading {
            return Err(ValidationError::InFlight);
        }
        if job_ids.is_empty() {
            return Err(ValidationError::NoJobs);
        }
        match validate_recipient(&self.recipient) {
            Ok(recipient) => {
                self.is_loading = true;
                Ok(NotifyRequest {
                    recipient,
                    jobs: job_ids.to_vec(),
                })
            }
            Err(e) => {
                self.invalid = true;
                Err(e)
            }
        }
    }

    pub fn finish_success(&mut self) {
        self.is_loading = false;
        self.error_message = None;
        self.phase = NotificationPhase::Submitted;
    }

    /// Stay in the editing phase and show the server's message.
    pub fn finish_failure(&mut self, message: impl Into<String>) {
        self.is_loading = false;
        self.error_message = Some(message.into());
    }

    /// Decline notifications. Only possible before opting in.
    pub fn dismiss(&mut self) -> bool {
        if self.phase != NotificationPhase::Collapsed {
            return false;
        }
        self.phase = NotificationPhase::Dismissed;
        true
    }
}
