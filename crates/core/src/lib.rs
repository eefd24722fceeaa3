// crates/core/src/lib.rs
//! Framework-free state of the demetsiiify job monitor.
//!
//! - [`store::JobMonitor`]: ordered jobs, cached snapshots, welcome flag
//! - [`view::JobView`]: per-job render model (progress ratio, viewer link)
//! - [`forms`]: submission and notification forms
//! - [`preferences`]: the persisted welcome-banner flag

pub mod diagnostic;
pub mod error;
pub mod forms;
pub mod paths;
pub mod preferences;
pub mod store;
pub mod validation;
pub mod view;

pub use diagnostic::ErrorDisplay;
pub use error::{PreferencesError, ValidationError};
pub use forms::{NotificationForm, NotificationPhase, SubmissionForm, SubmitFailure};
pub use preferences::{PreferenceStore, Preferences};
pub use store::{IgnoreReason, JobMonitor, UpdateOutcome};
pub use view::JobView;
