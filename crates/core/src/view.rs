//! Render model for a single job.
//!
//! Everything here is a pure function of the cached snapshot plus the queue
//! length captured when the view was created.

use std::sync::OnceLock;

use regex_lite::Regex;

use demetsiiify_types::{Job, JobStatus};

use crate::diagnostic::ErrorDisplay;

fn manifest_pattern() -> &'static Regex {
    static MANIFEST: OnceLock<Regex> = OnceLock::new();
    MANIFEST.get_or_init(|| Regex::new(r".*?/iiif/(.*?)/manifest").expect("manifest pattern is valid"))
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Fraction of work done, or `None` when no progress bar applies.
///
/// Queued jobs estimate progress from how far they moved up the queue since
/// `queue_length` was captured; started jobs report images converted.
pub fn completion_ratio(job: &Job, queue_length: u64) -> Option<f64> {
    match job.status {
        JobStatus::Queued => {
            let position = job.position.unwrap_or(0);
            let span = queue_length.saturating_add(1);
            let remaining = position.saturating_add(1);
            let moved = span.saturating_sub(remaining);
            Some(clamp_unit(moved as f64 / span as f64))
        }
        JobStatus::Started => match (job.current_image, job.total_images) {
            (Some(current), Some(total)) if total > 0 => {
                Some(clamp_unit(current as f64 / total as f64))
            }
            _ => Some(0.0),
        },
        JobStatus::Finished | JobStatus::Failed => None,
    }
}

fn clamp_unit(ratio: f64) -> f64 {
    ratio.clamp(0.0, 1.0)
}

/// Manifest id embedded in a result URL of the shape `.../iiif/{id}/manifest`.
pub fn manifest_id(result: &str) -> Option<&str> {
    manifest_pattern()
        .captures(result)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
}

/// Relative viewer location for a manifest result URL.
pub fn viewer_url(result: &str) -> Option<String> {
    manifest_id(result).map(|id| format!("/view/{id}"))
}

/// Remove inline markup from server-provided HTML snippets.
pub fn strip_tags(html: &str) -> String {
    tag_pattern().replace_all(html, "").trim().to_string()
}

/// A job as the monitor displays it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobView {
    snapshot: Job,
    queue_length: u64,
}

impl JobView {
    /// Create the view for a freshly submitted job. The queue length is fixed
    /// here and never updated afterwards.
    pub fn new(snapshot: Job) -> Self {
        let queue_length = snapshot.position.map_or(0, |p| p.saturating_add(1));
        Self {
            snapshot,
            queue_length,
        }
    }

    pub fn with_queue_length(snapshot: Job, queue_length: u64) -> Self {
        Self {
            snapshot,
            queue_length,
        }
    }

    pub fn snapshot(&self) -> &Job {
        &self.snapshot
    }

    pub fn id(&self) -> &str {
        &self.snapshot.id
    }

    pub fn status(&self) -> JobStatus {
        self.snapshot.status
    }

    pub fn queue_length(&self) -> u64 {
        self.queue_length
    }

    /// Swap in a newer snapshot, keeping the captured queue length.
    pub(crate) fn replace(&mut self, snapshot: Job) -> Job {
        std::mem::replace(&mut self.snapshot, snapshot)
    }

    pub fn show_progress_bar(&self) -> bool {
        matches!(self.snapshot.status, JobStatus::Queued | JobStatus::Started)
    }

    pub fn completion_ratio(&self) -> Option<f64> {
        completion_ratio(&self.snapshot, self.queue_length)
    }

    /// Viewer location; only finished jobs have one.
    pub fn viewer_url(&self) -> Option<String> {
        if self.snapshot.status != JobStatus::Finished {
            return None;
        }
        self.snapshot.result.as_deref().and_then(viewer_url)
    }

    /// Title line: label, else the METS URL, else the job id.
    pub fn headline(&self) -> &str {
        self.snapshot
            .label
            .as_deref()
            .or(self.snapshot.metsurl.as_deref())
            .unwrap_or(&self.snapshot.id)
    }

    /// Attribution owner as plain text.
    pub fn attribution_text(&self) -> Option<String> {
        self.snapshot
            .attribution
            .as_ref()
            .and_then(|a| a.owner.as_deref())
            .map(strip_tags)
            .filter(|s| !s.is_empty())
    }

    /// Selecting the result field selects all of it: returns the text and
    /// the selection range covering it.
    pub fn result_selection(&self) -> Option<(&str, std::ops::Range<usize>)> {
        if self.snapshot.status != JobStatus::Finished {
            return None;
        }
        self.snapshot
            .result
            .as_deref()
            .map(|result| (result, 0..result.len()))
    }

    /// Diagnostic display for failed jobs.
    pub fn diagnostic(&self) -> Option<ErrorDisplay> {
        if self.snapshot.status != JobStatus::Failed {
            return None;
        }
        Some(ErrorDisplay::new(
            self.snapshot.metsurl.clone(),
            self.snapshot.traceback.clone().unwrap_or_default(),
        ))
    }
}
