//! Application state of the job monitor.
//!
//! One `JobMonitor` per session holds the ordered job list, the last known
//! snapshot of each job and the welcome banner flag. It is only mutated
//! through the named operations below, so every state transition can be
//! exercised without a renderer.

use std::collections::HashMap;

use demetsiiify_types::{Job, JobId};

use crate::error::PreferencesError;
use crate::preferences::PreferenceStore;
use crate::view::JobView;

/// Why an update was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The job was dismissed or never created.
    UnknownJob,
    /// The job already reached `finished` or `failed`.
    AlreadyTerminal,
    /// The payload carries a different job id than the stream it came from.
    IdMismatch,
}

/// Result of [`JobMonitor::apply_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// Applied, and the job is now finished or failed.
    Terminal,
    Ignored(IgnoreReason),
}

impl UpdateOutcome {
    pub fn is_terminal(self) -> bool {
        self == Self::Terminal
    }
}

#[derive(Debug)]
pub struct JobMonitor {
    /// Display order, oldest first.
    order: Vec<JobId>,
    jobs: HashMap<JobId, JobView>,
    show_welcome: bool,
    preferences: PreferenceStore,
}

impl JobMonitor {
    pub fn new(preferences: PreferenceStore) -> Self {
        Self {
            order: Vec::new(),
            jobs: HashMap::new(),
            show_welcome: !preferences.hide_welcome(),
            preferences,
        }
    }

    // -- Operations ------------------------------------------------------------

    /// Add a newly submitted job at the end of the list.
    ///
    /// Returns `false` without touching state if the id is already tracked.
    pub fn create_job(&mut self, job: Job) -> bool {
        if self.jobs.contains_key(&job.id) {
            tracing::warn!(job_id = %job.id, "job already tracked, ignoring duplicate");
            return false;
        }
        tracing::debug!(job_id = %job.id, status = %job.status, "job created");
        self.order.push(job.id.clone());
        self.jobs.insert(job.id.clone(), JobView::new(job));
        true
    }

    /// Replace the cached snapshot of `job_id` with one received from its
    /// stream.
    pub fn apply_update(&mut self, job_id: &str, job: Job) -> UpdateOutcome {
        if job.id != job_id {
            tracing::warn!(job_id, payload_id = %job.id, "stream payload for a different job");
            return UpdateOutcome::Ignored(IgnoreReason::IdMismatch);
        }
        let Some(view) = self.jobs.get_mut(job_id) else {
            tracing::debug!(job_id, "update for untracked job dropped");
            return UpdateOutcome::Ignored(IgnoreReason::UnknownJob);
        };
        if view.status().is_terminal() {
            tracing::debug!(job_id, "update after terminal status dropped");
            return UpdateOutcome::Ignored(IgnoreReason::AlreadyTerminal);
        }

        let terminal = job.is_terminal();
        let previous = view.replace(job);
        tracing::trace!(job_id, from = %previous.status, to = %view.status(), "job updated");
        if terminal {
            UpdateOutcome::Terminal
        } else {
            UpdateOutcome::Applied
        }
    }

    /// Remove a job from the list. Server-side work is not affected.
    ///
    /// Returns the last snapshot, or `None` if the id was not tracked.
    pub fn dismiss_job(&mut self, job_id: &str) -> Option<Job> {
        let view = self.jobs.remove(job_id)?;
        self.order.retain(|id| id != job_id);
        tracing::debug!(job_id, "job dismissed");
        Some(view.snapshot().clone())
    }

    /// Hide the welcome banner for this and all future sessions.
    pub fn dismiss_welcome(&mut self) -> Result<(), PreferencesError> {
        self.show_welcome = false;
        self.preferences.set_hide_welcome(true)
    }

    // -- Readers ---------------------------------------------------------------

    pub fn job_ids(&self) -> &[JobId] {
        &self.order
    }

    pub fn job(&self, job_id: &str) -> Option<&JobView> {
        self.jobs.get(job_id)
    }

    /// Jobs in display order.
    pub fn jobs(&self) -> impl Iterator<Item = &JobView> + '_ {
        self.order.iter().filter_map(|id| self.jobs.get(id))
    }

    /// Jobs still expecting stream updates.
    pub fn pending_jobs(&self) -> impl Iterator<Item = &JobView> + '_ {
        self.jobs().filter(|view| !view.status().is_terminal())
    }

    pub fn has_jobs(&self) -> bool {
        !self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn show_welcome(&self) -> bool {
        self.show_welcome
    }
}

impl Default for JobMonitor {
    fn default() -> Self {
        Self::new(PreferenceStore::in_memory())
    }
}
