//! The job monitor controller.
//!
//! `Monitor` owns the application state, both forms, the API client and the
//! stream manager. It is the single place where state is mutated: user
//! actions call its methods, and stream updates are applied one at a time
//! from [`Monitor::next_event`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use demetsiiify_core::{
    JobMonitor, NotificationForm, PreferenceStore, PreferencesError, SubmissionForm,
    UpdateOutcome,
};
use demetsiiify_types::{Job, JobId, JobStatus, NotifyRequest};

use crate::api::ApiClient;
use crate::error::ActionError;
use crate::streams::{JobStreamSource, StreamEnd, StreamEvent, StreamManager};

/// What changed after processing one stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A non-terminal snapshot replaced the cached one.
    Updated { job_id: JobId },
    /// The job reached `finished` or `failed`; its stream is closed.
    Settled { job_id: JobId, status: JobStatus },
    /// The stream ended before the job settled. No retry is attempted.
    StreamLost { job_id: JobId, reason: StreamEnd },
}

impl MonitorEvent {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Updated { job_id }
            | Self::Settled { job_id, .. }
            | Self::StreamLost { job_id, .. } => job_id,
        }
    }
}

pub struct Monitor {
    api: ApiClient,
    state: JobMonitor,
    streams: StreamManager,
    events: mpsc::Receiver<StreamEvent>,
    form: SubmissionForm,
    notifications: NotificationForm,
    /// Recipient registered through the notification form. Jobs created
    /// afterwards are registered for the same address.
    subscription: Option<String>,
}

impl Monitor {
    /// Monitor whose job streams are read from the same service as `api`.
    pub fn new(api: ApiClient, preferences: PreferenceStore) -> Self {
        let source = Arc::new(api.clone());
        Self::with_source(api, source, preferences)
    }

    pub fn with_source(
        api: ApiClient,
        source: Arc<dyn JobStreamSource>,
        preferences: PreferenceStore,
    ) -> Self {
        let (streams, events) = StreamManager::new(source);
        Self {
            api,
            state: JobMonitor::new(preferences),
            streams,
            events,
            form: SubmissionForm::new(),
            notifications: NotificationForm::new(),
            subscription: None,
        }
    }

    // -- Accessors -------------------------------------------------------------

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &JobMonitor {
        &self.state
    }

    pub fn form(&self) -> &SubmissionForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SubmissionForm {
        &mut self.form
    }

    pub fn notifications(&self) -> &NotificationForm {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationForm {
        &mut self.notifications
    }

    pub fn subscription(&self) -> Option<&str> {
        self.subscription.as_deref()
    }

    pub fn is_streaming(&self, job_id: &str) -> bool {
        self.streams.is_open(job_id)
    }

    pub fn open_streams(&self) -> usize {
        self.streams.open_count()
    }

    // -- Actions ---------------------------------------------------------------

    /// Put `url` into the submission form and submit it.
    pub async fn submit_url(&mut self, url: &str) -> Result<JobId, ActionError> {
        self.form.set_url(url);
        self.submit().await
    }

    /// Submit the current form value.
    ///
    /// Invalid input is rejected before any request is made. On success the
    /// job is tracked and its stream opened.
    pub async fn submit(&mut self) -> Result<JobId, ActionError> {
        let request = self.form.begin_submit()?;
        match self.api.import(&request).await {
            Ok(job) => {
                self.form.finish_success();
                let job_id = job.id.clone();
                self.create_job(job);
                if let Some(recipient) = self.subscription.clone() {
                    self.register_follow_up(recipient, job_id.clone()).await;
                }
                Ok(job_id)
            }
            Err(e) => {
                let failure = e.classify();
                warn!(url = %request.url, error = %e, "import failed");
                self.form.finish_failure(failure.clone());
                Err(ActionError::Failed(failure))
            }
        }
    }

    /// Track a job and open its stream unless it has already settled.
    pub fn create_job(&mut self, job: Job) -> bool {
        let job_id = job.id.clone();
        let terminal = job.is_terminal();
        if !self.state.create_job(job) {
            return false;
        }
        if !terminal {
            self.streams.open(&job_id);
        }
        true
    }

    /// Submit the notification form for all currently tracked jobs.
    pub async fn register_notifications(&mut self) -> Result<(), ActionError> {
        let request = self.notifications.begin_submit(self.state.job_ids())?;
        match self.api.notify(&request).await {
            Ok(()) => {
                self.notifications.finish_success();
                info!(jobs = request.jobs.len(), "subscribed to notifications");
                self.subscription = Some(request.recipient);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "notification registration failed");
                self.notifications.finish_failure(e.user_message());
                Err(ActionError::Failed(e.classify()))
            }
        }
    }

    /// Register a job created after subscribing. Failures are only logged.
    async fn register_follow_up(&self, recipient: String, job_id: JobId) {
        let request = NotifyRequest {
            recipient,
            jobs: vec![job_id.clone()],
        };
        if let Err(e) = self.api.notify(&request).await {
            warn!(job_id = %job_id, error = %e, "could not register job for notification");
        }
    }

    /// Stop showing a job and close its stream. No-op for unknown ids.
    pub fn dismiss_job(&mut self, job_id: &str) -> Option<Job> {
        self.streams.close(job_id);
        self.state.dismiss_job(job_id)
    }

    pub fn dismiss_welcome(&mut self) -> Result<(), PreferencesError> {
        self.state.dismiss_welcome()
    }

    // -- Stream reconciliation -------------------------------------------------

    /// Wait for the next stream event that changes what is displayed.
    ///
    /// Returns `None` once no stream is open any more.
    pub async fn next_event(&mut self) -> Option<MonitorEvent> {
        loop {
            if self.streams.open_count() == 0 {
                return None;
            }
            let event = self.events.recv().await?;
            if let Some(change) = self.apply(event) {
                return Some(change);
            }
        }
    }

    fn apply(&mut self, event: StreamEvent) -> Option<MonitorEvent> {
        if !self.streams.is_current(event.job_id(), event.stream()) {
            debug!(job_id = event.job_id(), stream = event.stream(), "event from a closed stream dropped");
            return None;
        }
        match event {
            StreamEvent::Snapshot { job_id, stream, job } => {
                let status = job.status;
                match self.state.apply_update(&job_id, job) {
                    UpdateOutcome::Applied => Some(MonitorEvent::Updated { job_id }),
                    UpdateOutcome::Terminal => {
                        self.streams.release(&job_id, stream);
                        debug!(job_id = %job_id, %status, "job settled");
                        Some(MonitorEvent::Settled { job_id, status })
                    }
                    UpdateOutcome::Ignored(reason) => {
                        debug!(job_id = %job_id, ?reason, "stream update ignored");
                        None
                    }
                }
            }
            StreamEvent::Ended {
                job_id,
                stream,
                reason,
            } => {
                self.streams.release(&job_id, stream);
                if reason == StreamEnd::Terminal {
                    return None;
                }
                warn!(job_id = %job_id, ?reason, "job stream ended before the job settled");
                Some(MonitorEvent::StreamLost { job_id, reason })
            }
        }
    }

    /// Process stream events until every stream is closed, handing each
    /// change to `on_event`.
    pub async fn run_until_settled<F>(&mut self, mut on_event: F)
    where
        F: FnMut(&JobMonitor, &MonitorEvent),
    {
        while let Some(event) = self.next_event().await {
            on_event(&self.state, &event);
        }
    }
}
