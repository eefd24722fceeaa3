// crates/types/src/job.rs
//! Job snapshots as sent by the conversion service.

use serde::{Deserialize, Serialize};

/// Server-assigned job identifier. Opaque to the client.
pub type JobId = String;

/// Status of a conversion job on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Started,
    Finished,
    Failed,
}

impl JobStatus {
    /// `finished` and `failed` are final; the server sends nothing after them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holding institution of the digitised object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attribution {
    /// URL of the institution's logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Owner name. May contain inline HTML markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Snapshot of a conversion job.
///
/// The client never mutates a snapshot; every stream message replaces the
/// cached one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,

    /// Zero-based position in the server queue (queued jobs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,

    /// Number of images processed so far (started jobs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_image: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_images: Option<u64>,

    /// URL of the generated IIIF manifest (finished jobs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Location of the source METS document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metsurl: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,

    /// Server-side traceback (failed jobs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl Job {
    /// A bare snapshot with only identity and status set.
    pub fn new(id: impl Into<JobId>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            position: None,
            current_image: None,
            total_images: None,
            result: None,
            thumbnail: None,
            metsurl: None,
            label: None,
            attribution: None,
            traceback: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Started.is_terminal());
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_job_deserialize_queued() {
        let json = r#"{"id":"a1b2","status":"queued","position":3,"metsurl":"https://example.org/mets.xml"}"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "a1b2");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.position, Some(3));
        assert_eq!(job.metsurl.as_deref(), Some("https://example.org/mets.xml"));
        assert_eq!(job.result, None);
    }

    #[test]
    fn test_job_deserialize_finished_with_attribution() {
        let json = r#"{
            "id": "f00",
            "status": "finished",
            "result": "https://host/iiif/abc123/manifest",
            "label": "Goethe: Faust (Leipzig, 1808)",
            "attribution": {"logo": "https://lib.example/logo.png", "owner": "<b>SLUB</b>"}
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert!(job.is_terminal());
        let attribution = job.attribution.unwrap();
        assert_eq!(attribution.owner.as_deref(), Some("<b>SLUB</b>"));
    }

    #[test]
    fn test_job_deserialize_ignores_unknown_fields() {
        let json = r#"{"id":"x","status":"started","current_image":2,"total_images":8,"worker":"w-1"}"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.current_image, Some(2));
        assert_eq!(job.total_images, Some(8));
    }

    #[test]
    fn test_job_deserialize_rejects_unknown_status() {
        let json = r#"{"id":"x","status":"deferred"}"#;
        assert!(serde_json::from_str::<Job>(json).is_err());
    }

    #[test]
    fn test_job_serialize_skips_empty_fields() {
        let job = Job::new("j1", JobStatus::Started);
        let json = serde_json::to_string(&job).unwrap();
        assert_eq!(json, r#"{"id":"j1","status":"started"}"#);
    }
}
