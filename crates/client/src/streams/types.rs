// crates/client/src/streams/types.rs
//! Types for per-job status streams.

use futures_util::stream::BoxStream;

use demetsiiify_types::{Job, JobId};

use crate::error::ClientError;

/// Identifies one opened stream. A job that is dismissed and created again
/// gets a new stream with a new id, so late events of the old one can be
/// told apart.
pub type StreamId = u64;

/// Snapshots of one job, in server-send order.
pub type JobStream = BoxStream<'static, Result<Job, ClientError>>;

/// Something that can open a status stream for a job id.
///
/// Implemented by [`ApiClient`](crate::ApiClient) over SSE; tests plug in
/// channel-backed sources.
pub trait JobStreamSource: Send + Sync {
    fn open(&self, job_id: &str) -> JobStream;
}

/// Why a stream task stopped on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// A `finished` or `failed` snapshot was delivered.
    Terminal,
    /// The server closed the stream before a terminal status.
    Exhausted,
    /// Transport or decode failure.
    Failed(String),
}

/// Message from a stream task to the monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Snapshot {
        job_id: JobId,
        stream: StreamId,
        job: Job,
    },
    Ended {
        job_id: JobId,
        stream: StreamId,
        reason: StreamEnd,
    },
}

impl StreamEvent {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Snapshot { job_id, .. } | Self::Ended { job_id, .. } => job_id,
        }
    }

    pub fn stream(&self) -> StreamId {
        match self {
            Self::Snapshot { stream, .. } | Self::Ended { stream, .. } => *stream,
        }
    }
}
