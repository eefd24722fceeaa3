// crates/client/src/streams/manager.rs
//! Owner of all open job status streams.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use demetsiiify_types::JobId;

use super::types::{JobStream, JobStreamSource, StreamEnd, StreamEvent, StreamId};

/// Capacity of the channel between stream tasks and the monitor.
const EVENT_BUFFER: usize = 256;

struct StreamHandle {
    id: StreamId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Keeps at most one status stream per job.
///
/// A stream is closed when its job reaches a terminal status (the task stops
/// by itself and [`release`](Self::release) drops the handle) or when the job
/// is dismissed ([`close`](Self::close)). Dropping the manager closes all of
/// them.
///
/// Every event carries the [`StreamId`] of the stream that produced it.
/// Events still queued from a closed stream do not match
/// [`is_current`](Self::is_current) and must be discarded.
pub struct StreamManager {
    source: Arc<dyn JobStreamSource>,
    events_tx: mpsc::Sender<StreamEvent>,
    handles: HashMap<JobId, StreamHandle>,
    next_id: StreamId,
}

impl StreamManager {
    /// Create a manager and the receiving end of its event channel.
    pub fn new(source: Arc<dyn JobStreamSource>) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        (
            Self {
                source,
                events_tx,
                handles: HashMap::new(),
                next_id: 1,
            },
            events_rx,
        )
    }

    /// Open the stream for `job_id`. Returns `None` if one is already open.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(&mut self, job_id: &str) -> Option<StreamId> {
        if self.handles.contains_key(job_id) {
            debug!(job_id, "stream already open");
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;

        let cancel = CancellationToken::new();
        let stream = self.source.open(job_id);
        let task = tokio::spawn(pump(
            job_id.to_string(),
            id,
            stream,
            cancel.clone(),
            self.events_tx.clone(),
        ));
        self.handles
            .insert(job_id.to_string(), StreamHandle { id, cancel, task });
        debug!(job_id, stream = id, open = self.handles.len(), "stream opened");
        Some(id)
    }

    /// Tear down the stream for `job_id`. Returns `false` if none was open.
    pub fn close(&mut self, job_id: &str) -> bool {
        let Some(handle) = self.handles.remove(job_id) else {
            return false;
        };
        handle.cancel.cancel();
        handle.task.abort();
        debug!(job_id, stream = handle.id, open = self.handles.len(), "stream closed");
        true
    }

    /// Forget the handle of a stream that ended by itself.
    ///
    /// Only releases the handle if `stream` is still the open stream of
    /// `job_id`; returns `false` otherwise.
    pub fn release(&mut self, job_id: &str, stream: StreamId) -> bool {
        if !self.is_current(job_id, stream) {
            return false;
        }
        self.close(job_id)
    }

    /// Whether `stream` is the currently open stream of `job_id`.
    pub fn is_current(&self, job_id: &str, stream: StreamId) -> bool {
        self.handles.get(job_id).is_some_and(|h| h.id == stream)
    }

    pub fn is_open(&self, job_id: &str) -> bool {
        self.handles.contains_key(job_id)
    }

    pub fn open_count(&self) -> usize {
        self.handles.len()
    }

    pub fn open_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.handles.keys().map(String::as_str)
    }

    pub fn close_all(&mut self) {
        for (job_id, handle) in self.handles.drain() {
            handle.cancel.cancel();
            handle.task.abort();
            debug!(job_id = %job_id, stream = handle.id, "stream closed");
        }
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Forward snapshots from `stream` until it ends, turns terminal, or is
/// cancelled. Nothing is read after a terminal snapshot.
async fn pump(
    job_id: JobId,
    id: StreamId,
    mut stream: JobStream,
    cancel: CancellationToken,
    events_tx: mpsc::Sender<StreamEvent>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = stream.next() => next,
        };

        let ended = match next {
            Some(Ok(job)) => {
                let terminal = job.is_terminal();
                let event = StreamEvent::Snapshot {
                    job_id: job_id.clone(),
                    stream: id,
                    job,
                };
                if events_tx.send(event).await.is_err() {
                    return;
                }
                if !terminal {
                    continue;
                }
                StreamEnd::Terminal
            }
            Some(Err(e)) => {
                warn!(job_id = %job_id, error = %e, "job stream failed");
                StreamEnd::Failed(e.to_string())
            }
            None => {
                debug!(job_id = %job_id, "job stream closed by server");
                StreamEnd::Exhausted
            }
        };

        let _ = events_tx
            .send(StreamEvent::Ended {
                job_id,
                stream: id,
                reason: ended,
            })
            .await;
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use demetsiiify_types::{Job, JobStatus};
    use tokio_stream::wrappers::UnboundedReceiverStream;

    use crate::error::ClientError;

    type Feed = mpsc::UnboundedSender<Result<Job, ClientError>>;

    /// Source whose streams are fed by the test through channels.
    #[derive(Default)]
    struct ChannelSource {
        pending: Mutex<HashMap<String, mpsc::UnboundedReceiver<Result<Job, ClientError>>>>,
        opened: Mutex<Vec<String>>,
    }

    impl ChannelSource {
        fn feed(&self, job_id: &str) -> Feed {
            let (tx, rx) = mpsc::unbounded_channel();
            self.pending.lock().unwrap().insert(job_id.to_string(), rx);
            tx
        }
    }

    impl JobStreamSource for ChannelSource {
        fn open(&self, job_id: &str) -> JobStream {
            self.opened.lock().unwrap().push(job_id.to_string());
            let rx = self
                .pending
                .lock()
                .unwrap()
                .remove(job_id)
                .expect("feed registered before open");
            UnboundedReceiverStream::new(rx).boxed()
        }
    }

    async fn recv(rx: &mut mpsc::Receiver<StreamEvent>) -> StreamEvent {
        tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("timeout waiting for stream event")
            .expect("channel closed")
    }

    async fn assert_silent(rx: &mut mpsc::Receiver<StreamEvent>) {
        let res = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(res.is_err(), "unexpected event: {res:?}");
    }

    #[tokio::test]
    async fn test_forwards_until_terminal() {
        let source = Arc::new(ChannelSource::default());
        let feed = source.feed("a");
        let (mut manager, mut rx) = StreamManager::new(source.clone());
        let id = manager.open("a").unwrap();

        feed.send(Ok(Job::new("a", JobStatus::Started))).unwrap();
        feed.send(Ok(Job::new("a", JobStatus::Finished))).unwrap();
        feed.send(Ok(Job::new("a", JobStatus::Started))).unwrap();

        assert_eq!(
            recv(&mut rx).await,
            StreamEvent::Snapshot { job_id: "a".into(), stream: id, job: Job::new("a", JobStatus::Started) }
        );
        assert_eq!(
            recv(&mut rx).await,
            StreamEvent::Snapshot { job_id: "a".into(), stream: id, job: Job::new("a", JobStatus::Finished) }
        );
        assert_eq!(
            recv(&mut rx).await,
            StreamEvent::Ended { job_id: "a".into(), stream: id, reason: StreamEnd::Terminal }
        );
        assert_silent(&mut rx).await;

        assert!(manager.release("a", id));
        assert_eq!(manager.open_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_status_is_terminal() {
        let source = Arc::new(ChannelSource::default());
        let feed = source.feed("a");
        let (mut manager, mut rx) = StreamManager::new(source.clone());
        let id = manager.open("a").unwrap();

        feed.send(Ok(Job::new("a", JobStatus::Failed))).unwrap();
        assert!(matches!(recv(&mut rx).await, StreamEvent::Snapshot { .. }));
        assert_eq!(
            recv(&mut rx).await,
            StreamEvent::Ended { job_id: "a".into(), stream: id, reason: StreamEnd::Terminal }
        );
    }

    #[tokio::test]
    async fn test_one_stream_per_job() {
        let source = Arc::new(ChannelSource::default());
        let _feed = source.feed("a");
        let (mut manager, _rx) = StreamManager::new(source.clone());
        assert!(manager.open("a").is_some());
        assert!(manager.open("a").is_none());
        assert_eq!(manager.open_count(), 1);
        assert_eq!(source.opened.lock().unwrap().as_slice(), &["a".to_string()]);
    }

    #[tokio::test]
    async fn test_close_stops_forwarding() {
        let source = Arc::new(ChannelSource::default());
        let feed = source.feed("a");
        let (mut manager, mut rx) = StreamManager::new(source.clone());
        manager.open("a");

        assert!(manager.close("a"));
        assert!(!manager.is_open("a"));
        assert!(!manager.close("a"));

        let _ = feed.send(Ok(Job::new("a", JobStatus::Started)));
        assert_silent(&mut rx).await;
        assert!(feed.is_closed(), "source stream should be dropped after close");
    }

    #[tokio::test]
    async fn test_exhausted_and_failed_streams() {
        let source = Arc::new(ChannelSource::default());
        let feed_a = source.feed("a");
        let feed_b = source.feed("b");
        let (mut manager, mut rx) = StreamManager::new(source.clone());
        let id = manager.open("a").unwrap();
        drop(feed_a);
        assert_eq!(
            recv(&mut rx).await,
            StreamEvent::Ended { job_id: "a".into(), stream: id, reason: StreamEnd::Exhausted }
        );

        manager.open("b");
        let bad_json = serde_json::from_str::<Job>("{").unwrap_err();
        feed_b.send(Err(ClientError::Decode(bad_json))).unwrap();
        match recv(&mut rx).await {
            StreamEvent::Ended { job_id, reason: StreamEnd::Failed(message), .. } => {
                assert_eq!(job_id, "b");
                assert!(message.contains("Malformed job payload"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reopened_stream_gets_new_id() {
        let source = Arc::new(ChannelSource::default());
        let old_feed = source.feed("a");
        let (mut manager, mut rx) = StreamManager::new(source.clone());
        let old = manager.open("a").unwrap();

        old_feed.send(Ok(Job::new("a", JobStatus::Started))).unwrap();
        drop(old_feed);
        let stale = recv(&mut rx).await;
        assert_eq!(stale.stream(), old);

        assert!(manager.close("a"));
        let _new_feed = source.feed("a");
        let new = manager.open("a").unwrap();
        assert_ne!(old, new);
        assert!(manager.is_current("a", new));
        assert!(!manager.is_current("a", old));

        assert!(!manager.release("a", old));
        assert!(manager.is_open("a"));
        assert!(manager.release("a", new));
        assert!(!manager.is_open("a"));
    }

    #[tokio::test]
    async fn test_drop_closes_all_streams() {
        let source = Arc::new(ChannelSource::default());
        let feed_a = source.feed("a");
        let feed_b = source.feed("b");
        let (mut manager, _rx) = StreamManager::new(source.clone());
        manager.open("a");
        manager.open("b");
        let mut ids: Vec<_> = manager.open_ids().map(str::to_string).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        drop(manager);
        tokio::time::timeout(Duration::from_millis(500), async {
            while !(feed_a.is_closed() && feed_b.is_closed()) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("streams should be torn down on drop");
    }
}
