// crates/client/src/streams/mod.rs
//! Per-job status streams.
//!
//! Provides:
//! - `StreamManager`: opens, tracks and closes one stream task per job
//! - `JobStreamSource`: where streams come from (SSE in production)
//! - `StreamEvent`: what stream tasks report back to the monitor

pub mod manager;
pub mod types;

pub use manager::StreamManager;
pub use types::{JobStream, JobStreamSource, StreamEnd, StreamEvent, StreamId};
