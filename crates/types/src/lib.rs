// crates/types/src/lib.rs
//! Wire types shared between the job monitor crates.

pub mod job;
pub mod wire;

pub use job::{Attribution, Job, JobId, JobStatus};
pub use wire::{ErrorBody, ImportRequest, NotifyRequest};
