// crates/client/src/lib.rs
//! Client side of the demetsiiify conversion service.
//!
//! [`ApiClient`] talks HTTP, [`StreamManager`] keeps one server-sent event
//! stream per unsettled job, and [`Monitor`] ties both to the state in
//! `demetsiiify-core`.

pub mod api;
pub mod config;
pub mod error;
pub mod monitor;
pub mod sse;
pub mod streams;

pub use api::ApiClient;
pub use config::{ClientConfig, DEFAULT_SERVER_URL};
pub use error::{ActionError, ClientError};
pub use monitor::{Monitor, MonitorEvent};
pub use streams::{JobStream, JobStreamSource, StreamEnd, StreamEvent, StreamId, StreamManager};
