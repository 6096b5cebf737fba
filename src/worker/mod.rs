//! Warehouse worker communication.
//!
//! The crate never talks to the warehouse directly. A companion
//! `querylog-worker` process owns authentication and the vendor SDK; this
//! module owns the transport: spawning the worker, correlating NDJSON
//! request/response envelopes, timeouts, and error classification.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    WorkerClient                      │
//! │  catalog.list_tables │ table.sample_rows             │
//! │  jobs.usage_history  │ query.dry_run │ query.execute │
//! └──────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//!              NDJSON over stdin/stdout
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::WorkerClient;
pub use error::{WorkerError, WorkerResult};
