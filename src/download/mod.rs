//! Timed in-memory downloads and their aggregation.
//!
//! This module fetches resources over HTTP/HTTPS, measures how long each one
//! takes from request to last byte, and collects those timings in a shared
//! [`DownloadReport`].
//!
//! # Features
//!
//! - Whole-body in-memory fetches (nothing is written to disk)
//! - Bounded worker pools with a join barrier per phase
//! - Concurrent-safe, append-only timing sequences
//! - Fail-fast: the first failed download aborts its phase
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use iiif_timer::download::{DownloadReport, DownloadTask, FetchKind, HttpClient, WorkerPool};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let report = Arc::new(DownloadReport::new());
//! let tasks = DownloadTask::batch(
//!     ["https://example.com/thumb/1.jpg", "https://example.com/thumb/2.jpg"],
//!     FetchKind::Thumbnail,
//! );
//! WorkerPool::new(2)?.run(tasks, &client, &report).await?;
//! println!("{:?}", report.thumbnail_times());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod pool;
mod report;
mod task;

pub use client::{HttpClient, TimedBody};
pub use error::DownloadError;
pub use pool::{DEFAULT_THREAD_COUNT, PhaseOutcome, PoolError, WorkerPool};
pub use report::{DownloadReport, FetchKind, RunSummary};
pub use task::DownloadTask;
