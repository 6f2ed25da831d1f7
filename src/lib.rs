//! IIIF Timer Library
//!
//! This library times what an IIIF viewer downloads when a manifest is first
//! opened: the manifest, every canvas thumbnail, and the initial deep-zoom
//! tiles of the first image. The result is a baseline for image server changes.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`tiles`] - Tile pyramid planning in IIIF Image API URI syntax
//! - [`download`] - Timed in-memory fetches, worker pools and the timing report
//! - [`coordinator`] - Sequential download phases and the run summary
//! - [`manifest`] - Manifest, image service and `info.json` access
//! - [`query`] - Path queries over JSON documents
//! - [`config`] - Run configuration and validation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coordinator;
pub mod download;
pub mod manifest;
pub mod query;
pub mod tiles;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, INITIAL_TILE_COUNT, TimerConfig};
pub use coordinator::{CoordinatorError, DownloadCoordinator, Phase, RunReport};
pub use download::{
    DEFAULT_THREAD_COUNT, DownloadError, DownloadReport, DownloadTask, FetchKind, HttpClient,
    PoolError, RunSummary, WorkerPool,
};
pub use manifest::{ImageDescriptor, ImageService, Manifest, ManifestError, manifest_url};
pub use query::{JsonQuery, QueryError};
pub use tiles::{DEFAULT_TILE_SIZE, RatioRule, TileCandidate, TilePlanner, plan_tiles};
