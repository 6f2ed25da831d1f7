//! Timed replay of a viewer's first view of a manifest.
//!
//! The [`DownloadCoordinator`] fetches what Mirador and OpenSeadragon fetch
//! when a manifest is first opened, in strictly sequential phases:
//!
//! 1. [`Phase::FetchManifest`] - the manifest itself, timed on its own
//! 2. [`Phase::FetchThumbnails`] - every canvas thumbnail, on a bounded pool
//! 3. [`Phase::FetchInfo`] - the first image's `info.json` (not timed)
//! 4. [`Phase::FetchInitialTiles`] - the first tiles the deep-zoom viewer paints
//! 5. [`Phase::Report`] - actual (summed) and perceived (wall-clock) totals
//!
//! Each concurrent phase is fully joined before the next one starts. Any
//! failure aborts the run; nothing is retried and no partial report is
//! produced.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{ConfigError, TimerConfig};
use crate::download::{
    DownloadError, DownloadReport, DownloadTask, FetchKind, HttpClient, PoolError, RunSummary,
    WorkerPool,
};
use crate::manifest::{ImageDescriptor, ImageService, Manifest, ManifestError, manifest_url};
use crate::tiles::TilePlanner;

/// Stages of a timing run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    FetchManifest,
    FetchThumbnails,
    FetchInfo,
    FetchInitialTiles,
    Report,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchManifest => "fetch manifest",
            Self::FetchThumbnails => "fetch thumbnails",
            Self::FetchInfo => "fetch image info",
            Self::FetchInitialTiles => "fetch initial tiles",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}

/// Errors that abort a timing run.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{phase} failed: {source}")]
    Download {
        phase: Phase,
        #[source]
        source: DownloadError,
    },

    #[error("{phase} failed: {source}")]
    Pool {
        phase: Phase,
        #[source]
        source: PoolError,
    },

    #[error("{phase} failed: {source}")]
    Document {
        phase: Phase,
        #[source]
        source: ManifestError,
    },
}

impl CoordinatorError {
    /// The phase the run was in when it failed, if it got that far.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Config(_) => None,
            Self::Download { phase, .. } | Self::Pool { phase, .. } | Self::Document { phase, .. } => {
                Some(*phase)
            }
        }
    }
}

fn download_error(phase: Phase) -> impl FnOnce(DownloadError) -> CoordinatorError {
    move |source| CoordinatorError::Download { phase, source }
}

fn pool_error(phase: Phase) -> impl FnOnce(PoolError) -> CoordinatorError {
    move |source| CoordinatorError::Pool { phase, source }
}

fn document_error(phase: Phase) -> impl FnOnce(ManifestError) -> CoordinatorError {
    move |source| CoordinatorError::Document { phase, source }
}

/// Everything a completed run measured.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub manifest_url: String,
    pub image_service: String,
    pub image: ImageDescriptor,
    /// Tiles planned for the whole pyramid.
    pub planned_tiles: usize,
    /// Tiles fetched for the initial paint, in request order.
    pub initial_tiles: Vec<String>,
    pub summary: RunSummary,
}

/// Runs the phases of a timing session against one manifest.
#[derive(Debug)]
pub struct DownloadCoordinator {
    config: TimerConfig,
    client: HttpClient,
    planner: TilePlanner,
}

impl DownloadCoordinator {
    /// Creates a coordinator with a fresh HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Config`] for invalid settings, or a
    /// download error if the HTTP client cannot be built.
    pub fn new(config: TimerConfig) -> Result<Self, CoordinatorError> {
        let client = HttpClient::new().map_err(download_error(Phase::FetchManifest))?;
        Self::with_client(config, client)
    }

    /// Creates a coordinator sharing an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Config`] for invalid settings.
    pub fn with_client(config: TimerConfig, client: HttpClient) -> Result<Self, CoordinatorError> {
        config.validate()?;
        let planner = TilePlanner::new(config.tile_size).with_ratio_rule(config.ratio_rule);
        Ok(Self {
            config,
            client,
            planner,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Executes every phase in order and returns the measurements.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any phase; the run stops there.
    #[instrument(skip(self), fields(server = %self.config.server, manifest = %self.config.manifest_id))]
    pub async fn run(&self) -> Result<RunReport, CoordinatorError> {
        let run_started = Instant::now();
        let mut report = DownloadReport::new();

        let (manifest_url, manifest) = self.fetch_manifest(&mut report).await?;
        let report = Arc::new(report);

        self.fetch_thumbnails(&manifest, &report).await?;

        let (service, image) = self.fetch_info(&manifest).await?;

        let (service_base, identifier) = service.split();
        let tiles = self
            .planner
            .plan(service_base, &identifier, image.width, image.height);
        let planned_tiles = tiles.len();
        let initial_tiles: Vec<String> = tiles
            .into_iter()
            .take(self.config.initial_tile_count)
            .collect();

        self.fetch_initial_tiles(&initial_tiles, &report).await?;

        info!(phase = %Phase::Report, "generating download report");
        let summary = report.summarize(run_started.elapsed());
        info!(
            actual_ms = summary.actual_total_ms,
            perceived_ms = summary.perceived_total_ms,
            "run complete"
        );

        Ok(RunReport {
            manifest_url: manifest_url.to_string(),
            image_service: service.id().to_string(),
            image,
            planned_tiles,
            initial_tiles,
            summary,
        })
    }

    async fn fetch_manifest(
        &self,
        report: &mut DownloadReport,
    ) -> Result<(url::Url, Manifest), CoordinatorError> {
        let phase = Phase::FetchManifest;
        let url = manifest_url(&self.config.server, &self.config.manifest_id)
            .map_err(document_error(phase))?;
        info!(%phase, url = %url, "getting manifest");

        let (json, elapsed) = self
            .client
            .fetch_text(url.as_str())
            .await
            .map_err(download_error(phase))?;
        report.set_manifest_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));

        // Parsing is not part of the timed download
        let manifest: Manifest = json.parse().map_err(document_error(phase))?;
        Ok((url, manifest))
    }

    async fn fetch_thumbnails(
        &self,
        manifest: &Manifest,
        report: &Arc<DownloadReport>,
    ) -> Result<(), CoordinatorError> {
        let phase = Phase::FetchThumbnails;
        let urls = manifest.thumbnail_urls().map_err(document_error(phase))?;
        info!(%phase, count = urls.len(), threads = self.config.thread_count, "requesting thumbnail images");

        let pool = WorkerPool::new(self.config.thread_count).map_err(pool_error(phase))?;
        pool.run(
            DownloadTask::batch(urls, FetchKind::Thumbnail),
            &self.client,
            report,
        )
        .await
        .map_err(pool_error(phase))?;
        Ok(())
    }

    async fn fetch_info(
        &self,
        manifest: &Manifest,
    ) -> Result<(ImageService, ImageDescriptor), CoordinatorError> {
        let phase = Phase::FetchInfo;
        let service = manifest.image_service().map_err(document_error(phase))?;
        let info_url = service.info_url();
        info!(%phase, url = %info_url, "getting image info");

        let (json, _) = self
            .client
            .fetch_text(&info_url)
            .await
            .map_err(download_error(phase))?;
        let image: ImageDescriptor = json.parse().map_err(document_error(phase))?;
        debug!(width = image.width, height = image.height, "image dimensions");

        Ok((service, image))
    }

    async fn fetch_initial_tiles(
        &self,
        urls: &[String],
        report: &Arc<DownloadReport>,
    ) -> Result<(), CoordinatorError> {
        let phase = Phase::FetchInitialTiles;
        if urls.is_empty() {
            info!(%phase, "image fits in a single view; no tiles to request");
            return Ok(());
        }
        info!(%phase, count = urls.len(), "requesting initial tile images");

        let pool = WorkerPool::new(urls.len()).map_err(pool_error(phase))?;
        pool.run(
            DownloadTask::batch(urls.iter().cloned(), FetchKind::Tile),
            &self.client,
            report,
        )
        .await
        .map_err(pool_error(phase))?;
        Ok(())
    }
}
