//! Run configuration for a timing session.

use thiserror::Error;

use crate::download::DEFAULT_THREAD_COUNT;
use crate::tiles::{DEFAULT_TILE_SIZE, RatioRule};

/// Number of tiles OpenSeadragon requests for its first paint.
pub const INITIAL_TILE_COUNT: usize = 4;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid thread count {0}: must be at least 1")]
    ThreadCount(usize),

    #[error("invalid initial tile count {0}: must be at least 1")]
    InitialTileCount(usize),

    #[error("tile size must be positive")]
    TileSize,

    #[error("manifest identifier must not be empty")]
    EmptyManifestId,
}

/// Settings for one run of the download timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    /// IIIF server base URL; a trailing slash is optional.
    pub server: String,
    /// Manifest identifier, unencoded.
    pub manifest_id: String,
    /// Concurrent thumbnail downloads.
    pub thread_count: usize,
    /// Base tile size used for planning.
    pub tile_size: u32,
    /// How many planned tiles make up the viewer's initial paint.
    pub initial_tile_count: usize,
    /// Size token canonicalization rule.
    pub ratio_rule: RatioRule,
}

impl TimerConfig {
    /// Creates a configuration with the viewer defaults.
    #[must_use]
    pub fn new(server: impl Into<String>, manifest_id: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            manifest_id: manifest_id.into(),
            thread_count: DEFAULT_THREAD_COUNT,
            tile_size: DEFAULT_TILE_SIZE,
            initial_tile_count: INITIAL_TILE_COUNT,
            ratio_rule: RatioRule::default(),
        }
    }

    #[must_use]
    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    #[must_use]
    pub fn with_ratio_rule(mut self, ratio_rule: RatioRule) -> Self {
        self.ratio_rule = ratio_rule;
        self
    }

    /// Checks the values against the ranges the worker pools accept.
    ///
    /// The server URL is checked when the manifest URL is built.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manifest_id.is_empty() {
            return Err(ConfigError::EmptyManifestId);
        }
        if self.thread_count == 0 {
            return Err(ConfigError::ThreadCount(self.thread_count));
        }
        if self.initial_tile_count == 0 {
            return Err(ConfigError::InitialTileCount(self.initial_tile_count));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::TileSize);
        }
        Ok(())
    }
}
