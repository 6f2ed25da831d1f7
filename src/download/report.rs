//! Timing accumulator shared by the download phases.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

/// What a download was fetched for; selects the report sequence it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchKind {
    Thumbnail,
    Tile,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thumbnail => f.write_str("thumbnail"),
            Self::Tile => f.write_str("tile"),
        }
    }
}

/// Download timings for one run, in milliseconds.
///
/// The manifest time is written once through `&mut self` before the report is
/// shared. The thumbnail and tile sequences are append-only and accept
/// concurrent appends through `&self`; they are read after the phase that
/// fills them has been joined.
#[derive(Debug, Default)]
pub struct DownloadReport {
    manifest_time: u64,
    thumbnail_times: Mutex<Vec<u64>>,
    tile_times: Mutex<Vec<u64>>,
}

impl DownloadReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records how long the manifest took to download.
    pub fn set_manifest_time(&mut self, millis: u64) {
        self.manifest_time = millis;
    }

    #[must_use]
    pub fn manifest_time(&self) -> u64 {
        self.manifest_time
    }

    /// Appends a thumbnail download time.
    pub fn add_thumbnail_time(&self, millis: u64) {
        push(&self.thumbnail_times, millis);
    }

    /// Appends a tile download time.
    pub fn add_tile_time(&self, millis: u64) {
        push(&self.tile_times, millis);
    }

    /// Appends a download time to the sequence for `kind`.
    pub fn add_time(&self, kind: FetchKind, millis: u64) {
        match kind {
            FetchKind::Thumbnail => self.add_thumbnail_time(millis),
            FetchKind::Tile => self.add_tile_time(millis),
        }
    }

    /// Snapshot of the thumbnail download times in completion order.
    #[must_use]
    pub fn thumbnail_times(&self) -> Vec<u64> {
        snapshot(&self.thumbnail_times)
    }

    /// Snapshot of the tile download times in completion order.
    #[must_use]
    pub fn tile_times(&self) -> Vec<u64> {
        snapshot(&self.tile_times)
    }

    /// Serialized cost of the run: manifest plus every individual download.
    #[must_use]
    pub fn actual_total_ms(&self) -> u64 {
        let thumbnails: u64 = self.thumbnail_times().iter().sum();
        let tiles: u64 = self.tile_times().iter().sum();
        self.manifest_time + thumbnails + tiles
    }

    /// Builds the run summary, given the wall-clock duration of the run.
    #[must_use]
    pub fn summarize(&self, perceived: Duration) -> RunSummary {
        let thumbnail_times = self.thumbnail_times();
        let tile_times = self.tile_times();
        RunSummary {
            manifest_ms: self.manifest_time,
            thumbnail_count: thumbnail_times.len(),
            thumbnail_ms: thumbnail_times.iter().sum(),
            slowest_thumbnail_ms: thumbnail_times.iter().copied().max(),
            tile_count: tile_times.len(),
            tile_ms: tile_times.iter().sum(),
            slowest_tile_ms: tile_times.iter().copied().max(),
            actual_total_ms: self.actual_total_ms(),
            perceived_total_ms: u64::try_from(perceived.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

fn push(times: &Mutex<Vec<u64>>, millis: u64) {
    times
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(millis);
}

fn snapshot(times: &Mutex<Vec<u64>>) -> Vec<u64> {
    times.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub manifest_ms: u64,
    pub thumbnail_count: usize,
    pub thumbnail_ms: u64,
    pub slowest_thumbnail_ms: Option<u64>,
    pub tile_count: usize,
    pub tile_ms: u64,
    pub slowest_tile_ms: Option<u64>,
    /// Manifest plus the sum of every download time.
    pub actual_total_ms: u64,
    /// Wall-clock time from the manifest request to the last tile.
    pub perceived_total_ms: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Manifest time: {} secs ({} ms)",
            self.manifest_ms / 1000,
            self.manifest_ms
        )?;
        writeln!(
            f,
            "Thumbnails: {} downloaded ({} ms)",
            self.thumbnail_count, self.thumbnail_ms
        )?;
        writeln!(
            f,
            "Tiles: {} downloaded ({} ms)",
            self.tile_count, self.tile_ms
        )?;
        writeln!(
            f,
            "Total actual time: {} secs ({} ms)",
            self.actual_total_ms / 1000,
            self.actual_total_ms
        )?;
        write!(
            f,
            "Total perceived time: {} secs ({} ms)",
            self.perceived_total_ms / 1000,
            self.perceived_total_ms
        )
    }
}
