//! Multi-level tile enumeration for a deep-zoom viewer.

use tracing::{debug, instrument, trace};

use super::candidate::{RatioRule, TileCandidate};

/// Tile size the viewer requests at full resolution.
pub const DEFAULT_TILE_SIZE: u32 = 1024;

/// Computes the tile requests a deep-zoom viewer issues for an image.
///
/// Levels use multipliers `1, 2, 4, …` while `multiplier * tile_size` is
/// smaller than the image's longer side. Each level covers the image with
/// `multiplier * tile_size` square regions, clipped at the right and bottom
/// edges, and asks for each region scaled down by the multiplier.
///
/// The plan lists the coarsest level first so that the overview tiles a
/// viewer paints first lead the sequence; within a level cells run column by
/// column from the top-left corner.
///
/// # Example
///
/// ```
/// use iiif_timer::tiles::TilePlanner;
///
/// let planner = TilePlanner::new(1024);
/// let tiles = planner.plan("https://iiif.example.org/iiif", "page-1", 4000, 3000);
/// assert_eq!(
///     tiles[0],
///     "https://iiif.example.org/iiif/page-1/0,0,2048,2048/1024,/0/default.jpg"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlanner {
    tile_size: u32,
    ratio_rule: RatioRule,
}

impl Default for TilePlanner {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl TilePlanner {
    /// Creates a planner for the given base tile size with the legacy ratio rule.
    ///
    /// A zero tile size is treated as one pixel.
    #[must_use]
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size: tile_size.max(1),
            ratio_rule: RatioRule::default(),
        }
    }

    /// Selects the rule used to canonicalize size tokens.
    #[must_use]
    pub fn with_ratio_rule(mut self, ratio_rule: RatioRule) -> Self {
        self.ratio_rule = ratio_rule;
        self
    }

    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[must_use]
    pub fn ratio_rule(&self) -> RatioRule {
        self.ratio_rule
    }

    /// Returns the multipliers of every level, finest first.
    #[must_use]
    pub fn multipliers(&self, width: u32, height: u32) -> Vec<u32> {
        let long_dim = u64::from(width.max(height));
        let mut multipliers = Vec::new();
        let mut multiplier: u32 = 1;

        while u64::from(multiplier) * u64::from(self.tile_size) < long_dim {
            multipliers.push(multiplier);
            match multiplier.checked_mul(2) {
                Some(next) => multiplier = next,
                None => break,
            }
        }

        multipliers
    }

    /// Enumerates the pyramid cells in request order.
    ///
    /// Only the level order is reversed: each level keeps its column-major
    /// cell order, so the list starts at the coarsest level's `0,0` cell
    /// rather than at its bottom-right cell as a full reversal would.
    #[must_use]
    pub fn candidates(&self, width: u32, height: u32) -> Vec<TileCandidate> {
        self.multipliers(width, height)
            .into_iter()
            .rev()
            .flat_map(|multiplier| self.level_cells(multiplier, width, height))
            .collect()
    }

    /// Builds the ordered tile request URIs for an image.
    ///
    /// `service` is the image service base (a trailing slash is ignored) and
    /// `id` the raw identifier, which is percent-encoded here. Returns an
    /// empty list when neither dimension exceeds the tile size.
    #[must_use]
    #[instrument(level = "debug", skip(self, service), fields(tile_size = self.tile_size))]
    pub fn plan(&self, service: &str, id: &str, width: u32, height: u32) -> Vec<String> {
        let service = service.trim_end_matches('/');
        let encoded_id = urlencoding::encode(id);

        let paths: Vec<String> = self
            .candidates(width, height)
            .iter()
            .map(|cell| cell.to_uri(service, &encoded_id, self.ratio_rule))
            .collect();

        debug!(tiles = paths.len(), id, "generated tile paths");
        for path in &paths {
            trace!(path = %path, "tile path");
        }

        paths
    }

    fn level_cells(&self, multiplier: u32, width: u32, height: u32) -> Vec<TileCandidate> {
        // Multipliers only reach this point while `multiplier * tile_size` fits below the long side.
        let step = multiplier.saturating_mul(self.tile_size);
        let mut cells = Vec::new();

        debug!(multiplier, step, "creating tiles for level");

        let mut x: u32 = 0;
        while u64::from(x) < u64::from(width) + u64::from(step) {
            let mut y: u32 = 0;
            while u64::from(y) < u64::from(height) + u64::from(step) {
                let region_width = step.min(width.saturating_sub(x));
                let region_height = step.min(height.saturating_sub(y));

                if region_width > 0 && region_height > 0 {
                    cells.push(TileCandidate::new(
                        multiplier,
                        x,
                        y,
                        region_width,
                        region_height,
                    ));
                }

                let Some(next) = y.checked_add(step) else {
                    break;
                };
                y = next;
            }

            let Some(next) = x.checked_add(step) else {
                break;
            };
            x = next;
        }

        cells
    }
}

/// Plans tile URIs with the default ratio rule.
///
/// Shorthand for `TilePlanner::new(tile_size).plan(service, id, width, height)`.
#[must_use]
pub fn plan_tiles(service: &str, id: &str, tile_size: u32, width: u32, height: u32) -> Vec<String> {
    TilePlanner::new(tile_size).plan(service, id, width, height)
}
