//! Tile pyramid planning for IIIF deep-zoom viewers.
//!
//! Given an image's pixel dimensions and a base tile size, the planner lists
//! the Image API requests a viewer such as OpenSeadragon issues to paint the
//! image progressively, from the coarsest overview to full-resolution detail.
//!
//! Request URIs follow the IIIF Image API 2.0 canonical syntax:
//!
//! ```text
//! {service}/{identifier}/{x},{y},{w},{h}/{w},{h}/0/default.jpg
//! ```
//!
//! with the size's height omitted (`{w},`) when the scale keeps the region's
//! aspect ratio.

mod candidate;
mod planner;

pub use candidate::{Ratio, RatioRule, TILE_SUFFIX, TileCandidate, gcd, ratio};
pub use planner::{DEFAULT_TILE_SIZE, TilePlanner, plan_tiles};
