//! A single pyramid cell and its IIIF region/size tokens.

use std::fmt;

/// Rotation, quality and format suffix shared by every tile request.
pub const TILE_SUFFIX: &str = "0/default.jpg";

/// Rule used to decide whether a size token may drop its height component.
///
/// The IIIF 2.0 canonical URI syntax writes `w,` when the requested size keeps
/// the region's aspect ratio. Existing derivative caches were generated with
/// [`RatioRule::HeightOnly`], which compares only the reduced height terms of
/// the two ratios; [`RatioRule::WidthHeight`] compares the true ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatioRule {
    /// Legacy comparison: `h/gcd : h/gcd` on both sides.
    #[default]
    HeightOnly,
    /// Reduced `w:h` comparison.
    WidthHeight,
}

/// A reduced ratio of two positive dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub antecedent: u32,
    pub consequent: u32,
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.antecedent, self.consequent)
    }
}

/// Greatest common divisor (Euclid).
#[must_use]
pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Reduces `width:height` according to `rule`.
///
/// Both dimensions must be positive; a zero pair reduces to `0:0`.
#[must_use]
pub fn ratio(width: u32, height: u32, rule: RatioRule) -> Ratio {
    let divisor = gcd(width, height).max(1);
    match rule {
        RatioRule::HeightOnly => Ratio {
            antecedent: height / divisor,
            consequent: height / divisor,
        },
        RatioRule::WidthHeight => Ratio {
            antecedent: width / divisor,
            consequent: height / divisor,
        },
    }
}

/// One cell of the tile pyramid before URI serialization.
///
/// Region coordinates are in full-resolution pixels; output dimensions are the
/// region scaled down by `multiplier`, rounded up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCandidate {
    pub multiplier: u32,
    pub x: u32,
    pub y: u32,
    pub region_width: u32,
    pub region_height: u32,
    pub output_width: u32,
    pub output_height: u32,
}

impl TileCandidate {
    /// Builds a candidate, deriving output size from the region and multiplier.
    #[must_use]
    pub fn new(multiplier: u32, x: u32, y: u32, region_width: u32, region_height: u32) -> Self {
        Self {
            multiplier,
            x,
            y,
            region_width,
            region_height,
            output_width: region_width.div_ceil(multiplier),
            output_height: region_height.div_ceil(multiplier),
        }
    }

    /// `x,y,w,h` region token.
    #[must_use]
    pub fn region_token(&self) -> String {
        format!(
            "{},{},{},{}",
            self.x, self.y, self.region_width, self.region_height
        )
    }

    /// Returns true when the output keeps the region's aspect ratio under `rule`.
    #[must_use]
    pub fn preserves_ratio(&self, rule: RatioRule) -> bool {
        ratio(self.region_width, self.region_height, rule)
            == ratio(self.output_width, self.output_height, rule)
    }

    /// `w,h` size token, canonicalized to `w,` when the ratio is preserved.
    #[must_use]
    pub fn size_token(&self, rule: RatioRule) -> String {
        if self.preserves_ratio(rule) {
            format!("{},", self.output_width)
        } else {
            format!("{},{}", self.output_width, self.output_height)
        }
    }

    /// Full request URI for this cell.
    ///
    /// `service` must not end in a slash and `encoded_id` must already be
    /// percent-encoded.
    #[must_use]
    pub fn to_uri(&self, service: &str, encoded_id: &str, rule: RatioRule) -> String {
        format!(
            "{service}/{encoded_id}/{}/{}/{TILE_SUFFIX}",
            self.region_token(),
            self.size_token(rule)
        )
    }
}
