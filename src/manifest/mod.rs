//! IIIF Presentation manifests and Image API descriptors.
//!
//! Only the parts of the documents a viewer needs for its first paint are
//! read: canvas thumbnails, the first canvas's image service, and the image
//! dimensions from that service's `info.json`. Documents are not validated
//! against the IIIF schemas.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::query::{JsonQuery, QueryError, get_value};

/// Path appended to the percent-encoded identifier to reach a manifest.
pub const MANIFEST_SUFFIX: &str = "manifest";

/// Path appended to an image service to reach its descriptor.
pub const INFO_SUFFIX: &str = "info.json";

const THUMBNAIL_QUERY: &str = "sequences.*.canvases.*.thumbnail";

const SERVICE_QUERIES: [&str; 4] = [
    "sequences.0.canvases.0.images.0.resource.service.@id",
    "sequences.0.canvases.0.images.0.resource.service.id",
    "sequences.0.canvases.0.images.0.resource.service.0.@id",
    "sequences.0.canvases.0.images.0.resource.service.0.id",
];

/// Errors raised while locating or reading IIIF documents.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The configured server base is not an absolute URL.
    #[error("invalid IIIF server URL: {url}")]
    InvalidServer { url: String },

    /// A document is not valid JSON.
    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// A path query failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A thumbnail entry is neither a URL string nor an object with an id.
    #[error("thumbnail entry {index} has no usable URL")]
    Thumbnail { index: usize },

    /// The first canvas has no image service.
    #[error("manifest has no image service on its first canvas")]
    MissingImageService,

    /// A descriptor dimension is missing, non-numeric or not positive.
    #[error("invalid image {field}: '{value}'")]
    InvalidDimension { field: &'static str, value: String },
}

/// Builds the manifest URL for `id` on `server`.
///
/// A trailing slash on the server is optional and the identifier is
/// percent-encoded as a single path segment.
///
/// # Errors
///
/// Returns [`ManifestError::InvalidServer`] if `server` is not an absolute URL.
///
/// # Example
///
/// ```
/// use iiif_timer::manifest::manifest_url;
///
/// let url = manifest_url("https://iiif.example.org/iiif", "ark:/21198/z1").unwrap();
/// assert_eq!(url.as_str(), "https://iiif.example.org/iiif/ark%3A%2F21198%2Fz1/manifest");
/// ```
pub fn manifest_url(server: &str, id: &str) -> Result<Url, ManifestError> {
    let invalid = || ManifestError::InvalidServer {
        url: server.to_string(),
    };
    let base = Url::parse(server).map_err(|_| invalid())?;
    if base.cannot_be_a_base() {
        return Err(invalid());
    }

    let mut text = base.to_string();
    if !text.ends_with('/') {
        text.push('/');
    }
    text.push_str(&urlencoding::encode(id));
    text.push('/');
    text.push_str(MANIFEST_SUFFIX);

    Url::parse(&text).map_err(|_| invalid())
}

/// A parsed IIIF Presentation manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    doc: Value,
}

impl FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            doc: serde_json::from_str(s)?,
        })
    }
}

impl Manifest {
    /// Thumbnail URLs of every canvas, in canvas order.
    ///
    /// Thumbnails may be plain URL strings or objects carrying `@id` or `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Thumbnail`] for an entry without a URL.
    pub fn thumbnail_urls(&self) -> Result<Vec<String>, ManifestError> {
        let query = JsonQuery::parse(THUMBNAIL_QUERY)?;
        query
            .select(&self.doc)
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                resource_id(value).ok_or(ManifestError::Thumbnail { index })
            })
            .collect()
    }

    /// The image service of the first canvas's first image.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingImageService`] if no service id is found.
    pub fn image_service(&self) -> Result<ImageService, ManifestError> {
        SERVICE_QUERIES
            .iter()
            .find_map(|query| get_value(&self.doc, query).ok())
            .map(ImageService::new)
            .ok_or(ManifestError::MissingImageService)
    }

    /// The underlying JSON document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.doc
    }
}

fn resource_id(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Object(members) => ["@id", "id"]
            .iter()
            .find_map(|key| members.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// An IIIF Image API service endpoint, identified by its `@id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageService {
    id: String,
}

impl ImageService {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let id = id.trim_end_matches('/').to_string();
        Self { id }
    }

    /// The service `@id` without a trailing slash.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// URL of the service's `info.json` descriptor.
    #[must_use]
    pub fn info_url(&self) -> String {
        format!("{}/{INFO_SUFFIX}", self.id)
    }

    /// Splits the service id into the server prefix and the decoded identifier.
    ///
    /// `https://host/iiif/ark%3A%2F1` becomes (`https://host/iiif`, `ark:/1`).
    /// The identifier is decoded so that tile planning can encode it exactly once.
    #[must_use]
    pub fn split(&self) -> (&str, String) {
        let (base, segment) = self.id.rsplit_once('/').unwrap_or(("", self.id.as_str()));
        let identifier = urlencoding::decode(segment).map_or_else(
            |e| {
                debug!(segment, error = %e, "identifier is not valid percent-encoding, using raw segment");
                segment.to_string()
            },
            std::borrow::Cow::into_owned,
        );
        (base, identifier)
    }
}

/// Pixel dimensions of a full-resolution image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
}

impl FromStr for ImageDescriptor {
    type Err = ManifestError;

    /// Parses the `width` and `height` of an `info.json` document.
    ///
    /// Fractional values are truncated toward zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let doc: Value = serde_json::from_str(s)?;
        Ok(Self {
            width: dimension(&doc, "width")?,
            height: dimension(&doc, "height")?,
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dimension(doc: &Value, field: &'static str) -> Result<u32, ManifestError> {
    let text = get_value(doc, field)?;
    let invalid = || ManifestError::InvalidDimension {
        field,
        value: text.clone(),
    };

    let parsed: f64 = text.parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || !(1.0..=f64::from(u32::MAX)).contains(&parsed) {
        return Err(invalid());
    }

    Ok(parsed as u32)
}
