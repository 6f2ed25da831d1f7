//! User-Agent string sent with every request.
//!
//! Image servers often log by agent; a stable, versioned string lets operators
//! separate timing runs from viewer traffic.

/// Default User-Agent for manifest, descriptor and image requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("iiif-timer/{version} (load-baseline)")
}
