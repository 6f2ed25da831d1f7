//! CLI argument definitions using clap derive macros.

use clap::Parser;

use iiif_timer::{DEFAULT_THREAD_COUNT, RatioRule, TimerConfig};

/// Time the first-view downloads of a IIIF viewer.
///
/// Fetches a manifest, its canvas thumbnails and the initial deep-zoom tiles
/// of its first image the way Mirador and OpenSeadragon do, then reports the
/// summed and wall-clock download times as a baseline for image server changes.
#[derive(Parser, Debug)]
#[command(name = "iiif-timer")]
#[command(author, version, about)]
pub struct Args {
    /// IIIF server base URL (trailing slash optional)
    pub server: String,

    /// Manifest identifier on that server
    pub manifest_id: String,

    /// Concurrent thumbnail downloads (at least 1)
    #[arg(default_value_t = DEFAULT_THREAD_COUNT, value_parser = thread_count_in_range)]
    pub thread_count: usize,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error log output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the run report as JSON instead of summary lines
    #[arg(long)]
    pub json: bool,

    /// Compare true width:height ratios when shortening tile size tokens
    #[arg(long)]
    pub exact_aspect_ratio: bool,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    #[must_use]
    pub fn to_config(&self) -> TimerConfig {
        let ratio_rule = if self.exact_aspect_ratio {
            RatioRule::WidthHeight
        } else {
            RatioRule::HeightOnly
        };
        TimerConfig::new(&self.server, &self.manifest_id)
            .with_thread_count(self.thread_count)
            .with_ratio_rule(ratio_rule)
    }
}

fn thread_count_in_range(value: &str) -> Result<usize, String> {
    let count: usize = value
        .parse()
        .map_err(|e| format!("'{value}' is not a whole number: {e}"))?;
    if count == 0 {
        return Err("at least one thread is required".to_string());
    }
    Ok(count)
}
