//! Report rendering for the terminal.

use std::io::{self, Write};

use anyhow::Result;
use iiif_timer::RunReport;

/// Writes the run report to stdout as summary lines or JSON.
pub(crate) fn print_report(report: &RunReport, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report, json)?;
    out.flush()?;
    Ok(())
}

fn write_report(out: &mut impl Write, report: &RunReport, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "Image: {} ({}x{}, {} tiles planned)",
            report.image_service, report.image.width, report.image.height, report.planned_tiles
        )?;
        writeln!(out, "{}", report.summary)?;
    }
    Ok(())
}
