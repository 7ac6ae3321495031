use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
pub use crate::transcribe::{BatchEntry, FailedVideo};

pub mod formatters;

pub use formatters::*;

/// Render entries in the requested format
pub fn render(
    entries: &[BatchEntry],
    format: &OutputFormat,
    include_timestamps: bool,
) -> Result<String> {
    let content = match format {
        OutputFormat::Text => format_as_text(entries, include_timestamps),
        OutputFormat::Json => format_as_json(entries)?,
        OutputFormat::Srt => format_as_srt(entries),
        OutputFormat::Vtt => format_as_vtt(entries),
        OutputFormat::Csv => format_as_csv(entries),
    };
    Ok(content)
}

/// Save transcripts to file
pub async fn save_to_file(
    entries: &[BatchEntry],
    path: &Path,
    format: &OutputFormat,
    include_timestamps: bool,
) -> Result<()> {
    let content = render(entries, format, include_timestamps)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcripts to console
pub fn print_to_console(
    entries: &[BatchEntry],
    format: &OutputFormat,
    include_timestamps: bool,
) -> Result<()> {
    let content = render(entries, format, include_timestamps)?;
    println!("{}", content);
    Ok(())
}
