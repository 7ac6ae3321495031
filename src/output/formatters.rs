use anyhow::{Context, Result};
use std::fmt::Write;

use super::BatchEntry;
use crate::transcribe::FetchedTranscript;
use crate::utils::{format_clock, format_timestamp};

fn fetched(entries: &[BatchEntry]) -> impl Iterator<Item = &FetchedTranscript> {
    entries.iter().filter_map(|entry| match entry {
        BatchEntry::Fetched(transcript) => Some(transcript),
        BatchEntry::Failed(_) => None,
    })
}

/// Plain text; headed per video when more than one entry is printed
pub fn format_as_text(entries: &[BatchEntry], include_timestamps: bool) -> String {
    let with_headers = entries.len() > 1;
    let mut blocks = Vec::with_capacity(entries.len());

    for entry in entries {
        let mut block = String::new();
        match entry {
            BatchEntry::Fetched(fetched) => {
                if with_headers {
                    let _ = writeln!(
                        block,
                        "== {} ({}) ==",
                        fetched.video_id, fetched.track.language_code
                    );
                }
                if include_timestamps {
                    for snippet in &fetched.result.snippets {
                        let _ = writeln!(block, "[{}] {}", format_clock(snippet.start), snippet.text);
                    }
                } else {
                    block.push_str(&fetched.result.transcript);
                }
            }
            BatchEntry::Failed(failed) => {
                let _ = write!(block, "== {} ==\nerror: {}", failed.video_id, failed.error);
            }
        }
        blocks.push(block.trim_end_matches('\n').to_string());
    }

    blocks.join("\n\n")
}

/// A single entry as an object, several as an array
pub fn format_as_json(entries: &[BatchEntry]) -> Result<String> {
    let json = match entries {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(entries),
    };
    json.context("Failed to serialize transcript")
}

/// SubRip cues, numbered across all fetched videos
pub fn format_as_srt(entries: &[BatchEntry]) -> String {
    let mut output = String::new();
    let mut index = 1;

    for transcript in fetched(entries) {
        for snippet in &transcript.result.snippets {
            let _ = write!(
                output,
                "{}\n{} --> {}\n{}\n\n",
                index,
                format_timestamp(snippet.start, ','),
                format_timestamp(snippet.end(), ','),
                snippet.text
            );
            index += 1;
        }
    }

    output.trim_end().to_string()
}

/// WebVTT document; a NOTE marks where each video starts when several are rendered
pub fn format_as_vtt(entries: &[BatchEntry]) -> String {
    let mut output = String::from("WEBVTT\n\n");
    let annotate = entries.len() > 1;

    for transcript in fetched(entries) {
        if annotate {
            let _ = write!(
                output,
                "NOTE {} ({})\n\n",
                transcript.video_id, transcript.track.language_code
            );
        }
        for snippet in &transcript.result.snippets {
            let _ = write!(
                output,
                "{} --> {}\n{}\n\n",
                format_timestamp(snippet.start, '.'),
                format_timestamp(snippet.end(), '.'),
                snippet.text
            );
        }
    }

    output.trim_end().to_string()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One row per snippet
pub fn format_as_csv(entries: &[BatchEntry]) -> String {
    let mut output = String::from("video_id,language_code,start,duration,text\n");

    for transcript in fetched(entries) {
        for snippet in &transcript.result.snippets {
            let _ = writeln!(
                output,
                "{},{},{:.3},{:.3},{}",
                csv_field(&transcript.video_id),
                csv_field(&transcript.track.language_code),
                snippet.start,
                snippet.duration,
                csv_field(&snippet.text)
            );
        }
    }

    output
}
