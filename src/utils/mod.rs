use url::Url;

/// Split a comma-separated language list, dropping blanks ("en, es," -> ["en", "es"])
pub fn parse_language_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reduce a YouTube URL to its video id; anything else is passed through untouched
pub fn extract_video_id(input: &str) -> String {
    let trimmed = input.trim();

    let Ok(url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
        return trimmed.to_string();
    };

    let id = if host == "youtu.be" {
        url.path_segments().and_then(|mut segments| segments.next()).map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        if url.path() == "/watch" {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        } else {
            let mut segments = url.path_segments().into_iter().flatten();
            match (segments.next(), segments.next()) {
                (Some("embed" | "shorts" | "v" | "live"), Some(id)) => Some(id.to_string()),
                _ => None,
            }
        }
    } else {
        None
    };

    id.filter(|id| !id.is_empty())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Format seconds as `HH:MM:SS<sep>mmm`, as used by SRT (`,`) and WebVTT (`.`)
pub fn format_timestamp(seconds: f64, millis_separator: char) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, secs, millis_separator, millis
    )
}

/// Compact clock for plain-text output: `MM:SS`, or `H:MM:SS` past the hour
pub fn format_clock(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
