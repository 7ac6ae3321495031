use regex::Regex;

use super::CredentialExtractor;
use crate::{FetchResult, TranscriptError};

/// Finds `"INNERTUBE_API_KEY":"<token>"` anywhere in the page; first match wins
pub struct MarkerExtractor {
    marker: Regex,
}

impl MarkerExtractor {
    pub fn new() -> Self {
        Self {
            marker: Regex::new(r#""INNERTUBE_API_KEY":\s*"([A-Za-z0-9_-]+)""#)
                .expect("credential marker pattern"),
        }
    }
}

impl CredentialExtractor for MarkerExtractor {
    fn extract(&self, html: &str) -> FetchResult<String> {
        self.marker
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|key| key.as_str().to_string())
            .ok_or(TranscriptError::CredentialNotFound)
    }

    fn strategy_name(&self) -> &'static str {
        "marker"
    }
}

impl Default for MarkerExtractor {
    fn default() -> Self {
        Self::new()
    }
}
