//! Transcript Scraper - fetch the caption transcript of a YouTube video
//!
//! No public transcript API exists, so this library follows the same path a browser does:
//! it scrapes a session key out of the watch page, asks the internal player endpoint for the
//! caption catalog, picks one track by language preference and decodes its timed-text XML.

pub mod captions;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod transcribe;
pub mod transport;
pub mod utils;

pub use captions::{CaptionCatalog, CaptionTrack};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::CredentialExtractor;
pub use transcribe::{
    get_transcript, list_languages, FetchedTranscript, Snippet, TranscriptPipeline,
    TranscriptResult,
};
pub use transport::{HttpTransport, ProxyConfig, TransportError};

/// Result type used by the application layer (config, output, CLI)
pub type Result<T> = anyhow::Result<T>;

/// Result type returned by every pipeline stage
pub type FetchResult<T> = std::result::Result<T, TranscriptError>;

/// Failures a caller of the transcript pipeline can act on
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Could not find INNERTUBE_API_KEY in the watch page (markup changed, unknown video, or consent page)")]
    CredentialNotFound,

    #[error("Transcripts are disabled for video {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("No transcript found for languages: {}", .requested.join(", "))]
    NoMatchingTrack { requested: Vec<String> },

    #[error("Failed to decode transcript: {0}")]
    TranscriptDecode(String),

    #[error("Too many requests (HTTP 429). Try again later, route requests through a proxy, or switch to a different network")]
    RateLimited,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Request cancelled")]
    Cancelled,
}

impl TranscriptError {
    /// Rewrites an upstream 429 into `RateLimited`, leaving everything else untouched
    pub fn classify(self) -> Self {
        match self {
            TranscriptError::Transport(TransportError::Status { status: 429, .. }) => {
                TranscriptError::RateLimited
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rewrites_only_429() {
        let limited = TranscriptError::Transport(TransportError::Status {
            status: 429,
            url: "https://www.youtube.com/watch?v=abc".to_string(),
        });
        assert!(matches!(limited.classify(), TranscriptError::RateLimited));

        let not_found = TranscriptError::Transport(TransportError::Status {
            status: 404,
            url: "https://www.youtube.com/watch?v=abc".to_string(),
        });
        assert!(matches!(
            not_found.classify(),
            TranscriptError::Transport(TransportError::Status { status: 404, .. })
        ));

        assert!(matches!(
            TranscriptError::CredentialNotFound.classify(),
            TranscriptError::CredentialNotFound
        ));
    }

    #[test]
    fn test_no_matching_track_message_lists_codes() {
        let err = TranscriptError::NoMatchingTrack {
            requested: vec!["de".to_string(), "nl".to_string()],
        };
        assert_eq!(err.to_string(), "No transcript found for languages: de, nl");
    }

    #[test]
    fn test_rate_limited_message_carries_guidance() {
        let message = TranscriptError::RateLimited.to_string();
        assert!(message.contains("later"));
        assert!(message.contains("proxy"));
        assert!(message.contains("network"));
    }
}
