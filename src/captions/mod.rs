use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

pub mod selector;

use crate::config::InnertubeConfig;
use crate::transport::{HttpTransport, TransportError};
use crate::{FetchResult, TranscriptError};

pub use selector::select_track;

/// Kind marker the player uses for automatic speech recognition tracks
const ASR_KIND: &str = "asr";

/// One caption track offered for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub video_id: String,

    /// Fetch location of the timed-text body
    pub url: String,

    /// Display name, e.g. "English (auto-generated)"
    pub language: String,

    /// Short code, e.g. "en"
    pub language_code: String,

    /// True for ASR tracks, false for human-authored ones
    pub is_generated: bool,
}

/// Caption tracks in the order the platform lists them; never empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionCatalog {
    video_id: String,
    tracks: Vec<CaptionTrack>,
}

impl CaptionCatalog {
    /// An empty track list means the video has no usable captions
    pub fn new(video_id: impl Into<String>, tracks: Vec<CaptionTrack>) -> FetchResult<Self> {
        let video_id = video_id.into();
        if tracks.is_empty() {
            return Err(TranscriptError::TranscriptsDisabled { video_id });
        }
        Ok(Self { video_id, tracks })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn tracks(&self) -> &[CaptionTrack] {
        &self.tracks
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaptionTrack> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Language codes in catalog order, duplicates kept
    pub fn language_codes(&self) -> Vec<String> {
        self.tracks
            .iter()
            .map(|track| track.language_code.clone())
            .collect()
    }
}

/// The parts of the player response this crate reads; everything is optional upstream
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    captions: Option<Captions>,
    playability_status: Option<PlayabilityStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<RawCaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: Option<String>,
    name: Option<TrackName>,
    language_code: Option<String>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

impl RawCaptionTrack {
    fn into_track(self, video_id: &str) -> Option<CaptionTrack> {
        let url = self.base_url?;
        let language_code = self.language_code?;
        let language = self
            .name
            .and_then(|name| {
                name.simple_text
                    .or_else(|| name.runs.into_iter().next().map(|run| run.text))
            })
            .unwrap_or_else(|| language_code.clone());

        Some(CaptionTrack {
            video_id: video_id.to_string(),
            url,
            language,
            language_code,
            is_generated: self.kind.as_deref() == Some(ASR_KIND),
        })
    }
}

/// Build the POST body that makes the player endpoint answer like it does for a browser
pub fn player_request_body(innertube: &InnertubeConfig, video_id: &str) -> serde_json::Value {
    json!({
        "context": {
            "client": {
                "clientName": innertube.client_name,
                "clientVersion": innertube.client_version,
            }
        },
        "videoId": video_id,
    })
}

pub fn player_url(innertube: &InnertubeConfig, api_key: &str) -> FetchResult<String> {
    let url = Url::parse_with_params(&innertube.player_url, &[("key", api_key)])
        .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", innertube.player_url, e)))?;
    Ok(url.into())
}

/// Decode a raw player response into the caption catalog
pub fn parse_catalog(video_id: &str, body: &str) -> FetchResult<CaptionCatalog> {
    let response: PlayerResponse = serde_json::from_str(body)
        .map_err(|e| TransportError::UnexpectedBody(format!("player response: {}", e)))?;

    let Some(renderer) = response
        .captions
        .and_then(|captions| captions.player_captions_tracklist_renderer)
    else {
        if let Some(PlayabilityStatus { status, reason }) = response.playability_status {
            tracing::debug!(
                "No captions for {} (playability: {}, {})",
                video_id,
                status.as_deref().unwrap_or("unknown"),
                reason.as_deref().unwrap_or("no reason given")
            );
        }
        return Err(TranscriptError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        });
    };

    let mut tracks = Vec::with_capacity(renderer.caption_tracks.len());
    for (index, raw) in renderer.caption_tracks.into_iter().enumerate() {
        match raw.into_track(video_id) {
            Some(track) => tracks.push(track),
            None => tracing::warn!(
                "Skipping caption track #{} for {}: missing baseUrl or languageCode",
                index,
                video_id
            ),
        }
    }

    CaptionCatalog::new(video_id, tracks)
}

/// Ask the player endpoint which caption tracks exist for a video
pub async fn fetch_catalog<T: HttpTransport + ?Sized>(
    transport: &T,
    innertube: &InnertubeConfig,
    video_id: &str,
    api_key: &str,
) -> FetchResult<CaptionCatalog> {
    let url = player_url(innertube, api_key)?;
    let body = player_request_body(innertube, video_id);

    let response = transport.post_json(&url, &body).await?;
    let catalog = parse_catalog(video_id, &response)?;

    tracing::debug!("Found {} caption tracks for {}", catalog.len(), video_id);
    Ok(catalog)
}
