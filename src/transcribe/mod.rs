use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::captions::{self, select_track, CaptionCatalog, CaptionTrack};
use crate::config::{Config, InnertubeConfig};
use crate::extractors::CredentialExtractor;
use crate::transport::{HttpTransport, ProxyConfig, ReqwestTransport, TransportError};
use crate::{FetchResult, TranscriptError};

pub mod batch;
pub mod processor;

pub use batch::{BatchEntry, BatchError, BatchOptions, FailedVideo};
pub use processor::decode_timed_text;

/// One timed unit of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Cue text, verbatim
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds, 0.0 when the cue carries none
    pub duration: f64,
}

impl Snippet {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Decoded transcript; `transcript` is always the snippet texts joined by single spaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub transcript: String,
    pub snippets: Vec<Snippet>,
}

impl TranscriptResult {
    pub fn from_snippets(snippets: Vec<Snippet>) -> Self {
        let transcript = snippets
            .iter()
            .map(|snippet| snippet.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            transcript,
            snippets,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

/// A transcript together with the track it was decoded from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedTranscript {
    pub video_id: String,
    pub track: CaptionTrack,
    #[serde(flatten)]
    pub result: TranscriptResult,
    pub fetched_at: DateTime<Utc>,
}

/// Watch page -> API key -> caption catalog -> chosen track -> snippets
pub struct TranscriptPipeline<T: HttpTransport = ReqwestTransport> {
    transport: T,
    extractor: Box<dyn CredentialExtractor>,
    innertube: InnertubeConfig,
    cancel: CancellationToken,
}

impl TranscriptPipeline<ReqwestTransport> {
    /// Create a pipeline whose every request goes through `proxy`, if given
    pub fn new(config: &Config, proxy: Option<&ProxyConfig>) -> FetchResult<Self> {
        let transport = ReqwestTransport::new(&config.http.headers, proxy, config.timeout())?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: HttpTransport> TranscriptPipeline<T> {
    pub fn with_transport(transport: T, config: &Config) -> Self {
        Self {
            transport,
            extractor: config.innertube.credential_strategy.build(),
            innertube: config.innertube.clone(),
            cancel: CancellationToken::new(),
        }
    }

    /// Swap the credential extraction strategy
    pub fn with_extractor(mut self, extractor: Box<dyn CredentialExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Abort in-flight requests with `Cancelled` once `token` fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// List the language code of every caption track, in catalog order
    pub async fn list_languages(&self, video_id: &str) -> FetchResult<Vec<String>> {
        let catalog = self.list_tracks(video_id).await?;
        Ok(catalog.language_codes())
    }

    /// Fetch the full caption catalog for a video
    pub async fn list_tracks(&self, video_id: &str) -> FetchResult<CaptionCatalog> {
        self.fetch_catalog(video_id)
            .await
            .map_err(TranscriptError::classify)
    }

    /// Fetch and decode the transcript chosen by `languages`
    pub async fn get_transcript<S: AsRef<str>>(
        &self,
        video_id: &str,
        languages: &[S],
    ) -> FetchResult<TranscriptResult> {
        Ok(self.fetch_transcript(video_id, languages).await?.result)
    }

    /// Like `get_transcript`, but also reports which track was used
    pub async fn fetch_transcript<S: AsRef<str>>(
        &self,
        video_id: &str,
        languages: &[S],
    ) -> FetchResult<FetchedTranscript> {
        tracing::info!("Fetching transcript for {}", video_id);

        self.run_transcript(video_id, languages)
            .await
            .map_err(TranscriptError::classify)
    }

    async fn run_transcript<S: AsRef<str>>(
        &self,
        video_id: &str,
        languages: &[S],
    ) -> FetchResult<FetchedTranscript> {
        let catalog = self.fetch_catalog(video_id).await?;
        let track = select_track(&catalog, languages)?;
        tracing::debug!(
            "Selected {} track '{}' ({})",
            if track.is_generated { "generated" } else { "manual" },
            track.language,
            track.language_code
        );

        let body = self
            .guard(async {
                self.transport
                    .get(&track.url)
                    .await
                    .map_err(TranscriptError::from)
            })
            .await?;
        let snippets = decode_timed_text(&body)?;
        tracing::debug!("Decoded {} snippets for {}", snippets.len(), video_id);

        Ok(FetchedTranscript {
            video_id: video_id.to_string(),
            track: track.clone(),
            result: TranscriptResult::from_snippets(snippets),
            fetched_at: Utc::now(),
        })
    }

    async fn fetch_catalog(&self, video_id: &str) -> FetchResult<CaptionCatalog> {
        let api_key = self.fetch_api_key(video_id).await?;
        self.guard(captions::fetch_catalog(
            &self.transport,
            &self.innertube,
            video_id,
            &api_key,
        ))
        .await
    }

    async fn fetch_api_key(&self, video_id: &str) -> FetchResult<String> {
        let url = self.watch_url(video_id)?;
        let html = self
            .guard(async { self.transport.get(&url).await.map_err(TranscriptError::from) })
            .await?;

        let api_key = self.extractor.extract(&html)?;
        tracing::debug!(
            "Extracted API key for {} using {} strategy",
            video_id,
            self.extractor.strategy_name()
        );
        Ok(api_key)
    }

    fn watch_url(&self, video_id: &str) -> FetchResult<String> {
        let url = Url::parse_with_params(&self.innertube.watch_url, &[("v", video_id)])
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", self.innertube.watch_url, e)))?;
        Ok(url.into())
    }

    /// Race a network stage against cancellation
    async fn guard<R, F>(&self, stage: F) -> FetchResult<R>
    where
        F: Future<Output = FetchResult<R>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TranscriptError::Cancelled),
            result = stage => result,
        }
    }
}

/// Run the whole pipeline once for `video_id`
pub async fn get_transcript<S: AsRef<str>>(
    video_id: &str,
    languages: &[S],
    proxy: Option<&ProxyConfig>,
    config: &Config,
) -> FetchResult<TranscriptResult> {
    TranscriptPipeline::new(config, proxy)?
        .get_transcript(video_id, languages)
        .await
}

/// List available caption language codes for `video_id`
pub async fn list_languages(
    video_id: &str,
    proxy: Option<&ProxyConfig>,
    config: &Config,
) -> FetchResult<Vec<String>> {
    TranscriptPipeline::new(config, proxy)?
        .list_languages(video_id)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockHttpTransport;
    use pretty_assertions::assert_eq;

    const WATCH_HTML: &str =
        r#"<html><script>ytcfg.set({"INNERTUBE_API_KEY":"abc123"});</script></html>"#;

    const PLAYER_JSON: &str = r#"{"captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
        {"baseUrl": "https://www.youtube.com/api/timedtext?lang=en", "name": {"simpleText": "English"}, "languageCode": "en"},
        {"baseUrl": "https://www.youtube.com/api/timedtext?lang=en&kind=asr", "name": {"simpleText": "English (auto-generated)"}, "languageCode": "en", "kind": "asr"},
        {"baseUrl": "https://www.youtube.com/api/timedtext?lang=fr", "name": {"simpleText": "French"}, "languageCode": "fr"}
    ]}}}"#;

    const TRACK_XML: &str = r#"<transcript><text start="0.5" dur="2.0">hello</text><text start="2.5">world</text></transcript>"#;

    fn rate_limited(url: &str) -> TransportError {
        TransportError::Status {
            status: 429,
            url: url.to_string(),
        }
    }

    fn expect_watch_page(transport: &mut MockHttpTransport) {
        transport
            .expect_get()
            .withf(|url| url == "https://www.youtube.com/watch?v=vid")
            .times(1)
            .returning(|_| Ok(WATCH_HTML.to_string()));
    }

    fn expect_player(transport: &mut MockHttpTransport, body: &'static str) {
        transport
            .expect_post_json()
            .withf(|url, request| {
                url == "https://www.youtube.com/youtubei/v1/player?key=abc123"
                    && request["videoId"] == "vid"
                    && request["context"]["client"]["clientName"] == "WEB"
            })
            .times(1)
            .returning(move |_, _| Ok(body.to_string()));
    }

    fn pipeline(transport: MockHttpTransport) -> TranscriptPipeline<MockHttpTransport> {
        TranscriptPipeline::with_transport(transport, &Config::default())
    }

    #[tokio::test]
    async fn test_get_transcript_happy_path() {
        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, PLAYER_JSON);
        transport
            .expect_get()
            .withf(|url| url == "https://www.youtube.com/api/timedtext?lang=fr")
            .times(1)
            .returning(|_| Ok(TRACK_XML.to_string()));

        let result = pipeline(transport)
            .get_transcript("vid", &["fr", "en"])
            .await
            .unwrap();

        assert_eq!(result.transcript, "hello world");
        assert_eq!(
            result.snippets,
            vec![
                Snippet {
                    text: "hello".to_string(),
                    start: 0.5,
                    duration: 2.0,
                },
                Snippet {
                    text: "world".to_string(),
                    start: 2.5,
                    duration: 0.0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_default_selection_uses_manual_track() {
        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, PLAYER_JSON);
        transport
            .expect_get()
            .withf(|url| url == "https://www.youtube.com/api/timedtext?lang=en")
            .times(1)
            .returning(|_| Ok(TRACK_XML.to_string()));

        let fetched = pipeline(transport)
            .fetch_transcript::<&str>("vid", &[])
            .await
            .unwrap();

        assert_eq!(fetched.video_id, "vid");
        assert_eq!(fetched.track.language, "English");
        assert!(!fetched.track.is_generated);
    }

    #[tokio::test]
    async fn test_list_languages_keeps_catalog_order_and_duplicates() {
        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, PLAYER_JSON);

        let codes = pipeline(transport).list_languages("vid").await.unwrap();
        assert_eq!(codes, vec!["en", "en", "fr"]);
    }

    #[tokio::test]
    async fn test_captions_missing_fails_both_operations() {
        let body = r#"{"playabilityStatus": {"status": "OK"}}"#;

        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, body);
        let err = pipeline(transport)
            .get_transcript::<&str>("vid", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::TranscriptsDisabled { .. }));

        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, body);
        let err = pipeline(transport).list_languages("vid").await.unwrap_err();
        assert!(matches!(err, TranscriptError::TranscriptsDisabled { .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_stops_before_player_call() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Ok("<html>consent</html>".to_string()));
        transport.expect_post_json().never();

        let err = pipeline(transport).list_languages("vid").await.unwrap_err();
        assert!(matches!(err, TranscriptError::CredentialNotFound));
    }

    #[tokio::test]
    async fn test_no_matching_track() {
        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, PLAYER_JSON);

        let err = pipeline(transport)
            .get_transcript("vid", &["de"])
            .await
            .unwrap_err();
        match err {
            TranscriptError::NoMatchingTrack { requested } => assert_eq!(requested, vec!["de"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_on_watch_page() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|url| Err(rate_limited(url)));

        let err = pipeline(transport)
            .get_transcript::<&str>("vid", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::RateLimited));
    }

    #[tokio::test]
    async fn test_rate_limit_on_player_endpoint() {
        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        transport
            .expect_post_json()
            .times(1)
            .returning(|url, _| Err(rate_limited(url)));

        let err = pipeline(transport).list_languages("vid").await.unwrap_err();
        assert!(matches!(err, TranscriptError::RateLimited));
    }

    #[tokio::test]
    async fn test_rate_limit_on_track_body() {
        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, PLAYER_JSON);
        transport
            .expect_get()
            .withf(|url| url.contains("timedtext"))
            .times(1)
            .returning(|url| Err(rate_limited(url)));

        let err = pipeline(transport)
            .get_transcript("vid", &["en"])
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::RateLimited));
    }

    #[tokio::test]
    async fn test_other_status_passes_through() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().times(1).returning(|url| {
            Err(TransportError::Status {
                status: 503,
                url: url.to_string(),
            })
        });

        let err = pipeline(transport).list_languages("vid").await.unwrap_err();
        assert!(matches!(
            err,
            TranscriptError::Transport(TransportError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_track_body() {
        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, PLAYER_JSON);
        transport
            .expect_get()
            .withf(|url| url.contains("timedtext"))
            .times(1)
            .returning(|_| Ok("<transcript><text start=\"1\">".to_string()));

        let err = pipeline(transport)
            .get_transcript("vid", &["en"])
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::TranscriptDecode(_)));
    }

    #[tokio::test]
    async fn test_empty_track_is_empty_transcript() {
        let mut transport = MockHttpTransport::new();
        expect_watch_page(&mut transport);
        expect_player(&mut transport, PLAYER_JSON);
        transport
            .expect_get()
            .withf(|url| url.contains("timedtext"))
            .times(1)
            .returning(|_| Ok("<transcript></transcript>".to_string()));

        let result = pipeline(transport)
            .get_transcript("vid", &["en"])
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.transcript, "");
    }

    #[tokio::test]
    async fn test_cancelled_before_any_request() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().never();
        transport.expect_post_json().never();

        let token = CancellationToken::new();
        token.cancel();

        let err = pipeline(transport)
            .with_cancellation(token)
            .get_transcript::<&str>("vid", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::Cancelled));
    }

    /// Never answers, so only cancellation can end a request
    struct StalledTransport;

    #[async_trait::async_trait]
    impl HttpTransport for StalledTransport {
        async fn get(&self, _url: &str) -> Result<String, TransportError> {
            std::future::pending().await
        }

        async fn post_json(
            &self,
            _url: &str,
            _body: &serde_json::Value,
        ) -> Result<String, TransportError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancelled_during_pending_request() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let pipeline = TranscriptPipeline::with_transport(StalledTransport, &Config::default())
            .with_cancellation(token);
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            pipeline.get_transcript("vid", &["en"]),
        )
        .await
        .expect("pipeline should stop once cancelled");

        assert!(matches!(result, Err(TranscriptError::Cancelled)));
    }

    #[tokio::test]
    async fn test_alternate_extractor_is_used() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Ok(r#""INNERTUBE_API_KEY":"abc123""#.to_string()));
        expect_player(&mut transport, PLAYER_JSON);

        let codes = pipeline(transport)
            .with_extractor(Box::new(crate::extractors::MarkerExtractor::new()))
            .list_languages("vid")
            .await
            .unwrap();
        assert_eq!(codes.len(), 3);
    }

    #[test]
    fn test_transcript_joins_with_single_spaces() {
        let result = TranscriptResult::from_snippets(vec![
            Snippet {
                text: "a".to_string(),
                start: 0.0,
                duration: 1.0,
            },
            Snippet {
                text: "".to_string(),
                start: 1.0,
                duration: 1.0,
            },
            Snippet {
                text: "b".to_string(),
                start: 2.0,
                duration: 1.0,
            },
        ]);
        assert_eq!(result.transcript, "a  b");
    }

    #[test]
    fn test_pipeline_rejects_bad_proxy() {
        let proxy = ProxyConfig::new("ftp://127.0.0.1");
        assert!(matches!(
            TranscriptPipeline::new(&Config::default(), Some(&proxy)),
            Err(TranscriptError::Transport(TransportError::Proxy(_)))
        ));
    }

    #[tokio::test]
    async fn test_one_shot_functions_surface_proxy_errors() {
        let config = Config::default();
        let proxy = ProxyConfig::new("ftp://127.0.0.1");

        let err = get_transcript("vid", &["en"], Some(&proxy), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::Transport(TransportError::Proxy(_))));

        let err = list_languages("vid", Some(&proxy), &config).await.unwrap_err();
        assert!(matches!(err, TranscriptError::Transport(TransportError::Proxy(_))));
    }
}
