use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Desktop Chrome user agent; the player endpoint rejects obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.8,*/*;q=0.7";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Failures raised while talking to the upstream service
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid proxy configuration: {0}")]
    Proxy(String),

    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Header set sent with every request of an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderSet {
    pub user_agent: String,
    pub accept_language: String,
    pub accept: String,
}

impl Default for HeaderSet {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

impl HeaderSet {
    fn to_header_map(&self) -> Result<HeaderMap, TransportError> {
        let value = |raw: &str, name: &'static str| {
            HeaderValue::from_str(raw).map_err(|_| TransportError::InvalidHeader(name))
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, value(&self.user_agent, "user-agent")?);
        headers.insert(ACCEPT_LANGUAGE, value(&self.accept_language, "accept-language")?);
        headers.insert(ACCEPT, value(&self.accept, "accept")?);
        Ok(headers)
    }
}

/// A single forward proxy applied to every request of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Check the scheme up front so a typo fails before any request is made
    pub fn validate(&self) -> Result<(), TransportError> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| TransportError::Proxy(format!("{}: {}", self.url, e)))?;

        match parsed.scheme() {
            "http" | "https" | "socks5" | "socks5h" => Ok(()),
            other => Err(TransportError::Proxy(format!(
                "unsupported proxy scheme '{}' (expected http, https, socks5 or socks5h)",
                other
            ))),
        }
    }
}

/// Outbound HTTP used by the pipeline; returns the raw body of a successful response
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET a URL and return its body as text
    async fn get(&self, url: &str) -> Result<String, TransportError>;

    /// POST a JSON document and return the response body as text
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, TransportError>;
}

/// reqwest-backed transport with a fixed header set and optional proxy
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(
        headers: &HeaderSet,
        proxy: Option<&ProxyConfig>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .default_headers(headers.to_header_map()?)
            .timeout(timeout);

        if let Some(proxy) = proxy {
            proxy.validate()?;
            let proxy_obj = reqwest::Proxy::all(&proxy.url)
                .map_err(|e| TransportError::Proxy(format!("{}: {}", proxy.url, e)))?;
            builder = builder.proxy(proxy_obj);
            tracing::debug!("Routing requests through proxy: {}", proxy.url);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<String, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Self::read_body(response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, TransportError> {
        tracing::debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        Self::read_body(response).await
    }
}
