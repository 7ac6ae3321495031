use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::extractors::CredentialStrategy;
use crate::transport::{HeaderSet, ProxyConfig, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_WATCH_URL: &str = "https://www.youtube.com/watch";
pub const DEFAULT_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
pub const DEFAULT_CLIENT_NAME: &str = "WEB";

/// Web client release the player endpoint is asked to impersonate.
/// Refresh it through config or `--client-version` when upstream stops accepting it.
pub const DEFAULT_CLIENT_VERSION: &str = "2.20210721.00.00";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outbound HTTP settings
    pub http: HttpConfig,

    /// Internal player API settings
    pub innertube: InnertubeConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Browser-like header set sent with every request
    #[serde(flatten)]
    pub headers: HeaderSet,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Optional forward proxy (http, https, socks5, socks5h)
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InnertubeConfig {
    /// Watch page URL; the video id is appended as `?v=`
    pub watch_url: String,

    /// Player endpoint URL; the API key is appended as `?key=`
    pub player_url: String,

    pub client_name: String,

    pub client_version: String,

    /// How the API key is scraped from the watch page
    pub credential_strategy: CredentialStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Language codes tried in order when none are given on the command line
    pub default_languages: Vec<String>,

    /// Default output format
    pub default_output_format: OutputFormat,

    /// Videos fetched at the same time in batch mode
    pub max_concurrent_jobs: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            headers: HeaderSet::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy: None,
        }
    }
}

impl Default for InnertubeConfig {
    fn default() -> Self {
        Self {
            watch_url: DEFAULT_WATCH_URL.to_string(),
            player_url: DEFAULT_PLAYER_URL.to_string(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            credential_strategy: CredentialStrategy::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_languages: Vec::new(),
            default_output_format: OutputFormat::Text,
            max_concurrent_jobs: 1,
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config = Self::from_yaml(&content)?;
            tracing::debug!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            let config = Self::default();
            if let Err(e) = config.save().await {
                tracing::warn!("Could not write default config: {:#}", e);
            }
            Ok(config)
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-scraper").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.innertube.client_version.trim().is_empty() {
            anyhow::bail!("innertube.client_version must not be empty");
        }

        if self.innertube.client_name.trim().is_empty() {
            anyhow::bail!("innertube.client_name must not be empty");
        }

        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than zero");
        }

        if self.app.max_concurrent_jobs == 0 {
            anyhow::bail!("app.max_concurrent_jobs must be at least 1");
        }

        if let Some(proxy) = self.proxy() {
            proxy.validate()?;
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Client: {} {}", self.innertube.client_name, self.innertube.client_version);
        println!("  Credential Strategy: {:?}", self.innertube.credential_strategy);
        println!("  Timeout: {}s", self.http.timeout_secs);
        match &self.http.proxy {
            Some(proxy) => println!("  Proxy: {}", proxy),
            None => println!("  Proxy: none"),
        }
        if !self.app.default_languages.is_empty() {
            println!("  Default Languages: {}", self.app.default_languages.join(", "));
        }
        println!("  Default Format: {}", self.app.default_output_format);
        println!("  Max Concurrent Jobs: {}", self.app.max_concurrent_jobs);
    }

    pub fn proxy(&self) -> Option<ProxyConfig> {
        self.http.proxy.as_deref().map(ProxyConfig::new)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
