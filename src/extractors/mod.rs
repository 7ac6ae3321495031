use serde::{Deserialize, Serialize};

pub mod marker;
pub mod ytcfg;

use crate::FetchResult;

pub use marker::MarkerExtractor;
pub use ytcfg::YtcfgExtractor;

/// Pulls the InnerTube API key out of watch-page HTML
pub trait CredentialExtractor: Send + Sync {
    /// Return the first credential found, or `CredentialNotFound`
    fn extract(&self, html: &str) -> FetchResult<String>;

    /// Short name used in logs
    fn strategy_name(&self) -> &'static str;
}

/// Which extraction strategy a pipeline uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStrategy {
    /// Regex over the raw page for the `"INNERTUBE_API_KEY":"..."` marker
    #[default]
    Marker,
    /// Parse the `ytcfg.set({...})` JSON blob embedded in a script tag
    Ytcfg,
}

impl CredentialStrategy {
    pub fn build(self) -> Box<dyn CredentialExtractor> {
        match self {
            CredentialStrategy::Marker => Box::new(MarkerExtractor::new()),
            CredentialStrategy::Ytcfg => Box::new(YtcfgExtractor::new()),
        }
    }
}

/// Tokens are restricted to the URL-safe base64 alphabet
pub(crate) fn is_token(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
