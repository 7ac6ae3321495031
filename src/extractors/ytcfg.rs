use serde_json::Value;

use super::{is_token, CredentialExtractor};
use crate::{FetchResult, TranscriptError};

const YTCFG_CALL: &str = "ytcfg.set(";
const API_KEY_FIELD: &str = "INNERTUBE_API_KEY";

/// Reads the key from the JSON object passed to `ytcfg.set(...)` in the page scripts
pub struct YtcfgExtractor;

impl YtcfgExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Parse the first JSON value at the start of `source`, ignoring whatever follows it
    fn leading_json(source: &str) -> Option<Value> {
        serde_json::Deserializer::from_str(source)
            .into_iter::<Value>()
            .next()
            .and_then(|value| value.ok())
    }
}

impl CredentialExtractor for YtcfgExtractor {
    fn extract(&self, html: &str) -> FetchResult<String> {
        // The page calls ytcfg.set several times, sometimes with ("KEY", value) pairs
        for (offset, _) in html.match_indices(YTCFG_CALL) {
            let args = &html[offset + YTCFG_CALL.len()..];
            let Some(Value::Object(config)) = Self::leading_json(args) else {
                continue;
            };

            if let Some(key) = config.get(API_KEY_FIELD).and_then(Value::as_str) {
                if is_token(key) {
                    return Ok(key.to_string());
                }
                tracing::debug!("Ignoring malformed {} in ytcfg block", API_KEY_FIELD);
            }
        }

        Err(TranscriptError::CredentialNotFound)
    }

    fn strategy_name(&self) -> &'static str {
        "ytcfg"
    }
}

impl Default for YtcfgExtractor {
    fn default() -> Self {
        Self::new()
    }
}
