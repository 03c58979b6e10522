//! Configuration for the stream indexer.
//!
//! All settings are read once at startup into an [`IndexerConfig`] and passed
//! explicitly to the components that need them.

mod dependencies;

pub use dependencies::Dependencies;

use std::time::Duration;

use stream_indexer_repository::{IndexConfig, DEFAULT_PRIMARY_INDEX, DEFAULT_TAG_INDEX};
use stream_indexer_repository::interfaces::DEFAULT_SIGNING_SERVICE;
use url::Url;

use crate::enrichment::{OpenAiConfig, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::IndexingError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable console output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Verbosity of the indexer's own crates (`info` or `debug`).
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Read `LOG_LEVEL` and `LOG_FORMAT` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read logging settings through an arbitrary key lookup.
    ///
    /// Unknown levels fall back to `info`; any format other than `json` is
    /// pretty output.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let level = lookup("LOG_LEVEL")
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| matches!(v.as_str(), "trace" | "debug" | "info" | "warn" | "error"))
            .unwrap_or_else(|| "info".to_string());

        let format = match lookup("LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self { level, format }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        format!(
            "stream_indexer={level},stream_indexer_repository={level},index_admin={level},warn",
            level = self.level
        )
    }
}

/// Complete indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Search engine endpoint, always with a scheme.
    pub endpoint: String,
    /// Target index names.
    pub indices: IndexConfig,
    /// Region the request signature is scoped to.
    pub region: Option<String>,
    /// Service name the request signature is scoped to.
    pub signing_service: String,
    pub logging: LoggingConfig,
    /// Enrichment service settings; `None` disables enrichment.
    pub enrichment: Option<OpenAiConfig>,
    /// Record an `isBroken` flag for each save.
    pub detect_broken: bool,
}

impl IndexerConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `AOSS_ENDPOINT`: Search engine endpoint (required; `https://` is assumed without a scheme)
    /// - `AOSS_INDEX`: Primary index name (default: "saves")
    /// - `AOSS_TAG_INDEX`: Discovery tag index name (default: "discovertags")
    /// - `AWS_REGION` / `AWS_DEFAULT_REGION`: Signing region
    /// - `AOSS_SERVICE`: Signing service name (default: "aoss")
    /// - `LOG_LEVEL`: `info` or `debug` (default: info)
    /// - `LOG_FORMAT`: `json` for structured logs (default: pretty)
    /// - `OPENAI_API_KEY`: Enables enrichment when set
    /// - `OPENAI_MODEL`: Enrichment model (default: gpt-4o-mini)
    /// - `OPENAI_BASE_URL`: Enrichment API base URL (default: https://api.openai.com/v1)
    /// - `ENRICHMENT_TIMEOUT_SECS`: Enrichment request timeout (default: 10)
    /// - `ENRICHMENT_DETECT_BROKEN`: Record `isBroken` for saves (default: false)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IndexingError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let endpoint = get("AOSS_ENDPOINT")
            .ok_or_else(|| IndexingError::config("AOSS_ENDPOINT is required"))
            .and_then(|raw| normalize_endpoint(&raw))?;

        let indices = IndexConfig::new(
            get("AOSS_INDEX").unwrap_or_else(|| DEFAULT_PRIMARY_INDEX.to_string()),
            get("AOSS_TAG_INDEX").unwrap_or_else(|| DEFAULT_TAG_INDEX.to_string()),
        );

        let region = get("AWS_REGION").or_else(|| get("AWS_DEFAULT_REGION"));
        let signing_service =
            get("AOSS_SERVICE").unwrap_or_else(|| DEFAULT_SIGNING_SERVICE.to_string());

        let timeout = match get("ENRICHMENT_TIMEOUT_SECS") {
            None => None,
            Some(raw) => Some(raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                IndexingError::config(format!("ENRICHMENT_TIMEOUT_SECS is not a number: {}", raw))
            })?),
        };

        let enrichment = get("OPENAI_API_KEY").map(|api_key| {
            let config = OpenAiConfig::new(api_key)
                .with_model(get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()))
                .with_base_url(
                    get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                );
            match timeout {
                Some(timeout) => config.with_timeout(timeout),
                None => config,
            }
        });

        let detect_broken = get("ENRICHMENT_DETECT_BROKEN")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            indices,
            region,
            signing_service,
            logging: LoggingConfig::from_lookup(&lookup),
            enrichment,
            detect_broken,
        })
    }
}

/// Add `https://` when the endpoint has no scheme and drop trailing slashes.
fn normalize_endpoint(raw: &str) -> Result<String, IndexingError> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    let endpoint = with_scheme.trim_end_matches('/').to_string();

    let parsed = Url::parse(&endpoint)
        .map_err(|e| IndexingError::config(format!("Invalid AOSS_ENDPOINT '{}': {}", raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(IndexingError::config(format!(
            "AOSS_ENDPOINT must be an http(s) URL: {}",
            raw
        )));
    }

    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            IndexerConfig::from_lookup(lookup(&[("AOSS_ENDPOINT", "abc.us-east-1.aoss.amazonaws.com")]))
                .unwrap();

        assert_eq!(config.endpoint, "https://abc.us-east-1.aoss.amazonaws.com");
        assert_eq!(config.indices, IndexConfig::new("saves", "discovertags"));
        assert_eq!(config.signing_service, "aoss");
        assert_eq!(config.region, None);
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.enrichment.is_none());
        assert!(!config.detect_broken);
    }

    #[test]
    fn test_missing_endpoint() {
        let err = IndexerConfig::from_lookup(lookup(&[("AOSS_ENDPOINT", "  ")])).unwrap_err();
        assert!(matches!(err, IndexingError::ConfigError(_)));
    }

    #[test]
    fn test_full_configuration() {
        let config = IndexerConfig::from_lookup(lookup(&[
            ("AOSS_ENDPOINT", "http://localhost:9200/"),
            ("AOSS_INDEX", "saves-v2"),
            ("AOSS_TAG_INDEX", "tags-v2"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
            ("AOSS_SERVICE", "es"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FORMAT", "json"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4.1-mini"),
            ("ENRICHMENT_TIMEOUT_SECS", "3"),
            ("ENRICHMENT_DETECT_BROKEN", "true"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "http://localhost:9200");
        assert_eq!(config.indices, IndexConfig::new("saves-v2", "tags-v2"));
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.signing_service, "es");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.detect_broken);

        let enrichment = config.enrichment.unwrap();
        assert_eq!(enrichment.api_key, "sk-test");
        assert_eq!(enrichment.model, "gpt-4.1-mini");
        assert_eq!(enrichment.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(enrichment.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_region_prefers_aws_region() {
        let config = IndexerConfig::from_lookup(lookup(&[
            ("AOSS_ENDPOINT", "https://search.local"),
            ("AWS_REGION", "us-east-1"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(config.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(IndexerConfig::from_lookup(lookup(&[("AOSS_ENDPOINT", "ftp://search.local")])).is_err());
        assert!(IndexerConfig::from_lookup(lookup(&[
            ("AOSS_ENDPOINT", "search.local"),
            ("ENRICHMENT_TIMEOUT_SECS", "ten"),
        ]))
        .is_err());
    }

    #[test]
    fn test_logging_filter() {
        let logging = LoggingConfig::from_lookup(lookup(&[("LOG_LEVEL", "verbose")]));
        assert_eq!(logging.level, "info");
        assert_eq!(
            logging.filter_directive(),
            "stream_indexer=info,stream_indexer_repository=info,index_admin=info,warn"
        );
    }
}
