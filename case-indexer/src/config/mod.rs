//! Configuration for the case indexer.
//!
//! Everything is read from environment variables (a `.env` file is loaded
//! first when present). Required settings are validated here, before any
//! case is processed.

mod dependencies;

pub use dependencies::{connect_index, Dependencies};

use std::env;
use std::str::FromStr;

use tracing::info;

use crate::IndexingError;
use case_indexer_pipeline::embedding::{mask_secret, DEFAULT_API_VERSION};
use case_indexer_pipeline::orchestrator::{DEFAULT_CONCURRENCY, DEFAULT_VECTOR_DIMENSIONS};
use case_indexer_pipeline::{AzureOpenAiConfig, OrchestratorConfig};
use case_indexer_repository::BasicAuth;
use case_indexer_shared::CASE_INDEX_NAME;

/// Default root directory of the filesystem document store.
pub const DEFAULT_STORE_ROOT: &str = "./data/cases";

/// Default OpenSearch URL.
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default embedding request timeout in seconds.
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// Default number of embedding retries on transient errors.
pub const DEFAULT_EMBEDDING_MAX_RETRIES: u32 = 3;

/// Environment variable that would override the index name. Must stay unset.
pub const INDEX_NAME_OVERRIDE_VAR: &str = "CASE_INDEX_NAME";

/// Settings needed to reach the case index, and nothing else.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub opensearch_url: String,
    pub opensearch_auth: Option<BasicAuth>,
    pub vector_dimensions: usize,
}

impl IndexSettings {
    /// Load from the process environment.
    ///
    /// Reads `OPENSEARCH_URL`, `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`
    /// and `CASE_INDEX_VECTOR_DIMENSIONS`; refuses a set `CASE_INDEX_NAME`.
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = get(INDEX_NAME_OVERRIDE_VAR) {
            return Err(IndexingError::config(format!(
                "{} is set to '{}'; the index name is fixed to '{}' and cannot be overridden",
                INDEX_NAME_OVERRIDE_VAR, name, CASE_INDEX_NAME
            )));
        }

        let opensearch_auth = match (get("OPENSEARCH_USERNAME"), get("OPENSEARCH_PASSWORD")) {
            (Some(username), Some(password)) => Some(BasicAuth { username, password }),
            (None, None) => None,
            _ => {
                return Err(IndexingError::config(
                    "OPENSEARCH_USERNAME and OPENSEARCH_PASSWORD must be set together",
                ))
            }
        };

        let vector_dimensions = parse_or(
            "CASE_INDEX_VECTOR_DIMENSIONS",
            get("CASE_INDEX_VECTOR_DIMENSIONS"),
            DEFAULT_VECTOR_DIMENSIONS,
        )?;
        if vector_dimensions == 0 {
            return Err(IndexingError::config(
                "CASE_INDEX_VECTOR_DIMENSIONS must be greater than zero",
            ));
        }

        Ok(Self {
            opensearch_url: get("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            opensearch_auth,
            vector_dimensions,
        })
    }
}

/// Settings of one indexer run.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub store_root: String,
    pub store_prefix: String,
    pub index: IndexSettings,
    pub embedding: AzureOpenAiConfig,
    pub concurrency: usize,
    pub verify_after_write: bool,
}

impl IndexerConfig {
    /// Load from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `CASE_STORE_ROOT`: document store root (default: ./data/cases)
    /// - `CASE_STORE_PREFIX`: key prefix of the case folders (default: none)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: optional basic auth
    /// - `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`,
    ///   `AZURE_OPENAI_EMBEDDING_DEPLOYMENT`: required
    /// - `AZURE_OPENAI_API_VERSION` (default: 2024-02-15-preview)
    /// - `CASE_INDEX_VECTOR_DIMENSIONS` (default: 3072)
    /// - `EMBEDDING_TIMEOUT_SECS` (default: 30), `EMBEDDING_MAX_RETRIES` (default: 3)
    /// - `INGEST_CONCURRENCY` (default: 4), `INGEST_VERIFY_AFTER_WRITE` (default: true)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let index = IndexSettings::from_lookup(&lookup)?;
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let required = |key: &str| {
            get(key).ok_or_else(|| IndexingError::config(format!("{} is not set", key)))
        };

        let mut embedding = AzureOpenAiConfig::new(
            required("AZURE_OPENAI_ENDPOINT")?,
            required("AZURE_OPENAI_API_KEY")?,
            required("AZURE_OPENAI_EMBEDDING_DEPLOYMENT")?,
        );
        embedding.api_version =
            get("AZURE_OPENAI_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        embedding.timeout_secs = parse_or(
            "EMBEDDING_TIMEOUT_SECS",
            get("EMBEDDING_TIMEOUT_SECS"),
            DEFAULT_EMBEDDING_TIMEOUT_SECS,
        )?;
        embedding.max_retries = parse_or(
            "EMBEDDING_MAX_RETRIES",
            get("EMBEDDING_MAX_RETRIES"),
            DEFAULT_EMBEDDING_MAX_RETRIES,
        )?;

        let config = Self {
            store_root: get("CASE_STORE_ROOT").unwrap_or_else(|| DEFAULT_STORE_ROOT.to_string()),
            store_prefix: get("CASE_STORE_PREFIX").unwrap_or_default(),
            index,
            embedding,
            concurrency: parse_or(
                "INGEST_CONCURRENCY",
                get("INGEST_CONCURRENCY"),
                DEFAULT_CONCURRENCY,
            )?,
            verify_after_write: parse_bool(
                "INGEST_VERIFY_AFTER_WRITE",
                get("INGEST_VERIFY_AFTER_WRITE"),
                true,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), IndexingError> {
        self.embedding.validate()?;
        self.orchestrator_config().validate()?;
        Ok(())
    }

    /// Orchestrator settings derived from this config.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            prefix: self.store_prefix.clone(),
            vector_dimensions: self.index.vector_dimensions,
            concurrency: self.concurrency,
            verify_after_write: self.verify_after_write,
        }
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_summary(&self) {
        info!(
            store_root = %self.store_root,
            store_prefix = %self.store_prefix,
            opensearch_url = %self.index.opensearch_url,
            opensearch_user = self.index.opensearch_auth.as_ref().map(|a| a.username.as_str()).unwrap_or(""),
            index = CASE_INDEX_NAME,
            embedding_endpoint = %self.embedding.endpoint,
            embedding_deployment = %self.embedding.deployment,
            embedding_api_version = %self.embedding.api_version,
            embedding_api_key = %mask_secret(&self.embedding.api_key),
            vector_dimensions = self.index.vector_dimensions,
            concurrency = self.concurrency,
            verify_after_write = self.verify_after_write,
            "Loaded configuration"
        );
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, IndexingError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| IndexingError::config(format!("{} has an invalid value '{}'", key, v))),
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool, IndexingError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(IndexingError::config(format!(
                "{} has an invalid value '{}'",
                key, v
            ))),
        },
    }
}
