use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::{mask_secret, EmbeddingError, EmbeddingProvider};

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Connection settings for an Azure OpenAI embedding deployment.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl AzureOpenAiConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }

    /// Refuse blank settings before any request is made.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        let required = [
            ("endpoint", &self.endpoint),
            ("api key", &self.api_key),
            ("deployment", &self.deployment),
            ("api version", &self.api_version),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(EmbeddingError::configuration(format!(
                    "Azure OpenAI {} is not set",
                    name
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(EmbeddingError::configuration(
                "Embedding timeout must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Embeddings URL of the deployment.
    pub fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

impl fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &mask_secret(&self.api_key))
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Embedding provider backed by the Azure OpenAI REST API.
///
/// Sends one text per request to the configured deployment and reads the
/// vector from `data[0].embedding`.
pub struct AzureOpenAiEmbedder {
    config: AzureOpenAiConfig,
    client: reqwest::Client,
}

impl AzureOpenAiEmbedder {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AzureOpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAiEmbedder {
    fn name(&self) -> &str {
        &self.config.deployment
    }

    #[instrument(skip(self, text), fields(deployment = %self.config.deployment, bytes = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = self.config.url();
        let body = json!({ "input": text });
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // 1s, 2s, 4s, ... capped at 32s
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                debug!(attempt, delay_secs = delay.as_secs(), "Retrying embedding request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("api-key", &self.config.api_key)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: Value = response.json().await.map_err(|e| {
                            EmbeddingError::invalid_response(format!("body is not JSON: {}", e))
                        })?;
                        return parse_embedding_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = EmbeddingError::Api {
                        status: status.as_u16(),
                        body: body_text,
                    };

                    if is_retryable(status.as_u16()) {
                        warn!(attempt, status = status.as_u16(), "Transient embedding error");
                        last_err = Some(err);
                        continue;
                    }

                    return Err(err);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Embedding request failed");
                    last_err = Some(EmbeddingError::Request(e.to_string()));
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| EmbeddingError::Request("Embedding failed after retries".to_string())))
    }
}

/// Rate limits and server errors are worth another attempt.
pub(crate) fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Extract `data[0].embedding` as a vector of finite floats.
pub(crate) fn parse_embedding_response(json: &Value) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| EmbeddingError::invalid_response("missing data[0].embedding"))?;

    embedding
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .map(|f| f as f32)
                .filter(|f| f.is_finite())
                .ok_or_else(|| {
                    EmbeddingError::invalid_response(format!(
                        "embedding[{}] is not a finite number",
                        i
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    fn config() -> AzureOpenAiConfig {
        AzureOpenAiConfig::new(
            "https://example.openai.azure.com/",
            "secret-key-1234",
            "text-embedding-3-large",
        )
    }

    #[test]
    fn test_url() {
        assert_eq!(
            config().url(),
            "https://example.openai.azure.com/openai/deployments/text-embedding-3-large/embeddings?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_validate_rejects_blank_settings() {
        assert!(config().validate().is_ok());

        let mut missing_key = config();
        missing_key.api_key = "  ".to_string();
        assert!(matches!(
            missing_key.validate(),
            Err(EmbeddingError::Configuration(_))
        ));

        let mut zero_timeout = config();
        zero_timeout.timeout_secs = 0;
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_debug_masks_api_key() {
        let rendered = format!("{:?}", config());
        assert!(rendered.contains("****1234"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(429));
        assert!(is_retryable(500));
        assert!(is_retryable(503));
        assert!(!is_retryable(400));
        assert!(!is_retryable(401));
        assert!(!is_retryable(404));
    }

    #[test]
    fn test_parse_embedding_response() {
        let json = json!({"data": [{"index": 0, "embedding": [0.1, -0.2, 3]}]});
        assert_eq!(parse_embedding_response(&json).unwrap(), vec![0.1, -0.2, 3.0]);
    }

    #[test]
    fn test_parse_rejects_malformed_responses() {
        for json in [
            json!({}),
            json!({"data": []}),
            json!({"data": [{"embedding": "nope"}]}),
            json!({"data": [{"embedding": [0.1, "x"]}]}),
        ] {
            assert!(matches!(
                parse_embedding_response(&json),
                Err(EmbeddingError::InvalidResponse(_))
            ));
        }
    }

    /// Records the fields of every `embed` span.
    struct SpanFields(Arc<Mutex<Vec<(String, String)>>>);

    impl tracing::field::Visit for SpanFields {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0
                .lock()
                .unwrap()
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for SpanFields {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: Context<'_, S>,
        ) {
            if attrs.metadata().name() == "embed" {
                attrs.record(&mut SpanFields(self.0.clone()));
            }
        }
    }

    #[tokio::test]
    async fn test_embed_span_records_input_size_in_bytes() {
        let fields = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(SpanFields(fields.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut unreachable = config();
        unreachable.endpoint = "http://127.0.0.1:1".to_string();
        unreachable.max_retries = 0;
        let embedder = AzureOpenAiEmbedder::new(unreachable).unwrap();

        // Multi-byte text: ten bytes, eight characters.
        let text = "ñandú ok";
        assert!(embedder.embed(text).await.is_err());

        let fields = fields.lock().unwrap();
        assert!(fields
            .iter()
            .any(|(name, value)| name == "bytes" && *value == text.len().to_string()));
        assert!(fields.iter().all(|(name, _)| name != "chars"));
    }
}
