//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust client.

use std::fmt;

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, GetParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::IndexConfig;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use case_indexer_shared::{DocId, IndexDocument};

/// Optional basic-auth credentials.
#[derive(Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// let config = IndexConfig::canonical(3072)?;
/// let client = OpenSearchClient::new("http://localhost:9200", config, None).await?;
/// client.create_index().await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index identity and vector shape
    /// * `auth` - Optional basic-auth credentials
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(
        url: &str,
        index_config: IndexConfig,
        auth: Option<BasicAuth>,
    ) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some(auth) = auth {
            builder = builder.auth(Credentials::Basic(auth.username, auth.password));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            vector_dimensions = index_config.vector_dimensions,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Lines of the newline-delimited bulk body: one `create` action line and
    /// one source line per document. `create` fails with 409 for an existing
    /// id instead of replacing the document.
    fn bulk_lines(index: &str, documents: &[IndexDocument]) -> Result<Vec<Value>, SearchIndexError> {
        let mut lines = Vec::with_capacity(documents.len() * 2);

        for doc in documents {
            let source = serde_json::to_value(doc)
                .map_err(|e| SearchIndexError::validation(format!("{}: {}", doc.doc_id, e)))?;
            lines.push(json!({"create": {"_index": index, "_id": doc.doc_id.as_str()}}));
            lines.push(source);
        }

        Ok(lines)
    }

    /// Map a bulk response to one result per submitted document.
    ///
    /// A document without a matching item in the response counts as failed.
    fn parse_bulk_response(doc_ids: &[&str], response: &Value) -> BatchOperationSummary {
        let items = response
            .get("items")
            .and_then(|i| i.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let results = doc_ids
            .iter()
            .map(|doc_id| {
                let item = items.iter().find_map(|item| {
                    item.get("create")
                        .filter(|i| i.get("_id").and_then(|id| id.as_str()) == Some(*doc_id))
                });

                match item {
                    None => BatchOperationResult::failed(
                        *doc_id,
                        SearchIndexError::bulk_operation("missing from bulk response"),
                    ),
                    Some(item) => match item.get("error") {
                        Some(_) if item.get("status").and_then(|s| s.as_u64()) == Some(409) => {
                            BatchOperationResult::failed(
                                *doc_id,
                                SearchIndexError::document_exists(*doc_id),
                            )
                        }
                        Some(err) => BatchOperationResult::failed(
                            *doc_id,
                            SearchIndexError::index(err.to_string()),
                        ),
                        None => BatchOperationResult::succeeded(*doc_id),
                    },
                }
            })
            .collect();

        BatchOperationSummary::from_results(results)
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchClient {
    fn index_name(&self) -> &str {
        &self.index_config.name
    }

    #[instrument(skip(self), fields(doc_id = %doc_id))]
    async fn get_document(&self, doc_id: &DocId) -> Result<Option<Value>, SearchIndexError> {
        let response = self
            .client
            .get(GetParts::IndexId(&self.index_config.name, doc_id.as_str()))
            .send()
            .await
            .map_err(|e| SearchIndexError::lookup(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            debug!("Document not found");
            return Ok(None);
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Get request failed");
            return Err(SearchIndexError::lookup(format!(
                "Get failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        if body.get("found").and_then(|f| f.as_bool()) == Some(false) {
            return Ok(None);
        }

        body.get("_source")
            .cloned()
            .map(Some)
            .ok_or_else(|| SearchIndexError::parse("get response has no _source"))
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn upsert_documents(
        &self,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let body: Vec<JsonBody<Value>> = Self::bulk_lines(&self.index_config.name, documents)?
            .into_iter()
            .map(JsonBody::from)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_operation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_operation(format!(
                "Bulk failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let doc_ids: Vec<&str> = documents.iter().map(|d| d.doc_id.as_str()).collect();
        let summary = Self::parse_bulk_response(&doc_ids, &response_body);

        if summary.failed > 0 {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Bulk create had failures"
            );
        } else {
            debug!(succeeded = summary.succeeded, "Bulk create completed");
        }

        Ok(summary)
    }

    async fn index_exists(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&self.index_config.name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            other => Err(SearchIndexError::index_management(format!(
                "Index exists check returned status {}",
                other
            ))),
        }
    }

    #[instrument(skip(self), fields(index = %self.index_config.name))]
    async fn create_index(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_config.name))
            .body(self.index_config.settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_management(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_management(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!("Created index");
        Ok(())
    }
}
