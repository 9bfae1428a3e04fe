//! OpenSearch engine implementation.
//!
//! Thin binding of [`SearchEngine`] onto the OpenSearch Rust client. Every
//! method sends one request and hands back the raw JSON body, or an
//! [`EngineError`] built from the failed response.

use async_trait::async_trait;
use index_sync_shared::BulkRequestBody;
use opensearch::{
    cluster::ClusterHealthParts,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
        StatusCode,
    },
    indices::{
        IndicesCloseParts, IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts,
        IndicesGetAliasParts, IndicesOpenParts, IndicesPutMappingParts, IndicesPutSettingsParts,
        IndicesRefreshParts,
    },
    params::Refresh,
    BulkParts, CountParts, DeleteParts, ExistsParts, GetParts, IndexParts, OpenSearch,
    UpdateParts,
};
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use crate::errors::EngineError;
use crate::interfaces::SearchEngine;
use crate::types::{RefreshPolicy, RequestParams};

/// OpenSearch backed [`SearchEngine`].
///
/// # Example
///
/// ```ignore
/// let engine = OpenSearchEngine::new("http://localhost:9200")?;
/// let info = engine.info().await?;
/// ```
pub struct OpenSearchEngine {
    client: OpenSearch,
    url: String,
}

impl OpenSearchEngine {
    /// Create an engine connected to a single node at `url`.
    ///
    /// No request is sent; connection failures surface on the first call.
    pub fn new(url: &str) -> Result<Self, EngineError> {
        let parsed_url = Url::parse(url).map_err(|e| EngineError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| EngineError::connection(e.to_string()))?;

        info!(url = %url, "Created OpenSearch engine");

        Ok(Self {
            client: OpenSearch::new(transport),
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl From<opensearch::Error> for EngineError {
    fn from(err: opensearch::Error) -> Self {
        match err.status_code() {
            Some(status) => EngineError::new(status.as_u16(), err.to_string()),
            None => EngineError::connection(err.to_string()),
        }
    }
}

fn refresh(policy: RefreshPolicy) -> Refresh {
    match policy {
        RefreshPolicy::True => Refresh::True,
        RefreshPolicy::False => Refresh::False,
        RefreshPolicy::WaitFor => Refresh::WaitFor,
    }
}

/// Read a response body, turning non-success statuses into errors.
async fn read(response: Response) -> Result<Value, EngineError> {
    let status = response.status_code();
    let text = response.text().await?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    if status.is_success() {
        Ok(body)
    } else {
        debug!(status = %status, "Engine request failed");
        Err(EngineError::from_response(status.as_u16(), &body))
    }
}

/// Map a HEAD response onto found / not found.
fn found(response: &Response) -> Result<bool, EngineError> {
    match response.status_code() {
        status if status.is_success() => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        status => Err(EngineError::new(
            status.as_u16(),
            format!("existence check failed with status {}", status),
        )),
    }
}

#[async_trait]
impl SearchEngine for OpenSearchEngine {
    async fn info(&self) -> Result<Value, EngineError> {
        read(self.client.info().send().await?).await
    }

    async fn health(&self) -> Result<Value, EngineError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await?;
        read(response).await
    }

    #[instrument(skip(self, body, params), fields(operations = body.len()))]
    async fn bulk(
        &self,
        index: &str,
        body: &BulkRequestBody,
        params: &RequestParams,
    ) -> Result<Value, EngineError> {
        let lines: Vec<JsonBody<Value>> = body.lines().into_iter().map(JsonBody::from).collect();

        let mut request = self.client.bulk(BulkParts::Index(index)).body(lines);
        if let Some(policy) = params.refresh {
            request = request.refresh(refresh(policy));
        }
        if let Some(routing) = params.routing.as_deref() {
            request = request.routing(routing);
        }
        if let Some(pipeline) = params.pipeline.as_deref() {
            request = request.pipeline(pipeline);
        }
        if let Some(timeout) = params.timeout.as_deref() {
            request = request.timeout(timeout);
        }

        read(request.send().await?).await
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body.clone())
            .send()
            .await?;
        read(response).await
    }

    async fn delete_index(&self, index: &str) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await?;
        read(response).await
    }

    async fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await?;
        found(&response)
    }

    async fn put_mapping(&self, index: &str, mapping: &Value) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .body(mapping.clone())
            .send()
            .await?;
        read(response).await
    }

    async fn put_settings(&self, index: &str, settings: &Value) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .put_settings(IndicesPutSettingsParts::Index(&[index]))
            .body(settings.clone())
            .send()
            .await?;
        read(response).await
    }

    async fn update_aliases(&self, actions: &Value) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .update_aliases()
            .body(actions.clone())
            .send()
            .await?;
        read(response).await
    }

    async fn get_alias(&self, alias: &str) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await?;
        read(response).await
    }

    async fn open_index(&self, index: &str) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .open(IndicesOpenParts::Index(&[index]))
            .send()
            .await?;
        read(response).await
    }

    async fn close_index(&self, index: &str) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .close(IndicesCloseParts::Index(&[index]))
            .send()
            .await?;
        read(response).await
    }

    async fn refresh(&self, index: &str) -> Result<Value, EngineError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await?;
        read(response).await
    }

    async fn get_document(
        &self,
        index: &str,
        id: &str,
        params: &RequestParams,
    ) -> Result<Value, EngineError> {
        let mut request = self.client.get(GetParts::IndexId(index, id));
        if let Some(routing) = params.routing.as_deref() {
            request = request.routing(routing);
        }
        read(request.send().await?).await
    }

    async fn document_exists(
        &self,
        index: &str,
        id: &str,
        params: &RequestParams,
    ) -> Result<bool, EngineError> {
        let mut request = self.client.exists(ExistsParts::IndexId(index, id));
        if let Some(routing) = params.routing.as_deref() {
            request = request.routing(routing);
        }
        found(&request.send().await?)
    }

    async fn count(&self, index: &str, query: Option<&Value>) -> Result<Value, EngineError> {
        let indices = [index];
        let request = self.client.count(CountParts::Index(&indices));
        let response = match query {
            Some(query) => request.body(query.clone()).send().await?,
            None => request.send().await?,
        };
        read(response).await
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
        params: &RequestParams,
    ) -> Result<Value, EngineError> {
        let mut request = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(document.clone());
        if let Some(policy) = params.refresh {
            request = request.refresh(refresh(policy));
        }
        if let Some(routing) = params.routing.as_deref() {
            request = request.routing(routing);
        }
        if let Some(pipeline) = params.pipeline.as_deref() {
            request = request.pipeline(pipeline);
        }
        if let Some(timeout) = params.timeout.as_deref() {
            request = request.timeout(timeout);
        }
        read(request.send().await?).await
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        body: &Value,
        params: &RequestParams,
    ) -> Result<Value, EngineError> {
        let mut request = self
            .client
            .update(UpdateParts::IndexId(index, id))
            .body(body.clone());
        if let Some(policy) = params.refresh {
            request = request.refresh(refresh(policy));
        }
        if let Some(routing) = params.routing.as_deref() {
            request = request.routing(routing);
        }
        if let Some(timeout) = params.timeout.as_deref() {
            request = request.timeout(timeout);
        }
        read(request.send().await?).await
    }

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        params: &RequestParams,
    ) -> Result<Value, EngineError> {
        let mut request = self.client.delete(DeleteParts::IndexId(index, id));
        if let Some(policy) = params.refresh {
            request = request.refresh(refresh(policy));
        }
        if let Some(routing) = params.routing.as_deref() {
            request = request.routing(routing);
        }
        if let Some(timeout) = params.timeout.as_deref() {
            request = request.timeout(timeout);
        }
        read(request.send().await?).await
    }
}

impl std::fmt::Debug for OpenSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchEngine")
            .field("url", &self.url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let err = OpenSearchEngine::new("not a url").unwrap_err();
        assert_eq!(err.status, None);
    }

    #[test]
    fn test_new_accepts_valid_url() {
        let engine = OpenSearchEngine::new("http://localhost:9200").unwrap();
        assert_eq!(engine.url(), "http://localhost:9200");
    }

    #[tokio::test]
    async fn test_count_without_server_is_connection_error() {
        let engine = OpenSearchEngine::new("http://127.0.0.1:1").unwrap();

        let err = engine
            .count("users", Some(&serde_json::json!({ "query": { "match_all": {} } })))
            .await
            .unwrap_err();

        assert_eq!(err.status, None);
    }

    #[test]
    fn test_refresh_mapping() {
        assert!(matches!(refresh(RefreshPolicy::True), Refresh::True));
        assert!(matches!(refresh(RefreshPolicy::WaitFor), Refresh::WaitFor));
    }
}
