//! Single-document operations.

use async_trait::async_trait;
use index_sync_shared::{Document, DocumentIdentity};
use serde_json::{json, Value};

use super::{Call, Transport};
use crate::errors::TransportError;
use crate::events::EventName;
use crate::interfaces::DocumentOperations;
use crate::types::RequestParams;

/// Document id as a path segment, plus params carrying the identity routing.
fn address(
    identity: &DocumentIdentity,
    params: &RequestParams,
    operation: &'static str,
) -> Result<(String, RequestParams), TransportError> {
    let id = identity
        .id
        .as_ref()
        .ok_or(TransportError::MissingId(operation))?
        .to_string();

    let mut params = params.clone();
    if params.routing.is_none() {
        params.routing = identity.routing.clone();
    }
    Ok((id, params))
}

fn request_payload(id: &str, params: &RequestParams) -> Value {
    json!({ "id": id, "params": params.to_value() })
}

#[async_trait]
impl DocumentOperations for Transport {
    async fn get(
        &self,
        index: &str,
        identity: &DocumentIdentity,
        params: &RequestParams,
    ) -> Result<Value, TransportError> {
        let (id, params) = address(identity, params, "get")?;
        let call = Call::new(EventName::Get, Some(index), request_payload(&id, &params));
        Ok(self
            .observe(call, self.engine.get_document(index, &id, &params))
            .await?)
    }

    async fn exist(
        &self,
        index: &str,
        identity: &DocumentIdentity,
        params: &RequestParams,
    ) -> Result<bool, TransportError> {
        let (id, params) = address(identity, params, "exist")?;
        let call = Call::new(EventName::Exist, Some(index), request_payload(&id, &params));
        Ok(self
            .observe(call, self.engine.document_exists(index, &id, &params))
            .await?)
    }

    async fn count(&self, index: &str, query: Option<&Value>) -> Result<u64, TransportError> {
        let call = Call::new(
            EventName::Count,
            Some(index),
            query.cloned().unwrap_or(Value::Null),
        );
        let response = self.observe(call, self.engine.count(index, query)).await?;
        response
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| TransportError::serialization("count response without count"))
    }

    async fn index(
        &self,
        index: &str,
        document: &Document,
        params: &RequestParams,
    ) -> Result<Value, TransportError> {
        self.guard("index")?;

        let (id, params) = address(document.identity(), params, "index")?;
        let body = Value::Object(document.mutated_source().clone());
        let call = Call::new(EventName::Index, Some(index), request_payload(&id, &params));
        Ok(self
            .observe(call, self.engine.index_document(index, &id, &body, &params))
            .await?)
    }

    async fn update(
        &self,
        index: &str,
        document: &Document,
        params: &RequestParams,
    ) -> Result<Value, TransportError> {
        self.guard("update")?;

        let (id, params) = address(document.identity(), params, "update")?;
        let body = json!({ "doc": document.mutated_source() });
        let call = Call::new(EventName::Update, Some(index), request_payload(&id, &params));
        Ok(self
            .observe(call, self.engine.update_document(index, &id, &body, &params))
            .await?)
    }

    async fn delete(
        &self,
        index: &str,
        identity: &DocumentIdentity,
        params: &RequestParams,
    ) -> Result<Value, TransportError> {
        self.guard("delete")?;

        let (id, params) = address(identity, params, "delete")?;
        let call = Call::new(EventName::Delete, Some(index), request_payload(&id, &params));
        Ok(self
            .observe(call, self.engine.delete_document(index, &id, &params))
            .await?)
    }
}
