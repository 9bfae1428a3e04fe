//! Alias operations.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{acknowledged, Call, Transport};
use crate::errors::TransportError;
use crate::events::EventName;
use crate::interfaces::AliasOperations;

#[async_trait]
impl AliasOperations for Transport {
    async fn update_aliases(&self, actions: &Value) -> Result<bool, TransportError> {
        self.guard("update_aliases")?;

        let call = Call::new(EventName::UpdateAliases, None, actions.clone());
        let response = self
            .observe(call, self.engine.update_aliases(actions))
            .await?;
        Ok(acknowledged(&response))
    }

    async fn aliased_indices(&self, alias: &str) -> Result<Vec<String>, TransportError> {
        let call = Call::new(EventName::Get, None, json!({ "alias": alias }));
        match self.observe(call, self.engine.get_alias(alias)).await {
            Ok(response) => {
                let mut indices: Vec<String> = response
                    .as_object()
                    .map(|map| map.keys().cloned().collect())
                    .unwrap_or_default();
                indices.sort();
                Ok(indices)
            }
            Err(err) if err.status == Some(404) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}
