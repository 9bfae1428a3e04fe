//! Index lifecycle operations.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{acknowledged, Call, Transport};
use crate::errors::TransportError;
use crate::events::EventName;
use crate::interfaces::IndexOperations;

#[async_trait]
impl IndexOperations for Transport {
    async fn create_index(&self, index: &str, body: &Value) -> Result<bool, TransportError> {
        self.guard("create_index")?;

        let call = Call::new(EventName::CreateIndex, Some(index), body.clone());
        match self
            .observe(call, self.engine.create_index(index, body))
            .await
        {
            Ok(response) => {
                info!(index = %index, "Created index");
                Ok(acknowledged(&response))
            }
            Err(err) if err.is_already_exists() => {
                info!(index = %index, "Index already exists");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_index(&self, index: &str) -> Result<bool, TransportError> {
        self.guard("delete_index")?;

        let call = Call::new(EventName::DeleteIndex, Some(index), Value::Null);
        let response = self
            .observe(call, self.engine.delete_index(index))
            .await?;
        info!(index = %index, "Deleted index");
        Ok(acknowledged(&response))
    }

    async fn index_exists(&self, index: &str) -> Result<bool, TransportError> {
        let call = Call::new(EventName::Exist, Some(index), Value::Null);
        Ok(self
            .observe(call, self.engine.index_exists(index))
            .await?)
    }

    async fn update_mapping(&self, index: &str, mapping: &Value) -> Result<bool, TransportError> {
        self.guard("update_mapping")?;

        let call = Call::new(EventName::UpdateMapping, Some(index), mapping.clone());
        let response = self
            .observe(call, self.engine.put_mapping(index, mapping))
            .await?;
        Ok(acknowledged(&response))
    }

    async fn update_settings(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<bool, TransportError> {
        self.guard("update_settings")?;

        let call = Call::new(EventName::UpdateSettings, Some(index), settings.clone());
        let response = self
            .observe(call, self.engine.put_settings(index, settings))
            .await?;
        Ok(acknowledged(&response))
    }

    async fn open(&self, index: &str) -> Result<bool, TransportError> {
        self.guard("open")?;

        let call = Call::new(EventName::Open, Some(index), Value::Null);
        let response = self.observe(call, self.engine.open_index(index)).await?;
        Ok(acknowledged(&response))
    }

    async fn close(&self, index: &str) -> Result<bool, TransportError> {
        self.guard("close")?;

        let call = Call::new(EventName::Close, Some(index), Value::Null);
        let response = self
            .observe(call, self.engine.close_index(index))
            .await?;
        Ok(acknowledged(&response))
    }

    async fn refresh(&self, index: &str) -> Result<(), TransportError> {
        let call = Call::new(EventName::Refresh, Some(index), json!({}));
        self.observe(call, self.engine.refresh(index)).await?;
        Ok(())
    }
}
