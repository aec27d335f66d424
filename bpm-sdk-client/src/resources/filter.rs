//! Filter resource — stored task queries and their execution.

use super::{require, to_query};
use crate::error::EngineError;
use crate::hal;
use crate::http::HttpClient;
use serde_json::Value;
use std::sync::Arc;

pub struct Filters {
    http: Arc<HttpClient>,
}

impl Filters {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http.get(&["filter"], &to_query(params)).await
    }

    pub async fn get(&self, id: &str) -> Result<Value, EngineError> {
        require("filter id", id)?;
        self.http.get(&["filter", id], &[]).await
    }

    pub async fn create(&self, filter: &Value) -> Result<Value, EngineError> {
        self.http
            .post(&["filter", "create"], &[], Some(filter))
            .await
    }

    pub async fn update(&self, filter: &Value) -> Result<Value, EngineError> {
        let id = filter
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidRequest("filter update needs a filter id".into()))?;
        self.http.put(&["filter", id], Some(filter)).await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, EngineError> {
        require("filter id", id)?;
        self.http.delete(&["filter", id], &[]).await
    }

    /// Run the stored query, extended by `query` criteria. Task results
    /// carry their process definitions under `_embedded` and are compiled
    /// the same way a plain task listing is.
    pub async fn execute_list(&self, id: &str, query: &Value) -> Result<Value, EngineError> {
        require("filter id", id)?;
        let mut data = self
            .http
            .post(&["filter", id, "list"], &[], Some(query))
            .await?;
        hal::link_embedded(
            &mut data,
            &["task", "tasks"],
            "processDefinition",
            "processDefinitionId",
        );
        Ok(data)
    }

    pub async fn execute_single(&self, id: &str, query: &Value) -> Result<Value, EngineError> {
        require("filter id", id)?;
        self.http
            .post(&["filter", id, "singleResult"], &[], Some(query))
            .await
    }

    pub async fn execute_count(&self, id: &str, query: &Value) -> Result<Value, EngineError> {
        require("filter id", id)?;
        self.http
            .post(&["filter", id, "count"], &[], Some(query))
            .await
    }
}
