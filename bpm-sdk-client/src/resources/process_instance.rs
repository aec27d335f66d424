//! Process-instance resource — runtime queries and instance variables.

use super::{require, to_query};
use crate::error::EngineError;
use crate::http::HttpClient;
use crate::variable::VariableValue;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ProcessInstances {
    http: Arc<HttpClient>,
}

impl ProcessInstances {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Extended instance query; the engine takes the criteria as a POST body
    /// so variable filters are not squeezed into query parameters.
    pub async fn list(&self, query: &Value) -> Result<Value, EngineError> {
        self.http
            .post(&["process-instance"], &[], Some(query))
            .await
    }

    pub async fn count(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["process-instance", "count"], &to_query(params))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Value, EngineError> {
        require("process instance id", id)?;
        self.http.get(&["process-instance", id], &[]).await
    }

    pub async fn variables(&self, id: &str) -> Result<Value, EngineError> {
        require("process instance id", id)?;
        self.http
            .get(&["process-instance", id, "variables"], &[])
            .await
    }

    pub async fn variable(&self, id: &str, name: &str) -> Result<Value, EngineError> {
        require("process instance id", id)?;
        require("variable name", name)?;
        self.http
            .get(&["process-instance", id, "variables", name], &[])
            .await
    }

    pub async fn set_variable(
        &self,
        id: &str,
        name: &str,
        value: &VariableValue,
    ) -> Result<Value, EngineError> {
        require("process instance id", id)?;
        require("variable name", name)?;
        let body = serde_json::to_value(value)?;
        self.http
            .put(&["process-instance", id, "variables", name], Some(&body))
            .await
    }

    pub async fn delete_variable(&self, id: &str, name: &str) -> Result<Value, EngineError> {
        require("process instance id", id)?;
        require("variable name", name)?;
        self.http
            .delete(&["process-instance", id, "variables", name], &[])
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, EngineError> {
        require("process instance id", id)?;
        self.http.delete(&["process-instance", id], &[]).await
    }

    pub async fn suspended(&self, id: &str, suspended: bool) -> Result<Value, EngineError> {
        require("process instance id", id)?;
        self.http
            .put(
                &["process-instance", id, "suspended"],
                Some(&json!({ "suspended": suspended })),
            )
            .await
    }
}
