//! Case-instance resource — minimal surface: queries and variables. Case
//! instances also participate in form-state storage keying.

use super::{require, to_query};
use crate::error::EngineError;
use crate::http::HttpClient;
use crate::variable::VariableValue;
use serde_json::Value;
use std::sync::Arc;

pub struct CaseInstances {
    http: Arc<HttpClient>,
}

impl CaseInstances {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http.get(&["case-instance"], &to_query(params)).await
    }

    pub async fn count(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["case-instance", "count"], &to_query(params))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Value, EngineError> {
        require("case instance id", id)?;
        self.http.get(&["case-instance", id], &[]).await
    }

    pub async fn variables(&self, id: &str) -> Result<Value, EngineError> {
        require("case instance id", id)?;
        self.http
            .get(&["case-instance", id, "variables"], &[])
            .await
    }

    pub async fn set_variable(
        &self,
        id: &str,
        name: &str,
        value: &VariableValue,
    ) -> Result<Value, EngineError> {
        require("case instance id", id)?;
        require("variable name", name)?;
        let body = serde_json::to_value(value)?;
        self.http
            .put(&["case-instance", id, "variables", name], Some(&body))
            .await
    }
}
