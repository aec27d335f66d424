//! Deployment resource — deployed resource inspection and removal.
//! Multipart deployment creation (binary upload) is out of scope.

use super::{require, to_query};
use crate::error::EngineError;
use crate::http::HttpClient;
use serde_json::Value;
use std::sync::Arc;

pub struct Deployments {
    http: Arc<HttpClient>,
}

impl Deployments {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http.get(&["deployment"], &to_query(params)).await
    }

    pub async fn count(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["deployment", "count"], &to_query(params))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Value, EngineError> {
        require("deployment id", id)?;
        self.http.get(&["deployment", id], &[]).await
    }

    pub async fn resources(&self, id: &str) -> Result<Value, EngineError> {
        require("deployment id", id)?;
        self.http.get(&["deployment", id, "resources"], &[]).await
    }

    pub async fn resource(&self, id: &str, resource_id: &str) -> Result<Value, EngineError> {
        require("deployment id", id)?;
        require("resource id", resource_id)?;
        self.http
            .get(&["deployment", id, "resources", resource_id], &[])
            .await
    }

    pub async fn delete(&self, id: &str, cascade: bool) -> Result<Value, EngineError> {
        require("deployment id", id)?;
        let query = vec![("cascade".to_owned(), cascade.to_string())];
        self.http.delete(&["deployment", id], &query).await
    }
}
