//! Tenant resource — multi-tenancy administration.

use super::{require, to_query};
use crate::error::EngineError;
use crate::http::HttpClient;
use serde_json::Value;
use std::sync::Arc;

pub struct Tenants {
    http: Arc<HttpClient>,
}

impl Tenants {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http.get(&["tenant"], &to_query(params)).await
    }

    pub async fn count(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http.get(&["tenant", "count"], &to_query(params)).await
    }

    pub async fn get(&self, id: &str) -> Result<Value, EngineError> {
        require("tenant id", id)?;
        self.http.get(&["tenant", id], &[]).await
    }

    pub async fn create(&self, tenant: &Value) -> Result<Value, EngineError> {
        self.http
            .post(&["tenant", "create"], &[], Some(tenant))
            .await
    }

    pub async fn update(&self, tenant: &Value) -> Result<Value, EngineError> {
        let id = tenant
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidRequest("tenant update needs a tenant id".into()))?;
        self.http.put(&["tenant", id], Some(tenant)).await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, EngineError> {
        require("tenant id", id)?;
        self.http.delete(&["tenant", id], &[]).await
    }
}
