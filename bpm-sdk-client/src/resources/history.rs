//! History resource — audit queries over finished process instances, tasks,
//! variables, activities, incidents and user operations.

use super::{require, to_query};
use crate::error::EngineError;
use crate::http::HttpClient;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct History {
    http: Arc<HttpClient>,
}

impl History {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn process_instance(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["history", "process-instance"], &to_query(params))
            .await
    }

    pub async fn process_instance_count(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Value, EngineError> {
        self.http
            .get(&["history", "process-instance", "count"], &to_query(params))
            .await
    }

    pub async fn task(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http.get(&["history", "task"], &to_query(params)).await
    }

    pub async fn task_count(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["history", "task", "count"], &to_query(params))
            .await
    }

    pub async fn variable_instance(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["history", "variable-instance"], &to_query(params))
            .await
    }

    pub async fn variable_instance_count(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Value, EngineError> {
        self.http
            .get(
                &["history", "variable-instance", "count"],
                &to_query(params),
            )
            .await
    }

    pub async fn activity_instance(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["history", "activity-instance"], &to_query(params))
            .await
    }

    pub async fn activity_instance_count(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Value, EngineError> {
        self.http
            .get(
                &["history", "activity-instance", "count"],
                &to_query(params),
            )
            .await
    }

    pub async fn incident(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["history", "incident"], &to_query(params))
            .await
    }

    pub async fn user_operation(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["history", "user-operation"], &to_query(params))
            .await
    }

    pub async fn user_operation_count(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Value, EngineError> {
        self.http
            .get(&["history", "user-operation", "count"], &to_query(params))
            .await
    }

    pub async fn set_user_operation_annotation(
        &self,
        operation_id: &str,
        annotation: &str,
    ) -> Result<Value, EngineError> {
        require("operation id", operation_id)?;
        self.http
            .put(
                &["history", "user-operation", operation_id, "set-annotation"],
                Some(&json!({ "annotation": annotation })),
            )
            .await
    }

    pub async fn delete_variable(&self, id: &str) -> Result<Value, EngineError> {
        require("variable instance id", id)?;
        self.http
            .delete(&["history", "variable-instance", id], &[])
            .await
    }

    pub async fn delete_all_variables(&self, process_instance_id: &str) -> Result<Value, EngineError> {
        require("process instance id", process_instance_id)?;
        self.http
            .delete(
                &[
                    "history",
                    "process-instance",
                    process_instance_id,
                    "variable-instances",
                ],
                &[],
            )
            .await
    }
}
