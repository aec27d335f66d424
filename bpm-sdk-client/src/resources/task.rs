//! Task resource — worklist queries, lifecycle operations, form interaction,
//! local variables, comments and identity links.

use super::{require, to_query};
use crate::error::EngineError;
use crate::hal;
use crate::http::HttpClient;
use crate::variable::VariableValue;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Tasks {
    http: Arc<HttpClient>,
}

impl Tasks {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Query the task list. The related process definitions arrive once
    /// under `_embedded` and are compiled into each task.
    pub async fn list(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        let mut data = self.http.get(&["task"], &to_query(params)).await?;
        hal::link_embedded(
            &mut data,
            &["task", "tasks"],
            "processDefinition",
            "processDefinitionId",
        );
        Ok(data)
    }

    pub async fn get(&self, id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http.get(&["task", id], &[]).await
    }

    pub async fn create(&self, task: &Value) -> Result<Value, EngineError> {
        self.http.post(&["task", "create"], &[], Some(task)).await
    }

    pub async fn update(&self, task: &Value) -> Result<Value, EngineError> {
        let id = task
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidRequest("task update needs a task id".into()))?;
        self.http.put(&["task", id], Some(task)).await
    }

    /// Claim the task for a user; fails server-side when already assigned.
    pub async fn claim(&self, id: &str, user_id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(&["task", id, "claim"], &[], Some(&json!({ "userId": user_id })))
            .await
    }

    /// Reset the assignee; unlike `claim` there is no assignment check.
    pub async fn unclaim(&self, id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http.post(&["task", id, "unclaim"], &[], None).await
    }

    pub async fn assignee(&self, id: &str, user_id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(
                &["task", id, "assignee"],
                &[],
                Some(&json!({ "userId": user_id })),
            )
            .await
    }

    pub async fn delegate(&self, id: &str, user_id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(
                &["task", id, "delegate"],
                &[],
                Some(&json!({ "userId": user_id })),
            )
            .await
    }

    pub async fn complete(&self, id: &str, variables: &Value) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(
                &["task", id, "complete"],
                &[],
                Some(&json!({ "variables": variables })),
            )
            .await
    }

    /// Complete through the form path: a delegated task is resolved instead
    /// of completed, and declared form-field validators run server-side.
    pub async fn submit_form(&self, id: &str, variables: &Value) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(
                &["task", id, "submit-form"],
                &[],
                Some(&json!({ "variables": variables })),
            )
            .await
    }

    pub async fn bpmn_error(
        &self,
        id: &str,
        error_code: &str,
        error_message: Option<&str>,
        variables: &Value,
    ) -> Result<Value, EngineError> {
        require("task id", id)?;
        require("error code", error_code)?;
        self.http
            .post(
                &["task", id, "bpmnError"],
                &[],
                Some(&bpmn_error_body(error_code, error_message, variables)),
            )
            .await
    }

    pub async fn bpmn_escalation(
        &self,
        id: &str,
        escalation_code: &str,
        variables: &Value,
    ) -> Result<Value, EngineError> {
        require("task id", id)?;
        require("escalation code", escalation_code)?;
        self.http
            .post(
                &["task", id, "bpmnEscalation"],
                &[],
                Some(&json!({
                    "escalationCode": escalation_code,
                    "variables": variables,
                })),
            )
            .await
    }

    /// Form reference (key and context path) for the task.
    pub async fn form(&self, id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http.get(&["task", id, "form"], &[]).await
    }

    /// Values of the form's variables. `names` restricts the fetch; the
    /// engine gets them as one comma-joined parameter.
    pub async fn form_variables(
        &self,
        id: &str,
        names: &[String],
        deserialize_values: bool,
    ) -> Result<BTreeMap<String, VariableValue>, EngineError> {
        require("task id", id)?;
        let query = form_variables_query(names, deserialize_values);
        let data = self.http.get(&["task", id, "form-variables"], &query).await?;
        parse_variable_map(data)
    }

    pub async fn local_variables(&self, id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http.get(&["task", id, "localVariables"], &[]).await
    }

    pub async fn set_local_variable(
        &self,
        id: &str,
        name: &str,
        value: &VariableValue,
    ) -> Result<Value, EngineError> {
        require("task id", id)?;
        require("variable name", name)?;
        let body = serde_json::to_value(value)?;
        self.http
            .put(&["task", id, "localVariables", name], Some(&body))
            .await
    }

    /// Batch update/delete of local variables; deletions override updates.
    pub async fn modify_variables(&self, id: &str, body: &Value) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(&["task", id, "localVariables"], &[], Some(body))
            .await
    }

    pub async fn delete_variable(&self, id: &str, name: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        require("variable name", name)?;
        self.http
            .delete(&["task", id, "localVariables", name], &[])
            .await
    }

    pub async fn comments(&self, id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http.get(&["task", id, "comment"], &[]).await
    }

    pub async fn create_comment(&self, id: &str, message: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(
                &["task", id, "comment", "create"],
                &[],
                Some(&json!({ "message": message })),
            )
            .await
    }

    pub async fn identity_links(&self, id: &str) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http.get(&["task", id, "identity-links"], &[]).await
    }

    /// `params` names either a user or a group, plus the link type.
    pub async fn add_identity_link(&self, id: &str, params: &Value) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(&["task", id, "identity-links"], &[], Some(params))
            .await
    }

    pub async fn delete_identity_link(
        &self,
        id: &str,
        params: &Value,
    ) -> Result<Value, EngineError> {
        require("task id", id)?;
        self.http
            .post(&["task", id, "identity-links", "delete"], &[], Some(params))
            .await
    }
}

fn bpmn_error_body(code: &str, message: Option<&str>, variables: &Value) -> Value {
    let mut body = Map::new();
    body.insert("variables".into(), variables.clone());
    body.insert("errorCode".into(), Value::String(code.to_owned()));
    if let Some(message) = message {
        body.insert("errorMessage".into(), Value::String(message.to_owned()));
    }
    Value::Object(body)
}

pub(crate) fn form_variables_query(
    names: &[String],
    deserialize_values: bool,
) -> Vec<(String, String)> {
    let mut query = vec![(
        "deserializeValues".to_owned(),
        deserialize_values.to_string(),
    )];
    if !names.is_empty() {
        query.push(("variableNames".to_owned(), names.join(",")));
    }
    query
}

pub(crate) fn parse_variable_map(
    data: Value,
) -> Result<BTreeMap<String, VariableValue>, EngineError> {
    if data.is_null() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_variables_query_joins_names() {
        let names = vec!["amount".to_owned(), "approved".to_owned()];
        let query = form_variables_query(&names, false);
        assert_eq!(
            query,
            vec![
                ("deserializeValues".to_owned(), "false".to_owned()),
                ("variableNames".to_owned(), "amount,approved".to_owned()),
            ]
        );
    }

    #[test]
    fn form_variables_query_omits_empty_names() {
        let query = form_variables_query(&[], true);
        assert_eq!(
            query,
            vec![("deserializeValues".to_owned(), "true".to_owned())]
        );
    }

    #[test]
    fn bpmn_error_body_is_optional_on_message() {
        let body = bpmn_error_body("paymentFailed", None, &json!({}));
        assert_eq!(body, json!({"variables": {}, "errorCode": "paymentFailed"}));

        let body = bpmn_error_body("paymentFailed", Some("no funds"), &json!({}));
        assert_eq!(body["errorMessage"], json!("no funds"));
    }

    #[test]
    fn parse_variable_map_handles_empty_response() {
        assert!(parse_variable_map(Value::Null).unwrap().is_empty());

        let map = parse_variable_map(json!({
            "amount": {"value": 7, "type": "Integer"}
        }))
        .unwrap();
        assert_eq!(map["amount"].value, json!(7));
    }
}
