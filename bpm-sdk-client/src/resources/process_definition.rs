//! Process-definition resource — definition queries, instance start and
//! start-form interaction. Most endpoints are addressable by definition id
//! or by latest-version key.

use super::{require, to_query};
use crate::error::EngineError;
use crate::http::HttpClient;
use crate::variable::VariableValue;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How a definition endpoint is addressed: `/{id}` or `/key/{key}`.
#[derive(Clone, Copy, Debug)]
pub enum DefinitionRef<'a> {
    Id(&'a str),
    Key(&'a str),
}

impl<'a> DefinitionRef<'a> {
    fn segments(&self) -> Result<Vec<&'a str>, EngineError> {
        match self {
            DefinitionRef::Id(id) => {
                require("process definition id", id)?;
                Ok(vec!["process-definition", id])
            }
            DefinitionRef::Key(key) => {
                require("process definition key", key)?;
                Ok(vec!["process-definition", "key", key])
            }
        }
    }

    fn with(&self, tail: &'a str) -> Result<Vec<&'a str>, EngineError> {
        let mut segments = self.segments()?;
        segments.push(tail);
        Ok(segments)
    }
}

pub struct ProcessDefinitions {
    http: Arc<HttpClient>,
}

impl ProcessDefinitions {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["process-definition"], &to_query(params))
            .await
    }

    pub async fn count(&self, params: &[(&str, &str)]) -> Result<Value, EngineError> {
        self.http
            .get(&["process-definition", "count"], &to_query(params))
            .await
    }

    pub async fn get(&self, by: DefinitionRef<'_>) -> Result<Value, EngineError> {
        self.http.get(&by.segments()?, &[]).await
    }

    /// Start an instance. `variables` seed the instance; a business key may
    /// be attached for later correlation.
    pub async fn start(
        &self,
        by: DefinitionRef<'_>,
        variables: &Value,
        business_key: Option<&str>,
    ) -> Result<Value, EngineError> {
        self.http
            .post(
                &by.with("start")?,
                &[],
                Some(&start_body(variables, business_key)),
            )
            .await
    }

    /// Start an instance through the form path, running server-side
    /// form-field validation.
    pub async fn submit_form(
        &self,
        by: DefinitionRef<'_>,
        variables: &Value,
        business_key: Option<&str>,
    ) -> Result<Value, EngineError> {
        self.http
            .post(
                &by.with("submit-form")?,
                &[],
                Some(&start_body(variables, business_key)),
            )
            .await
    }

    pub async fn form_variables(
        &self,
        by: DefinitionRef<'_>,
        names: &[String],
        deserialize_values: bool,
    ) -> Result<BTreeMap<String, VariableValue>, EngineError> {
        let query = super::task::form_variables_query(names, deserialize_values);
        let data = self.http.get(&by.with("form-variables")?, &query).await?;
        super::task::parse_variable_map(data)
    }

    /// Start-form reference (key and context path).
    pub async fn start_form(&self, by: DefinitionRef<'_>) -> Result<Value, EngineError> {
        self.http.get(&by.with("startForm")?, &[]).await
    }

    /// The definition's BPMN 2.0 XML.
    pub async fn xml(&self, by: DefinitionRef<'_>) -> Result<Value, EngineError> {
        self.http.get(&by.with("xml")?, &[]).await
    }

    /// Activate or suspend the definition (optionally cascading to instances).
    pub async fn suspended(
        &self,
        by: DefinitionRef<'_>,
        suspended: bool,
        include_instances: bool,
    ) -> Result<Value, EngineError> {
        self.http
            .put(
                &by.with("suspended")?,
                Some(&json!({
                    "suspended": suspended,
                    "includeProcessInstances": include_instances,
                })),
            )
            .await
    }
}

fn start_body(variables: &Value, business_key: Option<&str>) -> Value {
    let mut body = Map::new();
    body.insert("variables".into(), variables.clone());
    if let Some(key) = business_key {
        body.insert("businessKey".into(), Value::String(key.to_owned()));
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_and_key_address_different_paths() {
        assert_eq!(
            DefinitionRef::Id("pd1").segments().unwrap(),
            vec!["process-definition", "pd1"]
        );
        assert_eq!(
            DefinitionRef::Key("invoice").with("submit-form").unwrap(),
            vec!["process-definition", "key", "invoice", "submit-form"]
        );
    }

    #[test]
    fn empty_pointer_is_rejected() {
        assert!(DefinitionRef::Id("").segments().is_err());
        assert!(DefinitionRef::Key("").segments().is_err());
    }

    #[test]
    fn start_body_includes_business_key_only_when_given() {
        assert_eq!(start_body(&json!({}), None), json!({"variables": {}}));
        assert_eq!(
            start_body(&json!({}), Some("order-7")),
            json!({"variables": {}, "businessKey": "order-7"})
        );
    }
}
