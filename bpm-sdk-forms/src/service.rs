//! The narrow seam between the form lifecycle and the engine. The real
//! client implements it; tests plug in an in-memory engine.

use crate::error::FormError;
use async_trait::async_trait;
use bpm_sdk_client::resources::process_definition::DefinitionRef;
use bpm_sdk_client::{EngineClient, EngineError, VariableValue};
use serde_json::Value;
use std::collections::BTreeMap;

/// What the form is attached to. The order of the variants is also the
/// storage-key fallback chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormTarget {
    Task { id: String },
    ProcessDefinition { id: Option<String>, key: Option<String> },
    CaseInstance { id: String },
}

impl FormTarget {
    pub fn task(id: &str) -> Self {
        FormTarget::Task { id: id.to_owned() }
    }

    pub fn process_definition(id: &str) -> Self {
        FormTarget::ProcessDefinition {
            id: Some(id.to_owned()),
            key: None,
        }
    }

    pub fn process_definition_key(key: &str) -> Self {
        FormTarget::ProcessDefinition {
            id: None,
            key: Some(key.to_owned()),
        }
    }

    pub fn case_instance(id: &str) -> Self {
        FormTarget::CaseInstance { id: id.to_owned() }
    }

    /// The id that keys persisted form state:
    /// task id, else process definition id, else case instance id.
    pub fn storage_id(&self) -> Option<&str> {
        match self {
            FormTarget::Task { id } => Some(id),
            FormTarget::ProcessDefinition { id, .. } => id.as_deref(),
            FormTarget::CaseInstance { id } => Some(id),
        }
    }

    fn definition_ref(&self) -> Result<DefinitionRef<'_>, FormError> {
        match self {
            FormTarget::ProcessDefinition { id: Some(id), .. } => Ok(DefinitionRef::Id(id)),
            FormTarget::ProcessDefinition { key: Some(key), .. } => Ok(DefinitionRef::Key(key)),
            _ => Err(FormError::Engine(EngineError::InvalidRequest(
                "process definition id or key is mandatory".into(),
            ))),
        }
    }
}

#[async_trait]
pub trait FormService: Send + Sync {
    /// Fetch form markup from a URL (absolute, or relative to the REST root).
    async fn load_form(&self, url: &str) -> Result<String, FormError>;

    async fn form_variables(
        &self,
        target: &FormTarget,
        names: &[String],
        deserialize_values: bool,
    ) -> Result<BTreeMap<String, VariableValue>, FormError>;

    async fn submit_form(
        &self,
        target: &FormTarget,
        variables: &BTreeMap<String, VariableValue>,
        business_key: Option<&str>,
    ) -> Result<Value, FormError>;

    async fn bpmn_error(
        &self,
        target: &FormTarget,
        code: &str,
        message: Option<&str>,
        variables: &BTreeMap<String, VariableValue>,
    ) -> Result<(), FormError>;

    async fn bpmn_escalation(
        &self,
        target: &FormTarget,
        code: &str,
        variables: &BTreeMap<String, VariableValue>,
    ) -> Result<(), FormError>;

    /// Download URL for a binary variable, when the target supports one.
    fn content_url(&self, target: &FormTarget, variable: &str) -> Option<String>;
}

#[async_trait]
impl FormService for EngineClient {
    async fn load_form(&self, url: &str) -> Result<String, FormError> {
        Ok(self.http().load(url, &[]).await?)
    }

    async fn form_variables(
        &self,
        target: &FormTarget,
        names: &[String],
        deserialize_values: bool,
    ) -> Result<BTreeMap<String, VariableValue>, FormError> {
        match target {
            FormTarget::Task { id } => Ok(self
                .tasks()
                .form_variables(id, names, deserialize_values)
                .await?),
            FormTarget::ProcessDefinition { .. } => {
                let definition_ref = target.definition_ref()?;
                Ok(self
                    .process_definitions()
                    .form_variables(definition_ref, names, deserialize_values)
                    .await?)
            }
            FormTarget::CaseInstance { id } => {
                let data = self.case_instances().variables(id).await?;
                let mut all: BTreeMap<String, VariableValue> = serde_json::from_value(data)
                    .map_err(EngineError::from)?;
                if !names.is_empty() {
                    all.retain(|name, _| names.contains(name));
                }
                Ok(all)
            }
        }
    }

    async fn submit_form(
        &self,
        target: &FormTarget,
        variables: &BTreeMap<String, VariableValue>,
        business_key: Option<&str>,
    ) -> Result<Value, FormError> {
        let variables = serde_json::to_value(variables).map_err(EngineError::from)?;
        match target {
            FormTarget::Task { id } => Ok(self.tasks().submit_form(id, &variables).await?),
            FormTarget::ProcessDefinition { .. } => {
                let definition_ref = target.definition_ref()?;
                Ok(self
                    .process_definitions()
                    .submit_form(definition_ref, &variables, business_key)
                    .await?)
            }
            FormTarget::CaseInstance { .. } => Err(FormError::Engine(
                EngineError::InvalidRequest("case instances take no form submission".into()),
            )),
        }
    }

    async fn bpmn_error(
        &self,
        target: &FormTarget,
        code: &str,
        message: Option<&str>,
        variables: &BTreeMap<String, VariableValue>,
    ) -> Result<(), FormError> {
        let FormTarget::Task { id } = target else {
            return Err(FormError::Engine(EngineError::InvalidRequest(
                "bpmn errors need a task form".into(),
            )));
        };
        let variables = serde_json::to_value(variables).map_err(EngineError::from)?;
        self.tasks().bpmn_error(id, code, message, &variables).await?;
        Ok(())
    }

    async fn bpmn_escalation(
        &self,
        target: &FormTarget,
        code: &str,
        variables: &BTreeMap<String, VariableValue>,
    ) -> Result<(), FormError> {
        let FormTarget::Task { id } = target else {
            return Err(FormError::Engine(EngineError::InvalidRequest(
                "bpmn escalations need a task form".into(),
            )));
        };
        let variables = serde_json::to_value(variables).map_err(EngineError::from)?;
        self.tasks().bpmn_escalation(id, code, &variables).await?;
        Ok(())
    }

    fn content_url(&self, target: &FormTarget, variable: &str) -> Option<String> {
        let FormTarget::Task { id } = target else {
            return None;
        };
        self.http()
            .url_for(&["task", id, "variables", variable, "data"])
            .ok()
            .map(|url| url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_id_follows_the_fallback_chain() {
        assert_eq!(FormTarget::task("t1").storage_id(), Some("t1"));
        assert_eq!(
            FormTarget::process_definition("pd1").storage_id(),
            Some("pd1")
        );
        assert_eq!(
            FormTarget::process_definition_key("invoice").storage_id(),
            None
        );
        assert_eq!(FormTarget::case_instance("c1").storage_id(), Some("c1"));
    }

    #[test]
    fn content_url_points_into_the_task_variables() {
        let client = EngineClient::from_base_url("http://host/rest").unwrap();
        let url = client
            .content_url(&FormTarget::task("t1"), "invoiceDoc")
            .unwrap();
        assert_eq!(url, "http://host/rest/task/t1/variables/invoiceDoc/data");

        assert!(client
            .content_url(&FormTarget::process_definition("pd1"), "x")
            .is_none());
    }
}
