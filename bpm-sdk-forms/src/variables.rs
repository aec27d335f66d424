//! In-memory map of the form's typed variables with dirty tracking.

use crate::error::FormError;
use crate::typeutil::VariableType;
use bpm_sdk_client::VariableValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A named, typed value plus the bookkeeping the form lifecycle needs:
/// the original server value (dirty checking), the control's default
/// rendition (implicit-change checking) and a download URL for binary
/// payloads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: Option<VariableType>,
    pub value: Value,
    #[serde(default)]
    pub value_info: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

impl Variable {
    pub fn new(name: &str, value_type: Option<VariableType>, value: Value) -> Self {
        Self {
            name: name.to_owned(),
            value_type,
            value,
            value_info: Map::new(),
            original_value: None,
            default_value: None,
            content_url: None,
        }
    }

    /// Wire shape for submission payloads.
    pub fn to_wire(&self, value: Value) -> VariableValue {
        VariableValue {
            value,
            value_type: self.value_type.map(|t| t.as_str().to_owned()),
            value_info: self.value_info.clone(),
        }
    }
}

/// Variables are unique by name; dirtiness is always derived against the
/// original server value, never against what a control showed last.
#[derive(Default)]
pub struct VariableManager {
    variables: BTreeMap<String, Variable>,
    /// Set once server values have been merged in.
    pub fetched: bool,
}

impl VariableManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_variable(&mut self, variable: Variable) -> Result<(), FormError> {
        if self.variables.contains_key(&variable.name) {
            return Err(FormError::DuplicateVariable(variable.name));
        }
        self.variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    /// Register a bare name so its value gets fetched; no-op when known.
    pub fn fetch_variable(&mut self, name: &str) {
        self.variables
            .entry(name.to_owned())
            .or_insert_with(|| Variable::new(name, None, Value::Null));
    }

    pub fn destroy_variable(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    pub fn variable_value(&self, name: &str) -> Value {
        self.variables
            .get(name)
            .map(|v| v.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn set_variable_value(&mut self, name: &str, value: Value) -> Result<(), FormError> {
        let variable = self
            .variables
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownVariable(name.to_owned()))?;
        variable.value = value;
        Ok(())
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variables_mut(&mut self) -> impl Iterator<Item = &mut Variable> {
        self.variables.values_mut()
    }

    pub fn set_original_value(&mut self, name: &str, value: Value) {
        if let Some(variable) = self.variables.get_mut(name) {
            variable.original_value = Some(value);
        }
    }

    /// A variable with no recorded server value is always dirty.
    pub fn is_dirty(&self, name: &str) -> bool {
        match self.variables.get(name) {
            Some(variable) => match &variable.original_value {
                Some(original) => *original != variable.value,
                None => true,
            },
            None => false,
        }
    }

    pub fn is_json_variable(&self, name: &str) -> bool {
        self.has_type(name, VariableType::Json)
    }

    pub fn is_date_variable(&self, name: &str) -> bool {
        self.has_type(name, VariableType::Date)
    }

    fn has_type(&self, name: &str, ty: VariableType) -> bool {
        self.variables
            .get(name)
            .and_then(|v| v.value_type)
            .map_or(false, |t| t == ty)
    }
}
