//! Wire shape of a typed engine variable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a `{name -> {value, type, valueInfo}}` variable map as the
/// engine sends and accepts it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableValue {
    #[serde(default)]
    pub value: Value,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    #[serde(rename = "valueInfo", default, skip_serializing_if = "Map::is_empty")]
    pub value_info: Map<String, Value>,
}

impl VariableValue {
    pub fn new(value: Value, value_type: Option<&str>) -> Self {
        Self {
            value,
            value_type: value_type.map(str::to_owned),
            value_info: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_engine_spelling() {
        let raw = json!({"value": 42, "type": "Integer", "valueInfo": {}});
        let var: VariableValue = serde_json::from_value(raw).unwrap();
        assert_eq!(var.value, json!(42));
        assert_eq!(var.value_type.as_deref(), Some("Integer"));

        let out = serde_json::to_value(&var).unwrap();
        assert_eq!(out, json!({"value": 42, "type": "Integer"}));
    }

    #[test]
    fn tolerates_missing_fields() {
        let var: VariableValue = serde_json::from_value(json!({"value": null})).unwrap();
        assert!(var.value.is_null());
        assert!(var.value_type.is_none());
    }

    #[test]
    fn keeps_value_info() {
        let raw = json!({
            "value": "AAEC",
            "type": "File",
            "valueInfo": {"filename": "a.pdf", "mimeType": "application/pdf"}
        });
        let var: VariableValue = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&var).unwrap(), raw);
    }
}
