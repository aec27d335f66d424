//! HAL embedded-resource resolution.
//!
//! List responses carry related resources once, under `_embedded`. To ease
//! consumption, `link_embedded` compiles the related resource into each
//! referencing item, keyed by a foreign-id property.

use serde_json::{json, Value};

/// Attach to every item of `_embedded.<list_key>` (first key that exists)
/// the matching entry of `_embedded.<related_key>`, selected by
/// `item.<foreign_key> == related.id`. The related entry lands under the
/// item's own `_embedded.<related_key>` as a one-element array.
pub fn link_embedded(
    data: &mut Value,
    list_keys: &[&str],
    related_key: &str,
    foreign_key: &str,
) {
    let Some(embedded) = data.get("_embedded") else {
        return;
    };

    let related: Vec<Value> = embedded
        .get(related_key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if related.is_empty() {
        return;
    }

    let Some(list_key) = list_keys
        .iter()
        .find(|k| embedded.get(**k).and_then(Value::as_array).is_some())
    else {
        return;
    };

    let Some(items) = data
        .get_mut("_embedded")
        .and_then(|e| e.get_mut(*list_key))
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for item in items {
        let foreign_id = item.get(foreign_key).and_then(Value::as_str);
        let matched = foreign_id.and_then(|id| {
            related
                .iter()
                .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
        });
        if let Some(matched) = matched {
            if !item.get("_embedded").map_or(false, Value::is_object) {
                item["_embedded"] = json!({});
            }
            item["_embedded"][related_key] = Value::Array(vec![matched.clone()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing() -> Value {
        json!({
            "count": 2,
            "_embedded": {
                "task": [
                    {"id": "t1", "processDefinitionId": "pd1"},
                    {"id": "t2", "processDefinitionId": "pd2"}
                ],
                "processDefinition": [
                    {"id": "pd1", "key": "invoice"},
                    {"id": "pd2", "key": "order"}
                ]
            }
        })
    }

    #[test]
    fn links_each_item_to_its_definition() {
        let mut data = listing();
        link_embedded(&mut data, &["task", "tasks"], "processDefinition", "processDefinitionId");

        let tasks = &data["_embedded"]["task"];
        assert_eq!(
            tasks[0]["_embedded"]["processDefinition"][0]["key"],
            json!("invoice")
        );
        assert_eq!(
            tasks[1]["_embedded"]["processDefinition"][0]["key"],
            json!("order")
        );
    }

    #[test]
    fn accepts_plural_list_key() {
        let mut data = json!({
            "_embedded": {
                "tasks": [{"id": "t1", "processDefinitionId": "pd1"}],
                "processDefinition": [{"id": "pd1"}]
            }
        });
        link_embedded(&mut data, &["task", "tasks"], "processDefinition", "processDefinitionId");
        assert!(data["_embedded"]["tasks"][0]["_embedded"]["processDefinition"].is_array());
    }

    #[test]
    fn leaves_unmatched_items_untouched() {
        let mut data = json!({
            "_embedded": {
                "task": [{"id": "t1", "processDefinitionId": "unknown"}],
                "processDefinition": [{"id": "pd1"}]
            }
        });
        link_embedded(&mut data, &["task", "tasks"], "processDefinition", "processDefinitionId");
        assert!(data["_embedded"]["task"][0].get("_embedded").is_none());
    }

    #[test]
    fn no_embedded_is_a_no_op() {
        let mut data = json!({"count": 0});
        link_embedded(&mut data, &["task"], "processDefinition", "processDefinitionId");
        assert_eq!(data, json!({"count": 0}));
    }

    #[test]
    fn preexisting_item_embedded_is_extended() {
        let mut data = json!({
            "_embedded": {
                "task": [{
                    "id": "t1",
                    "processDefinitionId": "pd1",
                    "_embedded": {"identityLink": [{"type": "assignee"}]}
                }],
                "processDefinition": [{"id": "pd1"}]
            }
        });
        link_embedded(&mut data, &["task"], "processDefinition", "processDefinitionId");
        let item = &data["_embedded"]["task"][0];
        assert!(item["_embedded"]["identityLink"].is_array());
        assert!(item["_embedded"]["processDefinition"].is_array());
    }
}
