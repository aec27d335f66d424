//! Handler for select controls, optionally populated from a choices variable.

use crate::constants;
use crate::document::{ChoiceOption, ControlKind, FormControl, FormDocument};
use crate::error::FormError;
use crate::typeutil::{self, VariableType};
use crate::variables::{Variable, VariableManager};
use serde_json::Value;

pub struct ChoicesField {
    control: usize,
    variable_name: String,
    variable_type: Option<VariableType>,
    /// Variable whose value provides the option list, when given.
    choices_variable: Option<String>,
    multiple: bool,
    original_value: String,
}

impl ChoicesField {
    pub fn bind(
        index: usize,
        control: &FormControl,
        vm: &mut VariableManager,
    ) -> Result<Self, FormError> {
        let variable_name = control
            .attr(constants::VARIABLE_NAME)
            .unwrap_or_default()
            .to_owned();
        let variable_type = control
            .attr(constants::VARIABLE_TYPE)
            .map(str::parse)
            .transpose()?;
        let choices_variable = control
            .attr(constants::CHOICES)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let multiple = matches!(control.kind, ControlKind::Select { multiple: true });

        let selected = control.selected_values();
        let original_value = selected.first().cloned().unwrap_or_default();
        let initial = selected
            .first()
            .map(|v| Value::String(v.clone()))
            .unwrap_or(Value::Null);

        vm.create_variable(Variable::new(&variable_name, variable_type, initial))?;
        if let Some(choices) = &choices_variable {
            vm.fetch_variable(choices);
        }

        Ok(Self {
            control: index,
            variable_name,
            variable_type,
            choices_variable,
            multiple,
            original_value,
        })
    }

    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    pub fn original_value(&self) -> &str {
        &self.original_value
    }

    pub fn control(&self) -> usize {
        self.control
    }

    pub fn get_value(
        &mut self,
        doc: &FormDocument,
        vm: &mut VariableManager,
    ) -> Result<(), FormError> {
        let selected = doc.control(self.control).selected_values();
        let value = if self.multiple {
            Value::Array(selected.into_iter().map(Value::String).collect())
        } else {
            match selected.first() {
                Some(raw) => match self.variable_type {
                    Some(ty) => typeutil::coerce(raw, ty)?,
                    None => Value::String(raw.clone()),
                },
                None => Value::Null,
            }
        };
        vm.set_variable_value(&self.variable_name, value)
    }

    pub fn apply_value(
        &mut self,
        doc: &mut FormDocument,
        vm: &mut VariableManager,
    ) -> Result<(), FormError> {
        // refresh the option list from the choices variable first
        if let Some(choices_name) = &self.choices_variable {
            let choices = vm.variable_value(choices_name);
            let options = options_from_choices(&choices);
            if !options.is_empty() {
                let control = doc.control_mut(self.control);
                let previously_selected = control.selected_values();
                control.set_options(options);
                control.select_values(&previously_selected);
            }
        }

        let value = vm.variable_value(&self.variable_name);
        let control = doc.control_mut(self.control);
        let wanted: Vec<String> = match &value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().map(typeutil::render).collect(),
            other => vec![typeutil::render(other)],
        };
        control.select_values(&wanted);
        Ok(())
    }
}

/// An array provides plain values; an object maps values to labels.
fn options_from_choices(choices: &Value) -> Vec<ChoiceOption> {
    match choices {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let value = typeutil::render(item);
                ChoiceOption {
                    label: value.clone(),
                    value,
                    selected: false,
                }
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(value, label)| ChoiceOption {
                value: value.clone(),
                label: typeutil::render(label),
                selected: false,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bind_select(html: &str) -> (FormDocument, VariableManager, ChoicesField) {
        let doc = FormDocument::parse(html).unwrap();
        let mut vm = VariableManager::new();
        let field = ChoicesField::bind(0, doc.control(0), &mut vm).unwrap();
        (doc, vm, field)
    }

    #[test]
    fn markup_selection_seeds_the_variable() {
        let (_, vm, field) = bind_select(
            "<form><select bpm-variable-name='priority'>\
             <option value='low'>Low</option><option value='high' selected>High</option>\
             </select></form>",
        );
        assert_eq!(vm.variable_value("priority"), json!("high"));
        assert_eq!(field.original_value(), "high");
    }

    #[test]
    fn applies_the_variable_as_the_selection() {
        let (mut doc, mut vm, mut field) = bind_select(
            "<form><select bpm-variable-name='priority'>\
             <option value='low'>Low</option><option value='high'>High</option>\
             </select></form>",
        );
        vm.set_variable_value("priority", json!("low")).unwrap();
        field.apply_value(&mut doc, &mut vm).unwrap();
        assert_eq!(doc.control(0).selected_values(), vec!["low"]);
    }

    #[test]
    fn choices_variable_populates_the_options() {
        let (mut doc, mut vm, mut field) = bind_select(
            "<form><select bpm-variable-name='assignee' bpm-choices='candidates'></select></form>",
        );
        vm.set_variable_value("candidates", json!(["mary", "john"]))
            .unwrap();
        field.apply_value(&mut doc, &mut vm).unwrap();
        let control = doc.control(0);
        assert_eq!(control.options().len(), 2);
        assert_eq!(control.options()[0].value, "mary");
    }

    #[test]
    fn object_choices_map_values_to_labels() {
        let (mut doc, mut vm, mut field) = bind_select(
            "<form><select bpm-variable-name='dept' bpm-choices='departments'></select></form>",
        );
        vm.set_variable_value("departments", json!({"hr": "Human Resources"}))
            .unwrap();
        field.apply_value(&mut doc, &mut vm).unwrap();
        let option = &doc.control(0).options()[0];
        assert_eq!(option.value, "hr");
        assert_eq!(option.label, "Human Resources");
    }

    #[test]
    fn multiple_select_round_trips_an_array() {
        let (mut doc, mut vm, mut field) = bind_select(
            "<form><select multiple bpm-variable-name='tags'>\
             <option value='a'>A</option><option value='b'>B</option><option value='c'>C</option>\
             </select></form>",
        );
        vm.set_variable_value("tags", json!(["a", "c"])).unwrap();
        field.apply_value(&mut doc, &mut vm).unwrap();
        assert_eq!(doc.control(0).selected_values(), vec!["a", "c"]);

        field.get_value(&doc, &mut vm).unwrap();
        assert_eq!(vm.variable_value("tags"), json!(["a", "c"]));
    }

    #[test]
    fn typed_single_select_coerces_on_read() {
        let (mut doc, mut vm, mut field) = bind_select(
            "<form><select bpm-variable-name='level' bpm-variable-type='Integer'>\
             <option value='1'>one</option><option value='2'>two</option>\
             </select></form>",
        );
        doc.control_mut(0).select_values(&["2".to_owned()]);
        field.get_value(&doc, &mut vm).unwrap();
        assert_eq!(vm.variable_value("level"), json!(2));
    }
}
