//! Handler for text inputs, textareas, checkboxes and file inputs.

use crate::constants;
use crate::document::{ControlKind, FormControl, FormDocument};
use crate::error::FormError;
use crate::typeutil::{self, VariableType};
use crate::variables::{Variable, VariableManager};
use serde_json::Value;

pub struct InputField {
    control: usize,
    variable_name: String,
    variable_type: Option<VariableType>,
    original_value: String,
    previous_value: String,
}

impl InputField {
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

        let original_value = control.value().to_owned();

        // the initial value is the raw control text; an empty control only
        // yields '' when a String type asks for it, null otherwise
        let initial = match control.kind {
            ControlKind::Checkbox => Value::Null,
            _ if !original_value.is_empty() => Value::String(original_value.clone()),
            _ if variable_type == Some(VariableType::String) => Value::String(String::new()),
            _ => Value::Null,
        };

        vm.create_variable(Variable::new(&variable_name, variable_type, initial))?;

        Ok(Self {
            control: index,
            variable_name,
            variable_type,
            previous_value: original_value.clone(),
            original_value,
        })
    }

    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    pub fn original_value(&self) -> &str {
        &self.original_value
    }

    /// What the control showed after the last read or apply.
    pub fn previous_value(&self) -> &str {
        &self.previous_value
    }

    pub fn control(&self) -> usize {
        self.control
    }

    pub fn get_value(
        &mut self,
        doc: &FormDocument,
        vm: &mut VariableManager,
    ) -> Result<(), FormError> {
        let control = doc.control(self.control);
        let value = match control.kind {
            ControlKind::Checkbox => Value::Bool(control.checked()),
            // file controls are filled by the submission's file transform
            ControlKind::FileInput => return Ok(()),
            _ => {
                let raw = control.value();
                match self.variable_type {
                    Some(ty) => typeutil::coerce(raw, ty)?,
                    None => Value::String(raw.to_owned()),
                }
            }
        };
        self.previous_value = control.value().to_owned();
        vm.set_variable_value(&self.variable_name, value)
    }

    pub fn apply_value(
        &mut self,
        doc: &mut FormDocument,
        vm: &mut VariableManager,
    ) -> Result<(), FormError> {
        let value = vm.variable_value(&self.variable_name);
        let control = doc.control_mut(self.control);
        match control.kind {
            ControlKind::Checkbox => control.set_checked(value == Value::Bool(true)),
            ControlKind::FileInput => {}
            _ => {
                let rendered = typeutil::render(&value);
                if control.value() != rendered {
                    control.set_value(&rendered);
                }
                self.previous_value = rendered;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bind_one(html: &str) -> (FormDocument, VariableManager, InputField) {
        let doc = FormDocument::parse(html).unwrap();
        let mut vm = VariableManager::new();
        let field = InputField::bind(0, doc.control(0), &mut vm).unwrap();
        (doc, vm, field)
    }

    // ── binding ──────────────────────────────────────────────────

    #[test]
    fn untyped_control_starts_null() {
        let (_, vm, _) =
            bind_one("<form><input type='text' bpm-variable-name='v'/></form>");
        let variable = vm.variable("v").unwrap();
        assert!(variable.value_type.is_none());
        assert_eq!(variable.value, Value::Null);
    }

    #[test]
    fn string_control_starts_empty() {
        let (_, vm, _) = bind_one(
            "<form><input type='text' bpm-variable-name='v' bpm-variable-type='String'/></form>",
        );
        assert_eq!(vm.variable_value("v"), json!(""));
    }

    #[test]
    fn markup_value_becomes_the_initial_value() {
        let (_, vm, _) = bind_one(
            "<form><input type='text' bpm-variable-name='v' bpm-variable-type='String' value='preset'/></form>",
        );
        assert_eq!(vm.variable_value("v"), json!("preset"));
    }

    #[test]
    fn unknown_declared_type_fails_binding() {
        let doc = FormDocument::parse(
            "<form><input bpm-variable-name='v' bpm-variable-type='Money'/></form>",
        )
        .unwrap();
        let mut vm = VariableManager::new();
        assert!(matches!(
            InputField::bind(0, doc.control(0), &mut vm),
            Err(FormError::UnknownType(_))
        ));
    }

    // ── get_value ────────────────────────────────────────────────

    #[test]
    fn reads_and_coerces_the_control_value() {
        let (mut doc, mut vm, mut field) = bind_one(
            "<form><input type='text' bpm-variable-name='v' bpm-variable-type='Integer'/></form>",
        );
        doc.control_mut(0).set_value("100");
        field.get_value(&doc, &mut vm).unwrap();
        assert_eq!(vm.variable_value("v"), json!(100));
    }

    #[test]
    fn rejects_a_float_for_an_integer_and_keeps_null() {
        let (mut doc, mut vm, mut field) = bind_one(
            "<form><input type='text' bpm-variable-name='v' bpm-variable-type='Integer'/></form>",
        );
        doc.control_mut(0).set_value("100.1");
        assert!(field.get_value(&doc, &mut vm).is_err());
        assert_eq!(vm.variable_value("v"), Value::Null);
    }

    #[test]
    fn empty_control_reads_as_null_for_typed_variables() {
        let (doc, mut vm, mut field) = bind_one(
            "<form><input type='text' bpm-variable-name='v' bpm-variable-type='Date'/></form>",
        );
        field.get_value(&doc, &mut vm).unwrap();
        assert_eq!(vm.variable_value("v"), Value::Null);
    }

    #[test]
    fn checkbox_reads_its_checked_state() {
        let (mut doc, mut vm, mut field) = bind_one(
            "<form><input type='checkbox' bpm-variable-name='v' bpm-variable-type='Boolean'/></form>",
        );
        field.get_value(&doc, &mut vm).unwrap();
        assert_eq!(vm.variable_value("v"), json!(false));

        doc.control_mut(0).set_checked(true);
        field.get_value(&doc, &mut vm).unwrap();
        assert_eq!(vm.variable_value("v"), json!(true));
    }

    // ── apply_value ──────────────────────────────────────────────

    #[test]
    fn applies_the_variable_to_the_control() {
        let (mut doc, mut vm, mut field) = bind_one(
            "<form><input type='text' bpm-variable-name='v' bpm-variable-type='Integer'/></form>",
        );
        vm.set_variable_value("v", json!(100)).unwrap();
        field.apply_value(&mut doc, &mut vm).unwrap();
        assert_eq!(doc.control(0).value(), "100");
    }

    #[test]
    fn applies_null_as_unchecked_and_empty() {
        let (mut doc, mut vm, mut field) = bind_one(
            "<form><input type='checkbox' bpm-variable-name='v' bpm-variable-type='Boolean' checked/></form>",
        );
        vm.set_variable_value("v", Value::Null).unwrap();
        field.apply_value(&mut doc, &mut vm).unwrap();
        assert!(!doc.control(0).checked());

        // and a get after the apply yields a real boolean again
        field.get_value(&doc, &mut vm).unwrap();
        assert_eq!(vm.variable_value("v"), json!(false));
    }

    #[test]
    fn date_round_trips_as_its_engine_shape() {
        let (mut doc, mut vm, mut field) = bind_one(
            "<form><input type='text' bpm-variable-name='v' bpm-variable-type='Date'/></form>",
        );
        vm.set_variable_value("v", json!("2013-01-23T13:42:42")).unwrap();
        field.apply_value(&mut doc, &mut vm).unwrap();
        assert_eq!(doc.control(0).value(), "2013-01-23T13:42:42");

        field.get_value(&doc, &mut vm).unwrap();
        assert_eq!(vm.variable_value("v"), json!("2013-01-23T13:42:42"));
    }
}
