//! Polymorphic control adapters. Each handler binds exactly one control to
//! exactly one variable and pushes/pulls values between the two; the enum
//! is the dispatch surface the form lifecycle iterates over.

pub mod button;
pub mod choices;
pub mod download;
pub mod input;

pub use button::ButtonField;
pub use choices::ChoicesField;
pub use download::FileDownloadField;
pub use input::InputField;

use crate::constants;
use crate::document::{ControlKind, FormDocument};
use crate::error::FormError;
use crate::variables::VariableManager;

pub enum Field {
    Input(InputField),
    Choices(ChoicesField),
    FileDownload(FileDownloadField),
    ErrorButton(ButtonField),
    EscalationButton(ButtonField),
}

impl Field {
    /// The bound variable, when the handler binds one (buttons do not).
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Field::Input(f) => Some(f.variable_name()),
            Field::Choices(f) => Some(f.variable_name()),
            Field::FileDownload(f) => Some(f.variable_name()),
            Field::ErrorButton(_) | Field::EscalationButton(_) => None,
        }
    }

    /// The control's value at bind time, for handlers that track one.
    pub fn original_value(&self) -> Option<&str> {
        match self {
            Field::Input(f) => Some(f.original_value()),
            Field::Choices(f) => Some(f.original_value()),
            _ => None,
        }
    }

    pub fn control(&self) -> usize {
        match self {
            Field::Input(f) => f.control(),
            Field::Choices(f) => f.control(),
            Field::FileDownload(f) => f.control(),
            Field::ErrorButton(f) | Field::EscalationButton(f) => f.control(),
        }
    }

    /// Write the variable value into the control.
    pub fn apply_value(
        &mut self,
        doc: &mut FormDocument,
        vm: &mut VariableManager,
    ) -> Result<(), FormError> {
        match self {
            Field::Input(f) => f.apply_value(doc, vm),
            Field::Choices(f) => f.apply_value(doc, vm),
            Field::FileDownload(f) => f.apply_value(doc, vm),
            Field::ErrorButton(_) | Field::EscalationButton(_) => Ok(()),
        }
    }

    /// Read the control back into the variable, coercing to the declared type.
    pub fn get_value(
        &mut self,
        doc: &FormDocument,
        vm: &mut VariableManager,
    ) -> Result<(), FormError> {
        match self {
            Field::Input(f) => f.get_value(doc, vm),
            Field::Choices(f) => f.get_value(doc, vm),
            Field::FileDownload(_) | Field::ErrorButton(_) | Field::EscalationButton(_) => Ok(()),
        }
    }
}

/// Walk the document and attach a handler to every control that carries a
/// binding attribute, registering the bound variables as a side effect.
pub fn bind_fields(
    doc: &FormDocument,
    vm: &mut VariableManager,
) -> Result<Vec<Field>, FormError> {
    let mut fields = Vec::new();

    for (index, control) in doc.controls().iter().enumerate() {
        match control.kind {
            ControlKind::TextInput
            | ControlKind::Checkbox
            | ControlKind::FileInput
            | ControlKind::TextArea => {
                if control.attr(constants::VARIABLE_NAME).is_some() {
                    fields.push(Field::Input(InputField::bind(index, control, vm)?));
                }
            }

            ControlKind::Select { .. } => {
                if control.attr(constants::VARIABLE_NAME).is_some() {
                    fields.push(Field::Choices(ChoicesField::bind(index, control, vm)?));
                }
            }

            ControlKind::Anchor | ControlKind::Output => {
                if control.attr(constants::FILE_DOWNLOAD).is_some() {
                    fields.push(Field::FileDownload(FileDownloadField::bind(
                        index, control, vm,
                    )?));
                }
            }

            ControlKind::Button => {
                if let Some(code) = control.attr(constants::ERROR_CODE) {
                    fields.push(Field::ErrorButton(ButtonField::new(
                        index,
                        code,
                        control.attr(constants::ERROR_MESSAGE),
                    )));
                } else if let Some(code) = control.attr(constants::ESCALATION_CODE) {
                    fields.push(Field::EscalationButton(ButtonField::new(index, code, None)));
                }
            }
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_one_handler_per_marked_control() {
        let doc = FormDocument::parse(concat!(
            "<form>",
            "<input type='text' bpm-variable-name='amount' bpm-variable-type='Integer'/>",
            "<input type='text' name='unbound'/>",
            "<select bpm-variable-name='priority'><option>low</option></select>",
            "<a bpm-file-download='doc'>get</a>",
            "<button bpm-error-code='oops'>err</button>",
            "<button bpm-escalation-code='late'>esc</button>",
            "</form>",
        ))
        .unwrap();
        let mut vm = VariableManager::new();
        let fields = bind_fields(&doc, &mut vm).unwrap();

        assert_eq!(fields.len(), 5);
        assert!(matches!(fields[0], Field::Input(_)));
        assert!(matches!(fields[1], Field::Choices(_)));
        assert!(matches!(fields[2], Field::FileDownload(_)));
        assert!(matches!(fields[3], Field::ErrorButton(_)));
        assert!(matches!(fields[4], Field::EscalationButton(_)));

        // bound variables got registered
        assert!(vm.variable("amount").is_some());
        assert!(vm.variable("priority").is_some());
        assert!(vm.variable("doc").is_some());
    }

    #[test]
    fn two_controls_cannot_bind_the_same_variable() {
        let doc = FormDocument::parse(concat!(
            "<form>",
            "<input bpm-variable-name='x'/>",
            "<input bpm-variable-name='x'/>",
            "</form>",
        ))
        .unwrap();
        let mut vm = VariableManager::new();
        assert!(matches!(
            bind_fields(&doc, &mut vm),
            Err(FormError::DuplicateVariable(_))
        ));
    }
}
