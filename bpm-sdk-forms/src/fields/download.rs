//! Read-only handler exposing a binary variable's download location.

use crate::constants;
use crate::document::{FormControl, FormDocument};
use crate::error::FormError;
use crate::variables::VariableManager;
use serde_json::Value;

pub struct FileDownloadField {
    control: usize,
    variable_name: String,
}

impl FileDownloadField {
    pub fn bind(
        index: usize,
        control: &FormControl,
        vm: &mut VariableManager,
    ) -> Result<Self, FormError> {
        // the attribute value names the variable; an empty marker falls back
        // to bpm-variable-name
        let variable_name = control
            .attr(constants::FILE_DOWNLOAD)
            .filter(|name| !name.is_empty())
            .or_else(|| control.attr(constants::VARIABLE_NAME))
            .unwrap_or_default()
            .to_owned();
        vm.fetch_variable(&variable_name);
        Ok(Self {
            control: index,
            variable_name,
        })
    }

    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    pub fn control(&self) -> usize {
        self.control
    }

    /// Point the control at the variable's content URL and show its filename.
    pub fn apply_value(
        &mut self,
        doc: &mut FormDocument,
        vm: &mut VariableManager,
    ) -> Result<(), FormError> {
        let (href, filename) = match vm.variable(&self.variable_name) {
            Some(variable) => (
                variable.content_url.clone(),
                variable
                    .value_info
                    .get("filename")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            ),
            None => (None, String::new()),
        };

        let control = doc.control_mut(self.control);
        if let Some(href) = href {
            control.set_attr("href", &href);
        }
        control.set_value(&filename);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exposes_content_url_and_filename() {
        let mut doc =
            FormDocument::parse("<form><a bpm-file-download='invoiceDoc'>get</a></form>").unwrap();
        let mut vm = VariableManager::new();
        let mut field = FileDownloadField::bind(0, doc.control(0), &mut vm).unwrap();

        {
            let variable = vm.variable_mut("invoiceDoc").unwrap();
            variable.content_url = Some("/task/t1/variables/invoiceDoc/data".into());
            variable.value_info.insert("filename".into(), json!("invoice.pdf"));
        }

        field.apply_value(&mut doc, &mut vm).unwrap();
        let control = doc.control(0);
        assert_eq!(control.attr("href"), Some("/task/t1/variables/invoiceDoc/data"));
        assert_eq!(control.value(), "invoice.pdf");
    }

    #[test]
    fn missing_variable_leaves_the_control_blank() {
        let mut doc =
            FormDocument::parse("<form><output bpm-file-download='nothing'/></form>").unwrap();
        let mut vm = VariableManager::new();
        let mut field = FileDownloadField::bind(0, doc.control(0), &mut vm).unwrap();
        vm.destroy_variable("nothing");

        field.apply_value(&mut doc, &mut vm).unwrap();
        assert_eq!(doc.control(0).attr("href"), None);
        assert_eq!(doc.control(0).value(), "");
    }
}
