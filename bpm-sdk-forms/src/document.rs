//! Lightweight scan of embedded-form markup.
//!
//! The runtime does not need a DOM — only the single `<form>` element, the
//! controls inside it, and the embedded script blocks, with their binding
//! attributes. Tag and attribute names are matched case-insensitively;
//! anything outside the form element is ignored.

use crate::constants;
use crate::error::FormError;
use std::collections::BTreeMap;

/// A file attached to a file control ahead of submission.
#[derive(Clone, Debug)]
pub struct FilePayload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKind {
    TextInput,
    Checkbox,
    FileInput,
    TextArea,
    Select { multiple: bool },
    Button,
    Anchor,
    Output,
}

/// One bound control: its kind, attributes and mutable UI state.
#[derive(Clone, Debug)]
pub struct FormControl {
    pub kind: ControlKind,
    attributes: BTreeMap<String, String>,
    value: String,
    checked: bool,
    options: Vec<ChoiceOption>,
    file: Option<FilePayload>,
}

impl FormControl {
    fn new(kind: ControlKind, attributes: BTreeMap<String, String>) -> Self {
        let value = attributes.get("value").cloned().unwrap_or_default();
        let checked = attributes.contains_key("checked");
        Self {
            kind,
            attributes,
            value,
            checked,
            options: Vec::new(),
            file: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_owned(), value.to_owned());
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_owned();
    }

    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn set_options(&mut self, options: Vec<ChoiceOption>) {
        self.options = options;
    }

    pub fn selected_values(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.clone())
            .collect()
    }

    /// Mark exactly the given values as selected.
    pub fn select_values(&mut self, values: &[String]) {
        for option in &mut self.options {
            option.selected = values.contains(&option.value);
        }
    }

    pub fn file(&self) -> Option<&FilePayload> {
        self.file.as_ref()
    }

    pub fn set_file(&mut self, file: FilePayload) {
        self.file = Some(file);
    }

    pub fn clear_file(&mut self) {
        self.file = None;
    }

    pub fn is_file_input(&self) -> bool {
        self.kind == ControlKind::FileInput
    }
}

/// The scanned form: its name, controls and script blocks, all in document
/// order. Controls are addressed by index so handlers can hold stable
/// references while the document stays mutable.
pub struct FormDocument {
    form_name: String,
    controls: Vec<FormControl>,
    scripts: Vec<String>,
}

impl FormDocument {
    pub fn parse(html: &str) -> Result<Self, FormError> {
        Scanner::new(html).scan()
    }

    pub fn form_name(&self) -> &str {
        &self.form_name
    }

    pub fn controls(&self) -> &[FormControl] {
        &self.controls
    }

    pub fn control(&self, index: usize) -> &FormControl {
        &self.controls[index]
    }

    pub fn control_mut(&mut self, index: usize) -> &mut FormControl {
        &mut self.controls[index]
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Index of the first control carrying `attribute`.
    pub fn find_by_attr(&self, attribute: &str) -> Option<usize> {
        self.controls.iter().position(|c| c.has_attr(attribute))
    }

    /// Index of the first control bound to `variable` via `bpm-variable-name`.
    pub fn find_by_variable(&self, variable: &str) -> Option<usize> {
        self.controls
            .iter()
            .position(|c| c.attr(constants::VARIABLE_NAME) == Some(variable))
    }
}

// ─── Scanner ──────────────────────────────────────────────────

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
}

struct Tag {
    name: String,
    attributes: BTreeMap<String, String>,
}

impl<'a> Scanner<'a> {
    fn new(html: &'a str) -> Self {
        Self {
            src: html.as_bytes(),
            pos: 0,
        }
    }

    fn scan(mut self) -> Result<FormDocument, FormError> {
        let mut forms_seen = 0usize;
        let mut in_form = false;
        let mut form_name = String::new();
        let mut controls: Vec<FormControl> = Vec::new();
        let mut scripts = Vec::new();
        let mut current_select: Option<usize> = None;

        while let Some(()) = self.seek_tag_open() {
            if self.starts_with(b"<!--") {
                self.skip_past(b"-->");
                continue;
            }
            if self.starts_with(b"<!") {
                self.skip_past(b">");
                continue;
            }
            if self.starts_with(b"</") {
                let name = self.read_close_tag();
                match name.as_str() {
                    "form" => in_form = false,
                    "select" => current_select = None,
                    _ => {}
                }
                continue;
            }

            let Some(tag) = self.read_open_tag() else {
                continue;
            };

            match tag.name.as_str() {
                "form" => {
                    forms_seen += 1;
                    if forms_seen > 1 {
                        return Err(FormError::NotExactlyOneForm);
                    }
                    in_form = true;
                    form_name = tag
                        .attributes
                        .get("name")
                        .cloned()
                        .unwrap_or_else(|| constants::DEFAULT_FORM_NAME.to_owned());
                }

                // script bodies are raw text even outside the form; consume
                // them so markup-looking literals never reach the scanner
                "script" => {
                    let text = self.read_raw_text_until("</script");
                    if in_form && tag.attributes.contains_key(constants::SCRIPT) {
                        scripts.push(text);
                    }
                }

                _ if !in_form => {}

                "input" => {
                    let kind = match tag.attributes.get("type").map(String::as_str) {
                        Some("checkbox") => ControlKind::Checkbox,
                        Some("file") => ControlKind::FileInput,
                        _ => ControlKind::TextInput,
                    };
                    controls.push(FormControl::new(kind, tag.attributes));
                }

                "textarea" => {
                    let text = self.read_raw_text_until("</textarea");
                    let mut control = FormControl::new(ControlKind::TextArea, tag.attributes);
                    control.set_value(&text);
                    controls.push(control);
                }

                "select" => {
                    let multiple = tag.attributes.contains_key("multiple");
                    controls.push(FormControl::new(
                        ControlKind::Select { multiple },
                        tag.attributes,
                    ));
                    current_select = Some(controls.len() - 1);
                }

                "option" => {
                    if let Some(select) = current_select {
                        let label = self.read_text().trim().to_owned();
                        let value = tag
                            .attributes
                            .get("value")
                            .cloned()
                            .unwrap_or_else(|| label.clone());
                        controls[select].options.push(ChoiceOption {
                            value,
                            label,
                            selected: tag.attributes.contains_key("selected"),
                        });
                    }
                }

                "button" => controls.push(FormControl::new(ControlKind::Button, tag.attributes)),
                "a" => controls.push(FormControl::new(ControlKind::Anchor, tag.attributes)),
                "output" => controls.push(FormControl::new(ControlKind::Output, tag.attributes)),

                _ => {}
            }
        }

        if forms_seen != 1 {
            return Err(FormError::NotExactlyOneForm);
        }

        Ok(FormDocument {
            form_name,
            controls,
            scripts,
        })
    }

    /// Advance to the next `<`. Returns None at end of input.
    fn seek_tag_open(&mut self) -> Option<()> {
        while self.pos < self.src.len() && self.src[self.pos] != b'<' {
            self.pos += 1;
        }
        (self.pos < self.src.len()).then_some(())
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.src[self.pos..].starts_with(prefix)
    }

    fn skip_past(&mut self, marker: &[u8]) {
        match find(&self.src[self.pos..], marker) {
            Some(offset) => self.pos += offset + marker.len(),
            None => self.pos = self.src.len(),
        }
    }

    fn read_close_tag(&mut self) -> String {
        self.pos += 2; // </
        let start = self.pos;
        while self.pos < self.src.len() && self.src[self.pos] != b'>' {
            self.pos += 1;
        }
        let name = String::from_utf8_lossy(&self.src[start..self.pos])
            .trim()
            .to_ascii_lowercase();
        if self.pos < self.src.len() {
            self.pos += 1; // >
        }
        name
    }

    fn read_open_tag(&mut self) -> Option<Tag> {
        self.pos += 1; // <
        let start = self.pos;
        while self.pos < self.src.len() && is_name_byte(self.src[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            return None; // stray '<'
        }
        let name = String::from_utf8_lossy(&self.src[start..self.pos]).to_ascii_lowercase();

        let mut attributes = BTreeMap::new();
        loop {
            self.skip_whitespace();
            if self.pos >= self.src.len() {
                break;
            }
            match self.src[self.pos] {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' => self.pos += 1,
                _ => {
                    if let Some((key, value)) = self.read_attribute() {
                        attributes.insert(key, value);
                    }
                }
            }
        }

        Some(Tag { name, attributes })
    }

    fn read_attribute(&mut self) -> Option<(String, String)> {
        let start = self.pos;
        while self.pos < self.src.len() && is_attr_name_byte(self.src[self.pos]) {
            self.pos += 1;
        }
        if self.pos == start {
            self.pos += 1; // unexpected byte, step over it
            return None;
        }
        let name = String::from_utf8_lossy(&self.src[start..self.pos]).to_ascii_lowercase();

        self.skip_whitespace();
        if self.pos >= self.src.len() || self.src[self.pos] != b'=' {
            return Some((name, String::new())); // bare attribute
        }
        self.pos += 1; // =
        self.skip_whitespace();

        let value = if self.pos < self.src.len() && (self.src[self.pos] == b'"' || self.src[self.pos] == b'\'') {
            let quote = self.src[self.pos];
            self.pos += 1;
            let start = self.pos;
            while self.pos < self.src.len() && self.src[self.pos] != quote {
                self.pos += 1;
            }
            let value = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
            if self.pos < self.src.len() {
                self.pos += 1; // closing quote
            }
            value
        } else {
            let start = self.pos;
            while self.pos < self.src.len()
                && !self.src[self.pos].is_ascii_whitespace()
                && self.src[self.pos] != b'>'
            {
                self.pos += 1;
            }
            String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
        };

        Some((name, value))
    }

    /// Raw text content up to (not past) a closing marker, case-insensitive.
    fn read_raw_text_until(&mut self, close: &str) -> String {
        let lower: Vec<u8> = self.src[self.pos..]
            .iter()
            .map(u8::to_ascii_lowercase)
            .collect();
        let offset = find(&lower, close.as_bytes()).unwrap_or(lower.len());
        let text = String::from_utf8_lossy(&self.src[self.pos..self.pos + offset]).into_owned();
        self.pos += offset;
        text
    }

    /// Plain text up to the next tag.
    fn read_text(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.src.len() && self.src[self.pos] != b'<' {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

fn is_attr_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
        <form name="approval" role="form">
            <input type="text" bpm-variable-name="amount" bpm-variable-type="Integer" />
            <input type="checkbox" bpm-variable-name="approved" bpm-variable-type="Boolean" checked>
            <textarea bpm-variable-name="remark" bpm-variable-type="String">initial remark</textarea>
            <select bpm-variable-name="priority">
                <option value="low">Low</option>
                <option value="high" selected>High</option>
            </select>
            <script bpm-script type="application/lua">form.declare("extra", "String")</script>
        </form>
    "#;

    #[test]
    fn scans_controls_inside_the_form() {
        let doc = FormDocument::parse(SIMPLE).unwrap();
        assert_eq!(doc.form_name(), "approval");
        assert_eq!(doc.controls().len(), 4);
        assert_eq!(doc.scripts().len(), 1);
        assert!(doc.scripts()[0].contains("form.declare"));
    }

    #[test]
    fn reads_kinds_values_and_checked_state() {
        let doc = FormDocument::parse(SIMPLE).unwrap();
        let amount = doc.control(doc.find_by_variable("amount").unwrap());
        assert_eq!(amount.kind, ControlKind::TextInput);
        assert_eq!(amount.value(), "");

        let approved = doc.control(doc.find_by_variable("approved").unwrap());
        assert_eq!(approved.kind, ControlKind::Checkbox);
        assert!(approved.checked());

        let remark = doc.control(doc.find_by_variable("remark").unwrap());
        assert_eq!(remark.kind, ControlKind::TextArea);
        assert_eq!(remark.value(), "initial remark");
    }

    #[test]
    fn select_collects_options_and_selection() {
        let doc = FormDocument::parse(SIMPLE).unwrap();
        let select = doc.control(doc.find_by_variable("priority").unwrap());
        assert_eq!(select.kind, ControlKind::Select { multiple: false });
        assert_eq!(select.options().len(), 2);
        assert_eq!(select.options()[0].value, "low");
        assert_eq!(select.options()[0].label, "Low");
        assert_eq!(select.selected_values(), vec!["high"]);
    }

    #[test]
    fn missing_form_name_gets_the_default() {
        let doc = FormDocument::parse("<form><input bpm-variable-name='x'/></form>").unwrap();
        assert_eq!(doc.form_name(), constants::DEFAULT_FORM_NAME);
    }

    #[test]
    fn requires_exactly_one_form() {
        assert!(matches!(
            FormDocument::parse("<div>no form here</div>"),
            Err(FormError::NotExactlyOneForm)
        ));
        assert!(matches!(
            FormDocument::parse("<form></form><form></form>"),
            Err(FormError::NotExactlyOneForm)
        ));
    }

    #[test]
    fn ignores_controls_outside_the_form() {
        let doc = FormDocument::parse(
            "<input bpm-variable-name='outside'/><form><input bpm-variable-name='inside'/></form>",
        )
        .unwrap();
        assert_eq!(doc.controls().len(), 1);
        assert!(doc.find_by_variable("inside").is_some());
    }

    #[test]
    fn scripts_without_the_marker_are_skipped() {
        let doc = FormDocument::parse(
            "<form><script type='text/javascript'>var x = '<form>';</script></form>",
        )
        .unwrap();
        assert!(doc.scripts().is_empty());
        // the literal inside the script must not count as a second form
        assert_eq!(doc.controls().len(), 0);
    }

    #[test]
    fn comments_are_ignored() {
        let doc =
            FormDocument::parse("<form><!-- <input bpm-variable-name='ghost'/> --></form>")
                .unwrap();
        assert!(doc.controls().is_empty());
    }

    #[test]
    fn unquoted_and_single_quoted_attributes_parse() {
        let doc = FormDocument::parse(
            "<form name=plain><input type=text bpm-variable-name='x' value=7></form>",
        )
        .unwrap();
        assert_eq!(doc.form_name(), "plain");
        let control = doc.control(0);
        assert_eq!(control.value(), "7");
    }

    #[test]
    fn buttons_and_download_links_are_controls() {
        let doc = FormDocument::parse(concat!(
            "<form>",
            "<button bpm-error-code='notFound' bpm-error-message='gone'>report</button>",
            "<button bpm-escalation-code='late'>escalate</button>",
            "<a bpm-file-download='invoiceDoc'>download</a>",
            "</form>",
        ))
        .unwrap();
        assert_eq!(doc.controls().len(), 3);
        assert_eq!(doc.control(0).attr(constants::ERROR_CODE), Some("notFound"));
        assert_eq!(doc.control(1).attr(constants::ESCALATION_CODE), Some("late"));
        assert_eq!(doc.control(2).attr(constants::FILE_DOWNLOAD), Some("invoiceDoc"));
    }
}
