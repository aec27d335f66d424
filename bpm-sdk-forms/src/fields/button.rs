//! Buttons carrying a BPMN error or escalation code. They bind no variable;
//! the form reads their codes when driving the corresponding operation.

pub struct ButtonField {
    control: usize,
    code: String,
    message: Option<String>,
}

impl ButtonField {
    pub fn new(index: usize, code: &str, message: Option<&str>) -> Self {
        Self {
            control: index,
            code: code.to_owned(),
            message: message.map(str::to_owned),
        }
    }

    pub fn control(&self) -> usize {
        self.control
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
