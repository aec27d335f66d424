//! Binding-attribute vocabulary of embedded forms.

/// Binds a control to a named engine variable.
pub const VARIABLE_NAME: &str = "bpm-variable-name";

/// Declares the engine type the bound variable coerces to.
pub const VARIABLE_TYPE: &str = "bpm-variable-type";

/// Names a variable whose value populates a select's options.
pub const CHOICES: &str = "bpm-choices";

/// Marks a download link for a Bytes/File variable.
pub const FILE_DOWNLOAD: &str = "bpm-file-download";

/// Upper bound in bytes for an attached file (default applies when absent).
pub const MAX_FILESIZE: &str = "bpm-max-filesize";

/// Marks the control whose value becomes the start business key.
pub const BUSINESS_KEY: &str = "bpm-business-key";

/// Marks a button that reports a BPMN error, and its optional message.
pub const ERROR_CODE: &str = "bpm-error-code";
pub const ERROR_MESSAGE: &str = "bpm-error-message";

/// Marks a button that reports a BPMN escalation.
pub const ESCALATION_CODE: &str = "bpm-escalation-code";

/// Marks a script element for sandboxed execution during form init.
pub const SCRIPT: &str = "bpm-script";

/// Name given to a form element that does not carry one.
pub const DEFAULT_FORM_NAME: &str = "$$bpmForm";

/// Storage key prefix for persisted form state.
pub const STORAGE_PREFIX: &str = "bpmForm:";

/// Default cap for attached files when `bpm-max-filesize` is absent.
pub const DEFAULT_MAX_FILESIZE: u64 = 5_000_000;
