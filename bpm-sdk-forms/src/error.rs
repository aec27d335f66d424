use crate::typeutil::VariableType;
use bpm_sdk_client::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("cannot coerce '{value}' to {expected}")]
    Coerce {
        value: String,
        expected: VariableType,
    },

    #[error("unknown variable type: {0}")]
    UnknownType(String),

    #[error("variable '{0}' already defined")]
    DuplicateVariable(String),

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("form must provide exactly one <form> element")]
    NotExactlyOneForm,

    #[error("form needs either markup or a form url")]
    MissingFormSource,

    #[error("cannot determine the storage id")]
    NoStorageId,

    /// A lifecycle event hook vetoed the operation.
    #[error("form {action} prevented")]
    Prevented { action: &'static str },

    #[error("maximum file size of {} exceeded", bytes_to_size(*.limit))]
    FileTooLarge { filename: String, limit: u64 },

    #[error("script: {0}")]
    Script(#[from] mlua::Error),

    #[error("storage: {0}")]
    Storage(String),

    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Human rendition of a byte count, decimal units.
pub(crate) fn bytes_to_size(bytes: u64) -> String {
    const SIZES: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
    if bytes == 0 {
        return "0 Byte".to_owned();
    }
    let exponent = ((bytes as f64).ln() / 1000f64.ln()).floor() as usize;
    let exponent = exponent.min(SIZES.len() - 1);
    let scaled = bytes as f64 / 1000f64.powi(exponent as i32);
    // three significant digits, trailing zeros trimmed
    let rendered = format!("{scaled:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", SIZES[exponent])
}
