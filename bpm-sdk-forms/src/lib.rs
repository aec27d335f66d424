//! Embedded-forms runtime for the process engine.
//!
//! A form is plain HTML whose controls carry binding attributes. The runtime
//! scans the markup, binds each control to a typed engine variable, executes
//! the form's embedded scripts in a sandbox, round-trips values between the
//! controls and the variable manager, and drives fetch / restore / submit
//! against the engine through a narrow service seam.

pub mod constants;
pub mod document;
pub mod error;
pub mod fields;
pub mod form;
pub mod script;
pub mod service;
pub mod storage;
pub mod typeutil;
pub mod variables;

pub use document::{ControlKind, FormControl, FormDocument};
pub use error::FormError;
pub use form::{EngineForm, FormOptions};
pub use service::{FormService, FormTarget};
pub use storage::{FormStorage, JsonFileStorage, MemoryStorage};
pub use typeutil::VariableType;
pub use variables::{Variable, VariableManager};

pub type Result<T> = std::result::Result<T, FormError>;
