//! Client SDK for the process engine's REST API.
//!
//! Every resource module mirrors one family of REST endpoints one-to-one;
//! the [`EngineClient`] facade wires them to a shared [`HttpClient`]. The
//! forms runtime builds on top of this crate, never the other way around.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod hal;
pub mod http;
pub mod resources;
pub mod variable;

pub use client::EngineClient;
pub use config::{ClientConfig, Credentials};
pub use error::EngineError;
pub use events::Emitter;
pub use http::HttpClient;
pub use variable::VariableValue;

pub type Result<T> = std::result::Result<T, EngineError>;
