//! # formspec
//!
//! Registry driven visitor engine for declarative form specs.
//!
//! A form spec describes one configurable value: its type, rendering metadata
//! and validators. The engine resolves a spec to a visitor and uses it to turn
//! a raw value into a UI schema plus value, a list of validation messages with
//! structural locations, or the persisted disk representation.
//!
//! ## Features
//!
//! - Leaf types: integer, float, string, boolean, fixed value, password, choices
//! - Composite types: dictionary, list, tuple, cascading choice, catalog
//! - Recomposition of simple spec types into richer ones before dispatch
//! - Two raw value encodings: persisted disk values and frontend JSON
//! - Option ids hiding arbitrary choice values on the frontend wire
//! - Opaque legacy editor for spec types without a visitor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formspec::{
//!     DataOrigin, FormEngine, FormSpec, RawValue, Value,
//!     spec::{DictElement, Dictionary, Integer, TextInput},
//! };
//!
//! let engine = FormEngine::with_defaults().unwrap();
//! let spec: FormSpec = Dictionary::new([
//!     DictElement::required("port", Integer::with_default(22)),
//!     DictElement::optional("user", TextInput::default()),
//! ])
//! .into();
//!
//! let raw = Value::from(serde_json::json!({"port": "ssh"}));
//! let messages = engine
//!     .validate(&spec, DataOrigin::Disk, RawValue::Given(&raw))
//!     .unwrap();
//! assert_eq!(messages[0].location, vec!["port".to_string()]);
//! ```
//!
//! ## Modules
//!
//! - [`spec`] - Form spec model
//! - [`value`] - Raw and persisted values
//! - [`visitor`] - Visitor contract and built-in visitors
//! - [`registry`] - Type to visitor mapping and recomposition
//! - [`recompose`] - Built-in recomposers
//! - [`engine`] - Entry point

#[macro_use]
extern crate log;

/// Engine configuration loaded from TOML.
pub mod config;

/// Engine entry point and the default registry.
pub mod engine;

/// Programmer and integration errors.
pub mod error;

/// UI-facing schema rendered for the frontend.
pub mod frontend;

/// Validation messages and the path-scoped collector.
pub mod messages;

/// Content-hash ids of choice values.
pub mod option_id;

/// Built-in recomposers.
pub mod recompose;

/// Visitor registry.
///
/// Maps spec types to visitor factories and recomposers, and checks the
/// recomposition graph once at startup.
pub mod registry;

/// Password store and transit cipher collaborators.
pub mod services;

/// Form spec model.
pub mod spec;

/// Validators attached to specs.
pub mod validators;

/// Raw, parsed and persisted values.
pub mod value;

/// Visitor contract and built-in visitors.
pub mod visitor;

pub use config::EngineConfig;
pub use engine::{FormEngine, default_registry};
pub use error::{FormSpecError, Result};
pub use messages::ValidationMessage;
pub use spec::FormSpec;
pub use value::{RawValue, Value};
pub use visitor::{DataOrigin, InvalidValue, Visitor};
