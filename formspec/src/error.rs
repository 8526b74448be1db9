//! Programmer and integration errors.
//!
//! Malformed user data never shows up here: it is reported through
//! [`InvalidValue`](crate::visitor::InvalidValue) while parsing and
//! [`ValidationMessage`](crate::messages::ValidationMessage) while validating.
//! Everything in [`FormSpecError`] aborts the current operation.

use thiserror::Error;

/// Errors raised by the visitor engine.
#[derive(Debug, Error)]
pub enum FormSpecError {
    /// A visitor factory or recomposer received a schema of the wrong type.
    #[error("expected a `{expected}` form spec, got `{actual}`")]
    TypeMismatch {
        /// Schema type the callee handles.
        expected: &'static str,
        /// Schema type that was passed in.
        actual: &'static str,
    },

    /// A recomposer produced a schema of a type it did not declare.
    #[error("recomposer for `{source_type}` declared target `{declared}` but produced `{produced}`")]
    UnexpectedRecomposition {
        /// Source schema type.
        source_type: &'static str,
        /// Target declared at registration.
        declared: &'static str,
        /// Type actually produced.
        produced: &'static str,
    },

    /// The registered recompositions form a cycle.
    #[error("recomposition cycle: {}", .0.join(" -> "))]
    RecompositionCycle(Vec<&'static str>),

    /// Runtime guard against unbounded recomposition chains.
    #[error("recomposition of `{0}` exceeded the maximum depth of {1}")]
    RecompositionDepth(&'static str, usize),

    /// A recomposition target has neither a visitor nor a recomposer.
    #[error("recomposer for `{source_type}` targets unregistered type `{target}`")]
    UnregisteredTarget {
        /// Source schema type.
        source_type: &'static str,
        /// The unregistered target.
        target: &'static str,
    },

    /// No visitor could be found and no unknown-schema fallback is installed.
    #[error("no visitor registered for `{0}`")]
    NoVisitor(&'static str),

    /// `to_disk` was called on a value that does not parse.
    ///
    /// Callers must validate before persisting.
    #[error("refusing to persist an invalid value: {0}")]
    InvalidValueToDisk(String),

    /// A collaborator service failed.
    #[error("{service} failed: {reason}")]
    Collaborator {
        /// Name of the failing service.
        service: &'static str,
        /// Failure description.
        reason: String,
    },
}

impl FormSpecError {
    /// Build a [`FormSpecError::TypeMismatch`].
    pub fn mismatch(expected: &'static str, actual: &'static str) -> Self {
        FormSpecError::TypeMismatch { expected, actual }
    }
}

/// Result alias for engine operations.
pub type Result<T, E = FormSpecError> = std::result::Result<T, E>;
