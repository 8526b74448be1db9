//! Visitor contract and built-in visitors.
//!
//! A visitor wraps one form spec plus a [`VisitorContext`] and offers four
//! operations on a raw value: parse, render for the frontend, validate and
//! serialize for disk. Each operation parses the raw value exactly once.
//!
//! Implementations write the typed [`FormSpecVisitor`] trait; the blanket
//! [`Visitor`] impl turns it into the object-safe contract the registry hands
//! out, and owns the shared steps (default sentinel, migrate hook, custom
//! validators, refusing to persist invalid values).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    config::EngineConfig,
    error::{FormSpecError, Result},
    frontend::FrontendSchema,
    messages::{ValidationCollector, ValidationMessage},
    registry::VisitorRegistry,
    services::Services,
    spec::{FormSpec, SpecBase},
    validators::run_validators,
    value::{RawValue, Value},
};

/// Generate the registry factory of a visitor type.
macro_rules! visitor_factory {
    ($visitor:ident, $variant:ident, $kind:expr) => {
        impl $visitor {
            /// Registry factory.
            pub fn factory(
                spec: &$crate::spec::FormSpec,
                ctx: &$crate::visitor::VisitorContext,
            ) -> $crate::error::Result<Box<dyn $crate::visitor::Visitor>> {
                match spec {
                    $crate::spec::FormSpec::$variant(spec) => {
                        Ok(Box::new($visitor::new(spec.clone(), ctx.clone())))
                    }
                    other => Err($crate::error::FormSpecError::mismatch(
                        $kind,
                        other.type_name(),
                    )),
                }
            }
        }
    };
}

mod boolean;
mod cascading;
mod catalog;
mod dictionary;
mod fixed_value;
mod legacy;
mod list;
mod multiple_choice;
mod number;
mod password;
mod single_choice;
mod string;
mod tuple;

pub use boolean::BooleanChoiceVisitor;
pub use cascading::CascadingSingleChoiceVisitor;
pub use catalog::CatalogVisitor;
pub use dictionary::DictionaryVisitor;
pub use fixed_value::FixedValueVisitor;
pub use legacy::LegacyVisitor;
pub use list::{ListUniqueSelectionVisitor, ListVisitor};
pub use multiple_choice::MultipleChoiceVisitor;
pub use number::{FloatVisitor, IntegerVisitor};
pub use password::{PasswordValue, PasswordVisitor};
pub use single_choice::{Selection, SingleChoiceVisitor};
pub use string::StringVisitor;
pub use tuple::TupleVisitor;

/// Reason used when the default sentinel meets an input-hint prefill.
pub(crate) const NO_VALUE_REASON: &str = "No value specified";

/// Which raw value encoding is being interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    /// Persisted configuration shape.
    Disk,
    /// JSON submitted by the frontend.
    Frontend,
}

/// Per-request visitor options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorOptions {
    /// Encoding of raw values.
    pub data_origin: DataOrigin,
}

/// Result of a failed parse.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidValue {
    /// Human-readable reason.
    pub reason: String,
    /// Safe value to redisplay instead.
    pub fallback: Value,
}

impl InvalidValue {
    /// Invalid value with the given reason and fallback.
    pub fn new(reason: impl Into<String>, fallback: impl Into<Value>) -> Self {
        Self {
            reason: reason.into(),
            fallback: fallback.into(),
        }
    }
}

/// Outcome of parsing: a well-typed value or an [`InvalidValue`].
pub type ParseResult<T> = std::result::Result<T, InvalidValue>;

/// Everything a visitor needs besides its spec.
#[derive(Clone)]
pub struct VisitorContext {
    registry: Arc<VisitorRegistry>,
    services: Services,
    config: Arc<EngineConfig>,
    options: VisitorOptions,
}

impl VisitorContext {
    /// Assemble a context.
    pub fn new(
        registry: Arc<VisitorRegistry>,
        services: Services,
        config: Arc<EngineConfig>,
        options: VisitorOptions,
    ) -> Self {
        Self {
            registry,
            services,
            config,
            options,
        }
    }

    /// Request options.
    pub fn options(&self) -> VisitorOptions {
        self.options
    }

    /// Raw value encoding.
    pub fn origin(&self) -> DataOrigin {
        self.options.data_origin
    }

    /// Collaborators.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the visitor of a child spec with the same options.
    pub fn resolve(&self, spec: &FormSpec) -> Result<Box<dyn Visitor>> {
        self.registry.resolve(spec, self)
    }
}

/// Object-safe visitor contract.
pub trait Visitor {
    /// Parse a raw value.
    ///
    /// Composite parsing is shallow: the returned structure holds children in
    /// raw form, with defaulted children left out.
    fn parse(&self, raw: RawValue<'_>) -> ParseResult<Value>;

    /// Render the UI schema and the frontend-encoded value.
    fn to_frontend(&self, raw: RawValue<'_>) -> Result<(FrontendSchema, JsonValue)>;

    /// Validate, appending messages to `collector` at its current location.
    fn validate_into(&self, raw: RawValue<'_>, collector: &mut ValidationCollector)
    -> Result<()>;

    /// Serialize for disk.
    ///
    /// # Errors
    ///
    /// [`FormSpecError::InvalidValueToDisk`] if the value does not parse.
    fn to_disk(&self, raw: RawValue<'_>) -> Result<Value>;

    /// Validate, returning messages relative to this spec.
    fn validate(&self, raw: RawValue<'_>) -> Result<Vec<ValidationMessage>> {
        let mut collector = ValidationCollector::new();
        self.validate_into(raw, &mut collector)?;
        Ok(collector.into_messages())
    }

    /// Frontend value of the default sentinel.
    fn frontend_default(&self) -> Result<JsonValue> {
        Ok(self.to_frontend(RawValue::UseDefault)?.1)
    }
}

/// Typed visitor implementation.
pub trait FormSpecVisitor {
    /// In-memory form of a successfully parsed value.
    type Parsed;

    /// Shared spec fields.
    fn base(&self) -> &SpecBase;

    /// Visitor context.
    fn context(&self) -> &VisitorContext;

    /// Interpret the default sentinel.
    fn parse_default(&self) -> ParseResult<Self::Parsed>;

    /// Interpret a raw value in the context's data origin.
    fn parse_value(&self, raw: &Value) -> ParseResult<Self::Parsed>;

    /// Generic representation of a parsed value, as seen by validators.
    fn parsed_value(&self, parsed: &Self::Parsed) -> Value;

    /// Render schema and value; invalid values render their fallback.
    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Self::Parsed, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)>;

    /// Structural validation of children and type-specific rules.
    fn validate_parsed(
        &self,
        _parsed: &Self::Parsed,
        _collector: &mut ValidationCollector,
    ) -> Result<()> {
        Ok(())
    }

    /// Disk representation of a parsed value.
    fn to_disk_parsed(&self, parsed: &Self::Parsed) -> Result<Value>;
}

fn parse_raw<V: FormSpecVisitor + ?Sized>(visitor: &V, raw: RawValue<'_>) -> ParseResult<V::Parsed> {
    match raw {
        RawValue::UseDefault => visitor.parse_default(),
        RawValue::Given(value) => match (&visitor.base().migrate, visitor.context().origin()) {
            (Some(migration), DataOrigin::Disk) => visitor.parse_value(&migration.apply(value)),
            _ => visitor.parse_value(value),
        },
    }
}

impl<V: FormSpecVisitor> Visitor for V {
    fn parse(&self, raw: RawValue<'_>) -> ParseResult<Value> {
        parse_raw(self, raw).map(|parsed| self.parsed_value(&parsed))
    }

    fn to_frontend(&self, raw: RawValue<'_>) -> Result<(FrontendSchema, JsonValue)> {
        let parsed = parse_raw(self, raw);
        self.to_frontend_parsed(parsed.as_ref())
    }

    fn validate_into(
        &self,
        raw: RawValue<'_>,
        collector: &mut ValidationCollector,
    ) -> Result<()> {
        let parsed = match parse_raw(self, raw) {
            Ok(parsed) => parsed,
            Err(invalid) => {
                let (_, replacement) = self.to_frontend_parsed(Err(&invalid))?;
                collector.push(invalid.reason, replacement);
                return Ok(());
            }
        };

        self.validate_parsed(&parsed, collector)?;

        let failures = run_validators(&self.base().custom_validate, &self.parsed_value(&parsed));
        if !failures.is_empty() {
            let (_, replacement) = self.to_frontend_parsed(Ok(&parsed))?;
            for failure in failures {
                collector.push(failure, replacement.clone());
            }
        }
        Ok(())
    }

    fn to_disk(&self, raw: RawValue<'_>) -> Result<Value> {
        let parsed =
            parse_raw(self, raw).map_err(|invalid| FormSpecError::InvalidValueToDisk(invalid.reason))?;
        self.to_disk_parsed(&parsed)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::engine::FormEngine;

    pub fn engine() -> FormEngine {
        FormEngine::with_defaults().unwrap()
    }

    pub fn visitor(spec: impl Into<FormSpec>, origin: DataOrigin) -> Box<dyn Visitor> {
        engine().visitor(&spec.into(), origin).unwrap()
    }

    pub fn locations(messages: &[ValidationMessage]) -> Vec<Vec<String>> {
        messages.iter().map(|m| m.location.clone()).collect()
    }
}
