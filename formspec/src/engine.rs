//! Engine entry point.
//!
//! [`FormEngine`] bundles the registry, the collaborator services and the
//! configuration, and runs the four visitor operations on a spec.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::{
    config::EngineConfig,
    error::{FormSpecError, Result},
    frontend::FrontendSchema,
    messages::ValidationMessage,
    recompose,
    registry::VisitorRegistry,
    services::{Services, StreamCipher},
    spec::{FormSpec, kind},
    value::{RawValue, Value},
    visitor::{
        BooleanChoiceVisitor, CascadingSingleChoiceVisitor, CatalogVisitor, DataOrigin,
        DictionaryVisitor, FixedValueVisitor, FloatVisitor, IntegerVisitor, LegacyVisitor,
        ListUniqueSelectionVisitor, ListVisitor, MultipleChoiceVisitor, ParseResult,
        PasswordVisitor, SingleChoiceVisitor, StringVisitor, TupleVisitor, Visitor,
        VisitorContext, VisitorOptions,
    },
};

/// Registry with every built-in visitor and recomposer, falling back to the
/// legacy editor for unknown types.
pub fn default_registry() -> Result<VisitorRegistry> {
    VisitorRegistry::builder()
        .register_visitor(kind::INTEGER, IntegerVisitor::factory)
        .register_visitor(kind::FLOAT, FloatVisitor::factory)
        .register_visitor(kind::STRING, StringVisitor::factory)
        .register_visitor(kind::BOOLEAN_CHOICE, BooleanChoiceVisitor::factory)
        .register_visitor(kind::FIXED_VALUE, FixedValueVisitor::factory)
        .register_visitor(kind::PASSWORD, PasswordVisitor::factory)
        .register_visitor(kind::SINGLE_CHOICE_EXTENDED, SingleChoiceVisitor::factory)
        .register_visitor(kind::MULTIPLE_CHOICE_EXTENDED, MultipleChoiceVisitor::factory)
        .register_visitor(kind::DICTIONARY, DictionaryVisitor::factory)
        .register_visitor(kind::LIST, ListVisitor::factory)
        .register_visitor(kind::LIST_UNIQUE_SELECTION, ListUniqueSelectionVisitor::factory)
        .register_visitor(kind::TUPLE, TupleVisitor::factory)
        .register_visitor(kind::CASCADING_SINGLE_CHOICE, CascadingSingleChoiceVisitor::factory)
        .register_visitor(kind::CATALOG, CatalogVisitor::factory)
        .register_visitor(kind::LEGACY, LegacyVisitor::factory)
        .register_recomposer(kind::SINGLE_CHOICE, kind::SINGLE_CHOICE_EXTENDED, recompose::single_choice)
        .register_recomposer(kind::MULTIPLE_CHOICE, kind::MULTIPLE_CHOICE_EXTENDED, recompose::multiple_choice)
        .register_recomposer(kind::SERVICE_STATE, kind::SINGLE_CHOICE_EXTENDED, recompose::service_state)
        .register_recomposer(kind::PERCENTAGE, kind::FLOAT, recompose::percentage)
        .register_recomposer(kind::REGULAR_EXPRESSION, kind::STRING, recompose::regular_expression)
        .register_recomposer(kind::LIST_OF_STRINGS, kind::LIST, recompose::list_of_strings)
        .unknown_fallback(kind::LEGACY, recompose::unknown)
        .build()
}

/// Registry, services and configuration shared by every request.
#[derive(Debug, Clone)]
pub struct FormEngine {
    registry: Arc<VisitorRegistry>,
    services: Services,
    config: Arc<EngineConfig>,
}

impl FormEngine {
    /// Assemble an engine.
    pub fn new(registry: VisitorRegistry, services: Services, config: EngineConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            services,
            config: Arc::new(config),
        }
    }

    /// Default registry, in-memory services and default configuration.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(
            default_registry()?,
            Services::default(),
            EngineConfig::default(),
        ))
    }

    /// Default registry and services, with the transit cipher keyed by
    /// `config.transit_key` when set.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let mut services = Services::default();
        if let Some(key) = &config.transit_key {
            let cipher = StreamCipher::from_hex_key(key).map_err(|e| FormSpecError::Collaborator {
                service: "transit cipher",
                reason: e.to_string(),
            })?;
            services.cipher = Arc::new(cipher);
        }
        Ok(Self::new(default_registry()?, services, config))
    }

    /// The registry.
    pub fn registry(&self) -> &Arc<VisitorRegistry> {
        &self.registry
    }

    /// The collaborator services.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Visitor context for values of the given origin.
    pub fn context(&self, origin: DataOrigin) -> VisitorContext {
        VisitorContext::new(
            self.registry.clone(),
            self.services.clone(),
            self.config.clone(),
            VisitorOptions {
                data_origin: origin,
            },
        )
    }

    /// Resolve the visitor of `spec`.
    pub fn visitor(&self, spec: &FormSpec, origin: DataOrigin) -> Result<Box<dyn Visitor>> {
        self.context(origin).resolve(spec)
    }

    /// Parse `raw`.
    pub fn parse(
        &self,
        spec: &FormSpec,
        origin: DataOrigin,
        raw: RawValue<'_>,
    ) -> Result<ParseResult<Value>> {
        Ok(self.visitor(spec, origin)?.parse(raw))
    }

    /// Render `raw` for the frontend.
    pub fn to_frontend(
        &self,
        spec: &FormSpec,
        origin: DataOrigin,
        raw: RawValue<'_>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        self.visitor(spec, origin)?.to_frontend(raw)
    }

    /// Validate `raw`.
    pub fn validate(
        &self,
        spec: &FormSpec,
        origin: DataOrigin,
        raw: RawValue<'_>,
    ) -> Result<Vec<ValidationMessage>> {
        self.visitor(spec, origin)?.validate(raw)
    }

    /// Serialize `raw` for disk.
    pub fn to_disk(&self, spec: &FormSpec, origin: DataOrigin, raw: RawValue<'_>) -> Result<Value> {
        self.visitor(spec, origin)?.to_disk(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Integer, SingleChoice, SingleChoiceElement};

    #[test]
    fn test_default_registry_builds() {
        let registry = default_registry().unwrap();
        for source in [kind::SINGLE_CHOICE, kind::PERCENTAGE, kind::LIST_OF_STRINGS] {
            assert!(registry.is_registered(source));
        }
        assert_eq!(registry.fallback_target(), Some(kind::LEGACY));
    }

    #[test]
    fn test_recomposed_dispatch() {
        let engine = FormEngine::with_defaults().unwrap();
        let spec: FormSpec = SingleChoice::new([
            SingleChoiceElement::new("up", "UP"),
            SingleChoiceElement::new("down", "DOWN"),
        ])
        .into();
        let (schema, _) = engine
            .to_frontend(&spec, DataOrigin::Disk, RawValue::Given(&Value::str("up")))
            .unwrap();
        assert!(matches!(schema, FrontendSchema::SingleChoice { .. }));
    }

    #[test]
    fn test_from_config_key() {
        let config = EngineConfig {
            transit_key: Some("not hex".to_string()),
            ..EngineConfig::default()
        };
        assert!(matches!(
            FormEngine::from_config(config),
            Err(FormSpecError::Collaborator { .. })
        ));

        let engine = FormEngine::from_config(EngineConfig {
            transit_key: Some("00112233445566778899aabbccddeeff".to_string()),
            ..EngineConfig::default()
        })
        .unwrap();
        assert_eq!(
            engine
                .to_disk(&Integer::with_default(3).into(), DataOrigin::Disk, RawValue::UseDefault)
                .unwrap(),
            Value::Int(3)
        );
    }
}
