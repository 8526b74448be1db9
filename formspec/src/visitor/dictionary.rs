use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use super::{FormSpecVisitor, InvalidValue, ParseResult, Visitor, VisitorContext};
use crate::{
    config::UnknownKeyPolicy,
    error::Result,
    frontend::{FrontendBase, FrontendDictElement, FrontendSchema},
    messages::ValidationCollector,
    spec::{DictElement, Dictionary, SpecBase, kind},
    value::{RawSlot, RawValue, Value},
};

/// Visitor of [`Dictionary`] specs.
///
/// Parsing is shallow: the parsed map holds the raw child values, which are
/// handed to the child visitors by the other operations.
pub struct DictionaryVisitor {
    spec: Dictionary,
    ctx: VisitorContext,
}

impl DictionaryVisitor {
    /// Wrap a spec.
    pub fn new(spec: Dictionary, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn child(&self, element: &DictElement) -> Result<Box<dyn Visitor>> {
        self.ctx.resolve(&element.parameter_form)
    }

    /// Present elements in declaration order.
    fn present<'a>(
        &'a self,
        parsed: &'a BTreeMap<String, RawSlot>,
    ) -> impl Iterator<Item = (&'a DictElement, &'a RawSlot)> + 'a {
        self.spec
            .elements
            .iter()
            .filter_map(move |e| parsed.get(&e.name).map(|slot| (e, slot)))
    }
}

visitor_factory!(DictionaryVisitor, Dictionary, kind::DICTIONARY);

impl FormSpecVisitor for DictionaryVisitor {
    type Parsed = BTreeMap<String, RawSlot>;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Self::Parsed> {
        Ok(self
            .spec
            .elements
            .iter()
            .filter(|e| e.required)
            .map(|e| (e.name.clone(), RawSlot::Default))
            .collect())
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Self::Parsed> {
        let Some(map) = raw.as_dict() else {
            return Err(InvalidValue::new(
                format!("Invalid data: expected a dictionary, got {}", raw.kind()),
                Value::Dict(BTreeMap::new()),
            ));
        };

        let mut parsed = BTreeMap::new();
        for (key, value) in map {
            if self.spec.element(key).is_some() {
                parsed.insert(key.clone(), RawSlot::Given(value.clone()));
            } else if self.spec.ignored_elements.contains(key) {
                continue;
            } else {
                match self.ctx.config().unknown_keys {
                    UnknownKeyPolicy::Drop => warn!("dropping undeclared dictionary key `{key}`"),
                    UnknownKeyPolicy::Reject => {
                        return Err(InvalidValue::new(
                            format!("Undefined key `{key}`"),
                            Value::Dict(BTreeMap::new()),
                        ));
                    }
                }
            }
        }

        if let Some(missing) = self
            .spec
            .elements
            .iter()
            .find(|e| e.required && !parsed.contains_key(&e.name))
        {
            return Err(InvalidValue::new(
                format!("Required field missing: {}", missing.name),
                Value::Dict(BTreeMap::new()),
            ));
        }
        Ok(parsed)
    }

    fn parsed_value(&self, parsed: &Self::Parsed) -> Value {
        Value::Dict(
            parsed
                .iter()
                .map(|(k, slot)| (k.clone(), slot.to_value()))
                .collect(),
        )
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Self::Parsed, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let mut elements = Vec::with_capacity(self.spec.elements.len());
        let mut value = Map::new();
        for element in &self.spec.elements {
            let child = self.child(element)?;
            let (parameter_form, default_value) = child.to_frontend(RawValue::UseDefault)?;
            if let Ok(Some(slot)) = parsed.map(|p| p.get(&element.name)) {
                let (_, child_value) = child.to_frontend(slot.as_raw())?;
                value.insert(element.name.clone(), child_value);
            }
            elements.push(FrontendDictElement {
                name: element.name.clone(),
                required: element.required,
                group: element.group.clone(),
                default_value,
                parameter_form,
            });
        }
        let schema = FrontendSchema::Dictionary {
            base: FrontendBase::from_spec(&self.spec.base, []),
            elements,
            no_elements_text: self.spec.no_elements_text.clone(),
        };
        Ok((schema, JsonValue::Object(value)))
    }

    fn validate_parsed(&self, parsed: &Self::Parsed, collector: &mut ValidationCollector) -> Result<()> {
        for (element, slot) in self.present(parsed) {
            let child = self.child(element)?;
            collector.scoped(element.name.as_str(), |c| child.validate_into(slot.as_raw(), c))?;
        }
        Ok(())
    }

    fn to_disk_parsed(&self, parsed: &Self::Parsed) -> Result<Value> {
        let mut out = BTreeMap::new();
        for (element, slot) in self.present(parsed) {
            out.insert(element.name.clone(), self.child(element)?.to_disk(slot.as_raw())?);
        }
        Ok(Value::Dict(out))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{locations, visitor};
    use crate::{
        config::EngineConfig,
        engine::{FormEngine, default_registry},
        services::Services,
        spec::{Integer, TextInput},
        visitor::DataOrigin,
    };

    use super::*;

    fn levels() -> Dictionary {
        Dictionary::new([
            DictElement::required("a", Integer::with_default(1)),
            DictElement::optional("b", TextInput::default()),
        ])
    }

    #[test]
    fn test_child_location() {
        let v = visitor(levels(), DataOrigin::Disk);
        let raw = Value::from(json!({"a": "not-an-int", "b": "ok"}));
        let msgs = v.validate(RawValue::Given(&raw)).unwrap();
        assert_eq!(locations(&msgs), vec![vec!["a".to_string()]]);
        assert_eq!(msgs[0].replacement_value, json!("not-an-int"));
    }

    #[test]
    fn test_required_key() {
        let v = visitor(levels(), DataOrigin::Disk);
        let invalid = v.parse(RawValue::Given(&Value::from(json!({"b": "x"})))).unwrap_err();
        assert_eq!(invalid.reason, "Required field missing: a");
        let msgs = v.validate(RawValue::Given(&Value::from(json!({"b": "x"})))).unwrap();
        assert_eq!(locations(&msgs), vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_only_present_keys_on_disk() {
        let v = visitor(levels(), DataOrigin::Disk);
        assert_eq!(
            v.to_disk(RawValue::UseDefault).unwrap(),
            Value::from(json!({"a": 1}))
        );
        let (schema, value) = v.to_frontend(RawValue::UseDefault).unwrap();
        assert_eq!(value, json!({"a": 1}));
        let FrontendSchema::Dictionary { elements, .. } = schema else {
            panic!("not a dictionary schema");
        };
        assert_eq!(elements[1].default_value, json!(""));
    }

    #[test]
    fn test_unknown_and_ignored_keys() {
        let spec = Dictionary {
            ignored_elements: vec!["legacy".to_string()],
            ..levels()
        };
        let raw = Value::from(json!({"a": 2, "legacy": true, "surprise": 1}));
        let v = visitor(spec.clone(), DataOrigin::Disk);
        assert_eq!(v.to_disk(RawValue::Given(&raw)).unwrap(), Value::from(json!({"a": 2})));

        let config = EngineConfig {
            unknown_keys: UnknownKeyPolicy::Reject,
            ..EngineConfig::default()
        };
        let strict = FormEngine::new(default_registry().unwrap(), Services::default(), config);
        let v = strict.visitor(&spec.into(), DataOrigin::Disk).unwrap();
        let invalid = v.parse(RawValue::Given(&raw)).unwrap_err();
        assert_eq!(invalid.reason, "Undefined key `surprise`");
    }
}
