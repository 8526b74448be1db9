use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use super::{FormSpecVisitor, InvalidValue, ParseResult, Visitor, VisitorContext};
use crate::{
    config::UnknownKeyPolicy,
    error::Result,
    frontend::{FrontendBase, FrontendSchema, FrontendTopic},
    messages::ValidationCollector,
    spec::{Catalog, FormSpec, SpecBase, Topic, kind},
    value::{RawSlot, Value},
};

/// Visitor of [`Catalog`] specs.
///
/// Every topic is a dictionary resolved through the registry; the catalog
/// itself only adds the topic level to values and locations. A missing topic
/// takes its dictionary's default.
pub struct CatalogVisitor {
    spec: Catalog,
    ctx: VisitorContext,
}

impl CatalogVisitor {
    /// Wrap a spec.
    pub fn new(spec: Catalog, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn topic_visitor(&self, topic: &Topic) -> Result<Box<dyn Visitor>> {
        self.ctx.resolve(&FormSpec::Dictionary(topic.dictionary()))
    }

    fn topics<'a>(
        &'a self,
        parsed: &'a [RawSlot],
    ) -> impl Iterator<Item = (&'a Topic, &'a RawSlot)> + 'a {
        self.spec.topics.iter().zip(parsed)
    }
}

visitor_factory!(CatalogVisitor, Catalog, kind::CATALOG);

impl FormSpecVisitor for CatalogVisitor {
    /// One slot per topic, in topic order.
    type Parsed = Vec<RawSlot>;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Vec<RawSlot>> {
        Ok(vec![RawSlot::Default; self.spec.topics.len()])
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Vec<RawSlot>> {
        let Some(map) = raw.as_dict() else {
            return Err(InvalidValue::new(
                format!("Invalid data: expected a dictionary, got {}", raw.kind()),
                Value::None,
            ));
        };
        for key in map.keys() {
            if self.spec.topics.iter().any(|t| &t.name == key) {
                continue;
            }
            match self.ctx.config().unknown_keys {
                UnknownKeyPolicy::Drop => warn!("dropping undeclared catalog topic `{key}`"),
                UnknownKeyPolicy::Reject => {
                    return Err(InvalidValue::new(
                        format!("Undefined topic `{key}`"),
                        Value::None,
                    ));
                }
            }
        }
        Ok(self
            .spec
            .topics
            .iter()
            .map(|topic| match map.get(&topic.name) {
                Some(value) => RawSlot::Given(value.clone()),
                None => RawSlot::Default,
            })
            .collect())
    }

    fn parsed_value(&self, parsed: &Vec<RawSlot>) -> Value {
        Value::Dict(
            self.topics(parsed)
                .map(|(topic, slot)| (topic.name.clone(), slot.to_value()))
                .collect(),
        )
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Vec<RawSlot>, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let defaults = vec![RawSlot::Default; self.spec.topics.len()];
        let slots = parsed.unwrap_or(&defaults);

        let mut elements = Vec::with_capacity(self.spec.topics.len());
        let mut value = Map::new();
        for (topic, slot) in self.topics(slots) {
            let (dictionary, topic_value) = self.topic_visitor(topic)?.to_frontend(slot.as_raw())?;
            value.insert(topic.name.clone(), topic_value);
            elements.push(FrontendTopic {
                name: topic.name.clone(),
                title: topic.title.clone(),
                dictionary,
            });
        }
        let schema = FrontendSchema::Catalog {
            base: FrontendBase::from_spec(&self.spec.base, []),
            elements,
        };
        Ok((schema, JsonValue::Object(value)))
    }

    fn validate_parsed(&self, parsed: &Vec<RawSlot>, collector: &mut ValidationCollector) -> Result<()> {
        for (topic, slot) in self.topics(parsed) {
            let visitor = self.topic_visitor(topic)?;
            collector.scoped(topic.name.as_str(), |c| visitor.validate_into(slot.as_raw(), c))?;
        }
        Ok(())
    }

    fn to_disk_parsed(&self, parsed: &Vec<RawSlot>) -> Result<Value> {
        let mut out = BTreeMap::new();
        for (topic, slot) in self.topics(parsed) {
            out.insert(topic.name.clone(), self.topic_visitor(topic)?.to_disk(slot.as_raw())?);
        }
        Ok(Value::Dict(out))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{locations, visitor};
    use crate::{
        spec::{DictElement, Integer, TextInput},
        value::RawValue,
        visitor::DataOrigin,
    };

    use super::*;

    fn host_catalog() -> Catalog {
        Catalog::new([
            Topic::new(
                "basic",
                "Basic settings",
                [DictElement::required("name", TextInput::with_default("localhost"))],
            ),
            Topic::new(
                "network",
                "Network",
                [
                    DictElement::required("port", Integer::with_default(22)),
                    DictElement::optional("timeout", Integer::default()),
                ],
            ),
        ])
    }

    #[test]
    fn test_default_disk_shape() {
        let v = visitor(host_catalog(), DataOrigin::Disk);
        assert_eq!(
            v.to_disk(RawValue::UseDefault).unwrap(),
            Value::from(json!({"basic": {"name": "localhost"}, "network": {"port": 22}}))
        );
    }

    #[test]
    fn test_two_level_locations() {
        let v = visitor(host_catalog(), DataOrigin::Frontend);
        let raw = Value::from(json!({
            "basic": {"name": "db01"},
            "network": {"port": 22, "timeout": "soon"}
        }));
        let msgs = v.validate(RawValue::Given(&raw)).unwrap();
        assert_eq!(
            locations(&msgs),
            vec![vec!["network".to_string(), "timeout".to_string()]]
        );
    }

    #[test]
    fn test_frontend_topics() {
        let v = visitor(host_catalog(), DataOrigin::Disk);
        let (schema, value) = v.to_frontend(RawValue::UseDefault).unwrap();
        assert_eq!(value, json!({"basic": {"name": "localhost"}, "network": {"port": 22}}));
        let FrontendSchema::Catalog { elements, .. } = schema else {
            panic!("not a catalog schema");
        };
        assert_eq!(elements[1].title, "Network");
        assert!(matches!(elements[1].dictionary, FrontendSchema::Dictionary { .. }));
    }
}
