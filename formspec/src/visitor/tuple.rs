use serde_json::Value as JsonValue;

use super::{FormSpecVisitor, InvalidValue, ParseResult, Visitor, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendSchema},
    messages::ValidationCollector,
    spec::{SpecBase, Tuple, kind},
    value::{RawSlot, Value},
};

/// Visitor of [`Tuple`] specs.
///
/// The raw sequence must have exactly the declared arity. The default
/// sentinel is handed to every position.
pub struct TupleVisitor {
    spec: Tuple,
    ctx: VisitorContext,
}

impl TupleVisitor {
    /// Wrap a spec.
    pub fn new(spec: Tuple, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn children(&self) -> Result<Vec<Box<dyn Visitor>>> {
        self.spec
            .elements
            .iter()
            .map(|spec| self.ctx.resolve(spec))
            .collect()
    }
}

visitor_factory!(TupleVisitor, Tuple, kind::TUPLE);

impl FormSpecVisitor for TupleVisitor {
    type Parsed = Vec<RawSlot>;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Vec<RawSlot>> {
        Ok(vec![RawSlot::Default; self.spec.elements.len()])
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Vec<RawSlot>> {
        let Some(items) = raw.as_sequence() else {
            return Err(InvalidValue::new(
                format!("Invalid data: expected a tuple, got {}", raw.kind()),
                Value::None,
            ));
        };
        if items.len() != self.spec.elements.len() {
            return Err(InvalidValue::new(
                format!(
                    "Expected {} elements, got {}",
                    self.spec.elements.len(),
                    items.len()
                ),
                Value::None,
            ));
        }
        Ok(items.iter().cloned().map(RawSlot::Given).collect())
    }

    fn parsed_value(&self, parsed: &Vec<RawSlot>) -> Value {
        Value::tuple(parsed.iter().map(RawSlot::to_value))
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Vec<RawSlot>, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let children = self.children()?;
        let mut elements = Vec::with_capacity(children.len());
        let mut values = Vec::with_capacity(children.len());
        let default = RawSlot::Default;
        for (index, child) in children.iter().enumerate() {
            let slot = match parsed {
                Ok(slots) => &slots[index],
                Err(_) => &default,
            };
            let (schema, value) = child.to_frontend(slot.as_raw())?;
            elements.push(schema);
            values.push(value);
        }
        let schema = FrontendSchema::Tuple {
            base: FrontendBase::from_spec(&self.spec.base, []),
            elements,
            layout: self.spec.layout,
        };
        Ok((schema, JsonValue::Array(values)))
    }

    fn validate_parsed(&self, parsed: &Vec<RawSlot>, collector: &mut ValidationCollector) -> Result<()> {
        for (index, (child, slot)) in self.children()?.iter().zip(parsed).enumerate() {
            collector.scoped(index.to_string(), |c| child.validate_into(slot.as_raw(), c))?;
        }
        Ok(())
    }

    fn to_disk_parsed(&self, parsed: &Vec<RawSlot>) -> Result<Value> {
        self.children()?
            .iter()
            .zip(parsed)
            .map(|(child, slot)| child.to_disk(slot.as_raw()))
            .collect::<Result<Vec<_>>>()
            .map(Value::Tuple)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{locations, visitor};
    use crate::{
        spec::{FormSpec, Integer, TextInput},
        value::RawValue,
        visitor::DataOrigin,
    };

    use super::*;

    fn pair() -> Tuple {
        Tuple::new([
            FormSpec::from(Integer::with_default(80)),
            FormSpec::from(TextInput::with_default("http")),
        ])
    }

    #[test]
    fn test_arity() {
        let v = visitor(pair(), DataOrigin::Disk);
        for raw in [json!([1]), json!([1, "a", 2])] {
            let invalid = v.parse(RawValue::Given(&Value::from(raw))).unwrap_err();
            assert!(invalid.reason.starts_with("Expected 2 elements"));
        }
        assert!(v.parse(RawValue::Given(&Value::from(json!([1, "a"])))).is_ok());
    }

    #[test]
    fn test_default_broadcast() {
        let v = visitor(pair(), DataOrigin::Disk);
        assert_eq!(
            v.to_disk(RawValue::UseDefault).unwrap(),
            Value::tuple([Value::Int(80), Value::str("http")])
        );
        assert_eq!(v.frontend_default().unwrap(), json!([80, "http"]));
    }

    #[test]
    fn test_position_location() {
        let v = visitor(pair(), DataOrigin::Frontend);
        let msgs = v
            .validate(RawValue::Given(&Value::from(json!([1, 2]))))
            .unwrap();
        assert_eq!(locations(&msgs), vec![vec!["1".to_string()]]);
        assert_eq!(
            v.to_disk(RawValue::Given(&Value::from(json!([1, "a"])))).unwrap(),
            Value::tuple([Value::Int(1), Value::str("a")])
        );
    }
}
