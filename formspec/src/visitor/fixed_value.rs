use serde_json::Value as JsonValue;

use super::{FormSpecVisitor, InvalidValue, ParseResult, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendSchema},
    spec::{FixedValue, SpecBase, kind},
    value::Value,
};

/// Visitor of [`FixedValue`] specs.
///
/// The only valid value is the configured one. Values are compared with
/// [`Value::loosely_eq`], so a tuple on disk matches a list from the frontend.
pub struct FixedValueVisitor {
    spec: FixedValue,
    ctx: VisitorContext,
}

impl FixedValueVisitor {
    /// Wrap a spec.
    pub fn new(spec: FixedValue, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }
}

visitor_factory!(FixedValueVisitor, FixedValue, kind::FIXED_VALUE);

impl FormSpecVisitor for FixedValueVisitor {
    type Parsed = Value;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Value> {
        Ok(self.spec.value.clone())
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Value> {
        if raw.loosely_eq(&self.spec.value) {
            Ok(self.spec.value.clone())
        } else {
            Err(InvalidValue::new(
                format!(
                    "Invalid value: expected {}, got {}",
                    self.spec.value.canonical_repr(),
                    raw.canonical_repr()
                ),
                self.spec.value.clone(),
            ))
        }
    }

    fn parsed_value(&self, parsed: &Value) -> Value {
        parsed.clone()
    }

    fn to_frontend_parsed(
        &self,
        _parsed: std::result::Result<&Value, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let value = self.spec.value.to_json();
        let schema = FrontendSchema::FixedValue {
            base: FrontendBase::from_spec(&self.spec.base, []),
            label: self.spec.label.clone(),
            value: value.clone(),
        };
        Ok((schema, value))
    }

    fn to_disk_parsed(&self, parsed: &Value) -> Result<Value> {
        Ok(parsed.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::visitor;
    use crate::{
        value::RawValue,
        visitor::{DataOrigin, Visitor},
    };

    use super::*;

    #[test]
    fn test_fixed_value() {
        let v = visitor(
            FixedValue::new(Value::tuple([Value::Int(1), Value::str("a")])),
            DataOrigin::Frontend,
        );
        let from_frontend = Value::from(json!([1, "a"]));
        assert_eq!(
            v.to_disk(RawValue::Given(&from_frontend)).unwrap(),
            Value::tuple([Value::Int(1), Value::str("a")])
        );
        assert_eq!(v.validate(RawValue::Given(&Value::Int(2))).unwrap().len(), 1);
        assert_eq!(v.frontend_default().unwrap(), json!([1, "a"]));
    }
}
