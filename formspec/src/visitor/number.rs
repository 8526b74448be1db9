use serde_json::Value as JsonValue;

use super::{FormSpecVisitor, InvalidValue, NO_VALUE_REASON, ParseResult, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendSchema, FrontendValidator},
    spec::{Float, Integer, Prefill, SpecBase, kind},
    value::Value,
};

/// Visitor of [`Integer`] specs.
pub struct IntegerVisitor {
    spec: Integer,
    ctx: VisitorContext,
}

impl IntegerVisitor {
    /// Wrap a spec.
    pub fn new(spec: Integer, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }
}

visitor_factory!(IntegerVisitor, Integer, kind::INTEGER);

impl FormSpecVisitor for IntegerVisitor {
    type Parsed = i64;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<i64> {
        match &self.spec.prefill {
            Prefill::DefaultValue(v) => Ok(*v),
            Prefill::InputHint(_) => Err(InvalidValue::new(NO_VALUE_REASON, "")),
        }
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<i64> {
        match raw {
            Value::Int(i) => Ok(*i),
            other => Err(InvalidValue::new(
                format!("Invalid integer number: got {}", other.kind()),
                other.clone(),
            )),
        }
    }

    fn parsed_value(&self, parsed: &i64) -> Value {
        Value::Int(*parsed)
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&i64, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let schema = FrontendSchema::Integer {
            base: FrontendBase::from_spec(
                &self.spec.base,
                [FrontendValidator::IsInteger {
                    error_message: "The value must be a whole number.".to_string(),
                }],
            ),
            label: self.spec.label.clone(),
            unit: self.spec.unit_symbol.clone(),
            input_hint: self.spec.prefill.input_hint().map(|v| JsonValue::from(*v)),
        };
        let value = match parsed {
            Ok(v) => JsonValue::from(*v),
            Err(invalid) => invalid.fallback.to_json(),
        };
        Ok((schema, value))
    }

    fn to_disk_parsed(&self, parsed: &i64) -> Result<Value> {
        Ok(Value::Int(*parsed))
    }
}

/// Visitor of [`Float`] specs.
pub struct FloatVisitor {
    spec: Float,
    ctx: VisitorContext,
}

impl FloatVisitor {
    /// Wrap a spec.
    pub fn new(spec: Float, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }
}

visitor_factory!(FloatVisitor, Float, kind::FLOAT);

impl FormSpecVisitor for FloatVisitor {
    type Parsed = f64;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<f64> {
        match &self.spec.prefill {
            Prefill::DefaultValue(v) => Ok(*v),
            Prefill::InputHint(_) => Err(InvalidValue::new(NO_VALUE_REASON, "")),
        }
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<f64> {
        match raw {
            Value::Float(f) if f.is_finite() => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(InvalidValue::new(
                format!("Invalid number: got {}", other.kind()),
                other.clone(),
            )),
        }
    }

    fn parsed_value(&self, parsed: &f64) -> Value {
        Value::Float(*parsed)
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&f64, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let schema = FrontendSchema::Float {
            base: FrontendBase::from_spec(
                &self.spec.base,
                [FrontendValidator::IsFloat {
                    error_message: "The value must be a number.".to_string(),
                }],
            ),
            label: self.spec.label.clone(),
            unit: self.spec.unit_symbol.clone(),
            input_hint: self.spec.prefill.input_hint().map(|v| JsonValue::from(*v)),
        };
        let value = match parsed {
            Ok(v) => Value::Float(*v).to_json(),
            Err(invalid) => invalid.fallback.to_json(),
        };
        Ok((schema, value))
    }

    fn to_disk_parsed(&self, parsed: &f64) -> Result<Value> {
        Ok(Value::Float(*parsed))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::visitor;
    use crate::{
        spec::SpecBuilder,
        validators::Validator,
        value::RawValue,
        visitor::{DataOrigin, Visitor},
    };

    use super::*;

    #[test]
    fn test_integer_parse() {
        let v = visitor(Integer::default(), DataOrigin::Disk);
        assert_eq!(v.parse(RawValue::Given(&Value::Int(7))), Ok(Value::Int(7)));
        let invalid = v.parse(RawValue::Given(&Value::str("x"))).unwrap_err();
        assert_eq!(invalid.fallback, Value::str("x"));
    }

    #[test]
    fn test_integer_default_and_hint() {
        let v = visitor(Integer::with_default(5), DataOrigin::Frontend);
        assert_eq!(v.to_disk(RawValue::UseDefault).unwrap(), Value::Int(5));

        let v = visitor(Integer::default(), DataOrigin::Frontend);
        let invalid = v.parse(RawValue::UseDefault).unwrap_err();
        assert_eq!(invalid.reason, NO_VALUE_REASON);
        let (schema, value) = v.to_frontend(RawValue::UseDefault).unwrap();
        assert_eq!(value, json!(""));
        let FrontendSchema::Integer { input_hint, .. } = schema else {
            panic!("not an integer schema");
        };
        assert_eq!(input_hint, Some(json!(0)));
    }

    #[test]
    fn test_integer_to_disk_refuses_invalid() {
        let v = visitor(Integer::default(), DataOrigin::Disk);
        assert!(matches!(
            v.to_disk(RawValue::Given(&Value::str("x"))),
            Err(crate::error::FormSpecError::InvalidValueToDisk(_))
        ));
    }

    #[test]
    fn test_integer_custom_validator() {
        let spec = Integer::default().with_validator(Validator::number_in_range(Some(1.0), None));
        let v = visitor(spec, DataOrigin::Disk);
        let msgs = v.validate(RawValue::Given(&Value::Int(0))).unwrap();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].location.is_empty());
        assert_eq!(msgs[0].replacement_value, json!(0));
        assert!(v.validate(RawValue::Given(&Value::Int(1))).unwrap().is_empty());
    }

    #[test]
    fn test_float_accepts_integers() {
        let v = visitor(Float::default(), DataOrigin::Frontend);
        assert_eq!(
            v.to_disk(RawValue::Given(&Value::Int(2))).unwrap(),
            Value::Float(2.0)
        );
        assert_eq!(v.validate(RawValue::Given(&Value::Bool(true))).unwrap().len(), 1);
    }
}
