use serde_json::Value as JsonValue;

use super::{FormSpecVisitor, InvalidValue, NO_VALUE_REASON, ParseResult, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendSchema},
    spec::{Prefill, SpecBase, TextInput, kind},
    value::Value,
};

/// Visitor of [`TextInput`] specs.
pub struct StringVisitor {
    spec: TextInput,
    ctx: VisitorContext,
}

impl StringVisitor {
    /// Wrap a spec.
    pub fn new(spec: TextInput, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }
}

visitor_factory!(StringVisitor, String, kind::STRING);

impl FormSpecVisitor for StringVisitor {
    type Parsed = String;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<String> {
        match &self.spec.prefill {
            Prefill::DefaultValue(v) => Ok(v.clone()),
            Prefill::InputHint(_) => Err(InvalidValue::new(NO_VALUE_REASON, "")),
        }
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<String> {
        match raw {
            Value::Str(s) => Ok(s.clone()),
            other => Err(InvalidValue::new(
                format!("Invalid string: got {}", other.kind()),
                "",
            )),
        }
    }

    fn parsed_value(&self, parsed: &String) -> Value {
        Value::Str(parsed.clone())
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&String, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let schema = FrontendSchema::String {
            base: FrontendBase::from_spec(&self.spec.base, []),
            label: self.spec.label.clone(),
            input_hint: self.spec.prefill.input_hint().cloned(),
        };
        let value = match parsed {
            Ok(s) => JsonValue::String(s.clone()),
            Err(invalid) => invalid.fallback.to_json(),
        };
        Ok((schema, value))
    }

    fn to_disk_parsed(&self, parsed: &String) -> Result<Value> {
        Ok(Value::Str(parsed.clone()))
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
    fn test_parse_string() {
        let v = visitor(TextInput::default(), DataOrigin::Disk);
        assert_eq!(v.parse(RawValue::Given(&Value::str("abc"))), Ok(Value::str("abc")));
        let invalid = v.parse(RawValue::Given(&Value::Int(3))).unwrap_err();
        assert_eq!(invalid.reason, "Invalid string: got integer");
    }

    #[test]
    fn test_default_and_hint() {
        let v = visitor(TextInput::with_default("x"), DataOrigin::Disk);
        assert_eq!(v.to_disk(RawValue::UseDefault).unwrap(), Value::str("x"));

        let spec = TextInput {
            prefill: Prefill::InputHint("e.g. eth0".to_string()),
            ..TextInput::default()
        };
        let v = visitor(spec, DataOrigin::Frontend);
        let msgs = v.validate(RawValue::UseDefault).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].message, NO_VALUE_REASON);
        let (schema, _) = v.to_frontend(RawValue::UseDefault).unwrap();
        let FrontendSchema::String { input_hint, .. } = schema else {
            panic!("not a string schema");
        };
        assert_eq!(input_hint.as_deref(), Some("e.g. eth0"));
    }

    #[test]
    fn test_not_empty_validator() {
        let v = visitor(
            TextInput::default().with_validator(Validator::not_empty()),
            DataOrigin::Frontend,
        );
        let msgs = v.validate(RawValue::Given(&Value::str(""))).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].replacement_value, json!(""));
        let (schema, _) = v.to_frontend(RawValue::UseDefault).unwrap();
        assert_eq!(schema.base().validators.len(), 1);
    }

    #[test]
    fn test_migrate_only_on_disk() {
        let spec = TextInput::default().with_migrate(|v| match v {
            Value::Int(i) => Value::str(i.to_string()),
            other => other.clone(),
        });
        let disk = visitor(spec.clone(), DataOrigin::Disk);
        assert_eq!(
            disk.to_disk(RawValue::Given(&Value::Int(5))).unwrap(),
            Value::str("5")
        );
        let frontend = visitor(spec, DataOrigin::Frontend);
        assert!(frontend.parse(RawValue::Given(&Value::Int(5))).is_err());
    }
}
