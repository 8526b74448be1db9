use serde_json::Value as JsonValue;

use super::{FormSpecVisitor, InvalidValue, NO_VALUE_REASON, ParseResult, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendSchema},
    spec::{BooleanChoice, Prefill, SpecBase, kind},
    value::Value,
};

/// Visitor of [`BooleanChoice`] specs.
pub struct BooleanChoiceVisitor {
    spec: BooleanChoice,
    ctx: VisitorContext,
}

impl BooleanChoiceVisitor {
    /// Wrap a spec.
    pub fn new(spec: BooleanChoice, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }
}

visitor_factory!(BooleanChoiceVisitor, BooleanChoice, kind::BOOLEAN_CHOICE);

impl FormSpecVisitor for BooleanChoiceVisitor {
    type Parsed = bool;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<bool> {
        match self.spec.prefill {
            Prefill::DefaultValue(v) => Ok(v),
            Prefill::InputHint(_) => Err(InvalidValue::new(NO_VALUE_REASON, false)),
        }
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<bool> {
        raw.as_bool().ok_or_else(|| {
            InvalidValue::new(format!("Invalid choice: got {}", raw.kind()), false)
        })
    }

    fn parsed_value(&self, parsed: &bool) -> Value {
        Value::Bool(*parsed)
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&bool, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let schema = FrontendSchema::BooleanChoice {
            base: FrontendBase::from_spec(&self.spec.base, []),
            label: self.spec.label.clone(),
            text_on: self.spec.text_on.clone().unwrap_or_else(|| "on".to_string()),
            text_off: self.spec.text_off.clone().unwrap_or_else(|| "off".to_string()),
        };
        let value = match parsed {
            Ok(b) => JsonValue::Bool(*b),
            Err(invalid) => invalid.fallback.to_json(),
        };
        Ok((schema, value))
    }

    fn to_disk_parsed(&self, parsed: &bool) -> Result<Value> {
        Ok(Value::Bool(*parsed))
    }
}
