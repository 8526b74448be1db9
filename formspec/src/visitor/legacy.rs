use serde_json::Value as JsonValue;

use super::{DataOrigin, FormSpecVisitor, InvalidValue, ParseResult, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendSchema},
    spec::{Legacy, SpecBase, kind},
    value::Value,
};

/// Visitor of [`Legacy`] specs: the opaque editor.
///
/// Any value parses and is passed through unchanged. Only custom validators
/// run. The frontend value is [`Value::to_tagged_json`], so tuples survive
/// the round trip.
pub struct LegacyVisitor {
    spec: Legacy,
    ctx: VisitorContext,
}

impl LegacyVisitor {
    /// Wrap a spec.
    pub fn new(spec: Legacy, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }
}

visitor_factory!(LegacyVisitor, Legacy, kind::LEGACY);

impl FormSpecVisitor for LegacyVisitor {
    type Parsed = Value;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Value> {
        Ok(self.spec.default_value.clone())
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Value> {
        Ok(match self.ctx.origin() {
            DataOrigin::Disk => raw.clone(),
            DataOrigin::Frontend => Value::from_tagged(raw),
        })
    }

    fn parsed_value(&self, parsed: &Value) -> Value {
        parsed.clone()
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Value, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let schema = FrontendSchema::LegacyValuespec {
            base: FrontendBase::from_spec(&self.spec.base, []),
            original_type: self.spec.original_type.clone(),
        };
        let value = match parsed {
            Ok(v) => v.to_tagged_json(),
            Err(invalid) => invalid.fallback.to_tagged_json(),
        };
        Ok((schema, value))
    }

    fn to_disk_parsed(&self, parsed: &Value) -> Result<Value> {
        Ok(parsed.clone())
    }
}
