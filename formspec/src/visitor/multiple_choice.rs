use serde_json::Value as JsonValue;

use super::{FormSpecVisitor, InvalidValue, ParseResult, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendChoice, FrontendSchema},
    messages::ValidationCollector,
    spec::{MultipleChoiceExtended, SpecBase, kind},
    value::Value,
};

/// Visitor of [`MultipleChoiceExtended`] specs.
///
/// Values are lists of element names in both origins.
pub struct MultipleChoiceVisitor {
    spec: MultipleChoiceExtended,
    ctx: VisitorContext,
}

impl MultipleChoiceVisitor {
    /// Wrap a spec.
    pub fn new(spec: MultipleChoiceExtended, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn is_known(&self, name: &str) -> bool {
        self.spec.elements.iter().any(|e| e.name == name)
    }
}

visitor_factory!(MultipleChoiceVisitor, MultipleChoiceExtended, kind::MULTIPLE_CHOICE_EXTENDED);

fn names_value(names: &[String]) -> Value {
    Value::list(names.iter().map(|n| Value::str(n.as_str())))
}

impl FormSpecVisitor for MultipleChoiceVisitor {
    type Parsed = Vec<String>;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Vec<String>> {
        Ok(self.spec.prefill.clone())
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Vec<String>> {
        let invalid = || InvalidValue::new(
            format!("Invalid selection: expected a list of names, got {}", raw.kind()),
            Value::list([]),
        );
        raw.as_sequence()
            .ok_or_else(invalid)?
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect()
    }

    fn parsed_value(&self, parsed: &Vec<String>) -> Value {
        names_value(parsed)
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Vec<String>, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let schema = FrontendSchema::MultipleChoice {
            base: FrontendBase::from_spec(&self.spec.base, []),
            elements: self
                .spec
                .elements
                .iter()
                .map(|e| FrontendChoice {
                    name: e.name.clone(),
                    title: e.title.clone(),
                })
                .collect(),
            show_toggle_all: self.spec.show_toggle_all,
            layout: self.spec.layout.resolve(self.spec.elements.len()),
        };
        let value = match parsed {
            Ok(names) => names_value(names).to_json(),
            Err(invalid) => invalid.fallback.to_json(),
        };
        Ok((schema, value))
    }

    fn validate_parsed(
        &self,
        parsed: &Vec<String>,
        collector: &mut ValidationCollector,
    ) -> Result<()> {
        let known: Vec<String> = parsed.iter().filter(|n| self.is_known(n)).cloned().collect();
        for name in parsed.iter().filter(|n| !self.is_known(n)) {
            collector.push(
                format!("Unknown element: {name}"),
                names_value(&known).to_json(),
            );
        }
        Ok(())
    }

    fn to_disk_parsed(&self, parsed: &Vec<String>) -> Result<Value> {
        let mut seen: Vec<&str> = Vec::with_capacity(parsed.len());
        for name in parsed {
            if !seen.contains(&name.as_str()) {
                seen.push(name);
            }
        }
        Ok(Value::list(seen.into_iter().map(Value::str)))
    }
}
