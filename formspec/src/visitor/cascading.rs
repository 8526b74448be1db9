use serde_json::{Value as JsonValue, json};

use super::{DataOrigin, FormSpecVisitor, InvalidValue, ParseResult, Visitor, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendCascadingElement, FrontendSchema},
    messages::ValidationCollector,
    spec::{CascadingElement, CascadingSingleChoice, SpecBase, kind},
    value::{RawSlot, RawValue, Value},
};

const DEFAULT_INPUT_HINT: &str = "Please choose";

/// Parsed cascading choice: the selected alternative and its raw parameters.
#[derive(Debug, Clone)]
pub struct CascadingSelection {
    index: usize,
    parameters: RawSlot,
}

/// Visitor of [`CascadingSingleChoice`] specs.
///
/// Values are `(name, parameters)` tuples on disk and `[name, parameters]`
/// arrays on the frontend. Parameters are delegated to the visitor of the
/// selected alternative.
pub struct CascadingSingleChoiceVisitor {
    spec: CascadingSingleChoice,
    ctx: VisitorContext,
}

impl CascadingSingleChoiceVisitor {
    /// Wrap a spec.
    pub fn new(spec: CascadingSingleChoice, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn selected(&self, parsed: &CascadingSelection) -> Result<(&CascadingElement, Box<dyn Visitor>)> {
        let element = &self.spec.elements[parsed.index];
        Ok((element, self.ctx.resolve(&element.parameter_form)?))
    }

    fn select(&self, name: &str, parameters: RawSlot) -> ParseResult<CascadingSelection> {
        self.spec
            .elements
            .iter()
            .position(|e| e.name == name)
            .map(|index| CascadingSelection { index, parameters })
            .ok_or_else(|| InvalidValue::new(format!("Invalid choice: {name}"), Value::None))
    }
}

visitor_factory!(
    CascadingSingleChoiceVisitor,
    CascadingSingleChoice,
    kind::CASCADING_SINGLE_CHOICE
);

impl FormSpecVisitor for CascadingSingleChoiceVisitor {
    type Parsed = CascadingSelection;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<CascadingSelection> {
        match &self.spec.prefill {
            Some(name) => self.select(name, RawSlot::Default),
            None => Err(InvalidValue::new("Please choose an option", Value::None)),
        }
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<CascadingSelection> {
        let shape = match self.ctx.origin() {
            DataOrigin::Disk => "a (name, value) tuple",
            DataOrigin::Frontend => "a [name, value] array",
        };
        match raw.as_sequence() {
            Some([name, parameters]) => match name.as_str() {
                Some(name) => self.select(name, RawSlot::Given(parameters.clone())),
                None => Err(InvalidValue::new(
                    format!("Invalid choice: got {}", name.kind()),
                    Value::None,
                )),
            },
            _ => Err(InvalidValue::new(
                format!("Invalid data: expected {shape}, got {}", raw.kind()),
                Value::None,
            )),
        }
    }

    fn parsed_value(&self, parsed: &CascadingSelection) -> Value {
        Value::tuple([
            Value::str(self.spec.elements[parsed.index].name.as_str()),
            parsed.parameters.to_value(),
        ])
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&CascadingSelection, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let mut elements = Vec::with_capacity(self.spec.elements.len());
        for element in &self.spec.elements {
            let (parameter_form, default_value) = self
                .ctx
                .resolve(&element.parameter_form)?
                .to_frontend(RawValue::UseDefault)?;
            elements.push(FrontendCascadingElement {
                name: element.name.clone(),
                title: element.title.clone(),
                default_value,
                parameter_form,
            });
        }

        let (value, input_hint) = match parsed {
            Ok(selection) => {
                let (element, child) = self.selected(selection)?;
                let (_, parameters) = child.to_frontend(selection.parameters.as_raw())?;
                (json!([element.name, parameters]), self.spec.input_hint.clone())
            }
            Err(_) => (
                JsonValue::Null,
                Some(
                    self.spec
                        .input_hint
                        .clone()
                        .unwrap_or_else(|| DEFAULT_INPUT_HINT.to_string()),
                ),
            ),
        };
        let schema = FrontendSchema::CascadingSingleChoice {
            base: FrontendBase::from_spec(&self.spec.base, []),
            label: self.spec.label.clone(),
            elements,
            input_hint,
            layout: self.spec.layout,
        };
        Ok((schema, value))
    }

    fn validate_parsed(
        &self,
        parsed: &CascadingSelection,
        collector: &mut ValidationCollector,
    ) -> Result<()> {
        let (element, child) = self.selected(parsed)?;
        collector.scoped(element.name.as_str(), |c| {
            child.validate_into(parsed.parameters.as_raw(), c)
        })
    }

    fn to_disk_parsed(&self, parsed: &CascadingSelection) -> Result<Value> {
        let (element, child) = self.selected(parsed)?;
        Ok(Value::tuple([
            Value::str(element.name.as_str()),
            child.to_disk(parsed.parameters.as_raw())?,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{locations, visitor};
    use crate::spec::{FixedValue, Integer};

    use super::*;

    fn levels_or_none() -> CascadingSingleChoice {
        CascadingSingleChoice {
            prefill: Some("levels".to_string()),
            ..CascadingSingleChoice::new([
                CascadingElement::new("none", "No levels", FixedValue::new(Value::None)),
                CascadingElement::new("levels", "Fixed levels", Integer::with_default(90)),
            ])
        }
    }

    #[test]
    fn test_prefill_selects_child_default() {
        let v = visitor(levels_or_none(), DataOrigin::Disk);
        assert_eq!(
            v.to_disk(RawValue::UseDefault).unwrap(),
            Value::tuple([Value::str("levels"), Value::Int(90)])
        );
        assert_eq!(v.frontend_default().unwrap(), json!(["levels", 90]));
    }

    #[test]
    fn test_unmatched_discriminant() {
        let v = visitor(levels_or_none(), DataOrigin::Disk);
        let raw = Value::tuple([Value::str("predictive"), Value::None]);
        let invalid = v.parse(RawValue::Given(&raw)).unwrap_err();
        assert_eq!(invalid.reason, "Invalid choice: predictive");
        let (schema, value) = v.to_frontend(RawValue::Given(&raw)).unwrap();
        assert_eq!(value, JsonValue::Null);
        let FrontendSchema::CascadingSingleChoice {
            elements,
            input_hint,
            ..
        } = schema
        else {
            panic!("not a cascading schema");
        };
        assert_eq!(elements.len(), 2);
        assert_eq!(input_hint.as_deref(), Some(DEFAULT_INPUT_HINT));
    }

    #[test]
    fn test_parameters_delegated() {
        let v = visitor(levels_or_none(), DataOrigin::Frontend);
        let raw = Value::from(json!(["levels", "high"]));
        let msgs = v.validate(RawValue::Given(&raw)).unwrap();
        assert_eq!(locations(&msgs), vec![vec!["levels".to_string()]]);

        let raw = Value::from(json!(["levels", 80]));
        assert_eq!(
            v.to_disk(RawValue::Given(&raw)).unwrap(),
            Value::tuple([Value::str("levels"), Value::Int(80)])
        );
    }

    #[test]
    fn test_no_prefill_is_invalid() {
        let spec = CascadingSingleChoice {
            prefill: None,
            ..levels_or_none()
        };
        let v = visitor(spec, DataOrigin::Disk);
        assert_eq!(v.validate(RawValue::UseDefault).unwrap().len(), 1);
    }
}
