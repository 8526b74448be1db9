use serde_json::Value as JsonValue;

use super::{DataOrigin, FormSpecVisitor, InvalidValue, ParseResult, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendChoice, FrontendSchema},
    messages::ValidationCollector,
    option_id::{find_by_option_id, option_id},
    spec::{ChoiceElement, InvalidElementMode, SingleChoiceExtended, SpecBase, kind},
    value::Value,
};

const DEFAULT_INPUT_HINT: &str = "Please choose";
const INVALID_CHOICE: &str = "Invalid choice";

/// Parsed single choice.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Value of one of the elements.
    Matched(Value),
    /// Value matching no element, kept under the `keep` policy.
    Unmatched(Value),
}

impl Selection {
    /// The selected value.
    pub fn value(&self) -> &Value {
        match self {
            Selection::Matched(v) | Selection::Unmatched(v) => v,
        }
    }
}

/// Visitor of [`SingleChoiceExtended`] specs.
///
/// On the frontend wire every element is identified by its option id. Disk
/// values match elements by [`Value::loosely_eq`], and parsing yields the
/// element's own value.
pub struct SingleChoiceVisitor {
    spec: SingleChoiceExtended,
    ctx: VisitorContext,
}

impl SingleChoiceVisitor {
    /// Wrap a spec.
    pub fn new(spec: SingleChoiceExtended, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn keeps_invalid(&self) -> bool {
        matches!(
            &self.spec.invalid_element_validator,
            Some(v) if v.mode == InvalidElementMode::Keep
        )
    }

    fn invalid_message(&self, value: &Value) -> String {
        self.spec
            .invalid_element_validator
            .as_ref()
            .and_then(|v| v.error_msg.clone())
            .unwrap_or_else(|| format!("{INVALID_CHOICE}: {}", value.canonical_repr()))
    }

    fn invalid_hint(&self) -> String {
        self.spec
            .invalid_element_validator
            .as_ref()
            .and_then(|v| v.display.clone())
            .or_else(|| self.spec.input_hint.clone())
            .unwrap_or_else(|| DEFAULT_INPUT_HINT.to_string())
    }

    fn find(&self, value: &Value) -> Option<&ChoiceElement> {
        self.spec.elements.iter().find(|e| e.name.loosely_eq(value))
    }

    fn select(&self, value: &Value) -> ParseResult<Selection> {
        if let Some(element) = self.find(value) {
            Ok(Selection::Matched(element.name.clone()))
        } else if self.keeps_invalid() {
            Ok(Selection::Unmatched(value.clone()))
        } else {
            Err(InvalidValue::new(self.invalid_message(value), Value::None))
        }
    }
}

visitor_factory!(SingleChoiceVisitor, SingleChoiceExtended, kind::SINGLE_CHOICE_EXTENDED);

impl FormSpecVisitor for SingleChoiceVisitor {
    type Parsed = Selection;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Selection> {
        match &self.spec.prefill {
            Some(value) => self.select(value),
            None => Err(InvalidValue::new("Please choose an option", Value::None)),
        }
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Selection> {
        match self.ctx.origin() {
            DataOrigin::Disk => self.select(raw),
            DataOrigin::Frontend => raw
                .as_str()
                .and_then(|id| find_by_option_id(id, &self.spec.elements, |e| &e.name))
                .map(|element| Selection::Matched(element.name.clone()))
                .ok_or_else(|| InvalidValue::new(self.invalid_message(raw), Value::None)),
        }
    }

    fn parsed_value(&self, parsed: &Selection) -> Value {
        parsed.value().clone()
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Selection, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let (value, input_hint) = match parsed {
            Ok(Selection::Matched(v)) => (JsonValue::String(option_id(v)), self.spec.input_hint.clone()),
            Ok(Selection::Unmatched(_)) | Err(_) => (JsonValue::Null, Some(self.invalid_hint())),
        };
        let schema = FrontendSchema::SingleChoice {
            base: FrontendBase::from_spec(&self.spec.base, []),
            label: self.spec.label.clone(),
            elements: self
                .spec
                .elements
                .iter()
                .map(|e| FrontendChoice {
                    name: option_id(&e.name),
                    title: e.title.clone(),
                })
                .collect(),
            no_elements_text: self.spec.no_elements_text.clone(),
            frozen: self.spec.frozen,
            input_hint,
        };
        Ok((schema, value))
    }

    fn validate_parsed(&self, parsed: &Selection, collector: &mut ValidationCollector) -> Result<()> {
        if let Selection::Unmatched(value) = parsed {
            collector.push(self.invalid_message(value), JsonValue::Null);
        }
        Ok(())
    }

    fn to_disk_parsed(&self, parsed: &Selection) -> Result<Value> {
        Ok(parsed.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::visitor;
    use crate::{
        spec::InvalidElementValidator,
        value::RawValue,
        visitor::{DataOrigin, Visitor},
    };

    use super::*;

    fn up_down() -> SingleChoiceExtended {
        SingleChoiceExtended::new([ChoiceElement::new("up", "UP"), ChoiceElement::new("down", "DOWN")])
    }

    #[test]
    fn test_option_ids_on_the_wire() {
        let disk = visitor(up_down(), DataOrigin::Disk);
        let (schema, value) = disk.to_frontend(RawValue::Given(&Value::str("up"))).unwrap();
        assert_eq!(value, json!(option_id(&Value::str("up"))));
        let FrontendSchema::SingleChoice { elements, .. } = schema else {
            panic!("not a single choice schema");
        };
        assert_eq!(elements[1].name, option_id(&Value::str("down")));

        let frontend = visitor(up_down(), DataOrigin::Frontend);
        assert_eq!(
            frontend.to_disk(RawValue::Given(&Value::from(value))).unwrap(),
            Value::str("up")
        );
        assert!(frontend.parse(RawValue::Given(&Value::str("up"))).is_err());
    }

    #[test]
    fn test_complain_by_default() {
        let v = visitor(up_down(), DataOrigin::Disk);
        let msgs = v.validate(RawValue::Given(&Value::str("sideways"))).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].replacement_value, JsonValue::Null);
        assert!(v.to_disk(RawValue::Given(&Value::str("sideways"))).is_err());
        assert!(v.parse(RawValue::UseDefault).is_err());
    }

    #[test]
    fn test_keep_invalid() {
        let spec = SingleChoiceExtended {
            invalid_element_validator: Some(InvalidElementValidator {
                mode: InvalidElementMode::Keep,
                display: Some("Removed interface".to_string()),
                error_msg: Some("Interface no longer exists".to_string()),
            }),
            ..up_down()
        };
        let v = visitor(spec, DataOrigin::Disk);
        let gone = Value::str("eth7");
        assert_eq!(v.to_disk(RawValue::Given(&gone)).unwrap(), gone);
        let msgs = v.validate(RawValue::Given(&gone)).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].message, "Interface no longer exists");
        let (schema, value) = v.to_frontend(RawValue::Given(&gone)).unwrap();
        assert_eq!(value, JsonValue::Null);
        let FrontendSchema::SingleChoice { input_hint, .. } = schema else {
            panic!("not a single choice schema");
        };
        assert_eq!(input_hint.as_deref(), Some("Removed interface"));
    }

    #[test]
    fn test_prefill_and_non_string_values() {
        let spec = SingleChoiceExtended {
            prefill: Some(Value::Int(2)),
            ..SingleChoiceExtended::new([
                ChoiceElement::new(Value::Int(1), "one"),
                ChoiceElement::new(Value::Int(2), "two"),
            ])
        };
        let v = visitor(spec, DataOrigin::Frontend);
        assert_eq!(v.to_disk(RawValue::UseDefault).unwrap(), Value::Int(2));
        assert_eq!(v.frontend_default().unwrap(), json!(option_id(&Value::Int(2))));
    }

    #[test]
    fn test_disk_numbers_match_numerically() {
        let spec = SingleChoiceExtended::new([
            ChoiceElement::new(Value::Int(1), "one"),
            ChoiceElement::new(Value::tuple([Value::str("avg"), Value::Int(5)]), "average"),
        ]);
        let v = visitor(spec, DataOrigin::Disk);
        assert_eq!(v.to_disk(RawValue::Given(&Value::Float(1.0))).unwrap(), Value::Int(1));
        assert_eq!(
            v.to_disk(RawValue::Given(&Value::list([Value::str("avg"), Value::Float(5.0)])))
                .unwrap(),
            Value::tuple([Value::str("avg"), Value::Int(5)])
        );
        assert!(v.validate(RawValue::Given(&Value::Float(1.0))).unwrap().is_empty());
        assert!(v.parse(RawValue::Given(&Value::Float(1.5))).is_err());
    }
}
