use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{FormSpecVisitor, InvalidValue, ParseResult, Visitor, VisitorContext};
use crate::{
    error::Result,
    frontend::{FrontendBase, FrontendSchema},
    messages::ValidationCollector,
    option_id::option_id,
    spec::{FormSpec, List, ListUniqueSelection, SpecBase, kind},
    value::{RawValue, Value},
};

const ADD_LABEL: &str = "Add element";
const REMOVE_LABEL: &str = "Remove element";
const NO_ELEMENT_LABEL: &str = "No element";

/// Item handling shared by both list visitors.
struct Items<'a> {
    template: &'a Arc<FormSpec>,
    ctx: &'a VisitorContext,
}

impl Items<'_> {
    fn child(&self) -> Result<Box<dyn Visitor>> {
        self.ctx.resolve(self.template)
    }

    fn parse(raw: &Value) -> ParseResult<Vec<Value>> {
        raw.as_sequence().map(<[Value]>::to_vec).ok_or_else(|| {
            InvalidValue::new(
                format!("Invalid data: expected a list, got {}", raw.kind()),
                Value::list([]),
            )
        })
    }

    /// Template schema, default item value and frontend item values.
    fn to_frontend(
        &self,
        parsed: std::result::Result<&Vec<Value>, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue, JsonValue)> {
        let child = self.child()?;
        let (template, default) = child.to_frontend(RawValue::UseDefault)?;
        let value = match parsed {
            Ok(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| child.to_frontend(RawValue::Given(item)).map(|(_, v)| v))
                    .collect::<Result<_>>()?,
            ),
            Err(invalid) => invalid.fallback.to_json(),
        };
        Ok((template, default, value))
    }

    fn validate(&self, items: &[Value], collector: &mut ValidationCollector) -> Result<()> {
        let child = self.child()?;
        for (index, item) in items.iter().enumerate() {
            collector.scoped(index.to_string(), |c| child.validate_into(RawValue::Given(item), c))?;
        }
        Ok(())
    }

    fn to_disk(&self, items: &[Value]) -> Result<Value> {
        let child = self.child()?;
        items
            .iter()
            .map(|item| child.to_disk(RawValue::Given(item)))
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }
}

/// Visitor of [`List`] specs.
///
/// Item order is preserved. The default is the empty list.
pub struct ListVisitor {
    spec: List,
    ctx: VisitorContext,
}

impl ListVisitor {
    /// Wrap a spec.
    pub fn new(spec: List, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn items(&self) -> Items<'_> {
        Items {
            template: &self.spec.element_template,
            ctx: &self.ctx,
        }
    }
}

visitor_factory!(ListVisitor, List, kind::LIST);

impl FormSpecVisitor for ListVisitor {
    type Parsed = Vec<Value>;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Vec<Value>> {
        Ok(Vec::new())
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Vec<Value>> {
        Items::parse(raw)
    }

    fn parsed_value(&self, parsed: &Vec<Value>) -> Value {
        Value::List(parsed.clone())
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Vec<Value>, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let (template, element_default_value, value) = self.items().to_frontend(parsed)?;
        let schema = FrontendSchema::List {
            base: FrontendBase::from_spec(&self.spec.base, []),
            element_template: Box::new(template),
            element_default_value,
            editable_order: self.spec.editable_order,
            add_element_label: label(&self.spec.add_element_label, ADD_LABEL),
            remove_element_label: label(&self.spec.remove_element_label, REMOVE_LABEL),
            no_element_label: label(&self.spec.no_element_label, NO_ELEMENT_LABEL),
        };
        Ok((schema, value))
    }

    fn validate_parsed(&self, parsed: &Vec<Value>, collector: &mut ValidationCollector) -> Result<()> {
        self.items().validate(parsed, collector)
    }

    fn to_disk_parsed(&self, parsed: &Vec<Value>) -> Result<Value> {
        self.items().to_disk(parsed)
    }
}

fn label(configured: &Option<String>, fallback: &str) -> String {
    configured.clone().unwrap_or_else(|| fallback.to_string())
}

/// Visitor of [`ListUniqueSelection`] specs.
///
/// Items are single or cascading choices. A unique choice selected more than
/// once is reported at every repetition after the first; parsing still
/// succeeds.
pub struct ListUniqueSelectionVisitor {
    spec: ListUniqueSelection,
    ctx: VisitorContext,
}

impl ListUniqueSelectionVisitor {
    /// Wrap a spec.
    pub fn new(spec: ListUniqueSelection, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn items(&self) -> Items<'_> {
        Items {
            template: &self.spec.element_template,
            ctx: &self.ctx,
        }
    }

    fn is_cascading(&self) -> bool {
        matches!(
            self.spec.element_template.as_ref(),
            FormSpec::CascadingSingleChoice(_)
        )
    }

    /// The compared part of a parsed item: the alternative name of a
    /// cascading choice, the selected value otherwise.
    fn selection_key(&self, parsed: Value) -> Option<Value> {
        if self.is_cascading() {
            parsed.as_sequence().and_then(|s| s.first()).cloned()
        } else {
            Some(parsed)
        }
    }

    fn frontend_unique_elements(&self) -> Vec<String> {
        self.spec
            .unique_selection_elements
            .iter()
            .map(|v| match (self.is_cascading(), v.as_str()) {
                (true, Some(name)) => name.to_string(),
                _ => option_id(v),
            })
            .collect()
    }
}

visitor_factory!(ListUniqueSelectionVisitor, ListUniqueSelection, kind::LIST_UNIQUE_SELECTION);

impl FormSpecVisitor for ListUniqueSelectionVisitor {
    type Parsed = Vec<Value>;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<Vec<Value>> {
        Ok(Vec::new())
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<Vec<Value>> {
        Items::parse(raw)
    }

    fn parsed_value(&self, parsed: &Vec<Value>) -> Value {
        Value::List(parsed.clone())
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&Vec<Value>, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let (template, element_default_value, value) = self.items().to_frontend(parsed)?;
        let schema = FrontendSchema::ListUniqueSelection {
            base: FrontendBase::from_spec(&self.spec.base, []),
            element_template: Box::new(template),
            element_default_value,
            unique_selection_elements: self.frontend_unique_elements(),
            add_element_label: label(&self.spec.add_element_label, ADD_LABEL),
            remove_element_label: label(&self.spec.remove_element_label, REMOVE_LABEL),
            no_element_label: label(&self.spec.no_element_label, NO_ELEMENT_LABEL),
        };
        Ok((schema, value))
    }

    fn validate_parsed(&self, parsed: &Vec<Value>, collector: &mut ValidationCollector) -> Result<()> {
        let items = self.items();
        items.validate(parsed, collector)?;

        let child = items.child()?;
        let mut seen: Vec<Value> = Vec::new();
        for (index, item) in parsed.iter().enumerate() {
            let Some(key) = child
                .parse(RawValue::Given(item))
                .ok()
                .and_then(|p| self.selection_key(p))
            else {
                continue;
            };
            if !self.spec.unique_selection_elements.contains(&key) {
                continue;
            }
            if seen.contains(&key) {
                let (_, replacement) = child.to_frontend(RawValue::Given(item))?;
                collector.scoped(index.to_string(), |c| {
                    c.push(
                        format!("{} may only be selected once", key.canonical_repr()),
                        replacement,
                    )
                });
            } else {
                seen.push(key);
            }
        }
        Ok(())
    }

    fn to_disk_parsed(&self, parsed: &Vec<Value>) -> Result<Value> {
        self.items().to_disk(parsed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{locations, visitor};
    use crate::{
        spec::{
            CascadingElement, CascadingSingleChoice, ChoiceElement, FixedValue, Integer,
            SingleChoiceExtended,
        },
        visitor::DataOrigin,
    };

    use super::*;

    #[test]
    fn test_item_location() {
        let v = visitor(List::new(Integer::default()), DataOrigin::Disk);
        let raw = Value::from(json!([1, "x", 3]));
        let msgs = v.validate(RawValue::Given(&raw)).unwrap();
        assert_eq!(locations(&msgs), vec![vec!["1".to_string()]]);
    }

    #[test]
    fn test_order_and_default() {
        let v = visitor(List::new(Integer::default()), DataOrigin::Frontend);
        assert_eq!(v.to_disk(RawValue::UseDefault).unwrap(), Value::list([]));
        let raw = Value::from(json!([3, 1, 2]));
        assert_eq!(v.to_disk(RawValue::Given(&raw)).unwrap(), raw);
        let (schema, value) = v.to_frontend(RawValue::Given(&raw)).unwrap();
        assert_eq!(value, json!([3, 1, 2]));
        let FrontendSchema::List {
            element_default_value,
            add_element_label,
            ..
        } = schema
        else {
            panic!("not a list schema");
        };
        assert_eq!(element_default_value, json!(""));
        assert_eq!(add_element_label, ADD_LABEL);
        assert!(v.parse(RawValue::Given(&Value::Int(1))).is_err());
    }

    #[test]
    fn test_unique_single_choice() {
        let choice = SingleChoiceExtended::new([
            ChoiceElement::new("cpu", "CPU"),
            ChoiceElement::new("mem", "Memory"),
        ]);
        let spec = ListUniqueSelection::new(choice, [Value::str("cpu")]);
        let v = visitor(spec, DataOrigin::Disk);
        let raw = Value::from(json!(["cpu", "mem", "mem", "cpu"]));
        let msgs = v.validate(RawValue::Given(&raw)).unwrap();
        assert_eq!(locations(&msgs), vec![vec!["3".to_string()]]);
        assert_eq!(v.to_disk(RawValue::Given(&raw)).unwrap(), raw);
    }

    #[test]
    fn test_unique_cascading() {
        let choice = CascadingSingleChoice::new([
            CascadingElement::new("fixed", "Fixed", FixedValue::new(Value::None)),
            CascadingElement::new("levels", "Levels", Integer::default()),
        ]);
        let spec = ListUniqueSelection::new(choice, [Value::str("fixed")]);
        let v = visitor(spec, DataOrigin::Frontend);
        let raw = Value::from(json!([["fixed", null], ["levels", 1], ["fixed", null], ["levels", 2]]));
        let msgs = v.validate(RawValue::Given(&raw)).unwrap();
        assert_eq!(locations(&msgs), vec![vec!["2".to_string()]]);

        let (schema, _) = v.to_frontend(RawValue::UseDefault).unwrap();
        let FrontendSchema::ListUniqueSelection {
            unique_selection_elements,
            ..
        } = schema
        else {
            panic!("not a unique selection schema");
        };
        assert_eq!(unique_selection_elements, vec!["fixed".to_string()]);
    }
}
