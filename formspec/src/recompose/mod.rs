//! Built-in recomposers.
//!
//! Each function rewrites one source spec type into a richer target type. The
//! shared fields (title, help, validators, migrate hook) and the prefill are
//! carried over unchanged; only target-specific fields are added.

use std::sync::Arc;

use crate::{
    error::{FormSpecError, Result},
    spec::{
        ChoiceElement, Float, FormSpec, Legacy, List, MultipleChoiceExtended, MultipleChoiceLayout,
        SingleChoiceExtended, TextInput, kind,
    },
    validators::Validator,
    value::Value,
};

/// Service states and their titles, in state order.
pub const SERVICE_STATES: [(i64, &str); 4] = [(0, "OK"), (1, "WARN"), (2, "CRIT"), (3, "UNKNOWN")];

fn mismatch(expected: &'static str, spec: &FormSpec) -> FormSpecError {
    FormSpecError::mismatch(expected, spec.type_name())
}

/// `single_choice` into `single_choice_extended`: names become string values.
pub fn single_choice(spec: &FormSpec) -> Result<FormSpec> {
    let FormSpec::SingleChoice(source) = spec else {
        return Err(mismatch(kind::SINGLE_CHOICE, spec));
    };
    Ok(SingleChoiceExtended {
        base: source.base.clone(),
        label: source.label.clone(),
        elements: source
            .elements
            .iter()
            .map(|e| ChoiceElement::new(e.name.as_str(), e.title.as_str()))
            .collect(),
        prefill: source.prefill.as_deref().map(Value::str),
        input_hint: source.input_hint.clone(),
        frozen: source.frozen,
        no_elements_text: source.no_elements_text.clone(),
        invalid_element_validator: source.invalid_element_validator.clone(),
    }
    .into())
}

/// `multiple_choice` into `multiple_choice_extended` with a concrete layout.
pub fn multiple_choice(spec: &FormSpec) -> Result<FormSpec> {
    let FormSpec::MultipleChoice(source) = spec else {
        return Err(mismatch(kind::MULTIPLE_CHOICE, spec));
    };
    Ok(MultipleChoiceExtended {
        base: source.base.clone(),
        elements: source.elements.clone(),
        show_toggle_all: source.show_toggle_all,
        prefill: source.prefill.clone(),
        layout: MultipleChoiceLayout::Auto.resolve(source.elements.len()),
    }
    .into())
}

/// `service_state` into a `single_choice_extended` over the states 0 to 3.
pub fn service_state(spec: &FormSpec) -> Result<FormSpec> {
    let FormSpec::ServiceState(source) = spec else {
        return Err(mismatch(kind::SERVICE_STATE, spec));
    };
    Ok(SingleChoiceExtended {
        base: source.base.clone(),
        elements: SERVICE_STATES
            .iter()
            .map(|(state, title)| ChoiceElement::new(*state, *title))
            .collect(),
        prefill: source.prefill.map(Value::Int),
        ..SingleChoiceExtended::default()
    }
    .into())
}

/// `percentage` into a `float` with unit `%` and a range validator.
pub fn percentage(spec: &FormSpec) -> Result<FormSpec> {
    let FormSpec::Percentage(source) = spec else {
        return Err(mismatch(kind::PERCENTAGE, spec));
    };
    let mut base = source.base.clone();
    base.custom_validate
        .push(Validator::number_in_range(Some(source.min), Some(source.max)));
    Ok(Float {
        base,
        label: source.label.clone(),
        unit_symbol: Some("%".to_string()),
        prefill: source.prefill.clone(),
    }
    .into())
}

/// `regular_expression` into a `string` that must compile.
pub fn regular_expression(spec: &FormSpec) -> Result<FormSpec> {
    let FormSpec::RegularExpression(source) = spec else {
        return Err(mismatch(kind::REGULAR_EXPRESSION, spec));
    };
    let mut base = source.base.clone();
    base.custom_validate.push(Validator::ValidRegex { error_msg: None });
    Ok(TextInput {
        base,
        label: source.label.clone(),
        prefill: source.prefill.clone(),
    }
    .into())
}

/// `list_of_strings` into a `list` of `string` items.
pub fn list_of_strings(spec: &FormSpec) -> Result<FormSpec> {
    let FormSpec::ListOfStrings(source) = spec else {
        return Err(mismatch(kind::LIST_OF_STRINGS, spec));
    };
    Ok(List {
        base: source.base.clone(),
        element_template: Arc::new(FormSpec::String(source.string_spec.clone())),
        add_element_label: source.add_element_label.clone(),
        ..List::new(TextInput::default())
    }
    .into())
}

/// Any spec without a visitor into the opaque `legacy` editor.
pub fn unknown(spec: &FormSpec) -> Result<FormSpec> {
    Ok(Legacy {
        base: spec.base().clone(),
        original_type: spec.type_name().to_string(),
        default_value: Value::None,
    }
    .into())
}
