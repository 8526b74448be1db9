use serde::{Deserialize, Serialize};

use super::{Prefill, SpecBase};
use crate::value::Value;

/// Whole number input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Integer {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown in front of the input.
    pub label: Option<String>,
    /// Unit shown behind the input.
    pub unit_symbol: Option<String>,
    /// Initial value.
    pub prefill: Prefill<i64>,
}

impl Default for Integer {
    fn default() -> Self {
        Self {
            base: SpecBase::default(),
            label: None,
            unit_symbol: None,
            prefill: Prefill::InputHint(0),
        }
    }
}

impl Integer {
    /// Integer input defaulting to `value`.
    pub fn with_default(value: i64) -> Self {
        Self {
            prefill: Prefill::DefaultValue(value),
            ..Self::default()
        }
    }
}

/// Floating-point input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Float {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown in front of the input.
    pub label: Option<String>,
    /// Unit shown behind the input.
    pub unit_symbol: Option<String>,
    /// Initial value.
    pub prefill: Prefill<f64>,
}

impl Default for Float {
    fn default() -> Self {
        Self {
            base: SpecBase::default(),
            label: None,
            unit_symbol: None,
            prefill: Prefill::InputHint(0.0),
        }
    }
}

impl Float {
    /// Float input defaulting to `value`.
    pub fn with_default(value: f64) -> Self {
        Self {
            prefill: Prefill::DefaultValue(value),
            ..Self::default()
        }
    }
}

/// Single line text input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextInput {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown in front of the input.
    pub label: Option<String>,
    /// Initial value.
    pub prefill: Prefill<String>,
}

impl Default for TextInput {
    fn default() -> Self {
        Self {
            base: SpecBase::default(),
            label: None,
            prefill: Prefill::DefaultValue(String::new()),
        }
    }
}

impl TextInput {
    /// Text input defaulting to `value`.
    pub fn with_default(value: impl Into<String>) -> Self {
        Self {
            prefill: Prefill::DefaultValue(value.into()),
            ..Self::default()
        }
    }
}

/// Checkbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanChoice {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown next to the checkbox.
    pub label: Option<String>,
    /// Text for the checked state.
    pub text_on: Option<String>,
    /// Text for the unchecked state.
    pub text_off: Option<String>,
    /// Initial value.
    pub prefill: Prefill<bool>,
}

impl Default for BooleanChoice {
    fn default() -> Self {
        Self {
            base: SpecBase::default(),
            label: None,
            text_on: None,
            text_off: None,
            prefill: Prefill::DefaultValue(false),
        }
    }
}

/// Constant value. Only the configured value parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedValue {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown instead of an input.
    pub label: Option<String>,
    /// The value.
    pub value: Value,
}

impl FixedValue {
    /// Fixed value spec for `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Explicit password or reference to the password store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Password {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
}

/// How a single choice treats a value that matches none of its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidElementMode {
    /// Keep the value through to disk; only validation complains.
    Keep,
    /// Treat the value as unparseable.
    #[default]
    Complain,
}

/// Invalid choice policy of a single choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidElementValidator {
    /// Keep or complain.
    pub mode: InvalidElementMode,
    /// Input hint shown in the frontend instead of the unmatched value.
    pub display: Option<String>,
    /// Message reported for an unmatched value.
    pub error_msg: Option<String>,
}

/// One element of a [`SingleChoiceExtended`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceElement {
    /// The value selected by this element.
    pub name: Value,
    /// Display text.
    pub title: String,
}

impl ChoiceElement {
    /// Element with the given value and title.
    pub fn new(name: impl Into<Value>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }
}

/// Choice among elements with arbitrary values.
///
/// Values travel to the frontend as option ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleChoiceExtended {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown in front of the input.
    pub label: Option<String>,
    /// Available options.
    pub elements: Vec<ChoiceElement>,
    /// Value selected by default.
    pub prefill: Option<Value>,
    /// Placeholder shown when nothing valid is selected.
    pub input_hint: Option<String>,
    /// Render read only.
    pub frozen: bool,
    /// Text shown when there are no elements.
    pub no_elements_text: Option<String>,
    /// Invalid choice policy. Unset behaves like `complain`.
    pub invalid_element_validator: Option<InvalidElementValidator>,
}

impl SingleChoiceExtended {
    /// Choice among `elements`.
    pub fn new(elements: impl IntoIterator<Item = ChoiceElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// One element of a multiple choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoiceElement {
    /// Identifier stored on disk.
    pub name: String,
    /// Display text.
    pub title: String,
}

impl MultipleChoiceElement {
    /// Element with the given name and title.
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }
}

/// Frontend layout of a multiple choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleChoiceLayout {
    /// Pick by element count.
    #[default]
    Auto,
    /// Two lists with move buttons.
    DualList,
    /// One checkbox per element.
    CheckboxList,
}

impl MultipleChoiceLayout {
    /// Element count above which `auto` picks the dual list.
    pub const DUAL_LIST_THRESHOLD: usize = 15;

    /// Replace `auto` by the concrete layout for `element_count` elements.
    pub fn resolve(self, element_count: usize) -> Self {
        match self {
            MultipleChoiceLayout::Auto if element_count > Self::DUAL_LIST_THRESHOLD => {
                MultipleChoiceLayout::DualList
            }
            MultipleChoiceLayout::Auto => MultipleChoiceLayout::CheckboxList,
            other => other,
        }
    }
}

/// Set of named elements with an explicit layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MultipleChoiceExtended {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Available elements.
    pub elements: Vec<MultipleChoiceElement>,
    /// Offer a toggle selecting every element.
    pub show_toggle_all: bool,
    /// Names selected by default.
    pub prefill: Vec<String>,
    /// Frontend layout. Never `auto` after recomposition.
    pub layout: MultipleChoiceLayout,
}

/// Opaque editor for values whose schema has no dedicated visitor.
///
/// The value is passed through unchanged and rendered verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Legacy {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Type name of the schema this editor stands in for.
    pub original_type: String,
    /// Value used for the default sentinel.
    pub default_value: Value,
}
