//! Schema types without a visitor of their own.
//!
//! Each of these is rewritten by a recomposer into a richer registered type
//! before dispatch; see [`crate::recompose`].

use serde::{Deserialize, Serialize};

use super::{InvalidElementValidator, MultipleChoiceElement, Prefill, SpecBase, TextInput};

/// One element of a [`SingleChoice`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleChoiceElement {
    /// Identifier stored on disk.
    pub name: String,
    /// Display text.
    pub title: String,
}

impl SingleChoiceElement {
    /// Element with the given name and title.
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }
}

/// Choice from a fixed list of string-named elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleChoice {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown in front of the input.
    pub label: Option<String>,
    /// Available options.
    pub elements: Vec<SingleChoiceElement>,
    /// Name selected by default.
    pub prefill: Option<String>,
    /// Placeholder shown when nothing valid is selected.
    pub input_hint: Option<String>,
    /// Render read only.
    pub frozen: bool,
    /// Text shown when there are no elements.
    pub no_elements_text: Option<String>,
    /// Invalid choice policy.
    pub invalid_element_validator: Option<InvalidElementValidator>,
}

impl SingleChoice {
    /// Choice among `elements`.
    pub fn new(elements: impl IntoIterator<Item = SingleChoiceElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Set of string-named elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MultipleChoice {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Available elements.
    pub elements: Vec<MultipleChoiceElement>,
    /// Offer a toggle selecting every element.
    pub show_toggle_all: bool,
    /// Names selected by default.
    pub prefill: Vec<String>,
}

/// Monitoring state: 0 OK, 1 WARN, 2 CRIT, 3 UNKNOWN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceState {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// State selected by default.
    pub prefill: Option<i64>,
}

/// Percentage, bounded to `[min, max]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Percentage {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown in front of the input.
    pub label: Option<String>,
    /// Initial value.
    pub prefill: Prefill<f64>,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Default for Percentage {
    fn default() -> Self {
        Self {
            base: SpecBase::default(),
            label: None,
            prefill: Prefill::InputHint(0.0),
            min: 0.0,
            max: 100.0,
        }
    }
}

/// Text that must compile as a regular expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegularExpression {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown in front of the input.
    pub label: Option<String>,
    /// Initial value.
    pub prefill: Prefill<String>,
}

impl Default for RegularExpression {
    fn default() -> Self {
        Self {
            base: SpecBase::default(),
            label: None,
            prefill: Prefill::InputHint(String::new()),
        }
    }
}

/// List of strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOfStrings {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Spec of each string.
    pub string_spec: TextInput,
    /// Label of the add button.
    pub add_element_label: Option<String>,
}
