use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FormSpec, SpecBase};
use crate::value::Value;

/// One keyed element of a dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictElement {
    /// Key in the dictionary.
    pub name: String,
    /// Spec of the value.
    pub parameter_form: Arc<FormSpec>,
    /// Whether the key must be present.
    #[serde(default)]
    pub required: bool,
    /// Frontend grouping hint.
    #[serde(default)]
    pub group: Option<String>,
}

impl DictElement {
    /// Element that must be present.
    pub fn required(name: impl Into<String>, spec: impl Into<FormSpec>) -> Self {
        Self {
            name: name.into(),
            parameter_form: Arc::new(spec.into()),
            required: true,
            group: None,
        }
    }

    /// Element that may be absent.
    pub fn optional(name: impl Into<String>, spec: impl Into<FormSpec>) -> Self {
        Self {
            required: false,
            ..Self::required(name, spec)
        }
    }
}

/// Keyed map of child specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dictionary {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Declared elements, in display order.
    pub elements: Vec<DictElement>,
    /// Legacy keys that are tolerated on input and dropped.
    pub ignored_elements: Vec<String>,
    /// Text shown when no element is declared.
    pub no_elements_text: Option<String>,
}

impl Dictionary {
    /// Dictionary of `elements`.
    pub fn new(elements: impl IntoIterator<Item = DictElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Look up a declared element.
    pub fn element(&self, name: &str) -> Option<&DictElement> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// Homogeneous list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Spec applied to every item.
    pub element_template: Arc<FormSpec>,
    /// Label of the add button.
    #[serde(default)]
    pub add_element_label: Option<String>,
    /// Label of the remove button.
    #[serde(default)]
    pub remove_element_label: Option<String>,
    /// Text shown for an empty list.
    #[serde(default)]
    pub no_element_label: Option<String>,
    /// Whether items may be reordered in the UI.
    #[serde(default = "default_true")]
    pub editable_order: bool,
}

fn default_true() -> bool {
    true
}

impl List {
    /// List of `template` items.
    pub fn new(template: impl Into<FormSpec>) -> Self {
        Self {
            base: SpecBase::default(),
            element_template: Arc::new(template.into()),
            add_element_label: None,
            remove_element_label: None,
            no_element_label: None,
            editable_order: true,
        }
    }
}

/// List where designated choices may be selected at most once.
///
/// The element template is a single or cascading choice; for cascading
/// choices the selected alternative's name is compared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUniqueSelection {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Spec applied to every item.
    pub element_template: Arc<FormSpec>,
    /// Choices that may appear at most once across all items.
    #[serde(default)]
    pub unique_selection_elements: Vec<Value>,
    /// Label of the add button.
    #[serde(default)]
    pub add_element_label: Option<String>,
    /// Label of the remove button.
    #[serde(default)]
    pub remove_element_label: Option<String>,
    /// Text shown for an empty list.
    #[serde(default)]
    pub no_element_label: Option<String>,
}

impl ListUniqueSelection {
    /// List of `template` items where `unique` choices appear at most once.
    pub fn new(template: impl Into<FormSpec>, unique: impl IntoIterator<Item = Value>) -> Self {
        Self {
            base: SpecBase::default(),
            element_template: Arc::new(template.into()),
            unique_selection_elements: unique.into_iter().collect(),
            add_element_label: None,
            remove_element_label: None,
            no_element_label: None,
        }
    }
}

/// Frontend layout of a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleLayout {
    /// Side by side, titles left.
    #[default]
    Horizontal,
    /// Titles above the inputs.
    HorizontalTitlesTop,
    /// Stacked.
    Vertical,
    /// Floating.
    Float,
}

/// Fixed arity sequence of heterogeneous specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuple {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Spec per position.
    pub elements: Vec<Arc<FormSpec>>,
    /// Frontend layout.
    pub layout: TupleLayout,
}

impl Tuple {
    /// Tuple of `elements`.
    pub fn new(elements: impl IntoIterator<Item = FormSpec>) -> Self {
        Self {
            elements: elements.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }
}

/// One alternative of a cascading choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadingElement {
    /// Discriminant stored on disk.
    pub name: String,
    /// Display text.
    pub title: String,
    /// Spec of the parameters of this alternative.
    pub parameter_form: Arc<FormSpec>,
}

impl CascadingElement {
    /// Alternative `name` with parameters described by `spec`.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        spec: impl Into<FormSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            parameter_form: Arc::new(spec.into()),
        }
    }
}

/// Frontend layout of a cascading choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadingLayout {
    /// Parameters below the selector.
    #[default]
    Vertical,
    /// Parameters next to the selector.
    Horizontal,
    /// Selector rendered as buttons.
    ButtonGroup,
}

/// Discriminated union of named alternatives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadingSingleChoice {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Text shown in front of the selector.
    pub label: Option<String>,
    /// Alternatives.
    pub elements: Vec<CascadingElement>,
    /// Alternative selected by default.
    pub prefill: Option<String>,
    /// Placeholder shown when nothing valid is selected.
    pub input_hint: Option<String>,
    /// Frontend layout.
    pub layout: CascadingLayout,
}

impl CascadingSingleChoice {
    /// Cascading choice among `elements`.
    pub fn new(elements: impl IntoIterator<Item = CascadingElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Look up an alternative.
    pub fn element(&self, name: &str) -> Option<&CascadingElement> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// A named section of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Key in the catalog.
    pub name: String,
    /// Section heading.
    pub title: String,
    /// Elements of the section's dictionary.
    pub elements: Vec<DictElement>,
}

impl Topic {
    /// Topic `name` holding `elements`.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        elements: impl IntoIterator<Item = DictElement>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            elements: elements.into_iter().collect(),
        }
    }

    /// The dictionary spec this topic stands for.
    pub fn dictionary(&self) -> Dictionary {
        Dictionary {
            base: SpecBase {
                title: Some(self.title.clone()),
                ..SpecBase::default()
            },
            elements: self.elements.clone(),
            ..Dictionary::default()
        }
    }
}

/// Dictionaries grouped into topics.
///
/// Persisted as `{topic: {element: value}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Shared fields.
    #[serde(flatten)]
    pub base: SpecBase,
    /// Sections, in display order.
    pub topics: Vec<Topic>,
}

impl Catalog {
    /// Catalog of `topics`.
    pub fn new(topics: impl IntoIterator<Item = Topic>) -> Self {
        Self {
            base: SpecBase::default(),
            topics: topics.into_iter().collect(),
        }
    }
}
