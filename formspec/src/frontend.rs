//! UI-facing schema rendered by `to_frontend`.
//!
//! Mirrors the form spec structurally. Server-only fields (migrate hooks,
//! custom validator callables) have no counterpart here, and choice values
//! are replaced by option ids.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::spec::{
    CascadingLayout, MultipleChoiceLayout, SpecBase, TupleLayout,
};
use crate::validators::Validator;

/// Validator the frontend can evaluate on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrontendValidator {
    /// Input must be a whole number.
    IsInteger {
        /// Message to show.
        error_message: String,
    },
    /// Input must be a number.
    IsFloat {
        /// Message to show.
        error_message: String,
    },
    /// Numeric bounds.
    NumberInRange {
        /// Lower bound.
        min_value: Option<f64>,
        /// Upper bound.
        max_value: Option<f64>,
        /// Message to show.
        error_message: String,
    },
    /// Length bounds.
    LengthInRange {
        /// Minimum length.
        min_value: Option<usize>,
        /// Maximum length.
        max_value: Option<usize>,
        /// Message to show.
        error_message: String,
    },
    /// Pattern match.
    MatchRegex {
        /// Pattern.
        regex: String,
        /// Message to show.
        error_message: String,
    },
}

/// Fields shared by every frontend schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrontendBase {
    /// Title.
    pub title: String,
    /// Help text.
    pub help: String,
    /// Validators evaluated client side.
    pub validators: Vec<FrontendValidator>,
}

impl FrontendBase {
    /// Render the shared fields, followed by `computed` validators derived
    /// from the spec type.
    pub fn from_spec(base: &SpecBase, computed: impl IntoIterator<Item = FrontendValidator>) -> Self {
        let mut validators: Vec<FrontendValidator> = computed.into_iter().collect();
        validators.extend(base.custom_validate.iter().filter_map(Validator::to_frontend));
        Self {
            title: base.title.clone().unwrap_or_default(),
            help: base.help_text.clone().unwrap_or_default(),
            validators,
        }
    }
}

/// A selectable element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontendChoice {
    /// Wire identifier.
    pub name: String,
    /// Display text.
    pub title: String,
}

/// Element of a frontend dictionary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontendDictElement {
    /// Key.
    pub name: String,
    /// Whether the key must be present.
    pub required: bool,
    /// Grouping hint.
    pub group: Option<String>,
    /// Frontend value used when the user adds this key.
    pub default_value: JsonValue,
    /// Child schema.
    pub parameter_form: FrontendSchema,
}

/// Alternative of a frontend cascading choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontendCascadingElement {
    /// Discriminant.
    pub name: String,
    /// Display text.
    pub title: String,
    /// Frontend value used when the user switches to this alternative.
    pub default_value: JsonValue,
    /// Parameter schema.
    pub parameter_form: FrontendSchema,
}

/// Section of a frontend catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontendTopic {
    /// Key.
    pub name: String,
    /// Heading.
    pub title: String,
    /// The section's dictionary schema.
    pub dictionary: FrontendSchema,
}

/// Entry of the password store offered for selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PasswordStoreChoice {
    /// Store id.
    pub password_id: String,
    /// Display name.
    pub name: String,
}

/// UI-facing schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrontendSchema {
    /// Whole number.
    Integer {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Label.
        label: Option<String>,
        /// Unit.
        unit: Option<String>,
        /// Placeholder.
        input_hint: Option<JsonValue>,
    },
    /// Floating-point number.
    Float {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Label.
        label: Option<String>,
        /// Unit.
        unit: Option<String>,
        /// Placeholder.
        input_hint: Option<JsonValue>,
    },
    /// Text.
    String {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Label.
        label: Option<String>,
        /// Placeholder.
        input_hint: Option<String>,
    },
    /// Checkbox.
    BooleanChoice {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Label.
        label: Option<String>,
        /// Checked text.
        text_on: String,
        /// Unchecked text.
        text_off: String,
    },
    /// Constant.
    FixedValue {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Label.
        label: Option<String>,
        /// The constant.
        value: JsonValue,
    },
    /// Password.
    Password {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Stored passwords offered for selection.
        password_store_choices: Vec<PasswordStoreChoice>,
    },
    /// Single choice; element names are option ids.
    SingleChoice {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Label.
        label: Option<String>,
        /// Options.
        elements: Vec<FrontendChoice>,
        /// Text for an empty option list.
        no_elements_text: Option<String>,
        /// Read only.
        frozen: bool,
        /// Placeholder shown instead of an invalid or missing selection.
        input_hint: Option<String>,
    },
    /// Multiple choice.
    MultipleChoice {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Options.
        elements: Vec<FrontendChoice>,
        /// Toggle-all button.
        show_toggle_all: bool,
        /// Layout.
        layout: MultipleChoiceLayout,
    },
    /// Dictionary.
    Dictionary {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Elements in display order.
        elements: Vec<FrontendDictElement>,
        /// Text for an empty dictionary.
        no_elements_text: Option<String>,
    },
    /// List.
    List {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Item schema.
        element_template: Box<FrontendSchema>,
        /// Frontend value of a newly added item.
        element_default_value: JsonValue,
        /// Reorderable.
        editable_order: bool,
        /// Add button label.
        add_element_label: String,
        /// Remove button label.
        remove_element_label: String,
        /// Empty list text.
        no_element_label: String,
    },
    /// List with unique selections.
    ListUniqueSelection {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Item schema.
        element_template: Box<FrontendSchema>,
        /// Frontend value of a newly added item.
        element_default_value: JsonValue,
        /// Option ids or alternative names that may appear once.
        unique_selection_elements: Vec<String>,
        /// Add button label.
        add_element_label: String,
        /// Remove button label.
        remove_element_label: String,
        /// Empty list text.
        no_element_label: String,
    },
    /// Tuple.
    Tuple {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Per-position schemas.
        elements: Vec<FrontendSchema>,
        /// Layout.
        layout: TupleLayout,
    },
    /// Cascading choice.
    CascadingSingleChoice {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Label.
        label: Option<String>,
        /// Alternatives.
        elements: Vec<FrontendCascadingElement>,
        /// Placeholder shown when nothing valid is selected.
        input_hint: Option<String>,
        /// Layout.
        layout: CascadingLayout,
    },
    /// Catalog.
    Catalog {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Sections.
        elements: Vec<FrontendTopic>,
    },
    /// Opaque editor.
    LegacyValuespec {
        #[serde(flatten)]
        /// Shared fields.
        base: FrontendBase,
        /// Type name of the schema this editor stands in for.
        original_type: String,
    },
}

impl FrontendSchema {
    /// Shared fields.
    pub fn base(&self) -> &FrontendBase {
        match self {
            FrontendSchema::Integer { base, .. }
            | FrontendSchema::Float { base, .. }
            | FrontendSchema::String { base, .. }
            | FrontendSchema::BooleanChoice { base, .. }
            | FrontendSchema::FixedValue { base, .. }
            | FrontendSchema::Password { base, .. }
            | FrontendSchema::SingleChoice { base, .. }
            | FrontendSchema::MultipleChoice { base, .. }
            | FrontendSchema::Dictionary { base, .. }
            | FrontendSchema::List { base, .. }
            | FrontendSchema::ListUniqueSelection { base, .. }
            | FrontendSchema::Tuple { base, .. }
            | FrontendSchema::CascadingSingleChoice { base, .. }
            | FrontendSchema::Catalog { base, .. }
            | FrontendSchema::LegacyValuespec { base, .. } => base,
        }
    }
}
