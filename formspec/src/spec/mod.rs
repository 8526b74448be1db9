//! Declarative form spec model.
//!
//! A [`FormSpec`] describes the type, rendering metadata and validators of one
//! configurable value. Specs are built once and only read afterwards; child
//! specs are held in [`Arc`]s so visitors can cheaply keep what they need.
//!
//! ## Organisation
//!
//! - [`leaf`] - scalar types (numbers, strings, booleans, passwords, choices)
//! - [`composite`] - dictionaries, lists, tuples, cascading choices, catalogs
//! - [`sources`] - types that only exist as recomposition sources

use std::{any::Any, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{validators::Validator, value::Value};

/// Composite schema types.
pub mod composite;

/// Leaf schema types.
pub mod leaf;

/// Schema types that are recomposed before dispatch.
pub mod sources;

pub use composite::*;
pub use leaf::*;
pub use sources::*;

/// Registry keys of the built-in schema types.
pub mod kind {
    #![allow(missing_docs)]
    pub const INTEGER: &str = "integer";
    pub const FLOAT: &str = "float";
    pub const STRING: &str = "string";
    pub const BOOLEAN_CHOICE: &str = "boolean_choice";
    pub const FIXED_VALUE: &str = "fixed_value";
    pub const PASSWORD: &str = "password";
    pub const SINGLE_CHOICE: &str = "single_choice";
    pub const SINGLE_CHOICE_EXTENDED: &str = "single_choice_extended";
    pub const MULTIPLE_CHOICE: &str = "multiple_choice";
    pub const MULTIPLE_CHOICE_EXTENDED: &str = "multiple_choice_extended";
    pub const SERVICE_STATE: &str = "service_state";
    pub const PERCENTAGE: &str = "percentage";
    pub const REGULAR_EXPRESSION: &str = "regular_expression";
    pub const LIST_OF_STRINGS: &str = "list_of_strings";
    pub const DICTIONARY: &str = "dictionary";
    pub const LIST: &str = "list";
    pub const LIST_UNIQUE_SELECTION: &str = "list_unique_selection";
    pub const TUPLE: &str = "tuple";
    pub const CASCADING_SINGLE_CHOICE: &str = "cascading_single_choice";
    pub const CATALOG: &str = "catalog";
    pub const LEGACY: &str = "legacy";
}

/// Function rewriting a legacy disk value into the current format.
pub type MigrateFn = dyn Fn(&Value) -> Value + Send + Sync;

/// Migrate hook, applied to disk values before parsing.
#[derive(Clone)]
pub struct Migration(pub Arc<MigrateFn>);

impl Migration {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Apply the hook.
    pub fn apply(&self, value: &Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Migration(..)")
    }
}

/// Fields shared by every form spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecBase {
    /// Title shown next to the input.
    pub title: Option<String>,
    /// Longer help text.
    pub help_text: Option<String>,
    /// Validators run against the parsed value.
    pub custom_validate: Vec<Validator>,
    /// Hook upgrading legacy disk values. Server only.
    #[serde(skip)]
    pub migrate: Option<Migration>,
}

/// Initial value of a leaf input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Prefill<T> {
    /// Use this value when no value is given.
    DefaultValue(T),
    /// Only show this as a placeholder; no value is given by default.
    InputHint(T),
}

impl<T> Prefill<T> {
    /// The default value, if this is not a hint.
    pub fn default_value(&self) -> Option<&T> {
        match self {
            Prefill::DefaultValue(v) => Some(v),
            Prefill::InputHint(_) => None,
        }
    }

    /// The hint, if this is not a default value.
    pub fn input_hint(&self) -> Option<&T> {
        match self {
            Prefill::DefaultValue(_) => None,
            Prefill::InputHint(v) => Some(v),
        }
    }
}

/// A form spec type defined outside this crate.
///
/// Extension types reach visitors through a registered recomposer that
/// downcasts via [`ExtensionSpec::as_any`]. Unregistered extensions fall back
/// to the opaque legacy editor.
pub trait ExtensionSpec: fmt::Debug + Send + Sync + 'static {
    /// Registry key of this type.
    fn type_name(&self) -> &'static str;
    /// Shared fields.
    fn base(&self) -> &SpecBase;
    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

/// Any form spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormSpec {
    /// Whole number.
    Integer(Integer),
    /// Floating-point number.
    Float(Float),
    /// Single line text.
    String(TextInput),
    /// Checkbox.
    BooleanChoice(BooleanChoice),
    /// Constant value.
    FixedValue(FixedValue),
    /// Explicit or stored password.
    Password(Password),
    /// Choice among string-named elements.
    SingleChoice(SingleChoice),
    /// Choice among arbitrary-valued elements.
    SingleChoiceExtended(SingleChoiceExtended),
    /// Set of string-named elements.
    MultipleChoice(MultipleChoice),
    /// Set of string-named elements with layout control.
    MultipleChoiceExtended(MultipleChoiceExtended),
    /// Monitoring state OK/WARN/CRIT/UNKNOWN.
    ServiceState(ServiceState),
    /// Percentage value.
    Percentage(Percentage),
    /// Regular expression text.
    RegularExpression(RegularExpression),
    /// List of strings.
    ListOfStrings(ListOfStrings),
    /// Keyed map of child specs.
    Dictionary(Dictionary),
    /// Homogeneous list.
    List(List),
    /// List whose designated choices may appear only once.
    ListUniqueSelection(ListUniqueSelection),
    /// Fixed arity heterogeneous sequence.
    Tuple(Tuple),
    /// Discriminated union of named alternatives.
    CascadingSingleChoice(CascadingSingleChoice),
    /// Dictionaries grouped into topics.
    Catalog(Catalog),
    /// Opaque editor for schemas without a dedicated visitor.
    Legacy(Legacy),
    /// Type defined outside this crate.
    #[serde(skip)]
    Extension(Arc<dyn ExtensionSpec>),
}

impl FormSpec {
    /// Registry key of this spec's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            FormSpec::Integer(_) => kind::INTEGER,
            FormSpec::Float(_) => kind::FLOAT,
            FormSpec::String(_) => kind::STRING,
            FormSpec::BooleanChoice(_) => kind::BOOLEAN_CHOICE,
            FormSpec::FixedValue(_) => kind::FIXED_VALUE,
            FormSpec::Password(_) => kind::PASSWORD,
            FormSpec::SingleChoice(_) => kind::SINGLE_CHOICE,
            FormSpec::SingleChoiceExtended(_) => kind::SINGLE_CHOICE_EXTENDED,
            FormSpec::MultipleChoice(_) => kind::MULTIPLE_CHOICE,
            FormSpec::MultipleChoiceExtended(_) => kind::MULTIPLE_CHOICE_EXTENDED,
            FormSpec::ServiceState(_) => kind::SERVICE_STATE,
            FormSpec::Percentage(_) => kind::PERCENTAGE,
            FormSpec::RegularExpression(_) => kind::REGULAR_EXPRESSION,
            FormSpec::ListOfStrings(_) => kind::LIST_OF_STRINGS,
            FormSpec::Dictionary(_) => kind::DICTIONARY,
            FormSpec::List(_) => kind::LIST,
            FormSpec::ListUniqueSelection(_) => kind::LIST_UNIQUE_SELECTION,
            FormSpec::Tuple(_) => kind::TUPLE,
            FormSpec::CascadingSingleChoice(_) => kind::CASCADING_SINGLE_CHOICE,
            FormSpec::Catalog(_) => kind::CATALOG,
            FormSpec::Legacy(_) => kind::LEGACY,
            FormSpec::Extension(ext) => ext.type_name(),
        }
    }

    /// Shared fields of this spec.
    pub fn base(&self) -> &SpecBase {
        match self {
            FormSpec::Integer(s) => &s.base,
            FormSpec::Float(s) => &s.base,
            FormSpec::String(s) => &s.base,
            FormSpec::BooleanChoice(s) => &s.base,
            FormSpec::FixedValue(s) => &s.base,
            FormSpec::Password(s) => &s.base,
            FormSpec::SingleChoice(s) => &s.base,
            FormSpec::SingleChoiceExtended(s) => &s.base,
            FormSpec::MultipleChoice(s) => &s.base,
            FormSpec::MultipleChoiceExtended(s) => &s.base,
            FormSpec::ServiceState(s) => &s.base,
            FormSpec::Percentage(s) => &s.base,
            FormSpec::RegularExpression(s) => &s.base,
            FormSpec::ListOfStrings(s) => &s.base,
            FormSpec::Dictionary(s) => &s.base,
            FormSpec::List(s) => &s.base,
            FormSpec::ListUniqueSelection(s) => &s.base,
            FormSpec::Tuple(s) => &s.base,
            FormSpec::CascadingSingleChoice(s) => &s.base,
            FormSpec::Catalog(s) => &s.base,
            FormSpec::Legacy(s) => &s.base,
            FormSpec::Extension(ext) => ext.base(),
        }
    }
}

/// Builder helpers shared by every spec struct.
pub trait SpecBuilder: Sized {
    /// Mutable access to the shared fields.
    fn base_mut(&mut self) -> &mut SpecBase;

    /// Set the title.
    fn with_title(mut self, title: impl Into<String>) -> Self {
        self.base_mut().title = Some(title.into());
        self
    }

    /// Set the help text.
    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.base_mut().help_text = Some(help.into());
        self
    }

    /// Append a validator.
    fn with_validator(mut self, validator: Validator) -> Self {
        self.base_mut().custom_validate.push(validator);
        self
    }

    /// Set the migrate hook.
    fn with_migrate(mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.base_mut().migrate = Some(Migration::new(f));
        self
    }
}

macro_rules! spec_variants {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl SpecBuilder for $ty {
                fn base_mut(&mut self) -> &mut SpecBase {
                    &mut self.base
                }
            }

            impl From<$ty> for FormSpec {
                fn from(spec: $ty) -> Self {
                    FormSpec::$variant(spec)
                }
            }
        )*
    };
}

spec_variants! {
    Integer => Integer,
    Float => Float,
    TextInput => String,
    BooleanChoice => BooleanChoice,
    FixedValue => FixedValue,
    Password => Password,
    SingleChoice => SingleChoice,
    SingleChoiceExtended => SingleChoiceExtended,
    MultipleChoice => MultipleChoice,
    MultipleChoiceExtended => MultipleChoiceExtended,
    ServiceState => ServiceState,
    Percentage => Percentage,
    RegularExpression => RegularExpression,
    ListOfStrings => ListOfStrings,
    Dictionary => Dictionary,
    List => List,
    ListUniqueSelection => ListUniqueSelection,
    Tuple => Tuple,
    CascadingSingleChoice => CascadingSingleChoice,
    Catalog => Catalog,
    Legacy => Legacy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_nested_spec() {
        let spec: FormSpec = serde_json::from_str(
            r#"{
                "type": "dictionary",
                "title": "Levels",
                "elements": [
                    {"name": "warn", "required": true, "parameter_form": {"type": "integer", "prefill": {"type": "default_value", "value": 80}}},
                    {"name": "label", "parameter_form": {"type": "string"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(spec.type_name(), kind::DICTIONARY);
        assert_eq!(spec.base().title.as_deref(), Some("Levels"));
        let FormSpec::Dictionary(dict) = spec else {
            panic!("not a dictionary");
        };
        assert_eq!(dict.elements.len(), 2);
        assert!(dict.elements[0].required);
        assert!(!dict.elements[1].required);
        let FormSpec::Integer(int) = dict.elements[0].parameter_form.as_ref() else {
            panic!("not an integer");
        };
        assert_eq!(int.prefill, Prefill::DefaultValue(80));
    }

    #[test]
    fn test_builder() {
        let spec: FormSpec = Integer::default()
            .with_title("Port")
            .with_validator(Validator::NetworkPort { error_msg: None })
            .into();
        assert_eq!(spec.base().title.as_deref(), Some("Port"));
        assert_eq!(spec.base().custom_validate.len(), 1);
    }
}
