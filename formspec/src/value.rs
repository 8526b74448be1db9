//! Raw and persisted value model.
//!
//! Disk values keep the historical tuple-vs-list distinction, so the engine
//! works on its own [`Value`] instead of `serde_json::Value`. Plain conversion
//! to and from JSON is lossless except that tuples become arrays;
//! [`Value::to_tagged_json`] keeps them apart.

use std::{collections::BTreeMap, fmt::Write as _};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A raw, parsed or persisted configuration value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    None,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(String),
    /// Variable length sequence.
    List(Vec<Value>),
    /// Fixed length sequence, as used by legacy disk formats.
    Tuple(Vec<Value>),
    /// String keyed mapping.
    Dict(BTreeMap<String, Value>),
}

impl Value {
    /// Build a string value.
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Build a tuple value.
    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    /// Build a list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// Build a dictionary value.
    pub fn dict<K: Into<String>>(items: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Dict(items.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dictionary",
        }
    }

    /// Get the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean content, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer content. Floats without fractional part are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Get the numeric content as float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the items of a list or a tuple.
    ///
    /// Legacy disk formats are not consistent about tuples vs lists, and JSON
    /// has no tuples at all, so sequence consumers accept both.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Get the dictionary content.
    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Convert into a JSON value. Tuples become arrays, non-finite floats null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::None => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::List(items) | Value::Tuple(items) => {
                JsonValue::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Dict(d) => {
                JsonValue::Object(d.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    /// Equality as legacy disk data understands it.
    ///
    /// Integers equal floats of the same numeric value, and tuples equal lists
    /// with equal items. Used to match stored values against configured ones.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (
                Value::List(a) | Value::Tuple(a),
                Value::List(b) | Value::Tuple(b),
            ) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_eq(y)),
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.loosely_eq(vb))
            }
            _ => self == other,
        }
    }

    /// Convert into JSON keeping tuples distinguishable from lists.
    ///
    /// A tuple becomes `{"$tuple": [..]}`. A dictionary whose only key is
    /// `$tuple` or `$dict` is wrapped as `{"$dict": {..}}` so it cannot be
    /// mistaken for an encoded tuple. [`Value::from_tagged`] reverses this.
    pub fn to_tagged_json(&self) -> JsonValue {
        match self {
            Value::List(items) => {
                JsonValue::Array(items.iter().map(Value::to_tagged_json).collect())
            }
            Value::Tuple(items) => tagged(
                TUPLE_TAG,
                JsonValue::Array(items.iter().map(Value::to_tagged_json).collect()),
            ),
            Value::Dict(d) => {
                let object = JsonValue::Object(
                    d.iter()
                        .map(|(k, v)| (k.clone(), v.to_tagged_json()))
                        .collect(),
                );
                if is_tag_shaped(d) {
                    tagged(DICT_TAG, object)
                } else {
                    object
                }
            }
            scalar => scalar.to_json(),
        }
    }

    /// Decode a value received as [`Value::to_tagged_json`] output.
    pub fn from_tagged(value: &Value) -> Value {
        match value {
            Value::List(items) => Value::List(items.iter().map(Value::from_tagged).collect()),
            Value::Dict(d) if d.len() == 1 => match d.iter().next() {
                Some((tag, Value::List(items))) if tag == TUPLE_TAG => {
                    Value::Tuple(items.iter().map(Value::from_tagged).collect())
                }
                Some((tag, Value::Dict(inner))) if tag == DICT_TAG => Value::Dict(
                    inner
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::from_tagged(v)))
                        .collect(),
                ),
                _ => untag_entries(d),
            },
            Value::Dict(d) => untag_entries(d),
            other => other.clone(),
        }
    }

    /// Deterministic textual representation.
    ///
    /// Dictionary keys are emitted in sorted order and strings are quoted, so
    /// equal values always produce equal output. Used to derive option ids.
    pub fn canonical_repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Value::Float(f) => {
                let _ = write!(out, "{f:?}");
            }
            Value::Str(s) => {
                let _ = write!(out, "{s:?}");
            }
            Value::List(items) => {
                out.push('[');
                write_items(items, out);
                out.push(']');
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(items, out);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(d) => {
                out.push('{');
                for (idx, (k, v)) in d.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{k:?}: ");
                    v.write_repr(out);
                }
                out.push('}');
            }
        }
    }
}

const TUPLE_TAG: &str = "$tuple";
const DICT_TAG: &str = "$dict";

fn is_tag_shaped(d: &BTreeMap<String, Value>) -> bool {
    d.len() == 1 && d.keys().all(|k| k == TUPLE_TAG || k == DICT_TAG)
}

fn tagged(tag: &str, inner: JsonValue) -> JsonValue {
    let mut object = serde_json::Map::new();
    object.insert(tag.to_string(), inner);
    JsonValue::Object(object)
}

fn untag_entries(d: &BTreeMap<String, Value>) -> Value {
    Value::Dict(d.iter().map(|(k, v)| (k.clone(), Value::from_tagged(v))).collect())
}

fn write_items(items: &[Value], out: &mut String) {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        item.write_repr(out);
    }
}

impl From<&JsonValue> for Value {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::None,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Dict(map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
            }
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        Value::from(&value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Value::from)
    }
}

/// Raw input handed to a visitor.
///
/// The "use default" sentinel lives here rather than in [`Value`] so it can
/// never reach a persisted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    /// Replace with the schema's configured prefill.
    UseDefault,
    /// Externally supplied value, encoded according to the data origin.
    Given(&'a Value),
}

impl<'a> From<&'a Value> for RawValue<'a> {
    fn from(value: &'a Value) -> Self {
        RawValue::Given(value)
    }
}

/// Owned child raw value held by the parsed form of composite schemas.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSlot {
    /// The child uses its own default.
    Default,
    /// The child was supplied with this raw value.
    Given(Value),
}

impl RawSlot {
    /// Borrow as a [`RawValue`] for handing to a child visitor.
    pub fn as_raw(&self) -> RawValue<'_> {
        match self {
            RawSlot::Default => RawValue::UseDefault,
            RawSlot::Given(v) => RawValue::Given(v),
        }
    }

    /// The given value, or [`Value::None`] for the default sentinel.
    pub fn to_value(&self) -> Value {
        match self {
            RawSlot::Default => Value::None,
            RawSlot::Given(v) => v.clone(),
        }
    }
}

impl From<RawValue<'_>> for RawSlot {
    fn from(raw: RawValue<'_>) -> Self {
        match raw {
            RawValue::UseDefault => RawSlot::Default,
            RawValue::Given(v) => RawSlot::Given(v.clone()),
        }
    }
}
