//! Custom validators attached to form specs.
//!
//! Built-in validators are plain data: they serialize with the schema and are
//! rendered into the frontend schema so the UI can check values early.
//! [`Validator::Custom`] wraps a server-side callable and is stripped from
//! frontend output.

use std::{fmt, sync::Arc};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{frontend::FrontendValidator, value::Value};

/// Callable used by [`Validator::Custom`].
pub type ValidateFn = dyn Fn(&Value) -> Result<(), String> + Send + Sync;

/// Server-only validation callable.
#[derive(Clone)]
pub struct CustomValidator(pub Arc<ValidateFn>);

impl CustomValidator {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator(..)")
    }
}

/// A validator applied to the parsed value of a form spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Validator {
    /// Numeric value within inclusive bounds.
    NumberInRange {
        /// Lower bound.
        #[serde(default)]
        min: Option<f64>,
        /// Upper bound.
        #[serde(default)]
        max: Option<f64>,
        /// Message overriding the generated one.
        #[serde(default)]
        error_msg: Option<String>,
    },
    /// String, sequence or mapping length within inclusive bounds.
    LengthInRange {
        /// Minimum length.
        #[serde(default)]
        min: Option<usize>,
        /// Maximum length.
        #[serde(default)]
        max: Option<usize>,
        /// Message overriding the generated one.
        #[serde(default)]
        error_msg: Option<String>,
    },
    /// String matching a regular expression.
    MatchRegex {
        /// Pattern the value must match.
        regex: String,
        /// Message overriding the generated one.
        #[serde(default)]
        error_msg: Option<String>,
    },
    /// Integer in the TCP/UDP port range.
    NetworkPort {
        /// Message overriding the generated one.
        #[serde(default)]
        error_msg: Option<String>,
    },
    /// String that compiles as a regular expression.
    ValidRegex {
        /// Message overriding the generated one.
        #[serde(default)]
        error_msg: Option<String>,
    },
    /// Server-side callable. Not serializable.
    #[serde(skip)]
    Custom(CustomValidator),
}

fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn number_range_message(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!(
            "Allowed values range from {} to {}.",
            fmt_number(min),
            fmt_number(max)
        ),
        (Some(min), None) => format!("The minimum allowed value is {}.", fmt_number(min)),
        (None, Some(max)) => format!("The maximum allowed value is {}.", fmt_number(max)),
        (None, None) => String::new(),
    }
}

fn length_range_message(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("The length must be between {min} and {max}."),
        (Some(1), None) => "The value must not be empty.".to_string(),
        (Some(min), None) => format!("The minimum allowed length is {min}."),
        (None, Some(max)) => format!("The maximum allowed length is {max}."),
        (None, None) => String::new(),
    }
}

fn value_len(value: &Value) -> Option<usize> {
    match value {
        Value::Str(s) => Some(s.chars().count()),
        Value::List(items) | Value::Tuple(items) => Some(items.len()),
        Value::Dict(d) => Some(d.len()),
        _ => None,
    }
}

impl Validator {
    /// Shorthand for a non-empty [`Validator::LengthInRange`].
    pub fn not_empty() -> Self {
        Validator::LengthInRange {
            min: Some(1),
            max: None,
            error_msg: None,
        }
    }

    /// Shorthand for [`Validator::NumberInRange`] without a custom message.
    pub fn number_in_range(min: Option<f64>, max: Option<f64>) -> Self {
        Validator::NumberInRange {
            min,
            max,
            error_msg: None,
        }
    }

    /// Wrap a server-side closure.
    pub fn custom(f: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Validator::Custom(CustomValidator::new(f))
    }

    /// Check a parsed value.
    ///
    /// Values of a type the validator does not apply to pass; type checking is
    /// the parser's job.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Validator::NumberInRange {
                min,
                max,
                error_msg,
            } => {
                let Some(n) = value.as_f64() else {
                    return Ok(());
                };
                let too_small = min.is_some_and(|min| n < min);
                let too_large = max.is_some_and(|max| n > max);
                if too_small || too_large {
                    return Err(error_msg
                        .clone()
                        .unwrap_or_else(|| number_range_message(*min, *max)));
                }
                Ok(())
            }
            Validator::LengthInRange {
                min,
                max,
                error_msg,
            } => {
                let Some(len) = value_len(value) else {
                    return Ok(());
                };
                let too_short = min.is_some_and(|min| len < min);
                let too_long = max.is_some_and(|max| len > max);
                if too_short || too_long {
                    return Err(error_msg
                        .clone()
                        .unwrap_or_else(|| length_range_message(*min, *max)));
                }
                Ok(())
            }
            Validator::MatchRegex { regex, error_msg } => {
                let Some(s) = value.as_str() else {
                    return Ok(());
                };
                let re = Regex::new(regex)
                    .map_err(|e| format!("Invalid validation pattern `{regex}`: {e}"))?;
                if re.is_match(s) {
                    Ok(())
                } else {
                    Err(error_msg
                        .clone()
                        .unwrap_or_else(|| format!("Your input does not match the required format '{regex}'.")))
                }
            }
            Validator::NetworkPort { error_msg } => {
                let Some(port) = value.as_i64() else {
                    return Ok(());
                };
                if (0..=65535).contains(&port) {
                    Ok(())
                } else {
                    Err(error_msg
                        .clone()
                        .unwrap_or_else(|| "Your input is not a valid port number.".to_string()))
                }
            }
            Validator::ValidRegex { error_msg } => {
                let Some(s) = value.as_str() else {
                    return Ok(());
                };
                Regex::new(s).map(|_| ()).map_err(|e| {
                    error_msg
                        .clone()
                        .unwrap_or_else(|| format!("Invalid regular expression: {e}"))
                })
            }
            Validator::Custom(custom) => (custom.0)(value),
        }
    }

    /// Frontend description of this validator. Custom callables have none.
    pub fn to_frontend(&self) -> Option<FrontendValidator> {
        match self {
            Validator::NumberInRange {
                min,
                max,
                error_msg,
            } => Some(FrontendValidator::NumberInRange {
                min_value: *min,
                max_value: *max,
                error_message: error_msg
                    .clone()
                    .unwrap_or_else(|| number_range_message(*min, *max)),
            }),
            Validator::LengthInRange {
                min,
                max,
                error_msg,
            } => Some(FrontendValidator::LengthInRange {
                min_value: *min,
                max_value: *max,
                error_message: error_msg
                    .clone()
                    .unwrap_or_else(|| length_range_message(*min, *max)),
            }),
            Validator::MatchRegex { regex, error_msg } => Some(FrontendValidator::MatchRegex {
                regex: regex.clone(),
                error_message: error_msg
                    .clone()
                    .unwrap_or_else(|| format!("Your input does not match the required format '{regex}'.")),
            }),
            Validator::NetworkPort { error_msg } => Some(FrontendValidator::NumberInRange {
                min_value: Some(0.0),
                max_value: Some(65535.0),
                error_message: error_msg
                    .clone()
                    .unwrap_or_else(|| "Your input is not a valid port number.".to_string()),
            }),
            Validator::ValidRegex { .. } | Validator::Custom(_) => None,
        }
    }
}

/// Run all validators, collecting failure messages in order.
pub fn run_validators(validators: &[Validator], value: &Value) -> Vec<String> {
    validators
        .iter()
        .filter_map(|v| v.check(value).err())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_in_range() {
        let v = Validator::number_in_range(Some(0.0), Some(100.0));
        assert!(v.check(&Value::Int(50)).is_ok());
        assert!(v.check(&Value::Float(100.0)).is_ok());
        assert_eq!(
            v.check(&Value::Int(101)).unwrap_err(),
            "Allowed values range from 0 to 100."
        );
        // not a number: left to the parser
        assert!(v.check(&Value::str("x")).is_ok());
    }

    #[test]
    fn test_length_in_range() {
        let v = Validator::not_empty();
        assert_eq!(
            v.check(&Value::str("")).unwrap_err(),
            "The value must not be empty."
        );
        assert!(v.check(&Value::list([Value::Int(1)])).is_ok());
    }

    #[test]
    fn test_match_regex() {
        let v = Validator::MatchRegex {
            regex: "^[a-z]+$".into(),
            error_msg: Some("lowercase only".into()),
        };
        assert!(v.check(&Value::str("abc")).is_ok());
        assert_eq!(v.check(&Value::str("ABC")).unwrap_err(), "lowercase only");
    }

    #[test]
    fn test_valid_regex() {
        let v = Validator::ValidRegex { error_msg: None };
        assert!(v.check(&Value::str("a+b")).is_ok());
        assert!(v.check(&Value::str("(unclosed")).is_err());
    }

    #[test]
    fn test_custom_stripped_from_frontend() {
        let v = Validator::custom(|_| Err("nope".into()));
        assert_eq!(v.check(&Value::None).unwrap_err(), "nope");
        assert!(v.to_frontend().is_none());
        assert!(Validator::NetworkPort { error_msg: None }.to_frontend().is_some());
    }

    #[test]
    fn test_deserialize_builtin() {
        let v: Validator =
            serde_json::from_str(r#"{"type": "number_in_range", "min": 1}"#).unwrap();
        assert!(v.check(&Value::Int(0)).is_err());
    }
}
