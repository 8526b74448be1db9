//! Validation diagnostics with structural locations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One validation diagnostic.
///
/// `location` is relative to the schema that produced the message list; the
/// UI attaches the message to the form control at that path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Path segments from the validated schema down to the offending field.
    pub location: Vec<String>,
    /// Human-readable description.
    pub message: String,
    /// Frontend-encoded value to redisplay in place of the offending input.
    pub replacement_value: JsonValue,
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.location.join("."), self.message)
        }
    }
}

/// Path-scoped accumulator for validation messages.
///
/// Composite visitors enter a child's scope with [`ValidationCollector::scoped`];
/// messages pushed inside are prefixed with every enclosing segment.
#[derive(Debug, Default)]
pub struct ValidationCollector {
    location: Vec<String>,
    messages: Vec<ValidationMessage>,
}

impl ValidationCollector {
    /// Create an empty collector rooted at the empty location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message at the current location.
    pub fn push(&mut self, message: impl Into<String>, replacement_value: JsonValue) {
        self.messages.push(ValidationMessage {
            location: self.location.clone(),
            message: message.into(),
            replacement_value,
        });
    }

    /// Run `f` with `segment` appended to the current location.
    pub fn scoped<T>(&mut self, segment: impl Into<String>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.location.push(segment.into());
        let out = f(self);
        self.location.pop();
        out
    }

    /// Current location, for diagnostics.
    pub fn location(&self) -> &[String] {
        &self.location
    }

    /// Number of messages recorded so far.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no message has been recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Finish and return the messages in recording order.
    pub fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_prefixing() {
        let mut c = ValidationCollector::new();
        c.push("root", JsonValue::Null);
        c.scoped("topic", |c| {
            c.scoped("elem", |c| c.push("nested", JsonValue::Null));
            assert_eq!(c.location(), ["topic"]);
        });
        let msgs = c.into_messages();
        assert_eq!(msgs[0].location, Vec::<String>::new());
        assert_eq!(msgs[1].location, vec!["topic", "elem"]);
        assert_eq!(msgs[1].to_string(), "topic.elem: nested");
    }
}
