use serde_json::{Value as JsonValue, json};

use super::{DataOrigin, FormSpecVisitor, InvalidValue, ParseResult, VisitorContext};
use crate::{
    error::{FormSpecError, Result},
    frontend::{FrontendBase, FrontendSchema, PasswordStoreChoice},
    messages::ValidationCollector,
    spec::{Password, SpecBase, kind},
    value::Value,
};

const POSTPROCESSED: &str = "cmk_postprocessed";
const EXPLICIT: &str = "explicit_password";
const STORED: &str = "stored_password";

/// Canonical parsed password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordValue {
    /// Password given in the configuration itself.
    Explicit {
        /// Identifier of this password, may be empty.
        id: String,
        /// Plaintext.
        password: String,
    },
    /// Reference to the password store.
    Stored {
        /// Store id.
        id: String,
    },
}

impl PasswordValue {
    /// Marker tuple persisted on disk.
    pub fn to_disk(&self) -> Value {
        let (tag, id, password) = match self {
            PasswordValue::Explicit { id, password } => (EXPLICIT, id.as_str(), password.as_str()),
            PasswordValue::Stored { id } => (STORED, id.as_str(), ""),
        };
        Value::tuple([
            Value::str(POSTPROCESSED),
            Value::str(tag),
            Value::tuple([Value::str(id), Value::str(password)]),
        ])
    }
}

/// Visitor of [`Password`] specs.
///
/// Disk values are marker tuples; the legacy `("password", pw)` and
/// `("store", id)` forms are read and upgraded. Frontend values carry the
/// explicit password encrypted by the transit cipher.
pub struct PasswordVisitor {
    spec: Password,
    ctx: VisitorContext,
}

impl PasswordVisitor {
    /// Wrap a spec.
    pub fn new(spec: Password, ctx: VisitorContext) -> Self {
        Self { spec, ctx }
    }

    fn parse_disk(&self, raw: &Value) -> Option<PasswordValue> {
        let items = raw.as_sequence()?;
        match items {
            [marker, tag, inner] if marker.as_str() == Some(POSTPROCESSED) => {
                let [id, password] = inner.as_sequence()? else {
                    return None;
                };
                let id = id.as_str()?.to_string();
                match tag.as_str()? {
                    EXPLICIT => Some(PasswordValue::Explicit {
                        id,
                        password: password.as_str()?.to_string(),
                    }),
                    STORED => Some(PasswordValue::Stored { id }),
                    _ => None,
                }
            }
            [tag, payload] => match tag.as_str()? {
                "password" => Some(PasswordValue::Explicit {
                    id: String::new(),
                    password: payload.as_str()?.to_string(),
                }),
                "store" => Some(PasswordValue::Stored {
                    id: payload.as_str()?.to_string(),
                }),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_frontend(&self, raw: &Value) -> ParseResult<PasswordValue> {
        let malformed = || InvalidValue::new("Invalid password: unexpected format", Value::None);
        let Some([tag, id, payload]) = raw.as_sequence() else {
            return Err(malformed());
        };
        let (Some(tag), Some(id)) = (tag.as_str(), id.as_str()) else {
            return Err(malformed());
        };
        let Some([secret, encrypted]) = payload.as_sequence() else {
            return Err(malformed());
        };
        let (Some(secret), Some(encrypted)) = (secret.as_str(), encrypted.as_bool()) else {
            return Err(malformed());
        };
        match tag {
            EXPLICIT => {
                let password = if encrypted {
                    self.ctx.services().cipher.decrypt(secret).map_err(|e| {
                        InvalidValue::new(format!("Invalid password: {e}"), Value::None)
                    })?
                } else {
                    secret.to_string()
                };
                Ok(PasswordValue::Explicit {
                    id: id.to_string(),
                    password,
                })
            }
            STORED => Ok(PasswordValue::Stored { id: id.to_string() }),
            _ => Err(malformed()),
        }
    }

    fn frontend_value(&self, parsed: &PasswordValue) -> Result<JsonValue> {
        Ok(match parsed {
            PasswordValue::Explicit { id, password } => {
                let ciphertext = self.ctx.services().cipher.encrypt(password).map_err(|e| {
                    FormSpecError::Collaborator {
                        service: "transit cipher",
                        reason: e.to_string(),
                    }
                })?;
                json!([EXPLICIT, id, [ciphertext, true]])
            }
            PasswordValue::Stored { id } => json!([STORED, id, ["", false]]),
        })
    }
}

visitor_factory!(PasswordVisitor, Password, kind::PASSWORD);

impl FormSpecVisitor for PasswordVisitor {
    type Parsed = PasswordValue;

    fn base(&self) -> &SpecBase {
        &self.spec.base
    }

    fn context(&self) -> &VisitorContext {
        &self.ctx
    }

    fn parse_default(&self) -> ParseResult<PasswordValue> {
        Ok(PasswordValue::Explicit {
            id: String::new(),
            password: String::new(),
        })
    }

    fn parse_value(&self, raw: &Value) -> ParseResult<PasswordValue> {
        match self.ctx.origin() {
            DataOrigin::Disk => self.parse_disk(raw).ok_or_else(|| {
                InvalidValue::new("Invalid password: unexpected format", Value::None)
            }),
            DataOrigin::Frontend => self.parse_frontend(raw),
        }
    }

    fn parsed_value(&self, parsed: &PasswordValue) -> Value {
        parsed.to_disk()
    }

    fn to_frontend_parsed(
        &self,
        parsed: std::result::Result<&PasswordValue, &InvalidValue>,
    ) -> Result<(FrontendSchema, JsonValue)> {
        let schema = FrontendSchema::Password {
            base: FrontendBase::from_spec(&self.spec.base, []),
            password_store_choices: self
                .ctx
                .services()
                .password_store
                .entries()
                .into_iter()
                .map(|(password_id, name)| PasswordStoreChoice { password_id, name })
                .collect(),
        };
        let value = match parsed {
            Ok(parsed) => self.frontend_value(parsed)?,
            Err(_) => json!([EXPLICIT, "", ["", false]]),
        };
        Ok((schema, value))
    }

    fn validate_parsed(
        &self,
        parsed: &PasswordValue,
        collector: &mut ValidationCollector,
    ) -> Result<()> {
        if let PasswordValue::Stored { id } = parsed {
            if !self.ctx.services().password_store.contains(id) {
                collector.push(
                    format!("The stored password \"{id}\" does not exist."),
                    json!([STORED, id, ["", false]]),
                );
            }
        }
        Ok(())
    }

    fn to_disk_parsed(&self, parsed: &PasswordValue) -> Result<Value> {
        Ok(parsed.to_disk())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::engine;
    use crate::{
        engine::FormEngine,
        services::{InMemoryPasswordStore, Services, StreamCipher},
        spec::FormSpec,
        value::RawValue,
        visitor::Visitor,
    };

    use super::*;

    fn explicit_disk(id: &str, password: &str) -> Value {
        Value::tuple([
            Value::str(POSTPROCESSED),
            Value::str(EXPLICIT),
            Value::tuple([Value::str(id), Value::str(password)]),
        ])
    }

    #[test]
    fn test_disk_roundtrip() {
        let v = engine()
            .visitor(&Password::default().into(), DataOrigin::Disk)
            .unwrap();
        let disk = explicit_disk("", "secret");
        assert_eq!(v.to_disk(RawValue::Given(&disk)).unwrap(), disk);
        assert!(v.validate(RawValue::Given(&disk)).unwrap().is_empty());
    }

    #[test]
    fn test_legacy_forms_upgraded() {
        let v = engine()
            .visitor(&Password::default().into(), DataOrigin::Disk)
            .unwrap();
        let legacy = Value::tuple([Value::str("password"), Value::str("secret")]);
        assert_eq!(
            v.to_disk(RawValue::Given(&legacy)).unwrap(),
            explicit_disk("", "secret")
        );
        let store = Value::tuple([Value::str("store"), Value::str("db")]);
        assert_eq!(
            v.to_disk(RawValue::Given(&store)).unwrap(),
            PasswordValue::Stored { id: "db".into() }.to_disk()
        );
    }

    #[test]
    fn test_frontend_never_shows_plaintext() {
        let engine = engine();
        let spec: FormSpec = Password::default().into();
        let disk = engine.visitor(&spec, DataOrigin::Disk).unwrap();
        let (_, value) = disk
            .to_frontend(RawValue::Given(&explicit_disk("pw1", "secret")))
            .unwrap();
        assert!(!value.to_string().contains("secret"));
        assert_eq!(value[0], "explicit_password");
        assert_eq!(value[2][1], true);

        let frontend = engine.visitor(&spec, DataOrigin::Frontend).unwrap();
        assert_eq!(
            frontend.to_disk(RawValue::Given(&Value::from(value))).unwrap(),
            explicit_disk("pw1", "secret")
        );
    }

    #[test]
    fn test_frontend_plaintext_and_tampering() {
        let v = engine()
            .visitor(&Password::default().into(), DataOrigin::Frontend)
            .unwrap();
        let plain = Value::from(json!(["explicit_password", "", ["secret", false]]));
        assert_eq!(
            v.to_disk(RawValue::Given(&plain)).unwrap(),
            explicit_disk("", "secret")
        );
        let forged = Value::from(json!(["explicit_password", "", ["00$00$00", true]]));
        let msgs = v.validate(RawValue::Given(&forged)).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].replacement_value, json!(["explicit_password", "", ["", false]]));
    }

    #[test]
    fn test_stored_password_lookup() {
        let services = Services {
            password_store: Arc::new(InMemoryPasswordStore::new([("db", "Database")])),
            cipher: Arc::new(StreamCipher::random()),
        };
        let engine = FormEngine::new(
            crate::engine::default_registry().unwrap(),
            services,
            Default::default(),
        );
        let v = engine
            .visitor(&Password::default().into(), DataOrigin::Frontend)
            .unwrap();
        let known = Value::from(json!(["stored_password", "db", ["", false]]));
        assert!(v.validate(RawValue::Given(&known)).unwrap().is_empty());
        let unknown = Value::from(json!(["stored_password", "web", ["", false]]));
        assert_eq!(v.validate(RawValue::Given(&unknown)).unwrap().len(), 1);

        let (schema, _) = v.to_frontend(RawValue::UseDefault).unwrap();
        let FrontendSchema::Password {
            password_store_choices,
            ..
        } = schema
        else {
            panic!("not a password schema");
        };
        assert_eq!(password_store_choices.len(), 1);
        assert_eq!(password_store_choices[0].password_id, "db");
    }
}
