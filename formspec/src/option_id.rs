//! Option ids: stand-ins for arbitrary choice values on the frontend wire.
//!
//! An id is derived from the value's canonical representation, so it is
//! stable across requests and processes. Ids are only meaningful within the
//! option set of one schema instance; decoding is a linear scan over that set.

use sha2::{Digest, Sha256};

use crate::value::Value;

/// Compute the option id of a choice value.
pub fn option_id(value: &Value) -> String {
    let digest = Sha256::digest(value.canonical_repr().as_bytes());
    hex::encode(&digest[..16])
}

/// Find the option whose value has the given id.
pub fn find_by_option_id<'a, T: 'a>(
    id: &str,
    options: impl IntoIterator<Item = &'a T>,
    value_of: impl Fn(&T) -> &Value,
) -> Option<&'a T> {
    let found = options
        .into_iter()
        .find(|option| option_id(value_of(option)) == id);
    if found.is_none() {
        trace!("option id {id} not in option set");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_id_stable() {
        let up = Value::str("up");
        assert_eq!(option_id(&up), option_id(&Value::str("up")));
        assert_ne!(option_id(&up), option_id(&Value::str("down")));
        assert_eq!(option_id(&up).len(), 32);
    }

    #[test]
    fn test_find_by_option_id() {
        let options = [Value::str("up"), Value::Int(2), Value::tuple([Value::None])];
        let id = option_id(&Value::Int(2));
        assert_eq!(find_by_option_id(&id, &options, |v| v), Some(&Value::Int(2)));
        assert_eq!(find_by_option_id("nope", &options, |v| v), None);
    }
}
