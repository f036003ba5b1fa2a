//! # Construction from Mappings
//!
//! Builds a record from an untyped, ordered name→value mapping. Values are
//! assigned exactly as supplied: no coercion, no type checks, no
//! validation. A record built here may well be invalid; that is for the
//! validation pass to report.

use crate::error::UndeclaredFieldError;
use crate::structure::{StructType, Structure};
use crate::value::Value;

/// Policy for keys that name no declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnknownKeys {
    /// Abort construction with [`UndeclaredFieldError`] on the first unknown key.
    #[default]
    Reject,
    /// Skip unknown keys silently.
    Discard,
}

/// Build a `T` from `properties`, assigning in iteration order onto
/// `T::default()`.
///
/// Fields absent from `properties` keep their declared default. With
/// [`UnknownKeys::Reject`], construction fails fast: the first unknown key
/// aborts and no partially-built record is returned.
///
/// # Errors
///
/// Returns [`UndeclaredFieldError`] (access `Set`) for an unknown key under
/// [`UnknownKeys::Reject`].
pub fn from_map<T, I, K, V>(properties: I, mode: UnknownKeys) -> Result<T, UndeclaredFieldError>
where
    T: StructType,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    let mut record = T::default();
    for (key, value) in properties {
        let name = key.as_ref();
        if mode == UnknownKeys::Discard && !T::has_field(name) {
            tracing::trace!(type_name = T::TYPE_NAME, field = name, "discarding undeclared key");
            continue;
        }
        record.set(name, value.into())?;
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Access;
    use crate::field_map;

    crate::structure! {
        struct Account {
            pub owner,
            pub balance = 0,
            pub tags,
        }
    }

    #[test]
    fn test_assigns_supplied_values() {
        let account: Account = from_map(
            field_map! { "owner" => "ada", "tags" => vec!["a", "b"] },
            UnknownKeys::Reject,
        )
        .unwrap();
        assert_eq!(account.owner, Value::from("ada"));
        assert_eq!(account.balance, Value::from(0));
        assert_eq!(account.tags, Value::from(vec!["a", "b"]));
    }

    #[test]
    fn test_no_coercion_on_assignment() {
        let account = Account::from_map([("balance", "lots")], UnknownKeys::Reject).unwrap();
        assert_eq!(account.balance, Value::from("lots"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Account::from_map([("unknownKey", 1)], UnknownKeys::Reject).unwrap_err();
        assert_eq!(err.type_name, "Account");
        assert_eq!(err.field, "unknownKey");
        assert_eq!(err.access, Access::Set);
    }

    #[test]
    fn test_unknown_key_discarded() {
        let account = Account::from_map([("unknownKey", 1)], UnknownKeys::Discard).unwrap();
        assert_eq!(account, Account::default());
        assert!(account.get("unknownKey").is_err());
    }

    #[test]
    fn test_reject_fails_fast_on_first_unknown() {
        let props = field_map! { "owner" => "ada", "bogus" => 1, "other" => 2 };
        let err = Account::from_map(props, UnknownKeys::Reject).unwrap_err();
        assert_eq!(err.field, "bogus");
    }

    #[test]
    fn test_later_duplicate_key_wins() {
        let props: Vec<(&str, Value)> = vec![("owner", "a".into()), ("owner", "b".into())];
        let account = Account::from_map(props, UnknownKeys::Reject).unwrap();
        assert_eq!(account.owner, Value::from("b"));
    }

    #[test]
    fn test_round_trip_through_to_map() {
        let original = Account {
            owner: Value::from("grace"),
            balance: Value::from(12.5),
            tags: Value::from(vec![Value::Null, Value::from(true)]),
        };
        let rebuilt = Account::from_map(original.to_map(), UnknownKeys::Reject).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_default_mode_is_reject() {
        assert_eq!(UnknownKeys::default(), UnknownKeys::Reject);
    }
}
