//! Error taxonomy.
//!
//! Every fallible operation in this crate returns an [`Error`] carrying a
//! stable, matchable [`ErrorKind`] plus a human-readable message. Callers
//! compare `kind()` for control flow and use `Display` for logging; nothing
//! here ever panics or unwinds on caller input.

use strum_macros::{EnumString, IntoStaticStr};
use thiserror::Error;

/// A stable identifier for an error condition, recognizable by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A required input was absent.
    #[strum(serialize = "unexpected_nil")]
    UnexpectedNil,
    /// `TableName` did not resolve to a table in the database.
    #[strum(serialize = "unknown_table")]
    UnknownTable,
    /// `IndexName` did not resolve to an index on the table.
    #[strum(serialize = "unknown_index")]
    UnknownIndex,
    /// A schema element lacked a required name.
    #[strum(serialize = "missing_name")]
    MissingName,
    /// A schema key part named a type this core does not support.
    #[strum(serialize = "unknown_type")]
    UnknownType,
    /// A schema failed structural validation.
    #[strum(serialize = "invalid_schema")]
    InvalidSchema,
    /// A supplied key did not match the primary-key shape or type.
    #[strum(serialize = "invalid_key")]
    InvalidKey,
    /// An attribute had the wrong typed variant for the key part using it.
    #[strum(serialize = "invalid_type")]
    InvalidType,
    /// A required attribute was absent from an item.
    #[strum(serialize = "missing_attribute")]
    MissingAttribute,
    /// An attribute carried no recognized variant.
    #[strum(serialize = "missing_type")]
    MissingType,
    /// An item failed primary-key validation.
    #[strum(serialize = "primary_key_violation")]
    PrimaryKeyViolation,
    /// An item failed secondary-index validation.
    #[strum(serialize = "gsi_violation")]
    GsiViolation,
    /// Two items collided on the same primary key while loading a table.
    #[strum(serialize = "duplicate")]
    Duplicate,
    /// A key-condition expression was rejected by the parser.
    #[strum(serialize = "invalid_key_condition")]
    InvalidKeyCondition,
    /// An update expression was rejected by the parser.
    #[strum(serialize = "invalid_update_expression")]
    InvalidUpdateExpression,
    /// An expression placeholder had no binding in the supplied substitution map.
    #[strum(serialize = "substitution")]
    Substitution,
    /// The caller used a feature this core does not implement.
    #[strum(serialize = "unimplemented")]
    Unimplemented,
}

/// The crate's single error type: a stable [`ErrorKind`] plus a message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! err_ctor {
    ($fn_name:ident, $kind:ident) => {
        pub fn $fn_name(message: impl Into<String>) -> Error {
            Error::new(ErrorKind::$kind, message)
        }
    };
}

err_ctor!(unexpected_nil, UnexpectedNil);
err_ctor!(unknown_table, UnknownTable);
err_ctor!(unknown_index, UnknownIndex);
err_ctor!(missing_name, MissingName);
err_ctor!(unknown_type, UnknownType);
err_ctor!(invalid_schema, InvalidSchema);
err_ctor!(invalid_key, InvalidKey);
err_ctor!(invalid_type, InvalidType);
err_ctor!(missing_attribute, MissingAttribute);
err_ctor!(missing_type, MissingType);
err_ctor!(primary_key_violation, PrimaryKeyViolation);
err_ctor!(gsi_violation, GsiViolation);
err_ctor!(duplicate, Duplicate);
err_ctor!(invalid_key_condition, InvalidKeyCondition);
err_ctor!(invalid_update_expression, InvalidUpdateExpression);
err_ctor!(substitution, Substitution);
err_ctor!(unimplemented, Unimplemented);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn kind_is_matchable_by_equality() {
        let e = unknown_table("TableName \"foo\" not found");
        assert_eq!(e.kind(), ErrorKind::UnknownTable);
        assert_ne!(e.kind(), ErrorKind::UnknownIndex);
    }

    #[test]
    fn display_renders_message() {
        let e = substitution("no value for placeholder \":id\"");
        assert_eq!(e.to_string(), "no value for placeholder \":id\"");
    }

    #[test]
    fn kind_has_a_stable_string_identity() {
        let name: &'static str = ErrorKind::GsiViolation.into();
        assert_eq!(name, "gsi_violation");
        assert_eq!(ErrorKind::from_str("gsi_violation").unwrap(), ErrorKind::GsiViolation);
        assert!(ErrorKind::from_str("not_a_kind").is_err());
    }
}
