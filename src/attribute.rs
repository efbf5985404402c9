//! Typed attribute values and items.
//!
//! [`AttributeValue`] is a tagged union with exactly one populated variant,
//! mirroring the wire representation of a DynamoDB-compatible item attribute.
//! Only `S` and `N` are keyable; the remaining variants round-trip through
//! [`AttributeValue::from_json`]/[`AttributeValue::to_json`] for non-key
//! attributes but are never consulted by the table engine's indexing or
//! query logic.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};

/// A single typed attribute value.
///
/// Numbers are stored as their literal decimal text, not as a re-formatted
/// float, so that a snapshot round-trips byte-for-byte on the attributes it
/// did not touch.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    S(String),
    N(String),
    B(Vec<u8>),
    Bool(bool),
    Null,
    Ss(Vec<String>),
    Ns(Vec<String>),
    Bs(Vec<Vec<u8>>),
    L(Vec<AttributeValue>),
    M(Item),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    /// Converts a document value (as read from a snapshot) into a typed
    /// attribute value. Every JSON shape has a representation in this
    /// alphabet, so this conversion cannot fail for snapshot-sourced input;
    /// it returns `Result` so a future, narrower attribute alphabet can
    /// surface a conversion error instead of silently dropping data.
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => AttributeValue::N(n.to_string()),
            Value::String(s) => AttributeValue::S(s.clone()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(AttributeValue::from_json(item)?);
                }
                AttributeValue::L(out)
            }
            Value::Object(map) => {
                let mut out = Item::new();
                for (k, v) in map {
                    out.insert(k.clone(), AttributeValue::from_json(v)?);
                }
                AttributeValue::M(out)
            }
        })
    }

    /// Converts a typed attribute value back into a document value, the
    /// inverse of [`AttributeValue::from_json`].
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::S(s) => Value::String(s.clone()),
            AttributeValue::N(n) => {
                serde_json::from_str::<Value>(n).unwrap_or_else(|_| Value::String(n.clone()))
            }
            AttributeValue::B(bytes) => {
                Value::String(bytes.iter().map(|b| format!("{b:02x}")).collect())
            }
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Null => Value::Null,
            AttributeValue::Ss(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
            AttributeValue::Ns(v) => Value::Array(
                v.iter()
                    .map(|n| {
                        serde_json::from_str::<Value>(n)
                            .unwrap_or_else(|_| Value::String(n.clone()))
                    })
                    .collect(),
            ),
            AttributeValue::Bs(v) => Value::Array(
                v.iter()
                    .map(|bytes| Value::String(bytes.iter().map(|b| format!("{b:02x}")).collect()))
                    .collect(),
            ),
            AttributeValue::L(items) => Value::Array(items.iter().map(|a| a.to_json()).collect()),
            AttributeValue::M(item) => {
                Value::Object(item.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }
}

/// An item: an ordered mapping from attribute name to typed value.
///
/// Backed by [`indexmap::IndexMap`] so re-serializing an item preserves the
/// attribute order it was loaded or constructed in.
pub type Item = IndexMap<String, AttributeValue>;

/// Converts a raw JSON object into an [`Item`]. Fails if the value is not an
/// object.
pub fn item_from_json(value: &Value) -> Result<Item> {
    let Value::Object(map) = value else {
        return Err(Error::new(
            ErrorKind::InvalidType,
            "item must be a JSON object",
        ));
    };
    let mut item = Item::new();
    for (k, v) in map {
        item.insert(k.clone(), AttributeValue::from_json(v)?);
    }
    Ok(item)
}

/// Converts an [`Item`] back into a raw JSON object.
pub fn item_to_json(item: &Item) -> Value {
    Value::Object(item.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}
