//! Schema definitions and item/key validation.
//!
//! Grounded on the original's `validate.go`: the same checks (key-def shape,
//! per-item primary-key and sparse-GSI validation) reimplemented against the
//! typed [`AttributeValue`] alphabet instead of a pointer-laden struct.

use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeValue, Item};
use crate::error::{Error, ErrorKind, Result};

/// The scalar type a key part is declared to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    String,
    Number,
    /// Recognized for schema compatibility; no attribute value ever
    /// satisfies a `Binary` key part, so it can never be used as a live key.
    Binary,
}

/// One half of a key (partition or sort): an attribute name plus its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPartDef {
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
}

/// A full key definition: required partition key, optional sort key, and
/// (for secondary indexes) a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "partitionKey")]
    pub partition_key: KeyPartDef,
    #[serde(default, rename = "sortKey", skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<KeyPartDef>,
}

/// A table's schema: the primary key plus zero or more global secondary
/// indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "primaryKey")]
    pub primary_key: KeyDef,
    #[serde(
        default,
        rename = "globalSecondaryIndex",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub global_secondary_indexes: Vec<KeyDef>,
}

impl Schema {
    pub fn gsi(&self, name: &str) -> Option<&KeyDef> {
        self.global_secondary_indexes
            .iter()
            .find(|k| k.name.as_deref() == Some(name))
    }
}

pub fn validate_key_part_def(part: &KeyPartDef) -> Result<()> {
    if part.name.is_empty() {
        return Err(Error::new(ErrorKind::MissingName, "key part has no name"));
    }
    Ok(())
}

pub fn validate_key_def(key: &KeyDef) -> Result<()> {
    validate_key_part_def(&key.partition_key)?;
    if let Some(sort) = &key.sort_key {
        validate_key_part_def(sort)?;
    }
    Ok(())
}

pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::new(ErrorKind::MissingName, "table has no name"));
    }
    Ok(())
}

pub fn validate_schema(schema: &Schema) -> Result<()> {
    validate_key_def(&schema.primary_key)?;
    for gsi in &schema.global_secondary_indexes {
        if gsi.name.as_deref().unwrap_or("").is_empty() {
            return Err(Error::new(
                ErrorKind::MissingName,
                "global secondary index has no name",
            ));
        }
        validate_key_def(gsi).map_err(|e| {
            Error::new(
                ErrorKind::InvalidSchema,
                format!("gsi {:?}: {e}", gsi.name),
            )
        })?;
    }
    Ok(())
}

/// Checks a single attribute against a key part's declared type.
///
/// A missing attribute is [`ErrorKind::MissingAttribute`]; an attribute that
/// is present but not of the declared type's variant is [`ErrorKind::MissingType`].
/// A `Binary`-typed key part always fails with `MissingType` since no
/// [`AttributeValue`] produced by this core's attribute model satisfies it.
fn validate_attr_key_type(item: &Item, part: &KeyPartDef) -> Result<()> {
    let attr = item
        .get(&part.name)
        .ok_or_else(|| Error::new(ErrorKind::MissingAttribute, format!("missing attribute {}", part.name)))?;
    let ok = match (part.key_type, attr) {
        (KeyType::String, AttributeValue::S(_)) => true,
        (KeyType::Number, AttributeValue::N(_)) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::MissingType,
            format!("attribute {} has wrong type for key part", part.name),
        ))
    }
}

/// Returns true if `item` carries every key part of `key` (partition, and
/// sort if declared). Used to decide whether a sparse GSI indexes an item.
pub fn has_key(item: &Item, key: &KeyDef) -> bool {
    if !item.contains_key(&key.partition_key.name) {
        return false;
    }
    if let Some(sort) = &key.sort_key
        && !item.contains_key(&sort.name)
    {
        return false;
    }
    true
}

/// Validates that `item` carries well-typed values for every part of `key`.
/// Does not check presence of optional parts beyond what the caller already
/// confirmed with [`has_key`].
pub fn validate_key(item: &Item, key: &KeyDef) -> Result<()> {
    validate_attr_key_type(item, &key.partition_key)?;
    if let Some(sort) = &key.sort_key {
        validate_attr_key_type(item, sort)?;
    }
    Ok(())
}

/// Validates a full item against a table's schema: primary key must be
/// present and well-typed; each GSI is validated only if the item carries
/// all of that GSI's key parts (sparse-index semantics).
pub fn validate_item(item: &Item, schema: &Schema) -> Result<()> {
    validate_key(item, &schema.primary_key)
        .map_err(|e| Error::new(ErrorKind::PrimaryKeyViolation, e.to_string()))?;
    for gsi in &schema.global_secondary_indexes {
        if has_key(item, gsi) {
            validate_key(item, gsi)
                .map_err(|e| Error::new(ErrorKind::GsiViolation, e.to_string()))?;
        }
    }
    Ok(())
}

/// Validates the key-only shape used by Get/Delete: the item must carry
/// exactly the primary key's parts, well-typed, and nothing else.
pub fn validate_key_item(key: &Item, schema: &Schema) -> Result<()> {
    if key.is_empty() {
        return Err(Error::new(ErrorKind::UnexpectedNil, "key is empty"));
    }
    let max_parts = if schema.primary_key.sort_key.is_some() { 2 } else { 1 };
    if key.len() > max_parts {
        return Err(Error::new(
            ErrorKind::InvalidKey,
            format!("key has {} attributes, primary key defines {}", key.len(), max_parts),
        ));
    }
    validate_key(key, &schema.primary_key)
        .map_err(|e| Error::new(ErrorKind::InvalidKey, e.to_string()))
}

pub fn validate_table(name: &str, schema: &Schema, items: &[Item]) -> Result<()> {
    validate_table_name(name)?;
    validate_schema(schema)?;
    for item in items {
        validate_item(item, schema)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn string_key(name: &str) -> KeyPartDef {
        KeyPartDef {
            name: name.to_string(),
            key_type: KeyType::String,
        }
    }

    fn number_key(name: &str) -> KeyPartDef {
        KeyPartDef {
            name: name.to_string(),
            key_type: KeyType::Number,
        }
    }

    #[test]
    fn validates_primary_key_presence_and_type() {
        let schema = Schema {
            primary_key: KeyDef {
                name: None,
                partition_key: string_key("id"),
                sort_key: None,
            },
            global_secondary_indexes: vec![],
        };
        let item: Item = indexmap! { "id".to_string() => AttributeValue::S("1".into()) };
        assert!(validate_item(&item, &schema).is_ok());

        let bad: Item = indexmap! { "id".to_string() => AttributeValue::N("1".into()) };
        let err = validate_item(&bad, &schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrimaryKeyViolation);
    }

    #[test]
    fn sparse_gsi_only_validates_when_all_parts_present() {
        let schema = Schema {
            primary_key: KeyDef {
                name: None,
                partition_key: number_key("id"),
                sort_key: None,
            },
            global_secondary_indexes: vec![KeyDef {
                name: Some("phoneGSI".into()),
                partition_key: string_key("phone"),
                sort_key: None,
            }],
        };
        let without_phone: Item = indexmap! { "id".to_string() => AttributeValue::N("1".into()) };
        assert!(validate_item(&without_phone, &schema).is_ok());

        let with_bad_phone: Item = indexmap! {
            "id".to_string() => AttributeValue::N("1".into()),
            "phone".to_string() => AttributeValue::N("000".into()),
        };
        let err = validate_item(&with_bad_phone, &schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GsiViolation);
    }

    #[test]
    fn key_item_rejects_extra_attributes() {
        let schema = Schema {
            primary_key: KeyDef {
                name: None,
                partition_key: string_key("id"),
                sort_key: None,
            },
            global_secondary_indexes: vec![],
        };
        let key: Item = indexmap! {
            "id".to_string() => AttributeValue::S("1".into()),
            "extra".to_string() => AttributeValue::S("nope".into()),
        };
        let err = validate_key_item(&key, &schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
    }

    #[test]
    fn binary_key_part_never_satisfied() {
        let part = KeyPartDef {
            name: "blob".to_string(),
            key_type: KeyType::Binary,
        };
        let item: Item = indexmap! { "blob".to_string() => AttributeValue::B(vec![1, 2, 3]) };
        let key = KeyDef {
            name: None,
            partition_key: part,
            sort_key: None,
        };
        let err = validate_key(&item, &key).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingType);
    }
}
