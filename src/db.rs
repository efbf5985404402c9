//! The database facade: owns named tables, validates operation envelopes,
//! and dispatches the five supported item-level operations.
//!
//! Grounded on `src/pipeline.rs`'s `LintPipeline`: an owning struct with a
//! small set of procedural methods, each doing input validation, delegating
//! to the owned state, and shaping a response — the same shape as
//! `LintPipeline::lint`'s clone-before-mutate, build-context, dispatch
//! sequence, applied here to Get/Put/Delete/Query/Update instead of
//! replay-then-lint.

use std::collections::HashMap;

use crate::attribute::{AttributeValue, Item};
use crate::config::EngineConfig;
use crate::error::{unexpected_nil, unimplemented, unknown_table, ErrorKind, Result};
use crate::keycond::{self, KeyCondExpr};
use crate::schema::Schema;
use crate::table::Table;
use crate::unimplemented_api::UnimplementedApi;
use crate::update_expr;

/// `ReturnValues` modes supported by Put/Delete/Update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnValue {
    #[default]
    None,
    AllOld,
    AllNew,
}

pub struct GetItemInput {
    pub table_name: String,
    pub key: Item,
}

#[derive(Debug, Default)]
pub struct GetItemOutput {
    pub item: Option<Item>,
}

#[derive(Default)]
pub struct PutItemInput {
    pub table_name: String,
    pub item: Item,
    pub return_values: Option<ReturnValue>,
    /// Present only to be detected and rejected — see [`reject_unsupported`].
    pub condition_expression: Option<String>,
    pub expected: Option<serde_json::Value>,
    pub conditional_operator: Option<String>,
}

#[derive(Debug, Default)]
pub struct PutItemOutput {
    pub attributes: Option<Item>,
}

#[derive(Default)]
pub struct DeleteItemInput {
    pub table_name: String,
    pub key: Item,
    pub return_values: Option<ReturnValue>,
    pub condition_expression: Option<String>,
    pub expected: Option<serde_json::Value>,
    pub conditional_operator: Option<String>,
}

#[derive(Debug, Default)]
pub struct DeleteItemOutput {
    pub attributes: Option<Item>,
}

#[derive(Default)]
pub struct QueryInput {
    pub table_name: String,
    pub key_condition_expression: String,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub index_name: Option<String>,
    pub scan_index_forward: Option<bool>,
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<Item>,
    pub select: Option<String>,
    pub attributes_to_get: Option<serde_json::Value>,
    pub conditional_operator: Option<String>,
    pub filter_expression: Option<String>,
    pub key_conditions: Option<serde_json::Value>,
    pub projection_expression: Option<String>,
    pub query_filter: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct QueryOutput {
    pub items: Vec<Item>,
    pub count: usize,
    pub scanned_count: usize,
    pub last_evaluated_key: Option<Item>,
}

#[derive(Default)]
pub struct UpdateItemInput {
    pub table_name: String,
    pub key: Item,
    pub update_expression: String,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub return_values: Option<ReturnValue>,
    pub condition_expression: Option<String>,
    pub expected: Option<serde_json::Value>,
    pub conditional_operator: Option<String>,
    pub attribute_updates: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct UpdateItemOutput {
    pub attributes: Option<Item>,
}

/// The five operations this core actually implements.
pub trait ItemApi {
    fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput>;
    fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput>;
    fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput>;
    fn query(&self, input: QueryInput) -> Result<QueryOutput>;
    fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput>;
}

/// Collects the names of present-but-unsupported fields and, if any, builds
/// a single [`ErrorKind::Unimplemented`] naming all of them.
fn reject_unsupported(fields: &[(&str, bool)]) -> Result<()> {
    let offending: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| *name)
        .collect();
    if offending.is_empty() {
        Ok(())
    } else {
        Err(unimplemented(format!(
            "unsupported field(s): {}",
            offending.join(", ")
        )))
    }
}

/// An in-process, file-loadable table store.
///
/// Owns an insertion-ordered table-name list (so snapshot re-serialization
/// preserves table order) and a name → [`Table`] map. Holds no lock of its
/// own beyond the per-table locks: the table map itself never changes after
/// construction.
pub struct Database {
    table_names: Vec<String>,
    tables: HashMap<String, Table>,
    config: EngineConfig,
}

impl Database {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            table_names: Vec::new(),
            tables: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn table_names(&self) -> &[String] {
        &self.table_names
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Creates an empty table with the given schema and registers it. Used
    /// by snapshot load, and directly by callers building a database
    /// without a snapshot document.
    pub fn add_table(&mut self, name: impl Into<String>, schema: Schema) -> &Table {
        let name = name.into();
        self.tables.insert(name.clone(), Table::new(name.clone(), schema));
        self.table_names.push(name.clone());
        self.tables.get(&name).expect("just inserted")
    }

    fn resolve_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| unknown_table(format!("no such table {name:?}")))
    }
}

impl UnimplementedApi for Database {}

impl ItemApi for Database {
    fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput> {
        if input.key.is_empty() {
            return Err(unexpected_nil("Key is required"));
        }
        let table = self.resolve_table(&input.table_name)?;
        let item = table.get(&input.key)?;
        Ok(GetItemOutput { item })
    }

    fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput> {
        if input.item.is_empty() {
            return Err(unexpected_nil("Item is required"));
        }
        reject_unsupported(&[
            ("ConditionExpression", input.condition_expression.is_some()),
            ("Expected", input.expected.is_some()),
            ("ConditionalOperator", input.conditional_operator.is_some()),
        ])?;
        let table = self.resolve_table(&input.table_name)?;
        let old = table.put(input.item)?;
        let attributes = match input.return_values.unwrap_or_default() {
            ReturnValue::AllOld => old,
            _ => None,
        };
        Ok(PutItemOutput { attributes })
    }

    fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput> {
        if input.key.is_empty() {
            return Err(unexpected_nil("Key is required"));
        }
        reject_unsupported(&[
            ("ConditionExpression", input.condition_expression.is_some()),
            ("Expected", input.expected.is_some()),
            ("ConditionalOperator", input.conditional_operator.is_some()),
        ])?;
        let table = self.resolve_table(&input.table_name)?;
        let old = table.delete(&input.key)?;
        let attributes = match input.return_values.unwrap_or_default() {
            ReturnValue::AllOld => old,
            _ => None,
        };
        Ok(DeleteItemOutput { attributes })
    }

    fn query(&self, input: QueryInput) -> Result<QueryOutput> {
        if input.key_condition_expression.is_empty() {
            return Err(unexpected_nil("KeyConditionExpression is required"));
        }
        reject_unsupported(&[
            ("AttributesToGet", input.attributes_to_get.is_some()),
            ("ConditionalOperator", input.conditional_operator.is_some()),
            ("FilterExpression", input.filter_expression.is_some()),
            ("KeyConditions", input.key_conditions.is_some()),
            ("ProjectionExpression", input.projection_expression.is_some()),
            ("QueryFilter", input.query_filter.is_some()),
        ])?;
        let select_count_only = match input.select.as_deref() {
            None => false,
            Some("COUNT") => true,
            Some(other) => {
                return Err(unimplemented(format!("unsupported Select mode {other:?}")));
            }
        };

        let table = self.resolve_table(&input.table_name)?;
        let names = input.expression_attribute_names.unwrap_or_default();
        let key_cond: KeyCondExpr = keycond::parse_key_cond_expr(
            &input.key_condition_expression,
            &names,
            &input.expression_attribute_values,
        )?;

        let outcome = table.query(
            &key_cond,
            input.index_name.as_deref(),
            input.scan_index_forward.unwrap_or(true),
            input.exclusive_start_key.as_ref(),
            input.limit,
            self.config.page_size,
            self.config.numeric_comparison,
            select_count_only,
        )?;

        Ok(QueryOutput {
            count: outcome.count,
            scanned_count: outcome.count,
            last_evaluated_key: outcome.last_evaluated_key,
            items: outcome.items,
        })
    }

    fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput> {
        if input.key.is_empty() {
            return Err(unexpected_nil("Key is required"));
        }
        if input.update_expression.is_empty() {
            return Err(unexpected_nil("UpdateExpression is required"));
        }
        reject_unsupported(&[
            ("ConditionExpression", input.condition_expression.is_some()),
            ("Expected", input.expected.is_some()),
            ("ConditionalOperator", input.conditional_operator.is_some()),
            ("AttributeUpdates", input.attribute_updates.is_some()),
        ])?;

        let table = self.resolve_table(&input.table_name)?;
        let names = input.expression_attribute_names.unwrap_or_default();
        let update = update_expr::parse_update_expr(
            &input.update_expression,
            &names,
            &input.expression_attribute_values,
        )?;
        let (old, new) = table.update(&input.key, &update)?;

        let attributes = match input.return_values.unwrap_or_default() {
            ReturnValue::AllOld => old,
            ReturnValue::AllNew => Some(new),
            ReturnValue::None => None,
        };
        Ok(UpdateItemOutput { attributes })
    }
}
