//! The table engine: owns items and their primary/secondary indexes.
//!
//! Grounded on the original's `table.go` for the exact indexing algorithm
//! (binary-search sorted insertion, "" as the absent-sort-key sentinel,
//! sparse GSI membership) and on `src/catalog/types.rs` for the
//! ownership/mutation-method shape (a struct owning maps, with small
//! invariant-preserving methods rather than exposing the maps directly).

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::attribute::{AttributeValue, Item};
use crate::config::NumericComparison;
use crate::error::Result;
use crate::keycond::KeyCondExpr;
use crate::schema::{self, KeyDef, KeyPartDef, KeyType, Schema};

/// The synthetic index name denoting the primary key index. Not a legal
/// name for a declared global secondary index, so it can never collide.
pub const PRIMARY_INDEX: &str = "/";

#[derive(Debug, Clone)]
struct IndexEntry {
    /// The item's identity: its *primary* key, regardless of which index
    /// this entry lives in. Pagination tokens are always built from this,
    /// even for a GSI query.
    primary_partition: String,
    primary_sort: String,
    /// The value this bucket is ordered by — the sort key of whichever
    /// index owns this entry, which may differ from `primary_sort`.
    sort_value: String,
    item: Item,
}

#[derive(Debug, Default)]
struct TableInner {
    by_primary: HashMap<String, HashMap<String, Item>>,
    by_index: HashMap<String, HashMap<String, Vec<IndexEntry>>>,
    /// Every item currently stored, in the order it was first inserted
    /// (snapshot load order, then put/update order for anything new).
    /// Bijective with `by_primary`; a replace updates the existing slot in
    /// place rather than moving it to the end.
    items: Vec<Item>,
}

impl TableInner {
    fn insert_indexed(&mut self, schema: &Schema, item: Item) {
        let pp = key_string(&item, Some(&schema.primary_key.partition_key));
        let ps = key_string(&item, schema.primary_key.sort_key.as_ref());

        let replaced = self
            .by_primary
            .entry(pp.clone())
            .or_default()
            .insert(ps.clone(), item.clone());

        if replaced.is_some() {
            let pos = self
                .items
                .iter()
                .position(|i| {
                    key_string(i, Some(&schema.primary_key.partition_key)) == pp
                        && key_string(i, schema.primary_key.sort_key.as_ref()) == ps
                })
                .expect("item list is bijective with by_primary");
            self.items[pos] = item.clone();
        } else {
            self.items.push(item.clone());
        }

        self.insert_into_index(PRIMARY_INDEX, &schema.primary_key, &pp, &ps, &item, &pp, &ps);

        for gsi in &schema.global_secondary_indexes {
            if schema::has_key(&item, gsi) {
                let gp = key_string(&item, Some(&gsi.partition_key));
                let gs = key_string(&item, gsi.sort_key.as_ref());
                let name = gsi.name.as_deref().unwrap_or("");
                self.insert_into_index(name, gsi, &gp, &gs, &item, &pp, &ps);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_into_index(
        &mut self,
        index_name: &str,
        key_def: &KeyDef,
        partition: &str,
        sort_value: &str,
        item: &Item,
        primary_partition: &str,
        primary_sort: &str,
    ) {
        let bucket = self
            .by_index
            .entry(index_name.to_string())
            .or_default()
            .entry(partition.to_string())
            .or_default();

        let entry = IndexEntry {
            primary_partition: primary_partition.to_string(),
            primary_sort: primary_sort.to_string(),
            sort_value: sort_value.to_string(),
            item: item.clone(),
        };

        match &key_def.sort_key {
            Some(sort_part) => {
                let pos = bucket
                    .partition_point(|e| less(&e.sort_value, sort_value, sort_part.key_type));
                bucket.insert(pos, entry);
            }
            None => bucket.push(entry),
        }
    }

    fn remove_indexed(&mut self, schema: &Schema, partition: &str, sort: &str) -> Option<Item> {
        let item = self.by_primary.get_mut(partition)?.remove(sort)?;
        if self.by_primary.get(partition).is_some_and(|m| m.is_empty()) {
            self.by_primary.remove(partition);
        }

        if let Some(pos) = self.items.iter().position(|i| {
            key_string(i, Some(&schema.primary_key.partition_key)) == partition
                && key_string(i, schema.primary_key.sort_key.as_ref()) == sort
        }) {
            self.items.remove(pos);
        }

        self.remove_from_index(PRIMARY_INDEX, partition, partition, sort);
        for gsi in &schema.global_secondary_indexes {
            if schema::has_key(&item, gsi) {
                let gp = key_string(&item, Some(&gsi.partition_key));
                let name = gsi.name.as_deref().unwrap_or("");
                self.remove_from_index(name, &gp, partition, sort);
            }
        }
        Some(item)
    }

    fn remove_from_index(
        &mut self,
        index_name: &str,
        partition: &str,
        primary_partition: &str,
        primary_sort: &str,
    ) {
        let Some(map) = self.by_index.get_mut(index_name) else {
            return;
        };
        let Some(bucket) = map.get_mut(partition) else {
            return;
        };
        if let Some(pos) = bucket
            .iter()
            .position(|e| e.primary_partition == primary_partition && e.primary_sort == primary_sort)
        {
            bucket.remove(pos);
        }
        if bucket.is_empty() {
            map.remove(partition);
        }
    }
}

fn less(a: &str, b: &str, key_type: KeyType) -> bool {
    match key_type {
        KeyType::String => a < b,
        KeyType::Number => a.parse::<f64>().unwrap_or(0.0) < b.parse::<f64>().unwrap_or(0.0),
        KeyType::Binary => false,
    }
}

/// Extracts the string form of a key part's attribute from `item`. Returns
/// `""` if the part is absent (no sort key declared) or the attribute is
/// missing — matching the original's `keyString`.
fn key_string(item: &Item, part: Option<&KeyPartDef>) -> String {
    let Some(part) = part else {
        return String::new();
    };
    match item.get(&part.name) {
        Some(AttributeValue::S(s)) => s.clone(),
        Some(AttributeValue::N(n)) => n.clone(),
        _ => String::new(),
    }
}

fn primary_key_of(item: &Item, primary: &KeyDef) -> Item {
    let mut key = Item::new();
    if let Some(v) = item.get(&primary.partition_key.name) {
        key.insert(primary.partition_key.name.clone(), v.clone());
    }
    if let Some(sort) = &primary.sort_key
        && let Some(v) = item.get(&sort.name)
    {
        key.insert(sort.name.clone(), v.clone());
    }
    key
}

/// A named table: schema plus the item set and its derived indexes, guarded
/// by a single readers-writer lock so a panic in one table's critical
/// section never poisons readers of another table.
pub struct Table {
    name: String,
    schema: Schema,
    inner: RwLock<TableInner>,
}

/// The result of a [`Table::query`] call.
pub struct QueryOutcome {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
    pub count: usize,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            inner: RwLock::new(TableInner::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Loads an initial item set (from a snapshot), rejecting duplicate
    /// primary keys rather than silently replacing them.
    pub fn load_items(&self, items: Vec<Item>) -> Result<()> {
        let mut inner = self.inner.write();
        for item in items {
            schema::validate_item(&item, &self.schema)?;
            let pp = key_string(&item, Some(&self.schema.primary_key.partition_key));
            let ps = key_string(&item, self.schema.primary_key.sort_key.as_ref());
            if inner
                .by_primary
                .get(&pp)
                .is_some_and(|m| m.contains_key(&ps))
            {
                return Err(crate::error::duplicate(format!(
                    "duplicate primary key in table {:?}",
                    self.name
                )));
            }
            inner.insert_indexed(&self.schema, item);
        }
        Ok(())
    }

    /// Returns every item currently stored, in insertion order — the order
    /// a snapshot was loaded in, followed by anything put since. Used by
    /// snapshot serialization, which depends on this being deterministic.
    pub fn all_items(&self) -> Vec<Item> {
        self.inner.read().items.clone()
    }

    pub fn get(&self, key: &Item) -> Result<Option<Item>> {
        schema::validate_key_item(key, &self.schema)?;
        let partition = key_string(key, Some(&self.schema.primary_key.partition_key));
        let sort = key_string(key, self.schema.primary_key.sort_key.as_ref());
        let inner = self.inner.read();
        Ok(inner
            .by_primary
            .get(&partition)
            .and_then(|m| m.get(&sort))
            .cloned())
    }

    pub fn put(&self, item: Item) -> Result<Option<Item>> {
        schema::validate_item(&item, &self.schema)?;
        let partition = key_string(&item, Some(&self.schema.primary_key.partition_key));
        let sort = key_string(&item, self.schema.primary_key.sort_key.as_ref());
        let mut inner = self.inner.write();
        let old = inner.remove_indexed(&self.schema, &partition, &sort);
        inner.insert_indexed(&self.schema, item);
        tracing::debug!(table = %self.name, partition = %partition, sort = %sort, "put item");
        Ok(old)
    }

    pub fn delete(&self, key: &Item) -> Result<Option<Item>> {
        schema::validate_key_item(key, &self.schema)?;
        let partition = key_string(key, Some(&self.schema.primary_key.partition_key));
        let sort = key_string(key, self.schema.primary_key.sort_key.as_ref());
        let mut inner = self.inner.write();
        let old = inner.remove_indexed(&self.schema, &partition, &sort);
        tracing::debug!(table = %self.name, partition = %partition, sort = %sort, "delete item");
        Ok(old)
    }

    /// Applies an update to the item at `key`, creating a shell item from
    /// the key attributes if none existed. Returns `(old, new)`.
    pub fn update(
        &self,
        key: &Item,
        update: &crate::update_expr::UpdateExpr,
    ) -> Result<(Option<Item>, Item)> {
        schema::validate_key_item(key, &self.schema)?;
        let partition = key_string(key, Some(&self.schema.primary_key.partition_key));
        let sort = key_string(key, self.schema.primary_key.sort_key.as_ref());
        let mut inner = self.inner.write();
        let old = inner.remove_indexed(&self.schema, &partition, &sort);
        let mut new_item = old.clone().unwrap_or_else(|| key.clone());
        update.apply(&mut new_item);
        schema::validate_item(&new_item, &self.schema)?;
        inner.insert_indexed(&self.schema, new_item.clone());
        tracing::debug!(table = %self.name, partition = %partition, sort = %sort, "update item");
        Ok((old, new_item))
    }

    /// Runs a query against this table: resolves the index, matches the
    /// partition, applies pagination and the sort condition, then truncates
    /// to the effective page size.
    #[allow(clippy::too_many_arguments)]
    pub fn query(
        &self,
        key_cond: &KeyCondExpr,
        index_name: Option<&str>,
        scan_index_forward: bool,
        exclusive_start_key: Option<&Item>,
        limit: Option<usize>,
        page_size: Option<usize>,
        numeric_comparison: NumericComparison,
        count_only: bool,
    ) -> Result<QueryOutcome> {
        let key_def: &KeyDef = match index_name {
            None => &self.schema.primary_key,
            Some(name) => self
                .schema
                .gsi(name)
                .ok_or_else(|| crate::error::unknown_index(format!("no such index {name:?}")))?,
        };
        let idx_key = index_name.unwrap_or(PRIMARY_INDEX);

        if key_cond.partition.key_name != key_def.partition_key.name {
            return Err(crate::error::invalid_key(format!(
                "key condition partitions on {:?}, index partitions on {:?}",
                key_cond.partition.key_name, key_def.partition_key.name
            )));
        }
        let partition_str = match key_def.partition_key.key_type {
            KeyType::String => key_cond.partition.value.as_s().map(str::to_string),
            KeyType::Number => key_cond.partition.value.as_n().map(str::to_string),
            KeyType::Binary => None,
        }
        .ok_or_else(|| crate::error::invalid_key("partition key value type mismatch"))?;

        let mut bucket: Vec<IndexEntry> = {
            let inner = self.inner.read();
            inner
                .by_index
                .get(idx_key)
                .and_then(|m| m.get(&partition_str))
                .cloned()
                .unwrap_or_default()
        };

        if !scan_index_forward {
            bucket.reverse();
        }

        if let Some(esk) = exclusive_start_key {
            schema::validate_key_item(esk, &self.schema)?;
            let pp = key_string(esk, Some(&self.schema.primary_key.partition_key));
            let ps = key_string(esk, self.schema.primary_key.sort_key.as_ref());
            match bucket
                .iter()
                .position(|e| e.primary_partition == pp && e.primary_sort == ps)
            {
                Some(pos) => bucket = bucket.split_off(pos + 1),
                None => bucket.clear(),
            }
        }

        if let Some(sort_cond) = &key_cond.sort {
            bucket.retain(|e| sort_cond.check(&e.item, numeric_comparison));
        }

        let cap = match (limit, page_size) {
            (Some(l), Some(p)) => Some(l.min(p)),
            (Some(l), None) => Some(l),
            (None, Some(p)) => Some(p),
            (None, None) => None,
        };
        let truncated = cap.is_some_and(|c| bucket.len() > c);
        let last_evaluated_key = if truncated {
            // Capture the boundary item from the untruncated bucket: the
            // last item of the page for a nonzero page size, or the first
            // unconsumed item when `Limit` is 0 — otherwise a zero-limit
            // query against a nonempty partition would wrongly report no
            // continuation key at all.
            let c = cap.expect("truncated implies cap is Some");
            let boundary = if c == 0 { bucket.first() } else { bucket.get(c - 1) };
            boundary.map(|e| primary_key_of(&e.item, &self.schema.primary_key))
        } else {
            None
        };
        if let Some(c) = cap {
            bucket.truncate(c);
        }

        let count = bucket.len();

        tracing::debug!(
            table = %self.name,
            index = %idx_key,
            returned = count,
            "query"
        );

        let items = if count_only {
            Vec::new()
        } else {
            bucket.into_iter().map(|e| e.item).collect()
        };

        Ok(QueryOutcome {
            items,
            last_evaluated_key,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn string_part(name: &str) -> KeyPartDef {
        KeyPartDef {
            name: name.to_string(),
            key_type: KeyType::String,
        }
    }

    fn number_part(name: &str) -> KeyPartDef {
        KeyPartDef {
            name: name.to_string(),
            key_type: KeyType::Number,
        }
    }

    fn product_table() -> Table {
        let schema = Schema {
            primary_key: KeyDef {
                name: None,
                partition_key: string_part("id"),
                sort_key: None,
            },
            global_secondary_indexes: vec![],
        };
        Table::new("product", schema)
    }

    fn item(pairs: Vec<(&str, AttributeValue)>) -> Item {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn put_then_get_round_trips() {
        let table = product_table();
        let i = item(vec![
            ("id", AttributeValue::S("1".into())),
            ("name", AttributeValue::S("red pen".into())),
        ]);
        assert!(table.put(i.clone()).unwrap().is_none());
        let key = item(vec![("id", AttributeValue::S("1".into()))]);
        assert_eq!(table.get(&key).unwrap(), Some(i));
    }

    #[test]
    fn put_replace_returns_old_item() {
        let table = product_table();
        let old = item(vec![("id", AttributeValue::S("1".into())), ("name", AttributeValue::S("a".into()))]);
        let new = item(vec![("id", AttributeValue::S("1".into())), ("name", AttributeValue::S("b".into()))]);
        table.put(old.clone()).unwrap();
        let returned = table.put(new.clone()).unwrap();
        assert_eq!(returned, Some(old));
        let key = item(vec![("id", AttributeValue::S("1".into()))]);
        assert_eq!(table.get(&key).unwrap(), Some(new));
    }

    #[test]
    fn delete_then_get_is_null() {
        let table = product_table();
        let i = item(vec![("id", AttributeValue::S("1".into()))]);
        table.put(i.clone()).unwrap();
        assert_eq!(table.delete(&i).unwrap(), Some(i.clone()));
        assert_eq!(table.get(&i).unwrap(), None);
        assert_eq!(table.delete(&i).unwrap(), None);
    }

    #[test]
    fn gsi_sort_order_and_reverse() {
        let schema = Schema {
            primary_key: KeyDef {
                name: None,
                partition_key: number_part("id"),
                sort_key: None,
            },
            global_secondary_indexes: vec![KeyDef {
                name: Some("nameGSI".into()),
                partition_key: string_part("name"),
                sort_key: Some(number_part("age")),
            }],
        };
        let table = Table::new("person", schema);
        table
            .put(item(vec![
                ("id", AttributeValue::N("4".into())),
                ("name", AttributeValue::S("Jen".into())),
                ("age", AttributeValue::N("44".into())),
            ]))
            .unwrap();
        table
            .put(item(vec![
                ("id", AttributeValue::N("8".into())),
                ("name", AttributeValue::S("Jen".into())),
                ("age", AttributeValue::N("15".into())),
            ]))
            .unwrap();

        let key_cond = KeyCondExpr {
            partition: crate::keycond::KeyCond {
                key_name: "name".to_string(),
                op: crate::keycond::Op::Eq,
                value: AttributeValue::S("Jen".into()),
                value2: None,
            },
            sort: None,
        };
        let forward = table
            .query(&key_cond, Some("nameGSI"), true, None, None, None, NumericComparison::F64, false)
            .unwrap();
        let ages: Vec<&str> = forward.items.iter().map(|i| i.get("age").unwrap().as_n().unwrap()).collect();
        assert_eq!(ages, vec!["15", "44"]);

        let backward = table
            .query(&key_cond, Some("nameGSI"), false, None, None, None, NumericComparison::F64, false)
            .unwrap();
        let ages: Vec<&str> = backward.items.iter().map(|i| i.get("age").unwrap().as_n().unwrap()).collect();
        assert_eq!(ages, vec!["44", "15"]);
    }

    #[test]
    fn query_pagination_round_trips_exclusive_start_key() {
        let schema = Schema {
            primary_key: KeyDef {
                name: None,
                partition_key: number_part("id"),
                sort_key: None,
            },
            global_secondary_indexes: vec![KeyDef {
                name: Some("nameGSI".into()),
                partition_key: string_part("name"),
                sort_key: Some(number_part("age")),
            }],
        };
        let table = Table::new("person", schema);
        table
            .put(item(vec![
                ("id", AttributeValue::N("4".into())),
                ("name", AttributeValue::S("Jen".into())),
                ("age", AttributeValue::N("44".into())),
            ]))
            .unwrap();
        table
            .put(item(vec![
                ("id", AttributeValue::N("8".into())),
                ("name", AttributeValue::S("Jen".into())),
                ("age", AttributeValue::N("15".into())),
            ]))
            .unwrap();
        let key_cond = KeyCondExpr {
            partition: crate::keycond::KeyCond {
                key_name: "name".to_string(),
                op: crate::keycond::Op::Eq,
                value: AttributeValue::S("Jen".into()),
                value2: None,
            },
            sort: None,
        };

        let first = table
            .query(&key_cond, Some("nameGSI"), true, None, Some(1), None, NumericComparison::F64, false)
            .unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].get("id").unwrap().as_n(), Some("8"));
        let lek = first.last_evaluated_key.unwrap();
        assert_eq!(lek.get("id").unwrap().as_n(), Some("8"));

        let second = table
            .query(&key_cond, Some("nameGSI"), true, Some(&lek), Some(5), None, NumericComparison::F64, false)
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].get("id").unwrap().as_n(), Some("4"));
        assert!(second.last_evaluated_key.is_none());
    }

    #[test]
    fn zero_limit_against_nonempty_partition_reports_a_continuation_key() {
        let table = product_table();
        table.put(item(vec![("id", AttributeValue::S("1".into()))])).unwrap();
        let key_cond = KeyCondExpr {
            partition: crate::keycond::KeyCond {
                key_name: "id".to_string(),
                op: crate::keycond::Op::Eq,
                value: AttributeValue::S("1".into()),
                value2: None,
            },
            sort: None,
        };
        let result = table
            .query(&key_cond, None, true, None, Some(0), None, NumericComparison::F64, false)
            .unwrap();
        assert!(result.items.is_empty());
        assert!(result.last_evaluated_key.is_some());
    }

    #[test]
    fn all_items_preserves_insertion_order_across_replace() {
        let table = product_table();
        table.put(item(vec![("id", AttributeValue::S("a".into()))])).unwrap();
        table.put(item(vec![("id", AttributeValue::S("b".into()))])).unwrap();
        table
            .put(item(vec![
                ("id", AttributeValue::S("a".into())),
                ("name", AttributeValue::S("updated".into())),
            ]))
            .unwrap();
        let ids: Vec<&str> = table
            .all_items()
            .iter()
            .map(|i| i.get("id").unwrap().as_s().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        table.delete(&item(vec![("id", AttributeValue::S("a".into()))])).unwrap();
        table.put(item(vec![("id", AttributeValue::S("c".into()))])).unwrap();
        let ids: Vec<&str> = table
            .all_items()
            .iter()
            .map(|i| i.get("id").unwrap().as_s().unwrap())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn update_creates_shell_item_when_absent() {
        let table = product_table();
        let key = item(vec![("id", AttributeValue::S("9".into()))]);
        let update = crate::update_expr::UpdateExpr {
            set: indexmap! { "name".to_string() => AttributeValue::S("new".into()) },
            remove: vec![],
        };
        let (old, new) = table.update(&key, &update).unwrap();
        assert!(old.is_none());
        assert_eq!(new.get("name").unwrap().as_s(), Some("new"));
        assert_eq!(table.get(&key).unwrap(), Some(new));
    }
}
