//! Update-expression grammar: the `SET` / `REMOVE` subset.
//!
//! Grounded on the original's `updateexpression.go`: clauses are split on
//! maximal substrings beginning at each top-level `SET `/`REMOVE ` keyword,
//! not on a single fixed separator, so that `SET a = :a REMOVE b` and
//! `REMOVE b SET a = :a` both parse.

use std::collections::HashMap;

use crate::attribute::{AttributeValue, Item};
use crate::error::{Error, ErrorKind, Result};
use crate::keycond::{substitute_name, substitute_value};

/// A parsed update expression: attribute assignments and attribute removals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpr {
    pub set: Item,
    pub remove: Vec<String>,
}

impl UpdateExpr {
    /// Applies this update to `item` in place: every `SET` overwrites or
    /// inserts, every `REMOVE` deletes.
    pub fn apply(&self, item: &mut Item) {
        for (name, value) in &self.set {
            item.insert(name.clone(), value.clone());
        }
        for name in &self.remove {
            item.shift_remove(name);
        }
    }
}

pub fn parse_update_expr(
    expr: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
) -> Result<UpdateExpr> {
    let mut update = UpdateExpr::default();
    for clause in split_clauses(expr)? {
        if let Some(rest) = clause.strip_prefix("SET ") {
            add_set_exprs(rest, names, values, &mut update.set)?;
        } else if let Some(rest) = clause.strip_prefix("REMOVE ") {
            add_remove_attrs(rest, names, &mut update.remove)?;
        } else {
            return Err(Error::new(
                ErrorKind::InvalidUpdateExpression,
                format!("unrecognized clause {clause:?}"),
            ));
        }
    }
    Ok(update)
}

fn split_clauses(expr: &str) -> Result<Vec<&str>> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidUpdateExpression,
            "update expression is empty",
        ));
    }

    let mut positions = Vec::new();
    for keyword in ["SET ", "REMOVE "] {
        let mut search_from = 0;
        while let Some(found) = trimmed[search_from..].find(keyword) {
            let at = search_from + found;
            if at == 0 || trimmed.as_bytes()[at - 1] == b' ' {
                positions.push(at);
            }
            search_from = at + keyword.len();
        }
    }
    positions.sort_unstable();
    positions.dedup();

    if positions.first() != Some(&0) {
        return Err(Error::new(
            ErrorKind::InvalidUpdateExpression,
            "update expression must start with SET or REMOVE",
        ));
    }

    let mut clauses = Vec::with_capacity(positions.len());
    for (i, &start) in positions.iter().enumerate() {
        let end = positions.get(i + 1).copied().unwrap_or(trimmed.len());
        clauses.push(trimmed[start..end].trim());
    }
    Ok(clauses)
}

fn add_set_exprs(
    rest: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
    out: &mut Item,
) -> Result<()> {
    for assign in rest.split(',') {
        let assign = assign.trim();
        let mut sides = assign.splitn(2, '=');
        let name = sides.next().unwrap_or("").trim();
        let value = sides
            .next()
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidUpdateExpression,
                    format!("SET assignment {assign:?} is missing '='"),
                )
            })?
            .trim();
        validate_token(name, false)?;
        validate_token(value, true)?;
        let resolved_name = substitute_name(name, names)?;
        let resolved_value = substitute_value(value, values)?;
        out.insert(resolved_name, resolved_value);
    }
    Ok(())
}

fn add_remove_attrs(rest: &str, names: &HashMap<String, String>, out: &mut Vec<String>) -> Result<()> {
    for name in rest.split(',') {
        let name = name.trim();
        validate_token(name, false)?;
        let resolved = substitute_name(name, names)?;
        if !out.contains(&resolved) {
            out.push(resolved);
        }
    }
    Ok(())
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn validate_token(token: &str, is_value: bool) -> Result<()> {
    let body = if is_value {
        token.strip_prefix(':').ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidUpdateExpression,
                format!("value placeholder {token:?} must start with ':'"),
            )
        })?
    } else {
        token.strip_prefix('#').unwrap_or(token)
    };
    if !body.is_empty() && body.chars().all(is_ident_char) {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::InvalidUpdateExpression,
            format!("invalid token {token:?}"),
        ))
    }
}
