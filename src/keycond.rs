//! Key-condition expression grammar: parsing, substitution, evaluation.
//!
//! Grounded on the original's `condexpression.go`: same operator-detection
//! order, same clause-splitting discipline, same evaluation rules for string
//! and number key parts.

use std::collections::HashMap;

use crate::attribute::{AttributeValue, Item};
use crate::config::NumericComparison;
use crate::error::{Error, ErrorKind, Result};

/// A key-condition comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Between,
    BeginsWith,
}

/// A single resolved key condition: an attribute name, an operator, and one
/// or two resolved comparison values (two only for `Between`).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCond {
    pub key_name: String,
    pub op: Op,
    pub value: AttributeValue,
    pub value2: Option<AttributeValue>,
}

impl KeyCond {
    /// Evaluates this condition against `item`. Returns `false` (never an
    /// error) if the attribute is absent or its variant doesn't match what
    /// this condition compares against — a predicate, not a validity check.
    pub fn check(&self, item: &Item, numeric_comparison: NumericComparison) -> bool {
        match item.get(&self.key_name) {
            Some(AttributeValue::S(s)) => self.check_s(s),
            Some(AttributeValue::N(n)) => self.check_n(n, numeric_comparison),
            _ => false,
        }
    }

    fn check_s(&self, s: &str) -> bool {
        let Some(v) = self.value.as_s() else {
            return false;
        };
        match self.op {
            Op::Eq => s == v,
            Op::Less => s < v,
            Op::Greater => s > v,
            Op::LessEq => s <= v,
            Op::GreaterEq => s >= v,
            Op::Between => {
                let Some(v2) = self.value2.as_ref().and_then(|a| a.as_s()) else {
                    return false;
                };
                s >= v && s <= v2
            }
            Op::BeginsWith => s.starts_with(v),
        }
    }

    fn check_n(&self, n: &str, numeric_comparison: NumericComparison) -> bool {
        let Some(v) = self.value.as_n() else {
            return false;
        };
        let cmp = |a: &str, b: &str| match numeric_comparison {
            NumericComparison::F64 => {
                // A numeric attribute that fails to parse compares as zero
                // rather than rejecting the condition outright.
                let a = a.parse::<f64>().unwrap_or(0.0);
                let b = b.parse::<f64>().unwrap_or(0.0);
                a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
            }
            NumericComparison::Decimal => compare_decimal(a, b),
        };
        match self.op {
            Op::Eq => cmp(n, v).is_eq(),
            Op::Less => cmp(n, v).is_lt(),
            Op::Greater => cmp(n, v).is_gt(),
            Op::LessEq => cmp(n, v).is_le(),
            Op::GreaterEq => cmp(n, v).is_ge(),
            Op::Between => {
                let Some(v2) = self.value2.as_ref().and_then(|a| a.as_n()) else {
                    return false;
                };
                cmp(n, v).is_ge() && cmp(n, v2).is_le()
            }
            Op::BeginsWith => false,
        }
    }
}

/// Compares two numeric literals by their exact decimal text rather than
/// through a lossy float conversion. Falls back to treating a malformed
/// literal as zero, same as the float comparator.
fn compare_decimal(a: &str, b: &str) -> std::cmp::Ordering {
    fn parts(s: &str) -> (bool, &str, &str) {
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        match rest.split_once('.') {
            Some((int_part, frac_part)) => (negative, int_part, frac_part),
            None => (negative, rest, ""),
        }
    }
    fn is_well_formed(int_part: &str, frac_part: &str) -> bool {
        !int_part.is_empty()
            && int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.bytes().all(|b| b.is_ascii_digit())
    }

    let (a_neg, a_int, a_frac) = parts(a);
    let (b_neg, b_int, b_frac) = parts(b);
    if !is_well_formed(a_int, a_frac) || !is_well_formed(b_int, b_frac) {
        return std::cmp::Ordering::Equal;
    }

    let a_int = a_int.trim_start_matches('0');
    let b_int = b_int.trim_start_matches('0');
    let magnitude = a_int
        .len()
        .cmp(&b_int.len())
        .then_with(|| a_int.cmp(b_int))
        .then_with(|| {
            let len = a_frac.len().max(b_frac.len());
            let a_padded = format!("{a_frac:0<len$}");
            let b_padded = format!("{b_frac:0<len$}");
            a_padded.cmp(&b_padded)
        });

    let is_zero_frac = |f: &str| f.bytes().all(|b| b == b'0');
    let both_zero = magnitude.is_eq()
        && a_int.is_empty()
        && b_int.is_empty()
        && is_zero_frac(a_frac)
        && is_zero_frac(b_frac);
    match (a_neg, b_neg) {
        (false, false) => magnitude,
        (true, true) => magnitude.reverse(),
        _ if both_zero => std::cmp::Ordering::Equal,
        (false, true) => std::cmp::Ordering::Greater,
        (true, false) => std::cmp::Ordering::Less,
    }
}

/// A parsed key-condition expression: a mandatory equality on the partition
/// key, and an optional condition on the sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondExpr {
    pub partition: KeyCond,
    pub sort: Option<KeyCond>,
}

impl KeyCondExpr {
    /// Evaluates the sort condition only (the partition condition is already
    /// consumed by index resolution in the query executor). Returns `true`
    /// when there is no sort condition.
    pub fn check_sort(&self, item: &Item, numeric_comparison: NumericComparison) -> bool {
        match &self.sort {
            Some(cond) => cond.check(item, numeric_comparison),
            None => true,
        }
    }
}

/// Parses a key-condition expression, resolving `#name` and `:value`
/// placeholders against the supplied substitution maps.
pub fn parse_key_cond_expr(
    expr: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
) -> Result<KeyCondExpr> {
    let mut parts = expr.splitn(2, " AND ");
    let first = parts.next().unwrap_or("");
    let rest = parts.next();

    let partition = parse_key_cond(first, names, values)?;
    if partition.op != Op::Eq {
        return Err(Error::new(
            ErrorKind::InvalidKeyCondition,
            "partition key condition must be an equality",
        ));
    }

    let sort = match rest {
        Some(clause) => Some(parse_key_cond(clause, names, values)?),
        None => None,
    };

    Ok(KeyCondExpr { partition, sort })
}

fn parse_key_cond(
    clause: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
) -> Result<KeyCond> {
    let clause = clause.trim();

    for (token, op) in [
        ("<=", Op::LessEq),
        (">=", Op::GreaterEq),
        ("=", Op::Eq),
        ("<", Op::Less),
        (">", Op::Greater),
    ] {
        if let Some(idx) = clause.find(token) {
            let name = clause[..idx].trim();
            let val = clause[idx + token.len()..].trim();
            return build_key_cond(name, op, val, None, names, values);
        }
    }

    if let Some(inner) = clause
        .strip_prefix("begins_with(")
        .and_then(|s| s.strip_suffix(')'))
    {
        let mut pieces = inner.splitn(2, ',');
        let name = pieces.next().unwrap_or("").trim();
        let val = pieces
            .next()
            .ok_or_else(|| Error::new(ErrorKind::InvalidKeyCondition, "begins_with requires two arguments"))?
            .trim();
        return build_key_cond(name, Op::BeginsWith, val, None, names, values);
    }

    if let Some(idx) = clause.find(" BETWEEN ") {
        let name = clause[..idx].trim();
        let rest = &clause[idx + " BETWEEN ".len()..];
        let mut bounds = rest.splitn(2, " AND ");
        let lo = bounds.next().unwrap_or("").trim();
        let hi = bounds
            .next()
            .ok_or_else(|| Error::new(ErrorKind::InvalidKeyCondition, "BETWEEN requires two bounds"))?
            .trim();
        return build_key_cond(name, Op::Between, lo, Some(hi), names, values);
    }

    Err(Error::new(
        ErrorKind::InvalidKeyCondition,
        format!("could not parse key condition clause {clause:?}"),
    ))
}

fn build_key_cond(
    name: &str,
    op: Op,
    val: &str,
    val2: Option<&str>,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
) -> Result<KeyCond> {
    validate_name_token(name)?;
    validate_value_token(val)?;
    if let Some(v2) = val2 {
        validate_value_token(v2)?;
    }
    Ok(KeyCond {
        key_name: substitute_name(name, names)?,
        op,
        value: substitute_value(val, values)?,
        value2: val2.map(|v| substitute_value(v, values)).transpose()?,
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn validate_name_token(s: &str) -> Result<()> {
    let body = s.strip_prefix('#').unwrap_or(s);
    if !body.is_empty() && body.chars().all(is_ident_char) {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::InvalidKeyCondition,
            format!("invalid attribute name token {s:?}"),
        ))
    }
}

fn validate_value_token(s: &str) -> Result<()> {
    let body = s.strip_prefix(':').ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidKeyCondition,
            format!("value placeholder {s:?} must start with ':'"),
        )
    })?;
    if !body.is_empty() && body.chars().all(is_ident_char) {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::InvalidKeyCondition,
            format!("invalid value placeholder token {s:?}"),
        ))
    }
}

pub fn substitute_name(token: &str, names: &HashMap<String, String>) -> Result<String> {
    if let Some(_rest) = token.strip_prefix('#') {
        names
            .get(token)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::Substitution, format!("no substitution for name {token:?}")))
    } else {
        Ok(token.to_string())
    }
}

pub fn substitute_value(
    token: &str,
    values: &HashMap<String, AttributeValue>,
) -> Result<AttributeValue> {
    values
        .get(token)
        .cloned()
        .ok_or_else(|| Error::new(ErrorKind::Substitution, format!("no substitution for value {token:?}")))
}
