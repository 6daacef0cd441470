//! Equality filters and their `OData` encoding.
//!
//! Filters travel through the agent as a map of field name to scalar and
//! are rendered as `field eq value` clauses joined by `and`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A filter map: field name → scalar value. Ordered so that the rendered
/// expression is deterministic.
pub type Filters = BTreeMap<String, FilterValue>;

static FIELD_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_/]*$").ok());

/// A scalar filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// `true` / `false`.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// String, rendered quoted.
    Text(String),
}

impl FilterValue {
    /// Parses a command-line value: `true`/`false`, integers and floats
    /// keep their type, anything else is text.
    #[must_use]
    pub fn parse_loose(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => raw
                .parse::<i64>()
                .map(Self::Integer)
                .or_else(|_| raw.parse::<f64>().map(Self::Float))
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// Renders one `field eq value` clause.
///
/// # Errors
///
/// Returns [`SearchError::InvalidFilter`] if the field name is not a plain
/// identifier or the value is a non-finite float.
pub fn eq_clause(field: &str, value: &FilterValue) -> Result<String, SearchError> {
    let valid = FIELD_NAME.as_ref().is_some_and(|re| re.is_match(field));
    if !valid {
        return Err(SearchError::InvalidFilter(format!(
            "field name `{field}` is not a valid identifier"
        )));
    }
    if let FilterValue::Float(x) = value
        && !x.is_finite()
    {
        return Err(SearchError::InvalidFilter(format!(
            "value for `{field}` is not a finite number"
        )));
    }
    Ok(format!("{field} eq {value}"))
}

/// Renders a filter map as an `OData` expression.
///
/// `None` and an empty map both yield `None`, so callers send the same
/// request either way.
///
/// # Errors
///
/// Propagates [`eq_clause`] failures.
pub fn build_filter(filters: Option<&Filters>) -> Result<Option<String>, SearchError> {
    let Some(filters) = filters.filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let clauses = filters
        .iter()
        .map(|(k, v)| eq_clause(k, v))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(clauses.join(" and ")))
}

/// Joins a leading clause with an optional filter map.
///
/// # Errors
///
/// Propagates [`build_filter`] failures.
pub fn conjoin(leading: String, filters: Option<&Filters>) -> Result<String, SearchError> {
    Ok(match build_filter(filters)? {
        Some(rest) => format!("{leading} and {rest}"),
        None => leading,
    })
}
