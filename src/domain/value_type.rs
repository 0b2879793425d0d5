// ============================================================
// VALUE TYPES
// ============================================================
// Base types, inferred column types, and user-defined value types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pattern accepted as numeric input: optional sign, optional `,`/`.` decimal
/// separator, optional exponent.
pub static NUMERIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?([0-9]*[,.])?[0-9]+([eE][+-]?\d+)?$").unwrap());

/// Base type a user-defined value type (and its constraints) builds on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    Text,
    Integer,
    Decimal,
}

impl BaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Text => "text",
            BaseType::Integer => "integer",
            BaseType::Decimal => "decimal",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "text" => Some(BaseType::Text),
            "integer" => Some(BaseType::Integer),
            "decimal" => Some(BaseType::Decimal),
            _ => None,
        }
    }

    /// Whether a raw cell value parses under this base type.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            BaseType::Text => true,
            BaseType::Integer => parse_number(value).map_or(false, |n| n == n.trunc()),
            BaseType::Decimal => parse_number(value).is_some(),
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column type produced by the inference scan. `Unknown` means the scan
/// ended before the column saw a single value; callers must resolve it
/// explicitly instead of defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Unknown,
    Text,
    Integer,
    Decimal,
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Unknown => "unknown",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Decimal => "decimal",
            ColumnType::Boolean => "boolean",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "text" => Some(ColumnType::Text),
            "integer" => Some(ColumnType::Integer),
            "decimal" => Some(ColumnType::Decimal),
            "boolean" => Some(ColumnType::Boolean),
            _ => None,
        }
    }

    /// Whether a cell value matches this column type. Empty values are only
    /// legal under `text`.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ColumnType::Unknown => false,
            ColumnType::Text => true,
            ColumnType::Integer => BaseType::Integer.accepts(value),
            ColumnType::Decimal => BaseType::Decimal.accepts(value),
            ColumnType::Boolean => {
                let lower = value.to_lowercase();
                lower == "true" || lower == "false"
            }
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names reserved by the built-in column types.
pub const BUILTIN_TYPE_NAMES: [&str; 4] = ["text", "integer", "decimal", "boolean"];

/// A user-defined semantic type: a base type narrowed by named constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueType {
    pub name: String,
    pub base: BaseType,
    /// Names of constraints attached to this type, in declaration order.
    /// All referenced constraints share `base`.
    pub constraints: Vec<String>,
}

/// Parse a numeric cell value, accepting `,` as decimal separator.
pub fn parse_number(value: &str) -> Option<f64> {
    if !NUMERIC_PATTERN.is_match(value) {
        return None;
    }
    value.replace(',', ".").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_pattern_accepts_variants() {
        for v in ["1", "-2", "+3", "2.5", "3,5", "1e3", "-1.5E-2", ".5"] {
            assert!(NUMERIC_PATTERN.is_match(v), "expected numeric: {}", v);
        }
        for v in ["", "abc", "1.2.3", "--1", "1e", "true"] {
            assert!(!NUMERIC_PATTERN.is_match(v), "expected non-numeric: {}", v);
        }
    }

    #[test]
    fn test_base_type_accepts() {
        assert!(BaseType::Integer.accepts("42"));
        assert!(!BaseType::Integer.accepts("2.5"));
        assert!(BaseType::Decimal.accepts("2.5"));
        assert!(BaseType::Decimal.accepts("3,5"));
        assert!(!BaseType::Decimal.accepts("x"));
        assert!(BaseType::Text.accepts(""));
    }

    #[test]
    fn test_column_type_boolean() {
        assert!(ColumnType::Boolean.accepts("true"));
        assert!(ColumnType::Boolean.accepts("FALSE"));
        assert!(!ColumnType::Boolean.accepts("1"));
        assert!(!ColumnType::Integer.accepts(""));
    }
}
