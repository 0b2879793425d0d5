// ============================================================
// CONSTRAINTS
// ============================================================
// Named predicates restricting values of a base type

use super::error::{AppError, Result};
use super::value_type::BaseType;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind-specific parameters of a constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConstraintRule {
    Allowlist { values: Vec<String> },
    Denylist { values: Vec<String> },
    Length { min: u64, max: u64 },
    Range { min: f64, max: f64 },
    Regex { pattern: String },
}

impl ConstraintRule {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstraintRule::Allowlist { .. } => "Allowlist",
            ConstraintRule::Denylist { .. } => "Denylist",
            ConstraintRule::Length { .. } => "Length",
            ConstraintRule::Range { .. } => "Range",
            ConstraintRule::Regex { .. } => "Regex",
        }
    }
}

/// A named predicate over values of one base type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub base: BaseType,
    pub rule: ConstraintRule,
}

impl Constraint {
    /// Validate the constraint parameters at creation time. Nothing is
    /// created on error; the message is user-facing.
    pub fn new(name: String, base: BaseType, rule: ConstraintRule) -> Result<Self> {
        match (&rule, base) {
            (ConstraintRule::Allowlist { values }, BaseType::Text)
            | (ConstraintRule::Denylist { values }, BaseType::Text) => {
                if values.is_empty() || values.iter().all(|v| v.trim().is_empty()) {
                    return Err(AppError::ValidationError(
                        "The value list must contain at least one value.".to_string(),
                    ));
                }
            }
            (ConstraintRule::Length { min, max }, BaseType::Text) => {
                if min > max {
                    return Err(AppError::ValidationError(
                        "Max length must be greater than or equal to min length.".to_string(),
                    ));
                }
            }
            (ConstraintRule::Range { min, max }, BaseType::Integer)
            | (ConstraintRule::Range { min, max }, BaseType::Decimal) => {
                if min.is_nan() || max.is_nan() {
                    return Err(AppError::ValidationError(
                        "Lower bound and upper bound must be numbers.".to_string(),
                    ));
                }
                if base == BaseType::Integer && (min.fract() != 0.0 || max.fract() != 0.0) {
                    return Err(AppError::ValidationError(
                        "Lower bound and upper bound must be integers.".to_string(),
                    ));
                }
                if max < min {
                    return Err(AppError::ValidationError(
                        "Upper bound must be greater than or equal to lower bound.".to_string(),
                    ));
                }
            }
            (ConstraintRule::Regex { pattern }, BaseType::Text) => {
                if Regex::new(pattern).is_err() {
                    return Err(AppError::ValidationError("Invalid regex.".to_string()));
                }
            }
            _ => {
                return Err(AppError::ValidationError(format!(
                    "A {} constraint cannot be built on base type {}.",
                    rule.kind_name(),
                    base
                )));
            }
        }
        Ok(Self { name, base, rule })
    }

    /// Whether `value` satisfies this constraint. The base-type parse is
    /// checked separately by the registry.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.rule {
            ConstraintRule::Allowlist { values } => values.iter().any(|v| v == value),
            ConstraintRule::Denylist { values } => !values.iter().any(|v| v == value),
            ConstraintRule::Length { min, max } => {
                let len = value.trim().chars().count() as u64;
                len >= *min && len <= *max
            }
            ConstraintRule::Range { min, max } => {
                match crate::domain::value_type::parse_number(value) {
                    Some(n) => n >= *min && n <= *max,
                    None => false,
                }
            }
            // Patterns are validated at creation; a broken pattern here would
            // mean the constraint bypassed `new`.
            ConstraintRule::Regex { pattern } => Regex::new(pattern)
                .map(|re| re.is_match(value))
                .unwrap_or(false),
        }
    }

    /// Split a comma-separated literal list the way the creation dialog
    /// collects allow/deny values.
    pub fn parse_value_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_constraint_bounds_inclusive() {
        let c = Constraint::new(
            "Short".into(),
            BaseType::Text,
            ConstraintRule::Length { min: 3, max: 5 },
        )
        .unwrap();
        assert!(!c.accepts("ab"));
        assert!(c.accepts("abc"));
        assert!(c.accepts("abcd"));
        assert!(c.accepts("abcde"));
        assert!(!c.accepts("abcdef"));
    }

    #[test]
    fn test_regex_constraint() {
        let c = Constraint::new(
            "Upper".into(),
            BaseType::Text,
            ConstraintRule::Regex {
                pattern: "^[A-Z]+$".into(),
            },
        )
        .unwrap();
        assert!(c.accepts("ABC"));
        assert!(!c.accepts("abc"));
        assert!(!c.accepts(""));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = Constraint::new(
            "Broken".into(),
            BaseType::Text,
            ConstraintRule::Regex {
                pattern: "[".into(),
            },
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_range_requires_whole_numbers_for_integer_base() {
        let err = Constraint::new(
            "R".into(),
            BaseType::Integer,
            ConstraintRule::Range { min: 0.5, max: 2.0 },
        );
        assert!(err.is_err());

        let ok = Constraint::new(
            "R".into(),
            BaseType::Decimal,
            ConstraintRule::Range { min: 0.5, max: 2.0 },
        )
        .unwrap();
        assert!(ok.accepts("1,5"));
        assert!(!ok.accepts("2.5"));
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let err = Constraint::new(
            "R".into(),
            BaseType::Decimal,
            ConstraintRule::Range { min: 5.0, max: 1.0 },
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_allow_and_deny_lists() {
        let allow = Constraint::new(
            "Units".into(),
            BaseType::Text,
            ConstraintRule::Allowlist {
                values: Constraint::parse_value_list("ms, ns"),
            },
        )
        .unwrap();
        assert!(allow.accepts("ms"));
        assert!(!allow.accepts("s"));

        let deny = Constraint::new(
            "NoNull".into(),
            BaseType::Text,
            ConstraintRule::Denylist {
                values: vec!["null".into()],
            },
        )
        .unwrap();
        assert!(deny.accepts("ms"));
        assert!(!deny.accepts("null"));
    }

    #[test]
    fn test_text_constraint_on_numeric_base_rejected() {
        let err = Constraint::new(
            "L".into(),
            BaseType::Integer,
            ConstraintRule::Length { min: 0, max: 3 },
        );
        assert!(err.is_err());
    }
}
