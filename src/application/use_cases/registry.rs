// ============================================================
// CONSTRAINT / VALUE TYPE REGISTRY
// ============================================================
// User-declared custom types layered on base types, validated at
// creation and evaluated against cell values

use crate::domain::constraint::{Constraint, ConstraintRule};
use crate::domain::error::{AppError, Result};
use crate::domain::value_type::{BaseType, ColumnType, ValueType, BUILTIN_TYPE_NAMES};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// In-memory store of user-created constraints and value types for the
/// active project. Constraints are created first; value types reference
/// them by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub constraints: Vec<Constraint>,
    pub value_types: Vec<ValueType>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || !NAME_PATTERN.is_match(name) {
            return Err(AppError::ValidationError(
                "Names may only contain letters, digits and underscores.".to_string(),
            ));
        }
        if BUILTIN_TYPE_NAMES.contains(&name) {
            return Err(AppError::ValidationError(format!(
                "\"{}\" is a built-in type name.",
                name
            )));
        }
        if self.value_types.iter().any(|v| v.name == name)
            || self.constraints.iter().any(|c| c.name == name)
        {
            return Err(AppError::ValidationError(format!(
                "The name \"{}\" is already taken.",
                name
            )));
        }
        Ok(())
    }

    /// Create a constraint. Parameters are validated by kind; nothing is
    /// stored on error.
    pub fn create_constraint(
        &mut self,
        name: &str,
        base: BaseType,
        rule: ConstraintRule,
    ) -> Result<()> {
        self.validate_name(name)?;
        let constraint = Constraint::new(name.to_string(), base, rule)?;
        info!(name = %constraint.name, base = %base, kind = constraint.rule.kind_name(), "constraint created");
        self.constraints.push(constraint);
        Ok(())
    }

    /// Create a value type referencing zero or more existing constraints of
    /// the same base type. Returns a warning message when no constraint for
    /// that base exists yet; creation still succeeds.
    pub fn create_value_type(
        &mut self,
        name: &str,
        base: BaseType,
        constraint_names: Vec<String>,
    ) -> Result<Option<String>> {
        self.validate_name(name)?;
        for constraint_name in &constraint_names {
            let constraint = self
                .constraints
                .iter()
                .find(|c| &c.name == constraint_name)
                .ok_or_else(|| {
                    AppError::NotFound(format!("Constraint \"{}\" does not exist.", constraint_name))
                })?;
            if constraint.base != base {
                return Err(AppError::ValidationError(format!(
                    "Constraint \"{}\" has base type {}, not {}.",
                    constraint_name, constraint.base, base
                )));
            }
        }
        let warning = if constraint_names.is_empty() && self.constraints_for(base).is_empty() {
            Some(format!(
                "There is no constraint for base type {} yet. Consider creating one first.",
                base
            ))
        } else {
            None
        };
        info!(name, base = %base, constraints = constraint_names.len(), "value type created");
        self.value_types.push(ValueType {
            name: name.to_string(),
            base,
            constraints: constraint_names,
        });
        Ok(warning)
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn value_type(&self, name: &str) -> Option<&ValueType> {
        self.value_types.iter().find(|v| v.name == name)
    }

    pub fn constraints_for(&self, base: BaseType) -> Vec<&Constraint> {
        self.constraints.iter().filter(|c| c.base == base).collect()
    }

    /// Built-in names followed by custom names, the order type dropdowns use.
    pub fn type_names(&self) -> Vec<String> {
        BUILTIN_TYPE_NAMES
            .iter()
            .map(|n| n.to_string())
            .chain(self.value_types.iter().map(|v| v.name.clone()))
            .collect()
    }

    /// Whether `value` satisfies the named type: the base-type parse plus
    /// every attached constraint. Unknown type names accept nothing.
    pub fn accepts(&self, type_name: &str, value: &str) -> bool {
        if let Some(builtin) = ColumnType::parse(type_name) {
            return builtin.accepts(value);
        }
        let Some(value_type) = self.value_type(type_name) else {
            return false;
        };
        if !value_type.base.accepts(value) {
            return false;
        }
        value_type.constraints.iter().all(|name| {
            self.constraint(name)
                .map(|c| c.accepts(value))
                .unwrap_or(false)
        })
    }
}
