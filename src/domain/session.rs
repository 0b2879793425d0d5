// ============================================================
// IMPORT SESSION
// ============================================================
// Mutable state for one CSV import, owned and passed explicitly
// between pipeline stages. Exactly one session is active at a time.

use super::constraint::Constraint;
use super::staged::column_label;
use super::value_type::{ColumnType, ValueType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All state accumulated while importing one CSV file. Created empty at
/// import start, populated stage by stage, persisted as metadata when the
/// pipeline runs, and rebuilt from metadata when a project is reopened.
///
/// Reopening a project must go through [`ImportSession::reset`] (or a fresh
/// `new`) so no state leaks from a previous project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSession {
    pub project_name: String,
    pub directory: PathBuf,
    pub file_name: String,
    pub url: String,
    pub encoding: String,
    pub comment_lines: usize,
    pub delimiter: String,
    pub enclosing: String,
    /// Ordered column headers after duplicate resolution.
    pub header: Vec<String>,
    /// Per-column selected value type name, parallel to `header`.
    pub value_types: Vec<String>,
    /// Staged column deletions as spreadsheet labels ("A", "B", ...), stable
    /// across later deletions.
    pub cols_to_delete: Vec<String>,
    /// Staged row deletions as 1-based data row numbers (header included in
    /// the count, matching the pipeline's row addressing).
    pub rows_to_delete: Vec<i64>,
    pub created_value_types: Vec<ValueType>,
    pub created_constraints: Vec<Constraint>,
    pub database: String,
    pub table: String,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every piece of accumulated state. Equivalent to constructing a
    /// fresh session; called whenever a project is opened or closed.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Inferred or user-selected type of a column, if recorded.
    pub fn column_type(&self, index: usize) -> Option<ColumnType> {
        self.value_types
            .get(index)
            .and_then(|name| ColumnType::parse(name))
    }

    /// Stage a column deletion by index; records the stable label.
    pub fn stage_column_delete(&mut self, index: usize) {
        let label = column_label(index);
        if !self.cols_to_delete.contains(&label) {
            self.cols_to_delete.push(label);
        }
    }

    pub fn unstage_column_delete(&mut self, index: usize) {
        let label = column_label(index);
        self.cols_to_delete.retain(|l| l != &label);
    }

    pub fn stage_row_delete(&mut self, row: i64) {
        if !self.rows_to_delete.contains(&row) {
            self.rows_to_delete.push(row);
        }
    }

    pub fn unstage_row_delete(&mut self, row: i64) {
        self.rows_to_delete.retain(|r| *r != row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_everything() {
        let mut session = ImportSession::new();
        session.project_name = "trees".into();
        session.encoding = "utf8".into();
        session.header = vec!["a".into(), "b".into()];
        session.stage_column_delete(1);
        session.stage_row_delete(4);

        session.reset();
        assert!(session.project_name.is_empty());
        assert!(session.encoding.is_empty());
        assert!(session.header.is_empty());
        assert!(session.cols_to_delete.is_empty());
        assert!(session.rows_to_delete.is_empty());
    }

    #[test]
    fn test_staged_deletes_are_deduplicated_and_reversible() {
        let mut session = ImportSession::new();
        session.stage_column_delete(2);
        session.stage_column_delete(2);
        assert_eq!(session.cols_to_delete, vec!["C".to_string()]);

        session.unstage_column_delete(2);
        assert!(session.cols_to_delete.is_empty());

        session.stage_row_delete(7);
        session.stage_row_delete(7);
        assert_eq!(session.rows_to_delete, vec![7]);
        session.unstage_row_delete(7);
        assert!(session.rows_to_delete.is_empty());
    }
}
