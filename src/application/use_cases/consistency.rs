// ============================================================
// CONSISTENCY ENGINE
// ============================================================
// Pure violation tracking over the materialized table view: per-row
// sets of violating columns, staged deletions, LIFO undo/redo

use super::registry::Registry;
use crate::domain::error::{AppError, Result};
use crate::domain::staged::{RowId, StagedAction};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Live view of the materialized table plus staged, reversible edits.
/// Nothing here touches persisted data; committing means regenerating and
/// re-running the pipeline, after which [`ConsistencyEngine::drain_staged`]
/// hands the staged set to the pipeline builder.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyEngine {
    headers: Vec<String>,
    /// Per-column selected type name, parallel to `headers`.
    types: Vec<String>,
    rows: Vec<(RowId, Vec<String>)>,
    /// row id -> columns whose rule the row currently violates
    violations: HashMap<RowId, BTreeSet<usize>>,
    deleted_columns: BTreeSet<usize>,
    deleted_rows: BTreeSet<RowId>,
    undo_stack: Vec<StagedAction>,
    redo_stack: Vec<StagedAction>,
}

impl ConsistencyEngine {
    /// Build the engine and compute the initial violation sets for every
    /// column.
    pub fn new(
        headers: Vec<String>,
        types: Vec<String>,
        rows: Vec<(RowId, Vec<String>)>,
        registry: &Registry,
    ) -> Self {
        let mut engine = Self {
            headers,
            types,
            rows,
            ..Self::default()
        };
        for column in 0..engine.headers.len() {
            engine.recompute_column(column, registry);
        }
        engine
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Re-evaluate one column's rule against every non-deleted row,
    /// O(rows) per call. Deleted columns never contribute violations.
    fn recompute_column(&mut self, column: usize, registry: &Registry) {
        if self.deleted_columns.contains(&column) {
            self.clear_column(column);
            return;
        }
        let type_name = match self.types.get(column) {
            Some(t) => t.clone(),
            None => return,
        };
        for (row_id, values) in &self.rows {
            let value = values.get(column).map(String::as_str).unwrap_or("");
            let set = self.violations.entry(*row_id).or_default();
            if registry.accepts(&type_name, value) {
                set.remove(&column);
            } else {
                set.insert(column);
            }
        }
        self.violations.retain(|_, set| !set.is_empty());
    }

    /// Drop one column from every violation set; rows whose only remaining
    /// violation was this column become valid again.
    fn clear_column(&mut self, column: usize) {
        self.violations.retain(|_, set| {
            set.remove(&column);
            !set.is_empty()
        });
    }

    fn perform(&mut self, action: &StagedAction, registry: &Registry) -> Result<()> {
        match action {
            StagedAction::DeleteColumn { column, .. } => {
                self.deleted_columns.insert(*column);
                self.clear_column(*column);
            }
            StagedAction::DeleteRow { row } => {
                self.deleted_rows.insert(*row);
            }
            StagedAction::RenameHeader { column, new, .. } => {
                let slot = self.headers.get_mut(*column).ok_or_else(|| {
                    AppError::NotFound(format!("No column at index {}", column))
                })?;
                *slot = new.clone();
            }
            StagedAction::ChangeValueType { column, new, .. } => {
                let slot = self.types.get_mut(*column).ok_or_else(|| {
                    AppError::NotFound(format!("No column at index {}", column))
                })?;
                *slot = new.clone();
                self.recompute_column(*column, registry);
            }
        }
        Ok(())
    }

    fn invert(action: &StagedAction) -> StagedAction {
        match action {
            StagedAction::DeleteColumn { .. } | StagedAction::DeleteRow { .. } => action.clone(),
            StagedAction::RenameHeader { column, old, new } => StagedAction::RenameHeader {
                column: *column,
                old: new.clone(),
                new: old.clone(),
            },
            StagedAction::ChangeValueType { column, old, new } => StagedAction::ChangeValueType {
                column: *column,
                old: new.clone(),
                new: old.clone(),
            },
        }
    }

    fn unperform(&mut self, action: &StagedAction, registry: &Registry) -> Result<()> {
        match action {
            StagedAction::DeleteColumn { column, .. } => {
                self.deleted_columns.remove(column);
                self.recompute_column(*column, registry);
                Ok(())
            }
            StagedAction::DeleteRow { row } => {
                self.deleted_rows.remove(row);
                Ok(())
            }
            rename_or_retype => self.perform(&Self::invert(rename_or_retype), registry),
        }
    }

    /// Stage a new action. Clears the redo stack: redo is only possible
    /// immediately after an undo.
    pub fn apply(&mut self, action: StagedAction, registry: &Registry) -> Result<()> {
        self.perform(&action, registry)?;
        debug!(?action, "staged action applied");
        self.undo_stack.push(action);
        self.redo_stack.clear();
        Ok(())
    }

    /// Revert the most recent staged action. Returns the reverted action, or
    /// `None` when the history is empty.
    pub fn undo(&mut self, registry: &Registry) -> Result<Option<StagedAction>> {
        let Some(action) = self.undo_stack.pop() else {
            return Ok(None);
        };
        self.unperform(&action, registry)?;
        self.redo_stack.push(action.clone());
        Ok(Some(action))
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&mut self, registry: &Registry) -> Result<Option<StagedAction>> {
        let Some(action) = self.redo_stack.pop() else {
            return Ok(None);
        };
        self.perform(&action, registry)?;
        self.undo_stack.push(action.clone());
        Ok(Some(action))
    }

    /// Columns a row currently violates. Empty set for unknown rows.
    pub fn violations_for(&self, row: RowId) -> BTreeSet<usize> {
        self.violations.get(&row).cloned().unwrap_or_default()
    }

    /// A row renders crossed out iff it is staged for deletion, or its
    /// violation set is non-empty.
    pub fn is_crossed_out(&self, row: RowId) -> bool {
        self.deleted_rows.contains(&row) || self.violations.contains_key(&row)
    }

    pub fn crossed_out_rows(&self) -> BTreeSet<RowId> {
        let mut rows: BTreeSet<RowId> = self.violations.keys().copied().collect();
        rows.extend(self.deleted_rows.iter().copied());
        rows
    }

    /// Values of one column over the rows the user actually sees: rows not
    /// staged for deletion and not crossed out. Feeds the statistics view.
    pub fn visible_column_values(&self, column: usize) -> Vec<String> {
        if self.deleted_columns.contains(&column) {
            return Vec::new();
        }
        self.rows
            .iter()
            .filter(|(row_id, _)| !self.is_crossed_out(*row_id))
            .filter_map(|(_, values)| values.get(column).cloned())
            .collect()
    }

    pub fn deleted_columns(&self) -> &BTreeSet<usize> {
        &self.deleted_columns
    }

    pub fn deleted_rows(&self) -> &BTreeSet<RowId> {
        &self.deleted_rows
    }

    pub fn staged(&self) -> &[StagedAction] {
        &self.undo_stack
    }

    /// Hand the staged history to the commit path and clear it. Committed
    /// actions are irreversible; both stacks are emptied.
    pub fn drain_staged(&mut self) -> Vec<StagedAction> {
        self.redo_stack.clear();
        std::mem::take(&mut self.undo_stack)
    }
}
