// ============================================================
// STAGED ACTIONS
// ============================================================
// Reversible, not-yet-committed table edits tracked for undo/redo

use serde::{Deserialize, Serialize};

/// Stable identifier of a table row (the SQLite rowid).
pub type RowId = i64;

/// A reversible edit staged against the materialized table. Nothing is
/// persisted until the staged set is committed by regenerating and running
/// the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StagedAction {
    DeleteColumn {
        column: usize,
        name: String,
    },
    DeleteRow {
        row: RowId,
    },
    RenameHeader {
        column: usize,
        old: String,
        new: String,
    },
    ChangeValueType {
        column: usize,
        old: String,
        new: String,
    },
}

/// Spreadsheet-style column label: 0 -> "A", 25 -> "Z", 26 -> "AA".
/// Used by the pipeline script to address columns independent of header text.
pub fn column_label(index: usize) -> String {
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut label = String::new();
    let mut i = index as i64;
    while i >= 0 {
        label.insert(0, LETTERS[(i % 26) as usize] as char);
        i = i / 26 - 1;
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_labels() {
        assert_eq!(column_label(0), "A");
        assert_eq!(column_label(1), "B");
        assert_eq!(column_label(25), "Z");
        assert_eq!(column_label(26), "AA");
        assert_eq!(column_label(27), "AB");
        assert_eq!(column_label(52), "BA");
    }
}
