// ============================================================
// COLUMN TYPE INFERENCER
// ============================================================
// Streaming per-column type unification: unknown narrows toward text,
// text is terminal

use crate::domain::value_type::{parse_number, ColumnType};
use tracing::warn;

/// Result of the type scan. A column left `Unknown` saw no values at all and
/// must be resolved explicitly by the caller, never defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInference {
    pub types: Vec<ColumnType>,
    /// Columns pinned to text because an empty value was seen; one warning
    /// per column.
    pub empty_value_columns: Vec<usize>,
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_cell(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unify(current: ColumnType, value: &str) -> ColumnType {
    let lower = value.to_lowercase();
    if lower == "true" || lower == "false" {
        // A prior numeric classification conflicts with a boolean.
        return match current {
            ColumnType::Integer | ColumnType::Decimal => ColumnType::Text,
            _ => ColumnType::Boolean,
        };
    }
    if let Some(parsed) = parse_number(value) {
        if current == ColumnType::Boolean {
            return ColumnType::Text;
        }
        if parsed == parsed.trunc() {
            // decimal is stickier than integer
            return match current {
                ColumnType::Decimal => ColumnType::Decimal,
                _ => ColumnType::Integer,
            };
        }
        return ColumnType::Decimal;
    }
    ColumnType::Text
}

/// Scan data rows and unify one type per column. Text is terminal: a column
/// pinned to text is skipped for the rest of the scan, and the whole scan
/// stops once every column is pinned. The last unpinned column keeps being
/// scanned to the end of the input so it cannot silently stay unresolved.
pub fn infer_column_types<I, R>(rows: I, column_count: usize) -> TypeInference
where
    I: IntoIterator<Item = R>,
    R: AsRef<[String]>,
{
    let mut types = vec![ColumnType::Unknown; column_count];
    let mut empty_value_columns = Vec::new();
    let mut pinned = 0;

    for row in rows {
        if pinned == column_count {
            break;
        }
        let row = row.as_ref();
        for (index, accumulator) in types.iter_mut().enumerate() {
            if *accumulator == ColumnType::Text {
                continue;
            }
            // A ragged row simply has no value for this column.
            let Some(raw) = row.get(index) else {
                continue;
            };
            let value = normalize_cell(raw);
            let next = if value.is_empty() {
                if !empty_value_columns.contains(&index) {
                    warn!(column = index, "empty value pins column to text");
                    empty_value_columns.push(index);
                }
                ColumnType::Text
            } else {
                unify(*accumulator, &value)
            };
            if next == ColumnType::Text {
                pinned += 1;
            }
            *accumulator = next;
        }
    }

    TypeInference {
        types,
        empty_value_columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_integer_column() {
        let result = infer_column_types(rows(&[&["1"], &["2"], &["3"]]), 1);
        assert_eq!(result.types, vec![ColumnType::Integer]);
    }

    #[test]
    fn test_one_fractional_value_forces_decimal() {
        let result = infer_column_types(rows(&[&["1"], &["2.5"], &["3"]]), 1);
        assert_eq!(result.types, vec![ColumnType::Decimal]);
    }

    #[test]
    fn test_comma_decimal_separator() {
        let result = infer_column_types(rows(&[&["1,5"]]), 1);
        assert_eq!(result.types, vec![ColumnType::Decimal]);
    }

    #[test]
    fn test_boolean_column_case_insensitive() {
        let result = infer_column_types(rows(&[&["true"], &["FALSE"]]), 1);
        assert_eq!(result.types, vec![ColumnType::Boolean]);
    }

    #[test]
    fn test_boolean_numeric_conflict_forces_text() {
        let result = infer_column_types(rows(&[&["true"], &["1"]]), 1);
        assert_eq!(result.types, vec![ColumnType::Text]);

        let result = infer_column_types(rows(&[&["1"], &["true"]]), 1);
        assert_eq!(result.types, vec![ColumnType::Text]);
    }

    #[test]
    fn test_text_is_terminal() {
        let result = infer_column_types(rows(&[&["oak"], &["1"], &["true"], &["2.5"]]), 1);
        assert_eq!(result.types, vec![ColumnType::Text]);
    }

    #[test]
    fn test_empty_value_pins_text_with_warning() {
        let result = infer_column_types(rows(&[&["1", ""], &["2", "3"]]), 2);
        assert_eq!(result.types, vec![ColumnType::Integer, ColumnType::Text]);
        assert_eq!(result.empty_value_columns, vec![1]);
    }

    #[test]
    fn test_last_unpinned_column_is_scanned_to_the_end() {
        // first column pins to text on row 1; second column must still see
        // the fractional value on the last row
        let result = infer_column_types(rows(&[&["x", "1"], &["y", "2"], &["z", "2.5"]]), 2);
        assert_eq!(result.types, vec![ColumnType::Text, ColumnType::Decimal]);
    }

    #[test]
    fn test_whitespace_normalization() {
        let result = infer_column_types(rows(&[&["  42  "]]), 1);
        assert_eq!(result.types, vec![ColumnType::Integer]);
    }

    #[test]
    fn test_no_rows_leaves_unknown() {
        let result = infer_column_types(rows(&[]), 2);
        assert_eq!(result.types, vec![ColumnType::Unknown, ColumnType::Unknown]);
    }

    #[test]
    fn test_ragged_row_leaves_missing_column_untouched() {
        // the short row has no cell for column 1 at all; only the long row
        // contributes to it
        let result = infer_column_types(rows(&[&["1"], &["2", "3"]]), 2);
        assert_eq!(result.types, vec![ColumnType::Integer, ColumnType::Integer]);
        assert!(result.empty_value_columns.is_empty());

        let result = infer_column_types(rows(&[&["1"]]), 2);
        assert_eq!(result.types, vec![ColumnType::Integer, ColumnType::Unknown]);
        assert!(result.empty_value_columns.is_empty());
    }
}
