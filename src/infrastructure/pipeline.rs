// ============================================================
// PIPELINE MATERIALIZATION
// ============================================================
// Renders the session's choices as a textual ETL pipeline script and
// runs it through the external interpreter. Re-running the regenerated
// script is how staged edits get committed.

use crate::domain::constraint::{Constraint, ConstraintRule};
use crate::domain::error::{AppError, Result};
use crate::domain::session::ImportSession;
use crate::domain::value_type::ValueType;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};

/// Outcome of one interpreter run: a single pass/fail signal plus enough
/// context to re-point the browsing view at the result.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub success: bool,
    pub directory: PathBuf,
    pub database: String,
    pub table: String,
}

/// Render the full pipeline script: extraction, decoding, comment-line
/// skip, delimiting, staged deletions, table shaping, load, then the
/// declarations for every custom value type and constraint recorded on
/// the session.
pub fn render_pipeline(session: &ImportSession) -> String {
    let name = block_name(&session.project_name);
    let mut script = String::new();
    let mut line = |text: String| {
        script.push_str(&text);
        script.push('\n');
    };

    line(format!("pipeline {}Pipeline {{", name));
    line(String::new());
    line(format!("    {}Extractor", name));
    line(format!("        -> {}TextFileInterpreter", name));
    if session.comment_lines > 0 {
        line(format!("        -> {}TextLineDeleter", name));
    }
    line(format!("        -> {}CSVInterpreter", name));
    if !session.cols_to_delete.is_empty() {
        line(format!("        -> {}ColumnDeleter", name));
    }
    if !session.rows_to_delete.is_empty() {
        line(format!("        -> {}RowDeleter", name));
    }
    line(format!("        -> {}TableInterpreter", name));
    line(format!("        -> {}Loader;", name));
    line(String::new());

    line(format!("    block {}Extractor oftype HttpExtractor {{", name));
    line(format!("        url: \"{}\";", session.url));
    line("    }".to_string());

    line(format!(
        "    block {}TextFileInterpreter oftype TextFileInterpreter {{",
        name
    ));
    line(format!("        encoding: \"{}\";", session.encoding));
    line("    }".to_string());

    if session.comment_lines > 0 {
        let lines: Vec<String> = (1..=session.comment_lines)
            .map(|l| l.to_string())
            .collect();
        line(format!(
            "    block {}TextLineDeleter oftype TextLineDeleter {{",
            name
        ));
        line(format!("        lines: [{}];", lines.join(", ")));
        line("    }".to_string());
    }

    line(format!("    block {}CSVInterpreter oftype CSVInterpreter {{", name));
    line(format!("        delimiter: \"{}\";", escape(&session.delimiter)));
    if !session.enclosing.is_empty() {
        line(format!(
            "        enclosing: '{}';",
            session.enclosing.replace('\'', "\\'")
        ));
    }
    line("    }".to_string());

    if !session.cols_to_delete.is_empty() {
        let columns: Vec<String> = session
            .cols_to_delete
            .iter()
            .map(|label| format!("column {}", label))
            .collect();
        line(format!("    block {}ColumnDeleter oftype ColumnDeleter {{", name));
        line(format!("        delete: [{}];", columns.join(", ")));
        line("    }".to_string());
    }

    if !session.rows_to_delete.is_empty() {
        let rows: Vec<String> = session
            .rows_to_delete
            .iter()
            .map(|row| format!("row {}", row))
            .collect();
        line(format!("    block {}RowDeleter oftype RowDeleter {{", name));
        line(format!("        delete: [{}];", rows.join(", ")));
        line("    }".to_string());
    }

    let columns: Vec<String> = session
        .header
        .iter()
        .zip(session.value_types.iter())
        .map(|(header, value_type)| format!("\"{}\" oftype {}", header, value_type))
        .collect();
    line(format!(
        "    block {}TableInterpreter oftype TableInterpreter {{",
        name
    ));
    line("        header: true;".to_string());
    line("        columns: [".to_string());
    line(format!("            {}", columns.join(",\n            ")));
    line("        ];".to_string());
    line("    }".to_string());

    line(format!("    block {}Loader oftype SQLiteLoader {{", name));
    line(format!("        table: \"{}\";", session.table));
    line(format!("        file: \"./{}\";", session.database));
    line("    }".to_string());
    line("}".to_string());

    for value_type in &session.created_value_types {
        script.push('\n');
        script.push_str(&render_value_type(value_type));
    }
    for constraint in &session.created_constraints {
        script.push('\n');
        script.push_str(&render_constraint(constraint));
    }
    script
}

fn render_value_type(value_type: &ValueType) -> String {
    format!(
        "valuetype {} oftype {} {{\n    constraints: [{}];\n}}\n",
        value_type.name,
        value_type.base,
        value_type.constraints.join(", ")
    )
}

fn render_constraint(constraint: &Constraint) -> String {
    let body = match &constraint.rule {
        ConstraintRule::Allowlist { values } => format!(
            "oftype AllowlistConstraint {{\n    allowlist: [{}];\n}}",
            quote_list(values)
        ),
        ConstraintRule::Denylist { values } => format!(
            "oftype DenylistConstraint {{\n    denylist: [{}];\n}}",
            quote_list(values)
        ),
        ConstraintRule::Length { min, max } => format!(
            "oftype LengthConstraint {{\n    minLength: {};\n    maxLength: {};\n}}",
            min, max
        ),
        ConstraintRule::Range { min, max } => format!(
            "oftype RangeConstraint {{\n    lowerBound: {};\n    upperBound: {};\n}}",
            min, max
        ),
        ConstraintRule::Regex { pattern } => {
            format!("oftype RegexConstraint {{\n    regex: /{}/;\n}}", pattern)
        }
    };
    format!("constraint {} {}\n", constraint.name, body)
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", escape(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\t', "\\t")
}

/// Pipeline identifiers allow letters, digits and underscores only.
fn block_name(project_name: &str) -> String {
    let cleaned: String = project_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "Import".to_string(),
    }
}

/// Write the script into the project directory and run the external
/// interpreter on it. An interpreter exit failure is reported through
/// `success`, not an error; staged edits stay staged so the user can retry.
pub async fn run_pipeline(
    interpreter: &str,
    directory: &Path,
    session: &ImportSession,
) -> Result<PipelineRun> {
    let script = render_pipeline(session);
    let script_path = directory.join(format!("{}.jv", session.project_name));
    super::storage::write_text(&script_path, &script).await?;

    let status = Command::new(interpreter)
        .arg(&script_path)
        .current_dir(directory)
        .status()
        .await
        .map_err(|e| AppError::PipelineError(format!("Could not start \"{}\": {}", interpreter, e)))?;

    let run = PipelineRun {
        success: status.success(),
        directory: directory.to_path_buf(),
        database: session.database.clone(),
        table: session.table.clone(),
    };
    if run.success {
        info!(table = %run.table, database = %run.database, "pipeline run succeeded");
    } else {
        error!(code = ?status.code(), "pipeline run failed");
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_type::{BaseType, ValueType};

    fn sample_session() -> ImportSession {
        let mut session = ImportSession::new();
        session.project_name = "trees".into();
        session.url = "https://example.org/trees.csv".into();
        session.encoding = "utf8".into();
        session.comment_lines = 2;
        session.delimiter = ",".into();
        session.enclosing = "\"".into();
        session.header = vec!["name".into(), "height".into()];
        session.value_types = vec!["text".into(), "integer".into()];
        session.database = "trees.sqlite".into();
        session.table = "trees".into();
        session
    }

    #[test]
    fn test_block_order() {
        let mut session = sample_session();
        session.cols_to_delete = vec!["B".into()];
        session.rows_to_delete = vec![3];
        let script = render_pipeline(&session);

        let order = [
            "TreesExtractor oftype HttpExtractor",
            "TreesTextFileInterpreter oftype TextFileInterpreter",
            "TreesTextLineDeleter oftype TextLineDeleter",
            "TreesCSVInterpreter oftype CSVInterpreter",
            "TreesColumnDeleter oftype ColumnDeleter",
            "TreesRowDeleter oftype RowDeleter",
            "TreesTableInterpreter oftype TableInterpreter",
            "TreesLoader oftype SQLiteLoader",
        ];
        let mut last = 0;
        for block in order {
            let position = script.find(block).unwrap_or_else(|| panic!("missing {}", block));
            assert!(position > last, "{} out of order", block);
            last = position;
        }
        assert!(script.contains("lines: [1, 2];"));
        assert!(script.contains("delete: [column B];"));
        assert!(script.contains("delete: [row 3];"));
        assert!(script.contains("\"name\" oftype text"));
        assert!(script.contains("\"height\" oftype integer"));
    }

    #[test]
    fn test_optional_blocks_are_omitted() {
        let mut session = sample_session();
        session.comment_lines = 0;
        session.enclosing = String::new();
        let script = render_pipeline(&session);
        assert!(!script.contains("TextLineDeleter"));
        assert!(!script.contains("enclosing:"));
        assert!(!script.contains("ColumnDeleter"));
        assert!(!script.contains("RowDeleter"));
    }

    #[test]
    fn test_custom_declarations_follow_pipeline() {
        let mut session = sample_session();
        session.created_constraints = vec![Constraint::new(
            "Short".into(),
            BaseType::Text,
            ConstraintRule::Length { min: 1, max: 5 },
        )
        .unwrap()];
        session.created_value_types = vec![ValueType {
            name: "ShortText".into(),
            base: BaseType::Text,
            constraints: vec!["Short".into()],
        }];

        let script = render_pipeline(&session);
        let pipeline_end = script.find("\n}").unwrap();
        let valuetype = script.find("valuetype ShortText oftype text").unwrap();
        let constraint = script.find("constraint Short oftype LengthConstraint").unwrap();
        assert!(valuetype > pipeline_end);
        assert!(constraint > pipeline_end);
        assert!(script.contains("minLength: 1;"));
        assert!(script.contains("maxLength: 5;"));
    }

    #[test]
    fn test_tab_delimiter_is_escaped() {
        let mut session = sample_session();
        session.delimiter = "\t".into();
        let script = render_pipeline(&session);
        assert!(script.contains("delimiter: \"\\t\";"));
    }

    #[test]
    fn test_block_name_sanitization() {
        assert_eq!(block_name("trees_2024(v2)"), "Trees_2024v2");
        assert_eq!(block_name(""), "Import");
    }
}
