// ============================================================
// IMPORT FLOW
// ============================================================
// The stage sequence for one import: encoding -> structure ->
// delimiter -> enclosing -> header -> column types. Each stage either
// decides on its own or blocks on the interaction channel.

use super::delimiter::{resolve_delimiter, resolve_enclosing, split_line};
use super::encoding::{decode_text, resolve_encoding};
use super::header::{detect_header, resolve_duplicates, synthesize_headers};
use super::structure_scan::{body_lines, scan_structure};
use super::type_inference::infer_column_types;
use crate::domain::error::{AppError, Result};
use crate::domain::session::ImportSession;
use crate::domain::value_type::{ColumnType, BUILTIN_TYPE_NAMES};
use crate::interfaces::interaction::{require_answer, InputRequest, Interaction};
use tracing::info;

/// Everything the inference pipeline worked out about the file, beyond what
/// lands on the session itself.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOutcome {
    /// Extracted preamble text, written out as a side file by the caller.
    pub preamble: String,
    /// The raw first data line (after preamble and any header line), shown
    /// to the user while confirming choices.
    pub raw_first_line: String,
    /// True when a header line was detected (rather than synthesized).
    pub header_detected: bool,
    /// Parsed data rows, header excluded.
    pub rows: Vec<Vec<String>>,
}

/// Run every inference stage in order, populating `session` as each stage
/// completes. Stages that cannot decide block on `interaction`; the flow
/// resumes deterministically on exactly one answer per prompt.
pub async fn run_inference(
    session: &mut ImportSession,
    bytes: &[u8],
    interaction: &dyn Interaction,
) -> Result<InferenceOutcome> {
    // encoding first, everything downstream needs line boundaries
    session.encoding = resolve_encoding(bytes, interaction).await?;
    let text = decode_text(bytes, &session.encoding)?;

    let scan = scan_structure(&text);
    if scan.entirely_preamble {
        interaction
            .show(
                "The file contains only comments or blank lines and cannot be imported.",
                true,
            )
            .await;
        return Err(AppError::InvalidSource(
            "File consists entirely of comment lines".to_string(),
        ));
    }
    session.comment_lines = scan.preamble_lines;
    let first_line = scan.first_data_line.clone().unwrap_or_default();

    session.delimiter = resolve_delimiter(&first_line, interaction).await?;
    session.enclosing = resolve_enclosing(&first_line, &session.delimiter, interaction).await?;

    let detection = detect_header(&first_line, &session.delimiter, &session.enclosing);
    let header_detected = detection.header.is_some();
    let header = match detection.header {
        Some(fields) => fields,
        None => synthesize_headers(detection.column_count),
    };
    session.header = resolve_duplicates(&header);

    let data_skip = if header_detected { 1 } else { 0 };
    let raw_first_line = body_lines(&text, scan.preamble_lines)
        .skip(data_skip)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string();
    // Cells keep their raw text apart from outer whitespace; the type scan
    // does its own normalization.
    let rows: Vec<Vec<String>> = body_lines(&text, scan.preamble_lines)
        .skip(data_skip)
        .filter(|line| !line.is_empty())
        .map(|line| {
            split_line(line, &session.delimiter, &session.enclosing)
                .into_iter()
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect();

    let inference = infer_column_types(&rows, session.header.len());
    let mut type_names = Vec::with_capacity(inference.types.len());
    for (index, column_type) in inference.types.iter().enumerate() {
        let name = match column_type {
            ColumnType::Unknown => {
                resolve_unknown_column(&session.header[index], interaction).await?
            }
            resolved => resolved.as_str().to_string(),
        };
        type_names.push(name);
    }
    session.value_types = type_names;

    info!(
        encoding = %session.encoding,
        comment_lines = session.comment_lines,
        delimiter = %session.delimiter.escape_debug(),
        columns = session.header.len(),
        rows = rows.len(),
        header_detected,
        "inference complete"
    );

    Ok(InferenceOutcome {
        preamble: scan.preamble,
        raw_first_line,
        header_detected,
        rows,
    })
}

/// A column whose type could not be inferred is resolved by the user from
/// the built-in types; the loop repeats until the answer is one of them.
async fn resolve_unknown_column(
    column_name: &str,
    interaction: &dyn Interaction,
) -> Result<String> {
    interaction
        .show(
            &format!(
                "The type of column \"{}\" could not be inferred. Please choose one.",
                column_name
            ),
            true,
        )
        .await;
    loop {
        let options = BUILTIN_TYPE_NAMES.iter().map(|n| n.to_string()).collect();
        let answer = require_answer(interaction, InputRequest::choice("column_type", options)).await?;
        if BUILTIN_TYPE_NAMES.contains(&answer.as_str()) {
            return Ok(answer);
        }
        interaction
            .show(&format!("\"{}\" is not a valid type.", answer), true)
            .await;
    }
}
