// ============================================================
// DELIMITER / ENCLOSING INFERENCER
// ============================================================
// Frequency-based delimiter detection on the first data line, plus
// adjacency-based quote detection, both with human escalation

use crate::domain::error::Result;
use crate::interfaces::interaction::{require_answer, InputRequest, Interaction};
use tracing::info;

/// Candidate delimiters in tie-break order: at equal counts the earlier
/// candidate wins.
pub const DELIMITER_CANDIDATES: [char; 6] = [',', ';', '\t', '|', ':', ' '];

/// Characters recognized as field enclosings.
pub const ENCLOSING_CANDIDATES: [char; 2] = ['"', '\''];

/// Candidate with the strictly highest occurrence count on the sampled line,
/// or `None` when no candidate appears at all.
pub fn infer_delimiter(line: &str) -> Option<char> {
    let mut best: Option<(char, usize)> = None;
    for candidate in DELIMITER_CANDIDATES {
        let count = line.matches(candidate).count();
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((candidate, count));
        }
    }
    best.map(|(c, _)| c)
}

/// Infer the delimiter, escalating to a free-text single-character prompt
/// when no candidate occurs. Blocks until a non-empty answer arrives.
pub async fn resolve_delimiter(line: &str, interaction: &dyn Interaction) -> Result<String> {
    if let Some(delimiter) = infer_delimiter(line) {
        info!(delimiter = %delimiter.escape_debug(), "delimiter detected");
        return Ok(delimiter.to_string());
    }
    interaction
        .show(
            "The column delimiter could not be detected. Please enter it.",
            true,
        )
        .await;
    loop {
        let answer = require_answer(
            interaction,
            InputRequest::single_char("delimiter", "Delimiter character"),
        )
        .await?;
        if answer.chars().count() == 1 {
            return Ok(answer);
        }
        interaction
            .show("The delimiter must be a single character.", true)
            .await;
    }
}

/// Scan the first data line for a quote character immediately followed by the
/// delimiter; the last such observation wins. Empty string means no
/// enclosing.
pub fn infer_enclosing(line: &str, delimiter: &str) -> String {
    let delimiter = match delimiter.chars().next() {
        Some(d) => d,
        None => return String::new(),
    };
    let mut detected = String::new();
    let mut previous: Option<char> = None;
    for current in line.chars() {
        if current == delimiter {
            if let Some(prev) = previous {
                if ENCLOSING_CANDIDATES.contains(&prev) {
                    detected = prev.to_string();
                }
            }
        }
        previous = Some(current);
    }
    detected
}

fn is_valid_enclosing(enclosing: &str) -> bool {
    let mut chars = enclosing.chars();
    match (chars.next(), chars.next()) {
        (None, _) => true,
        (Some(c), None) => ENCLOSING_CANDIDATES.contains(&c),
        _ => false,
    }
}

/// Infer the enclosing character. Any result outside `{"", '"', "'"}` is
/// invalid and escalates: the user is prompted for exactly one character that
/// is not already a standard quote character.
pub async fn resolve_enclosing(
    line: &str,
    delimiter: &str,
    interaction: &dyn Interaction,
) -> Result<String> {
    let detected = infer_enclosing(line, delimiter);
    if is_valid_enclosing(&detected) {
        return Ok(detected);
    }
    interaction
        .show(
            "The enclosing character could not be determined. Please enter it.",
            true,
        )
        .await;
    loop {
        let answer = require_answer(
            interaction,
            InputRequest::Text {
                id: "enclosing".to_string(),
                placeholder: "Enclosing character".to_string(),
                allowed: Some("[^\"']".to_string()),
                max_length: Some(1),
            },
        )
        .await?;
        let mut chars = answer.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if !ENCLOSING_CANDIDATES.contains(&c) {
                return Ok(answer);
            }
        }
        interaction
            .show(
                "Please enter a single character other than \" or '.",
                true,
            )
            .await;
    }
}

/// Split one line on the delimiter, honoring the enclosing character.
/// Enclosed fields keep embedded delimiters; the enclosing itself is
/// stripped from the field value.
pub fn split_line(line: &str, delimiter: &str, enclosing: &str) -> Vec<String> {
    let delimiter = match delimiter.chars().next() {
        Some(d) => d,
        None => return vec![line.to_string()],
    };
    let enclosing = enclosing.chars().next();

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut inside = false;
    for current in line.chars() {
        if Some(current) == enclosing {
            inside = !inside;
        } else if current == delimiter && !inside {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(current);
        }
    }
    fields.push(field);
    fields
}
