// ============================================================
// STRUCTURE SCANNER
// ============================================================
// Classifies leading comment/blank lines so later stages know where
// the data starts

/// Markers that open a comment line. Checked in order against the trimmed
/// start of each line.
pub const COMMENT_MARKERS: [&str; 8] = ["#", "//", ";", "--", "/*", "!", "%", "["];

/// Result of the preamble scan over decoded file text.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureScan {
    /// Number of leading lines every downstream stage must skip.
    pub preamble_lines: usize,
    /// The extracted preamble text, line breaks preserved.
    pub preamble: String,
    /// First line that is not blank and carries no comment marker.
    pub first_data_line: Option<String>,
    /// The whole file is comments/blank lines. Callers must escalate to the
    /// user instead of producing an empty table.
    pub entirely_preamble: bool,
}

fn is_preamble_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return true;
    }
    COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m))
}

/// Single pass over the decoded text: a maximal prefix of blank or
/// comment-marked lines is the preamble; scanning stops at the first line
/// matching neither.
pub fn scan_structure(text: &str) -> StructureScan {
    let mut preamble_lines = 0;
    let mut preamble = String::new();
    let mut first_data_line = None;

    for line in text.lines() {
        if is_preamble_line(line) {
            preamble_lines += 1;
            preamble.push_str(line);
            preamble.push('\n');
        } else {
            first_data_line = Some(line.to_string());
            break;
        }
    }

    StructureScan {
        preamble_lines,
        preamble,
        entirely_preamble: first_data_line.is_none(),
        first_data_line,
    }
}

/// Data lines after the preamble, header line included when present.
pub fn body_lines(text: &str, preamble_lines: usize) -> impl Iterator<Item = &str> {
    text.lines().skip(preamble_lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_preamble() {
        let scan = scan_structure("a,b,c\n1,2,3\n");
        assert_eq!(scan.preamble_lines, 0);
        assert_eq!(scan.preamble, "");
        assert_eq!(scan.first_data_line.as_deref(), Some("a,b,c"));
        assert!(!scan.entirely_preamble);
    }

    #[test]
    fn test_mixed_markers_and_blanks() {
        let text = "# exported 2024\n// by tool\n\n-- note\n[meta]\nname,size\n1,2\n";
        let scan = scan_structure(text);
        assert_eq!(scan.preamble_lines, 5);
        assert!(scan.preamble.contains("exported"));
        assert!(scan.preamble.contains("[meta]"));
        assert_eq!(scan.first_data_line.as_deref(), Some("name,size"));
    }

    #[test]
    fn test_marker_after_indentation() {
        let scan = scan_structure("   ; indented comment\nx;y\n");
        assert_eq!(scan.preamble_lines, 1);
        assert_eq!(scan.first_data_line.as_deref(), Some("x;y"));
    }

    #[test]
    fn test_entirely_preamble_file() {
        let scan = scan_structure("# one\n# two\n\n");
        assert_eq!(scan.preamble_lines, 3);
        assert!(scan.entirely_preamble);
        assert!(scan.first_data_line.is_none());
    }

    #[test]
    fn test_body_lines_skip_preamble() {
        let text = "# c\nh1,h2\n1,2\n";
        let scan = scan_structure(text);
        let body: Vec<&str> = body_lines(text, scan.preamble_lines).collect();
        assert_eq!(body, vec!["h1,h2", "1,2"]);
    }
}
