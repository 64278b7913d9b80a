//! Splitting raw OCR text into clean lines.

use super::rules::patterns::LINE_BREAKS;

/// Split on runs of CR/LF, trim each piece and drop empty ones.
pub fn normalize_lines(text: &str) -> Vec<String> {
    LINE_BREAKS
        .split(text)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
