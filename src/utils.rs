/// Converts a 1-based line and column, as reported by `serde_json` errors, into a byte offset
/// in the source text. Positions past the end of a line or of the text are clamped, so the
/// result is always a valid offset for a `SourceSpan`.
pub fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return source.len();
    }
    let mut line_start = 0;
    for (current, text) in source.split_inclusive('\n').enumerate() {
        if current + 1 == line {
            let line_len = text.trim_end_matches('\n').len();
            return line_start + column.saturating_sub(1).min(line_len);
        }
        line_start += text.len();
    }
    source.len()
}

/// Strips one pair of enclosing square brackets from a serialized JSON array.
pub fn strip_brackets(serialized: &str) -> &str {
    serialized
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(serialized)
}
