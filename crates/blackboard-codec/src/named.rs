//! `name={body}` records used to compose structured values.
//!
//! Bodies may nest further records (`pose={x={1} y={2}}`). Braces inside
//! double-quoted strings are not counted, so a body can carry an encoded
//! string such as `label={"a } b"}`.

use crate::error::{CodecError, Result};

/// One extracted `name={body}` record, borrowing from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedValue<'a> {
    pub name: &'a str,
    pub body: &'a str,
}

/// Extract the record starting at `*cursor`, skipping leading whitespace.
///
/// On success `*cursor` points just past the closing brace. Returns
/// `Ok(None)` when only whitespace remains. On failure the cursor is left
/// where it was.
pub fn extract_named_value<'a>(
    text: &'a str,
    cursor: &mut usize,
) -> Result<Option<NamedValue<'a>>> {
    let bytes = text.as_bytes();
    let mut pos = (*cursor).min(bytes.len());
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if pos == bytes.len() {
        *cursor = pos;
        return Ok(None);
    }

    let name_start = pos;
    while pos < bytes.len() && bytes[pos] != b'=' {
        if !is_name_byte(bytes[pos]) {
            return Err(malformed(pos, "invalid character in name"));
        }
        pos += 1;
    }
    if pos == name_start {
        return Err(malformed(pos, "empty name"));
    }
    if pos == bytes.len() {
        return Err(malformed(pos, "missing '='"));
    }
    let name_end = pos;
    pos += 1;

    if bytes.get(pos) != Some(&b'{') {
        return Err(malformed(pos, "expected '{' after '='"));
    }
    let body_start = pos + 1;
    let close = find_closing_brace(bytes, body_start)?;

    *cursor = close + 1;
    Ok(Some(NamedValue {
        name: &text[name_start..name_end],
        body: &text[body_start..close],
    }))
}

/// Extract every record in `text`, in order.
pub fn parse_named_values(text: &str) -> Result<Vec<NamedValue<'_>>> {
    let mut cursor = 0;
    let mut values = Vec::new();
    while let Some(value) = extract_named_value(text, &mut cursor)? {
        values.push(value);
    }
    Ok(values)
}

/// Append `name={body}` to `out`, separated from any previous record by a
/// space.
///
/// Fails if `name` is not a valid record name or `body` would not extract
/// back unchanged (unbalanced braces or an unterminated string).
pub fn write_named_value(out: &mut String, name: &str, body: &str) -> Result<()> {
    if name.is_empty() {
        return Err(malformed(0, "empty name"));
    }
    if let Some(pos) = name.bytes().position(|b| !is_name_byte(b)) {
        return Err(malformed(pos, "invalid character in name"));
    }
    check_body(body)?;

    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(name);
    out.push_str("={");
    out.push_str(body);
    out.push('}');
    Ok(())
}

fn is_name_byte(byte: u8) -> bool {
    !(byte.is_ascii_whitespace() || matches!(byte, b'{' | b'}' | b'"' | b'='))
}

/// Where a brace scan starting at depth 1 stopped.
enum Scan {
    /// The `}` that brought the depth back to zero.
    Closed(usize),
    /// Input ran out first.
    End { depth: usize, in_string: bool },
}

fn scan_body(bytes: &[u8], start: usize) -> Scan {
    let mut depth = 1usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Scan::Closed(start + offset);
                }
            }
            _ => {}
        }
    }
    Scan::End { depth, in_string }
}

fn find_closing_brace(bytes: &[u8], start: usize) -> Result<usize> {
    match scan_body(bytes, start) {
        Scan::Closed(pos) => Ok(pos),
        Scan::End { in_string: true, .. } => Err(malformed(bytes.len(), "unterminated string")),
        Scan::End { .. } => Err(malformed(bytes.len(), "unbalanced braces")),
    }
}

/// A body is writable when scanning it leaves exactly the opening brace open.
fn check_body(body: &str) -> Result<()> {
    match scan_body(body.as_bytes(), 0) {
        Scan::End {
            depth: 1,
            in_string: false,
        } => Ok(()),
        Scan::End { in_string: true, .. } => Err(malformed(body.len(), "unterminated string")),
        Scan::Closed(pos) => Err(malformed(pos, "unbalanced braces")),
        Scan::End { .. } => Err(malformed(body.len(), "unbalanced braces")),
    }
}

fn malformed(pos: usize, reason: &'static str) -> CodecError {
    CodecError::NamedValue { pos, reason }
}
