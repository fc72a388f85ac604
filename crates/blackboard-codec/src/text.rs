use crate::error::{CodecError, Result};

/// Literal used for an absent string.
pub const NULL_LITERAL: &str = "null";

/// Encode a string as a double-quoted literal, or `null` for `None`.
///
/// Only `\` and `"` are escaped. Strings always have a text form, so this
/// cannot fail.
pub fn serialize_string(value: Option<&str>) -> String {
    let Some(value) = value else {
        return NULL_LITERAL.to_string();
    };
    let mut out = String::with_capacity(value.len() + 2);
    push_quoted(&mut out, value);
    out
}

/// Append `value` to `out` as a double-quoted, escaped literal.
pub fn push_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// Decode a double-quoted literal, or `null`.
///
/// Surrounding whitespace is ignored. Any `\c` escape decodes to `c`.
pub fn deserialize_string(text: &str) -> Result<Option<String>> {
    let text = text.trim();
    if text == NULL_LITERAL {
        return Ok(None);
    }
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(CodecError::Unquoted)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.char_indices();
    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => out.push(escaped),
                // The closing quote was escaped, so the literal never ends.
                None => return Err(CodecError::Unquoted),
            },
            '"' => return Err(CodecError::StrayQuote(pos + 1)),
            c => out.push(c),
        }
    }
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_is_quoted() {
        assert_eq!(serialize_string(Some("hello")), "\"hello\"");
        assert_eq!(serialize_string(Some("")), "\"\"");
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(
            serialize_string(Some(r#"say "hi" \o/"#)),
            r#""say \"hi\" \\o/""#
        );
    }

    #[test]
    fn none_is_null() {
        assert_eq!(serialize_string(None), "null");
        assert_eq!(deserialize_string(" null "), Ok(None));
    }

    #[test]
    fn quoted_null_is_a_string() {
        assert_eq!(deserialize_string("\"null\""), Ok(Some("null".into())));
    }

    #[test]
    fn round_trips_awkward_content() {
        for sample in ["", "a b", "\"", "\\", "\\\"", "tab\there", "\u{e9}t\u{e9} \u{1f916}"] {
            let text = serialize_string(Some(sample));
            assert_eq!(deserialize_string(&text), Ok(Some(sample.to_string())));
        }
    }

    #[test]
    fn any_escape_decodes_to_its_character() {
        assert_eq!(deserialize_string(r#""a\nb""#), Ok(Some("anb".into())));
    }

    #[test]
    fn missing_quotes_fail() {
        assert_eq!(deserialize_string("hello"), Err(CodecError::Unquoted));
        assert_eq!(deserialize_string("\"hello"), Err(CodecError::Unquoted));
        assert_eq!(deserialize_string("hello\""), Err(CodecError::Unquoted));
        assert_eq!(deserialize_string("\""), Err(CodecError::Unquoted));
        assert_eq!(deserialize_string(""), Err(CodecError::Unquoted));
    }

    #[test]
    fn escaped_closing_quote_is_unterminated() {
        assert_eq!(deserialize_string(r#""abc\""#), Err(CodecError::Unquoted));
    }

    #[test]
    fn stray_quote_is_reported_with_position() {
        assert_eq!(
            deserialize_string(r#""ab"cd""#),
            Err(CodecError::StrayQuote(3))
        );
    }
}
