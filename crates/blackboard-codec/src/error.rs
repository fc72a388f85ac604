/// Errors reported by the text codec.
///
/// Every failure is recoverable; the caller decides whether to retry or
/// reject the value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// NaN and infinities have no text form.
    #[error("cannot serialize non-finite value {0}")]
    NonFinite(f64),

    /// A token did not parse as the expected scalar type.
    #[error("invalid {kind} token {token:?}")]
    InvalidToken { kind: &'static str, token: String },

    /// A string value is not enclosed in double quotes.
    #[error("string is not enclosed in double quotes")]
    Unquoted,

    /// A string value contains an unescaped quote before its end.
    #[error("unescaped quote at byte {0}")]
    StrayQuote(usize),

    /// Malformed `0x` byte array.
    #[error("invalid hex byte array: {0}")]
    InvalidHex(&'static str),

    /// Malformed `MimeType=... Data=...` payload.
    #[error("invalid MIME payload: {0}")]
    InvalidMime(&'static str),

    /// The MIME data is not valid base64.
    #[error("invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The matrix header is not `<rows>x<cols>`.
    #[error("invalid matrix header {0:?}")]
    MatrixHeader(String),

    /// A matrix dimension is zero.
    #[error("matrix dimensions must be at least 1x1, got {rows}x{cols}")]
    MatrixDimensions { rows: usize, cols: usize },

    /// The number of values does not match the dimensions.
    #[error("{rows}x{cols} matrix needs {} values, found {found}", element_count(.rows, .cols))]
    MatrixShape {
        rows: usize,
        cols: usize,
        found: usize,
    },

    /// A `name={ ... }` record is malformed.
    #[error("malformed named value at byte {pos}: {reason}")]
    NamedValue { pos: usize, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, CodecError>;

fn element_count(rows: &usize, cols: &usize) -> String {
    match rows.checked_mul(*cols) {
        Some(count) => count.to_string(),
        None => format!("more than {}", usize::MAX),
    }
}
