use blackboard_codec::CodecError;

/// Errors that can occur handling shared variables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VariableError {
    /// The value text did not decode, or the value has no text form.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// No descriptor exists for this type name.
    #[error("unknown variable type {0:?}")]
    UnknownType(String),

    /// A message names a different type than the variable has.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },

    /// A message targets a different variable.
    #[error("variable name mismatch: expected {expected}, found {found}")]
    NameMismatch { expected: String, found: String },

    /// Variable names are non-empty and contain no whitespace.
    #[error("invalid variable name {0:?}")]
    InvalidName(String),

    /// Command parameters are not `<type> <name> [data]`.
    #[error("malformed variable parameters {0:?}")]
    MalformedParams(String),

    /// The command is not a variable command this operation accepts.
    #[error("unexpected command {0:?}")]
    UnexpectedCommand(String),
}

pub type Result<T> = std::result::Result<T, VariableError>;
