//! Typed blackboard shared variables.
//!
//! Every variable type is the same [`SharedVariable<T>`] paired with a
//! static [`TypeDescriptor<T>`] naming the type and supplying its codec
//! functions. [`VariableValue`] is the runtime-tagged counterpart used when
//! the type is only known from a type name on the wire, and [`commands`]
//! builds and reads the `write_var` / `read_var` / `create_var` messages
//! that carry encoded values.

pub mod commands;
pub mod descriptor;
pub mod error;
pub mod value;
pub mod variable;

pub use commands::{
    create_var, parse_variable_params, read_var, write_var, VariableParams, CREATE_VAR, READ_VAR,
    WRITE_VAR,
};
pub use descriptor::{
    TypeDescriptor, BYTE_ARRAY, DOUBLE_ARRAY, LONG, LONG_ARRAY, MATRIX, MIME_FILE, STRING, VAR,
    VECTOR,
};
pub use error::{Result, VariableError};
pub use value::{VariableKind, VariableValue};
pub use variable::{SharedVariable, VariableMetadata};
