//! Blackboard variable commands.
//!
//! All three carry `"<type> <name> [data]"` as their parameters, where
//! `data` is the value encoded by the variable's descriptor. Exactly one
//! separator follows the name; everything after it is `data`, verbatim.

use blackboard_parser::Command;

use crate::error::{Result, VariableError};
use crate::value::{VariableKind, VariableValue};
use crate::variable::{validate_name, SharedVariable};

pub const WRITE_VAR: &str = "write_var";
pub const READ_VAR: &str = "read_var";
pub const CREATE_VAR: &str = "create_var";

/// The parts of a variable command's parameter text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableParams {
    pub type_name: String,
    pub name: String,
    /// Encoded value; empty when the command carries none.
    pub data: String,
}

impl VariableParams {
    pub fn kind(&self) -> Result<VariableKind> {
        self.type_name.parse()
    }

    /// Decode `data` according to `type_name`.
    pub fn decode(&self) -> Result<VariableValue> {
        VariableValue::decode_kind(self.kind()?, &self.data)
    }

    /// Render back to parameter text.
    pub fn format(&self) -> String {
        format_params(&self.type_name, &self.name, &self.data)
    }
}

/// Split `"<type> <name> [data]"`.
pub fn parse_variable_params(params: &str) -> Result<VariableParams> {
    let (type_name, rest) = split_token(params);
    let (name, rest) = split_token(rest.trim_start());
    let data = skip_separator(rest);
    if type_name.is_empty() || name.is_empty() {
        return Err(VariableError::MalformedParams(params.to_string()));
    }

    Ok(VariableParams {
        type_name: type_name.to_string(),
        name: name.to_string(),
        data: data.to_string(),
    })
}

/// First whitespace-delimited token and the untouched remainder after it.
fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    text.split_at(end)
}

fn skip_separator(rest: &str) -> &str {
    let mut chars = rest.chars();
    match chars.next() {
        Some(sep) if sep.is_whitespace() => chars.as_str(),
        _ => rest,
    }
}

/// `write_var` publishing the variable's current value.
pub fn write_var<T: 'static>(variable: &SharedVariable<T>) -> Result<Command> {
    let data = variable.serialize()?;
    Ok(Command::new(
        WRITE_VAR,
        format_params(variable.type_name(), variable.name(), &data),
    ))
}

/// `read_var` requesting the value of `name`.
pub fn read_var(kind: VariableKind, name: &str) -> Result<Command> {
    validate_name(name)?;
    Ok(Command::new(READ_VAR, format_params(kind.type_name(), name, "")))
}

/// `create_var` declaring `name` with an initial value.
pub fn create_var(name: &str, initial: &VariableValue) -> Result<Command> {
    validate_name(name)?;
    let data = initial.encode()?;
    Ok(Command::new(
        CREATE_VAR,
        format_params(initial.kind().type_name(), name, &data),
    ))
}

fn format_params(type_name: &str, name: &str, data: &str) -> String {
    if data.is_empty() {
        format!("{type_name} {name}")
    } else {
        format!("{type_name} {name} {data}")
    }
}
