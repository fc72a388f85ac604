use std::time::SystemTime;

use blackboard_parser::Command;
use serde::Serialize;
use tracing::debug;

use crate::commands::{parse_variable_params, WRITE_VAR};
use crate::descriptor::TypeDescriptor;
use crate::error::{Result, VariableError};

/// Bookkeeping updated on every successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariableMetadata {
    /// Module that last wrote the value, if known.
    pub writer: Option<String>,
    pub updated_at: Option<SystemTime>,
    pub write_count: u64,
}

/// A named blackboard variable of any type described by a [`TypeDescriptor`].
#[derive(Debug, Clone)]
pub struct SharedVariable<T: 'static> {
    name: String,
    value: T,
    metadata: VariableMetadata,
    descriptor: &'static TypeDescriptor<T>,
}

impl<T: 'static> SharedVariable<T> {
    pub fn new(
        name: impl Into<String>,
        descriptor: &'static TypeDescriptor<T>,
        value: T,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            value,
            metadata: VariableMetadata::default(),
            descriptor,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn metadata(&self) -> &VariableMetadata {
        &self.metadata
    }

    pub fn descriptor(&self) -> &'static TypeDescriptor<T> {
        self.descriptor
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name
    }

    pub fn is_array(&self) -> bool {
        self.descriptor.is_array
    }

    /// Element count of the current value.
    pub fn len(&self) -> usize {
        self.descriptor.length(&self.value)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the value and record the write.
    pub fn set(&mut self, value: T, writer: Option<&str>) {
        self.value = value;
        self.touch(writer);
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(self.descriptor.serialize(&self.value)?)
    }

    /// Decode `text` and make it the new value.
    ///
    /// On failure the current value and metadata are left untouched.
    pub fn deserialize_into(&mut self, text: &str, writer: Option<&str>) -> Result<()> {
        let value = self.descriptor.deserialize(text)?;
        self.set(value, writer);
        Ok(())
    }

    /// Apply a `write_var` command addressed to this variable.
    ///
    /// The command's source module, when stamped, is recorded as the writer.
    pub fn apply_write(&mut self, command: &Command) -> Result<()> {
        if command.name != WRITE_VAR {
            return Err(VariableError::UnexpectedCommand(command.name.clone()));
        }
        let params = parse_variable_params(&command.params)?;
        if params.type_name != self.type_name() {
            return Err(VariableError::TypeMismatch {
                expected: self.type_name(),
                found: params.type_name,
            });
        }
        if params.name != self.name {
            return Err(VariableError::NameMismatch {
                expected: self.name.clone(),
                found: params.name,
            });
        }

        let writer = command.source.as_ref().map(|source| source.module.as_str());
        self.deserialize_into(&params.data, writer).inspect_err(|err| {
            debug!(variable = %self.name, error = %err, "rejected write");
        })
    }

    fn touch(&mut self, writer: Option<&str>) {
        self.metadata.writer = writer.map(str::to_string);
        self.metadata.updated_at = Some(SystemTime::now());
        self.metadata.write_count += 1;
    }
}

impl<T: Default + 'static> SharedVariable<T> {
    /// A variable holding `T::default()`.
    pub fn with_default(
        name: impl Into<String>,
        descriptor: &'static TypeDescriptor<T>,
    ) -> Result<Self> {
        Self::new(name, descriptor, T::default())
    }
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(VariableError::InvalidName(name.to_string()));
    }
    Ok(())
}
