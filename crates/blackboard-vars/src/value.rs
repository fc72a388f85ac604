use std::fmt;
use std::str::FromStr;

use blackboard_codec::{Matrix, MimeData, Vector};
use serde::{Deserialize, Serialize};

use crate::descriptor::{
    BYTE_ARRAY, DOUBLE_ARRAY, LONG, LONG_ARRAY, MATRIX, MIME_FILE, STRING, VAR, VECTOR,
};
use crate::error::{Result, VariableError};

/// Generates the kind tag, the tagged value and their dispatch onto the
/// descriptor table from one list of `Variant(Type) => DESCRIPTOR` rows.
macro_rules! variable_types {
    ($($variant:ident($ty:ty) => $descriptor:ident),* $(,)?) => {
        /// Tag naming one shared-variable type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum VariableKind {
            $($variant,)*
        }

        impl VariableKind {
            pub const ALL: &'static [VariableKind] = &[$(VariableKind::$variant,)*];

            /// Wire type name, e.g. `long[]`.
            pub fn type_name(self) -> &'static str {
                match self {
                    $(VariableKind::$variant => $descriptor.type_name,)*
                }
            }

            pub fn is_array(self) -> bool {
                match self {
                    $(VariableKind::$variant => $descriptor.is_array,)*
                }
            }

            pub fn from_type_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|kind| kind.type_name() == name)
            }
        }

        /// A shared-variable value whose type is known only at runtime.
        #[derive(Debug, Clone, PartialEq)]
        pub enum VariableValue {
            $($variant($ty),)*
        }

        impl VariableValue {
            pub fn kind(&self) -> VariableKind {
                match self {
                    $(VariableValue::$variant(_) => VariableKind::$variant,)*
                }
            }

            /// Decode `text` as a value of `kind`.
            pub fn decode_kind(kind: VariableKind, text: &str) -> Result<Self> {
                match kind {
                    $(VariableKind::$variant => Ok(VariableValue::$variant($descriptor.deserialize(text)?)),)*
                }
            }

            pub fn encode(&self) -> Result<String> {
                match self {
                    $(VariableValue::$variant(value) => Ok($descriptor.serialize(value)?),)*
                }
            }

            /// Element count; 1 for scalars.
            pub fn len(&self) -> usize {
                match self {
                    $(VariableValue::$variant(value) => $descriptor.length(value),)*
                }
            }
        }
    };
}

variable_types! {
    ByteArray(Vec<u8>) => BYTE_ARRAY,
    DoubleArray(Vec<f64>) => DOUBLE_ARRAY,
    Long(i64) => LONG,
    LongArray(Vec<i64>) => LONG_ARRAY,
    Matrix(Matrix) => MATRIX,
    MimeFile(MimeData) => MIME_FILE,
    String(Option<String>) => STRING,
    Var(String) => VAR,
    Vector(Vector) => VECTOR,
}

impl VariableKind {
    /// Decode `text` as a value of this kind.
    pub fn decode(self, text: &str) -> Result<VariableValue> {
        VariableValue::decode_kind(self, text)
    }
}

impl VariableValue {
    /// Decode `text` as the type named `type_name`, e.g.
    /// `VariableValue::decode("matrix", "2x2 1 2 3 4")`.
    pub fn decode(type_name: &str, text: &str) -> Result<Self> {
        Self::decode_kind(type_name.parse()?, text)
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromStr for VariableKind {
    type Err = VariableError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_type_name(s).ok_or_else(|| VariableError::UnknownType(s.to_string()))
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
