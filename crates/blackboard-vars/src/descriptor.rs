//! The descriptor table: one static [`TypeDescriptor`] per variable type.

use std::fmt;

use blackboard_codec::{
    deserialize, deserialize_array, deserialize_byte_array, deserialize_string, serialize,
    serialize_array, serialize_hex_bytes, serialize_string, Matrix, MimeData, Vector,
};

/// Type name and codec functions for one shared-variable type.
pub struct TypeDescriptor<T> {
    /// Name used on the wire, e.g. `double[]`.
    pub type_name: &'static str,
    pub is_array: bool,
    pub serialize: fn(&T) -> blackboard_codec::Result<String>,
    pub deserialize: fn(&str) -> blackboard_codec::Result<T>,
    /// Number of elements held; 1 for scalars.
    pub length: fn(&T) -> usize,
}

impl<T> TypeDescriptor<T> {
    pub fn serialize(&self, value: &T) -> blackboard_codec::Result<String> {
        (self.serialize)(value)
    }

    pub fn deserialize(&self, text: &str) -> blackboard_codec::Result<T> {
        (self.deserialize)(text)
    }

    pub fn length(&self, value: &T) -> usize {
        (self.length)(value)
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("is_array", &self.is_array)
            .finish()
    }
}

fn one<T>(_: &T) -> usize {
    1
}

/// `byte[]`: written as `0x...`, read in either hex or decimal form.
pub static BYTE_ARRAY: TypeDescriptor<Vec<u8>> = TypeDescriptor {
    type_name: "byte[]",
    is_array: true,
    serialize: |bytes| Ok(serialize_hex_bytes(bytes)),
    deserialize: deserialize_byte_array,
    length: |values| values.len(),
};

pub static DOUBLE_ARRAY: TypeDescriptor<Vec<f64>> = TypeDescriptor {
    type_name: "double[]",
    is_array: true,
    serialize: |values| serialize_array(values),
    deserialize: deserialize_array,
    length: |values| values.len(),
};

pub static LONG: TypeDescriptor<i64> = TypeDescriptor {
    type_name: "long",
    is_array: false,
    serialize: |value| serialize(*value),
    deserialize: deserialize::<i64>,
    length: one,
};

pub static LONG_ARRAY: TypeDescriptor<Vec<i64>> = TypeDescriptor {
    type_name: "long[]",
    is_array: true,
    serialize: |values| serialize_array(values),
    deserialize: deserialize_array,
    length: |values| values.len(),
};

pub static MATRIX: TypeDescriptor<Matrix> = TypeDescriptor {
    type_name: "matrix",
    is_array: false,
    serialize: Matrix::serialize,
    deserialize: Matrix::deserialize,
    length: |matrix| matrix.as_slice().len(),
};

/// `mime`: a typed file payload.
pub static MIME_FILE: TypeDescriptor<MimeData> = TypeDescriptor {
    type_name: "mime",
    is_array: false,
    serialize: MimeData::serialize,
    deserialize: MimeData::deserialize,
    length: |mime| mime.data.len(),
};

/// `string`: a quoted literal, `None` encoded as `null`.
pub static STRING: TypeDescriptor<Option<String>> = TypeDescriptor {
    type_name: "string",
    is_array: false,
    serialize: |value| Ok(serialize_string(value.as_deref())),
    deserialize: deserialize_string,
    length: |value| value.as_ref().map_or(0, |s| s.chars().count()),
};

/// `var`: free text carried verbatim, without quoting.
pub static VAR: TypeDescriptor<String> = TypeDescriptor {
    type_name: "var",
    is_array: false,
    serialize: |text| Ok(text.clone()),
    deserialize: |text| Ok(text.to_string()),
    length: |text| text.chars().count(),
};

pub static VECTOR: TypeDescriptor<Vector> = TypeDescriptor {
    type_name: "vector",
    is_array: true,
    serialize: Vector::serialize,
    deserialize: Vector::deserialize,
    length: Vector::len,
};
