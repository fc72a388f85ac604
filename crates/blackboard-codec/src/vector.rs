use crate::array::{deserialize_array, serialize_array};
use crate::error::Result;

/// A bare list of doubles with no header, e.g. `0.5 1.5 -2`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector(pub Vec<f64>);

impl Vector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn serialize(&self) -> Result<String> {
        serialize_array(&self.0)
    }

    pub fn deserialize(text: &str) -> Result<Self> {
        deserialize_array(text).map(Self)
    }
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}
