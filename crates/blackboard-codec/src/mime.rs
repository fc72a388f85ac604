use base64::{engine::general_purpose, Engine as _};

use crate::error::{CodecError, Result};

const MIME_TYPE_KEY: &str = "MimeType=";
const DATA_KEY: &str = "Data=";

/// A typed binary payload, such as an image or a file.
///
/// Text form: `MimeType=<type> Data=<base64>`. The type ends at the first
/// space; everything after `Data=` is standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MimeData {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MimeData {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode as `MimeType=<type> Data=<base64>`.
    ///
    /// A MIME type containing whitespace has no text form.
    pub fn serialize(&self) -> Result<String> {
        if self.mime_type.is_empty() {
            return Err(CodecError::InvalidMime("empty MIME type"));
        }
        if self.mime_type.chars().any(char::is_whitespace) {
            return Err(CodecError::InvalidMime("MIME type contains whitespace"));
        }
        Ok(format!(
            "{MIME_TYPE_KEY}{} {DATA_KEY}{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.data)
        ))
    }

    pub fn deserialize(text: &str) -> Result<Self> {
        let rest = text
            .trim()
            .strip_prefix(MIME_TYPE_KEY)
            .ok_or(CodecError::InvalidMime("missing MimeType="))?;
        let (mime_type, rest) = rest
            .split_once(' ')
            .ok_or(CodecError::InvalidMime("missing Data="))?;
        if mime_type.is_empty() {
            return Err(CodecError::InvalidMime("empty MIME type"));
        }
        let encoded = rest
            .trim_start()
            .strip_prefix(DATA_KEY)
            .ok_or(CodecError::InvalidMime("missing Data="))?;
        let data = general_purpose::STANDARD.decode(encoded.trim_end())?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }
}
