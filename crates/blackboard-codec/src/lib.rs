//! Text encoding of every value a blackboard shared variable can hold.
//!
//! All functions are stateless and locale-independent. Encoding fails on
//! values that have no text form (NaN, infinities); decoding is
//! all-or-nothing and never returns a partially filled value.
//!
//! | Shape | Example |
//! |---|---|
//! | scalar | `42`, `3.1415927`, `true` |
//! | string | `"say \"hi\""`, `null` |
//! | array | `1 2 3` |
//! | byte array | `0x4865` or `72 101` |
//! | MIME payload | `MimeType=image/png Data=iVBORw0=` |
//! | matrix | `2x2 1 2 3 4` |
//! | vector | `0.5 1.5` |
//! | named value | `pose={x={1} y={2}}` |

pub mod array;
pub mod error;
pub mod hex;
pub mod matrix;
pub mod mime;
pub mod named;
pub mod scalar;
pub mod text;
pub mod vector;

pub use array::{deserialize_array, deserialize_byte_array, serialize_array};
pub use error::{CodecError, Result};
pub use hex::{deserialize_hex_bytes, serialize_hex_bytes};
pub use matrix::Matrix;
pub use mime::MimeData;
pub use named::{extract_named_value, parse_named_values, write_named_value, NamedValue};
pub use scalar::{deserialize, format_g8, serialize, Scalar};
pub use text::{deserialize_string, serialize_string};
pub use vector::Vector;
