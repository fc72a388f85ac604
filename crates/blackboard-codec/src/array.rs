use crate::error::Result;
use crate::hex::{deserialize_hex_bytes, strip_hex_prefix};
use crate::scalar::Scalar;

/// Encode scalars as a single-space separated list. An empty slice encodes
/// to an empty string.
///
/// Fails without output if any element has no text form.
pub fn serialize_array<T: Scalar>(values: &[T]) -> Result<String> {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        value.write_to(&mut out)?;
    }
    Ok(out)
}

/// Decode a whitespace separated list. One bad token fails the whole array.
pub fn deserialize_array<T: Scalar>(text: &str) -> Result<Vec<T>> {
    text.split_whitespace().map(T::parse_token).collect()
}

/// Decode a byte array in either `0x4865` or `72 101` form.
pub fn deserialize_byte_array(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();
    if strip_hex_prefix(trimmed).is_some() {
        deserialize_hex_bytes(trimmed)
    } else {
        deserialize_array(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn integers_join_with_single_spaces() {
        assert_eq!(serialize_array(&[1i64, -2, 3]).unwrap(), "1 -2 3");
    }

    #[test]
    fn empty_array_is_empty_string() {
        assert_eq!(serialize_array::<f64>(&[]).unwrap(), "");
        assert_eq!(deserialize_array::<f64>(""), Ok(vec![]));
        assert_eq!(deserialize_array::<f64>("   \n"), Ok(vec![]));
    }

    #[test]
    fn any_whitespace_run_separates() {
        assert_eq!(
            deserialize_array::<i32>(" 1\t2\n\n  3 "),
            Ok(vec![1, 2, 3])
        );
    }

    #[test]
    fn one_bad_token_fails_everything() {
        let err = deserialize_array::<i64>("1 2 x 4").unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidToken {
                kind: "long",
                token: "x".into()
            }
        );
    }

    #[test]
    fn non_finite_element_fails_serialization() {
        assert!(matches!(
            serialize_array(&[1.0, f64::NAN, 2.0]),
            Err(CodecError::NonFinite(_))
        ));
        assert!(serialize_array(&[f32::INFINITY]).is_err());
    }

    #[test]
    fn doubles_round_trip_within_precision() {
        let values = vec![0.5, -1.25, 1e-9, 123456789.0];
        let back: Vec<f64> = deserialize_array(&serialize_array(&values).unwrap()).unwrap();
        for (a, b) in values.iter().zip(&back) {
            assert!((a - b).abs() <= a.abs() * 1e-7);
        }
    }

    #[test]
    fn byte_array_sniffs_hex_prefix() {
        assert_eq!(deserialize_byte_array("0x4865"), Ok(vec![0x48, 0x65]));
        assert_eq!(deserialize_byte_array(" 0X00ff "), Ok(vec![0x00, 0xFF]));
        assert_eq!(deserialize_byte_array("72 101"), Ok(vec![72, 101]));
        assert!(deserialize_byte_array("72 300").is_err());
        assert!(deserialize_byte_array("0x4").is_err());
    }
}
