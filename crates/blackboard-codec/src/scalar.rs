use std::fmt::Write;

use crate::error::{CodecError, Result};

/// Significant digits kept when formatting floating point values.
pub const FLOAT_PRECISION: usize = 8;

/// A value with a single-token text form.
pub trait Scalar: Sized + Copy {
    /// Name used in error messages and type descriptors.
    const TYPE_NAME: &'static str;

    /// Append the text form of `self` to `out`.
    fn write_to(&self, out: &mut String) -> Result<()>;

    /// Parse one token (no surrounding whitespace).
    fn parse_token(token: &str) -> Result<Self>;
}

/// Encode a scalar.
pub fn serialize<T: Scalar>(value: T) -> Result<String> {
    let mut out = String::new();
    value.write_to(&mut out)?;
    Ok(out)
}

/// Decode a scalar, ignoring surrounding whitespace.
pub fn deserialize<T: Scalar>(text: &str) -> Result<T> {
    T::parse_token(text.trim())
}

fn invalid<T: Scalar>(token: &str) -> CodecError {
    CodecError::InvalidToken {
        kind: T::TYPE_NAME,
        token: token.to_string(),
    }
}

macro_rules! integer_scalar {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE_NAME: &'static str = $name;

                fn write_to(&self, out: &mut String) -> Result<()> {
                    let _ = write!(out, "{self}");
                    Ok(())
                }

                fn parse_token(token: &str) -> Result<Self> {
                    token.parse().map_err(|_| invalid::<Self>(token))
                }
            }
        )*
    };
}

integer_scalar! {
    u8 => "byte",
    i16 => "short",
    i32 => "int",
    i64 => "long",
}

impl Scalar for bool {
    const TYPE_NAME: &'static str = "bool";

    fn write_to(&self, out: &mut String) -> Result<()> {
        out.push_str(if *self { "true" } else { "false" });
        Ok(())
    }

    fn parse_token(token: &str) -> Result<Self> {
        if token.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if token.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(invalid::<Self>(token))
        }
    }
}

impl Scalar for f64 {
    const TYPE_NAME: &'static str = "double";

    fn write_to(&self, out: &mut String) -> Result<()> {
        if !self.is_finite() {
            return Err(CodecError::NonFinite(*self));
        }
        out.push_str(&format_g8(*self));
        Ok(())
    }

    fn parse_token(token: &str) -> Result<Self> {
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(invalid::<Self>(token)),
        }
    }
}

impl Scalar for f32 {
    const TYPE_NAME: &'static str = "float";

    fn write_to(&self, out: &mut String) -> Result<()> {
        if !self.is_finite() {
            return Err(CodecError::NonFinite(f64::from(*self)));
        }
        out.push_str(&format_g8(f64::from(*self)));
        Ok(())
    }

    fn parse_token(token: &str) -> Result<Self> {
        match token.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(invalid::<Self>(token)),
        }
    }
}

/// Format a finite value with 8 significant digits.
///
/// Fixed notation is used for decimal exponents in `[-5, 8)`, scientific
/// notation (`1.2345679E+15`) otherwise. Trailing zeros are trimmed and the
/// decimal separator is always `.`.
pub fn format_g8(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{:.*e}", FLOAT_PRECISION - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if value < 0.0 { "-" } else { "" };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');

    let mut out = String::with_capacity(16);
    out.push_str(sign);

    if (-5..FLOAT_PRECISION as i32).contains(&exponent) {
        if exponent >= 0 {
            let int_len = exponent as usize + 1;
            if digits.len() <= int_len {
                out.push_str(digits);
                out.extend(std::iter::repeat('0').take(int_len - digits.len()));
            } else {
                out.push_str(&digits[..int_len]);
                out.push('.');
                out.push_str(&digits[int_len..]);
            }
        } else {
            out.push_str("0.");
            out.extend(std::iter::repeat('0').take((-exponent - 1) as usize));
            out.push_str(digits);
        }
    } else {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let _ = write!(
            out,
            "E{}{:02}",
            if exponent < 0 { '-' } else { '+' },
            exponent.unsigned_abs()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_round_trip_exactly() {
        assert_eq!(serialize(255u8).unwrap(), "255");
        assert_eq!(serialize(-32768i16).unwrap(), "-32768");
        assert_eq!(serialize(i32::MIN).unwrap(), "-2147483648");
        assert_eq!(serialize(i64::MAX).unwrap(), "9223372036854775807");

        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(deserialize::<i64>(&serialize(value).unwrap()), Ok(value));
        }
    }

    #[test]
    fn integer_parsing_is_strict() {
        assert!(deserialize::<u8>("256").is_err());
        assert!(deserialize::<u8>("-1").is_err());
        assert!(deserialize::<i32>("1.0").is_err());
        assert!(deserialize::<i32>("12abc").is_err());
        assert!(deserialize::<i32>("").is_err());
        assert_eq!(deserialize::<i32>("  42 "), Ok(42));
    }

    #[test]
    fn booleans() {
        assert_eq!(serialize(true).unwrap(), "true");
        assert_eq!(deserialize::<bool>("FALSE"), Ok(false));
        assert!(deserialize::<bool>("1").is_err());
    }

    #[test]
    fn g8_fixed_notation() {
        assert_eq!(format_g8(1.0), "1");
        assert_eq!(format_g8(-2.5), "-2.5");
        assert_eq!(format_g8(0.1), "0.1");
        assert_eq!(format_g8(3.141592653589793), "3.1415927");
        assert_eq!(format_g8(12345678.0), "12345678");
        assert_eq!(format_g8(0.0001234), "0.0001234");
        assert_eq!(format_g8(100.0), "100");
    }

    #[test]
    fn g8_scientific_notation() {
        assert_eq!(format_g8(123456789.0), "1.2345679E+08");
        assert_eq!(format_g8(1e300), "1E+300");
        assert_eq!(format_g8(0.000001), "1E-06");
        assert_eq!(format_g8(-6.02214076e23), "-6.0221408E+23");
    }

    #[test]
    fn g8_rounding_carries_into_exponent() {
        assert_eq!(format_g8(99999999.5), "1E+08");
        assert_eq!(format_g8(9.999999999), "10");
    }

    #[test]
    fn zero_formats_plainly() {
        assert_eq!(format_g8(0.0), "0");
        assert_eq!(format_g8(-0.0), "0");
    }

    #[test]
    fn non_finite_values_fail() {
        assert!(matches!(serialize(f64::NAN), Err(CodecError::NonFinite(_))));
        assert!(matches!(
            serialize(f64::INFINITY),
            Err(CodecError::NonFinite(_))
        ));
        assert!(matches!(
            serialize(f32::NEG_INFINITY),
            Err(CodecError::NonFinite(_))
        ));
    }

    #[test]
    fn non_finite_text_is_rejected() {
        assert!(deserialize::<f64>("NaN").is_err());
        assert!(deserialize::<f64>("inf").is_err());
        assert!(deserialize::<f32>("1e39").is_err());
    }

    #[test]
    fn floats_round_trip_within_precision() {
        for value in [
            1.0f64,
            -0.5,
            3.141592653589793,
            6.02214076e23,
            1.602176634e-19,
            123456.789,
            -9.87654321e-7,
        ] {
            let text = serialize(value).unwrap();
            let back: f64 = deserialize(&text).unwrap();
            let tolerance = value.abs() * 1e-7;
            assert!(
                (back - value).abs() <= tolerance,
                "{value} -> {text} -> {back}"
            );
        }
    }

    #[test]
    fn f32_values_keep_short_forms() {
        assert_eq!(serialize(0.1f32).unwrap(), "0.1");
        assert_eq!(deserialize::<f32>("0.1"), Ok(0.1f32));
    }

    #[test]
    fn exponent_text_parses() {
        assert_eq!(deserialize::<f64>("1.5E+03"), Ok(1500.0));
        assert_eq!(deserialize::<f64>("2e-3"), Ok(0.002));
    }
}
