use blackboard_vars::VariableValue;

use crate::cmd::CodecArgs;
use crate::exit::{variable_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run(args: CodecArgs, format: OutputFormat) -> CliResult<i32> {
    let (value, encoded) = normalize(&args.type_name, &args.text)?;
    print_value(&value, &encoded, format);
    Ok(SUCCESS)
}

/// Decode and re-encode `text` as `type_name`.
fn normalize(type_name: &str, text: &str) -> CliResult<(VariableValue, String)> {
    let value =
        VariableValue::decode(type_name, text).map_err(|err| variable_error("decode failed", err))?;
    let encoded = value
        .encode()
        .map_err(|err| variable_error("encode failed", err))?;
    Ok((value, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::{DATA_INVALID, USAGE};

    #[test]
    fn normalizes_decimal_bytes_to_hex() {
        let (value, encoded) = normalize("byte[]", "72 101").unwrap();
        assert_eq!(value.len(), 2);
        assert_eq!(encoded, "0x4865");
    }

    #[test]
    fn normalizes_float_precision() {
        let (_, encoded) = normalize("vector", "3.14159265358979  1.0").unwrap();
        assert_eq!(encoded, "3.1415927 1");
    }

    #[test]
    fn error_codes() {
        assert_eq!(normalize("matrix", "2x2 1 2 3").unwrap_err().code, DATA_INVALID);
        assert_eq!(normalize("quaternion", "1").unwrap_err().code, USAGE);
    }
}
