//! Datatype helper functions
//!
//! Lexical parsers and range checks shared by the builtin type catalog.

use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{DecodeError, Error, Result};

fn decode_error(message: impl Into<String>, value: &str) -> Error {
    Error::Decode(DecodeError::new(message).with_value(value))
}

/// Parse an xs:boolean lexical value
pub fn parse_boolean(value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(decode_error("value is not a valid xs:boolean", value)),
    }
}

/// Parse an xs:decimal lexical value
pub fn parse_decimal(value: &str) -> Result<Decimal> {
    if value.contains(['e', 'E']) {
        return Err(decode_error(
            "xs:decimal admits no exponent notation",
            value,
        ));
    }
    value
        .parse::<Decimal>()
        .map_err(|_| decode_error("value is not a valid xs:decimal", value))
}

/// Parse an xs:integer lexical value
pub fn parse_integer(value: &str) -> Result<i64> {
    let normalized = value.strip_prefix('+').unwrap_or(value);
    normalized
        .parse::<i64>()
        .map_err(|_| decode_error("value is not a valid xs:integer", value))
}

/// Parse an xs:float / xs:double lexical value, with XSD spellings of the
/// special values
pub fn parse_float(value: &str) -> Result<f64> {
    match value {
        "INF" | "+INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => value
            .parse::<f64>()
            .map_err(|_| decode_error("value is not a valid floating point number", value)),
    }
}

/// Check an integer range, for the bounded integer builtins
pub fn check_int_range(value: i64, lexical: &str, min: i64, max: i64, type_name: &str) -> Result<()> {
    if value < min || value > max {
        Err(decode_error(
            format!("value is out of range for xs:{} ({}..={})", type_name, min, max),
            lexical,
        ))
    } else {
        Ok(())
    }
}

static HEX_BINARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{2})*$").unwrap());

/// Parse an xs:hexBinary lexical value
pub fn parse_hex_binary(value: &str) -> Result<Vec<u8>> {
    if !HEX_BINARY.is_match(value) {
        return Err(decode_error("not a valid hexadecimal encoding", value));
    }
    (0..value.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&value[i..i + 2], 16)
                .map_err(|_| decode_error("invalid hexadecimal byte", value))
        })
        .collect()
}

/// Parse an xs:base64Binary lexical value
pub fn parse_base64_binary(value: &str) -> Result<Vec<u8>> {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }
    base64::engine::general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|_| decode_error("not a valid base64 encoding", value))
}
