//! XSD built-in types
//!
//! The catalog of XSD 1.0 primitive and derived simple types. Each builtin
//! carries its lexical parser, canonical form, white-space rule and the set
//! of facets it admits. The catalog seeds the registry's type map before any
//! user schema is loaded.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Number, Value as JsonValue};

use crate::error::{DecodeError, Error, Result};
use crate::names;

use super::facets::WhiteSpace;
use super::helpers::{
    check_int_range, parse_base64_binary, parse_boolean, parse_decimal, parse_float,
    parse_hex_binary, parse_integer,
};

// =============================================================================
// Type names
// =============================================================================

/// xs:string
pub const XSD_STRING: &str = "string";
/// xs:normalizedString
pub const XSD_NORMALIZED_STRING: &str = "normalizedString";
/// xs:token
pub const XSD_TOKEN: &str = "token";
/// xs:language
pub const XSD_LANGUAGE: &str = "language";
/// xs:Name
pub const XSD_NAME: &str = "Name";
/// xs:NCName
pub const XSD_NCNAME: &str = "NCName";
/// xs:ID
pub const XSD_ID: &str = "ID";
/// xs:IDREF
pub const XSD_IDREF: &str = "IDREF";
/// xs:IDREFS
pub const XSD_IDREFS: &str = "IDREFS";
/// xs:ENTITY
pub const XSD_ENTITY: &str = "ENTITY";
/// xs:ENTITIES
pub const XSD_ENTITIES: &str = "ENTITIES";
/// xs:NMTOKEN
pub const XSD_NMTOKEN: &str = "NMTOKEN";
/// xs:NMTOKENS
pub const XSD_NMTOKENS: &str = "NMTOKENS";

/// xs:boolean
pub const XSD_BOOLEAN: &str = "boolean";

/// xs:decimal
pub const XSD_DECIMAL: &str = "decimal";
/// xs:integer
pub const XSD_INTEGER: &str = "integer";
/// xs:long
pub const XSD_LONG: &str = "long";
/// xs:int
pub const XSD_INT: &str = "int";
/// xs:short
pub const XSD_SHORT: &str = "short";
/// xs:byte
pub const XSD_BYTE: &str = "byte";
/// xs:nonNegativeInteger
pub const XSD_NON_NEGATIVE_INTEGER: &str = "nonNegativeInteger";
/// xs:positiveInteger
pub const XSD_POSITIVE_INTEGER: &str = "positiveInteger";
/// xs:nonPositiveInteger
pub const XSD_NON_POSITIVE_INTEGER: &str = "nonPositiveInteger";
/// xs:negativeInteger
pub const XSD_NEGATIVE_INTEGER: &str = "negativeInteger";
/// xs:unsignedLong
pub const XSD_UNSIGNED_LONG: &str = "unsignedLong";
/// xs:unsignedInt
pub const XSD_UNSIGNED_INT: &str = "unsignedInt";
/// xs:unsignedShort
pub const XSD_UNSIGNED_SHORT: &str = "unsignedShort";
/// xs:unsignedByte
pub const XSD_UNSIGNED_BYTE: &str = "unsignedByte";

/// xs:float
pub const XSD_FLOAT: &str = "float";
/// xs:double
pub const XSD_DOUBLE: &str = "double";

/// xs:duration
pub const XSD_DURATION: &str = "duration";
/// xs:dateTime
pub const XSD_DATETIME: &str = "dateTime";
/// xs:time
pub const XSD_TIME: &str = "time";
/// xs:date
pub const XSD_DATE: &str = "date";
/// xs:gYearMonth
pub const XSD_GYEAR_MONTH: &str = "gYearMonth";
/// xs:gYear
pub const XSD_GYEAR: &str = "gYear";
/// xs:gMonthDay
pub const XSD_GMONTH_DAY: &str = "gMonthDay";
/// xs:gDay
pub const XSD_GDAY: &str = "gDay";
/// xs:gMonth
pub const XSD_GMONTH: &str = "gMonth";

/// xs:hexBinary
pub const XSD_HEX_BINARY: &str = "hexBinary";
/// xs:base64Binary
pub const XSD_BASE64_BINARY: &str = "base64Binary";

/// xs:anyURI
pub const XSD_ANY_URI: &str = "anyURI";
/// xs:QName
pub const XSD_QNAME: &str = "QName";
/// xs:NOTATION
pub const XSD_NOTATION: &str = "NOTATION";

/// xs:anyType
pub const XSD_ANY_TYPE: &str = "anyType";
/// xs:anySimpleType
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";

// =============================================================================
// Facet names
// =============================================================================

/// length facet name
pub const XSD_LENGTH: &str = "length";
/// minLength facet name
pub const XSD_MIN_LENGTH: &str = "minLength";
/// maxLength facet name
pub const XSD_MAX_LENGTH: &str = "maxLength";
/// pattern facet name
pub const XSD_PATTERN: &str = "pattern";
/// enumeration facet name
pub const XSD_ENUMERATION: &str = "enumeration";
/// whiteSpace facet name
pub const XSD_WHITE_SPACE: &str = "whiteSpace";
/// maxInclusive facet name
pub const XSD_MAX_INCLUSIVE: &str = "maxInclusive";
/// maxExclusive facet name
pub const XSD_MAX_EXCLUSIVE: &str = "maxExclusive";
/// minInclusive facet name
pub const XSD_MIN_INCLUSIVE: &str = "minInclusive";
/// minExclusive facet name
pub const XSD_MIN_EXCLUSIVE: &str = "minExclusive";
/// totalDigits facet name
pub const XSD_TOTAL_DIGITS: &str = "totalDigits";
/// fractionDigits facet name
pub const XSD_FRACTION_DIGITS: &str = "fractionDigits";

lazy_static::lazy_static! {
    /// Facets admitted for string-like types
    pub static ref STRING_FACETS: HashSet<&'static str> = HashSet::from([
        XSD_LENGTH, XSD_MIN_LENGTH, XSD_MAX_LENGTH,
        XSD_PATTERN, XSD_ENUMERATION, XSD_WHITE_SPACE,
    ]);

    /// Facets admitted for boolean
    pub static ref BOOLEAN_FACETS: HashSet<&'static str> = HashSet::from([
        XSD_PATTERN, XSD_WHITE_SPACE,
    ]);

    /// Facets admitted for float and double
    pub static ref FLOAT_FACETS: HashSet<&'static str> = HashSet::from([
        XSD_PATTERN, XSD_ENUMERATION, XSD_WHITE_SPACE,
        XSD_MAX_INCLUSIVE, XSD_MAX_EXCLUSIVE, XSD_MIN_INCLUSIVE, XSD_MIN_EXCLUSIVE,
    ]);

    /// Facets admitted for decimal and the integer family
    pub static ref DECIMAL_FACETS: HashSet<&'static str> = HashSet::from([
        XSD_TOTAL_DIGITS, XSD_FRACTION_DIGITS,
        XSD_PATTERN, XSD_ENUMERATION, XSD_WHITE_SPACE,
        XSD_MAX_INCLUSIVE, XSD_MAX_EXCLUSIVE, XSD_MIN_INCLUSIVE, XSD_MIN_EXCLUSIVE,
    ]);

    /// Facets admitted for the date, time and duration family
    pub static ref DATETIME_FACETS: HashSet<&'static str> = HashSet::from([
        XSD_PATTERN, XSD_ENUMERATION, XSD_WHITE_SPACE,
        XSD_MAX_INCLUSIVE, XSD_MAX_EXCLUSIVE, XSD_MIN_INCLUSIVE, XSD_MIN_EXCLUSIVE,
    ]);
}

// =============================================================================
// XSD values
// =============================================================================

/// A decoded XSD atomic or list value
#[derive(Debug, Clone, PartialEq)]
pub enum XsdValue {
    /// String value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Decimal value
    Decimal(Decimal),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Double value
    Double(f64),
    /// Binary value (hex or base64 decoded)
    Binary(Vec<u8>),
    /// ISO 8601 duration, in lexical form
    Duration(String),
    /// dateTime, in lexical form
    DateTime(String),
    /// date, in lexical form
    Date(String),
    /// time, in lexical form
    Time(String),
    /// One of the Gregorian fragments (gYear, gMonth, ...)
    Gregorian(String),
    /// URI value
    Uri(String),
    /// QName value (prefix, local name)
    QName(Option<String>, String),
    /// List of values
    List(Vec<XsdValue>),
    /// Null value (nilled elements)
    Null,
}

impl XsdValue {
    /// Convert into a JSON value for the decoded surface
    pub fn to_json(&self) -> JsonValue {
        match self {
            XsdValue::String(s)
            | XsdValue::Duration(s)
            | XsdValue::DateTime(s)
            | XsdValue::Date(s)
            | XsdValue::Time(s)
            | XsdValue::Gregorian(s)
            | XsdValue::Uri(s) => JsonValue::String(s.clone()),
            XsdValue::Boolean(b) => JsonValue::Bool(*b),
            XsdValue::Integer(i) => JsonValue::Number(Number::from(*i)),
            XsdValue::Decimal(d) => match decimal_to_number(d) {
                Some(n) => JsonValue::Number(n),
                None => JsonValue::String(d.to_string()),
            },
            XsdValue::Float(f) | XsdValue::Double(f) => match Number::from_f64(*f) {
                Some(n) => JsonValue::Number(n),
                None => JsonValue::String(self.to_string()),
            },
            XsdValue::Binary(_) => JsonValue::String(self.to_string()),
            XsdValue::QName(prefix, local) => JsonValue::String(match prefix {
                Some(p) => format!("{}:{}", p, local),
                None => local.clone(),
            }),
            XsdValue::List(items) => {
                JsonValue::Array(items.iter().map(|v| v.to_json()).collect())
            }
            XsdValue::Null => JsonValue::Null,
        }
    }

    /// Order two values when they are comparable.
    ///
    /// Numeric kinds compare across representations; the lexical kinds
    /// compare within the same kind only.
    pub fn compare(&self, other: &XsdValue) -> Option<Ordering> {
        use XsdValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (Integer(a), Decimal(b)) => Some(rust_decimal::Decimal::from(*a).cmp(b)),
            (Decimal(a), Integer(b)) => Some(a.cmp(&rust_decimal::Decimal::from(*b))),
            (Float(a) | Double(a), Float(b) | Double(b)) => a.partial_cmp(b),
            (Integer(a), Float(b) | Double(b)) => (*a as f64).partial_cmp(b),
            (Float(a) | Double(a), Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Decimal(a), Float(b) | Double(b)) => {
                a.to_string().parse::<f64>().ok()?.partial_cmp(b)
            }
            (Float(a) | Double(a), Decimal(b)) => {
                a.partial_cmp(&b.to_string().parse::<f64>().ok()?)
            }
            (String(a), String(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b))
            | (Date(a), Date(b))
            | (Time(a), Time(b))
            | (Duration(a), Duration(b))
            | (Gregorian(a), Gregorian(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn decimal_to_number(d: &Decimal) -> Option<Number> {
    let normalized = d.normalize();
    if normalized.scale() == 0 {
        normalized.to_string().parse::<i64>().ok().map(Number::from)
    } else {
        normalized
            .to_string()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
    }
}

impl fmt::Display for XsdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XsdValue::String(s)
            | XsdValue::Duration(s)
            | XsdValue::DateTime(s)
            | XsdValue::Date(s)
            | XsdValue::Time(s)
            | XsdValue::Gregorian(s)
            | XsdValue::Uri(s) => write!(f, "{}", s),
            XsdValue::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            XsdValue::Decimal(d) => write!(f, "{}", d.normalize()),
            XsdValue::Integer(i) => write!(f, "{}", i),
            XsdValue::Float(v) | XsdValue::Double(v) => {
                if v.is_nan() {
                    write!(f, "NaN")
                } else if *v == f64::INFINITY {
                    write!(f, "INF")
                } else if *v == f64::NEG_INFINITY {
                    write!(f, "-INF")
                } else {
                    write!(f, "{}", v)
                }
            }
            XsdValue::Binary(bytes) => {
                for byte in bytes {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
            XsdValue::QName(prefix, local) => match prefix {
                Some(p) => write!(f, "{}:{}", p, local),
                None => write!(f, "{}", local),
            },
            XsdValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            XsdValue::Null => Ok(()),
        }
    }
}

// =============================================================================
// Builtin type definitions
// =============================================================================

/// Category of a builtin type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    /// A primitive of the XSD type hierarchy
    Primitive,
    /// Derived from another builtin by facet restriction
    Derived,
    /// The ur-types
    Special,
}

/// Definition of a builtin XSD simple type
pub struct BuiltinType {
    /// Local name (the namespace is always the XSD namespace)
    pub name: &'static str,
    /// Category
    pub category: TypeCategory,
    /// Base type local name, None for the root
    pub base_type: Option<&'static str>,
    /// White-space rule
    pub white_space: WhiteSpace,
    /// Admitted facets
    pub admitted_facets: &'static HashSet<&'static str>,
    validator: fn(&str) -> Result<XsdValue>,
}

impl fmt::Debug for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinType")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("base_type", &self.base_type)
            .finish()
    }
}

impl BuiltinType {
    /// Validate a lexical value, returning the typed value.
    ///
    /// The value is white-space normalized before parsing.
    pub fn validate(&self, value: &str) -> Result<XsdValue> {
        let normalized = self.white_space.normalize(value);
        (self.validator)(&normalized)
    }

    /// Whether a facet kind is admitted by this type
    pub fn admits_facet(&self, facet_name: &str) -> bool {
        self.admitted_facets.contains(facet_name)
    }
}

// =============================================================================
// Validator functions
// =============================================================================

fn invalid(message: &str, value: &str) -> Error {
    Error::Decode(DecodeError::new(message).with_value(value))
}

fn validate_string(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::String(value.to_string()))
}

fn validate_normalized_string(value: &str) -> Result<XsdValue> {
    if value.contains(['\r', '\n', '\t']) {
        return Err(invalid(
            "normalizedString admits no CR, LF or TAB characters",
            value,
        ));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_token(value: &str) -> Result<XsdValue> {
    if value.starts_with(' ') || value.ends_with(' ') || value.contains("  ") {
        return Err(invalid(
            "token admits no leading, trailing or doubled spaces",
            value,
        ));
    }
    validate_normalized_string(value)
}

static LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").unwrap());

fn validate_language(value: &str) -> Result<XsdValue> {
    if !LANGUAGE.is_match(value) {
        return Err(invalid("not a valid language code", value));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_name(value: &str) -> Result<XsdValue> {
    if !names::is_valid_name(value) {
        return Err(invalid("not a valid XML Name", value));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_ncname(value: &str) -> Result<XsdValue> {
    if !names::is_valid_ncname(value) {
        return Err(invalid("not a valid NCName", value));
    }
    Ok(XsdValue::String(value.to_string()))
}

static NMTOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.:\-]+$").unwrap());

fn validate_nmtoken(value: &str) -> Result<XsdValue> {
    if !NMTOKEN.is_match(value) {
        return Err(invalid("not a valid NMTOKEN", value));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_boolean(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::Boolean(parse_boolean(value)?))
}

fn validate_decimal(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::Decimal(parse_decimal(value)?))
}

fn validate_integer(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::Integer(parse_integer(value)?))
}

fn validate_long(value: &str) -> Result<XsdValue> {
    validate_integer(value)
}

fn validate_int(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, i32::MIN as i64, i32::MAX as i64, XSD_INT)?;
    Ok(XsdValue::Integer(i))
}

fn validate_short(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, -32768, 32767, XSD_SHORT)?;
    Ok(XsdValue::Integer(i))
}

fn validate_byte(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, -128, 127, XSD_BYTE)?;
    Ok(XsdValue::Integer(i))
}

fn validate_non_negative_integer(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, 0, i64::MAX, XSD_NON_NEGATIVE_INTEGER)?;
    Ok(XsdValue::Integer(i))
}

fn validate_positive_integer(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, 1, i64::MAX, XSD_POSITIVE_INTEGER)?;
    Ok(XsdValue::Integer(i))
}

fn validate_non_positive_integer(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, i64::MIN, 0, XSD_NON_POSITIVE_INTEGER)?;
    Ok(XsdValue::Integer(i))
}

fn validate_negative_integer(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, i64::MIN, -1, XSD_NEGATIVE_INTEGER)?;
    Ok(XsdValue::Integer(i))
}

fn validate_unsigned_long(value: &str) -> Result<XsdValue> {
    let u: u64 = value
        .strip_prefix('+')
        .unwrap_or(value)
        .parse()
        .map_err(|_| invalid("value is out of range for xs:unsignedLong", value))?;
    if u > i64::MAX as u64 {
        Ok(XsdValue::Decimal(Decimal::from(u)))
    } else {
        Ok(XsdValue::Integer(u as i64))
    }
}

fn validate_unsigned_int(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, 0, u32::MAX as i64, XSD_UNSIGNED_INT)?;
    Ok(XsdValue::Integer(i))
}

fn validate_unsigned_short(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, 0, 65535, XSD_UNSIGNED_SHORT)?;
    Ok(XsdValue::Integer(i))
}

fn validate_unsigned_byte(value: &str) -> Result<XsdValue> {
    let i = parse_integer(value)?;
    check_int_range(i, value, 0, 255, XSD_UNSIGNED_BYTE)?;
    Ok(XsdValue::Integer(i))
}

fn validate_float(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::Float(parse_float(value)?))
}

fn validate_double(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::Double(parse_float(value)?))
}

fn validate_hex_binary(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::Binary(parse_hex_binary(value)?))
}

fn validate_base64_binary(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::Binary(parse_base64_binary(value)?))
}

fn validate_any_uri(value: &str) -> Result<XsdValue> {
    if value.contains(['\n', '\r', '\t', ' ']) {
        return Err(invalid("anyURI admits no whitespace characters", value));
    }
    Ok(XsdValue::Uri(value.to_string()))
}

fn validate_qname(value: &str) -> Result<XsdValue> {
    if !names::is_valid_qname(value) {
        return Err(invalid("not a valid xs:QName", value));
    }
    match value.split_once(':') {
        Some((prefix, local)) => Ok(XsdValue::QName(Some(prefix.to_string()), local.to_string())),
        None => Ok(XsdValue::QName(None, value.to_string())),
    }
}

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").unwrap()
});

fn validate_duration(value: &str) -> Result<XsdValue> {
    if !DURATION.is_match(value) || value.ends_with('P') || value.ends_with('T') {
        return Err(invalid("not a valid xs:duration", value));
    }
    Ok(XsdValue::Duration(value.to_string()))
}

static DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{4,}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

fn validate_datetime(value: &str) -> Result<XsdValue> {
    if !DATETIME.is_match(value) {
        return Err(invalid("not a valid xs:dateTime", value));
    }
    Ok(XsdValue::DateTime(value.to_string()))
}

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{4,}-\d{2}-\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap());

fn validate_date(value: &str) -> Result<XsdValue> {
    if !DATE.is_match(value) {
        return Err(invalid("not a valid xs:date", value));
    }
    Ok(XsdValue::Date(value.to_string()))
}

static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap());

fn validate_time(value: &str) -> Result<XsdValue> {
    if !TIME.is_match(value) {
        return Err(invalid("not a valid xs:time", value));
    }
    Ok(XsdValue::Time(value.to_string()))
}

static GYEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d{4,}(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GYEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{4,}-\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GMONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^--\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GMONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--\d{2}-\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GDAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap());

fn gregorian_validator(regex: &Regex, kind: &str, value: &str) -> Result<XsdValue> {
    if !regex.is_match(value) {
        return Err(invalid(&format!("not a valid xs:{}", kind), value));
    }
    Ok(XsdValue::Gregorian(value.to_string()))
}

fn validate_gyear(value: &str) -> Result<XsdValue> {
    gregorian_validator(&GYEAR, XSD_GYEAR, value)
}

fn validate_gyear_month(value: &str) -> Result<XsdValue> {
    gregorian_validator(&GYEAR_MONTH, XSD_GYEAR_MONTH, value)
}

fn validate_gmonth(value: &str) -> Result<XsdValue> {
    gregorian_validator(&GMONTH, XSD_GMONTH, value)
}

fn validate_gmonth_day(value: &str) -> Result<XsdValue> {
    gregorian_validator(&GMONTH_DAY, XSD_GMONTH_DAY, value)
}

fn validate_gday(value: &str) -> Result<XsdValue> {
    gregorian_validator(&GDAY, XSD_GDAY, value)
}

// =============================================================================
// Catalog
// =============================================================================

macro_rules! builtin {
    ($name:expr, $category:expr, $base:expr, $ws:expr, $facets:expr, $validator:expr) => {
        BuiltinType {
            name: $name,
            category: $category,
            base_type: $base,
            white_space: $ws,
            admitted_facets: $facets,
            validator: $validator,
        }
    };
}

lazy_static::lazy_static! {
    /// The builtin simple type catalog
    pub static ref BUILTIN_TYPES: Vec<BuiltinType> = {
        use TypeCategory::*;
        use WhiteSpace::*;
        vec![
            builtin!(XSD_ANY_SIMPLE_TYPE, Special, None, Preserve, &STRING_FACETS, validate_string),

            // String hierarchy
            builtin!(XSD_STRING, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Preserve, &STRING_FACETS, validate_string),
            builtin!(XSD_NORMALIZED_STRING, Derived, Some(XSD_STRING), Replace, &STRING_FACETS, validate_normalized_string),
            builtin!(XSD_TOKEN, Derived, Some(XSD_NORMALIZED_STRING), Collapse, &STRING_FACETS, validate_token),
            builtin!(XSD_LANGUAGE, Derived, Some(XSD_TOKEN), Collapse, &STRING_FACETS, validate_language),
            builtin!(XSD_NAME, Derived, Some(XSD_TOKEN), Collapse, &STRING_FACETS, validate_name),
            builtin!(XSD_NCNAME, Derived, Some(XSD_NAME), Collapse, &STRING_FACETS, validate_ncname),
            builtin!(XSD_ID, Derived, Some(XSD_NCNAME), Collapse, &STRING_FACETS, validate_ncname),
            builtin!(XSD_IDREF, Derived, Some(XSD_NCNAME), Collapse, &STRING_FACETS, validate_ncname),
            builtin!(XSD_ENTITY, Derived, Some(XSD_NCNAME), Collapse, &STRING_FACETS, validate_ncname),
            builtin!(XSD_NMTOKEN, Derived, Some(XSD_TOKEN), Collapse, &STRING_FACETS, validate_nmtoken),

            // Boolean
            builtin!(XSD_BOOLEAN, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &BOOLEAN_FACETS, validate_boolean),

            // Decimal and the integer family
            builtin!(XSD_DECIMAL, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DECIMAL_FACETS, validate_decimal),
            builtin!(XSD_INTEGER, Derived, Some(XSD_DECIMAL), Collapse, &DECIMAL_FACETS, validate_integer),
            builtin!(XSD_LONG, Derived, Some(XSD_INTEGER), Collapse, &DECIMAL_FACETS, validate_long),
            builtin!(XSD_INT, Derived, Some(XSD_LONG), Collapse, &DECIMAL_FACETS, validate_int),
            builtin!(XSD_SHORT, Derived, Some(XSD_INT), Collapse, &DECIMAL_FACETS, validate_short),
            builtin!(XSD_BYTE, Derived, Some(XSD_SHORT), Collapse, &DECIMAL_FACETS, validate_byte),
            builtin!(XSD_NON_NEGATIVE_INTEGER, Derived, Some(XSD_INTEGER), Collapse, &DECIMAL_FACETS, validate_non_negative_integer),
            builtin!(XSD_POSITIVE_INTEGER, Derived, Some(XSD_NON_NEGATIVE_INTEGER), Collapse, &DECIMAL_FACETS, validate_positive_integer),
            builtin!(XSD_NON_POSITIVE_INTEGER, Derived, Some(XSD_INTEGER), Collapse, &DECIMAL_FACETS, validate_non_positive_integer),
            builtin!(XSD_NEGATIVE_INTEGER, Derived, Some(XSD_NON_POSITIVE_INTEGER), Collapse, &DECIMAL_FACETS, validate_negative_integer),
            builtin!(XSD_UNSIGNED_LONG, Derived, Some(XSD_NON_NEGATIVE_INTEGER), Collapse, &DECIMAL_FACETS, validate_unsigned_long),
            builtin!(XSD_UNSIGNED_INT, Derived, Some(XSD_UNSIGNED_LONG), Collapse, &DECIMAL_FACETS, validate_unsigned_int),
            builtin!(XSD_UNSIGNED_SHORT, Derived, Some(XSD_UNSIGNED_INT), Collapse, &DECIMAL_FACETS, validate_unsigned_short),
            builtin!(XSD_UNSIGNED_BYTE, Derived, Some(XSD_UNSIGNED_SHORT), Collapse, &DECIMAL_FACETS, validate_unsigned_byte),

            // Floating point
            builtin!(XSD_FLOAT, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &FLOAT_FACETS, validate_float),
            builtin!(XSD_DOUBLE, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &FLOAT_FACETS, validate_double),

            // Date, time and duration
            builtin!(XSD_DURATION, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_duration),
            builtin!(XSD_DATETIME, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_datetime),
            builtin!(XSD_DATE, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_date),
            builtin!(XSD_TIME, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_time),
            builtin!(XSD_GYEAR_MONTH, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_gyear_month),
            builtin!(XSD_GYEAR, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_gyear),
            builtin!(XSD_GMONTH_DAY, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_gmonth_day),
            builtin!(XSD_GMONTH, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_gmonth),
            builtin!(XSD_GDAY, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &DATETIME_FACETS, validate_gday),

            // Binary
            builtin!(XSD_HEX_BINARY, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &STRING_FACETS, validate_hex_binary),
            builtin!(XSD_BASE64_BINARY, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &STRING_FACETS, validate_base64_binary),

            // Other primitives
            builtin!(XSD_ANY_URI, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &STRING_FACETS, validate_any_uri),
            builtin!(XSD_QNAME, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &STRING_FACETS, validate_qname),
            builtin!(XSD_NOTATION, Primitive, Some(XSD_ANY_SIMPLE_TYPE), Collapse, &STRING_FACETS, validate_qname),
        ]
    };

    static ref BUILTIN_INDEX: std::collections::HashMap<&'static str, usize> = {
        BUILTIN_TYPES
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name, i))
            .collect()
    };
}

/// The builtin list types, defined over their item builtins
pub const LIST_BUILTINS: &[(&str, &str)] = &[
    (XSD_IDREFS, XSD_IDREF),
    (XSD_ENTITIES, XSD_ENTITY),
    (XSD_NMTOKENS, XSD_NMTOKEN),
];

/// Look up a builtin type by its local name
pub fn get_builtin_type(name: &str) -> Option<&'static BuiltinType> {
    BUILTIN_INDEX.get(name).map(|&i| &BUILTIN_TYPES[i])
}

/// Validate a value against a builtin type by name
pub fn validate_builtin(name: &str, value: &str) -> Result<XsdValue> {
    let builtin = get_builtin_type(name)
        .ok_or_else(|| Error::Type(format!("unknown builtin type: '{}'", name)))?;
    builtin.validate(value)
}
