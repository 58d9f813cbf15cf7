//! XSD constraining facets
//!
//! Each facet kind has a compile-time side (is the facet admitted by the base
//! type, is its value well-formed) and a run-time side (does a value satisfy
//! it). Facets compose along the derivation ancestry: the effective facet set
//! of a restriction is materialized at compile time by [`FacetSet::merged_with_base`]
//! so validation is a single pass.

use std::cmp::Ordering;

use regex::Regex;

use crate::error::{Error, Result, ValidationError};

use super::builtins::{BuiltinType, XsdValue};

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace, collapse runs of spaces and trim
    Collapse,
}

impl WhiteSpace {
    /// Parse from an attribute value
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(Error::Type(format!(
                "invalid whiteSpace value: '{}'; must be 'preserve', 'replace' or 'collapse'",
                s
            ))),
        }
    }

    /// Normalize a string according to this mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => {
                let replaced = s.replace(['\t', '\n', '\r'], " ");
                let mut result = String::with_capacity(replaced.len());
                let mut prev_space = true;
                for c in replaced.chars() {
                    if c == ' ' {
                        if !prev_space {
                            result.push(' ');
                            prev_space = true;
                        }
                    } else {
                        result.push(c);
                        prev_space = false;
                    }
                }
                result.trim_end().to_string()
            }
        }
    }
}

/// The `length` facet
#[derive(Debug, Clone, Copy)]
pub struct LengthFacet {
    /// Required length
    pub value: usize,
}

/// The `minLength` facet
#[derive(Debug, Clone, Copy)]
pub struct MinLengthFacet {
    /// Minimum length
    pub value: usize,
}

/// The `maxLength` facet
#[derive(Debug, Clone, Copy)]
pub struct MaxLengthFacet {
    /// Maximum length
    pub value: usize,
}

/// A `pattern` facet: a single anchored regular expression
#[derive(Debug, Clone)]
pub struct PatternFacet {
    /// The source pattern
    pub pattern: String,
    regex: Regex,
}

impl PatternFacet {
    /// Compile a pattern facet. XSD patterns are implicitly anchored.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            Error::Type(format!("invalid pattern '{}': {}", pattern, e))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Whether a value matches
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Patterns declared in one derivation step: alternatives OR together
#[derive(Debug, Clone, Default)]
pub struct PatternGroup {
    /// The alternative patterns of the step
    pub patterns: Vec<PatternFacet>,
}

impl PatternGroup {
    /// Whether any alternative matches
    pub fn is_match(&self, value: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(value))
    }
}

/// The `enumeration` facet: the set of admitted lexical values
#[derive(Debug, Clone)]
pub struct EnumerationFacet {
    /// Admitted values
    pub values: Vec<String>,
}

impl EnumerationFacet {
    /// Create an enumeration facet
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Whether a value belongs to the enumeration
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// A typed bound facet (`minInclusive`, `maxExclusive`, ...)
#[derive(Debug, Clone)]
pub struct BoundFacet {
    /// The bound, parsed by the base type
    pub value: XsdValue,
    /// The source lexical form
    pub lexical: String,
}

impl BoundFacet {
    /// Create a bound facet from a typed value and its lexical form
    pub fn new(value: XsdValue, lexical: impl Into<String>) -> Self {
        Self {
            value,
            lexical: lexical.into(),
        }
    }
}

/// The `totalDigits` facet
#[derive(Debug, Clone, Copy)]
pub struct TotalDigitsFacet {
    /// Maximum number of significant digits
    pub value: u32,
}

/// The `fractionDigits` facet
#[derive(Debug, Clone, Copy)]
pub struct FractionDigitsFacet {
    /// Maximum number of fractional digits
    pub value: u32,
}

/// Check that a facet kind is admitted by a builtin type
pub fn check_facet_admitted(facet_name: &str, builtin: &BuiltinType) -> Result<()> {
    if builtin.admits_facet(facet_name) {
        Ok(())
    } else {
        Err(Error::Type(format!(
            "facet '{}' is not admitted by type '{}'",
            facet_name, builtin.name
        )))
    }
}

/// The effective facet set of a simple type.
///
/// For derived types this holds the merge of the type's own facets with the
/// chain inherited from its base.
#[derive(Debug, Clone, Default)]
pub struct FacetSet {
    /// `length`
    pub length: Option<LengthFacet>,
    /// `minLength`
    pub min_length: Option<MinLengthFacet>,
    /// `maxLength`
    pub max_length: Option<MaxLengthFacet>,
    /// Pattern groups: one per derivation step, all must match
    pub patterns: Vec<PatternGroup>,
    /// `enumeration`
    pub enumeration: Option<EnumerationFacet>,
    /// `whiteSpace`
    pub white_space: Option<WhiteSpace>,
    /// `minInclusive`
    pub min_inclusive: Option<BoundFacet>,
    /// `maxInclusive`
    pub max_inclusive: Option<BoundFacet>,
    /// `minExclusive`
    pub min_exclusive: Option<BoundFacet>,
    /// `maxExclusive`
    pub max_exclusive: Option<BoundFacet>,
    /// `totalDigits`
    pub total_digits: Option<TotalDigitsFacet>,
    /// `fractionDigits`
    pub fraction_digits: Option<FractionDigitsFacet>,
}

impl FacetSet {
    /// An empty facet set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no facet is present
    pub fn is_empty(&self) -> bool {
        self.length.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.patterns.is_empty()
            && self.enumeration.is_none()
            && self.min_inclusive.is_none()
            && self.max_inclusive.is_none()
            && self.min_exclusive.is_none()
            && self.max_exclusive.is_none()
            && self.total_digits.is_none()
            && self.fraction_digits.is_none()
    }

    /// Materialize the effective facet set of a restriction step over `base`.
    ///
    /// Length bounds intersect to the tightest interval, numeric ranges
    /// tighten, pattern groups accumulate (AND across steps), and an
    /// enumeration in the restricting step intersects with the ancestor's
    /// admitted set.
    pub fn merged_with_base(mut self, base: &FacetSet) -> FacetSet {
        if self.length.is_none() {
            self.length = base.length;
        }
        self.min_length = match (self.min_length, base.min_length) {
            (Some(own), Some(inherited)) => Some(MinLengthFacet {
                value: own.value.max(inherited.value),
            }),
            (own, inherited) => own.or(inherited),
        };
        self.max_length = match (self.max_length, base.max_length) {
            (Some(own), Some(inherited)) => Some(MaxLengthFacet {
                value: own.value.min(inherited.value),
            }),
            (own, inherited) => own.or(inherited),
        };

        let mut patterns = base.patterns.clone();
        patterns.append(&mut self.patterns);
        self.patterns = patterns;

        self.enumeration = match (self.enumeration.take(), &base.enumeration) {
            (Some(own), Some(inherited)) => Some(EnumerationFacet::new(
                own.values
                    .into_iter()
                    .filter(|v| inherited.contains(v))
                    .collect(),
            )),
            (Some(own), None) => Some(own),
            (None, inherited) => inherited.clone(),
        };

        if self.white_space.is_none() {
            self.white_space = base.white_space;
        }

        self.min_inclusive = tighten_lower(self.min_inclusive.take(), base.min_inclusive.clone());
        self.min_exclusive = tighten_lower(self.min_exclusive.take(), base.min_exclusive.clone());
        self.max_inclusive = tighten_upper(self.max_inclusive.take(), base.max_inclusive.clone());
        self.max_exclusive = tighten_upper(self.max_exclusive.take(), base.max_exclusive.clone());

        self.total_digits = match (self.total_digits, base.total_digits) {
            (Some(own), Some(inherited)) => Some(TotalDigitsFacet {
                value: own.value.min(inherited.value),
            }),
            (own, inherited) => own.or(inherited),
        };
        self.fraction_digits = match (self.fraction_digits, base.fraction_digits) {
            (Some(own), Some(inherited)) => Some(FractionDigitsFacet {
                value: own.value.min(inherited.value),
            }),
            (own, inherited) => own.or(inherited),
        };

        self
    }

    /// Validate a value against the whole facet chain.
    ///
    /// `normalized` is the white-space normalized lexical form, `typed` the
    /// decoded value, and `item_count` the number of items for list types
    /// (length facets then count items instead of characters).
    pub fn check(
        &self,
        normalized: &str,
        typed: &XsdValue,
        item_count: Option<usize>,
    ) -> Result<()> {
        let length = match item_count {
            Some(count) => count,
            None => match typed {
                XsdValue::Binary(bytes) => bytes.len(),
                _ => normalized.chars().count(),
            },
        };

        if let Some(facet) = &self.length {
            if length != facet.value {
                return Err(facet_error(
                    format!("length must be exactly {}", facet.value),
                    format!("actual length: {}", length),
                ));
            }
        }
        if let Some(facet) = &self.min_length {
            if length < facet.value {
                return Err(facet_error(
                    format!("length must be at least {}", facet.value),
                    format!("actual length: {}", length),
                ));
            }
        }
        if let Some(facet) = &self.max_length {
            if length > facet.value {
                return Err(facet_error(
                    format!("length must be at most {}", facet.value),
                    format!("actual length: {}", length),
                ));
            }
        }

        for group in &self.patterns {
            if !group.is_match(normalized) {
                let alternatives: Vec<&str> =
                    group.patterns.iter().map(|p| p.pattern.as_str()).collect();
                return Err(facet_error(
                    format!("value does not match pattern {:?}", alternatives),
                    format!("value: '{}'", normalized),
                ));
            }
        }

        if let Some(facet) = &self.enumeration {
            if !facet.contains(normalized) {
                return Err(facet_error(
                    "value is not in the enumeration".to_string(),
                    format!("admitted values: {:?}", facet.values),
                ));
            }
        }

        if let Some(facet) = &self.min_inclusive {
            if compare(typed, &facet.value) == Some(Ordering::Less) {
                return Err(facet_error(
                    format!("value must be >= {}", facet.lexical),
                    format!("value: {}", normalized),
                ));
            }
        }
        if let Some(facet) = &self.min_exclusive {
            if !matches!(compare(typed, &facet.value), Some(Ordering::Greater)) {
                return Err(facet_error(
                    format!("value must be > {}", facet.lexical),
                    format!("value: {}", normalized),
                ));
            }
        }
        if let Some(facet) = &self.max_inclusive {
            if compare(typed, &facet.value) == Some(Ordering::Greater) {
                return Err(facet_error(
                    format!("value must be <= {}", facet.lexical),
                    format!("value: {}", normalized),
                ));
            }
        }
        if let Some(facet) = &self.max_exclusive {
            if !matches!(compare(typed, &facet.value), Some(Ordering::Less)) {
                return Err(facet_error(
                    format!("value must be < {}", facet.lexical),
                    format!("value: {}", normalized),
                ));
            }
        }

        if let Some(facet) = &self.total_digits {
            if let Some(digits) = total_digits_of(typed) {
                if digits > facet.value {
                    return Err(facet_error(
                        format!("value exceeds the totalDigits limit of {}", facet.value),
                        format!("value {} has {} digits", normalized, digits),
                    ));
                }
            }
        }
        if let Some(facet) = &self.fraction_digits {
            if let Some(scale) = fraction_digits_of(typed) {
                if scale > facet.value {
                    return Err(facet_error(
                        format!("value exceeds the fractionDigits limit of {}", facet.value),
                        format!("value {} has {} fractional digits", normalized, scale),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn facet_error(message: String, reason: String) -> Error {
    Error::Validation(ValidationError::new(message).with_reason(reason))
}

fn compare(value: &XsdValue, bound: &XsdValue) -> Option<Ordering> {
    value.compare(bound)
}

fn tighten_lower(own: Option<BoundFacet>, inherited: Option<BoundFacet>) -> Option<BoundFacet> {
    match (own, inherited) {
        (Some(own), Some(inherited)) => {
            match own.value.compare(&inherited.value) {
                Some(Ordering::Less) => Some(inherited),
                _ => Some(own),
            }
        }
        (own, inherited) => own.or(inherited),
    }
}

fn tighten_upper(own: Option<BoundFacet>, inherited: Option<BoundFacet>) -> Option<BoundFacet> {
    match (own, inherited) {
        (Some(own), Some(inherited)) => {
            match own.value.compare(&inherited.value) {
                Some(Ordering::Greater) => Some(inherited),
                _ => Some(own),
            }
        }
        (own, inherited) => own.or(inherited),
    }
}

fn total_digits_of(value: &XsdValue) -> Option<u32> {
    match value {
        XsdValue::Integer(i) => {
            let digits = i.unsigned_abs().to_string().len() as u32;
            Some(digits)
        }
        XsdValue::Decimal(d) => {
            let normalized = d.normalize();
            let count = normalized
                .to_string()
                .chars()
                .filter(|c| c.is_ascii_digit())
                .count() as u32;
            Some(count)
        }
        _ => None,
    }
}

fn fraction_digits_of(value: &XsdValue) -> Option<u32> {
    match value {
        XsdValue::Integer(_) => Some(0),
        XsdValue::Decimal(d) => Some(d.normalize().scale()),
        _ => None,
    }
}
