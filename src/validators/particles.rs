//! Particle occurrence model
//!
//! Occurrence bounds (`minOccurs`, `maxOccurs`) shared by element particles,
//! wildcards and model groups.

use crate::error::{ParseError, Result};
use crate::documents::Element;

/// Occurrence bounds for a particle. `max` of None means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Exactly once (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Whether the particle may be absent
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Whether the particle admits at most one occurrence
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    /// Whether a count is still below the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Whether a count has reached the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }

    /// Whether these bounds are a valid restriction of `other`
    pub fn has_occurs_restriction(&self, other: &Occurs) -> bool {
        if self.min < other.min {
            return false;
        }
        if self.max == Some(0) {
            return true;
        }
        match (self.max, other.max) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a <= b,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// Trait for XSD components carrying occurrence bounds
pub trait Particle {
    /// The occurrence bounds
    fn occurs(&self) -> Occurs;

    /// Minimum occurrences
    fn min_occurs(&self) -> u32 {
        self.occurs().min
    }

    /// Maximum occurrences (None = unbounded)
    fn max_occurs(&self) -> Option<u32> {
        self.occurs().max
    }

    /// Whether the particle may be absent
    fn is_emptiable(&self) -> bool {
        self.occurs().is_emptiable()
    }
}

/// Parse `minOccurs`/`maxOccurs` attributes from an XSD element
pub fn parse_occurs(elem: &Element) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = elem.get_attribute("minOccurs") {
        occurs.min = min_str.trim().parse::<u32>().map_err(|_| {
            ParseError::new(format!(
                "minOccurs value '{}' is not a non-negative integer",
                min_str
            ))
        })?;
    }

    match elem.get_attribute("maxOccurs") {
        Some("unbounded") => occurs.max = None,
        Some(max_str) => {
            let max = max_str.trim().parse::<u32>().map_err(|_| {
                ParseError::new(format!(
                    "maxOccurs value '{}' is not 'unbounded' or a non-negative integer",
                    max_str
                ))
            })?;
            if max < occurs.min {
                return Err(ParseError::new(format!(
                    "maxOccurs ({}) is lower than minOccurs ({})",
                    max, occurs.min
                ))
                .into());
            }
            occurs.max = Some(max);
        }
        None => {
            if occurs.min > 1 {
                return Err(ParseError::new(format!(
                    "minOccurs ({}) is over the default maxOccurs (1)",
                    occurs.min
                ))
                .into());
            }
        }
    }

    Ok(occurs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;

    fn elem(xml: &str) -> Element {
        Document::from_str(xml).unwrap().root
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Occurs::once(), Occurs::new(1, Some(1)));
        assert!(Occurs::optional().is_emptiable());
        assert!(Occurs::zero_or_more().max.is_none());
        assert_eq!(Occurs::one_or_more().min, 1);
    }

    #[test]
    fn test_counting() {
        let occurs = Occurs::new(2, Some(4));
        assert!(occurs.is_missing(1));
        assert!(!occurs.is_missing(2));
        assert!(!occurs.is_over(3));
        assert!(occurs.is_over(4));

        assert!(!Occurs::zero_or_more().is_over(1000));
    }

    #[test]
    fn test_occurs_restriction() {
        assert!(Occurs::once().has_occurs_restriction(&Occurs::optional()));
        assert!(!Occurs::optional().has_occurs_restriction(&Occurs::once()));
        assert!(Occurs::new(1, Some(3)).has_occurs_restriction(&Occurs::one_or_more()));
        assert!(!Occurs::one_or_more().has_occurs_restriction(&Occurs::new(1, Some(3))));
        assert!(Occurs::new(0, Some(0)).has_occurs_restriction(&Occurs::once()));
    }

    #[test]
    fn test_parse_occurs() {
        let e = elem("<e minOccurs=\"0\" maxOccurs=\"unbounded\"/>");
        assert_eq!(parse_occurs(&e).unwrap(), Occurs::zero_or_more());

        let e = elem("<e minOccurs=\"2\" maxOccurs=\"5\"/>");
        assert_eq!(parse_occurs(&e).unwrap(), Occurs::new(2, Some(5)));

        let e = elem("<e/>");
        assert_eq!(parse_occurs(&e).unwrap(), Occurs::once());

        assert!(parse_occurs(&elem("<e minOccurs=\"x\"/>")).is_err());
        assert!(parse_occurs(&elem("<e minOccurs=\"3\" maxOccurs=\"2\"/>")).is_err());
        assert!(parse_occurs(&elem("<e minOccurs=\"2\"/>")).is_err());
    }
}
