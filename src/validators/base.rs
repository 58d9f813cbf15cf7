//! Shared schema-model primitives
//!
//! Form defaults, derivation methods and the block/final derivation sets
//! used across declarations.

use std::fmt;

use crate::documents::Element;
use crate::error::{ParseError, Result};
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;

/// Form of element and attribute names (`qualified` | `unqualified`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormDefault {
    /// Local names are unqualified
    #[default]
    Unqualified,
    /// Local names take the target namespace
    Qualified,
}

impl FormDefault {
    /// Parse from an attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }

    /// Check if qualified
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Qualified)
    }
}

impl fmt::Display for FormDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qualified => write!(f, "qualified"),
            Self::Unqualified => write!(f, "unqualified"),
        }
    }
}

/// A derivation method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationMethod {
    /// Derivation by restriction
    Restriction,
    /// Derivation by extension
    Extension,
    /// Simple type list derivation
    List,
    /// Simple type union derivation
    Union,
    /// Element substitution
    Substitution,
}

impl DerivationMethod {
    /// The attribute token for this method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restriction => "restriction",
            Self::Extension => "extension",
            Self::List => "list",
            Self::Union => "union",
            Self::Substitution => "substitution",
        }
    }
}

impl fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A set of derivation methods, as found in `block`, `final`,
/// `blockDefault` and `finalDefault` attributes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivationSet {
    /// Blocks/finalizes extension
    pub extension: bool,
    /// Blocks/finalizes restriction
    pub restriction: bool,
    /// Blocks substitution (block only)
    pub substitution: bool,
    /// Finalizes list derivation (simple types)
    pub list: bool,
    /// Finalizes union derivation (simple types)
    pub union: bool,
}

impl DerivationSet {
    /// The set with every method included
    pub fn all() -> Self {
        Self {
            extension: true,
            restriction: true,
            substitution: true,
            list: true,
            union: true,
        }
    }

    /// Parse an attribute value (`#all` or a whitespace-separated token list)
    pub fn parse(value: &str) -> Self {
        if value.trim() == "#all" {
            return Self::all();
        }
        let mut result = Self::default();
        for token in value.split_whitespace() {
            match token {
                "extension" => result.extension = true,
                "restriction" => result.restriction = true,
                "substitution" => result.substitution = true,
                "list" => result.list = true,
                "union" => result.union = true,
                _ => {}
            }
        }
        result
    }

    /// Whether the set includes a method
    pub fn contains(&self, method: DerivationMethod) -> bool {
        match method {
            DerivationMethod::Extension => self.extension,
            DerivationMethod::Restriction => self.restriction,
            DerivationMethod::Substitution => self.substitution,
            DerivationMethod::List => self.list,
            DerivationMethod::Union => self.union,
        }
    }

    /// Whether no method is included
    pub fn is_empty(&self) -> bool {
        !self.extension && !self.restriction && !self.substitution && !self.list && !self.union
    }
}

/// A qualified name in the XSD namespace
pub fn xsd_qname(local_name: &str) -> QName {
    QName::namespaced(XSD_NAMESPACE, local_name)
}

/// Whether an element is the given XSD-namespace tag
pub fn is_xsd_tag(elem: &Element, local_name: &str) -> bool {
    elem.namespace() == Some(XSD_NAMESPACE) && elem.local_name() == local_name
}

/// Assert that an element is the given XSD-namespace tag
pub fn check_tag(elem: &Element, local_name: &str) -> Result<()> {
    if is_xsd_tag(elem, local_name) {
        Ok(())
    } else {
        Err(ParseError::new(format!(
            "expected a '{{{}}}{}' element, found '{}'",
            XSD_NAMESPACE,
            local_name,
            elem.tag
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;

    #[test]
    fn test_form_default() {
        assert_eq!(FormDefault::parse("qualified"), Some(FormDefault::Qualified));
        assert_eq!(
            FormDefault::parse("unqualified"),
            Some(FormDefault::Unqualified)
        );
        assert_eq!(FormDefault::parse("other"), None);
        assert!(FormDefault::Qualified.is_qualified());
    }

    #[test]
    fn test_derivation_set_parse() {
        let set = DerivationSet::parse("extension restriction");
        assert!(set.contains(DerivationMethod::Extension));
        assert!(set.contains(DerivationMethod::Restriction));
        assert!(!set.contains(DerivationMethod::Substitution));

        let all = DerivationSet::parse("#all");
        assert!(all.contains(DerivationMethod::Substitution));
        assert!(all.contains(DerivationMethod::Union));

        assert!(DerivationSet::parse("").is_empty());
    }

    #[test]
    fn test_check_tag() {
        let doc = Document::from_str(
            "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\"/>",
        )
        .unwrap();
        assert!(check_tag(&doc.root, "schema").is_ok());
        assert!(check_tag(&doc.root, "element").is_err());

        let plain = Document::from_str("<schema/>").unwrap();
        assert!(check_tag(&plain.root, "schema").is_err());
    }
}
