//! XSD wildcards
//!
//! `xs:any` and `xs:anyAttribute` particles. A wildcard matches a name whose
//! namespace satisfies its constraint; `processContents` governs whether a
//! matched item is validated.

use std::fmt;

use crate::error::{ParseError, Result};
use crate::namespaces::QName;

use super::particles::{Occurs, Particle};

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// The matched item must resolve to a global declaration and validate
    #[default]
    Strict,
    /// Validate when a declaration is found, accept otherwise
    Lax,
    /// Accept unchecked
    Skip,
}

impl ProcessContents {
    /// Parse from an attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lax => write!(f, "lax"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Namespace constraint of a wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceConstraint {
    /// `##any`: any namespace
    Any,
    /// `##other`: any namespace other than the target namespace, and not
    /// the absent namespace
    Other {
        /// The target namespace of the declaring schema
        target_namespace: Option<String>,
    },
    /// An explicit list of namespaces; the empty string stands for the
    /// absent namespace (`##local`)
    Enumeration(Vec<String>),
}

impl Default for NamespaceConstraint {
    fn default() -> Self {
        Self::Any
    }
}

impl NamespaceConstraint {
    /// Parse a `namespace` attribute value
    pub fn parse(value: &str, target_namespace: Option<&str>) -> Result<Self> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            "" => Ok(Self::Enumeration(Vec::new())),
            list => {
                let mut namespaces = Vec::new();
                for token in list.split_whitespace() {
                    match token {
                        "##local" => namespaces.push(String::new()),
                        "##targetNamespace" => {
                            namespaces.push(target_namespace.unwrap_or("").to_string())
                        }
                        t if t.starts_with("##") => {
                            return Err(ParseError::new(format!(
                                "wrong token '{}' in 'namespace' attribute",
                                t
                            ))
                            .into())
                        }
                        uri => namespaces.push(uri.to_string()),
                    }
                }
                Ok(Self::Enumeration(namespaces))
            }
        }
    }

    /// Whether a namespace satisfies this constraint.
    ///
    /// The absent namespace is passed as the empty string.
    pub fn is_allowed(&self, namespace: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => {
                !namespace.is_empty() && Some(namespace) != target_namespace.as_deref()
            }
            Self::Enumeration(list) => list.iter().any(|ns| ns == namespace),
        }
    }
}

/// An `xs:any` element wildcard particle
#[derive(Debug, Clone, PartialEq)]
pub struct XsdAnyElement {
    /// Namespace constraint
    pub constraint: NamespaceConstraint,
    /// Validation policy for matched elements
    pub process_contents: ProcessContents,
    /// Occurrence bounds
    pub occurs: Occurs,
}

impl XsdAnyElement {
    /// Create a wildcard accepting anything, lax
    pub fn lax_any() -> Self {
        Self {
            constraint: NamespaceConstraint::Any,
            process_contents: ProcessContents::Lax,
            occurs: Occurs::zero_or_more(),
        }
    }

    /// Whether the wildcard matches an element name
    pub fn is_matching(&self, name: &QName) -> bool {
        self.constraint.is_allowed(name.namespace_uri())
    }
}

impl Particle for XsdAnyElement {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}

/// An `xs:anyAttribute` wildcard
#[derive(Debug, Clone, PartialEq)]
pub struct XsdAnyAttribute {
    /// Namespace constraint
    pub constraint: NamespaceConstraint,
    /// Validation policy for matched attributes
    pub process_contents: ProcessContents,
}

impl XsdAnyAttribute {
    /// Create a wildcard accepting any attribute, lax
    pub fn lax_any() -> Self {
        Self {
            constraint: NamespaceConstraint::Any,
            process_contents: ProcessContents::Lax,
        }
    }

    /// Whether the wildcard matches an attribute name
    pub fn is_matching(&self, name: &QName) -> bool {
        self.constraint.is_allowed(name.namespace_uri())
    }
}
