//! XSD element declarations
//!
//! Global declarations live in the registry; local declarations live inside
//! their enclosing complex type's content model. Type references stay
//! symbolic (by qualified name) where cycles are legal and are resolved
//! through the registry when the declaration is used.

use std::fmt;
use std::sync::Arc;

use crate::namespaces::QName;

use super::base::DerivationSet;
use super::complex_types::XsdComplexType;
use super::particles::{Occurs, Particle};
use super::simple_types::SimpleTypeRc;

/// Scope of an element declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementScope {
    /// Top-level declaration
    #[default]
    Global,
    /// Declaration nested inside a content model
    Local,
}

impl fmt::Display for ElementScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// The type of an element
#[derive(Debug, Clone)]
pub enum ElementType {
    /// A named type, resolved through the registry when used.
    ///
    /// This is the weak-handle form that tolerates recursive types.
    Named(QName),
    /// An anonymous inline simple type
    Simple(SimpleTypeRc),
    /// An anonymous inline complex type
    Complex(Arc<XsdComplexType>),
    /// xs:anyType (no type declared)
    AnyType,
}

/// An XSD element declaration
#[derive(Debug, Clone)]
pub struct XsdElement {
    /// Element name
    pub name: QName,
    /// The element's type
    pub element_type: ElementType,
    /// Occurrence bounds when used as a particle
    pub occurs: Occurs,
    /// Whether the element admits `xsi:nil`
    pub nillable: bool,
    /// Whether the element is abstract
    pub abstract_element: bool,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// Head of the substitution group this element belongs to
    pub substitution_group: Option<QName>,
    /// Blocked derivations for substitution
    pub block: DerivationSet,
    /// Finalized derivations
    pub final_set: DerivationSet,
    /// Scope
    pub scope: ElementScope,
    /// For reference particles, the referenced global declaration
    pub ref_element: Option<QName>,
}

impl XsdElement {
    /// Create an element declaration
    pub fn new(name: QName, element_type: ElementType) -> Self {
        Self {
            name,
            element_type,
            occurs: Occurs::once(),
            nillable: false,
            abstract_element: false,
            default: None,
            fixed: None,
            substitution_group: None,
            block: DerivationSet::default(),
            final_set: DerivationSet::default(),
            scope: ElementScope::Global,
            ref_element: None,
        }
    }

    /// Create a reference particle pointing at a global declaration
    pub fn reference(name: QName, occurs: Occurs) -> Self {
        Self {
            occurs,
            scope: ElementScope::Local,
            ref_element: Some(name.clone()),
            ..Self::new(name, ElementType::AnyType)
        }
    }

    /// Set the occurrence bounds
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Set the nillable flag
    pub fn with_nillable(mut self, nillable: bool) -> Self {
        self.nillable = nillable;
        self
    }

    /// Set the abstract flag
    pub fn with_abstract(mut self, abstract_element: bool) -> Self {
        self.abstract_element = abstract_element;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the fixed value
    pub fn with_fixed(mut self, fixed: impl Into<String>) -> Self {
        self.fixed = Some(fixed.into());
        self
    }

    /// Set the substitution group head
    pub fn with_substitution_group(mut self, head: QName) -> Self {
        self.substitution_group = Some(head);
        self
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: ElementScope) -> Self {
        self.scope = scope;
        self
    }

    /// Whether this is a reference particle
    pub fn is_reference(&self) -> bool {
        self.ref_element.is_some()
    }

    /// Whether this is a global declaration
    pub fn is_global(&self) -> bool {
        self.scope == ElementScope::Global
    }

    /// The effective value constraint, fixed wins over default
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed.as_deref().or(self.default.as_deref())
    }

    /// Whether the declaration matches an instance tag
    pub fn matches_name(&self, tag: &QName) -> bool {
        &self.name == tag
    }
}

impl Particle for XsdElement {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}
