//! XSD simple types
//!
//! Simple type validators in three varieties: atomic, list and union.
//! Restriction steps materialize their effective facet chain at compile time,
//! so validating a value is a single pass over the merged facet set.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result, ValidationError};
use crate::namespaces::QName;

use super::builtins::{get_builtin_type, BuiltinType, XsdValue};
use super::facets::{FacetSet, WhiteSpace};

/// Variety of a simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleTypeVariety {
    /// Atomic type (a single value)
    Atomic,
    /// List type (whitespace-separated items)
    List,
    /// Union type (the value matches one member type)
    Union,
}

/// Shared handle to a simple type
pub type SimpleTypeRc = Arc<dyn SimpleType>;

/// Trait implemented by all simple type validators
pub trait SimpleType: fmt::Debug + Send + Sync {
    /// The type name, None for anonymous types
    fn name(&self) -> Option<&QName>;

    /// The variety of this type
    fn variety(&self) -> SimpleTypeVariety;

    /// The effective facet set
    fn facets(&self) -> &FacetSet;

    /// The white-space rule in effect
    fn white_space(&self) -> WhiteSpace {
        self.facets().white_space.unwrap_or(WhiteSpace::Preserve)
    }

    /// The builtin this type bottoms out at, None for list and union
    fn primitive(&self) -> Option<&'static BuiltinType>;

    /// The base type for derived types
    fn base(&self) -> Option<&SimpleTypeRc> {
        None
    }

    /// For list types, the item type
    fn item_type(&self) -> Option<&SimpleTypeRc> {
        None
    }

    /// For union types, the member types
    fn member_types(&self) -> &[SimpleTypeRc] {
        &[]
    }

    /// Whether this is a builtin of the XSD namespace
    fn is_builtin(&self) -> bool {
        false
    }

    /// Lexically parse a value, apply the full facet chain and return the
    /// typed value
    fn validate_value(&self, value: &str) -> Result<XsdValue>;
}

// =============================================================================
// Atomic types
// =============================================================================

/// Atomic simple type backed by a builtin
#[derive(Debug)]
pub struct XsdAtomicType {
    name: Option<QName>,
    builtin: &'static BuiltinType,
    facet_set: FacetSet,
}

impl XsdAtomicType {
    /// Create an atomic type from a builtin type name
    pub fn new(builtin_name: &str) -> Result<Self> {
        let builtin = get_builtin_type(builtin_name)
            .ok_or_else(|| Error::Type(format!("unknown builtin type: '{}'", builtin_name)))?;
        Ok(Self {
            name: None,
            builtin,
            facet_set: FacetSet {
                white_space: Some(builtin.white_space),
                ..Default::default()
            },
        })
    }

    /// Create a named atomic type
    pub fn with_name(builtin_name: &str, name: QName) -> Result<Self> {
        let mut atomic = Self::new(builtin_name)?;
        atomic.name = Some(name);
        Ok(atomic)
    }

    /// The backing builtin definition
    pub fn builtin(&self) -> &'static BuiltinType {
        self.builtin
    }
}

impl SimpleType for XsdAtomicType {
    fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    fn variety(&self) -> SimpleTypeVariety {
        SimpleTypeVariety::Atomic
    }

    fn facets(&self) -> &FacetSet {
        &self.facet_set
    }

    fn primitive(&self) -> Option<&'static BuiltinType> {
        Some(self.builtin)
    }

    fn is_builtin(&self) -> bool {
        self.name.is_none()
    }

    fn validate_value(&self, value: &str) -> Result<XsdValue> {
        let typed = self.builtin.validate(value)?;
        let normalized = self.white_space().normalize(value);
        self.facet_set.check(&normalized, &typed, None)?;
        Ok(typed)
    }
}

// =============================================================================
// Restriction
// =============================================================================

/// Simple type derived by restriction.
///
/// The facet set holds the merged chain: the restriction step's own facets
/// composed with everything inherited from the base.
#[derive(Debug)]
pub struct XsdRestrictedType {
    name: Option<QName>,
    base: SimpleTypeRc,
    facet_set: FacetSet,
}

impl XsdRestrictedType {
    /// Create a restriction of `base` with the given step facets
    pub fn new(base: SimpleTypeRc, step_facets: FacetSet) -> Self {
        let mut facet_set = step_facets.merged_with_base(base.facets());
        if facet_set.white_space.is_none() {
            facet_set.white_space = Some(base.white_space());
        }
        Self {
            name: None,
            base,
            facet_set,
        }
    }

    /// Create a named restriction
    pub fn with_name(base: SimpleTypeRc, step_facets: FacetSet, name: QName) -> Self {
        let mut restricted = Self::new(base, step_facets);
        restricted.name = Some(name);
        restricted
    }
}

impl SimpleType for XsdRestrictedType {
    fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    fn variety(&self) -> SimpleTypeVariety {
        self.base.variety()
    }

    fn facets(&self) -> &FacetSet {
        &self.facet_set
    }

    fn primitive(&self) -> Option<&'static BuiltinType> {
        self.base.primitive()
    }

    fn base(&self) -> Option<&SimpleTypeRc> {
        Some(&self.base)
    }

    fn item_type(&self) -> Option<&SimpleTypeRc> {
        self.base.item_type()
    }

    fn member_types(&self) -> &[SimpleTypeRc] {
        self.base.member_types()
    }

    fn validate_value(&self, value: &str) -> Result<XsdValue> {
        match self.variety() {
            SimpleTypeVariety::Atomic => {
                let primitive = self.primitive().ok_or_else(|| {
                    Error::Type("atomic restriction without a primitive root".to_string())
                })?;
                let typed = primitive.validate(value)?;
                let normalized = self.white_space().normalize(value);
                self.facet_set.check(&normalized, &typed, None)?;
                Ok(typed)
            }
            SimpleTypeVariety::List => {
                let typed = self.base.validate_value(value)?;
                let normalized = WhiteSpace::Collapse.normalize(value);
                let count = match &typed {
                    XsdValue::List(items) => items.len(),
                    _ => normalized.split(' ').filter(|s| !s.is_empty()).count(),
                };
                self.facet_set.check(&normalized, &typed, Some(count))?;
                Ok(typed)
            }
            SimpleTypeVariety::Union => {
                let normalized = self.white_space().normalize(value);
                self.facet_set
                    .check(&normalized, &XsdValue::String(normalized.clone()), None)?;
                self.base.validate_value(value)
            }
        }
    }
}

// =============================================================================
// List types
// =============================================================================

/// List simple type: whitespace-separated items of a single item type
#[derive(Debug)]
pub struct XsdListType {
    name: Option<QName>,
    item_type: SimpleTypeRc,
    facet_set: FacetSet,
}

impl XsdListType {
    /// Create a list type over an item type
    pub fn new(item_type: SimpleTypeRc) -> Self {
        Self {
            name: None,
            item_type,
            facet_set: FacetSet {
                white_space: Some(WhiteSpace::Collapse),
                ..Default::default()
            },
        }
    }

    /// Create a named list type
    pub fn with_name(item_type: SimpleTypeRc, name: QName) -> Self {
        let mut list = Self::new(item_type);
        list.name = Some(name);
        list
    }
}

impl SimpleType for XsdListType {
    fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    fn variety(&self) -> SimpleTypeVariety {
        SimpleTypeVariety::List
    }

    fn facets(&self) -> &FacetSet {
        &self.facet_set
    }

    fn primitive(&self) -> Option<&'static BuiltinType> {
        None
    }

    fn item_type(&self) -> Option<&SimpleTypeRc> {
        Some(&self.item_type)
    }

    fn validate_value(&self, value: &str) -> Result<XsdValue> {
        let normalized = WhiteSpace::Collapse.normalize(value);
        let items: Vec<&str> = if normalized.is_empty() {
            Vec::new()
        } else {
            normalized.split(' ').collect()
        };

        let mut values = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match self.item_type.validate_value(item) {
                Ok(v) => values.push(v),
                Err(e) => {
                    return Err(Error::Validation(
                        ValidationError::new(format!(
                            "invalid list item at position {}",
                            i + 1
                        ))
                        .with_reason(format!("item '{}': {}", item, e)),
                    ));
                }
            }
        }

        let typed = XsdValue::List(values);
        self.facet_set.check(&normalized, &typed, Some(items.len()))?;
        Ok(typed)
    }
}

// =============================================================================
// Union types
// =============================================================================

/// Union simple type: a value matching one of several member types
#[derive(Debug)]
pub struct XsdUnionType {
    name: Option<QName>,
    member_types: Vec<SimpleTypeRc>,
    facet_set: FacetSet,
}

impl XsdUnionType {
    /// Create a union over member types
    pub fn new(member_types: Vec<SimpleTypeRc>) -> Self {
        Self {
            name: None,
            member_types,
            facet_set: FacetSet {
                white_space: Some(WhiteSpace::Collapse),
                ..Default::default()
            },
        }
    }

    /// Create a named union type
    pub fn with_name(member_types: Vec<SimpleTypeRc>, name: QName) -> Self {
        let mut union = Self::new(member_types);
        union.name = Some(name);
        union
    }
}

impl SimpleType for XsdUnionType {
    fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    fn variety(&self) -> SimpleTypeVariety {
        SimpleTypeVariety::Union
    }

    fn facets(&self) -> &FacetSet {
        &self.facet_set
    }

    fn primitive(&self) -> Option<&'static BuiltinType> {
        None
    }

    fn member_types(&self) -> &[SimpleTypeRc] {
        &self.member_types
    }

    fn validate_value(&self, value: &str) -> Result<XsdValue> {
        let normalized = self.white_space().normalize(value);
        self.facet_set
            .check(&normalized, &XsdValue::String(normalized.clone()), None)?;

        let mut last_error = None;
        for member in &self.member_types {
            match member.validate_value(value) {
                Ok(v) => return Ok(v),
                Err(e) => last_error = Some(e),
            }
        }

        Err(Error::Validation(
            ValidationError::new("value matches no member type of the union").with_reason(
                format!(
                    "value '{}' was refused by all {} member types; last error: {}",
                    value,
                    self.member_types.len(),
                    last_error.map(|e| e.to_string()).unwrap_or_default()
                ),
            ),
        ))
    }
}
