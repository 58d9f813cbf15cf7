//! XSD attribute declarations and attribute groups

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Result;
use crate::namespaces::QName;

use super::builtins::XsdValue;
use super::simple_types::SimpleTypeRc;
use super::wildcards::XsdAnyAttribute;

/// Use mode of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    /// The attribute may appear
    #[default]
    Optional,
    /// The attribute must appear
    Required,
    /// The attribute must not appear
    Prohibited,
}

impl AttributeUse {
    /// Parse from an attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "optional" => Some(Self::Optional),
            "required" => Some(Self::Required),
            "prohibited" => Some(Self::Prohibited),
            _ => None,
        }
    }
}

/// An attribute declaration together with its per-use constraints
#[derive(Debug, Clone)]
pub struct XsdAttribute {
    /// Attribute name; qualified names carry the target namespace
    pub name: QName,
    /// The attribute's simple type, None meaning xs:anySimpleType
    pub simple_type: Option<SimpleTypeRc>,
    /// Use mode
    pub use_mode: AttributeUse,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
}

impl XsdAttribute {
    /// Create an optional attribute with no type constraint
    pub fn new(name: QName) -> Self {
        Self {
            name,
            simple_type: None,
            use_mode: AttributeUse::Optional,
            default: None,
            fixed: None,
        }
    }

    /// Set the simple type
    pub fn with_type(mut self, simple_type: SimpleTypeRc) -> Self {
        self.simple_type = Some(simple_type);
        self
    }

    /// Set the use mode
    pub fn with_use(mut self, use_mode: AttributeUse) -> Self {
        self.use_mode = use_mode;
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

    /// Whether the attribute must appear
    pub fn is_required(&self) -> bool {
        self.use_mode == AttributeUse::Required
    }

    /// Whether the attribute must not appear
    pub fn is_prohibited(&self) -> bool {
        self.use_mode == AttributeUse::Prohibited
    }

    /// The effective value constraint, fixed wins over default
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed.as_deref().or(self.default.as_deref())
    }

    /// Decode a lexical value through the attribute's type
    pub fn decode(&self, value: &str) -> Result<XsdValue> {
        match &self.simple_type {
            Some(st) => st.validate_value(value),
            None => Ok(XsdValue::String(value.to_string())),
        }
    }
}

/// A collection of attribute uses, with an optional attribute wildcard.
///
/// Used both for named `xs:attributeGroup` definitions and for the attribute
/// uses of a complex type.
#[derive(Debug, Clone, Default)]
pub struct XsdAttributeGroup {
    /// Group name for named groups, None for a complex type's uses
    pub name: Option<QName>,
    attributes: IndexMap<QName, Arc<XsdAttribute>>,
    /// The `anyAttribute` wildcard, if declared
    pub any_attribute: Option<XsdAnyAttribute>,
}

impl XsdAttributeGroup {
    /// Create an empty attribute group
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty named attribute group
    pub fn named(name: QName) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }

    /// Insert an attribute use, replacing a previous one of the same name
    pub fn insert(&mut self, attribute: Arc<XsdAttribute>) {
        self.attributes.insert(attribute.name.clone(), attribute);
    }

    /// Look up an attribute use by qualified name
    pub fn get(&self, name: &QName) -> Option<&Arc<XsdAttribute>> {
        self.attributes.get(name)
    }

    /// Iterate over the attribute uses in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<XsdAttribute>> {
        self.attributes.values()
    }

    /// Number of attribute uses
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether there are no attribute uses and no wildcard
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.any_attribute.is_none()
    }

    /// Merge another group into this one.
    ///
    /// Existing uses win over merged ones (used for extension, where the
    /// derived type's own uses were inserted first).
    pub fn merge(&mut self, other: &XsdAttributeGroup) {
        for attribute in other.iter() {
            if !self.attributes.contains_key(&attribute.name) {
                self.attributes
                    .insert(attribute.name.clone(), attribute.clone());
            }
        }
        if self.any_attribute.is_none() {
            self.any_attribute = other.any_attribute.clone();
        }
    }
}
