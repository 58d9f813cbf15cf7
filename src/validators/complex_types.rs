//! XSD complex types
//!
//! A complex type pairs a content variant (empty, simple, or a model group,
//! possibly mixed) with a set of attribute uses and its derivation
//! relationship.

use std::sync::Arc;

use crate::namespaces::QName;

use super::attributes::XsdAttributeGroup;
use super::base::{xsd_qname, DerivationMethod, DerivationSet};
use super::builtins::XSD_ANY_TYPE;
use super::groups::{GroupParticle, ModelType, XsdGroup};
use super::particles::Occurs;
use super::simple_types::SimpleTypeRc;
use super::wildcards::{XsdAnyAttribute, XsdAnyElement};

/// Content variant of a complex type
#[derive(Debug, Clone)]
pub enum ComplexContent {
    /// No content admitted
    Empty,
    /// Character content governed by a simple type
    Simple(SimpleTypeRc),
    /// Element content governed by a model group
    Group(Arc<XsdGroup>),
}

/// The observable content category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypeLabel {
    /// No text, no elements
    Empty,
    /// Text only
    Simple,
    /// Elements only
    ElementOnly,
    /// Elements interleaved with text
    Mixed,
}

/// An XSD complex type definition
#[derive(Debug, Clone)]
pub struct XsdComplexType {
    /// Type name, None for anonymous types
    pub name: Option<QName>,
    /// Content variant
    pub content: ComplexContent,
    /// Whether element content admits interleaved text
    pub mixed: bool,
    /// Attribute uses, with an optional attribute wildcard
    pub attributes: XsdAttributeGroup,
    /// Derivation method, None for types not derived from a named base
    pub derivation: Option<DerivationMethod>,
    /// Qualified name of the base type
    pub base_type: Option<QName>,
    /// Whether the type is abstract
    pub abstract_type: bool,
    /// Blocked derivations for `xsi:type` substitution
    pub block: DerivationSet,
    /// Finalized derivations
    pub final_set: DerivationSet,
}

impl XsdComplexType {
    /// Create an empty-content complex type
    pub fn new(name: Option<QName>) -> Self {
        Self {
            name,
            content: ComplexContent::Empty,
            mixed: false,
            attributes: XsdAttributeGroup::new(),
            derivation: None,
            base_type: None,
            abstract_type: false,
            block: DerivationSet::default(),
            final_set: DerivationSet::default(),
        }
    }

    /// The xs:anyType ur-type: any elements, any attributes, mixed.
    pub fn any_type() -> Self {
        let mut group = XsdGroup::new(ModelType::Sequence);
        group.push(GroupParticle::Any(Arc::new(XsdAnyElement {
            occurs: Occurs::zero_or_more(),
            ..XsdAnyElement::lax_any()
        })));

        let mut attributes = XsdAttributeGroup::new();
        attributes.any_attribute = Some(XsdAnyAttribute::lax_any());

        Self {
            name: Some(xsd_qname(XSD_ANY_TYPE)),
            content: ComplexContent::Group(Arc::new(group)),
            mixed: true,
            attributes,
            derivation: None,
            base_type: None,
            abstract_type: false,
            block: DerivationSet::default(),
            final_set: DerivationSet::default(),
        }
    }

    /// The observable content category of this type
    pub fn content_type_label(&self) -> ContentTypeLabel {
        match &self.content {
            ComplexContent::Empty => ContentTypeLabel::Empty,
            ComplexContent::Simple(_) => ContentTypeLabel::Simple,
            ComplexContent::Group(group) => {
                if self.mixed {
                    ContentTypeLabel::Mixed
                } else if group.is_empty() {
                    ContentTypeLabel::Empty
                } else {
                    ContentTypeLabel::ElementOnly
                }
            }
        }
    }

    /// The content model group, for element content
    pub fn model_group(&self) -> Option<&Arc<XsdGroup>> {
        match &self.content {
            ComplexContent::Group(group) => Some(group),
            _ => None,
        }
    }

    /// The simple content type, for simple content
    pub fn simple_type(&self) -> Option<&SimpleTypeRc> {
        match &self.content {
            ComplexContent::Simple(st) => Some(st),
            _ => None,
        }
    }

    /// Whether this type admits no content at all
    pub fn has_empty_content(&self) -> bool {
        matches!(self.content, ComplexContent::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::builtins::XSD_STRING;
    use crate::validators::elements::{ElementType, XsdElement};
    use crate::validators::simple_types::XsdAtomicType;

    #[test]
    fn test_empty_type() {
        let ct = XsdComplexType::new(Some(QName::local("EmptyType")));
        assert_eq!(ct.content_type_label(), ContentTypeLabel::Empty);
        assert!(ct.has_empty_content());
        assert!(ct.model_group().is_none());
    }

    #[test]
    fn test_simple_content() {
        let st: SimpleTypeRc = Arc::new(XsdAtomicType::new(XSD_STRING).unwrap());
        let mut ct = XsdComplexType::new(None);
        ct.content = ComplexContent::Simple(st);
        assert_eq!(ct.content_type_label(), ContentTypeLabel::Simple);
        assert!(ct.simple_type().is_some());
    }

    #[test]
    fn test_element_only_and_mixed() {
        let mut group = XsdGroup::new(ModelType::Sequence);
        group.push(GroupParticle::Element(Arc::new(XsdElement::new(
            QName::local("child"),
            ElementType::AnyType,
        ))));

        let mut ct = XsdComplexType::new(None);
        ct.content = ComplexContent::Group(Arc::new(group));
        assert_eq!(ct.content_type_label(), ContentTypeLabel::ElementOnly);

        ct.mixed = true;
        assert_eq!(ct.content_type_label(), ContentTypeLabel::Mixed);
    }

    #[test]
    fn test_any_type() {
        let any = XsdComplexType::any_type();
        assert_eq!(any.name.as_ref().unwrap().local_name, "anyType");
        assert!(any.mixed);
        assert!(any.attributes.any_attribute.is_some());
        assert!(any.model_group().is_some());
    }
}
