//! XSD model groups
//!
//! `xs:sequence`, `xs:choice` and `xs:all` content models. A group is a
//! particle whose children are element particles, wildcard particles or
//! nested groups, each with their own occurrence bounds.

use std::fmt;
use std::sync::Arc;

use crate::namespaces::QName;

use super::elements::XsdElement;
use super::particles::{Occurs, Particle};
use super::wildcards::XsdAnyElement;

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    /// Ordered content
    #[default]
    Sequence,
    /// One of several alternatives
    Choice,
    /// Unordered element-only content, maxOccurs <= 1 throughout
    All,
}

impl ModelType {
    /// Parse from an XSD compositor tag local name
    pub fn from_tag(local_name: &str) -> Option<Self> {
        match local_name {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// A particle of a model group
#[derive(Debug, Clone)]
pub enum GroupParticle {
    /// An element particle (a local declaration or a reference)
    Element(Arc<XsdElement>),
    /// A wildcard particle
    Any(Arc<XsdAnyElement>),
    /// A nested model group
    Group(Arc<XsdGroup>),
}

impl GroupParticle {
    /// The particle's occurrence bounds
    pub fn occurs(&self) -> Occurs {
        match self {
            Self::Element(e) => e.occurs,
            Self::Any(a) => a.occurs,
            Self::Group(g) => g.occurs,
        }
    }

    /// Whether the particle can be absent
    pub fn is_emptiable(&self) -> bool {
        match self {
            Self::Element(e) => e.occurs.is_emptiable(),
            Self::Any(a) => a.occurs.is_emptiable(),
            Self::Group(g) => g.is_emptiable(),
        }
    }
}

/// An XSD model group
#[derive(Debug, Clone)]
pub struct XsdGroup {
    /// Name, for named `xs:group` definitions
    pub name: Option<QName>,
    /// Compositor
    pub model: ModelType,
    /// The group's particles in declaration order
    pub particles: Vec<GroupParticle>,
    /// Occurrence bounds
    pub occurs: Occurs,
}

impl XsdGroup {
    /// Create an empty group
    pub fn new(model: ModelType) -> Self {
        Self {
            name: None,
            model,
            particles: Vec::new(),
            occurs: Occurs::once(),
        }
    }

    /// Create an empty named group
    pub fn named(name: QName, model: ModelType) -> Self {
        Self {
            name: Some(name),
            ..Self::new(model)
        }
    }

    /// Add a particle
    pub fn push(&mut self, particle: GroupParticle) {
        self.particles.push(particle);
    }

    /// Whether the group has no particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the group admits empty content
    pub fn is_emptiable(&self) -> bool {
        if self.occurs.min == 0 || self.particles.is_empty() {
            return true;
        }
        match self.model {
            ModelType::Choice => self.particles.iter().any(|p| p.is_emptiable()),
            ModelType::Sequence | ModelType::All => {
                self.particles.iter().all(|p| p.is_emptiable())
            }
        }
    }

    /// Collect every element particle reachable inside this group,
    /// walking nested groups
    pub fn iter_elements(&self) -> Vec<Arc<XsdElement>> {
        let mut elements = Vec::new();
        collect_elements(self, &mut elements);
        elements
    }
}

fn collect_elements(group: &XsdGroup, out: &mut Vec<Arc<XsdElement>>) {
    for particle in &group.particles {
        match particle {
            GroupParticle::Element(e) => out.push(e.clone()),
            GroupParticle::Group(g) => collect_elements(g, out),
            GroupParticle::Any(_) => {}
        }
    }
}

impl Particle for XsdGroup {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::elements::{ElementType, XsdElement};

    fn element(name: &str, occurs: Occurs) -> GroupParticle {
        let mut e = XsdElement::new(QName::local(name), ElementType::AnyType);
        e.occurs = occurs;
        GroupParticle::Element(Arc::new(e))
    }

    #[test]
    fn test_model_type_from_tag() {
        assert_eq!(ModelType::from_tag("sequence"), Some(ModelType::Sequence));
        assert_eq!(ModelType::from_tag("choice"), Some(ModelType::Choice));
        assert_eq!(ModelType::from_tag("all"), Some(ModelType::All));
        assert_eq!(ModelType::from_tag("element"), None);
    }

    #[test]
    fn test_sequence_emptiable() {
        let mut group = XsdGroup::new(ModelType::Sequence);
        assert!(group.is_emptiable());

        group.push(element("required", Occurs::once()));
        assert!(!group.is_emptiable());

        group.occurs = Occurs::optional();
        assert!(group.is_emptiable());
    }

    #[test]
    fn test_choice_emptiable() {
        let mut group = XsdGroup::new(ModelType::Choice);
        group.push(element("a", Occurs::once()));
        group.push(element("b", Occurs::optional()));
        assert!(group.is_emptiable());
    }

    #[test]
    fn test_iter_elements_walks_nested_groups() {
        let mut inner = XsdGroup::new(ModelType::Choice);
        inner.push(element("b", Occurs::once()));
        inner.push(element("c", Occurs::once()));

        let mut outer = XsdGroup::new(ModelType::Sequence);
        outer.push(element("a", Occurs::once()));
        outer.push(GroupParticle::Group(Arc::new(inner)));

        let names: Vec<String> = outer
            .iter_elements()
            .iter()
            .map(|e| e.name.local_name.clone())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
