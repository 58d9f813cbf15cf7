//! The global declaration registry
//!
//! `XsdGlobals` mediates between the schema documents of a compile session.
//! It owns the registered documents, the five FQN-keyed global maps, the
//! substitution group memberships and a memoized cache of per-namespace
//! projections.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::error::{ParseError, Result};
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;

use super::attributes::XsdAttribute;
use super::base::xsd_qname;
use super::builtins::{BUILTIN_TYPES, LIST_BUILTINS, XSD_ANY_TYPE};
use super::complex_types::XsdComplexType;
use super::elements::XsdElement;
use super::groups::XsdGroup;
use super::schemas::SchemaDocument;
use super::simple_types::{SimpleTypeRc, XsdAtomicType, XsdListType};
use super::attributes::XsdAttributeGroup;

/// A global type: simple or complex
#[derive(Debug, Clone)]
pub enum GlobalType {
    /// A simple type
    Simple(SimpleTypeRc),
    /// A complex type
    Complex(Arc<XsdComplexType>),
}

impl GlobalType {
    /// Whether this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, GlobalType::Simple(_))
    }

    /// Whether this is a complex type
    pub fn is_complex(&self) -> bool {
        matches!(self, GlobalType::Complex(_))
    }

    /// View as a simple type
    pub fn as_simple(&self) -> Option<&SimpleTypeRc> {
        match self {
            GlobalType::Simple(st) => Some(st),
            GlobalType::Complex(_) => None,
        }
    }

    /// View as a complex type
    pub fn as_complex(&self) -> Option<&Arc<XsdComplexType>> {
        match self {
            GlobalType::Simple(_) => None,
            GlobalType::Complex(ct) => Some(ct),
        }
    }
}

/// Names of the five global maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapName {
    /// The type definitions map
    Types,
    /// The attribute declarations map
    Attributes,
    /// The attribute group definitions map
    AttributeGroups,
    /// The model group definitions map
    Groups,
    /// The element declarations map
    Elements,
}

/// A reference to a global declaration, as returned by map projections
#[derive(Debug, Clone)]
pub enum GlobalRef {
    /// A type definition
    Type(GlobalType),
    /// An attribute declaration
    Attribute(Arc<XsdAttribute>),
    /// An attribute group definition
    AttributeGroup(Arc<XsdAttributeGroup>),
    /// A model group definition
    Group(Arc<XsdGroup>),
    /// An element declaration
    Element(Arc<XsdElement>),
}

type ViewKey = (MapName, String, bool);
type View = Arc<IndexMap<String, GlobalRef>>;

/// The mediator holding all compiled globals of a compile session
#[derive(Debug)]
pub struct XsdGlobals {
    schemas: Vec<SchemaDocument>,
    namespaces: IndexMap<String, Vec<usize>>,
    resources: IndexMap<String, usize>,

    /// Global type definitions
    pub types: IndexMap<QName, GlobalType>,
    /// Global attribute declarations
    pub attributes: IndexMap<QName, Arc<XsdAttribute>>,
    /// Attribute group definitions
    pub attribute_groups: IndexMap<QName, Arc<XsdAttributeGroup>>,
    /// Model group definitions
    pub groups: IndexMap<QName, Arc<XsdGroup>>,
    /// Global element declarations
    pub elements: IndexMap<QName, Arc<XsdElement>>,
    /// Global elements plus the element declarations reachable by expanding
    /// the global model groups
    pub base_elements: IndexMap<QName, Arc<XsdElement>>,
    /// Substitution group memberships: head name to member names
    pub substitution_groups: IndexMap<QName, Vec<QName>>,

    view_cache: RwLock<HashMap<ViewKey, View>>,
}

impl XsdGlobals {
    /// Create a registry seeded with the builtin types
    pub fn new() -> Self {
        let mut globals = Self {
            schemas: Vec::new(),
            namespaces: IndexMap::new(),
            resources: IndexMap::new(),
            types: IndexMap::new(),
            attributes: IndexMap::new(),
            attribute_groups: IndexMap::new(),
            groups: IndexMap::new(),
            elements: IndexMap::new(),
            base_elements: IndexMap::new(),
            substitution_groups: IndexMap::new(),
            view_cache: RwLock::new(HashMap::new()),
        };
        globals.seed_builtins();
        globals
    }

    fn seed_builtins(&mut self) {
        self.types.insert(
            xsd_qname(XSD_ANY_TYPE),
            GlobalType::Complex(Arc::new(XsdComplexType::any_type())),
        );
        for builtin in BUILTIN_TYPES.iter() {
            let name = xsd_qname(builtin.name);
            let atomic = XsdAtomicType::with_name(builtin.name, name.clone())
                .expect("builtin catalog is closed over its own names");
            self.types
                .insert(name, GlobalType::Simple(Arc::new(atomic)));
        }
        for (list_name, item_name) in LIST_BUILTINS {
            let name = xsd_qname(list_name);
            let item: SimpleTypeRc = Arc::new(
                XsdAtomicType::with_name(item_name, xsd_qname(item_name))
                    .expect("list item builtins exist"),
            );
            let list = XsdListType::with_name(item, name.clone());
            self.types.insert(name, GlobalType::Simple(Arc::new(list)));
        }
    }

    // ========== Registration ==========

    /// Register a schema document.
    ///
    /// Registration is idempotent: re-registering a document with an already
    /// known canonical URI (or an identical in-memory document) returns the
    /// existing entry. A different document claiming an already registered
    /// URI is a parse error.
    pub fn register(&mut self, document: SchemaDocument) -> Result<(usize, bool)> {
        if let Some(uri) = &document.uri {
            if let Some(&index) = self.resources.get(uri) {
                let existing = &self.schemas[index];
                if existing.target_namespace == document.target_namespace {
                    return Ok((index, false));
                }
                return Err(ParseError::new(format!(
                    "resource '{}' is already registered for namespace '{}'",
                    uri, existing.target_namespace
                ))
                .into());
            }
        } else {
            for (index, schema) in self.schemas.iter().enumerate() {
                if schema.uri.is_none()
                    && schema.target_namespace == document.target_namespace
                    && schema.root == document.root
                {
                    return Ok((index, false));
                }
            }
        }

        let index = self.schemas.len();
        if let Some(uri) = &document.uri {
            self.resources.insert(uri.clone(), index);
        }
        self.namespaces
            .entry(document.target_namespace.clone())
            .or_default()
            .push(index);
        self.schemas.push(document);
        self.invalidate_views();
        Ok((index, true))
    }

    /// Whether a canonical URI is already registered
    pub fn has_resource(&self, uri: &str) -> bool {
        self.resources.contains_key(uri)
    }

    /// Whether any document contributes to a namespace
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Number of registered documents
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Access a registered document by index
    pub fn schema(&self, index: usize) -> &SchemaDocument {
        &self.schemas[index]
    }

    /// Iterate over registered documents, grouped by namespace
    pub fn iter_schemas(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.namespaces
            .values()
            .flatten()
            .map(move |&index| &self.schemas[index])
    }

    pub(crate) fn mark_all_built(&mut self, built: bool) {
        for schema in &mut self.schemas {
            schema.built = built;
        }
    }

    // ========== Lookups ==========

    /// Look up a type by qualified name
    pub fn lookup_type(&self, name: &QName) -> Option<&GlobalType> {
        self.types.get(name)
    }

    /// Look up a global element by qualified name
    pub fn lookup_element(&self, name: &QName) -> Option<&Arc<XsdElement>> {
        self.elements.get(name)
    }

    /// Look up a global attribute by qualified name
    pub fn lookup_attribute(&self, name: &QName) -> Option<&Arc<XsdAttribute>> {
        self.attributes.get(name)
    }

    /// Look up an attribute group by qualified name
    pub fn lookup_attribute_group(&self, name: &QName) -> Option<&Arc<XsdAttributeGroup>> {
        self.attribute_groups.get(name)
    }

    /// Look up a model group by qualified name
    pub fn lookup_group(&self, name: &QName) -> Option<&Arc<XsdGroup>> {
        self.groups.get(name)
    }

    // ========== Substitution groups ==========

    /// The member declarations substitutable for a head element
    pub fn substitution_members(&self, head: &QName) -> Vec<Arc<XsdElement>> {
        match self.substitution_groups.get(head) {
            Some(names) => names
                .iter()
                .filter_map(|name| self.elements.get(name).cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether `member` heads to `head` through substitution group
    /// membership (transitively)
    pub fn is_substitute(&self, member: &QName, head: &QName) -> bool {
        let mut current = match self.elements.get(member) {
            Some(e) => e,
            None => return false,
        };
        let mut hops = 0;
        while let Some(next_head) = &current.substitution_group {
            if next_head == head {
                return true;
            }
            current = match self.elements.get(next_head) {
                Some(e) => e,
                None => return false,
            };
            hops += 1;
            if hops > self.elements.len() {
                return false;
            }
        }
        false
    }

    // ========== Projections ==========

    /// A cached projection of one global map filtered to a namespace.
    ///
    /// Keys are fully qualified (`{ns}local`) when `fqn_keys` is true, bare
    /// local names otherwise. The cache key is the
    /// (map, namespace, key-style) triple.
    pub fn get_globals(&self, map_name: MapName, namespace: &str, fqn_keys: bool) -> View {
        let key = (map_name, namespace.to_string(), fqn_keys);
        if let Some(view) = self.view_cache.read().expect("view cache poisoned").get(&key) {
            return view.clone();
        }

        let mut view = IndexMap::new();
        let project = |name: &QName| -> Option<String> {
            if name.in_namespace(namespace) {
                Some(if fqn_keys {
                    name.to_string()
                } else {
                    name.local_name.clone()
                })
            } else {
                None
            }
        };

        match map_name {
            MapName::Types => {
                for (name, value) in &self.types {
                    if let Some(k) = project(name) {
                        view.insert(k, GlobalRef::Type(value.clone()));
                    }
                }
            }
            MapName::Attributes => {
                for (name, value) in &self.attributes {
                    if let Some(k) = project(name) {
                        view.insert(k, GlobalRef::Attribute(value.clone()));
                    }
                }
            }
            MapName::AttributeGroups => {
                for (name, value) in &self.attribute_groups {
                    if let Some(k) = project(name) {
                        view.insert(k, GlobalRef::AttributeGroup(value.clone()));
                    }
                }
            }
            MapName::Groups => {
                for (name, value) in &self.groups {
                    if let Some(k) = project(name) {
                        view.insert(k, GlobalRef::Group(value.clone()));
                    }
                }
            }
            MapName::Elements => {
                for (name, value) in &self.elements {
                    if let Some(k) = project(name) {
                        view.insert(k, GlobalRef::Element(value.clone()));
                    }
                }
            }
        }

        let view: View = Arc::new(view);
        self.view_cache
            .write()
            .expect("view cache poisoned")
            .insert(key, view.clone());
        view
    }

    pub(crate) fn invalidate_views(&self) {
        self.view_cache
            .write()
            .expect("view cache poisoned")
            .clear();
    }

    // ========== Lifecycle ==========

    /// Empty the global maps, re-seed the builtins and mark every
    /// registered document as not built.
    ///
    /// When `remove_schemas` is true the registered documents are dropped
    /// too.
    pub fn clear(&mut self, remove_schemas: bool) {
        self.types.clear();
        self.attributes.clear();
        self.attribute_groups.clear();
        self.groups.clear();
        self.elements.clear();
        self.base_elements.clear();
        self.substitution_groups.clear();
        self.invalidate_views();
        self.seed_builtins();
        self.mark_all_built(false);

        if remove_schemas {
            self.schemas.clear();
            self.namespaces.clear();
            self.resources.clear();
        }
    }

    /// A shallow duplicate: compiled declarations are shared, the maps and
    /// the registered document list are independent.
    pub fn copy(&self) -> Self {
        Self {
            schemas: self.schemas.clone(),
            namespaces: self.namespaces.clone(),
            resources: self.resources.clone(),
            types: self.types.clone(),
            attributes: self.attributes.clone(),
            attribute_groups: self.attribute_groups.clone(),
            groups: self.groups.clone(),
            elements: self.elements.clone(),
            base_elements: self.base_elements.clone(),
            substitution_groups: self.substitution_groups.clone(),
            view_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Run the two-phase builder pipeline over every registered document.
    pub fn build(&mut self) -> Result<()> {
        super::builders::build(self)?;
        self.invalidate_views();
        Ok(())
    }

    /// Whether every registered document is built
    pub fn is_built(&self) -> bool {
        self.schemas.iter().all(|s| s.built)
    }

    /// Count of XSD-namespace builtin type entries
    pub fn builtin_type_count() -> usize {
        // anyType + the simple builtins + the three list builtins
        1 + BUILTIN_TYPES.len() + LIST_BUILTINS.len()
    }

    /// Names of user (non-builtin) types
    pub fn user_type_names(&self) -> Vec<QName> {
        self.types
            .keys()
            .filter(|name| !name.in_namespace(XSD_NAMESPACE))
            .cloned()
            .collect()
    }
}

impl Default for XsdGlobals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::builtins::{XSD_INTEGER, XSD_STRING};
    use crate::validators::elements::ElementType;

    #[test]
    fn test_new_is_seeded_with_builtins() {
        let globals = XsdGlobals::new();
        assert_eq!(globals.types.len(), XsdGlobals::builtin_type_count());
        assert!(globals.lookup_type(&xsd_qname(XSD_STRING)).is_some());
        assert!(globals.lookup_type(&xsd_qname(XSD_INTEGER)).is_some());
        assert!(globals
            .lookup_type(&xsd_qname(XSD_ANY_TYPE))
            .unwrap()
            .is_complex());
        assert!(globals.lookup_type(&xsd_qname("IDREFS")).is_some());
    }

    #[test]
    fn test_projection_cache_coherence() {
        let mut globals = XsdGlobals::new();
        let name = QName::namespaced("urn:x", "e");
        globals.elements.insert(
            name.clone(),
            Arc::new(XsdElement::new(name.clone(), ElementType::AnyType)),
        );

        let fqn_view = globals.get_globals(MapName::Elements, "urn:x", true);
        assert_eq!(fqn_view.len(), 1);
        assert!(fqn_view.contains_key("{urn:x}e"));

        let local_view = globals.get_globals(MapName::Elements, "urn:x", false);
        assert!(local_view.contains_key("e"));

        // The projection contains exactly the namespace's entries
        let other = globals.get_globals(MapName::Elements, "urn:y", true);
        assert!(other.is_empty());

        // Cached instance is returned on repeat calls
        let again = globals.get_globals(MapName::Elements, "urn:x", true);
        assert!(Arc::ptr_eq(&fqn_view, &again));
    }

    #[test]
    fn test_builtin_projection() {
        let globals = XsdGlobals::new();
        let view = globals.get_globals(MapName::Types, XSD_NAMESPACE, false);
        assert!(view.contains_key("string"));
        assert!(view.contains_key("anyType"));
    }

    #[test]
    fn test_clear_restores_builtins() {
        let mut globals = XsdGlobals::new();
        let name = QName::namespaced("urn:x", "t");
        let atomic = XsdAtomicType::with_name(XSD_STRING, name.clone()).unwrap();
        globals
            .types
            .insert(name, GlobalType::Simple(Arc::new(atomic)));
        assert_eq!(globals.types.len(), XsdGlobals::builtin_type_count() + 1);

        globals.clear(false);
        assert_eq!(globals.types.len(), XsdGlobals::builtin_type_count());
    }

    #[test]
    fn test_copy_shares_declarations() {
        let mut globals = XsdGlobals::new();
        let name = QName::namespaced("urn:x", "e");
        globals.elements.insert(
            name.clone(),
            Arc::new(XsdElement::new(name.clone(), ElementType::AnyType)),
        );

        let copy = globals.copy();
        assert!(Arc::ptr_eq(
            globals.elements.get(&name).unwrap(),
            copy.elements.get(&name).unwrap()
        ));

        // Independent maps
        let mut copy = copy;
        copy.elements.clear();
        assert!(globals.elements.contains_key(&name));
    }

    #[test]
    fn test_substitution_chain() {
        let mut globals = XsdGlobals::new();
        let head = QName::local("head");
        let mid = QName::local("mid");
        let leaf = QName::local("leaf");

        globals.elements.insert(
            head.clone(),
            Arc::new(XsdElement::new(head.clone(), ElementType::AnyType)),
        );
        globals.elements.insert(
            mid.clone(),
            Arc::new(
                XsdElement::new(mid.clone(), ElementType::AnyType)
                    .with_substitution_group(head.clone()),
            ),
        );
        globals.elements.insert(
            leaf.clone(),
            Arc::new(
                XsdElement::new(leaf.clone(), ElementType::AnyType)
                    .with_substitution_group(mid.clone()),
            ),
        );

        assert!(globals.is_substitute(&mid, &head));
        assert!(globals.is_substitute(&leaf, &head));
        assert!(!globals.is_substitute(&head, &leaf));
    }
}
