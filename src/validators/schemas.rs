//! Schema documents and the compiled schema surface
//!
//! A [`SchemaDocument`] is one XSD file of a compile session: it owns its
//! root element tree, its prefix map, its target namespace and its
//! include/import/redefine behavior. Documents register themselves with a
//! shared [`XsdGlobals`] registry; whoever created the registry runs the
//! build. The [`Schema`] type packages a built registry with its root
//! document and exposes validation and decoding.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::documents::{Document, Element};
use crate::error::{Error, ParseError, Result, ValidationError};
use crate::loaders::Loader;
use crate::locations::Location;
use crate::namespaces::{NamespaceContext, QName};
use crate::xpath;
use crate::{XML_NAMESPACE, XSI_NAMESPACE};

use super::base::{check_tag, is_xsd_tag, xsd_qname, FormDefault};
use super::complex_types::XsdComplexType;
use super::elements::{ElementType, XsdElement};
use super::globals::{GlobalType, MapName, XsdGlobals};
use super::validation::{self, DecodeIter, DecodeOptions};

/// One XSD document registered in a compile session
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Canonical URI, None for in-memory sources
    pub uri: Option<String>,
    /// Target namespace, the empty string meaning "no namespace"
    pub target_namespace: String,
    /// The document's elementFormDefault
    pub element_form_default: FormDefault,
    /// The document's attributeFormDefault
    pub attribute_form_default: FormDefault,
    /// In-scope prefix map of the schema root
    pub namespaces: NamespaceContext,
    /// The root `xs:schema` element tree
    pub root: Element,
    /// Set once the registry's build pipeline has completed
    pub built: bool,
    /// xsi:schemaLocation hints: namespace to candidate locations
    pub schema_locations: IndexMap<String, Vec<String>>,
    /// xsi:noNamespaceSchemaLocation hint
    pub no_namespace_schema_location: Option<String>,
}

impl SchemaDocument {
    /// Parse a loaded resource into a schema document.
    ///
    /// When the caller expects a namespace and the document declares a
    /// different one the parse fails; a document with no target namespace
    /// adopts the expected one (chameleon include).
    pub fn parse(
        root: Element,
        uri: Option<String>,
        expected_namespace: Option<&str>,
    ) -> Result<Self> {
        check_tag(&root, "schema")?;

        let mut target_namespace = root
            .get_attribute("targetNamespace")
            .unwrap_or("")
            .trim()
            .to_string();
        if let Some(expected) = expected_namespace {
            if target_namespace != expected {
                if !target_namespace.is_empty() {
                    return Err(ParseError::new(format!(
                        "wrong namespace ('{}' instead of '{}') for the XSD resource {}",
                        target_namespace,
                        expected,
                        uri.as_deref().unwrap_or("<string>")
                    ))
                    .into());
                }
                target_namespace = expected.to_string();
            }
        }

        let element_form_default = root
            .get_attribute("elementFormDefault")
            .and_then(FormDefault::parse)
            .unwrap_or_default();
        let attribute_form_default = root
            .get_attribute("attributeFormDefault")
            .and_then(FormDefault::parse)
            .unwrap_or_default();

        let mut namespaces = root.namespaces.clone();
        if !namespaces.contains("xml") {
            namespaces.add_prefix("xml", XML_NAMESPACE);
        }
        if !namespaces.contains("") {
            // Bare names in the document resolve to the target namespace
            namespaces.add_prefix("", target_namespace.clone());
        }

        let mut schema_locations: IndexMap<String, Vec<String>> = IndexMap::new();
        if let Some(hints) = root.get_attribute_ns(XSI_NAMESPACE, "schemaLocation") {
            let tokens: Vec<&str> = hints.split_whitespace().collect();
            for pair in tokens.chunks(2) {
                if let [namespace, location] = pair {
                    schema_locations
                        .entry(namespace.to_string())
                        .or_default()
                        .push(location.to_string());
                }
            }
        }
        let no_namespace_schema_location = root
            .get_attribute_ns(XSI_NAMESPACE, "noNamespaceSchemaLocation")
            .map(|s| s.to_string());

        Ok(Self {
            uri,
            target_namespace,
            element_form_default,
            attribute_form_default,
            namespaces,
            root,
            built: false,
            schema_locations,
            no_namespace_schema_location,
        })
    }

    /// The prefix mapped to the target namespace, empty when none is
    pub fn target_prefix(&self) -> &str {
        self.namespaces
            .iter()
            .find(|(prefix, ns)| !prefix.is_empty() && *ns == self.target_namespace)
            .map(|(prefix, _)| prefix)
            .unwrap_or("")
    }

    /// Location hints for a namespace, from the xsi attributes
    pub fn get_locations(&self, namespace: &str) -> Option<String> {
        if namespace.is_empty() {
            return self.no_namespace_schema_location.clone();
        }
        self.schema_locations
            .get(namespace)
            .map(|locations| locations.join(" "))
    }
}

/// Load a schema source into a registry, recursing into its includes,
/// imports and redefines. Returns the index of the registered document.
pub(crate) fn load_schema_source(
    maps: &mut XsdGlobals,
    loader: &Loader,
    source: &str,
    base_uri: Option<&str>,
    expected_namespace: Option<&str>,
    check_schema: bool,
) -> Result<usize> {
    let resource = loader.load_xml_resource(source, base_uri)?;
    let document = SchemaDocument::parse(resource.root, resource.uri, expected_namespace)?;

    if check_schema {
        meta::check_schema(&document.root)?;
    }

    let doc_uri = document.uri.clone();
    let target_namespace = document.target_namespace.clone();
    let root = document.root.clone();
    let locations_of = {
        let doc = &document;
        let mut hints: IndexMap<String, String> = IndexMap::new();
        for child in root.iter_children() {
            if is_xsd_tag(child, "import") {
                let namespace = child.get_attribute("namespace").unwrap_or("").trim();
                if let Some(found) = doc.get_locations(namespace) {
                    hints.insert(namespace.to_string(), found);
                }
            }
        }
        hints
    };

    let (index, newly_registered) = maps.register(document)?;
    if !newly_registered {
        return Ok(index);
    }

    for child in root.iter_children() {
        if is_xsd_tag(child, "include") || is_xsd_tag(child, "redefine") {
            let verb = child.local_name().to_string();
            let location = child.get_attribute("schemaLocation").ok_or_else(|| {
                ParseError::new(format!("'{}' requires a schemaLocation attribute", verb))
            })?;
            if already_registered(maps, location, doc_uri.as_deref()) {
                continue;
            }
            load_schema_source(
                maps,
                loader,
                location,
                doc_uri.as_deref(),
                Some(&target_namespace),
                check_schema,
            )
            .map_err(|e| e.at_location(&format!("{} '{}'", verb, location)))?;
        } else if is_xsd_tag(child, "import") {
            let namespace = child.get_attribute("namespace").unwrap_or("").trim().to_string();
            if maps.has_namespace(&namespace) {
                continue;
            }
            let location = child
                .get_attribute("schemaLocation")
                .map(|s| s.to_string())
                .or_else(|| locations_of.get(&namespace).cloned());
            let Some(location) = location else {
                // An import with no resolvable location is a promise, not
                // an obligation
                continue;
            };
            if already_registered(maps, &location, doc_uri.as_deref()) {
                continue;
            }
            let expected = if namespace.is_empty() {
                target_namespace.clone()
            } else {
                namespace.clone()
            };
            load_schema_source(
                maps,
                loader,
                &location,
                doc_uri.as_deref(),
                Some(&expected),
                check_schema,
            )
            .map_err(|e| e.at_location(&format!("import of namespace '{}'", namespace)))?;
        }
    }

    Ok(index)
}

fn already_registered(maps: &XsdGlobals, location: &str, base_uri: Option<&str>) -> bool {
    Location::resolve(location, base_uri)
        .ok()
        .and_then(|l| l.canonical_uri().ok())
        .map(|uri| maps.has_resource(&uri))
        .unwrap_or(false)
}

/// The bundled base schemas and the meta-schema hook
pub(crate) mod meta {
    use super::*;

    const XML_MINIMAL_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.w3.org/XML/1998/namespace"
           attributeFormDefault="qualified">
    <xs:attribute name="lang" type="xs:language"/>
    <xs:attribute name="base" type="xs:anyURI"/>
    <xs:attribute name="id" type="xs:ID"/>
    <xs:attribute name="space" default="preserve">
        <xs:simpleType>
            <xs:restriction base="xs:NCName">
                <xs:enumeration value="default"/>
                <xs:enumeration value="preserve"/>
            </xs:restriction>
        </xs:simpleType>
    </xs:attribute>
</xs:schema>"#;

    const XSI_MINIMAL_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.w3.org/2001/XMLSchema-instance"
           attributeFormDefault="qualified">
    <xs:attribute name="nil" type="xs:boolean"/>
    <xs:attribute name="type" type="xs:QName"/>
    <xs:attribute name="schemaLocation" type="xs:anySimpleType"/>
    <xs:attribute name="noNamespaceSchemaLocation" type="xs:anyURI"/>
</xs:schema>"#;

    static BASE: Lazy<Option<XsdGlobals>> = Lazy::new(|| {
        let loader = Loader::new();
        let mut maps = XsdGlobals::new();
        load_schema_source(&mut maps, &loader, XML_MINIMAL_XSD, None, None, false).ok()?;
        load_schema_source(&mut maps, &loader, XSI_MINIMAL_XSD, None, None, false).ok()?;
        maps.build().ok()?;
        Some(maps)
    });

    /// A fresh registry for a new compile session: a clone of the
    /// process-wide base registry, or an empty one if its build failed
    pub(crate) fn base_maps() -> XsdGlobals {
        match &*BASE {
            Some(maps) => maps.copy(),
            None => XsdGlobals::new(),
        }
    }

    /// Validate an XSD document tree against the meta-schema.
    ///
    /// The full W3C meta-schema document is data this crate does not
    /// bundle; when it is absent from the base registry the check is a
    /// no-op, matching the behavior of a session without a meta-schema.
    pub(crate) fn check_schema(root: &Element) -> Result<()> {
        let Some(maps) = BASE.as_ref() else {
            return Ok(());
        };
        if maps.lookup_element(&xsd_qname("schema")).is_none() {
            return Ok(());
        }
        let options = DecodeOptions::default();
        let errors = validation::document_errors(maps, root, &options);
        match errors.into_iter().next() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

/// Options for constructing a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaOptions {
    /// Expected target namespace; a mismatch fails, a chameleon document
    /// adopts it
    pub namespace: Option<String>,
    /// Validate the XSD document against the meta-schema before building
    pub check_schema: bool,
    /// Resource loader for the source and its includes/imports
    pub loader: Loader,
    /// Shared registry for multi-document sessions; the schema builds the
    /// registry only when it created it
    pub maps: Option<XsdGlobals>,
}

/// A compiled XML Schema
#[derive(Debug)]
pub struct Schema {
    maps: XsdGlobals,
    doc: usize,
    loader: Loader,
}

impl Schema {
    /// Construct a schema from a source: raw XSD text, a filesystem path or
    /// a URI.
    pub fn new(source: &str, options: SchemaOptions) -> Result<Self> {
        let SchemaOptions {
            namespace,
            check_schema,
            loader,
            maps,
        } = options;

        let creates_registry = maps.is_none();
        let mut maps = maps.unwrap_or_else(meta::base_maps);
        let doc = load_schema_source(
            &mut maps,
            &loader,
            source,
            None,
            namespace.as_deref(),
            check_schema,
        )?;
        if creates_registry {
            maps.build()?;
        }

        Ok(Self { maps, doc, loader })
    }

    /// Construct from XSD text
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(text, SchemaOptions::default())
    }

    /// Construct from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path
            .to_str()
            .ok_or_else(|| Error::Type(format!("non UTF-8 path: {:?}", path)))?;
        Self::new(source, SchemaOptions::default())
    }

    /// Construct from a location (path or URI)
    pub fn from_location(location: &str) -> Result<Self> {
        Self::new(location, SchemaOptions::default())
    }

    /// Run the registry build, for sessions constructed over a shared
    /// registry
    pub fn build(&mut self) -> Result<()> {
        self.maps.build()
    }

    /// The registry of this schema's compile session
    pub fn maps(&self) -> &XsdGlobals {
        &self.maps
    }

    /// The registry, mutable (registration, clear)
    pub fn maps_mut(&mut self) -> &mut XsdGlobals {
        &mut self.maps
    }

    /// The root schema document
    pub fn document(&self) -> &SchemaDocument {
        self.maps.schema(self.doc)
    }

    /// The target namespace, empty when none
    pub fn target_namespace(&self) -> &str {
        &self.document().target_namespace
    }

    /// The prefix mapped to the target namespace
    pub fn target_prefix(&self) -> &str {
        self.document().target_prefix()
    }

    /// Whether the session is built
    pub fn is_built(&self) -> bool {
        self.maps.is_built()
    }

    // ========== Namespace-filtered views ==========

    /// Types of the target namespace, keyed by local name
    pub fn types(&self) -> Arc<IndexMap<String, super::globals::GlobalRef>> {
        self.maps
            .get_globals(MapName::Types, self.target_namespace(), false)
    }

    /// Global elements of the target namespace, keyed by local name
    pub fn elements(&self) -> Arc<IndexMap<String, super::globals::GlobalRef>> {
        self.maps
            .get_globals(MapName::Elements, self.target_namespace(), false)
    }

    /// Global attributes of the target namespace, keyed by local name
    pub fn attributes(&self) -> Arc<IndexMap<String, super::globals::GlobalRef>> {
        self.maps
            .get_globals(MapName::Attributes, self.target_namespace(), false)
    }

    /// Model groups of the target namespace, keyed by local name
    pub fn groups(&self) -> Arc<IndexMap<String, super::globals::GlobalRef>> {
        self.maps
            .get_globals(MapName::Groups, self.target_namespace(), false)
    }

    /// Attribute groups of the target namespace, keyed by local name
    pub fn attribute_groups(&self) -> Arc<IndexMap<String, super::globals::GlobalRef>> {
        self.maps
            .get_globals(MapName::AttributeGroups, self.target_namespace(), false)
    }

    // ========== Element declaration selection ==========

    /// Find the first element declaration matched by a path
    pub fn find(&self, path: &str, namespaces: Option<&NamespaceContext>) -> Result<Option<Arc<XsdElement>>> {
        Ok(self.iterfind(path, namespaces)?.into_iter().next())
    }

    /// Find all element declarations matched by a path
    pub fn findall(&self, path: &str, namespaces: Option<&NamespaceContext>) -> Result<Vec<Arc<XsdElement>>> {
        self.iterfind(path, namespaces)
    }

    /// Select element declarations by a path expression
    pub fn iterfind(
        &self,
        path: &str,
        namespaces: Option<&NamespaceContext>,
    ) -> Result<Vec<Arc<XsdElement>>> {
        let default_ctx = &self.document().namespaces;
        let ctx = namespaces.unwrap_or(default_ctx);
        let selector = xpath::parse(path, ctx)?;
        let matched = xpath::select(&selector, SchemaNode::Root(&self.maps));
        Ok(matched
            .into_iter()
            .filter_map(|node| match node {
                SchemaNode::Root(_) => None,
                SchemaNode::Element { decl, .. } => Some(decl),
            })
            .collect())
    }

    /// Iterate over element declarations in schema order: global elements
    /// and, recursively, the local declarations of their content models.
    pub fn iter(&self, name: Option<&QName>) -> Vec<Arc<XsdElement>> {
        let mut out = Vec::new();
        let mut visited: Vec<*const XsdElement> = Vec::new();
        for decl in self.maps.elements.values() {
            collect_element_tree(&self.maps, decl, name, &mut out, &mut visited);
        }
        out
    }

    /// Iterate over the global element declarations, sorted by name
    pub fn iterchildren(&self, name: Option<&QName>) -> Vec<Arc<XsdElement>> {
        let mut globals: Vec<_> = self
            .maps
            .elements
            .values()
            .filter(|decl| name.is_none() || Some(&decl.name) == name)
            .cloned()
            .collect();
        globals.sort_by(|a, b| a.name.cmp(&b.name));
        globals
    }

    // ========== Validation and decoding ==========

    /// Validate a document, failing on the first validation error
    pub fn validate(&self, doc: &Document) -> Result<()> {
        match self.iter_errors(doc, None)?.next() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    /// Whether a document is valid against this schema
    pub fn is_valid(&self, doc: &Document) -> bool {
        match self.iter_errors(doc, None) {
            Ok(mut errors) => errors.next().is_none(),
            Err(_) => false,
        }
    }

    /// Lazily yield the validation errors of a document, optionally
    /// anchored at a path
    pub fn iter_errors<'a>(
        &'a self,
        doc: &'a Document,
        path: Option<&str>,
    ) -> Result<impl Iterator<Item = ValidationError> + 'a> {
        let options = DecodeOptions {
            skip_errors: true,
            ..DecodeOptions::default()
        };
        let iter = self.iter_decode(doc, path, options)?;
        Ok(iter.filter_map(|outcome| match outcome {
            validation::DecodeOutcome::Error(e) => Some(e),
            validation::DecodeOutcome::Value(_) => None,
        }))
    }

    /// Lazily decode a document into values and errors, in document order
    pub fn iter_decode<'a>(
        &'a self,
        doc: &'a Document,
        path: Option<&str>,
        options: DecodeOptions,
    ) -> Result<DecodeIter<'a>> {
        validation::iter_decode(self, doc, path, options)
    }

    /// Decode the first matched value, failing on any embedded error
    pub fn to_dict(
        &self,
        doc: &Document,
        path: Option<&str>,
        options: DecodeOptions,
    ) -> Result<serde_json::Value> {
        let mut options = options;
        // Instance documents carry their own prefixes; merge the ones the
        // caller did not pin
        let mut namespaces = options.namespaces.take().unwrap_or_default();
        namespaces.extend_missing(&doc.root.namespaces);
        options.namespaces = Some(namespaces);

        for outcome in self.iter_decode(doc, path, options)? {
            match outcome {
                validation::DecodeOutcome::Error(e) => return Err(e.into()),
                validation::DecodeOutcome::Value(v) => return Ok(v),
            }
        }
        Err(Error::Validation(ValidationError::new(
            "no content was decoded",
        )))
    }

    /// Validate an XML string
    pub fn is_valid_str(&self, xml: &str) -> bool {
        match Document::from_str(xml) {
            Ok(doc) => self.is_valid(&doc),
            Err(_) => false,
        }
    }

    /// Decode an XML string
    pub fn to_dict_str(
        &self,
        xml: &str,
        path: Option<&str>,
        options: DecodeOptions,
    ) -> Result<serde_json::Value> {
        let doc = Document::from_str(xml)?;
        self.to_dict(&doc, path, options)
    }

    /// The loader used for this schema's resources
    pub fn loader(&self) -> &Loader {
        &self.loader
    }
}

fn collect_element_tree(
    maps: &XsdGlobals,
    decl: &Arc<XsdElement>,
    name: Option<&QName>,
    out: &mut Vec<Arc<XsdElement>>,
    visited: &mut Vec<*const XsdElement>,
) {
    let ptr = Arc::as_ptr(decl);
    if visited.contains(&ptr) {
        return;
    }
    visited.push(ptr);

    if name.is_none() || Some(&decl.name) == name {
        out.push(decl.clone());
    }
    for child in element_decl_children(maps, decl) {
        collect_element_tree(maps, &child, name, out, visited);
    }
}

/// The child element declarations of a declaration, through its content model
pub(crate) fn element_decl_children(
    maps: &XsdGlobals,
    decl: &Arc<XsdElement>,
) -> Vec<Arc<XsdElement>> {
    let resolved: Arc<XsdElement> = match &decl.ref_element {
        Some(name) => match maps.lookup_element(name) {
            Some(target) => target.clone(),
            None => return Vec::new(),
        },
        None => decl.clone(),
    };

    let complex: Option<Arc<XsdComplexType>> = match &resolved.element_type {
        ElementType::Complex(ct) => Some(ct.clone()),
        ElementType::Named(type_name) => match maps.lookup_type(type_name) {
            Some(GlobalType::Complex(ct)) => Some(ct.clone()),
            _ => None,
        },
        _ => None,
    };

    match complex.and_then(|ct| ct.model_group().cloned()) {
        Some(group) => group.iter_elements(),
        None => Vec::new(),
    }
}

/// A path-selectable view over the schema's declaration tree.
///
/// Element nodes carry the trail of declarations above them; a recursive
/// type's re-entrant declaration is not expanded again, which keeps
/// descendant selection finite.
#[derive(Clone)]
pub(crate) enum SchemaNode<'a> {
    /// The virtual schema root: its children are the global elements
    Root(&'a XsdGlobals),
    /// An element declaration node with the trail that led to it
    Element {
        /// The session registry
        maps: &'a XsdGlobals,
        /// The declaration at this node
        decl: Arc<XsdElement>,
        /// Declarations already expanded on the way here
        trail: Vec<*const XsdElement>,
    },
}

impl<'a> xpath::PathNode for SchemaNode<'a> {
    fn node_name(&self) -> QName {
        match self {
            SchemaNode::Root(_) => QName::local("#schema"),
            SchemaNode::Element { decl, .. } => decl.name.clone(),
        }
    }

    fn child_nodes(&self) -> Vec<Self> {
        match self {
            SchemaNode::Root(maps) => {
                let maps: &'a XsdGlobals = maps;
                maps.elements
                    .values()
                    .map(|decl| SchemaNode::Element {
                        maps,
                        decl: decl.clone(),
                        trail: vec![Arc::as_ptr(decl)],
                    })
                    .collect()
            }
            SchemaNode::Element { maps, decl, trail } => {
                let maps: &'a XsdGlobals = maps;
                element_decl_children(maps, decl)
                    .into_iter()
                    .filter(|child| !trail.contains(&Arc::as_ptr(child)))
                    .map(|child| {
                        let mut trail = trail.clone();
                        trail.push(Arc::as_ptr(&child));
                        SchemaNode::Element {
                            maps,
                            decl: child,
                            trail,
                        }
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VEHICLES_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               xmlns:vh="urn:vehicles" targetNamespace="urn:vehicles"
               elementFormDefault="qualified">
        <xs:element name="vehicles">
            <xs:complexType>
                <xs:sequence>
                    <xs:element ref="vh:cars"/>
                </xs:sequence>
            </xs:complexType>
        </xs:element>
        <xs:element name="cars">
            <xs:complexType>
                <xs:sequence>
                    <xs:element name="car" minOccurs="0" maxOccurs="unbounded" type="vh:vehicleType"/>
                </xs:sequence>
            </xs:complexType>
        </xs:element>
        <xs:complexType name="vehicleType">
            <xs:attribute name="model" type="xs:string" use="required"/>
        </xs:complexType>
    </xs:schema>"#;

    #[test]
    fn test_document_parse() {
        let doc = Document::from_str(VEHICLES_XSD).unwrap();
        let schema_doc = SchemaDocument::parse(doc.root, None, None).unwrap();
        assert_eq!(schema_doc.target_namespace, "urn:vehicles");
        assert!(schema_doc.element_form_default.is_qualified());
        assert_eq!(schema_doc.target_prefix(), "vh");
        assert!(!schema_doc.built);
    }

    #[test]
    fn test_document_rejects_wrong_root() {
        let doc = Document::from_str("<root/>").unwrap();
        assert!(SchemaDocument::parse(doc.root, None, None).is_err());
    }

    #[test]
    fn test_expected_namespace_mismatch() {
        let doc = Document::from_str(VEHICLES_XSD).unwrap();
        let err = SchemaDocument::parse(doc.root, None, Some("urn:other")).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_chameleon_adoption() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="b" type="xs:string"/>
        </xs:schema>"#;
        let doc = Document::from_str(xsd).unwrap();
        let schema_doc = SchemaDocument::parse(doc.root, None, Some("urn:x")).unwrap();
        assert_eq!(schema_doc.target_namespace, "urn:x");
    }

    #[test]
    fn test_schema_location_hints() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xsi:schemaLocation="urn:a a.xsd urn:b b.xsd"/>"#;
        let doc = Document::from_str(xsd).unwrap();
        let schema_doc = SchemaDocument::parse(doc.root, None, None).unwrap();
        assert_eq!(schema_doc.get_locations("urn:a").as_deref(), Some("a.xsd"));
        assert_eq!(schema_doc.get_locations("urn:b").as_deref(), Some("b.xsd"));
        assert!(schema_doc.get_locations("urn:c").is_none());
    }

    #[test]
    fn test_schema_compiles_and_finds_declarations() {
        let schema = Schema::from_text(VEHICLES_XSD).unwrap();
        assert!(schema.is_built());
        assert_eq!(schema.target_namespace(), "urn:vehicles");

        let elements = schema.elements();
        assert!(elements.contains_key("vehicles"));
        assert!(elements.contains_key("cars"));

        let types = schema.types();
        assert!(types.contains_key("vehicleType"));
    }

    #[test]
    fn test_find_by_path() {
        let schema = Schema::from_text(VEHICLES_XSD).unwrap();

        let root = schema.find("/vh:vehicles", None).unwrap();
        assert!(root.is_some());

        let car = schema.find("/vh:cars/vh:car", None).unwrap().unwrap();
        assert_eq!(car.name.local_name, "car");

        let nothing = schema.find("/vh:nothing", None).unwrap();
        assert!(nothing.is_none());
    }

    #[test]
    fn test_iterchildren_sorted() {
        let schema = Schema::from_text(VEHICLES_XSD).unwrap();
        let names: Vec<String> = schema
            .iterchildren(None)
            .iter()
            .map(|e| e.name.local_name.clone())
            .collect();
        assert_eq!(names, vec!["cars", "vehicles"]);
    }

    #[test]
    fn test_base_maps_is_isolated() {
        let maps1 = meta::base_maps();
        let mut maps2 = meta::base_maps();
        let before = maps1.types.len();
        maps2.clear(true);
        assert_eq!(maps1.types.len(), before);
    }
}
