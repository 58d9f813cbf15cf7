//! XML document handling
//!
//! An owned element-tree representation of XML documents. Source buffers are
//! parsed with `roxmltree` and converted into `Element` trees so that
//! compiled schemas and loaded instances outlive the raw text.

use indexmap::IndexMap;

use crate::error::{ParseError, Result};
use crate::namespaces::{NamespaceContext, QName};
use crate::XMLNS_NAMESPACE;

/// An XML element with its attributes, text, children and in-scope prefixes
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element tag
    pub tag: QName,
    /// Attributes in document order
    pub attributes: IndexMap<QName, String>,
    /// Concatenated direct text content, None when the element has no text
    pub text: Option<String>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Namespace declarations in scope at this element
    pub namespaces: NamespaceContext,
}

impl Element {
    /// Create an element with a tag and no content
    pub fn new(tag: QName) -> Self {
        Self {
            tag,
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// The local part of the tag
    pub fn local_name(&self) -> &str {
        &self.tag.local_name
    }

    /// The namespace of the tag, if any
    pub fn namespace(&self) -> Option<&str> {
        self.tag.namespace.as_deref()
    }

    /// Look up an unqualified attribute by local name
    pub fn get_attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| qname.namespace.is_none() && qname.local_name == local_name)
            .map(|(_, value)| value.as_str())
    }

    /// Look up a namespace-qualified attribute
    pub fn get_attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| {
                qname.namespace.as_deref() == Some(namespace) && qname.local_name == local_name
            })
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over child elements
    pub fn iter_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// Find the first child with the given namespace and local name
    pub fn find_child(&self, namespace: Option<&str>, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|child| {
            child.tag.namespace.as_deref() == namespace && child.local_name() == local_name
        })
    }

    /// The element's text with surrounding whitespace kept
    pub fn text_content(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Whether the element carries neither text (beyond whitespace) nor children
    pub fn is_empty_content(&self) -> bool {
        self.children.is_empty() && self.text_content().trim().is_empty()
    }
}

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    /// Root element
    pub root: Element,
    /// Canonical URI of the source, when known
    pub uri: Option<String>,
}

impl Document {
    /// Parse a document from a string
    pub fn from_str(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text).map_err(|e| {
            ParseError::new("XML document is not well-formed").with_reason(e.to_string())
        })?;
        Ok(Self {
            root: convert_node(doc.root_element()),
            uri: None,
        })
    }

    /// Parse a document from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ParseError::new("XML document is not valid UTF-8").with_reason(e.to_string())
        })?;
        Self::from_str(text)
    }

    /// Attach a source URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

fn convert_node(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = QName::new(node.tag_name().namespace(), node.tag_name().name());
    let mut element = Element::new(tag);

    for ns in node.namespaces() {
        if ns.uri() != XMLNS_NAMESPACE {
            element
                .namespaces
                .add_prefix(ns.name().unwrap_or(""), ns.uri());
        }
    }

    for attr in node.attributes() {
        let name = QName::new(attr.namespace(), attr.name());
        element.attributes.insert(name, attr.value().to_string());
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            element.children.push(convert_node(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or(""));
        }
    }
    if !text.is_empty() {
        element.text = Some(text);
    }

    element
}
