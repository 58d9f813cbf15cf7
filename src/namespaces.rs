//! XML namespace handling
//!
//! Qualified names and namespace prefix mappings. The canonical identity of
//! every global declaration is its fully qualified name: namespace URI plus
//! local name, written `{namespace}local`. Prefixed forms (`xs:string`) are
//! only an input/output surface resolved against a prefix map.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::names;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name: namespace URI paired with a local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        let namespace = namespace.map(|s| s.into()).filter(|s: &String| !s.is_empty());
        Self {
            namespace,
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace), local_name)
    }

    /// Parse the extended form `{namespace}local`, or a bare local name
    pub fn from_extended(name: &str) -> Result<Self> {
        if let Some(rest) = name.strip_prefix('{') {
            match rest.split_once('}') {
                Some((ns, local)) if !local.is_empty() => Ok(Self::new(Some(ns), local)),
                _ => Err(Error::Type(format!("malformed extended name: '{}'", name))),
            }
        } else {
            Ok(Self::local(name))
        }
    }

    /// The namespace URI, with the empty string standing for "no namespace"
    pub fn namespace_uri(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    /// Whether this name belongs to the given namespace (empty = no namespace)
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace_uri() == namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Namespace context: an ordered mapping from prefix to namespace URI.
///
/// The empty prefix entry holds the default namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    prefixes: IndexMap<Prefix, NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping (empty prefix sets the default namespace)
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace, if declared
    pub fn default_namespace(&self) -> Option<&str> {
        self.get_namespace("").filter(|ns| !ns.is_empty())
    }

    /// Whether a prefix is mapped
    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    /// Find a prefix mapped to the given namespace URI
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, ns)| ns.as_str() == namespace)
            .map(|(p, _)| p.as_str())
    }

    /// Iterate over (prefix, namespace) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// Merge declarations from another context, keeping existing entries
    pub fn extend_missing(&mut self, other: &NamespaceContext) {
        for (prefix, ns) in other.iter() {
            if !self.prefixes.contains_key(prefix) {
                self.prefixes.insert(prefix.to_string(), ns.to_string());
            }
        }
    }

    /// Resolve a `prefix:local` or bare name to a QName.
    ///
    /// A bare name takes the default namespace; an unknown prefix fails.
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        names::validate_qname(prefixed_name)?;
        match prefixed_name.split_once(':') {
            Some((prefix, local)) => {
                let namespace = self.get_namespace(prefix).ok_or_else(|| {
                    Error::Type(format!("unknown namespace prefix: '{}'", prefix))
                })?;
                Ok(QName::namespaced(namespace, local))
            }
            None => Ok(QName::new(self.default_namespace(), prefixed_name)),
        }
    }
}

/// Project an FQN string of the form `{ns}local` down to its local name
pub fn strip_namespace(name: &str) -> &str {
    match name.rfind('}') {
        Some(pos) if name.starts_with('{') => &name[pos + 1..],
        _ => name,
    }
}

/// Extract the namespace of an FQN string, empty when absent
pub fn namespace_of(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix('{') {
        match rest.find('}') {
            Some(pos) => &rest[..pos],
            None => "",
        }
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_display() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(qname.to_string(), "{http://example.com}element");
        assert_eq!(QName::local("element").to_string(), "element");
    }

    #[test]
    fn test_qname_from_extended() {
        let qname = QName::from_extended("{urn:x}item").unwrap();
        assert_eq!(qname.namespace.as_deref(), Some("urn:x"));
        assert_eq!(qname.local_name, "item");

        let local = QName::from_extended("item").unwrap();
        assert!(local.namespace.is_none());

        assert!(QName::from_extended("{urn:x").is_err());
        assert!(QName::from_extended("{urn:x}").is_err());
    }

    #[test]
    fn test_empty_namespace_is_none() {
        let qname = QName::new(Some(""), "item");
        assert!(qname.namespace.is_none());
        assert!(qname.in_namespace(""));
    }

    #[test]
    fn test_namespace_context_resolution() {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("xs", "http://www.w3.org/2001/XMLSchema");
        ctx.add_prefix("", "urn:default");

        let qname = ctx.resolve("xs:element").unwrap();
        assert_eq!(
            qname.namespace.as_deref(),
            Some("http://www.w3.org/2001/XMLSchema")
        );
        assert_eq!(qname.local_name, "element");

        let bare = ctx.resolve("item").unwrap();
        assert_eq!(bare.namespace.as_deref(), Some("urn:default"));

        assert!(ctx.resolve("nope:item").is_err());
    }

    #[test]
    fn test_strip_and_namespace_of() {
        assert_eq!(strip_namespace("{urn:x}item"), "item");
        assert_eq!(strip_namespace("item"), "item");
        assert_eq!(namespace_of("{urn:x}item"), "urn:x");
        assert_eq!(namespace_of("item"), "");
    }

    #[test]
    fn test_prefix_for() {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("tns", "urn:x");
        assert_eq!(ctx.prefix_for("urn:x"), Some("tns"));
        assert_eq!(ctx.prefix_for("urn:y"), None);
    }
}
