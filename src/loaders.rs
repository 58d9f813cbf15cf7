//! Resource loading
//!
//! Resolves a source specification (URL, filesystem path, raw XML text or an
//! open byte stream) to a parsed element tree with its canonical URI. Byte
//! sources are opened, parsed and dropped within a single call; the returned
//! tree holds no file handles.

use std::fs;
use std::io::Read;

use crate::documents::{Document, Element};
use crate::error::{Result, UrlError};
use crate::limits::Limits;
use crate::locations::{looks_like_xml, Location};

/// A loaded XML resource: the parsed tree, the raw text and the canonical URI
#[derive(Debug, Clone)]
pub struct XmlResource {
    /// Root of the parsed element tree
    pub root: Element,
    /// Raw document text
    pub text: String,
    /// Canonical URI, None for in-memory sources
    pub uri: Option<String>,
}

/// Resource loader for schemas and documents
#[derive(Debug, Clone)]
pub struct Loader {
    limits: Limits,
    allow_remote: bool,
}

impl Loader {
    /// Create a loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            allow_remote: false,
        }
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Allow or refuse remote locations
    pub fn with_allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    /// Open a location, resolved against `base_uri`, returning its bytes and
    /// canonical URI.
    pub fn open_resource(
        &self,
        location: &str,
        base_uri: Option<&str>,
    ) -> Result<(Vec<u8>, String)> {
        let resolved = Location::resolve(location, base_uri)?;
        match &resolved {
            Location::Path(path) => {
                let bytes = fs::read(path).map_err(|e| {
                    UrlError::new(format!("cannot open '{}'", path.display())).with_source(e)
                })?;
                self.limits.check_xml_size(bytes.len())?;
                Ok((bytes, resolved.canonical_uri()?))
            }
            Location::Url(url) => {
                if !self.allow_remote {
                    return Err(UrlError::new(format!(
                        "remote resource '{}' refused: remote loading is disabled",
                        url
                    ))
                    .into());
                }
                Err(UrlError::new(format!(
                    "cannot open '{}': no transport is configured for scheme '{}'",
                    url,
                    url.scheme()
                ))
                .into())
            }
        }
    }

    /// Load and parse an XML resource from a source specification.
    ///
    /// Raw XML text is recognized and parsed directly; anything else is
    /// resolved as a location.
    pub fn load_xml_resource(&self, source: &str, base_uri: Option<&str>) -> Result<XmlResource> {
        if looks_like_xml(source) {
            self.limits.check_xml_size(source.len())?;
            let doc = Document::from_str(source)?;
            return Ok(XmlResource {
                root: doc.root,
                text: source.to_string(),
                uri: None,
            });
        }

        let (bytes, uri) = self.open_resource(source, base_uri)?;
        self.load_xml_bytes(&bytes, Some(uri))
    }

    /// Parse an XML resource from bytes already in memory
    pub fn load_xml_bytes(&self, bytes: &[u8], uri: Option<String>) -> Result<XmlResource> {
        self.limits.check_xml_size(bytes.len())?;
        let doc = Document::from_bytes(bytes)?;
        Ok(XmlResource {
            root: doc.root,
            text: String::from_utf8_lossy(bytes).into_owned(),
            uri,
        })
    }

    /// Parse an XML resource from an open byte stream
    pub fn load_xml_reader<R: Read>(&self, mut reader: R, uri: Option<String>) -> Result<XmlResource> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| UrlError::new("cannot read byte stream").with_source(e))?;
        self.load_xml_bytes(&bytes, uri)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_literal_text() {
        let loader = Loader::new();
        let res = loader.load_xml_resource("<root>test</root>", None).unwrap();
        assert_eq!(res.root.local_name(), "root");
        assert!(res.uri.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<root a=\"1\"/>").unwrap();

        let loader = Loader::new();
        let res = loader
            .load_xml_resource(file.path().to_str().unwrap(), None)
            .unwrap();
        assert_eq!(res.root.get_attribute("a"), Some("1"));
        assert!(res.uri.as_deref().unwrap().starts_with("file://"));
    }

    #[test]
    fn test_relative_location_against_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.xsd");
        std::fs::write(&path, "<root/>").unwrap();
        let base = dir.path().join("main.xsd");

        let loader = Loader::new();
        let res = loader
            .load_xml_resource("types.xsd", Some(base.to_str().unwrap()))
            .unwrap();
        assert_eq!(res.root.local_name(), "root");
    }

    #[test]
    fn test_missing_file_is_url_error() {
        let loader = Loader::new();
        let err = loader
            .load_xml_resource("/nonexistent/definitely/missing.xsd", None)
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Url(_)));
    }

    #[test]
    fn test_remote_refused_by_default() {
        let loader = Loader::new();
        let err = loader
            .open_resource("http://example.com/schema.xsd", None)
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Url(_)));
    }

    #[test]
    fn test_load_from_reader() {
        let loader = Loader::new();
        let res = loader
            .load_xml_reader("<r>x</r>".as_bytes(), None)
            .unwrap();
        assert_eq!(res.root.text_content(), "x");
    }

    #[test]
    fn test_size_limit() {
        let loader = Loader::new().with_limits(Limits::strict());
        let big = format!("<r>{}</r>", "x".repeat(11 * 1024 * 1024));
        assert!(loader.load_xml_resource(&big, None).is_err());
    }
}
