//! Resource location resolution
//!
//! Resolves schema and document locations against an optional base URI.
//! The resolution order follows the loader contract: an absolute URI is
//! taken as-is, a relative location is joined with the base, anything else
//! is treated as a local path.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Result, UrlError};

/// A resolved resource location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// Remote URL (http, https, ftp, ...)
    Url(Url),
}

impl Location {
    /// Resolve a location string against an optional base URI.
    pub fn resolve(location: &str, base_uri: Option<&str>) -> Result<Self> {
        // Absolute URI wins
        if let Ok(url) = Url::parse(location) {
            return Ok(Self::from_url(url));
        }

        // Relative location joined with the base
        if let Some(base) = base_uri {
            if let Ok(base_url) = Url::parse(base) {
                if let Ok(joined) = base_url.join(location) {
                    return Ok(Self::from_url(joined));
                }
            }
            let base_path = Path::new(base);
            let dir = if base_path.is_dir() {
                base_path
            } else {
                base_path.parent().unwrap_or(Path::new("."))
            };
            return Ok(Location::Path(dir.join(location)));
        }

        Ok(Location::Path(PathBuf::from(location)))
    }

    fn from_url(url: Url) -> Self {
        if url.scheme() == "file" {
            match url.to_file_path() {
                Ok(path) => Location::Path(path),
                Err(()) => Location::Url(url),
            }
        } else {
            Location::Url(url)
        }
    }

    /// The canonical URI of this location.
    pub fn canonical_uri(&self) -> Result<String> {
        match self {
            Location::Url(url) => Ok(url.to_string()),
            Location::Path(path) => {
                let absolute = if path.is_absolute() {
                    path.clone()
                } else {
                    match path.canonicalize() {
                        Ok(p) => p,
                        Err(_) => path.clone(),
                    }
                };
                Url::from_file_path(&absolute)
                    .map(|u| u.to_string())
                    .map_err(|()| {
                        UrlError::new(format!(
                            "cannot build a file URI from '{}'",
                            path.display()
                        ))
                        .into()
                    })
            }
        }
    }

    /// Check if this is a remote location
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }
}

/// Guess whether a source string is literal XML text rather than a location
pub fn looks_like_xml(source: &str) -> bool {
    source.trim_start().starts_with('<')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        let loc = Location::resolve("http://example.com/schema.xsd", None).unwrap();
        assert!(loc.is_remote());
        assert_eq!(
            loc.canonical_uri().unwrap(),
            "http://example.com/schema.xsd"
        );
    }

    #[test]
    fn test_relative_against_url_base() {
        let loc = Location::resolve("types.xsd", Some("http://example.com/xsd/main.xsd")).unwrap();
        assert_eq!(
            loc.canonical_uri().unwrap(),
            "http://example.com/xsd/types.xsd"
        );
    }

    #[test]
    fn test_relative_against_file_base() {
        let loc = Location::resolve("types.xsd", Some("/tmp/schemas/main.xsd")).unwrap();
        match loc {
            Location::Path(p) => assert_eq!(p, PathBuf::from("/tmp/schemas/types.xsd")),
            other => panic!("expected a path, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_path() {
        let loc = Location::resolve("/tmp/schema.xsd", None).unwrap();
        assert!(!loc.is_remote());
    }

    #[test]
    fn test_file_url_becomes_path() {
        let loc = Location::resolve("file:///tmp/schema.xsd", None).unwrap();
        assert!(matches!(loc, Location::Path(_)));
    }

    #[test]
    fn test_looks_like_xml() {
        assert!(looks_like_xml("<root/>"));
        assert!(looks_like_xml("  \n<?xml version='1.0'?><root/>"));
        assert!(!looks_like_xml("schema.xsd"));
    }
}
