//! Resource limits
//!
//! Guards against pathological inputs while loading schemas and documents.

use crate::error::{Result, UrlError};

/// Default maximum size of an XML resource (64 MiB)
pub const DEFAULT_MAX_XML_SIZE: usize = 64 * 1024 * 1024;

/// Limits applied while loading resources
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum byte size of a loaded XML resource
    pub max_xml_size: usize,
}

impl Limits {
    /// Strict limits for untrusted inputs (10 MiB)
    pub fn strict() -> Self {
        Self {
            max_xml_size: 10 * 1024 * 1024,
        }
    }

    /// Check a resource size against the limit
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(UrlError::new(format!(
                "XML resource of {} bytes exceeds the {} byte limit",
                size, self.max_xml_size
            ))
            .into())
        } else {
            Ok(())
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_size: DEFAULT_MAX_XML_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert!(limits.check_xml_size(1024).is_ok());
        assert!(limits.check_xml_size(DEFAULT_MAX_XML_SIZE + 1).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.check_xml_size(11 * 1024 * 1024).is_err());
    }
}
