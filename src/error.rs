//! Error types for xsdkit
//!
//! Errors are values: every kind carries a message, a source pointer
//! (document URI plus element path where known) and, for validation errors,
//! the name of the declaration whose rule was violated.

use std::fmt;
use thiserror::Error;

use crate::namespaces::QName;

/// Result type alias using the xsdkit Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsdkit operations
#[derive(Error, Debug)]
pub enum Error {
    /// XML instance violates the schema
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Lexical value fails its datatype
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Ill-formed XSD or XML, or unresolvable reference
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Resource resolution failure
    #[error("resource error: {0}")]
    Url(#[from] UrlError),

    /// Misuse of a public entry point
    #[error("type error: {0}")]
    Type(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// XML Schema validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Path to the element that failed validation
    pub path: Option<String>,
    /// URI of the document being validated
    pub uri: Option<String>,
    /// Name of the declaration whose rule was violated
    pub validator: Option<QName>,
    /// Underlying reason
    pub reason: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            uri: None,
            validator: None,
            reason: None,
        }
    }

    /// Set the path where validation failed
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the document URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the violated declaration
    pub fn with_validator(mut self, name: QName) -> Self {
        self.validator = Some(name);
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref reason) = self.reason {
            write!(f, " (reason: {})", reason)?;
        }
        if let Some(ref path) = self.path {
            write!(f, " at {}", path)?;
        }
        if let Some(ref validator) = self.validator {
            write!(f, " [declaration {}]", validator)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Lexical decoding error: a value does not belong to its datatype
#[derive(Debug, Clone)]
pub struct DecodeError {
    /// Error message
    pub message: String,
    /// The offending lexical value
    pub value: Option<String>,
    /// Name of the datatype
    pub type_name: Option<QName>,
    /// Path to the element or attribute carrying the value
    pub path: Option<String>,
}

impl DecodeError {
    /// Create a new decode error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value: None,
            type_name: None,
            path: None,
        }
    }

    /// Set the offending lexical value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the datatype name
    pub fn with_type(mut self, name: QName) -> Self {
        self.type_name = Some(name);
        self
    }

    /// Set the instance path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref value) = self.value {
            write!(f, ": '{}'", value)?;
        }
        if let Some(ref name) = self.type_name {
            write!(f, " (type {})", name)?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {}

/// XML Schema parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location of the failure (schema URI, possibly with an element path)
    pub location: Option<String>,
    /// Fully qualified name of the offending declaration
    pub component: Option<QName>,
    /// Underlying reason, kept separate so causes never collapse into the message
    pub reason: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            component: None,
            reason: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the offending declaration name
    pub fn with_component(mut self, name: QName) -> Self {
        self.component = Some(name);
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref component) = self.component {
            write!(f, " [declaration {}]", component)?;
        }
        if let Some(ref loc) = self.location {
            write!(f, " in {}", loc)?;
        }
        if let Some(ref reason) = self.reason {
            write!(f, " (reason: {})", reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Resource resolution error
#[derive(Error, Debug)]
#[error("{message}")]
pub struct UrlError {
    /// Error message naming the unresolvable location
    pub message: String,
    /// The underlying cause, preserved rather than stringified
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl UrlError {
    /// Create a new resource error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl Error {
    /// Wrap an error with the enclosing include/import/redefine site.
    ///
    /// The original payload is kept intact; only the location context grows.
    pub fn at_location(self, location: &str) -> Self {
        match self {
            Error::Parse(e) => {
                if e.location.is_none() {
                    Error::Parse(e.with_location(location))
                } else {
                    let reason = match e.reason {
                        Some(reason) => format!("{}; via {}", reason, location),
                        None => format!("via {}", location),
                    };
                    Error::Parse(ParseError {
                        reason: Some(reason),
                        ..e
                    })
                }
            }
            Error::Url(e) => Error::Url(UrlError {
                message: format!("{} (via {})", e.message, location),
                source: e.source,
            }),
            other => other,
        }
    }
}
