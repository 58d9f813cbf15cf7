//! # xsdkit
//!
//! An XML Schema (XSD 1.0) compiler, validator and decoder.
//!
//! The crate compiles one or more XSD documents into an in-memory schema
//! model and uses that model to validate XML instance documents and decode
//! them into structured data.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsdkit::Schema;
//!
//! let schema = Schema::from_file("order.xsd")?;
//!
//! assert!(schema.is_valid_str("<order><id>42</id></order>"));
//! let data = schema.to_dict_str("<order><id>42</id></order>", None, Default::default())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Utilities
pub mod names;
pub mod namespaces;
pub mod locations;

// Resource loading
pub mod loaders;
pub mod documents;

// Path selection over XML and schema trees
pub mod xpath;

// Schema model, builder pipeline and validation
pub mod validators;

// Re-exports for convenience
pub use error::{Error, Result};
pub use namespaces::QName;
pub use validators::schemas::Schema;
pub use validators::validation::{DecodeOptions, DecodeOutcome};

/// Version of the xsdkit library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD 1.0 namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema Instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
