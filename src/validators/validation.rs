//! Instance validation and decoding
//!
//! Walks an XML instance tree in lockstep with a compiled element
//! declaration, enforcing content models, type validity, attribute rules and
//! defaults, and producing decoded values. Errors are values yielded in
//! document order; the raising entry points (`validate`, `to_dict`) wrap
//! them.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::documents::{Document, Element};
use crate::error::{Error, ValidationError};
use crate::namespaces::{NamespaceContext, QName};
use crate::xpath;
use crate::{XMLNS_NAMESPACE, XSI_NAMESPACE};

use super::base::{xsd_qname, DerivationMethod};
use super::builtins::XSD_ANY_TYPE;
use super::complex_types::{ContentTypeLabel, XsdComplexType};
use super::elements::{ElementType, XsdElement};
use super::globals::{GlobalType, XsdGlobals};
use super::models::{match_content, MatchedTerm};
use super::schemas::Schema;
use super::simple_types::{SimpleType, SimpleTypeRc};
use super::wildcards::ProcessContents;

/// Options governing decoding
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Emit validation errors; when false the traversal still converts
    /// types but reports nothing
    pub validate: bool,
    /// Prefix map used for path resolution and for naming decoded keys
    pub namespaces: Option<NamespaceContext>,
    /// Fill absent attributes and empty elements with schema defaults
    pub use_defaults: bool,
    /// Keep yielding after an error instead of stopping the iteration
    pub skip_errors: bool,
    /// Always wrap child values in a sequence, even singletons
    pub force_list: bool,
    /// Body key for text content
    pub text_key: String,
    /// Prefix for attribute keys in the body
    pub attribute_prefix: String,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            validate: true,
            namespaces: None,
            use_defaults: true,
            skip_errors: false,
            force_list: false,
            text_key: "#".to_string(),
            attribute_prefix: "@".to_string(),
        }
    }
}

/// An item produced by the decode iteration
#[derive(Debug)]
pub enum DecodeOutcome {
    /// A decoded value
    Value(JsonValue),
    /// A validation error, yielded in place
    Error(ValidationError),
}

/// Lazy decode iterator: one decode per anchored instance element
pub struct DecodeIter<'a> {
    maps: &'a XsdGlobals,
    options: DecodeOptions,
    decl: Option<Arc<XsdElement>>,
    anchors: Vec<&'a Element>,
    index: usize,
    queue: VecDeque<DecodeOutcome>,
    anchor_error: Option<ValidationError>,
    stopped: bool,
}

impl<'a> Iterator for DecodeIter<'a> {
    type Item = DecodeOutcome;

    fn next(&mut self) -> Option<DecodeOutcome> {
        loop {
            if self.stopped {
                return None;
            }
            if let Some(error) = self.anchor_error.take() {
                // An unanchored document is reported once, then nothing
                self.stopped = true;
                return Some(DecodeOutcome::Error(error));
            }
            if let Some(item) = self.queue.pop_front() {
                if matches!(item, DecodeOutcome::Error(_)) && !self.options.skip_errors {
                    self.stopped = true;
                }
                return Some(item);
            }
            let decl = self.decl.clone()?;
            if self.index >= self.anchors.len() {
                return None;
            }
            let elem = self.anchors[self.index];
            self.index += 1;

            let mut ctx = DecodeContext {
                maps: self.maps,
                options: &self.options,
                errors: Vec::new(),
                path: String::new(),
            };
            let value = decode_element(&mut ctx, &decl, elem);
            for error in ctx.errors {
                self.queue.push_back(DecodeOutcome::Error(error));
            }
            if let Some(value) = value {
                self.queue.push_back(DecodeOutcome::Value(value));
            }
        }
    }
}

/// Build the decode iteration for a document, optionally anchored at a path.
pub fn iter_decode<'a>(
    schema: &'a Schema,
    doc: &'a Document,
    path: Option<&str>,
    options: DecodeOptions,
) -> crate::error::Result<DecodeIter<'a>> {
    let maps = schema.maps();

    let (decl, anchors, anchor_error) = match path {
        None => {
            let tag = doc.root.tag.clone();
            match maps.lookup_element(&tag) {
                Some(decl) => (Some(decl.clone()), vec![&doc.root], None),
                None => (
                    None,
                    Vec::new(),
                    Some(
                        ValidationError::new(format!(
                            "'{}' is not a global element of the schema",
                            tag
                        ))
                        .with_path("/".to_string()),
                    ),
                ),
            }
        }
        Some(path) => {
            let resolve_ctx = options
                .namespaces
                .clone()
                .unwrap_or_else(|| schema.document().namespaces.clone());
            let decl = schema.find(path, Some(&resolve_ctx))?;
            match decl {
                None => (
                    None,
                    Vec::new(),
                    Some(ValidationError::new(format!(
                        "the path '{}' matches no element of the schema",
                        path
                    ))),
                ),
                Some(decl) => {
                    let rel = xpath::relative_path(path, 1)?;
                    let anchors: Vec<&Element> = if rel == "." {
                        vec![&doc.root]
                    } else {
                        let mut ctx = resolve_ctx.clone();
                        ctx.extend_missing(&doc.root.namespaces);
                        let selector = xpath::parse(&rel, &ctx)?;
                        xpath::select(&selector, &doc.root)
                    };
                    (Some(decl), anchors, None)
                }
            }
        }
    };

    Ok(DecodeIter {
        maps,
        options,
        decl,
        anchors,
        index: 0,
        queue: VecDeque::new(),
        anchor_error,
        stopped: false,
    })
}

/// Collect the validation errors of an element tree whose root tag must be
/// a global declaration of the registry.
pub(crate) fn document_errors(
    maps: &XsdGlobals,
    root: &Element,
    options: &DecodeOptions,
) -> Vec<ValidationError> {
    let decl = match maps.lookup_element(&root.tag) {
        Some(decl) => decl.clone(),
        None => {
            return vec![ValidationError::new(format!(
                "'{}' is not a global element of the schema",
                root.tag
            ))]
        }
    };
    let mut ctx = DecodeContext {
        maps,
        options,
        errors: Vec::new(),
        path: String::new(),
    };
    decode_element(&mut ctx, &decl, root);
    ctx.errors
}

// =============================================================================
// Decode context
// =============================================================================

struct DecodeContext<'a> {
    maps: &'a XsdGlobals,
    options: &'a DecodeOptions,
    errors: Vec<ValidationError>,
    path: String,
}

enum ResolvedType {
    Simple(SimpleTypeRc),
    Complex(Arc<XsdComplexType>),
}

impl<'a> DecodeContext<'a> {
    fn error(&mut self, error: ValidationError) {
        if self.options.validate {
            let error = if error.path.is_none() {
                error.with_path(self.path.clone())
            } else {
                error
            };
            self.errors.push(error);
        }
    }

    fn error_at(&mut self, message: String, validator: &QName) {
        self.error(
            ValidationError::new(message)
                .with_path(self.path.clone())
                .with_validator(validator.clone()),
        );
    }

    fn error_from(&mut self, error: Error, validator: &QName) {
        let converted = match error {
            Error::Validation(v) => v,
            Error::Decode(d) => ValidationError::new(d.to_string()),
            other => ValidationError::new(other.to_string()),
        };
        self.error(converted.with_validator(validator.clone()));
    }

    fn decode_key(&self, tag: &QName) -> String {
        match &tag.namespace {
            None => tag.local_name.clone(),
            Some(ns) => {
                if let Some(map) = &self.options.namespaces {
                    if map.default_namespace() == Some(ns.as_str()) {
                        return tag.local_name.clone();
                    }
                    if let Some(prefix) = map.prefix_for(ns) {
                        if !prefix.is_empty() {
                            return format!("{}:{}", prefix, tag.local_name);
                        }
                    }
                }
                tag.to_string()
            }
        }
    }
}

// =============================================================================
// Element decoding
// =============================================================================

fn decode_element(
    ctx: &mut DecodeContext<'_>,
    decl: &Arc<XsdElement>,
    elem: &Element,
) -> Option<JsonValue> {
    // Resolve reference particles to their global declaration
    let decl: Arc<XsdElement> = match &decl.ref_element {
        Some(name) => match ctx.maps.lookup_element(name) {
            Some(target) => target.clone(),
            None => {
                ctx.error_at(
                    format!("unresolved element reference '{}'", name),
                    &decl.name,
                );
                return None;
            }
        },
        None => decl.clone(),
    };

    let saved_path_len = ctx.path.len();
    ctx.path.push('/');
    ctx.path.push_str(elem.local_name());

    let value = decode_resolved_element(ctx, &decl, elem);

    ctx.path.truncate(saved_path_len);
    value
}

fn decode_resolved_element(
    ctx: &mut DecodeContext<'_>,
    decl: &Arc<XsdElement>,
    elem: &Element,
) -> Option<JsonValue> {
    if decl.abstract_element && decl.matches_name(&elem.tag) {
        ctx.error_at(
            format!("abstract element '{}' cannot appear in an instance", decl.name),
            &decl.name,
        );
    }

    // xsi:nil: accepted iff the declaration is nillable and content is empty
    if let Some(nil) = elem.get_attribute_ns(XSI_NAMESPACE, "nil") {
        if nil.trim() == "true" {
            if !decl.nillable {
                ctx.error_at(
                    format!("element '{}' is not nillable", decl.name),
                    &decl.name,
                );
            } else if !elem.is_empty_content() {
                ctx.error_at(
                    format!("nilled element '{}' must be empty", decl.name),
                    &decl.name,
                );
            }
            return Some(JsonValue::Null);
        }
    }

    let mut resolved = resolve_element_type(ctx, decl)?;

    // xsi:type overrides the declared type when the derivation is admitted
    if let Some(type_attr) = elem.get_attribute_ns(XSI_NAMESPACE, "type") {
        match elem.namespaces.resolve(type_attr.trim()) {
            Ok(type_name) => match ctx.maps.lookup_type(&type_name) {
                Some(global_type) => {
                    if is_admitted_type_substitution(ctx.maps, &type_name, decl) {
                        resolved = match global_type {
                            GlobalType::Simple(st) => ResolvedType::Simple(st.clone()),
                            GlobalType::Complex(ct) => ResolvedType::Complex(ct.clone()),
                        };
                    } else {
                        ctx.error_at(
                            format!(
                                "xsi:type '{}' is not validly derived from the declared type",
                                type_name
                            ),
                            &decl.name,
                        );
                    }
                }
                None => ctx.error_at(
                    format!("unknown xsi:type '{}'", type_name),
                    &decl.name,
                ),
            },
            Err(_) => ctx.error_at(
                format!("unresolvable xsi:type value '{}'", type_attr),
                &decl.name,
            ),
        }
    }

    match resolved {
        ResolvedType::Simple(st) => {
            if !elem.attributes.is_empty() {
                for (name, _) in &elem.attributes {
                    let ns = name.namespace.as_deref();
                    if ns != Some(XSI_NAMESPACE) && ns != Some(XMLNS_NAMESPACE) {
                        ctx.error_at(
                            format!(
                                "element '{}' has a simple type but carries attribute '{}'",
                                decl.name, name
                            ),
                            &decl.name,
                        );
                        break;
                    }
                }
            }
            decode_simple_value(ctx, &st, decl, elem)
        }
        ResolvedType::Complex(ct) => decode_complex_element(ctx, &ct, decl, elem),
    }
}

fn resolve_element_type(
    ctx: &mut DecodeContext<'_>,
    decl: &Arc<XsdElement>,
) -> Option<ResolvedType> {
    match &decl.element_type {
        ElementType::Simple(st) => Some(ResolvedType::Simple(st.clone())),
        ElementType::Complex(ct) => Some(ResolvedType::Complex(ct.clone())),
        ElementType::Named(name) => match ctx.maps.lookup_type(name) {
            Some(GlobalType::Simple(st)) => Some(ResolvedType::Simple(st.clone())),
            Some(GlobalType::Complex(ct)) => Some(ResolvedType::Complex(ct.clone())),
            None => {
                ctx.error_at(
                    format!("unresolved type reference '{}'", name),
                    &decl.name,
                );
                None
            }
        },
        ElementType::AnyType => match ctx.maps.lookup_type(&xsd_qname(XSD_ANY_TYPE)) {
            Some(GlobalType::Complex(ct)) => Some(ResolvedType::Complex(ct.clone())),
            _ => None,
        },
    }
}

/// Whether `candidate` may stand in for the declared type of `decl` via
/// xsi:type, honoring the element's block set.
fn is_admitted_type_substitution(
    maps: &XsdGlobals,
    candidate: &QName,
    decl: &XsdElement,
) -> bool {
    let declared = match &decl.element_type {
        ElementType::Named(name) => name.clone(),
        ElementType::AnyType => return true,
        // Anonymous declared types admit no named substitutes
        _ => return false,
    };
    if *candidate == declared || declared == xsd_qname(XSD_ANY_TYPE) {
        return true;
    }

    // Walk the candidate's derivation chain up to the declared type
    let mut current = candidate.clone();
    let mut hops = 0;
    loop {
        let (method, base) = match maps.lookup_type(&current) {
            Some(GlobalType::Complex(ct)) => match (&ct.derivation, &ct.base_type) {
                (Some(method), Some(base)) => (*method, base.clone()),
                _ => return false,
            },
            Some(GlobalType::Simple(st)) => {
                // Simple derivation steps are restrictions
                match simple_base_name(st) {
                    Some(base) => (DerivationMethod::Restriction, base),
                    None => return false,
                }
            }
            None => return false,
        };
        if decl.block.contains(method) {
            return false;
        }
        if base == declared {
            return true;
        }
        current = base;
        hops += 1;
        if hops > maps.types.len() {
            return false;
        }
    }
}

fn simple_base_name(st: &SimpleTypeRc) -> Option<QName> {
    match st.base() {
        Some(base) => base.name().cloned().or_else(|| simple_base_name(base)),
        None => st
            .primitive()
            .and_then(|builtin| builtin.base_type)
            .map(xsd_qname),
    }
}

// =============================================================================
// Simple content
// =============================================================================

fn decode_simple_value(
    ctx: &mut DecodeContext<'_>,
    st: &SimpleTypeRc,
    decl: &XsdElement,
    elem: &Element,
) -> Option<JsonValue> {
    if !elem.children.is_empty() {
        ctx.error_at(
            format!(
                "element '{}' has character content only, found child elements",
                decl.name
            ),
            &decl.name,
        );
        return Some(JsonValue::Null);
    }

    let mut text = elem.text.clone().unwrap_or_default();
    if text.is_empty() && ctx.options.use_defaults {
        if let Some(constraint) = decl.value_constraint() {
            text = constraint.to_string();
        }
    }

    if let Some(fixed) = &decl.fixed {
        let ws = st.white_space();
        if text.is_empty() {
            text = fixed.clone();
        } else if ws.normalize(&text) != ws.normalize(fixed) {
            ctx.error_at(
                format!(
                    "element '{}' must equal its fixed value '{}'",
                    decl.name, fixed
                ),
                &decl.name,
            );
        }
    }

    match st.validate_value(&text) {
        Ok(value) => Some(value.to_json()),
        Err(error) => {
            ctx.error_from(error, &decl.name);
            Some(JsonValue::String(text))
        }
    }
}

// =============================================================================
// Complex content
// =============================================================================

fn decode_complex_element(
    ctx: &mut DecodeContext<'_>,
    ct: &Arc<XsdComplexType>,
    decl: &Arc<XsdElement>,
    elem: &Element,
) -> Option<JsonValue> {
    if ct.abstract_type {
        ctx.error_at(
            format!(
                "the abstract type '{}' cannot validate content directly",
                ct.name
                    .as_ref()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "<anonymous>".to_string())
            ),
            &decl.name,
        );
    }

    let mut body = JsonMap::new();
    decode_attributes(ctx, ct, decl, elem, &mut body);

    let label = ct.content_type_label();
    match label {
        ContentTypeLabel::Empty => {
            if !elem.is_empty_content() {
                ctx.error_at(
                    format!("element '{}' must be empty", decl.name),
                    &decl.name,
                );
            }
            if body.is_empty() {
                Some(JsonValue::Null)
            } else {
                Some(JsonValue::Object(body))
            }
        }
        ContentTypeLabel::Simple => {
            let simple = ct.simple_type().cloned()?;
            let value = decode_simple_value(ctx, &simple, decl, elem)?;
            if body.is_empty() {
                Some(value)
            } else {
                if !elem.text_content().is_empty() || decl.value_constraint().is_some() {
                    body.insert(ctx.options.text_key.clone(), value);
                }
                Some(JsonValue::Object(body))
            }
        }
        ContentTypeLabel::ElementOnly | ContentTypeLabel::Mixed => {
            let text = elem.text_content();
            if label == ContentTypeLabel::ElementOnly && !text.trim().is_empty() {
                ctx.error_at(
                    format!(
                        "element '{}' has element-only content, found text '{}'",
                        decl.name,
                        text.trim()
                    ),
                    &decl.name,
                );
            }
            if label == ContentTypeLabel::Mixed && !text.is_empty() {
                body.insert(
                    ctx.options.text_key.clone(),
                    JsonValue::String(text.to_string()),
                );
            }

            let group = ct.model_group()?.clone();
            let tags: Vec<QName> = elem.children.iter().map(|c| c.tag.clone()).collect();
            let matched = match_content(&group, &tags, ctx.maps);
            for model_error in &matched.errors {
                let mut error = ValidationError::new(model_error.message.clone())
                    .with_validator(decl.name.clone());
                if !model_error.expected.is_empty() {
                    let expected: Vec<String> =
                        model_error.expected.iter().map(|n| n.to_string()).collect();
                    error = error.with_reason(format!("expected one of {:?}", expected));
                }
                ctx.error(error);
            }

            for (index, child) in elem.children.iter().enumerate() {
                let value = match matched.term_for(index) {
                    Some(MatchedTerm::Element(child_decl)) => {
                        let child_decl = child_decl.clone();
                        decode_element(ctx, &child_decl, child)
                    }
                    Some(MatchedTerm::Wildcard(wildcard)) => {
                        let process_contents = wildcard.process_contents;
                        decode_wildcard_child(ctx, process_contents, child)
                    }
                    // Model errors were already reported; decode leftovers
                    // on a best effort basis
                    None => match ctx.maps.lookup_element(&child.tag) {
                        Some(global) => {
                            let global = global.clone();
                            decode_element(ctx, &global, child)
                        }
                        None => Some(decode_raw(ctx, child)),
                    },
                };
                if let Some(value) = value {
                    let key = ctx.decode_key(&child.tag);
                    insert_child_value(&mut body, key, value, ctx.options.force_list);
                }
            }

            if body.is_empty() {
                Some(JsonValue::Null)
            } else {
                Some(JsonValue::Object(body))
            }
        }
    }
}

fn decode_wildcard_child(
    ctx: &mut DecodeContext<'_>,
    process_contents: ProcessContents,
    child: &Element,
) -> Option<JsonValue> {
    match process_contents {
        ProcessContents::Skip => Some(decode_raw(ctx, child)),
        ProcessContents::Lax => match ctx.maps.lookup_element(&child.tag) {
            Some(decl) => {
                let decl = decl.clone();
                decode_element(ctx, &decl, child)
            }
            None => Some(decode_raw(ctx, child)),
        },
        ProcessContents::Strict => match ctx.maps.lookup_element(&child.tag) {
            Some(decl) => {
                let decl = decl.clone();
                decode_element(ctx, &decl, child)
            }
            None => {
                ctx.error(
                    ValidationError::new(format!(
                        "no global declaration found for strictly processed element '{}'",
                        child.tag
                    ))
                    .with_path(format!("{}/{}", ctx.path, child.local_name())),
                );
                Some(decode_raw(ctx, child))
            }
        },
    }
}

/// Schema-less decoding for skipped and lax-unknown content.
///
/// Keys and shapes follow the same decode options and namespace-aware key
/// derivation as schema-driven content, so a single decode call yields one
/// key convention throughout the tree.
fn decode_raw(ctx: &DecodeContext<'_>, elem: &Element) -> JsonValue {
    let mut body = JsonMap::new();
    for (name, value) in &elem.attributes {
        let ns = name.namespace.as_deref();
        if ns == Some(XSI_NAMESPACE) || ns == Some(XMLNS_NAMESPACE) {
            continue;
        }
        body.insert(
            format!("{}{}", ctx.options.attribute_prefix, ctx.decode_key(name)),
            JsonValue::String(value.clone()),
        );
    }
    for child in &elem.children {
        insert_child_value(
            &mut body,
            ctx.decode_key(&child.tag),
            decode_raw(ctx, child),
            ctx.options.force_list,
        );
    }
    let text = elem.text_content();
    if body.is_empty() {
        if text.is_empty() {
            JsonValue::Null
        } else {
            JsonValue::String(text.to_string())
        }
    } else {
        if !text.trim().is_empty() {
            body.insert(
                ctx.options.text_key.clone(),
                JsonValue::String(text.to_string()),
            );
        }
        JsonValue::Object(body)
    }
}

fn insert_child_value(body: &mut JsonMap<String, JsonValue>, key: String, value: JsonValue, force_list: bool) {
    match body.get_mut(&key) {
        None => {
            if force_list {
                body.insert(key, JsonValue::Array(vec![value]));
            } else {
                body.insert(key, value);
            }
        }
        Some(JsonValue::Array(items)) if force_list => items.push(value),
        Some(existing) => {
            let previous = existing.take();
            match previous {
                JsonValue::Array(mut items) => {
                    items.push(value);
                    *existing = JsonValue::Array(items);
                }
                single => {
                    *existing = JsonValue::Array(vec![single, value]);
                }
            }
        }
    }
}

// =============================================================================
// Attributes
// =============================================================================

fn decode_attributes(
    ctx: &mut DecodeContext<'_>,
    ct: &XsdComplexType,
    decl: &XsdElement,
    elem: &Element,
    body: &mut JsonMap<String, JsonValue>,
) {
    let mut seen: Vec<QName> = Vec::new();

    for (name, raw) in &elem.attributes {
        let ns = name.namespace.as_deref();
        if ns == Some(XSI_NAMESPACE) || ns == Some(XMLNS_NAMESPACE) {
            continue;
        }

        let key = format!("{}{}", ctx.options.attribute_prefix, ctx.decode_key(name));

        match ct.attributes.get(name) {
            Some(attr) => {
                seen.push(name.clone());
                if attr.is_prohibited() {
                    ctx.error_at(
                        format!("attribute '{}' is prohibited on element '{}'", name, decl.name),
                        &decl.name,
                    );
                    continue;
                }
                if let Some(fixed) = &attr.fixed {
                    let ws = attr
                        .simple_type
                        .as_ref()
                        .map(|st| st.white_space())
                        .unwrap_or(super::facets::WhiteSpace::Preserve);
                    if ws.normalize(raw) != ws.normalize(fixed) {
                        ctx.error_at(
                            format!(
                                "attribute '{}' must equal its fixed value '{}'",
                                name, fixed
                            ),
                            &attr.name,
                        );
                    }
                }
                match attr.decode(raw) {
                    Ok(value) => {
                        body.insert(key, value.to_json());
                    }
                    Err(error) => {
                        ctx.error_from(error, &attr.name);
                        body.insert(key, JsonValue::String(raw.clone()));
                    }
                }
            }
            None => match &ct.attributes.any_attribute {
                Some(wildcard) if wildcard.is_matching(name) => {
                    match wildcard.process_contents {
                        ProcessContents::Skip => {
                            body.insert(key, JsonValue::String(raw.clone()));
                        }
                        ProcessContents::Lax | ProcessContents::Strict => {
                            match ctx.maps.lookup_attribute(name) {
                                Some(global) => match global.decode(raw) {
                                    Ok(value) => {
                                        body.insert(key, value.to_json());
                                    }
                                    Err(error) => {
                                        ctx.error_from(error, &global.name);
                                        body.insert(key, JsonValue::String(raw.clone()));
                                    }
                                },
                                None => {
                                    if wildcard.process_contents == ProcessContents::Strict {
                                        ctx.error_at(
                                            format!(
                                                "no global declaration found for strictly \
                                                 processed attribute '{}'",
                                                name
                                            ),
                                            &decl.name,
                                        );
                                    }
                                    body.insert(key, JsonValue::String(raw.clone()));
                                }
                            }
                        }
                    }
                }
                _ => {
                    ctx.error_at(
                        format!("unexpected attribute '{}' on element '{}'", name, decl.name),
                        &decl.name,
                    );
                }
            },
        }
    }

    for attr in ct.attributes.iter() {
        if seen.contains(&attr.name) {
            continue;
        }
        if attr.is_required() {
            ctx.error_at(
                format!(
                    "missing required attribute '{}' on element '{}'",
                    attr.name, decl.name
                ),
                &attr.name,
            );
        } else if ctx.options.use_defaults && !attr.is_prohibited() {
            if let Some(constraint) = attr.value_constraint() {
                let key =
                    format!("{}{}", ctx.options.attribute_prefix, ctx.decode_key(&attr.name));
                match attr.decode(constraint) {
                    Ok(value) => {
                        body.insert(key, value.to_json());
                    }
                    Err(_) => {
                        body.insert(key, JsonValue::String(constraint.to_string()));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema(xsd: &str) -> Schema {
        Schema::from_text(xsd).unwrap()
    }

    const ITEM_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="item">
            <xs:complexType>
                <xs:simpleContent>
                    <xs:extension base="xs:string">
                        <xs:attribute name="price" type="xs:decimal" use="required"/>
                    </xs:extension>
                </xs:simpleContent>
            </xs:complexType>
        </xs:element>
    </xs:schema>"#;

    #[test]
    fn test_simple_element_decode() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="root" type="xs:int"/>
            </xs:schema>"#,
        );
        let value = schema
            .to_dict_str("<root>42</root>", None, DecodeOptions::default())
            .unwrap();
        assert_eq!(value, json!(42));
    }

    #[test]
    fn test_attributes_and_text_decode() {
        let schema = schema(ITEM_XSD);
        let value = schema
            .to_dict_str(
                "<item price=\"9.95\">hello</item>",
                None,
                DecodeOptions::default(),
            )
            .unwrap();
        assert_eq!(value, json!({"@price": 9.95, "#": "hello"}));
    }

    #[test]
    fn test_missing_required_attribute() {
        let schema = schema(ITEM_XSD);
        assert!(!schema.is_valid_str("<item>hello</item>"));

        let doc = Document::from_str("<item>hello</item>").unwrap();
        let errors: Vec<ValidationError> =
            schema.iter_errors(&doc, None).unwrap().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("price"));
    }

    #[test]
    fn test_unknown_root_yields_one_error() {
        let schema = schema(ITEM_XSD);
        let doc = Document::from_str("<unknown/>").unwrap();
        let outcomes: Vec<DecodeOutcome> = schema
            .iter_decode(&doc, None, DecodeOptions::default())
            .unwrap()
            .collect();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], DecodeOutcome::Error(_)));
    }

    #[test]
    fn test_validate_off_still_converts() {
        let schema = schema(ITEM_XSD);
        let doc = Document::from_str("<item>hello</item>").unwrap();
        let options = DecodeOptions {
            validate: false,
            ..DecodeOptions::default()
        };
        let outcomes: Vec<DecodeOutcome> = schema
            .iter_decode(&doc, None, options)
            .unwrap()
            .collect();
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            DecodeOutcome::Value(v) => assert_eq!(v, &json!("hello")),
            other => panic!("expected a value, got {:?}", other),
        }
    }

    #[test]
    fn test_force_list_shape() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="list">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="n" type="xs:int" maxOccurs="unbounded"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );

        let singleton = schema
            .to_dict_str("<list><n>1</n></list>", None, DecodeOptions::default())
            .unwrap();
        assert_eq!(singleton, json!({"n": 1}));

        let forced = schema
            .to_dict_str(
                "<list><n>1</n></list>",
                None,
                DecodeOptions {
                    force_list: true,
                    ..DecodeOptions::default()
                },
            )
            .unwrap();
        assert_eq!(forced, json!({"n": [1]}));

        let multiple = schema
            .to_dict_str(
                "<list><n>1</n><n>2</n></list>",
                None,
                DecodeOptions::default(),
            )
            .unwrap();
        assert_eq!(multiple, json!({"n": [1, 2]}));
    }

    #[test]
    fn test_use_defaults_fills_attributes() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="cfg">
                    <xs:complexType>
                        <xs:attribute name="level" type="xs:int" default="3"/>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );

        let with_defaults = schema
            .to_dict_str("<cfg/>", None, DecodeOptions::default())
            .unwrap();
        assert_eq!(with_defaults, json!({"@level": 3}));

        let without = schema
            .to_dict_str(
                "<cfg/>",
                None,
                DecodeOptions {
                    use_defaults: false,
                    ..DecodeOptions::default()
                },
            )
            .unwrap();
        assert_eq!(without, JsonValue::Null);
    }

    #[test]
    fn test_fixed_value_mismatch() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="version" type="xs:string" fixed="1.0"/>
            </xs:schema>"#,
        );
        assert!(schema.is_valid_str("<version>1.0</version>"));
        assert!(schema.is_valid_str("<version/>"));
        assert!(!schema.is_valid_str("<version>2.0</version>"));
    }

    #[test]
    fn test_skip_errors_continues() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="nums">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="n" type="xs:int" maxOccurs="unbounded"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        let doc = Document::from_str("<nums><n>x</n><n>y</n></nums>").unwrap();

        let stopping: Vec<DecodeOutcome> = schema
            .iter_decode(&doc, None, DecodeOptions::default())
            .unwrap()
            .collect();
        assert_eq!(stopping.len(), 1);

        let continuing: Vec<DecodeOutcome> = schema
            .iter_decode(
                &doc,
                None,
                DecodeOptions {
                    skip_errors: true,
                    ..DecodeOptions::default()
                },
            )
            .unwrap()
            .collect();
        let errors = continuing
            .iter()
            .filter(|o| matches!(o, DecodeOutcome::Error(_)))
            .count();
        assert_eq!(errors, 2);
    }

    #[test]
    fn test_path_anchored_decode() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="data">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="point" type="xs:int" maxOccurs="unbounded"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        let doc =
            Document::from_str("<data><point>1</point><point>2</point></data>").unwrap();

        let outcomes: Vec<DecodeOutcome> = schema
            .iter_decode(&doc, Some("/data/point"), DecodeOptions::default())
            .unwrap()
            .collect();
        let values: Vec<&JsonValue> = outcomes
            .iter()
            .filter_map(|o| match o {
                DecodeOutcome::Value(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn test_nil_handling() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="maybe" type="xs:int" nillable="true"/>
                <xs:element name="always" type="xs:int"/>
            </xs:schema>"#,
        );

        let nil = "<maybe xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:nil=\"true\"/>";
        assert!(schema.is_valid_str(nil));
        assert_eq!(
            schema
                .to_dict_str(nil, None, DecodeOptions::default())
                .unwrap(),
            JsonValue::Null
        );

        let nil_with_content = "<maybe xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:nil=\"true\">5</maybe>";
        assert!(!schema.is_valid_str(nil_with_content));

        let not_nillable = "<always xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:nil=\"true\"/>";
        assert!(!schema.is_valid_str(not_nillable));
    }

    #[test]
    fn test_mixed_content_text() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="p">
                    <xs:complexType mixed="true">
                        <xs:sequence>
                            <xs:element name="b" type="xs:string" minOccurs="0"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        let value = schema
            .to_dict_str("<p>hello <b>world</b></p>", None, DecodeOptions::default())
            .unwrap();
        assert_eq!(value, json!({"#": "hello ", "b": "world"}));
    }

    #[test]
    fn test_skipped_wildcard_content_honors_decode_options() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="env">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:any processContents="skip" minOccurs="0"
                                    maxOccurs="unbounded"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        let xml = r#"<env xmlns:a="urn:a" xmlns:b="urn:b">
            <a:item kind="x">1</a:item>
            <b:item>2</b:item>
        </env>"#;

        // The raw subtree uses the same key conventions as the rest of the
        // decoded body
        let value = schema
            .to_dict_str(
                xml,
                None,
                DecodeOptions {
                    text_key: "$t".to_string(),
                    attribute_prefix: "$".to_string(),
                    ..DecodeOptions::default()
                },
            )
            .unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "a:item": {"$kind": "x", "$t": "1"},
                "b:item": "2"
            })
        );

        // Same local name in different namespaces stays distinct, and
        // force_list wraps raw children too
        let forced = schema
            .to_dict_str(
                xml,
                None,
                DecodeOptions {
                    force_list: true,
                    ..DecodeOptions::default()
                },
            )
            .unwrap();
        assert_eq!(
            forced,
            serde_json::json!({
                "a:item": [{"@kind": "x", "#": "1"}],
                "b:item": ["2"]
            })
        );
    }

    #[test]
    fn test_element_only_content_rejects_text() {
        let schema = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="r">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="c" type="xs:string"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        assert!(schema.is_valid_str("<r><c>x</c></r>"));
        assert!(!schema.is_valid_str("<r>stray<c>x</c></r>"));
    }
}
