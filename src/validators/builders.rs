//! The two-phase builder pipeline
//!
//! Phase A scans every registered schema document for top-level declarations
//! and builds them in the fixed category order: simple types, attributes,
//! attribute groups, complex types, elements, model groups. A build that
//! needs a not-yet-built global recurses into the referent's raw entry
//! (on-demand dispatch); a reference with no raw entry fails as unresolved.
//!
//! Phase B re-runs the group, complex type and element builds with local
//! declarations enabled, compiling nested content models in place. Type
//! references of element particles stay symbolic, which is what lets
//! recursive types build without cycles in the object graph; derivation
//! chains (restriction and extension bases) must be acyclic and fail
//! otherwise.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::documents::Element;
use crate::error::{Error, ParseError, Result};
use crate::namespaces::{NamespaceContext, QName};
use crate::XSD_NAMESPACE;

use super::attributes::{AttributeUse, XsdAttribute, XsdAttributeGroup};
use super::base::{DerivationMethod, DerivationSet, FormDefault};
use super::builtins::{
    XSD_ENUMERATION, XSD_FRACTION_DIGITS, XSD_LENGTH, XSD_MAX_EXCLUSIVE, XSD_MAX_INCLUSIVE,
    XSD_MAX_LENGTH, XSD_MIN_EXCLUSIVE, XSD_MIN_INCLUSIVE, XSD_MIN_LENGTH, XSD_PATTERN,
    XSD_TOTAL_DIGITS, XSD_WHITE_SPACE,
};
use super::complex_types::{ComplexContent, XsdComplexType};
use super::elements::{ElementScope, ElementType, XsdElement};
use super::facets::{
    check_facet_admitted, BoundFacet, EnumerationFacet, FacetSet, FractionDigitsFacet,
    LengthFacet, MaxLengthFacet, MinLengthFacet, PatternFacet, PatternGroup, TotalDigitsFacet,
    WhiteSpace,
};
use super::globals::{GlobalType, XsdGlobals};
use super::groups::{GroupParticle, ModelType, XsdGroup};
use super::particles::parse_occurs;
use super::simple_types::{
    SimpleType, SimpleTypeRc, XsdListType, XsdRestrictedType, XsdUnionType,
};
use super::wildcards::{NamespaceConstraint, ProcessContents, XsdAnyAttribute, XsdAnyElement};

/// Build every registered schema document of a registry.
pub(crate) fn build(maps: &mut XsdGlobals) -> Result<()> {
    let mut builder = Builder::stage(maps)?;

    // Phase A: categorized global resolution
    builder.build_all_simple_types(maps)?;
    builder.build_all_attributes(maps)?;
    builder.build_all_attribute_groups(maps)?;
    builder.build_all_complex_types(maps)?;
    builder.build_all_elements(maps, false)?;
    builder.build_all_groups(maps, false)?;

    // Phase B: local declarations
    builder.build_all_groups(maps, true)?;
    builder.build_all_complex_types_local(maps)?;
    builder.build_all_elements(maps, true)?;

    builder.finalize(maps)?;
    Ok(())
}

#[derive(Debug, Clone)]
struct SchemaContext {
    uri: Option<String>,
    target_namespace: String,
    element_form_default: FormDefault,
    attribute_form_default: FormDefault,
    namespaces: NamespaceContext,
}

impl SchemaContext {
    fn location(&self) -> String {
        self.uri.clone().unwrap_or_else(|| "<string>".to_string())
    }

    fn target_namespace_opt(&self) -> Option<&str> {
        if self.target_namespace.is_empty() {
            None
        } else {
            Some(&self.target_namespace)
        }
    }

    /// The qualified name of a top-level declaration
    fn qualify(&self, local_name: &str) -> QName {
        match self.target_namespace_opt() {
            Some(ns) => QName::namespaced(ns, local_name),
            None => QName::local(local_name),
        }
    }

    /// Resolve a reference attribute value (`prefix:local`, `{ns}local` or
    /// a bare name taking the default namespace)
    fn resolve_ref(&self, value: &str) -> Result<QName> {
        let value = value.trim();
        if value.starts_with('{') {
            QName::from_extended(value)
        } else {
            self.namespaces.resolve(value)
        }
    }

    /// The effective name of a local element declaration
    fn local_element_name(&self, local_name: &str, form: Option<FormDefault>) -> QName {
        if form.unwrap_or(self.element_form_default).is_qualified() {
            self.qualify(local_name)
        } else {
            QName::local(local_name)
        }
    }

    /// The effective name of a local attribute declaration
    fn local_attribute_name(&self, local_name: &str, form: Option<FormDefault>) -> QName {
        if form.unwrap_or(self.attribute_form_default).is_qualified() {
            self.qualify(local_name)
        } else {
            QName::local(local_name)
        }
    }
}

#[derive(Debug, Clone)]
struct RawGlobal {
    elem: Element,
    schema: usize,
}

#[derive(Debug)]
struct Builder {
    contexts: Vec<SchemaContext>,
    raw_simple_types: IndexMap<QName, RawGlobal>,
    raw_complex_types: IndexMap<QName, RawGlobal>,
    raw_attributes: IndexMap<QName, RawGlobal>,
    raw_attribute_groups: IndexMap<QName, RawGlobal>,
    raw_groups: IndexMap<QName, RawGlobal>,
    raw_elements: IndexMap<QName, RawGlobal>,
    building: HashSet<QName>,
    complex_building: HashSet<QName>,
    complex_done: HashSet<QName>,
    groups_done: HashSet<QName>,
    elements_done: HashSet<QName>,
}

fn unresolved(name: &QName) -> Error {
    ParseError::new("unresolved reference")
        .with_component(name.clone())
        .into()
}

fn xsd_children(elem: &Element) -> impl Iterator<Item = &Element> {
    elem.children.iter().filter(|child| {
        child.namespace() == Some(XSD_NAMESPACE) && child.local_name() != "annotation"
    })
}

fn find_xsd_child<'a>(elem: &'a Element, local_name: &str) -> Option<&'a Element> {
    elem.find_child(Some(XSD_NAMESPACE), local_name)
}

fn required_attribute<'a>(elem: &'a Element, name: &str, ctx: &SchemaContext) -> Result<&'a str> {
    elem.get_attribute(name).ok_or_else(|| {
        ParseError::new(format!(
            "'{}' declaration requires a '{}' attribute",
            elem.local_name(),
            name
        ))
        .with_location(ctx.location())
        .into()
    })
}

impl Builder {
    /// Scan every registered document for top-level declarations and stage
    /// their raw elements. Declarations inside `xs:redefine` blocks are
    /// staged last and override previously staged entries for the same
    /// qualified name.
    fn stage(maps: &XsdGlobals) -> Result<Self> {
        let mut builder = Builder {
            contexts: Vec::new(),
            raw_simple_types: IndexMap::new(),
            raw_complex_types: IndexMap::new(),
            raw_attributes: IndexMap::new(),
            raw_attribute_groups: IndexMap::new(),
            raw_groups: IndexMap::new(),
            raw_elements: IndexMap::new(),
            building: HashSet::new(),
            complex_building: HashSet::new(),
            complex_done: HashSet::new(),
            groups_done: HashSet::new(),
            elements_done: HashSet::new(),
        };

        for index in 0..maps.schema_count() {
            let doc = maps.schema(index);
            builder.contexts.push(SchemaContext {
                uri: doc.uri.clone(),
                target_namespace: doc.target_namespace.clone(),
                element_form_default: doc.element_form_default,
                attribute_form_default: doc.attribute_form_default,
                namespaces: doc.namespaces.clone(),
            });
        }

        for index in 0..maps.schema_count() {
            let root = maps.schema(index).root.clone();
            for child in xsd_children(&root) {
                builder.stage_declaration(child, index, false)?;
            }
        }
        for index in 0..maps.schema_count() {
            let root = maps.schema(index).root.clone();
            for child in xsd_children(&root) {
                if child.local_name() == "redefine" {
                    for inner in xsd_children(child) {
                        builder.stage_declaration(inner, index, true)?;
                    }
                }
            }
        }

        Ok(builder)
    }

    fn stage_declaration(&mut self, elem: &Element, schema: usize, redefines: bool) -> Result<()> {
        let kind = elem.local_name();
        let staged = match kind {
            "simpleType" | "complexType" | "attribute" | "attributeGroup" | "group"
            | "element" => true,
            _ => false,
        };
        if !staged {
            return Ok(());
        }

        let ctx = self.contexts[schema].clone();
        let local_name = required_attribute(elem, "name", &ctx)?;
        let name = ctx.qualify(local_name);
        let raw = RawGlobal {
            elem: elem.clone(),
            schema,
        };

        let duplicate = match kind {
            "simpleType" | "complexType" => {
                self.raw_simple_types.contains_key(&name)
                    || self.raw_complex_types.contains_key(&name)
            }
            "attribute" => self.raw_attributes.contains_key(&name),
            "attributeGroup" => self.raw_attribute_groups.contains_key(&name),
            "group" => self.raw_groups.contains_key(&name),
            "element" => self.raw_elements.contains_key(&name),
            _ => false,
        };
        if duplicate && !redefines {
            return Err(ParseError::new(format!(
                "duplicate global {} declaration",
                kind
            ))
            .with_component(name)
            .with_location(ctx.location())
            .into());
        }

        match kind {
            "simpleType" => {
                self.raw_complex_types.shift_remove(&name);
                self.raw_simple_types.insert(name, raw);
            }
            "complexType" => {
                self.raw_simple_types.shift_remove(&name);
                self.raw_complex_types.insert(name, raw);
            }
            "attribute" => {
                self.raw_attributes.insert(name, raw);
            }
            "attributeGroup" => {
                self.raw_attribute_groups.insert(name, raw);
            }
            "group" => {
                self.raw_groups.insert(name, raw);
            }
            "element" => {
                self.raw_elements.insert(name, raw);
            }
            _ => {}
        }
        Ok(())
    }

    // =========================================================================
    // Simple types
    // =========================================================================

    fn build_all_simple_types(&mut self, maps: &mut XsdGlobals) -> Result<()> {
        let names: Vec<QName> = self.raw_simple_types.keys().cloned().collect();
        for name in names {
            self.require_simple_type(maps, &name)?;
        }
        Ok(())
    }

    fn require_simple_type(&mut self, maps: &mut XsdGlobals, name: &QName) -> Result<SimpleTypeRc> {
        if let Some(global_type) = maps.types.get(name) {
            return global_type.as_simple().cloned().ok_or_else(|| {
                ParseError::new("the referenced type is not a simple type")
                    .with_component(name.clone())
                    .into()
            });
        }
        let raw = match self.raw_simple_types.get(name) {
            Some(raw) => raw.clone(),
            None => return Err(unresolved(name)),
        };
        if !self.building.insert(name.clone()) {
            return Err(ParseError::new("circular simple type definition")
                .with_component(name.clone())
                .into());
        }
        let ctx = self.contexts[raw.schema].clone();
        let result = self.build_simple_type(maps, &raw.elem, &ctx, Some(name.clone()));
        self.building.remove(name);

        let simple_type = result.map_err(|e| e.at_location(&ctx.location()))?;
        maps.types
            .insert(name.clone(), GlobalType::Simple(simple_type.clone()));
        Ok(simple_type)
    }

    fn build_simple_type(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        name: Option<QName>,
    ) -> Result<SimpleTypeRc> {
        for child in xsd_children(elem) {
            match child.local_name() {
                "restriction" => return self.build_simple_restriction(maps, child, ctx, name),
                "list" => {
                    let item_type = match child.get_attribute("itemType") {
                        Some(item) => {
                            let item_name = ctx.resolve_ref(item)?;
                            self.require_simple_type(maps, &item_name)?
                        }
                        None => {
                            let inline = find_xsd_child(child, "simpleType").ok_or_else(|| {
                                ParseError::new(
                                    "list requires an itemType attribute or an inline simpleType",
                                )
                            })?;
                            self.build_simple_type(maps, inline, ctx, None)?
                        }
                    };
                    let list = match name {
                        Some(n) => XsdListType::with_name(item_type, n),
                        None => XsdListType::new(item_type),
                    };
                    return Ok(Arc::new(list));
                }
                "union" => {
                    let mut members: Vec<SimpleTypeRc> = Vec::new();
                    if let Some(tokens) = child.get_attribute("memberTypes") {
                        for token in tokens.split_whitespace() {
                            let member_name = ctx.resolve_ref(token)?;
                            members.push(self.require_simple_type(maps, &member_name)?);
                        }
                    }
                    for inline in xsd_children(child) {
                        if inline.local_name() == "simpleType" {
                            members.push(self.build_simple_type(maps, inline, ctx, None)?);
                        }
                    }
                    if members.is_empty() {
                        return Err(ParseError::new("union requires at least one member type").into());
                    }
                    let union = match name {
                        Some(n) => XsdUnionType::with_name(members, n),
                        None => XsdUnionType::new(members),
                    };
                    return Ok(Arc::new(union));
                }
                _ => {}
            }
        }
        Err(ParseError::new("simpleType requires a restriction, list or union").into())
    }

    fn build_simple_restriction(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        name: Option<QName>,
    ) -> Result<SimpleTypeRc> {
        let base: SimpleTypeRc = match elem.get_attribute("base") {
            Some(base_attr) => {
                let base_name = ctx.resolve_ref(base_attr)?;
                self.require_simple_type(maps, &base_name)?
            }
            None => {
                let inline = find_xsd_child(elem, "simpleType").ok_or_else(|| {
                    ParseError::new("restriction requires a base attribute or an inline simpleType")
                })?;
                self.build_simple_type(maps, inline, ctx, None)?
            }
        };
        let facets = parse_facets(elem, &base)?;
        let restricted = match name {
            Some(n) => XsdRestrictedType::with_name(base, facets, n),
            None => XsdRestrictedType::new(base, facets),
        };
        Ok(Arc::new(restricted))
    }

    // =========================================================================
    // Attributes and attribute groups
    // =========================================================================

    fn build_all_attributes(&mut self, maps: &mut XsdGlobals) -> Result<()> {
        let names: Vec<QName> = self.raw_attributes.keys().cloned().collect();
        for name in names {
            self.require_attribute(maps, &name)?;
        }
        Ok(())
    }

    fn require_attribute(
        &mut self,
        maps: &mut XsdGlobals,
        name: &QName,
    ) -> Result<Arc<XsdAttribute>> {
        if let Some(attr) = maps.attributes.get(name) {
            return Ok(attr.clone());
        }
        let raw = match self.raw_attributes.get(name) {
            Some(raw) => raw.clone(),
            None => return Err(unresolved(name)),
        };
        let ctx = self.contexts[raw.schema].clone();
        let attr = self
            .build_attribute_decl(maps, &raw.elem, &ctx, true)
            .map_err(|e| e.at_location(&ctx.location()))?;
        let attr = Arc::new(attr);
        maps.attributes.insert(name.clone(), attr.clone());
        Ok(attr)
    }

    fn build_attribute_decl(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        global: bool,
    ) -> Result<XsdAttribute> {
        let local_name = required_attribute(elem, "name", ctx)?;
        let name = if global {
            ctx.qualify(local_name)
        } else {
            let form = elem.get_attribute("form").and_then(FormDefault::parse);
            ctx.local_attribute_name(local_name, form)
        };

        let simple_type: Option<SimpleTypeRc> = match elem.get_attribute("type") {
            Some(type_attr) => {
                let type_name = ctx.resolve_ref(type_attr)?;
                Some(self.require_simple_type(maps, &type_name)?)
            }
            None => match find_xsd_child(elem, "simpleType") {
                Some(inline) => Some(self.build_simple_type(maps, inline, ctx, None)?),
                None => None,
            },
        };

        let default = elem.get_attribute("default").map(|s| s.to_string());
        let fixed = elem.get_attribute("fixed").map(|s| s.to_string());
        if default.is_some() && fixed.is_some() {
            return Err(ParseError::new(
                "'default' and 'fixed' attributes are mutually exclusive",
            )
            .with_component(name)
            .into());
        }

        let mut attr = XsdAttribute::new(name);
        attr.simple_type = simple_type;
        attr.default = default;
        attr.fixed = fixed;
        Ok(attr)
    }

    fn build_all_attribute_groups(&mut self, maps: &mut XsdGlobals) -> Result<()> {
        let names: Vec<QName> = self.raw_attribute_groups.keys().cloned().collect();
        for name in names {
            self.require_attribute_group(maps, &name)?;
        }
        Ok(())
    }

    fn require_attribute_group(
        &mut self,
        maps: &mut XsdGlobals,
        name: &QName,
    ) -> Result<Arc<XsdAttributeGroup>> {
        if let Some(group) = maps.attribute_groups.get(name) {
            return Ok(group.clone());
        }
        let raw = match self.raw_attribute_groups.get(name) {
            Some(raw) => raw.clone(),
            None => return Err(unresolved(name)),
        };
        if !self.building.insert(name.clone()) {
            return Err(ParseError::new("circular attribute group reference")
                .with_component(name.clone())
                .into());
        }
        let ctx = self.contexts[raw.schema].clone();
        let mut group = XsdAttributeGroup::named(name.clone());
        let result = self.parse_attribute_uses(maps, &raw.elem, &ctx, &mut group);
        self.building.remove(name);
        result.map_err(|e| e.at_location(&ctx.location()))?;

        let group = Arc::new(group);
        maps.attribute_groups.insert(name.clone(), group.clone());
        Ok(group)
    }

    /// Collect the attribute uses declared directly under `elem` into
    /// `group`: local declarations, references, nested attribute groups and
    /// an optional anyAttribute wildcard.
    fn parse_attribute_uses(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        group: &mut XsdAttributeGroup,
    ) -> Result<()> {
        for child in xsd_children(elem) {
            match child.local_name() {
                "attribute" => {
                    let mut attr = match child.get_attribute("ref") {
                        Some(reference) => {
                            let ref_name = ctx.resolve_ref(reference)?;
                            (*self.require_attribute(maps, &ref_name)?).clone()
                        }
                        None => self.build_attribute_decl(maps, child, ctx, false)?,
                    };
                    if let Some(use_attr) = child.get_attribute("use") {
                        attr.use_mode = AttributeUse::parse(use_attr).ok_or_else(|| {
                            ParseError::new(format!("invalid 'use' value: '{}'", use_attr))
                        })?;
                    }
                    if let Some(default) = child.get_attribute("default") {
                        attr.default = Some(default.to_string());
                    }
                    if let Some(fixed) = child.get_attribute("fixed") {
                        attr.fixed = Some(fixed.to_string());
                    }
                    group.insert(Arc::new(attr));
                }
                "attributeGroup" => {
                    let reference = required_attribute(child, "ref", ctx)?;
                    let ref_name = ctx.resolve_ref(reference)?;
                    let nested = self.require_attribute_group(maps, &ref_name)?;
                    group.merge(&nested);
                }
                "anyAttribute" => {
                    group.any_attribute = Some(parse_any_attribute(child, ctx)?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    // =========================================================================
    // Complex types
    // =========================================================================

    fn build_all_complex_types(&mut self, maps: &mut XsdGlobals) -> Result<()> {
        let names: Vec<QName> = self.raw_complex_types.keys().cloned().collect();
        for name in names {
            self.require_complex_type(maps, &name)?;
        }
        Ok(())
    }

    fn require_complex_type(
        &mut self,
        maps: &mut XsdGlobals,
        name: &QName,
    ) -> Result<Arc<XsdComplexType>> {
        if let Some(global_type) = maps.types.get(name) {
            return global_type.as_complex().cloned().ok_or_else(|| {
                ParseError::new("the referenced type is not a complex type")
                    .with_component(name.clone())
                    .into()
            });
        }
        let raw = match self.raw_complex_types.get(name) {
            Some(raw) => raw.clone(),
            None => return Err(unresolved(name)),
        };
        if !self.complex_building.insert(name.clone()) {
            return Err(ParseError::new("circular complex type derivation")
                .with_component(name.clone())
                .into());
        }
        let ctx = self.contexts[raw.schema].clone();
        let result = self.build_complex_type(maps, &raw.elem, &ctx, Some(name.clone()), false);
        self.complex_building.remove(name);

        let ct = Arc::new(result.map_err(|e| e.at_location(&ctx.location()))?);
        maps.types
            .insert(name.clone(), GlobalType::Complex(ct.clone()));
        Ok(ct)
    }

    fn build_all_complex_types_local(&mut self, maps: &mut XsdGlobals) -> Result<()> {
        let names: Vec<QName> = self.raw_complex_types.keys().cloned().collect();
        for name in names {
            self.require_complex_local(maps, &name)?;
        }
        Ok(())
    }

    fn require_complex_local(
        &mut self,
        maps: &mut XsdGlobals,
        name: &QName,
    ) -> Result<Arc<XsdComplexType>> {
        if self.complex_done.contains(name) || !self.raw_complex_types.contains_key(name) {
            return match maps.types.get(name) {
                Some(global_type) => global_type.as_complex().cloned().ok_or_else(|| {
                    ParseError::new("the referenced type is not a complex type")
                        .with_component(name.clone())
                        .into()
                }),
                None => Err(unresolved(name)),
            };
        }
        let raw = self.raw_complex_types.get(name).cloned().expect("checked");
        if !self.complex_building.insert(name.clone()) {
            return Err(ParseError::new("circular complex type derivation")
                .with_component(name.clone())
                .into());
        }
        let ctx = self.contexts[raw.schema].clone();
        let result = self.build_complex_type(maps, &raw.elem, &ctx, Some(name.clone()), true);
        self.complex_building.remove(name);

        let ct = Arc::new(result.map_err(|e| e.at_location(&ctx.location()))?);
        maps.types
            .insert(name.clone(), GlobalType::Complex(ct.clone()));
        self.complex_done.insert(name.clone());
        Ok(ct)
    }

    fn build_complex_type(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        name: Option<QName>,
        parse_local: bool,
    ) -> Result<XsdComplexType> {
        let mut ct = XsdComplexType::new(name);
        ct.mixed = elem.get_attribute("mixed") == Some("true");
        ct.abstract_type = elem.get_attribute("abstract") == Some("true");
        ct.block = elem
            .get_attribute("block")
            .map(DerivationSet::parse)
            .unwrap_or_default();
        ct.final_set = elem
            .get_attribute("final")
            .map(DerivationSet::parse)
            .unwrap_or_default();

        if let Some(simple_content) = find_xsd_child(elem, "simpleContent") {
            self.build_simple_content(maps, simple_content, ctx, &mut ct)?;
        } else if let Some(complex_content) = find_xsd_child(elem, "complexContent") {
            if complex_content.get_attribute("mixed") == Some("true") {
                ct.mixed = true;
            }
            self.build_complex_content(maps, complex_content, ctx, &mut ct, parse_local)?;
        } else {
            self.parse_attribute_uses(maps, elem, ctx, &mut ct.attributes)?;
            if parse_local {
                if let Some(compositor) = find_compositor(elem) {
                    let group = self.build_content_group(maps, compositor, ctx)?;
                    ct.content = ComplexContent::Group(Arc::new(group));
                }
            }
        }

        Ok(ct)
    }

    fn build_simple_content(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        ct: &mut XsdComplexType,
    ) -> Result<()> {
        let (derivation_elem, method) = match find_xsd_child(elem, "extension") {
            Some(e) => (e, DerivationMethod::Extension),
            None => match find_xsd_child(elem, "restriction") {
                Some(e) => (e, DerivationMethod::Restriction),
                None => {
                    return Err(ParseError::new(
                        "simpleContent requires an extension or a restriction",
                    )
                    .into())
                }
            },
        };

        let base_attr = required_attribute(derivation_elem, "base", ctx)?;
        let base_name = ctx.resolve_ref(base_attr)?;
        let (base_simple, base_complex) = self.resolve_simple_content_base(maps, &base_name)?;

        ct.derivation = Some(method);
        ct.base_type = Some(base_name);

        match method {
            DerivationMethod::Extension => {
                ct.content = ComplexContent::Simple(base_simple);
            }
            DerivationMethod::Restriction => {
                let facets = parse_facets(derivation_elem, &base_simple)?;
                let restricted = XsdRestrictedType::new(base_simple, facets);
                ct.content = ComplexContent::Simple(Arc::new(restricted));
            }
            DerivationMethod::List | DerivationMethod::Union | DerivationMethod::Substitution => {
                unreachable!("method is only ever Extension or Restriction here")
            }
        }

        self.parse_attribute_uses(maps, derivation_elem, ctx, &mut ct.attributes)?;
        if let Some(base_ct) = base_complex {
            ct.attributes.merge(&base_ct.attributes);
        }
        Ok(())
    }

    /// The effective simple type behind the base of a simpleContent
    /// derivation: either a plain simple type, or a complex type whose
    /// content is simple.
    fn resolve_simple_content_base(
        &mut self,
        maps: &mut XsdGlobals,
        base_name: &QName,
    ) -> Result<(SimpleTypeRc, Option<Arc<XsdComplexType>>)> {
        let is_complex = self.raw_complex_types.contains_key(base_name)
            || matches!(maps.types.get(base_name), Some(GlobalType::Complex(_)));
        if is_complex {
            let base_ct = self.require_complex_type(maps, base_name)?;
            let simple = base_ct.simple_type().cloned().ok_or_else(|| {
                ParseError::new("the base of a simpleContent derivation has no simple content")
                    .with_component(base_name.clone())
            })?;
            Ok((simple, Some(base_ct)))
        } else {
            let simple = self.require_simple_type(maps, base_name)?;
            Ok((simple, None))
        }
    }

    fn build_complex_content(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        ct: &mut XsdComplexType,
        parse_local: bool,
    ) -> Result<()> {
        let (derivation_elem, method) = match find_xsd_child(elem, "extension") {
            Some(e) => (e, DerivationMethod::Extension),
            None => match find_xsd_child(elem, "restriction") {
                Some(e) => (e, DerivationMethod::Restriction),
                None => {
                    return Err(ParseError::new(
                        "complexContent requires an extension or a restriction",
                    )
                    .into())
                }
            },
        };

        let base_attr = required_attribute(derivation_elem, "base", ctx)?;
        let base_name = ctx.resolve_ref(base_attr)?;
        ct.derivation = Some(method);
        ct.base_type = Some(base_name.clone());

        let base_ct = if parse_local {
            self.require_complex_local(maps, &base_name)?
        } else {
            self.require_complex_type(maps, &base_name)?
        };
        if method == DerivationMethod::Extension {
            ct.mixed = ct.mixed || base_ct.mixed;
        }

        self.parse_attribute_uses(maps, derivation_elem, ctx, &mut ct.attributes)?;
        ct.attributes.merge(&base_ct.attributes);

        if parse_local {
            let own_group = match find_compositor(derivation_elem) {
                Some(compositor) => Some(self.build_content_group(maps, compositor, ctx)?),
                None => None,
            };
            ct.content = match method {
                // A restriction's content model replaces the base's
                DerivationMethod::Restriction => match own_group {
                    Some(group) => ComplexContent::Group(Arc::new(group)),
                    None => ComplexContent::Empty,
                },
                // An extension concatenates the base's content before its own
                DerivationMethod::Extension => match (&base_ct.content, own_group) {
                    (ComplexContent::Group(base_group), Some(own)) => {
                        let mut seq = XsdGroup::new(ModelType::Sequence);
                        seq.push(GroupParticle::Group(base_group.clone()));
                        seq.push(GroupParticle::Group(Arc::new(own)));
                        ComplexContent::Group(Arc::new(seq))
                    }
                    (ComplexContent::Group(base_group), None) => {
                        ComplexContent::Group(base_group.clone())
                    }
                    (ComplexContent::Empty, Some(own)) => {
                        ComplexContent::Group(Arc::new(own))
                    }
                    (ComplexContent::Empty, None) => ComplexContent::Empty,
                    (ComplexContent::Simple(simple), None) => {
                        ComplexContent::Simple(simple.clone())
                    }
                    (ComplexContent::Simple(_), Some(_)) => {
                        return Err(ParseError::new(
                            "cannot extend simple content with element content",
                        )
                        .with_component(base_name)
                        .into())
                    }
                },
                DerivationMethod::List | DerivationMethod::Union | DerivationMethod::Substitution => {
                    unreachable!("method is only ever Extension or Restriction here")
                }
            };
        }
        Ok(())
    }

    // =========================================================================
    // Model groups
    // =========================================================================

    fn build_all_groups(&mut self, maps: &mut XsdGlobals, parse_local: bool) -> Result<()> {
        let names: Vec<QName> = self.raw_groups.keys().cloned().collect();
        for name in names {
            if parse_local {
                self.require_group(maps, &name)?;
            } else if !maps.groups.contains_key(&name) {
                // Phase A registers the named group shallowly; its particles
                // are compiled in Phase B
                let raw = self.raw_groups.get(&name).cloned().expect("staged");
                let model = find_compositor(&raw.elem)
                    .and_then(|c| ModelType::from_tag(c.local_name()))
                    .unwrap_or_default();
                maps.groups
                    .insert(name.clone(), Arc::new(XsdGroup::named(name.clone(), model)));
            }
        }
        Ok(())
    }

    fn require_group(&mut self, maps: &mut XsdGlobals, name: &QName) -> Result<Arc<XsdGroup>> {
        if self.groups_done.contains(name) || !self.raw_groups.contains_key(name) {
            return maps
                .groups
                .get(name)
                .cloned()
                .ok_or_else(|| unresolved(name));
        }
        let raw = self.raw_groups.get(name).cloned().expect("checked");
        if !self.building.insert(name.clone()) {
            return Err(ParseError::new("circular model group reference")
                .with_component(name.clone())
                .into());
        }
        let ctx = self.contexts[raw.schema].clone();
        let compositor = find_compositor(&raw.elem).ok_or_else(|| {
            Error::from(
                ParseError::new("group requires a sequence, choice or all compositor")
                    .with_component(name.clone()),
            )
        });
        let result = compositor.and_then(|c| self.build_content_group(maps, c, &ctx));
        self.building.remove(name);

        let mut group = result.map_err(|e| e.at_location(&ctx.location()))?;
        group.name = Some(name.clone());
        let group = Arc::new(group);
        maps.groups.insert(name.clone(), group.clone());
        self.groups_done.insert(name.clone());
        Ok(group)
    }

    /// Build a model group from a compositor element (or a group reference
    /// standing in for one).
    fn build_content_group(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
    ) -> Result<XsdGroup> {
        if elem.local_name() == "group" {
            let reference = required_attribute(elem, "ref", ctx)?;
            let ref_name = ctx.resolve_ref(reference)?;
            let named = self.require_group(maps, &ref_name)?;
            let mut group = (*named).clone();
            group.occurs = parse_occurs(elem)?;
            return Ok(group);
        }

        let model = ModelType::from_tag(elem.local_name()).ok_or_else(|| {
            Error::from(ParseError::new(format!(
                "expected a compositor, found '{}'",
                elem.local_name()
            )))
        })?;
        let mut group = XsdGroup::new(model);
        group.occurs = parse_occurs(elem)?;

        for child in xsd_children(elem) {
            match child.local_name() {
                "element" => {
                    let element = self.build_local_element(maps, child, ctx)?;
                    group.push(GroupParticle::Element(Arc::new(element)));
                }
                "sequence" | "choice" | "all" => {
                    let nested = self.build_content_group(maps, child, ctx)?;
                    group.push(GroupParticle::Group(Arc::new(nested)));
                }
                "group" => {
                    let nested = self.build_content_group(maps, child, ctx)?;
                    group.push(GroupParticle::Group(Arc::new(nested)));
                }
                "any" => {
                    group.push(GroupParticle::Any(Arc::new(parse_any_element(child, ctx)?)));
                }
                other => {
                    return Err(ParseError::new(format!(
                        "unexpected element '{}' in a {} group",
                        other, model
                    ))
                    .into())
                }
            }
        }

        if model == ModelType::All {
            if group.occurs.max.map_or(true, |max| max > 1) {
                return Err(
                    ParseError::new("an 'all' group admits maxOccurs of at most 1").into(),
                );
            }
            for particle in &group.particles {
                match particle {
                    GroupParticle::Element(e) if e.occurs.max.map_or(false, |max| max <= 1) => {}
                    _ => {
                        return Err(ParseError::new(
                            "an 'all' group admits only element particles with maxOccurs of at most 1",
                        )
                        .into())
                    }
                }
            }
        }

        Ok(group)
    }

    fn build_local_element(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
    ) -> Result<XsdElement> {
        let occurs = parse_occurs(elem)?;

        if let Some(reference) = elem.get_attribute("ref") {
            let ref_name = ctx.resolve_ref(reference)?;
            if maps.elements.get(&ref_name).is_none() && !self.raw_elements.contains_key(&ref_name)
            {
                return Err(unresolved(&ref_name));
            }
            return Ok(XsdElement::reference(ref_name, occurs));
        }

        let local_name = required_attribute(elem, "name", ctx)?;
        let form = elem.get_attribute("form").and_then(FormDefault::parse);
        let name = ctx.local_element_name(local_name, form);

        let element_type = self.parse_element_type(maps, elem, ctx, true)?;
        let mut element = XsdElement::new(name, element_type)
            .with_occurs(occurs)
            .with_scope(ElementScope::Local);
        self.apply_element_attributes(elem, &mut element)?;
        Ok(element)
    }

    fn parse_element_type(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        parse_local: bool,
    ) -> Result<ElementType> {
        if let Some(type_attr) = elem.get_attribute("type") {
            let type_name = ctx.resolve_ref(type_attr)?;
            let known = maps.types.contains_key(&type_name)
                || self.raw_simple_types.contains_key(&type_name)
                || self.raw_complex_types.contains_key(&type_name);
            if !known {
                return Err(unresolved(&type_name));
            }
            return Ok(ElementType::Named(type_name));
        }
        if let Some(inline) = find_xsd_child(elem, "simpleType") {
            return Ok(ElementType::Simple(
                self.build_simple_type(maps, inline, ctx, None)?,
            ));
        }
        if let Some(inline) = find_xsd_child(elem, "complexType") {
            return Ok(ElementType::Complex(Arc::new(self.build_complex_type(
                maps,
                inline,
                ctx,
                None,
                parse_local,
            )?)));
        }
        Ok(ElementType::AnyType)
    }

    fn apply_element_attributes(&self, elem: &Element, element: &mut XsdElement) -> Result<()> {
        element.nillable = elem.get_attribute("nillable") == Some("true");
        element.abstract_element = elem.get_attribute("abstract") == Some("true");
        element.default = elem.get_attribute("default").map(|s| s.to_string());
        element.fixed = elem.get_attribute("fixed").map(|s| s.to_string());
        if element.default.is_some() && element.fixed.is_some() {
            return Err(ParseError::new(
                "'default' and 'fixed' attributes are mutually exclusive",
            )
            .with_component(element.name.clone())
            .into());
        }
        element.block = elem
            .get_attribute("block")
            .map(DerivationSet::parse)
            .unwrap_or_default();
        element.final_set = elem
            .get_attribute("final")
            .map(DerivationSet::parse)
            .unwrap_or_default();
        Ok(())
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn build_all_elements(&mut self, maps: &mut XsdGlobals, parse_local: bool) -> Result<()> {
        let names: Vec<QName> = self.raw_elements.keys().cloned().collect();
        for name in names {
            if parse_local {
                if self.elements_done.contains(&name) {
                    continue;
                }
            } else if maps.elements.contains_key(&name) {
                continue;
            }

            let raw = self.raw_elements.get(&name).cloned().expect("staged");
            let ctx = self.contexts[raw.schema].clone();
            let element = self
                .build_global_element(maps, &raw.elem, &ctx, &name, parse_local)
                .map_err(|e| e.at_location(&ctx.location()))?;
            maps.elements.insert(name.clone(), Arc::new(element));
            if parse_local {
                self.elements_done.insert(name);
            }
        }
        Ok(())
    }

    fn build_global_element(
        &mut self,
        maps: &mut XsdGlobals,
        elem: &Element,
        ctx: &SchemaContext,
        name: &QName,
        parse_local: bool,
    ) -> Result<XsdElement> {
        let element_type = self.parse_element_type(maps, elem, ctx, parse_local)?;
        let mut element = XsdElement::new(name.clone(), element_type);
        self.apply_element_attributes(elem, &mut element)?;
        if let Some(head) = elem.get_attribute("substitutionGroup") {
            element.substitution_group = Some(ctx.resolve_ref(head)?);
        }
        Ok(element)
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    fn finalize(&mut self, maps: &mut XsdGlobals) -> Result<()> {
        let mut substitution_groups: IndexMap<QName, Vec<QName>> = IndexMap::new();
        for (name, decl) in &maps.elements {
            if let Some(head) = &decl.substitution_group {
                if !maps.elements.contains_key(head) {
                    return Err(ParseError::new("substitution group head is not declared")
                        .with_component(head.clone())
                        .into());
                }
                substitution_groups
                    .entry(head.clone())
                    .or_default()
                    .push(name.clone());
            }
        }
        maps.substitution_groups = substitution_groups;

        maps.base_elements = maps.elements.clone();
        let groups: Vec<Arc<XsdGroup>> = maps.groups.values().cloned().collect();
        for group in groups {
            for element in group.iter_elements() {
                let resolved = match &element.ref_element {
                    Some(reference) => maps.elements.get(reference).cloned(),
                    None => Some(element.clone()),
                };
                if let Some(decl) = resolved {
                    maps.base_elements.insert(decl.name.clone(), decl);
                }
            }
        }

        maps.mark_all_built(true);
        Ok(())
    }
}

fn find_compositor(elem: &Element) -> Option<&Element> {
    xsd_children(elem).find(|child| {
        matches!(
            child.local_name(),
            "sequence" | "choice" | "all" | "group"
        )
    })
}

fn parse_any_element(elem: &Element, ctx: &SchemaContext) -> Result<XsdAnyElement> {
    let occurs = parse_occurs(elem)?;
    let constraint = NamespaceConstraint::parse(
        elem.get_attribute("namespace").unwrap_or("##any"),
        ctx.target_namespace_opt(),
    )?;
    let process_contents = parse_process_contents(elem)?;
    Ok(XsdAnyElement {
        constraint,
        process_contents,
        occurs,
    })
}

fn parse_any_attribute(elem: &Element, ctx: &SchemaContext) -> Result<XsdAnyAttribute> {
    let constraint = NamespaceConstraint::parse(
        elem.get_attribute("namespace").unwrap_or("##any"),
        ctx.target_namespace_opt(),
    )?;
    let process_contents = parse_process_contents(elem)?;
    Ok(XsdAnyAttribute {
        constraint,
        process_contents,
    })
}

fn parse_process_contents(elem: &Element) -> Result<ProcessContents> {
    match elem.get_attribute("processContents") {
        None => Ok(ProcessContents::Strict),
        Some(value) => ProcessContents::parse(value).ok_or_else(|| {
            ParseError::new(format!("invalid processContents value: '{}'", value)).into()
        }),
    }
}

/// Parse the constraining facets of a restriction step.
///
/// The compile-time check verifies each facet is admitted by the base's
/// builtin and that its value is well-formed for the base type; range bounds
/// are parsed through the base so the run-time comparisons are typed.
fn parse_facets(elem: &Element, base: &SimpleTypeRc) -> Result<FacetSet> {
    let mut facets = FacetSet::new();
    let mut pattern_group = PatternGroup::default();
    let mut enumeration: Vec<String> = Vec::new();

    for child in xsd_children(elem) {
        let facet_name = child.local_name();
        match facet_name {
            XSD_LENGTH | XSD_MIN_LENGTH | XSD_MAX_LENGTH | XSD_PATTERN | XSD_ENUMERATION
            | XSD_WHITE_SPACE | XSD_MIN_INCLUSIVE | XSD_MAX_INCLUSIVE | XSD_MIN_EXCLUSIVE
            | XSD_MAX_EXCLUSIVE | XSD_TOTAL_DIGITS | XSD_FRACTION_DIGITS => {}
            _ => continue,
        }

        if let Some(builtin) = base.primitive() {
            check_facet_admitted(facet_name, builtin).map_err(|e| {
                Error::from(ParseError::new(e.to_string()))
            })?;
        }

        let value = child.get_attribute("value").ok_or_else(|| {
            ParseError::new(format!("facet '{}' requires a 'value' attribute", facet_name))
        })?;

        match facet_name {
            XSD_LENGTH => {
                facets.length = Some(LengthFacet {
                    value: parse_count(facet_name, value)?,
                })
            }
            XSD_MIN_LENGTH => {
                facets.min_length = Some(MinLengthFacet {
                    value: parse_count(facet_name, value)?,
                })
            }
            XSD_MAX_LENGTH => {
                facets.max_length = Some(MaxLengthFacet {
                    value: parse_count(facet_name, value)?,
                })
            }
            XSD_PATTERN => pattern_group.patterns.push(
                PatternFacet::new(value)
                    .map_err(|e| Error::from(ParseError::new(e.to_string())))?,
            ),
            XSD_ENUMERATION => enumeration.push(value.to_string()),
            XSD_WHITE_SPACE => {
                facets.white_space = Some(
                    WhiteSpace::parse(value)
                        .map_err(|e| Error::from(ParseError::new(e.to_string())))?,
                )
            }
            XSD_MIN_INCLUSIVE | XSD_MAX_INCLUSIVE | XSD_MIN_EXCLUSIVE | XSD_MAX_EXCLUSIVE => {
                let typed = base.validate_value(value).map_err(|e| {
                    Error::from(
                        ParseError::new(format!(
                            "facet '{}' value is not valid for the base type",
                            facet_name
                        ))
                        .with_reason(e.to_string()),
                    )
                })?;
                let bound = BoundFacet::new(typed, value);
                match facet_name {
                    XSD_MIN_INCLUSIVE => facets.min_inclusive = Some(bound),
                    XSD_MAX_INCLUSIVE => facets.max_inclusive = Some(bound),
                    XSD_MIN_EXCLUSIVE => facets.min_exclusive = Some(bound),
                    _ => facets.max_exclusive = Some(bound),
                }
            }
            XSD_TOTAL_DIGITS => {
                let digits = parse_count(facet_name, value)? as u32;
                if digits == 0 {
                    return Err(ParseError::new("totalDigits must be positive").into());
                }
                facets.total_digits = Some(TotalDigitsFacet { value: digits });
            }
            XSD_FRACTION_DIGITS => {
                facets.fraction_digits = Some(FractionDigitsFacet {
                    value: parse_count(facet_name, value)? as u32,
                });
            }
            _ => {}
        }
    }

    if !pattern_group.patterns.is_empty() {
        facets.patterns.push(pattern_group);
    }
    if !enumeration.is_empty() {
        facets.enumeration = Some(EnumerationFacet::new(enumeration));
    }
    Ok(facets)
}

fn parse_count(facet_name: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| {
        ParseError::new(format!(
            "facet '{}' value '{}' is not a non-negative integer",
            facet_name, value
        ))
        .into()
    })
}
