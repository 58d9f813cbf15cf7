//! XPath subset
//!
//! A restricted path grammar evaluated over both XSD declaration trees and
//! XML instance trees: absolute steps (`/a/b`), descendant steps (`//a`),
//! wildcards (`*`), a terminal attribute axis (`@x`), position predicates
//! (`[n]`) and namespace-prefixed names.
//!
//! A single engine serves both tree kinds through the [`PathNode`] adapter.

use crate::documents::Element;
use crate::error::{Error, Result};
use crate::namespaces::{NamespaceContext, QName};

/// Node test of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*` - any element
    Any,
    /// A resolved qualified name
    Name(QName),
}

impl NodeTest {
    fn matches(&self, name: &QName) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Name(test) => test == name,
        }
    }
}

/// Axis of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Direct children (`/name`)
    Child,
    /// Any descendant (`//name`)
    Descendant,
}

/// One location step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// The axis this step walks
    pub axis: Axis,
    /// The node test applied to candidates
    pub test: NodeTest,
    /// Optional 1-based position predicate
    pub position: Option<usize>,
}

/// A compiled path expression
#[derive(Debug, Clone)]
pub struct Selector {
    /// Element steps, applied in order from the context node
    pub steps: Vec<Step>,
    /// Terminal attribute axis (`@x`), if present
    pub attribute: Option<String>,
}

/// Adapter over a tree the path engine can walk
pub trait PathNode: Sized + Clone {
    /// The node's qualified name
    fn node_name(&self) -> QName;

    /// The node's element children, in document order
    fn child_nodes(&self) -> Vec<Self>;

    /// Attribute access, only meaningful for XML element trees
    fn attribute_value(&self, _name: &str) -> Option<String> {
        None
    }
}

impl<'a> PathNode for &'a Element {
    fn node_name(&self) -> QName {
        self.tag.clone()
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children.iter().collect()
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.get_attribute(name).map(|v| v.to_string())
    }
}

/// Raw tokenization: (is_descendant, raw step text) pairs.
fn tokenize(path: &str) -> Result<Vec<(bool, String)>> {
    let path = path.trim();
    if path.is_empty() {
        return Err(Error::Type("empty path expression".into()));
    }

    let mut tokens = Vec::new();
    let mut rest = path;
    let mut descendant = false;

    if let Some(r) = rest.strip_prefix("//") {
        descendant = true;
        rest = r;
    } else if let Some(r) = rest.strip_prefix('/') {
        rest = r;
    }

    while !rest.is_empty() {
        let (chunk, next, next_descendant) = match rest.find('/') {
            Some(pos) => {
                let chunk = &rest[..pos];
                let after = &rest[pos..];
                if let Some(r) = after.strip_prefix("//") {
                    (chunk, r, true)
                } else {
                    (chunk, &after[1..], false)
                }
            }
            None => (rest, "", false),
        };
        if chunk.is_empty() {
            return Err(Error::Type(format!("malformed path expression: '{}'", path)));
        }
        tokens.push((descendant, chunk.to_string()));
        descendant = next_descendant;
        rest = next;
    }

    Ok(tokens)
}

/// Parse a path expression, resolving prefixed names against `ctx`
pub fn parse(path: &str, ctx: &NamespaceContext) -> Result<Selector> {
    let tokens = tokenize(path)?;
    let mut steps = Vec::new();
    let mut attribute = None;

    for (i, (descendant, raw)) in tokens.iter().enumerate() {
        if raw == "." {
            continue;
        }

        if let Some(name) = raw.strip_prefix('@') {
            if i != tokens.len() - 1 {
                return Err(Error::Type(format!(
                    "attribute step '@{}' must be the last step",
                    name
                )));
            }
            attribute = Some(name.to_string());
            continue;
        }

        let (name_part, position) = split_predicate(raw)?;
        let test = if name_part == "*" {
            NodeTest::Any
        } else if name_part.starts_with('{') {
            NodeTest::Name(QName::from_extended(&name_part)?)
        } else {
            NodeTest::Name(ctx.resolve(&name_part)?)
        };

        steps.push(Step {
            axis: if *descendant { Axis::Descendant } else { Axis::Child },
            test,
            position,
        });
    }

    Ok(Selector { steps, attribute })
}

fn split_predicate(raw: &str) -> Result<(String, Option<usize>)> {
    match raw.find('[') {
        None => Ok((raw.to_string(), None)),
        Some(pos) => {
            let name = &raw[..pos];
            let pred = &raw[pos..];
            let inner = pred
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .ok_or_else(|| Error::Type(format!("malformed predicate in step '{}'", raw)))?;
            let n: usize = inner.trim().parse().map_err(|_| {
                Error::Type(format!("only position predicates are supported: '{}'", raw))
            })?;
            if n == 0 {
                return Err(Error::Type("position predicates are 1-based".into()));
            }
            Ok((name.to_string(), Some(n)))
        }
    }
}

fn descendants<N: PathNode>(node: &N, out: &mut Vec<N>) {
    for child in node.child_nodes() {
        out.push(child.clone());
        descendants(&child, out);
    }
}

/// Select the element nodes matched by a selector from a context node.
///
/// The context node itself is never part of the result: steps select among
/// its children (or descendants), matching the usual find semantics.
pub fn select<N: PathNode>(selector: &Selector, context: N) -> Vec<N> {
    let mut current = vec![context];

    for step in &selector.steps {
        let mut next = Vec::new();
        for node in &current {
            let candidates: Vec<N> = match step.axis {
                Axis::Child => node.child_nodes(),
                Axis::Descendant => {
                    let mut all = Vec::new();
                    descendants(node, &mut all);
                    all
                }
            };
            let mut matched: Vec<N> = candidates
                .into_iter()
                .filter(|c| step.test.matches(&c.node_name()))
                .collect();
            if let Some(position) = step.position {
                matched = if position <= matched.len() {
                    vec![matched.swap_remove(position - 1)]
                } else {
                    Vec::new()
                };
            }
            next.extend(matched);
        }
        current = next;
    }

    current
}

/// Select attribute values from an XML tree for a path ending in `@attr`
pub fn select_attributes<N: PathNode>(selector: &Selector, context: N) -> Vec<(N, String)> {
    let attr = match &selector.attribute {
        Some(name) => name.clone(),
        None => return Vec::new(),
    };
    select(selector, context)
        .into_iter()
        .filter_map(|node| {
            let value = node.attribute_value(&attr)?;
            Some((node, value))
        })
        .collect()
}

/// Drop the first `strip_depth` steps of a path, keeping the remaining
/// steps' text (prefixes and predicates included) intact.
///
/// Used by the decoder to turn a schema-anchored path into an instance
/// subtree path.
pub fn relative_path(path: &str, strip_depth: usize) -> Result<String> {
    let tokens = tokenize(path)?;
    let kept: Vec<&(bool, String)> = tokens.iter().skip(strip_depth).collect();
    if kept.is_empty() {
        return Ok(".".to_string());
    }

    let mut out = String::new();
    for (i, (descendant, raw)) in kept.iter().enumerate() {
        if i > 0 {
            out.push('/');
        }
        if *descendant {
            if i == 0 {
                out.push_str("//");
            } else {
                out.push('/');
            }
        }
        out.push_str(raw);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;

    fn ctx() -> NamespaceContext {
        let mut ctx = NamespaceContext::new();
        ctx.add_prefix("x", "urn:x");
        ctx
    }

    #[test]
    fn test_parse_absolute_path() {
        let sel = parse("/a/b", &ctx()).unwrap();
        assert_eq!(sel.steps.len(), 2);
        assert_eq!(sel.steps[0].axis, Axis::Child);
        assert_eq!(sel.steps[1].test, NodeTest::Name(QName::local("b")));
    }

    #[test]
    fn test_parse_descendant_and_wildcard() {
        let sel = parse("//a/*", &ctx()).unwrap();
        assert_eq!(sel.steps[0].axis, Axis::Descendant);
        assert_eq!(sel.steps[1].test, NodeTest::Any);
    }

    #[test]
    fn test_parse_prefixed_and_extended_names() {
        let sel = parse("/x:a", &ctx()).unwrap();
        assert_eq!(
            sel.steps[0].test,
            NodeTest::Name(QName::namespaced("urn:x", "a"))
        );

        let sel = parse("/{urn:y}b", &ctx()).unwrap();
        assert_eq!(
            sel.steps[0].test,
            NodeTest::Name(QName::namespaced("urn:y", "b"))
        );
    }

    #[test]
    fn test_parse_predicate_and_attribute() {
        let sel = parse("/a[2]/@id", &ctx()).unwrap();
        assert_eq!(sel.steps[0].position, Some(2));
        assert_eq!(sel.attribute.as_deref(), Some("id"));

        assert!(parse("/@id/a", &ctx()).is_err());
        assert!(parse("/a[last()]", &ctx()).is_err());
        assert!(parse("", &ctx()).is_err());
    }

    #[test]
    fn test_select_over_xml_tree() {
        let doc = Document::from_str(
            "<root><a><b>1</b><b>2</b></a><a><b>3</b></a><c/></root>",
        )
        .unwrap();

        let sel = parse("/a/b", &NamespaceContext::new()).unwrap();
        let matched = select(&sel, &doc.root);
        let texts: Vec<&str> = matched.iter().map(|e| e.text_content()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_select_descendants() {
        let doc = Document::from_str("<root><a><b/><c><b/></c></a></root>").unwrap();
        let sel = parse("//b", &NamespaceContext::new()).unwrap();
        assert_eq!(select(&sel, &doc.root).len(), 2);
    }

    #[test]
    fn test_position_predicate_is_per_parent() {
        let doc = Document::from_str(
            "<root><a><b>1</b><b>2</b></a><a><b>3</b></a></root>",
        )
        .unwrap();
        let sel = parse("/a/b[1]", &NamespaceContext::new()).unwrap();
        let texts: Vec<&str> = select(&sel, &doc.root)
            .iter()
            .map(|e| e.text_content())
            .collect();
        assert_eq!(texts, vec!["1", "3"]);
    }

    #[test]
    fn test_select_attributes() {
        let doc = Document::from_str("<root><a id=\"x\"/><a/></root>").unwrap();
        let sel = parse("/a/@id", &NamespaceContext::new()).unwrap();
        let matched = select_attributes(&sel, &doc.root);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].1, "x");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path("/a/b/c", 1).unwrap(), "b/c");
        assert_eq!(relative_path("a", 1).unwrap(), ".");
        assert_eq!(relative_path("/x:a/x:b", 1).unwrap(), "x:b");
    }
}
