//! Content model matching
//!
//! The content model of a complex type is a regular expression over element
//! names and wildcards with occurrence bounds. The matcher here is a greedy
//! left-to-right particle walker with one-element lookahead, which suffices
//! for XSD 1.0 content models satisfying unique particle attribution. On
//! ambiguity the first alternative in document order wins.
//!
//! Every matched child is recorded as a (child index, matched term) pair so
//! the decoder can descend into the matched declaration.

use std::sync::Arc;

use crate::namespaces::QName;

use super::base::DerivationMethod;
use super::elements::XsdElement;
use super::globals::XsdGlobals;
use super::groups::{GroupParticle, ModelType, XsdGroup};
use super::wildcards::XsdAnyElement;

/// The term a child element was matched against
#[derive(Debug, Clone)]
pub enum MatchedTerm {
    /// An element declaration (the substituting member for substitution
    /// group matches)
    Element(Arc<XsdElement>),
    /// A wildcard particle
    Wildcard(Arc<XsdAnyElement>),
}

/// A content model violation
#[derive(Debug, Clone)]
pub struct ModelError {
    /// Human message
    pub message: String,
    /// Candidate element names at the failure point
    pub expected: Vec<QName>,
    /// Index of the offending child, when the failure is positional
    pub child_index: Option<usize>,
}

/// The outcome of matching a children sequence against a content model
#[derive(Debug)]
pub struct ContentMatch {
    /// (child index, matched term) pairs, in document order
    pub matches: Vec<(usize, MatchedTerm)>,
    /// Violations found while matching
    pub errors: Vec<ModelError>,
}

impl ContentMatch {
    /// The matched term for a child index, if any
    pub fn term_for(&self, child_index: usize) -> Option<&MatchedTerm> {
        self.matches
            .iter()
            .find(|(index, _)| *index == child_index)
            .map(|(_, term)| term)
    }
}

/// Match a children tag sequence against a model group.
pub fn match_content(group: &XsdGroup, tags: &[QName], globals: &XsdGlobals) -> ContentMatch {
    let mut matcher = Matcher {
        tags,
        globals,
        matches: Vec::new(),
    };
    let mut errors = Vec::new();

    match matcher.match_group(group, 0) {
        Ok(pos) => {
            if pos < tags.len() {
                errors.push(ModelError {
                    message: format!("unexpected child element '{}'", tags[pos]),
                    expected: first_set(group, globals),
                    child_index: Some(pos),
                });
            }
        }
        Err(e) => errors.push(e),
    }

    ContentMatch {
        matches: matcher.matches,
        errors,
    }
}

struct Matcher<'a> {
    tags: &'a [QName],
    globals: &'a XsdGlobals,
    matches: Vec<(usize, MatchedTerm)>,
}

impl<'a> Matcher<'a> {
    fn match_group(&mut self, group: &XsdGroup, start: usize) -> Result<usize, ModelError> {
        let mut pos = start;
        let mut count = 0u32;
        let mut last_error = None;

        loop {
            if group.occurs.is_over(count) {
                break;
            }
            let saved_pos = pos;
            let saved_len = self.matches.len();
            match self.match_iteration(group, pos) {
                Ok(new_pos) => {
                    if new_pos == pos && self.matches.len() == saved_len {
                        // An empty iteration: the group satisfies any number
                        // of remaining occurrences without consuming input.
                        count = count.max(group.occurs.min);
                        break;
                    }
                    pos = new_pos;
                    count += 1;
                }
                Err(e) => {
                    self.matches.truncate(saved_len);
                    pos = saved_pos;
                    last_error = Some(e);
                    break;
                }
            }
        }

        if group.occurs.is_missing(count) {
            Err(last_error.unwrap_or_else(|| ModelError {
                message: format!("content does not satisfy the '{}' group", group.model),
                expected: first_set(group, self.globals),
                child_index: Some(pos),
            }))
        } else {
            Ok(pos)
        }
    }

    fn match_iteration(&mut self, group: &XsdGroup, start: usize) -> Result<usize, ModelError> {
        match group.model {
            ModelType::Sequence => {
                let mut pos = start;
                for particle in &group.particles {
                    pos = self.match_particle(particle, pos)?;
                }
                Ok(pos)
            }
            ModelType::Choice => {
                if start < self.tags.len() {
                    let tag = self.tags[start].clone();
                    for particle in &group.particles {
                        if self.starts_with(particle, &tag) {
                            return self.match_particle(particle, start);
                        }
                    }
                }
                if group.particles.iter().any(|p| p.is_emptiable()) {
                    Ok(start)
                } else {
                    Err(ModelError {
                        message: match self.tags.get(start) {
                            Some(tag) => {
                                format!("element '{}' matches no alternative of the choice", tag)
                            }
                            None => "missing required choice content".to_string(),
                        },
                        expected: first_set(group, self.globals),
                        child_index: Some(start),
                    })
                }
            }
            ModelType::All => {
                let mut seen = vec![false; group.particles.len()];
                let mut pos = start;
                'scan: while pos < self.tags.len() {
                    let tag = self.tags[pos].clone();
                    for (i, particle) in group.particles.iter().enumerate() {
                        if !seen[i] && self.starts_with(particle, &tag) {
                            pos = self.match_particle(particle, pos)?;
                            seen[i] = true;
                            continue 'scan;
                        }
                    }
                    break;
                }
                for (i, particle) in group.particles.iter().enumerate() {
                    if !seen[i] && !particle.is_emptiable() {
                        return Err(ModelError {
                            message: "missing required element of the 'all' group".to_string(),
                            expected: particle_names(particle),
                            child_index: Some(pos),
                        });
                    }
                }
                Ok(pos)
            }
        }
    }

    fn match_particle(
        &mut self,
        particle: &GroupParticle,
        start: usize,
    ) -> Result<usize, ModelError> {
        match particle {
            GroupParticle::Element(decl) => self.match_element_particle(decl, start),
            GroupParticle::Any(wildcard) => self.match_any_particle(wildcard, start),
            GroupParticle::Group(group) => self.match_group(group, start),
        }
    }

    fn match_element_particle(
        &mut self,
        decl: &Arc<XsdElement>,
        start: usize,
    ) -> Result<usize, ModelError> {
        let mut pos = start;
        let mut count = 0u32;
        while pos < self.tags.len() && !decl.occurs.is_over(count) {
            let tag = self.tags[pos].clone();
            match self.resolve_element_match(decl, &tag) {
                Some(matched) => {
                    self.matches.push((pos, MatchedTerm::Element(matched)));
                    pos += 1;
                    count += 1;
                }
                None => break,
            }
        }
        if decl.occurs.is_missing(count) {
            Err(ModelError {
                message: format!("missing required element '{}'", decl.name.local_name),
                expected: vec![decl.name.clone()],
                child_index: Some(pos),
            })
        } else {
            Ok(pos)
        }
    }

    fn match_any_particle(
        &mut self,
        wildcard: &Arc<XsdAnyElement>,
        start: usize,
    ) -> Result<usize, ModelError> {
        let mut pos = start;
        let mut count = 0u32;
        while pos < self.tags.len()
            && !wildcard.occurs.is_over(count)
            && wildcard.is_matching(&self.tags[pos])
        {
            self.matches.push((pos, MatchedTerm::Wildcard(wildcard.clone())));
            pos += 1;
            count += 1;
        }
        if wildcard.occurs.is_missing(count) {
            Err(ModelError {
                message: "missing content required by a wildcard particle".to_string(),
                expected: Vec::new(),
                child_index: Some(pos),
            })
        } else {
            Ok(pos)
        }
    }

    /// Resolve an element particle against an instance tag: the declaration
    /// itself, a referenced global, or a substitution group member.
    fn resolve_element_match(
        &self,
        decl: &Arc<XsdElement>,
        tag: &QName,
    ) -> Option<Arc<XsdElement>> {
        let target: Arc<XsdElement> = match &decl.ref_element {
            Some(name) => self.globals.lookup_element(name)?.clone(),
            None => decl.clone(),
        };

        if target.matches_name(tag) {
            if target.abstract_element {
                return None;
            }
            return Some(target);
        }

        if self.globals.is_substitute(tag, &target.name) {
            if target.block.contains(DerivationMethod::Substitution) {
                return None;
            }
            let member = self.globals.lookup_element(tag)?.clone();
            if member.abstract_element {
                return None;
            }
            return Some(member);
        }

        None
    }

    fn starts_with(&self, particle: &GroupParticle, tag: &QName) -> bool {
        match particle {
            GroupParticle::Element(decl) => self.resolve_element_match(decl, tag).is_some(),
            GroupParticle::Any(wildcard) => wildcard.is_matching(tag),
            GroupParticle::Group(group) => match group.model {
                ModelType::Sequence => {
                    for p in &group.particles {
                        if self.starts_with(p, tag) {
                            return true;
                        }
                        if !p.is_emptiable() {
                            break;
                        }
                    }
                    false
                }
                ModelType::Choice | ModelType::All => {
                    group.particles.iter().any(|p| self.starts_with(p, tag))
                }
            },
        }
    }
}

fn particle_names(particle: &GroupParticle) -> Vec<QName> {
    match particle {
        GroupParticle::Element(e) => vec![e.name.clone()],
        GroupParticle::Any(_) => Vec::new(),
        GroupParticle::Group(g) => g
            .particles
            .iter()
            .flat_map(particle_names)
            .collect(),
    }
}

fn first_set(group: &XsdGroup, globals: &XsdGlobals) -> Vec<QName> {
    let mut names = Vec::new();
    for particle in &group.particles {
        match particle {
            GroupParticle::Element(e) => {
                names.push(e.name.clone());
                for member in globals.substitution_members(&e.name) {
                    names.push(member.name.clone());
                }
            }
            GroupParticle::Group(g) => names.extend(first_set(g, globals)),
            GroupParticle::Any(_) => {}
        }
        if group.model == ModelType::Sequence && !particle.is_emptiable() {
            break;
        }
    }
    names
}
