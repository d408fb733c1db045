//! Element locators.
//!
//! A [`Locator`] is a short textual path that re-finds an element in a later
//! copy of the same page. Elements with a usable id get the id form
//! `//*[@id="..."]`; everything else gets an absolute path of tag steps where
//! a `[n]` position is only written when the tag repeats among siblings.

use std::fmt;
use std::str::FromStr;

use crate::dom::{Document, NodeId};
use crate::error::LocatorError;

const ID_PREFIX: &str = "//*[@id=\"";
const ID_SUFFIX: &str = "\"]";

/// One `/tag[n]` step of a path locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub tag: String,
    /// 1-based rank among same-tag siblings; `None` when the tag is unique.
    pub position: Option<usize>,
}

impl PathStep {
    fn position_or_first(&self) -> usize {
        self.position.unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Path(Vec<PathStep>),
    /// Element is not attached to the document; renders as an empty string.
    Detached,
}

impl Locator {
    pub fn is_detached(&self) -> bool {
        matches!(self, Locator::Detached)
    }

    /// Locator in the `xpath=` target form used by verification commands.
    pub fn as_target(&self) -> String {
        format!("xpath={self}")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "{ID_PREFIX}{id}{ID_SUFFIX}"),
            Locator::Path(steps) => {
                for step in steps {
                    write!(f, "/{}", step.tag)?;
                    if let Some(position) = step.position {
                        write!(f, "[{position}]")?;
                    }
                }
                Ok(())
            }
            Locator::Detached => Ok(()),
        }
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("xpath=").unwrap_or(s);
        if s.is_empty() {
            return Ok(Locator::Detached);
        }
        if let Some(rest) = s.strip_prefix(ID_PREFIX) {
            return match rest.strip_suffix(ID_SUFFIX) {
                Some(id) if !id.is_empty() => Ok(Locator::Id(id.to_string())),
                _ => Err(LocatorError::Malformed(s.to_string())),
            };
        }
        let Some(body) = s.strip_prefix('/') else {
            return Err(LocatorError::Malformed(s.to_string()));
        };
        body.split('/')
            .map(|raw| parse_step(raw, s))
            .collect::<Result<Vec<_>, _>>()
            .map(Locator::Path)
    }
}

fn parse_step(raw: &str, whole: &str) -> Result<PathStep, LocatorError> {
    let malformed = || LocatorError::Malformed(whole.to_string());
    let (tag, position) = match raw.split_once('[') {
        Some((tag, rest)) => {
            let digits = rest.strip_suffix(']').ok_or_else(malformed)?;
            let position: usize = digits.parse().map_err(|_| malformed())?;
            if position == 0 {
                return Err(malformed());
            }
            (tag, Some(position))
        }
        None => (raw, None),
    };
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(malformed());
    }
    Ok(PathStep {
        tag: tag.to_ascii_lowercase(),
        position,
    })
}

/// Compute the locator of `node`.
///
/// The id form is used only when the id is non-empty and unique in the
/// document, so resolving it always returns the same element.
pub fn locate(doc: &Document, node: NodeId) -> Locator {
    if doc.has_unique_id(node) {
        if let Some(id) = doc.id(node) {
            return Locator::Id(id.to_string());
        }
    }
    if !doc.is_element(node) {
        return Locator::Detached;
    }

    let mut steps = Vec::new();
    let mut current = node;
    loop {
        let Some(tag) = doc.tag_name(current) else {
            return Locator::Detached;
        };
        if doc.document_element() == Some(current) {
            steps.push(PathStep {
                tag: tag.to_string(),
                position: None,
            });
            break;
        }
        let Some(parent) = doc.parent(current) else {
            return Locator::Detached;
        };

        let (rank, has_following) = sibling_rank(doc, parent, current, tag);
        steps.push(PathStep {
            tag: tag.to_string(),
            position: (rank > 1 || has_following).then_some(rank),
        });

        if parent == doc.root() {
            break;
        }
        current = parent;
    }
    steps.reverse();
    Locator::Path(steps)
}

/// 1-based rank of `node` among same-tag element siblings, and whether a
/// same-tag sibling follows it.
fn sibling_rank(doc: &Document, parent: NodeId, node: NodeId, tag: &str) -> (usize, bool) {
    let mut rank = 1;
    let mut seen_self = false;
    for sibling in doc.element_children(parent) {
        if sibling == node {
            seen_self = true;
            continue;
        }
        if doc.tag_name(sibling) != Some(tag) {
            continue;
        }
        if seen_self {
            return (rank, true);
        }
        rank += 1;
    }
    (rank, false)
}

/// Find the element a locator points to in `doc`.
pub fn resolve(doc: &Document, locator: &Locator) -> Result<NodeId, LocatorError> {
    let not_found = || LocatorError::NotFound(locator.to_string());
    match locator {
        Locator::Id(id) => doc.get_element_by_id(id).ok_or_else(not_found),
        Locator::Path(steps) => {
            let mut current = doc.root();
            for step in steps {
                current = doc
                    .element_children(current)
                    .filter(|&c| doc.tag_name(c) == Some(step.tag.as_str()))
                    .nth(step.position_or_first() - 1)
                    .ok_or_else(not_found)?;
            }
            if current == doc.root() {
                return Err(not_found());
            }
            Ok(current)
        }
        Locator::Detached => Err(not_found()),
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
