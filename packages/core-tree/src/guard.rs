//! Limits on what a structure may contain.
//!
//! [`StructureGuard`] rejects oversized, overly deep or unsafe content before
//! the engine accepts it. All limits come from [`GuardLimits`], passed in at
//! construction.
//!
//! Depth counts `children` nesting from the outermost node. In an array root
//! the top-level nodes are at depth 0, so a node's depth is its path length
//! minus one. In an object root the root element itself is at depth 0 and its
//! children at depth 1, so a node's depth is its path length.

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::node::{ElementNode, Node};
use crate::structure::Structure;

pub const DEFAULT_MAX_NODES: usize = 10_000;
pub const DEFAULT_MAX_DEPTH: usize = 50;
pub const DEFAULT_RESERVED_ATTRIBUTE_PREFIX: &str = "data-qs-";

fn default_blocked_tags() -> Vec<String> {
    vec!["script".to_string(), "style".to_string()]
}

/// Configuration for [`StructureGuard`].
///
/// Missing fields take their defaults when deserialized, so a partial JSON
/// object such as `{"max_depth": 20}` is a valid configuration. Unknown
/// fields are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardLimits {
    pub max_nodes: usize,
    pub max_depth: usize,
    /// Tag names rejected anywhere in a structure, compared case-insensitively.
    pub blocked_tags: Vec<String>,
    /// Attribute keys starting with this prefix are reserved for the system.
    pub reserved_attribute_prefix: String,
}

impl Default for GuardLimits {
    fn default() -> Self {
        GuardLimits {
            max_nodes: DEFAULT_MAX_NODES,
            max_depth: DEFAULT_MAX_DEPTH,
            blocked_tags: default_blocked_tags(),
            reserved_attribute_prefix: DEFAULT_RESERVED_ATTRIBUTE_PREFIX.to_string(),
        }
    }
}

impl GuardLimits {
    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_blocked_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_reserved_attribute_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_attribute_prefix = prefix.into();
        self
    }
}

/// Count every node in `structure`, including an object root's own element.
pub fn count_nodes(structure: &Structure) -> usize {
    let root = usize::from(structure.root_element().is_some());
    root + count_subtrees(structure.top_level())
}

/// Count `nodes` and all of their descendants.
pub fn count_subtrees(nodes: &[Node]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&Node> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.children());
    }
    count
}

/// Depth of the deepest node, or `None` for an empty array root.
pub fn deepest(structure: &Structure) -> Option<usize> {
    match structure.root_element() {
        Some(root) => Some(deepest_below(root.children(), 1).unwrap_or(0)),
        None => deepest_below(structure.top_level(), 0),
    }
}

/// Depth of the deepest node in `nodes`' subtrees, where `nodes` sit at
/// `base` depth.
pub fn deepest_below(nodes: &[Node], base: usize) -> Option<usize> {
    let mut deepest = None;
    let mut stack: Vec<(&Node, usize)> = nodes.iter().map(|n| (n, base)).collect();
    while let Some((node, depth)) = stack.pop() {
        deepest = Some(deepest.map_or(depth, |d: usize| d.max(depth)));
        stack.extend(node.children().iter().map(|child| (child, depth + 1)));
    }
    deepest
}

/// Validates structures and substructures against [`GuardLimits`].
#[derive(Clone, Debug, Default)]
pub struct StructureGuard {
    limits: GuardLimits,
}

impl StructureGuard {
    pub fn new(limits: GuardLimits) -> Self {
        StructureGuard { limits }
    }

    pub fn limits(&self) -> &GuardLimits {
        &self.limits
    }

    pub fn validate_size(&self, structure: &Structure) -> Result<(), TreeError> {
        self.check_count(count_nodes(structure))
    }

    pub fn validate_depth(&self, structure: &Structure) -> Result<(), TreeError> {
        match deepest(structure) {
            Some(depth) => self.check_depth(depth),
            None => Ok(()),
        }
    }

    pub fn validate_tags(&self, structure: &Structure) -> Result<(), TreeError> {
        if let Some(root) = structure.root_element() {
            self.check_tag(root)?;
        }
        self.scan(structure.top_level(), |guard, element| guard.check_tag(element))
    }

    pub fn validate_reserved_attributes(&self, structure: &Structure) -> Result<(), TreeError> {
        if let Some(root) = structure.root_element() {
            self.check_attributes(root)?;
        }
        self.scan(structure.top_level(), |guard, element| {
            guard.check_attributes(element)
        })
    }

    /// Run all four validators on a whole structure.
    pub fn validate(&self, structure: &Structure) -> Result<(), TreeError> {
        self.validate_size(structure)?;
        self.validate_depth(structure)?;
        self.validate_tags(structure)?;
        self.validate_reserved_attributes(structure)
    }

    /// Run all four validators on an inbound node and its subtree.
    ///
    /// Depth is measured with `node` at depth 0; callers placing it deeper
    /// check the resulting structure with [`validate_bounds`](Self::validate_bounds).
    pub fn validate_node(&self, node: &Node) -> Result<(), TreeError> {
        let nodes = std::slice::from_ref(node);
        self.check_count(count_subtrees(nodes))?;
        if let Some(depth) = deepest_below(nodes, 0) {
            self.check_depth(depth)?;
        }
        self.scan(nodes, |guard, element| {
            guard.check_tag(element)?;
            guard.check_attributes(element)
        })
    }

    /// Size and depth checks only, for structures produced by the engine from
    /// content that was already validated.
    pub fn validate_bounds(&self, structure: &Structure) -> Result<(), TreeError> {
        self.validate_size(structure)?;
        self.validate_depth(structure)
    }

    fn check_count(&self, count: usize) -> Result<(), TreeError> {
        if count > self.limits.max_nodes {
            log::warn!(
                "rejecting structure: {} nodes exceeds {}",
                count,
                self.limits.max_nodes
            );
            return Err(TreeError::NodeCountExceeded {
                count,
                max: self.limits.max_nodes,
            });
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), TreeError> {
        if depth > self.limits.max_depth {
            log::warn!(
                "rejecting structure: depth {} exceeds {}",
                depth,
                self.limits.max_depth
            );
            return Err(TreeError::DepthExceeded {
                depth,
                max: self.limits.max_depth,
            });
        }
        Ok(())
    }

    fn check_tag(&self, element: &ElementNode) -> Result<(), TreeError> {
        let blocked = self
            .limits
            .blocked_tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(element.tag.trim()));
        if blocked {
            log::warn!("rejecting blocked tag '{}'", element.tag);
            return Err(TreeError::BlockedTag {
                tag: element.tag.clone(),
            });
        }
        Ok(())
    }

    fn check_attributes(&self, element: &ElementNode) -> Result<(), TreeError> {
        let prefix = &self.limits.reserved_attribute_prefix;
        if prefix.is_empty() {
            return Ok(());
        }
        for key in element.params.keys() {
            let reserved = key
                .get(..prefix.len())
                .map_or(false, |head| head.eq_ignore_ascii_case(prefix));
            if reserved {
                log::warn!("rejecting reserved attribute '{}'", key);
                return Err(TreeError::ReservedAttribute {
                    attribute: key.clone(),
                    prefix: prefix.clone(),
                });
            }
        }
        Ok(())
    }

    fn scan<F>(&self, nodes: &[Node], mut check: F) -> Result<(), TreeError>
    where
        F: FnMut(&Self, &ElementNode) -> Result<(), TreeError>,
    {
        let mut stack: Vec<&Node> = nodes.iter().collect();
        while let Some(node) = stack.pop() {
            if let Node::Element(element) = node {
                check(self, element)?;
                stack.extend(element.children());
            }
        }
        Ok(())
    }
}
