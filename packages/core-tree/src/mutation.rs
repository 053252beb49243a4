//! Insert, update, delete and duplicate.
//!
//! Every operation borrows the input structure, works on its own copy and
//! returns the copy on success. On error the caller still holds the untouched
//! original, so no partial mutation is ever observable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::guard::StructureGuard;
use crate::node::Node;
use crate::path::NodePath;
use crate::resolver;
use crate::structure::Structure;

/// Where a node lands relative to the target node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    #[default]
    After,
    Inside,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Before => f.write_str("before"),
            Position::After => f.write_str("after"),
            Position::Inside => f.write_str("inside"),
        }
    }
}

/// Error for an unrecognised position name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid position '{0}': expected before, after or inside")]
pub struct ParsePositionError(pub String);

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Position::Before),
            "after" => Ok(Position::After),
            "inside" => Ok(Position::Inside),
            other => Err(ParsePositionError(other.to_string())),
        }
    }
}

/// Result of [`MutationEngine::insert`] and [`MutationEngine::duplicate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Insertion {
    pub structure: Structure,
    /// Path of the inserted node in `structure`.
    pub path: NodePath,
    /// Index of the inserted node within its container.
    pub inserted_at: usize,
}

/// Result of [`MutationEngine::update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replacement {
    pub structure: Structure,
    pub path: NodePath,
    pub previous: Node,
}

/// Result of [`MutationEngine::delete`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
    pub structure: Structure,
    pub path: NodePath,
    pub removed: Node,
}

/// Applies guarded, path-addressed mutations to structures.
#[derive(Clone, Debug, Default)]
pub struct MutationEngine {
    pub(crate) guard: StructureGuard,
}

impl MutationEngine {
    pub fn new(guard: StructureGuard) -> Self {
        MutationEngine { guard }
    }

    pub fn guard(&self) -> &StructureGuard {
        &self.guard
    }

    /// Insert `node` relative to the node at `target`.
    ///
    /// `before` and `after` splice into the target's container at its index or
    /// the index after it. `inside` prepends to the target's children, so the
    /// new node's path is always `target.0`.
    ///
    /// # Errors
    ///
    /// - [`TreeError::TargetNotFound`] if `target` does not resolve
    /// - [`TreeError::AtomicNodeViolation`] / [`TreeError::TextNodeViolation`]
    ///   for `inside` on a component or text node
    /// - any guard rejection of `node` or of the resulting structure
    pub fn insert(
        &self,
        structure: &Structure,
        target: &NodePath,
        node: Node,
        position: Position,
    ) -> Result<Insertion, TreeError> {
        self.guard.validate_node(&node)?;

        let mut result = structure.clone();
        let (path, inserted_at) = match position {
            Position::Before | Position::After => {
                let container = resolver::resolve_parent_container_mut(&mut result, target)
                    .ok_or_else(|| TreeError::TargetNotFound {
                        path: target.clone(),
                    })?;
                let index = if position == Position::Before {
                    container.index
                } else {
                    container.index + 1
                };
                container.nodes.insert(index, node);
                (target.sibling(index), index)
            }
            Position::Inside => {
                let children = container_children(&mut result, target, TargetRole::Target)?;
                children.insert(0, node);
                (target.child(0), 0)
            }
        };

        self.guard.validate_bounds(&result)?;
        Ok(Insertion {
            structure: result,
            path,
            inserted_at,
        })
    }

    /// Prepend `node` to the top-level sibling list.
    ///
    /// This is what the `"root"` target means for an object root: the node
    /// becomes the root's first child, at path `0`. A missing `children` array
    /// is created.
    pub fn prepend_top_level(
        &self,
        structure: &Structure,
        node: Node,
    ) -> Result<Insertion, TreeError> {
        self.guard.validate_node(&node)?;

        let mut result = structure.clone();
        result.top_level_mut_or_init().insert(0, node);

        self.guard.validate_bounds(&result)?;
        Ok(Insertion {
            structure: result,
            path: NodePath::top(0),
            inserted_at: 0,
        })
    }

    /// Replace the node at `target` with `node`.
    pub fn update(
        &self,
        structure: &Structure,
        target: &NodePath,
        node: Node,
    ) -> Result<Replacement, TreeError> {
        self.guard.validate_node(&node)?;

        let mut result = structure.clone();
        let container = resolver::resolve_parent_container_mut(&mut result, target).ok_or_else(
            || TreeError::TargetNotFound {
                path: target.clone(),
            },
        )?;
        let previous = std::mem::replace(&mut container.nodes[container.index], node);

        self.guard.validate_bounds(&result)?;
        Ok(Replacement {
            structure: result,
            path: target.clone(),
            previous,
        })
    }

    /// Remove the node at `target`, returning it with the new structure.
    ///
    /// Deletion introduces no content, so the guard is not consulted.
    pub fn delete(&self, structure: &Structure, target: &NodePath) -> Result<Removal, TreeError> {
        let mut result = structure.clone();
        let removed = remove(&mut result, target).ok_or_else(|| TreeError::TargetNotFound {
            path: target.clone(),
        })?;
        Ok(Removal {
            structure: result,
            path: target.clone(),
            removed,
        })
    }

    /// Insert a deep copy of the node at `target` directly after it.
    pub fn duplicate(
        &self,
        structure: &Structure,
        target: &NodePath,
    ) -> Result<Insertion, TreeError> {
        let copy = resolver::resolve(structure, target)
            .cloned()
            .ok_or_else(|| TreeError::TargetNotFound {
                path: target.clone(),
            })?;
        self.insert(structure, target, copy, Position::After)
    }
}

/// Which operand a path names, for choosing the "not found" error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TargetRole {
    Source,
    Target,
}

impl TargetRole {
    pub(crate) fn not_found(self, path: &NodePath) -> TreeError {
        match self {
            TargetRole::Source => TreeError::SourceNotFound { path: path.clone() },
            TargetRole::Target => TreeError::TargetNotFound { path: path.clone() },
        }
    }
}

/// Check that the node at `path` can hold children.
pub(crate) fn check_container(node: &Node, path: &NodePath) -> Result<(), TreeError> {
    match node {
        Node::Element(_) => Ok(()),
        Node::Component(component) => Err(TreeError::AtomicNodeViolation {
            path: path.clone(),
            component: component.component.clone(),
        }),
        Node::Text(_) => Err(TreeError::TextNodeViolation { path: path.clone() }),
    }
}

/// The children array of the element at `path`, created if absent.
pub(crate) fn container_children<'a>(
    structure: &'a mut Structure,
    path: &NodePath,
    role: TargetRole,
) -> Result<&'a mut Vec<Node>, TreeError> {
    let node = resolver::resolve_mut(structure, path).ok_or_else(|| role.not_found(path))?;
    check_container(node, path)?;
    match node {
        Node::Element(element) => Ok(element.children_mut()),
        // check_container has already rejected the other kinds
        Node::Component(_) | Node::Text(_) => Err(role.not_found(path)),
    }
}

/// Splice the node at `path` out of `structure`.
pub(crate) fn remove(structure: &mut Structure, path: &NodePath) -> Option<Node> {
    let container = resolver::resolve_parent_container_mut(structure, path)?;
    Some(container.nodes.remove(container.index))
}
