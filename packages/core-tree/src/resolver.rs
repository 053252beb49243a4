//! Path resolution against a structure.
//!
//! Resolution never mutates and never fails loudly: a path that walks off the
//! tree resolves to `None`, and callers decide which "not found" error that is.

use crate::node::Node;
use crate::path::NodePath;
use crate::structure::Structure;

/// The array that directly holds a node, and the node's index in it.
#[derive(Debug)]
pub struct Container<'a> {
    pub nodes: &'a [Node],
    pub index: usize,
}

/// Mutable form of [`Container`], used to splice.
#[derive(Debug)]
pub struct ContainerMut<'a> {
    pub nodes: &'a mut Vec<Node>,
    pub index: usize,
}

/// Find the node at `path`.
pub fn resolve<'a>(structure: &'a Structure, path: &NodePath) -> Option<&'a Node> {
    let (first, rest) = path.segments().split_first()?;
    let mut node = structure.top_level().get(*first)?;
    for &index in rest {
        node = node.children().get(index)?;
    }
    Some(node)
}

/// Find the node at `path` for in-place modification.
pub fn resolve_mut<'a>(structure: &'a mut Structure, path: &NodePath) -> Option<&'a mut Node> {
    let (first, rest) = path.segments().split_first()?;
    let mut node = structure.top_level_mut()?.get_mut(*first)?;
    for &index in rest {
        node = node.as_element_mut()?.children.as_mut()?.get_mut(index)?;
    }
    Some(node)
}

/// Find the array holding the node at `path`.
///
/// For a top-level path this is the array root itself or the object root's
/// `children`; otherwise it is the `children` of the node at `path.parent()`.
/// Returns `None` unless the node at `path` exists.
pub fn resolve_parent_container<'a>(
    structure: &'a Structure,
    path: &NodePath,
) -> Option<Container<'a>> {
    let nodes = match path.parent() {
        None => structure.top_level(),
        Some(parent) => resolve(structure, &parent)?.children(),
    };
    let index = path.last();
    if index >= nodes.len() {
        return None;
    }
    Some(Container { nodes, index })
}

/// Mutable form of [`resolve_parent_container`].
pub fn resolve_parent_container_mut<'a>(
    structure: &'a mut Structure,
    path: &NodePath,
) -> Option<ContainerMut<'a>> {
    let nodes = match path.parent() {
        None => structure.top_level_mut()?,
        Some(parent) => resolve_mut(structure, &parent)?
            .as_element_mut()?
            .children
            .as_mut()?,
    };
    let index = path.last();
    if index >= nodes.len() {
        return None;
    }
    Some(ContainerMut { nodes, index })
}

/// Whether every segment of `path` resolves in `structure`.
pub fn exists(structure: &Structure, path: &NodePath) -> bool {
    resolve(structure, path).is_some()
}
