//! Read-only projections that attach computed paths to nodes.
//!
//! Paths are never stored in a structure; these views compute them on demand
//! using the same root-shape rule as the resolver.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::node::{ElementNode, Node};
use crate::path::{NodePath, ROOT_TOKEN};
use crate::structure::{RootShape, Structure};

pub const DEFAULT_SUMMARY_DEPTH: usize = 10;

/// A node with its computed id, serialized as the node's own JSON plus a
/// `_nodeId` key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotatedNode {
    #[serde(rename = "_nodeId")]
    pub node_id: String,
    #[serde(flatten)]
    pub content: AnnotatedContent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnnotatedContent {
    Element {
        tag: String,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        children: Option<Vec<AnnotatedNode>>,
    },
    Component {
        component: String,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        data: BTreeMap<String, String>,
    },
    Text {
        #[serde(rename = "textKey")]
        text_key: String,
    },
}

/// A structure with every node annotated. An object root's own element gets
/// the id `"root"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnnotatedStructure {
    ArrayRoot(Vec<AnnotatedNode>),
    ObjectRoot(AnnotatedNode),
}

pub fn annotate(structure: &Structure) -> AnnotatedStructure {
    match structure {
        Structure::ArrayRoot(nodes) => {
            AnnotatedStructure::ArrayRoot(annotate_siblings(nodes, None))
        }
        Structure::ObjectRoot(root) => AnnotatedStructure::ObjectRoot(AnnotatedNode {
            node_id: ROOT_TOKEN.to_string(),
            content: annotate_element(root, None),
        }),
    }
}

fn annotate_siblings(nodes: &[Node], parent: Option<&NodePath>) -> Vec<AnnotatedNode> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let path = NodePath::in_container(parent, index);
            let content = match node {
                Node::Element(element) => annotate_element(element, Some(&path)),
                Node::Component(component) => AnnotatedContent::Component {
                    component: component.component.clone(),
                    data: component.data.clone(),
                },
                Node::Text(text) => AnnotatedContent::Text {
                    text_key: text.text_key.clone(),
                },
            };
            AnnotatedNode {
                node_id: path.to_string(),
                content,
            }
        })
        .collect()
}

fn annotate_element(element: &ElementNode, path: Option<&NodePath>) -> AnnotatedContent {
    AnnotatedContent::Element {
        tag: element.tag.clone(),
        params: element.params.clone(),
        children: element
            .children
            .as_ref()
            .map(|children| annotate_siblings(children, path)),
    }
}

/// What a summary entry stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Element,
    Component,
    Text,
}

/// One node of a [`Summary`]: its path and name, without params or text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryNode {
    pub path: NodePath,
    pub kind: NodeKind,
    /// Tag name or component name; absent for text nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SummaryNode>,
    /// Set when this node has children that were left out for depth.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// A shallow overview of a structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub shape: RootShape,
    /// Tag of an object root's own element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    pub total_nodes: usize,
    pub nodes: Vec<SummaryNode>,
}

/// Summarize `structure`, descending at most `max_depth` levels below the
/// top-level nodes.
pub fn summarize(structure: &Structure, max_depth: usize) -> Summary {
    Summary {
        shape: structure.shape(),
        root: structure.root_element().map(|root| root.tag.clone()),
        total_nodes: crate::guard::count_nodes(structure),
        nodes: summarize_siblings(structure.top_level(), None, 0, max_depth),
    }
}

fn summarize_siblings(
    nodes: &[Node],
    parent: Option<&NodePath>,
    depth: usize,
    max_depth: usize,
) -> Vec<SummaryNode> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let path = NodePath::in_container(parent, index);
            let kind = match node {
                Node::Element(_) => NodeKind::Element,
                Node::Component(_) => NodeKind::Component,
                Node::Text(_) => NodeKind::Text,
            };
            let (children, truncated) = if node.children().is_empty() {
                (Vec::new(), false)
            } else if depth >= max_depth {
                (Vec::new(), true)
            } else {
                (
                    summarize_siblings(node.children(), Some(&path), depth + 1, max_depth),
                    false,
                )
            };
            SummaryNode {
                name: node.label().map(str::to_string),
                path,
                kind,
                children,
                truncated,
            }
        })
        .collect()
}

/// Every valid path in `structure`, in pre-order.
pub fn node_paths(structure: &Structure) -> Vec<NodePath> {
    let mut paths = Vec::new();
    let mut stack: Vec<(NodePath, &Node)> = structure
        .top_level()
        .iter()
        .enumerate()
        .rev()
        .map(|(index, node)| (NodePath::top(index), node))
        .collect();
    while let Some((path, node)) = stack.pop() {
        for (index, child) in node.children().iter().enumerate().rev() {
            stack.push((path.child(index), child));
        }
        paths.push(path);
    }
    paths
}
