//! Structures and their identities.
//!
//! A [`Structure`] is the whole tree stored for one page, menu, footer or
//! component. Its root takes one of two shapes, fixed when it is decoded:
//!
//! - array root: `[node, node, ...]` (pages, menu, footer)
//! - object root: a single element owning `children` (components)
//!
//! Both shapes expose the same top-level sibling list, which is what segment
//! 0 of every [`NodePath`](crate::NodePath) indexes.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::node::{ElementNode, Node};

/// The two legal root shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootShape {
    Array,
    Object,
}

impl fmt::Display for RootShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootShape::Array => f.write_str("array"),
            RootShape::Object => f.write_str("object"),
        }
    }
}

/// A whole structure tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Structure {
    ArrayRoot(Vec<Node>),
    ObjectRoot(ElementNode),
}

impl Default for Structure {
    fn default() -> Self {
        Structure::ArrayRoot(Vec::new())
    }
}

impl Structure {
    pub fn shape(&self) -> RootShape {
        match self {
            Structure::ArrayRoot(_) => RootShape::Array,
            Structure::ObjectRoot(_) => RootShape::Object,
        }
    }

    /// The sibling list addressed by the first path segment.
    pub fn top_level(&self) -> &[Node] {
        match self {
            Structure::ArrayRoot(nodes) => nodes,
            Structure::ObjectRoot(root) => root.children(),
        }
    }

    /// Mutable access to the top-level sibling list, if it exists.
    ///
    /// An object root without a `children` key has no list to mutate, and this
    /// does not create one.
    pub fn top_level_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Structure::ArrayRoot(nodes) => Some(nodes),
            Structure::ObjectRoot(root) => root.children.as_mut(),
        }
    }

    /// Mutable access to the top-level sibling list, creating an object root's
    /// `children` array when it is absent.
    pub fn top_level_mut_or_init(&mut self) -> &mut Vec<Node> {
        match self {
            Structure::ArrayRoot(nodes) => nodes,
            Structure::ObjectRoot(root) => root.children_mut(),
        }
    }

    /// The root element of an object root.
    pub fn root_element(&self) -> Option<&ElementNode> {
        match self {
            Structure::ArrayRoot(_) => None,
            Structure::ObjectRoot(root) => Some(root),
        }
    }
}

impl From<Vec<Node>> for Structure {
    fn from(nodes: Vec<Node>) -> Self {
        Structure::ArrayRoot(nodes)
    }
}

impl From<ElementNode> for Structure {
    fn from(root: ElementNode) -> Self {
        Structure::ObjectRoot(root)
    }
}

/// Longest accepted page or component name, in bytes.
pub const MAX_NAME_LEN: usize = 100;

/// The kinds of stored structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    Page,
    Menu,
    Footer,
    Component,
}

impl StructureKind {
    /// The root shape structures of this kind are normally stored with.
    pub fn expected_shape(self) -> RootShape {
        match self {
            StructureKind::Component => RootShape::Object,
            StructureKind::Page | StructureKind::Menu | StructureKind::Footer => RootShape::Array,
        }
    }

    /// Whether structures of this kind carry a name.
    pub fn is_named(self) -> bool {
        matches!(self, StructureKind::Page | StructureKind::Component)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StructureKind::Page => "page",
            StructureKind::Menu => "menu",
            StructureKind::Footer => "footer",
            StructureKind::Component => "component",
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StructureKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page" => Ok(StructureKind::Page),
            "menu" => Ok(StructureKind::Menu),
            "footer" => Ok(StructureKind::Footer),
            "component" => Ok(StructureKind::Component),
            other => Err(StoreError::InvalidId {
                id: other.to_string(),
                message: "expected one of page, menu, footer, component".to_string(),
            }),
        }
    }
}

/// Identifies one stored structure.
///
/// The textual form is `page:<name>`, `menu`, `footer` or `component:<name>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructureId {
    Page(String),
    Menu,
    Footer,
    Component(String),
}

impl StructureId {
    /// Build a page id, validating the name.
    pub fn page(name: &str) -> Result<Self, StoreError> {
        validate_name(name)?;
        Ok(StructureId::Page(name.to_string()))
    }

    /// Build a component id, validating the name.
    pub fn component(name: &str) -> Result<Self, StoreError> {
        validate_name(name)?;
        Ok(StructureId::Component(name.to_string()))
    }

    pub fn kind(&self) -> StructureKind {
        match self {
            StructureId::Page(_) => StructureKind::Page,
            StructureId::Menu => StructureKind::Menu,
            StructureId::Footer => StructureKind::Footer,
            StructureId::Component(_) => StructureKind::Component,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            StructureId::Page(name) | StructureId::Component(name) => Some(name),
            StructureId::Menu | StructureId::Footer => None,
        }
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    lazy_static! {
        static ref NAME_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap();
    }

    if name.len() > MAX_NAME_LEN {
        return Err(StoreError::InvalidId {
            id: name.to_string(),
            message: format!("name is longer than {} bytes", MAX_NAME_LEN),
        });
    }
    if !NAME_RE.is_match(name) {
        return Err(StoreError::InvalidId {
            id: name.to_string(),
            message: "name must start with a letter or digit and contain only letters, \
                      digits, '_' and '-'"
                .to_string(),
        });
    }
    Ok(())
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureId::Page(name) => write!(f, "page:{}", name),
            StructureId::Menu => f.write_str("menu"),
            StructureId::Footer => f.write_str("footer"),
            StructureId::Component(name) => write!(f, "component:{}", name),
        }
    }
}

impl FromStr for StructureId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = match s.split_once(':') {
            Some((kind, name)) => (kind, Some(name)),
            None => (s, None),
        };
        let kind: StructureKind = kind.parse().map_err(|_| StoreError::InvalidId {
            id: s.to_string(),
            message: "expected page:<name>, menu, footer or component:<name>".to_string(),
        })?;

        match (kind, name) {
            (StructureKind::Page, Some(name)) => StructureId::page(name),
            (StructureKind::Component, Some(name)) => StructureId::component(name),
            (StructureKind::Menu, None) => Ok(StructureId::Menu),
            (StructureKind::Footer, None) => Ok(StructureId::Footer),
            (kind, _) => Err(StoreError::InvalidId {
                id: s.to_string(),
                message: if kind.is_named() {
                    format!("{} ids need a name, as in {}:<name>", kind, kind)
                } else {
                    format!("{} ids take no name", kind)
                },
            }),
        }
    }
}

impl Serialize for StructureId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StructureId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_json_decodes_to_array_root() {
        let s: Structure =
            serde_json::from_value(json!([{"tag": "h1"}, {"textKey": "a"}])).unwrap();
        assert_eq!(s.shape(), RootShape::Array);
        assert_eq!(s.top_level().len(), 2);
    }

    #[test]
    fn object_json_decodes_to_object_root() {
        let s: Structure = serde_json::from_value(json!({
            "tag": "div",
            "params": {"class": "card"},
            "children": [{"tag": "span"}]
        }))
        .unwrap();
        assert_eq!(s.shape(), RootShape::Object);
        assert_eq!(s.top_level(), &[Node::element("span")]);
        assert_eq!(s.root_element().map(|r| r.tag.as_str()), Some("div"));
    }

    #[test]
    fn object_root_without_children() {
        let mut s: Structure = serde_json::from_value(json!({"tag": "div"})).unwrap();
        assert!(s.top_level().is_empty());
        assert!(s.top_level_mut().is_none());

        s.top_level_mut_or_init().push(Node::text("k"));
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({"tag": "div", "children": [{"textKey": "k"}]})
        );
    }

    #[test]
    fn scalar_json_is_not_a_structure() {
        assert!(serde_json::from_value::<Structure>(json!("page")).is_err());
        assert!(serde_json::from_value::<Structure>(json!({"component": "x"})).is_err());
    }

    #[test]
    fn expected_shapes() {
        assert_eq!(StructureKind::Component.expected_shape(), RootShape::Object);
        assert_eq!(StructureKind::Page.expected_shape(), RootShape::Array);
        assert_eq!(StructureKind::Menu.expected_shape(), RootShape::Array);
        assert_eq!(StructureKind::Footer.expected_shape(), RootShape::Array);
    }

    #[test]
    fn parse_ids() {
        assert_eq!(
            "page:home".parse::<StructureId>().unwrap(),
            StructureId::Page("home".to_string())
        );
        assert_eq!(
            "component:footer-link".parse::<StructureId>().unwrap(),
            StructureId::Component("footer-link".to_string())
        );
        assert_eq!("menu".parse::<StructureId>().unwrap(), StructureId::Menu);
        assert_eq!("footer".parse::<StructureId>().unwrap(), StructureId::Footer);
    }

    #[test]
    fn reject_bad_ids() {
        for bad in [
            "",
            "page",
            "page:",
            "menu:main",
            "widget:x",
            "page:../etc",
            "page:-lead",
            "page:a b",
            "component:x/y",
        ] {
            assert!(bad.parse::<StructureId>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn name_length_limit() {
        let ok = "a".repeat(MAX_NAME_LEN);
        let too_long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(StructureId::page(&ok).is_ok());
        assert!(StructureId::page(&too_long).is_err());
    }

    #[test]
    fn id_display_round_trips() {
        for text in ["page:about_us", "menu", "footer", "component:hero-2"] {
            let id: StructureId = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
    }

    #[test]
    fn id_serde_as_string() {
        let id = StructureId::Component("card".to_string());
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("component:card"));
        let back: StructureId = serde_json::from_value(json!("component:card")).unwrap();
        assert_eq!(back, id);
    }
}
