//! The Node type - one unit of a structure tree.
//!
//! A node is one of three shapes, distinguished by which key it carries:
//!
//! - element: `{ "tag": "div", "params": {...}, "children": [...] }`
//! - component reference: `{ "component": "footer-link", "data": {...} }`
//! - text: `{ "textKey": "home.title" }`
//!
//! Component references are atomic: they never own children.
//!
//! Keys outside a shape's own fields are kept in its `extra` map and written
//! back unchanged, so editing one node never strips data from another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// An element node: an HTML-like tag with attributes and optional children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,

    /// `None` and `Some(vec![])` are kept distinct so structures round-trip
    /// exactly as they were stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        ElementNode {
            tag: tag.into(),
            params: BTreeMap::new(),
            children: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Some(children);
        self
    }

    /// Children as a slice; an absent `children` key reads as empty.
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Mutable children, creating the array if it was absent.
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        self.children.get_or_insert_with(Vec::new)
    }
}

/// A reference to a reusable component, rendered elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub component: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// A text node pointing at a translation key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    #[serde(rename = "textKey")]
    pub text_key: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// One node of a structure.
///
/// Deserialization picks the variant from the keys present, in this order: a
/// `component` key makes a component reference, then `textKey` a text node,
/// then `tag` an element. A node carrying both `tag` and `component` is
/// therefore an atomic component reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Component(ComponentNode),
    Text(TextNode),
    Element(ElementNode),
}

impl Node {
    /// Create a childless element node.
    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element(ElementNode::new(tag))
    }

    /// Create a component reference without data.
    pub fn component(name: impl Into<String>) -> Self {
        Node::Component(ComponentNode {
            component: name.into(),
            data: BTreeMap::new(),
            extra: BTreeMap::new(),
        })
    }

    /// Create a text node.
    pub fn text(text_key: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text_key: text_key.into(),
            extra: BTreeMap::new(),
        })
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Component references cannot receive children.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Node::Component(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Children of an element; empty for every other node kind.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => element.children(),
            Node::Component(_) | Node::Text(_) => &[],
        }
    }

    /// Tag name for elements, component name for components, `None` for text.
    pub fn label(&self) -> Option<&str> {
        match self {
            Node::Element(element) => Some(&element.tag),
            Node::Component(component) => Some(&component.component),
            Node::Text(_) => None,
        }
    }
}

impl From<ElementNode> for Node {
    fn from(element: ElementNode) -> Self {
        Node::Element(element)
    }
}

impl From<ComponentNode> for Node {
    fn from(component: ComponentNode) -> Self {
        Node::Component(component)
    }
}

impl From<TextNode> for Node {
    fn from(text: TextNode) -> Self {
        Node::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_element() {
        let node: Node = serde_json::from_value(json!({
            "tag": "div",
            "params": {"class": "hero"},
            "children": [{"textKey": "home.title"}]
        }))
        .unwrap();

        let element = node.as_element().unwrap();
        assert_eq!(element.tag, "div");
        assert_eq!(element.params.get("class").map(String::as_str), Some("hero"));
        assert_eq!(element.children(), &[Node::text("home.title")]);
    }

    #[test]
    fn deserialize_component() {
        let node: Node = serde_json::from_value(json!({
            "component": "footer-link",
            "data": {"href": "/about"}
        }))
        .unwrap();
        assert!(node.is_atomic());
        assert_eq!(node.label(), Some("footer-link"));
    }

    #[test]
    fn deserialize_text() {
        let node: Node = serde_json::from_value(json!({"textKey": "menu.home"})).unwrap();
        assert!(node.is_text());
        assert_eq!(node.label(), None);
    }

    #[test]
    fn unknown_shape_rejected() {
        assert!(serde_json::from_value::<Node>(json!({"kind": "div"})).is_err());
        assert!(serde_json::from_value::<Node>(json!("div")).is_err());
    }

    #[test]
    fn absent_and_empty_children_round_trip() {
        let without = json!({"tag": "br"});
        let with_empty = json!({"tag": "ul", "children": []});

        let a: Node = serde_json::from_value(without.clone()).unwrap();
        let b: Node = serde_json::from_value(with_empty.clone()).unwrap();

        assert_eq!(serde_json::to_value(&a).unwrap(), without);
        assert_eq!(serde_json::to_value(&b).unwrap(), with_empty);
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let stored = json!([
            {"tag": "img", "selfClosing": true, "params": {"src": "/a.png"}},
            {"component": "card", "data": {"title": "x"}, "slots": {"body": []}},
            {"textKey": "k", "note": "keep"}
        ]);
        let nodes: Vec<Node> = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(
            nodes[0].as_element().unwrap().extra.get("selfClosing"),
            Some(&json!(true))
        );
        assert_eq!(serde_json::to_value(&nodes).unwrap(), stored);
    }

    #[test]
    fn component_key_wins_over_tag() {
        let node: Node =
            serde_json::from_value(json!({"tag": "div", "component": "card"})).unwrap();
        assert!(node.is_atomic());
        assert_eq!(node.label(), Some("card"));
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({"component": "card", "tag": "div"})
        );
    }

    #[test]
    fn children_mut_creates_array() {
        let mut element = ElementNode::new("section");
        assert!(element.children.is_none());
        element.children_mut().push(Node::text("a"));
        assert_eq!(element.children().len(), 1);
    }

    #[test]
    fn non_elements_have_no_children() {
        assert!(Node::component("card").children().is_empty());
        assert!(Node::text("k").children().is_empty());
    }

    #[test]
    fn builder_helpers() {
        let node: Node = ElementNode::new("a")
            .with_param("href", "/")
            .with_children(vec![Node::text("nav.home")])
            .into();
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({"tag": "a", "params": {"href": "/"}, "children": [{"textKey": "nav.home"}]})
        );
    }
}
