//! Relocating a node: delete, reconcile the target path, insert.

use crate::error::TreeError;
use crate::mutation::{self, MutationEngine, Position, TargetRole};
use crate::node::Node;
use crate::path::NodePath;
use crate::resolver;
use crate::structure::Structure;

/// Result of [`MutationEngine::move_node`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relocation {
    pub structure: Structure,
    pub source: NodePath,
    /// The target as the caller gave it, before reconciliation.
    pub target: NodePath,
    pub position: Position,
    /// Where the moved node ended up.
    pub new_path: NodePath,
}

/// Re-derive `target` after the node at `source` has been removed.
///
/// Removing a node shifts its later siblings down by one. The target is
/// affected only when it runs through that same container at a later index:
/// its segments before the source's last level match the source, and its
/// segment at that level is greater than the source's. That one segment is
/// decremented; every other segment is unchanged.
pub fn reconcile_target(source: &NodePath, target: &NodePath) -> NodePath {
    let level = source.len() - 1;
    let shares_container = target.len() > level
        && source.segments()[..level] == target.segments()[..level];
    if shares_container && source[level] < target[level] {
        target.with_segment(level, target[level] - 1)
    } else {
        target.clone()
    }
}

impl MutationEngine {
    /// Move the node at `source` to `position` relative to the node at
    /// `target`.
    ///
    /// `target` is given relative to the structure as it is before the move.
    /// `before`/`after` land the node next to the target; `inside` appends it
    /// as the target's last child.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NoOpMove`] when `source == target`
    /// - [`TreeError::CyclicMove`] when `target` lies inside `source`
    /// - [`TreeError::SourceNotFound`] / [`TreeError::TargetNotFound`]
    /// - [`TreeError::AtomicNodeViolation`] / [`TreeError::TextNodeViolation`]
    ///   for `inside` on a component or text node
    /// - [`TreeError::DepthExceeded`] if the moved subtree would nest too deep
    pub fn move_node(
        &self,
        structure: &Structure,
        source: &NodePath,
        target: &NodePath,
        position: Position,
    ) -> Result<Relocation, TreeError> {
        if source == target {
            return Err(TreeError::NoOpMove {
                path: source.clone(),
            });
        }
        if target.is_descendant_of(source) {
            return Err(TreeError::CyclicMove {
                moved: source.clone(),
                target: target.clone(),
            });
        }

        if resolver::resolve(structure, source).is_none() {
            return Err(TargetRole::Source.not_found(source));
        }
        let target_node = resolver::resolve(structure, target)
            .ok_or_else(|| TargetRole::Target.not_found(target))?;
        if position == Position::Inside {
            mutation::check_container(target_node, target)?;
        }

        let mut result = structure.clone();
        let moved = mutation::remove(&mut result, source)
            .ok_or_else(|| TargetRole::Source.not_found(source))?;

        let reconciled = reconcile_target(source, target);
        if !resolver::exists(&result, &reconciled) {
            log::error!(
                "move {} -> {}: reconciled target {} does not resolve",
                source,
                target,
                reconciled
            );
            return Err(TreeError::TargetLostOnRemoval { target: reconciled });
        }

        let new_path = place(&mut result, &reconciled, moved, position)?;

        self.guard.validate_depth(&result)?;
        Ok(Relocation {
            structure: result,
            source: source.clone(),
            target: target.clone(),
            position,
            new_path,
        })
    }
}

fn place(
    structure: &mut Structure,
    target: &NodePath,
    node: Node,
    position: Position,
) -> Result<NodePath, TreeError> {
    let lost = || TreeError::TargetLostOnRemoval {
        target: target.clone(),
    };
    match position {
        Position::Inside => {
            let children = mutation::container_children(structure, target, TargetRole::Target)?;
            let index = children.len();
            children.push(node);
            Ok(target.child(index))
        }
        Position::Before | Position::After => {
            let container =
                resolver::resolve_parent_container_mut(structure, target).ok_or_else(lost)?;
            let index = if position == Position::Before {
                container.index
            } else {
                container.index + 1
            };
            container.nodes.insert(index, node);
            Ok(target.sibling(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{count_nodes, GuardLimits, StructureGuard};
    use crate::node::ElementNode;
    use crate::node_path;
    use crate::resolver::resolve;
    use serde_json::json;

    fn abc() -> Structure {
        Structure::ArrayRoot(vec![
            Node::element("a"),
            Node::element("b"),
            Node::element("c"),
        ])
    }

    fn nested() -> Structure {
        serde_json::from_value(json!([
            {"tag": "section", "children": [
                {"tag": "h1"},
                {"tag": "p"},
                {"component": "card"}
            ]},
            {"tag": "aside", "children": [{"textKey": "note"}]},
            {"tag": "footer"}
        ]))
        .unwrap()
    }

    fn tags(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().filter_map(Node::label).collect()
    }

    fn engine() -> MutationEngine {
        MutationEngine::default()
    }

    #[test]
    fn reconcile_same_container_later_sibling() {
        assert_eq!(reconcile_target(&node_path!("0"), &node_path!("2")), node_path!("1"));
        assert_eq!(
            reconcile_target(&node_path!("1.0"), &node_path!("1.3.2")),
            node_path!("1.2.2")
        );
    }

    #[test]
    fn reconcile_leaves_unaffected_targets() {
        // Earlier sibling.
        assert_eq!(reconcile_target(&node_path!("2"), &node_path!("0")), node_path!("0"));
        // Different container.
        assert_eq!(
            reconcile_target(&node_path!("0.1"), &node_path!("1.3")),
            node_path!("1.3")
        );
        // Shallower target than the removal level.
        assert_eq!(
            reconcile_target(&node_path!("0.1.2"), &node_path!("0.4")),
            node_path!("0.4")
        );
        // Target is an ancestor's later sibling at a shallower level.
        assert_eq!(
            reconcile_target(&node_path!("0.0"), &node_path!("1")),
            node_path!("1")
        );
    }

    #[test]
    fn move_first_after_last() {
        let r = engine()
            .move_node(&abc(), &node_path!("0"), &node_path!("2"), Position::After)
            .unwrap();
        assert_eq!(tags(r.structure.top_level()), vec!["b", "c", "a"]);
        assert_eq!(r.new_path, node_path!("2"));
        assert_eq!(r.target, node_path!("2"));
    }

    #[test]
    fn move_first_before_last() {
        let r = engine()
            .move_node(&abc(), &node_path!("0"), &node_path!("2"), Position::Before)
            .unwrap();
        assert_eq!(tags(r.structure.top_level()), vec!["b", "a", "c"]);
        assert_eq!(r.new_path, node_path!("1"));
    }

    #[test]
    fn move_last_before_first() {
        let r = engine()
            .move_node(&abc(), &node_path!("2"), &node_path!("0"), Position::Before)
            .unwrap();
        assert_eq!(tags(r.structure.top_level()), vec!["c", "a", "b"]);
        assert_eq!(r.new_path, node_path!("0"));
    }

    #[test]
    fn move_inside_appends() {
        let r = engine()
            .move_node(&nested(), &node_path!("2"), &node_path!("0"), Position::Inside)
            .unwrap();
        assert_eq!(r.new_path, node_path!("0.3"));
        assert_eq!(
            resolve(&r.structure, &node_path!("0.3")),
            Some(&Node::element("footer"))
        );
    }

    #[test]
    fn move_inside_later_sibling_reconciles() {
        // Moving "0" inside "1": "1" becomes "0" once "0" is removed.
        let r = engine()
            .move_node(&nested(), &node_path!("0"), &node_path!("1"), Position::Inside)
            .unwrap();
        assert_eq!(r.new_path, node_path!("0.1"));
        assert_eq!(
            resolve(&r.structure, &node_path!("0.1")).and_then(Node::label),
            Some("section")
        );
    }

    #[test]
    fn move_into_other_subtree() {
        let r = engine()
            .move_node(&nested(), &node_path!("0.1"), &node_path!("1.0"), Position::Before)
            .unwrap();
        assert_eq!(r.new_path, node_path!("1.0"));
        let section = resolve(&r.structure, &node_path!("0")).unwrap();
        assert_eq!(tags(section.children()), vec!["h1", "card"]);
        assert_eq!(
            resolve(&r.structure, &node_path!("1.0")),
            Some(&Node::element("p"))
        );
    }

    #[test]
    fn move_out_to_top_level() {
        let r = engine()
            .move_node(&nested(), &node_path!("0.0"), &node_path!("2"), Position::After)
            .unwrap();
        assert_eq!(r.new_path, node_path!("3"));
        assert_eq!(tags(r.structure.top_level()), vec!["section", "aside", "footer", "h1"]);
    }

    #[test]
    fn noop_move() {
        assert_eq!(
            engine().move_node(&abc(), &node_path!("1"), &node_path!("1"), Position::After),
            Err(TreeError::NoOpMove {
                path: node_path!("1")
            })
        );
    }

    #[test]
    fn cyclic_move() {
        assert_eq!(
            engine().move_node(&nested(), &node_path!("0"), &node_path!("0.1"), Position::After),
            Err(TreeError::CyclicMove {
                moved: node_path!("0"),
                target: node_path!("0.1")
            })
        );
    }

    #[test]
    fn missing_source_and_target() {
        assert_eq!(
            engine().move_node(&abc(), &node_path!("5"), &node_path!("0"), Position::After),
            Err(TreeError::SourceNotFound {
                path: node_path!("5")
            })
        );
        assert_eq!(
            engine().move_node(&abc(), &node_path!("0"), &node_path!("1.4"), Position::After),
            Err(TreeError::TargetNotFound {
                path: node_path!("1.4")
            })
        );
    }

    #[test]
    fn move_inside_component_or_text_rejected() {
        let s = nested();
        assert!(matches!(
            engine().move_node(&s, &node_path!("2"), &node_path!("0.2"), Position::Inside),
            Err(TreeError::AtomicNodeViolation { .. })
        ));
        assert!(matches!(
            engine().move_node(&s, &node_path!("2"), &node_path!("1.0"), Position::Inside),
            Err(TreeError::TextNodeViolation { .. })
        ));
        assert_eq!(s, nested());
    }

    #[test]
    fn move_preserves_count() {
        let s = nested();
        let r = engine()
            .move_node(&s, &node_path!("1"), &node_path!("0.0"), Position::After)
            .unwrap();
        assert_eq!(count_nodes(&r.structure), count_nodes(&s));
        assert_eq!(resolve(&r.structure, &r.new_path), resolve(&s, &node_path!("1")));
    }

    #[test]
    fn move_checks_resulting_depth() {
        let engine = MutationEngine::new(StructureGuard::new(
            GuardLimits::default().with_max_depth(1),
        ));
        let s: Structure = Structure::ArrayRoot(vec![
            ElementNode::new("div")
                .with_children(vec![Node::element("span")])
                .into(),
            ElementNode::new("ul")
                .with_children(vec![Node::element("li")])
                .into(),
        ]);
        // ul (with its li) inside span would put li at depth 3.
        assert!(matches!(
            engine.move_node(&s, &node_path!("1"), &node_path!("0.0"), Position::Inside),
            Err(TreeError::DepthExceeded { .. })
        ));
    }

    #[test]
    fn move_on_object_root() {
        let s: Structure = serde_json::from_value(json!({
            "tag": "div",
            "children": [{"tag": "a"}, {"tag": "b"}, {"tag": "c"}]
        }))
        .unwrap();
        let r = engine()
            .move_node(&s, &node_path!("0"), &node_path!("2"), Position::After)
            .unwrap();
        assert_eq!(r.new_path, node_path!("2"));
        assert_eq!(tags(r.structure.top_level()), vec!["b", "c", "a"]);
        assert_eq!(r.structure.root_element().map(|e| e.tag.as_str()), Some("div"));
    }
}
