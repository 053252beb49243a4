//! The front door: untrusted input in, stored structures updated.
//!
//! [`StructureEditor`] parses caller-supplied path strings, resolves the
//! `"root"` target, and runs each mutation as one locked
//! load / edit / save cycle against a [`StructureStore`].

use std::fmt;
use std::str::FromStr;

use crate::annotate::{self, AnnotatedStructure, Summary};
use crate::error::{EditError, TreeError};
use crate::moves::Relocation;
use crate::mutation::{Insertion, MutationEngine, Position, Removal, Replacement};
use crate::node::Node;
use crate::path::{NodePath, PathError, ROOT_TOKEN};
use crate::resolver;
use crate::structure::{RootShape, Structure, StructureId};
use crate::traits::StructureStore;

/// Target of an insertion: a node path, or the top of an object root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeTarget {
    Root,
    Path(NodePath),
}

impl NodeTarget {
    /// Parse a target, rejecting paths with more than `max_segments` segments.
    pub fn parse_bounded(s: &str, max_segments: usize) -> Result<Self, PathError> {
        if s == ROOT_TOKEN {
            return Ok(NodeTarget::Root);
        }
        NodePath::parse_bounded(s, max_segments).map(NodeTarget::Path)
    }
}

impl FromStr for NodeTarget {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ROOT_TOKEN {
            return Ok(NodeTarget::Root);
        }
        NodePath::parse(s).map(NodeTarget::Path)
    }
}

impl fmt::Display for NodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTarget::Root => f.write_str(ROOT_TOKEN),
            NodeTarget::Path(path) => path.fmt(f),
        }
    }
}

/// Engine results that carry the structure to persist.
trait Outcome {
    fn structure(&self) -> &Structure;
}

impl Outcome for Insertion {
    fn structure(&self) -> &Structure {
        &self.structure
    }
}

impl Outcome for Replacement {
    fn structure(&self) -> &Structure {
        &self.structure
    }
}

impl Outcome for Removal {
    fn structure(&self) -> &Structure {
        &self.structure
    }
}

impl Outcome for Relocation {
    fn structure(&self) -> &Structure {
        &self.structure
    }
}

/// Applies engine operations to stored structures.
pub struct StructureEditor<S> {
    store: S,
    engine: MutationEngine,
}

impl<S: StructureStore> StructureEditor<S> {
    pub fn new(store: S, engine: MutationEngine) -> Self {
        StructureEditor { store, engine }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    /// Parse a path string, bounded by the guard's depth limit.
    ///
    /// A path with more segments than `max_depth + 1` could only address a
    /// node the guard would never have accepted.
    pub fn parse_path(&self, text: &str) -> Result<NodePath, EditError> {
        Ok(NodePath::parse_bounded(text, self.max_segments())?)
    }

    pub fn parse_target(&self, text: &str) -> Result<NodeTarget, EditError> {
        Ok(NodeTarget::parse_bounded(text, self.max_segments())?)
    }

    fn max_segments(&self) -> usize {
        self.engine.guard().limits().max_depth.saturating_add(1)
    }

    /// Load a stored structure.
    pub fn structure(&mut self, id: &StructureId) -> Result<Structure, EditError> {
        let structure = self
            .store
            .load(id)?
            .ok_or_else(|| EditError::StructureNotFound { id: id.clone() })?;

        let expected = id.kind().expected_shape();
        if structure.shape() != expected {
            log::warn!(
                "{} has an {} root; {} structures normally have an {} root",
                id,
                structure.shape(),
                id.kind(),
                expected
            );
        }
        Ok(structure)
    }

    /// The node at `path` in a stored structure.
    pub fn node(&mut self, id: &StructureId, path: &str) -> Result<Node, EditError> {
        let path = self.parse_path(path)?;
        let structure = self.structure(id)?;
        resolver::resolve(&structure, &path)
            .cloned()
            .ok_or_else(|| TreeError::TargetNotFound { path }.into())
    }

    pub fn annotate(&mut self, id: &StructureId) -> Result<AnnotatedStructure, EditError> {
        Ok(annotate::annotate(&self.structure(id)?))
    }

    pub fn summarize(&mut self, id: &StructureId, max_depth: usize) -> Result<Summary, EditError> {
        Ok(annotate::summarize(&self.structure(id)?, max_depth))
    }

    /// Insert `node` relative to `target`.
    ///
    /// `target` is a node path or `"root"`. The `"root"` target always prepends
    /// to an object root's top-level children, whatever `position` says, and
    /// is rejected for array roots.
    pub fn add_node(
        &mut self,
        id: &StructureId,
        target: &str,
        node: Node,
        position: Position,
    ) -> Result<Insertion, EditError> {
        let target = self.parse_target(target)?;
        let insertion = self.mutate(id, |engine, structure| match &target {
            NodeTarget::Root => {
                if structure.shape() == RootShape::Array {
                    return Err(EditError::RootTargetUnsupported { id: id.clone() });
                }
                if position != Position::Inside {
                    log::debug!("'root' target ignores position {}", position);
                }
                Ok(engine.prepend_top_level(structure, node)?)
            }
            NodeTarget::Path(path) => Ok(engine.insert(structure, path, node, position)?),
        })?;
        log::info!("{}: added node at {}", id, insertion.path);
        Ok(insertion)
    }

    pub fn edit_node(
        &mut self,
        id: &StructureId,
        path: &str,
        node: Node,
    ) -> Result<Replacement, EditError> {
        let path = self.parse_path(path)?;
        let replacement =
            self.mutate(id, |engine, structure| Ok(engine.update(structure, &path, node)?))?;
        log::info!("{}: replaced node at {}", id, replacement.path);
        Ok(replacement)
    }

    pub fn delete_node(&mut self, id: &StructureId, path: &str) -> Result<Removal, EditError> {
        let path = self.parse_path(path)?;
        let removal = self.mutate(id, |engine, structure| Ok(engine.delete(structure, &path)?))?;
        log::info!("{}: deleted node at {}", id, removal.path);
        Ok(removal)
    }

    pub fn move_node(
        &mut self,
        id: &StructureId,
        source: &str,
        target: &str,
        position: Position,
    ) -> Result<Relocation, EditError> {
        let source = self.parse_path(source)?;
        let target = self.parse_path(target)?;
        let relocation = self.mutate(id, |engine, structure| {
            Ok(engine.move_node(structure, &source, &target, position)?)
        })?;
        log::info!(
            "{}: moved {} {} {}, now at {}",
            id,
            relocation.source,
            relocation.position,
            relocation.target,
            relocation.new_path
        );
        Ok(relocation)
    }

    pub fn duplicate_node(&mut self, id: &StructureId, path: &str) -> Result<Insertion, EditError> {
        let path = self.parse_path(path)?;
        let insertion =
            self.mutate(id, |engine, structure| Ok(engine.duplicate(structure, &path)?))?;
        log::info!("{}: duplicated {} to {}", id, path, insertion.path);
        Ok(insertion)
    }

    /// Store `structure` under `id`, creating or overwriting it.
    ///
    /// The whole structure is new content, so all four guard validators run.
    pub fn replace_structure(
        &mut self,
        id: &StructureId,
        structure: &Structure,
    ) -> Result<(), EditError> {
        self.engine.guard().validate(structure)?;
        let _lock = self.store.lock(id)?;
        self.store.save(id, structure)?;
        log::info!("{}: replaced whole structure", id);
        Ok(())
    }

    /// Run one locked load / edit / save cycle.
    fn mutate<T, F>(&mut self, id: &StructureId, op: F) -> Result<T, EditError>
    where
        T: Outcome,
        F: FnOnce(&MutationEngine, &Structure) -> Result<T, EditError>,
    {
        let _lock = self.store.lock(id)?;
        let current = self.structure(id)?;
        let outcome = op(&self.engine, &current)?;
        self.store.save(id, outcome.structure())?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::error::StoreError;
    use crate::guard::{GuardLimits, StructureGuard};
    use crate::node_path;
    use serde_json::json;

    #[derive(Default)]
    struct MapStore {
        structures: HashMap<StructureId, Structure>,
        locked: HashSet<StructureId>,
        saves: usize,
    }

    impl StructureStore for MapStore {
        type Lock = ();

        fn lock(&mut self, id: &StructureId) -> Result<(), StoreError> {
            if self.locked.contains(id) {
                return Err(StoreError::Locked { id: id.clone() });
            }
            Ok(())
        }

        fn load(&mut self, id: &StructureId) -> Result<Option<Structure>, StoreError> {
            Ok(self.structures.get(id).cloned())
        }

        fn save(&mut self, id: &StructureId, structure: &Structure) -> Result<(), StoreError> {
            self.saves += 1;
            self.structures.insert(id.clone(), structure.clone());
            Ok(())
        }
    }

    fn home() -> StructureId {
        StructureId::Page("home".to_string())
    }

    fn card() -> StructureId {
        StructureId::Component("card".to_string())
    }

    fn editor() -> StructureEditor<MapStore> {
        let mut store = MapStore::default();
        store.structures.insert(
            home(),
            serde_json::from_value(json!([
                {"tag": "header", "children": [{"textKey": "title"}]},
                {"tag": "main", "children": [{"component": "footer-link"}]},
                {"tag": "footer"}
            ]))
            .unwrap(),
        );
        store.structures.insert(
            card(),
            serde_json::from_value(json!({"tag": "div", "children": [{"tag": "h2"}]})).unwrap(),
        );
        StructureEditor::new(store, MutationEngine::default())
    }

    fn stored(editor: &StructureEditor<MapStore>, id: &StructureId) -> Structure {
        editor.store().structures[id].clone()
    }

    #[test]
    fn parse_targets() {
        assert_eq!("root".parse::<NodeTarget>().unwrap(), NodeTarget::Root);
        assert_eq!(
            "1.2".parse::<NodeTarget>().unwrap(),
            NodeTarget::Path(node_path!("1.2"))
        );
        assert!("1.x".parse::<NodeTarget>().is_err());
        assert_eq!(NodeTarget::Root.to_string(), "root");
    }

    #[test]
    fn read_structure_and_node() {
        let mut editor = editor();
        assert_eq!(editor.structure(&home()).unwrap().top_level().len(), 3);
        assert_eq!(
            editor.node(&home(), "1.0").unwrap(),
            Node::component("footer-link")
        );
        assert!(matches!(
            editor.node(&home(), "1.1"),
            Err(EditError::Tree(TreeError::TargetNotFound { .. }))
        ));
    }

    #[test]
    fn missing_structure() {
        let mut editor = editor();
        assert_eq!(
            editor.structure(&StructureId::Menu),
            Err(EditError::StructureNotFound {
                id: StructureId::Menu
            })
        );
    }

    #[test]
    fn malformed_paths_rejected_before_loading() {
        let mut editor = editor();
        for bad in ["", "1..2", "-1", "a", "01"] {
            let err = editor.delete_node(&home(), bad).unwrap_err();
            assert_eq!(err.code(), "path.invalid", "{:?}", bad);
        }
        assert_eq!(editor.store().saves, 0);
    }

    #[test]
    fn root_token_is_not_a_path() {
        let mut editor = editor();
        assert_eq!(
            editor.delete_node(&card(), "root"),
            Err(EditError::Tree(TreeError::InvalidPathFormat(
                PathError::RootSentinel
            )))
        );
    }

    #[test]
    fn overlong_path_rejected() {
        let engine = MutationEngine::new(StructureGuard::new(
            GuardLimits::default().with_max_depth(2),
        ));
        let editor = StructureEditor::new(MapStore::default(), engine);
        assert!(editor.parse_path("0.0.0").is_ok());
        assert!(matches!(
            editor.parse_path("0.0.0.0"),
            Err(EditError::Tree(TreeError::InvalidPathFormat(
                PathError::TooDeep { len: 4, max: 3, .. }
            )))
        ));
    }

    #[test]
    fn add_node_persists() {
        let mut editor = editor();
        let insertion = editor
            .add_node(&home(), "0", Node::element("nav"), Position::After)
            .unwrap();
        assert_eq!(insertion.path, node_path!("1"));
        assert_eq!(stored(&editor, &home()), insertion.structure);
        assert_eq!(editor.store().saves, 1);
    }

    #[test]
    fn add_node_at_root_of_component() {
        let mut editor = editor();
        let insertion = editor
            .add_node(&card(), "root", Node::text("card.body"), Position::After)
            .unwrap();
        assert_eq!(insertion.path, node_path!("0"));
        assert_eq!(
            serde_json::to_value(stored(&editor, &card())).unwrap(),
            json!({"tag": "div", "children": [{"textKey": "card.body"}, {"tag": "h2"}]})
        );
    }

    #[test]
    fn add_node_at_root_of_page_rejected() {
        let mut editor = editor();
        assert_eq!(
            editor.add_node(&home(), "root", Node::text("x"), Position::Inside),
            Err(EditError::RootTargetUnsupported { id: home() })
        );
        assert_eq!(editor.store().saves, 0);
    }

    #[test]
    fn failed_mutation_saves_nothing() {
        let mut editor = editor();
        let before = stored(&editor, &home());
        let err = editor
            .add_node(&home(), "1.0", Node::element("span"), Position::Inside)
            .unwrap_err();
        assert_eq!(err.code(), "node.atomic");
        assert_eq!(stored(&editor, &home()), before);
        assert_eq!(editor.store().saves, 0);
    }

    #[test]
    fn edit_delete_duplicate() {
        let mut editor = editor();
        let replaced = editor
            .edit_node(&home(), "2", Node::element("aside"))
            .unwrap();
        assert_eq!(replaced.previous, Node::element("footer"));

        let removed = editor.delete_node(&home(), "0").unwrap();
        assert_eq!(removed.removed.label(), Some("header"));

        let duplicated = editor.duplicate_node(&home(), "1").unwrap();
        assert_eq!(duplicated.path, node_path!("2"));
        let top = stored(&editor, &home());
        let labels: Vec<_> = top.top_level().iter().filter_map(Node::label).collect();
        assert_eq!(labels, vec!["main", "aside", "aside"]);
        assert_eq!(editor.store().saves, 3);
    }

    #[test]
    fn move_node_persists() {
        let mut editor = editor();
        let relocation = editor
            .move_node(&home(), "0", "2", Position::After)
            .unwrap();
        assert_eq!(relocation.new_path, node_path!("2"));
        assert_eq!(
            editor.node(&home(), "2").unwrap().label(),
            Some("header")
        );
    }

    #[test]
    fn locked_structure_rejected() {
        let mut editor = editor();
        editor.store_mut().locked.insert(home());
        assert_eq!(
            editor.delete_node(&home(), "0"),
            Err(EditError::Store(StoreError::Locked { id: home() }))
        );
        // Reads do not take the lock.
        assert!(editor.structure(&home()).is_ok());
    }

    #[test]
    fn replace_structure_validates_everything() {
        let mut editor = editor();
        let bad: Structure =
            serde_json::from_value(json!([{"tag": "div", "params": {"data-qs-id": "1"}}])).unwrap();
        assert!(matches!(
            editor.replace_structure(&StructureId::Footer, &bad),
            Err(EditError::Tree(TreeError::ReservedAttribute { .. }))
        ));

        let good: Structure = serde_json::from_value(json!([{"tag": "p"}])).unwrap();
        editor
            .replace_structure(&StructureId::Footer, &good)
            .unwrap();
        assert_eq!(editor.structure(&StructureId::Footer).unwrap(), good);
    }

    #[test]
    fn annotate_and_summarize() {
        let mut editor = editor();
        let annotated = serde_json::to_value(editor.annotate(&card()).unwrap()).unwrap();
        assert_eq!(annotated["_nodeId"], json!("root"));
        assert_eq!(annotated["children"][0]["_nodeId"], json!("0"));

        let summary = editor.summarize(&home(), 0).unwrap();
        assert_eq!(summary.total_nodes, 5);
        assert!(summary.nodes[0].truncated);
    }
}
