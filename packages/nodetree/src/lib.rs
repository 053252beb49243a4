//! NodeTree: path-addressable, guarded editing of structure trees.
//!
//! Pages, menus, footers and components are trees of nodes addressed by
//! dot-separated index paths. Every edit goes through one guarded engine and
//! is persisted by a [`StructureStore`]:
//!
//! ```rust
//! use nodetree::{InMemoryStore, MutationEngine, Node, Position, Structure};
//! use nodetree::{StructureEditor, StructureId};
//!
//! let home = StructureId::page("home").unwrap();
//! let mut store = InMemoryStore::new();
//! store.insert(home.clone(), Structure::ArrayRoot(vec![Node::element("main")]));
//!
//! let mut editor = StructureEditor::new(store, MutationEngine::default());
//! let added = editor
//!     .add_node(&home, "0", Node::text("welcome"), Position::Inside)
//!     .unwrap();
//! assert_eq!(added.path.to_string(), "0.0");
//! ```

pub use nodetree_core::*;

pub use nodetree_json_store::json_utils;
pub use nodetree_json_store::{InMemoryStore, JsonFileStore, LockFile};
