//! NodeTree core: path-addressable structure trees
//!
//! Every page, menu, footer and component is a [`Structure`]: a tree of
//! [`Node`]s whose nodes are addressed by dot-separated index paths
//! ([`NodePath`], e.g. `"0.2.1"`). This crate holds:
//! - the data model (`Node`, `Structure`, `StructureId`)
//! - path parsing and resolution
//! - `StructureGuard`: size, depth, tag and attribute limits
//! - `MutationEngine`: insert, update, delete, duplicate and move
//! - read-only projections (`annotate`, `summarize`, `node_paths`)
//! - `StructureStore` and `StructureEditor`, the persistence seam and the
//!   front door that ties them together
//!
//! # Example
//!
//! ```rust
//! use nodetree_core::{node_path, MutationEngine, Node, Position, Structure};
//!
//! let page = Structure::ArrayRoot(vec![
//!     Node::element("a"),
//!     Node::element("b"),
//!     Node::element("c"),
//! ]);
//!
//! let moved = MutationEngine::default()
//!     .move_node(&page, &node_path!("0"), &node_path!("2"), Position::After)
//!     .unwrap();
//! assert_eq!(moved.new_path, node_path!("2"));
//! ```

pub mod annotate;
mod editor;
mod error;
pub mod guard;
mod moves;
mod mutation;
mod node;
mod path;
pub mod resolver;
mod structure;
mod traits;

pub use annotate::{
    annotate, node_paths, summarize, AnnotatedNode, AnnotatedStructure, Summary, SummaryNode,
    DEFAULT_SUMMARY_DEPTH,
};
pub use editor::{NodeTarget, StructureEditor};
pub use error::{EditError, StoreError, TreeError};
pub use guard::{count_nodes, GuardLimits, StructureGuard};
pub use moves::{reconcile_target, Relocation};
pub use mutation::{
    Insertion, MutationEngine, ParsePositionError, Position, Removal, Replacement,
};
pub use node::{ComponentNode, ElementNode, Node, TextNode};
pub use path::{NodePath, PathError, ROOT_TOKEN};
pub use resolver::{resolve, resolve_parent_container};
pub use structure::{RootShape, Structure, StructureId, StructureKind, MAX_NAME_LEN};
pub use traits::StructureStore;
