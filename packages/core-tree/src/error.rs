//! Error types for the tree engine, the store seam and the editor front door.

use crate::path::{NodePath, PathError};
use crate::structure::StructureId;

/// Failures of a tree operation.
///
/// Every engine operation returns one of these instead of panicking; the
/// input structure is never partially modified when one is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("{0}")]
    InvalidPathFormat(#[from] PathError),

    #[error("no node at path {path}")]
    TargetNotFound { path: NodePath },

    #[error("no source node at path {path}")]
    SourceNotFound { path: NodePath },

    #[error("node at {path} is component '{component}', which cannot hold children")]
    AtomicNodeViolation { path: NodePath, component: String },

    #[error("node at {path} is a text node, which cannot hold children")]
    TextNodeViolation { path: NodePath },

    #[error("cannot move {moved} into its own subtree at {target}")]
    CyclicMove { moved: NodePath, target: NodePath },

    #[error("source and target are both {path}")]
    NoOpMove { path: NodePath },

    #[error("structure has {count} nodes, more than the limit of {max}")]
    NodeCountExceeded { count: usize, max: usize },

    #[error("structure nests {depth} levels deep, more than the limit of {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("tag '{tag}' is not allowed")]
    BlockedTag { tag: String },

    #[error("attribute '{attribute}' uses the reserved prefix '{prefix}'")]
    ReservedAttribute { attribute: String, prefix: String },

    #[error("internal error: move target {target} no longer resolves after removing the source")]
    TargetLostOnRemoval { target: NodePath },
}

impl TreeError {
    /// Stable identifier for the error kind, for command layers that map
    /// errors to user-facing responses.
    pub fn code(&self) -> &'static str {
        match self {
            TreeError::InvalidPathFormat(_) => "path.invalid",
            TreeError::TargetNotFound { .. } => "node.not_found",
            TreeError::SourceNotFound { .. } => "node.source_not_found",
            TreeError::AtomicNodeViolation { .. } => "node.atomic",
            TreeError::TextNodeViolation { .. } => "node.text",
            TreeError::CyclicMove { .. } => "move.cyclic",
            TreeError::NoOpMove { .. } => "move.noop",
            TreeError::NodeCountExceeded { .. } => "validation.node_count",
            TreeError::DepthExceeded { .. } => "validation.depth",
            TreeError::BlockedTag { .. } => "validation.blocked_tag",
            TreeError::ReservedAttribute { .. } => "validation.reserved_attribute",
            TreeError::TargetLostOnRemoval { .. } => "internal.target_lost",
        }
    }

    /// True for faults in the engine's own bookkeeping rather than in the
    /// caller's input.
    pub fn is_internal(&self) -> bool {
        matches!(self, TreeError::TargetLostOnRemoval { .. })
    }
}

/// Failures of a [`StructureStore`](crate::StructureStore).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid structure id '{id}': {message}")]
    InvalidId { id: String, message: String },

    #[error("structure {id} is locked by another writer")]
    Locked { id: StructureId },

    #[error("An error occurred while decoding structure {id}: {message}")]
    Decode { id: StructureId, message: String },

    #[error("An error occurred while encoding structure {id}: {message}")]
    Encode { id: StructureId, message: String },

    #[error("An I/O error occurred: {message}")]
    Io { message: String },
}

/// Failures surfaced by [`StructureEditor`](crate::StructureEditor).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("structure {id} does not exist")]
    StructureNotFound { id: StructureId },

    #[error("structure {id} has an array root; the 'root' target only applies to object roots")]
    RootTargetUnsupported { id: StructureId },
}

impl From<PathError> for EditError {
    fn from(e: PathError) -> Self {
        EditError::Tree(TreeError::InvalidPathFormat(e))
    }
}

impl EditError {
    pub fn code(&self) -> &'static str {
        match self {
            EditError::Tree(e) => e.code(),
            EditError::Store(StoreError::InvalidId { .. }) => "store.invalid_id",
            EditError::Store(StoreError::Locked { .. }) => "store.locked",
            EditError::Store(StoreError::Decode { .. }) => "store.decode",
            EditError::Store(StoreError::Encode { .. }) => "store.encode",
            EditError::Store(StoreError::Io { .. }) => "store.io",
            EditError::StructureNotFound { .. } => "structure.not_found",
            EditError::RootTargetUnsupported { .. } => "structure.root_target",
        }
    }
}
