//! In-memory structure store.

use std::collections::BTreeMap;

use nodetree_core::{StoreError, Structure, StructureId, StructureKind, StructureStore};

/// A store that keeps structures in a map.
///
/// Locking is a no-op: the store is owned by a single editor, so there is no
/// other writer to exclude.
///
/// # Example
///
/// ```rust
/// use nodetree_core::{MutationEngine, Node, Position, Structure, StructureEditor, StructureId};
/// use nodetree_json_store::InMemoryStore;
///
/// let mut store = InMemoryStore::new();
/// store.insert(StructureId::Menu, Structure::ArrayRoot(vec![Node::element("a")]));
///
/// let mut editor = StructureEditor::new(store, MutationEngine::default());
/// editor
///     .add_node(&StructureId::Menu, "0", Node::element("b"), Position::After)
///     .unwrap();
/// assert_eq!(editor.structure(&StructureId::Menu).unwrap().top_level().len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    structures: BTreeMap<StructureId, Structure>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `structures`.
    pub fn with_structures<I>(structures: I) -> Self
    where
        I: IntoIterator<Item = (StructureId, Structure)>,
    {
        Self {
            structures: structures.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, id: StructureId, structure: Structure) -> Option<Structure> {
        self.structures.insert(id, structure)
    }

    pub fn get(&self, id: &StructureId) -> Option<&Structure> {
        self.structures.get(id)
    }

    pub fn remove(&mut self, id: &StructureId) -> Option<Structure> {
        self.structures.remove(id)
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Ids of the stored structures of `kind`, in order.
    pub fn list(&self, kind: StructureKind) -> Vec<StructureId> {
        self.structures
            .keys()
            .filter(|id| id.kind() == kind)
            .cloned()
            .collect()
    }
}

impl StructureStore for InMemoryStore {
    type Lock = ();

    fn lock(&mut self, _id: &StructureId) -> Result<(), StoreError> {
        Ok(())
    }

    fn load(&mut self, id: &StructureId) -> Result<Option<Structure>, StoreError> {
        Ok(self.structures.get(id).cloned())
    }

    fn save(&mut self, id: &StructureId, structure: &Structure) -> Result<(), StoreError> {
        self.structures.insert(id.clone(), structure.clone());
        Ok(())
    }
}
