//! The structure store seam.

use crate::error::StoreError;
use crate::structure::{Structure, StructureId};

/// Whole-structure persistence.
///
/// A store reads and writes complete structures; it never sees partial
/// updates. Mutating callers take [`lock`](Self::lock) first and hold the
/// guard across their load, edit and save so concurrent writers cannot
/// interleave.
pub trait StructureStore {
    /// Exclusive write access to one structure, released on drop.
    type Lock;

    /// Acquire the write lock for `id` without blocking.
    ///
    /// # Errors
    ///
    /// [`StoreError::Locked`] when another writer holds it.
    fn lock(&mut self, id: &StructureId) -> Result<Self::Lock, StoreError>;

    /// Load a structure.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - No structure is stored under `id`.
    /// * `Ok(Some(structure))` - The stored structure.
    /// * `Err(StoreError)` - The structure could not be read or decoded.
    fn load(&mut self, id: &StructureId) -> Result<Option<Structure>, StoreError>;

    /// Replace the stored structure for `id`.
    fn save(&mut self, id: &StructureId, structure: &Structure) -> Result<(), StoreError>;
}

impl<T: StructureStore + ?Sized> StructureStore for &mut T {
    type Lock = T::Lock;

    fn lock(&mut self, id: &StructureId) -> Result<Self::Lock, StoreError> {
        (**self).lock(id)
    }

    fn load(&mut self, id: &StructureId) -> Result<Option<Structure>, StoreError> {
        (**self).load(id)
    }

    fn save(&mut self, id: &StructureId, structure: &Structure) -> Result<(), StoreError> {
        (**self).save(id, structure)
    }
}

impl<T: StructureStore + ?Sized> StructureStore for Box<T> {
    type Lock = T::Lock;

    fn lock(&mut self, id: &StructureId) -> Result<Self::Lock, StoreError> {
        (**self).lock(id)
    }

    fn load(&mut self, id: &StructureId) -> Result<Option<Structure>, StoreError> {
        (**self).load(id)
    }

    fn save(&mut self, id: &StructureId, structure: &Structure) -> Result<(), StoreError> {
        (**self).save(id, structure)
    }
}
