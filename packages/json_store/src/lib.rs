//! Structure stores for NodeTree.
//!
//! - [`InMemoryStore`] keeps structures in a map, for tests and embedding.
//! - [`JsonFileStore`] keeps one JSON file per structure under a root
//!   directory, with lock files and atomic replace-on-save.

pub mod in_memory;
pub mod json_utils;
pub mod local_disk;

pub use in_memory::InMemoryStore;
pub use local_disk::{JsonFileStore, LockFile};
