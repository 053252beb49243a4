use std::{fs, io, path};

use nodetree_core::{StoreError, Structure, StructureId, StructureKind, StructureStore};

use crate::json_utils;

const PAGES_DIR: &str = "pages";
const COMPONENTS_DIR: &str = "components";
const JSON_EXTENSION: &str = "json";

fn io_failure(action: &str, file_path: &path::Path, err: io::Error) -> StoreError {
    StoreError::Io {
        message: format!(
            "File path ({}) could not be accessed with error when {}: {}",
            file_path.display(),
            action,
            err
        ),
    }
}

/// An exclusive lock on one stored structure.
///
/// The lock is an OS advisory lock on a file next to the structure file. The
/// file stays on disk; the lock itself is released when this value is dropped
/// or when the holding process exits, so a crashed writer never leaves the
/// structure locked.
#[derive(Debug)]
pub struct LockFile {
    path: path::PathBuf,
    file: fs::File,
}

impl LockFile {
    /// Try to take the lock at `path` without blocking.
    pub fn acquire(path: path::PathBuf, id: &StructureId) -> Result<LockFile, StoreError> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| io_failure("opening lock file", &path, err))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(fs::TryLockError::WouldBlock) => {
                log::warn!("{} is locked ({})", id, path.display());
                return Err(StoreError::Locked { id: id.clone() });
            }
            Err(fs::TryLockError::Error(err)) => {
                return Err(io_failure("locking", &path, err));
            }
        }
        log::debug!("Locked {}", path.display());
        Ok(LockFile { path, file })
    }

    pub fn path(&self) -> &path::Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        match self.file.unlock() {
            Ok(()) => log::debug!("Unlocked {}", self.path.display()),
            Err(err) => log::warn!("Failed to unlock {}: {}", self.path.display(), err),
        }
    }
}

/// Stores each structure as one pretty-printed JSON file under a root
/// directory:
///
/// ```text
/// <root>/pages/<name>.json
/// <root>/components/<name>.json
/// <root>/menu.json
/// <root>/footer.json
/// ```
///
/// Saves write a temporary sibling file and rename it over the old one, so
/// readers see either the previous or the new structure, never a mix.
pub struct JsonFileStore {
    root: path::PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at an existing, writable directory.
    pub fn new(root: path::PathBuf) -> Result<JsonFileStore, StoreError> {
        let attr = fs::metadata(&root).map_err(|err| io_failure("opening store root", &root, err))?;

        if !attr.is_dir() {
            return Err(io_failure(
                "opening store root",
                &root,
                io::Error::other("Root path must be a directory."),
            ));
        }

        if attr.permissions().readonly() {
            return Err(io_failure(
                "opening store root",
                &root,
                io::Error::other("Root directory must be writable"),
            ));
        }

        match root.canonicalize() {
            Ok(root) => Ok(JsonFileStore { root }),
            Err(err) => Err(io_failure("resolving store root", &root, err)),
        }
    }

    /// Open a store, creating the root directory first if needed.
    pub fn open_or_create(root: path::PathBuf) -> Result<JsonFileStore, StoreError> {
        fs::create_dir_all(&root).map_err(|err| io_failure("creating store root", &root, err))?;
        Self::new(root)
    }

    pub fn root(&self) -> &path::Path {
        &self.root
    }

    /// The file a structure is stored in.
    pub fn file_path(&self, id: &StructureId) -> path::PathBuf {
        match id {
            StructureId::Page(name) => self
                .root
                .join(PAGES_DIR)
                .join(name)
                .with_extension(JSON_EXTENSION),
            StructureId::Component(name) => self
                .root
                .join(COMPONENTS_DIR)
                .join(name)
                .with_extension(JSON_EXTENSION),
            StructureId::Menu => self.root.join("menu").with_extension(JSON_EXTENSION),
            StructureId::Footer => self.root.join("footer").with_extension(JSON_EXTENSION),
        }
    }

    /// A hidden sibling of the structure file: `.<stem>.<suffix>`.
    fn sibling_path(&self, id: &StructureId, suffix: &str) -> path::PathBuf {
        let file_path = self.file_path(id);
        let stem = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        file_path.with_file_name(format!(".{}.{}", stem, suffix))
    }

    pub fn lock_path(&self, id: &StructureId) -> path::PathBuf {
        self.sibling_path(id, "lock")
    }

    fn ensure_parent(&self, file_path: &path::Path) -> Result<(), StoreError> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| io_failure("creating directory", parent, err))?;
        }
        Ok(())
    }

    /// Ids of the stored structures of `kind`.
    ///
    /// Pages and components are listed from their directories in name order;
    /// files whose names are not valid structure names are skipped. Menu and
    /// footer are listed when their file exists.
    pub fn list(&self, kind: StructureKind) -> Result<Vec<StructureId>, StoreError> {
        let dir = match kind {
            StructureKind::Page => self.root.join(PAGES_DIR),
            StructureKind::Component => self.root.join(COMPONENTS_DIR),
            StructureKind::Menu | StructureKind::Footer => {
                let id = if kind == StructureKind::Menu {
                    StructureId::Menu
                } else {
                    StructureId::Footer
                };
                return Ok(if self.file_path(&id).is_file() {
                    vec![id]
                } else {
                    Vec::new()
                });
            }
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        log::debug!("Listing {}...", dir.display());
        let mut ids = Vec::new();
        for entry in walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| StoreError::Io {
                message: format!("Failed to list directory ({}): {}", dir.display(), err),
            })?;
            let file_path = entry.path();
            if !entry.file_type().is_file()
                || file_path.extension().and_then(|e| e.to_str()) != Some(JSON_EXTENSION)
            {
                continue;
            }
            let Some(name) = file_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id = match kind {
                StructureKind::Page => StructureId::page(name),
                _ => StructureId::component(name),
            };
            match id {
                Ok(id) => ids.push(id),
                Err(err) => log::debug!("Skipping {}: {}", file_path.display(), err),
            }
        }
        Ok(ids)
    }
}

impl StructureStore for JsonFileStore {
    type Lock = LockFile;

    fn lock(&mut self, id: &StructureId) -> Result<LockFile, StoreError> {
        let lock_path = self.lock_path(id);
        self.ensure_parent(&lock_path)?;
        LockFile::acquire(lock_path, id)
    }

    fn load(&mut self, id: &StructureId) -> Result<Option<Structure>, StoreError> {
        let file_path = self.file_path(id);
        log::debug!("Reading {}...", file_path.display());

        let bytes = match fs::read(&file_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_failure("reading structure", &file_path, err)),
        };
        json_utils::decode_structure(id, &bytes).map(Some)
    }

    fn save(&mut self, id: &StructureId, structure: &Structure) -> Result<(), StoreError> {
        use io::Write;

        let file_path = self.file_path(id);
        let temp_path = self.sibling_path(id, "json.tmp");
        let bytes = json_utils::encode_structure(id, structure)?;
        self.ensure_parent(&file_path)?;

        log::debug!("Writing {}...", file_path.display());
        let write_temp = || -> io::Result<()> {
            let mut f = fs::File::create(&temp_path)?;
            f.write_all(&bytes)?;
            f.sync_all()
        };
        if let Err(err) = write_temp() {
            let _ = fs::remove_file(&temp_path);
            return Err(io_failure("writing temporary file", &temp_path, err));
        }

        fs::rename(&temp_path, &file_path).map_err(|err| {
            let _ = fs::remove_file(&temp_path);
            io_failure("replacing structure file", &file_path, err)
        })
    }
}
