// shardgraph-store/src/file_database.rs
// ============================================================================
// Module: File Database
// Description: Directory-rooted, content-addressed Database implementation.
// Purpose: Persist and reload spilled evaluation results across process
//          runs, sandboxed to a configured root directory.
// Dependencies: cap-std, cap-primitives, serde_json, shardgraph-core
// ============================================================================

//! ## Overview
//! [`FileDatabase`] lays out its root directory as an `index` file (a
//! JSON-serialized `BTreeMap<HashDigest, String>` mapping each key to its
//! on-disk filename) plus a `data/` subdirectory holding one file per
//! entry, named by the key's hex digest value. Every write goes through a
//! temporary sibling file and an atomic rename, and the index is rewritten
//! the same way, so a crash mid-write never leaves a half-written entry
//! visible.
//!
//! Grounded on `decision-gate-broker/src/source/file.rs`'s capability-based
//! path handling and `decision-gate-contract/src/contract.rs`'s
//! temp-file-then-rename write pattern: both open directories via
//! `cap_std::fs::Dir::open_ambient_dir` and refuse to follow symlinks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write as _;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;

use shardgraph_core::Database;
use shardgraph_core::DatabaseError;
use shardgraph_core::Payload;
use shardgraph_core::hashing::HashDigest;

// ============================================================================
// SECTION: FileDatabase
// ============================================================================

/// The name of the subdirectory holding one file per stored entry.
const DATA_DIR_NAME: &str = "data";

/// The name of the index file mapping keys to on-disk filenames.
const INDEX_FILE_NAME: &str = "index";

/// A directory-rooted, content-addressed [`Database`].
#[derive(Debug)]
pub struct FileDatabase {
    /// Configured root directory, resolved to an absolute path on open.
    root_path: PathBuf,
    /// Capability handle to the root directory, present only while open.
    root: Option<Dir>,
    /// Capability handle to `root/data`, present only while open.
    data_dir: Option<Dir>,
    /// In-memory mirror of the on-disk index, loaded on open and kept in
    /// sync with every write.
    index: BTreeMap<HashDigest, String>,
}

impl FileDatabase {
    /// Builds a store rooted at `root_path`. The directory need not exist
    /// yet; [`Database::open`] creates it.
    #[must_use]
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            root: None,
            data_dir: None,
            index: BTreeMap::new(),
        }
    }

    /// Returns every key currently persisted, in digest order.
    #[must_use]
    pub fn keys(&self) -> Vec<HashDigest> {
        self.index.keys().cloned().collect()
    }

    /// Returns the root directory handle, or an error if the store has not
    /// been opened.
    fn root(&self) -> Result<&Dir, DatabaseError> {
        self.root
            .as_ref()
            .ok_or_else(|| DatabaseError::DatabaseAccessError("store is not open".to_owned()))
    }

    /// Returns the data directory handle, or an error if the store has not
    /// been opened.
    fn data_dir(&self) -> Result<&Dir, DatabaseError> {
        self.data_dir
            .as_ref()
            .ok_or_else(|| DatabaseError::DatabaseAccessError("store is not open".to_owned()))
    }

    /// Filename a key's entry is stored under inside `data/`.
    fn entry_file_name(key: &HashDigest) -> String {
        key.value.clone()
    }

    /// Loads the on-disk index into memory, tolerating a missing file (a
    /// freshly created store has none yet).
    fn load_index(root: &Dir) -> Result<BTreeMap<HashDigest, String>, DatabaseError> {
        let mut options = OpenOptions::new();
        options.read(true);
        options._cap_fs_ext_follow(FollowSymlinks::No);
        let mut file = match root.open_with(Path::new(INDEX_FILE_NAME), &options) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(io_error(&err)),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|err| io_error(&err))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| DatabaseError::DatabaseAccessError(format!("corrupt index: {err}")))
    }

    /// Rewrites the index file atomically from the current in-memory map.
    fn save_index(&self) -> Result<(), DatabaseError> {
        let bytes = serde_json::to_vec_pretty(&self.index)
            .map_err(|err| DatabaseError::DatabaseAccessError(format!("cannot encode index: {err}")))?;
        write_file_atomic(self.root()?, Path::new(INDEX_FILE_NAME), &bytes)
    }
}

impl Database for FileDatabase {
    fn open(&mut self) -> Result<(), DatabaseError> {
        let root = open_rooted_dir(&self.root_path)?;
        let data_dir = open_or_create_child_dir(&root, Path::new(DATA_DIR_NAME))
            .map_err(|err| io_error(&err))?;
        self.index = Self::load_index(&root)?;
        self.root = Some(root);
        self.data_dir = Some(data_dir);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DatabaseError> {
        self.root = None;
        self.data_dir = None;
        Ok(())
    }

    fn save(&mut self, key: &HashDigest, payload: &Payload) -> Result<(), DatabaseError> {
        let file_name = Self::entry_file_name(key);
        let bytes = serde_json::to_vec(payload)
            .map_err(|err| DatabaseError::DatabaseAccessError(format!("cannot encode payload: {err}")))?;
        write_file_atomic(self.data_dir()?, Path::new(&file_name), &bytes)?;
        self.index.insert(key.clone(), file_name);
        self.save_index()
    }

    fn load(&mut self, key: &HashDigest) -> Result<Payload, DatabaseError> {
        let file_name = self
            .index
            .get(key)
            .cloned()
            .ok_or_else(|| DatabaseError::DataNotFound(key.clone()))?;
        let mut options = OpenOptions::new();
        options.read(true);
        options._cap_fs_ext_follow(FollowSymlinks::No);
        let mut file = self
            .data_dir()?
            .open_with(Path::new(&file_name), &options)
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    DatabaseError::DataNotFound(key.clone())
                } else {
                    io_error(&err)
                }
            })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|err| io_error(&err))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| DatabaseError::DatabaseAccessError(format!("corrupt entry: {err}")))
    }

    fn delete(&mut self, key: &HashDigest) -> Result<(), DatabaseError> {
        if let Some(file_name) = self.index.remove(key) {
            match self.data_dir()?.remove_file(Path::new(&file_name)) {
                Ok(()) | Err(_) if !self.data_dir()?.exists(Path::new(&file_name)) => {}
                Err(err) => return Err(io_error(&err)),
            }
            self.save_index()?;
        }
        Ok(())
    }

    fn contains(&self, key: &HashDigest) -> bool {
        self.index.contains_key(key)
    }
}

// ============================================================================
// SECTION: Path and filesystem helpers
// ============================================================================

/// Opens (creating as needed) the capability-rooted directory named by
/// `root_path`, following every intermediate component without symlinks.
fn open_rooted_dir(root_path: &Path) -> Result<Dir, DatabaseError> {
    let normalized = normalize_path(root_path)?;
    let (anchor, components) = split_anchor_and_components(&normalized)?;
    let mut current =
        Dir::open_ambient_dir(&anchor, ambient_authority()).map_err(|err| io_error(&err))?;
    for component in components {
        current = open_or_create_child_dir(&current, Path::new(&component))
            .map_err(|err| io_error(&err))?;
    }
    Ok(current)
}

/// Resolves `path` into an absolute path, joining against the current
/// working directory if necessary.
fn normalize_path(path: &Path) -> Result<PathBuf, DatabaseError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir().map(|cwd| cwd.join(path)).map_err(|err| io_error(&err))
}

/// Splits an absolute path into its filesystem root and a flat list of
/// normal path components, rejecting `..` traversal.
fn split_anchor_and_components(path: &Path) -> Result<(PathBuf, Vec<OsString>), DatabaseError> {
    let mut anchor = PathBuf::new();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => anchor.push(component.as_os_str()),
            Component::CurDir => {}
            Component::Normal(value) => components.push(value.to_os_string()),
            Component::ParentDir => {
                return Err(DatabaseError::DatabaseAccessError(format!(
                    "store path contains a parent-directory component: {}",
                    path.display()
                )));
            }
        }
    }
    if anchor.as_os_str().is_empty() {
        return Err(DatabaseError::DatabaseAccessError(format!(
            "store path has no root: {}",
            path.display()
        )));
    }
    Ok((anchor, components))
}

/// Opens a child directory under `parent` without following symlinks,
/// creating it first if it does not exist.
fn open_or_create_child_dir(parent: &Dir, child: &Path) -> std::io::Result<Dir> {
    match open_child_dir_nofollow(parent, child) {
        Ok(dir) => Ok(dir),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            parent.create_dir(child)?;
            open_child_dir_nofollow(parent, child)
        }
        Err(err) => Err(err),
    }
}

/// Opens a child directory without following symlinks, verifying it is
/// actually a directory.
fn open_child_dir_nofollow(parent: &Dir, child: &Path) -> std::io::Result<Dir> {
    let mut options = OpenOptions::new();
    options.read(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    let file = parent.open_with(child, &options)?;
    let metadata = file.metadata()?;
    if !metadata.is_dir() {
        return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            "path component is not a directory",
        ));
    }
    Ok(Dir::from_std_file(file.into_std()))
}

/// Writes `bytes` to `file_name` inside `parent` via a temporary sibling
/// file and an atomic rename, so a reader never observes a partial write.
fn write_file_atomic(parent: &Dir, file_name: &Path, bytes: &[u8]) -> Result<(), DatabaseError> {
    for attempt in 0_u32..64 {
        let temp_name = temp_file_name(file_name, attempt);
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        options._cap_fs_ext_follow(FollowSymlinks::No);
        match parent.open_with(&temp_name, &options) {
            Ok(mut temp_file) => {
                if let Err(err) = temp_file.write_all(bytes) {
                    let _ = parent.remove_file(&temp_name);
                    return Err(io_error(&err));
                }
                if let Err(err) = temp_file.sync_all() {
                    let _ = parent.remove_file(&temp_name);
                    return Err(io_error(&err));
                }
                if let Err(err) = parent.rename(&temp_name, parent, file_name) {
                    let _ = parent.remove_file(&temp_name);
                    return Err(io_error(&err));
                }
                return Ok(());
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(io_error(&err)),
        }
    }
    Err(DatabaseError::DatabaseAccessError(
        "unable to allocate a temporary file for an atomic write".to_owned(),
    ))
}

/// Builds a temporary sibling filename for an atomic write attempt.
fn temp_file_name(file_name: &Path, attempt: u32) -> PathBuf {
    let mut temp = OsString::from(".tmp-");
    temp.push(file_name.as_os_str());
    temp.push(format!(".{}.{attempt}", std::process::id()));
    PathBuf::from(temp)
}

/// Wraps a raw IO error as a [`DatabaseError::DatabaseAccessError`].
fn io_error(err: &std::io::Error) -> DatabaseError {
    DatabaseError::DatabaseAccessError(err.to_string())
}
