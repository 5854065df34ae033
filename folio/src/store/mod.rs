use crate::document;
use crate::error::{FolioError, Result};
use crate::layout::{self, Entry, Layout, RECORD_EXTENSION};
use crate::lock::LockRegistry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filesystem permissions used when the store creates directories and records.
/// Only applied on unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            dir_mode: 0o755,
            file_mode: 0o644,
        }
    }
}

/// The main entry point for Folio.
/// Each collection is a directory under the root and each resource a
/// `<resource>.json` file inside it. Writes and deletes on a collection are
/// serialized by that collection's lock; reads take no lock and rely on
/// writes landing through a single rename.
#[derive(Debug)]
pub struct Store {
    layout: Layout,
    locks: LockRegistry,
    options: StoreOptions,
}

impl Store {
    /// Open a store rooted at `path`, creating the directory if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Open a store with explicit options.
    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let root = clean(path.as_ref());

        if root.is_dir() {
            log::debug!("Using '{}' (database already exists)", root.display());
        } else {
            log::debug!("Creating the database at '{}'", root.display());
            create_dir_all(&root, options.dir_mode)?;
        }

        Ok(Store {
            layout: Layout::new(root),
            locks: LockRegistry::new(),
            options,
        })
    }

    /// Get the root data directory path
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Store `value` as `<collection>/<resource>.json`, replacing any
    /// previous record. The new content becomes visible in one rename.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        resource: &str,
        value: &T,
    ) -> Result<()> {
        layout::validate_name("collection", collection)?;
        layout::validate_resource(resource)?;

        let bytes = document::encode(value)?;

        let lock = self.locks.lock_for(collection);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let final_path = self.layout.record_path(collection, resource);
        let tmp_path = self.layout.temp_path(collection, resource);

        if let Some(parent) = final_path.parent() {
            create_dir_all(parent, self.options.dir_mode)?;
        }

        self.write_temp(&tmp_path, &bytes)?;

        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                log::warn!(
                    "Failed to remove temp file {}: {cleanup}",
                    tmp_path.display()
                );
            }
            return Err(e.into());
        }

        log::debug!("Wrote {}", final_path.display());
        Ok(())
    }

    /// Read and deserialize a single record.
    pub fn read<T: DeserializeOwned>(&self, collection: &str, resource: &str) -> Result<T> {
        layout::validate_name("collection", collection)?;
        layout::validate_resource(resource)?;

        match self.layout.resolve(collection, resource)? {
            Entry::Record(path) => {
                let bytes = fs::read(&path)?;
                document::decode(&path, &bytes)
            }
            Entry::Missing | Entry::Directory(_) => Err(not_found(collection, resource)),
        }
    }

    /// Raw JSON text of every record in a collection, ordered by file name.
    /// Parsing is left to the caller, see [`document::decode_all`].
    /// Any unreadable record fails the whole call.
    pub fn read_all(&self, collection: &str) -> Result<Vec<String>> {
        let mut records = Vec::new();
        for path in self.record_files(collection)? {
            records.push(fs::read_to_string(&path)?);
        }
        Ok(records)
    }

    /// Resource names in a collection, in the same order as `read_all`.
    pub fn list(&self, collection: &str) -> Result<Vec<String>> {
        Ok(self
            .record_files(collection)?
            .iter()
            .filter_map(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .collect())
    }

    /// Whether a record exists for the key.
    pub fn exists(&self, collection: &str, resource: &str) -> Result<bool> {
        layout::validate_name("collection", collection)?;
        layout::validate_resource(resource)?;
        Ok(matches!(
            self.layout.resolve(collection, resource)?,
            Entry::Record(_)
        ))
    }

    /// Delete a record, a nested directory, or with an empty `resource`
    /// the whole collection.
    pub fn delete(&self, collection: &str, resource: &str) -> Result<()> {
        layout::validate_name("collection", collection)?;
        if !resource.is_empty() {
            layout::validate_resource(resource)?;
        }

        let lock = self.locks.lock_for(collection);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        match self.layout.resolve(collection, resource)? {
            Entry::Missing => Err(not_found(collection, resource)),
            Entry::Directory(dir) => {
                fs::remove_dir_all(&dir)?;
                log::debug!("Removed directory {}", dir.display());
                Ok(())
            }
            Entry::Record(path) => {
                fs::remove_file(&path)?;
                log::debug!("Removed {}", path.display());
                Ok(())
            }
        }
    }

    /// Record files of a collection sorted by name. Subdirectories and
    /// in-flight temp files are skipped.
    fn record_files(&self, collection: &str) -> Result<Vec<PathBuf>> {
        layout::validate_name("collection", collection)?;

        let dir = match self.layout.resolve(collection, "")? {
            Entry::Directory(dir) => dir,
            _ => return Err(not_found(collection, "")),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_record = path
                .extension()
                .map_or(false, |ext| ext == RECORD_EXTENSION);
            if is_record && entry.file_type()?.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn write_temp(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.options.file_mode);
        }

        let mut file = options.open(path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    }
}

fn not_found(collection: &str, resource: &str) -> FolioError {
    FolioError::NotFound {
        path: layout::display_key(collection, resource),
    }
}

/// Lexically normalize a root path: drop `.` segments and trailing separators.
fn clean(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

fn create_dir_all(path: &Path, mode: u32) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)?;
    Ok(())
}
