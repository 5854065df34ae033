// On-disk layout - maps (collection, resource) keys to paths under the root

use crate::error::{FolioError, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Extension carried by every stored record.
pub const RECORD_EXTENSION: &str = "json";

/// Suffix of the sibling file a write goes through before it is renamed into place.
pub const TEMP_SUFFIX: &str = ".tmp";

/// What a (collection, resource) key currently refers to on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Missing,
    Directory(PathBuf),
    Record(PathBuf),
}

/// Path arithmetic for a database root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Layout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<collection>`
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    /// `<root>/<collection>/<resource>.json`, whether or not the caller
    /// already included the extension.
    pub fn record_path(&self, collection: &str, resource: &str) -> PathBuf {
        let name = strip_extension(resource);
        self.collection_dir(collection)
            .join(format!("{name}.{RECORD_EXTENSION}"))
    }

    /// `<root>/<collection>/<resource>.json.tmp`
    pub fn temp_path(&self, collection: &str, resource: &str) -> PathBuf {
        let mut path = self.record_path(collection, resource).into_os_string();
        path.push(TEMP_SUFFIX);
        PathBuf::from(path)
    }

    /// Classify what the key points at. An empty resource addresses the
    /// collection directory itself.
    ///
    /// The bare path is checked as a directory first, then `<bare>.json`
    /// as a record. A plain file without the extension is not a record.
    pub fn resolve(&self, collection: &str, resource: &str) -> Result<Entry> {
        let dir = self.collection_dir(collection);
        let name = strip_extension(resource);
        if name.is_empty() {
            return Ok(match file_type(&dir)? {
                Some(ft) if ft.is_dir() => Entry::Directory(dir),
                _ => Entry::Missing,
            });
        }

        let bare = dir.join(name);
        if let Some(ft) = file_type(&bare)? {
            if ft.is_dir() {
                return Ok(Entry::Directory(bare));
            }
        }

        let record = self.record_path(collection, name);
        match file_type(&record)? {
            Some(ft) if ft.is_file() => Ok(Entry::Record(record)),
            _ => Ok(Entry::Missing),
        }
    }
}

/// Reject names that are empty or would address something outside the root.
/// Nested names such as `archive/2024` are allowed, but only in one spelling:
/// trailing or repeated separators are rejected so every collection maps to
/// exactly one lock.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FolioError::InvalidArgument(format!("missing {kind} name")));
    }
    let mut segments = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy()),
            _ => {
                return Err(FolioError::InvalidArgument(format!(
                    "{kind} name '{name}' must be a relative path without '.' or '..'"
                )))
            }
        }
    }
    if segments.join("/") != name {
        return Err(FolioError::InvalidArgument(format!(
            "{kind} name '{name}' must not contain empty segments"
        )));
    }
    Ok(())
}

/// Like [`validate_name`], and the name must still be non-empty once the
/// record extension is stripped (`.json` or `archive/.json` address nothing).
pub fn validate_resource(name: &str) -> Result<()> {
    validate_name("resource", name)?;
    let stem = strip_extension(name);
    if stem.is_empty() || stem.ends_with('/') {
        return Err(FolioError::InvalidArgument(format!(
            "resource name '{name}' has nothing before the extension"
        )));
    }
    Ok(())
}

/// Display form of a key, used in `NotFound` errors.
pub fn display_key(collection: &str, resource: &str) -> String {
    if resource.is_empty() {
        collection.to_string()
    } else {
        format!("{collection}/{resource}")
    }
}

fn strip_extension(resource: &str) -> &str {
    resource
        .strip_suffix(".json")
        .unwrap_or(resource)
}

fn file_type(path: &Path) -> Result<Option<fs::FileType>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.file_type())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> (TempDir, Layout) {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        (tmp, layout)
    }

    #[test]
    fn test_record_and_temp_paths() {
        let layout = Layout::new("/db");
        assert_eq!(layout.record_path("users", "john"), Path::new("/db/users/john.json"));
        assert_eq!(layout.record_path("users", "john.json"), Path::new("/db/users/john.json"));
        assert_eq!(layout.temp_path("users", "john"), Path::new("/db/users/john.json.tmp"));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("collection", "users").is_ok());
        assert!(validate_name("resource", "archive/2024").is_ok());
        for bad in ["", "..", "../etc", "/abs", "./users", "a/../b", "users/", "users//", "a//b"] {
            assert!(
                matches!(validate_name("collection", bad), Err(FolioError::InvalidArgument(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_resource_needs_a_stem() {
        assert!(validate_resource("john").is_ok());
        assert!(validate_resource("john.json").is_ok());
        assert!(validate_resource("archive/2024.json").is_ok());
        for bad in ["", ".json", "archive/.json", "john/"] {
            assert!(
                matches!(validate_resource(bad), Err(FolioError::InvalidArgument(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_missing() {
        let (_tmp, layout) = layout();
        assert_eq!(layout.resolve("users", "john").unwrap(), Entry::Missing);
        assert_eq!(layout.resolve("users", "").unwrap(), Entry::Missing);
    }

    #[test]
    fn test_resolve_record_by_either_name() {
        let (tmp, layout) = layout();
        fs::create_dir_all(tmp.path().join("users")).unwrap();
        fs::write(tmp.path().join("users/john.json"), "{}\n").unwrap();

        let expected = Entry::Record(tmp.path().join("users/john.json"));
        assert_eq!(layout.resolve("users", "john").unwrap(), expected);
        assert_eq!(layout.resolve("users", "john.json").unwrap(), expected);
    }

    #[test]
    fn test_resolve_directories() {
        let (tmp, layout) = layout();
        fs::create_dir_all(tmp.path().join("users/archive")).unwrap();

        assert_eq!(
            layout.resolve("users", "").unwrap(),
            Entry::Directory(tmp.path().join("users"))
        );
        assert_eq!(
            layout.resolve("users", "archive").unwrap(),
            Entry::Directory(tmp.path().join("users/archive"))
        );
    }

    #[test]
    fn test_resolve_ignores_files_without_extension() {
        let (tmp, layout) = layout();
        fs::create_dir_all(tmp.path().join("users")).unwrap();
        fs::write(tmp.path().join("users/notes"), "{}").unwrap();

        assert_eq!(layout.resolve("users", "notes").unwrap(), Entry::Missing);
    }

    #[test]
    fn test_display_key() {
        assert_eq!(display_key("users", ""), "users");
        assert_eq!(display_key("users", "john"), "users/john");
    }
}
