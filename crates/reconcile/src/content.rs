//! Content providers: blob existence and access on one side of a reconciliation
//!
//! The differ only needs to know whether a blob exists and, when both sides
//! have it, whether the bytes match. Providers answer `exists` without opening
//! anything, so comparing metadata never leaks handles.

use crate::entity::{Blob, Entity};
use crate::error::{Error, Result};
use crate::folder::{LocalFolder, THUMBNAIL_FILE};
use crate::record::{Record, file_names};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};

/// Blob access for one side of a reconciliation.
pub trait ContentProvider {
    /// Whether a file blob with this name is available.
    fn exists(&self, name: &str) -> bool;

    /// Whether a thumbnail is available.
    fn exists_thumbnail(&self) -> bool;

    /// Open a file blob. Fails with [`Error::NotFound`] if absent.
    fn open(&self, name: &str) -> Result<Blob<'_>>;

    /// Open the thumbnail. Fails with [`Error::NotFound`] if absent.
    fn open_thumbnail(&self) -> Result<Blob<'_>>;

    /// Release a stream returned by `open`/`open_thumbnail`.
    fn close(&self, stream: Blob<'_>) {
        drop(stream);
    }

    /// Read a whole file blob.
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let stream = self.open(name)?;
        read_all(self, stream, name)
    }

    /// Read the whole thumbnail.
    fn read_thumbnail(&self) -> Result<Vec<u8>> {
        let stream = self.open_thumbnail()?;
        read_all(self, stream, THUMBNAIL_FILE)
    }
}

fn read_all<P: ContentProvider + ?Sized>(
    provider: &P,
    mut stream: Blob<'_>,
    name: &str,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let read = stream.read_to_end(&mut buf);
    provider.close(stream);
    read.map_err(|e| Error::content_read(name, e))?;
    Ok(buf)
}

/// Whether two providers hold the same bytes for a file.
///
/// Both absent counts as equal; present on one side only does not.
pub fn same_file(a: &dyn ContentProvider, b: &dyn ContentProvider, name: &str) -> Result<bool> {
    match (a.exists(name), b.exists(name)) {
        (false, false) => Ok(true),
        (true, true) => Ok(a.read(name)? == b.read(name)?),
        _ => Ok(false),
    }
}

/// Whether two providers hold the same thumbnail.
pub fn same_thumbnail(a: &dyn ContentProvider, b: &dyn ContentProvider) -> Result<bool> {
    match (a.exists_thumbnail(), b.exists_thumbnail()) {
        (false, false) => Ok(true),
        (true, true) => Ok(a.read_thumbnail()? == b.read_thumbnail()?),
        _ => Ok(false),
    }
}

// ============================================================================
// Local folder
// ============================================================================

/// Blobs stored under a local entity folder.
#[derive(Debug, Clone, Copy)]
pub struct LocalContent<'a> {
    folder: &'a LocalFolder,
}

impl<'a> LocalContent<'a> {
    pub fn new(folder: &'a LocalFolder) -> Self {
        Self { folder }
    }
}

impl ContentProvider for LocalContent<'_> {
    fn exists(&self, name: &str) -> bool {
        self.folder
            .file_path(name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    fn exists_thumbnail(&self) -> bool {
        self.folder.thumbnail_path().is_file()
    }

    fn open(&self, name: &str) -> Result<Blob<'_>> {
        let path = self.folder.file_path(name)?;
        open_local(&path, name)
    }

    fn open_thumbnail(&self) -> Result<Blob<'_>> {
        open_local(&self.folder.thumbnail_path(), THUMBNAIL_FILE)
    }
}

fn open_local(path: &std::path::Path, name: &str) -> Result<Blob<'static>> {
    match File::open(path) {
        Ok(file) => Ok(Box::new(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(Error::NotFound(format!("local {}", path.display())))
        }
        Err(e) => Err(Error::content_read(name, e)),
    }
}

// ============================================================================
// Remote entity
// ============================================================================

/// Blobs held by a remote entity's file sub-collection.
///
/// File existence comes from the `files` listing of the record the provider
/// was built from; thumbnail existence is queried once at construction.
pub struct RemoteContent<'a> {
    entity: &'a dyn Entity,
    names: BTreeSet<String>,
    thumbnail: bool,
}

impl<'a> RemoteContent<'a> {
    pub fn new(entity: &'a dyn Entity, record: &Record) -> Result<Self> {
        Ok(Self {
            entity,
            names: file_names(record).into_iter().collect(),
            thumbnail: entity.has_thumbnail()?,
        })
    }
}

impl ContentProvider for RemoteContent<'_> {
    fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn exists_thumbnail(&self) -> bool {
        self.thumbnail
    }

    fn open(&self, name: &str) -> Result<Blob<'_>> {
        if !self.exists(name) {
            return Err(Error::NotFound(format!(
                "file {} on {}",
                name,
                self.entity.address()
            )));
        }
        self.entity.file_content(name)
    }

    fn open_thumbnail(&self) -> Result<Blob<'_>> {
        if !self.thumbnail {
            return Err(Error::NotFound(format!(
                "thumbnail on {}",
                self.entity.address()
            )));
        }
        self.entity.thumbnail_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEntity;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn local_with(files: &[(&str, &str)]) -> (TempDir, LocalFolder) {
        let tmp = TempDir::new().unwrap();
        let folder = LocalFolder::init(tmp.path()).unwrap();
        for (name, content) in files {
            fs::write(folder.files_dir().join(name), content).unwrap();
        }
        (tmp, folder)
    }

    #[test]
    fn test_local_exists_and_read() {
        let (_tmp, folder) = local_with(&[("f1", "hello")]);
        let local = LocalContent::new(&folder);
        assert!(local.exists("f1"));
        assert!(!local.exists("f2"));
        assert!(!local.exists("../definition.json"));
        assert_eq!(local.read("f1").unwrap(), b"hello");
    }

    #[test]
    fn test_local_open_missing_is_not_found() {
        let (_tmp, folder) = local_with(&[]);
        let local = LocalContent::new(&folder);
        assert!(matches!(local.open("f1"), Err(Error::NotFound(_))));
        assert!(matches!(local.open_thumbnail(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remote_exists_follows_listing() {
        let mut entity = MockEntity::new("applications/1", json!({"files": [{"name": "f1"}]}));
        entity.put_file_content("f1", b"hello");
        let record = entity.get_json().unwrap();

        let remote = RemoteContent::new(&entity, &record).unwrap();
        assert!(remote.exists("f1"));
        assert!(!remote.exists("f2"));
        assert!(!remote.exists_thumbnail());
        assert_eq!(remote.read("f1").unwrap(), b"hello");
        assert!(matches!(remote.open("f2"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_same_file() {
        let (_tmp, folder) = local_with(&[("f1", "hello"), ("f2", "one")]);
        let mut entity = MockEntity::new(
            "applications/1",
            json!({"files": [{"name": "f1"}, {"name": "f2"}, {"name": "f3"}]}),
        );
        entity.put_file_content("f1", b"hello");
        entity.put_file_content("f2", b"two");
        entity.put_file_content("f3", b"three");
        let record = entity.get_json().unwrap();

        let local = LocalContent::new(&folder);
        let remote = RemoteContent::new(&entity, &record).unwrap();
        assert!(same_file(&local, &remote, "f1").unwrap());
        assert!(!same_file(&local, &remote, "f2").unwrap());
        assert!(!same_file(&local, &remote, "f3").unwrap());
        assert!(same_file(&local, &remote, "absent").unwrap());
    }

    #[test]
    fn test_same_thumbnail() {
        let (_tmp, folder) = local_with(&[]);
        let mut entity = MockEntity::new("applications/1", json!({}));
        let local = LocalContent::new(&folder);

        {
            let record = entity.get_json().unwrap();
            let remote = RemoteContent::new(&entity, &record).unwrap();
            assert!(same_thumbnail(&local, &remote).unwrap());
        }

        fs::write(folder.thumbnail_path(), b"png").unwrap();
        entity.put_thumbnail(b"png");
        let record = entity.get_json().unwrap();
        let remote = RemoteContent::new(&entity, &record).unwrap();
        assert!(same_thumbnail(&local, &remote).unwrap());
    }
}
