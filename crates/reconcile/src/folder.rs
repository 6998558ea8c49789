//! Local entity folder layout
//!
//! ```text
//! <folder>/definition.json   whole entity record
//! <folder>/files/<name>      one file per blob listed in `files`
//! <folder>/thumb             optional thumbnail
//! ```

use crate::error::{Error, Result};
use crate::record::Record;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Name of the definition file.
pub const DEFINITION_FILE: &str = "definition.json";

/// Directory holding file blobs.
pub const FILES_DIR: &str = "files";

/// Name of the thumbnail blob.
pub const THUMBNAIL_FILE: &str = "thumb";

/// A local folder holding one entity definition and its blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFolder {
    root: PathBuf,
}

impl LocalFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the folder layout with an empty definition.
    ///
    /// An existing definition is left untouched.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let folder = Self::new(root);
        let files_dir = folder.files_dir();
        fs::create_dir_all(&files_dir).map_err(|e| Error::io(&files_dir, e))?;

        let definition = folder.definition_path();
        if !definition.exists() {
            folder.save_definition(&Record::new())?;
            log::info!("Initialized {}", folder.root.display());
        }
        Ok(folder)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn definition_path(&self) -> PathBuf {
        self.root.join(DEFINITION_FILE)
    }

    pub fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        self.root.join(THUMBNAIL_FILE)
    }

    /// Path of a file blob.
    ///
    /// Names must be a single normal path component so a server-provided
    /// name can never point outside the folder.
    pub fn file_path(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.files_dir().join(name)),
            _ => Err(Error::InvalidName(name.to_string())),
        }
    }

    /// Check the folder and its definition file exist.
    pub fn ensure_exists(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::MissingFolder(self.root.clone()));
        }
        let definition = self.definition_path();
        if !definition.is_file() {
            return Err(Error::MissingDefinition(definition));
        }
        Ok(())
    }

    /// Read the definition file.
    pub fn load_definition(&self) -> Result<Record> {
        self.ensure_exists()?;
        let path = self.definition_path();
        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::InvalidDefinition {
            path,
            message: e.to_string(),
        })
    }

    /// Write the definition file, pretty-printed with field order preserved.
    pub fn save_definition(&self, record: &Record) -> Result<()> {
        let path = self.definition_path();
        let mut content = serde_json::to_string_pretty(record).map_err(|e| {
            Error::InvalidDefinition {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        content.push('\n');
        fs::write(&path, content).map_err(|e| Error::io(&path, e))?;
        log::debug!("Saved {}", path.display());
        Ok(())
    }

    /// Write a file blob from a stream.
    pub fn write_file(&self, name: &str, content: &mut dyn Read) -> Result<u64> {
        let path = self.file_path(name)?;
        let files_dir = self.files_dir();
        fs::create_dir_all(&files_dir).map_err(|e| Error::io(&files_dir, e))?;
        write_stream(&path, content)
    }

    /// Remove a file blob. Returns whether a file was removed.
    pub fn remove_file(&self, name: &str) -> Result<bool> {
        let path = self.file_path(name)?;
        remove_if_exists(&path)
    }

    /// Write the thumbnail from a stream.
    pub fn write_thumbnail(&self, content: &mut dyn Read) -> Result<u64> {
        write_stream(&self.thumbnail_path(), content)
    }

    /// Remove the thumbnail. Returns whether a file was removed.
    pub fn remove_thumbnail(&self) -> Result<bool> {
        remove_if_exists(&self.thumbnail_path())
    }
}

fn write_stream(path: &Path, content: &mut dyn Read) -> Result<u64> {
    let mut file = fs::File::create(path).map_err(|e| Error::io(path, e))?;
    let written = io::copy(content, &mut file).map_err(|e| Error::io(path, e))?;
    log::debug!("Wrote {} bytes to {}", written, path.display());
    Ok(written)
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}
