//! In-memory entity for testing without a server.
//!
//! [`MockEntity`] behaves like the server on the points the engine relies on:
//! whole-entity updates leave sub-collection fields alone (those only change
//! through element create/delete), file content belongs to a listed file
//! element, and every mutating call is recorded in a journal so tests can
//! check the order of operations.
//!
//! ```
//! use reconcile::{Entity, MockEntity, SubCollection};
//! use serde_json::json;
//!
//! let mut entity = MockEntity::new("applications/1", json!({"name": "app1", "files": []}));
//! let file = json!({"name": "f1"}).as_object().unwrap().clone();
//! entity.create_element(SubCollection::Files, &file).unwrap();
//!
//! assert_eq!(entity.list(SubCollection::Files).unwrap().len(), 1);
//! assert_eq!(entity.journal(), ["create_element files f1"]);
//! ```

use crate::entity::{Blob, Entity};
use crate::error::{Error, Result};
use crate::record::{Record, SubCollection, into_record};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// In-memory [`Entity`].
#[derive(Debug, Clone, Default)]
pub struct MockEntity {
    address: String,
    record: Record,
    staged: Option<Record>,
    contents: BTreeMap<String, Vec<u8>>,
    thumbnail: Option<Vec<u8>>,
    journal: Vec<String>,
    fail_on: Option<String>,
    deleted: bool,
}

impl MockEntity {
    /// Create a mock entity holding `record`; non-object values give an empty record.
    pub fn new(address: impl Into<String>, record: Value) -> Self {
        Self {
            address: address.into(),
            record: into_record(record).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Current server-side record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Store file content without going through the journal.
    pub fn put_file_content(&mut self, name: impl Into<String>, content: &[u8]) {
        self.contents.insert(name.into(), content.to_vec());
    }

    /// Store a thumbnail without going through the journal.
    pub fn put_thumbnail(&mut self, content: &[u8]) {
        self.thumbnail = Some(content.to_vec());
    }

    pub fn stored_file_content(&self, name: &str) -> Option<&[u8]> {
        self.contents.get(name).map(Vec::as_slice)
    }

    pub fn stored_thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    /// Mutating calls made so far, e.g. `delete_element files f1`.
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Make every call of `operation` (e.g. `"set_file_content"`) fail with
    /// [`Error::RemoteRejected`].
    pub fn fail_on(&mut self, operation: impl Into<String>) {
        self.fail_on = Some(operation.into());
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn record_call(&mut self, operation: &str, detail: Option<&str>) -> Result<()> {
        let entry = match detail {
            Some(detail) => format!("{operation} {detail}"),
            None => operation.to_string(),
        };
        if self.fail_on.as_deref() == Some(operation) {
            return Err(Error::rejected(format!("{entry} refused"), Some(403)));
        }
        self.journal.push(entry);
        Ok(())
    }

    fn push_element(&mut self, collection: SubCollection, element: Value) {
        let slot = self
            .record
            .entry(collection.field())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => items.push(element),
            other => *other = Value::Array(vec![element]),
        }
    }

    fn is_listed(&self, name: &str) -> bool {
        self.record
            .get(SubCollection::Files.field())
            .is_some_and(|value| SubCollection::Files.keys(value).iter().any(|n| n == name))
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.deleted {
            return Err(Error::NotFound(self.address.clone()));
        }
        Ok(())
    }
}

impl Entity for MockEntity {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn get_json(&self) -> Result<Record> {
        self.ensure_exists()?;
        Ok(self.record.clone())
    }

    fn set_json(&mut self, record: Record) {
        self.staged = Some(record);
    }

    fn update(&mut self) -> Result<()> {
        self.ensure_exists()?;
        self.record_call("update", None)?;
        let Some(mut next) = self.staged.take() else {
            return Ok(());
        };
        // Sub-collections only change through their own endpoints.
        for collection in SubCollection::ALL {
            let field = collection.field();
            match self.record.get(field) {
                Some(current) => {
                    next.insert(field.to_string(), current.clone());
                }
                None => {
                    next.shift_remove(field);
                }
            }
        }
        self.record = next;
        Ok(())
    }

    fn create(&mut self) -> Result<()> {
        self.record_call("create", None)?;
        self.record = self.staged.take().unwrap_or_default();
        self.deleted = false;
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.ensure_exists()?;
        self.record_call("delete", None)?;
        self.record.clear();
        self.contents.clear();
        self.thumbnail = None;
        self.deleted = true;
        Ok(())
    }

    fn list(&self, collection: SubCollection) -> Result<Vec<Record>> {
        self.ensure_exists()?;
        Ok(match self.record.get(collection.field()) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .cloned()
                .collect(),
            _ => Vec::new(),
        })
    }

    fn create_element(&mut self, collection: SubCollection, element: &Record) -> Result<()> {
        self.ensure_exists()?;
        let key = collection.element_key(element).ok_or_else(|| {
            Error::rejected(
                format!("{} element without {}", collection, collection.key_field()),
                Some(422),
            )
        })?;
        let exists = self
            .list(collection)?
            .iter()
            .any(|e| collection.element_key(e).as_deref() == Some(key.as_str()));
        if exists {
            return Err(Error::rejected(
                format!("{collection} element {key} already exists"),
                Some(409),
            ));
        }
        self.record_call("create_element", Some(&format!("{collection} {key}")))?;
        self.push_element(collection, Value::Object(element.clone()));
        Ok(())
    }

    fn delete_element(&mut self, collection: SubCollection, key: &str) -> Result<()> {
        self.ensure_exists()?;
        let position = match self.record.get(collection.field()) {
            Some(Value::Array(items)) => items.iter().position(|item| {
                item.as_object()
                    .and_then(|element| collection.element_key(element))
                    .as_deref()
                    == Some(key)
            }),
            _ => None,
        }
        .ok_or_else(|| Error::NotFound(format!("{collection} element {key}")))?;
        self.record_call("delete_element", Some(&format!("{collection} {key}")))?;
        if let Some(Value::Array(items)) = self.record.get_mut(collection.field()) {
            items.remove(position);
        }
        if collection == SubCollection::Files {
            self.contents.remove(key);
        }
        Ok(())
    }

    fn file_content(&self, name: &str) -> Result<Blob<'_>> {
        self.ensure_exists()?;
        if !self.is_listed(name) {
            return Err(Error::NotFound(format!("file {} on {}", name, self.address)));
        }
        let content = self.contents.get(name).cloned().unwrap_or_default();
        Ok(Box::new(Cursor::new(content)))
    }

    fn set_file_content(&mut self, name: &str, path: &Path) -> Result<()> {
        self.ensure_exists()?;
        if !self.is_listed(name) {
            return Err(Error::NotFound(format!("file {} on {}", name, self.address)));
        }
        let content = fs::read(path).map_err(|e| Error::content_read(name, e))?;
        self.record_call("set_file_content", Some(name))?;
        self.contents.insert(name.to_string(), content);
        Ok(())
    }

    fn has_thumbnail(&self) -> Result<bool> {
        self.ensure_exists()?;
        Ok(self.thumbnail.is_some())
    }

    fn thumbnail_content(&self) -> Result<Blob<'_>> {
        self.ensure_exists()?;
        match &self.thumbnail {
            Some(content) => Ok(Box::new(Cursor::new(content.clone()))),
            None => Err(Error::NotFound(format!("thumbnail on {}", self.address))),
        }
    }

    fn set_thumbnail_content(&mut self, path: &Path) -> Result<()> {
        self.ensure_exists()?;
        let content = fs::read(path).map_err(|e| Error::content_read("thumb", e))?;
        self.record_call("set_thumbnail_content", None)?;
        self.thumbnail = Some(content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Read;
    use tempfile::TempDir;

    fn obj(value: Value) -> Record {
        into_record(value).unwrap()
    }

    #[test]
    fn test_update_ignores_sub_collection_fields() {
        let mut entity = MockEntity::new(
            "hosts/7",
            json!({"name": "h", "settings": [{"key": "a"}]}),
        );
        entity.set_json(obj(json!({"name": "h2", "settings": [], "files": [{"name": "x"}]})));
        entity.update().unwrap();

        assert_eq!(entity.record().get("name"), Some(&json!("h2")));
        assert_eq!(entity.record().get("settings"), Some(&json!([{"key": "a"}])));
        assert!(entity.record().get("files").is_none());
    }

    #[test]
    fn test_element_lifecycle() {
        let mut entity = MockEntity::new("applications/1", json!({"files": []}));
        entity
            .create_element(SubCollection::Files, &obj(json!({"name": "f1"})))
            .unwrap();
        assert!(entity
            .create_element(SubCollection::Files, &obj(json!({"name": "f1"})))
            .is_err());
        assert!(entity
            .create_element(SubCollection::Files, &obj(json!({"size": 1})))
            .is_err());

        entity.put_file_content("f1", b"x");
        entity.delete_element(SubCollection::Files, "f1").unwrap();
        assert!(entity.stored_file_content("f1").is_none());
        assert!(matches!(
            entity.delete_element(SubCollection::Files, "f1"),
            Err(Error::NotFound(_))
        ));
        assert_eq!(
            entity.journal(),
            ["create_element files f1", "delete_element files f1"]
        );
    }

    #[test]
    fn test_file_content_requires_listing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f1");
        fs::write(&path, "hello").unwrap();

        let mut entity = MockEntity::new("applications/1", json!({"files": [{"name": "f1"}]}));
        assert!(entity.set_file_content("f2", &path).is_err());
        entity.set_file_content("f1", &path).unwrap();

        let mut content = String::new();
        entity
            .file_content("f1")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_fail_on_rejects_without_journaling() {
        let mut entity = MockEntity::new("applications/1", json!({}));
        entity.fail_on("update");
        entity.set_json(Record::new());
        assert!(matches!(
            entity.update(),
            Err(Error::RemoteRejected { status: Some(403), .. })
        ));
        assert!(entity.journal().is_empty());
    }

    #[test]
    fn test_delete_and_create() {
        let mut entity = MockEntity::new("platforms/3", json!({"name": "p"}));
        entity.delete().unwrap();
        assert!(entity.is_deleted());
        assert!(matches!(entity.get_json(), Err(Error::NotFound(_))));

        entity.set_json(obj(json!({"name": "p2"})));
        entity.create().unwrap();
        assert_eq!(entity.get_json().unwrap().get("name"), Some(&json!("p2")));
    }
}
