//! The remote entity contract consumed by the engine.
//!
//! The engine never talks HTTP itself. Anything that can read and write a
//! whole entity record, enumerate its sub-collections and move blob content
//! implements [`Entity`]; the `remote` crate provides the HTTP version and
//! [`crate::MockEntity`] an in-memory one.

use crate::error::Result;
use crate::record::{Record, SubCollection};
use std::io::Read;
use std::path::Path;

/// An open byte stream. Dropping it closes the underlying handle.
pub type Blob<'a> = Box<dyn Read + 'a>;

/// A server-side entity.
pub trait Entity {
    /// Human-readable address, e.g. `applications/42`.
    fn address(&self) -> String;

    /// Fetch the entity's current record.
    fn get_json(&self) -> Result<Record>;

    /// Stage a record to be sent by [`Entity::update`] or [`Entity::create`].
    fn set_json(&mut self, record: Record);

    /// Send the staged record as a whole-entity update.
    fn update(&mut self) -> Result<()>;

    /// Create the entity from the staged record.
    fn create(&mut self) -> Result<()>;

    /// Delete the entity.
    fn delete(&mut self) -> Result<()>;

    /// List the elements of a sub-collection.
    fn list(&self, collection: SubCollection) -> Result<Vec<Record>>;

    /// Create one sub-collection element.
    fn create_element(&mut self, collection: SubCollection, element: &Record) -> Result<()>;

    /// Delete one sub-collection element by key.
    fn delete_element(&mut self, collection: SubCollection, key: &str) -> Result<()>;

    /// Open the content of a file element.
    fn file_content(&self, name: &str) -> Result<Blob<'_>>;

    /// Upload a local file as the content of a file element.
    fn set_file_content(&mut self, name: &str, path: &Path) -> Result<()>;

    /// Whether the entity has a thumbnail.
    fn has_thumbnail(&self) -> Result<bool>;

    /// Open the thumbnail.
    fn thumbnail_content(&self) -> Result<Blob<'_>>;

    /// Upload a local file as the thumbnail.
    fn set_thumbnail_content(&mut self, path: &Path) -> Result<()>;
}
