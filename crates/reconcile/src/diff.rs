//! Diff records: one atomic difference between source and destination

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Field exists only on the source.
    Create,
    /// Field exists on both sides with different values.
    Update,
    /// Field exists only on the destination.
    Delete,
    /// File content must be copied from source to destination.
    SetFileContent,
    /// File content must be removed from the destination.
    DeleteFileContent,
    /// Thumbnail must be copied from source to destination.
    SetThumb,
    /// Thumbnail must be removed from the destination.
    DeleteThumb,
}

impl DiffKind {
    /// Whether this kind describes a record field (as opposed to a blob).
    pub fn is_field(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }

    /// Single-character marker used in reports.
    pub fn marker(self) -> char {
        match self {
            Self::Create => '+',
            Self::Update => '~',
            Self::Delete | Self::DeleteFileContent | Self::DeleteThumb => '-',
            Self::SetFileContent | Self::SetThumb => '*',
        }
    }
}

/// One classified difference.
///
/// `key` is the field name for field kinds, the file name for file-content
/// kinds and absent for thumbnail kinds. Values are only carried by field
/// kinds: `old_value` is the destination's, `new_value` the source's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRecord {
    kind: DiffKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_value: Option<Value>,
}

impl DiffRecord {
    pub fn create(key: impl Into<String>, new_value: Value) -> Self {
        Self {
            kind: DiffKind::Create,
            key: Some(key.into()),
            old_value: None,
            new_value: Some(new_value),
        }
    }

    pub fn update(key: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            kind: DiffKind::Update,
            key: Some(key.into()),
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }

    pub fn delete(key: impl Into<String>, old_value: Value) -> Self {
        Self {
            kind: DiffKind::Delete,
            key: Some(key.into()),
            old_value: Some(old_value),
            new_value: None,
        }
    }

    pub fn set_file_content(name: impl Into<String>) -> Self {
        Self::blob(DiffKind::SetFileContent, Some(name.into()))
    }

    pub fn delete_file_content(name: impl Into<String>) -> Self {
        Self::blob(DiffKind::DeleteFileContent, Some(name.into()))
    }

    pub fn set_thumb() -> Self {
        Self::blob(DiffKind::SetThumb, None)
    }

    pub fn delete_thumb() -> Self {
        Self::blob(DiffKind::DeleteThumb, None)
    }

    fn blob(kind: DiffKind, key: Option<String>) -> Self {
        Self {
            kind,
            key,
            old_value: None,
            new_value: None,
        }
    }

    pub fn kind(&self) -> DiffKind {
        self.kind
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn old_value(&self) -> Option<&Value> {
        self.old_value.as_ref()
    }

    pub fn new_value(&self) -> Option<&Value> {
        self.new_value.as_ref()
    }

    /// Whether this is a field diff on the given top-level field.
    pub fn touches_field(&self, field: &str) -> bool {
        self.kind.is_field() && self.key.as_deref() == Some(field)
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Fields to create
    pub created: usize,
    /// Fields to update
    pub updated: usize,
    /// Fields to delete
    pub deleted: usize,
    /// File contents to copy
    pub files_set: usize,
    /// File contents to remove
    pub files_deleted: usize,
    /// Thumbnail changes (0 or 1)
    pub thumbnail: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[DiffRecord]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.kind() {
                DiffKind::Create => summary.created += 1,
                DiffKind::Update => summary.updated += 1,
                DiffKind::Delete => summary.deleted += 1,
                DiffKind::SetFileContent => summary.files_set += 1,
                DiffKind::DeleteFileContent => summary.files_deleted += 1,
                DiffKind::SetThumb | DiffKind::DeleteThumb => summary.thumbnail += 1,
            }
        }
        summary
    }

    /// Number of field changes
    pub fn fields(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Number of blob changes
    pub fn blobs(&self) -> usize {
        self.files_set + self.files_deleted + self.thumbnail
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.fields() + self.blobs()
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors() {
        let diff = DiffRecord::update("description", json!("v2"), json!("v1"));
        assert_eq!(diff.kind(), DiffKind::Update);
        assert_eq!(diff.key(), Some("description"));
        assert_eq!(diff.old_value(), Some(&json!("v2")));
        assert_eq!(diff.new_value(), Some(&json!("v1")));

        let thumb = DiffRecord::set_thumb();
        assert_eq!(thumb.key(), None);
        assert!(!thumb.kind().is_field());
    }

    #[test]
    fn test_touches_field() {
        assert!(DiffRecord::delete("files", json!([])).touches_field("files"));
        assert!(!DiffRecord::set_file_content("files").touches_field("files"));
    }

    #[test]
    fn test_serializes_snake_case_without_empty_fields() {
        let json = serde_json::to_value(DiffRecord::set_file_content("f1")).unwrap();
        assert_eq!(json, json!({"kind": "set_file_content", "key": "f1"}));

        let json = serde_json::to_value(DiffRecord::create("name", json!("app1"))).unwrap();
        assert_eq!(json, json!({"kind": "create", "key": "name", "new_value": "app1"}));
    }

    #[test]
    fn test_summary() {
        let diffs = vec![
            DiffRecord::update("description", json!("v2"), json!("v1")),
            DiffRecord::create("tags", json!([])),
            DiffRecord::set_file_content("f1"),
            DiffRecord::delete_file_content("f2"),
            DiffRecord::delete_thumb(),
        ];
        let summary = DiffSummary::from_diffs(&diffs);
        assert_eq!(summary.fields(), 2);
        assert_eq!(summary.blobs(), 3);
        assert_eq!(summary.total(), 5);
        assert!(summary.has_changes());
        assert!(!DiffSummary::default().has_changes());
    }

    #[test]
    fn test_markers() {
        assert_eq!(DiffKind::Create.marker(), '+');
        assert_eq!(DiffKind::Update.marker(), '~');
        assert_eq!(DiffKind::DeleteThumb.marker(), '-');
        assert_eq!(DiffKind::SetFileContent.marker(), '*');
    }
}
