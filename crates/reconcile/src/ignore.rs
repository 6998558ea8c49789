//! Direction-specific sets of fields excluded from comparison
//!
//! Pull writes the whole server document locally, so it only skips fields that
//! change on every read. Push additionally skips everything the server owns:
//! identifiers, version counters and computed capability flags must never be
//! sent back.

use crate::types::Direction;
use std::collections::BTreeSet;

/// Fields skipped when pulling.
pub const PULL_IGNORED_FIELDS: &[&str] = &["last_access", "last_modified", "statistics", "status"];

/// Fields skipped when pushing.
pub const PUSH_IGNORED_FIELDS: &[&str] = &[
    "id",
    "uuid",
    "url",
    "version",
    "revision",
    "created",
    "created_by",
    "owner",
    "organization",
    "can_read",
    "can_write",
    "can_delete",
    "can_execute",
    "last_access",
    "last_modified",
    "statistics",
    "status",
];

/// An immutable set of top-level field names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    fields: BTreeSet<String>,
}

impl IgnoreSet {
    /// Build a set from field names.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-in set for pull.
    pub fn pull() -> Self {
        Self::new(PULL_IGNORED_FIELDS.iter().copied())
    }

    /// Built-in set for push.
    pub fn push() -> Self {
        Self::new(PUSH_IGNORED_FIELDS.iter().copied())
    }

    /// Built-in set for a direction.
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Pull => Self::pull(),
            Direction::Push => Self::push(),
        }
    }

    /// A copy of this set with extra fields added.
    pub fn with_extra<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields = self.fields.clone();
        fields.extend(extra.into_iter().map(Into::into));
        Self { fields }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_skips_server_owned_fields() {
        let push = IgnoreSet::push();
        assert!(push.contains("id"));
        assert!(push.contains("version"));
        assert!(push.contains("can_write"));
        assert!(!push.contains("description"));
    }

    #[test]
    fn test_pull_is_subset_of_push() {
        let push = IgnoreSet::push();
        let pull = IgnoreSet::pull();
        assert!(pull.iter().all(|f| push.contains(f)));
        assert!(pull.len() < push.len());
        assert!(!pull.contains("id"));
    }

    #[test]
    fn test_with_extra_leaves_original_untouched() {
        let pull = IgnoreSet::pull();
        let extended = pull.with_extra(["checksum"]);
        assert!(extended.contains("checksum"));
        assert!(!pull.contains("checksum"));
    }

    #[test]
    fn test_for_direction() {
        assert_eq!(IgnoreSet::for_direction(Direction::Push), IgnoreSet::push());
        assert_eq!(IgnoreSet::for_direction(Direction::Pull), IgnoreSet::pull());
        assert!(IgnoreSet::default().is_empty());
    }
}
