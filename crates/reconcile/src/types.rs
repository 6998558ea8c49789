//! Core types shared by the differ, applier and facade

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a reconciliation is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Remote → local: the server is the source, the folder the destination.
    Pull,
    /// Local → remote: the folder is the source, the server the destination.
    Push,
}

impl Direction {
    /// Lowercase name, as used on the command line and in state files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
        }
    }

    /// Label for the source side.
    pub fn source_label(self) -> &'static str {
        match self {
            Self::Pull => "remote",
            Self::Push => "local",
        }
    }

    /// Label for the destination side.
    pub fn destination_label(self) -> &'static str {
        match self {
            Self::Pull => "local",
            Self::Push => "remote",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an apply actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    /// Remote handlers were cleared before resetting sub-collections.
    pub handlers_cleared: bool,
    /// Sub-collection elements deleted on the destination.
    pub elements_deleted: usize,
    /// Sub-collection elements recreated on the destination.
    pub elements_created: usize,
    /// Blobs (files and thumbnail) uploaded or written.
    pub blobs_written: usize,
    /// Local blobs removed (pull only).
    pub blobs_removed: usize,
    /// Field changes sent in the final update (push) or saved with the
    /// definition (pull).
    pub fields_updated: usize,
    /// The definition file was rewritten (pull only).
    pub definition_saved: bool,
}

impl ApplySummary {
    /// Total number of individual mutations performed.
    pub fn total_changes(&self) -> usize {
        self.elements_deleted
            + self.elements_created
            + self.blobs_written
            + self.blobs_removed
            + self.fields_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_labels() {
        assert_eq!(Direction::Push.source_label(), "local");
        assert_eq!(Direction::Push.destination_label(), "remote");
        assert_eq!(Direction::Pull.source_label(), "remote");
        assert_eq!(Direction::Pull.to_string(), "pull");
    }

    #[test]
    fn test_apply_summary_total() {
        let summary = ApplySummary {
            elements_deleted: 2,
            elements_created: 3,
            blobs_written: 1,
            fields_updated: 1,
            ..Default::default()
        };
        assert_eq!(summary.total_changes(), 7);
        assert_eq!(ApplySummary::default().total_changes(), 0);
    }
}
