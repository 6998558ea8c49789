//! # Reconcile
//!
//! Diff and apply engine for entity records held by a configuration server.
//!
//! This crate compares a locally stored entity definition against the
//! remote entity's current state and computes, reports or applies the
//! minimal set of changes that makes one side match the other.
//!
//! ## Core Concepts
//!
//! - **Record**: an ordered JSON object holding one entity
//! - **DiffRecord**: one atomic difference (create, update, delete, file
//!   content, thumbnail)
//! - **ContentProvider**: blob access on one side (local folder or remote)
//! - **Reconciler**: loads both sides, diffs, then reports or applies
//!
//! Pull makes the local folder match the remote; push makes the remote
//! match the local folder. Each direction ignores its own set of
//! server-managed fields.
//!
//! ## Example
//!
//! ```
//! # #[cfg(feature = "mock")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use reconcile::{LocalFolder, MockEntity, Outcome, push};
//! use serde_json::json;
//!
//! let tmp = tempfile::TempDir::new()?;
//! let folder = LocalFolder::init(tmp.path())?;
//! let definition = json!({"name": "app1", "description": "v1"});
//! folder.save_definition(definition.as_object().unwrap())?;
//!
//! let mut remote = MockEntity::new("applications/1", json!({"id": 1, "name": "app1"}));
//!
//! let outcome = push(&mut remote, &folder, true)?;
//! if let Outcome::DryRun { report, .. } = &outcome {
//!     assert_eq!(report, "+ description: \"v1\"");
//! }
//!
//! push(&mut remote, &folder, false)?;
//! assert_eq!(push(&mut remote, &folder, false)?, Outcome::InSync);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "mock"))]
//! # fn main() {}
//! ```
//!
//! ## Provider Traits
//!
//! - [`Entity`]: the remote entity (HTTP in the `remote` crate,
//!   `MockEntity` in memory with the `mock` feature)
//! - [`ContentProvider`]: blob existence and access
//! - [`ProgressCallback`]: receives apply progress
//! - [`ConfirmCallback`]: asks before a real apply
//!
//! Apply is not transactional: on failure the completed steps stay applied
//! and the error is returned. Re-running the reconciliation converges.

pub mod apply;
pub mod content;
pub mod context;
pub mod diff;
pub mod differ;
pub mod entity;
pub mod error;
pub mod folder;
pub mod ignore;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod record;
pub mod report;
pub mod sync;
pub mod types;

// Re-export main types at crate root
pub use apply::{apply_pull, apply_push};
pub use content::{ContentProvider, LocalContent, RemoteContent, same_file, same_thumbnail};
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{DiffKind, DiffRecord, DiffSummary};
pub use differ::diff;
pub use entity::{Blob, Entity};
pub use error::{Error, ErrorCategory, Result};
pub use folder::LocalFolder;
pub use ignore::IgnoreSet;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEntity;
pub use record::{Record, SubCollection};
pub use report::{ListKeyStrategy, Reporter, report};
pub use sync::{Outcome, Plan, Reconciler, pull, push};
pub use types::{ApplySummary, Direction};
