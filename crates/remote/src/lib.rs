//! # remote
//!
//! Blocking HTTP access to a configuration server's entities.
//!
//! [`HttpEntity`] implements [`reconcile::Entity`], so the reconciliation
//! engine can diff and apply against a live server:
//!
//! ```no_run
//! use remote::{Client, EntityKind};
//! use reconcile::{LocalFolder, Outcome};
//! use std::time::Duration;
//!
//! let client = Client::new("https://config.example.com/api", None, Duration::from_secs(30));
//! let mut entity = client.entity(EntityKind::Applications, "42");
//! let folder = LocalFolder::new("applications/42");
//!
//! match reconcile::pull(&mut entity, &folder, true)? {
//!     Outcome::DryRun { report, .. } => println!("{report}"),
//!     other => println!("{other:?}"),
//! }
//! # Ok::<(), reconcile::Error>(())
//! ```
//!
//! Status codes map onto engine errors: 404 is [`reconcile::Error::NotFound`],
//! any other failure status is [`reconcile::Error::RemoteRejected`] carrying the
//! server's message, and connection failures are
//! [`reconcile::Error::Transport`].

pub mod client;
pub mod kind;

pub use client::{Client, HttpEntity};
pub use kind::EntityKind;
