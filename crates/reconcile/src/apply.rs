//! Diff applier: performs the mutations a diff calls for, in a fixed order
//!
//! Push (remote is the destination):
//!
//! 1. clear remote handlers, which may reference settings about to be reset
//! 2. reset every sub-collection touched by a field diff: delete all remote
//!    elements, then recreate the local ones
//! 3. upload file contents and the thumbnail; a reset `files` collection
//!    gets the content of every recreated element uploaded again
//! 4. apply the remaining field diffs to a fresh remote record and send one
//!    whole-entity update
//!
//! Pull (local folder is the destination) writes and removes blobs, then
//! saves the remote record as the definition.
//!
//! Nothing is rolled back. A failure leaves the steps before it applied;
//! running the same reconciliation again computes what is still missing.

use crate::context::ProgressCallback;
use crate::diff::{DiffKind, DiffRecord};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::folder::LocalFolder;
use crate::record::{HANDLERS_FIELD, Record, SubCollection, file_names, has_handlers};
use crate::types::ApplySummary;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Apply diffs computed with the local folder as source and `remote` as
/// destination.
pub fn apply_push<P: ProgressCallback>(
    diffs: &[DiffRecord],
    folder: &LocalFolder,
    remote: &mut dyn Entity,
    progress: &mut P,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();
    if diffs.is_empty() {
        return Ok(summary);
    }

    let mut local = folder.load_definition()?;
    check_removed_content(diffs, &local, folder)?;

    let current = remote.get_json()?;
    if has_handlers(&current) {
        progress.on_step_start("clear handlers");
        clear_handlers(remote, current)?;
        summary.handlers_cleared = true;
        local = folder.load_definition()?;
        progress.on_step_complete();
    }

    let mut recreated_files = Vec::new();
    for collection in SubCollection::ALL {
        let recreated =
            reset_collection(collection, diffs, &local, remote, &mut summary, progress)?;
        if collection == SubCollection::Files {
            recreated_files = recreated;
        }
    }

    upload_blobs(diffs, folder, remote, &mut summary, progress)?;
    restore_file_contents(diffs, &recreated_files, folder, remote, &mut summary, progress)?;

    update_fields(diffs, &local, remote, &mut summary, progress)?;

    log::info!(
        "Pushed {} changes to {}",
        summary.total_changes(),
        remote.address()
    );
    Ok(summary)
}

fn clear_handlers(remote: &mut dyn Entity, mut current: Record) -> Result<()> {
    current.insert(HANDLERS_FIELD.to_string(), Value::Array(Vec::new()));
    remote.set_json(current);
    remote.update()?;
    log::debug!("Cleared handlers on {}", remote.address());
    Ok(())
}

/// Push can only drop remote content by dropping the element. A file still
/// listed locally but missing from `files/` would never converge.
fn check_removed_content(
    diffs: &[DiffRecord],
    local: &Record,
    folder: &LocalFolder,
) -> Result<()> {
    let listed = file_names(local);
    for diff in diffs {
        if diff.kind() == DiffKind::DeleteFileContent
            && let Some(name) = diff.key()
            && listed.iter().any(|n| n == name)
        {
            let path = folder.file_path(name)?;
            return Err(Error::NotFound(format!("local {}", path.display())));
        }
    }
    Ok(())
}

/// Returns the keys of the recreated elements.
fn reset_collection<P: ProgressCallback>(
    collection: SubCollection,
    diffs: &[DiffRecord],
    local: &Record,
    remote: &mut dyn Entity,
    summary: &mut ApplySummary,
    progress: &mut P,
) -> Result<Vec<String>> {
    let field = collection.field();
    let touching: Vec<&DiffRecord> = diffs.iter().filter(|d| d.touches_field(field)).collect();
    let clear = touching
        .iter()
        .any(|d| matches!(d.kind(), DiffKind::Delete | DiffKind::Update));
    let recreate = touching
        .iter()
        .find(|d| matches!(d.kind(), DiffKind::Create | DiffKind::Update));

    if !clear && recreate.is_none() {
        return Ok(Vec::new());
    }
    progress.on_step_start(&format!("reset {collection}"));

    if clear {
        for element in remote.list(collection)? {
            let Some(key) = collection.element_key(&element) else {
                log::warn!(
                    "Skipping {} element without {} on {}",
                    collection,
                    collection.key_field(),
                    remote.address()
                );
                continue;
            };
            remote.delete_element(collection, &key)?;
            summary.elements_deleted += 1;
        }
    }

    let mut recreated = Vec::new();
    if let Some(diff) = recreate {
        let source = local.get(field).or_else(|| diff.new_value());
        if let Some(Value::Array(items)) = source {
            for item in items {
                match item.as_object() {
                    Some(element) => {
                        remote.create_element(collection, element)?;
                        summary.elements_created += 1;
                        recreated.extend(collection.element_key(element));
                    }
                    None => log::warn!("Skipping non-object {collection} element: {item}"),
                }
            }
        }
    }

    progress.on_step_complete();
    Ok(recreated)
}

fn upload_blobs<P: ProgressCallback>(
    diffs: &[DiffRecord],
    folder: &LocalFolder,
    remote: &mut dyn Entity,
    summary: &mut ApplySummary,
    progress: &mut P,
) -> Result<()> {
    for diff in diffs {
        match (diff.kind(), diff.key()) {
            (DiffKind::SetFileContent, Some(name)) => {
                progress.on_step_start(&format!("upload {name}"));
                let path = folder.file_path(name)?;
                ensure_local(&path)?;
                remote.set_file_content(name, &path)?;
                summary.blobs_written += 1;
                progress.on_step_complete();
            }
            (DiffKind::SetThumb, _) => {
                progress.on_step_start("upload thumbnail");
                let path = folder.thumbnail_path();
                ensure_local(&path)?;
                remote.set_thumbnail_content(&path)?;
                summary.blobs_written += 1;
                progress.on_step_complete();
            }
            // Only names dropped from `files` get here; their element is gone.
            (DiffKind::DeleteFileContent, name) => {
                log::debug!("No content action for removed file {}", name.unwrap_or_default());
            }
            (DiffKind::DeleteThumb, _) => {
                log::warn!(
                    "Thumbnail exists only on {}; remote thumbnails cannot be removed",
                    remote.address()
                );
            }
            _ => {}
        }
    }
    Ok(())
}

/// Recreated file elements come back empty. Upload the local content of
/// every one not already handled by a `set_file_content` diff.
fn restore_file_contents<P: ProgressCallback>(
    diffs: &[DiffRecord],
    recreated: &[String],
    folder: &LocalFolder,
    remote: &mut dyn Entity,
    summary: &mut ApplySummary,
    progress: &mut P,
) -> Result<()> {
    let mut done = BTreeSet::new();
    for diff in diffs {
        if diff.kind() == DiffKind::SetFileContent
            && let Some(name) = diff.key()
        {
            done.insert(name);
        }
    }

    for name in recreated {
        if !done.insert(name.as_str()) {
            continue;
        }
        let path = folder.file_path(name)?;
        if !path.is_file() {
            log::warn!("No local content for {name}; remote element left empty");
            continue;
        }
        progress.on_step_start(&format!("upload {name}"));
        remote.set_file_content(name, &path)?;
        summary.blobs_written += 1;
        progress.on_step_complete();
    }
    Ok(())
}

fn ensure_local(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::NotFound(format!("local {}", path.display())))
    }
}

fn update_fields<P: ProgressCallback>(
    diffs: &[DiffRecord],
    local: &Record,
    remote: &mut dyn Entity,
    summary: &mut ApplySummary,
    progress: &mut P,
) -> Result<()> {
    let fields: Vec<&DiffRecord> = diffs
        .iter()
        .filter(|d| d.kind().is_field())
        .filter(|d| d.key().is_some_and(|k| SubCollection::from_field(k).is_none()))
        .collect();
    let restore_handlers =
        summary.handlers_cleared && !fields.iter().any(|d| d.touches_field(HANDLERS_FIELD));

    if fields.is_empty() && !restore_handlers {
        return Ok(());
    }
    progress.on_step_start("update fields");

    let mut record = remote.get_json()?;
    for diff in &fields {
        let Some(key) = diff.key() else { continue };
        match diff.kind() {
            DiffKind::Create | DiffKind::Update => {
                let value = local
                    .get(key)
                    .or_else(|| diff.new_value())
                    .cloned()
                    .unwrap_or(Value::Null);
                record.insert(key.to_string(), value);
            }
            DiffKind::Delete => {
                record.shift_remove(key);
            }
            _ => {}
        }
    }
    if restore_handlers && let Some(handlers) = local.get(HANDLERS_FIELD) {
        record.insert(HANDLERS_FIELD.to_string(), handlers.clone());
    }

    remote.set_json(record);
    remote.update()?;
    summary.fields_updated = fields.len();
    progress.on_step_complete();
    Ok(())
}

/// Apply diffs computed with `remote` as source and the local folder as
/// destination.
pub fn apply_pull<P: ProgressCallback>(
    diffs: &[DiffRecord],
    remote: &dyn Entity,
    folder: &LocalFolder,
    progress: &mut P,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();
    if diffs.is_empty() {
        return Ok(summary);
    }
    folder.ensure_exists()?;

    for diff in diffs {
        match (diff.kind(), diff.key()) {
            (DiffKind::SetFileContent, Some(name)) => {
                progress.on_step_start(&format!("download {name}"));
                let mut stream = remote.file_content(name)?;
                folder.write_file(name, &mut stream)?;
                summary.blobs_written += 1;
                progress.on_step_complete();
            }
            (DiffKind::DeleteFileContent, Some(name)) => {
                if folder.remove_file(name)? {
                    summary.blobs_removed += 1;
                }
            }
            (DiffKind::SetThumb, _) => {
                progress.on_step_start("download thumbnail");
                let mut stream = remote.thumbnail_content()?;
                folder.write_thumbnail(&mut stream)?;
                summary.blobs_written += 1;
                progress.on_step_complete();
            }
            (DiffKind::DeleteThumb, _) => {
                if folder.remove_thumbnail()? {
                    summary.blobs_removed += 1;
                }
            }
            _ => {}
        }
    }

    progress.on_step_start("save definition");
    folder.save_definition(&remote.get_json()?)?;
    summary.definition_saved = true;
    summary.fields_updated = diffs.iter().filter(|d| d.kind().is_field()).count();
    progress.on_step_complete();

    log::info!(
        "Pulled {} changes from {}",
        summary.total_changes(),
        remote.address()
    );
    Ok(summary)
}
