//! Structural differ: computes the diff records between two entity records
//!
//! Every emitted record is attributable to exactly one top-level field (or to
//! the thumbnail). Three passes, in order:
//!
//! 1. destination fields: deletions and updates, each followed by the file
//!    content diffs of the `files` field
//! 2. source fields missing on the destination: creations
//! 3. thumbnail

use crate::content::{ContentProvider, same_file, same_thumbnail};
use crate::diff::DiffRecord;
use crate::error::Result;
use crate::ignore::IgnoreSet;
use crate::record::{Record, SubCollection};
use serde_json::Value;
use std::collections::BTreeSet;

/// Compute the diffs that turn `destination` into `source`.
pub fn diff(
    source: &Record,
    destination: &Record,
    ignore: &IgnoreSet,
    source_content: &dyn ContentProvider,
    destination_content: &dyn ContentProvider,
) -> Result<Vec<DiffRecord>> {
    Differ {
        ignore,
        source: source_content,
        destination: destination_content,
    }
    .run(source, destination)
}

struct Differ<'a> {
    ignore: &'a IgnoreSet,
    source: &'a dyn ContentProvider,
    destination: &'a dyn ContentProvider,
}

impl Differ<'_> {
    fn run(&self, source: &Record, destination: &Record) -> Result<Vec<DiffRecord>> {
        let files_field = SubCollection::Files.field();
        let mut diffs = Vec::new();

        for (key, dst_value) in destination {
            if self.ignore.contains(key) {
                continue;
            }
            match source.get(key) {
                None => {
                    diffs.push(DiffRecord::delete(key, dst_value.clone()));
                    if key == files_field {
                        diffs.extend(
                            file_keys(dst_value)
                                .into_iter()
                                .map(DiffRecord::delete_file_content),
                        );
                    }
                }
                Some(src_value) if src_value != dst_value => {
                    diffs.push(DiffRecord::update(key, dst_value.clone(), src_value.clone()));
                    if key == files_field {
                        self.diff_file_sets(src_value, dst_value, &mut diffs)?;
                    }
                }
                Some(src_value) => {
                    // Equal metadata does not imply equal blob content.
                    if key == files_field {
                        for name in file_keys(src_value) {
                            self.check_content(&name, &mut diffs)?;
                        }
                    }
                }
            }
        }

        for (key, src_value) in source {
            if self.ignore.contains(key) || destination.contains_key(key) {
                continue;
            }
            diffs.push(DiffRecord::create(key, src_value.clone()));
            if key == files_field {
                diffs.extend(
                    file_keys(src_value)
                        .into_iter()
                        .map(DiffRecord::set_file_content),
                );
            }
        }

        self.diff_thumbnail(&mut diffs)?;

        log::debug!("Computed {} diffs", diffs.len());
        Ok(diffs)
    }

    /// Files listed only on the source are set, files listed only on the
    /// destination are deleted, shared names get a content check.
    fn diff_file_sets(
        &self,
        source: &Value,
        destination: &Value,
        diffs: &mut Vec<DiffRecord>,
    ) -> Result<()> {
        let src_names = file_keys(source);
        let dst_names = file_keys(destination);
        let src_set: BTreeSet<&str> = src_names.iter().map(String::as_str).collect();
        let dst_set: BTreeSet<&str> = dst_names.iter().map(String::as_str).collect();

        for name in &src_names {
            if dst_set.contains(name.as_str()) {
                self.check_content(name, diffs)?;
            } else {
                diffs.push(DiffRecord::set_file_content(name));
            }
        }
        for name in &dst_names {
            if !src_set.contains(name.as_str()) {
                diffs.push(DiffRecord::delete_file_content(name));
            }
        }
        Ok(())
    }

    fn check_content(&self, name: &str, diffs: &mut Vec<DiffRecord>) -> Result<()> {
        if !self.source.exists(name) {
            diffs.push(DiffRecord::delete_file_content(name));
        } else if !same_file(self.source, self.destination, name)? {
            diffs.push(DiffRecord::set_file_content(name));
        }
        Ok(())
    }

    fn diff_thumbnail(&self, diffs: &mut Vec<DiffRecord>) -> Result<()> {
        if self.source.exists_thumbnail() {
            if !same_thumbnail(self.source, self.destination)? {
                diffs.push(DiffRecord::set_thumb());
            }
        } else if self.destination.exists_thumbnail() {
            diffs.push(DiffRecord::delete_thumb());
        }
        Ok(())
    }
}

/// File names listed in a `files` value, without duplicates, in list order.
fn file_keys(value: &Value) -> Vec<String> {
    let mut seen = BTreeSet::new();
    SubCollection::Files
        .keys(value)
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
