//! Human-readable rendering of diff records for dry runs
//!
//! One line per change, prefixed with the change marker:
//!
//! ```text
//! ~ description: "v2" → "v1"
//! ~ files:
//!     + [f1]: {"name":"f1"}
//! * file f1: content changed
//! ```
//!
//! Updates of nested records and keyed lists expand into indented sub-lines.

use crate::diff::{DiffKind, DiffRecord};
use crate::record::scalar_key;
use serde_json::{Map, Value};
use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;

/// Nesting depth after which updates are printed inline.
pub const MAX_REPORT_DEPTH: usize = 16;

const INDENT: &str = "    ";

/// Chooses the field that identifies list elements when diffing two lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListKeyStrategy {
    candidates: Vec<String>,
}

impl Default for ListKeyStrategy {
    fn default() -> Self {
        Self::new(["name", "id", "key"])
    }
}

impl ListKeyStrategy {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// First candidate that is present, scalar and unique in every element
    /// of both lists.
    pub fn key_for(&self, old: &[Value], new: &[Value]) -> Option<&str> {
        self.candidates
            .iter()
            .find(|field| identifies(old, field) && identifies(new, field))
            .map(String::as_str)
    }
}

fn identifies(items: &[Value], field: &str) -> bool {
    let mut seen = HashSet::new();
    items
        .iter()
        .all(|item| element_key(item, field).is_some_and(|key| seen.insert(key)))
}

fn element_key(item: &Value, field: &str) -> Option<String> {
    item.as_object()
        .and_then(|element| element.get(field))
        .and_then(scalar_key)
}

/// Renders diff records as text.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    strategy: ListKeyStrategy,
}

impl Reporter {
    pub fn new(strategy: ListKeyStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ListKeyStrategy {
        &self.strategy
    }

    /// Render all diffs, one change per line.
    pub fn report(&self, diffs: &[DiffRecord]) -> String {
        self.lines(diffs).join("\n")
    }

    /// Render all diffs as separate lines.
    pub fn lines(&self, diffs: &[DiffRecord]) -> Vec<String> {
        let mut out = Vec::new();
        for diff in diffs {
            self.render(diff, &mut out);
        }
        out
    }

    fn render(&self, diff: &DiffRecord, out: &mut Vec<String>) {
        let key = diff.key().unwrap_or_default();
        match diff.kind() {
            DiffKind::Create => out.push(format!("+ {}: {}", key, value_or_null(diff.new_value()))),
            DiffKind::Delete => out.push(format!("- {}: {}", key, value_or_null(diff.old_value()))),
            DiffKind::Update => self.change(
                key,
                diff.old_value().unwrap_or(&Value::Null),
                diff.new_value().unwrap_or(&Value::Null),
                0,
                out,
            ),
            DiffKind::SetFileContent => out.push(format!("* file {key}: content changed")),
            DiffKind::DeleteFileContent => out.push(format!("- file {key}: content removed")),
            DiffKind::SetThumb => out.push("* thumbnail: changed".to_string()),
            DiffKind::DeleteThumb => out.push("- thumbnail: removed".to_string()),
        }
    }

    fn change(&self, label: &str, old: &Value, new: &Value, depth: usize, out: &mut Vec<String>) {
        let indent = INDENT.repeat(depth);
        if depth >= MAX_REPORT_DEPTH {
            out.push(format!("{indent}~ {label}: {old} → {new}"));
            return;
        }

        match (old, new) {
            (Value::Object(old), Value::Object(new)) => {
                out.push(format!("{indent}~ {label}:"));
                self.object_changes(old, new, depth + 1, out);
            }
            (Value::Array(old), Value::Array(new)) => match self.strategy.key_for(old, new) {
                Some(field) => {
                    out.push(format!("{indent}~ {label}:"));
                    self.list_changes(field, old, new, depth + 1, out);
                }
                None => out.push(format!(
                    "{indent}~ {label}: lists differ ({} → {} elements)",
                    old.len(),
                    new.len()
                )),
            },
            (Value::String(old), Value::String(new))
                if old.contains('\n') || new.contains('\n') =>
            {
                out.push(format!("{indent}~ {label}:"));
                text_changes(old, new, depth + 1, out);
            }
            _ => out.push(format!("{indent}~ {label}: {old} → {new}")),
        }
    }

    fn object_changes(
        &self,
        old: &Map<String, Value>,
        new: &Map<String, Value>,
        depth: usize,
        out: &mut Vec<String>,
    ) {
        let indent = INDENT.repeat(depth);
        for (key, old_value) in old {
            match new.get(key) {
                None => out.push(format!("{indent}- {key}: {old_value}")),
                Some(new_value) if new_value != old_value => {
                    self.change(key, old_value, new_value, depth, out);
                }
                Some(_) => {}
            }
        }
        for (key, new_value) in new {
            if !old.contains_key(key) {
                out.push(format!("{indent}+ {key}: {new_value}"));
            }
        }
    }

    fn list_changes(
        &self,
        field: &str,
        old: &[Value],
        new: &[Value],
        depth: usize,
        out: &mut Vec<String>,
    ) {
        let indent = INDENT.repeat(depth);
        let keyed = |items: &[Value]| -> Vec<(String, Value)> {
            items
                .iter()
                .filter_map(|item| element_key(item, field).map(|key| (key, item.clone())))
                .collect()
        };
        let old = keyed(old);
        let new = keyed(new);
        let find = |items: &[(String, Value)], key: &str| {
            items.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        };

        let before = out.len();
        for (key, old_value) in &old {
            let label = format!("[{key}]");
            match find(&new, key) {
                None => out.push(format!("{indent}- {label}: {old_value}")),
                Some(new_value) if &new_value != old_value => {
                    self.change(&label, old_value, &new_value, depth, out);
                }
                Some(_) => {}
            }
        }
        for (key, new_value) in &new {
            if find(&old, key).is_none() {
                out.push(format!("{indent}+ [{key}]: {new_value}"));
            }
        }
        if out.len() == before {
            out.push(format!("{indent}~ element order changed"));
        }
    }
}

fn text_changes(old: &str, new: &str, depth: usize, out: &mut Vec<String>) {
    let indent = INDENT.repeat(depth);
    let diff = TextDiff::from_lines(old, new);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => continue,
        };
        out.push(format!(
            "{indent}{sign} {}",
            change.value().trim_end_matches('\n')
        ));
    }
}

fn value_or_null(value: Option<&Value>) -> &Value {
    value.unwrap_or(&Value::Null)
}

/// Render diffs with the default list key strategy.
pub fn report(diffs: &[DiffRecord]) -> String {
    Reporter::default().report(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scenario_report() {
        let diffs = vec![
            DiffRecord::update("description", json!("v2"), json!("v1")),
            DiffRecord::update("files", json!([]), json!([{"name": "f1"}])),
            DiffRecord::set_file_content("f1"),
        ];
        assert_eq!(
            report(&diffs),
            "~ description: \"v2\" → \"v1\"\n\
             ~ files:\n    + [f1]: {\"name\":\"f1\"}\n\
             * file f1: content changed"
        );
    }

    #[test]
    fn test_create_delete_and_blobs() {
        let diffs = vec![
            DiffRecord::create("tags", json!(["a"])),
            DiffRecord::delete("owner", json!(7)),
            DiffRecord::delete_file_content("f2"),
            DiffRecord::set_thumb(),
            DiffRecord::delete_thumb(),
        ];
        assert_eq!(
            Reporter::default().lines(&diffs),
            vec![
                "+ tags: [\"a\"]",
                "- owner: 7",
                "- file f2: content removed",
                "* thumbnail: changed",
                "- thumbnail: removed",
            ]
        );
    }

    #[test]
    fn test_nested_object() {
        let diffs = vec![DiffRecord::update(
            "config",
            json!({"port": 80, "host": "a", "gone": true}),
            json!({"port": 8080, "host": "a", "tls": {"on": true}}),
        )];
        assert_eq!(
            Reporter::default().lines(&diffs),
            vec![
                "~ config:",
                "    ~ port: 80 → 8080",
                "    - gone: true",
                "    + tls: {\"on\":true}",
            ]
        );
    }

    #[test]
    fn test_keyed_list_changes() {
        let diffs = vec![DiffRecord::update(
            "settings",
            json!([{"key": "a", "value": 1}, {"key": "b", "value": 2}]),
            json!([{"key": "b", "value": 3}, {"key": "c", "value": 4}]),
        )];
        assert_eq!(
            Reporter::default().lines(&diffs),
            vec![
                "~ settings:",
                "    - [a]: {\"key\":\"a\",\"value\":1}",
                "    ~ [b]:",
                "        ~ value: 2 → 3",
                "    + [c]: {\"key\":\"c\",\"value\":4}",
            ]
        );
    }

    #[test]
    fn test_list_without_consistent_key() {
        let diffs = vec![DiffRecord::update(
            "items",
            json!([{"name": "x"}, {"name": "x"}]),
            json!([{"name": "x"}]),
        )];
        assert_eq!(report(&diffs), "~ items: lists differ (2 → 1 elements)");

        let diffs = vec![DiffRecord::update("tags", json!(["a"]), json!(["a", "b"]))];
        assert_eq!(report(&diffs), "~ tags: lists differ (1 → 2 elements)");
    }

    #[test]
    fn test_reordered_list() {
        let diffs = vec![DiffRecord::update(
            "files",
            json!([{"name": "a"}, {"name": "b"}]),
            json!([{"name": "b"}, {"name": "a"}]),
        )];
        assert_eq!(
            Reporter::default().lines(&diffs),
            vec!["~ files:", "    ~ element order changed"]
        );
    }

    #[test]
    fn test_key_strategy_picks_first_consistent_candidate() {
        let strategy = ListKeyStrategy::default();
        let old = vec![json!({"id": 1, "name": "a"}), json!({"id": 2, "name": "a"})];
        let new = vec![json!({"id": 1, "name": "b"})];
        assert_eq!(strategy.key_for(&old, &new), Some("id"));

        let custom = ListKeyStrategy::new(["uuid"]);
        assert_eq!(custom.key_for(&old, &new), None);
    }

    #[test]
    fn test_multiline_string() {
        let diffs = vec![DiffRecord::update(
            "script",
            json!("echo one\necho two\n"),
            json!("echo one\necho three\n"),
        )];
        assert_eq!(
            Reporter::default().lines(&diffs),
            vec!["~ script:", "    - echo two", "    + echo three"]
        );
    }

    #[test]
    fn test_depth_guard() {
        let mut old = json!(1);
        let mut new = json!(2);
        for _ in 0..(MAX_REPORT_DEPTH + 4) {
            old = json!({"n": old});
            new = json!({"n": new});
        }
        let lines = Reporter::default().lines(&[DiffRecord::update("deep", old, new)]);
        assert_eq!(lines.len(), MAX_REPORT_DEPTH + 1);
        assert!(lines.last().unwrap().contains(" → "));
    }
}
