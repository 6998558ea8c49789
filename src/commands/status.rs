use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::Context;
use crate::state::{FolderState, SyncState};
use crate::ui;

pub fn run(_ctx: &Context) -> Result<()> {
    let state = SyncState::load()?;
    ui::header("Tracked Folders");

    if state.folders.is_empty() {
        ui::dim("Nothing synced yet. Run: confsync pull <kind> <id>");
        return Ok(());
    }

    for (folder, entry) in &state.folders {
        println!();
        println!("{} {}", entry.address.cyan().bold(), folder.dimmed());
        for line in describe(entry) {
            println!("  {line}");
        }
    }

    if let Some(at) = state.last_updated {
        println!();
        ui::dim(&format!("Last updated {}", format_time(at)));
    }
    Ok(())
}

fn describe(entry: &FolderState) -> Vec<String> {
    let when = |at: Option<DateTime<Utc>>| at.map_or_else(|| "never".to_string(), format_time);
    vec![
        format!("last pull: {}", when(entry.last_pull)),
        format!("last push: {}", when(entry.last_push)),
    ]
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_describe_never_pushed() {
        let entry = FolderState {
            address: "hosts/7".to_string(),
            last_pull: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
            last_push: None,
        };
        assert_eq!(
            describe(&entry),
            vec![
                "last pull: 2024-03-01 09:30 UTC".to_string(),
                "last push: never".to_string()
            ]
        );
    }
}
