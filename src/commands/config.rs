use anyhow::Result;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::paths;
use crate::state::SyncState;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let path = Config::path()?;
    let config = Config::load()?;

    ui::header("Paths");
    ui::kv(
        "config",
        &format!(
            "{}{}",
            path.display(),
            if path.exists() { "" } else { " (not found, using defaults)" }
        ),
    );
    ui::kv("state", &SyncState::state_file()?.display().to_string());
    ui::kv("config dir", &paths::config_dir()?.display().to_string());

    ui::header("Effective Settings");
    let server = ctx.server.as_deref().or(config.server.url.as_deref());
    ui::kv("server", server.unwrap_or("(not set)"));
    let token = ctx.token.as_deref().or(config.server.token.as_deref());
    ui::kv("token", &mask_token(token));
    ui::kv("timeout", &format!("{}s", config.server.timeout_secs));
    ui::kv("workspace", &config.workspace_root().display().to_string());
    ui::kv("ignore (push)", &list(&config.ignore.push));
    ui::kv("ignore (pull)", &list(&config.ignore.pull));
    Ok(())
}

/// Show only the last four characters of a token
fn mask_token(token: Option<&str>) -> String {
    match token {
        None => "(not set)".to_string(),
        Some(t) if t.chars().count() <= 4 => "****".to_string(),
        Some(t) => {
            let tail: String = t.chars().skip(t.chars().count() - 4).collect();
            format!("****{tail}")
        }
    }
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token(None), "(not set)");
        assert_eq!(mask_token(Some("abc")), "****");
        assert_eq!(mask_token(Some("secret-token-9f2a")), "****9f2a");
    }

    #[test]
    fn test_list() {
        assert_eq!(list(&[]), "(none)");
        assert_eq!(
            list(&["description".to_string(), "owner".to_string()]),
            "description, owner"
        );
    }
}
