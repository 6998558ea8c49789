use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use colored::Colorize;
use reconcile::{ConfirmCallback, Direction, Entity, LocalFolder, Plan, Reconciler};
use remote::{Client, EntityKind};
use std::path::PathBuf;

use crate::Context;
use crate::cli::{DiffArgs, SyncArgs, Target};
use crate::config::Config;
use crate::progress::{self, DialoguerConfirm, SpinnerProgress};
use crate::state::SyncState;
use crate::ui;

pub fn pull(ctx: &Context, args: SyncArgs) -> Result<()> {
    run(ctx, Direction::Pull, args)
}

pub fn push(ctx: &Context, args: SyncArgs) -> Result<()> {
    run(ctx, Direction::Push, args)
}

/// Print the differences without applying anything
pub fn diff(ctx: &Context, args: DiffArgs) -> Result<()> {
    let config = Config::load()?;
    let direction = Direction::from(args.direction);
    let kind = EntityKind::from(args.target.kind);
    let folder = LocalFolder::new(resolve_folder(&config, &args.target));
    let client = connect(ctx, &config)?;
    let entity = client.entity(kind, &args.target.id);
    let reconciler = config.reconciler();

    let plan = plan(ctx, &reconciler, direction, &entity, &folder)?;

    if args.json {
        let json = serde_json::to_string_pretty(plan.diffs())
            .context("Failed to serialize diff records")?;
        println!("{json}");
        return Ok(());
    }

    if plan.is_empty() {
        ui::success(&format!("{} is in sync", plan.address()));
        return Ok(());
    }

    print_plan(&reconciler, &plan);
    Ok(())
}

fn run(ctx: &Context, direction: Direction, args: SyncArgs) -> Result<()> {
    let config = Config::load()?;
    let kind = EntityKind::from(args.target.kind);
    let folder_path = resolve_folder(&config, &args.target);

    // A pull may populate a folder that does not exist yet
    let folder = if direction == Direction::Pull && !args.dry_run && !folder_path.exists() {
        ui::info(&format!("Creating {}", folder_path.display()));
        LocalFolder::init(&folder_path).map_err(explain)?
    } else {
        LocalFolder::new(&folder_path)
    };

    let client = connect(ctx, &config)?;
    let mut entity = client.entity(kind, &args.target.id);
    let reconciler = config.reconciler();

    let plan = plan(ctx, &reconciler, direction, &entity, &folder)?;
    if plan.is_empty() {
        ui::success(&format!("{} is in sync", plan.address()));
        return Ok(());
    }

    print_plan(&reconciler, &plan);

    if args.dry_run {
        println!();
        ui::dim("Dry run: nothing was changed");
        return Ok(());
    }

    println!();
    let prompt = format!(
        "Apply {} changes to {}?",
        plan.diffs().len(),
        direction.destination_label()
    );
    if !DialoguerConfirm::new(args.yes)
        .confirm(&prompt)
        .map_err(explain)?
    {
        ui::warn("Aborted, nothing was changed");
        return Ok(());
    }

    let mut progress = SpinnerProgress::new(ctx.quiet);
    let result = reconciler.apply(&plan, &mut entity, &folder, &mut progress);
    progress.finish();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            ui::error(&format!("{} stopped part way through", direction.as_str()));
            ui::dim("Some changes may already be applied. Re-running the same command converges.");
            return Err(explain(e));
        }
    };

    ui::success(&format!(
        "{} {} ({} changes)",
        match direction {
            Direction::Pull => "Pulled",
            Direction::Push => "Pushed",
        },
        plan.address(),
        summary.total_changes()
    ));
    if !ctx.quiet {
        ui::print_apply_summary(&summary);
    }

    record_state(&folder, &plan);
    Ok(())
}

/// Folder from the command line, else `<workspace root>/<kind>/<id>`
fn resolve_folder(config: &Config, target: &Target) -> PathBuf {
    target
        .folder
        .clone()
        .unwrap_or_else(|| config.entity_folder(EntityKind::from(target.kind), &target.id))
}

fn connect(ctx: &Context, config: &Config) -> Result<Client> {
    let Some(url) = ctx.server.clone().or_else(|| config.server.url.clone()) else {
        bail!(
            "No server configured. Pass --server, set CONFSYNC_SERVER, \
             or add server.url to the config file"
        );
    };
    let token = ctx.token.clone().or_else(|| config.server.token.clone());
    log::debug!("Connecting to {url}");
    Ok(Client::new(url, token, config.timeout()))
}

fn plan(
    ctx: &Context,
    reconciler: &Reconciler,
    direction: Direction,
    entity: &dyn Entity,
    folder: &LocalFolder,
) -> Result<Plan> {
    let spinner = if ctx.quiet {
        None
    } else {
        Some(progress::spinner(&format!(
            "Comparing {} with {}",
            direction.source_label(),
            direction.destination_label()
        )))
    };
    let result = reconciler.plan(direction, entity, folder);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    result.map_err(explain)
}

fn print_plan(reconciler: &Reconciler, plan: &Plan) {
    let direction = plan.direction();
    ui::header(&format!(
        "{} {} ({} → {})",
        direction.as_str(),
        plan.address(),
        direction.source_label(),
        direction.destination_label()
    ));
    ui::print_report(&reconciler.report(plan));
    ui::print_diff_summary(&plan.summary());
}

fn record_state(folder: &LocalFolder, plan: &Plan) {
    let result = SyncState::load().and_then(|mut state| {
        state.record(folder.root(), plan.address(), plan.direction(), Utc::now());
        state.save()
    });
    if let Err(e) = result {
        ui::warn(&format!("Could not update sync state: {e:#}"));
    }
}

/// Print advice for engine errors and convert them for `main`
fn explain(err: reconcile::Error) -> anyhow::Error {
    let category = err.category();
    log::debug!("{category}: {err}");
    eprintln!(
        "  {} {}",
        "hint:".dimmed(),
        category.advice().dimmed()
    );
    anyhow::Error::new(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::KindArg;
    use crate::config::{ServerConfig, WorkspaceConfig};

    fn config() -> Config {
        Config {
            server: ServerConfig {
                url: Some("https://config.example.com".to_string()),
                ..ServerConfig::default()
            },
            workspace: WorkspaceConfig {
                root: "/srv/confsync".to_string(),
            },
            ..Config::default()
        }
    }

    fn target(folder: Option<&str>) -> Target {
        Target {
            kind: KindArg::Platforms,
            id: "3".to_string(),
            folder: folder.map(PathBuf::from),
        }
    }

    fn ctx(server: Option<&str>) -> Context {
        Context {
            quiet: true,
            server: server.map(ToString::to_string),
            token: None,
        }
    }

    #[test]
    fn test_resolve_folder_prefers_argument() {
        assert_eq!(
            resolve_folder(&config(), &target(Some("./here"))),
            PathBuf::from("./here")
        );
        assert_eq!(
            resolve_folder(&config(), &target(None)),
            PathBuf::from("/srv/confsync/platforms/3")
        );
    }

    #[test]
    fn test_connect_prefers_command_line_server() {
        let client = connect(&ctx(Some("http://localhost:8080/")), &config()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");

        let client = connect(&ctx(None), &config()).unwrap();
        assert_eq!(client.base_url(), "https://config.example.com");
    }

    #[test]
    fn test_connect_without_server_fails() {
        assert!(connect(&ctx(None), &Config::default()).is_err());
    }
}
