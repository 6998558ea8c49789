mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Server URL from the command line or environment
    pub server: Option<String>,
    /// Token from the command line or environment
    pub token: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        server: cli.server,
        token: cli.token,
    };

    match cli.command {
        Command::Pull(args) => commands::sync::pull(&ctx, args),
        Command::Push(args) => commands::sync::push(&ctx, args),
        Command::Diff(args) => commands::sync::diff(&ctx, args),
        Command::Init { folder } => commands::init::run(&ctx, &folder),
        Command::Status => commands::status::run(&ctx),
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "confsync", &mut io::stdout());
            Ok(())
        }
    }
}
