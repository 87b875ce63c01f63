//! spaceshift CLI entry point.
//!
//! Moves large user-data folders to another disk and leaves a directory link
//! behind, so applications keep finding their data at the old path.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod args;
mod commands;
mod interactive;
mod output;
mod progress;

use std::env;

use clap::Parser;

use args::Args;
use commands::App;
use interactive::ConsolePrompts;
use progress::ProgressManager;
use spaceshift_config::{ConfigError, resolve_config};

fn main() {
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        // SAFETY: We're setting this before any other threads are spawned
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    pretty_env_logger::init();

    if let Err(e) = run(&args) {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(count) = args.count {
        if count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "displayCount",
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        config.display_count = count;
    }
    log::debug!("Using config: {config:?}");

    let interactive = args.is_interactive();
    let progress = ProgressManager::new(args.should_show_progress());
    let prompts = ConsolePrompts::new(interactive, args.yes, args.kill, progress.clone());
    let app = App::new(args, &config, &prompts, progress, interactive);

    output::print_header("spaceshift");

    match &args.command {
        Some(command) => app.run_command(command),
        None if interactive => app.menu_loop(),
        None => Err("a command is required in non-interactive mode".into()),
    }
}
