//! CLI argument definitions.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI arguments for spaceshift.
#[derive(Debug, Parser)]
#[command(
    name = "spaceshift",
    about = "Move large user-data folders to another disk and link them back",
    version
)]
pub struct Args {
    /// What to do. Without a command an interactive menu is shown.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Folder whose subfolders are ranked by size (defaults to the roaming
    /// application data folder).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Destination volume or folder.
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Configuration file to use instead of the default location.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of ranked folders to offer (overrides config).
    #[arg(long)]
    pub count: Option<usize>,

    /// Replace existing destination folders and purge without asking.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Terminate processes holding files open without asking.
    #[arg(long)]
    pub kill: bool,

    /// Run without prompts.
    #[arg(long)]
    pub non_interactive: bool,

    /// Disable progress bars (useful for CI environments).
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Enable verbose output.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Delete everything inside the temp folder.
    CleanTemp,
    /// Move the documents folder.
    Documents,
    /// Rank application data folders by size and move the selected ones.
    AppData,
    /// Move a single folder.
    Move {
        /// Folder to move.
        path: PathBuf,
    },
    /// List volumes that can receive moved folders.
    Volumes,
}

impl Args {
    /// Determine if we should show progress bars.
    #[must_use]
    pub const fn should_show_progress(&self) -> bool {
        !self.no_progress
    }

    /// Determine if prompts can be shown.
    ///
    /// Prompts need a terminal on stdout, even without `--non-interactive`.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        !self.non_interactive && console::Term::stdout().is_term()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let args = Args::try_parse_from([
            "spaceshift",
            "--dest",
            "/mnt/data",
            "--kill",
            "move",
            "/home/user/.config/Slack",
        ])
        .unwrap();

        assert_eq!(
            args.command,
            Some(Command::Move {
                path: PathBuf::from("/home/user/.config/Slack")
            })
        );
        assert_eq!(args.dest, Some(PathBuf::from("/mnt/data")));
        assert!(args.kill);
        assert!(!args.yes);
    }

    #[test]
    fn test_parse_menu() {
        let args = Args::try_parse_from(["spaceshift", "--no-progress"]).unwrap();
        assert_eq!(args.command, None);
        assert!(!args.should_show_progress());
    }

    #[test]
    fn test_non_interactive_flag() {
        let args = Args::try_parse_from(["spaceshift", "--non-interactive", "clean-temp"]).unwrap();
        assert_eq!(args.command, Some(Command::CleanTemp));
        assert!(!args.is_interactive());
    }
}
