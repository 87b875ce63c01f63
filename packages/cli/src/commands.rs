//! Command implementations shared by the menu and the subcommands.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use spaceshift_config::RelocateConfig;
use spaceshift_inventory::{calculate_size, collect_with_progress, is_link, top_n};
use spaceshift_operations::{
    Relocator, SystemDiskSpace, TransferError, list_destination_volumes, purge_directory_contents,
};
use spaceshift_process::SystemProcessTable;

use crate::args::{Args, Command};
use crate::interactive::{self, ConsolePrompts, MenuAction};
use crate::output;
use crate::progress::ProgressManager;

type CliResult = Result<(), Box<dyn Error>>;

/// Everything a command needs, built once per run.
pub struct App<'a> {
    args: &'a Args,
    config: &'a RelocateConfig,
    interactive: bool,
    progress: ProgressManager,
    relocator: Relocator<'a, SystemProcessTable, SystemDiskSpace, ConsolePrompts>,
}

impl<'a> App<'a> {
    /// Create the application state.
    #[must_use]
    pub fn new(
        args: &'a Args,
        config: &'a RelocateConfig,
        prompts: &'a ConsolePrompts,
        progress: ProgressManager,
        interactive: bool,
    ) -> Self {
        Self {
            args,
            config,
            interactive,
            progress,
            relocator: Relocator::new(
                config,
                SystemProcessTable::new(),
                SystemDiskSpace::new(),
                prompts,
            ),
        }
    }

    /// Run a subcommand.
    ///
    /// # Errors
    ///
    /// * If the command fails
    pub fn run_command(&self, command: &Command) -> CliResult {
        match command {
            Command::CleanTemp => self.clean_temp(),
            Command::Documents => self.move_documents(),
            Command::AppData => self.move_app_data(),
            Command::Move { path } => {
                let destination = self.destination()?;
                self.move_folder(path, &destination)
            }
            Command::Volumes => {
                output::print_volumes(&list_destination_volumes());
                Ok(())
            }
        }
    }

    /// Show the main menu until the user exits.
    ///
    /// Errors from a single action are printed and the menu is shown again.
    ///
    /// # Errors
    ///
    /// * If the menu itself cannot be shown
    pub fn menu_loop(&self) -> CliResult {
        loop {
            let result = match interactive::select_action()? {
                MenuAction::CleanTemp => self.clean_temp(),
                MenuAction::Documents => self.move_documents(),
                MenuAction::AppData => self.move_app_data(),
                MenuAction::MoveFolder => interactive::prompt_path("Enter the folder to move")
                    .map_err(Box::<dyn Error>::from)
                    .and_then(|path| {
                        let destination = self.destination()?;
                        self.move_folder(&path, &destination)
                    }),
                MenuAction::Exit => return Ok(()),
            };

            if let Err(e) = result {
                output::print_error(&e.to_string());
            }
            println!();
        }
    }

    fn clean_temp(&self) -> CliResult {
        let temp = env::temp_dir();
        let approved = if self.args.yes {
            true
        } else if self.interactive {
            interactive::confirm(
                &format!("Delete everything in {}?", temp.display()),
                false,
            )?
        } else {
            return Err("cleaning the temp folder needs --yes in non-interactive mode".into());
        };

        if !approved {
            println!("Nothing deleted.");
            return Ok(());
        }

        let report = purge_directory_contents(&temp);
        output::print_purge_report(&temp, &report);
        Ok(())
    }

    fn move_documents(&self) -> CliResult {
        let documents = dirs::document_dir().ok_or("could not locate the documents folder")?;
        let destination = self.destination()?;
        self.move_folder(&documents, &destination)
    }

    fn move_app_data(&self) -> CliResult {
        let root = match &self.args.root {
            Some(root) => absolute(root)?,
            None => dirs::data_dir().ok_or("could not locate the application data folder")?,
        };

        let entries = {
            let bar = self.progress.create_scanning_bar(0);
            let result = collect_with_progress(&root, |current, total, path| {
                bar.set_length(total as u64);
                bar.set_position(current as u64);
                bar.set_message(
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                );
            });
            bar.finish_and_clear();
            result?
        };

        let ranked = top_n(&entries, self.config.display_count);
        output::print_ranked(ranked);

        if !self.interactive {
            println!("Use `spaceshift move <path>` to move one of these folders.");
            return Ok(());
        }

        let selected = interactive::select_folders(ranked)?;
        if selected.is_empty() {
            println!("No folders selected.");
            return Ok(());
        }
        let chosen: Vec<PathBuf> = selected.iter().map(|&i| ranked[i].path.clone()).collect();

        let destination = self.destination()?;
        for path in &chosen {
            if let Err(e) = self.move_folder(path, &destination) {
                output::print_error(&e.to_string());
            }
        }
        Ok(())
    }

    /// Move one folder to `destination` and link it back.
    fn move_folder(&self, path: &Path, destination: &Path) -> CliResult {
        let path = absolute(path)?;
        if is_link(&path) {
            output::print_warning(&format!("{} has already been moved", path.display()));
            return Ok(());
        }
        if !path.is_dir() {
            return Err(TransferError::SourceMissing { path }.into());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("{} has no folder name", path.display()))?;
        let size = calculate_size(&path);
        println!(
            "Moving {} ({}) to {}",
            path.display(),
            output::format_size(size),
            destination.display()
        );

        let target = match self.relocator.prepare_target(&path, destination, &name, size) {
            Ok(target) => target,
            Err(TransferError::Cancelled { path: existing }) => {
                output::print_warning(&format!(
                    "Skipped {name}, {} already exists",
                    existing.display()
                ));
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let bar = self.progress.create_copy_bar(&name);
        let result = self.relocator.transfer(&path, &target, |progress| {
            bar.set_length(progress.files_total);
            bar.set_position(progress.files_copied);
        });
        bar.finish_and_clear();
        self.progress.clear();

        match result {
            Ok(report) => {
                output::print_transfer_report(&report);
                if report.is_linked() {
                    output::print_success(&format!("{name} moved"));
                }
                Ok(())
            }
            Err(e) => {
                if let TransferError::LinkFailedAfterDelete {
                    source_dir,
                    destination,
                    ..
                } = &e
                {
                    output::print_data_moved_without_link(source_dir, destination);
                }
                Err(e.into())
            }
        }
    }

    /// Destination from `--dest`, or picked from the detected volumes.
    fn destination(&self) -> Result<PathBuf, Box<dyn Error>> {
        if let Some(dest) = &self.args.dest {
            return absolute(dest);
        }
        if !self.interactive {
            return Err("--dest is required in non-interactive mode".into());
        }

        let volumes = list_destination_volumes();
        let chosen = interactive::select_destination(&volumes)?;
        absolute(&chosen)
    }
}

/// Make `path` absolute and normalize `.` and `..` components.
fn absolute(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    Ok(std::path::absolute(path)?.clean())
}
