//! Interactive prompts using dialoguer.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io;
use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, MultiSelect, Select};
use spaceshift_inventory::DirectoryEntry;
use spaceshift_operations::{TransferHooks, Volume};
use spaceshift_process::LockedFileReport;

use crate::output;
use crate::progress::ProgressManager;

/// Word the user must type to confirm a manual deletion.
const MANUAL_DELETE_ACK: &str = "YES";

/// Main menu choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Empty the temp folder.
    CleanTemp,
    /// Move the documents folder.
    Documents,
    /// Rank and move application data folders.
    AppData,
    /// Move a folder picked by path.
    MoveFolder,
    /// Leave the menu.
    Exit,
}

const MENU: [(MenuAction, &str); 5] = [
    (MenuAction::CleanTemp, "Clean the temp folder"),
    (MenuAction::Documents, "Move the documents folder"),
    (MenuAction::AppData, "Move application data folders"),
    (MenuAction::MoveFolder, "Move a specific folder..."),
    (MenuAction::Exit, "Exit"),
];

/// Show the main menu.
///
/// # Errors
///
/// * If the user cancels the selection
pub fn select_action() -> io::Result<MenuAction> {
    let items: Vec<&str> = MENU.iter().map(|(_, label)| *label).collect();
    let choice = Select::new()
        .with_prompt("What would you like to do?")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(MENU[choice].0)
}

/// Select which ranked folders to move.
///
/// Folders that were already moved are listed but cannot be chosen.
///
/// # Errors
///
/// * If the user cancels the selection
pub fn select_folders(entries: &[DirectoryEntry]) -> io::Result<Vec<usize>> {
    let movable: Vec<usize> = (0..entries.len())
        .filter(|&i| !entries[i].is_link)
        .collect();
    if movable.is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<String> = movable
        .iter()
        .map(|&i| {
            format!(
                "{} ({})",
                entries[i].name(),
                output::format_size(entries[i].size_bytes)
            )
        })
        .collect();

    let selections = MultiSelect::new()
        .with_prompt("Select folders to move (space to toggle, enter to confirm)")
        .items(&items)
        .interact()?;

    Ok(selections.into_iter().map(|i| movable[i]).collect())
}

/// Pick a destination from the detected volumes, or type one.
///
/// # Errors
///
/// * If the user cancels the prompts
pub fn select_destination(volumes: &[Volume]) -> io::Result<PathBuf> {
    if volumes.is_empty() {
        return prompt_path("Enter the destination folder");
    }

    let mut items: Vec<String> = volumes
        .iter()
        .map(|v| format!("{} {}", v.mount_point.display(), output::volume_space(v)))
        .collect();
    items.push("Other...".to_string());

    let choice = Select::new()
        .with_prompt("Select the destination volume")
        .items(&items)
        .default(0)
        .interact()?;

    if choice == volumes.len() {
        prompt_path("Enter the destination folder")
    } else {
        Ok(volumes[choice].mount_point.clone())
    }
}

/// Prompt for a folder path.
///
/// # Errors
///
/// * If the user cancels the input
pub fn prompt_path(prompt: &str) -> io::Result<PathBuf> {
    let path: String = Input::new().with_prompt(prompt).interact_text()?;

    Ok(PathBuf::from(path.trim()))
}

/// Ask a yes/no question.
///
/// # Errors
///
/// * If the user cancels the prompt
pub fn confirm(prompt: &str, default: bool) -> io::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Confirmation hooks answered at the terminal.
///
/// `--yes` and `--kill` pre-approve their prompts. Without a terminal every
/// other prompt is declined.
pub struct ConsolePrompts {
    interactive: bool,
    assume_overwrite: bool,
    assume_kill: bool,
    progress: ProgressManager,
}

impl ConsolePrompts {
    /// Create the prompt handler.
    #[must_use]
    pub const fn new(
        interactive: bool,
        assume_overwrite: bool,
        assume_kill: bool,
        progress: ProgressManager,
    ) -> Self {
        Self {
            interactive,
            assume_overwrite,
            assume_kill,
            progress,
        }
    }

    fn ask(&self, prompt: &str) -> bool {
        if !self.interactive {
            log::debug!("Declining without a terminal: {prompt}");
            return false;
        }
        self.progress
            .suspend(|| confirm(prompt, false))
            .unwrap_or_else(|e| {
                log::warn!("Prompt failed: {e}");
                false
            })
    }
}

impl TransferHooks for ConsolePrompts {
    fn confirm_overwrite(&self, path: &Path) -> bool {
        if self.assume_overwrite {
            return true;
        }
        self.ask(&format!(
            "{} already exists. Delete it and continue?",
            path.display()
        ))
    }

    fn confirm_kill(&self, report: &LockedFileReport) -> bool {
        self.progress.suspend(|| output::print_locked_report(report));
        if self.assume_kill {
            return true;
        }
        self.ask(&format!(
            "Terminate {} process(es) and retry?",
            report.process_ids().len()
        ))
    }

    fn await_manual_delete(&self, path: &Path, remaining: &[PathBuf]) -> bool {
        if !self.interactive {
            log::warn!(
                "Cannot wait for manual deletion of {} without a terminal, giving up",
                path.display()
            );
            return false;
        }

        self.progress.suspend(|| {
            output::print_remaining(path, remaining);
            let prompt = format!(
                "Delete {} manually, then type {MANUAL_DELETE_ACK} to continue",
                path.display()
            );
            wait_for_ack(|| {
                Input::<String>::new()
                    .with_prompt(&prompt)
                    .allow_empty(true)
                    .interact_text()
                    .map_err(io::Error::from)
            })
        })
    }
}

/// Read answers until one is [`MANUAL_DELETE_ACK`].
///
/// Returns `false` only when the prompt itself fails, since there is then
/// nobody left to wait for.
fn wait_for_ack<R>(mut read: R) -> bool
where
    R: FnMut() -> io::Result<String>,
{
    loop {
        match read() {
            Ok(answer) if answer.trim() == MANUAL_DELETE_ACK => return true,
            Ok(_) => println!("Type {MANUAL_DELETE_ACK} once the folder is deleted."),
            Err(e) => {
                log::warn!("Prompt failed: {e}");
                return false;
            }
        }
    }
}
