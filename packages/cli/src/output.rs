//! Terminal output formatting.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use colored::Colorize;
use spaceshift_inventory::DirectoryEntry;
use spaceshift_operations::{FailureStage, PurgeReport, TransferReport, TransferState, Volume};
use spaceshift_process::LockedFileReport;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with a binary unit, e.g. `1.5 GB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

/// Print a header message.
pub fn print_header(message: &str) {
    println!("\n{} {}\n", "📦", message.bold());
}

/// Print ranked folders, largest first.
pub fn print_ranked(entries: &[DirectoryEntry]) {
    println!(
        "Largest {} folder{}:",
        entries.len(),
        if entries.len() == 1 { "" } else { "s" }
    );
    for (i, entry) in entries.iter().enumerate() {
        let marker = if entry.is_link {
            " (already moved)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>2}. {:<40} {:>10}{marker}",
            i + 1,
            entry.name().yellow(),
            format_size(entry.size_bytes)
        );
    }
    println!();
}

/// Print candidate destination volumes.
pub fn print_volumes(volumes: &[Volume]) {
    if volumes.is_empty() {
        println!("No destination volumes found.");
        return;
    }
    println!("Destination volumes:");
    for volume in volumes {
        println!(
            "  {} {} {}",
            "•".dimmed(),
            volume.mount_point.display().to_string().cyan(),
            volume_space(volume).dimmed()
        );
    }
}

/// Free and total space of a volume, e.g. `(12.0 GB free of 500.0 GB)`.
#[must_use]
pub fn volume_space(volume: &Volume) -> String {
    format!(
        "({} free of {})",
        format_size(volume.available_bytes),
        format_size(volume.total_bytes)
    )
}

/// Print which processes hold which files.
pub fn print_locked_report(report: &LockedFileReport) {
    println!("{}", "Files held open by other processes:".bold());
    for file in report.files.iter().filter(|f| !f.holders.is_empty()) {
        println!("  {}", file.path.display());
        for holder in &file.holders {
            println!("    {} {holder}", "↳".dimmed());
        }
    }
}

/// Print entries that survived deletion.
pub fn print_remaining(path: &Path, remaining: &[PathBuf]) {
    print_warning(&format!(
        "{} could not be deleted. Remaining entries:",
        path.display()
    ));
    for entry in remaining {
        println!("  {} {}", "•".dimmed(), entry.display());
    }
}

/// Print the outcome of a transfer.
pub fn print_transfer_report(report: &TransferReport) {
    let source = report.source.display();
    let destination = report.target.final_folder_path.display();

    match report.state {
        TransferState::Linked => {
            println!(
                "{} {source} -> {} ({} files)",
                "✓".green(),
                destination.to_string().cyan(),
                report.files_copied()
            );
        }
        TransferState::Failed(stage) => {
            print_warning(&format!("{source} was not moved: {}", describe_stage(stage)));
            for failed in &report.retried.still_failed {
                println!("  {} {failed}", "✗".red());
            }
            for failed in &report.copy.failed_directories {
                println!("  {} {failed}", "✗".red());
            }
            match stage {
                FailureStage::Copy | FailureStage::Directories => println!(
                    "  The copy at {destination} is incomplete; the original is unchanged."
                ),
                FailureStage::Delete | FailureStage::Link => println!(
                    "  The copy at {destination} is complete; parts of the original may be gone."
                ),
            }
        }
        state => print_warning(&format!("{source} stopped in state {state:?}")),
    }
}

const fn describe_stage(stage: FailureStage) -> &'static str {
    match stage {
        FailureStage::Copy => "some files could not be copied",
        FailureStage::Directories => "some folders could not be created",
        FailureStage::Delete => "the original folder could not be deleted",
        FailureStage::Link => "the link could not be created",
    }
}

/// Print a loud notice that data only exists at its new location.
pub fn print_data_moved_without_link(source: &Path, destination: &Path) {
    eprintln!();
    eprintln!("{}", "!!! LINK CREATION FAILED !!!".red().bold());
    eprintln!(
        "{} was deleted but could not be replaced with a link.",
        source.display()
    );
    eprintln!(
        "Your data is safe at: {}",
        destination.display().to_string().bold()
    );
    eprintln!("Create the link manually or move the folder back.");
    eprintln!();
}

/// Print the outcome of a temp purge.
pub fn print_purge_report(path: &Path, report: &PurgeReport) {
    println!(
        "{} Freed {} in {} ({} remain in use)",
        "✓".green(),
        format_size(report.freed()),
        path.display(),
        format_size(report.size_after)
    );
}

/// Print success message.
pub fn print_success(message: &str) {
    println!("{} {message}", "✅");
}

/// Print error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "Warning:".yellow().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn test_volume_space() {
        let volume = Volume {
            mount_point: PathBuf::from("/mnt/data"),
            total_bytes: 4 * 1024 * 1024 * 1024,
            available_bytes: 1024 * 1024 * 1024,
        };
        assert_eq!(volume_space(&volume), "(1.0 GB free of 4.0 GB)");
    }

    #[test]
    fn test_format_size_caps_at_largest_unit() {
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024 * 1024), "2048.0 TB");
    }
}
