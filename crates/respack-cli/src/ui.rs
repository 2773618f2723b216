//! Output formatting
//!
//! Column-aligned rendering for `respack load` and `respack inspect`.

use crossterm::style::Stylize;
use respack_core::{LoadOutcome, Package, ResourceError};
use std::path::Path;

const NAME_WIDTH: usize = 24;
const USAGE_WIDTH: usize = 16;

/// Print one line per loaded file.
pub fn print_outcome(file: &Path, outcome: &LoadOutcome) {
    let file = file.display().to_string();
    match outcome {
        LoadOutcome::Registered { name } => {
            println!("  {} {} {}", "+".green(), display_name(name), file.dark_grey());
        }
        LoadOutcome::Pending { name, unresolved } => {
            println!(
                "  {} {} {} {}",
                "~".yellow(),
                display_name(name),
                file.dark_grey(),
                format!("(waiting for {})", unresolved.join(", ")).yellow()
            );
        }
    }
}

/// Print a pending package that was discarded instead of promoted.
///
/// Goes to stderr so it shows up even with `--quiet`.
pub fn print_promotion_failure(failure: &ResourceError) {
    match failure {
        ResourceError::Promotion { name, source } => {
            eprintln!("  {} {} {}", "!".red(), display_name(name), source.to_string().red());
        }
        other => eprintln!("  {} {}", "!".red(), other.to_string().red()),
    }
}

/// Print column headers for registered packages.
pub fn print_package_header() {
    println!();
    let header = format!(
        "  {:<NAME_WIDTH$} {:<USAGE_WIDTH$} {:>7}   {}",
        "name", "usage", "entries", "digest",
    );
    println!("{}", header.dark_grey());
}

/// Print a single registered package.
pub fn print_package_row(package: &Package) {
    let name = format!("{:<NAME_WIDTH$}", display_name(package.name()));
    let usage = package.usage().map_or("-", |u| u.as_str());
    let digest = package.digest().map_or("-", |d| d.short());
    println!(
        "  {} {:<USAGE_WIDTH$} {:>7}   {}",
        name.white().bold(),
        usage,
        package.len(),
        digest.dark_grey()
    );
}

/// Print packages still waiting for dependencies.
pub fn print_pending(pending: &[(String, Vec<String>)]) {
    println!();
    println!("  {}", format!("{} pending", pending.len()).yellow());
    for (name, deps) in pending {
        println!(
            "  {:<NAME_WIDTH$} {} {}",
            display_name(name),
            "waiting for".dark_grey(),
            deps.join(", ")
        );
    }
}

/// Print the summary line for `respack load`.
pub fn print_load_footer(registered: usize, pending: usize) {
    println!();
    let msg = format!("  {registered} registered, {pending} pending");
    println!("{}", msg.dark_grey());
}

/// Name column text; anonymous packages have no name.
pub fn display_name(name: &str) -> &str {
    if name.is_empty() { "(anonymous)" } else { name }
}
