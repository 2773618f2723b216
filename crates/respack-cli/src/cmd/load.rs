//! Load command

use crate::config::Config;
use crate::ui;
use anyhow::{Context, Result, bail};
use respack_core::ResourceManager;
use respack_schema::{PACKAGE_EXTENSION, UsageMode};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Load every package under `paths` (or the configured search paths).
pub fn load(
    paths: &[PathBuf],
    config: &Config,
    usage: UsageMode,
    strict: bool,
    quiet: bool,
) -> Result<()> {
    let roots = if paths.is_empty() {
        config.search_paths.as_slice()
    } else {
        paths
    };
    if roots.is_empty() {
        bail!("No package paths given and no search_paths configured");
    }

    let files = collect_package_files(roots)?;
    let mut manager = ResourceManager::new();
    manager.initialize();
    let mut discarded = Vec::new();

    for file in &files {
        let outcome = manager
            .load_file(file, usage)
            .with_context(|| format!("Failed to load {}", file.display()))?;
        if !quiet {
            ui::print_outcome(file, &outcome);
        }
        for failure in manager.take_promotion_failures() {
            ui::print_promotion_failure(&failure);
            discarded.push(failure);
        }
    }

    let pending = manager.pending();

    if !quiet {
        let mut named: Vec<_> = manager.named().collect();
        named.sort_by(|a, b| a.name().cmp(b.name()));

        if !manager.is_empty() {
            ui::print_package_header();
            for package in named.into_iter().chain(manager.anonymous()) {
                ui::print_package_row(package);
            }
        }
        if !pending.is_empty() {
            ui::print_pending(&pending);
        }
        ui::print_load_footer(manager.len(), pending.len());
    }

    if strict && !discarded.is_empty() {
        bail!(
            "{} pending package(s) failed to load once their dependencies arrived",
            discarded.len()
        );
    }
    if strict && !pending.is_empty() {
        let names: Vec<&str> = pending.iter().map(|(name, _)| name.as_str()).collect();
        bail!(
            "{} package(s) still waiting for dependencies: {}",
            pending.len(),
            names.join(", ")
        );
    }

    Ok(())
}

/// Expand directories into their `*.rpk` files, sorted by path.
fn collect_package_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        if !root.is_dir() {
            files.push(root.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root) {
            let entry =
                entry.with_context(|| format!("Failed to scan {}", root.display()))?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().is_some_and(|ext| ext == PACKAGE_EXTENSION)
            {
                found.push(path.to_path_buf());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}
