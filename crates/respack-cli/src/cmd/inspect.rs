//! Inspect command

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use respack_core::{ClassNameRecord, Package, TypeResolverRegistry};
use respack_schema::decompress_if_needed;
use std::path::Path;

/// Show the descriptor, digest and entries of a package file
pub fn inspect(file: &Path) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let bytes = decompress_if_needed(bytes)
        .with_context(|| format!("Failed to decompress {}", file.display()))?;

    let registry = TypeResolverRegistry::with_builtins();
    let mut errors = Vec::new();
    let package = Package::from_precompiled(&bytes, &registry, &mut errors)
        .with_context(|| format!("Failed to decode {}", file.display()))?;

    let lw = 14;
    let metadata = package.metadata();

    println!();
    println!("  {}", crate::ui::display_name(package.name()).white().bold());
    println!();
    if !metadata.dependencies.is_empty() {
        let deps: Vec<&str> = metadata.dependencies.iter().map(String::as_str).collect();
        println!("  {:<lw$}{}", "requires", deps.join(", "));
    }
    if let Some(digest) = package.digest() {
        println!("  {:<lw$}{}", "digest", digest.as_str().dark_grey());
    }
    println!("  {:<lw$}{}", "entries", package.len());

    for (path, entry) in package.entries() {
        println!("    {path} {}", format!("[{}]", entry.type_tag()).dark_grey());
        if let Some(record) = entry.value().downcast_ref::<ClassNameRecord>() {
            for class_name in &record.class_names {
                println!("      {class_name}");
            }
        }
    }

    // Entries of types this tool has no resolver for are still listed as errors.
    for error in &errors {
        println!("    {}", error.to_string().yellow());
    }

    Ok(())
}
