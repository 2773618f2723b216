//! Pack command

use anyhow::{Context, Result};
use respack_core::{
    CLASS_NAME_RECORD_PATH, CLASS_NAME_RECORD_TYPE, ClassNameRecord, PackageBuilder,
    TypeResolverRegistry,
};
use respack_schema::{Descriptor, compress};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Package manifest read by `respack pack`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackManifest {
    /// Package name; empty for an anonymous package.
    pub name: String,
    /// Names of packages that must be loaded first.
    pub dependencies: BTreeSet<String>,
    /// Class full names stored in the package's class-name record.
    pub class_names: Vec<String>,
}

impl PackManifest {
    /// Build the in-memory package this manifest describes.
    pub fn builder(&self) -> PackageBuilder {
        let descriptor = self.dependencies.iter().fold(
            if self.name.is_empty() {
                Descriptor::anonymous()
            } else {
                Descriptor::named(self.name.as_str())
            },
            |descriptor, dep| descriptor.with_dependency(dep.as_str()),
        );

        let builder = PackageBuilder::new(descriptor);
        if self.class_names.is_empty() {
            builder
        } else {
            builder.insert(
                CLASS_NAME_RECORD_PATH,
                CLASS_NAME_RECORD_TYPE,
                ClassNameRecord::new(self.class_names.iter().cloned()),
            )
        }
    }
}

/// Build a package file from a TOML manifest
pub fn pack(manifest: &Path, output: &Path, compressed: bool, quiet: bool) -> Result<()> {
    let text = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let manifest: PackManifest =
        toml::from_str(&text).with_context(|| format!("Invalid manifest {}", manifest.display()))?;

    let registry = TypeResolverRegistry::with_builtins();
    let mut bytes = manifest
        .builder()
        .to_bytes(&registry)
        .context("Failed to encode package")?;
    if compressed {
        bytes = compress(&bytes).context("Failed to compress package")?;
    }

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !quiet {
        println!(
            "  Packed {} ({} bytes) -> {}",
            crate::ui::display_name(&manifest.name),
            bytes.len(),
            output.display()
        );
    }
    Ok(())
}
