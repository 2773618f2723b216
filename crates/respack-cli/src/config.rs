//! User configuration (`~/.respack/config.toml`)

use anyhow::{Context, Result};
use dirs::home_dir;
use respack_schema::UsageMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings read from `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Usage mode packages are registered with unless `--usage` is given.
    pub usage: UsageMode,
    /// Files or directories `load` reads when called without paths.
    pub search_paths: Vec<PathBuf>,
    /// Treat packages left waiting for dependencies as an error.
    pub strict: bool,
}

impl Config {
    /// Parse a config from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid config")
    }

    /// Load the config at `explicit`, or the default one if it exists.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// default config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config =
            Self::parse(&text).with_context(|| format!("In config {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Returns the respack home directory, or None if the user's home cannot be resolved.
pub fn try_respack_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("RESPACK_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".respack"))
}

/// Default config path: ~/.respack/config.toml
pub fn config_path() -> Option<PathBuf> {
    try_respack_home().map(|home| home.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn parses_every_field() {
        let config = Config::parse(
            r#"
            usage = "instance-class"
            search_paths = ["packs", "/opt/packs"]
            strict = true
            "#,
        )
        .unwrap();
        assert_eq!(config.usage, UsageMode::InstanceClass);
        assert_eq!(
            config.search_paths,
            vec![PathBuf::from("packs"), PathBuf::from("/opt/packs")]
        );
        assert!(config.strict);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::parse("colour = true").is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "strict = true").unwrap();
        assert!(Config::load(Some(&path)).unwrap().strict);
    }
}
