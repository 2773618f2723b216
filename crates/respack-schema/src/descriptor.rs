//! Package descriptor parsing.
//!
//! The descriptor is a small TOML document at the head of every package
//! stream:
//!
//! ```toml
//! name = "widgets"
//! dependencies = ["theme", "icons"]
//! ```
//!
//! Both keys are optional. An empty or missing `name` makes the package
//! anonymous.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing a descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// The descriptor text is not valid TOML for the descriptor schema.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The descriptor could not be rendered back to TOML.
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Dependencies were declared on a package nothing can refer to by name.
    #[error("The name of a package cannot be empty because it has dependencies: {}", .0.join(", "))]
    UnnamedWithDependencies(Vec<String>),
}

/// Name and dependency list embedded in a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    /// Registered name; empty for anonymous packages.
    #[serde(default)]
    pub name: String,
    /// Names of packages that must be registered before this one.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

impl Descriptor {
    /// Descriptor for a named package with no dependencies.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: BTreeSet::new(),
        }
    }

    /// Descriptor for an anonymous package.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add a dependency.
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Whether the package has no name.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    /// Check the descriptor invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::UnnamedWithDependencies`] if the package
    /// declares dependencies without having a name.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.is_anonymous() && !self.dependencies.is_empty() {
            return Err(DescriptorError::UnnamedWithDependencies(
                self.dependencies.iter().cloned().collect(),
            ));
        }
        Ok(())
    }

    /// Parse and validate descriptor text.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Parse`] for malformed TOML or unknown keys,
    /// and [`DescriptorError::UnnamedWithDependencies`] if the invariant
    /// checked by [`validate`](Self::validate) does not hold.
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let descriptor: Self = toml::from_str(text)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Render the descriptor as TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Serialize`] if rendering fails.
    pub fn to_text(&self) -> Result<String, DescriptorError> {
        Ok(toml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_dependencies() {
        let d = Descriptor::parse("name = \"widgets\"\ndependencies = [\"theme\", \"icons\"]")
            .unwrap();
        assert_eq!(d.name, "widgets");
        assert_eq!(
            d.dependencies.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["icons", "theme"]
        );
    }

    #[test]
    fn empty_text_is_anonymous() {
        let d = Descriptor::parse("").unwrap();
        assert!(d.is_anonymous());
        assert!(d.dependencies.is_empty());
    }

    #[test]
    fn dependencies_require_a_name() {
        let err = Descriptor::parse("dependencies = [\"theme\"]").unwrap_err();
        assert!(matches!(err, DescriptorError::UnnamedWithDependencies(ref deps) if deps == &["theme"]));

        let err = Descriptor::parse("name = \"\"\ndependencies = [\"theme\"]").unwrap_err();
        assert!(matches!(err, DescriptorError::UnnamedWithDependencies(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Descriptor::parse("name = \"a\"\nversion = 2"),
            Err(DescriptorError::Parse(_))
        ));
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!(Descriptor::parse("name = ").is_err());
        assert!(Descriptor::parse("dependencies = \"theme\"").is_err());
    }

    #[test]
    fn text_round_trips() {
        let d = Descriptor::named("widgets").with_dependency("theme");
        let back = Descriptor::parse(&d.to_text().unwrap()).unwrap();
        assert_eq!(back, d);
    }
}
