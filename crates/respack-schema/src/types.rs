//! Shared enums

use serde::{Deserialize, Serialize};

/// How a registered package is going to be used.
///
/// Recorded on the package the first time it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageMode {
    /// Content is only read as data (default).
    #[default]
    DataOnly,
    /// Content also backs class instantiation through the class-name index.
    InstanceClass,
}

impl UsageMode {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataOnly => "data-only",
            Self::InstanceClass => "instance-class",
        }
    }
}

impl std::fmt::Display for UsageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UsageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "data-only" | "data" => Ok(Self::DataOnly),
            "instance-class" | "instance" => Ok(Self::InstanceClass),
            _ => Err(format!("Unknown usage mode: {s}")),
        }
    }
}
