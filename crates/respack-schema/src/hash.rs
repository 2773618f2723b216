//! Package digests

/// BLAKE3 digest of the exact bytes a package was decoded from.
///
/// Two loads of the same package file produce the same digest, which makes
/// it a cheap identity to print next to a package name when diagnosing
/// which build of a package ended up registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Blake3Hash(String);

impl Blake3Hash {
    /// Compute the BLAKE3 hash of `data`.
    pub fn compute(data: &[u8]) -> Self {
        Self(blake3::hash(data).to_hex().to_string())
    }

    /// Full 64-character hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Blake3Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
