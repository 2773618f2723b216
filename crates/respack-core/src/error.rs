//! Fatal errors for package loading and registration

use respack_schema::{DescriptorError, FormatError};
use thiserror::Error;

use crate::resolver::ResolveError;

/// A failure that aborts the current operation.
///
/// Recoverable per-entry problems are [`ResolveError`]s collected into a
/// list; they only become a `ResourceError` when a whole package has to be
/// rejected because of them.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A package with this name is already registered.
    #[error("A package named '{0}' has already been registered")]
    DuplicateName(String),

    /// The stream does not start with a valid descriptor.
    #[error("Package does not contain a valid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    /// The stream framing is broken.
    #[error("Malformed package stream: {0}")]
    Format(#[from] FormatError),

    /// One or more content entries failed to resolve.
    #[error("Failed to load package content: {}", join_errors(.0))]
    Content(Vec<ResolveError>),

    /// A pending package could not be materialized once its dependencies arrived.
    #[error("Failed to promote pending package '{name}': {source}")]
    Promotion {
        /// Declared name of the pending package.
        name: String,
        /// Why materialization failed.
        #[source]
        source: Box<ResourceError>,
    },

    /// Reading the stream failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[ResolveError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
