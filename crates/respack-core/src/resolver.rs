//! Type resolvers and their registry.
//!
//! A resolver owns the encoding of one content type, identified by a type
//! tag. Resolvers advertise two independent capabilities: a text form
//! ([`TextResolver`]) and a precompiled binary form ([`BinaryResolver`]).
//! Callers go through [`TypeResolverRegistry`], which checks the capability
//! before dispatching and reports a missing one as a [`ResolveError`]
//! instead of failing hard.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::class_name::ClassNameRecordResolver;

/// A decoded, type-erased content value.
///
/// Recover the concrete type with [`Package::get_as`](crate::Package::get_as).
pub type Content = Arc<dyn Any + Send + Sync>;

/// A resolver capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Parse and produce a textual markup form.
    Text,
    /// Read and write the precompiled binary form.
    Binary,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text form"),
            Self::Binary => write!(f, "precompiled binary form"),
        }
    }
}

/// Recoverable, per-entry resolution failure.
///
/// These are collected into a caller-supplied list; the caller decides
/// whether the operation as a whole has failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No resolver is registered for the entry's type tag.
    #[error("No resolver registered for type '{tag}' (at '{path}')")]
    UnknownType {
        /// Content path of the entry.
        path: String,
        /// Type tag that was looked up.
        tag: String,
    },

    /// The resolver exists but does not support the required capability.
    #[error("Resolver for type '{tag}' does not support the {capability} (at '{path}')")]
    UnsupportedCapability {
        /// Content path of the entry.
        path: String,
        /// Type tag of the resolver.
        tag: String,
        /// The capability that was required.
        capability: Capability,
    },

    /// The payload could not be decoded.
    #[error("Failed to decode '{tag}' at '{path}': {message}")]
    Decode {
        /// Content path of the entry.
        path: String,
        /// Type tag of the resolver.
        tag: String,
        /// Decoder message.
        message: String,
    },

    /// The value could not be encoded.
    #[error("Failed to encode '{tag}' at '{path}': {message}")]
    Encode {
        /// Content path of the entry.
        path: String,
        /// Type tag of the resolver.
        tag: String,
        /// Encoder message.
        message: String,
    },

    /// The value handed to a resolver is not the type it handles.
    #[error("Content at '{path}' is not a {expected}")]
    TypeMismatch {
        /// Content path of the entry.
        path: String,
        /// Name of the expected Rust type.
        expected: &'static str,
    },
}

/// Codec for one content type.
///
/// Implementors return `Some(self)` from the accessor of each capability
/// they support. The boolean queries are derived from the accessors and
/// rarely need overriding.
pub trait TypeResolver: Send + Sync {
    /// The type tag this resolver handles.
    fn type_tag(&self) -> &str;

    /// Text-form capability, if supported.
    fn as_text(&self) -> Option<&dyn TextResolver> {
        None
    }

    /// Binary-direct capability, if supported.
    fn as_binary(&self) -> Option<&dyn BinaryResolver> {
        None
    }

    /// Whether the resolver can parse and produce a text form.
    fn text_serializable(&self) -> bool {
        self.as_text().is_some()
    }

    /// Whether the resolver can read and write the precompiled binary form.
    fn binary_serializable(&self) -> bool {
        self.as_binary().is_some()
    }
}

/// Text-form capability.
pub trait TextResolver {
    /// Parse `text` into a content value, appending failures to `errors`.
    fn parse_text(
        &self,
        path: &str,
        text: &str,
        errors: &mut Vec<ResolveError>,
    ) -> Option<Content>;

    /// Render a content value as text.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if `content` is not the resolver's type.
    fn to_text(&self, path: &str, content: &Content) -> Result<String, ResolveError>;
}

/// Binary-direct capability.
///
/// The encoding must be context-free: `deserialize_precompiled` only ever
/// sees the bytes `serialize_precompiled` produced for that one entry.
pub trait BinaryResolver {
    /// Append the binary form of `content` to `out`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if `content` is not the resolver's type or
    /// cannot be encoded.
    fn serialize_precompiled(
        &self,
        path: &str,
        content: &Content,
        out: &mut Vec<u8>,
    ) -> Result<(), ResolveError>;

    /// Decode one entry, appending failures to `errors`.
    fn deserialize_precompiled(
        &self,
        path: &str,
        input: &[u8],
        errors: &mut Vec<ResolveError>,
    ) -> Option<Content>;
}

/// Resolvers keyed by type tag.
#[derive(Clone, Default)]
pub struct TypeResolverRegistry {
    resolvers: HashMap<String, Arc<dyn TypeResolver>>,
}

impl std::fmt::Debug for TypeResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeResolverRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl TypeResolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in resolvers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ClassNameRecordResolver);
        registry
    }

    /// Register a resolver under its type tag.
    ///
    /// A resolver already registered for the same tag is replaced. Returns
    /// `true` if that happened.
    pub fn register<R: TypeResolver + 'static>(&mut self, resolver: R) -> bool {
        let tag = resolver.type_tag().to_string();
        let replaced = self.resolvers.insert(tag.clone(), Arc::new(resolver)).is_some();
        if replaced {
            tracing::debug!("Replaced type resolver for '{tag}'");
        } else {
            tracing::debug!("Registered type resolver for '{tag}'");
        }
        replaced
    }

    /// Look up the resolver for `tag`.
    pub fn get(&self, tag: &str) -> Option<Arc<dyn TypeResolver>> {
        self.resolvers.get(tag).cloned()
    }

    /// Registered type tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Number of registered resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether no resolver is registered.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Decode a precompiled entry with the resolver for `tag`.
    ///
    /// An unknown tag or a resolver without binary support is appended to
    /// `errors` and yields `None`.
    pub fn deserialize_precompiled(
        &self,
        path: &str,
        tag: &str,
        input: &[u8],
        errors: &mut Vec<ResolveError>,
    ) -> Option<Content> {
        let Some(resolver) = self.resolvers.get(tag) else {
            errors.push(ResolveError::UnknownType {
                path: path.to_string(),
                tag: tag.to_string(),
            });
            return None;
        };
        let Some(binary) = resolver.as_binary() else {
            errors.push(ResolveError::UnsupportedCapability {
                path: path.to_string(),
                tag: tag.to_string(),
                capability: Capability::Binary,
            });
            return None;
        };
        binary.deserialize_precompiled(path, input, errors)
    }

    /// Encode `content` with the resolver for `tag`, appending to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownType`] or
    /// [`ResolveError::UnsupportedCapability`] if no resolver can write the
    /// binary form, or whatever the resolver itself reports.
    pub fn serialize_precompiled(
        &self,
        path: &str,
        tag: &str,
        content: &Content,
        out: &mut Vec<u8>,
    ) -> Result<(), ResolveError> {
        let resolver = self
            .resolvers
            .get(tag)
            .ok_or_else(|| ResolveError::UnknownType {
                path: path.to_string(),
                tag: tag.to_string(),
            })?;
        let binary = resolver
            .as_binary()
            .ok_or_else(|| ResolveError::UnsupportedCapability {
                path: path.to_string(),
                tag: tag.to_string(),
                capability: Capability::Binary,
            })?;
        binary.serialize_precompiled(path, content, out)
    }

    /// Parse the text form of an entry with the resolver for `tag`.
    ///
    /// Failures are appended to `errors` and yield `None`.
    pub fn parse_text(
        &self,
        path: &str,
        tag: &str,
        text: &str,
        errors: &mut Vec<ResolveError>,
    ) -> Option<Content> {
        let Some(resolver) = self.resolvers.get(tag) else {
            errors.push(ResolveError::UnknownType {
                path: path.to_string(),
                tag: tag.to_string(),
            });
            return None;
        };
        let Some(text_form) = resolver.as_text() else {
            errors.push(ResolveError::UnsupportedCapability {
                path: path.to_string(),
                tag: tag.to_string(),
                capability: Capability::Text,
            });
            return None;
        };
        text_form.parse_text(path, text, errors)
    }
}
