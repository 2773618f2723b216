//! Dependency-resolving resource loader.
//!
//! Packages arrive as byte streams. A [`ResourceManager`] registers a package
//! as soon as every package it depends on is registered, and otherwise
//! parks the buffered bytes until the last dependency shows up. Content
//! inside a package is decoded by pluggable [`TypeResolver`]s looked up by
//! type tag.

pub mod class_name;
pub mod error;
pub mod manager;
pub mod package;
mod pending;
pub mod resolver;

pub use class_name::{
    CLASS_NAME_RECORD_PATH, CLASS_NAME_RECORD_TYPE, ClassNameRecord, ClassNameRecordResolver,
};
pub use error::ResourceError;
pub use manager::{LoadOutcome, ResourceManager};
pub use package::{ContentEntry, Package, PackageBuilder};
pub use resolver::{
    BinaryResolver, Capability, Content, ResolveError, TextResolver, TypeResolver,
    TypeResolverRegistry,
};

pub use respack_schema::{Descriptor, UsageMode};
