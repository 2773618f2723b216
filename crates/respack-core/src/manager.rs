//! The resource manager: registration, deferral, and the dependency cascade.
//!
//! `load_or_defer` either materializes a package right away or parks its
//! buffered bytes until every dependency is registered. Registering a named
//! package wakes whatever was waiting on that name, and each promoted
//! package may in turn wake others. The manager is driven from one thread;
//! all mutation goes through `&mut self`.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use respack_schema::{UsageMode, decompress_if_needed};

use crate::class_name::ClassNameRecordResolver;
use crate::error::ResourceError;
use crate::package::Package;
use crate::pending::{PendingPackage, PendingSet};
use crate::resolver::{TypeResolver, TypeResolverRegistry};

/// What `load_or_defer` did with a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The package was materialized and registered. `name` is empty for
    /// anonymous packages.
    Registered {
        /// Declared name.
        name: String,
    },
    /// The package is waiting for dependencies.
    Pending {
        /// Declared name.
        name: String,
        /// Dependencies not registered yet, sorted.
        unresolved: Vec<String>,
    },
}

/// Owns every registered and pending package.
#[derive(Debug, Default)]
pub struct ResourceManager {
    resolvers: TypeResolverRegistry,
    initialized: bool,
    anonymous: Vec<Arc<Package>>,
    named: HashMap<String, Arc<Package>>,
    by_class_name: HashMap<String, Arc<Package>>,
    pending: PendingSet,
    promotion_failures: Vec<ResourceError>,
}

impl ResourceManager {
    /// Create an empty manager with no resolvers.
    ///
    /// Call [`initialize`](Self::initialize) to install the built-in resolvers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager that decodes content with `resolvers`.
    pub fn with_resolvers(resolvers: TypeResolverRegistry) -> Self {
        Self {
            resolvers,
            ..Self::default()
        }
    }

    /// Install the built-in resolvers. Calling it again does nothing.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.resolvers.register(ClassNameRecordResolver);
        self.initialized = true;
        tracing::debug!("Resource manager initialized");
    }

    /// Drop every package and mark the manager uninitialized.
    ///
    /// Registered resolvers are kept.
    pub fn shutdown(&mut self) {
        self.unload_all();
        self.initialized = false;
        tracing::debug!("Resource manager shut down");
    }

    /// Whether [`initialize`](Self::initialize) has run since the last shutdown.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register a type resolver, replacing any previous one for its tag.
    pub fn register_type_resolver<R: TypeResolver + 'static>(&mut self, resolver: R) {
        self.resolvers.register(resolver);
    }

    /// The resolvers used to decode package content.
    pub fn resolvers(&self) -> &TypeResolverRegistry {
        &self.resolvers
    }

    /// Register a materialized package.
    ///
    /// Returns `Ok(false)` without side effects if this anonymous package
    /// object is already registered. Registering a named package promotes
    /// every pending package that was only waiting for it, transitively.
    /// A woken package that fails to materialize is discarded and queued
    /// for [`take_promotion_failures`](Self::take_promotion_failures); it
    /// does not fail this call.
    ///
    /// `usage` is recorded on the package the first time any manager
    /// registers it and is only reported back through [`Package::usage`].
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::DuplicateName`] if a package with the same
    /// name is registered; nothing is changed in that case.
    pub fn register(
        &mut self,
        package: Arc<Package>,
        usage: UsageMode,
    ) -> Result<bool, ResourceError> {
        let name = package.name().to_string();
        if !self.insert(package, usage)? {
            return Ok(false);
        }
        if !name.is_empty() {
            self.cascade(&name);
        }
        Ok(true)
    }

    /// Buffer a package stream and register it, or defer it until its
    /// dependencies are registered.
    ///
    /// A zstd-compressed stream is decompressed first.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Io`] if reading or decompression fails.
    /// - [`ResourceError::Descriptor`] / [`ResourceError::Format`] if the
    ///   stream is malformed, including a package with dependencies but no name.
    /// - [`ResourceError::Content`] if any entry fails to resolve.
    /// - [`ResourceError::DuplicateName`] as for [`register`](Self::register).
    ///
    /// A package that fails is neither registered nor left pending. Pending
    /// packages this load wakes up but that fail themselves do not make it
    /// fail; see [`take_promotion_failures`](Self::take_promotion_failures).
    pub fn load_or_defer<R: Read>(
        &mut self,
        mut reader: R,
        usage: UsageMode,
    ) -> Result<LoadOutcome, ResourceError> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let raw = Bytes::from(decompress_if_needed(buffer)?);

        let metadata = Package::read_descriptor(&raw)?;
        let unresolved: BTreeSet<String> = metadata
            .dependencies
            .iter()
            .filter(|dep| !self.named.contains_key(dep.as_str()))
            .cloned()
            .collect();

        if unresolved.is_empty() {
            let package = Arc::new(self.materialize(&raw)?);
            let name = package.name().to_string();
            self.register(package, usage)?;
            return Ok(LoadOutcome::Registered { name });
        }

        let name = metadata.name.clone();
        let waiting: Vec<String> = unresolved.iter().cloned().collect();
        tracing::debug!("Deferring '{name}' until {} are loaded", waiting.join(", "));
        self.pending
            .insert(PendingPackage::new(metadata, usage, raw, unresolved));

        Ok(LoadOutcome::Pending {
            name,
            unresolved: waiting,
        })
    }

    /// Open `path` and pass it to [`load_or_defer`](Self::load_or_defer).
    ///
    /// # Errors
    ///
    /// Same as [`load_or_defer`](Self::load_or_defer).
    pub fn load_file(
        &mut self,
        path: &Path,
        usage: UsageMode,
    ) -> Result<LoadOutcome, ResourceError> {
        let file = File::open(path)?;
        self.load_or_defer(BufReader::new(file), usage)
    }

    /// Registered package called `name`.
    pub fn get(&self, name: &str) -> Option<Arc<Package>> {
        self.named.get(name).cloned()
    }

    /// Package whose class-name record lists `full_name`.
    ///
    /// If several packages list the same class, the most recently
    /// registered one wins.
    pub fn get_by_class_name(&self, full_name: &str) -> Option<Arc<Package>> {
        self.by_class_name.get(full_name).cloned()
    }

    /// Registered anonymous packages, in registration order.
    pub fn anonymous(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.anonymous.iter()
    }

    /// Registered named packages, in no particular order.
    pub fn named(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.named.values()
    }

    /// Number of registered packages, named and anonymous.
    pub fn len(&self) -> usize {
        self.named.len() + self.anonymous.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of packages still waiting for dependencies.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Declared names of every pending package, sorted.
    ///
    /// Anything left here after all packages were handed over is waiting
    /// for a dependency that never arrived, or is part of a cycle.
    pub fn list_pending_names(&self) -> Vec<String> {
        self.pending.names()
    }

    /// Dependencies still missing for pending packages called `name`.
    ///
    /// Several pending packages may share a name; the result is the sorted
    /// union of what they wait for. Use [`pending`](Self::pending) to see
    /// each one separately.
    pub fn pending_dependencies(&self, name: &str) -> Option<Vec<String>> {
        self.pending.unresolved_of(name)
    }

    /// Every pending package as `(name, unresolved dependencies)`, sorted
    /// by name.
    pub fn pending(&self) -> Vec<(String, Vec<String>)> {
        self.pending.entries()
    }

    /// Pending packages that were discarded because they failed to
    /// materialize once their dependencies arrived, oldest first.
    ///
    /// Each is a [`ResourceError::Promotion`]. The list is emptied.
    pub fn take_promotion_failures(&mut self) -> Vec<ResourceError> {
        std::mem::take(&mut self.promotion_failures)
    }

    /// Drop every registered and pending package.
    pub fn unload_all(&mut self) {
        self.anonymous.clear();
        self.named.clear();
        self.by_class_name.clear();
        self.pending.clear();
        self.promotion_failures.clear();
    }

    fn materialize(&self, raw: &[u8]) -> Result<Package, ResourceError> {
        let mut errors = Vec::new();
        let package = Package::from_precompiled(raw, &self.resolvers, &mut errors)?;
        if !errors.is_empty() {
            return Err(ResourceError::Content(errors));
        }
        Ok(package)
    }

    /// Add `package` to the indices without running the cascade.
    fn insert(&mut self, package: Arc<Package>, usage: UsageMode) -> Result<bool, ResourceError> {
        if package.is_anonymous() {
            if self.anonymous.iter().any(|p| Arc::ptr_eq(p, &package)) {
                return Ok(false);
            }
            record_usage(&package, usage);
            index_class_names(&mut self.by_class_name, &package);
            self.anonymous.push(package);
            tracing::debug!("Registered anonymous package ({usage})");
            return Ok(true);
        }

        match self.named.entry(package.name().to_string()) {
            Entry::Occupied(slot) => Err(ResourceError::DuplicateName(slot.key().clone())),
            Entry::Vacant(slot) => {
                record_usage(&package, usage);
                index_class_names(&mut self.by_class_name, &package);
                tracing::debug!("Registered package '{}' ({usage})", slot.key());
                slot.insert(package);
                Ok(true)
            }
        }
    }

    /// Promote everything that registering `name` unblocks, transitively.
    fn cascade(&mut self, name: &str) {
        let mut satisfied = VecDeque::from([name.to_string()]);

        while let Some(name) = satisfied.pop_front() {
            for pending in self.pending.satisfy(&name) {
                let pending_name = pending.metadata.name.clone();
                tracing::trace!("Promoting '{pending_name}' after '{name}' was registered");

                match self.promote(&pending) {
                    Ok(()) => satisfied.push_back(pending_name),
                    Err(source) => {
                        tracing::warn!("Discarding pending package '{pending_name}': {source}");
                        self.promotion_failures.push(ResourceError::Promotion {
                            name: pending_name,
                            source: Box::new(source),
                        });
                    }
                }
            }
        }
    }

    fn promote(&mut self, pending: &PendingPackage) -> Result<(), ResourceError> {
        let package = Arc::new(self.materialize(&pending.raw)?);
        self.insert(package, pending.usage)?;
        Ok(())
    }
}

fn record_usage(package: &Package, usage: UsageMode) {
    if !package.initialize(usage) {
        tracing::debug!(
            "Package '{}' keeps usage {} from an earlier registration",
            package.name(),
            package.usage().unwrap_or_default()
        );
    }
}

fn index_class_names(index: &mut HashMap<String, Arc<Package>>, package: &Arc<Package>) {
    if let Some(record) = package.class_name_record() {
        for class_name in &record.class_names {
            index.insert(class_name.clone(), Arc::clone(package));
        }
    }
}
