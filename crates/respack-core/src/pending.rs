//! Packages waiting for dependencies, and the reverse index that wakes them.

use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;
use respack_schema::{Descriptor, UsageMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct PendingId(u64);

/// A buffered package blocked on at least one unregistered dependency.
#[derive(Debug)]
pub(crate) struct PendingPackage {
    pub(crate) metadata: Descriptor,
    pub(crate) usage: UsageMode,
    pub(crate) raw: Bytes,
    unresolved: BTreeSet<String>,
}

impl PendingPackage {
    pub(crate) fn new(
        metadata: Descriptor,
        usage: UsageMode,
        raw: Bytes,
        unresolved: BTreeSet<String>,
    ) -> Self {
        debug_assert!(!unresolved.is_empty());
        debug_assert!(unresolved.is_subset(&metadata.dependencies));
        Self {
            metadata,
            usage,
            raw,
            unresolved,
        }
    }
}

/// All pending packages plus `dependency name -> pending ids`.
///
/// Every `(name, id)` pair in `by_dependency` corresponds to `name` being in
/// the `unresolved` set of package `id`, and the other way round.
#[derive(Debug, Default)]
pub(crate) struct PendingSet {
    next_id: u64,
    packages: HashMap<PendingId, PendingPackage>,
    by_dependency: HashMap<String, BTreeSet<PendingId>>,
}

impl PendingSet {
    pub(crate) fn insert(&mut self, package: PendingPackage) -> PendingId {
        let id = PendingId(self.next_id);
        self.next_id += 1;
        for dep in &package.unresolved {
            self.by_dependency.entry(dep.clone()).or_default().insert(id);
        }
        self.packages.insert(id, package);
        id
    }

    /// Mark `name` as registered.
    ///
    /// Returns the packages this left with no unresolved dependency; they
    /// are removed from the set and handed over to the caller.
    pub(crate) fn satisfy(&mut self, name: &str) -> Vec<PendingPackage> {
        let Some(ids) = self.by_dependency.remove(name) else {
            return Vec::new();
        };

        let ready: Vec<PendingId> = ids
            .into_iter()
            .filter(|id| {
                self.packages.get_mut(id).is_some_and(|package| {
                    package.unresolved.remove(name);
                    package.unresolved.is_empty()
                })
            })
            .collect();

        ready
            .into_iter()
            .filter_map(|id| self.packages.remove(&id))
            .collect()
    }

    /// Declared names of every pending package, sorted.
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .packages
            .values()
            .map(|p| p.metadata.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Sorted union of the unresolved dependencies of every pending package
    /// called `name`.
    pub(crate) fn unresolved_of(&self, name: &str) -> Option<Vec<String>> {
        let mut matches = self
            .packages
            .values()
            .filter(|p| p.metadata.name == name)
            .peekable();
        matches.peek()?;

        let union: BTreeSet<&String> = matches.flat_map(|p| &p.unresolved).collect();
        Some(union.into_iter().cloned().collect())
    }

    /// `(name, unresolved)` for every pending package, sorted.
    pub(crate) fn entries(&self) -> Vec<(String, Vec<String>)> {
        let mut entries: Vec<(String, Vec<String>)> = self
            .packages
            .values()
            .map(|p| {
                (
                    p.metadata.name.clone(),
                    p.unresolved.iter().cloned().collect(),
                )
            })
            .collect();
        entries.sort();
        entries
    }

    pub(crate) fn len(&self) -> usize {
        self.packages.len()
    }

    pub(crate) fn clear(&mut self) {
        self.packages.clear();
        self.by_dependency.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(name: &str, deps: &[&str]) -> PendingPackage {
        let mut metadata = Descriptor::named(name);
        for dep in deps {
            metadata = metadata.with_dependency(*dep);
        }
        let unresolved = metadata.dependencies.clone();
        PendingPackage::new(metadata, UsageMode::DataOnly, Bytes::new(), unresolved)
    }

    #[test]
    fn satisfying_the_last_dependency_releases_the_package() {
        let mut set = PendingSet::default();
        set.insert(pending("app", &["theme", "icons"]));

        assert!(set.satisfy("theme").is_empty());
        assert_eq!(set.unresolved_of("app").unwrap(), vec!["icons"]);

        let ready = set.satisfy("icons");
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].metadata.name, "app");
        assert_eq!(set.len(), 0);
        assert!(set.by_dependency.is_empty());
    }

    #[test]
    fn one_dependency_can_release_many() {
        let mut set = PendingSet::default();
        set.insert(pending("a", &["base"]));
        set.insert(pending("b", &["base"]));
        set.insert(pending("c", &["base", "extra"]));

        let mut released: Vec<String> = set
            .satisfy("base")
            .into_iter()
            .map(|p| p.metadata.name)
            .collect();
        released.sort();
        assert_eq!(released, vec!["a", "b"]);
        assert_eq!(set.names(), vec!["c"]);
        assert_eq!(set.by_dependency.keys().collect::<Vec<_>>(), vec!["extra"]);
    }

    #[test]
    fn unrelated_names_are_ignored() {
        let mut set = PendingSet::default();
        set.insert(pending("a", &["base"]));
        assert!(set.satisfy("other").is_empty());
        assert_eq!(set.satisfy("base").len(), 1);
        assert!(set.satisfy("base").is_empty());
    }

    #[test]
    fn same_name_pending_twice_keeps_both() {
        let mut set = PendingSet::default();
        set.insert(pending("a", &["y"]));
        set.insert(pending("a", &["x"]));

        assert_eq!(set.unresolved_of("a").unwrap(), vec!["x", "y"]);
        assert_eq!(
            set.entries(),
            vec![
                ("a".to_string(), vec!["x".to_string()]),
                ("a".to_string(), vec!["y".to_string()]),
            ]
        );

        set.satisfy("x");
        assert_eq!(set.unresolved_of("a").unwrap(), vec!["y"]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut set = PendingSet::default();
        set.insert(pending("a", &["base"]));
        set.clear();
        assert_eq!(set.len(), 0);
        assert!(set.satisfy("base").is_empty());
        assert!(set.unresolved_of("a").is_none());
    }
}
