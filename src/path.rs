use alloc::vec::Vec;
use core::{
    cell::RefCell,
    iter,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    errors::{CycleNode, CyclePath},
    key::FactoryKey,
};

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy)]
struct Entry {
    owner: u64,
    generation: u64,
    key: FactoryKey,
}

thread_local! {
    // Shared by every container; each entry is tagged with the container that pushed it.
    static RESOLUTION_PATHS: RefCell<Vec<Entry>> = const { RefCell::new(Vec::new()) };
}

/// Chain of factories currently under construction by the calling thread, for one container.
///
/// The chain itself lives in thread-local storage, so threads never observe each other's chains
/// and no synchronization is needed to push or pop.
pub(crate) struct ResolutionPath {
    owner: u64,
    generation: AtomicU64,
}

impl ResolutionPath {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            owner: NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed),
            generation: AtomicU64::new(0),
        }
    }

    #[inline]
    fn owns(&self, entry: &Entry, generation: u64) -> bool {
        entry.owner == self.owner && entry.generation == generation
    }

    fn visit<R>(&self, f: impl FnOnce(&[Entry], u64) -> R) -> R {
        let generation = self.generation.load(Ordering::Acquire);
        RESOLUTION_PATHS.with(|paths| f(paths.borrow().as_slice(), generation))
    }

    #[must_use]
    pub(crate) fn current(&self) -> Vec<FactoryKey> {
        self.visit(|entries, generation| {
            entries
                .iter()
                .filter(|entry| self.owns(entry, generation))
                .map(|entry| entry.key)
                .collect()
        })
    }

    #[must_use]
    pub(crate) fn depth(&self) -> usize {
        self.visit(|entries, generation| entries.iter().filter(|entry| self.owns(entry, generation)).count())
    }

    #[must_use]
    pub(crate) fn would_cycle(&self, key: &FactoryKey) -> bool {
        self.visit(|entries, generation| {
            entries
                .iter()
                .any(|entry| self.owns(entry, generation) && entry.key == *key)
        })
    }

    /// Runs `body` with `key` appended to the calling thread's path.
    /// The path is restored when `body` returns or unwinds.
    pub(crate) fn with_key_pushed<R>(&self, key: FactoryKey, body: impl FnOnce() -> R) -> R {
        let _guard = PathGuard::push(Entry {
            owner: self.owner,
            generation: self.generation.load(Ordering::Acquire),
            key,
        });
        body()
    }

    /// Renders the cycle closed by `key`: the path from the first occurrence of `key`, then `key` itself.
    #[must_use]
    pub(crate) fn cycle_path(&self, key: &FactoryKey, type_name_of: impl Fn(&FactoryKey) -> Option<&'static str>) -> CyclePath {
        let path = self.current();
        let start = path.iter().position(|path_key| path_key == key).unwrap_or(path.len());

        let nodes = path[start..]
            .iter()
            .map(|path_key| CycleNode {
                key: *path_key,
                type_name: type_name_of(path_key),
            })
            .chain(iter::once(CycleNode { key: *key, type_name: None }))
            .collect::<Vec<_>>();

        CyclePath(nodes.into_boxed_slice())
    }

    /// Forgets the paths of every thread. Entries pushed before the reset stop counting,
    /// their guards still pop them.
    pub(crate) fn reset(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for ResolutionPath {
    fn default() -> Self {
        Self::new()
    }
}

struct PathGuard {
    len: usize,
}

impl PathGuard {
    fn push(entry: Entry) -> Self {
        RESOLUTION_PATHS.with(|paths| {
            let mut paths = paths.borrow_mut();
            let len = paths.len();
            paths.push(entry);
            Self { len }
        })
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        let _ = RESOLUTION_PATHS.try_with(|paths| paths.borrow_mut().truncate(self.len));
    }
}
