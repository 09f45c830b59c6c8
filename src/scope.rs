use alloc::{format, sync::Arc, vec::Vec};
use core::{
    fmt::{self, Display, Formatter},
    sync::atomic::{AtomicU64, Ordering},
};
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    any,
    cache::Slot,
    errors::ResolveErrorKind,
    key::FactoryKey,
    lifetime::Lifetime,
    path::ResolutionPath,
    Container,
};

/// Identifier of a scope, unique within the container that started it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(Arc<str>);

impl ScopeId {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ScopeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Instances of one scope ("request").
pub(crate) struct ScopeContext {
    id: ScopeId,
    instances: RwLock<any::Map>,
}

impl ScopeContext {
    #[must_use]
    fn new(id: ScopeId) -> Self {
        Self {
            id,
            instances: RwLock::new(any::Map::new()),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn id(&self) -> &ScopeId {
        &self.id
    }

    #[must_use]
    pub(crate) fn get<T: Send + Sync + 'static>(&self, key: &FactoryKey) -> Option<Result<Arc<T>, ResolveErrorKind>> {
        self.instances.read().get(key).map(Slot::downcast)
    }

    /// Stores `instance` unless another one was stored for `key` meanwhile, returns the stored one.
    pub(crate) fn insert_if_absent<T: Send + Sync + 'static>(&self, key: FactoryKey, instance: Arc<T>) -> Result<Arc<T>, ResolveErrorKind> {
        let mut guard = self.instances.write();
        if let Some(slot) = guard.get(&key) {
            debug!(scope = %self.id, "Instance created concurrently, keeping the first stored one");
            return slot.downcast();
        }
        guard.insert(key, Slot::new(key, instance.clone(), Lifetime::Scoped));
        debug!(scope = %self.id, "Cached in scope");

        Ok(instance)
    }

    #[must_use]
    pub(crate) fn type_name(&self, key: &FactoryKey) -> Option<&'static str> {
        self.instances.read().get(key).map(|slot| slot.type_info.name)
    }

    pub(crate) fn clear(&self) -> usize {
        let instances = core::mem::take(&mut *self.instances.write());
        instances.len()
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.instances.read().len()
    }

    #[must_use]
    pub(crate) fn slots(&self) -> Vec<Slot> {
        self.instances.read().values().cloned().collect()
    }
}

/// Stack of started scopes, the last one is active.
///
/// There is a single stack per container, shared by every thread using the container.
/// Scopes of two logical requests must not overlap in time on the same container:
/// an instance resolved in one would be visible to the other.
/// Use a separate [`Container`] per concurrent request to isolate them.
pub(crate) struct ScopeStack {
    stack: RwLock<Vec<Arc<ScopeContext>>>,
    next_id: AtomicU64,
    prefix: &'static str,
}

impl ScopeStack {
    #[must_use]
    pub(crate) fn new(prefix: &'static str) -> Self {
        Self {
            stack: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            prefix,
        }
    }

    pub(crate) fn begin(&self) -> ScopeId {
        let number = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = ScopeId(format!("{}-{number}", self.prefix).into());

        let mut stack = self.stack.write();
        stack.push(Arc::new(ScopeContext::new(id.clone())));
        debug!(scope = %id, depth = stack.len(), "Scope started");

        id
    }

    /// Ends the scope with `id` and every scope started after it, clearing their instances
    /// and making the scope that was active before it active again.
    ///
    /// Returns `false` without doing anything if the scope was already ended or discarded.
    pub(crate) fn end(&self, id: &ScopeId) -> bool {
        let ended = {
            let mut stack = self.stack.write();
            let Some(position) = stack.iter().position(|scope| scope.id() == id) else {
                debug!(scope = %id, "Scope already ended");
                return false;
            };
            stack.split_off(position)
        };

        for scope in ended.iter().rev() {
            let count = scope.clear();
            debug!(scope = %scope.id(), count, "Scope ended");
        }
        true
    }

    #[must_use]
    pub(crate) fn active(&self) -> Option<Arc<ScopeContext>> {
        self.stack.read().last().cloned()
    }

    #[must_use]
    pub(crate) fn active_id(&self) -> Option<ScopeId> {
        self.stack.read().last().map(|scope| scope.id().clone())
    }

    #[must_use]
    pub(crate) fn depth(&self) -> usize {
        self.stack.read().len()
    }

    /// Discards every scope, returning how many instances they held.
    pub(crate) fn clear(&self) -> usize {
        let discarded = core::mem::take(&mut *self.stack.write());
        discarded.iter().rev().map(|scope| scope.clear()).sum()
    }

    /// Returns the instance of `key` in the active scope, creating it with `factory` if needed.
    /// Without an active scope the factory is called every time and nothing is cached.
    ///
    /// The caller is expected to have checked `path` for a cycle on `key`.
    pub(crate) fn resolve<T, F>(&self, key: FactoryKey, path: &ResolutionPath, factory: F) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, ResolveErrorKind>,
    {
        let Some(scope) = self.active() else {
            debug!("No active scope, resolving as transient");
            return factory().map(Arc::new);
        };

        if let Some(cached) = scope.get::<T>(&key) {
            debug!(scope = %scope.id(), "Found in scope");
            return cached;
        }
        debug!(scope = %scope.id(), "Not found in scope");

        let instance = Arc::new(path.with_key_pushed(key, factory)?);
        scope.insert_if_absent(key, instance)
    }
}

/// Handle of a started scope. Ends the scope when dropped, or explicitly with [`ScopeGuard::end`].
///
/// Ending a scope clears its instances and restores the previously active scope.
/// If the scope was already discarded (for example by [`Container::reset`]), ending it does nothing.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    container: Container,
    id: ScopeId,
    ended: bool,
}

impl ScopeGuard {
    #[inline]
    pub(crate) fn new(container: Container, id: ScopeId) -> Self {
        Self {
            container,
            id,
            ended: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &ScopeId {
        &self.id
    }

    /// Ends the scope, returning `false` if it was already discarded.
    pub fn end(mut self) -> bool {
        self.ended = true;
        self.container.end_scope(&self.id)
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if !self.ended {
            self.container.end_scope(&self.id);
        }
    }
}
