use alloc::{sync::Arc, vec::Vec};
use core::any::type_name;
use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::{
    any::{self, RcAny, TypeInfo},
    errors::ResolveErrorKind,
    key::FactoryKey,
    lifetime::Lifetime,
    path::ResolutionPath,
};

/// A stored instance together with what is known about it.
#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) key: FactoryKey,
    pub(crate) value: RcAny,
    pub(crate) type_info: TypeInfo,
    pub(crate) lifetime: Lifetime,
}

impl Slot {
    #[inline]
    #[must_use]
    pub(crate) fn new<T: Send + Sync + 'static>(key: FactoryKey, value: Arc<T>, lifetime: Lifetime) -> Self {
        Self {
            key,
            value,
            type_info: TypeInfo::of::<T>(),
            lifetime,
        }
    }

    pub(crate) fn downcast<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.value.clone().downcast::<T>().map_err(|_| {
            let err = ResolveErrorKind::TypeMismatch {
                expected: type_name::<T>(),
                actual: self.type_info.name,
                factory: Some(self.key.name()),
            };
            error!("{}", err);
            err
        })
    }
}

/// Process-lifetime store of singleton instances, keyed by factory.
pub(crate) struct SingletonCache {
    map: RwLock<any::Map>,
}

impl SingletonCache {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            map: RwLock::new(any::Map::new()),
        }
    }

    #[must_use]
    pub(crate) fn get<T: Send + Sync + 'static>(&self, key: &FactoryKey) -> Option<Result<Arc<T>, ResolveErrorKind>> {
        self.map.read().get(key).map(Slot::downcast)
    }

    /// Returns the cached instance of `key` or creates it with `factory`, reporting whether it was created.
    ///
    /// The factory runs with `key` pushed onto the calling thread's path and outside of any lock,
    /// so two threads racing on a cold key may both run it. Only the first stored instance is kept,
    /// the other one is dropped and every caller gets the kept one.
    ///
    /// The caller is expected to have checked `path` for a cycle on `key`.
    pub(crate) fn get_or_create<T, F>(&self, key: FactoryKey, path: &ResolutionPath, factory: F) -> Result<(Arc<T>, bool), ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, ResolveErrorKind>,
    {
        if let Some(cached) = self.get::<T>(&key) {
            debug!("Found in cache");
            return cached.map(|instance| (instance, false));
        }
        debug!("Not found in cache");

        let instance = Arc::new(path.with_key_pushed(key, factory)?);

        let mut guard = self.map.write();
        if let Some(slot) = guard.get(&key) {
            warn!("Instance created concurrently, keeping the first stored one");
            return slot.downcast().map(|instance| (instance, false));
        }
        guard.insert(key, Slot::new(key, instance.clone(), Lifetime::Singleton));
        debug!("Cached");

        Ok((instance, true))
    }

    #[must_use]
    pub(crate) fn type_name(&self, key: &FactoryKey) -> Option<&'static str> {
        self.map.read().get(key).map(|slot| slot.type_info.name)
    }

    /// Removes the instance of `key`, returning `true` if it was cached.
    /// Holders of the instance keep it alive; the next resolution creates a new one.
    pub(crate) fn release(&self, key: &FactoryKey) -> bool {
        // Dropped after the lock is released, the instance's `Drop` may use the container
        let removed = self.map.write().remove(key);
        removed.is_some()
    }

    /// Removes all instances, returning how many there were.
    pub(crate) fn clear(&self) -> usize {
        let map = core::mem::take(&mut *self.map.write());
        map.len()
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.read().len()
    }

    #[must_use]
    pub(crate) fn slots(&self) -> Vec<Slot> {
        self.map.read().values().cloned().collect()
    }
}

impl Default for SingletonCache {
    fn default() -> Self {
        Self::new()
    }
}
