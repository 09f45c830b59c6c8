use alloc::{collections::BTreeMap, sync::Arc};
use core::any::{type_name, TypeId};
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::{
    any::{RcAny, TypeInfo},
    container::Container,
    errors::ResolveErrorKind,
};

/// Instances registered manually, one per type.
pub(crate) struct TypeRegistry {
    map: RwLock<BTreeMap<TypeId, (TypeInfo, RcAny)>>,
}

impl TypeRegistry {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
        }
    }

    pub(crate) fn insert_rc<T: Send + Sync + 'static>(&self, value: Arc<T>) -> Option<Arc<T>> {
        let previous = self.map.write().insert(TypeId::of::<T>(), (TypeInfo::of::<T>(), value));
        previous.and_then(|(_, previous)| previous.downcast().ok())
    }

    #[must_use]
    pub(crate) fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.map
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|(_, value)| value.clone().downcast().ok())
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.read().len()
    }

    pub(crate) fn clear(&self) -> usize {
        let map = core::mem::take(&mut *self.map.write());
        map.len()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Registers `value` as the instance of `T`, replacing and returning the previous one.
    #[inline]
    pub fn register_instance<T: Send + Sync + 'static>(&self, value: T) -> Option<Arc<T>> {
        self.register_instance_rc(Arc::new(value))
    }

    pub fn register_instance_rc<T: Send + Sync + 'static>(&self, value: Arc<T>) -> Option<Arc<T>> {
        let previous = self.inner.registry.insert_rc(value);
        debug!(type_name = type_name::<T>(), replaced = previous.is_some(), "Instance registered");
        previous
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::NotRegistered`] if no instance of `T` is registered
    pub fn get_instance<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.inner.registry.get().ok_or_else(|| {
            let err = ResolveErrorKind::NotRegistered {
                type_name: type_name::<T>(),
            };
            error!("{}", err);
            err
        })
    }

    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.inner.registry.len()
    }
}
