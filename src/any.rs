use alloc::{collections::BTreeMap, sync::Arc};
use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
};

use crate::{cache::Slot, key::FactoryKey};

/// Runtime descriptor of a stored value: its [`TypeId`] plus the readable name used in errors and listings.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let path = self.name.split('<').next().unwrap_or(self.name);
        path.rsplit_once("::").map_or(self.name, |(prefix, _)| &self.name[prefix.len() + 2..])
    }
}

pub(crate) type RcAny = Arc<dyn Any + Send + Sync>;

pub(crate) type Map = BTreeMap<FactoryKey, Slot>;

#[cfg(test)]
mod tests {
    use super::TypeInfo;

    mod inner {
        pub struct Database;
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<inner::Database>().short_name(), "Database");
        assert_eq!(TypeInfo::of::<u32>().short_name(), "u32");
        assert_eq!(
            TypeInfo::of::<inner::Wrapper<inner::Database>>().short_name(),
            "Wrapper<lazioc::any::tests::inner::Database>"
        );
    }

    #[test]
    fn test_eq_by_id() {
        assert_eq!(TypeInfo::of::<u8>(), TypeInfo::of::<u8>());
        assert_ne!(TypeInfo::of::<u8>(), TypeInfo::of::<i8>());
    }
}
