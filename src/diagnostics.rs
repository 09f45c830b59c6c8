use alloc::vec::Vec;
use core::fmt::{self, Display, Formatter};
use tracing::info;

use crate::{any::TypeInfo, cache::Slot, container::Container, key::FactoryKey, lifetime::Lifetime, scope::ScopeId};

/// Description of a cached instance.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub key: FactoryKey,
    pub type_info: TypeInfo,
    pub lifetime: Lifetime,
    /// Scope holding the instance, `None` for singletons.
    pub scope: Option<ScopeId>,
}

impl InstanceInfo {
    fn from_slot(slot: &Slot, scope: Option<&ScopeId>) -> Self {
        Self {
            key: slot.key,
            type_info: slot.type_info,
            lifetime: slot.lifetime,
            scope: scope.cloned(),
        }
    }
}

impl Display for InstanceInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Factory: {}, Key: {}, Type: {}, Lifetime: {}",
            self.key.name(),
            self.key,
            self.type_info.short_name(),
            self.lifetime,
        )?;
        if let Some(scope) = &self.scope {
            write!(f, ", Scope: {scope}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub singletons: usize,
    pub scoped: usize,
    pub active_scopes: usize,
    pub registered: usize,
    /// Depth of the calling thread's resolution path
    pub resolution_depth: usize,
}

impl Container {
    /// Cached singletons, ordered by key.
    #[must_use]
    pub fn instances(&self) -> Vec<InstanceInfo> {
        self.inner
            .singletons
            .slots()
            .iter()
            .map(|slot| InstanceInfo::from_slot(slot, None))
            .collect()
    }

    /// Instances of the active scope, `None` without an active scope.
    #[must_use]
    pub fn scoped_instances(&self) -> Option<Vec<InstanceInfo>> {
        let scope = self.inner.scopes.active()?;
        Some(
            scope
                .slots()
                .iter()
                .map(|slot| InstanceInfo::from_slot(slot, Some(scope.id())))
                .collect(),
        )
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        Stats {
            singletons: self.instance_count(),
            scoped: self.scoped_instance_count(),
            active_scopes: self.inner.scopes.depth(),
            registered: self.registered_count(),
            resolution_depth: self.inner.path.depth(),
        }
    }

    /// Emits an `INFO` event per cached instance, singletons first.
    pub fn log_instances(&self) {
        let singletons = self.instances();
        let scoped = self.scoped_instances().unwrap_or_default();

        info!(singletons = singletons.len(), scoped = scoped.len(), "Cached instances");
        for instance in singletons.iter().chain(&scoped) {
            info!("{}", instance);
        }
    }
}
