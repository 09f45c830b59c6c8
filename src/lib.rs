//! Lazy IoC container: components are created by their factories on first resolution,
//! cached per [`Lifetime`], and circular construction chains are reported as errors instead of
//! deadlocking or overflowing the stack.

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod diagnostics;
pub(crate) mod errors;
pub(crate) mod global;
pub(crate) mod inject;
pub(crate) mod key;
pub(crate) mod lifetime;
pub(crate) mod path;
pub(crate) mod registry;
pub(crate) mod scope;

pub use any::TypeInfo;
pub use config::Config;
pub use container::Container;
pub use diagnostics::{InstanceInfo, Stats};
pub use errors::{CycleNode, CyclePath, InstantiateErrorKind, ResolveErrorKind};
pub use global::{active_scope_id, begin_scope, global, instance_count, reset, resolve, resolve_with, try_resolve_with, with_scope};
pub use inject::{Constructor, Dependencies, Factory};
pub use key::FactoryKey;
pub use lifetime::Lifetime;
pub use scope::{ScopeGuard, ScopeId};
