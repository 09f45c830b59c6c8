//! Process-wide default container and shortcuts operating on it.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! struct Database;
//!
//! fn new_database() -> Database {
//!     Database
//! }
//!
//! let db = lazioc::resolve(new_database).unwrap();
//! assert!(Arc::ptr_eq(&db, &lazioc::resolve(new_database).unwrap()));
//! ```

use alloc::sync::Arc;
use once_cell::sync::Lazy;

use crate::{
    container::Container,
    errors::ResolveErrorKind,
    lifetime::Lifetime,
    scope::{ScopeGuard, ScopeId},
};

static GLOBAL: Lazy<Container> = Lazy::new(Container::new);

/// The process-wide container, created on first use.
#[inline]
#[must_use]
pub fn global() -> &'static Container {
    &GLOBAL
}

/// [`Container::resolve`] on the [`global`] container.
///
/// # Errors
/// See [`Container::resolve_with`].
#[inline]
pub fn resolve<T, F>(factory: F) -> Result<Arc<T>, ResolveErrorKind>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> T + 'static,
{
    GLOBAL.resolve(factory)
}

/// [`Container::resolve_with`] on the [`global`] container.
///
/// # Errors
/// See [`Container::resolve_with`].
#[inline]
pub fn resolve_with<T, F>(factory: F, lifetime: Lifetime) -> Result<Arc<T>, ResolveErrorKind>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> T + 'static,
{
    GLOBAL.resolve_with(factory, lifetime)
}

/// [`Container::try_resolve_with`] on the [`global`] container.
///
/// # Errors
/// See [`Container::try_resolve_with`].
#[inline]
pub fn try_resolve_with<T, E, F>(factory: F, lifetime: Lifetime) -> Result<Arc<T>, ResolveErrorKind>
where
    T: Send + Sync + 'static,
    E: Into<ResolveErrorKind>,
    F: FnOnce() -> Result<T, E> + 'static,
{
    GLOBAL.try_resolve_with(factory, lifetime)
}

#[inline]
#[must_use = "the scope ends as soon as the guard is dropped"]
pub fn begin_scope() -> ScopeGuard {
    GLOBAL.begin_scope()
}

#[inline]
pub fn with_scope<R>(body: impl FnOnce() -> R) -> R {
    GLOBAL.with_scope(body)
}

#[inline]
#[must_use]
pub fn active_scope_id() -> Option<ScopeId> {
    GLOBAL.active_scope_id()
}

#[inline]
pub fn reset() {
    GLOBAL.reset();
}

#[inline]
#[must_use]
pub fn instance_count() -> usize {
    GLOBAL.instance_count()
}
