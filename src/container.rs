use alloc::sync::Arc;
use tracing::{debug, error, info, info_span};

use crate::{
    cache::SingletonCache,
    config::Config,
    errors::ResolveErrorKind,
    key::FactoryKey,
    lifetime::Lifetime,
    path::ResolutionPath,
    registry::TypeRegistry,
    scope::{ScopeGuard, ScopeId, ScopeStack},
};

/// Lazy IoC container.
///
/// Instances are created by factories (zero-argument functions or closures) on first resolution and
/// cached according to their [`Lifetime`]. The factory itself is the identity of the instance,
/// see [`FactoryKey`].
///
/// The container is a cheap handle: clones share the same instances, scopes and cycle detection.
/// Factories that resolve other dependencies capture a clone of it.
///
/// # Example
/// ```rust
/// use lazioc::{Container, Lifetime};
/// use std::sync::Arc;
///
/// struct Database;
/// struct UserService(Arc<Database>);
///
/// fn new_database() -> Database {
///     Database
/// }
///
/// let container = Container::new();
/// let user_service = container
///     .resolve({
///         let container = container.clone();
///         move || UserService(container.resolve(new_database).unwrap())
///     })
///     .unwrap();
///
/// assert!(Arc::ptr_eq(&user_service.0, &container.resolve(new_database).unwrap()));
/// assert!(!Arc::ptr_eq(
///     &container.resolve_with(new_database, Lifetime::Transient).unwrap(),
///     &container.resolve_with(new_database, Lifetime::Transient).unwrap(),
/// ));
/// ```
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) config: Config,
    pub(crate) singletons: SingletonCache,
    pub(crate) scopes: ScopeStack,
    pub(crate) registry: TypeRegistry,
    pub(crate) path: ResolutionPath,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                config,
                singletons: SingletonCache::new(),
                scopes: ScopeStack::new(config.scope_id_prefix),
                registry: TypeRegistry::new(),
                path: ResolutionPath::new(),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Gets the singleton produced by `factory`, creating it on first call.
    ///
    /// # Errors
    /// See [`Self::resolve_with`].
    #[inline]
    pub fn resolve<T, F>(&self, factory: F) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T + 'static,
    {
        self.resolve_with(factory, Lifetime::Singleton)
    }

    /// Gets the instance produced by `factory` for the given lifetime.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::InvalidArgument`] if `factory` is a function pointer or a trait object
    /// - Returns [`ResolveErrorKind::CircularDependency`] if `factory` is already being resolved on the calling thread
    pub fn resolve_with<T, F>(&self, factory: F, lifetime: Lifetime) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T + 'static,
    {
        let key = FactoryKey::of::<F>()?;
        self.resolve_by_key(key, lifetime, move || Ok(factory()))
    }

    /// Same as [`Self::resolve_with`] for factories that can fail.
    /// A failed factory caches nothing; the next resolution calls it again.
    ///
    /// Factories resolving other dependencies can return [`ResolveErrorKind`] and use `?` on nested resolutions.
    ///
    /// # Errors
    /// See [`Self::resolve_with`]. Errors of the factory are returned converted into [`ResolveErrorKind`].
    pub fn try_resolve_with<T, E, F>(&self, factory: F, lifetime: Lifetime) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        E: Into<ResolveErrorKind>,
        F: FnOnce() -> Result<T, E> + 'static,
    {
        let key = FactoryKey::of::<F>()?;
        self.resolve_by_key(key, lifetime, move || factory().map_err(factory_error))
    }

    /// Same as [`Self::resolve_with`] with an explicit key, for factories whose type doesn't identify them
    /// (function pointers, trait objects, closures borrowing their environment).
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::CircularDependency`] if `key` is already being resolved on the calling thread
    /// - Returns [`ResolveErrorKind::TypeMismatch`] if the instance cached for `key` isn't a `T`
    pub fn resolve_keyed<T, F>(&self, key: FactoryKey, factory: F, lifetime: Lifetime) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.resolve_by_key(key, lifetime, move || Ok(factory()))
    }

    /// Same as [`Self::resolve_keyed`] for factories that can fail.
    ///
    /// # Errors
    /// See [`Self::resolve_keyed`] and [`Self::try_resolve_with`].
    pub fn try_resolve_keyed<T, E, F>(&self, key: FactoryKey, factory: F, lifetime: Lifetime) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        E: Into<ResolveErrorKind>,
        F: FnOnce() -> Result<T, E>,
    {
        self.resolve_by_key(key, lifetime, move || factory().map_err(factory_error))
    }

    /// Creates a new instance with `factory` and hands it over, without caching.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::InvalidArgument`] if `factory` is a function pointer or a trait object
    /// - Returns [`ResolveErrorKind::CircularDependency`] if `factory` is already being resolved on the calling thread
    pub fn resolve_transient<T, F>(&self, factory: F) -> Result<T, ResolveErrorKind>
    where
        F: FnOnce() -> T + 'static,
    {
        let key = FactoryKey::of::<F>()?;

        let span = info_span!("resolve", factory = key.name(), lifetime = Lifetime::Transient.name());
        let _guard = span.enter();

        self.check_cycle(&key)?;
        Ok(factory())
    }

    pub(crate) fn resolve_by_key<T, F>(&self, key: FactoryKey, lifetime: Lifetime, factory: F) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, ResolveErrorKind>,
    {
        let span = info_span!("resolve", factory = key.name(), lifetime = lifetime.name());
        let _guard = span.enter();

        self.check_cycle(&key)?;

        match lifetime {
            Lifetime::Transient => {
                debug!("Creating transient");
                factory().map(Arc::new)
            }
            Lifetime::Scoped => self.inner.scopes.resolve(key, &self.inner.path, factory),
            Lifetime::Singleton => self
                .inner
                .singletons
                .get_or_create(key, &self.inner.path, factory)
                .map(|(instance, _)| instance),
        }
    }

    fn check_cycle(&self, key: &FactoryKey) -> Result<(), ResolveErrorKind> {
        if !self.inner.path.would_cycle(key) {
            return Ok(());
        }

        let err = ResolveErrorKind::CircularDependency {
            path: self.inner.path.cycle_path(key, |key| self.type_name_of(key)),
        };
        error!("{}", err);
        Err(err)
    }

    fn type_name_of(&self, key: &FactoryKey) -> Option<&'static str> {
        self.inner
            .singletons
            .type_name(key)
            .or_else(|| self.inner.scopes.active().and_then(|scope| scope.type_name(key)))
    }
}

impl Container {
    /// Starts a new scope and makes it active until the returned guard is dropped or ended.
    /// Scoped resolutions made meanwhile share one instance per factory.
    ///
    /// # Warning
    /// The active scope is shared by every thread using this container (and its clones),
    /// so scopes of independent concurrent requests must not overlap on one container.
    #[must_use = "the scope ends as soon as the guard is dropped"]
    pub fn begin_scope(&self) -> ScopeGuard {
        let id = self.inner.scopes.begin();
        ScopeGuard::new(self.clone(), id)
    }

    /// Runs `body` in a new scope, ending the scope afterwards even if `body` panics.
    pub fn with_scope<R>(&self, body: impl FnOnce() -> R) -> R {
        let _scope = self.begin_scope();
        body()
    }

    #[must_use]
    pub fn active_scope_id(&self) -> Option<ScopeId> {
        self.inner.scopes.active_id()
    }

    #[inline]
    pub(crate) fn end_scope(&self, id: &ScopeId) -> bool {
        self.inner.scopes.end(id)
    }

    /// Forgets the singleton produced by `factory`. Holders of the instance keep it;
    /// the next resolution creates a new one.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::InvalidArgument`] if `factory` is a function pointer or a trait object.
    pub fn release<F: 'static>(&self, factory: &F) -> Result<bool, ResolveErrorKind> {
        FactoryKey::of_val(factory).map(|key| self.release_key(&key))
    }

    pub fn release_key(&self, key: &FactoryKey) -> bool {
        let released = self.inner.singletons.release(key);
        debug!(factory = key.name(), released, "Release");
        released
    }

    /// Discards every singleton, every scope with its instances, every registered instance,
    /// and the resolution paths of all threads.
    ///
    /// Guards of discarded scopes become no-ops.
    pub fn reset(&self) {
        let singletons = self.inner.singletons.clear();
        let scoped = self.inner.scopes.clear();
        let registered = self.inner.registry.clear();
        self.inner.path.reset();

        info!(singletons, scoped, registered, "Container reset");
    }

    /// Count of cached singletons.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.inner.singletons.len()
    }

    /// Count of instances cached in the active scope.
    #[must_use]
    pub fn scoped_instance_count(&self) -> usize {
        self.inner.scopes.active().map_or(0, |scope| scope.len())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

fn factory_error<E: Into<ResolveErrorKind>>(err: E) -> ResolveErrorKind {
    let err = err.into();
    if let ResolveErrorKind::Instantiate(_) = err {
        error!("{}", err);
    }
    err
}
