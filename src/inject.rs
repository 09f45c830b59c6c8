use alloc::sync::Arc;
use tracing::debug;

use crate::{container::Container, errors::ResolveErrorKind, key::FactoryKey, lifetime::Lifetime};

/// Zero-argument constructor of a component.
///
/// Implemented for every fn item and closure returning a `Send + Sync` value.
pub trait Factory: 'static {
    type Output: Send + Sync + 'static;

    fn create(self) -> Self::Output;
}

impl<F, T> Factory for F
where
    F: FnOnce() -> T + 'static,
    T: Send + Sync + 'static,
{
    type Output = T;

    #[inline]
    fn create(self) -> Self::Output {
        self()
    }
}

/// Factories of the dependencies of a constructor, resolved as singletons in order.
///
/// Implemented for tuples of up to 8 [`Factory`]s.
pub trait Dependencies {
    type Resolved;

    /// # Errors
    /// Returns the first error of resolving a dependency
    fn resolve(self, container: &Container) -> Result<Self::Resolved, ResolveErrorKind>;
}

/// Constructor receiving the resolved dependencies `Deps`.
///
/// Implemented for `FnOnce(Arc<D1>, ..., Arc<Dn>) -> T` where `Di` are the products of the dependency factories.
pub trait Constructor<Deps: Dependencies> {
    type Output;

    fn construct(self, dependencies: Deps::Resolved) -> Self::Output;
}

impl Container {
    #[inline]
    pub(crate) fn resolve_factory<F: Factory>(&self, factory: F) -> Result<Arc<F::Output>, ResolveErrorKind> {
        let key = FactoryKey::of::<F>()?;
        self.resolve_by_key(key, Lifetime::Singleton, move || Ok(factory.create()))
    }

    /// Resolves `dependencies` and passes them to `constructor`, returning the built value uncached.
    ///
    /// # Example
    /// ```rust
    /// use lazioc::Container;
    /// use std::sync::Arc;
    ///
    /// struct Config;
    /// struct Database;
    /// struct UserService(Arc<Config>, Arc<Database>);
    ///
    /// fn new_database() -> Database {
    ///     Database
    /// }
    ///
    /// let container = Container::new();
    /// let service = container.inject(UserService, (|| Config, new_database)).unwrap();
    ///
    /// assert!(Arc::ptr_eq(&service.1, &container.resolve(new_database).unwrap()));
    /// ```
    ///
    /// # Errors
    /// Returns the first error of resolving a dependency
    pub fn inject<C, D>(&self, constructor: C, dependencies: D) -> Result<C::Output, ResolveErrorKind>
    where
        D: Dependencies,
        C: Constructor<D>,
    {
        let dependencies = dependencies.resolve(self)?;
        Ok(constructor.construct(dependencies))
    }

    /// Same as [`Self::inject`], caching the built value under the constructor's key for the given lifetime.
    ///
    /// Dependencies are resolved while the constructor is on the resolution path,
    /// so a dependency resolving the constructor again is reported as a cycle.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::InvalidArgument`] if `constructor` is a function pointer or a trait object
    /// - Returns [`ResolveErrorKind::CircularDependency`] if the constructor is already being resolved on the calling thread
    /// - Returns the first error of resolving a dependency
    pub fn inject_with<C, D>(&self, constructor: C, dependencies: D, lifetime: Lifetime) -> Result<Arc<C::Output>, ResolveErrorKind>
    where
        D: Dependencies,
        C: Constructor<D> + 'static,
        C::Output: Send + Sync + 'static,
    {
        let key = FactoryKey::of::<C>()?;
        self.resolve_by_key(key, lifetime, move || {
            let dependencies = dependencies.resolve(self)?;
            debug!("Dependencies resolved");

            Ok(constructor.construct(dependencies))
        })
    }
}

macro_rules! impl_dependencies {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<$($ty,)*> Dependencies for ($($ty,)*)
        where
            $( $ty: Factory, )*
        {
            type Resolved = ($(Arc<<$ty as Factory>::Output>,)*);

            fn resolve(self, container: &Container) -> Result<Self::Resolved, ResolveErrorKind> {
                let ($($ty,)*) = self;
                Ok(($(container.resolve_factory($ty)?,)*))
            }
        }

        #[allow(non_snake_case)]
        impl<C, R, $($ty,)*> Constructor<($($ty,)*)> for C
        where
            C: FnOnce($(Arc<<$ty as Factory>::Output>,)*) -> R,
            $( $ty: Factory, )*
        {
            type Output = R;

            fn construct(self, ($($ty,)*): ($(Arc<<$ty as Factory>::Output>,)*)) -> Self::Output {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_dependencies);
