use alloc::format;
use core::{
    any::{type_name, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};
use std::collections::hash_map::DefaultHasher;
use tracing::error;

use crate::errors::ResolveErrorKind;

/// Type names of factories whose concrete type doesn't identify a single code location.
///
/// Matched against [`type_name`], whose output isn't guaranteed stable across compiler versions.
/// A changed format makes erased factories slip through as ordinary keys (all `fn() -> T` sharing one)
/// rather than rejecting valid ones: fn items and closures never render with these prefixes.
const ERASED_PREFIXES: [&str; 7] = [
    "fn(",
    "unsafe fn(",
    "extern \"",
    "dyn ",
    "alloc::boxed::Box<dyn ",
    "alloc::sync::Arc<dyn ",
    "alloc::rc::Rc<dyn ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Identity {
    Type(TypeId),
    Named(&'static str),
}

/// Identity of a factory, used as the cache key of the instance it produces.
///
/// Every fn item and every closure expression has its own type in Rust, so the [`TypeId`] of the factory type
/// plays the role of a code address: resolving the same function (or the same closure expression, whatever it
/// captured) twice yields the same key, two different ones never collide.
///
/// Function pointers and trait objects erase that identity (all `fn() -> T` share one type), so [`Self::of`]
/// rejects them. Use [`Self::named`] to give such factories an explicit identity.
#[derive(Debug, Clone, Copy)]
pub struct FactoryKey {
    identity: Identity,
    name: &'static str,
}

impl FactoryKey {
    /// Derives the key of the factory type `F`.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::InvalidArgument`] if `F` is a function pointer or a trait object.
    pub fn of<F: ?Sized + 'static>() -> Result<Self, ResolveErrorKind> {
        let name = type_name::<F>();
        if is_erased(name) {
            let err = ResolveErrorKind::InvalidArgument {
                reason: format!("factory `{name}` has no stable identity, use a fn item, a closure or `FactoryKey::named`"),
            };
            error!("{}", err);
            return Err(err);
        }

        Ok(Self {
            identity: Identity::Type(TypeId::of::<F>()),
            name,
        })
    }

    /// Same as [`Self::of`], inferring the factory type from a reference to it.
    ///
    /// # Errors
    /// See [`Self::of`].
    #[inline]
    pub fn of_val<F: ?Sized + 'static>(_factory: &F) -> Result<Self, ResolveErrorKind> {
        Self::of::<F>()
    }

    /// Creates an explicit key. Two named keys are equal if their names are.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::InvalidArgument`] if `name` is empty.
    pub fn named(name: &'static str) -> Result<Self, ResolveErrorKind> {
        if name.trim().is_empty() {
            let err = ResolveErrorKind::InvalidArgument {
                reason: "factory key name can't be empty".into(),
            };
            error!("{}", err);
            return Err(err);
        }

        Ok(Self {
            identity: Identity::Named(name),
            name,
        })
    }

    /// Symbolic name of the factory: its type path, or the explicit name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn opaque_id(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.identity.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for FactoryKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for FactoryKey {}

impl PartialOrd for FactoryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FactoryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity.cmp(&other.identity)
    }
}

impl Hash for FactoryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl Display for FactoryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.identity {
            Identity::Type(_) => write!(f, "{:#x}", self.opaque_id()),
            Identity::Named(name) => f.write_str(name),
        }
    }
}

fn is_erased(name: &str) -> bool {
    let name = name.trim_start_matches('&').trim_start_matches("mut ");
    ERASED_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::FactoryKey;
    use crate::ResolveErrorKind;

    use alloc::boxed::Box;

    struct Database;

    fn new_database() -> Database {
        Database
    }

    fn new_other_database() -> Database {
        Database
    }

    fn key_of<F: 'static>(_: F) -> FactoryKey {
        FactoryKey::of::<F>().unwrap()
    }

    #[test]
    fn test_same_fn_same_key() {
        assert_eq!(key_of(new_database), key_of(new_database));
        assert_ne!(key_of(new_database), key_of(new_other_database));
    }

    #[test]
    fn test_closures_keyed_by_expression() {
        let keys: alloc::vec::Vec<_> = (0..3).map(|n| key_of(move || n)).collect();
        assert_eq!(keys[0], keys[1]);
        assert_eq!(keys[1], keys[2]);

        assert_ne!(key_of(|| 1), key_of(|| 1));
    }

    #[test]
    fn test_erased_factories_rejected() {
        let pointer: fn() -> Database = new_database;
        assert!(matches!(FactoryKey::of_val(&pointer), Err(ResolveErrorKind::InvalidArgument { .. })));

        let boxed: Box<dyn Fn() -> Database> = Box::new(new_database);
        assert!(matches!(FactoryKey::of_val(&boxed), Err(ResolveErrorKind::InvalidArgument { .. })));
    }

    #[test]
    fn test_named() {
        assert_eq!(FactoryKey::named("db").unwrap(), FactoryKey::named("db").unwrap());
        assert_ne!(FactoryKey::named("db").unwrap(), FactoryKey::named("cache").unwrap());
        assert_eq!(FactoryKey::named("db").unwrap().to_string(), "db");
        assert!(matches!(FactoryKey::named("  "), Err(ResolveErrorKind::InvalidArgument { .. })));
    }

    #[test]
    fn test_display_is_opaque() {
        let key = key_of(new_database);
        assert!(key.to_string().starts_with("0x"));
        assert!(key.name().ends_with("new_database"));
    }
}
