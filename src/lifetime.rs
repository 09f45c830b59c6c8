use core::fmt::{self, Display, Formatter};

/// How long a resolved instance lives and who shares it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per factory for the lifetime of the container.
    #[default]
    Singleton,
    /// A fresh instance on every resolution, never cached.
    Transient,
    /// One instance per factory per active scope.
    /// Without an active scope it behaves like [`Lifetime::Transient`].
    Scoped,
}

impl Lifetime {
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "Singleton",
            Lifetime::Transient => "Transient",
            Lifetime::Scoped => "Scoped",
        }
    }
}

impl Display for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
