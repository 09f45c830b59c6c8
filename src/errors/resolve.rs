use alloc::{boxed::Box, string::String};
use core::fmt::{self, Display, Formatter};

use super::instantiate::InstantiateErrorKind;
use crate::key::FactoryKey;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Circular dependency detected: {path}")]
    CircularDependency { path: CyclePath },
    #[error(
        "Type mismatch{}: expected {expected}, actual {actual}",
        factory.map(|name| alloc::format!(" for factory `{name}`")).unwrap_or_default(),
    )]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
        factory: Option<&'static str>,
    },
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },
    #[error("No instance registered for type {type_name}")]
    NotRegistered { type_name: &'static str },
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
}

impl From<anyhow::Error> for ResolveErrorKind {
    fn from(err: anyhow::Error) -> Self {
        Self::Instantiate(InstantiateErrorKind::Custom(err))
    }
}

/// One factory of a detected cycle.
///
/// `type_name` is known only for factories whose product is already cached,
/// which is never the case for the factory that closed the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleNode {
    pub key: FactoryKey,
    pub type_name: Option<&'static str>,
}

impl Display for CycleNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.type_name {
            Some(type_name) => f.write_str(type_name),
            None => write!(f, "unknown({})", self.key),
        }
    }
}

/// Factories of a cycle, from the first occurrence of the repeated factory up to its re-entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath(pub Box<[CycleNode]>);

impl CyclePath {
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[CycleNode] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symbolic names of the factories, in resolution order.
    pub fn factory_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|node| node.key.name())
    }
}

impl Display for CyclePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("[empty path]");
        }

        f.write_str("[")?;
        for (index, node) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{node}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::{CycleNode, CyclePath, ResolveErrorKind};
    use crate::key::FactoryKey;

    use alloc::vec;

    #[test]
    fn test_cycle_path_display() {
        let a = FactoryKey::named("a").unwrap();
        let b = FactoryKey::named("b").unwrap();
        let path = CyclePath(
            vec![
                CycleNode {
                    key: a,
                    type_name: Some("ServiceA"),
                },
                CycleNode { key: b, type_name: None },
                CycleNode { key: a, type_name: None },
            ]
            .into_boxed_slice(),
        );

        assert_eq!(path.to_string(), "[ServiceA -> unknown(b) -> unknown(a)]");
        assert_eq!(path.factory_names().collect::<alloc::vec::Vec<_>>(), ["a", "b", "a"]);

        let err = ResolveErrorKind::CircularDependency { path };
        assert!(err.to_string().starts_with("Circular dependency detected: [ServiceA"));
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = ResolveErrorKind::TypeMismatch {
            expected: "u8",
            actual: "i8",
            factory: Some("db"),
        };
        assert_eq!(err.to_string(), "Type mismatch for factory `db`: expected u8, actual i8");

        let err = ResolveErrorKind::TypeMismatch {
            expected: "u8",
            actual: "i8",
            factory: None,
        };
        assert_eq!(err.to_string(), "Type mismatch: expected u8, actual i8");
    }
}
