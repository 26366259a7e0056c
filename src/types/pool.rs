//! The ground-type pool: concrete reference types observed while building a
//! model, used as instantiation candidates.
//!
//! The pool only grows while it is being built and is frozen before any
//! instantiation search runs. Iteration is in canonical `Type` order so a
//! seeded search draws the same random numbers every time.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::reflect::universe::ClassUniverse;
use crate::types::ty::Type;

/// Growing phase of the pool.
#[derive(Debug, Default, Clone)]
pub struct TypePoolBuilder {
    types: BTreeSet<Type>,
}

impl TypePoolBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ty` and its supertypes if it is a ground reference type.
    /// Returns whether anything new was added.
    pub fn add(&mut self, ty: &Type, universe: &ClassUniverse) -> bool {
        if !ty.is_ground_reference() {
            return false;
        }
        let before = self.types.len();
        match ty {
            Type::Class(ct) => {
                self.types.insert(ty.clone());
                for sup in universe.proper_supertypes(ct) {
                    let sup = Type::Class(sup);
                    if sup.is_ground_reference() {
                        self.types.insert(sup);
                    }
                }
            }
            Type::Array(element) => {
                self.types.insert(ty.clone());
                self.add(element, universe);
            }
            _ => {}
        }
        self.types.len() > before
    }

    pub fn extend<'a>(&mut self, types: impl IntoIterator<Item = &'a Type>, universe: &ClassUniverse) {
        for ty in types {
            self.add(ty, universe);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[must_use]
    pub fn freeze(self) -> TypePool {
        TypePool {
            types: Arc::new(self.types),
        }
    }
}

/// Frozen pool, cheap to clone and share between instantiators.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TypePool {
    types: Arc<BTreeSet<Type>>,
}

impl TypePool {
    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        self.types.iter()
    }

    #[must_use]
    pub fn contains(&self, ty: &Type) -> bool {
        self.types.contains(ty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ty::{ClassType, PrimitiveKind, TypeArg};

    #[test]
    fn adds_supertype_closure() {
        let u = ClassUniverse::core().unwrap();
        let string = Type::class(u.lookup("java.lang.String").unwrap());
        let mut pool = TypePoolBuilder::new();
        assert!(pool.add(&string, &u));
        assert!(!pool.add(&string, &u));
        let pool = pool.freeze();
        let comparable_string = Type::Class(ClassType::new(
            u.lookup("java.lang.Comparable").unwrap(),
            vec![TypeArg::Type(string.clone())],
        ));
        assert!(pool.contains(&string));
        assert!(pool.contains(&comparable_string));
        assert!(pool.contains(&u.object_type()));
    }

    #[test]
    fn rejects_non_ground_types() {
        let u = ClassUniverse::core().unwrap();
        let list = u.lookup("java.util.List").unwrap();
        let mut pool = TypePoolBuilder::new();
        assert!(!pool.add(&Type::Class(u.generic_type(list)), &u));
        assert!(!pool.add(&Type::Primitive(PrimitiveKind::Int), &u));
        assert!(pool.is_empty());
    }

    #[test]
    fn iteration_order_is_canonical() {
        let u = ClassUniverse::core().unwrap();
        let integer = Type::class(u.lookup("java.lang.Integer").unwrap());
        let string = Type::class(u.lookup("java.lang.String").unwrap());
        let mut a = TypePoolBuilder::new();
        a.extend([&string, &integer], &u);
        let mut b = TypePoolBuilder::new();
        b.extend([&integer, &string], &u);
        let a: Vec<_> = a.freeze().iter().cloned().collect();
        let b: Vec<_> = b.freeze().iter().cloned().collect();
        assert_eq!(a, b);
    }
}
