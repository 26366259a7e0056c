//! Mappings from type variables to types.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::ty::{Type, TypeArg, TypeVariable};

/// A consistent mapping from type variables to reference types.
///
/// A substitution never binds one variable to two different types: merging
/// two substitutions that disagree fails instead of picking a winner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Substitution {
    map: BTreeMap<TypeVariable, Type>,
}

impl Substitution {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairwise binding of `params` to `args`. Extra entries on either side
    /// are ignored.
    #[must_use]
    pub fn for_args(params: &[TypeVariable], args: &[Type]) -> Self {
        let map = params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        Self { map }
    }

    /// Binding of a generic declaration's parameters to the actual arguments
    /// of one of its uses. Wildcard arguments leave their parameter unbound.
    #[must_use]
    pub fn for_class_args(params: &[TypeVariable], args: &[TypeArg]) -> Self {
        let map = params
            .iter()
            .zip(args)
            .filter_map(|(param, arg)| match arg {
                TypeArg::Type(ty) => Some((param.clone(), ty.clone())),
                TypeArg::Wildcard(_) => None,
            })
            .collect();
        Self { map }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn get(&self, var: &TypeVariable) -> Option<&Type> {
        self.map.get(var)
    }

    #[must_use]
    pub fn binds(&self, var: &TypeVariable) -> bool {
        self.map.contains_key(var)
    }

    /// Bound variables in canonical order.
    pub fn variables(&self) -> impl Iterator<Item = &TypeVariable> {
        self.map.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeVariable, &Type)> {
        self.map.iter()
    }

    /// Add one binding; `None` if `var` is already bound to something else.
    #[must_use]
    pub fn with(&self, var: TypeVariable, ty: Type) -> Option<Self> {
        match self.map.get(&var) {
            Some(existing) if *existing != ty => None,
            Some(_) => Some(self.clone()),
            None => {
                let mut next = self.clone();
                next.map.insert(var, ty);
                Some(next)
            }
        }
    }

    /// Union of two substitutions; `None` if they disagree on a variable.
    #[must_use]
    pub fn extend(&self, other: &Self) -> Option<Self> {
        let mut next = self.clone();
        for (var, ty) in &other.map {
            match next.map.get(var) {
                Some(existing) if existing != ty => return None,
                Some(_) => {}
                None => {
                    next.map.insert(var.clone(), ty.clone());
                }
            }
        }
        Some(next)
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (var, ty)) in self.map.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} := {ty:?}", var.name)?;
        }
        f.write_str("]")
    }
}
