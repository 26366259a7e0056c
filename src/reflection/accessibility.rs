//! Visibility predicates: which classes and members generated tests may
//! name, given where the tests will live.

#![allow(missing_docs)]

use std::fmt;

use crate::reflect::ids::{ClassId, ConstructorId, FieldId, MethodId};
use crate::reflect::modifiers::Modifiers;
use crate::reflect::universe::ClassUniverse;
use crate::types::ty::{Type, TypeArg, Wildcard};

/// Closed set of visibility policies. Results depend only on modifiers and
/// package names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VisibilityPredicate {
    Everything,
    PublicOnly,
    NotPrivate,
    /// Tests live in this package; `""` is the unnamed package.
    Package(String),
}

impl VisibilityPredicate {
    #[must_use]
    pub fn is_class_visible(&self, universe: &ClassUniverse, class: ClassId) -> bool {
        if matches!(self, Self::Everything) {
            return true;
        }
        let info = universe.class(class);
        if let Some(outer) = info.declaring
            && !self.is_class_visible(universe, outer)
        {
            return false;
        }
        let mask = if info.is_interface() {
            Modifiers::INTERFACE_MASK
        } else {
            Modifiers::CLASS_MASK
        };
        self.accepts(info.modifiers.masked(mask), info.package())
    }

    #[must_use]
    pub fn is_method_visible(&self, universe: &ClassUniverse, method: MethodId) -> bool {
        let info = universe.method(method);
        self.accepts(
            info.modifiers.masked(Modifiers::METHOD_MASK),
            universe.class(info.declaring).package(),
        )
    }

    #[must_use]
    pub fn is_constructor_visible(&self, universe: &ClassUniverse, ctor: ConstructorId) -> bool {
        let info = universe.constructor(ctor);
        self.accepts(
            info.modifiers.masked(Modifiers::CONSTRUCTOR_MASK),
            universe.class(info.declaring).package(),
        )
    }

    #[must_use]
    pub fn is_field_visible(&self, universe: &ClassUniverse, field: FieldId) -> bool {
        let info = universe.field(field);
        self.accepts(
            info.modifiers.masked(Modifiers::FIELD_MASK),
            universe.class(info.declaring).package(),
        )
    }

    /// Visibility of a type expression: arrays by element, parameterized
    /// types by raw class and every argument. Primitives, variables and
    /// unbounded wildcards are always visible.
    #[must_use]
    pub fn is_type_visible(&self, universe: &ClassUniverse, ty: &Type) -> bool {
        match ty {
            Type::Primitive(_) | Type::Void | Type::Null | Type::Var(_) => true,
            Type::Array(element) => self.is_type_visible(universe, element),
            Type::Class(ct) => {
                self.is_class_visible(universe, ct.class)
                    && ct.args.iter().all(|arg| match arg {
                        TypeArg::Type(t) => self.is_type_visible(universe, t),
                        TypeArg::Wildcard(Wildcard::Unbounded) => true,
                        TypeArg::Wildcard(Wildcard::Extends(b) | Wildcard::Super(b)) => {
                            self.is_type_visible(universe, b)
                        }
                    })
            }
        }
    }

    fn accepts(&self, modifiers: Modifiers, package: Option<&str>) -> bool {
        match self {
            Self::Everything => true,
            Self::PublicOnly => modifiers.is_public(),
            Self::NotPrivate => !modifiers.is_private(),
            Self::Package(name) => {
                modifiers.is_public()
                    || (!modifiers.is_private() && package.unwrap_or("") == name)
            }
        }
    }
}

impl fmt::Display for VisibilityPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everything => f.write_str("everything"),
            Self::PublicOnly => f.write_str("public"),
            Self::NotPrivate => f.write_str("not-private"),
            Self::Package(name) => write!(f, "package({name})"),
        }
    }
}
