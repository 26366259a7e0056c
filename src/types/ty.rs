//! Type expressions: primitives, class types (possibly parameterized),
//! arrays, type variables and wildcard arguments.
//!
//! All types are plain values ordered by the canonical ids they contain, so
//! a `BTreeSet<Type>` iterates the same way on every run.

use std::sync::Arc;

use crate::reflect::ids::{ClassId, TypeVarId};
use crate::types::substitution::Substitution;

/// Java primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [Self; 8] = [
        Self::Boolean,
        Self::Byte,
        Self::Char,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
    ];

    /// Source-level keyword.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// A type variable, identified by id; bounds are looked up separately so
/// that recursive bounds such as `T extends Comparable<T>` stay finite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVariable {
    pub id: TypeVarId,
    pub name: Arc<str>,
}

impl TypeVariable {
    #[must_use]
    pub fn is_capture(&self) -> bool {
        self.id.is_capture()
    }
}

/// Wildcard type argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Wildcard {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// Actual type argument of a parameterized type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeArg {
    Type(Type),
    Wildcard(Wildcard),
}

impl TypeArg {
    fn is_generic(&self) -> bool {
        match self {
            Self::Type(ty) => ty.is_generic(),
            Self::Wildcard(Wildcard::Unbounded) => false,
            Self::Wildcard(Wildcard::Extends(ty) | Wildcard::Super(ty)) => ty.is_generic(),
        }
    }

    fn has_wildcard(&self) -> bool {
        match self {
            Self::Type(ty) => ty.has_wildcard(),
            Self::Wildcard(_) => true,
        }
    }

    fn collect_variables(&self, out: &mut Vec<TypeVariable>) {
        match self {
            Self::Type(ty) => ty.collect_variables(out),
            Self::Wildcard(Wildcard::Unbounded) => {}
            Self::Wildcard(Wildcard::Extends(ty) | Wildcard::Super(ty)) => {
                ty.collect_variables(out);
            }
        }
    }

    #[must_use]
    pub fn substitute(&self, substitution: &Substitution) -> Self {
        match self {
            Self::Type(ty) => Self::Type(ty.substitute(substitution)),
            Self::Wildcard(Wildcard::Unbounded) => self.clone(),
            Self::Wildcard(Wildcard::Extends(ty)) => {
                Self::Wildcard(Wildcard::Extends(Box::new(ty.substitute(substitution))))
            }
            Self::Wildcard(Wildcard::Super(ty)) => {
                Self::Wildcard(Wildcard::Super(Box::new(ty.substitute(substitution))))
            }
        }
    }
}

/// A class or interface type. `args` is empty for non-generic classes (and
/// for raw uses of generic ones).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassType {
    pub class: ClassId,
    pub args: Vec<TypeArg>,
}

impl ClassType {
    /// Non-parameterized class type.
    #[must_use]
    pub const fn simple(class: ClassId) -> Self {
        Self {
            class,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn new(class: ClassId, args: Vec<TypeArg>) -> Self {
        Self { class, args }
    }

    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }

    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.args.iter().any(TypeArg::is_generic)
    }

    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.args.iter().any(TypeArg::has_wildcard)
    }

    #[must_use]
    pub fn substitute(&self, substitution: &Substitution) -> Self {
        if substitution.is_empty() {
            return self.clone();
        }
        Self {
            class: self.class,
            args: self
                .args
                .iter()
                .map(|arg| arg.substitute(substitution))
                .collect(),
        }
    }

    /// Type variables in order of first occurrence.
    #[must_use]
    pub fn type_variables(&self) -> Vec<TypeVariable> {
        let mut out = Vec::new();
        for arg in &self.args {
            arg.collect_variables(&mut out);
        }
        out
    }
}

/// A type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Primitive(PrimitiveKind),
    Void,
    /// The type of `null`; subtype of every reference type.
    Null,
    Class(ClassType),
    Array(Box<Type>),
    Var(TypeVariable),
}

impl Type {
    #[must_use]
    pub const fn class(class: ClassId) -> Self {
        Self::Class(ClassType::simple(class))
    }

    #[must_use]
    pub fn array_of(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    #[must_use]
    pub const fn is_variable(&self) -> bool {
        matches!(self, Self::Var(_))
    }

    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(
            self,
            Self::Class(_) | Self::Array(_) | Self::Var(_) | Self::Null
        )
    }

    #[must_use]
    pub const fn as_class(&self) -> Option<&ClassType> {
        match self {
            Self::Class(ct) => Some(ct),
            _ => None,
        }
    }

    /// True if any type variable occurs in this type.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        match self {
            Self::Primitive(_) | Self::Void | Self::Null => false,
            Self::Class(ct) => ct.is_generic(),
            Self::Array(element) => element.is_generic(),
            Self::Var(_) => true,
        }
    }

    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        match self {
            Self::Class(ct) => ct.has_wildcard(),
            Self::Array(element) => element.has_wildcard(),
            _ => false,
        }
    }

    /// A ground type is a concrete reference type without variables or
    /// wildcards.
    #[must_use]
    pub fn is_ground_reference(&self) -> bool {
        match self {
            Self::Class(_) | Self::Array(_) => !self.is_generic() && !self.has_wildcard(),
            _ => false,
        }
    }

    /// Type variables in order of first occurrence, without duplicates.
    #[must_use]
    pub fn type_variables(&self) -> Vec<TypeVariable> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    pub(crate) fn collect_variables(&self, out: &mut Vec<TypeVariable>) {
        match self {
            Self::Primitive(_) | Self::Void | Self::Null => {}
            Self::Class(ct) => {
                for arg in &ct.args {
                    arg.collect_variables(out);
                }
            }
            Self::Array(element) => element.collect_variables(out),
            Self::Var(var) => {
                if !out.contains(var) {
                    out.push(var.clone());
                }
            }
        }
    }

    /// True if `var` occurs in this type.
    #[must_use]
    pub fn mentions(&self, var: &TypeVariable) -> bool {
        self.type_variables().contains(var)
    }

    #[must_use]
    pub fn substitute(&self, substitution: &Substitution) -> Self {
        if substitution.is_empty() {
            return self.clone();
        }
        match self {
            Self::Primitive(_) | Self::Void | Self::Null => self.clone(),
            Self::Class(ct) => Self::Class(ct.substitute(substitution)),
            Self::Array(element) => Self::Array(Box::new(element.substitute(substitution))),
            Self::Var(var) => substitution
                .get(var)
                .cloned()
                .unwrap_or_else(|| self.clone()),
        }
    }
}
