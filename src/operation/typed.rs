//! Typed operations: the uniform representation of every callable or
//! accessible member, with fully typed inputs and output.

#![allow(missing_docs)]

use std::fmt;

use crate::reflect::ids::{ClassId, ConstructorId, FieldId, MemberId, MethodId};
use crate::reflect::universe::ClassUniverse;
use crate::types::substitution::Substitution;
use crate::types::ty::{ClassType, Type};

use super::signature::RawSignature;
use super::specification::ExecutableSpecification;

/// What an operation does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    ConstructorCall(ConstructorId),
    MethodCall(MethodId),
    FieldGet(FieldId),
    FieldSet(FieldId),
    EnumConstant { class: ClassId, name: String },
    /// A literal value of primitive or `String` type, in source form.
    NonreceiverTerm { value: String },
}

impl OperationKind {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ConstructorCall(_) => "constructor",
            Self::MethodCall(_) => "method",
            Self::FieldGet(_) => "field-get",
            Self::FieldSet(_) => "field-set",
            Self::EnumConstant { .. } => "enum-constant",
            Self::NonreceiverTerm { .. } => "literal",
        }
    }
}

/// A member with its declaring type, ordered input types (receiver first
/// for instance members) and output type.
///
/// The derived ordering compares the declaring type first, then the kind
/// (by member id, hence by name), then the types: a canonical order that
/// never depends on the order members were discovered in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypedOperation {
    pub declaring_type: ClassType,
    pub kind: OperationKind,
    pub inputs: Vec<Type>,
    pub output: Type,
    pub spec: Option<ExecutableSpecification>,
}

impl TypedOperation {
    /// Constructor of the generic declaration of its class.
    #[must_use]
    pub fn for_constructor(universe: &ClassUniverse, id: ConstructorId) -> Self {
        let ctor = universe.constructor(id);
        let declaring_type = universe.generic_type(ctor.declaring);
        Self {
            output: Type::Class(declaring_type.clone()),
            declaring_type,
            kind: OperationKind::ConstructorCall(id),
            inputs: ctor.params.clone(),
            spec: None,
        }
    }

    /// Method call on the generic declaration of its class. A method of an
    /// enum-constant body is attributed to the enum itself.
    #[must_use]
    pub fn for_method(universe: &ClassUniverse, id: MethodId) -> Self {
        let method = universe.method(id);
        let owner = universe
            .class(method.declaring)
            .enum_body_of
            .unwrap_or(method.declaring);
        let declaring_type = universe.generic_type(owner);
        let mut inputs = Vec::with_capacity(method.params.len() + 1);
        if !method.is_static() {
            inputs.push(Type::Class(declaring_type.clone()));
        }
        inputs.extend(method.params.iter().cloned());
        Self {
            declaring_type,
            kind: OperationKind::MethodCall(id),
            inputs,
            output: method.returns.clone(),
            spec: None,
        }
    }

    /// Getter for a field, read through `declaring_type`.
    #[must_use]
    pub fn for_field_get(universe: &ClassUniverse, id: FieldId, declaring_type: ClassType) -> Self {
        let field = universe.field(id);
        let inputs = if field.is_static() {
            Vec::new()
        } else {
            vec![Type::Class(declaring_type.clone())]
        };
        Self {
            declaring_type,
            kind: OperationKind::FieldGet(id),
            inputs,
            output: field.ty.clone(),
            spec: None,
        }
    }

    /// Setter for a field, written through `declaring_type`.
    #[must_use]
    pub fn for_field_set(universe: &ClassUniverse, id: FieldId, declaring_type: ClassType) -> Self {
        let field = universe.field(id);
        let mut inputs = Vec::with_capacity(2);
        if !field.is_static() {
            inputs.push(Type::Class(declaring_type.clone()));
        }
        inputs.push(field.ty.clone());
        Self {
            declaring_type,
            kind: OperationKind::FieldSet(id),
            inputs,
            output: Type::Void,
            spec: None,
        }
    }

    /// Zero-input operation producing one constant of a (non-generic) enum.
    #[must_use]
    pub fn for_enum_constant(class: ClassId, name: &str) -> Self {
        Self {
            declaring_type: ClassType::simple(class),
            kind: OperationKind::EnumConstant {
                class,
                name: name.to_string(),
            },
            inputs: Vec::new(),
            output: Type::class(class),
            spec: None,
        }
    }

    /// Literal of type `ty` contributed by `class`.
    #[must_use]
    pub fn for_literal(class: ClassId, ty: Type, value: impl Into<String>) -> Self {
        Self {
            declaring_type: ClassType::simple(class),
            kind: OperationKind::NonreceiverTerm {
                value: value.into(),
            },
            inputs: Vec::new(),
            output: ty,
            spec: None,
        }
    }

    #[must_use]
    pub fn with_spec(mut self, spec: ExecutableSpecification) -> Self {
        self.spec = Some(spec);
        self
    }

    #[must_use]
    pub const fn is_constructor_call(&self) -> bool {
        matches!(self.kind, OperationKind::ConstructorCall(_))
    }

    #[must_use]
    pub const fn is_method_call(&self) -> bool {
        matches!(self.kind, OperationKind::MethodCall(_))
    }

    #[must_use]
    pub const fn method_id(&self) -> Option<MethodId> {
        match self.kind {
            OperationKind::MethodCall(id) => Some(id),
            _ => None,
        }
    }

    /// The reflective member behind this operation.
    #[must_use]
    pub const fn member(&self) -> Option<MemberId> {
        match self.kind {
            OperationKind::ConstructorCall(id) => Some(MemberId::Constructor(id)),
            OperationKind::MethodCall(id) => Some(MemberId::Method(id)),
            OperationKind::FieldGet(id) | OperationKind::FieldSet(id) => Some(MemberId::Field(id)),
            OperationKind::EnumConstant { .. } | OperationKind::NonreceiverTerm { .. } => None,
        }
    }

    /// True when the operation takes no receiver.
    #[must_use]
    pub fn is_static(&self, universe: &ClassUniverse) -> bool {
        match &self.kind {
            OperationKind::ConstructorCall(_)
            | OperationKind::EnumConstant { .. }
            | OperationKind::NonreceiverTerm { .. } => true,
            OperationKind::MethodCall(id) => universe.method(*id).is_static(),
            OperationKind::FieldGet(id) | OperationKind::FieldSet(id) => {
                universe.field(*id).is_static()
            }
        }
    }

    /// Whether any type variable remains in the declaring, input or output
    /// types.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.declaring_type.is_generic()
            || self.inputs.iter().any(Type::is_generic)
            || self.output.is_generic()
    }

    /// Whether an input, or a parameterized output, carries a wildcard.
    #[must_use]
    pub fn has_wildcard_types(&self) -> bool {
        self.inputs.iter().any(Type::has_wildcard)
            || self.output.as_class().is_some_and(ClassType::has_wildcard)
    }

    #[must_use]
    pub fn substitute(&self, subst: &Substitution) -> Self {
        Self {
            declaring_type: self.declaring_type.substitute(subst),
            kind: self.kind.clone(),
            inputs: self.inputs.iter().map(|t| t.substitute(subst)).collect(),
            output: self.output.substitute(subst),
            spec: self.spec.clone(),
        }
    }

    /// Member name: `<init>` for a constructor, method name, accessor
    /// marker for fields, constant name, or the literal text.
    #[must_use]
    pub fn name(&self, universe: &ClassUniverse) -> String {
        match &self.kind {
            OperationKind::ConstructorCall(_) => "<init>".to_string(),
            OperationKind::MethodCall(id) => universe.method(*id).name.clone(),
            OperationKind::FieldGet(id) => format!("<get>({})", universe.field(*id).name),
            OperationKind::FieldSet(id) => format!("<set>({})", universe.field(*id).name),
            OperationKind::EnumConstant { name, .. } => name.clone(),
            OperationKind::NonreceiverTerm { value } => value.clone(),
        }
    }

    /// Raw signature of the underlying constructor or method, named after
    /// the member's own declaring class.
    #[must_use]
    pub fn raw_signature(&self, universe: &ClassUniverse) -> Option<RawSignature> {
        match self.kind {
            OperationKind::ConstructorCall(id) => Some(RawSignature::of_constructor(universe, id)),
            OperationKind::MethodCall(id) => Some(RawSignature::of_method(universe, id)),
            _ => None,
        }
    }

    /// Renders as `pkg.A.f : [pkg.A, java.lang.String] -> int`.
    #[must_use]
    pub fn describe<'a>(&'a self, universe: &'a ClassUniverse) -> Describe<'a> {
        Describe {
            op: self,
            universe,
        }
    }
}

/// Display adapter returned by [`TypedOperation::describe`].
pub struct Describe<'a> {
    op: &'a TypedOperation,
    universe: &'a ClassUniverse,
}

impl fmt::Display for Describe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = self.universe;
        let inputs: Vec<String> = self.op.inputs.iter().map(|t| u.display_type(t)).collect();
        write!(
            f,
            "{}.{} : [{}] -> {}",
            u.display_class_type(&self.op.declaring_type),
            self.op.name(u),
            inputs.join(", "),
            u.display_type(&self.op.output)
        )
    }
}
