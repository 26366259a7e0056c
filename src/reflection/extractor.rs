//! Turns the members a walk visits into typed operations.

#![allow(missing_docs)]

use std::sync::Arc;

use crate::core::errors::{BugContext, OpfError, Result};
use crate::logger::diagnostics::Diagnostics;
use crate::logger::jsonl::EventType;
use crate::operation::specification::SpecificationLookup;
use crate::operation::typed::TypedOperation;
use crate::reflect::ids::{ClassId, ConstructorId, FieldId, MethodId};
use crate::reflect::universe::{ClassUniverse, EnumConstant};
use crate::types::substitution::Substitution;
use crate::types::subtype::is_subtype;
use crate::types::ty::{ClassType, Type};

use super::accessibility::VisibilityPredicate;
use super::filter::ReflectionPredicate;
use super::omit::OmitMethodsPredicate;
use super::operation_set::OperationSet;
use super::walker::{ClassVisitor, ReflectionWalker};

/// Shared, read-only inputs of an extraction.
#[derive(Clone, Copy)]
pub struct ExtractionPolicy<'a> {
    pub visibility: &'a VisibilityPredicate,
    pub predicate: &'a dyn ReflectionPredicate,
    pub omit: &'a OmitMethodsPredicate,
    pub specifications: Option<&'a dyn SpecificationLookup>,
    pub diagnostics: &'a Diagnostics,
}

/// A [`ClassVisitor`] that collects the operations of one walked class
/// type into an [`OperationSet`].
///
/// Member classes visited during the walk push their own generic type, so
/// operations of a nested enum are typed against that enum.
pub struct OperationExtractor<'a> {
    policy: ExtractionPolicy<'a>,
    walked: Vec<ClassType>,
    root: ClassType,
    operations: OperationSet,
}

impl<'a> OperationExtractor<'a> {
    #[must_use]
    pub fn new(universe: Arc<ClassUniverse>, class_type: ClassType, policy: ExtractionPolicy<'a>) -> Self {
        Self {
            policy,
            walked: Vec::new(),
            root: class_type,
            operations: OperationSet::new(universe),
        }
    }

    #[must_use]
    pub fn into_operations(self) -> OperationSet {
        self.operations
    }

    fn current(&self) -> &ClassType {
        self.walked.last().unwrap_or(&self.root)
    }

    fn bug(&self, universe: &ClassUniverse, details: &str, op: Option<&TypedOperation>) -> OpfError {
        OpfError::bug(
            details,
            BugContext {
                operation: op.map(|op| op.describe(universe).to_string()),
                declaring_type: op.map(|op| universe.display_class_type(&op.declaring_type)),
                walked_class: Some(universe.display_class_type(self.current())),
            },
        )
    }

    /// Substitution taking the generic declaration of `class` to the way
    /// the walked type sees it.
    fn view_of(&self, universe: &ClassUniverse, class: ClassId, op: &TypedOperation) -> Result<Substitution> {
        let params = &universe.class(class).type_params;
        if params.is_empty() {
            return Ok(Substitution::new());
        }
        match universe.as_super(self.current(), class) {
            Some(view) if view.args.len() == params.len() => {
                Ok(Substitution::for_class_args(params, &view.args))
            }
            _ => Err(self.bug(
                universe,
                "no substitution unifies the declaring type with the walked type",
                Some(op),
            )),
        }
    }

    /// Attach a specification and file `op` as kept or omitted.
    fn file_call(&mut self, universe: &ClassUniverse, mut op: TypedOperation) -> Result<()> {
        if let Some(specs) = self.policy.specifications
            && let Some(signature) = op.raw_signature(universe)
            && let Some(spec) = specs.lookup(&signature)
            && !spec.is_empty()
        {
            op = op.with_spec(spec.clone());
        }
        if self.policy.omit.should_omit(universe, &op)? {
            self.policy.diagnostics.record(
                EventType::OperationOmitted,
                op.describe(universe).to_string(),
                "matches an omit-methods pattern",
            );
            self.operations.add_omitted(op);
        } else {
            self.operations.add(op);
        }
        Ok(())
    }
}

impl ClassVisitor for OperationExtractor<'_> {
    fn visit_before(&mut self, universe: &ClassUniverse, class: ClassId) -> Result<()> {
        let ty = if class == self.root.class {
            self.root.clone()
        } else {
            universe.generic_type(class)
        };
        self.walked.push(ty);
        Ok(())
    }

    fn visit_after(&mut self, _universe: &ClassUniverse, _class: ClassId) -> Result<()> {
        self.walked.pop();
        Ok(())
    }

    fn visit_constructor(&mut self, universe: &ClassUniverse, ctor: ConstructorId) -> Result<()> {
        let op = TypedOperation::for_constructor(universe, ctor);
        if universe.constructor(ctor).declaring != self.current().class {
            return Err(self.bug(universe, "constructor visited for another class", Some(&op)));
        }
        if !self.policy.predicate.test_constructor(universe, ctor) {
            return Ok(());
        }
        let subst = self.view_of(universe, op.declaring_type.class, &op)?;
        let op = op.substitute(&subst);
        self.file_call(universe, op)
    }

    fn visit_method(&mut self, universe: &ClassUniverse, method: MethodId) -> Result<()> {
        if !self.policy.predicate.test_method(universe, method) {
            return Ok(());
        }
        let op = TypedOperation::for_method(universe, method);
        let subst = self.view_of(universe, op.declaring_type.class, &op)?;
        let op = op.substitute(&subst);
        let walked = Type::Class(self.current().clone());
        if !is_subtype(universe, &walked, &Type::Class(op.declaring_type.clone())) {
            return Err(self.bug(
                universe,
                "declaring type is not a supertype of the walked type",
                Some(&op),
            ));
        }
        self.file_call(universe, op)
    }

    fn visit_field(&mut self, universe: &ClassUniverse, field: FieldId) -> Result<()> {
        if !self.policy.predicate.test_field(universe, field) {
            return Ok(());
        }
        let info = universe.field(field);
        let declaring_visible = self
            .policy
            .visibility
            .is_class_visible(universe, info.declaring);
        // Which class a static final of a hidden class belongs to is
        // ambiguous under multiple inheritance of interfaces.
        if !declaring_visible && info.is_static() && info.is_final() {
            self.policy.diagnostics.member_rejected(
                universe.field_label(field),
                "static final field of a non-visible class",
            );
            return Ok(());
        }
        let template = TypedOperation::for_field_get(universe, field, universe.generic_type(info.declaring));
        let subst = self.view_of(universe, info.declaring, &template)?;
        let owner = if declaring_visible {
            universe.generic_type(info.declaring).substitute(&subst)
        } else {
            self.current().clone()
        };
        self.operations
            .add(TypedOperation::for_field_get(universe, field, owner.clone()).substitute(&subst));
        if !info.is_final() {
            self.operations
                .add(TypedOperation::for_field_set(universe, field, owner).substitute(&subst));
        }
        Ok(())
    }

    fn visit_enum_constant(
        &mut self,
        _universe: &ClassUniverse,
        class: ClassId,
        constant: &EnumConstant,
    ) -> Result<()> {
        self.operations
            .add(TypedOperation::for_enum_constant(class, &constant.name));
        Ok(())
    }
}

/// Walk every class type and union the results.
pub fn extract_operations(
    universe: &Arc<ClassUniverse>,
    walker: &ReflectionWalker,
    class_types: &[ClassType],
    policy: ExtractionPolicy<'_>,
) -> Result<OperationSet> {
    let mut all = OperationSet::new(Arc::clone(universe));
    for class_type in class_types {
        let mut extractor = OperationExtractor::new(Arc::clone(universe), class_type.clone(), policy);
        walker.apply(universe, class_type.class, &mut [&mut extractor])?;
        all.union(extractor.into_operations());
    }
    Ok(all)
}
