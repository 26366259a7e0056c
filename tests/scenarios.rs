//! End-to-end scenarios over the shared fixture universe.

mod common;

use std::sync::Arc;

use opforge::logger::diagnostics::Diagnostics;
use opforge::logger::jsonl::EventType;
use opforge::operation::signature::parse_signature;
use opforge::operation::typed::{OperationKind, TypedOperation};
use opforge::reflect::ids::{ClassId, MemberId};
use opforge::reflect::universe::ClassUniverse;
use opforge::reflection::accessibility::VisibilityPredicate;
use opforge::reflection::extractor::{ExtractionPolicy, extract_operations};
use opforge::reflection::filter::DefaultReflectionPredicate;
use opforge::reflection::instantiator::TypeInstantiator;
use opforge::reflection::model::{ModelSettings, OperationModel};
use opforge::reflection::omit::OmitMethodsPredicate;
use opforge::reflection::operation_set::OperationSet;
use opforge::reflection::walker::ReflectionWalker;
use opforge::types::pool::TypePoolBuilder;
use opforge::types::ty::{ClassType, PrimitiveKind, Type, TypeArg};

/// Kept operations of `class` extracted under `visibility`.
fn extract(u: &Arc<ClassUniverse>, class: &str, visibility: VisibilityPredicate) -> Vec<TypedOperation> {
    let class = u.lookup(class).expect("fixture class");
    let predicate = DefaultReflectionPredicate::new(visibility.clone());
    let omit = OmitMethodsPredicate::default();
    let diagnostics = Diagnostics::in_memory();
    let policy = ExtractionPolicy {
        visibility: &visibility,
        predicate: &predicate,
        omit: &omit,
        specifications: None,
        diagnostics: &diagnostics,
    };
    let walker = ReflectionWalker::new(visibility.clone());
    let mut set = extract_operations(u, &walker, &[u.generic_type(class)], policy).expect("extract");
    set.kept().iter().cloned().collect()
}

fn declared_by(ops: &[TypedOperation], class: ClassId) -> Vec<&TypedOperation> {
    ops.iter().filter(|op| op.declaring_type.class == class).collect()
}

fn names(u: &ClassUniverse, ops: &[&TypedOperation]) -> Vec<String> {
    ops.iter().map(|op| op.name(u)).collect()
}

// ──── visibility ────

#[test]
fn public_class_under_public_policy() {
    let u = common::universe();
    let a = u.lookup("pkg.A").unwrap();
    let ops = extract(&u, "pkg.A", VisibilityPredicate::PublicOnly);
    assert_eq!(names(&u, &declared_by(&ops, a)), vec!["<init>", "f"]);
}

#[test]
fn package_private_class_depends_on_test_package() {
    let u = common::universe();
    let hidden = u.lookup("pkg.Hidden").unwrap();

    let same = extract(&u, "pkg.Hidden", VisibilityPredicate::Package("pkg".into()));
    assert_eq!(declared_by(&same, hidden).len(), 2);

    let other = extract(&u, "pkg.Hidden", VisibilityPredicate::Package("other.pkg".into()));
    assert!(other.is_empty());

    let a = u.lookup("pkg.A").unwrap();
    let public = extract(&u, "pkg.A", VisibilityPredicate::Package("other.pkg".into()));
    assert_eq!(declared_by(&public, a).len(), 2);
}

#[test]
fn invisible_test_class_is_ignored_by_the_model() {
    let u = common::universe();
    let diagnostics = Diagnostics::in_memory();
    let settings = common::settings(&["pkg.A", "pkg.Hidden"]);
    let model = OperationModel::build(Arc::clone(&u), &settings, diagnostics.clone()).unwrap();
    assert_eq!(model.classes().len(), 1);
    assert_eq!(diagnostics.count(EventType::ClassIgnored), 1);
}

// ──── bridges ────

#[test]
fn visibility_bridge_kept_covariant_bridge_dropped() {
    let u = common::universe();
    let facade = u.lookup("pkg.Facade").unwrap();
    let ops = extract(&u, "pkg.Facade", VisibilityPredicate::PublicOnly);
    let own = declared_by(&ops, facade);

    let clones: Vec<&&TypedOperation> = own.iter().filter(|op| op.name(&u) == "clone").collect();
    assert_eq!(clones.len(), 1);
    assert_eq!(clones[0].output, Type::Class(ClassType::simple(facade)));

    let size = own
        .iter()
        .find(|op| op.name(&u) == "size")
        .expect("visibility bridge kept");
    let method = size.method_id().unwrap();
    assert!(u.method(method).is_bridge());
    assert_eq!(size.inputs, vec![Type::Class(ClassType::simple(facade))]);

    let impl_class = u.lookup("pkg.Impl").unwrap();
    assert!(declared_by(&ops, impl_class).is_empty());
}

// ──── enums ────

#[test]
fn enum_constants_and_constant_body_overrides() {
    let u = common::universe();
    let color = u.lookup("pkg.Color").unwrap();
    let body = u.lookup("pkg.Color$1").unwrap();
    let ops = extract(&u, "pkg.Color", VisibilityPredicate::PublicOnly);

    let constants: Vec<String> = ops
        .iter()
        .filter(|op| matches!(op.kind, OperationKind::EnumConstant { .. }))
        .map(|op| op.name(&u))
        .collect();
    assert_eq!(constants, vec!["GREEN", "RED"]);

    let describes: Vec<&TypedOperation> = ops.iter().filter(|op| op.name(&u) == "describe").collect();
    assert_eq!(describes.len(), 2);
    assert!(describes.iter().all(|op| op.declaring_type.class == color));

    let to_string = ops
        .iter()
        .find(|op| op.name(&u) == "toString")
        .expect("override in constant body recovered");
    assert_eq!(to_string.declaring_type.class, color);
    assert_eq!(u.method(to_string.method_id().unwrap()).declaring, body);

    assert!(!ops.iter().any(|op| op.name(&u) == "values" || op.name(&u) == "valueOf"));
}

// ──── omission ────

#[test]
fn omitting_an_override_migrates_the_base_method() {
    let u = common::universe();
    let base = u.lookup("pkg.Base").unwrap();
    let my_class = u.lookup("pkg.MyClass").unwrap();
    let settings = ModelSettings {
        omit_methods: vec!["MyClass\\.toString".to_string()],
        ..common::settings(&["pkg.Base", "pkg.MyClass"])
    };
    let model = common::build(&u, &settings).unwrap();

    let omitted: Vec<(ClassId, String)> = model
        .omitted()
        .iter()
        .map(|op| (u.method(op.method_id().unwrap()).declaring, op.name(&u)))
        .collect();
    assert!(omitted.contains(&(my_class, "toString".to_string())));
    assert!(omitted.contains(&(base, "toString".to_string())));
    assert!(
        !model
            .operations()
            .iter()
            .any(|op| op.name(&u) == "toString")
    );
    assert!(model.operations().iter().any(|op| op.name(&u) == "area"));
}

#[test]
fn omitting_an_override_removes_the_object_method() {
    let u = common::universe();
    let my_class = u.lookup("pkg.MyClass").unwrap();
    let object_to_string = u.declared_method(u.object(), "toString", &[]).unwrap();
    let my_to_string = u.declared_method(my_class, "toString", &[]).unwrap();

    let mut set = OperationSet::new(Arc::clone(&u));
    set.add(TypedOperation::for_method(&u, object_to_string));
    set.add_omitted(TypedOperation::for_method(&u, my_to_string));
    assert!(set.kept().is_empty());
    assert_eq!(set.omitted().len(), 2);
}

// ──── instantiation ────

fn box_constructor(u: &ClassUniverse) -> TypedOperation {
    let boxed = u.lookup("pkg.Box").unwrap();
    TypedOperation::for_constructor(u, u.declared_constructors(boxed)[0])
}

#[test]
fn bounded_generic_instantiated_from_pool() {
    let u = common::universe();
    let string = Type::class(u.lookup("java.lang.String").unwrap());
    let mut builder = TypePoolBuilder::new();
    builder.add(&string, &u);
    let mut instantiator = TypeInstantiator::seeded(Arc::clone(&u), builder.freeze(), 7);

    let op = box_constructor(&u);
    assert!(op.is_generic());
    let concrete = instantiator.instantiate(&op).expect("String satisfies the bound");
    assert!(!concrete.is_generic());
    assert_eq!(concrete.inputs, vec![string.clone()]);
    let boxed = u.lookup("pkg.Box").unwrap();
    assert_eq!(
        concrete.output,
        Type::Class(ClassType::new(boxed, vec![TypeArg::Type(string)]))
    );
}

#[test]
fn empty_pool_has_no_instantiation() {
    let u = common::universe();
    let diagnostics = Diagnostics::in_memory();
    let mut instantiator =
        TypeInstantiator::seeded(Arc::clone(&u), TypePoolBuilder::new().freeze(), 7)
            .with_diagnostics(diagnostics.clone());
    assert!(instantiator.instantiate(&box_constructor(&u)).is_none());
    assert_eq!(diagnostics.count(EventType::InstantiationFailed), 1);
}

#[test]
fn non_generic_operation_comes_back_unchanged() {
    let u = common::universe();
    let a = u.lookup("pkg.A").unwrap();
    let op = TypedOperation::for_method(&u, u.declared_methods(a)[0]);
    let mut instantiator = TypeInstantiator::seeded(Arc::clone(&u), TypePoolBuilder::new().freeze(), 1);
    assert_eq!(instantiator.instantiate(&op), Some(op));
}

// ──── signatures ────

#[test]
fn dotted_inner_class_constructor_signature() {
    let u = common::universe();
    let inner = u.lookup("pkg.Outer$Inner").unwrap();
    let member = parse_signature("pkg.Outer.Inner.<init>(int)", &u).unwrap();
    let MemberId::Constructor(ctor) = member else {
        panic!("expected a constructor, got {member:?}");
    };
    assert_eq!(u.constructor(ctor).declaring, inner);
    assert_eq!(u.constructor(ctor).params, vec![Type::Primitive(PrimitiveKind::Int)]);
}

#[test]
fn signature_named_members_join_the_model() {
    let u = common::universe();
    let settings = ModelSettings {
        method_signatures: vec![
            "pkg.Outer.Inner.<init>(int)".to_string(),
            "pkg.Outer$Inner.value()".to_string(),
        ],
        ..common::settings(&["pkg.A"])
    };
    let model = common::build(&u, &settings).unwrap();
    let inner = u.lookup("pkg.Outer$Inner").unwrap();
    let own: Vec<String> = model
        .operations()
        .iter()
        .filter(|op| op.declaring_type.class == inner)
        .map(|op| op.name(&u))
        .collect();
    assert_eq!(own, vec!["<init>", "value"]);
}
