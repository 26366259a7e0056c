//! Property tests over the fixture universe: order independence,
//! visibility monotonicity, omission closure and instantiation soundness.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use opforge::operation::signature::{RawSignature, parse_signature};
use opforge::operation::typed::TypedOperation;
use opforge::reflect::descriptor::UniverseDescriptor;
use opforge::reflect::ids::MemberId;
use opforge::reflect::universe::{ClassUniverse, MemberVariant};
use opforge::reflection::accessibility::VisibilityPredicate;
use opforge::reflection::model::{ModelSettings, OperationModel};
use opforge::reflection::omit::OmitMethodsPredicate;
use opforge::reflection::operation_set::OperationSet;
use opforge::types::ty::Type;

const TEST_CLASSES: &[&str] = &[
    "pkg.A",
    "pkg.Facade",
    "pkg.Color",
    "pkg.Base",
    "pkg.MyClass",
    "pkg.Box",
    "pkg.Outer",
    "pkg.Counter",
];

fn fixture_classes(u: &ClassUniverse) -> impl Iterator<Item = &opforge::reflect::universe::ClassInfo> {
    u.classes().filter(|c| c.name.starts_with("pkg."))
}

fn full_model(u: &Arc<ClassUniverse>) -> OperationModel {
    common::build(u, &common::settings(TEST_CLASSES)).expect("fixture model builds")
}

// ──── determinism ────

#[test]
fn descriptor_order_does_not_change_the_model() {
    let forward = common::universe();
    let mut reversed = common::descriptor();
    reversed.classes.reverse();
    let reversed = ClassUniverse::from_descriptor(reversed).unwrap();

    let mut settings = common::settings(TEST_CLASSES);
    let a = full_model(&forward);
    settings.test_classes.reverse();
    let b = common::build(&reversed, &settings).unwrap();

    assert_eq!(
        common::describe(&forward, a.operations()),
        common::describe(&reversed, b.operations())
    );
    assert_eq!(
        common::describe(&forward, a.omitted()),
        common::describe(&reversed, b.omitted())
    );
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn repeated_builds_are_identical() {
    let u = common::universe();
    let first = full_model(&u);
    let second = full_model(&u);
    assert_eq!(first.operations(), second.operations());
    assert_eq!(first.pool(), second.pool());
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn descriptor_json_round_trips() {
    let descriptor = common::descriptor();
    let json = serde_json::to_string(&descriptor).unwrap();
    assert_eq!(UniverseDescriptor::from_json(&json).unwrap(), descriptor);
}

// ──── visibility ────

fn chain(package: &str) -> [VisibilityPredicate; 4] {
    [
        VisibilityPredicate::PublicOnly,
        VisibilityPredicate::Package(package.to_string()),
        VisibilityPredicate::NotPrivate,
        VisibilityPredicate::Everything,
    ]
}

proptest! {
    #[test]
    fn visibility_widens_monotonically(package in prop_oneof![
        Just(String::new()),
        Just("pkg".to_string()),
        "[a-z]{1,6}(\\.[a-z]{1,6}){0,2}",
    ]) {
        let u = common::universe();
        let predicates = chain(&package);
        for class in fixture_classes(&u) {
            for pair in predicates.windows(2) {
                if pair[0].is_class_visible(&u, class.id) {
                    prop_assert!(pair[1].is_class_visible(&u, class.id), "{} under {}", class.name, pair[1]);
                }
                for &m in &class.methods {
                    if pair[0].is_method_visible(&u, m) {
                        prop_assert!(pair[1].is_method_visible(&u, m));
                    }
                }
                for &c in &class.constructors {
                    if pair[0].is_constructor_visible(&u, c) {
                        prop_assert!(pair[1].is_constructor_visible(&u, c));
                    }
                }
                for &f in &class.fields {
                    if pair[0].is_field_visible(&u, f) {
                        prop_assert!(pair[1].is_field_visible(&u, f));
                    }
                }
            }
        }
    }

    #[test]
    fn public_class_extraction_ignores_test_package(package in "[a-z]{1,6}(\\.[a-z]{1,6}){0,2}") {
        let u = common::universe();
        let public = common::build(&u, &common::settings(&["pkg.A", "pkg.Counter"])).unwrap();
        let settings = ModelSettings {
            visibility: VisibilityPredicate::Package(package),
            ..common::settings(&["pkg.A", "pkg.Counter"])
        };
        let packaged = common::build(&u, &settings).unwrap();
        prop_assert!(public.operations().is_subset(packaged.operations()));
    }
}

// ──── omission ────

fn method_calls(model: &OperationModel) -> Vec<TypedOperation> {
    model
        .operations()
        .iter()
        .filter(|op| op.is_method_call())
        .cloned()
        .collect()
}

proptest! {
    #[test]
    fn override_closure_is_idempotent(mask in proptest::collection::vec(any::<bool>(), 64)) {
        let u = common::universe();
        let calls = method_calls(&full_model(&u));
        let mut set = OperationSet::new(Arc::clone(&u));
        for (op, omit) in calls.iter().zip(mask.iter().cycle()) {
            if *omit {
                set.add_omitted(op.clone());
            } else {
                set.add(op.clone());
            }
        }
        let kept = set.kept().clone();
        let omitted = set.omitted().clone();
        prop_assert!(kept.is_disjoint(&omitted));
        prop_assert_eq!(kept.len() + omitted.len(), calls.len());

        let closure = set.overridden_by_omitted();
        prop_assert!(kept.iter().all(|op| op.method_id().is_none_or(|m| !closure.contains(&m))));

        for op in &omitted {
            set.add_omitted(op.clone());
        }
        prop_assert_eq!(set.kept(), &kept);
        prop_assert_eq!(set.omitted(), &omitted);
    }
}

#[test]
fn empty_omission_list_omits_nothing() {
    let u = common::universe();
    let model = full_model(&u);
    assert!(model.omitted().is_empty());
    let omit = OmitMethodsPredicate::default();
    for op in model.operations() {
        if op.raw_signature(&u).is_some() {
            assert!(!omit.should_omit(&u, op).unwrap(), "{}", op.describe(&u));
        }
    }
}

// ──── instantiation ────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn instantiations_are_concrete(seed in any::<u64>(), reuse in 0.0f64..=1.0) {
        let u = common::universe();
        let settings = ModelSettings {
            reuse_probability: reuse,
            ..common::settings(TEST_CLASSES)
        };
        let model = common::build(&u, &settings).unwrap();
        let mut instantiator = model.instantiator(seed);
        for op in model.generic_operations() {
            if let Some(concrete) = instantiator.instantiate(op) {
                prop_assert!(!concrete.is_generic(), "{}", concrete.describe(&u));
                prop_assert!(
                    !concrete.inputs.iter().any(Type::has_wildcard),
                    "{}",
                    concrete.describe(&u)
                );
                prop_assert_eq!(&concrete.kind, &op.kind);
            }
        }
    }

    #[test]
    fn same_seed_same_instantiations(seed in any::<u64>()) {
        let u = common::universe();
        let model = full_model(&u);
        let run = |seed| {
            let mut instantiator = model.instantiator(seed);
            model
                .generic_operations()
                .map(|op| instantiator.instantiate(op))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(run(seed), run(seed));
    }
}

// ──── signatures ────

#[test]
fn signatures_round_trip_for_fixture_members() {
    let u = common::universe();
    let mut checked = BTreeSet::new();
    for class in fixture_classes(&u) {
        for &m in &class.methods {
            let info = u.method(m);
            if info.is_bridge() || info.variant == MemberVariant::Synthetic {
                continue;
            }
            let text = RawSignature::of_method(&u, m).to_string();
            assert_eq!(parse_signature(&text, &u).unwrap(), MemberId::Method(m), "{text}");
            checked.insert(text);
        }
        for &c in &class.constructors {
            if u.constructor(c).synthetic {
                continue;
            }
            let text = RawSignature::of_constructor(&u, c).to_string();
            assert_eq!(parse_signature(&text, &u).unwrap(), MemberId::Constructor(c), "{text}");
            checked.insert(text);
        }
    }
    assert!(checked.contains("pkg.Outer$Inner(int)"));
    assert!(checked.contains("pkg.Box(java.lang.Comparable)"));
    assert!(checked.contains("pkg.Box.fill(java.util.Collection)"));
    assert!(checked.contains("pkg.Foo.Foo()"));
    assert!(checked.contains("pkg.Foo()"));
}
