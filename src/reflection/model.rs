//! The operation model: everything the generator may call, assembled from
//! test class names, extra method signatures and literals files.
//!
//! Building a model resolves the class names, walks each accepted class,
//! adds the explicitly named signatures, applies the omission closure and
//! collects the ground types seen along the way into the instantiation
//! pool. Bad class names either abort the build or are logged and skipped,
//! as selected by [`ClassNameErrorHandler`].

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::config::Config;
use crate::core::errors::{OpfError, Result};
use crate::logger::diagnostics::Diagnostics;
use crate::logger::jsonl::EventType;
use crate::operation::literals::{LiteralRecord, read_literals_file};
use crate::operation::signature::parse_signature;
use crate::operation::specification::{SpecificationCollection, SpecificationLookup};
use crate::operation::typed::TypedOperation;
use crate::reflect::ids::{ClassId, MemberId, MethodId};
use crate::reflect::universe::ClassUniverse;
use crate::types::pool::{TypePool, TypePoolBuilder};
use crate::types::ty::{ClassType, PrimitiveKind, Type};

use super::accessibility::VisibilityPredicate;
use super::extractor::{ExtractionPolicy, extract_operations};
use super::filter::{DefaultReflectionPredicate, is_check_rep};
use super::instantiator::{DEFAULT_REUSE_PROBABILITY, TypeInstantiator};
use super::omit::OmitMethodsPredicate;
use super::operation_set::OperationSet;
use super::walker::ReflectionWalker;

/// What to do with a class name that does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassNameErrorHandler {
    #[default]
    Fail,
    Warn,
}

impl ClassNameErrorHandler {
    /// Propagate `error`, or log it and carry on.
    pub fn handle(self, name: &str, error: OpfError, diagnostics: &Diagnostics) -> Result<()> {
        match self {
            Self::Fail => Err(error),
            Self::Warn => {
                diagnostics.class_ignored(name, error.to_string());
                Ok(())
            }
        }
    }
}

/// Inputs of a model build.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub visibility: VisibilityPredicate,
    pub omit_methods: Vec<String>,
    pub omitted_fields: Vec<String>,
    pub test_classes: Vec<String>,
    pub covered_classes: Vec<String>,
    pub method_signatures: Vec<String>,
    pub literals: Vec<LiteralRecord>,
    pub specifications: Option<SpecificationCollection>,
    pub class_name_errors: ClassNameErrorHandler,
    pub reuse_probability: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            visibility: VisibilityPredicate::PublicOnly,
            omit_methods: Vec::new(),
            omitted_fields: Vec::new(),
            test_classes: Vec::new(),
            covered_classes: Vec::new(),
            method_signatures: Vec::new(),
            literals: Vec::new(),
            specifications: None,
            class_name_errors: ClassNameErrorHandler::Fail,
            reuse_probability: DEFAULT_REUSE_PROBABILITY,
        }
    }
}

impl ModelSettings {
    /// Settings from a loaded config, reading the literals and
    /// specification files it names.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut literals = Vec::new();
        for path in &config.inputs.literals_files {
            literals.extend(read_literals_file(path)?);
        }
        let specifications = config
            .inputs
            .specifications
            .as_deref()
            .map(SpecificationCollection::load)
            .transpose()?;
        Ok(Self {
            visibility: config.visibility.predicate(),
            omit_methods: config.omission.methods.clone(),
            omitted_fields: config.omission.fields.clone(),
            test_classes: config.inputs.test_classes.clone(),
            covered_classes: config.inputs.covered_classes.clone(),
            method_signatures: config.inputs.method_signatures.clone(),
            literals,
            specifications,
            class_name_errors: config.inputs.class_name_errors,
            reuse_probability: config.instantiation.reuse_probability,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OperationModel {
    universe: Arc<ClassUniverse>,
    classes: BTreeSet<ClassId>,
    covered_classes: BTreeSet<ClassId>,
    operations: BTreeSet<TypedOperation>,
    omitted: BTreeSet<TypedOperation>,
    literals: BTreeSet<TypedOperation>,
    check_rep_methods: Vec<MethodId>,
    pool: TypePool,
    reuse_probability: f64,
    diagnostics: Diagnostics,
}

impl OperationModel {
    pub fn build(
        universe: Arc<ClassUniverse>,
        settings: &ModelSettings,
        diagnostics: Diagnostics,
    ) -> Result<Self> {
        let omit = OmitMethodsPredicate::new(&settings.omit_methods)?;
        let predicate = DefaultReflectionPredicate::new(settings.visibility.clone())
            .with_omitted_fields(settings.omitted_fields.iter().cloned())
            .with_diagnostics(diagnostics.clone());

        let (classes, covered_classes) = resolve_classes(&universe, settings, &diagnostics)?;
        let check_rep_methods = check_rep_methods(&universe, &classes)?;

        let policy = ExtractionPolicy {
            visibility: &settings.visibility,
            predicate: &predicate,
            omit: &omit,
            specifications: settings
                .specifications
                .as_ref()
                .map(|s| s as &dyn SpecificationLookup),
            diagnostics: &diagnostics,
        };
        let walker =
            ReflectionWalker::new(settings.visibility.clone()).with_diagnostics(diagnostics.clone());
        let class_types: Vec<ClassType> = classes.iter().map(|&c| universe.generic_type(c)).collect();
        let mut set = extract_operations(&universe, &walker, &class_types, policy)?;
        add_signatures(&universe, &mut set, &settings.method_signatures, policy)?;

        let mut literals = BTreeSet::new();
        for record in &settings.literals {
            literals.extend(record.operations(&universe)?);
        }

        let (operations, omitted) = set.into_parts();
        diagnostics.model_built(operations.len(), omitted.len());

        let mut pool = TypePoolBuilder::new();
        for class_type in &class_types {
            pool.add(&Type::Class(class_type.clone()), &universe);
        }
        for op in operations.iter().chain(&literals) {
            pool.add(&Type::Class(op.declaring_type.clone()), &universe);
            pool.extend(&op.inputs, &universe);
            pool.add(&op.output, &universe);
        }

        Ok(Self {
            universe,
            classes,
            covered_classes,
            operations,
            omitted,
            literals,
            check_rep_methods,
            pool: pool.freeze(),
            reuse_probability: settings.reuse_probability,
            diagnostics,
        })
    }

    #[must_use]
    pub fn universe(&self) -> &Arc<ClassUniverse> {
        &self.universe
    }

    /// Accepted test classes.
    #[must_use]
    pub const fn classes(&self) -> &BTreeSet<ClassId> {
        &self.classes
    }

    #[must_use]
    pub const fn covered_classes(&self) -> &BTreeSet<ClassId> {
        &self.covered_classes
    }

    /// Kept operations in canonical order.
    #[must_use]
    pub const fn operations(&self) -> &BTreeSet<TypedOperation> {
        &self.operations
    }

    #[must_use]
    pub const fn omitted(&self) -> &BTreeSet<TypedOperation> {
        &self.omitted
    }

    #[must_use]
    pub const fn literals(&self) -> &BTreeSet<TypedOperation> {
        &self.literals
    }

    /// `@CheckRep` methods of the accepted classes.
    #[must_use]
    pub fn check_rep_methods(&self) -> &[MethodId] {
        &self.check_rep_methods
    }

    #[must_use]
    pub const fn pool(&self) -> &TypePool {
        &self.pool
    }

    /// Kept operations that need instantiation before they can be called.
    pub fn generic_operations(&self) -> impl Iterator<Item = &TypedOperation> {
        self.operations
            .iter()
            .filter(|op| op.is_generic() || op.has_wildcard_types())
    }

    /// An instantiator over this model's pool, seeded with `seed`.
    #[must_use]
    pub fn instantiator(&self, seed: u64) -> TypeInstantiator {
        TypeInstantiator::seeded(Arc::clone(&self.universe), self.pool.clone(), seed)
            .with_reuse_probability(self.reuse_probability)
            .with_diagnostics(self.diagnostics.clone())
    }

    /// SHA-256 of the kept, omitted and literal operations in canonical
    /// order. Two builds from the same inputs have the same fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (section, ops) in [
            ("kept", &self.operations),
            ("omitted", &self.omitted),
            ("literals", &self.literals),
        ] {
            hasher.update(section.as_bytes());
            hasher.update(b"\n");
            for op in ops {
                hasher.update(op.describe(&self.universe).to_string().as_bytes());
                hasher.update(b"\n");
            }
        }
        hex_encode(&hasher.finalize())
    }
}

/// Resolve test and covered class names into accepted test classes and
/// covered classes.
fn resolve_classes(
    universe: &ClassUniverse,
    settings: &ModelSettings,
    diagnostics: &Diagnostics,
) -> Result<(BTreeSet<ClassId>, BTreeSet<ClassId>)> {
    let mut classes = BTreeSet::new();
    let mut covered = BTreeSet::new();
    let handler = settings.class_name_errors;

    for name in &settings.test_classes {
        let Some(class) = resolve_name(universe, name, handler, diagnostics)? else {
            continue;
        };
        if !usable_target(universe, &settings.visibility, class, name, diagnostics) {
            continue;
        }
        let info = universe.class(class);
        if info.is_abstract() && !info.is_enum() {
            diagnostics.class_ignored(name.as_str(), "abstract class");
        } else {
            classes.insert(class);
        }
        if settings.covered_classes.contains(name) {
            covered.insert(class);
        }
    }

    for name in &settings.covered_classes {
        if settings.test_classes.contains(name) {
            continue;
        }
        let Some(class) = resolve_name(universe, name, handler, diagnostics)? else {
            continue;
        };
        if usable_target(universe, &settings.visibility, class, name, diagnostics) {
            covered.insert(class);
        }
    }

    Ok((classes, covered))
}

fn resolve_name(
    universe: &ClassUniverse,
    name: &str,
    handler: ClassNameErrorHandler,
    diagnostics: &Diagnostics,
) -> Result<Option<ClassId>> {
    if name == "void" || PrimitiveKind::from_name(name).is_some() {
        let error = OpfError::ClassNotFound {
            name: format!("{name} (primitive types are not classes)"),
        };
        handler.handle(name, error, diagnostics)?;
        return Ok(None);
    }
    match universe.class_for_name(name) {
        Ok(class) => Ok(Some(class)),
        Err(error) => {
            handler.handle(name, error, diagnostics)?;
            Ok(None)
        }
    }
}

/// Visible and not an interface.
fn usable_target(
    universe: &ClassUniverse,
    visibility: &VisibilityPredicate,
    class: ClassId,
    name: &str,
    diagnostics: &Diagnostics,
) -> bool {
    if !visibility.is_class_visible(universe, class) {
        diagnostics.class_ignored(name, format!("not visible under {visibility}"));
        return false;
    }
    if universe.class(class).is_interface() {
        diagnostics.class_ignored(name, "interface");
        return false;
    }
    true
}

/// `@CheckRep` methods declared by `classes`, checked against the
/// annotation contract: public, non-static, no parameters, returning
/// `boolean` or `void`.
fn check_rep_methods(universe: &ClassUniverse, classes: &BTreeSet<ClassId>) -> Result<Vec<MethodId>> {
    let mut found = Vec::new();
    for &class in classes {
        for &method in universe.declared_methods(class) {
            let info = universe.method(method);
            if !info.annotations.iter().any(|a| is_check_rep(a)) {
                continue;
            }
            let violation = if info.is_static() {
                Some("to be non-static")
            } else if !info.modifiers.is_public() {
                Some("to be declared public")
            } else if !info.params.is_empty() {
                Some("to take no parameters")
            } else if !matches!(info.returns, Type::Void | Type::Primitive(PrimitiveKind::Boolean)) {
                Some("to return boolean or void")
            } else {
                None
            };
            if let Some(expected) = violation {
                return Err(OpfError::AnnotationContract {
                    details: format!(
                        "expected @CheckRep method {} {expected}",
                        universe.method_label(method)
                    ),
                });
            }
            found.push(method);
        }
    }
    Ok(found)
}

/// Add the operations named by `signatures`. Signatures that do not parse
/// or name a rejected member are logged and dropped.
fn add_signatures(
    universe: &ClassUniverse,
    set: &mut OperationSet,
    signatures: &[String],
    policy: ExtractionPolicy<'_>,
) -> Result<()> {
    let dropped = |signature: &str, reason: String| {
        policy
            .diagnostics
            .record(EventType::SignatureDropped, signature, reason);
    };
    let types_visible = |types: &[Type]| {
        types
            .iter()
            .all(|ty| policy.visibility.is_type_visible(universe, ty))
    };
    for signature in signatures {
        let member = match parse_signature(signature, universe) {
            Ok(member) => member,
            Err(error) if error.is_user_error() => {
                dropped(signature, error.to_string());
                continue;
            }
            Err(error) => return Err(error),
        };
        let op = match member {
            MemberId::Constructor(ctor) => {
                let info = universe.constructor(ctor);
                if !policy.visibility.is_class_visible(universe, info.declaring)
                    || !policy.visibility.is_constructor_visible(universe, ctor)
                    || !policy.predicate.test_constructor(universe, ctor)
                {
                    dropped(signature, "constructor not accessible".to_string());
                    continue;
                }
                if !types_visible(&info.params) {
                    dropped(signature, "constructor parameter type not accessible".to_string());
                    continue;
                }
                TypedOperation::for_constructor(universe, ctor)
            }
            MemberId::Method(method) => {
                let info = universe.method(method);
                if !policy.visibility.is_class_visible(universe, info.declaring)
                    || !policy.visibility.is_method_visible(universe, method)
                    || !policy.predicate.test_method(universe, method)
                {
                    dropped(signature, "method not accessible".to_string());
                    continue;
                }
                if !types_visible(std::slice::from_ref(&info.returns)) || !types_visible(&info.params) {
                    dropped(signature, "method signature mentions an inaccessible type".to_string());
                    continue;
                }
                TypedOperation::for_method(universe, method)
            }
            MemberId::Field(_) => {
                dropped(signature, "fields cannot be named by signature".to_string());
                continue;
            }
        };
        file_signature_op(universe, set, op, policy)?;
    }
    Ok(())
}

fn file_signature_op(
    universe: &ClassUniverse,
    set: &mut OperationSet,
    mut op: TypedOperation,
    policy: ExtractionPolicy<'_>,
) -> Result<()> {
    if let Some(specs) = policy.specifications
        && let Some(signature) = op.raw_signature(universe)
        && let Some(spec) = specs.lookup(&signature)
        && !spec.is_empty()
    {
        op = op.with_spec(spec.clone());
    }
    if policy.omit.should_omit(universe, &op)? {
        policy.diagnostics.record(
            EventType::OperationOmitted,
            op.describe(universe).to_string(),
            "matched an omission pattern",
        );
        set.add_omitted(op);
    } else {
        set.add(op);
    }
    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::literals::parse_literals;
    use crate::reflect::descriptor::UniverseDescriptor;

    fn universe() -> Arc<ClassUniverse> {
        ClassUniverse::from_descriptor(
            UniverseDescriptor::from_json(
                r#"{"classes":[
                  {"name":"pkg.C","modifiers":["public"],
                   "constructors":[{"modifiers":["public"]}],
                   "methods":[{"name":"m","modifiers":["public"],"params":["int"],"returns":"int"},
                              {"name":"hidden","modifiers":["private"]},
                              {"name":"repOk","modifiers":["public"],"returns":"boolean",
                               "annotations":["randoop.CheckRep"]}]},
                  {"name":"pkg.Abstract","modifiers":["public","abstract"],
                   "methods":[{"name":"run","modifiers":["public"]}]},
                  {"name":"pkg.Api","kind":"interface","modifiers":["public"]},
                  {"name":"pkg.Internal","modifiers":[],
                   "constructors":[{"modifiers":["public"]}]},
                  {"name":"pkg.Gate","modifiers":["public"],
                   "constructors":[{"modifiers":["public"],"params":["pkg.Internal"]}],
                   "methods":[{"name":"open","modifiers":["public"],"returns":"pkg.Internal"},
                              {"name":"pass","modifiers":["public"],"params":["pkg.Internal"]}]},
                  {"name":"pkg.Bad","modifiers":["public"],
                   "methods":[{"name":"check","modifiers":["public","static"],"returns":"boolean",
                               "annotations":["CheckRep"]}]},
                  {"name":"pkg.Util","modifiers":["public"],
                   "methods":[{"name":"first","modifiers":["public","static"],
                               "type_params":[{"name":"E"}],
                               "params":["java.util.List<E>"],"returns":"E"},
                              {"name":"wrap","modifiers":["public","static"],
                               "returns":"java.util.ArrayList<String>"}]}
                ]}"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn settings(classes: &[&str]) -> ModelSettings {
        ModelSettings {
            test_classes: classes.iter().map(|c| (*c).to_string()).collect(),
            ..ModelSettings::default()
        }
    }

    fn names(model: &OperationModel, ops: &BTreeSet<TypedOperation>) -> Vec<String> {
        let u = model.universe();
        ops.iter().map(|op| op.describe(u).to_string()).collect()
    }

    #[test]
    fn accepts_concrete_visible_classes_only() {
        let u = universe();
        let diagnostics = Diagnostics::in_memory();
        let model = OperationModel::build(
            u.clone(),
            &settings(&["pkg.C", "pkg.Abstract", "pkg.Api", "pkg.Internal"]),
            diagnostics.clone(),
        )
        .unwrap();
        assert_eq!(
            model.classes().iter().copied().collect::<Vec<_>>(),
            vec![u.lookup("pkg.C").unwrap()]
        );
        let ignored: Vec<_> = diagnostics
            .events()
            .into_iter()
            .filter(|e| e.event == EventType::ClassIgnored)
            .map(|e| (e.subject, e.reason))
            .collect();
        assert_eq!(ignored.len(), 3);
        assert!(ignored.contains(&("pkg.Abstract".to_string(), "abstract class".to_string())));
        assert!(ignored.contains(&("pkg.Api".to_string(), "interface".to_string())));
    }

    #[test]
    fn kept_operations_exclude_private_and_check_rep_methods() {
        let u = universe();
        let model = OperationModel::build(u.clone(), &settings(&["pkg.C"]), Diagnostics::disabled()).unwrap();
        let kept = names(&model, model.operations());
        assert!(kept.iter().any(|d| d.contains("pkg.C.m")));
        assert!(kept.iter().any(|d| d.contains("<init>")));
        assert!(!kept.iter().any(|d| d.contains("hidden")));
        assert!(!kept.iter().any(|d| d.contains("repOk")));
        assert_eq!(model.check_rep_methods().len(), 1);
    }

    #[test]
    fn unknown_class_fails_or_warns() {
        let u = universe();
        let err = OperationModel::build(u.clone(), &settings(&["pkg.Missing"]), Diagnostics::disabled())
            .unwrap_err();
        assert_eq!(err.code(), "OPF-2002");

        let mut warn = settings(&["pkg.Missing", "int", "pkg.C"]);
        warn.class_name_errors = ClassNameErrorHandler::Warn;
        let diagnostics = Diagnostics::in_memory();
        let model = OperationModel::build(u, &warn, diagnostics.clone()).unwrap();
        assert_eq!(model.classes().len(), 1);
        assert_eq!(diagnostics.count(EventType::ClassIgnored), 2);
    }

    #[test]
    fn primitive_test_class_is_rejected() {
        let err = OperationModel::build(universe(), &settings(&["boolean"]), Diagnostics::disabled())
            .unwrap_err();
        assert!(err.to_string().contains("primitive"));
    }

    #[test]
    fn check_rep_contract_is_enforced() {
        let err = OperationModel::build(universe(), &settings(&["pkg.Bad"]), Diagnostics::disabled())
            .unwrap_err();
        assert_eq!(err.code(), "OPF-2005");
        assert!(err.to_string().contains("non-static"));
    }

    #[test]
    fn covered_classes_include_abstract_targets() {
        let u = universe();
        let mut s = settings(&["pkg.C", "pkg.Abstract"]);
        s.covered_classes = vec!["pkg.Abstract".to_string(), "pkg.Util".to_string(), "pkg.Api".to_string()];
        let model = OperationModel::build(u.clone(), &s, Diagnostics::disabled()).unwrap();
        let covered: Vec<_> = model.covered_classes().iter().map(|&c| u.class(c).name.clone()).collect();
        assert_eq!(covered, vec!["pkg.Abstract".to_string(), "pkg.Util".to_string()]);
    }

    #[test]
    fn signatures_add_operations_or_are_dropped() {
        let u = universe();
        let mut s = settings(&[]);
        s.method_signatures = vec![
            "pkg.C.m(int)".to_string(),
            "pkg.C.hidden()".to_string(),
            "pkg.C.nothing()".to_string(),
            "pkg.C(".to_string(),
            "pkg.Internal()".to_string(),
        ];
        let diagnostics = Diagnostics::in_memory();
        let model = OperationModel::build(u, &s, diagnostics.clone()).unwrap();
        assert_eq!(model.operations().len(), 1);
        assert_eq!(diagnostics.count(EventType::SignatureDropped), 4);
    }

    #[test]
    fn signatures_over_inaccessible_types_are_dropped() {
        let u = universe();
        let mut s = settings(&[]);
        s.method_signatures = vec![
            "pkg.Gate(pkg.Internal)".to_string(),
            "pkg.Gate.open()".to_string(),
            "pkg.Gate.pass(pkg.Internal)".to_string(),
        ];
        let diagnostics = Diagnostics::in_memory();
        let model = OperationModel::build(u.clone(), &s, diagnostics.clone()).unwrap();
        assert!(model.operations().is_empty());
        assert_eq!(diagnostics.count(EventType::SignatureDropped), 3);

        s.visibility = VisibilityPredicate::Package("pkg".to_string());
        let diagnostics = Diagnostics::in_memory();
        let model = OperationModel::build(u, &s, diagnostics.clone()).unwrap();
        assert_eq!(model.operations().len(), 3);
        assert_eq!(diagnostics.count(EventType::SignatureDropped), 0);
    }

    #[test]
    fn omitted_signature_lands_in_omitted_set() {
        let mut s = settings(&["pkg.C"]);
        s.omit_methods = vec!["pkg\\.C\\.m\\(int\\)".to_string()];
        let model = OperationModel::build(universe(), &s, Diagnostics::disabled()).unwrap();
        assert_eq!(names(&model, model.omitted()).len(), 1);
        assert!(!names(&model, model.operations()).iter().any(|d| d.contains("pkg.C.m")));
    }

    #[test]
    fn literals_become_terms_and_feed_the_pool() {
        let u = universe();
        let mut s = settings(&["pkg.C"]);
        s.literals = parse_literals(
            "START CLASSLITERALS\nCLASSNAME\npkg.C\nLITERALS\nString:\"hi\"\nint:3\nEND CLASSLITERALS\n",
        )
        .unwrap();
        let model = OperationModel::build(u.clone(), &s, Diagnostics::disabled()).unwrap();
        assert_eq!(model.literals().len(), 2);
        let string = Type::class(u.lookup("java.lang.String").unwrap());
        assert!(model.pool().contains(&string));
        assert!(model.pool().contains(&u.object_type()));
    }

    #[test]
    fn fingerprint_is_stable_and_tracks_omission() {
        let u = universe();
        let a = OperationModel::build(u.clone(), &settings(&["pkg.C", "pkg.Util"]), Diagnostics::disabled()).unwrap();
        let b = OperationModel::build(u.clone(), &settings(&["pkg.Util", "pkg.C"]), Diagnostics::disabled()).unwrap();
        assert_eq!(a.operations(), b.operations());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut s = settings(&["pkg.C", "pkg.Util"]);
        s.omit_methods = vec!["m\\(int\\)".to_string()];
        let c = OperationModel::build(u, &s, Diagnostics::disabled()).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn generic_operations_instantiate_against_the_pool() {
        let u = universe();
        let model = OperationModel::build(u.clone(), &settings(&["pkg.Util"]), Diagnostics::disabled()).unwrap();
        let first = model
            .generic_operations()
            .find(|op| op.name(&u) == "first")
            .cloned()
            .expect("first is generic");
        assert!(model.generic_operations().all(|op| op.name(&u) != "wrap"));
        let mut instantiator = model.instantiator(3);
        let op = instantiator.instantiate(&first).expect("List<String> is in the pool");
        assert!(!op.is_generic());
        assert_eq!(u.display_type(&op.output), "java.lang.String");
    }
}
