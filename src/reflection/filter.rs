//! Inclusion policy: which visible members are worth calling from a
//! generated test.
//!
//! Method rules apply in a fixed order; the first that fires decides:
//!
//! 1. instrumentation scaffolding (name contains [`INSTRUMENTATION_MARKER`])
//! 2. `main(String[])`
//! 3. bridges, unless a visibility bridge
//! 4. other synthetic methods
//! 5. `Object` methods other than `getClass`
//! 6. `Thread` methods (not logged)
//! 7. `@CheckRep` methods, which are oracles rather than call targets
//! 8. a deny-list of nondeterministic or exception-introspection methods

#![allow(missing_docs)]

use std::collections::BTreeSet;

use crate::logger::diagnostics::Diagnostics;
use crate::reflect::ids::{ClassId, ConstructorId, FieldId, MethodId};
use crate::reflect::universe::{ClassUniverse, MemberVariant, OBJECT};
use crate::types::ty::Type;

use super::accessibility::VisibilityPredicate;

/// Substring marking members injected by instrumentation.
pub const INSTRUMENTATION_MARKER: &str = "randoop_";

/// Simple name of the representation-invariant annotation.
pub const CHECK_REP: &str = "CheckRep";

const EXCEPTION_INTROSPECTION: [&str; 8] = [
    "fillInStackTrace",
    "getCause",
    "getLocalizedMessage",
    "getMessage",
    "getStackTrace",
    "initCause",
    "printStackTrace",
    "setStackTrace",
];

/// Whether `annotation` names the representation-invariant annotation.
#[must_use]
pub fn is_check_rep(annotation: &str) -> bool {
    annotation == CHECK_REP || annotation.ends_with(".CheckRep")
}

/// Inclusion tests for classes and members.
pub trait ReflectionPredicate {
    fn test_class(&self, universe: &ClassUniverse, class: ClassId) -> bool;
    fn test_method(&self, universe: &ClassUniverse, method: MethodId) -> bool;
    fn test_constructor(&self, universe: &ClassUniverse, ctor: ConstructorId) -> bool;
    fn test_field(&self, universe: &ClassUniverse, field: FieldId) -> bool;
}

#[derive(Debug, Clone)]
pub struct DefaultReflectionPredicate {
    /// `pkg.Class.field` names never to access.
    omitted_fields: BTreeSet<String>,
    visibility: VisibilityPredicate,
    diagnostics: Diagnostics,
}

impl DefaultReflectionPredicate {
    #[must_use]
    pub fn new(visibility: VisibilityPredicate) -> Self {
        Self {
            omitted_fields: BTreeSet::new(),
            visibility,
            diagnostics: Diagnostics::disabled(),
        }
    }

    #[must_use]
    pub fn with_omitted_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omitted_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Why `method` is rejected, or `None` if it is accepted. The reason is
    /// empty for silent rejections.
    #[must_use]
    pub fn method_rejection(&self, universe: &ClassUniverse, method: MethodId) -> Option<&'static str> {
        let info = universe.method(method);
        let declaring = universe.class(info.declaring);

        if info.name.contains(INSTRUMENTATION_MARKER) {
            return Some("instrumentation artifact");
        }
        if info.name == "main" && is_string_array_only(universe, &info.params) {
            return Some("main method not applicable to unit testing");
        }
        if info.is_bridge() {
            if !self.is_visibility_bridge(universe, method) {
                return Some("bridge method");
            }
        } else if info.variant == MemberVariant::Synthetic {
            return Some("synthetic method");
        }
        if declaring.name == OBJECT && info.name != "getClass" {
            return Some("declared by java.lang.Object");
        }
        if declaring.name == "java.lang.Thread" {
            return Some("");
        }
        if info.annotations.iter().any(|a| is_check_rep(a)) {
            return Some("representation invariant checker");
        }
        deny_listed(universe, method)
    }

    /// A bridge whose only purpose is to expose a method of a non-visible
    /// superclass through a visible subclass.
    ///
    /// The first superclass declaring a non-bridge method with the same name
    /// and erased parameters decides. Bridges in enum-constant bodies never
    /// qualify.
    #[must_use]
    pub fn is_visibility_bridge(&self, universe: &ClassUniverse, method: MethodId) -> bool {
        let info = universe.method(method);
        if matches!(info.variant, MemberVariant::EnumConstantOverride { .. }) {
            return false;
        }
        if !self.visibility.is_class_visible(universe, info.declaring) {
            return false;
        }
        let erased = universe.erase_all(&info.params);
        let mut current = universe.superclass(info.declaring).map(|s| s.class);
        while let Some(class) = current {
            if let Some(found) = universe.declared_method(class, &info.name, &erased)
                && !universe.method(found).is_bridge()
            {
                return !self.visibility.is_class_visible(universe, class);
            }
            current = universe.superclass(class).map(|s| s.class);
        }
        false
    }

    fn reject(&self, subject: String, reason: &str) -> bool {
        if !reason.is_empty() {
            self.diagnostics.member_rejected(subject, reason);
        }
        false
    }
}

impl ReflectionPredicate for DefaultReflectionPredicate {
    fn test_class(&self, universe: &ClassUniverse, class: ClassId) -> bool {
        let info = universe.class(class);
        if info.anonymous {
            return self.reject(info.name.clone(), "anonymous class");
        }
        true
    }

    fn test_method(&self, universe: &ClassUniverse, method: MethodId) -> bool {
        match self.method_rejection(universe, method) {
            Some(reason) => self.reject(universe.method_label(method), reason),
            None => true,
        }
    }

    fn test_constructor(&self, universe: &ClassUniverse, ctor: ConstructorId) -> bool {
        let info = universe.constructor(ctor);
        if info.synthetic
            && info.params.iter().any(|p| {
                matches!(universe.erasure(p), Type::Class(ct) if universe.class(ct.class).anonymous)
            })
        {
            return self.reject(
                universe.constructor_label(ctor),
                "synthetic constructor taking an anonymous class",
            );
        }
        if universe.class(info.declaring).is_abstract() {
            return self.reject(universe.constructor_label(ctor), "declaring class is abstract");
        }
        true
    }

    fn test_field(&self, universe: &ClassUniverse, field: FieldId) -> bool {
        let info = universe.field(field);
        if info.name.contains(INSTRUMENTATION_MARKER) {
            return self.reject(universe.field_label(field), "instrumentation artifact");
        }
        let qualified = format!("{}.{}", universe.class(info.declaring).name, info.name);
        if self.omitted_fields.contains(&qualified) {
            return self.reject(qualified, "omitted field");
        }
        true
    }
}

fn is_string_array_only(universe: &ClassUniverse, params: &[Type]) -> bool {
    let [Type::Array(element)] = params else {
        return false;
    };
    matches!(universe.erasure(element), Type::Class(ct) if universe.class(ct.class).name == "java.lang.String")
}

fn deny_listed(universe: &ClassUniverse, method: MethodId) -> Option<&'static str> {
    let info = universe.method(method);
    let declaring = universe.class(info.declaring);
    let name = info.name.as_str();
    let erased = universe.erase_all(&info.params);

    if !declaring.anonymous
        && declaring.name == "java.lang.Enum"
        && name == "compareTo"
        && matches!(erased.as_slice(), [Type::Class(ct)] if ct.class == declaring.id)
    {
        return Some("compareTo of java.lang.Enum is not type safe");
    }
    if name == "randomUUID" {
        return Some("nondeterministic across runs");
    }
    if name == "hashCode" && declaring.name != "java.lang.String" {
        return Some("hashCode is nondeterministic across runs");
    }
    if name == "deepHashCode" && declaring.name == "java.util.Arrays" {
        return Some("deepHashCode is nondeterministic across runs");
    }
    if name == "getAvailableLocales" {
        return Some("nondeterministic across platforms");
    }
    if EXCEPTION_INTROSPECTION.contains(&name) {
        return Some("exception introspection method");
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logger::jsonl::EventType;
    use crate::reflect::descriptor::UniverseDescriptor;

    fn universe() -> Arc<ClassUniverse> {
        ClassUniverse::from_descriptor(
            UniverseDescriptor::from_json(
                r#"{"classes":[
                  {"name":"pkg.Base","modifiers":[],
                   "methods":[{"name":"size","modifiers":["public"],"returns":"int"}]},
                  {"name":"pkg.Sub","modifiers":["public"],"superclass":"pkg.Base",
                   "constructors":[{"modifiers":["public"]}],
                   "methods":[{"name":"size","modifiers":["public"],"returns":"int","bridge":true,"synthetic":true},
                              {"name":"clone","modifiers":["public"],"returns":"pkg.Sub"},
                              {"name":"clone","modifiers":["public"],"returns":"java.lang.Object","bridge":true,"synthetic":true},
                              {"name":"main","modifiers":["public","static"],"params":["String[]"]},
                              {"name":"randoop_probe","modifiers":["public"]},
                              {"name":"lambda$0","modifiers":["private","static"],"synthetic":true},
                              {"name":"valid","modifiers":["public"],"returns":"boolean","annotations":["CheckRep"]},
                              {"name":"hashCode","modifiers":["public"],"returns":"int"},
                              {"name":"getMessage","modifiers":["public"],"returns":"String"},
                              {"name":"work","modifiers":["public"],"returns":"int"}],
                   "fields":[{"name":"count","modifiers":["public"],"type":"int"},
                             {"name":"randoop_hits","modifiers":["public"],"type":"int"}]},
                  {"name":"pkg.Shape","modifiers":["public","abstract"],
                   "constructors":[{"modifiers":["public"]}]},
                  {"name":"pkg.Sub$1","modifiers":[],"superclass":"pkg.Sub"},
                  {"name":"pkg.Holder","modifiers":["public"],
                   "constructors":[{"modifiers":[],"params":["pkg.Sub$1"],"synthetic":true}]}
                ]}"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn sub_method(u: &ClassUniverse, name: &str, bridge: bool) -> MethodId {
        let sub = u.lookup("pkg.Sub").unwrap();
        *u.declared_methods(sub)
            .iter()
            .find(|&&m| u.method(m).name == name && u.method(m).is_bridge() == bridge)
            .unwrap()
    }

    fn predicate() -> DefaultReflectionPredicate {
        DefaultReflectionPredicate::new(VisibilityPredicate::PublicOnly)
    }

    #[test]
    fn ordinary_public_method_accepted() {
        let u = universe();
        assert!(predicate().test_method(&u, sub_method(&u, "work", false)));
        assert!(predicate().test_method(&u, sub_method(&u, "clone", false)));
    }

    #[test]
    fn visibility_bridge_to_hidden_superclass_is_kept() {
        let u = universe();
        let p = predicate();
        let size = sub_method(&u, "size", true);
        assert!(p.is_visibility_bridge(&u, size));
        assert!(p.test_method(&u, size));
    }

    #[test]
    fn covariant_clone_bridge_is_rejected() {
        let u = universe();
        // The first non-bridge clone() above Sub is Object's, which is visible.
        let bridge = sub_method(&u, "clone", true);
        assert!(!predicate().is_visibility_bridge(&u, bridge));
        assert!(!predicate().test_method(&u, bridge));
        let everything = DefaultReflectionPredicate::new(VisibilityPredicate::Everything);
        assert!(!everything.test_method(&u, sub_method(&u, "size", true)));
    }

    #[test]
    fn rules_fire_with_reasons() {
        let u = universe();
        let p = predicate();
        for (name, reason) in [
            ("main", "main method not applicable to unit testing"),
            ("randoop_probe", "instrumentation artifact"),
            ("lambda$0", "synthetic method"),
            ("valid", "representation invariant checker"),
            ("hashCode", "hashCode is nondeterministic across runs"),
            ("getMessage", "exception introspection method"),
        ] {
            assert_eq!(p.method_rejection(&u, sub_method(&u, name, false)), Some(reason), "{name}");
        }
    }

    #[test]
    fn object_methods_except_get_class_rejected() {
        let u = universe();
        let p = predicate();
        let object = u.object();
        for &m in u.declared_methods(object) {
            let accepted = p.test_method(&u, m);
            assert_eq!(accepted, u.method(m).name == "getClass", "{}", u.method(m).name);
        }
    }

    #[test]
    fn thread_methods_rejected_silently() {
        let u = universe();
        let diag = Diagnostics::in_memory();
        let p = predicate().with_diagnostics(diag.clone());
        let thread = u.lookup("java.lang.Thread").unwrap();
        for &m in u.declared_methods(thread) {
            assert!(!p.test_method(&u, m));
        }
        assert_eq!(diag.count(EventType::MemberRejected), 0);
        p.test_method(&u, sub_method(&u, "main", false));
        assert_eq!(diag.count(EventType::MemberRejected), 1);
    }

    #[test]
    fn enum_compare_to_and_string_hash_code() {
        let u = universe();
        let p = predicate();
        let enum_class = u.lookup("java.lang.Enum").unwrap();
        let compare = u
            .declared_methods(enum_class)
            .iter()
            .copied()
            .find(|&m| u.method(m).name == "compareTo")
            .unwrap();
        assert!(!p.test_method(&u, compare));
        let string = u.lookup("java.lang.String").unwrap();
        let hash = u.declared_method(string, "hashCode", &[]).unwrap();
        assert!(p.test_method(&u, hash));
    }

    #[test]
    fn constructor_rules() {
        let u = universe();
        let p = predicate();
        let sub = u.lookup("pkg.Sub").unwrap();
        assert!(p.test_constructor(&u, u.declared_constructors(sub)[0]));
        let shape = u.lookup("pkg.Shape").unwrap();
        assert!(!p.test_constructor(&u, u.declared_constructors(shape)[0]));
        let holder = u.lookup("pkg.Holder").unwrap();
        assert!(!p.test_constructor(&u, u.declared_constructors(holder)[0]));
        assert!(!p.test_class(&u, u.lookup("pkg.Sub$1").unwrap()));
    }

    #[test]
    fn field_rules() {
        let u = universe();
        let sub = u.lookup("pkg.Sub").unwrap();
        let fields = u.declared_fields(sub);
        let count = fields.iter().copied().find(|&f| u.field(f).name == "count").unwrap();
        let hits = fields.iter().copied().find(|&f| u.field(f).name == "randoop_hits").unwrap();
        assert!(predicate().test_field(&u, count));
        assert!(!predicate().test_field(&u, hits));
        let omitting = predicate().with_omitted_fields(["pkg.Sub.count"]);
        assert!(!omitting.test_field(&u, count));
    }
}
