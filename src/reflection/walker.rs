//! Walks the reflective surface of one class and hands every visible
//! member to a set of visitors.
//!
//! Members are visited in id order, which is canonical name order, so the
//! visit sequence is the same on every run.

#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet};

use crate::core::errors::Result;
use crate::logger::diagnostics::Diagnostics;
use crate::reflect::ids::{ClassId, ConstructorId, FieldId, MethodId};
use crate::reflect::universe::{ClassUniverse, EnumConstant};

use super::accessibility::VisibilityPredicate;

/// Receives the members of a walked class. Every callback defaults to a
/// no-op; the first error aborts the walk.
pub trait ClassVisitor {
    fn visit_before(&mut self, _universe: &ClassUniverse, _class: ClassId) -> Result<()> {
        Ok(())
    }

    fn visit_after(&mut self, _universe: &ClassUniverse, _class: ClassId) -> Result<()> {
        Ok(())
    }

    fn visit_constructor(&mut self, _universe: &ClassUniverse, _ctor: ConstructorId) -> Result<()> {
        Ok(())
    }

    fn visit_method(&mut self, _universe: &ClassUniverse, _method: MethodId) -> Result<()> {
        Ok(())
    }

    fn visit_field(&mut self, _universe: &ClassUniverse, _field: FieldId) -> Result<()> {
        Ok(())
    }

    fn visit_enum_constant(
        &mut self,
        _universe: &ClassUniverse,
        _class: ClassId,
        _constant: &EnumConstant,
    ) -> Result<()> {
        Ok(())
    }
}

type Visitors<'a, 'v> = [&'a mut (dyn ClassVisitor + 'v)];

fn fan_out(
    visitors: &mut Visitors<'_, '_>,
    mut call: impl FnMut(&mut dyn ClassVisitor) -> Result<()>,
) -> Result<()> {
    for visitor in visitors.iter_mut() {
        call(&mut **visitor)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ReflectionWalker {
    visibility: VisibilityPredicate,
    diagnostics: Diagnostics,
}

impl ReflectionWalker {
    #[must_use]
    pub fn new(visibility: VisibilityPredicate) -> Self {
        Self {
            visibility,
            diagnostics: Diagnostics::disabled(),
        }
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[must_use]
    pub const fn visibility(&self) -> &VisibilityPredicate {
        &self.visibility
    }

    /// Walk `class` in a single pass, handing each usable member to every
    /// visitor in visitor order. A class that is not visible is skipped
    /// without calling any visitor.
    pub fn apply(
        &self,
        universe: &ClassUniverse,
        class: ClassId,
        visitors: &mut [&mut dyn ClassVisitor],
    ) -> Result<()> {
        if !self.visibility.is_class_visible(universe, class) {
            self.diagnostics.class_ignored(
                universe.class(class).name.clone(),
                "class is not visible from test classes",
            );
            return Ok(());
        }
        self.walk(universe, class, visitors)
    }

    fn walk(&self, u: &ClassUniverse, class: ClassId, vs: &mut Visitors<'_, '_>) -> Result<()> {
        fan_out(vs, |v| v.visit_before(u, class))?;
        if u.class(class).is_enum() {
            self.walk_enum(u, class, vs)?;
        } else {
            self.walk_methods(u, class, vs)?;
            self.walk_constructors(u, class, vs)?;
            self.walk_member_classes(u, class, vs)?;
            self.walk_fields(u, class, vs)?;
        }
        fan_out(vs, |v| v.visit_after(u, class))
    }

    fn walk_methods(&self, u: &ClassUniverse, class: ClassId, vs: &mut Visitors<'_, '_>) -> Result<()> {
        let mut inherited = u.methods(class);
        inherited.sort_unstable();
        let seen: BTreeSet<MethodId> = inherited.iter().copied().collect();
        let declared = u.declared_methods(class).iter().copied().filter(|m| !seen.contains(m));
        for m in inherited.iter().copied().chain(declared) {
            if self.method_usable(u, m) {
                fan_out(vs, |v| v.visit_method(u, m))?;
            }
        }
        Ok(())
    }

    fn walk_constructors(
        &self,
        u: &ClassUniverse,
        class: ClassId,
        vs: &mut Visitors<'_, '_>,
    ) -> Result<()> {
        for &c in u.declared_constructors(class) {
            if self.constructor_usable(u, c) {
                fan_out(vs, |v| v.visit_constructor(u, c))?;
            }
        }
        Ok(())
    }

    fn walk_member_classes(
        &self,
        u: &ClassUniverse,
        class: ClassId,
        vs: &mut Visitors<'_, '_>,
    ) -> Result<()> {
        for &inner in u.declared_classes(class) {
            if !self.visibility.is_class_visible(u, inner) {
                continue;
            }
            fan_out(vs, |v| v.visit_before(u, inner))?;
            if u.class(inner).is_enum() {
                self.walk_enum(u, inner, vs)?;
            }
            fan_out(vs, |v| v.visit_after(u, inner))?;
        }
        Ok(())
    }

    fn walk_fields(&self, u: &ClassUniverse, class: ClassId, vs: &mut Visitors<'_, '_>) -> Result<()> {
        let mut declared_names = BTreeSet::new();
        for &f in u.declared_fields(class) {
            declared_names.insert(u.field(f).name.as_str());
            if self.visibility.is_field_visible(u, f) {
                fan_out(vs, |v| v.visit_field(u, f))?;
            }
        }
        let mut public = u.fields(class);
        public.sort_unstable();
        for f in public {
            let info = u.field(f);
            if info.declaring == class || declared_names.contains(info.name.as_str()) {
                continue;
            }
            if self.visibility.is_field_visible(u, f) {
                fan_out(vs, |v| v.visit_field(u, f))?;
            }
        }
        Ok(())
    }

    /// Constants first, then declared methods, then inherited methods that
    /// some constant body overrides.
    fn walk_enum(&self, u: &ClassUniverse, class: ClassId, vs: &mut Visitors<'_, '_>) -> Result<()> {
        let mut overrides: BTreeMap<&str, BTreeSet<MethodId>> = BTreeMap::new();
        for constant in u.enum_constants(class) {
            fan_out(vs, |v| v.visit_enum_constant(u, class, constant))?;
            if let Some(body) = constant.body {
                for &m in u.declared_methods(body) {
                    overrides.entry(u.method(m).name.as_str()).or_default().insert(m);
                }
            }
        }
        for &m in u.declared_methods(class) {
            let name = u.method(m).name.as_str();
            if name != "values" && name != "valueOf" && self.method_usable(u, m) {
                fan_out(vs, |v| v.visit_method(u, m))?;
            }
        }
        let mut inherited = u.methods(class);
        inherited.sort_unstable();
        for m in inherited {
            if !self.visibility.is_method_visible(u, m) {
                continue;
            }
            if let Some(bodies) = overrides.get(u.method(m).name.as_str()) {
                for &body_method in bodies {
                    fan_out(vs, |v| v.visit_method(u, body_method))?;
                }
            }
        }
        Ok(())
    }

    fn method_usable(&self, u: &ClassUniverse, m: MethodId) -> bool {
        let info = u.method(m);
        let reason = if !self.visibility.is_method_visible(u, m) {
            "the method is not visible from test classes"
        } else if !self.visibility.is_type_visible(u, &info.returns) {
            "the method's return type is not visible from test classes"
        } else if !info.params.iter().all(|p| self.visibility.is_type_visible(u, p)) {
            "the method has a parameter that is not visible from test classes"
        } else {
            return true;
        };
        self.diagnostics.member_rejected(u.method_label(m), reason);
        false
    }

    fn constructor_usable(&self, u: &ClassUniverse, c: ConstructorId) -> bool {
        let info = u.constructor(c);
        let reason = if !self.visibility.is_constructor_visible(u, c) {
            "the constructor is not visible from test classes"
        } else if !info.params.iter().all(|p| self.visibility.is_type_visible(u, p)) {
            "the constructor has a parameter that is not visible from test classes"
        } else {
            return true;
        };
        self.diagnostics.member_rejected(u.constructor_label(c), reason);
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logger::jsonl::EventType;
    use crate::reflect::descriptor::UniverseDescriptor;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ClassVisitor for Recorder {
        fn visit_before(&mut self, u: &ClassUniverse, class: ClassId) -> Result<()> {
            self.events.push(format!("before {}", u.class(class).name));
            Ok(())
        }

        fn visit_after(&mut self, u: &ClassUniverse, class: ClassId) -> Result<()> {
            self.events.push(format!("after {}", u.class(class).name));
            Ok(())
        }

        fn visit_constructor(&mut self, u: &ClassUniverse, ctor: ConstructorId) -> Result<()> {
            self.events.push(format!("ctor {}", u.constructor_label(ctor)));
            Ok(())
        }

        fn visit_method(&mut self, u: &ClassUniverse, method: MethodId) -> Result<()> {
            let m = u.method(method);
            self.events.push(format!("method {}.{}", u.class(m.declaring).name, m.name));
            Ok(())
        }

        fn visit_field(&mut self, u: &ClassUniverse, field: FieldId) -> Result<()> {
            let f = u.field(field);
            self.events.push(format!("field {}.{}", u.class(f.declaring).name, f.name));
            Ok(())
        }

        fn visit_enum_constant(
            &mut self,
            _u: &ClassUniverse,
            _class: ClassId,
            constant: &EnumConstant,
        ) -> Result<()> {
            self.events.push(format!("constant {}", constant.name));
            Ok(())
        }
    }

    fn universe() -> Arc<ClassUniverse> {
        ClassUniverse::from_descriptor(
            UniverseDescriptor::from_json(
                r#"{"classes":[
                  {"name":"pkg.Base","modifiers":["public"],
                   "fields":[{"name":"shared","modifiers":["public"],"type":"int"},
                             {"name":"shadowed","modifiers":["public"],"type":"int"}]},
                  {"name":"pkg.A","modifiers":["public"],"superclass":"pkg.Base",
                   "constructors":[{"modifiers":["public"]},
                                   {"modifiers":["public"],"params":["pkg.Secret"]}],
                   "methods":[{"name":"f","modifiers":["public"],"params":["String"],"returns":"int"},
                              {"name":"g","modifiers":[],"returns":"void"},
                              {"name":"leak","modifiers":["public"],"returns":"pkg.Secret"}],
                   "fields":[{"name":"shadowed","modifiers":["public"],"type":"long"}]},
                  {"name":"pkg.A$Mode","kind":"enum","modifiers":["public","static","final"],
                   "enum_constants":[{"name":"ON"}]},
                  {"name":"pkg.Secret","modifiers":[]},
                  {"name":"pkg.Color","kind":"enum","modifiers":["public"],
                   "methods":[{"name":"describe","modifiers":["public"],"returns":"String"},
                              {"name":"values","modifiers":["public","static"],"returns":"pkg.Color[]"}],
                   "enum_constants":[{"name":"RED"},{"name":"GREEN","body":"pkg.Color$1"}]},
                  {"name":"pkg.Color$1","modifiers":["final"],
                   "methods":[{"name":"describe","modifiers":["public"],"returns":"String"}]}
                ]}"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn walk(u: &ClassUniverse, name: &str, visibility: VisibilityPredicate) -> Vec<String> {
        let mut recorder = Recorder::default();
        ReflectionWalker::new(visibility)
            .apply(u, u.lookup(name).unwrap(), &mut [&mut recorder])
            .unwrap();
        recorder.events
    }

    #[test]
    fn invisible_class_is_not_walked() {
        let u = universe();
        assert!(walk(&u, "pkg.Secret", VisibilityPredicate::PublicOnly).is_empty());
        assert!(!walk(&u, "pkg.Secret", VisibilityPredicate::NotPrivate).is_empty());
    }

    #[test]
    fn class_walk_order_and_filters() {
        let u = universe();
        let diag = Diagnostics::in_memory();
        let mut recorder = Recorder::default();
        ReflectionWalker::new(VisibilityPredicate::PublicOnly)
            .with_diagnostics(diag.clone())
            .apply(&u, u.lookup("pkg.A").unwrap(), &mut [&mut recorder])
            .unwrap();
        let events = recorder.events;
        assert_eq!(events.first().map(String::as_str), Some("before pkg.A"));
        assert_eq!(events.last().map(String::as_str), Some("after pkg.A"));
        assert!(events.contains(&"method pkg.A.f".to_string()));
        assert!(!events.contains(&"method pkg.A.g".to_string()));
        assert!(!events.contains(&"method pkg.A.leak".to_string()));
        assert_eq!(events.iter().filter(|e| e.starts_with("ctor")).count(), 1);
        let nested = events.iter().position(|e| e == "before pkg.A$Mode").unwrap();
        assert_eq!(events[nested + 1], "constant ON");
        assert_eq!(events[nested + 2], "after pkg.A$Mode");
        assert!(events.contains(&"field pkg.A.shadowed".to_string()));
        assert!(events.contains(&"field pkg.Base.shared".to_string()));
        assert!(!events.contains(&"field pkg.Base.shadowed".to_string()));
        assert!(diag.count(EventType::MemberRejected) >= 2);
    }

    #[test]
    fn enum_body_overrides_are_recovered() {
        let u = universe();
        let events = walk(&u, "pkg.Color", VisibilityPredicate::PublicOnly);
        assert_eq!(events[1], "constant RED");
        assert_eq!(events[2], "constant GREEN");
        assert!(events.contains(&"method pkg.Color.describe".to_string()));
        assert!(events.contains(&"method pkg.Color$1.describe".to_string()));
        assert!(!events.iter().any(|e| e.ends_with(".values")));
    }

    #[test]
    fn every_visitor_sees_the_class() {
        let u = universe();
        let class = u.lookup("pkg.A").unwrap();

        let single = Diagnostics::in_memory();
        let mut alone = Recorder::default();
        ReflectionWalker::new(VisibilityPredicate::PublicOnly)
            .with_diagnostics(single.clone())
            .apply(&u, class, &mut [&mut alone])
            .unwrap();

        let shared = Diagnostics::in_memory();
        let mut first = Recorder::default();
        let mut second = Recorder::default();
        ReflectionWalker::new(VisibilityPredicate::PublicOnly)
            .with_diagnostics(shared.clone())
            .apply(&u, class, &mut [&mut first, &mut second])
            .unwrap();

        assert_eq!(first.events, second.events);
        assert_eq!(first.events, alone.events);
        assert!(single.count(EventType::MemberRejected) > 0);
        assert_eq!(
            shared.count(EventType::MemberRejected),
            single.count(EventType::MemberRejected)
        );
    }

    #[test]
    fn declared_members_with_private_types_are_rejected() {
        let u = ClassUniverse::from_descriptor(
            UniverseDescriptor::from_json(
                r#"{"classes":[
                  {"name":"pkg.A","modifiers":["public"],
                   "constructors":[{"modifiers":[]},
                                   {"modifiers":[],"params":["pkg.A$Secret"]}],
                   "methods":[{"name":"hidden","modifiers":["public"],"returns":"pkg.A$Secret"},
                              {"name":"leak","modifiers":[],"returns":"pkg.A$Secret"},
                              {"name":"take","modifiers":[],"params":["pkg.A$Secret"],"returns":"void"},
                              {"name":"plain","modifiers":[],"returns":"int"}]},
                  {"name":"pkg.A$Secret","modifiers":["private","static"]}
                ]}"#,
            )
            .unwrap(),
        )
        .unwrap();
        let diag = Diagnostics::in_memory();
        let mut recorder = Recorder::default();
        ReflectionWalker::new(VisibilityPredicate::NotPrivate)
            .with_diagnostics(diag.clone())
            .apply(&u, u.lookup("pkg.A").unwrap(), &mut [&mut recorder])
            .unwrap();
        let events = recorder.events;
        assert!(events.contains(&"method pkg.A.plain".to_string()));
        for name in ["hidden", "leak", "take"] {
            assert!(!events.contains(&format!("method pkg.A.{name}")), "{name}");
        }
        assert_eq!(events.iter().filter(|e| e.starts_with("ctor")).count(), 1);
        assert!(diag.count(EventType::MemberRejected) >= 4);
    }
}
