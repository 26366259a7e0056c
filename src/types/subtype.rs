//! Subtyping, bound satisfaction and structural matching of generic types
//! against ground types.

use crate::reflect::universe::ClassUniverse;
use crate::types::substitution::Substitution;
use crate::types::ty::{ClassType, Type, TypeArg, TypeVariable, Wildcard};

/// Recursive bounds (`E extends Enum<E>`) are finite in the arena, but a
/// malformed descriptor could still send the checker round in circles.
const MAX_DEPTH: usize = 32;

/// Where bounds of type variables come from.
///
/// The universe knows declared variables; the instantiator layers capture
/// variables on top.
pub trait TypeEnv {
    fn universe(&self) -> &ClassUniverse;

    /// Upper bounds; never empty (`Object` when nothing was declared).
    fn upper_bounds(&self, var: &TypeVariable) -> Vec<Type>;

    /// Lower bound; the null type when there is none.
    fn lower_bound(&self, var: &TypeVariable) -> Type;
}

impl TypeEnv for ClassUniverse {
    fn universe(&self) -> &ClassUniverse {
        self
    }

    fn upper_bounds(&self, var: &TypeVariable) -> Vec<Type> {
        self.declared_bounds(var)
    }

    fn lower_bound(&self, _var: &TypeVariable) -> Type {
        Type::Null
    }
}

/// `sub <: sup`.
#[must_use]
pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    subtype_at(env, sub, sup, 0)
}

fn subtype_at(env: &dyn TypeEnv, sub: &Type, sup: &Type, depth: usize) -> bool {
    if depth > MAX_DEPTH {
        return false;
    }
    if sub == sup {
        return true;
    }
    if matches!(sub, Type::Null) {
        return sup.is_reference();
    }
    if !sub.is_reference() || !sup.is_reference() || matches!(sup, Type::Null) {
        return false;
    }
    if let Type::Var(var) = sup {
        let lower = env.lower_bound(var);
        if lower != Type::Null && subtype_at(env, sub, &lower, depth + 1) {
            return true;
        }
    }
    if let Type::Var(var) = sub {
        return env
            .upper_bounds(var)
            .iter()
            .any(|bound| subtype_at(env, bound, sup, depth + 1));
    }
    let universe = env.universe();
    match (sub, sup) {
        (_, Type::Var(_)) => false,
        (_, Type::Class(ct)) if ct.class == universe.object() && ct.args.is_empty() => true,
        (Type::Array(a), Type::Array(b)) => {
            if a.is_primitive() || b.is_primitive() {
                a == b
            } else {
                subtype_at(env, a, b, depth + 1)
            }
        }
        (Type::Class(a), Type::Class(b)) => class_subtype(env, a, b, depth),
        _ => false,
    }
}

fn class_subtype(env: &dyn TypeEnv, sub: &ClassType, sup: &ClassType, depth: usize) -> bool {
    let Some(view) = env.universe().as_super(sub, sup.class) else {
        return false;
    };
    if sup.args.is_empty() {
        return true;
    }
    if view.args.len() != sup.args.len() {
        return false;
    }
    sup.args
        .iter()
        .zip(&view.args)
        .all(|(outer, inner)| contains(env, outer, inner, depth + 1))
}

/// Type-argument containment, `inner <= outer`.
fn contains(env: &dyn TypeEnv, outer: &TypeArg, inner: &TypeArg, depth: usize) -> bool {
    let is_object = |ty: &Type| *ty == env.universe().object_type();
    match (outer, inner) {
        (TypeArg::Type(t), TypeArg::Type(s)) => t == s,
        (TypeArg::Type(_), TypeArg::Wildcard(_)) => false,
        (TypeArg::Wildcard(Wildcard::Unbounded), _) => true,
        (TypeArg::Wildcard(Wildcard::Extends(b)), TypeArg::Type(s)) => subtype_at(env, s, b, depth),
        (TypeArg::Wildcard(Wildcard::Extends(b)), TypeArg::Wildcard(Wildcard::Extends(c))) => {
            subtype_at(env, c, b, depth)
        }
        (TypeArg::Wildcard(Wildcard::Extends(b)), TypeArg::Wildcard(_)) => is_object(b),
        (TypeArg::Wildcard(Wildcard::Super(b)), TypeArg::Type(s)) => subtype_at(env, b, s, depth),
        (TypeArg::Wildcard(Wildcard::Super(b)), TypeArg::Wildcard(Wildcard::Super(c))) => {
            subtype_at(env, b, c, depth)
        }
        (TypeArg::Wildcard(Wildcard::Super(_)), TypeArg::Wildcard(_)) => false,
    }
}

/// Whether `candidate` may stand for `var` once `subst` is applied to the
/// variable's bounds.
#[must_use]
pub fn satisfies_bounds(
    env: &dyn TypeEnv,
    var: &TypeVariable,
    candidate: &Type,
    subst: &Substitution,
) -> bool {
    let upper_ok = env
        .upper_bounds(var)
        .iter()
        .all(|bound| is_subtype(env, candidate, &bound.substitute(subst)));
    if !upper_ok {
        return false;
    }
    let lower = env.lower_bound(var).substitute(subst);
    lower == Type::Null || is_subtype(env, &lower, candidate)
}

/// The substitution that turns `pattern` into `ground`, if `ground` is a
/// structural instantiation of it whose chosen arguments respect the
/// bounds of the variables they replace.
#[must_use]
pub fn match_instantiation(env: &dyn TypeEnv, pattern: &Type, ground: &Type) -> Option<Substitution> {
    let mut subst = Substitution::new();
    if !unify(pattern, ground, &mut subst) {
        return None;
    }
    let ok = subst
        .iter()
        .all(|(var, ty)| satisfies_bounds(env, var, ty, &subst));
    ok.then_some(subst)
}

fn unify(pattern: &Type, ground: &Type, subst: &mut Substitution) -> bool {
    match (pattern, ground) {
        (Type::Var(var), _) => {
            if !ground.is_reference() || *ground == Type::Null {
                return false;
            }
            match subst.with(var.clone(), ground.clone()) {
                Some(next) => {
                    *subst = next;
                    true
                }
                None => false,
            }
        }
        (Type::Class(p), Type::Class(g)) => {
            p.class == g.class
                && p.args.len() == g.args.len()
                && p.args
                    .iter()
                    .zip(&g.args)
                    .all(|(pa, ga)| unify_arg(pa, ga, subst))
        }
        (Type::Array(p), Type::Array(g)) => unify(p, g, subst),
        _ => pattern == ground,
    }
}

fn unify_arg(pattern: &TypeArg, ground: &TypeArg, subst: &mut Substitution) -> bool {
    match (pattern, ground) {
        (TypeArg::Type(p), TypeArg::Type(g)) => unify(p, g, subst),
        (TypeArg::Wildcard(Wildcard::Unbounded), TypeArg::Wildcard(Wildcard::Unbounded)) => true,
        (TypeArg::Wildcard(Wildcard::Extends(p)), TypeArg::Wildcard(Wildcard::Extends(g)))
        | (TypeArg::Wildcard(Wildcard::Super(p)), TypeArg::Wildcard(Wildcard::Super(g))) => {
            unify(p, g, subst)
        }
        _ => false,
    }
}
