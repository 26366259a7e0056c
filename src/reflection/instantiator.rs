//! Instantiation of generic operations against the ground-type pool.
//!
//! Given a generic operation, pick type arguments for every variable it
//! mentions so that the result can be called with values of pool types.
//! The search draws from an owned, seeded [`StdRng`]; because the pool is
//! iterated in canonical order, one seed always yields the same choices.
//!
//! Failing to find an instantiation is normal and reported as `None`.

#![allow(missing_docs)]

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::logger::diagnostics::Diagnostics;
use crate::logger::jsonl::EventType;
use crate::operation::typed::TypedOperation;
use crate::reflect::ids::{ClassId, TypeVarId};
use crate::reflect::universe::ClassUniverse;
use crate::types::pool::TypePool;
use crate::types::substitution::Substitution;
use crate::types::subtype::{TypeEnv, is_subtype, match_instantiation, satisfies_bounds};
use crate::types::ty::{ClassType, Type, TypeArg, TypeVariable, Wildcard};

/// Default weight of reusing a pool instantiation over building a fresh one.
pub const DEFAULT_REUSE_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone)]
struct CaptureBounds {
    upper: Vec<Type>,
    lower: Type,
}

/// Declared bounds from the universe plus the capture variables minted by
/// the current instantiation.
#[derive(Debug)]
struct CaptureEnv {
    universe: Arc<ClassUniverse>,
    captures: Vec<CaptureBounds>,
}

impl CaptureEnv {
    fn capture(&self, var: &TypeVariable) -> Option<&CaptureBounds> {
        match var.id {
            TypeVarId::Capture(n) => self.captures.get(n as usize),
            TypeVarId::Declared(_) => None,
        }
    }

    fn fresh(&mut self, upper: Vec<Type>, lower: Type) -> TypeVariable {
        let n = u32::try_from(self.captures.len()).unwrap_or(u32::MAX);
        self.captures.push(CaptureBounds { upper, lower });
        TypeVariable {
            id: TypeVarId::Capture(n),
            name: Arc::from(format!("capture#{n}")),
        }
    }
}

impl TypeEnv for CaptureEnv {
    fn universe(&self) -> &ClassUniverse {
        &self.universe
    }

    fn upper_bounds(&self, var: &TypeVariable) -> Vec<Type> {
        match self.capture(var) {
            Some(bounds) if !bounds.upper.is_empty() => bounds.upper.clone(),
            Some(_) => vec![self.universe.object_type()],
            None => self.universe.declared_bounds(var),
        }
    }

    fn lower_bound(&self, var: &TypeVariable) -> Type {
        self.capture(var).map_or(Type::Null, |b| b.lower.clone())
    }
}

/// JDK types the sorted-set rule needs, when the universe has them.
#[derive(Debug, Clone, Copy)]
struct SortedSetTypes {
    sorted_set: ClassId,
    comparable: ClassId,
    comparator: ClassId,
    collection: ClassId,
}

impl SortedSetTypes {
    fn resolve(universe: &ClassUniverse) -> Option<Self> {
        Some(Self {
            sorted_set: universe.lookup("java.util.SortedSet")?,
            comparable: universe.lookup("java.lang.Comparable")?,
            comparator: universe.lookup("java.util.Comparator")?,
            collection: universe.lookup("java.util.Collection")?,
        })
    }
}

pub struct TypeInstantiator {
    env: CaptureEnv,
    pool: TypePool,
    rng: StdRng,
    reuse_probability: f64,
    sorted: Option<SortedSetTypes>,
    diagnostics: Diagnostics,
}

impl std::fmt::Debug for TypeInstantiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInstantiator")
            .field("pool", &self.pool.len())
            .field("reuse_probability", &self.reuse_probability)
            .finish_non_exhaustive()
    }
}

impl TypeInstantiator {
    #[must_use]
    pub fn new(universe: Arc<ClassUniverse>, pool: TypePool, rng: StdRng) -> Self {
        let sorted = SortedSetTypes::resolve(&universe);
        Self {
            env: CaptureEnv {
                universe,
                captures: Vec::new(),
            },
            pool,
            rng,
            reuse_probability: DEFAULT_REUSE_PROBABILITY,
            sorted,
            diagnostics: Diagnostics::disabled(),
        }
    }

    #[must_use]
    pub fn seeded(universe: Arc<ClassUniverse>, pool: TypePool, seed: u64) -> Self {
        Self::new(universe, pool, StdRng::seed_from_u64(seed))
    }

    /// Probability of reusing a pool instantiation of a generic declaring
    /// type when a fresh one could also be built. Clamped to `[0, 1]`.
    #[must_use]
    pub fn with_reuse_probability(mut self, probability: f64) -> Self {
        self.reuse_probability = if probability.is_nan() {
            DEFAULT_REUSE_PROBABILITY
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[must_use]
    pub fn pool(&self) -> &TypePool {
        &self.pool
    }

    /// A concrete version of `op`, or `None` if the pool has no types that
    /// satisfy its constraints. Operations that are neither generic nor
    /// carry wildcards come back unchanged.
    pub fn instantiate(&mut self, op: &TypedOperation) -> Option<TypedOperation> {
        if !op.is_generic() && !op.has_wildcard_types() {
            return Some(op.clone());
        }
        self.env.captures.clear();
        let result = self.instantiate_steps(op.clone());
        if result.is_none() {
            self.diagnostics.record(
                EventType::InstantiationFailed,
                op.describe(&self.env.universe).to_string(),
                format!("no instantiation from a pool of {} types", self.pool.len()),
            );
        }
        result
    }

    fn instantiate_steps(&mut self, mut op: TypedOperation) -> Option<TypedOperation> {
        let declaring = op.declaring_type.clone();
        if declaring.is_generic() {
            let produces_declaring = op.is_constructor_call()
                || (op.is_static(&self.env.universe) && op.output == Type::Class(declaring.clone()));
            let subst = if produces_declaring {
                match self.sorted {
                    Some(sorted)
                        if self.env.universe.is_subclass(declaring.class, sorted.sorted_set) =>
                    {
                        self.sorted_set_substitution(&op, &declaring, sorted)?
                    }
                    _ => self.instantiate_declaring_class(&declaring)?,
                }
            } else {
                self.select_match(&Type::Class(declaring))?
            };
            op = op.substitute(&subst);
        }
        if op.inputs.iter().any(Type::has_wildcard) {
            op = self.capture_conversion(op);
        }
        self.instantiate_operation_types(op)
    }

    /// Sorted containers need a comparable element type or a comparator;
    /// the constructor's parameter shape says which.
    fn sorted_set_substitution(
        &mut self,
        op: &TypedOperation,
        declaring: &ClassType,
        sorted: SortedSetTypes,
    ) -> Option<Substitution> {
        if !op.is_constructor_call() {
            return self.instantiate_declaring_class(declaring);
        }
        let param = self
            .env
            .universe
            .class(declaring.class)
            .type_params
            .first()?
            .clone();
        let search = match op.inputs.as_slice() {
            [] => sorted.comparable,
            [Type::Class(input)] if input.class == sorted.comparator => sorted.comparator,
            [Type::Class(input)] if input.class == sorted.collection => sorted.comparable,
            [Type::Class(input)] if input.class == sorted.sorted_set => sorted.sorted_set,
            _ => return None,
        };
        let search_type = self.env.universe.generic_type(search);
        let subst = self.select_match(&Type::Class(search_type.clone()))?;
        match search_type.substitute(&subst).args.first()? {
            TypeArg::Type(element) => Some(Substitution::for_args(&[param], &[element.clone()])),
            TypeArg::Wildcard(_) => None,
        }
    }

    fn instantiate_declaring_class(&mut self, declaring: &ClassType) -> Option<Substitution> {
        if self.rng.random_bool(self.reuse_probability)
            && let Some(subst) = self.select_match(&Type::Class(declaring.clone()))
        {
            return Some(subst);
        }
        let params = self.env.universe.class(declaring.class).type_params.clone();
        let subst = self.select_substitution(&params, Substitution::new())?;
        if declaring.substitute(&subst).is_generic() {
            self.diagnostics.record(
                EventType::InstantiationFailed,
                self.env.universe.display_class_type(declaring),
                "no pool types satisfy the bounds of the generic type",
            );
            return None;
        }
        Some(subst)
    }

    /// A random pool type that instantiates `pattern`, as the substitution
    /// producing it.
    fn select_match(&mut self, pattern: &Type) -> Option<Substitution> {
        let Type::Class(shape) = pattern else {
            return None;
        };
        let matches: Vec<Substitution> = self
            .pool
            .iter()
            .filter(|ty| matches!(ty, Type::Class(ct) if ct.class == shape.class && ct.is_parameterized()))
            .filter_map(|ty| match_instantiation(&self.env, pattern, ty))
            .collect();
        matches.choose(&mut self.rng).cloned()
    }

    /// Replace each top-level wildcard argument of an input type by a fresh
    /// capture variable bounded by the wildcard and the declared bounds.
    fn capture_conversion(&mut self, op: TypedOperation) -> TypedOperation {
        let inputs = op
            .inputs
            .iter()
            .map(|input| match input {
                Type::Class(ct) if ct.has_wildcard() => Type::Class(self.capture(ct)),
                other => other.clone(),
            })
            .collect();
        TypedOperation { inputs, ..op }
    }

    fn capture(&mut self, ct: &ClassType) -> ClassType {
        let universe = Arc::clone(&self.env.universe);
        let params = &universe.class(ct.class).type_params;
        if params.len() != ct.args.len() {
            return ct.clone();
        }
        let mut args = Vec::with_capacity(ct.args.len());
        let mut pending = Vec::new();
        for (index, arg) in ct.args.iter().enumerate() {
            match arg {
                TypeArg::Type(_) => args.push(arg.clone()),
                TypeArg::Wildcard(wildcard) => {
                    let var = self.env.fresh(Vec::new(), Type::Null);
                    pending.push((index, var.clone(), wildcard.clone()));
                    args.push(TypeArg::Type(Type::Var(var)));
                }
            }
        }
        let subst = Substitution::for_class_args(params, &args);
        let object = universe.object_type();
        for (index, var, wildcard) in pending {
            let declared: Vec<Type> = universe
                .declared_bounds(&params[index])
                .iter()
                .map(|b| b.substitute(&subst))
                .filter(|b| *b != object)
                .collect();
            let (upper, lower) = match wildcard {
                Wildcard::Unbounded => (declared, Type::Null),
                Wildcard::Extends(bound) => {
                    let mut upper = vec![*bound];
                    upper.extend(declared);
                    (upper, Type::Null)
                }
                Wildcard::Super(bound) => (declared, *bound),
            };
            if let TypeVarId::Capture(n) = var.id
                && let Some(slot) = self.env.captures.get_mut(n as usize)
            {
                *slot = CaptureBounds { upper, lower };
            }
        }
        ClassType::new(ct.class, args)
    }

    /// Bind whatever variables remain after the declaring type is fixed:
    /// parameterized positions by matching pool types, bare variables by
    /// independent selection.
    fn instantiate_operation_types(&mut self, op: TypedOperation) -> Option<TypedOperation> {
        let mut subst = Substitution::new();
        let mut free: Vec<TypeVariable> = Vec::new();
        for input in &op.inputs {
            let working = input.substitute(&subst);
            if !working.is_generic() {
                continue;
            }
            if matches!(working, Type::Class(_)) {
                let matched = self.select_match(&working)?;
                subst = subst.extend(&matched)?;
            } else {
                working.collect_variables(&mut free);
            }
        }
        if op.output.is_reference() {
            let working = op.output.substitute(&subst);
            if working.is_generic() {
                working.collect_variables(&mut free);
            }
        }
        free.retain(|var| !subst.binds(var));
        if !free.is_empty() {
            subst = self.select_substitution(&free, subst)?;
        }
        let op = op.substitute(&subst);
        if op.is_generic() || op.inputs.iter().any(Type::has_wildcard) {
            return None;
        }
        Some(op)
    }

    fn select_substitution(&mut self, vars: &[TypeVariable], subst: Substitution) -> Option<Substitution> {
        let candidates = self.collect_substitutions(vars, &subst);
        candidates.choose(&mut self.rng).cloned()
    }

    /// Every substitution (or a random sample, for independent variables)
    /// extending `subst` to `vars`.
    ///
    /// Variables whose bounds mention type variables are solved after their
    /// independent siblings are fixed, or by enumerating the product of
    /// their candidate lists when there are no siblings. Capture variables
    /// are always independent and layered on last.
    fn collect_substitutions(&mut self, vars: &[TypeVariable], subst: &Substitution) -> Vec<Substitution> {
        if vars.is_empty() {
            return vec![subst.clone()];
        }
        let mut bounded = Vec::new();
        let mut independent = Vec::new();
        let mut captures = Vec::new();
        for var in vars {
            if self.has_generic_bound(var) {
                bounded.push(var.clone());
            } else if var.is_capture() {
                captures.push(var.clone());
            } else {
                independent.push(var.clone());
            }
        }

        let mut out = Vec::new();
        if !bounded.is_empty() {
            if independent.is_empty() {
                out = self.enumerate(&bounded, subst);
            } else {
                let Some(lists) = self.candidate_lists(&independent) else {
                    return Vec::new();
                };
                for tuple in CartesianProduct::new(&lists) {
                    let Some(initial) = subst.extend(&Substitution::for_args(&independent, &tuple)) else {
                        continue;
                    };
                    let remaining: Vec<TypeVariable> =
                        bounded.iter().filter(|v| !initial.binds(v)).cloned().collect();
                    if remaining.is_empty() {
                        out.push(initial);
                    } else {
                        out.extend(self.enumerate(&remaining, &initial));
                    }
                }
            }
            if out.is_empty() {
                return out;
            }
        } else if !independent.is_empty() {
            match self.select_and_extend(&independent, subst) {
                Some(next) => out.push(next),
                None => return Vec::new(),
            }
        }

        if !captures.is_empty() {
            if out.is_empty() {
                out.push(subst.clone());
            }
            out = out
                .iter()
                .filter_map(|s| self.select_and_extend(&captures, s))
                .collect();
        }
        out
    }

    /// Candidate tuples for `vars` that satisfy every bound together.
    fn enumerate(&self, vars: &[TypeVariable], initial: &Substitution) -> Vec<Substitution> {
        let Some(lists) = self.candidate_lists(vars) else {
            return Vec::new();
        };
        CartesianProduct::new(&lists)
            .filter_map(|tuple| {
                let full = initial.extend(&Substitution::for_args(vars, &tuple))?;
                vars.iter()
                    .zip(&tuple)
                    .all(|(var, ty)| satisfies_bounds(&self.env, var, ty, &full))
                    .then_some(full)
            })
            .collect()
    }

    fn select_and_extend(&mut self, vars: &[TypeVariable], subst: &Substitution) -> Option<Substitution> {
        let mut chosen = Vec::with_capacity(vars.len());
        for var in vars {
            let candidates = self.candidates(var);
            chosen.push(candidates.choose(&mut self.rng)?.clone());
        }
        subst.extend(&Substitution::for_args(vars, &chosen))
    }

    fn candidate_lists(&self, vars: &[TypeVariable]) -> Option<Vec<Vec<Type>>> {
        vars.iter()
            .map(|var| {
                let candidates = self.candidates(var);
                (!candidates.is_empty()).then_some(candidates)
            })
            .collect()
    }

    /// Pool types that satisfy the bounds of `var` taken on their own. A
    /// bound that needs another variable is relaxed to `Object` (upper) or
    /// the null type (lower).
    fn candidates(&self, var: &TypeVariable) -> Vec<Type> {
        let only_self = |bound: &Type| bound.type_variables().iter().all(|v| v == var);
        let upper = {
            let bounds = self.env.upper_bounds(var);
            if bounds.iter().all(only_self) {
                bounds
            } else {
                vec![self.env.universe.object_type()]
            }
        };
        let lower = {
            let bound = self.env.lower_bound(var);
            if only_self(&bound) { bound } else { Type::Null }
        };
        self.pool
            .iter()
            .filter(|ty| ty.is_reference())
            .filter(|ty| {
                let single = Substitution::for_args(std::slice::from_ref(var), std::slice::from_ref(*ty));
                let lower = lower.substitute(&single);
                (lower == Type::Null || is_subtype(&self.env, &lower, ty))
                    && upper
                        .iter()
                        .all(|b| is_subtype(&self.env, ty, &b.substitute(&single)))
            })
            .cloned()
            .collect()
    }

    /// A bound that needs some other type variable. Self-referential bounds
    /// such as `T extends Comparable<T>` do not count.
    fn has_generic_bound(&self, var: &TypeVariable) -> bool {
        let needs_other = |bound: &Type| bound.type_variables().iter().any(|v| v != var);
        self.env.upper_bounds(var).iter().any(needs_other) || needs_other(&self.env.lower_bound(var))
    }
}

/// Odometer over the product of non-empty candidate lists, last position
/// fastest.
struct CartesianProduct<'a> {
    lists: &'a [Vec<Type>],
    positions: Vec<usize>,
    done: bool,
}

impl<'a> CartesianProduct<'a> {
    fn new(lists: &'a [Vec<Type>]) -> Self {
        Self {
            lists,
            positions: vec![0; lists.len()],
            done: lists.iter().any(Vec::is_empty),
        }
    }
}

impl Iterator for CartesianProduct<'_> {
    type Item = Vec<Type>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .positions
            .iter()
            .zip(self.lists)
            .map(|(&i, list)| list[i].clone())
            .collect();
        self.done = true;
        for slot in (0..self.positions.len()).rev() {
            self.positions[slot] += 1;
            if self.positions[slot] < self.lists[slot].len() {
                self.done = false;
                break;
            }
            self.positions[slot] = 0;
        }
        Some(item)
    }
}
