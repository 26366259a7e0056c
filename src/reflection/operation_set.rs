//! Kept and omitted operations, with the override closure applied lazily.
//!
//! When a method call is omitted, every method it overrides is omitted
//! too: a call through a supertype could otherwise dispatch to the omitted
//! body. The closure is recomputed only after a mutation.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::operation::typed::TypedOperation;
use crate::reflect::ids::MethodId;
use crate::reflect::universe::ClassUniverse;

/// Whether the kept set still needs the override closure applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Stale,
    Filtered,
}

#[derive(Debug, Clone)]
pub struct OperationSet {
    universe: Arc<ClassUniverse>,
    kept: BTreeSet<TypedOperation>,
    omitted: BTreeSet<TypedOperation>,
    state: FilterState,
}

impl OperationSet {
    #[must_use]
    pub fn new(universe: Arc<ClassUniverse>) -> Self {
        Self {
            universe,
            kept: BTreeSet::new(),
            omitted: BTreeSet::new(),
            state: FilterState::Filtered,
        }
    }

    #[must_use]
    pub const fn state(&self) -> FilterState {
        self.state
    }

    /// Keep `op` unless it is already omitted.
    pub fn add(&mut self, op: TypedOperation) {
        if !self.omitted.contains(&op) {
            self.kept.insert(op);
        }
        self.state = FilterState::Stale;
    }

    /// Omit `op`, removing it from the kept set if present.
    pub fn add_omitted(&mut self, op: TypedOperation) {
        self.kept.remove(&op);
        self.omitted.insert(op);
        self.state = FilterState::Stale;
    }

    /// Merge `other` into this set. An operation omitted on either side
    /// stays omitted.
    pub fn union(&mut self, other: Self) {
        for op in other.omitted {
            self.add_omitted(op);
        }
        for op in other.kept {
            self.add(op);
        }
        self.state = FilterState::Stale;
    }

    /// Kept operations after the override closure.
    pub fn kept(&mut self) -> &BTreeSet<TypedOperation> {
        self.apply_closure();
        &self.kept
    }

    /// Omitted operations after the override closure.
    pub fn omitted(&mut self) -> &BTreeSet<TypedOperation> {
        self.apply_closure();
        &self.omitted
    }

    #[must_use]
    pub fn into_parts(mut self) -> (BTreeSet<TypedOperation>, BTreeSet<TypedOperation>) {
        self.apply_closure();
        (self.kept, self.omitted)
    }

    /// Sizes as `(kept, omitted)` after the closure.
    pub fn counts(&mut self) -> (usize, usize) {
        self.apply_closure();
        (self.kept.len(), self.omitted.len())
    }

    /// Every method transitively overridden by an omitted method call.
    #[must_use]
    pub fn overridden_by_omitted(&self) -> BTreeSet<MethodId> {
        let mut closure = BTreeSet::new();
        let mut pending: Vec<MethodId> = self
            .omitted
            .iter()
            .filter_map(TypedOperation::method_id)
            .collect();
        while let Some(method) = pending.pop() {
            for overridden in self.universe.overridden_methods(method) {
                if closure.insert(overridden) {
                    pending.push(overridden);
                }
            }
        }
        closure
    }

    fn apply_closure(&mut self) {
        if self.state == FilterState::Filtered {
            return;
        }
        let closure = self.overridden_by_omitted();
        let (migrate, keep): (BTreeSet<_>, BTreeSet<_>) =
            std::mem::take(&mut self.kept).into_iter().partition(|op| {
                op.method_id().is_some_and(|m| closure.contains(&m))
            });
        self.kept = keep;
        self.omitted.extend(migrate);
        self.state = FilterState::Filtered;
    }
}
