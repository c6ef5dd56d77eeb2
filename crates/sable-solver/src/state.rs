//! Typer state: inference-variable bindings with fork/commit.
//!
//! Every implicit trial runs against a fork of the current state, so
//! constraint effects of failed candidates never leak. Only the chosen
//! success commits, by merging its fork back into the parent.

use crate::types::{TypeId, TypeVarId};
use rustc_hash::FxHashMap;

/// Bindings for inference variables.
///
/// A state is a plain value: `fork` clones it, `commit_from` replaces the
/// contents wholesale. Variable identifiers are allocated by the oracle and
/// are globally unique within a run, so merging states never renumbers.
#[derive(Clone, Debug, Default)]
pub struct TyperState {
    bindings: FxHashMap<TypeVarId, TypeId>,
}

impl TyperState {
    pub fn new() -> Self {
        TyperState {
            bindings: FxHashMap::default(),
        }
    }

    /// A fresh nested state for an exploratory trial.
    pub fn fork(&self) -> TyperState {
        self.clone()
    }

    /// Commit a successful trial's state into this one.
    pub fn commit_from(&mut self, child: TyperState) {
        self.bindings = child.bindings;
    }

    /// Bind a variable. The caller guarantees the variable is unbound;
    /// rebinding is a logic error.
    pub fn bind(&mut self, var: TypeVarId, to: TypeId) {
        debug_assert!(!self.bindings.contains_key(&var), "rebinding {var:?}");
        self.bindings.insert(var, to);
    }

    pub fn binding(&self, var: TypeVarId) -> Option<TypeId> {
        self.bindings.get(&var).copied()
    }

    pub fn is_bound(&self, var: TypeVarId) -> bool {
        self.bindings.contains_key(&var)
    }

    pub fn bindings_len(&self) -> usize {
        self.bindings.len()
    }

    /// Structural equality of binding sets; used by tests to assert that
    /// failed searches leave no trace.
    pub fn same_bindings(&self, other: &TyperState) -> bool {
        self.bindings == other.bindings
    }
}
