//! Structural measures used by divergence checking.
//!
//! Divergence is detected by comparing the *type size* and the *covering
//! set* of the current target against earlier frames of the same
//! candidate: a strictly growing goal over an unchanged symbol vocabulary
//! cannot terminate.

use crate::oracle::Oracle;
use crate::state::TyperState;
use crate::types::{TypeId, TypeKey};
use rustc_hash::FxHashSet;

impl Oracle {
    /// Recursive count of type constructors and arguments.
    pub fn type_size(&self, t: TypeId, state: &TyperState) -> u32 {
        self.type_size_rec(t, state, 0)
    }

    fn type_size_rec(&self, t: TypeId, state: &TyperState, depth: u32) -> u32 {
        if depth > 64 {
            return u32::MAX / 2;
        }
        let t = self.dealias(self.resolve(t, state), state);
        match self.key(t) {
            TypeKey::Intrinsic(_) | TypeKey::Named { .. } | TypeKey::TermRef { .. } => 1,
            TypeKey::Var(_) => 1,
            TypeKey::Applied { tycon, args } => {
                let mut n = self.type_size_rec(tycon, state, depth + 1);
                for &a in self.types.type_list_of(args).iter() {
                    n += self.type_size_rec(a, state, depth + 1);
                }
                n
            }
            TypeKey::Func { params, result } | TypeKey::Method { params, result, .. } => {
                let mut n = 1 + self.type_size_rec(result, state, depth + 1);
                for &p in self.types.type_list_of(params).iter() {
                    n += self.type_size_rec(p, state, depth + 1);
                }
                n
            }
            TypeKey::Poly { result, .. } | TypeKey::Lambda { result, .. } => {
                1 + self.type_size_rec(result, state, depth + 1)
            }
            TypeKey::ByName(inner) => self.type_size_rec(inner, state, depth + 1),
            TypeKey::Bounds { lo, hi } => {
                1 + self.type_size_rec(lo, state, depth + 1)
                    + self.type_size_rec(hi, state, depth + 1)
            }
            TypeKey::And { left, right } => {
                1 + self.type_size_rec(left, state, depth + 1)
                    + self.type_size_rec(right, state, depth + 1)
            }
        }
    }

    /// The set of symbols of all named types appearing in `t`.
    pub fn covering_set(&self, t: TypeId, state: &TyperState) -> FxHashSet<crate::types::SymbolId> {
        let mut out = FxHashSet::default();
        self.covering_rec(t, state, &mut out, 0);
        out
    }

    fn covering_rec(
        &self,
        t: TypeId,
        state: &TyperState,
        out: &mut FxHashSet<crate::types::SymbolId>,
        depth: u32,
    ) {
        if depth > 64 {
            return;
        }
        let t = self.dealias(self.resolve(t, state), state);
        match self.key(t) {
            TypeKey::Named { prefix, sym } | TypeKey::TermRef { prefix, sym } => {
                out.insert(sym);
                if prefix.exists() {
                    self.covering_rec(prefix, state, out, depth + 1);
                }
            }
            _ => {
                for p in self.parts(t) {
                    self.covering_rec(p, state, out, depth + 1);
                }
            }
        }
    }
}
