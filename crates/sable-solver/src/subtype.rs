//! Subtype checking and unification.
//!
//! The comparer answers `a <: b` over interned handles, binding inference
//! variables along the way when constructed bindable. It keeps an
//! in-progress pair set for cycle detection (recursive types are handled
//! coinductively) and a depth limit as a stack-overflow backstop.
//!
//! A frozen comparer (`bindable = false`) never touches the constraint:
//! unbound variables compare as unconstrained wildcards. Eligibility
//! filtering runs frozen so that classification leaves no typevar effects
//! behind; only real trials bind.

use crate::oracle::{param_variance, Oracle};
use crate::state::TyperState;
use crate::types::{IntrinsicKind, SymbolFlags, TypeId, TypeKey, TypeVarId, Variance};
use rustc_hash::FxHashSet;
use tracing::trace;

const MAX_DEPTH: u32 = 128;

/// Subtype checking context.
/// Maintains the in-progress set for cycle detection.
pub struct TypeComparer<'a> {
    oracle: &'a Oracle,
    state: &'a mut TyperState,
    bindable: bool,
    in_progress: FxHashSet<(TypeId, TypeId)>,
    depth: u32,
    /// Whether the recursion depth limit was exceeded.
    pub depth_exceeded: bool,
}

impl<'a> TypeComparer<'a> {
    pub fn new(oracle: &'a Oracle, state: &'a mut TyperState, bindable: bool) -> Self {
        TypeComparer {
            oracle,
            state,
            bindable,
            in_progress: FxHashSet::default(),
            depth: 0,
            depth_exceeded: false,
        }
    }

    /// Check whether `a` is a subtype of `b`.
    pub fn is_subtype(&mut self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        if self.depth >= MAX_DEPTH {
            self.depth_exceeded = true;
            return false;
        }
        let a = self.oracle.dealias(self.oracle.resolve(a, self.state), self.state);
        let b = self.oracle.dealias(self.oracle.resolve(b, self.state), self.state);
        if a == b {
            return true;
        }
        // Error is contagious: tolerate it to avoid cascades.
        if a.is_error() || b.is_error() {
            return true;
        }
        if !self.in_progress.insert((a, b)) {
            // Coinductive: an in-progress pair is provisionally true.
            return true;
        }
        self.depth += 1;
        let result = self.compare_keys(a, b);
        self.depth -= 1;
        self.in_progress.remove(&(a, b));
        trace!(?a, ?b, result, "subtype");
        result
    }

    fn compare_keys(&mut self, a: TypeId, b: TypeId) -> bool {
        let ka = self.oracle.key(a);
        let kb = self.oracle.key(b);

        // Inference variables.
        if let TypeKey::Var(v) = ka {
            return self.relate_var(v, a, b, true);
        }
        if let TypeKey::Var(v) = kb {
            return self.relate_var(v, b, a, false);
        }

        // By-name wrappers are transparent to subtyping.
        if let TypeKey::ByName(inner) = ka {
            return self.is_subtype(inner, b);
        }
        if let TypeKey::ByName(inner) = kb {
            return self.is_subtype(a, inner);
        }

        // Top and bottom.
        if b == TypeId::ANY {
            return true;
        }
        if a == TypeId::NOTHING {
            return true;
        }
        if b == TypeId::ANY_REF {
            return self.is_reference(a);
        }
        if a == TypeId::NULL {
            return self.is_reference(b);
        }

        // Wildcard ranges: some member of the range must witness the
        // relation, so the lower bound goes left and the upper bound
        // right.
        if let TypeKey::Bounds { lo, .. } = ka {
            return self.is_subtype(lo, b);
        }
        if let TypeKey::Bounds { hi, .. } = kb {
            return self.is_subtype(a, hi);
        }

        // Conjunctions.
        if let TypeKey::And { left, right } = kb {
            return self.is_subtype(a, left) && self.is_subtype(a, right);
        }
        if let TypeKey::And { left, right } = ka {
            return self.is_subtype(left, b) || self.is_subtype(right, b);
        }

        // Singletons.
        if let TypeKey::TermRef { prefix, sym } = ka {
            if let TypeKey::TermRef {
                prefix: bprefix,
                sym: bsym,
            } = kb
            {
                if sym == bsym && self.equiv_prefix(prefix, bprefix) {
                    return true;
                }
            }
            let widened = self.oracle.widen(a, self.state);
            return widened != a && self.is_subtype(widened, b);
        }
        if matches!(kb, TypeKey::TermRef { .. }) {
            return false;
        }

        // Polymorphic types: approximate the left-hand parameters.
        if let TypeKey::Poly { params, result } = ka {
            let syms = self.oracle.types.sym_list_of(params);
            let map: rustc_hash::FxHashMap<_, _> = syms
                .iter()
                .map(|&s| (s, self.oracle.wildcard()))
                .collect();
            let approx = self.oracle.subst(result, &map);
            return self.is_subtype(approx, b);
        }
        if matches!(kb, TypeKey::Poly { .. }) {
            return false;
        }

        // Function and method types.
        match (ka, kb) {
            (
                TypeKey::Func {
                    params: pa,
                    result: ra,
                },
                TypeKey::Func {
                    params: pb,
                    result: rb,
                },
            ) => self.compare_signatures(pa, ra, pb, rb),
            (
                TypeKey::Method {
                    params: pa,
                    result: ra,
                    implicit: ia,
                },
                TypeKey::Method {
                    params: pb,
                    result: rb,
                    implicit: ib,
                },
            ) => ia == ib && self.compare_signatures(pa, ra, pb, rb),
            // Eta-expansion: a non-implicit method conforms to the
            // function type with the same signature.
            (
                TypeKey::Method {
                    params: pa,
                    result: ra,
                    implicit: false,
                },
                TypeKey::Func {
                    params: pb,
                    result: rb,
                },
            ) => self.compare_signatures(pa, ra, pb, rb),
            _ => self.compare_named(a, ka, b, kb),
        }
    }

    fn compare_signatures(
        &mut self,
        pa: crate::types::TypeListId,
        ra: TypeId,
        pb: crate::types::TypeListId,
        rb: TypeId,
    ) -> bool {
        let pa = self.oracle.types.type_list_of(pa);
        let pb = self.oracle.types.type_list_of(pb);
        if pa.len() != pb.len() {
            return false;
        }
        for (&x, &y) in pa.iter().zip(pb.iter()) {
            // Parameters are contravariant.
            if !self.is_subtype(y, x) {
                return false;
            }
        }
        self.is_subtype(ra, rb)
    }

    fn compare_named(&mut self, a: TypeId, ka: TypeKey, b: TypeId, kb: TypeKey) -> bool {
        // Rigid type parameters relate through their bounds.
        if let TypeKey::Named { sym, .. } = ka {
            if self.oracle.symbols.is(sym, SymbolFlags::TYPE_PARAM) {
                let info = self.oracle.symbols.info(sym);
                if let TypeKey::Bounds { hi, .. } = self.oracle.key(info) {
                    return self.is_subtype(hi, b);
                }
                return false;
            }
        }
        if let TypeKey::Named { sym, .. } = kb {
            if self.oracle.symbols.is(sym, SymbolFlags::TYPE_PARAM) {
                let info = self.oracle.symbols.info(sym);
                if let TypeKey::Bounds { lo, .. } = self.oracle.key(info) {
                    return lo.exists() && self.is_subtype(a, lo);
                }
                return false;
            }
        }

        // Class references: find the instance of b's head class that a
        // derives from, then compare arguments variance-wise.
        let class_b = match kb {
            TypeKey::Named { sym, .. } => sym,
            TypeKey::Applied { tycon, .. } => {
                let head = self.oracle.dealias(self.oracle.resolve(tycon, self.state), self.state);
                match self.oracle.key(head) {
                    TypeKey::Named { sym, .. } => sym,
                    _ => return false,
                }
            }
            _ => return false,
        };
        if !self.oracle.symbols.is(class_b, SymbolFlags::CLASS) {
            // Abstract or opaque head: only identical references conform,
            // and identity was already checked.
            return false;
        }
        let Some(binst) = self.oracle.base_type(a, class_b, self.state) else {
            return false;
        };
        match (self.oracle.key(binst), kb) {
            (_, TypeKey::Named { .. }) => true,
            (TypeKey::Applied { args: aa, .. }, TypeKey::Applied { args: ba, .. }) => {
                let aa = self.oracle.types.type_list_of(aa);
                let ba = self.oracle.types.type_list_of(ba);
                if aa.len() != ba.len() {
                    return false;
                }
                for (i, (&x, &y)) in aa.iter().zip(ba.iter()).enumerate() {
                    let ok = match param_variance(self.oracle, class_b, i) {
                        Variance::Covariant => self.is_subtype(x, y),
                        Variance::Contravariant => self.is_subtype(y, x),
                        Variance::Invariant => self.is_subtype(x, y) && self.is_subtype(y, x),
                    };
                    if !ok {
                        return false;
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn relate_var(&mut self, v: TypeVarId, var_ty: TypeId, other: TypeId, var_on_left: bool) -> bool {
        debug_assert!(self.state.binding(v).is_none());
        if !self.bindable {
            // Frozen: an unbound variable ranges over everything, so the
            // relation is possible.
            return true;
        }
        if self.occurs(v, other) {
            return false;
        }
        let bound = self.oracle.strip_byname(other, self.state);
        self.state.bind(v, bound);
        trace!(?v, ?bound, var_on_left, "bind");
        let _ = var_ty;
        true
    }

    fn occurs(&self, v: TypeVarId, t: TypeId) -> bool {
        let t = self.oracle.resolve(t, self.state);
        if let TypeKey::Var(w) = self.oracle.key(t) {
            return v == w;
        }
        self.oracle.parts(t).iter().any(|&p| self.occurs(v, p))
    }

    fn equiv_prefix(&mut self, p1: TypeId, p2: TypeId) -> bool {
        if p1 == p2 {
            return true;
        }
        if p1.is_none() || p2.is_none() {
            return false;
        }
        self.is_subtype(p1, p2) && self.is_subtype(p2, p1)
    }

    fn is_reference(&mut self, t: TypeId) -> bool {
        let t = self.oracle.dealias(self.oracle.resolve(t, self.state), self.state);
        match self.oracle.key(t) {
            TypeKey::Intrinsic(kind) => {
                kind.is_reference() || matches!(kind, IntrinsicKind::Null | IntrinsicKind::Nothing)
            }
            TypeKey::Named { sym, .. } => self.oracle.symbols.is(sym, SymbolFlags::CLASS),
            TypeKey::Applied { tycon, .. } => self.is_reference(tycon),
            TypeKey::And { left, right } => self.is_reference(left) || self.is_reference(right),
            TypeKey::TermRef { .. } => {
                let w = self.oracle.widen(t, self.state);
                w != t && self.is_reference(w)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolId;

    fn class(oracle: &Oracle, name: &str) -> SymbolId {
        oracle.symbols.alloc(
            oracle.intern_name(name),
            SymbolId::NONE,
            SymbolFlags::CLASS,
            TypeId::NONE,
        )
    }

    fn sub(oracle: &Oracle, a: TypeId, b: TypeId) -> bool {
        let mut state = TyperState::new();
        TypeComparer::new(oracle, &mut state, true).is_subtype(a, b)
    }

    #[test]
    fn top_and_bottom() {
        let oracle = Oracle::new();
        let c = class(&oracle, "C");
        let ct = oracle.named(c);
        assert!(sub(&oracle, TypeId::NOTHING, ct));
        assert!(sub(&oracle, ct, TypeId::ANY));
        assert!(sub(&oracle, ct, TypeId::ANY_REF));
        assert!(sub(&oracle, TypeId::NULL, ct));
        assert!(!sub(&oracle, TypeId::ANY, ct));
        assert!(!sub(&oracle, TypeId::INT, TypeId::ANY_REF));
    }

    #[test]
    fn class_parents_conform() {
        let oracle = Oracle::new();
        let base = class(&oracle, "Base");
        let derived = class(&oracle, "Derived");
        oracle.symbols.add_parent(derived, oracle.named(base));
        assert!(sub(&oracle, oracle.named(derived), oracle.named(base)));
        assert!(!sub(&oracle, oracle.named(base), oracle.named(derived)));
    }

    #[test]
    fn applied_invariant_by_default() {
        let oracle = Oracle::new();
        let box_ = class(&oracle, "Box");
        let p = oracle.symbols.alloc(
            oracle.intern_name("T"),
            box_,
            SymbolFlags::TYPE_PARAM,
            TypeId::NONE,
        );
        oracle.symbols.add_type_param(box_, p);
        let base = class(&oracle, "Base");
        let derived = class(&oracle, "Derived");
        oracle.symbols.add_parent(derived, oracle.named(base));
        let box_derived = oracle.applied(oracle.named(box_), vec![oracle.named(derived)]);
        let box_base = oracle.applied(oracle.named(box_), vec![oracle.named(base)]);
        assert!(!sub(&oracle, box_derived, box_base));
        assert!(sub(&oracle, box_derived, box_derived));
    }

    #[test]
    fn applied_covariant_with_variance() {
        let oracle = Oracle::new();
        let coll = class(&oracle, "Coll");
        let p = oracle.symbols.alloc(
            oracle.intern_name("T"),
            coll,
            SymbolFlags::TYPE_PARAM,
            TypeId::NONE,
        );
        oracle.symbols.set_variance(p, Variance::Covariant);
        oracle.symbols.add_type_param(coll, p);
        let base = class(&oracle, "Base");
        let derived = class(&oracle, "Derived");
        oracle.symbols.add_parent(derived, oracle.named(base));
        let coll_derived = oracle.applied(oracle.named(coll), vec![oracle.named(derived)]);
        let coll_base = oracle.applied(oracle.named(coll), vec![oracle.named(base)]);
        assert!(sub(&oracle, coll_derived, coll_base));
        assert!(!sub(&oracle, coll_base, coll_derived));
    }

    #[test]
    fn functions_are_contravariant_in_params() {
        let oracle = Oracle::new();
        let base = class(&oracle, "Base");
        let derived = class(&oracle, "Derived");
        oracle.symbols.add_parent(derived, oracle.named(base));
        let f_base = oracle.func(vec![oracle.named(base)], TypeId::INT);
        let f_derived = oracle.func(vec![oracle.named(derived)], TypeId::INT);
        assert!(sub(&oracle, f_base, f_derived));
        assert!(!sub(&oracle, f_derived, f_base));
    }

    #[test]
    fn method_eta_expands_to_function() {
        let oracle = Oracle::new();
        let m = oracle.method(vec![TypeId::INT], TypeId::STRING, false);
        let f = oracle.func(vec![TypeId::INT], TypeId::STRING);
        assert!(sub(&oracle, m, f));
        // Implicit methods do not eta-expand.
        let mi = oracle.method(vec![TypeId::INT], TypeId::STRING, true);
        assert!(!sub(&oracle, mi, f));
    }

    #[test]
    fn unification_binds_variables() {
        let oracle = Oracle::new();
        let list = class(&oracle, "List");
        let v = oracle.fresh_var();
        let list_v = oracle.applied(oracle.named(list), vec![v]);
        let list_int = oracle.applied(oracle.named(list), vec![TypeId::INT]);
        let mut state = TyperState::new();
        assert!(TypeComparer::new(&oracle, &mut state, true).is_subtype(list_v, list_int));
        assert_eq!(oracle.resolve(v, &state), TypeId::INT);
    }

    #[test]
    fn frozen_comparer_never_binds() {
        let oracle = Oracle::new();
        let v = oracle.fresh_var();
        let state = TyperState::new();
        assert!(oracle.subtype_frozen(v, TypeId::INT, &state));
        assert!(oracle.subtype_frozen(TypeId::INT, v, &state));
        assert_eq!(state.bindings_len(), 0);
    }

    #[test]
    fn occurs_check_rejects_recursive_binding() {
        let oracle = Oracle::new();
        let list = class(&oracle, "List");
        let v = oracle.fresh_var();
        let list_v = oracle.applied(oracle.named(list), vec![v]);
        let mut state = TyperState::new();
        assert!(!TypeComparer::new(&oracle, &mut state, true).is_subtype(v, list_v));
    }

    #[test]
    fn wildcard_ranges_use_possible_member_semantics() {
        let oracle = Oracle::new();
        let w = oracle.wildcard();
        let c = class(&oracle, "C");
        assert!(sub(&oracle, w, oracle.named(c)));
        assert!(sub(&oracle, oracle.named(c), w));
    }
}
