//! Widening, dealiasing, normalization, and wildcard approximation.
//!
//! These are the pure type transformations the implicit engine leans on:
//! compatibility tests compare normalized types, divergence checking
//! compares wildcard approximations, and the scope collector works on
//! dealiased class references.

use crate::oracle::Oracle;
use crate::state::TyperState;
use crate::types::{SymbolFlags, TypeId, TypeKey};
use rustc_hash::{FxHashMap, FxHashSet};

impl Oracle {
    /// Widen singleton and by-name types to their underlying types.
    pub fn widen(&self, t: TypeId, state: &TyperState) -> TypeId {
        let mut cur = self.resolve(t, state);
        let mut depth = 0;
        loop {
            depth += 1;
            if depth > 64 {
                return TypeId::ERROR;
            }
            match self.key(cur) {
                TypeKey::TermRef { sym, .. } => cur = self.resolve(self.symbols.info(sym), state),
                TypeKey::ByName(inner) => cur = self.resolve(inner, state),
                _ => return cur,
            }
        }
    }

    /// Widen a singleton type one step; leaves every other type alone.
    pub fn widen_singleton(&self, t: TypeId, state: &TyperState) -> TypeId {
        let t = self.resolve(t, state);
        match self.key(t) {
            TypeKey::TermRef { sym, .. } => self.resolve(self.symbols.info(sym), state),
            _ => t,
        }
    }

    /// Strip a by-name wrapper, if any.
    pub fn strip_byname(&self, t: TypeId, state: &TyperState) -> TypeId {
        let t = self.resolve(t, state);
        match self.key(t) {
            TypeKey::ByName(inner) => self.resolve(inner, state),
            _ => t,
        }
    }

    pub fn is_byname(&self, t: TypeId, state: &TyperState) -> bool {
        matches!(self.key(self.resolve(t, state)), TypeKey::ByName(_))
    }

    /// Follow alias chains and beta-reduce type-lambda applications.
    /// A cyclic alias chain resolves to `TypeId::ERROR`.
    pub fn dealias(&self, t: TypeId, state: &TyperState) -> TypeId {
        let mut seen = FxHashSet::default();
        let mut cur = self.resolve(t, state);
        loop {
            if !seen.insert(cur) {
                return TypeId::ERROR;
            }
            match self.key(cur) {
                TypeKey::Named { sym, .. }
                    if self.symbols.is(sym, SymbolFlags::ALIAS)
                        && !self.symbols.is(sym, SymbolFlags::OPAQUE) =>
                {
                    cur = self.resolve(self.symbols.info(sym), state);
                }
                TypeKey::Applied { tycon, args } => {
                    let head = self.resolve(tycon, state);
                    match self.key(head) {
                        TypeKey::Named { sym, .. }
                            if self.symbols.is(sym, SymbolFlags::ALIAS)
                                && !self.symbols.is(sym, SymbolFlags::OPAQUE) =>
                        {
                            let params = self.symbols.type_params(sym);
                            let args = self.types.type_list_of(args);
                            let map: FxHashMap<_, _> =
                                params.iter().copied().zip(args.iter().copied()).collect();
                            cur = self.subst(self.resolve(self.symbols.info(sym), state), &map);
                        }
                        TypeKey::Lambda { params, result } => {
                            let syms = self.types.sym_list_of(params);
                            let args = self.types.type_list_of(args);
                            let map: FxHashMap<_, _> =
                                syms.iter().copied().zip(args.iter().copied()).collect();
                            cur = self.subst(result, &map);
                        }
                        _ => return cur,
                    }
                }
                _ => return cur,
            }
        }
    }

    /// Deep normalization: resolve bindings and dealias at every level.
    /// Compatibility tests compare normalized forms.
    pub fn normalize(&self, t: TypeId, state: &TyperState) -> TypeId {
        self.normalize_rec(t, state, 0)
    }

    fn normalize_rec(&self, t: TypeId, state: &TyperState, depth: u32) -> TypeId {
        if depth > 64 {
            return TypeId::ERROR;
        }
        let t = self.dealias(self.resolve(t, state), state);
        match self.key(t) {
            TypeKey::Applied { tycon, args } => {
                let tycon2 = self.normalize_rec(tycon, state, depth + 1);
                let args2: Vec<TypeId> = self
                    .types
                    .type_list_of(args)
                    .iter()
                    .map(|&a| self.normalize_rec(a, state, depth + 1))
                    .collect();
                self.applied(tycon2, args2)
            }
            TypeKey::Func { params, result } => {
                let ps: Vec<TypeId> = self
                    .types
                    .type_list_of(params)
                    .iter()
                    .map(|&p| self.normalize_rec(p, state, depth + 1))
                    .collect();
                self.func(ps, self.normalize_rec(result, state, depth + 1))
            }
            TypeKey::Method {
                params,
                result,
                implicit,
            } => {
                let ps: Vec<TypeId> = self
                    .types
                    .type_list_of(params)
                    .iter()
                    .map(|&p| self.normalize_rec(p, state, depth + 1))
                    .collect();
                self.method(ps, self.normalize_rec(result, state, depth + 1), implicit)
            }
            TypeKey::ByName(inner) => self.by_name(self.normalize_rec(inner, state, depth + 1)),
            TypeKey::And { left, right } => self.and_type(
                self.normalize_rec(left, state, depth + 1),
                self.normalize_rec(right, state, depth + 1),
            ),
            _ => t,
        }
    }

    /// Replace inference variables and type parameters by their bound
    /// approximations. The result is compared with the possible-member
    /// semantics of `Bounds` in the comparer.
    pub fn wildcard_approx(&self, t: TypeId, state: &TyperState) -> TypeId {
        self.wildcard_approx_rec(t, state, 0)
    }

    fn wildcard_approx_rec(&self, t: TypeId, state: &TyperState, depth: u32) -> TypeId {
        if depth > 64 {
            return TypeId::ERROR;
        }
        let t = self.resolve(t, state);
        match self.key(t) {
            TypeKey::Var(_) => self.wildcard(),
            TypeKey::Named { sym, .. } if self.symbols.is(sym, SymbolFlags::TYPE_PARAM) => {
                let info = self.symbols.info(sym);
                match self.key(info) {
                    TypeKey::Bounds { .. } => info,
                    _ => self.wildcard(),
                }
            }
            TypeKey::Applied { tycon, args } => {
                let tycon2 = self.wildcard_approx_rec(tycon, state, depth + 1);
                let args2: Vec<TypeId> = self
                    .types
                    .type_list_of(args)
                    .iter()
                    .map(|&a| self.wildcard_approx_rec(a, state, depth + 1))
                    .collect();
                self.applied(tycon2, args2)
            }
            TypeKey::Func { params, result } => {
                let ps: Vec<TypeId> = self
                    .types
                    .type_list_of(params)
                    .iter()
                    .map(|&p| self.wildcard_approx_rec(p, state, depth + 1))
                    .collect();
                self.func(ps, self.wildcard_approx_rec(result, state, depth + 1))
            }
            TypeKey::Method {
                params,
                result,
                implicit,
            } => {
                let ps: Vec<TypeId> = self
                    .types
                    .type_list_of(params)
                    .iter()
                    .map(|&p| self.wildcard_approx_rec(p, state, depth + 1))
                    .collect();
                self.method(
                    ps,
                    self.wildcard_approx_rec(result, state, depth + 1),
                    implicit,
                )
            }
            TypeKey::ByName(inner) => self.by_name(self.wildcard_approx_rec(inner, state, depth + 1)),
            TypeKey::And { left, right } => self.and_type(
                self.wildcard_approx_rec(left, state, depth + 1),
                self.wildcard_approx_rec(right, state, depth + 1),
            ),
            _ => t,
        }
    }

    /// Whether `t` is stable enough to key a cache: no unbound inference
    /// variables anywhere and no error part.
    pub fn is_cacheable(&self, t: TypeId, state: &TyperState) -> bool {
        let t = self.resolve(t, state);
        match self.key(t) {
            TypeKey::Var(_) => false,
            TypeKey::Intrinsic(_) => !t.is_error(),
            _ => self.parts(t).iter().all(|&p| self.is_cacheable(p, state)),
        }
    }

    /// Type erasure: drop type arguments, widen singletons, flatten
    /// conjunctions to their first operand.
    pub fn erasure(&self, t: TypeId, state: &TyperState) -> TypeId {
        let t = self.dealias(self.widen(t, state), state);
        match self.key(t) {
            TypeKey::Applied { tycon, .. } => self.erasure(tycon, state),
            TypeKey::And { left, .. } => self.erasure(left, state),
            TypeKey::Bounds { hi, .. } => self.erasure(hi, state),
            TypeKey::Func { .. } | TypeKey::Method { .. } | TypeKey::Poly { .. } => TypeId::ANY_REF,
            TypeKey::Var(_) => TypeId::ANY_REF,
            _ => t,
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

    #[test]
    fn widen_follows_term_refs_and_byname() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let x = oracle.symbols.alloc(
            oracle.intern_name("x"),
            SymbolId::NONE,
            SymbolFlags::empty(),
            TypeId::INT,
        );
        let xt = oracle.term_ref_type(crate::types::TermRef::root(x));
        assert_eq!(oracle.widen(xt, &state), TypeId::INT);
        assert_eq!(oracle.widen(oracle.by_name(xt), &state), TypeId::INT);
        assert_eq!(oracle.widen_singleton(xt, &state), TypeId::INT);
        assert_eq!(oracle.widen_singleton(TypeId::INT, &state), TypeId::INT);
    }

    #[test]
    fn dealias_expands_parameterized_aliases() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let list = class(&oracle, "List");
        let t = oracle.symbols.alloc(
            oracle.intern_name("T"),
            SymbolId::NONE,
            SymbolFlags::TYPE_PARAM,
            TypeId::NONE,
        );
        // type Coll[T] = List[T]
        let coll = oracle.symbols.alloc(
            oracle.intern_name("Coll"),
            SymbolId::NONE,
            SymbolFlags::ALIAS,
            oracle.applied(oracle.named(list), vec![oracle.named(t)]),
        );
        oracle.symbols.add_type_param(coll, t);
        let coll_int = oracle.applied(oracle.named(coll), vec![TypeId::INT]);
        assert_eq!(
            oracle.dealias(coll_int, &state),
            oracle.applied(oracle.named(list), vec![TypeId::INT])
        );
    }

    #[test]
    fn cyclic_alias_resolves_to_error() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let a = oracle.symbols.alloc(
            oracle.intern_name("A"),
            SymbolId::NONE,
            SymbolFlags::ALIAS,
            TypeId::NONE,
        );
        let b = oracle.symbols.alloc(
            oracle.intern_name("B"),
            SymbolId::NONE,
            SymbolFlags::ALIAS,
            oracle.named(a),
        );
        oracle.symbols.set_info(a, oracle.named(b));
        assert!(oracle.dealias(oracle.named(a), &state).is_error());
    }

    #[test]
    fn wildcard_approx_replaces_vars() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let list = class(&oracle, "List");
        let v = oracle.fresh_var();
        let list_v = oracle.applied(oracle.named(list), vec![v]);
        let approx = oracle.wildcard_approx(list_v, &state);
        assert_eq!(
            approx,
            oracle.applied(oracle.named(list), vec![oracle.wildcard()])
        );
        assert!(!oracle.is_cacheable(list_v, &state));
        assert!(oracle.is_cacheable(approx, &state));
    }
}
