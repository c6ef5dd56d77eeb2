//! The type oracle: the query surface the implicit engine consumes.
//!
//! This facade isolates search logic from concrete storage. Everything the
//! engine needs - subtype tests, widening, dealiasing, substitution,
//! wildcard approximation, companion enumeration, member lookup,
//! accessibility, the structural candidate comparator - goes through
//! `Oracle`, so the search code never reaches into the interner or the
//! symbol table directly.

use crate::intern::TypeInterner;
use crate::state::TyperState;
use crate::subtype::TypeComparer;
use crate::symbols::SymbolTable;
use crate::types::{
    IntrinsicKind, SymbolFlags, SymbolId, TermRef, TypeId, TypeKey, TypeVarId, Variance,
};
use rustc_hash::FxHashMap;
use sable_common::{Atom, Interner};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};

/// Well-known symbols the candidate classifier and the dictionary
/// builder test against.
#[derive(Clone, Copy, Debug)]
pub struct Builtins {
    /// The `Conversion[-From, +To]` base class.
    pub conversion: SymbolId,
    /// The subtype-witness class (`<:<`).
    pub subtype_witness: SymbolId,
    /// The identity-conforming witness class (`=:=`). Derives from the
    /// subtype witness but never classifies as a conversion.
    pub identity_witness: SymbolId,
    /// The negation class `Not[_]`.
    pub not_class: SymbolId,
    /// The coherent equality-witness class.
    pub can_equal: SymbolId,
    /// Serializability marker mixed into synthesized dictionary classes.
    pub serializable: SymbolId,
}

/// The type oracle. One per compilation run.
pub struct Oracle {
    pub types: TypeInterner,
    pub symbols: SymbolTable,
    names: RefCell<Interner>,
    next_var: Cell<u32>,
    next_synthetic: Cell<u32>,
    pub builtins: Builtins,
}

impl Oracle {
    pub fn new() -> Self {
        let types = TypeInterner::new();
        let symbols = SymbolTable::new();
        let mut names = Interner::new();
        names.intern_common();

        let class = SymbolFlags::CLASS;
        let conversion = symbols.alloc(
            names.intern("Conversion"),
            SymbolId::NONE,
            class | SymbolFlags::CONVERSION_CLASS,
            TypeId::NONE,
        );
        let subtype_witness = symbols.alloc(
            names.intern("<:<"),
            SymbolId::NONE,
            class | SymbolFlags::SUBTYPE_WITNESS,
            TypeId::NONE,
        );
        let identity_witness = symbols.alloc(
            names.intern("=:="),
            SymbolId::NONE,
            class | SymbolFlags::SUBTYPE_WITNESS | SymbolFlags::IDENTITY_WITNESS,
            TypeId::NONE,
        );
        let not_class = symbols.alloc(
            names.intern("Not"),
            SymbolId::NONE,
            class | SymbolFlags::NOT_WITNESS,
            TypeId::NONE,
        );
        let can_equal = symbols.alloc(
            names.intern("CanEqual"),
            SymbolId::NONE,
            class | SymbolFlags::COHERENT,
            TypeId::NONE,
        );
        let serializable = symbols.alloc(
            names.intern("Serializable"),
            SymbolId::NONE,
            class,
            TypeId::NONE,
        );
        // =:= is a refined subtype witness.
        let sub_ty = types.intern(TypeKey::Named {
            prefix: TypeId::NONE,
            sym: subtype_witness,
        });
        symbols.add_parent(identity_witness, sub_ty);

        Oracle {
            types,
            symbols,
            names: RefCell::new(names),
            next_var: Cell::new(0),
            next_synthetic: Cell::new(0),
            builtins: Builtins {
                conversion,
                subtype_witness,
                identity_witness,
                not_class,
                can_equal,
                serializable,
            },
        }
    }

    // =========================================================================
    // Names and symbols
    // =========================================================================

    pub fn intern_name(&self, name: &str) -> Atom {
        self.names.borrow_mut().intern(name)
    }

    pub fn name_str(&self, atom: Atom) -> String {
        self.names.borrow().resolve(atom).to_string()
    }

    pub fn is_lazy_implicit_name(&self, atom: Atom) -> bool {
        sable_common::interner::is_lazy_implicit_name(self.names.borrow().resolve(atom))
    }

    /// Allocate a synthetic symbol with a numbered name.
    pub fn fresh_sym(
        &self,
        base_name: &str,
        owner: SymbolId,
        flags: SymbolFlags,
        info: TypeId,
    ) -> SymbolId {
        let n = self.next_synthetic.get();
        self.next_synthetic.set(n + 1);
        let name = self.intern_name(&format!("{base_name}${n}"));
        self.symbols
            .alloc(name, owner, flags | SymbolFlags::SYNTHETIC, info)
    }

    /// Allocate a dictionary-entry symbol (`$lazy_implicit$<n>`).
    pub fn fresh_lazy_implicit_sym(&self, info: TypeId) -> SymbolId {
        let n = self.next_synthetic.get();
        self.next_synthetic.set(n + 1);
        let name = self.names.borrow_mut().fresh_lazy_implicit(n);
        self.symbols.alloc(
            name,
            SymbolId::NONE,
            SymbolFlags::SYNTHETIC | SymbolFlags::LAZY,
            info,
        )
    }

    // =========================================================================
    // Type constructors
    // =========================================================================

    pub fn named(&self, sym: SymbolId) -> TypeId {
        self.types.intern(TypeKey::Named {
            prefix: TypeId::NONE,
            sym,
        })
    }

    pub fn named_with_prefix(&self, prefix: TypeId, sym: SymbolId) -> TypeId {
        self.types.intern(TypeKey::Named { prefix, sym })
    }

    pub fn term_ref_type(&self, r: TermRef) -> TypeId {
        self.types.intern(TypeKey::TermRef {
            prefix: r.prefix,
            sym: r.sym,
        })
    }

    pub fn applied(&self, tycon: TypeId, args: Vec<TypeId>) -> TypeId {
        let args = self.types.type_list(args);
        self.types.intern(TypeKey::Applied { tycon, args })
    }

    pub fn func(&self, params: Vec<TypeId>, result: TypeId) -> TypeId {
        let params = self.types.type_list(params);
        self.types.intern(TypeKey::Func { params, result })
    }

    pub fn method(&self, params: Vec<TypeId>, result: TypeId, implicit: bool) -> TypeId {
        let params = self.types.type_list(params);
        self.types.intern(TypeKey::Method {
            params,
            result,
            implicit,
        })
    }

    pub fn poly(&self, params: Vec<SymbolId>, result: TypeId) -> TypeId {
        let params = self.types.sym_list(params);
        self.types.intern(TypeKey::Poly { params, result })
    }

    pub fn by_name(&self, underlying: TypeId) -> TypeId {
        self.types.intern(TypeKey::ByName(underlying))
    }

    pub fn bounds(&self, lo: TypeId, hi: TypeId) -> TypeId {
        self.types.intern(TypeKey::Bounds { lo, hi })
    }

    /// The unconstrained wildcard `>: Nothing <: Any`.
    pub fn wildcard(&self) -> TypeId {
        self.bounds(TypeId::NOTHING, TypeId::ANY)
    }

    pub fn and_type(&self, left: TypeId, right: TypeId) -> TypeId {
        if left == right {
            return left;
        }
        self.types.intern(TypeKey::And { left, right })
    }

    pub fn type_lambda(&self, params: Vec<SymbolId>, result: TypeId) -> TypeId {
        let params = self.types.sym_list(params);
        self.types.intern(TypeKey::Lambda { params, result })
    }

    /// Allocate a fresh inference variable.
    pub fn fresh_var(&self) -> TypeId {
        let v = TypeVarId(self.next_var.get());
        self.next_var.set(v.0 + 1);
        self.types.intern(TypeKey::Var(v))
    }

    // =========================================================================
    // Structure queries
    // =========================================================================

    pub fn key(&self, t: TypeId) -> TypeKey {
        self.types.lookup(t)
    }

    /// Shallow resolution: follow inference-variable bindings.
    pub fn resolve(&self, t: TypeId, state: &TyperState) -> TypeId {
        let mut cur = t;
        loop {
            match self.key(cur) {
                TypeKey::Var(v) => match state.binding(v) {
                    Some(b) if b != cur => cur = b,
                    _ => return cur,
                },
                _ => return cur,
            }
        }
    }

    /// Immediate structural constituents of a type.
    pub fn parts(&self, t: TypeId) -> SmallVec<[TypeId; 4]> {
        let mut out = SmallVec::new();
        match self.key(t) {
            TypeKey::Named { prefix, .. } | TypeKey::TermRef { prefix, .. } => {
                if prefix.exists() {
                    out.push(prefix);
                }
            }
            TypeKey::Applied { tycon, args } => {
                out.push(tycon);
                out.extend(self.types.type_list_of(args).iter().copied());
            }
            TypeKey::Method { params, result, .. } | TypeKey::Func { params, result } => {
                out.extend(self.types.type_list_of(params).iter().copied());
                out.push(result);
            }
            TypeKey::Poly { result, .. } | TypeKey::Lambda { result, .. } => out.push(result),
            TypeKey::ByName(inner) => out.push(inner),
            TypeKey::Bounds { lo, hi } => {
                out.push(lo);
                out.push(hi);
            }
            TypeKey::And { left, right } => {
                out.push(left);
                out.push(right);
            }
            TypeKey::Intrinsic(_) | TypeKey::Var(_) => {}
        }
        out
    }

    /// The class symbols a type is made of, dealiased, conjunctions and
    /// applications included.
    pub fn class_symbols(&self, t: TypeId, state: &TyperState) -> SmallVec<[SymbolId; 4]> {
        let mut out = SmallVec::new();
        self.collect_class_symbols(t, state, &mut out, 0);
        out
    }

    fn collect_class_symbols(
        &self,
        t: TypeId,
        state: &TyperState,
        out: &mut SmallVec<[SymbolId; 4]>,
        depth: u32,
    ) {
        if depth > 64 {
            return;
        }
        let t = self.dealias(self.resolve(t, state), state);
        match self.key(t) {
            TypeKey::Named { sym, .. } if self.symbols.is(sym, SymbolFlags::CLASS) => {
                if !out.contains(&sym) {
                    out.push(sym);
                }
            }
            TypeKey::Applied { tycon, .. } => {
                self.collect_class_symbols(tycon, state, out, depth + 1)
            }
            TypeKey::And { left, right } => {
                self.collect_class_symbols(left, state, out, depth + 1);
                self.collect_class_symbols(right, state, out, depth + 1);
            }
            TypeKey::TermRef { .. } => {
                self.collect_class_symbols(self.widen(t, state), state, out, depth + 1)
            }
            _ => {}
        }
    }

    // =========================================================================
    // Substitution and instantiation
    // =========================================================================

    /// Substitute root references to the mapped symbols.
    pub fn subst(&self, t: TypeId, map: &FxHashMap<SymbolId, TypeId>) -> TypeId {
        if map.is_empty() {
            return t;
        }
        match self.key(t) {
            TypeKey::Named { prefix, sym } => {
                if prefix.is_none() {
                    if let Some(&to) = map.get(&sym) {
                        return to;
                    }
                    t
                } else {
                    let p = self.subst(prefix, map);
                    if p == prefix {
                        t
                    } else {
                        self.named_with_prefix(p, sym)
                    }
                }
            }
            TypeKey::TermRef { prefix, sym } => {
                if prefix.is_none() {
                    return t;
                }
                let p = self.subst(prefix, map);
                if p == prefix {
                    t
                } else {
                    self.term_ref_type(TermRef::new(p, sym))
                }
            }
            TypeKey::Applied { tycon, args } => {
                let tycon2 = self.subst(tycon, map);
                let args = self.types.type_list_of(args);
                let args2: Vec<TypeId> = args.iter().map(|&a| self.subst(a, map)).collect();
                self.applied(tycon2, args2)
            }
            TypeKey::Method {
                params,
                result,
                implicit,
            } => {
                let ps = self.types.type_list_of(params);
                let ps2: Vec<TypeId> = ps.iter().map(|&p| self.subst(p, map)).collect();
                self.method(ps2, self.subst(result, map), implicit)
            }
            TypeKey::Func { params, result } => {
                let ps = self.types.type_list_of(params);
                let ps2: Vec<TypeId> = ps.iter().map(|&p| self.subst(p, map)).collect();
                self.func(ps2, self.subst(result, map))
            }
            TypeKey::Poly { params, result } => {
                let syms = self.types.sym_list_of(params);
                self.poly(syms.to_vec(), self.subst(result, map))
            }
            TypeKey::Lambda { params, result } => {
                let syms = self.types.sym_list_of(params);
                self.type_lambda(syms.to_vec(), self.subst(result, map))
            }
            TypeKey::ByName(inner) => self.by_name(self.subst(inner, map)),
            TypeKey::Bounds { lo, hi } => self.bounds(self.subst(lo, map), self.subst(hi, map)),
            TypeKey::And { left, right } => {
                self.and_type(self.subst(left, map), self.subst(right, map))
            }
            TypeKey::Intrinsic(_) | TypeKey::Var(_) => t,
        }
    }

    /// Instantiate a polymorphic type with fresh inference variables.
    /// Returns the variables and the substituted result.
    pub fn instantiate_poly(&self, params: &[SymbolId], result: TypeId) -> (Vec<TypeId>, TypeId) {
        let vars: Vec<TypeId> = params.iter().map(|_| self.fresh_var()).collect();
        let map: FxHashMap<SymbolId, TypeId> =
            params.iter().copied().zip(vars.iter().copied()).collect();
        (vars, self.subst(result, &map))
    }

    // =========================================================================
    // Base types and members
    // =========================================================================

    /// The instance of `class` that `t` derives from, if any.
    pub fn base_type(&self, t: TypeId, class: SymbolId, state: &TyperState) -> Option<TypeId> {
        self.base_type_rec(t, class, state, 0)
    }

    fn base_type_rec(
        &self,
        t: TypeId,
        class: SymbolId,
        state: &TyperState,
        depth: u32,
    ) -> Option<TypeId> {
        if depth > 64 {
            return None;
        }
        let t = self.dealias(self.resolve(t, state), state);
        match self.key(t) {
            TypeKey::Named { sym, .. } if self.symbols.is(sym, SymbolFlags::CLASS) => {
                if sym == class {
                    return Some(t);
                }
                for p in self.symbols.parents(sym) {
                    if let Some(bt) = self.base_type_rec(p, class, state, depth + 1) {
                        return Some(bt);
                    }
                }
                None
            }
            TypeKey::Applied { tycon, args } => {
                let head = self.dealias(self.resolve(tycon, state), state);
                if let TypeKey::Named { sym, .. } = self.key(head) {
                    if !self.symbols.is(sym, SymbolFlags::CLASS) {
                        return None;
                    }
                    if sym == class {
                        return Some(t);
                    }
                    let params = self.symbols.type_params(sym);
                    let args = self.types.type_list_of(args);
                    let map: FxHashMap<SymbolId, TypeId> =
                        params.iter().copied().zip(args.iter().copied()).collect();
                    for p in self.symbols.parents(sym) {
                        let inst = self.subst(p, &map);
                        if let Some(bt) = self.base_type_rec(inst, class, state, depth + 1) {
                            return Some(bt);
                        }
                    }
                }
                None
            }
            TypeKey::And { left, right } => self
                .base_type_rec(left, class, state, depth + 1)
                .or_else(|| self.base_type_rec(right, class, state, depth + 1)),
            TypeKey::TermRef { .. } | TypeKey::ByName(_) => {
                self.base_type_rec(self.widen(t, state), class, state, depth + 1)
            }
            _ => None,
        }
    }

    /// Whether `t` derives from `class`.
    pub fn derives_from(&self, t: TypeId, class: SymbolId, state: &TyperState) -> bool {
        self.base_type(t, class, state).is_some()
    }

    /// Whether class `c1` derives from class `c2` (reflexive).
    pub fn class_derives(&self, c1: SymbolId, c2: SymbolId, state: &TyperState) -> bool {
        if c1 == c2 {
            return true;
        }
        self.derives_from(self.named(c1), c2, state)
    }

    /// Look up a declared member of `t` by name, innermost class first.
    /// Returns the member symbol and its type as seen from `t`.
    pub fn member(
        &self,
        t: TypeId,
        name: Atom,
        private_ok: bool,
        state: &TyperState,
    ) -> Option<(SymbolId, TypeId)> {
        let wt = self.dealias(self.widen(self.resolve(t, state), state), state);
        let mut frames: Vec<(SymbolId, FxHashMap<SymbolId, TypeId>)> = Vec::new();
        self.class_frames(wt, &FxHashMap::default(), state, &mut frames, 0);
        for (class, map) in frames {
            for decl in self.symbols.decls(class) {
                if self.symbols.name(decl) != name {
                    continue;
                }
                if self.symbols.is(decl, SymbolFlags::PRIVATE) && !private_ok {
                    continue;
                }
                let info = self.subst(self.symbols.info(decl), &map);
                return Some((decl, info));
            }
        }
        None
    }

    fn class_frames(
        &self,
        t: TypeId,
        outer_map: &FxHashMap<SymbolId, TypeId>,
        state: &TyperState,
        out: &mut Vec<(SymbolId, FxHashMap<SymbolId, TypeId>)>,
        depth: u32,
    ) {
        if depth > 64 {
            return;
        }
        let t = self.dealias(self.resolve(t, state), state);
        match self.key(t) {
            TypeKey::Named { sym, .. } if self.symbols.is(sym, SymbolFlags::CLASS) => {
                out.push((sym, outer_map.clone()));
                for p in self.symbols.parents(sym) {
                    let inst = self.subst(p, outer_map);
                    self.class_frames(inst, outer_map, state, out, depth + 1);
                }
            }
            TypeKey::Applied { tycon, args } => {
                let head = self.dealias(self.resolve(tycon, state), state);
                if let TypeKey::Named { sym, .. } = self.key(head) {
                    if !self.symbols.is(sym, SymbolFlags::CLASS) {
                        return;
                    }
                    let params = self.symbols.type_params(sym);
                    let args = self.types.type_list_of(args);
                    let map: FxHashMap<SymbolId, TypeId> =
                        params.iter().copied().zip(args.iter().copied()).collect();
                    out.push((sym, map.clone()));
                    for p in self.symbols.parents(sym) {
                        let inst = self.subst(p, &map);
                        self.class_frames(inst, &map, state, out, depth + 1);
                    }
                }
            }
            TypeKey::And { left, right } => {
                self.class_frames(left, outer_map, state, out, depth + 1);
                self.class_frames(right, outer_map, state, out, depth + 1);
            }
            _ => {}
        }
    }

    // =========================================================================
    // Companions
    // =========================================================================

    /// The companion module of a type symbol, as a term reference.
    pub fn companion_ref(&self, sym: SymbolId) -> Option<TermRef> {
        let companion = self.symbols.companion(sym);
        if !companion.exists() || !self.symbols.is(companion, SymbolFlags::MODULE) {
            return None;
        }
        Some(TermRef::new(self.module_prefix(companion), companion))
    }

    fn module_prefix(&self, module: SymbolId) -> TypeId {
        let owner = self.symbols.owner(module);
        if owner.exists() && self.symbols.is(owner, SymbolFlags::MODULE) {
            self.term_ref_type(TermRef::new(self.module_prefix(owner), owner))
        } else {
            TypeId::NONE
        }
    }

    /// The implicit members a companion module contributes to a derived
    /// scope.
    pub fn implicit_members(&self, module_ref: TermRef) -> Vec<TermRef> {
        let prefix = self.term_ref_type(module_ref);
        self.symbols
            .decls(module_ref.sym)
            .into_iter()
            .filter(|&d| self.symbols.is(d, SymbolFlags::IMPLICIT))
            .map(|d| TermRef::new(prefix, d))
            .collect()
    }

    // =========================================================================
    // Accessibility and comparison
    // =========================================================================

    /// Whether `sym` is accessible when selected from `prefix`.
    pub fn accessible(&self, sym: SymbolId, _prefix: TypeId) -> bool {
        !self.symbols.is(sym, SymbolFlags::PRIVATE)
    }

    /// Deterministic structural comparator for candidate disambiguation.
    ///
    /// Returns +1 if `ref1` is preferred, -1 if `ref2` is preferred, 0 if
    /// neither. Keys, in order: nesting level (higher wins), owner
    /// relation (subclass owner wins), first-parameter-list arity (lower
    /// wins). Incomparable owners compare as equal, so arity decides.
    pub fn compare(
        &self,
        ref1: TermRef,
        ref2: TermRef,
        level1: u32,
        level2: u32,
        state: &TyperState,
    ) -> i32 {
        if level1 != level2 {
            return if level1 > level2 { 1 } else { -1 };
        }
        let o1 = self.symbols.owner_class(ref1.sym);
        let o2 = self.symbols.owner_class(ref2.sym);
        if o1 != o2 && o1.exists() && o2.exists() {
            let d12 = self.class_derives(o1, o2, state);
            let d21 = self.class_derives(o2, o1, state);
            if d12 && !d21 {
                return 1;
            }
            if d21 && !d12 {
                return -1;
            }
        }
        let a1 = self.first_param_arity(self.symbols.info(ref1.sym));
        let a2 = self.first_param_arity(self.symbols.info(ref2.sym));
        (a2 as i64 - a1 as i64).signum() as i32
    }

    /// Arity of the first (term) parameter list, polymorphic layers
    /// peeled.
    pub fn first_param_arity(&self, info: TypeId) -> usize {
        let mut cur = info;
        loop {
            match self.key(cur) {
                TypeKey::Poly { result, .. } => cur = result,
                TypeKey::Method { params, .. } | TypeKey::Func { params, .. } => {
                    return self.types.type_list_of(params).len()
                }
                _ => return 0,
            }
        }
    }

    // =========================================================================
    // Subtyping entry points
    // =========================================================================

    /// Subtype test that may bind inference variables in `state`.
    pub fn subtype(&self, a: TypeId, b: TypeId, state: &mut TyperState) -> bool {
        TypeComparer::new(self, state, true).is_subtype(a, b)
    }

    /// Subtype test that never mutates the constraint: unbound variables
    /// are compared as unconstrained wildcards.
    pub fn subtype_frozen(&self, a: TypeId, b: TypeId, state: &TyperState) -> bool {
        let mut scratch = state.fork();
        TypeComparer::new(self, &mut scratch, false).is_subtype(a, b)
    }

    /// Type equivalence under the frozen comparator.
    pub fn same_type(&self, a: TypeId, b: TypeId, state: &TyperState) -> bool {
        if a == b {
            return true;
        }
        self.subtype_frozen(a, b, state) && self.subtype_frozen(b, a, state)
    }
}

impl Default for Oracle {
    fn default() -> Self {
        Self::new()
    }
}

/// Variance of the i-th parameter of an applied type's head class,
/// defaulting to invariant past the declared parameters.
pub(crate) fn param_variance(oracle: &Oracle, class: SymbolId, i: usize) -> Variance {
    let params = oracle.symbols.type_params(class);
    params
        .get(i)
        .map(|&p| oracle.symbols.variance(p))
        .unwrap_or(Variance::Invariant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_identity_witness_derives_from_subtype_witness() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let id_ty = oracle.named(oracle.builtins.identity_witness);
        assert!(oracle.derives_from(id_ty, oracle.builtins.subtype_witness, &state));
    }

    #[test]
    fn fresh_vars_are_distinct() {
        let oracle = Oracle::new();
        let v1 = oracle.fresh_var();
        let v2 = oracle.fresh_var();
        assert_ne!(v1, v2);
    }

    #[test]
    fn subst_replaces_root_named_refs() {
        let oracle = Oracle::new();
        let param = oracle.symbols.alloc(
            oracle.intern_name("T"),
            SymbolId::NONE,
            SymbolFlags::TYPE_PARAM,
            TypeId::NONE,
        );
        let list = oracle.symbols.alloc(
            oracle.intern_name("List"),
            SymbolId::NONE,
            SymbolFlags::CLASS,
            TypeId::NONE,
        );
        let t_ref = oracle.named(param);
        let list_t = oracle.applied(oracle.named(list), vec![t_ref]);
        let mut map = FxHashMap::default();
        map.insert(param, TypeId::INT);
        let list_int = oracle.subst(list_t, &map);
        assert_eq!(
            list_int,
            oracle.applied(oracle.named(list), vec![TypeId::INT])
        );
    }

    #[test]
    fn compare_prefers_higher_level_then_lower_arity() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let a = oracle.symbols.alloc(
            oracle.intern_name("a"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            oracle.method(vec![TypeId::INT], TypeId::INT, false),
        );
        let b = oracle.symbols.alloc(
            oracle.intern_name("b"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::INT,
        );
        let ra = TermRef::root(a);
        let rb = TermRef::root(b);
        assert_eq!(oracle.compare(ra, rb, 2, 1, &state), 1);
        assert_eq!(oracle.compare(ra, rb, 1, 2, &state), -1);
        // Equal level: b has arity 0, a has arity 1, so b preferred.
        assert_eq!(oracle.compare(ra, rb, 1, 1, &state), -1);
        assert_eq!(oracle.compare(rb, ra, 1, 1, &state), 1);
    }
}
