//! Derived implicit scopes.
//!
//! The implicit scope of a type is the set of companion references
//! reachable from its structural parts: the companion of every class
//! symbol in the type, the companions of prefixes, and recursively the
//! scopes of parents. Results are memoized per compilation run, except
//! for traversals that hit a back-edge (marked incomplete) and for types
//! that cannot key a cache.

use crate::candidates::{filter_matching, Candidate};
use crate::context::InferCtx;
use crate::proto::Proto;
use crate::refs::{ImplicitRef, TermRefSet};
use rustc_hash::FxHashSet;
use sable_solver::{Oracle, SymbolFlags, TypeId, TypeKey, TyperState};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// The precomputed companion set of one type, with its lazily filtered
/// eligible list.
pub struct OfTypeImplicits {
    pub tp: TypeId,
    pub companion_refs: TermRefSet,
    refs: Vec<ImplicitRef>,
    eligible: RefCell<Option<Rc<Vec<Candidate>>>>,
}

/// Nesting level assigned to derived-scope candidates.
pub const DERIVED_LEVEL: u32 = 0;

impl OfTypeImplicits {
    fn new(oracle: &Oracle, tp: TypeId, companion_refs: TermRefSet) -> Self {
        let refs = companion_refs
            .iter()
            .flat_map(|&module_ref| oracle.implicit_members(module_ref))
            .map(ImplicitRef::plain)
            .collect();
        OfTypeImplicits {
            tp,
            companion_refs,
            refs,
            eligible: RefCell::new(None),
        }
    }

    /// The implicit members the companions contribute.
    pub fn refs(&self) -> &[ImplicitRef] {
        &self.refs
    }

    /// Candidates eligible at `pt`, computed lazily and kept for the
    /// scope's lifetime.
    pub fn eligible(&self, ctx: &InferCtx<'_>, pt: &Proto, state: &TyperState) -> Rc<Vec<Candidate>> {
        if let Some(cached) = self.eligible.borrow().as_ref() {
            return Rc::clone(cached);
        }
        let computed = Rc::new(filter_matching(
            ctx.oracle,
            &self.refs,
            pt,
            DERIVED_LEVEL,
            state,
            &ctx.options,
        ));
        *self.eligible.borrow_mut() = Some(Rc::clone(&computed));
        computed
    }
}

/// One compilation run. Exclusively owns the implicit-scope cache;
/// collaborators invalidate by resetting the run.
pub struct Run {
    scope_cache: RefCell<rustc_hash::FxHashMap<TypeId, Rc<OfTypeImplicits>>>,
}

impl Run {
    pub fn new() -> Self {
        Run {
            scope_cache: RefCell::new(rustc_hash::FxHashMap::default()),
        }
    }

    pub fn reset(&self) {
        self.scope_cache.borrow_mut().clear();
    }

    /// The implicit scope of `t`.
    pub fn implicit_scope(
        &self,
        oracle: &Oracle,
        t: TypeId,
        state: &TyperState,
    ) -> Rc<OfTypeImplicits> {
        let mut collector = ScopeCollector {
            oracle,
            run: self,
            state,
            active: FxHashSet::default(),
        };
        collector.of_type(t, true).0
    }

    pub fn cached_scopes(&self) -> usize {
        self.scope_cache.borrow().len()
    }
}

impl Default for Run {
    fn default() -> Self {
        Self::new()
    }
}

struct ScopeCollector<'a> {
    oracle: &'a Oracle,
    run: &'a Run,
    state: &'a TyperState,
    /// Types on the active traversal path; re-entering one is a
    /// back-edge and marks the enclosing traversals incomplete.
    active: FxHashSet<TypeId>,
}

impl<'a> ScopeCollector<'a> {
    /// Compute (or fetch) the scope of `t`; the flag reports whether the
    /// traversal completed without crossing a back-edge.
    fn of_type(&mut self, t: TypeId, is_root: bool) -> (Rc<OfTypeImplicits>, bool) {
        if let Some(hit) = self.run.scope_cache.borrow().get(&t) {
            return (Rc::clone(hit), true);
        }
        let lifted = self.lift_to_classes(t, 0);
        let mut companions = TermRefSet::new();
        let complete = self.collect_companions(lifted, &mut companions, 0);
        let scope = Rc::new(OfTypeImplicits::new(self.oracle, t, companions));
        debug!(
            tp = ?t,
            companions = scope.companion_refs.len(),
            complete,
            "implicit scope"
        );
        let cacheable = self.oracle.is_cacheable(t, self.state);
        if cacheable && (complete || is_root) {
            self.run
                .scope_cache
                .borrow_mut()
                .insert(t, Rc::clone(&scope));
        }
        (scope, complete)
    }

    /// Replace every non-class type reference by a conjunction of the
    /// class types with the same implicit scope. This keeps the cache
    /// keyed on a small vocabulary of class conjunctions.
    fn lift_to_classes(&mut self, t: TypeId, depth: u32) -> TypeId {
        if depth > 64 {
            return TypeId::ANY;
        }
        let oracle = self.oracle;
        let t = oracle.dealias(oracle.resolve(t, self.state), self.state);
        match oracle.key(t) {
            TypeKey::Named { sym, .. } => {
                if oracle.symbols.is(sym, SymbolFlags::CLASS)
                    || oracle.symbols.is(sym, SymbolFlags::OPAQUE)
                {
                    t
                } else {
                    // Abstract type or parameter: lift through the upper
                    // bound.
                    match oracle.key(oracle.symbols.info(sym)) {
                        TypeKey::Bounds { hi, .. } => self.lift_to_classes(hi, depth + 1),
                        _ => TypeId::ANY,
                    }
                }
            }
            TypeKey::Applied { tycon, args } => {
                let mut acc = self.lift_to_classes(tycon, depth + 1);
                for &arg in oracle.types.type_list_of(args).iter() {
                    let lifted = match oracle.key(arg) {
                        // Bounds flatten to lower & upper.
                        TypeKey::Bounds { lo, hi } => oracle.and_type(
                            self.lift_to_classes(lo, depth + 1),
                            self.lift_to_classes(hi, depth + 1),
                        ),
                        _ => self.lift_to_classes(arg, depth + 1),
                    };
                    acc = oracle.and_type(acc, lifted);
                }
                acc
            }
            TypeKey::Lambda { result, .. } | TypeKey::Poly { result, .. } => {
                self.lift_to_classes(result, depth + 1)
            }
            TypeKey::ByName(inner) => self.lift_to_classes(inner, depth + 1),
            TypeKey::TermRef { .. } => {
                self.lift_to_classes(oracle.widen(t, self.state), depth + 1)
            }
            TypeKey::And { left, right } => oracle.and_type(
                self.lift_to_classes(left, depth + 1),
                self.lift_to_classes(right, depth + 1),
            ),
            TypeKey::Bounds { lo, hi } => oracle.and_type(
                self.lift_to_classes(lo, depth + 1),
                self.lift_to_classes(hi, depth + 1),
            ),
            TypeKey::Var(_) => TypeId::ANY,
            TypeKey::Intrinsic(_) | TypeKey::Func { .. } | TypeKey::Method { .. } => t,
        }
    }

    /// Union the companions reachable from `t` into `acc`. Returns false
    /// if the traversal crossed a back-edge (the result must not be
    /// memoized for non-root types).
    fn collect_companions(&mut self, t: TypeId, acc: &mut TermRefSet, depth: u32) -> bool {
        if depth > 64 {
            return false;
        }
        let oracle = self.oracle;
        let t = oracle.dealias(oracle.resolve(t, self.state), self.state);
        if !self.active.insert(t) {
            return false;
        }
        let mut complete = true;
        match oracle.key(t) {
            TypeKey::Named { prefix, sym } => {
                if prefix.exists() {
                    complete &= self.collect_companions(prefix, acc, depth + 1);
                }
                if oracle.symbols.is(sym, SymbolFlags::OPAQUE) {
                    // Opaque aliases contribute their own companion only.
                    if let Some(c) = oracle.companion_ref(sym) {
                        acc.insert(c, oracle, self.state);
                    }
                } else if oracle.symbols.is(sym, SymbolFlags::CLASS) {
                    if let Some(c) = oracle.companion_ref(sym) {
                        acc.insert(c, oracle, self.state);
                    }
                    for parent in oracle.symbols.parents(sym) {
                        let (parent_scope, parent_complete) = self.of_type(parent, false);
                        acc.union(&parent_scope.companion_refs, oracle, self.state);
                        complete &= parent_complete;
                    }
                } else {
                    complete &= self.collect_named_parts(t, acc, depth);
                }
            }
            _ => {
                complete &= self.collect_named_parts(t, acc, depth);
            }
        }
        self.active.remove(&t);
        complete
    }

    fn collect_named_parts(&mut self, t: TypeId, acc: &mut TermRefSet, depth: u32) -> bool {
        let mut complete = true;
        for part in self.oracle.parts(t) {
            complete &= self.collect_companions(part, acc, depth + 1);
        }
        complete
    }
}
