//! Search history: the stack of active nested searches.
//!
//! Each frame records the candidate being tried and the target it was
//! tried at. The history answers two questions: does trying this
//! candidate again diverge, and can an in-progress by-name construction
//! be reused instead of searching again (knot-tying). The root of every
//! history owns the implicit dictionary the knots refer into.

use crate::context::InferCtx;
use crate::proto::Proto;
use crate::tree::Tree;
use sable_solver::{SymbolFlags, SymbolId, TermRef, TypeId, TyperState};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

struct Frame {
    cand_ref: TermRef,
    /// The target of the nested search, by-name wrapper preserved.
    pt: TypeId,
    byname: bool,
    outer: Option<Rc<Frame>>,
}

/// A functional stack of `(candidate, target)` frames sharing one
/// dictionary root. Nesting is cheap; the root is shared by reference.
#[derive(Clone)]
pub struct SearchHistory {
    top: Option<Rc<Frame>>,
    pub root: Rc<RefCell<SearchRoot>>,
}

impl SearchHistory {
    /// A fresh history for a top-level inference.
    pub fn new_root() -> Self {
        SearchHistory {
            top: None,
            root: Rc::new(RefCell::new(SearchRoot::default())),
        }
    }

    pub fn is_root(&self) -> bool {
        self.top.is_none()
    }

    /// Push a frame for trying `cand_ref` at `pt`.
    pub fn nest(&self, cand_ref: TermRef, pt: TypeId, byname: bool) -> SearchHistory {
        SearchHistory {
            top: Some(Rc::new(Frame {
                cand_ref,
                pt,
                byname,
                outer: self.top.clone(),
            })),
            root: Rc::clone(&self.root),
        }
    }

    /// Whether any active frame searches a by-name target.
    pub fn byname_active(&self) -> bool {
        let mut cur = self.top.as_deref();
        while let Some(f) = cur {
            if f.byname {
                return true;
            }
            cur = f.outer.as_deref();
        }
        false
    }

    pub fn depth(&self) -> usize {
        let mut n = 0;
        let mut cur = self.top.as_deref();
        while let Some(f) = cur {
            n += 1;
            cur = f.outer.as_deref();
        }
        n
    }

    /// Divergence predicate: scanning frames newest-first, a frame with
    /// the same candidate diverges if its target is strictly smaller at
    /// an equal covering set, or if the wildcard approximations coincide.
    /// A by-name crossing between that frame and the top permits the
    /// recursion instead (the knot can be tied), provided the frame's
    /// approximation is a supertype of the current target's.
    pub fn check_divergence(
        &self,
        cand_ref: TermRef,
        pt: &Proto,
        ctx: &InferCtx<'_>,
        state: &TyperState,
    ) -> bool {
        if self.top.is_none() {
            return false;
        }
        let oracle = ctx.oracle;
        let pt_ty = pt.widened(oracle, state);
        let pt_size = oracle.type_size(pt_ty, state);
        let pt_cov = oracle.covering_set(pt_ty, state);
        let pt_approx = oracle.wildcard_approx(pt_ty, state);

        let mut crossed_byname = pt.is_byname(oracle, state);
        let mut cur = self.top.as_deref();
        while let Some(frame) = cur {
            // A frame's own by-name prototype counts as a crossing: the
            // knot refers through it.
            crossed_byname |= frame.byname;
            if frame.cand_ref == cand_ref {
                let f_ty = oracle.strip_byname(frame.pt, state);
                let f_approx = oracle.wildcard_approx(f_ty, state);
                if crossed_byname && oracle.subtype_frozen(pt_approx, f_approx, state) {
                    trace!(?cand_ref, "divergence check: knot permitted");
                    return false;
                }
                let f_size = oracle.type_size(f_ty, state);
                if f_size < pt_size && oracle.covering_set(f_ty, state) == pt_cov {
                    debug!(?cand_ref, f_size, pt_size, "diverging: growing target");
                    return true;
                }
                if oracle.same_type(f_approx, pt_approx, state) {
                    debug!(?cand_ref, "diverging: repeated target");
                    return true;
                }
            }
            cur = frame.outer.as_deref();
        }
        false
    }

    /// A stable reference to an in-progress or completed by-name
    /// construction for `pt`, if one can be reused.
    pub fn recursive_ref(
        &self,
        pt: &Proto,
        ctx: &InferCtx<'_>,
        state: &TyperState,
    ) -> Option<TermRef> {
        let oracle = ctx.oracle;
        // Dictionary keys are normalized so that targets reached through
        // bound inference variables coincide with their instantiations.
        let wide_pt = oracle.normalize(pt.widened(oracle, state), state);
        if let Some(r) = self.root.borrow().ref_byname(wide_pt) {
            return Some(r);
        }
        let byname_pt = pt.is_byname(oracle, state);
        if !byname_pt && !self.byname_active() {
            return None;
        }
        // Scan for an enclosing frame whose target subsumes this one,
        // with at least one by-name frame separating it from the top.
        let mut crossed_byname = byname_pt;
        let mut cur = self.top.as_deref();
        while let Some(frame) = cur {
            crossed_byname |= frame.byname;
            let f_ty = oracle.normalize(oracle.strip_byname(frame.pt, state), state);
            if crossed_byname && oracle.subtype_frozen(f_ty, wide_pt, state) {
                let r = self.root.borrow_mut().link_byname(ctx, f_ty);
                debug!(?r, "tying recursive knot");
                return Some(r);
            }
            cur = frame.outer.as_deref();
        }
        None
    }
}

/// A pending or completed dictionary entry: the type it provides, the
/// synthetic symbol knots refer to, and (once the defining search
/// succeeds) the constructing tree.
pub struct DictEntry {
    pub tpe: TypeId,
    pub sym: SymbolId,
    pub rhs: Option<Tree>,
}

/// The dictionary owned by the outermost search. Entries are created on
/// knot-tying (`link_byname`), filled when their defining search
/// succeeds (`define_byname`), and pruned or materialized at the
/// top-level emit.
#[derive(Default)]
pub struct SearchRoot {
    entries: Vec<DictEntry>,
}

impl SearchRoot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    /// The reference for an existing entry of type `tpe`.
    pub fn ref_byname(&self, tpe: TypeId) -> Option<TermRef> {
        self.entries
            .iter()
            .find(|e| e.tpe == tpe)
            .map(|e| TermRef::root(e.sym))
    }

    /// Get or create the entry for `tpe`, returning a stable reference
    /// to it.
    pub fn link_byname(&mut self, ctx: &InferCtx<'_>, tpe: TypeId) -> TermRef {
        if let Some(r) = self.ref_byname(tpe) {
            return r;
        }
        let sym = ctx.oracle.fresh_lazy_implicit_sym(tpe);
        ctx.oracle.symbols.add_flags(sym, SymbolFlags::IMPLICIT);
        self.entries.push(DictEntry {
            tpe,
            sym,
            rhs: None,
        });
        TermRef::root(sym)
    }

    /// Fill the pending entry for `tpe` with its defining tree. Returns
    /// the entry reference if one was linked; the defining search then
    /// answers with that reference instead of the tree. The `ref` half of
    /// an entry is write-once; only the rhs is late-bound.
    pub fn define_byname(&mut self, tpe: TypeId, rhs: Tree) -> Option<TermRef> {
        let entry = self.entries.iter_mut().find(|e| e.tpe == tpe)?;
        if entry.rhs.is_none() {
            entry.rhs = Some(rhs);
        }
        Some(TermRef::root(entry.sym))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextualImplicits, LexicalEnv};
    use crate::scope::Run;
    use sable_common::{InferOptions, Span};
    use sable_solver::{Oracle, SymbolFlags};

    fn world() -> (Oracle, Run) {
        (Oracle::new(), Run::new())
    }

    fn ctx<'a>(oracle: &'a Oracle, run: &'a Run) -> InferCtx<'a> {
        InferCtx::new(
            oracle,
            run,
            ContextualImplicits::outermost(Vec::new(), SymbolId::NONE),
            LexicalEnv::root(),
            InferOptions::default(),
        )
    }

    fn class(oracle: &Oracle, name: &str) -> SymbolId {
        oracle.symbols.alloc(
            oracle.intern_name(name),
            SymbolId::NONE,
            SymbolFlags::CLASS,
            TypeId::NONE,
        )
    }

    #[test]
    fn growing_target_with_same_covering_set_diverges() {
        let (oracle, run) = world();
        let ctx = ctx(&oracle, &run);
        let state = TyperState::new();
        let f = class(&oracle, "F");
        let g = class(&oracle, "G");
        let a = class(&oracle, "A");
        let cand = TermRef::root(oracle.symbols.alloc(
            oracle.intern_name("f"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::NONE,
        ));
        let fa = oracle.applied(oracle.named(f), vec![oracle.named(a)]);
        let fga = oracle.applied(
            oracle.named(f),
            vec![oracle.applied(oracle.named(g), vec![oracle.named(a)])],
        );
        let fgga = oracle.applied(
            oracle.named(f),
            vec![oracle.applied(
                oracle.named(g),
                vec![oracle.applied(oracle.named(g), vec![oracle.named(a)])],
            )],
        );
        let history = SearchHistory::new_root();
        // First frame: covering sets differ, no divergence yet.
        let h1 = history.nest(cand, fa, false);
        assert!(!h1.check_divergence(cand, &Proto::Value(fga), &ctx, &state));
        // Second frame: equal covering set, strictly growing size.
        let h2 = h1.nest(cand, fga, false);
        assert!(h2.check_divergence(cand, &Proto::Value(fgga), &ctx, &state));
    }

    #[test]
    fn repeated_target_diverges_without_byname() {
        let (oracle, run) = world();
        let ctx = ctx(&oracle, &run);
        let state = TyperState::new();
        let f = class(&oracle, "F");
        let a = class(&oracle, "A");
        let cand = TermRef::root(oracle.symbols.alloc(
            oracle.intern_name("f"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::NONE,
        ));
        let fa = oracle.applied(oracle.named(f), vec![oracle.named(a)]);
        let history = SearchHistory::new_root().nest(cand, fa, false);
        assert!(history.check_divergence(cand, &Proto::Value(fa), &ctx, &state));
    }

    #[test]
    fn byname_crossing_permits_the_knot() {
        let (oracle, run) = world();
        let ctx = ctx(&oracle, &run);
        let state = TyperState::new();
        let f = class(&oracle, "F");
        let a = class(&oracle, "A");
        let cand = TermRef::root(oracle.symbols.alloc(
            oracle.intern_name("f"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::NONE,
        ));
        let fa = oracle.applied(oracle.named(f), vec![oracle.named(a)]);
        let byname_fa = oracle.by_name(fa);
        // The frame itself is a by-name search; re-encountering the same
        // target below it ties the knot instead of diverging.
        let byname = SearchHistory::new_root().nest(cand, byname_fa, true);
        assert!(!byname.check_divergence(cand, &Proto::Value(fa), &ctx, &state));
        // Without the by-name crossing, the repeat diverges.
        let strict = SearchHistory::new_root().nest(cand, fa, false);
        assert!(strict.check_divergence(cand, &Proto::Value(fa), &ctx, &state));
    }

    #[test]
    fn divergence_is_independent_of_unrelated_frames() {
        let (oracle, run) = world();
        let ctx = ctx(&oracle, &run);
        let state = TyperState::new();
        let f = class(&oracle, "F");
        let a = class(&oracle, "A");
        let cand = TermRef::root(oracle.symbols.alloc(
            oracle.intern_name("f"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::NONE,
        ));
        let other = TermRef::root(oracle.symbols.alloc(
            oracle.intern_name("g"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::NONE,
        ));
        let fa = oracle.applied(oracle.named(f), vec![oracle.named(a)]);
        let with_noise = SearchHistory::new_root()
            .nest(other, TypeId::INT, false)
            .nest(cand, fa, false)
            .nest(other, TypeId::STRING, false);
        let without_noise = SearchHistory::new_root().nest(cand, fa, false);
        let pt = Proto::Value(fa);
        assert_eq!(
            with_noise.check_divergence(cand, &pt, &ctx, &state),
            without_noise.check_divergence(cand, &pt, &ctx, &state)
        );
    }

    #[test]
    fn recursive_ref_links_dictionary_entries() {
        let (oracle, run) = world();
        let ctx = ctx(&oracle, &run);
        let state = TyperState::new();
        let f = class(&oracle, "F");
        let a = class(&oracle, "A");
        let cand = TermRef::root(oracle.symbols.alloc(
            oracle.intern_name("f"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::NONE,
        ));
        let fa = oracle.applied(oracle.named(f), vec![oracle.named(a)]);
        let byname_fa = oracle.by_name(fa);
        let history = SearchHistory::new_root().nest(cand, byname_fa, true);
        // Same by-name target below an active by-name frame: reuse.
        let r = history
            .recursive_ref(&Proto::Value(byname_fa), &ctx, &state)
            .expect("knot expected");
        assert!(ctx.oracle.symbols.is(r.sym, SymbolFlags::LAZY));
        assert_eq!(history.root.borrow().entries().len(), 1);
        // A second request reuses the same entry.
        let r2 = history
            .recursive_ref(&Proto::Value(fa), &ctx, &state)
            .expect("existing entry expected");
        assert_eq!(r, r2);
        assert_eq!(history.root.borrow().entries().len(), 1);
    }

    #[test]
    fn no_recursive_ref_without_active_byname() {
        let (oracle, run) = world();
        let ctx = ctx(&oracle, &run);
        let state = TyperState::new();
        let f = class(&oracle, "F");
        let a = class(&oracle, "A");
        let cand = TermRef::root(oracle.symbols.alloc(
            oracle.intern_name("f"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::NONE,
        ));
        let fa = oracle.applied(oracle.named(f), vec![oracle.named(a)]);
        let history = SearchHistory::new_root().nest(cand, fa, false);
        assert!(history
            .recursive_ref(&Proto::Value(fa), &ctx, &state)
            .is_none());
    }

    #[test]
    fn define_byname_fills_pending_entries_once() {
        let (oracle, run) = world();
        let ctx = ctx(&oracle, &run);
        let root = Rc::new(RefCell::new(SearchRoot::default()));
        let r = root.borrow_mut().link_byname(&ctx, TypeId::INT);
        let rhs = Tree::ident(SymbolId(9), TypeId::INT, Span::dummy());
        let defined = root.borrow_mut().define_byname(TypeId::INT, rhs.clone());
        assert_eq!(defined, Some(r));
        // A second definition does not overwrite the first.
        let other = Tree::ident(SymbolId(10), TypeId::INT, Span::dummy());
        root.borrow_mut().define_byname(TypeId::INT, other);
        assert_eq!(root.borrow().entries()[0].rhs, Some(rhs));
        // Unlinked types are not defined.
        let none = root
            .borrow_mut()
            .define_byname(TypeId::STRING, Tree::ident(SymbolId(1), TypeId::STRING, Span::dummy()));
        assert!(none.is_none());
    }
}
