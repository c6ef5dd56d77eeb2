//! The best-implicit search.
//!
//! `infer_implicit` serves a request by consulting the search history for
//! recursive references, gathering eligible candidates from the
//! contextual chain and (on failure) the derived scope, trying each under
//! a forked typer state, and disambiguating successes pairwise. Only the
//! chosen success carries a committable state; failed trials leave no
//! trace.

use crate::candidates::Candidate;
use crate::context::InferCtx;
use crate::dictionary::emit_dictionary;
use crate::history::SearchHistory;
use crate::proto::Proto;
use crate::refs::TermRefSet;
use crate::result::{
    CyclicError, SearchFailure, SearchFailureKind, SearchResult, SearchSuccess,
};
use crate::tree::{ref_tree, Tree};
use sable_common::Span;
use sable_solver::{SymbolId, TermRef, TypeId, TypeKey, TyperState};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Outcome of typing one candidate against the target.
type Typed = Result<Tree, SearchFailure>;

pub struct Searcher<'a> {
    pub ctx: &'a InferCtx<'a>,
}

impl<'a> Searcher<'a> {
    pub fn new(ctx: &'a InferCtx<'a>) -> Self {
        Searcher { ctx }
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Find a unique implicit value (or conversion of `argument`)
    /// conforming to `pt`. On top-level success the accumulated
    /// dictionary is emitted around the result.
    pub fn infer_implicit(
        &self,
        pt: &Proto,
        argument: Option<&Tree>,
        span: Span,
        state: &mut TyperState,
    ) -> Result<SearchResult, CyclicError> {
        let history = SearchHistory::new_root();
        let result = self.best_implicit(pt, argument, span, &history, state)?;
        Ok(match result {
            SearchResult::Success(s) => {
                let root = history.root.borrow();
                SearchResult::Success(emit_dictionary(self.ctx, &root, s, span))
            }
            failure => failure,
        })
    }

    /// Find a view from `from` to what `to` expects. Trivial endpoints
    /// never admit views.
    pub fn infer_view(
        &self,
        from: &Tree,
        to: Proto,
        span: Span,
        state: &mut TyperState,
    ) -> Result<SearchResult, CyclicError> {
        let oracle = self.ctx.oracle;
        let from_ty = oracle.resolve(from.tpe, state);
        // Selection targets are judged by their member, not by the
        // member's type; the triviality gate applies to value targets.
        let trivial_target = match &to {
            Proto::Selection { .. } => false,
            _ => {
                let to_ty = oracle.strip_byname(to.as_type(oracle), state);
                to_ty == TypeId::ANY || to_ty == TypeId::ANY_REF || to_ty == TypeId::UNIT
            }
        };
        let trivial_source = from_ty == TypeId::NOTHING || from_ty == TypeId::NULL;
        let value_source = !matches!(
            oracle.key(from_ty),
            TypeKey::Method { .. } | TypeKey::Poly { .. }
        );
        if trivial_target || trivial_source || from.is_super() || !value_source {
            return Ok(SearchResult::Failure(SearchFailure::no_matching()));
        }
        // Selection targets lose private-member privilege when reached
        // through a view.
        let res = match to {
            Proto::Selection { name, mbr, .. } => Proto::Selection {
                name,
                mbr,
                private_ok: false,
            },
            other => other,
        };
        let pt = Proto::view(oracle.widen(from_ty, state), res);
        self.infer_implicit(&pt, Some(from), span, state)
    }

    /// Whether `from` converts to `to`: a value subtype, or a successful
    /// exploratory view search over a placeholder tree.
    pub fn view_exists(&self, from: TypeId, to: TypeId, state: &TyperState) -> bool {
        let oracle = self.ctx.oracle;
        if oracle.subtype_frozen(from, to, state) {
            return true;
        }
        let probe_ctx = self.ctx.exploring();
        let probe = Searcher::new(&probe_ctx);
        let placeholder = Tree::ident(SymbolId::NONE, from, Span::dummy());
        let mut scratch = state.fork();
        matches!(
            probe.infer_view(&placeholder, Proto::Value(to), Span::dummy(), &mut scratch),
            Ok(SearchResult::Success(_))
        )
    }

    /// All implicit references that individually satisfy `pt`, from both
    /// the contextual chain and the derived scope. For tooling.
    pub fn all_implicits(&self, pt: &Proto, span: Span, state: &TyperState) -> Vec<TermRef> {
        let oracle = self.ctx.oracle;
        let probe_ctx = self.ctx.exploring();
        let probe = Searcher::new(&probe_ctx);
        let contextual = self.ctx.implicits.eligible(self.ctx, pt, state);
        let scope = self
            .ctx
            .run
            .implicit_scope(oracle, pt.as_type(oracle), state);
        let derived = scope.eligible(self.ctx, pt, state);
        let mut out = TermRefSet::new();
        for cand in contextual.iter().chain(derived.iter()) {
            let history = SearchHistory::new_root();
            let mut trial = state.fork();
            if let Ok(SearchResult::Success(s)) =
                probe.try_implicit(*cand, pt, None, span, &history, &mut trial, false)
            {
                out.insert(s.reference, oracle, state);
            }
        }
        out.iter().copied().collect()
    }

    // =========================================================================
    // The ranking engine
    // =========================================================================

    pub(crate) fn best_implicit(
        &self,
        pt: &Proto,
        argument: Option<&Tree>,
        span: Span,
        history: &SearchHistory,
        state: &mut TyperState,
    ) -> Result<SearchResult, CyclicError> {
        let oracle = self.ctx.oracle;
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                pt = %oracle.show_type(pt.as_type(oracle), state),
                depth = history.depth(),
                "best_implicit"
            );
        }
        // Recursive references take precedence over any candidate.
        if let Some(r) = history.recursive_ref(pt, self.ctx, state) {
            let tpe = oracle.symbols.info(r.sym);
            let tree = ref_tree(oracle, r, tpe, span);
            return Ok(SearchResult::Success(SearchSuccess {
                tree,
                reference: r,
                level: 0,
                state: state.fork(),
                contextual: false,
                migration_warning: false,
            }));
        }

        let contextual_result = self.search_pass(pt, argument, span, history, state, true)?;
        let merged = match contextual_result {
            SearchResult::Failure(ref f) if !f.is_sticky() => {
                match self.search_pass(pt, argument, span, history, state, false)? {
                    SearchResult::Success(s) => SearchResult::Success(s),
                    SearchResult::Failure(f2) => {
                        SearchResult::Failure(merge_failures(f.clone(), f2))
                    }
                }
            }
            other => other,
        };

        // If a knot was tied at this search's type, this is the defining
        // search: its construction fills the pending entry, and the
        // answer becomes the stable dictionary reference.
        if let SearchResult::Success(s) = &merged {
            let wide = oracle.normalize(pt.widened(oracle, state), state);
            let linked = history.root.borrow_mut().define_byname(wide, s.tree.clone());
            if let Some(r) = linked {
                let tree = ref_tree(oracle, r, wide, span);
                return Ok(SearchResult::Success(SearchSuccess {
                    tree,
                    reference: r,
                    level: s.level,
                    state: s.state.clone(),
                    contextual: s.contextual,
                    migration_warning: s.migration_warning,
                }));
            }
        }
        Ok(merged)
    }

    fn search_pass(
        &self,
        pt: &Proto,
        argument: Option<&Tree>,
        span: Span,
        history: &SearchHistory,
        state: &mut TyperState,
        contextual: bool,
    ) -> Result<SearchResult, CyclicError> {
        let oracle = self.ctx.oracle;
        // A Not[T] expectation searches T and swaps the outcome.
        let (search_pt, negated) = match pt.not_argument(oracle, state) {
            Some(inner) => (Proto::Value(inner), true),
            None => (pt.clone(), false),
        };
        let eligible: Vec<Candidate> = if contextual {
            self.ctx
                .implicits
                .eligible(self.ctx, &search_pt, state)
                .as_ref()
                .clone()
        } else {
            // Normalize the scope key: the run cache must not be keyed on
            // trial-state-dependent variable bindings.
            let scope_ty = oracle.normalize(search_pt.as_type(oracle), state);
            let scope = self.ctx.run.implicit_scope(oracle, scope_ty, state);
            scope.eligible(self.ctx, &search_pt, state).as_ref().clone()
        };
        trace!(contextual, eligible = eligible.len(), "search pass");
        self.search_implicits(
            eligible, pt, &search_pt, negated, argument, span, history, state, contextual,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn search_implicits(
        &self,
        mut eligible: Vec<Candidate>,
        pt_full: &Proto,
        pt: &Proto,
        negated: bool,
        argument: Option<&Tree>,
        span: Span,
        history: &SearchHistory,
        state: &mut TyperState,
        contextual: bool,
    ) -> Result<SearchResult, CyclicError> {
        self.sort_candidates(&mut eligible, state);
        self.rank(
            eligible, pt_full, pt, negated, argument, span, history, state, contextual,
        )
    }

    /// Stable preference sort: higher level first, then subclass owners,
    /// then lower arity. An optimization only; the result does not
    /// depend on it.
    fn sort_candidates(&self, cands: &mut [Candidate], state: &TyperState) {
        let oracle = self.ctx.oracle;
        cands.sort_by(|a, b| {
            oracle
                .compare(b.term(), a.term(), b.level, a.level, state)
                .cmp(&0)
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn rank(
        &self,
        pending: Vec<Candidate>,
        pt_full: &Proto,
        pt: &Proto,
        negated: bool,
        argument: Option<&Tree>,
        span: Span,
        history: &SearchHistory,
        state: &mut TyperState,
        contextual: bool,
    ) -> Result<SearchResult, CyclicError> {
        let oracle = self.ctx.oracle;
        let coherent = pt_full.is_coherent(oracle, state);
        let mut pending: VecDeque<Candidate> = pending.into();
        let mut found: Option<(SearchSuccess, Candidate)> = None;
        let mut failures: Vec<SearchFailure> = Vec::new();
        let mut bypassed_ambiguous: Option<SearchFailure> = None;

        while let Some(cand) = pending.pop_front() {
            let raw = self.try_implicit(cand, pt, argument, span, history, state, contextual)?;
            let result = if negated {
                self.negate(cand, raw, pt_full, state, span)
            } else {
                raw
            };
            match result {
                SearchResult::Failure(f) if f.is_ambiguous() => {
                    if self.ctx.options.migration_warnings {
                        // Legacy resolution would have picked a later
                        // candidate; remember the bypass and keep going.
                        bypassed_ambiguous = Some(f);
                        continue;
                    }
                    let remaining: Vec<Candidate> = pending.into_iter().collect();
                    return self.heal_ambiguous(
                        remaining, f, pt_full, pt, negated, argument, span, history, state,
                        contextual,
                    );
                }
                SearchResult::Failure(f) => failures.push(f),
                SearchResult::Success(best) => {
                    if self.ctx.options.explore_only || coherent || negated {
                        return Ok(SearchResult::Success(best));
                    }
                    match found.take() {
                        None => {
                            pending.retain(|c| {
                                oracle.compare(cand.term(), c.term(), cand.level, c.level, state)
                                    <= 0
                            });
                            found = Some((best, cand));
                        }
                        Some((prev, prev_cand)) => {
                            let diff = oracle.compare(
                                prev_cand.term(),
                                cand.term(),
                                prev.level,
                                best.level,
                                state,
                            );
                            debug_assert!(
                                diff <= 0,
                                "the preference sort must have excluded strictly worse candidates"
                            );
                            if diff < 0 {
                                found = Some((best, cand));
                            } else {
                                return Ok(SearchResult::Failure(SearchFailure::ambiguous(
                                    prev_cand, cand,
                                )));
                            }
                        }
                    }
                }
            }
        }

        match found {
            Some((mut s, _)) => {
                if bypassed_ambiguous.is_some() {
                    s.migration_warning = true;
                }
                Ok(SearchResult::Success(s))
            }
            None => {
                if let Some(amb) = bypassed_ambiguous {
                    return Ok(SearchResult::Failure(amb));
                }
                if negated && failures.is_empty() {
                    // No candidate even exists for the negated type: the
                    // witness holds. (A failing trial returned the
                    // witness early; a recorded failure here means the
                    // inner type was providable.)
                    return Ok(SearchResult::Success(self.not_witness(pt_full, state, span)));
                }
                let best_failure = failures
                    .into_iter()
                    .max_by_key(|f| f.tree_size)
                    .unwrap_or_else(SearchFailure::no_matching);
                Ok(SearchResult::Failure(best_failure))
            }
        }
    }

    /// Retry an ambiguity with the candidates strictly better than both
    /// alternatives; surface the original ambiguity if that fails too.
    #[allow(clippy::too_many_arguments)]
    fn heal_ambiguous(
        &self,
        remaining: Vec<Candidate>,
        fail: SearchFailure,
        pt_full: &Proto,
        pt: &Proto,
        negated: bool,
        argument: Option<&Tree>,
        span: Span,
        history: &SearchHistory,
        state: &mut TyperState,
        contextual: bool,
    ) -> Result<SearchResult, CyclicError> {
        let oracle = self.ctx.oracle;
        let SearchFailureKind::Ambiguous { alt1, alt2 } = fail.kind else {
            return Ok(SearchResult::Failure(fail));
        };
        let strictly_better: Vec<Candidate> = remaining
            .into_iter()
            .filter(|c| {
                oracle.compare(c.term(), alt1.term(), c.level, alt1.level, state) > 0
                    && oracle.compare(c.term(), alt2.term(), c.level, alt2.level, state) > 0
            })
            .collect();
        debug!(candidates = strictly_better.len(), "healing ambiguity");
        let fail = SearchFailure::ambiguous(alt1, alt2);
        if strictly_better.is_empty() {
            return Ok(SearchResult::Failure(fail));
        }
        match self.rank(
            strictly_better, pt_full, pt, negated, argument, span, history, state, contextual,
        )? {
            SearchResult::Success(s) => Ok(SearchResult::Success(s)),
            SearchResult::Failure(_) => Ok(SearchResult::Failure(fail)),
        }
    }

    // =========================================================================
    // Trials
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    fn try_implicit(
        &self,
        cand: Candidate,
        pt: &Proto,
        argument: Option<&Tree>,
        span: Span,
        history: &SearchHistory,
        state: &mut TyperState,
        contextual: bool,
    ) -> Result<SearchResult, CyclicError> {
        let oracle = self.ctx.oracle;
        if history.check_divergence(cand.term(), pt, self.ctx, state) {
            return Ok(SearchResult::Failure(SearchFailure::diverging(cand)));
        }
        let byname = pt.is_byname(oracle, state);
        let nested = history.nest(cand.term(), pt.as_type(oracle), byname);
        let mut trial = state.fork();
        match self.typed_implicit(cand, pt, argument, span, &nested, &mut trial)? {
            Err(fail) => Ok(SearchResult::Failure(fail)),
            Ok(tree) => {
                // Shadowing: the bare implicit name must still resolve to
                // this candidate at the use site.
                if contextual {
                    let name = cand.imp.implicit_name(oracle);
                    if let Some(by) = self.ctx.env.lookup(name) {
                        let same_sym = by == cand.term().sym;
                        let o1 = oracle.symbols.owner_class(by);
                        let o2 = oracle.symbols.owner_class(cand.term().sym);
                        let shares_owner = o1.exists() && o1 == o2;
                        if !same_sym && !shares_owner {
                            return Ok(SearchResult::Failure(SearchFailure::shadowed(cand, by)));
                        }
                    }
                }
                Ok(SearchResult::Success(SearchSuccess {
                    tree,
                    reference: cand.term(),
                    level: cand.level,
                    state: trial,
                    contextual,
                    migration_warning: false,
                }))
            }
        }
    }

    /// Type-check one candidate reference against the target, resolving
    /// its implicit arguments by nested search.
    fn typed_implicit(
        &self,
        cand: Candidate,
        pt: &Proto,
        argument: Option<&Tree>,
        span: Span,
        history: &SearchHistory,
        trial: &mut TyperState,
    ) -> Result<Typed, CyclicError> {
        let oracle = self.ctx.oracle;
        let r = cand.term();
        let info = oracle.symbols.info(r.sym);
        if oracle.dealias(info, trial).is_error() {
            return Err(CyclicError {
                in_implicit_search: true,
            });
        }
        let tree = ref_tree(oracle, r, info, span);
        match argument {
            None => self.adapt(cand, tree, info, pt, span, history, trial),
            Some(arg) => self.convert(cand, tree, info, arg, pt, span, history, trial),
        }
    }

    /// Adapt a bare reference to the expected type: instantiate
    /// polymorphism, constrain the result, then resolve implicit
    /// parameter lists.
    #[allow(clippy::too_many_arguments)]
    fn adapt(
        &self,
        cand: Candidate,
        mut tree: Tree,
        mut info: TypeId,
        pt: &Proto,
        span: Span,
        history: &SearchHistory,
        trial: &mut TyperState,
    ) -> Result<Typed, CyclicError> {
        let oracle = self.ctx.oracle;
        let target = oracle.strip_byname(pt.as_type(oracle), trial);

        let mut implicit_lists: Vec<(Vec<TypeId>, TypeId)> = Vec::new();
        loop {
            info = oracle.dealias(oracle.resolve(info, trial), trial);
            match oracle.key(info) {
                TypeKey::Poly { params, result } => {
                    let syms = oracle.types.sym_list_of(params);
                    let (vars, res) = oracle.instantiate_poly(&syms, result);
                    tree = Tree::type_apply(tree, vars, res, span);
                    info = res;
                }
                TypeKey::Method {
                    params,
                    result,
                    implicit: true,
                } => {
                    implicit_lists.push((oracle.types.type_list_of(params).to_vec(), result));
                    info = result;
                }
                _ => break,
            }
        }

        // Constrain the underlying result against the expectation first,
        // so the implicit arguments are searched at instantiated types.
        let conforms = match pt {
            Proto::Selection {
                name,
                mbr,
                private_ok,
            } => match oracle.member(oracle.widen(info, trial), *name, *private_ok, trial) {
                Some((_, mtype)) => {
                    *mbr == TypeId::ANY || oracle.subtype(mtype, *mbr, trial)
                }
                None => false,
            },
            _ => oracle.subtype(info, target, trial),
        };
        if !conforms {
            return Ok(Err(SearchFailure::mismatched(cand, tree.size())));
        }

        for (params, result) in implicit_lists {
            let mut args = Vec::with_capacity(params.len());
            for param in params {
                let sub_pt = Proto::Value(oracle.resolve(param, trial));
                match self.best_implicit(&sub_pt, None, span, history, trial)? {
                    SearchResult::Success(s) => {
                        trial.commit_from(s.state);
                        args.push(s.tree);
                    }
                    SearchResult::Failure(f) if f.is_sticky() => {
                        // Divergence, ambiguity, and shadowing of an
                        // implicit argument are the candidate's failure,
                        // not a mere mismatch.
                        return Ok(Err(f));
                    }
                    SearchResult::Failure(f) => {
                        return Ok(Err(SearchFailure::mismatched(
                            cand,
                            tree.size() + f.tree_size,
                        )));
                    }
                }
            }
            tree = Tree::apply(tree, args, result, span);
        }
        Ok(Ok(tree))
    }

    /// Apply a conversion or extension candidate to an argument. When a
    /// candidate is both and both forms type-check cleanly, that is an
    /// ambiguity in its own right.
    #[allow(clippy::too_many_arguments)]
    fn convert(
        &self,
        cand: Candidate,
        tree: Tree,
        info: TypeId,
        arg: &Tree,
        pt: &Proto,
        span: Span,
        history: &SearchHistory,
        trial: &mut TyperState,
    ) -> Result<Typed, CyclicError> {
        let oracle = self.ctx.oracle;
        let view_res: Proto = match pt {
            Proto::View { res, .. } => (**res).clone(),
            other => other.clone(),
        };

        let mut ext_result: Option<(Tree, TyperState)> = None;
        if cand.is_extension() {
            if let Proto::Selection {
                name, private_ok, ..
            } = &view_res
            {
                let mut fork = trial.fork();
                if let Some((msym, mtype)) =
                    oracle.member(oracle.widen(info, &fork), *name, *private_ok, &fork)
                {
                    let select = Tree::select(tree.clone(), msym, mtype, span);
                    let res_ty = oracle.strip_byname(view_res.as_type(oracle), &fork);
                    if let Some(t) =
                        self.apply_value(select, mtype, arg, res_ty, span, history, &mut fork)?
                    {
                        ext_result = Some((t, fork));
                    }
                }
            }
        }

        let mut conv_result: Option<(Tree, TyperState)> = None;
        if cand.is_conversion() {
            let mut fork = trial.fork();
            let res_ty = match &view_res {
                Proto::Selection { .. } => TypeId::ANY,
                other => oracle.strip_byname(other.as_type(oracle), &fork),
            };
            if let Some(t) =
                self.apply_value(tree.clone(), info, arg, res_ty, span, history, &mut fork)?
            {
                // A selection result must still provide the member.
                let ok = match &view_res {
                    Proto::Selection {
                        name, private_ok, ..
                    } => oracle
                        .member(oracle.widen(t.tpe, &fork), *name, *private_ok, &fork)
                        .is_some(),
                    _ => true,
                };
                if ok {
                    conv_result = Some((t, fork));
                }
            }
        }

        match (ext_result, conv_result) {
            (Some(_), Some(_)) => Ok(Err(SearchFailure::ambiguous(cand, cand))),
            (Some((t, s)), None) | (None, Some((t, s))) => {
                trial.commit_from(s);
                Ok(Ok(t))
            }
            (None, None) => Ok(Err(SearchFailure::mismatched(cand, tree.size()))),
        }
    }

    /// Apply a function-like value to one argument, peeling polymorphism
    /// and resolving implicit parameter lists on the way. Returns the
    /// applied tree when everything conforms.
    #[allow(clippy::too_many_arguments)]
    fn apply_value(
        &self,
        mut tree: Tree,
        mut info: TypeId,
        arg: &Tree,
        res_ty: TypeId,
        span: Span,
        history: &SearchHistory,
        state: &mut TyperState,
    ) -> Result<Option<Tree>, CyclicError> {
        let oracle = self.ctx.oracle;
        loop {
            info = oracle.dealias(oracle.resolve(info, state), state);
            match oracle.key(info) {
                TypeKey::Poly { params, result } => {
                    let syms = oracle.types.sym_list_of(params);
                    let (vars, res) = oracle.instantiate_poly(&syms, result);
                    tree = Tree::type_apply(tree, vars, res, span);
                    info = res;
                }
                TypeKey::Method {
                    params,
                    result,
                    implicit: true,
                } => {
                    let ps = oracle.types.type_list_of(params).to_vec();
                    let mut args = Vec::with_capacity(ps.len());
                    for p in ps {
                        let sub_pt = Proto::Value(oracle.resolve(p, state));
                        match self.best_implicit(&sub_pt, None, span, history, state)? {
                            SearchResult::Success(s) => {
                                state.commit_from(s.state);
                                args.push(s.tree);
                            }
                            SearchResult::Failure(_) => return Ok(None),
                        }
                    }
                    tree = Tree::apply(tree, args, result, span);
                    info = result;
                }
                _ => break,
            }
        }

        let (formal, result) = match oracle.key(info) {
            TypeKey::Method {
                params,
                result,
                implicit: false,
            }
            | TypeKey::Func { params, result } => {
                let ps = oracle.types.type_list_of(params);
                if ps.len() != 1 {
                    return Ok(None);
                }
                (ps[0], result)
            }
            _ => {
                // A conversion value: its base `Conversion[From, To]` (or
                // subtype witness) instance supplies the signature.
                let base = oracle
                    .base_type(info, oracle.builtins.conversion, state)
                    .or_else(|| oracle.base_type(info, oracle.builtins.subtype_witness, state));
                let Some(base) = base else { return Ok(None) };
                match oracle.key(base) {
                    TypeKey::Applied { args, .. } => {
                        let args = oracle.types.type_list_of(args);
                        if args.len() != 2 {
                            return Ok(None);
                        }
                        (args[0], args[1])
                    }
                    _ => return Ok(None),
                }
            }
        };
        if !oracle.subtype(arg.tpe, formal, state) {
            return Ok(None);
        }
        if !oracle.subtype(result, res_ty, state) {
            return Ok(None);
        }
        Ok(Some(Tree::apply(tree, vec![arg.clone()], result, span)))
    }

    fn negate(
        &self,
        cand: Candidate,
        result: SearchResult,
        pt_full: &Proto,
        state: &TyperState,
        span: Span,
    ) -> SearchResult {
        match result {
            // The inner type is providable, so its negation is not.
            SearchResult::Success(_) => {
                SearchResult::Failure(SearchFailure::mismatched(cand, 0))
            }
            SearchResult::Failure(_) => {
                SearchResult::Success(self.not_witness(pt_full, state, span))
            }
        }
    }

    /// The synthesized witness for a `Not[T]` expectation, under a fresh
    /// committable state.
    fn not_witness(&self, pt_full: &Proto, state: &TyperState, span: Span) -> SearchSuccess {
        let oracle = self.ctx.oracle;
        let tpe = pt_full.widened(oracle, state);
        SearchSuccess {
            tree: Tree::new_instance(tpe, span),
            // The witness is synthesized, not selected from scope.
            reference: TermRef::root(SymbolId::NONE),
            level: 0,
            state: state.fork(),
            contextual: false,
            migration_warning: false,
        }
    }
}

/// Merge a contextual failure with the derived-pass failure that
/// followed it. An ambiguity in the derived pass wins; its divergence or
/// shadowing diagnostics do not displace the primary failure; otherwise
/// the failure with the larger failed tree is the better diagnostic.
fn merge_failures(contextual: SearchFailure, derived: SearchFailure) -> SearchFailure {
    if derived.is_ambiguous() {
        return derived;
    }
    if derived.is_sticky() {
        return contextual;
    }
    if derived.tree_size > contextual.tree_size {
        derived
    } else {
        contextual
    }
}
