//! Shared world-building fixtures for the search tests.

#![allow(dead_code)]

use sable_common::{InferOptions, Span};
use sable_infer::{
    ContextualImplicits, CyclicError, ImplicitRef, InferCtx, LexicalEnv, Proto, Run, SearchResult,
    Searcher,
};
use sable_solver::{Oracle, SymbolFlags, SymbolId, TermRef, TypeId, TyperState, Variance};
use std::rc::Rc;

pub struct World {
    pub oracle: Oracle,
    pub run: Run,
}

impl World {
    pub fn new() -> World {
        World {
            oracle: Oracle::new(),
            run: Run::new(),
        }
    }

    pub fn class(&self, name: &str) -> SymbolId {
        self.oracle.symbols.alloc(
            self.oracle.intern_name(name),
            SymbolId::NONE,
            SymbolFlags::CLASS,
            TypeId::NONE,
        )
    }

    /// A class with one type parameter of the given variance.
    pub fn generic_class(&self, name: &str, variance: Variance) -> SymbolId {
        let class = self.class(name);
        let param = self.oracle.symbols.alloc(
            self.oracle.intern_name("T"),
            class,
            SymbolFlags::TYPE_PARAM,
            TypeId::NONE,
        );
        self.oracle.symbols.set_variance(param, variance);
        self.oracle.symbols.add_type_param(class, param);
        class
    }

    pub fn class_with_companion(&self, name: &str) -> (SymbolId, SymbolId) {
        let class = self.class(name);
        let module = self.oracle.symbols.alloc(
            self.oracle.intern_name(name),
            SymbolId::NONE,
            SymbolFlags::MODULE,
            TypeId::NONE,
        );
        self.oracle.symbols.set_companions(class, module);
        (class, module)
    }

    /// An implicit member of a module, visible through the derived scope.
    pub fn implicit_member(&self, module: SymbolId, name: &str, info: TypeId) -> SymbolId {
        let sym = self.oracle.symbols.alloc(
            self.oracle.intern_name(name),
            module,
            SymbolFlags::IMPLICIT,
            info,
        );
        self.oracle.symbols.add_decl(module, sym);
        sym
    }

    pub fn implicit_val(&self, name: &str, info: TypeId) -> ImplicitRef {
        ImplicitRef::plain(TermRef::root(self.oracle.symbols.alloc(
            self.oracle.intern_name(name),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            info,
        )))
    }

    pub fn implicit_def(&self, name: &str, info: TypeId) -> ImplicitRef {
        ImplicitRef::plain(TermRef::root(self.oracle.symbols.alloc(
            self.oracle.intern_name(name),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT | SymbolFlags::METHOD,
            info,
        )))
    }

    /// A fresh type parameter symbol for a polymorphic definition.
    pub fn type_param(&self, name: &str, owner: SymbolId) -> SymbolId {
        self.oracle.symbols.alloc(
            self.oracle.intern_name(name),
            owner,
            SymbolFlags::TYPE_PARAM,
            TypeId::NONE,
        )
    }

    pub fn app(&self, class: SymbolId, args: Vec<TypeId>) -> TypeId {
        self.oracle.applied(self.oracle.named(class), args)
    }

    pub fn ctx<'a>(&'a self, refs: Vec<ImplicitRef>) -> InferCtx<'a> {
        self.ctx_full(refs, LexicalEnv::root(), InferOptions::default())
    }

    pub fn ctx_full<'a>(
        &'a self,
        refs: Vec<ImplicitRef>,
        env: Rc<LexicalEnv>,
        options: InferOptions,
    ) -> InferCtx<'a> {
        InferCtx::new(
            &self.oracle,
            &self.run,
            ContextualImplicits::outermost(refs, SymbolId::NONE),
            env,
            options,
        )
    }

    /// Run a top-level inference with the given contextual refs.
    pub fn infer(
        &self,
        refs: Vec<ImplicitRef>,
        pt: &Proto,
    ) -> (Result<SearchResult, CyclicError>, TyperState) {
        let ctx = self.ctx(refs);
        self.infer_in(&ctx, pt)
    }

    pub fn infer_in(
        &self,
        ctx: &InferCtx<'_>,
        pt: &Proto,
    ) -> (Result<SearchResult, CyclicError>, TyperState) {
        let searcher = Searcher::new(ctx);
        let mut state = TyperState::new();
        let result = searcher.infer_implicit(pt, None, Span::dummy(), &mut state);
        (result, state)
    }
}

/// Unwrap a success or panic with the failure.
pub fn expect_success(result: Result<SearchResult, CyclicError>) -> sable_infer::SearchSuccess {
    match result.expect("no cyclic error expected") {
        SearchResult::Success(s) => s,
        SearchResult::Failure(f) => panic!("expected success, got {f:?}"),
    }
}

pub fn expect_failure(result: Result<SearchResult, CyclicError>) -> sable_infer::SearchFailure {
    match result.expect("no cyclic error expected") {
        SearchResult::Failure(f) => f,
        SearchResult::Success(s) => panic!("expected failure, got success at {:?}", s.reference),
    }
}
