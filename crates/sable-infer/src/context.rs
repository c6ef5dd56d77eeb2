//! Contextual implicits: the lexically-bound side of the search.
//!
//! A `ContextualImplicits` chain links the implicit references visible at
//! the use site, innermost first, each node annotated with a nesting
//! level. Eligibility is cached per target type; outer candidates are
//! shadowed by name against the inner ones.

use crate::candidates::{filter_matching, Candidate};
use crate::proto::Proto;
use crate::refs::ImplicitRef;
use crate::scope::Run;
use rustc_hash::{FxHashMap, FxHashSet};
use sable_common::{Atom, InferOptions};
use sable_solver::{Oracle, SymbolId, TypeId, TyperState};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// A chain of implicit reference groups, innermost first.
pub struct ContextualImplicits {
    refs: Vec<ImplicitRef>,
    pub outer: Option<Rc<ContextualImplicits>>,
    pub level: u32,
    /// The symbol owning the scope this group was lifted from.
    pub owner: SymbolId,
    /// For groups lifted from an import: the import site's term symbol.
    pub import_site: Option<SymbolId>,
    cache: RefCell<FxHashMap<TypeId, Rc<Vec<Candidate>>>>,
}

impl ContextualImplicits {
    /// The outermost group. Its level is 1.
    pub fn outermost(refs: Vec<ImplicitRef>, owner: SymbolId) -> Rc<Self> {
        Rc::new(ContextualImplicits {
            refs,
            outer: None,
            level: 1,
            owner,
            import_site: None,
            cache: RefCell::new(FxHashMap::default()),
        })
    }

    /// Push a group inside `outer`. The level stays when owner and scope
    /// are physically unchanged and the head is not a dictionary entry;
    /// it increments otherwise.
    pub fn nested(
        oracle: &Oracle,
        refs: Vec<ImplicitRef>,
        owner: SymbolId,
        same_scope: bool,
        import_site: Option<SymbolId>,
        outer: Rc<Self>,
    ) -> Rc<Self> {
        let head_is_lazy = refs
            .first()
            .is_some_and(|r| oracle.is_lazy_implicit_name(r.implicit_name(oracle)));
        let level = if same_scope && owner == outer.owner && !head_is_lazy {
            outer.level
        } else {
            outer.level + 1
        };
        Rc::new(ContextualImplicits {
            refs,
            outer: Some(outer),
            level,
            owner,
            import_site,
            cache: RefCell::new(FxHashMap::default()),
        })
    }

    pub fn refs(&self) -> &[ImplicitRef] {
        &self.refs
    }

    /// Candidates eligible at `pt`, own group first, then the outer
    /// chain's candidates minus those shadowed by an inner name.
    pub fn eligible(&self, ctx: &InferCtx<'_>, pt: &Proto, state: &TyperState) -> Rc<Vec<Candidate>> {
        let key = pt.cache_key(ctx.oracle, state);
        if let Some(key) = key {
            if let Some(hit) = self.cache.borrow().get(&key) {
                return Rc::clone(hit);
            }
        }
        let computed = Rc::new(self.compute_eligible(ctx, pt, state));
        if let Some(key) = key {
            self.cache.borrow_mut().insert(key, Rc::clone(&computed));
        }
        computed
    }

    fn compute_eligible(&self, ctx: &InferCtx<'_>, pt: &Proto, state: &TyperState) -> Vec<Candidate> {
        let mut own = filter_matching(ctx.oracle, &self.refs, pt, self.level, state, &ctx.options);
        if let Some(outer) = &self.outer {
            let shadowed: FxHashSet<Atom> = own
                .iter()
                .map(|c| c.imp.implicit_name(ctx.oracle))
                .collect();
            let outer_eligible = outer.eligible(ctx, pt, state);
            own.extend(
                outer_eligible
                    .iter()
                    .filter(|c| !shadowed.contains(&c.imp.implicit_name(ctx.oracle)))
                    .copied(),
            );
        }
        trace!(level = self.level, eligible = own.len(), "contextual eligible");
        own
    }

    /// A copy of the chain without any import group whose site is
    /// `root_sym`. Used to suppress the root import when a wildcard of
    /// the same name is re-imported.
    pub fn exclude(self: &Rc<Self>, root_sym: SymbolId) -> Rc<Self> {
        if !self.chain_contains_site(root_sym) {
            return Rc::clone(self);
        }
        self.exclude_rec(root_sym)
            .unwrap_or_else(|| ContextualImplicits::outermost(Vec::new(), self.owner))
    }

    fn chain_contains_site(&self, root_sym: SymbolId) -> bool {
        if self.import_site == Some(root_sym) {
            return true;
        }
        self.outer
            .as_ref()
            .is_some_and(|o| o.chain_contains_site(root_sym))
    }

    fn exclude_rec(&self, root_sym: SymbolId) -> Option<Rc<Self>> {
        let outer = match &self.outer {
            Some(o) => o.exclude_rec(root_sym),
            None => None,
        };
        if self.import_site == Some(root_sym) {
            return outer;
        }
        Some(Rc::new(ContextualImplicits {
            refs: self.refs.clone(),
            level: self.level,
            owner: self.owner,
            import_site: self.import_site,
            outer,
            cache: RefCell::new(FxHashMap::default()),
        }))
    }
}

/// Term bindings visible at the use site, for shadowing probes: a name
/// lookup that sees every binding, implicit or not.
pub struct LexicalEnv {
    bindings: FxHashMap<Atom, SymbolId>,
    outer: Option<Rc<LexicalEnv>>,
}

impl LexicalEnv {
    pub fn root() -> Rc<Self> {
        Rc::new(LexicalEnv {
            bindings: FxHashMap::default(),
            outer: None,
        })
    }

    pub fn nested(outer: Rc<Self>) -> LexicalEnv {
        LexicalEnv {
            bindings: FxHashMap::default(),
            outer: Some(outer),
        }
    }

    pub fn define(&mut self, name: Atom, sym: SymbolId) {
        self.bindings.insert(name, sym);
    }

    pub fn into_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// Resolve a bare name, innermost binding first.
    pub fn lookup(&self, name: Atom) -> Option<SymbolId> {
        if let Some(&sym) = self.bindings.get(&name) {
            return Some(sym);
        }
        self.outer.as_ref().and_then(|o| o.lookup(name))
    }
}

/// Everything a search needs from its surroundings.
#[derive(Clone)]
pub struct InferCtx<'a> {
    pub oracle: &'a Oracle,
    pub run: &'a Run,
    pub implicits: Rc<ContextualImplicits>,
    pub env: Rc<LexicalEnv>,
    pub options: InferOptions,
}

impl<'a> InferCtx<'a> {
    pub fn new(
        oracle: &'a Oracle,
        run: &'a Run,
        implicits: Rc<ContextualImplicits>,
        env: Rc<LexicalEnv>,
        options: InferOptions,
    ) -> Self {
        InferCtx {
            oracle,
            run,
            implicits,
            env,
            options,
        }
    }

    /// A copy of this context for exploratory probes.
    pub fn exploring(&self) -> InferCtx<'a> {
        let mut ctx = self.clone();
        ctx.options.explore_only = true;
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_solver::{SymbolFlags, TermRef};

    fn implicit_ref(oracle: &Oracle, name: &str, info: TypeId) -> ImplicitRef {
        ImplicitRef::plain(TermRef::root(oracle.symbols.alloc(
            oracle.intern_name(name),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            info,
        )))
    }

    fn ctx_for<'a>(
        oracle: &'a Oracle,
        run: &'a Run,
        implicits: Rc<ContextualImplicits>,
    ) -> InferCtx<'a> {
        InferCtx::new(
            oracle,
            run,
            implicits,
            LexicalEnv::root(),
            InferOptions::default(),
        )
    }

    #[test]
    fn inner_names_shadow_outer_candidates() {
        let oracle = Oracle::new();
        let run = Run::new();
        let state = TyperState::new();
        let outer_c = implicit_ref(&oracle, "c", TypeId::INT);
        let inner_c = implicit_ref(&oracle, "c", TypeId::INT);
        let outer = ContextualImplicits::outermost(vec![outer_c], SymbolId::NONE);
        let inner =
            ContextualImplicits::nested(&oracle, vec![inner_c], SymbolId(99), false, None, outer);
        let ctx = ctx_for(&oracle, &run, Rc::clone(&inner));
        let eligible = inner.eligible(&ctx, &Proto::Value(TypeId::INT), &state);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].imp, inner_c);
        assert_eq!(eligible[0].level, 2);
    }

    #[test]
    fn renamed_refs_shadow_by_alias_not_original_name() {
        let oracle = Oracle::new();
        let run = Run::new();
        let state = TyperState::new();
        let outer_show = implicit_ref(&oracle, "show", TypeId::INT);
        // Inner group renames a different symbol to "display": the outer
        // "show" stays visible.
        let inner_sym = oracle.symbols.alloc(
            oracle.intern_name("show"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::INT,
        );
        let renamed = ImplicitRef::renamed(
            TermRef::root(inner_sym),
            oracle.intern_name("display"),
        );
        let outer = ContextualImplicits::outermost(vec![outer_show], SymbolId::NONE);
        let inner =
            ContextualImplicits::nested(&oracle, vec![renamed], SymbolId(7), false, None, outer);
        let ctx = ctx_for(&oracle, &run, Rc::clone(&inner));
        let eligible = inner.eligible(&ctx, &Proto::Value(TypeId::INT), &state);
        // Both are eligible: the alias "display" does not shadow "show",
        // even though the underlying symbol is also named "show".
        assert_eq!(eligible.len(), 2);
    }

    #[test]
    fn level_stays_within_same_scope_and_owner() {
        let oracle = Oracle::new();
        let owner = SymbolId(5);
        let outer = ContextualImplicits::outermost(
            vec![implicit_ref(&oracle, "a", TypeId::INT)],
            owner,
        );
        assert_eq!(outer.level, 1);
        let same = ContextualImplicits::nested(
            &oracle,
            vec![implicit_ref(&oracle, "b", TypeId::INT)],
            owner,
            true,
            None,
            Rc::clone(&outer),
        );
        assert_eq!(same.level, 1);
        let different = ContextualImplicits::nested(
            &oracle,
            vec![implicit_ref(&oracle, "d", TypeId::INT)],
            SymbolId(6),
            true,
            None,
            outer,
        );
        assert_eq!(different.level, 2);
    }

    #[test]
    fn dictionary_names_always_open_a_level() {
        let oracle = Oracle::new();
        let owner = SymbolId(5);
        let outer = ContextualImplicits::outermost(Vec::new(), owner);
        let dict_sym = oracle.fresh_lazy_implicit_sym(TypeId::INT);
        oracle.symbols.add_flags(dict_sym, SymbolFlags::IMPLICIT);
        let inner = ContextualImplicits::nested(
            &oracle,
            vec![ImplicitRef::plain(TermRef::root(dict_sym))],
            owner,
            true,
            None,
            outer,
        );
        assert_eq!(inner.level, 2);
    }

    #[test]
    fn exclude_drops_import_groups_by_site() {
        let oracle = Oracle::new();
        let site = SymbolId(42);
        let a = implicit_ref(&oracle, "a", TypeId::INT);
        let b = implicit_ref(&oracle, "b", TypeId::INT);
        let outer = ContextualImplicits::outermost(vec![a], SymbolId::NONE);
        let imported = ContextualImplicits::nested(
            &oracle,
            vec![b],
            SymbolId::NONE,
            false,
            Some(site),
            outer,
        );
        let pruned = imported.exclude(site);
        assert!(pruned.import_site.is_none());
        assert_eq!(pruned.refs().len(), 1);
        assert_eq!(pruned.refs()[0], a);
        // Excluding an unknown site returns the chain unchanged.
        let same = imported.exclude(SymbolId(77));
        assert!(Rc::ptr_eq(&same, &imported));
    }

    #[test]
    fn lexical_lookup_is_innermost_first() {
        let oracle = Oracle::new();
        let name = oracle.intern_name("c");
        let mut root = LexicalEnv::nested(LexicalEnv::root());
        root.define(name, SymbolId(1));
        let mut inner = LexicalEnv::nested(root.into_rc());
        inner.define(name, SymbolId(2));
        let env = inner.into_rc();
        assert_eq!(env.lookup(name), Some(SymbolId(2)));
        assert_eq!(env.lookup(oracle.intern_name("missing")), None);
    }
}
