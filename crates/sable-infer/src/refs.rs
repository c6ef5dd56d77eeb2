//! Implicit references and semantic reference sets.

use rustc_hash::FxHashMap;
use sable_common::Atom;
use sable_solver::{Oracle, SymbolId, TermRef, TypeId, TyperState};
use smallvec::SmallVec;

/// An implicit reference: a plain term reference, or one renamed by an
/// import. The alias is what shadowing compares by; the underlying
/// reference drives type resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImplicitRef {
    pub term: TermRef,
    pub alias: Option<Atom>,
}

impl ImplicitRef {
    pub fn plain(term: TermRef) -> Self {
        ImplicitRef { term, alias: None }
    }

    pub fn renamed(term: TermRef, alias: Atom) -> Self {
        ImplicitRef {
            term,
            alias: Some(alias),
        }
    }

    /// The name this reference is visible under at the use site.
    pub fn implicit_name(&self, oracle: &Oracle) -> Atom {
        self.alias.unwrap_or_else(|| oracle.symbols.name(self.term.sym))
    }
}

/// A set of term references deduplicated by semantic equality: equal
/// symbol and type-equivalent prefixes. Iteration is insertion-stable so
/// diagnostics stay reproducible.
#[derive(Default)]
pub struct TermRefSet {
    prefixes: FxHashMap<SymbolId, SmallVec<[TypeId; 2]>>,
    order: Vec<TermRef>,
}

impl TermRefSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reference; returns true if it was not already present.
    pub fn insert(&mut self, r: TermRef, oracle: &Oracle, state: &TyperState) -> bool {
        let prefixes = self.prefixes.entry(r.sym).or_default();
        if prefixes
            .iter()
            .any(|&p| p == r.prefix || oracle.same_type(p, r.prefix, state))
        {
            return false;
        }
        prefixes.push(r.prefix);
        self.order.push(r);
        true
    }

    pub fn contains(&self, r: TermRef, oracle: &Oracle, state: &TyperState) -> bool {
        self.prefixes
            .get(&r.sym)
            .is_some_and(|ps| ps.iter().any(|&p| p == r.prefix || oracle.same_type(p, r.prefix, state)))
    }

    pub fn union(&mut self, other: &TermRefSet, oracle: &Oracle, state: &TyperState) {
        for &r in &other.order {
            self.insert(r, oracle, state);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermRef> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_solver::SymbolFlags;

    #[test]
    fn deduplicates_equivalent_prefixes() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let module = oracle.symbols.alloc(
            oracle.intern_name("M"),
            SymbolId::NONE,
            SymbolFlags::MODULE,
            TypeId::NONE,
        );
        let member = oracle.symbols.alloc(
            oracle.intern_name("x"),
            module,
            SymbolFlags::IMPLICIT,
            TypeId::INT,
        );
        let prefix = oracle.term_ref_type(TermRef::root(module));
        let mut set = TermRefSet::new();
        assert!(set.insert(TermRef::new(prefix, member), &oracle, &state));
        assert!(!set.insert(TermRef::new(prefix, member), &oracle, &state));
        assert_eq!(set.len(), 1);

        // Same symbol under a different (non-equivalent) prefix is a
        // distinct reference.
        assert!(set.insert(TermRef::root(member), &oracle, &state));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn union_preserves_insertion_order() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let a = oracle.symbols.alloc(
            oracle.intern_name("a"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::INT,
        );
        let b = oracle.symbols.alloc(
            oracle.intern_name("b"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::INT,
        );
        let mut s1 = TermRefSet::new();
        s1.insert(TermRef::root(a), &oracle, &state);
        let mut s2 = TermRefSet::new();
        s2.insert(TermRef::root(b), &oracle, &state);
        s2.insert(TermRef::root(a), &oracle, &state);
        s1.union(&s2, &oracle, &state);
        let order: Vec<SymbolId> = s1.iter().map(|r| r.sym).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn renamed_refs_use_alias_for_naming() {
        let oracle = Oracle::new();
        let sym = oracle.symbols.alloc(
            oracle.intern_name("conv"),
            SymbolId::NONE,
            SymbolFlags::IMPLICIT,
            TypeId::INT,
        );
        let alias = oracle.intern_name("renamedConv");
        let plain = ImplicitRef::plain(TermRef::root(sym));
        let renamed = ImplicitRef::renamed(TermRef::root(sym), alias);
        assert_eq!(plain.implicit_name(&oracle), oracle.intern_name("conv"));
        assert_eq!(renamed.implicit_name(&oracle), alias);
    }
}
