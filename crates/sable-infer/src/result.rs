//! Search results and failures.
//!
//! Failures are values, not exceptions; the single thrown condition of
//! the surrounding typer (cyclic references) is modeled as an error value
//! carried through `Result` and flagged as raised during implicit search.

use crate::candidates::Candidate;
use crate::tree::Tree;
use sable_solver::{TermRef, TyperState};

/// A successful search: `tree.tpe` conforms to the target under `state`,
/// which the caller commits.
#[derive(Clone, Debug)]
pub struct SearchSuccess {
    pub tree: Tree,
    pub reference: TermRef,
    pub level: u32,
    /// The committable trial state.
    pub state: TyperState,
    /// Set when this search came from the contextual pass and the result
    /// may be inlined at the use site.
    pub contextual: bool,
    /// Set in legacy mode when an earlier ambiguity was bypassed and a
    /// later candidate succeeded: the behavior changed relative to the
    /// old resolution rules.
    pub migration_warning: bool,
}

/// Why a search failed.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchFailureKind {
    /// No candidate matched the target.
    NoMatching,
    /// A specific candidate classified as eligible but failed to adapt.
    Mismatched { cand: Candidate },
    /// A contextual candidate is rebound at the use site.
    Shadowed { cand: Candidate, by: sable_solver::SymbolId },
    /// Two candidates neither of which is preferred.
    Ambiguous { alt1: Candidate, alt2: Candidate },
    /// The candidate's resolution would not terminate.
    Diverging { cand: Candidate },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchFailure {
    pub kind: SearchFailureKind,
    /// Size of the largest tree the failing trial produced; the ranking
    /// engine keeps the failure with the best diagnostic.
    pub tree_size: u32,
}

impl SearchFailure {
    pub fn no_matching() -> Self {
        SearchFailure {
            kind: SearchFailureKind::NoMatching,
            tree_size: 0,
        }
    }

    pub fn mismatched(cand: Candidate, tree_size: u32) -> Self {
        SearchFailure {
            kind: SearchFailureKind::Mismatched { cand },
            tree_size,
        }
    }

    pub fn shadowed(cand: Candidate, by: sable_solver::SymbolId) -> Self {
        SearchFailure {
            kind: SearchFailureKind::Shadowed { cand, by },
            tree_size: 0,
        }
    }

    pub fn ambiguous(alt1: Candidate, alt2: Candidate) -> Self {
        SearchFailure {
            kind: SearchFailureKind::Ambiguous { alt1, alt2 },
            tree_size: 0,
        }
    }

    pub fn diverging(cand: Candidate) -> Self {
        SearchFailure {
            kind: SearchFailureKind::Diverging { cand },
            tree_size: 0,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self.kind, SearchFailureKind::Ambiguous { .. })
    }

    /// Failures that carry a diagnostic the derived-scope fallback must
    /// not clobber.
    pub fn is_sticky(&self) -> bool {
        matches!(
            self.kind,
            SearchFailureKind::Ambiguous { .. }
                | SearchFailureKind::Diverging { .. }
                | SearchFailureKind::Shadowed { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub enum SearchResult {
    Success(SearchSuccess),
    Failure(SearchFailure),
}

impl SearchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchResult::Success(_))
    }

    pub fn success(self) -> Option<SearchSuccess> {
        match self {
            SearchResult::Success(s) => Some(s),
            SearchResult::Failure(_) => None,
        }
    }

    pub fn failure(self) -> Option<SearchFailure> {
        match self {
            SearchResult::Success(_) => None,
            SearchResult::Failure(f) => Some(f),
        }
    }
}

/// A cyclic reference surfaced by the underlying typer. Not recovered
/// locally; annotated so the caller knows it was raised inside implicit
/// search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CyclicError {
    pub in_implicit_search: bool,
}

impl std::fmt::Display for CyclicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.in_implicit_search {
            write!(f, "cyclic reference (in implicit search)")
        } else {
            write!(f, "cyclic reference")
        }
    }
}

impl std::error::Error for CyclicError {}
