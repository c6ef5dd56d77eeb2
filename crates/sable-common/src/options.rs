//! Engine options for implicit resolution.
//!
//! This module lives in sable-common so that both the solver and the
//! implicit engine can reference `InferOptions` without creating a circular
//! dependency.

/// Options controlling implicit search behavior.
#[derive(Debug, Clone, Default)]
pub struct InferOptions {
    /// When true, accept plain single-argument function types as implicit
    /// conversions, as earlier language versions did. New code must extend
    /// the `Conversion` class.
    pub legacy_conversions: bool,
    /// When true (implies legacy semantics for ambiguity), an ambiguous
    /// candidate pair does not abort the search; if a later candidate
    /// succeeds, a migration warning is recorded on the result instead.
    pub migration_warnings: bool,
    /// When true, searches are exploratory probes: the first success is
    /// returned without pairwise disambiguation and nothing is committed.
    pub explore_only: bool,
}
