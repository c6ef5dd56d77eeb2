//! Implicit resolution for the sable compiler.
//!
//! Given an expected type (and optionally an expression to convert), the
//! engine finds a unique term conforming to it, selected from the
//! contextual implicit references and the companion-derived scope of the
//! type:
//! - `Searcher::infer_implicit` / `infer_view` / `view_exists` - the
//!   search entry points
//! - `ContextualImplicits` - lexically-bound references, innermost first
//! - `Run::implicit_scope` - memoized companion scopes
//! - `SearchHistory` - divergence checking and recursion knots
//! - `emit_dictionary` - materialization of by-name recursive instances

pub mod candidates;
pub mod context;
pub mod dictionary;
pub mod history;
pub mod proto;
pub mod refs;
pub mod result;
pub mod scope;
pub mod search;
pub mod tree;

pub use candidates::{CandKind, Candidate};
pub use context::{ContextualImplicits, InferCtx, LexicalEnv};
pub use dictionary::emit_dictionary;
pub use history::{SearchHistory, SearchRoot};
pub use proto::Proto;
pub use refs::{ImplicitRef, TermRefSet};
pub use result::{CyclicError, SearchFailure, SearchFailureKind, SearchResult, SearchSuccess};
pub use scope::{OfTypeImplicits, Run};
pub use search::Searcher;
pub use tree::{ref_tree, Tree, TreeKind};
