//! Shared base layer for the sable compiler.
//!
//! This crate holds the types every phase needs without creating circular
//! dependencies:
//!
//! ```text
//! sable-common (base layer)
//!   ↓
//! sable-solver → sable-infer
//! ```
//!
//! No crate in the chain may depend on one that appears later.

pub mod interner;
pub mod options;
pub mod span;

pub use interner::{Atom, Interner};
pub use options::InferOptions;
pub use span::Span;
