//! Type oracle for the sable compiler.
//!
//! This crate provides the structural type system the implicit engine
//! queries:
//! - `TypeInterner` - interned type storage
//! - `SymbolTable` - symbols with owners, companions, and members
//! - `TypeComparer` - subtype checking and unification
//! - `TyperState` - forkable inference-variable constraints
//! - `Oracle` - the facade tying them together

pub mod intern;
pub mod measure;
pub mod normalize;
pub mod oracle;
pub mod state;
pub mod subtype;
pub mod symbols;
pub mod types;

mod format;

pub use intern::TypeInterner;
pub use oracle::{Builtins, Oracle};
pub use state::TyperState;
pub use subtype::TypeComparer;
pub use symbols::SymbolTable;
pub use types::{
    IntrinsicKind, SymListId, SymbolData, SymbolFlags, SymbolId, TermRef, TypeId, TypeKey,
    TypeListId, TypeVarId, Variance,
};
