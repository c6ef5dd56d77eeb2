//! Type representation for the sable type oracle.
//!
//! Types are represented as lightweight `TypeId` handles that point into
//! an interning table. The actual structure is stored in `TypeKey`.
//! Interning gives O(1) type equality and identity-stable handles, which
//! the per-run caches of the implicit engine key on.

use sable_common::Atom;
use serde::Serialize;

/// A lightweight handle to an interned type.
/// Equality check is O(1) - just compare the u32 values.
///
/// # Sentinel Value Semantics
///
/// `TypeId::NONE` is the absent type: a missing prefix, an unfilled slot.
/// It is not a type and never participates in subtyping.
///
/// `TypeId::ERROR` is contagious: it is produced when resolution fails
/// (most prominently on cyclic alias chains) and every operation on it
/// yields ERROR again. The implicit engine translates an ERROR-typed
/// reference into a cyclic-reference condition rather than a search
/// failure, so a single root cause does not cascade into spurious
/// `NoMatching` diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Internal placeholder - no valid type.
    pub const NONE: TypeId = TypeId(0);

    /// Error sentinel - type resolution failed (e.g. cyclic alias).
    pub const ERROR: TypeId = TypeId(1);

    /// The bottom type. Subtype of every type.
    pub const NOTHING: TypeId = TypeId(2);

    /// The top type.
    pub const ANY: TypeId = TypeId(3);

    /// The top reference type. Every class derives from it.
    pub const ANY_REF: TypeId = TypeId(4);

    /// The unit type.
    pub const UNIT: TypeId = TypeId(5);

    /// The null type. Subtype of every reference type.
    pub const NULL: TypeId = TypeId(6);

    pub const INT: TypeId = TypeId(7);
    pub const STRING: TypeId = TypeId(8);
    pub const BOOLEAN: TypeId = TypeId(9);
    pub const CHAR: TypeId = TypeId(10);

    /// First user-defined type ID (after built-in intrinsics)
    pub const FIRST_USER: u32 = 16;

    pub fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_USER
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_error(self) -> bool {
        self == Self::ERROR
    }

    pub fn exists(self) -> bool {
        !self.is_none()
    }
}

/// A lightweight handle to a symbol in the symbol table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// The absent symbol.
    pub const NONE: SymbolId = SymbolId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn exists(self) -> bool {
        !self.is_none()
    }
}

/// An inference variable identifier. Bindings live in `TyperState`,
/// not in the interner, so that trials can fork and roll back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TypeVarId(pub u32);

/// Interned list of TypeId values (type arguments, parameter lists).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeListId(pub u32);

/// Interned list of SymbolId values (type parameter lists).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymListId(pub u32);

/// Built-in types with fixed `TypeId` slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    None,
    Error,
    Nothing,
    Any,
    AnyRef,
    Unit,
    Null,
    Int,
    String,
    Boolean,
    Char,
}

impl IntrinsicKind {
    /// Whether values of this type are reference values (`Null` conforms).
    pub fn is_reference(self) -> bool {
        matches!(self, IntrinsicKind::AnyRef | IntrinsicKind::String)
    }
}

/// The structure of a type. `TypeKey` is the interning key: two
/// structurally identical keys always map to the same `TypeId`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Intrinsic(IntrinsicKind),
    /// Reference to a type symbol: class, trait, alias, opaque alias, or
    /// type parameter. `prefix` is `TypeId::NONE` for a root reference.
    Named { prefix: TypeId, sym: SymbolId },
    /// Singleton type of a stable term (`x.type`).
    TermRef { prefix: TypeId, sym: SymbolId },
    /// Type application `tycon[args...]`.
    Applied { tycon: TypeId, args: TypeListId },
    /// Method type `(T1, ..., Tn)R`. `implicit` marks an implicit
    /// parameter list.
    Method {
        params: TypeListId,
        result: TypeId,
        implicit: bool,
    },
    /// Polymorphic method `[p1, ..., pn]R` over type-parameter symbols.
    Poly { params: SymListId, result: TypeId },
    /// Function type `(T1, ..., Tn) => R`.
    Func { params: TypeListId, result: TypeId },
    /// By-name parameter type `=> T`.
    ByName(TypeId),
    /// An inference variable.
    Var(TypeVarId),
    /// Type bounds `>: lo <: hi`; also the shape of wildcard
    /// approximations.
    Bounds { lo: TypeId, hi: TypeId },
    /// Conjunction `left & right`.
    And { left: TypeId, right: TypeId },
    /// Type lambda `[p1, ..., pn] =>> R`.
    Lambda { params: SymListId, result: TypeId },
}

/// A term reference: a stable path to a term symbol.
///
/// Equality of raw `TermRef` values is structural; *semantic* equality
/// (equal symbol, type-equivalent prefixes) is what `TermRefSet` in the
/// implicit engine deduplicates by, via `Oracle::same_type` on prefixes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TermRef {
    /// Prefix type, or `TypeId::NONE` for a local or root reference.
    pub prefix: TypeId,
    pub sym: SymbolId,
}

impl TermRef {
    pub fn new(prefix: TypeId, sym: SymbolId) -> Self {
        TermRef { prefix, sym }
    }

    pub fn root(sym: SymbolId) -> Self {
        TermRef {
            prefix: TypeId::NONE,
            sym,
        }
    }
}

/// Variance of a type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

bitflags::bitflags! {
    /// Symbol properties the oracle and the implicit engine test.
    #[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct SymbolFlags: u32 {
        const CLASS            = 1 << 0;
        /// Module (object) value. Its members form companion scopes.
        const MODULE           = 1 << 1;
        const METHOD           = 1 << 2;
        const IMPLICIT         = 1 << 3;
        /// Type alias; dealiasing follows its info.
        const ALIAS            = 1 << 4;
        /// Opaque alias; not dealiased, but contributes its own companion.
        const OPAQUE           = 1 << 5;
        const PRIVATE          = 1 << 6;
        /// Extension method holder member.
        const EXTENSION        = 1 << 7;
        const TYPE_PARAM       = 1 << 8;
        /// Searches for this class's instances are coherent: the first
        /// success wins without pairwise disambiguation.
        const COHERENT         = 1 << 9;
        /// The negation class `Not[_]`.
        const NOT_WITNESS      = 1 << 10;
        /// The `Conversion` base class.
        const CONVERSION_CLASS = 1 << 11;
        /// The subtype-witness class (`<:<`).
        const SUBTYPE_WITNESS  = 1 << 12;
        /// The identity-conforming witness class (`=:=`); excluded from
        /// conversion classification.
        const IDENTITY_WITNESS = 1 << 13;
        /// Lazily initialized value (dictionary fields).
        const LAZY             = 1 << 14;
        /// Compiler-synthesized symbol.
        const SYNTHETIC        = 1 << 15;
    }
}

/// A symbol table entry.
#[derive(Clone, Debug)]
pub struct SymbolData {
    pub name: Atom,
    pub owner: SymbolId,
    pub flags: SymbolFlags,
    /// For terms: their type. For aliases: the aliased type.
    /// For type parameters: their bounds.
    pub info: TypeId,
    pub companion: SymbolId,
    pub parents: smallvec::SmallVec<[TypeId; 4]>,
    pub type_params: smallvec::SmallVec<[SymbolId; 4]>,
    pub decls: Vec<SymbolId>,
    /// Only meaningful on TYPE_PARAM symbols.
    pub variance: Variance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_ids_are_intrinsic() {
        assert!(TypeId::NONE.is_intrinsic());
        assert!(TypeId::ERROR.is_intrinsic());
        assert!(TypeId::ANY.is_intrinsic());
        assert!(!TypeId(TypeId::FIRST_USER).is_intrinsic());
    }

    #[test]
    fn symbol_flags_compose() {
        let f = SymbolFlags::METHOD | SymbolFlags::IMPLICIT;
        assert!(f.contains(SymbolFlags::METHOD));
        assert!(f.contains(SymbolFlags::IMPLICIT));
        assert!(!f.contains(SymbolFlags::CLASS));
    }

    #[test]
    fn term_ref_root_has_no_prefix() {
        let r = TermRef::root(SymbolId(3));
        assert!(r.prefix.is_none());
        assert_eq!(r.sym, SymbolId(3));
    }
}
