//! Expected-type prototypes.
//!
//! A search target is a prototype, not just a type: a plain expected
//! value type, a view shape `arg => res` when a conversion is wanted, or
//! a selection shape demanding a member with a given name.

use sable_common::Atom;
use sable_solver::{Oracle, SymbolFlags, TypeId, TypeKey, TyperState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Proto {
    /// An expected value type; may be a by-name type for lazy implicit
    /// parameters.
    Value(TypeId),
    /// A conversion shape: from `arg` to whatever `res` expects.
    View { arg: TypeId, res: Box<Proto> },
    /// A member-demanding shape: the target must have a member `name`
    /// whose type conforms to `mbr`.
    Selection {
        name: Atom,
        mbr: TypeId,
        private_ok: bool,
    },
}

impl Proto {
    pub fn view(arg: TypeId, res: Proto) -> Proto {
        Proto::View {
            arg,
            res: Box::new(res),
        }
    }

    /// The type this prototype normalizes to for compatibility tests,
    /// scope derivation, and history frames.
    pub fn as_type(&self, oracle: &Oracle) -> TypeId {
        match self {
            Proto::Value(t) => *t,
            Proto::View { arg, res } => oracle.func(vec![*arg], res.as_type(oracle)),
            Proto::Selection { mbr, .. } => *mbr,
        }
    }

    /// The type the dictionary and recursion machinery key on: the
    /// prototype's type with by-name stripped.
    pub fn widened(&self, oracle: &Oracle, state: &TyperState) -> TypeId {
        oracle.strip_byname(self.as_type(oracle), state)
    }

    pub fn is_byname(&self, oracle: &Oracle, state: &TyperState) -> bool {
        match self {
            Proto::Value(t) => oracle.is_byname(*t, state),
            _ => false,
        }
    }

    /// For a `Not[T]` expectation, the inner type `T`.
    pub fn not_argument(&self, oracle: &Oracle, state: &TyperState) -> Option<TypeId> {
        let Proto::Value(t) = self else { return None };
        let t = oracle.dealias(oracle.strip_byname(*t, state), state);
        if let TypeKey::Applied { tycon, args } = oracle.key(t) {
            let head = oracle.dealias(oracle.resolve(tycon, state), state);
            if let TypeKey::Named { sym, .. } = oracle.key(head) {
                if oracle.symbols.is(sym, SymbolFlags::NOT_WITNESS) {
                    return oracle.types.type_list_of(args).first().copied();
                }
            }
        }
        None
    }

    /// Whether searches at this prototype are coherent: any success is as
    /// good as any other, so the first one is returned without pairwise
    /// disambiguation.
    pub fn is_coherent(&self, oracle: &Oracle, state: &TyperState) -> bool {
        let Proto::Value(t) = self else { return false };
        let t = oracle.dealias(oracle.strip_byname(*t, state), state);
        let head = match oracle.key(t) {
            TypeKey::Applied { tycon, .. } => oracle.dealias(oracle.resolve(tycon, state), state),
            _ => t,
        };
        match oracle.key(head) {
            TypeKey::Named { sym, .. } => oracle.symbols.is(sym, SymbolFlags::COHERENT),
            _ => false,
        }
    }

    /// Cache key for eligibility lists. Only value and view prototypes
    /// whose types are fully determined are cacheable; selection
    /// prototypes are recomputed. The key is normalized: a type reached
    /// through bound inference variables must coincide with its
    /// instantiation, and the binding must be baked in before the key
    /// outlives the trial state it came from.
    pub fn cache_key(&self, oracle: &Oracle, state: &TyperState) -> Option<TypeId> {
        match self {
            Proto::Value(_) | Proto::View { .. } => {
                let t = self.as_type(oracle);
                oracle
                    .is_cacheable(t, state)
                    .then(|| oracle.normalize(t, state))
            }
            Proto::Selection { .. } => None,
        }
    }
}
