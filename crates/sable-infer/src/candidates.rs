//! Candidate classification and eligibility filtering.
//!
//! Every reference in scope is classified against the target prototype as
//! a value, a conversion, an extension provider, or none of those. The
//! classification runs under the frozen comparator so it never binds the
//! caller's inference variables; the real trial does the precise check.

use crate::proto::Proto;
use crate::refs::ImplicitRef;
use rustc_hash::FxHashMap;
use sable_common::InferOptions;
use sable_solver::{Oracle, SymbolFlags, TermRef, TypeId, TypeKey, TyperState};
use tracing::trace;

bitflags::bitflags! {
    /// How a reference may satisfy a prototype. Dispatch is by mask
    /// tests; an empty mask means the reference is not a candidate.
    #[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct CandKind: u8 {
        const VALUE      = 1 << 0;
        const CONVERSION = 1 << 1;
        const EXTENSION  = 1 << 2;
    }
}

/// An eligible implicit reference with its classification and the
/// nesting level of the scope that contributed it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub imp: ImplicitRef,
    pub kind: CandKind,
    pub level: u32,
}

impl Candidate {
    pub fn term(&self) -> TermRef {
        self.imp.term
    }

    pub fn is_conversion(&self) -> bool {
        self.kind.contains(CandKind::CONVERSION)
    }

    pub fn is_extension(&self) -> bool {
        self.kind.contains(CandKind::EXTENSION)
    }
}

/// Classify each reference against `pt`, keeping those with a non-empty
/// kind. The result preserves input order.
pub fn filter_matching(
    oracle: &Oracle,
    refs: &[ImplicitRef],
    pt: &Proto,
    level: u32,
    state: &TyperState,
    options: &InferOptions,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for &imp in refs {
        let kind = candidate_kind(oracle, imp.term, pt, state, options);
        if !kind.is_empty() {
            out.push(Candidate { imp, kind, level });
        }
    }
    trace!(eligible = out.len(), total = refs.len(), "filter_matching");
    out
}

/// Classification of a single reference against a prototype.
pub fn candidate_kind(
    oracle: &Oracle,
    r: TermRef,
    pt: &Proto,
    state: &TyperState,
    options: &InferOptions,
) -> CandKind {
    if !oracle.accessible(r.sym, r.prefix) {
        return CandKind::empty();
    }
    let info = oracle.symbols.info(r.sym);
    if info.is_none() {
        return CandKind::empty();
    }
    let kind = match pt {
        Proto::View { arg, res } => conversion_kind(oracle, info, *arg, res, state, options),
        Proto::Value(t) => value_kind(oracle, info, *t, state),
        Proto::Selection { .. } => CandKind::VALUE,
    };
    if kind.is_empty() {
        return kind;
    }
    if compatible(oracle, info, pt, state) {
        kind
    } else {
        // An incompatible reference can still provide an extension
        // method: the selection lookup already vouched for it.
        kind & CandKind::EXTENSION
    }
}

fn conversion_kind(
    oracle: &Oracle,
    info: TypeId,
    arg: TypeId,
    res: &Proto,
    state: &TyperState,
    options: &InferOptions,
) -> CandKind {
    let info = oracle.dealias(oracle.resolve(info, state), state);
    match oracle.key(info) {
        TypeKey::Method {
            params,
            implicit: false,
            ..
        } => {
            let params = oracle.types.type_list_of(params);
            if params.len() == 1 {
                let formal = oracle.wildcard_approx(params[0], state);
                let actual = oracle.widen(arg, state);
                if oracle.subtype_frozen(actual, formal, state) {
                    CandKind::CONVERSION
                } else {
                    CandKind::empty()
                }
            } else {
                CandKind::empty()
            }
        }
        TypeKey::Method { implicit: true, .. } => CandKind::empty(),
        TypeKey::Poly { params, result } => {
            // Probe the result with the parameters approximated away.
            let syms = oracle.types.sym_list_of(params);
            let map: FxHashMap<_, _> = syms.iter().map(|&s| (s, oracle.wildcard())).collect();
            let approx = oracle.subst(result, &map);
            conversion_kind(oracle, approx, arg, res, state, options)
        }
        TypeKey::TermRef { .. } => {
            // Overloaded reference; cannot discard either possibility.
            CandKind::CONVERSION | CandKind::EXTENSION
        }
        _ => {
            let wt = oracle.dealias(oracle.widen(info, state), state);
            let mut kind = CandKind::empty();
            let conversion_value = oracle.derives_from(wt, oracle.builtins.conversion, state)
                || (oracle.derives_from(wt, oracle.builtins.subtype_witness, state)
                    && !oracle.derives_from(wt, oracle.builtins.identity_witness, state))
                || (options.legacy_conversions && is_unary_function(oracle, wt, state));
            if conversion_value {
                kind |= CandKind::CONVERSION;
            }
            if let Proto::Selection { name, .. } = res {
                if let Some((msym, _)) = oracle.member(wt, *name, false, state) {
                    if oracle.symbols.is(msym, SymbolFlags::EXTENSION) {
                        kind |= CandKind::EXTENSION;
                    }
                }
            }
            kind
        }
    }
}

/// The `From => To` shape of a value deriving the conversion or
/// subtype-witness classes.
fn conversion_signature(oracle: &Oracle, t: TypeId, state: &TyperState) -> Option<TypeId> {
    let base = oracle
        .base_type(t, oracle.builtins.conversion, state)
        .or_else(|| oracle.base_type(t, oracle.builtins.subtype_witness, state))?;
    match oracle.key(base) {
        TypeKey::Applied { args, .. } => {
            let args = oracle.types.type_list_of(args);
            if args.len() == 2 {
                Some(oracle.func(vec![args[0]], args[1]))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_unary_function(oracle: &Oracle, t: TypeId, state: &TyperState) -> bool {
    match oracle.key(oracle.dealias(oracle.resolve(t, state), state)) {
        TypeKey::Func { params, .. } => oracle.types.type_list_of(params).len() == 1,
        _ => false,
    }
}

fn value_kind(oracle: &Oracle, info: TypeId, pt_ty: TypeId, state: &TyperState) -> CandKind {
    // Peel polymorphic layers; classification looks at the underlying
    // parameter structure.
    let mut cur = oracle.dealias(oracle.resolve(info, state), state);
    loop {
        match oracle.key(cur) {
            TypeKey::Poly { result, .. } => {
                cur = oracle.dealias(oracle.resolve(result, state), state)
            }
            TypeKey::Method { implicit: true, .. } => return CandKind::VALUE,
            TypeKey::Method {
                implicit: false, ..
            } => {
                // A plain method only yields a value when the expectation
                // is itself function-typed (eta-expansion).
                let target = oracle.dealias(oracle.strip_byname(pt_ty, state), state);
                return if matches!(oracle.key(target), TypeKey::Func { .. }) {
                    CandKind::VALUE
                } else {
                    CandKind::empty()
                };
            }
            _ => return CandKind::VALUE,
        }
    }
}

/// The compatibility test: `ref.normalized <:< pt.normalized` under the
/// no-views comparator, with singleton parameters widened for view
/// prototypes.
fn compatible(oracle: &Oracle, info: TypeId, pt: &Proto, state: &TyperState) -> bool {
    if let Proto::Selection {
        name,
        mbr,
        private_ok,
    } = pt
    {
        return match oracle.member(oracle.widen(info, state), *name, *private_ok, state) {
            Some((_, mtype)) => {
                *mbr == TypeId::ANY || oracle.subtype_frozen(mtype, *mbr, state)
            }
            None => false,
        };
    }

    let is_view = matches!(pt, Proto::View { .. });
    let pt_ty = oracle.normalize(oracle.strip_byname(pt.as_type(oracle), state), state);
    let mut ref_ty = info;
    if is_view {
        ref_ty = widen_singleton_params(oracle, ref_ty, state);
    }
    let peeled = peel_for_compat(oracle, ref_ty, state);
    let norm = oracle.normalize(peeled, state);
    if is_view {
        // A conversion value compares through its conversion signature.
        if let Some(as_fn) = conversion_signature(oracle, norm, state) {
            return oracle.subtype_frozen(as_fn, pt_ty, state);
        }
    }
    oracle.subtype_frozen(norm, pt_ty, state)
}

/// Approximate away polymorphism and implicit parameter lists so the
/// underlying shape can be compared against the prototype.
fn peel_for_compat(oracle: &Oracle, info: TypeId, state: &TyperState) -> TypeId {
    let mut cur = oracle.dealias(oracle.resolve(info, state), state);
    loop {
        match oracle.key(cur) {
            TypeKey::Poly { params, result } => {
                let syms = oracle.types.sym_list_of(params);
                let map: FxHashMap<_, _> =
                    syms.iter().map(|&s| (s, oracle.wildcard())).collect();
                cur = oracle.dealias(oracle.subst(result, &map), state);
            }
            TypeKey::Method {
                result,
                implicit: true,
                ..
            } => cur = oracle.dealias(oracle.resolve(result, state), state),
            _ => return cur,
        }
    }
}

fn widen_singleton_params(oracle: &Oracle, info: TypeId, state: &TyperState) -> TypeId {
    match oracle.key(info) {
        TypeKey::Method {
            params,
            result,
            implicit,
        } => {
            let ps: Vec<TypeId> = oracle
                .types
                .type_list_of(params)
                .iter()
                .map(|&p| oracle.widen_singleton(p, state))
                .collect();
            oracle.method(ps, result, implicit)
        }
        TypeKey::Poly { params, result } => {
            let syms = oracle.types.sym_list_of(params);
            oracle.poly(syms.to_vec(), widen_singleton_params(oracle, result, state))
        }
        _ => info,
    }
}
