//! Dictionary materialization.
//!
//! Recursive by-name implicit instances are constructed through pending
//! dictionary entries during the search. At the outermost completion the
//! surviving entries are materialized as a synthetic class with one lazy
//! field per entry, an instance val is allocated, and every dictionary
//! reference in the result is rewritten to a field selection on that
//! instance.

use crate::context::InferCtx;
use crate::history::SearchRoot;
use crate::result::SearchSuccess;
use crate::tree::{Tree, TreeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use sable_common::Span;
use sable_solver::{SymbolFlags, SymbolId, TypeId};
use tracing::debug;

/// Rewrite a top-level success against the dictionary accumulated in
/// `root`. Passes the result through untouched when the dictionary is
/// empty or nothing survives pruning.
pub fn emit_dictionary(
    ctx: &InferCtx<'_>,
    root: &SearchRoot,
    result: SearchSuccess,
    span: Span,
) -> SearchSuccess {
    if root.is_empty() {
        return result;
    }

    // Prune: starting from the result tree's identifiers, repeatedly
    // admit entries referenced by already-admitted definitions, to a
    // fixed point.
    let mut referenced = FxHashSet::default();
    result.tree.idents(&mut referenced);
    let mut admitted: FxHashSet<SymbolId> = FxHashSet::default();
    loop {
        let mut changed = false;
        for entry in root.entries() {
            if admitted.contains(&entry.sym) || !referenced.contains(&entry.sym) {
                continue;
            }
            admitted.insert(entry.sym);
            changed = true;
            if let Some(rhs) = &entry.rhs {
                rhs.idents(&mut referenced);
            }
        }
        if !changed {
            break;
        }
    }
    if admitted.is_empty() {
        return result;
    }

    let oracle = ctx.oracle;
    let class_sym = oracle.fresh_sym(
        "LazyImplicits",
        SymbolId::NONE,
        SymbolFlags::CLASS,
        TypeId::NONE,
    );
    let class_ty = oracle.named(class_sym);
    oracle
        .symbols
        .add_parent(class_sym, oracle.named(oracle.builtins.serializable));
    let parents = vec![TypeId::ANY_REF, oracle.named(oracle.builtins.serializable)];
    let inst_sym = oracle.fresh_sym("$dict", SymbolId::NONE, SymbolFlags::SYNTHETIC, class_ty);

    // Every dictionary Ident becomes a selection on the instance.
    let mut subst: FxHashMap<SymbolId, Tree> = FxHashMap::default();
    for entry in root.entries() {
        if admitted.contains(&entry.sym) {
            let select = Tree::select(
                Tree::ident(inst_sym, class_ty, span),
                entry.sym,
                entry.tpe,
                span,
            );
            subst.insert(entry.sym, select);
        }
    }

    let mut fields = Vec::new();
    for entry in root.entries() {
        if !admitted.contains(&entry.sym) {
            continue;
        }
        oracle.symbols.add_decl(class_sym, entry.sym);
        // Entries are filled by the time the top-level search completes;
        // a pending entry can only be unreferenced, hence pruned.
        let rhs = entry
            .rhs
            .as_ref()
            .expect("referenced dictionary entry must be defined")
            .subst_idents(&subst);
        fields.push(Tree::val_def(entry.sym, rhs, span));
    }

    debug!(
        fields = fields.len(),
        pruned = root.entries().len() - fields.len(),
        "emitting implicit dictionary"
    );

    let class_def = Tree {
        kind: TreeKind::ClassDef {
            sym: class_sym,
            parents,
            fields,
        },
        tpe: TypeId::NONE,
        span,
    };
    let inst_val = Tree::val_def(inst_sym, Tree::new_instance(class_ty, span), span);
    let rewritten = result.tree.subst_idents(&subst);
    let block = Tree::block(vec![class_def, inst_val], rewritten, span);

    SearchSuccess {
        tree: block,
        ..result
    }
}
