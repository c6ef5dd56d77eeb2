//! Typed trees the implicit engine synthesizes.
//!
//! The engine produces terms, not syntax: every node carries its type.
//! Only the shapes the search and the dictionary builder need are
//! represented - references, applications, and the definition forms the
//! dictionary emit wraps results in.

use rustc_hash::{FxHashMap, FxHashSet};
use sable_common::Span;
use sable_solver::{Oracle, SymbolId, TermRef, TypeId, TypeKey};

#[derive(Clone, Debug, PartialEq)]
pub enum TreeKind {
    Ident(SymbolId),
    Select { qual: Box<Tree>, sym: SymbolId },
    /// A `super` selection qualifier. Never synthesized by the engine,
    /// but the view gate must recognize it.
    Super { mix: SymbolId },
    Apply { fun: Box<Tree>, args: Vec<Tree> },
    TypeApply { fun: Box<Tree>, args: Vec<TypeId> },
    New,
    ValDef { sym: SymbolId, rhs: Box<Tree> },
    ClassDef {
        sym: SymbolId,
        parents: Vec<TypeId>,
        fields: Vec<Tree>,
    },
    Block { stats: Vec<Tree>, expr: Box<Tree> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    pub kind: TreeKind,
    pub tpe: TypeId,
    pub span: Span,
}

impl Tree {
    pub fn ident(sym: SymbolId, tpe: TypeId, span: Span) -> Tree {
        Tree {
            kind: TreeKind::Ident(sym),
            tpe,
            span,
        }
    }

    pub fn select(qual: Tree, sym: SymbolId, tpe: TypeId, span: Span) -> Tree {
        Tree {
            kind: TreeKind::Select {
                qual: Box::new(qual),
                sym,
            },
            tpe,
            span,
        }
    }

    pub fn apply(fun: Tree, args: Vec<Tree>, tpe: TypeId, span: Span) -> Tree {
        Tree {
            kind: TreeKind::Apply {
                fun: Box::new(fun),
                args,
            },
            tpe,
            span,
        }
    }

    pub fn type_apply(fun: Tree, args: Vec<TypeId>, tpe: TypeId, span: Span) -> Tree {
        Tree {
            kind: TreeKind::TypeApply {
                fun: Box::new(fun),
                args,
            },
            tpe,
            span,
        }
    }

    pub fn new_instance(tpe: TypeId, span: Span) -> Tree {
        Tree {
            kind: TreeKind::New,
            tpe,
            span,
        }
    }

    pub fn val_def(sym: SymbolId, rhs: Tree, span: Span) -> Tree {
        Tree {
            kind: TreeKind::ValDef {
                sym,
                rhs: Box::new(rhs),
            },
            tpe: TypeId::NONE,
            span,
        }
    }

    pub fn block(stats: Vec<Tree>, expr: Tree, span: Span) -> Tree {
        let tpe = expr.tpe;
        Tree {
            kind: TreeKind::Block {
                stats,
                expr: Box::new(expr),
            },
            tpe,
            span,
        }
    }

    pub fn is_super(&self) -> bool {
        match &self.kind {
            TreeKind::Super { .. } => true,
            TreeKind::Select { qual, .. } => qual.is_super(),
            _ => false,
        }
    }

    /// Node count; failure reporting keeps the largest failed tree as the
    /// best diagnostic.
    pub fn size(&self) -> u32 {
        match &self.kind {
            TreeKind::Ident(_) | TreeKind::Super { .. } | TreeKind::New => 1,
            TreeKind::Select { qual, .. } => 1 + qual.size(),
            TreeKind::Apply { fun, args } => {
                1 + fun.size() + args.iter().map(Tree::size).sum::<u32>()
            }
            TreeKind::TypeApply { fun, .. } => 1 + fun.size(),
            TreeKind::ValDef { rhs, .. } => 1 + rhs.size(),
            TreeKind::ClassDef { fields, .. } => {
                1 + fields.iter().map(Tree::size).sum::<u32>()
            }
            TreeKind::Block { stats, expr } => {
                1 + expr.size() + stats.iter().map(Tree::size).sum::<u32>()
            }
        }
    }

    /// Collect the symbols of every `Ident` in this tree.
    pub fn idents(&self, out: &mut FxHashSet<SymbolId>) {
        match &self.kind {
            TreeKind::Ident(sym) => {
                out.insert(*sym);
            }
            TreeKind::Super { .. } | TreeKind::New => {}
            TreeKind::Select { qual, .. } => qual.idents(out),
            TreeKind::Apply { fun, args } => {
                fun.idents(out);
                for a in args {
                    a.idents(out);
                }
            }
            TreeKind::TypeApply { fun, .. } => fun.idents(out),
            TreeKind::ValDef { rhs, .. } => rhs.idents(out),
            TreeKind::ClassDef { fields, .. } => {
                for f in fields {
                    f.idents(out);
                }
            }
            TreeKind::Block { stats, expr } => {
                for s in stats {
                    s.idents(out);
                }
                expr.idents(out);
            }
        }
    }

    /// Rewrite `Ident` nodes through a substitution map. The dictionary
    /// builder uses this to redirect entry references to field
    /// selections.
    pub fn subst_idents(&self, map: &FxHashMap<SymbolId, Tree>) -> Tree {
        match &self.kind {
            TreeKind::Ident(sym) => match map.get(sym) {
                Some(to) => to.clone(),
                None => self.clone(),
            },
            TreeKind::Super { .. } | TreeKind::New => self.clone(),
            TreeKind::Select { qual, sym } => Tree {
                kind: TreeKind::Select {
                    qual: Box::new(qual.subst_idents(map)),
                    sym: *sym,
                },
                tpe: self.tpe,
                span: self.span,
            },
            TreeKind::Apply { fun, args } => Tree {
                kind: TreeKind::Apply {
                    fun: Box::new(fun.subst_idents(map)),
                    args: args.iter().map(|a| a.subst_idents(map)).collect(),
                },
                tpe: self.tpe,
                span: self.span,
            },
            TreeKind::TypeApply { fun, args } => Tree {
                kind: TreeKind::TypeApply {
                    fun: Box::new(fun.subst_idents(map)),
                    args: args.clone(),
                },
                tpe: self.tpe,
                span: self.span,
            },
            TreeKind::ValDef { sym, rhs } => Tree {
                kind: TreeKind::ValDef {
                    sym: *sym,
                    rhs: Box::new(rhs.subst_idents(map)),
                },
                tpe: self.tpe,
                span: self.span,
            },
            TreeKind::ClassDef {
                sym,
                parents,
                fields,
            } => Tree {
                kind: TreeKind::ClassDef {
                    sym: *sym,
                    parents: parents.clone(),
                    fields: fields.iter().map(|f| f.subst_idents(map)).collect(),
                },
                tpe: self.tpe,
                span: self.span,
            },
            TreeKind::Block { stats, expr } => Tree {
                kind: TreeKind::Block {
                    stats: stats.iter().map(|s| s.subst_idents(map)).collect(),
                    expr: Box::new(expr.subst_idents(map)),
                },
                tpe: self.tpe,
                span: self.span,
            },
        }
    }
}

/// Build the reference tree for a term reference: an `Ident` for a root
/// reference, a `Select` chain through the prefix otherwise.
pub fn ref_tree(oracle: &Oracle, r: TermRef, tpe: TypeId, span: Span) -> Tree {
    match prefix_tree(oracle, r.prefix, span) {
        Some(qual) => Tree::select(qual, r.sym, tpe, span),
        None => Tree::ident(r.sym, tpe, span),
    }
}

fn prefix_tree(oracle: &Oracle, prefix: TypeId, span: Span) -> Option<Tree> {
    if prefix.is_none() {
        return None;
    }
    match oracle.key(prefix) {
        TypeKey::TermRef {
            prefix: outer,
            sym,
        } => {
            let tree = match prefix_tree(oracle, outer, span) {
                Some(qual) => Tree::select(qual, sym, prefix, span),
                None => Tree::ident(sym, prefix, span),
            };
            Some(tree)
        }
        _ => None,
    }
}

/// Reserved function names. References through these names never record
/// reference roles for downstream semantic consumers; definitions still
/// do.
pub fn is_reserved_function_name(name: &str) -> bool {
    name == "apply" || name == "unapply"
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_solver::SymbolFlags;

    #[test]
    fn tree_size_counts_nodes() {
        let span = Span::dummy();
        let f = Tree::ident(SymbolId(1), TypeId::NONE, span);
        let arg = Tree::ident(SymbolId(2), TypeId::INT, span);
        let app = Tree::apply(f, vec![arg], TypeId::STRING, span);
        assert_eq!(app.size(), 3);
    }

    #[test]
    fn idents_walks_all_positions() {
        let span = Span::dummy();
        let f = Tree::ident(SymbolId(1), TypeId::NONE, span);
        let arg = Tree::ident(SymbolId(2), TypeId::INT, span);
        let app = Tree::apply(f, vec![arg], TypeId::STRING, span);
        let mut syms = FxHashSet::default();
        app.idents(&mut syms);
        assert!(syms.contains(&SymbolId(1)));
        assert!(syms.contains(&SymbolId(2)));
    }

    #[test]
    fn subst_idents_replaces_mapped_symbols() {
        let span = Span::dummy();
        let original = Tree::ident(SymbolId(1), TypeId::INT, span);
        let replacement = Tree::select(
            Tree::ident(SymbolId(9), TypeId::NONE, span),
            SymbolId(1),
            TypeId::INT,
            span,
        );
        let mut map = FxHashMap::default();
        map.insert(SymbolId(1), replacement.clone());
        assert_eq!(original.subst_idents(&map), replacement);
    }

    #[test]
    fn ref_tree_builds_select_chains() {
        let oracle = Oracle::new();
        let module = oracle.symbols.alloc(
            oracle.intern_name("Show"),
            SymbolId::NONE,
            SymbolFlags::MODULE,
            TypeId::NONE,
        );
        let member = oracle.symbols.alloc(
            oracle.intern_name("intShow"),
            module,
            SymbolFlags::IMPLICIT,
            TypeId::INT,
        );
        let prefix = oracle.term_ref_type(TermRef::root(module));
        let tree = ref_tree(&oracle, TermRef::new(prefix, member), TypeId::INT, Span::dummy());
        match tree.kind {
            TreeKind::Select { ref qual, sym } => {
                assert_eq!(sym, member);
                assert!(matches!(qual.kind, TreeKind::Ident(m) if m == module));
            }
            _ => panic!("expected a selection"),
        }
    }

    #[test]
    fn reserved_function_names() {
        assert!(is_reserved_function_name("apply"));
        assert!(is_reserved_function_name("unapply"));
        assert!(!is_reserved_function_name("map"));
    }
}
