//! Human-readable type display for logs and test assertions.

use crate::oracle::Oracle;
use crate::state::TyperState;
use crate::types::{IntrinsicKind, TypeId, TypeKey};

impl Oracle {
    /// Render a type for diagnostics. Unbound inference variables print
    /// as `?N`.
    pub fn show_type(&self, t: TypeId, state: &TyperState) -> String {
        let mut out = String::new();
        self.show_rec(t, state, &mut out, 0);
        out
    }

    fn show_rec(&self, t: TypeId, state: &TyperState, out: &mut String, depth: u32) {
        use std::fmt::Write;
        if depth > 32 {
            out.push_str("...");
            return;
        }
        let t = self.resolve(t, state);
        match self.key(t) {
            TypeKey::Intrinsic(kind) => {
                let s = match kind {
                    IntrinsicKind::None => "<none>",
                    IntrinsicKind::Error => "<error>",
                    IntrinsicKind::Nothing => "Nothing",
                    IntrinsicKind::Any => "Any",
                    IntrinsicKind::AnyRef => "AnyRef",
                    IntrinsicKind::Unit => "Unit",
                    IntrinsicKind::Null => "Null",
                    IntrinsicKind::Int => "Int",
                    IntrinsicKind::String => "String",
                    IntrinsicKind::Boolean => "Boolean",
                    IntrinsicKind::Char => "Char",
                };
                out.push_str(s);
            }
            TypeKey::Named { prefix, sym } | TypeKey::TermRef { prefix, sym } => {
                if prefix.exists() {
                    self.show_rec(prefix, state, out, depth + 1);
                    out.push('.');
                }
                out.push_str(&self.name_str(self.symbols.name(sym)));
                if matches!(self.key(t), TypeKey::TermRef { .. }) {
                    out.push_str(".type");
                }
            }
            TypeKey::Applied { tycon, args } => {
                self.show_rec(tycon, state, out, depth + 1);
                out.push('[');
                for (i, &a) in self.types.type_list_of(args).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.show_rec(a, state, out, depth + 1);
                }
                out.push(']');
            }
            TypeKey::Func { params, result } => {
                out.push('(');
                for (i, &p) in self.types.type_list_of(params).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.show_rec(p, state, out, depth + 1);
                }
                out.push_str(") => ");
                self.show_rec(result, state, out, depth + 1);
            }
            TypeKey::Method {
                params,
                result,
                implicit,
            } => {
                out.push('(');
                if implicit {
                    out.push_str("using ");
                }
                for (i, &p) in self.types.type_list_of(params).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.show_rec(p, state, out, depth + 1);
                }
                out.push(')');
                self.show_rec(result, state, out, depth + 1);
            }
            TypeKey::Poly { params, result } => {
                out.push('[');
                for (i, &p) in self.types.sym_list_of(params).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.name_str(self.symbols.name(p)));
                }
                out.push(']');
                self.show_rec(result, state, out, depth + 1);
            }
            TypeKey::Lambda { params, result } => {
                out.push('[');
                for (i, &p) in self.types.sym_list_of(params).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.name_str(self.symbols.name(p)));
                }
                out.push_str("] =>> ");
                self.show_rec(result, state, out, depth + 1);
            }
            TypeKey::ByName(inner) => {
                out.push_str("=> ");
                self.show_rec(inner, state, out, depth + 1);
            }
            TypeKey::Var(v) => {
                let _ = write!(out, "?{}", v.0);
            }
            TypeKey::Bounds { lo, hi } => {
                if lo == TypeId::NOTHING && hi == TypeId::ANY {
                    out.push('?');
                } else {
                    out.push_str(">: ");
                    self.show_rec(lo, state, out, depth + 1);
                    out.push_str(" <: ");
                    self.show_rec(hi, state, out, depth + 1);
                }
            }
            TypeKey::And { left, right } => {
                self.show_rec(left, state, out, depth + 1);
                out.push_str(" & ");
                self.show_rec(right, state, out, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SymbolFlags, SymbolId};

    #[test]
    fn shows_applied_types() {
        let oracle = Oracle::new();
        let state = TyperState::new();
        let list = oracle.symbols.alloc(
            oracle.intern_name("List"),
            SymbolId::NONE,
            SymbolFlags::CLASS,
            TypeId::NONE,
        );
        let t = oracle.applied(oracle.named(list), vec![TypeId::INT]);
        assert_eq!(oracle.show_type(t, &state), "List[Int]");
        assert_eq!(
            oracle.show_type(oracle.by_name(t), &state),
            "=> List[Int]"
        );
        assert_eq!(oracle.show_type(oracle.wildcard(), &state), "?");
    }
}
