//! Name interning.
//!
//! Identifiers are deduplicated into `Atom` handles so that name equality
//! is an integer comparison and names can be used as map keys everywhere
//! (shadowing checks, eligibility caches, symbol tables).

use rustc_hash::FxHashMap;
use serde::Serialize;

/// A lightweight handle to an interned name.
/// Equality check is O(1) - just compare the u32 values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty name. Interning `""` always yields this handle.
    pub const NONE: Atom = Atom(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Reserved prefix for synthesized implicit-dictionary entries.
///
/// Names of this shape never originate from source; the contextual-implicits
/// level rule and the shadowing probe both rely on being able to recognize
/// them.
pub const LAZY_IMPLICIT_PREFIX: &str = "$lazy_implicit$";

/// Whether `name` follows the lazy-implicit-dictionary naming scheme.
pub fn is_lazy_implicit_name(name: &str) -> bool {
    name.starts_with(LAZY_IMPLICIT_PREFIX)
}

/// Interning table mapping names to `Atom` handles.
///
/// Single-threaded; each compilation run owns one.
pub struct Interner {
    map: FxHashMap<Box<str>, Atom>,
    names: Vec<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        let mut interner = Interner {
            map: FxHashMap::default(),
            names: Vec::new(),
        };
        // Slot 0 is the empty name so Atom::NONE resolves to "".
        let empty: Box<str> = "".into();
        interner.map.insert(empty.clone(), Atom::NONE);
        interner.names.push(empty);
        interner
    }

    /// Intern a name, returning its stable handle.
    pub fn intern(&mut self, name: &str) -> Atom {
        if let Some(&atom) = self.map.get(name) {
            return atom;
        }
        let atom = Atom(self.names.len() as u32);
        let boxed: Box<str> = name.into();
        self.names.push(boxed.clone());
        self.map.insert(boxed, atom);
        atom
    }

    /// Resolve a handle back to its name.
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.names[atom.0 as usize]
    }

    /// Pre-intern names the engine tests against on hot paths.
    pub fn intern_common(&mut self) {
        for name in ["apply", "unapply", "Conversion", LAZY_IMPLICIT_PREFIX] {
            self.intern(name);
        }
    }

    /// Allocate a fresh dictionary-entry name (`$lazy_implicit$<n>`).
    pub fn fresh_lazy_implicit(&mut self, n: u32) -> Atom {
        self.intern(&format!("{LAZY_IMPLICIT_PREFIX}{n}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        // Slot 0 is always present.
        self.names.len() <= 1
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_basic() {
        let mut interner = Interner::new();
        let a1 = interner.intern("hello");
        let a2 = interner.intern("hello");
        let a3 = interner.intern("world");

        assert_eq!(a1, a2, "Same string should return same atom");
        assert_ne!(a1, a3, "Different strings should return different atoms");
        assert_eq!(interner.resolve(a1), "hello");
        assert_eq!(interner.resolve(a3), "world");
    }

    #[test]
    fn empty_string() {
        let mut interner = Interner::new();
        let empty = interner.intern("");
        assert_eq!(empty, Atom::NONE);
        assert!(empty.is_none());
        assert_eq!(interner.resolve(empty), "");
    }

    #[test]
    fn lazy_implicit_names() {
        let mut interner = Interner::new();
        let a = interner.fresh_lazy_implicit(0);
        let b = interner.fresh_lazy_implicit(1);
        assert_ne!(a, b);
        assert!(is_lazy_implicit_name(interner.resolve(a)));
        assert!(!is_lazy_implicit_name("show"));
    }

    #[test]
    fn atom_copy() {
        let mut interner = Interner::new();
        let a1 = interner.intern("test");
        let a2 = a1; // Copy
        assert_eq!(a1, a2);
    }
}
