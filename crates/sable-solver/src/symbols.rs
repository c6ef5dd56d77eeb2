//! Symbol table.
//!
//! Symbols are arena-allocated and referenced by `SymbolId`. The table is
//! append-only; entries are patched through the setters while a fixture or
//! frontend builds the world, and read-only during search (apart from the
//! synthetic symbols the dictionary builder allocates).

use crate::types::{SymbolData, SymbolFlags, SymbolId, TypeId, Variance};
use sable_common::Atom;
use smallvec::SmallVec;
use std::cell::RefCell;

/// Arena of symbols. Interior mutability lets the search allocate fresh
/// synthetic symbols (dictionary entries, instance vals) behind a shared
/// reference.
pub struct SymbolTable {
    data: RefCell<Vec<SymbolData>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let table = SymbolTable {
            data: RefCell::new(Vec::new()),
        };
        // Slot 0 is SymbolId::NONE.
        table.data.borrow_mut().push(SymbolData {
            name: Atom::NONE,
            owner: SymbolId::NONE,
            flags: SymbolFlags::empty(),
            info: TypeId::NONE,
            companion: SymbolId::NONE,
            parents: SmallVec::new(),
            type_params: SmallVec::new(),
            decls: Vec::new(),
            variance: Variance::Invariant,
        });
        table
    }

    /// Allocate a new symbol.
    pub fn alloc(
        &self,
        name: Atom,
        owner: SymbolId,
        flags: SymbolFlags,
        info: TypeId,
    ) -> SymbolId {
        let mut data = self.data.borrow_mut();
        let id = SymbolId(data.len() as u32);
        data.push(SymbolData {
            name,
            owner,
            flags,
            info,
            companion: SymbolId::NONE,
            parents: SmallVec::new(),
            type_params: SmallVec::new(),
            decls: Vec::new(),
            variance: Variance::Invariant,
        });
        id
    }

    pub fn name(&self, sym: SymbolId) -> Atom {
        self.data.borrow()[sym.0 as usize].name
    }

    pub fn owner(&self, sym: SymbolId) -> SymbolId {
        self.data.borrow()[sym.0 as usize].owner
    }

    pub fn flags(&self, sym: SymbolId) -> SymbolFlags {
        self.data.borrow()[sym.0 as usize].flags
    }

    pub fn info(&self, sym: SymbolId) -> TypeId {
        self.data.borrow()[sym.0 as usize].info
    }

    pub fn companion(&self, sym: SymbolId) -> SymbolId {
        self.data.borrow()[sym.0 as usize].companion
    }

    pub fn parents(&self, sym: SymbolId) -> SmallVec<[TypeId; 4]> {
        self.data.borrow()[sym.0 as usize].parents.clone()
    }

    pub fn type_params(&self, sym: SymbolId) -> SmallVec<[SymbolId; 4]> {
        self.data.borrow()[sym.0 as usize].type_params.clone()
    }

    pub fn decls(&self, sym: SymbolId) -> Vec<SymbolId> {
        self.data.borrow()[sym.0 as usize].decls.clone()
    }

    pub fn variance(&self, sym: SymbolId) -> Variance {
        self.data.borrow()[sym.0 as usize].variance
    }

    pub fn is(&self, sym: SymbolId, flags: SymbolFlags) -> bool {
        self.flags(sym).contains(flags)
    }

    pub fn set_info(&self, sym: SymbolId, info: TypeId) {
        self.data.borrow_mut()[sym.0 as usize].info = info;
    }

    pub fn add_flags(&self, sym: SymbolId, flags: SymbolFlags) {
        self.data.borrow_mut()[sym.0 as usize].flags |= flags;
    }

    /// Link two symbols as companions of each other.
    pub fn set_companions(&self, a: SymbolId, b: SymbolId) {
        let mut data = self.data.borrow_mut();
        data[a.0 as usize].companion = b;
        data[b.0 as usize].companion = a;
    }

    pub fn add_parent(&self, sym: SymbolId, parent: TypeId) {
        self.data.borrow_mut()[sym.0 as usize].parents.push(parent);
    }

    pub fn add_type_param(&self, sym: SymbolId, param: SymbolId) {
        self.data.borrow_mut()[sym.0 as usize]
            .type_params
            .push(param);
    }

    pub fn add_decl(&self, sym: SymbolId, decl: SymbolId) {
        self.data.borrow_mut()[sym.0 as usize].decls.push(decl);
    }

    pub fn set_variance(&self, sym: SymbolId, variance: Variance) {
        self.data.borrow_mut()[sym.0 as usize].variance = variance;
    }

    /// The innermost enclosing class of `sym`, itself included.
    pub fn owner_class(&self, sym: SymbolId) -> SymbolId {
        let mut cur = sym;
        while cur.exists() {
            if self.is(cur, SymbolFlags::CLASS) {
                return cur;
            }
            cur = self.owner(cur);
        }
        SymbolId::NONE
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        false // slot 0 is always present
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_query() {
        let table = SymbolTable::new();
        let owner = table.alloc(Atom(1), SymbolId::NONE, SymbolFlags::CLASS, TypeId::NONE);
        let member = table.alloc(Atom(2), owner, SymbolFlags::METHOD, TypeId::INT);
        assert_eq!(table.owner(member), owner);
        assert_eq!(table.info(member), TypeId::INT);
        assert!(table.is(owner, SymbolFlags::CLASS));
    }

    #[test]
    fn companions_link_both_ways() {
        let table = SymbolTable::new();
        let class = table.alloc(Atom(1), SymbolId::NONE, SymbolFlags::CLASS, TypeId::NONE);
        let module = table.alloc(Atom(1), SymbolId::NONE, SymbolFlags::MODULE, TypeId::NONE);
        table.set_companions(class, module);
        assert_eq!(table.companion(class), module);
        assert_eq!(table.companion(module), class);
    }

    #[test]
    fn owner_class_walks_up() {
        let table = SymbolTable::new();
        let class = table.alloc(Atom(1), SymbolId::NONE, SymbolFlags::CLASS, TypeId::NONE);
        let method = table.alloc(Atom(2), class, SymbolFlags::METHOD, TypeId::NONE);
        let local = table.alloc(Atom(3), method, SymbolFlags::empty(), TypeId::INT);
        assert_eq!(table.owner_class(local), class);
        assert_eq!(table.owner_class(class), class);
        assert!(table.owner_class(SymbolId::NONE).is_none());
    }
}
