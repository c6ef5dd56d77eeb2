//! Type interning for structural deduplication.
//!
//! Converts `TypeKey` structures into lightweight `TypeId` handles.
//!
//! Benefits:
//! - O(1) type equality (just compare the u32 values)
//! - Memory efficient (each unique structure stored once)
//! - Identity-stable handles for the per-run caches downstream
//!
//! The engine is single-threaded cooperative, so interior mutability is
//! `RefCell` rather than locks.

use crate::types::{IntrinsicKind, SymListId, SymbolId, TypeId, TypeKey, TypeListId};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::hash::Hash;
use std::sync::Arc;

struct SliceInterner<T> {
    items: Vec<Arc<[T]>>,
    map: FxHashMap<Arc<[T]>, u32>,
}

impl<T> SliceInterner<T>
where
    T: Eq + Hash,
{
    fn new() -> Self {
        let empty: Arc<[T]> = Arc::from(Vec::new());
        let mut map = FxHashMap::default();
        map.insert(empty.clone(), 0);
        SliceInterner {
            items: vec![empty],
            map,
        }
    }

    fn intern(&mut self, items: Vec<T>) -> u32 {
        if items.is_empty() {
            return 0;
        }
        if let Some(&id) = self.map.get(items.as_slice()) {
            return id;
        }
        let arc: Arc<[T]> = items.into();
        let id = self.items.len() as u32;
        self.items.push(arc.clone());
        self.map.insert(arc, id);
        id
    }

    fn get(&self, id: u32) -> Arc<[T]> {
        self.items[id as usize].clone()
    }
}

/// Type interning table.
pub struct TypeInterner {
    key_to_id: RefCell<FxHashMap<TypeKey, TypeId>>,
    id_to_key: RefCell<Vec<TypeKey>>,
    type_lists: RefCell<SliceInterner<TypeId>>,
    sym_lists: RefCell<SliceInterner<SymbolId>>,
}

impl TypeInterner {
    /// Create a new type interner with pre-registered intrinsics.
    pub fn new() -> Self {
        let interner = TypeInterner {
            key_to_id: RefCell::new(FxHashMap::default()),
            id_to_key: RefCell::new(Vec::new()),
            type_lists: RefCell::new(SliceInterner::new()),
            sym_lists: RefCell::new(SliceInterner::new()),
        };
        // Intrinsics occupy the fixed sentinel slots below FIRST_USER.
        let intrinsics = [
            IntrinsicKind::None,
            IntrinsicKind::Error,
            IntrinsicKind::Nothing,
            IntrinsicKind::Any,
            IntrinsicKind::AnyRef,
            IntrinsicKind::Unit,
            IntrinsicKind::Null,
            IntrinsicKind::Int,
            IntrinsicKind::String,
            IntrinsicKind::Boolean,
            IntrinsicKind::Char,
        ];
        {
            let mut keys = interner.id_to_key.borrow_mut();
            let mut map = interner.key_to_id.borrow_mut();
            for (i, kind) in intrinsics.iter().enumerate() {
                let key = TypeKey::Intrinsic(*kind);
                keys.push(key);
                map.insert(key, TypeId(i as u32));
            }
            while keys.len() < TypeId::FIRST_USER as usize {
                keys.push(TypeKey::Intrinsic(IntrinsicKind::None));
            }
        }
        interner
    }

    /// Intern a type key, returning its stable handle.
    pub fn intern(&self, key: TypeKey) -> TypeId {
        if let Some(&id) = self.key_to_id.borrow().get(&key) {
            return id;
        }
        let mut keys = self.id_to_key.borrow_mut();
        let id = TypeId(keys.len() as u32);
        keys.push(key);
        self.key_to_id.borrow_mut().insert(key, id);
        id
    }

    /// Look up the structure behind a handle.
    pub fn lookup(&self, id: TypeId) -> TypeKey {
        self.id_to_key.borrow()[id.0 as usize]
    }

    pub fn type_list(&self, items: Vec<TypeId>) -> TypeListId {
        TypeListId(self.type_lists.borrow_mut().intern(items))
    }

    pub fn type_list_of(&self, id: TypeListId) -> Arc<[TypeId]> {
        self.type_lists.borrow().get(id.0)
    }

    pub fn sym_list(&self, items: Vec<SymbolId>) -> SymListId {
        SymListId(self.sym_lists.borrow_mut().intern(items))
    }

    pub fn sym_list_of(&self, id: SymListId) -> Arc<[SymbolId]> {
        self.sym_lists.borrow().get(id.0)
    }

    /// Number of interned types, intrinsic slots included.
    pub fn len(&self) -> usize {
        self.id_to_key.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        false // intrinsics are always present
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsics_have_fixed_slots() {
        let interner = TypeInterner::new();
        assert_eq!(
            interner.intern(TypeKey::Intrinsic(IntrinsicKind::Any)),
            TypeId::ANY
        );
        assert_eq!(
            interner.intern(TypeKey::Intrinsic(IntrinsicKind::Nothing)),
            TypeId::NOTHING
        );
        assert_eq!(interner.lookup(TypeId::INT), TypeKey::Intrinsic(IntrinsicKind::Int));
    }

    #[test]
    fn interning_deduplicates() {
        let interner = TypeInterner::new();
        let key = TypeKey::Named {
            prefix: TypeId::NONE,
            sym: SymbolId(7),
        };
        let a = interner.intern(key);
        let b = interner.intern(key);
        assert_eq!(a, b);
        assert!(a.0 >= TypeId::FIRST_USER);
    }

    #[test]
    fn type_lists_deduplicate_and_share_empty() {
        let interner = TypeInterner::new();
        let a = interner.type_list(vec![TypeId::INT, TypeId::STRING]);
        let b = interner.type_list(vec![TypeId::INT, TypeId::STRING]);
        let empty = interner.type_list(Vec::new());
        assert_eq!(a, b);
        assert_eq!(empty, TypeListId(0));
        assert_eq!(&*interner.type_list_of(a), &[TypeId::INT, TypeId::STRING]);
    }
}
