//! Structural type interner.

use rustc_hash::FxHashMap;

use rill_ir::{Name, TypeId};

use crate::data::{MessageFieldTy, TypeData};

/// Hash-consing table for structural types.
///
/// Interning the same shape twice returns the same [`TypeId`], which is
/// what makes the dedupe invariant hold: two structurally identical
/// anonymous literals resolve to one canonical registered type.
///
/// Created at the start of a compilation run, passed by reference
/// throughout, discarded at the end — never a hidden global.
pub struct TypeInterner {
    map: FxHashMap<TypeData, TypeId>,
    types: Vec<TypeData>,
}

impl TypeInterner {
    /// Create an interner with the primitives pre-interned in
    /// [`TypeId`] constant order.
    pub fn new() -> Self {
        let mut interner = TypeInterner {
            map: FxHashMap::default(),
            types: Vec::with_capacity(64),
        };
        let primitives = [
            TypeData::Void,
            TypeData::Bool,
            TypeData::Int,
            TypeData::Long,
            TypeData::Double,
            TypeData::String,
            TypeData::Principal,
            TypeData::Date,
        ];
        for data in primitives {
            interner.intern(data);
        }
        debug_assert_eq!(interner.types.len() as u32, TypeId::FIRST_FRESH);
        interner
    }

    /// Intern a shape, returning its canonical id.
    pub fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.map.get(&data) {
            return id;
        }
        let id = TypeId::from_raw(u32::try_from(self.types.len()).unwrap_or_else(|_| {
            panic!("type interner exceeded capacity: {} types", self.types.len())
        }));
        tracing::trace!(?id, ?data, "interned structural type");
        self.types.push(data.clone());
        self.map.insert(data, id);
        id
    }

    /// Look up the shape behind an id.
    pub fn lookup(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    /// Intern `maybe<inner>`.
    pub fn maybe_of(&mut self, inner: TypeId) -> TypeId {
        // maybe<maybe<T>> collapses; a doubly-absent value is not a thing.
        if matches!(self.lookup(inner), TypeData::Maybe(_)) {
            return inner;
        }
        self.intern(TypeData::Maybe(inner))
    }

    /// Intern `list<elem>`.
    pub fn list_of(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeData::List(elem))
    }

    /// Intern `map<key, value>`.
    pub fn map_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(TypeData::Map(key, value))
    }

    /// Intern `pair<left, right>`.
    pub fn pair_of(&mut self, left: TypeId, right: TypeId) -> TypeId {
        self.intern(TypeData::Pair(left, right))
    }

    /// Intern a tuple shape.
    pub fn tuple_of(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(TypeData::Tuple(elems))
    }

    /// Intern a message shape. Anonymous shapes get their fields sorted
    /// by name so source field order never splits the canonical type.
    pub fn message_of(&mut self, name: Option<Name>, mut fields: Vec<MessageFieldTy>) -> TypeId {
        if name.is_none() {
            fields.sort_by_key(|f| f.name);
        }
        self.intern(TypeData::Message { name, fields })
    }

    /// The canonical empty anonymous message, used as the element
    /// placeholder for empty array literals.
    pub fn empty_message(&mut self) -> TypeId {
        self.message_of(None, Vec::new())
    }

    /// If `id` is `maybe<T>`, return `T`.
    pub fn unwrap_maybe(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id) {
            TypeData::Maybe(inner) => Some(*inner),
            _ => None,
        }
    }

    /// Number of interned shapes.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}
