//! Interned type identifier.

use std::fmt;

/// Interned type identifier.
///
/// A compact index into the structural type interner. Structurally equal
/// types intern to the same `TypeId`, so equality is O(1).
///
/// The first eight ids are reserved for the primitives, pre-interned by
/// the type interner in this exact order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// The unit/void type.
    pub const VOID: TypeId = TypeId(0);
    /// Boolean.
    pub const BOOL: TypeId = TypeId(1);
    /// 32-bit integer.
    pub const INT: TypeId = TypeId(2);
    /// 64-bit integer.
    pub const LONG: TypeId = TypeId(3);
    /// Double-precision float.
    pub const DOUBLE: TypeId = TypeId(4);
    /// String.
    pub const STRING: TypeId = TypeId(5);
    /// Connection principal (an authenticated agent identity).
    pub const PRINCIPAL: TypeId = TypeId(6);
    /// Calendar date.
    pub const DATE: TypeId = TypeId(7);

    /// Number of pre-interned primitive ids.
    pub const FIRST_FRESH: u32 = 8;

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Create from raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    /// Index into the interner's storage.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_ids_distinct() {
        let prims = [
            TypeId::VOID,
            TypeId::BOOL,
            TypeId::INT,
            TypeId::LONG,
            TypeId::DOUBLE,
            TypeId::STRING,
            TypeId::PRINCIPAL,
            TypeId::DATE,
        ];
        for (i, a) in prims.iter().enumerate() {
            for b in &prims[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(prims.len() as u32, TypeId::FIRST_FRESH);
    }
}
