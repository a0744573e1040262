//! Structural type shapes.

use rill_ir::{Name, TypeId};

/// One field of a message shape.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MessageFieldTy {
    pub name: Name,
    pub ty: TypeId,
}

/// What a function is allowed to touch when invoked.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FuncKind {
    /// Reads only; may only call other pure functions.
    Pure,
    /// May mutate document state.
    Procedure,
    /// Remote service method; requires a reachable cache at the call
    /// site (web get handlers excepted).
    ServiceMethod,
}

/// Shape of a callable.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FuncData {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub kind: FuncKind,
    pub abortable: bool,
}

/// The structural shape of a type.
///
/// No spans, no behaviors: structural equality over this enum is the
/// interning key, so two structurally identical anonymous shapes share
/// one [`TypeId`]. Named messages and enums are nominal — the name is
/// part of the shape.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeData {
    // Primitives, pre-interned in TypeId constant order.
    Void,
    Bool,
    Int,
    Long,
    Double,
    String,
    Principal,
    Date,

    /// An optional value.
    Maybe(TypeId),
    List(TypeId),
    Map(TypeId, TypeId),
    /// A key/value pair, produced by map iteration.
    Pair(TypeId, TypeId),
    Tuple(Vec<TypeId>),

    /// A message shape. `name: None` marks a structurally anonymous
    /// shape synthesized from a literal; fields are kept sorted by name
    /// so field order in source never splits the canonical type.
    Message {
        name: Option<Name>,
        fields: Vec<MessageFieldTy>,
    },

    /// A declared enum; variants live in the document registry.
    Enum(Name),

    Func(FuncData),
}

impl TypeData {
    /// Whether this shape is one of the three numeric primitives.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeData::Int | TypeData::Long | TypeData::Double)
    }

    /// Widening rank for numeric joins: int < long < double.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            TypeData::Int => Some(0),
            TypeData::Long => Some(1),
            TypeData::Double => Some(2),
            _ => None,
        }
    }
}
