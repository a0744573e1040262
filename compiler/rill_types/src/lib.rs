//! Rill Types - the type system for the Rill compiler.
//!
//! Types are split the way the checker consumes them:
//!
//! - [`TypeData`]: the structural shape of a type, interned by
//!   [`TypeInterner`] into a [`TypeId`](rill_ir::TypeId) — structurally
//!   identical shapes share one id
//! - [`Behavior`]: the access/mutability mode of one *occurrence* of a
//!   type (a read-only value, a stored field behind an accessor, ...)
//! - [`TyType`]: the occurrence wrapper threaded through expression
//!   typing: an interned id plus behavior plus source position
//!
//! There are no unification variables: `merge` computes one concrete
//! structural join (`max_type`) or a store judgement (`can_store`).

mod behavior;
mod data;
mod fmt;
mod interner;
pub mod merge;

pub use behavior::{Behavior, TyType};
pub use data::{FuncData, FuncKind, MessageFieldTy, TypeData};
pub use fmt::format_type;
pub use interner::TypeInterner;
pub use merge::{can_store, max_type, StoreJudgement};
