//! Rill IR - intermediate representation for the Rill compiler.
//!
//! The type-checking core consumes an already-parsed tree; this crate
//! defines that tree and the supporting identity types:
//!
//! - [`Name`] / [`StringInterner`]: compact interned identifiers
//! - [`Span`]: 8-byte source locations
//! - [`TypeId`]: index into the structural type interner
//! - [`ExprArena`]: arena storage for expressions, statements, and the
//!   flattened side-buffers they address by range
//! - `ast`: expression, statement, type-annotation, and definition nodes

pub mod arena;
pub mod ast;
mod interner;
mod name;
mod span;
mod type_id;

pub use arena::{ExprArena, ExprId, ExprRange, FieldRange, ParamRange, StmtId, StmtRange};
pub use ast::defn::{
    ConstructorDef, CronDef, Definition, DefinitionKind, DispatcherDef, EnumDef, FieldDef,
    FunctionDef, FunctionPurity, HandlerDef, MessageDef, MessageField, MetricDef, RpcDef, Script,
    ServiceDef, ServiceMethod, StaticDef, StaticPolicy, WebGetDef, WebPutDef,
};
pub use ast::expr::{BinaryOp, Expr, ExprKind, FieldInit, Param, UnaryOp};
pub use ast::stmt::{Stmt, StmtKind};
pub use ast::type_expr::{TypeExpr, TypeExprKind};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;
pub use type_id::TypeId;
