//! Top-level definition nodes.
//!
//! A [`Script`] is the parsed form of one Rill document: an unordered set
//! of definitions whose resolution order is decided by the type checker's
//! dependency scheduler, not by source order.

use crate::arena::{ExprId, StmtRange};
use crate::ast::expr::Param;
use crate::ast::type_expr::TypeExpr;
use crate::{Name, Span};

/// A parsed Rill document.
#[derive(Default)]
pub struct Script {
    pub defs: Vec<Definition>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DefinitionKind, span: Span) {
        self.defs.push(Definition { kind, span });
    }
}

/// A top-level definition with its source span.
pub struct Definition {
    pub kind: DefinitionKind,
    pub span: Span,
}

/// The declaration kinds participating in the dependency-ordered pass.
pub enum DefinitionKind {
    Message(MessageDef),
    Enum(EnumDef),
    Field(FieldDef),
    Function(FunctionDef),
    Dispatcher(DispatcherDef),
    Constructor(ConstructorDef),
    Handler(HandlerDef),
    Cron(CronDef),
    WebGet(WebGetDef),
    WebPut(WebPutDef),
    Service(ServiceDef),
    Rpc(RpcDef),
    Metric(MetricDef),
    Static(StaticDef),
}

/// One declared field of a message type.
pub struct MessageField {
    pub name: Name,
    pub ty: TypeExpr,
    /// Default-value expression, used to fill absent fields during
    /// literal upgrade.
    pub default: Option<ExprId>,
    pub span: Span,
}

/// A named structure exchanged over channels and web endpoints.
pub struct MessageDef {
    pub name: Name,
    pub fields: Vec<MessageField>,
}

/// A closed set of named variants.
pub struct EnumDef {
    pub name: Name,
    pub variants: Vec<Name>,
}

/// A reactive document field.
pub struct FieldDef {
    pub name: Name,
    pub ty: Option<TypeExpr>,
    pub init: Option<ExprId>,
    /// Per-connection field computed against the viewer.
    pub viewer: bool,
    pub span: Span,
}

/// Whether a function may touch document state.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FunctionPurity {
    /// May only read; may only call other pure functions.
    Pure,
    /// May read and mutate document state.
    Procedure,
}

/// A named function or procedure.
pub struct FunctionDef {
    pub name: Name,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: StmtRange,
    pub purity: FunctionPurity,
    /// Declared abortable; callable only from abortable scopes.
    pub abortable: bool,
}

/// A function attached to an enum, required to produce a value on every
/// path.
pub struct DispatcherDef {
    pub name: Name,
    pub enum_name: Name,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: StmtRange,
}

/// The document constructor, run once at creation.
pub struct ConstructorDef {
    pub body: StmtRange,
}

/// A message handler bound to a channel.
pub struct HandlerDef {
    pub channel: Name,
    /// Name of the message type carried by the channel.
    pub message: Name,
    /// Binding for the inbound message inside the body.
    pub binding: Name,
    pub body: StmtRange,
}

/// A scheduled task.
pub struct CronDef {
    pub name: Name,
    pub schedule: Name,
    pub body: StmtRange,
}

/// A read-only web endpoint; service calls are permitted because the
/// endpoint kind is idempotent by construction.
pub struct WebGetDef {
    pub path: Name,
    pub body: StmtRange,
}

/// A mutating web endpoint carrying an inbound message.
pub struct WebPutDef {
    pub path: Name,
    pub message: Name,
    pub binding: Name,
    pub body: StmtRange,
}

/// One method of a remote service.
pub struct ServiceMethod {
    pub name: Name,
    /// Input message type name.
    pub input: Name,
    /// Output message type name.
    pub output: Name,
    pub span: Span,
}

/// A remote service declaration.
pub struct ServiceDef {
    pub name: Name,
    pub methods: Vec<ServiceMethod>,
}

/// A client-invoked procedure, handler-like in scope.
pub struct RpcDef {
    pub name: Name,
    pub params: Vec<Param>,
    pub body: StmtRange,
}

/// A named metric: a pure numeric computation over document fields.
pub struct MetricDef {
    pub name: Name,
    pub value: ExprId,
}

/// One policy of a static block.
pub struct StaticPolicy {
    pub name: Name,
    pub value: ExprId,
    pub span: Span,
}

/// Document-level policies evaluated without a document instance.
pub struct StaticDef {
    pub policies: Vec<StaticPolicy>,
}
