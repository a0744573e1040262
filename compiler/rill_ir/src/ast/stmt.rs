//! Statement nodes.

use crate::arena::{ExprId, StmtRange};
use crate::ast::type_expr::TypeExpr;
use crate::{Name, Span};

/// A statement node with its source span.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement kinds.
#[derive(Clone, Debug)]
pub enum StmtKind {
    /// A bare expression evaluated for effect.
    Expr(ExprId),
    /// Local binding; the annotation, when present, is the suggestion for
    /// the initializer.
    Let {
        name: Name,
        ty: Option<TypeExpr>,
        init: ExprId,
    },
    Return {
        value: Option<ExprId>,
    },
    /// Non-local exit; legal only in abortable scopes.
    Abort,
    If {
        cond: ExprId,
        then_block: StmtRange,
        else_block: Option<StmtRange>,
    },
    While {
        cond: ExprId,
        body: StmtRange,
    },
    Foreach {
        binding: Name,
        iter: ExprId,
        body: StmtRange,
    },
    /// Nested block with its own scope.
    Block(StmtRange),
}
