//! Expression nodes.

use crate::arena::{ExprId, ExprRange, FieldRange, ParamRange};
use crate::ast::type_expr::TypeExpr;
use crate::{Name, Span};

/// An expression node with its source span.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

impl BinaryOp {
    /// Operators producing a bool regardless of operand type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte
        )
    }

    /// Operators requiring bool operands.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// A lambda parameter, optionally annotated.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: Option<TypeExpr>,
    pub span: Span,
}

/// One field of an anonymous object literal.
///
/// `value: None` is the shorthand form `{ x }`, equivalent to `{ x: x }`.
#[derive(Clone, Debug)]
pub struct FieldInit {
    pub name: Name,
    pub value: Option<ExprId>,
    pub span: Span,
}

/// Expression kinds.
#[derive(Clone, Debug)]
pub enum ExprKind {
    // Literals
    Int(i64),
    Long(i64),
    Double(f64),
    Bool(bool),
    Str(Name),
    /// The absent value; only typeable against a `maybe` expectation.
    Null,

    /// Variable, field, function, or enum reference.
    Ident(Name),
    /// Per-connection viewer field reference.
    ViewerRef(Name),

    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// Assignment; legal only in statement context.
    Assign {
        target: ExprId,
        value: ExprId,
    },
    Ternary {
        cond: ExprId,
        then_value: ExprId,
        else_value: ExprId,
    },
    Call {
        callee: ExprId,
        args: ExprRange,
    },
    Field {
        receiver: ExprId,
        field: Name,
    },
    Index {
        receiver: ExprId,
        index: ExprId,
    },

    // Structurally anonymous literals; typed via the two-phase protocol.
    Array(ExprRange),
    Object(FieldRange),
    Tuple(ExprRange),

    Lambda {
        params: ParamRange,
        body: ExprId,
    },
}

impl ExprKind {
    /// Does this node participate in the estimate/upgrade literal protocol?
    pub fn supports_two_phase_typing(&self) -> bool {
        matches!(
            self,
            ExprKind::Array(_) | ExprKind::Object(_) | ExprKind::Tuple(_)
        )
    }
}
