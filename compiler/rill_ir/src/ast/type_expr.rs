//! Parsed type annotations.
//!
//! Annotations are resolved against the document registry during
//! checking; they carry no resolved information themselves.

use crate::{Name, Span};

/// A parsed type annotation.
#[derive(Clone, Debug)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

/// Annotation kinds.
#[derive(Clone, Debug)]
pub enum TypeExprKind {
    /// A primitive or declared type name.
    Named(Name),
    Maybe(Box<TypeExpr>),
    List(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    /// A pure function shape, for parameters that accept lambdas.
    Func {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
    },
}

impl TypeExpr {
    pub fn named(name: Name, span: Span) -> Self {
        TypeExpr {
            kind: TypeExprKind::Named(name),
            span,
        }
    }
}
