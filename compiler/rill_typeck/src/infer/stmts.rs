//! Statement typing.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{ExprId, Span, StmtId, StmtKind, StmtRange, TypeId};
use rill_types::{can_store, StoreJudgement, TypeData};

use crate::checker::Checker;
use crate::env::{Environment, Local, ReturnContract};

use super::infer_expr;

/// Type a block in a fresh child scope.
pub fn type_block(ck: &mut Checker<'_>, env: &Environment, block: StmtRange) {
    let mut scope = env.scoped();
    for stmt in ck.context.arena.get_block(block) {
        type_stmt(ck, &mut scope, *stmt);
    }
}

/// Type one statement, threading bindings through the block's scope.
pub fn type_stmt(ck: &mut Checker<'_>, env: &mut Environment, id: StmtId) {
    let arena = ck.context.arena;
    let stmt = arena.get_stmt(id);
    let span = stmt.span;

    match &stmt.kind {
        StmtKind::Expr(expr) => {
            infer_expr(ck, &env.scope_as_statement(), *expr, None);
        }
        StmtKind::Let { name, ty, init } => {
            let annotation = ty.as_ref().and_then(|t| ck.resolve_type_expr(t));
            let init_ty = infer_expr(ck, &env.scope_as_computation(), *init, annotation);

            if let (Some(expected), Some(found)) = (annotation, init_ty) {
                judge_store(ck, *init, expected, found.id, found.span);
            }

            let binding_ty = annotation.or(init_ty.map(|t| t.id));
            let Some(binding_ty) = binding_ty else {
                // The initializer already reported; the name stays
                // unbound so later uses surface their own errors.
                return;
            };
            if let Err(prior) = env.define(
                *name,
                Local {
                    ty: binding_ty,
                    mutable: true,
                    span,
                },
            ) {
                ck.emit(
                    Diagnostic::error(ErrorCode::E4001)
                        .with_message(format!(
                            "`{}` is already declared in this scope",
                            ck.context.strings.resolve(*name)
                        ))
                        .with_label(span, "duplicate declaration")
                        .with_secondary_label(prior, "previous declaration"),
                );
            }
        }
        StmtKind::Return { value } => type_return(ck, env, *value, span),
        StmtKind::Abort => {
            if !env.can_abort() {
                ck.emit(
                    Diagnostic::error(ErrorCode::E3003)
                        .with_message("`abort` outside an abortable scope")
                        .with_label(span, "nothing can absorb this abort"),
                );
            }
        }
        StmtKind::If {
            cond,
            then_block,
            else_block,
        } => {
            check_condition(ck, env, *cond);
            type_block(ck, env, *then_block);
            if let Some(else_block) = else_block {
                type_block(ck, env, *else_block);
            }
        }
        StmtKind::While { cond, body } => {
            check_condition(ck, env, *cond);
            type_block(ck, env, *body);
        }
        StmtKind::Foreach {
            binding,
            iter,
            body,
        } => {
            let iter_ty = infer_expr(ck, &env.scope_as_computation(), *iter, None);
            let elem_ty = iter_ty.and_then(|t| match ck.types.lookup(t.id).clone() {
                TypeData::List(elem) => Some(elem),
                TypeData::Map(key, value) => Some(ck.types.pair_of(key, value)),
                _ => {
                    ck.emit(
                        Diagnostic::error(ErrorCode::E2001)
                            .with_message(format!(
                                "type `{}` is not iterable",
                                ck.render_type(t.id)
                            ))
                            .with_label(t.span, "cannot iterate over this"),
                    );
                    None
                }
            });
            let mut body_env = env.scoped();
            if let Some(elem_ty) = elem_ty {
                // Loop bindings are not assignable.
                let _ = body_env.define(
                    *binding,
                    Local {
                        ty: elem_ty,
                        mutable: false,
                        span,
                    },
                );
            }
            for stmt in arena.get_block(*body) {
                type_stmt(ck, &mut body_env, *stmt);
            }
        }
        StmtKind::Block(block) => type_block(ck, env, *block),
    }
}

fn check_condition(ck: &mut Checker<'_>, env: &Environment, cond: ExprId) {
    let Some(cond_ty) = infer_expr(ck, &env.scope_as_computation(), cond, Some(TypeId::BOOL))
    else {
        return;
    };
    if cond_ty.id != TypeId::BOOL {
        ck.emit(
            Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "condition must be `bool`, found `{}`",
                    ck.render_type(cond_ty.id)
                ))
                .with_label(cond_ty.span, "expected `bool`"),
        );
    }
}

/// Check a return statement against the environment's contract.
fn type_return(ck: &mut Checker<'_>, env: &Environment, value: Option<ExprId>, span: Span) {
    match (env.return_contract(), value) {
        (ReturnContract::Void, None) => {}
        (ReturnContract::Void, Some(value)) => {
            let found = infer_expr(ck, &env.scope_as_computation(), value, None);
            if let Some(found) = found {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "no return value expected, found `{}`",
                            ck.render_type(found.id)
                        ))
                        .with_label(found.span, "unexpected value"),
                );
            }
        }
        (ReturnContract::Type(expected), Some(value)) => {
            let found = infer_expr(ck, &env.scope_as_computation(), value, Some(expected));
            if let Some(found) = found {
                judge_store(ck, value, expected, found.id, found.span);
            }
        }
        (ReturnContract::Type(expected), None) => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!(
                        "a `{}` return value is required",
                        ck.render_type(expected)
                    ))
                    .with_label(span, "missing return value"),
            );
        }
        (ReturnContract::AnyMessage, Some(value)) => {
            let found = infer_expr(ck, &env.scope_as_computation(), value, None);
            if let Some(found) = found {
                if !matches!(ck.types.lookup(found.id), TypeData::Message { .. }) {
                    ck.emit(
                        Diagnostic::error(ErrorCode::E2001)
                            .with_message(format!(
                                "a response message is required, found `{}`",
                                ck.render_type(found.id)
                            ))
                            .with_label(found.span, "not a message"),
                    );
                }
            }
        }
        (ReturnContract::AnyMessage, None) => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message("a response message is required")
                    .with_label(span, "missing response"),
            );
        }
    }
}

/// Judge a store, recording the lift/promotion side channels.
pub(crate) fn judge_store(
    ck: &mut Checker<'_>,
    value_expr: ExprId,
    expected: TypeId,
    found: TypeId,
    span: Span,
) {
    match can_store(&ck.types, expected, found) {
        StoreJudgement::Yes => {}
        StoreJudgement::WithNumericPromotion => ck.record_promotion(value_expr),
        StoreJudgement::WithMaybeLift => ck.record_lift(value_expr),
        StoreJudgement::No => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!(
                        "cannot store `{}` into `{}`",
                        ck.render_type(found),
                        ck.render_type(expected)
                    ))
                    .with_label(span, "incompatible types"),
            );
        }
    }
}
