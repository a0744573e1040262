//! Binary, unary, ternary, and assignment typing.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{BinaryOp, ExprId, Span, TypeId, UnaryOp};
use rill_types::{can_store, max_type, StoreJudgement, TyType, TypeData};

use crate::checker::Checker;
use crate::env::Environment;

use super::infer_expr;

/// Type a binary operation.
pub fn infer_binary(
    ck: &mut Checker<'_>,
    env: &Environment,
    op: BinaryOp,
    left: ExprId,
    right: ExprId,
    span: Span,
) -> Option<TyType> {
    let compute = env.scope_as_computation();
    let left_ty = infer_expr(ck, &compute, left, None);
    let right_ty = infer_expr(ck, &compute, right, left_ty.map(|t| t.id));
    let (left_ty, right_ty) = (left_ty?, right_ty?);

    if op.is_logical() {
        for side in [&left_ty, &right_ty] {
            if side.id != TypeId::BOOL {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "logical operator requires `bool`, found `{}`",
                            ck.render_type(side.id)
                        ))
                        .with_label(side.span, "expected `bool`"),
                );
                return None;
            }
        }
        return Some(TyType::value(TypeId::BOOL, span));
    }

    if op.is_comparison() {
        // Operands must share a common shape; the result is boolean.
        if max_type(&mut ck.types, left_ty.id, right_ty.id).is_none() {
            emit_operand_mismatch(ck, op, &left_ty, &right_ty, span);
            return None;
        }
        return Some(TyType::value(TypeId::BOOL, span));
    }

    // Arithmetic.
    let left_data = ck.types.lookup(left_ty.id).clone();
    let right_data = ck.types.lookup(right_ty.id).clone();
    match op {
        BinaryOp::Add if left_data == TypeData::String && right_data == TypeData::String => {
            Some(TyType::value(TypeId::STRING, span))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
            if left_data.is_numeric() && right_data.is_numeric() =>
        {
            let joined = max_type(&mut ck.types, left_ty.id, right_ty.id)?;
            Some(TyType::value(joined, span))
        }
        BinaryOp::Mod
            if left_data.numeric_rank() == Some(0) && right_data.numeric_rank() == Some(0) =>
        {
            Some(TyType::value(TypeId::INT, span))
        }
        _ => {
            emit_operand_mismatch(ck, op, &left_ty, &right_ty, span);
            None
        }
    }
}

fn emit_operand_mismatch(
    ck: &mut Checker<'_>,
    op: BinaryOp,
    left: &TyType,
    right: &TyType,
    span: Span,
) {
    ck.emit(
        Diagnostic::error(ErrorCode::E2001)
            .with_message(format!(
                "cannot apply `{op:?}` to `{}` and `{}`",
                ck.render_type(left.id),
                ck.render_type(right.id)
            ))
            .with_label(span, "operator not supported for these types"),
    );
}

/// Type a unary operation.
pub fn infer_unary(
    ck: &mut Checker<'_>,
    env: &Environment,
    op: UnaryOp,
    operand: ExprId,
    span: Span,
) -> Option<TyType> {
    let compute = env.scope_as_computation();
    let operand_ty = infer_expr(ck, &compute, operand, None)?;
    match op {
        UnaryOp::Not => {
            if operand_ty.id != TypeId::BOOL {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "`!` requires `bool`, found `{}`",
                            ck.render_type(operand_ty.id)
                        ))
                        .with_label(operand_ty.span, "expected `bool`"),
                );
                return None;
            }
            Some(TyType::value(TypeId::BOOL, span))
        }
        UnaryOp::Neg => {
            if !ck.types.lookup(operand_ty.id).is_numeric() {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "`-` requires a numeric operand, found `{}`",
                            ck.render_type(operand_ty.id)
                        ))
                        .with_label(operand_ty.span, "not numeric"),
                );
                return None;
            }
            Some(TyType::value(operand_ty.id, span))
        }
    }
}

/// Type a ternary conditional; branches are joined structurally.
pub fn infer_ternary(
    ck: &mut Checker<'_>,
    env: &Environment,
    cond: ExprId,
    then_value: ExprId,
    else_value: ExprId,
    suggestion: Option<TypeId>,
    span: Span,
) -> Option<TyType> {
    let compute = env.scope_as_computation();
    let cond_ty = infer_expr(ck, &compute, cond, Some(TypeId::BOOL));
    if let Some(cond_ty) = cond_ty {
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
    let then_ty = infer_expr(ck, &compute, then_value, suggestion);
    let else_suggestion = suggestion.or(then_ty.map(|t| t.id));
    let else_ty = infer_expr(ck, &compute, else_value, else_suggestion);
    let (then_ty, else_ty) = (then_ty?, else_ty?);

    match max_type(&mut ck.types, then_ty.id, else_ty.id) {
        Some(joined) => Some(TyType::value(joined, span)),
        None => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!(
                        "branches have incompatible types: `{}` vs `{}`",
                        ck.render_type(then_ty.id),
                        ck.render_type(else_ty.id)
                    ))
                    .with_label(else_ty.span, "incompatible branch")
                    .with_secondary_label(then_ty.span, "first branch has this type"),
            );
            None
        }
    }
}

/// Type an assignment.
///
/// Assignments are statements: a compute-context assignment, an
/// assignment inside a read-only boundary, and a non-assignable target
/// are each scope violations.
pub fn infer_assign(
    ck: &mut Checker<'_>,
    env: &Environment,
    target: ExprId,
    value: ExprId,
    span: Span,
) -> Option<TyType> {
    if env.is_compute_context() {
        ck.emit(
            Diagnostic::error(ErrorCode::E3006)
                .with_message("assignment is a statement, not a value")
                .with_label(span, "illegal in computation context"),
        );
        return None;
    }
    if env.is_read_only() {
        ck.emit(
            Diagnostic::error(ErrorCode::E3001)
                .with_message("cannot mutate inside a read-only boundary")
                .with_label(span, "mutation rejected here"),
        );
        return None;
    }

    // Statement context keeps the target's accessor form.
    let target_ty = infer_expr(ck, env, target, None)?;
    if !target_ty.behavior.is_assignable() {
        ck.emit(
            Diagnostic::error(ErrorCode::E3001)
                .with_message("this expression is not assignable")
                .with_label(target_ty.span, "not an assignable location"),
        );
        return None;
    }

    let value_ty = infer_expr(ck, &env.scope_as_computation(), value, Some(target_ty.id))?;
    match can_store(&ck.types, target_ty.id, value_ty.id) {
        StoreJudgement::Yes => {}
        StoreJudgement::WithNumericPromotion => ck.record_promotion(value),
        StoreJudgement::WithMaybeLift => ck.record_lift(value),
        StoreJudgement::No => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!(
                        "cannot store `{}` into `{}`",
                        ck.render_type(value_ty.id),
                        ck.render_type(target_ty.id)
                    ))
                    .with_label(value_ty.span, "incompatible value"),
            );
            return None;
        }
    }
    Some(TyType::value(TypeId::VOID, span))
}
