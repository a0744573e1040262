//! Per-expression typing rules.
//!
//! `infer_expr` is the single entry point: it consults the set-once
//! cache first (typing an expression twice returns the identical result
//! with no repeated side effects), then dispatches on kind. The
//! structurally anonymous literals route through the two-phase
//! estimate/upgrade protocol in `literals`.

mod call;
mod identifiers;
pub mod literals;
mod operators;
pub mod stmts;

pub use call::infer_call;
pub use identifiers::{infer_field, infer_ident, infer_index, infer_viewer_ref};
pub use operators::{infer_assign, infer_binary, infer_ternary, infer_unary};
pub use stmts::{type_block, type_stmt};

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{ExprId, ExprKind, Span, TypeId};
use rill_types::TyType;

use crate::checker::Checker;
use crate::env::Environment;
use crate::stack::ensure_sufficient_stack;

/// Infer the type of an expression.
///
/// `suggestion` is the contextual expectation (an annotation, a
/// parameter type, a declared field type); literals merge it into their
/// final type, everything else types independently and lets the caller
/// judge storability.
///
/// Returns `None` when the node failed to type; the failure has already
/// been reported, and the ambient pass continues so independent errors
/// all surface in one run.
pub fn infer_expr(
    ck: &mut Checker<'_>,
    env: &Environment,
    id: ExprId,
    suggestion: Option<TypeId>,
) -> Option<TyType> {
    if let Some(cached) = ck.cached_expr(id) {
        return cached;
    }
    ensure_sufficient_stack(|| infer_expr_inner(ck, env, id, suggestion))
}

fn infer_expr_inner(
    ck: &mut Checker<'_>,
    env: &Environment,
    id: ExprId,
    suggestion: Option<TypeId>,
) -> Option<TyType> {
    let arena = ck.context.arena;
    let expr = arena.get_expr(id);
    let span = expr.span;

    let result = match &expr.kind {
        // Two-phase literals manage their own (and their children's)
        // caching.
        ExprKind::Array(_) | ExprKind::Object(_) | ExprKind::Tuple(_) => {
            return literals::type_literal(ck, env, id, suggestion, span);
        }

        ExprKind::Int(_) => literal(ck, env, TypeId::INT, span),
        ExprKind::Long(_) => literal(ck, env, TypeId::LONG, span),
        ExprKind::Double(_) => literal(ck, env, TypeId::DOUBLE, span),
        ExprKind::Bool(_) => literal(ck, env, TypeId::BOOL, span),
        ExprKind::Str(_) => literal(ck, env, TypeId::STRING, span),
        ExprKind::Null => infer_null(ck, env, suggestion, span),

        ExprKind::Ident(name) => infer_ident(ck, env, *name, span),
        ExprKind::ViewerRef(name) => infer_viewer_ref(ck, env, *name, span),

        ExprKind::Binary { op, left, right } => {
            infer_binary(ck, env, *op, *left, *right, span)
        }
        ExprKind::Unary { op, operand } => infer_unary(ck, env, *op, *operand, span),
        ExprKind::Assign { target, value } => infer_assign(ck, env, *target, *value, span),
        ExprKind::Ternary {
            cond,
            then_value,
            else_value,
        } => infer_ternary(ck, env, *cond, *then_value, *else_value, suggestion, span),
        ExprKind::Call { callee, args } => infer_call(ck, env, *callee, *args, span),
        ExprKind::Field { receiver, field } => infer_field(ck, env, *receiver, *field, span),
        ExprKind::Index { receiver, index } => infer_index(ck, env, *receiver, *index, span),
        ExprKind::Lambda { params, body } => {
            infer_lambda(ck, env, id, *params, *body, suggestion, span)
        }
    };

    ck.cache_expr(id, result);
    result
}

/// A primitive literal: its value must be consumed.
fn literal(ck: &mut Checker<'_>, env: &Environment, ty: TypeId, span: Span) -> Option<TyType> {
    if must_be_compute_context(ck, env, span) {
        Some(TyType::value(ty, span))
    } else {
        None
    }
}

/// `null` has no shape of its own; it types only against a `maybe`
/// expectation.
fn infer_null(
    ck: &mut Checker<'_>,
    env: &Environment,
    suggestion: Option<TypeId>,
    span: Span,
) -> Option<TyType> {
    if !must_be_compute_context(ck, env, span) {
        return None;
    }
    match suggestion {
        Some(expected) if matches!(ck.types.lookup(expected), rill_types::TypeData::Maybe(_)) => {
            Some(TyType::value(expected, span))
        }
        _ => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2005)
                    .with_message("cannot infer a type for `null` here")
                    .with_label(span, "needs a `maybe` expectation"),
            );
            None
        }
    }
}

/// Enforce computation context; reports and returns false on violation.
pub(crate) fn must_be_compute_context(
    ck: &mut Checker<'_>,
    env: &Environment,
    span: Span,
) -> bool {
    if env.is_compute_context() {
        return true;
    }
    ck.emit(
        Diagnostic::error(ErrorCode::E3006)
            .with_message("this expression produces a value that is never consumed")
            .with_label(span, "illegal in statement context"),
    );
    false
}

/// Lambda typing: parameters from annotations or the contextual
/// function suggestion, body behind a lambda boundary with a closure
/// watcher attached, captures copied into the output.
fn infer_lambda(
    ck: &mut Checker<'_>,
    env: &Environment,
    id: ExprId,
    params: rill_ir::ParamRange,
    body: ExprId,
    suggestion: Option<TypeId>,
    span: Span,
) -> Option<TyType> {
    use crate::env::Local;
    use crate::watch::{Watcher, WatcherKind};
    use rill_types::{FuncData, FuncKind, TypeData};

    let arena = ck.context.arena;
    let param_nodes = arena.get_params(params);

    // A contextual func suggestion supplies omitted parameter types.
    let suggested: Option<FuncData> = suggestion.and_then(|s| match ck.types.lookup(s) {
        TypeData::Func(func) => Some(func.clone()),
        _ => None,
    });

    let mut param_types = Vec::with_capacity(param_nodes.len());
    for (index, param) in param_nodes.iter().enumerate() {
        let from_annotation = match &param.ty {
            Some(ty) => ck.resolve_type_expr(ty),
            None => None,
        };
        let from_suggestion = suggested
            .as_ref()
            .and_then(|f| f.params.get(index).copied());
        match from_annotation.or(from_suggestion) {
            Some(ty) => param_types.push(ty),
            None => {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2005)
                        .with_message(format!(
                            "cannot infer the type of parameter `{}`",
                            ck.context.strings.resolve(param.name)
                        ))
                        .with_label(param.span, "type annotation needed"),
                );
                return None;
            }
        }
    }

    let watcher = Watcher::new(WatcherKind::ClosureCaptures);
    let mut lambda_env = env
        .scope_as_lambda()
        .scope_as_computation()
        .watching(watcher.clone());
    for (param, ty) in param_nodes.iter().zip(&param_types) {
        if let Err(prior) = lambda_env.define(
            param.name,
            Local {
                ty: *ty,
                mutable: false,
                span: param.span,
            },
        ) {
            ck.emit(
                Diagnostic::error(ErrorCode::E4001)
                    .with_message(format!(
                        "duplicate parameter `{}`",
                        ck.context.strings.resolve(param.name)
                    ))
                    .with_label(param.span, "already declared")
                    .with_secondary_label(prior, "previous declaration"),
            );
        }
    }

    let ret_suggestion = suggested.as_ref().map(|f| f.ret);
    let body_ty = infer_expr(ck, &lambda_env, body, ret_suggestion)?;

    // The capture set is exactly the enclosing names referenced.
    if ck.is_committing() {
        ck.output
            .captures
            .insert(id.raw(), watcher.handle().borrow().to_vec());
    }

    let func = ck.types.intern(TypeData::Func(FuncData {
        params: param_types,
        ret: body_ty.id,
        kind: FuncKind::Pure,
        abortable: false,
    }));
    Some(TyType::value(func, span))
}
