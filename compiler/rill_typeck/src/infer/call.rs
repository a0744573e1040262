//! Call-site typing and the contextual call rules.
//!
//! Purity, abortability, and remote-call eligibility are checked at
//! every call site, not just at declaration time.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{ExprId, ExprKind, ExprRange, Span};
use rill_types::{can_store, FuncKind, StoreJudgement, TyType, TypeData};

use crate::checker::Checker;
use crate::env::Environment;
use crate::watch::{Watcher, WatcherKind};

use super::infer_expr;

/// Type a call expression.
pub fn infer_call(
    ck: &mut Checker<'_>,
    env: &Environment,
    callee: ExprId,
    args: ExprRange,
    span: Span,
) -> Option<TyType> {
    let compute = env.scope_as_computation();
    let callee_ty = infer_expr(ck, &compute, callee, None)?;
    let TypeData::Func(func) = ck.types.lookup(callee_ty.id).clone() else {
        ck.emit(
            Diagnostic::error(ErrorCode::E2004)
                .with_message(format!("`{}` is not callable", ck.render_type(callee_ty.id)))
                .with_label(callee_ty.span, "cannot call this"),
        );
        return None;
    };

    // Contextual rules, checked at every call site. A violated call
    // yields no type at all.
    if env.is_pure() && func.kind != FuncKind::Pure {
        ck.emit(
            Diagnostic::error(ErrorCode::E3002)
                .with_message("pure scope cannot invoke a non-pure function")
                .with_label(span, "non-pure call from pure scope"),
        );
        return None;
    }
    if env.is_read_only() && func.kind == FuncKind::Procedure {
        ck.emit(
            Diagnostic::error(ErrorCode::E3001)
                .with_message("read-only boundary cannot invoke a mutating procedure")
                .with_label(span, "mutating call rejected here"),
        );
        return None;
    }
    if func.kind == FuncKind::ServiceMethod && !env.can_call_service() {
        ck.emit(
            Diagnostic::error(ErrorCode::E3004)
                .with_message("remote service call requires a reachable cache")
                .with_label(span, "no cache in scope"),
        );
        return None;
    }
    if func.abortable && !env.can_abort() {
        ck.emit(
            Diagnostic::error(ErrorCode::E3003)
                .with_message("abortable function called from a non-abortable scope")
                .with_label(span, "caller cannot absorb an abort"),
        );
        return None;
    }

    let arg_ids = ck.context.arena.get_expr_list(args);
    if arg_ids.len() != func.params.len() {
        ck.emit(
            Diagnostic::error(ErrorCode::E2004)
                .with_message(format!(
                    "expected {} argument{}, found {}",
                    func.params.len(),
                    if func.params.len() == 1 { "" } else { "s" },
                    arg_ids.len()
                ))
                .with_label(span, "wrong argument count"),
        );
        return None;
    }

    for (arg, param) in arg_ids.iter().copied().zip(func.params.iter().copied()) {
        // A lambda argument is an aggregate application: its enclosing
        // reads are watched per call site, chained under (not replacing)
        // any outer watchers.
        let aggregate = matches!(ck.context.arena.get_expr(arg).kind, ExprKind::Lambda { .. })
            .then(|| Watcher::new(WatcherKind::AggregateInputs));
        let arg_env = match &aggregate {
            Some(watcher) => compute.watching(watcher.clone()),
            None => compute.clone(),
        };
        let arg_result = infer_expr(ck, &arg_env, arg, Some(param));
        if let Some(watcher) = aggregate {
            if ck.is_committing() {
                ck.output
                    .aggregate_inputs
                    .insert(arg.raw(), watcher.handle().borrow().to_vec());
            }
        }
        let Some(arg_ty) = arg_result else {
            continue;
        };
        match can_store(&ck.types, param, arg_ty.id) {
            StoreJudgement::Yes => {}
            StoreJudgement::WithNumericPromotion => ck.record_promotion(arg),
            StoreJudgement::WithMaybeLift => ck.record_lift(arg),
            StoreJudgement::No => {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "argument type `{}` does not fit parameter type `{}`",
                            ck.render_type(arg_ty.id),
                            ck.render_type(param)
                        ))
                        .with_label(arg_ty.span, "incompatible argument"),
                );
            }
        }
    }

    Some(TyType::value(func.ret, span))
}
