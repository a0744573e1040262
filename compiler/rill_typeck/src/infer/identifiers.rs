//! Name, field, and index resolution.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{ExprId, ExprKind, Name, Span, TypeId};
use rill_types::{can_store, TyType, TypeData};

use crate::checker::Checker;
use crate::env::Environment;
use crate::watch::ReferenceOrigin;

use super::infer_expr;

/// Resolve a bare identifier.
///
/// Resolution order: local frames, then the document scope (reactive
/// fields, functions, services, enum variants). Every committed
/// resolution notifies the environment's watcher chain; the watchers
/// filter by origin.
pub fn infer_ident(
    ck: &mut Checker<'_>,
    env: &Environment,
    name: Name,
    span: Span,
) -> Option<TyType> {
    // Locals first, classifying captures across lambda boundaries.
    if let Some(hit) = env.lookup_local(name) {
        if ck.is_committing() {
            env.notify(name, hit.local.ty, hit.origin());
        }
        let occurrence = if hit.local.mutable {
            TyType::accessor(hit.local.ty, span)
        } else {
            TyType::value(hit.local.ty, span)
        };
        return Some(contextualize(env, occurrence));
    }

    // Reactive document fields.
    if let Some(field) = ck.registry.field(name) {
        if env.is_static_policy() {
            ck.emit(
                Diagnostic::error(ErrorCode::E3006)
                    .with_message(format!(
                        "document field `{}` is not available in a static policy",
                        ck.context.strings.resolve(name)
                    ))
                    .with_label(span, "no document instance here"),
            );
            return None;
        }
        if ck.is_committing() {
            env.notify(name, field.ty, ReferenceOrigin::Document);
        }
        return Some(contextualize(env, TyType::accessor(field.ty, span)));
    }

    // Functions are document-scope values; calls go through their type.
    if let Some(function) = ck.registry.function(name) {
        if ck.is_committing() {
            env.notify(name, function.ty, ReferenceOrigin::Document);
            // The scheduler typed the callee first, so its recorded
            // reads fold into this body's set — dependency watching is
            // transitive through calls resolved in the same run.
            let transitive: Vec<_> = ck
                .output
                .functions
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.dependencies.clone())
                .unwrap_or_default();
            for (dep, dep_ty) in transitive {
                env.notify(dep, dep_ty, ReferenceOrigin::Document);
            }
        }
        return Some(TyType::value(function.ty, span));
    }

    // Services resolve to their method-object shape.
    if let Some(service) = ck.registry.service(name) {
        return Some(TyType::value(service.ty, span));
    }

    // Bare enum variant references.
    if let Some(owner) = ck.registry.variant_owner(name) {
        if let Some(info) = ck.registry.enum_info(owner) {
            return Some(TyType::value(info.ty, span));
        }
    }

    // A type name alone is not a value.
    if ck.registry.named_type(name).is_some() {
        ck.emit(
            Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "`{}` is a type, not a value",
                    ck.context.strings.resolve(name)
                ))
                .with_label(span, "type name used as a value"),
        );
        return None;
    }

    ck.emit(
        Diagnostic::error(ErrorCode::E1001)
            .with_message(format!(
                "unknown identifier `{}`",
                ck.context.strings.resolve(name)
            ))
            .with_label(span, "not found in this scope"),
    );
    None
}

/// Apply the read-only boundary and the computation-context extraction
/// rule to a resolved occurrence.
fn contextualize(env: &Environment, occurrence: TyType) -> TyType {
    let occurrence = if env.is_read_only() || env.is_pure() {
        occurrence.as_read_only()
    } else {
        occurrence
    };
    if env.is_compute_context() {
        // Stored-but-need-extraction: computation context reads the
        // value out of the accessor.
        occurrence.as_value()
    } else {
        occurrence
    }
}

/// Resolve a viewer field reference.
pub fn infer_viewer_ref(
    ck: &mut Checker<'_>,
    env: &Environment,
    name: Name,
    span: Span,
) -> Option<TyType> {
    if !env.has_viewer() {
        ck.emit(
            Diagnostic::error(ErrorCode::E3005)
                .with_message(format!(
                    "viewer field `{}` referenced outside a viewer scope",
                    ck.context.strings.resolve(name)
                ))
                .with_label(span, "no viewer here"),
        );
        return None;
    }
    let Some(field) = ck.registry.viewer_field(name) else {
        ck.emit(
            Diagnostic::error(ErrorCode::E1001)
                .with_message(format!(
                    "unknown viewer field `{}`",
                    ck.context.strings.resolve(name)
                ))
                .with_label(span, "not a declared viewer field"),
        );
        return None;
    };
    // Each distinct viewer field lands on the enclosing declaration's
    // metadata.
    if ck.is_committing() {
        if let Some(tracker) = env.viewer_tracker() {
            tracker.borrow_mut().record(name, field.ty);
        }
    }
    Some(TyType::value(field.ty, span))
}

/// Resolve a field access.
pub fn infer_field(
    ck: &mut Checker<'_>,
    env: &Environment,
    receiver: ExprId,
    field: Name,
    span: Span,
) -> Option<TyType> {
    let arena = ck.context.arena;

    // Enum variant and service method paths: only when the receiver is
    // a bare name that is not locally shadowed.
    if let ExprKind::Ident(name) = &arena.get_expr(receiver).kind {
        if env.lookup_local(*name).is_none() {
            if let Some(info) = ck.registry.enum_info(*name) {
                if info.variants.contains(&field) {
                    let ty = TyType::value(info.ty, span);
                    ck.cache_expr(receiver, Some(ty));
                    return Some(ty);
                }
                ck.emit(
                    Diagnostic::error(ErrorCode::E2008)
                        .with_message(format!(
                            "enum `{}` has no variant `{}`",
                            ck.context.strings.resolve(*name),
                            ck.context.strings.resolve(field)
                        ))
                        .with_label(span, "unknown variant"),
                );
                ck.cache_expr(receiver, None);
                return None;
            }
        }
    }

    let recv = infer_expr(ck, env, receiver, None)?;
    match ck.types.lookup(recv.id).clone() {
        TypeData::Message { name, fields } => {
            match fields.iter().find(|f| f.name == field) {
                Some(found) => {
                    // Field occurrences inherit the receiver's behavior:
                    // a field of stored state is itself stored state.
                    Some(TyType {
                        id: found.ty,
                        behavior: recv.behavior,
                        span,
                    })
                }
                None => {
                    let shape = match name {
                        Some(n) => ck.context.strings.resolve(n).to_string(),
                        None => ck.render_type(recv.id),
                    };
                    ck.emit(
                        Diagnostic::error(ErrorCode::E2003)
                            .with_message(format!(
                                "`{shape}` has no field `{}`",
                                ck.context.strings.resolve(field)
                            ))
                            .with_label(span, "unknown field"),
                    );
                    None
                }
            }
        }
        TypeData::Maybe(_) => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2003)
                    .with_message(format!(
                        "cannot access field `{}` through `{}`",
                        ck.context.strings.resolve(field),
                        ck.render_type(recv.id)
                    ))
                    .with_label(span, "unwrap the maybe first"),
            );
            None
        }
        _ => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2003)
                    .with_message(format!(
                        "type `{}` does not support field access",
                        ck.render_type(recv.id)
                    ))
                    .with_label(span, "field access not supported"),
            );
            None
        }
    }
}

/// Resolve an index access.
pub fn infer_index(
    ck: &mut Checker<'_>,
    env: &Environment,
    receiver: ExprId,
    index: ExprId,
    span: Span,
) -> Option<TyType> {
    let compute = env.scope_as_computation();
    let recv = infer_expr(ck, &compute, receiver, None)?;
    match ck.types.lookup(recv.id).clone() {
        TypeData::List(elem) => {
            let index_ty = infer_expr(ck, &compute, index, Some(TypeId::INT))?;
            if !matches!(
                can_store(&ck.types, TypeId::INT, index_ty.id),
                rill_types::StoreJudgement::Yes
            ) {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "list index must be `int`, found `{}`",
                            ck.render_type(index_ty.id)
                        ))
                        .with_label(index_ty.span, "expected `int`"),
                );
                return None;
            }
            Some(TyType::value(elem, span))
        }
        TypeData::Map(key, value) => {
            let index_ty = infer_expr(ck, &compute, index, Some(key))?;
            if !can_store(&ck.types, key, index_ty.id).is_allowed() {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "map key must be `{}`, found `{}`",
                            ck.render_type(key),
                            ck.render_type(index_ty.id)
                        ))
                        .with_label(index_ty.span, "wrong key type"),
                );
                return None;
            }
            // A map lookup can miss, so the result is optional.
            let maybe_value = ck.types.maybe_of(value);
            Some(TyType::value(maybe_value, span))
        }
        _ => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2007)
                    .with_message(format!(
                        "type `{}` is not indexable",
                        ck.render_type(recv.id)
                    ))
                    .with_label(span, "indexing not supported"),
            );
            None
        }
    }
}
