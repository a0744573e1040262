//! Two-phase typing for structurally anonymous literals.
//!
//! Arrays, objects, and tuples move through Unestimated → Estimated →
//! Upgraded:
//!
//! 1. **Estimate**: walk children speculatively (no diagnostics, no
//!    caches, no watcher notifications) and join sibling shapes with
//!    `max_type`. An empty array proposes the empty-message placeholder
//!    element.
//! 2. **Register/dedupe**: the proposed shape interns against the
//!    global structural table, so identical shapes share one canonical
//!    type.
//! 3. **Upgrade**: commit each child against the corresponding element
//!    or field of the final type, recording optional lifts and numeric
//!    promotions, filling absent fields from declared defaults, and
//!    reporting missing required fields.
//!
//! A contextual suggestion, when present, is merged with the estimate
//! via `max_type` and the upgrade targets the merge. Children are never
//! committed twice: the estimate pass is side-effect-free precisely so
//! it can be discarded when a suggestion supersedes it.

use rustc_hash::FxHashSet;

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{ExprId, ExprKind, FieldRange, Name, Span, TypeId};
use rill_types::{can_store, max_type, MessageFieldTy, StoreJudgement, TyType, TypeData};

use crate::checker::Checker;
use crate::env::Environment;

use super::{infer_expr, must_be_compute_context};

/// Entry point for array/object/tuple literals.
pub fn type_literal(
    ck: &mut Checker<'_>,
    env: &Environment,
    id: ExprId,
    suggestion: Option<TypeId>,
    span: Span,
) -> Option<TyType> {
    if !must_be_compute_context(ck, env, span) {
        ck.cache_expr(id, None);
        return None;
    }

    let estimate = ck.speculate(|ck| estimate_expr(ck, env, id));

    let target = match (estimate, suggestion) {
        (Some(estimated), Some(suggested)) => {
            match max_type(&mut ck.types, suggested, estimated) {
                Some(joined) => Some(joined),
                None => {
                    ck.emit(
                        Diagnostic::error(ErrorCode::E2001)
                            .with_message(format!(
                                "literal shape `{}` does not fit expected type `{}`",
                                ck.render_type(estimated),
                                ck.render_type(suggested)
                            ))
                            .with_label(span, "incompatible literal"),
                    );
                    None
                }
            }
        }
        (Some(estimated), None) => Some(estimated),
        (None, Some(suggested)) => Some(suggested),
        (None, None) => {
            // Commit the children anyway so their own errors surface.
            commit_children_untargeted(ck, env, id);
            ck.emit(
                Diagnostic::error(ErrorCode::E2005)
                    .with_message("cannot infer a single type for this literal")
                    .with_label(span, "siblings have no common shape"),
            );
            None
        }
    };

    let Some(target) = target else {
        ck.cache_expr(id, None);
        return None;
    };

    upgrade_expr(ck, env, id, target, span)
}

/// Shape inference without commitment. Runs under speculation.
fn estimate_expr(ck: &mut Checker<'_>, env: &Environment, id: ExprId) -> Option<TypeId> {
    let arena = ck.context.arena;
    match &arena.get_expr(id).kind {
        ExprKind::Array(elements) => {
            let element_ids = arena.get_expr_list(*elements);
            if element_ids.is_empty() {
                // Empty array: synthesize the empty-message placeholder.
                let placeholder = ck.types.empty_message();
                return Some(ck.types.list_of(placeholder));
            }
            let mut joined: Option<TypeId> = None;
            for element in element_ids {
                let elem_ty = estimate_expr(ck, env, *element)?;
                joined = Some(match joined {
                    Some(so_far) => max_type(&mut ck.types, so_far, elem_ty)?,
                    None => elem_ty,
                });
            }
            joined.map(|elem| ck.types.list_of(elem))
        }
        ExprKind::Tuple(elements) => {
            let element_ids = arena.get_expr_list(*elements);
            let mut elems = Vec::with_capacity(element_ids.len());
            for element in element_ids {
                elems.push(estimate_expr(ck, env, *element)?);
            }
            Some(ck.types.tuple_of(elems))
        }
        ExprKind::Object(fields) => {
            let field_inits = arena.get_fields(*fields);
            let mut shape = Vec::with_capacity(field_inits.len());
            for field in field_inits {
                let value_ty = match field.value {
                    Some(value) => estimate_expr(ck, env, value)?,
                    // Shorthand { x }: the field takes x's type. Still
                    // speculative, so the lookup observes nothing.
                    None => super::infer_ident(
                        ck,
                        &env.scope_as_computation(),
                        field.name,
                        field.span,
                    )
                    .map(|t| t.id)?,
                };
                shape.push(MessageFieldTy {
                    name: field.name,
                    ty: value_ty,
                });
            }
            Some(ck.types.message_of(None, shape))
        }
        _ => infer_expr(ck, env, id, None).map(|t| t.id),
    }
}

/// Commit children with no target so their independent errors surface.
fn commit_children_untargeted(ck: &mut Checker<'_>, env: &Environment, id: ExprId) {
    let arena = ck.context.arena;
    match &arena.get_expr(id).kind {
        ExprKind::Array(elements) | ExprKind::Tuple(elements) => {
            for element in arena.get_expr_list(*elements) {
                infer_expr(ck, env, *element, None);
            }
        }
        ExprKind::Object(fields) => {
            for field in arena.get_fields(*fields) {
                if let Some(value) = field.value {
                    infer_expr(ck, env, value, None);
                }
            }
        }
        _ => {}
    }
}

/// Propagate the finally chosen type into children, committing.
fn upgrade_expr(
    ck: &mut Checker<'_>,
    env: &Environment,
    id: ExprId,
    target: TypeId,
    span: Span,
) -> Option<TyType> {
    let arena = ck.context.arena;
    let result = match &arena.get_expr(id).kind {
        ExprKind::Array(elements) => {
            let TypeData::List(elem) = ck.types.lookup(target).clone() else {
                emit_shape_mismatch(ck, "array", target, span);
                ck.cache_expr(id, None);
                return None;
            };
            for element in arena.get_expr_list(*elements) {
                upgrade_child(ck, env, *element, elem);
            }
            Some(TyType::value(target, span))
        }
        ExprKind::Tuple(elements) => {
            let TypeData::Tuple(elems) = ck.types.lookup(target).clone() else {
                emit_shape_mismatch(ck, "tuple", target, span);
                ck.cache_expr(id, None);
                return None;
            };
            let element_ids = arena.get_expr_list(*elements);
            if element_ids.len() != elems.len() {
                ck.emit(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "tuple has {} elements but type `{}` has {}",
                            element_ids.len(),
                            ck.render_type(target),
                            elems.len()
                        ))
                        .with_label(span, "wrong arity"),
                );
                ck.cache_expr(id, None);
                return None;
            }
            for (element, elem_ty) in element_ids.iter().zip(elems.iter()) {
                upgrade_child(ck, env, *element, *elem_ty);
            }
            Some(TyType::value(target, span))
        }
        ExprKind::Object(fields) => upgrade_object(ck, env, id, *fields, target, span),
        _ => None,
    };
    ck.cache_expr(id, result);
    result
}

fn emit_shape_mismatch(ck: &mut Checker<'_>, literal: &str, target: TypeId, span: Span) {
    ck.emit(
        Diagnostic::error(ErrorCode::E2001)
            .with_message(format!(
                "{literal} literal cannot have type `{}`",
                ck.render_type(target)
            ))
            .with_label(span, "incompatible literal"),
    );
}

/// Commit one child against its slot of the final type.
fn upgrade_child(ck: &mut Checker<'_>, env: &Environment, child: ExprId, expected: TypeId) {
    let arena = ck.context.arena;
    let child_span = arena.get_expr(child).span;
    if arena.get_expr(child).kind.supports_two_phase_typing() {
        // An optional slot upgrades the child to the inner shape and
        // records the lift around it.
        let (inner, lift) = match ck.types.unwrap_maybe(expected) {
            Some(inner) => (inner, true),
            None => (expected, false),
        };
        if upgrade_expr(ck, env, child, inner, child_span).is_some() && lift {
            ck.record_lift(child);
        }
        return;
    }
    let Some(child_ty) = infer_expr(ck, env, child, Some(expected)) else {
        return;
    };
    match can_store(&ck.types, expected, child_ty.id) {
        StoreJudgement::Yes => {}
        StoreJudgement::WithNumericPromotion => ck.record_promotion(child),
        StoreJudgement::WithMaybeLift => ck.record_lift(child),
        StoreJudgement::No => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!(
                        "element type `{}` does not fit `{}`",
                        ck.render_type(child_ty.id),
                        ck.render_type(expected)
                    ))
                    .with_label(child_ty.span, "incompatible element"),
            );
        }
    }
}

/// Object-literal upgrade: field-by-field commit, default fill, and
/// missing-required-field reporting.
fn upgrade_object(
    ck: &mut Checker<'_>,
    env: &Environment,
    id: ExprId,
    fields: FieldRange,
    target: TypeId,
    span: Span,
) -> Option<TyType> {
    let TypeData::Message {
        name: target_name,
        fields: declared,
    } = ck.types.lookup(target).clone()
    else {
        emit_shape_mismatch(ck, "object", target, span);
        return None;
    };

    let arena = ck.context.arena;
    let field_inits = arena.get_fields(fields);
    let mut present: FxHashSet<Name> = FxHashSet::default();

    for field in field_inits {
        if !present.insert(field.name) {
            ck.emit(
                Diagnostic::error(ErrorCode::E4001)
                    .with_message(format!(
                        "field `{}` specified more than once",
                        ck.context.strings.resolve(field.name)
                    ))
                    .with_label(field.span, "duplicate field"),
            );
            continue;
        }
        let Some(slot) = declared.iter().find(|d| d.name == field.name) else {
            ck.emit(
                Diagnostic::error(ErrorCode::E2003)
                    .with_message(format!(
                        "type `{}` has no field `{}`",
                        ck.render_type(target),
                        ck.context.strings.resolve(field.name)
                    ))
                    .with_label(field.span, "unknown field"),
            );
            continue;
        };
        match field.value {
            Some(value) => upgrade_child(ck, env, value, slot.ty),
            None => {
                // Shorthand { x }: judge the referenced binding.
                let looked_up =
                    super::infer_ident(ck, &env.scope_as_computation(), field.name, field.span);
                if let Some(found) = looked_up {
                    if !can_store(&ck.types, slot.ty, found.id).is_allowed() {
                        ck.emit(
                            Diagnostic::error(ErrorCode::E2001)
                                .with_message(format!(
                                    "field `{}` has type `{}` but `{}` was provided",
                                    ck.context.strings.resolve(field.name),
                                    ck.render_type(slot.ty),
                                    ck.render_type(found.id)
                                ))
                                .with_label(field.span, "incompatible shorthand field"),
                        );
                    }
                }
            }
        }
    }

    // Absent declared fields: declared default, optional slot, or a
    // missing-required-field diagnostic. No value is ever invented.
    let defaults = target_name.and_then(|n| ck.registry.message(n).map(|m| m.defaults.clone()));
    let mut filled: Vec<Name> = Vec::new();
    for slot in &declared {
        if present.contains(&slot.name) {
            continue;
        }
        let has_default = defaults
            .as_ref()
            .is_some_and(|d| d.contains_key(&slot.name));
        if has_default {
            filled.push(slot.name);
        } else if ck.types.unwrap_maybe(slot.ty).is_none() {
            ck.emit(
                Diagnostic::error(ErrorCode::E2006)
                    .with_message(format!(
                        "missing required field `{}` of type `{}`",
                        ck.context.strings.resolve(slot.name),
                        ck.render_type(target)
                    ))
                    .with_label(span, "field has no declared default"),
            );
        }
    }
    if ck.is_committing() && !filled.is_empty() {
        ck.output.defaults_filled.insert(id.raw(), filled);
    }

    // Anonymous shapes get a synthesized registered name for the
    // generator.
    if target_name.is_none() && ck.is_committing() {
        ck.registry.structural_name(target, ck.context.strings);
    }

    Some(TyType::value(target, span))
}
