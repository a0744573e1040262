//! Structural joins and store judgements.
//!
//! There are no unification variables in Rill: a literal proposes a
//! shape, the checker joins it against siblings or a contextual
//! suggestion with [`max_type`], and assignments/returns are judged with
//! [`can_store`]. Both produce concrete answers, never constraints.

use rill_ir::TypeId;

use crate::data::{MessageFieldTy, TypeData};
use crate::interner::TypeInterner;

/// Whether (and how) a value type may be stored into a target type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StoreJudgement {
    /// Identical types.
    Yes,
    /// Storable after widening int → long → double.
    WithNumericPromotion,
    /// Storable after lifting the value into `maybe`.
    WithMaybeLift,
    /// Not storable.
    No,
}

impl StoreJudgement {
    /// Whether the store is possible at all.
    pub fn is_allowed(self) -> bool {
        !matches!(self, StoreJudgement::No)
    }
}

/// Judge whether `value` may be stored into `target`.
pub fn can_store(types: &TypeInterner, target: TypeId, value: TypeId) -> StoreJudgement {
    if target == value {
        return StoreJudgement::Yes;
    }
    let target_data = types.lookup(target);
    let value_data = types.lookup(value);

    if let (Some(target_rank), Some(value_rank)) =
        (target_data.numeric_rank(), value_data.numeric_rank())
    {
        return if value_rank < target_rank {
            StoreJudgement::WithNumericPromotion
        } else {
            StoreJudgement::No
        };
    }

    if let TypeData::Maybe(inner) = target_data {
        return match can_store(types, *inner, value) {
            StoreJudgement::Yes | StoreJudgement::WithNumericPromotion => {
                StoreJudgement::WithMaybeLift
            }
            _ => StoreJudgement::No,
        };
    }

    StoreJudgement::No
}

/// Compute the structural join ("max type") of two types.
///
/// Returns `None` when the types have no common shape. The join widens
/// numerics, absorbs into `maybe`, recurses element-wise through
/// containers, and unions anonymous message fields — a field present on
/// only one side becomes optional in the join.
pub fn max_type(types: &mut TypeInterner, a: TypeId, b: TypeId) -> Option<TypeId> {
    if a == b {
        return Some(a);
    }

    let a_data = types.lookup(a).clone();
    let b_data = types.lookup(b).clone();

    // Numeric widening: int < long < double.
    if let (Some(a_rank), Some(b_rank)) = (a_data.numeric_rank(), b_data.numeric_rank()) {
        return Some(if a_rank >= b_rank { a } else { b });
    }

    // maybe absorbs: the join of maybe<X> and Y is maybe<join(X, Y)>.
    match (&a_data, &b_data) {
        (TypeData::Maybe(a_inner), TypeData::Maybe(b_inner)) => {
            let joined = max_type(types, *a_inner, *b_inner)?;
            return Some(types.maybe_of(joined));
        }
        (TypeData::Maybe(a_inner), _) => {
            let joined = max_type(types, *a_inner, b)?;
            return Some(types.maybe_of(joined));
        }
        (_, TypeData::Maybe(b_inner)) => {
            let joined = max_type(types, a, *b_inner)?;
            return Some(types.maybe_of(joined));
        }
        _ => {}
    }

    match (&a_data, &b_data) {
        (TypeData::List(a_elem), TypeData::List(b_elem)) => {
            let joined = max_type(types, *a_elem, *b_elem)?;
            Some(types.list_of(joined))
        }
        (TypeData::Map(a_key, a_val), TypeData::Map(b_key, b_val)) => {
            let key = max_type(types, *a_key, *b_key)?;
            let value = max_type(types, *a_val, *b_val)?;
            Some(types.map_of(key, value))
        }
        (TypeData::Pair(a_left, a_right), TypeData::Pair(b_left, b_right)) => {
            let left = max_type(types, *a_left, *b_left)?;
            let right = max_type(types, *a_right, *b_right)?;
            Some(types.pair_of(left, right))
        }
        (TypeData::Tuple(a_elems), TypeData::Tuple(b_elems)) => {
            if a_elems.len() != b_elems.len() {
                return None;
            }
            let pairs: Vec<(TypeId, TypeId)> =
                a_elems.iter().copied().zip(b_elems.iter().copied()).collect();
            let mut joined = Vec::with_capacity(pairs.len());
            for (x, y) in pairs {
                joined.push(max_type(types, x, y)?);
            }
            Some(types.tuple_of(joined))
        }
        (
            TypeData::Message { name: None, fields: a_fields },
            TypeData::Message { name: None, fields: b_fields },
        ) => {
            let fields = join_anonymous_fields(types, a_fields, b_fields)?;
            Some(types.message_of(None, fields))
        }
        // A named message absorbs an anonymous shape whose fields all
        // store into the declared field types; the declared identity wins.
        (TypeData::Message { name: Some(_), fields }, TypeData::Message { name: None, .. }) => {
            anonymous_fits_named(types, &b_data, fields).then_some(a)
        }
        (TypeData::Message { name: None, .. }, TypeData::Message { name: Some(_), fields }) => {
            anonymous_fits_named(types, &a_data, fields).then_some(b)
        }
        _ => None,
    }
}

/// Union two anonymous field sets: shared fields join, one-sided fields
/// become optional.
fn join_anonymous_fields(
    types: &mut TypeInterner,
    a_fields: &[MessageFieldTy],
    b_fields: &[MessageFieldTy],
) -> Option<Vec<MessageFieldTy>> {
    let mut out: Vec<MessageFieldTy> = Vec::with_capacity(a_fields.len().max(b_fields.len()));
    for a_field in a_fields {
        match b_fields.iter().find(|f| f.name == a_field.name) {
            Some(b_field) => {
                let joined = max_type(types, a_field.ty, b_field.ty)?;
                out.push(MessageFieldTy {
                    name: a_field.name,
                    ty: joined,
                });
            }
            None => {
                let lifted = types.maybe_of(a_field.ty);
                out.push(MessageFieldTy {
                    name: a_field.name,
                    ty: lifted,
                });
            }
        }
    }
    for b_field in b_fields {
        if !a_fields.iter().any(|f| f.name == b_field.name) {
            let lifted = types.maybe_of(b_field.ty);
            out.push(MessageFieldTy {
                name: b_field.name,
                ty: lifted,
            });
        }
    }
    Some(out)
}

/// Whether an anonymous message shape fits inside a named declaration:
/// every anonymous field must exist on the declaration and store into
/// its declared type. Missing declared fields are the upgrade pass's
/// concern (defaults or a missing-field diagnostic), not a join failure.
fn anonymous_fits_named(
    types: &TypeInterner,
    anonymous: &TypeData,
    declared_fields: &[MessageFieldTy],
) -> bool {
    let TypeData::Message { name: None, fields } = anonymous else {
        return false;
    };
    fields.iter().all(|field| {
        declared_fields
            .iter()
            .find(|d| d.name == field.name)
            .is_some_and(|d| can_store(types, d.ty, field.ty).is_allowed())
    })
}
