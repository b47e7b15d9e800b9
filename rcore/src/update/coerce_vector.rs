//! Subassignment coercion table
//! Decides how the receiving vector changes type before a replacement value is written into it

use tracing::trace;

use crate::runtime::coerce::{cast_data, cast_vector, Preserve};
use crate::runtime::{RError, RResult, RType, RValue, RVector, VectorData};

/// Outcome of looking up (value kind, vector kind) in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    Keep,
    CastVector(RType),
    Fail(RError),
}

/// Element type a value contributes to a subassignment. Factors contribute their codes
/// and data frames are lists.
fn value_kind(value: &RValue) -> RType {
    match value.rtype() {
        RType::Factor => RType::Integer,
        RType::DataFrame => RType::List,
        other => other,
    }
}

/// The coercion table. The vector is widened to the value's type where the value ranks
/// higher; raw only mixes with raw and lists; functions never enter atomic storage.
pub fn coercion_for(value: &RValue, vector: &RVector) -> Coercion {
    let target = vector.element_type();
    if vector.is_factor() {
        return Coercion::Keep;
    }
    let kind = value_kind(value);
    match kind {
        RType::Null | RType::Missing => Coercion::Keep,
        _ if target == RType::List => Coercion::Keep,
        RType::Function | RType::Any => Coercion::Fail(RError::subassign_type_fix(value.type_name(), target.name())),
        RType::List => Coercion::CastVector(RType::List),
        RType::Raw if target == RType::Raw => Coercion::Keep,
        RType::Raw => Coercion::Fail(RError::subassign_type_fix("raw", target.name())),
        _ if target == RType::Raw => Coercion::Fail(RError::subassign_type_fix(kind.name(), "raw")),
        _ => match (kind.promotion_rank(), target.promotion_rank()) {
            (Some(v), Some(t)) if v > t => Coercion::CastVector(kind),
            _ => Coercion::Keep,
        },
    }
}

/// Applies the table. A widened vector is a fresh copy keeping names, dimensions and
/// attributes; otherwise the same handle comes back.
pub fn coerce_vector(value: &RValue, vector: &RVector) -> RResult<RVector> {
    match coercion_for(value, vector) {
        Coercion::Keep => Ok(vector.clone()),
        Coercion::CastVector(ty) => {
            trace!(from = %vector.element_type(), to = %ty, "widening subassignment target");
            Ok(cast_vector(vector, ty, Preserve::all()))
        }
        Coercion::Fail(e) => Err(e),
    }
}

/// Storage of `value` converted to the element type `target`. Scalars count as length-one
/// vectors; every element of a list target holds one value element.
pub fn value_data(value: &RValue, target: RType) -> VectorData {
    let data = match value {
        RValue::Vector(v) => v.data().clone(),
        RValue::Null | RValue::Missing => VectorData::empty(target),
        other => match other.to_vector() {
            Some(v) => v.data().clone(),
            None => VectorData::List(vec![other.clone()]),
        },
    };
    cast_data(&data, target)
}
