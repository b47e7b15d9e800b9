// Cast tables of the builtin coercions
// One table per coercion target; the analyser narrows the incoming type through them

use crate::runtime::{internal_error, RType};
use crate::type_checking::{Cast, Casts, TypeExpr, TypeTag};

use super::pipeline::CoercionStep;

const SCALARS: [TypeTag; 6] = [
    TypeTag::Integer,
    TypeTag::Double,
    TypeTag::Logical,
    TypeTag::Character,
    TypeTag::Complex,
    TypeTag::Raw,
];

fn scalar_target(target: RType) -> TypeTag {
    match TypeTag::scalar_of(target) {
        Some(tag) if target.is_atomic() => tag,
        _ => internal_error(format!("no coercion table for R type '{}'", target.name())),
    }
}

/// `as.<type>` vector coercion: scalars stay scalars of the target type, every vector
/// becomes a plain vector of it, `NULL` and missing are passed on.
pub fn vector_casts(target: RType) -> Casts {
    let scalar = scalar_target(target);
    let mut casts: Vec<Cast> = SCALARS.iter().map(|s| Cast::full(*s, scalar)).collect();
    casts.push(Cast::full(TypeTag::Null, TypeTag::Null));
    casts.push(Cast::full(TypeTag::Missing, TypeTag::Missing));
    casts.push(Cast::full(TypeTag::AbstractVector, TypeTag::vector_of(target)));
    Casts::new(casts)
}

/// Scalar-only coercion: vectors keep their class.
pub fn base_casts(target: RType) -> Casts {
    let scalar = scalar_target(target);
    let mut casts: Vec<Cast> = SCALARS.iter().map(|s| Cast::full(*s, scalar)).collect();
    casts.push(Cast::full(TypeTag::Null, TypeTag::Null));
    casts.push(Cast::full(TypeTag::Missing, TypeTag::Missing));
    casts.push(Cast::full(TypeTag::AbstractVector, TypeTag::AbstractVector));
    Casts::new(casts)
}

/// Table used by a coercion step. Complex and raw have no scalar-only form.
pub fn casts_for(step: &CoercionStep) -> Casts {
    match step.target {
        RType::Complex | RType::Raw => vector_casts(step.target),
        target if step.vector_coercion => vector_casts(target),
        target => base_casts(target),
    }
}

/// Length-one vector classes the primitive scalars of `input` are boxed into.
pub fn boxed(input: &TypeExpr) -> TypeExpr {
    SCALARS
        .iter()
        .chain(std::iter::once(&TypeTag::Boolean))
        .filter(|s| !input.and(&TypeExpr::atom(**s)).is_nothing())
        .filter_map(|s| s.box_type())
        .fold(TypeExpr::nothing(), |acc, b| acc.or(&TypeExpr::atom(b)))
}

fn non_vector() -> TypeExpr {
    TypeExpr::union([TypeTag::Null, TypeTag::Missing])
}

/// Result type of a coercion step applied to `input`.
pub fn coercion_result(step: &CoercionStep, input: &TypeExpr, include_implicits: bool) -> TypeExpr {
    let result = if step.target == RType::Any {
        let kept = input.and(&TypeExpr::union([TypeTag::Function, TypeTag::AbstractVector]));
        kept.or(&boxed(input))
    } else {
        casts_for(step).narrow(input, include_implicits)
    };
    if step.preserve_non_vector {
        result.or(&input.and(&non_vector()))
    } else {
        result
    }
}

/// Result type of `as_attributable`: attributable values, `NULL`, missing and boxed scalars.
pub fn attributable_result(input: &TypeExpr) -> TypeExpr {
    let kept = input.and(&TypeExpr::union([
        TypeTag::Attributable,
        TypeTag::Null,
        TypeTag::Missing,
    ]));
    kept.or(&boxed(input))
}
