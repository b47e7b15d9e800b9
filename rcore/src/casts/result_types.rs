//! Static result types of argument pipelines.
//!
//! The analyser threads a [`TypeExpr`] through every execution path of a pipeline and
//! returns the union of the path results. Filters narrow, coercions go through the cast
//! tables in [`super::specializations`], mappers replace the type with their result type.

use std::rc::Rc;

use tracing::trace;

use super::pipeline::{
    rtype_filter_classes, CompareSubject, Filter, FilterKind, MapIfStep, Mapper, MapperKind,
    Pipeline, PipelineStep,
};
use super::specializations::{attributable_result, boxed, coercion_result};
use super::visitor::ExecutionPathVisitor;
use crate::config::AnalysisConfig;
use crate::runtime::{RType, RValue};
use crate::type_checking::{element_type, na_values, Predicate, TypeExpr, TypeTag};

const PRIMITIVES: [TypeTag; 4] = [
    TypeTag::Integer,
    TypeTag::Double,
    TypeTag::Logical,
    TypeTag::Character,
];

fn without(input: &TypeExpr, tags: &[TypeTag]) -> TypeExpr {
    tags.iter()
        .fold(input.clone(), |acc, t| acc.and(&TypeExpr::atom(*t).not()))
}

fn not_null_or_missing(expr: TypeExpr) -> TypeExpr {
    without(&expr, &[TypeTag::Null, TypeTag::Missing])
}

fn filter_predicate(filter: &Filter) -> Predicate {
    let filter = filter.clone();
    Rc::new(move |v: &RValue| filter.test(v))
}

/// Type of the values accepted by `filter` when the argument is known to be `previous`.
pub fn filter_type(filter: &Filter, previous: &TypeExpr) -> TypeExpr {
    match filter.kind() {
        FilterKind::Type(tags) => not_null_or_missing(TypeExpr::union(tags.iter().copied())),
        FilterKind::RType(ty) => not_null_or_missing(TypeExpr::union(rtype_filter_classes(*ty))),
        FilterKind::Compare { subject, .. } => {
            let subject_type = match subject {
                CompareSubject::ScalarValue(_, ty) | CompareSubject::NATest(ty) => {
                    scalar_type(*ty)
                }
                _ => previous.clone(),
            };
            subject_type.lower_with(filter.site(), Some(filter_predicate(filter)))
        }
        FilterKind::And(left, right) => {
            let left_type = filter_type(left, previous);
            let right_type = filter_type(right, &previous.and(&left_type));
            left_type.and(&right_type)
        }
        FilterKind::Or(left, right) => filter_type(left, previous).or(&filter_type(right, previous)),
        FilterKind::Not(inner) => filter_type(inner, previous).not(),
        FilterKind::Matrix(_) | FilterKind::Double(_) => {
            previous.lower_with(filter.site(), Some(filter_predicate(filter)))
        }
        FilterKind::Null => TypeExpr::atom(TypeTag::Null),
        FilterKind::Missing => TypeExpr::atom(TypeTag::Missing),
    }
}

fn scalar_type(ty: RType) -> TypeExpr {
    match TypeTag::scalar_of(ty) {
        Some(tag) => TypeExpr::atom(tag),
        None => TypeExpr::anything(),
    }
}

/// Result type of `mapper`; nothing maps to nothing.
pub fn mapper_type(mapper: &Mapper, input: &TypeExpr) -> TypeExpr {
    if input.is_nothing() {
        return TypeExpr::nothing();
    }
    match mapper.kind() {
        MapperKind::MapToValue(value) => {
            let expected = value.clone();
            let predicate: Predicate = Rc::new(move |v: &RValue| v.identical(&expected));
            TypeExpr::atom(TypeTag::of(value))
                .lower_with(mapper.site(), Some(predicate))
                .with_positive_samples([value.clone()])
        }
        MapperKind::MapByteToBoolean => TypeExpr::atom(TypeTag::Boolean),
        MapperKind::MapDoubleToInt | MapperKind::MapToCharAt { .. } => {
            TypeExpr::atom(TypeTag::Integer)
        }
    }
}

/// Computes the result types of pipelines.
#[derive(Debug, Clone, Default)]
pub struct ResultTypesAnalyser {
    config: AnalysisConfig,
}

impl ResultTypesAnalyser {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Result type for an unconstrained argument.
    pub fn analyse(&mut self, pipeline: &Pipeline) -> TypeExpr {
        self.analyse_from(pipeline, TypeExpr::anything())
    }

    pub fn analyse_from(&mut self, pipeline: &Pipeline, input: TypeExpr) -> TypeExpr {
        let paths = self.visit_paths(pipeline, input);
        trace!(paths = paths.len(), "pipeline analysed");
        paths
            .iter()
            .fold(TypeExpr::nothing(), |acc, t| acc.or(t))
            .truncate_samples(self.config.max_samples)
    }

    /// Result type of a single step.
    pub fn step_result(&self, step: &PipelineStep, input: &TypeExpr) -> TypeExpr {
        let result = match step {
            PipelineStep::FindFirst {
                default, element, ..
            } => find_first_result(input, *element, default.as_ref()),
            PipelineStep::Coercion(coercion) => {
                coercion_result(coercion, input, self.config.include_implicit_casts)
            }
            PipelineStep::AttributableCoercion { .. } => attributable_result(input),
            PipelineStep::Map(mapper) => mapper_type(mapper, input),
            PipelineStep::MapIf(map_if) => {
                // only reached when a step is analysed outside of a path walk
                self.branch_result(map_if, input, true)
                    .or(&self.branch_result(map_if, input, false))
            }
            PipelineStep::Filter {
                filter, is_warning, ..
            } => {
                if *is_warning {
                    input.clone()
                } else {
                    input.and(&filter_type(filter, input))
                }
            }
            PipelineStep::NotNA {
                site, replacement, ..
            } => {
                let not_na: Predicate = Rc::new(|v: &RValue| !v.is_na());
                let kept = input
                    .lower_with(*site, Some(not_na))
                    .with_negative_samples(na_values());
                match replacement {
                    Some(r) => kept.or(&TypeExpr::atom(TypeTag::of(r)).with_positive_samples([r.clone()])),
                    None => kept,
                }
            }
            PipelineStep::BoxPrimitive => boxed(input).or(&without(input, &PRIMITIVES)),
            PipelineStep::DefaultError(_) | PipelineStep::DefaultWarning(_) => input.clone(),
        };
        trace!(step = ?step.kind(), result = %result, "step analysed");
        result
    }

    fn branch_result(&self, step: &MapIfStep, input: &TypeExpr, true_branch: bool) -> TypeExpr {
        let accepted = filter_type(&step.filter, input);
        if true_branch {
            input.and(&accepted)
        } else {
            input.and(&accepted.not())
        }
    }
}

fn find_first_result(
    input: &TypeExpr,
    element: Option<TypeTag>,
    default: Option<&RValue>,
) -> TypeExpr {
    let elements = match element {
        Some(tag) => TypeExpr::atom(tag),
        None => input
            .classify()
            .into_iter()
            .filter(|t| !matches!(t, TypeTag::Null | TypeTag::Missing))
            .fold(TypeExpr::nothing(), |acc, t| acc.or(&element_type(t))),
    };
    match default {
        Some(value) => elements
            .or(&TypeExpr::atom(TypeTag::of(value)))
            .with_positive_samples([value.clone()]),
        None => not_null_or_missing(elements),
    }
}

impl ExecutionPathVisitor for ResultTypesAnalyser {
    type State = TypeExpr;

    fn visit_step(&mut self, step: &PipelineStep, state: TypeExpr) -> TypeExpr {
        self.step_result(step, &state)
    }

    fn visit_branch(&mut self, step: &MapIfStep, state: TypeExpr, true_branch: bool) -> TypeExpr {
        self.branch_result(step, &state, true_branch)
    }
}
