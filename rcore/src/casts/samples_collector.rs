//! Generation of argument values exercising every step of a pipeline.
//!
//! Each step emits the values it is interested in (its filter boundaries, the NA values it
//! rejects, the default it substitutes...) at its own input. An emitted value then travels
//! back through the upstream steps to the pipeline input: mappers invert it, coercions turn
//! vector-size placeholders into vectors of their target type. What arrives at the top is
//! a value a caller can pass to the pipeline.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::filter_sampler::{ArgumentFilterSampler, FilterSamplerFactory};
use super::mapper_sampler::{ArgumentMapperSampler, MapperSamplerFactory};
use super::pipeline::{CompareSubject, Filter, FilterKind, MapperKind, Pipeline, PipelineStep};
use crate::runtime::{RLogical, RType, RValue, RVector, REnvironment};
use crate::type_checking::samples::sample_string;
use crate::type_checking::{na_values, sample_values_for_type, TypeTag};

#[derive(Debug, Clone)]
pub enum SampleValue {
    Value(RValue),
    /// A vector of the given size whose element type is decided upstream
    VectorPlaceholder(i64),
}

impl SampleValue {
    /// Placeholders nobody typed become logical NA vectors.
    fn materialize(self) -> Option<RValue> {
        match self {
            SampleValue::Value(v) => Some(v),
            SampleValue::VectorPlaceholder(n) if n >= 0 => {
                Some(RValue::Vector(RVector::na_filled(RType::Logical, n as usize)))
            }
            SampleValue::VectorPlaceholder(_) => None,
        }
    }
}

type Emitter = Rc<dyn Fn(SampleValue)>;

pub struct SamplesCollector;

impl SamplesCollector {
    /// Distinct argument values reaching every step of `pipeline`.
    pub fn collect(pipeline: &Pipeline) -> Vec<RValue> {
        let collected: Rc<RefCell<Vec<RValue>>> = Rc::new(RefCell::new(Vec::new()));
        let sink: Emitter = {
            let collected = collected.clone();
            Rc::new(move |sample: SampleValue| {
                if let Some(v) = sample.materialize() {
                    let mut values = collected.borrow_mut();
                    if !values.iter().any(|known| known.identical(&v)) {
                        values.push(v);
                    }
                }
            })
        };
        Self::collect_into(pipeline, sink);
        let values = collected.borrow().clone();
        debug!(samples = values.len(), "pipeline samples collected");
        values
    }

    fn collect_into(pipeline: &Pipeline, sink: Emitter) {
        let mut emitter = sink;
        for step in pipeline.steps() {
            Self::emit(step, &emitter);
            emitter = upstream(step, emitter);
        }
    }

    fn emit(step: &PipelineStep, emitter: &Emitter) {
        let values = |vs: Vec<RValue>| vs.into_iter().for_each(|v| emitter(SampleValue::Value(v)));
        let non_vectors = || values(vec![RValue::Null, RValue::Missing]);
        match step {
            PipelineStep::FindFirst {
                default, element, ..
            } => {
                if let Some(d) = default {
                    values(vec![d.clone()]);
                }
                if let Some(tag) = element {
                    values(sample_values_for_type(*tag));
                }
                non_vectors();
            }
            PipelineStep::Coercion(c) => {
                if c.target != RType::Any {
                    if let Some(scalar) = TypeTag::scalar_of(c.target) {
                        values(sample_values_for_type(scalar));
                    }
                    values(sample_values_for_type(TypeTag::vector_of(c.target)));
                }
                non_vectors();
            }
            PipelineStep::AttributableCoercion { .. } => {
                values(vec![RValue::Env(REnvironment {
                    name: "sample".to_string(),
                })]);
                non_vectors();
            }
            PipelineStep::Map(mapper) => match mapper.kind() {
                MapperKind::MapToValue(_) => {}
                MapperKind::MapByteToBoolean => values(sample_values_for_type(TypeTag::Logical)),
                MapperKind::MapDoubleToInt => values(sample_values_for_type(TypeTag::Double)),
                MapperKind::MapToCharAt { index, default } => {
                    let prefix = sample_string(*index as i64).unwrap_or_default();
                    values(vec![
                        RValue::Str(Some(format!("{}{}", prefix, default))),
                        RValue::Str(Some(prefix)),
                        RValue::na_str(),
                    ]);
                }
            },
            PipelineStep::MapIf(map_if) => {
                emit_filter(&map_if.filter, emitter);
                for branch in [&map_if.true_branch, &map_if.false_branch].into_iter().flatten() {
                    Self::collect_into(branch, emitter.clone());
                }
            }
            PipelineStep::Filter { filter, .. } => {
                emit_filter(filter, emitter);
                non_vectors();
            }
            PipelineStep::NotNA { replacement, .. } => {
                values(na_values());
                if let Some(r) = replacement {
                    values(vec![r.clone()]);
                }
            }
            PipelineStep::BoxPrimitive => {
                values(vec![
                    RValue::Int(0),
                    RValue::Double(0.0),
                    RValue::Logical(RLogical::False),
                    RValue::str(""),
                ]);
                non_vectors();
            }
            PipelineStep::DefaultError(_) | PipelineStep::DefaultWarning(_) => {}
        }
    }
}

fn emit_filter(filter: &Filter, emitter: &Emitter) {
    match filter.kind() {
        FilterKind::And(l, r) | FilterKind::Or(l, r) => {
            emit_filter(l, emitter);
            emit_filter(r, emitter);
        }
        FilterKind::Not(inner) => emit_filter(inner, emitter),
        FilterKind::Compare {
            subject: CompareSubject::VectorSize(size),
            ..
        } => {
            for n in [size - 1, *size, size + 1] {
                emitter(SampleValue::VectorPlaceholder(n));
            }
        }
        _ => {
            let sampler = FilterSamplerFactory::create(filter);
            for v in sampler.samples().values() {
                emitter(SampleValue::Value(v.clone()));
            }
        }
    }
}

/// Emitter receiving values at the output of `step` and passing them on to its input.
fn upstream(step: &PipelineStep, next: Emitter) -> Emitter {
    match step {
        PipelineStep::Coercion(c) if c.target != RType::Any => {
            let target = c.target;
            Rc::new(move |sample: SampleValue| match sample {
                SampleValue::VectorPlaceholder(n) if n >= 0 => next(SampleValue::Value(
                    RValue::Vector(RVector::na_filled(target, n as usize)),
                )),
                SampleValue::VectorPlaceholder(_) => {}
                value => next(value),
            })
        }
        PipelineStep::Map(mapper) => {
            let sampler = MapperSamplerFactory::create(mapper);
            Rc::new(move |sample: SampleValue| match sample {
                SampleValue::Value(v) => {
                    if let Some(input) = sampler.inverse(&v) {
                        next(SampleValue::Value(input));
                    }
                }
                placeholder => next(placeholder),
            })
        }
        _ => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casts::pipeline::{CompareOp, Mapper, PipelineBuilder};
    use crate::runtime::{RError, INT_NA};

    fn contains(values: &[RValue], v: &RValue) -> bool {
        values.iter().any(|x| x.identical(v))
    }

    #[test]
    fn test_filter_boundaries_and_non_vectors() {
        let p = PipelineBuilder::new()
            .as_integer_vector()
            .find_first_or(0)
            .must_be(Filter::gt(0))
            .build();
        let values = SamplesCollector::collect(&p);
        assert!(contains(&values, &RValue::Int(1)));
        assert!(contains(&values, &RValue::Int(0)));
        assert!(contains(&values, &RValue::Null));
        assert!(contains(&values, &RValue::Missing));
    }

    #[test]
    fn test_size_placeholders_take_coercion_type() {
        let p = PipelineBuilder::new()
            .as_double_vector()
            .must_be(Filter::size(CompareOp::Eq, 2))
            .build();
        let values = SamplesCollector::collect(&p);
        // the double vector samples have lengths 3 and 4; length 2 comes from the size filter
        assert!(values.iter().any(
            |v| matches!(v, RValue::Vector(x) if x.element_type() == RType::Double && x.len() == 2)
        ));
    }

    #[test]
    fn test_untyped_placeholders_are_logical() {
        let p = PipelineBuilder::new()
            .must_be(Filter::size(CompareOp::Gt, 0))
            .build();
        let values = SamplesCollector::collect(&p);
        let logicals = values
            .iter()
            .filter(|v| matches!(v, RValue::Vector(x) if x.element_type() == RType::Logical))
            .count();
        // sizes 0 and 1, the placeholder for -1 is dropped
        assert_eq!(logicals, 2);
    }

    #[test]
    fn test_mapper_inverts_downstream_values() {
        let p = PipelineBuilder::new()
            .as_string_vector()
            .find_first()
            .map(Mapper::char_at(1, ' '))
            .must_be(Filter::eq('b' as i32))
            .build();
        let values = SamplesCollector::collect(&p);
        assert!(contains(&values, &RValue::str("ab")));
        assert!(contains(&values, &RValue::str("ac")));
    }

    #[test]
    fn test_not_na_emits_na_values() {
        let p = PipelineBuilder::new()
            .as_integer_vector()
            .find_first()
            .must_not_be_na(RError::Custom("NA".into()))
            .build();
        let values = SamplesCollector::collect(&p);
        assert!(contains(&values, &RValue::Int(INT_NA)));
    }

    #[test]
    fn test_branches_are_collected() {
        let branch = PipelineBuilder::new().as_string_vector().build();
        let p = PipelineBuilder::new()
            .map_if_else(Filter::integer_value(), Some(branch), None)
            .build();
        let values = SamplesCollector::collect(&p);
        assert!(contains(&values, &RValue::str("abc")));
        assert!(contains(&values, &RValue::Int(0)));
    }
}
