// Per-step samplers of a pipeline
// Samplers are looked up by step kind in a registry filled once on first use

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::filter_sampler::{ArgumentFilterSampler, FilterSamplerFactory};
use super::mapper_sampler::{ArgumentMapperSampler, MapperSamplerFactory};
use super::pipeline::{PipelineStep, StepKind};
use super::result_types::ResultTypesAnalyser;
use crate::runtime::{internal_error, RValue};
use crate::type_checking::{na_values, Samples, TypeExpr};

pub trait CastNodeSampler {
    fn step(&self) -> &PipelineStep;

    fn result_types(&self, input: &TypeExpr) -> TypeExpr {
        ResultTypesAnalyser::default().step_result(self.step(), input)
    }

    /// Samples of the step input, given `input`'s type and the samples the steps
    /// downstream of this one were found to accept (positive) or reject (negative).
    fn collect_samples(&self, input: &TypeExpr, downstream: &Samples) -> Samples;
}

type SamplerFactory = fn(&PipelineStep) -> Box<dyn CastNodeSampler>;

lazy_static! {
    static ref SAMPLERS: HashMap<StepKind, SamplerFactory> = {
        let mut m: HashMap<StepKind, SamplerFactory> = HashMap::new();
        m.insert(StepKind::Coercion, PassThroughSampler::create);
        m.insert(StepKind::AttributableCoercion, PassThroughSampler::create);
        m.insert(StepKind::BoxPrimitive, PassThroughSampler::create);
        m.insert(StepKind::DefaultError, PassThroughSampler::create);
        m.insert(StepKind::DefaultWarning, PassThroughSampler::create);
        m.insert(StepKind::Filter, FilterStepSampler::create);
        m.insert(StepKind::MapIf, MapIfSampler::create);
        m.insert(StepKind::Map, MapStepSampler::create);
        m.insert(StepKind::FindFirst, FindFirstSampler::create);
        m.insert(StepKind::NotNA, NotNASampler::create);
        m
    };
}

pub fn create_sampler(step: &PipelineStep) -> Box<dyn CastNodeSampler> {
    match SAMPLERS.get(&step.kind()) {
        Some(factory) => factory(step),
        None => internal_error(format!("no sampler registered for {:?}", step.kind())),
    }
}

/// Steps whose input samples are the downstream samples, e.g. a coercion to the
/// argument's own type.
struct PassThroughSampler {
    step: PipelineStep,
}

impl PassThroughSampler {
    fn create(step: &PipelineStep) -> Box<dyn CastNodeSampler> {
        Box::new(Self { step: step.clone() })
    }
}

impl CastNodeSampler for PassThroughSampler {
    fn step(&self) -> &PipelineStep {
        &self.step
    }

    fn collect_samples(&self, _input: &TypeExpr, downstream: &Samples) -> Samples {
        downstream.clone()
    }
}

struct FilterStepSampler {
    step: PipelineStep,
    filter: Box<dyn ArgumentFilterSampler>,
    is_warning: bool,
}

impl FilterStepSampler {
    fn create(step: &PipelineStep) -> Box<dyn CastNodeSampler> {
        let PipelineStep::Filter {
            filter, is_warning, ..
        } = step
        else {
            internal_error(format!("filter sampler for {:?}", step.kind()));
        };
        Box::new(Self {
            step: step.clone(),
            filter: FilterSamplerFactory::create(filter),
            is_warning: *is_warning,
        })
    }
}

impl CastNodeSampler for FilterStepSampler {
    fn step(&self) -> &PipelineStep {
        &self.step
    }

    fn collect_samples(&self, input: &TypeExpr, downstream: &Samples) -> Samples {
        let own = self.filter.collect_samples(input);
        if self.is_warning {
            // a warning never stops the value
            let positive = own.values().chain(downstream.positive()).cloned().collect();
            return Samples::new(positive, downstream.negative().to_vec());
        }
        let (passing, failing): (Vec<RValue>, Vec<RValue>) = downstream
            .positive()
            .iter()
            .cloned()
            .partition(|v| self.filter.test(v));
        let positive = own.positive().iter().cloned().chain(passing).collect();
        let negative = own
            .negative()
            .iter()
            .chain(downstream.negative())
            .cloned()
            .chain(failing)
            .collect();
        Samples::new(positive, negative)
    }
}

struct MapIfSampler {
    step: PipelineStep,
    filter: Box<dyn ArgumentFilterSampler>,
}

impl MapIfSampler {
    fn create(step: &PipelineStep) -> Box<dyn CastNodeSampler> {
        let PipelineStep::MapIf(map_if) = step else {
            internal_error(format!("map-if sampler for {:?}", step.kind()));
        };
        Box::new(Self {
            step: step.clone(),
            filter: FilterSamplerFactory::create(&map_if.filter),
        })
    }
}

impl CastNodeSampler for MapIfSampler {
    fn step(&self) -> &PipelineStep {
        &self.step
    }

    /// Both sides of the condition continue, so every filter sample is an accepted input.
    fn collect_samples(&self, input: &TypeExpr, downstream: &Samples) -> Samples {
        let own = self.filter.collect_samples(input);
        Samples::new(
            own.values().chain(downstream.positive()).cloned().collect(),
            downstream.negative().to_vec(),
        )
    }
}

struct MapStepSampler {
    step: PipelineStep,
    mapper: Box<dyn ArgumentMapperSampler>,
}

impl MapStepSampler {
    fn create(step: &PipelineStep) -> Box<dyn CastNodeSampler> {
        let PipelineStep::Map(mapper) = step else {
            internal_error(format!("map sampler for {:?}", step.kind()));
        };
        Box::new(Self {
            step: step.clone(),
            mapper: MapperSamplerFactory::create(mapper),
        })
    }
}

impl CastNodeSampler for MapStepSampler {
    fn step(&self) -> &PipelineStep {
        &self.step
    }

    fn collect_samples(&self, _input: &TypeExpr, downstream: &Samples) -> Samples {
        self.mapper.collect_samples(downstream)
    }
}

struct FindFirstSampler {
    step: PipelineStep,
    has_default: bool,
}

impl FindFirstSampler {
    fn create(step: &PipelineStep) -> Box<dyn CastNodeSampler> {
        let PipelineStep::FindFirst { default, .. } = step else {
            internal_error(format!("find-first sampler for {:?}", step.kind()));
        };
        Box::new(Self {
            step: step.clone(),
            has_default: default.is_some(),
        })
    }
}

impl CastNodeSampler for FindFirstSampler {
    fn step(&self) -> &PipelineStep {
        &self.step
    }

    /// A scalar is its own first element; `NULL` and missing only get through with a default.
    fn collect_samples(&self, _input: &TypeExpr, downstream: &Samples) -> Samples {
        let empty = [RValue::Null, RValue::Missing];
        if self.has_default {
            downstream.clone().with_positive(empty)
        } else {
            downstream.clone().with_negative(empty)
        }
    }
}

struct NotNASampler {
    step: PipelineStep,
    replaces: bool,
}

impl NotNASampler {
    fn create(step: &PipelineStep) -> Box<dyn CastNodeSampler> {
        let PipelineStep::NotNA { replacement, .. } = step else {
            internal_error(format!("not-NA sampler for {:?}", step.kind()));
        };
        Box::new(Self {
            step: step.clone(),
            replaces: replacement.is_some(),
        })
    }
}

impl CastNodeSampler for NotNASampler {
    fn step(&self) -> &PipelineStep {
        &self.step
    }

    fn collect_samples(&self, input: &TypeExpr, downstream: &Samples) -> Samples {
        let nas = na_values().into_iter().filter(|v| input.is_instance(v));
        if self.replaces {
            downstream.clone().with_positive(nas)
        } else {
            downstream.clone().with_negative(nas)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casts::pipeline::{Filter, Mapper, PipelineBuilder};
    use crate::runtime::{RError, RLogical, INT_NA};
    use crate::type_checking::TypeTag;

    fn only_step(builder: PipelineBuilder) -> PipelineStep {
        builder.build().steps()[0].clone()
    }

    #[test]
    fn test_every_step_kind_has_a_sampler() {
        let steps = [
            only_step(PipelineBuilder::new().as_integer_vector()),
            only_step(PipelineBuilder::new().as_attributable(true, true, true)),
            only_step(PipelineBuilder::new().box_primitive()),
            only_step(PipelineBuilder::new().default_error(RError::Custom("e".into()))),
            only_step(PipelineBuilder::new().default_warning(RError::Custom("w".into()))),
            only_step(PipelineBuilder::new().must_be(Filter::integer_value())),
            only_step(PipelineBuilder::new().map_if(Filter::null_value(), Mapper::constant(1))),
            only_step(PipelineBuilder::new().map(Mapper::double_to_int())),
            only_step(PipelineBuilder::new().find_first()),
            only_step(PipelineBuilder::new().replace_na(0)),
        ];
        for step in &steps {
            assert_eq!(create_sampler(step).step().kind(), step.kind());
        }
    }

    #[test]
    fn test_same_type_coercion_round_trips_samples() {
        let step = only_step(PipelineBuilder::new().as_integer_vector());
        let downstream = Samples::new(vec![RValue::ints(vec![1, 2])], vec![RValue::Null]);
        let samples =
            create_sampler(&step).collect_samples(&TypeExpr::atom(TypeTag::IntVector), &downstream);
        assert_eq!(samples.positive(), downstream.positive());
        assert_eq!(samples.negative(), downstream.negative());
    }

    #[test]
    fn test_filter_rejects_failing_downstream_positives() {
        let step = only_step(PipelineBuilder::new().must_be(Filter::gt(0)));
        let downstream = Samples::positive_only(vec![RValue::Int(5), RValue::Int(-5)]);
        let samples =
            create_sampler(&step).collect_samples(&TypeExpr::atom(TypeTag::Integer), &downstream);
        assert!(samples.positive().contains(&RValue::Int(5)));
        assert!(samples.negative().contains(&RValue::Int(-5)));
    }

    #[test]
    fn test_find_first_default_accepts_null() {
        let with_default = only_step(PipelineBuilder::new().find_first_or(1));
        let without = only_step(PipelineBuilder::new().find_first());
        let input = TypeExpr::anything();
        let s = create_sampler(&with_default).collect_samples(&input, &Samples::empty());
        assert!(s.positive().contains(&RValue::Null));
        let s = create_sampler(&without).collect_samples(&input, &Samples::empty());
        assert!(s.negative().contains(&RValue::Missing));
    }

    #[test]
    fn test_not_na_and_map_samples() {
        let step = only_step(PipelineBuilder::new().must_not_be_na(RError::Custom("na".into())));
        let s = create_sampler(&step).collect_samples(&TypeExpr::atom(TypeTag::Integer), &Samples::empty());
        assert_eq!(s.negative(), &[RValue::Int(INT_NA)]);

        let step = only_step(PipelineBuilder::new().map(Mapper::to_boolean()));
        let downstream = Samples::positive_only(vec![RValue::Bool(false)]);
        let s = create_sampler(&step).collect_samples(&TypeExpr::anything(), &downstream);
        assert_eq!(s.positive(), &[RValue::Logical(RLogical::False)]);
    }
}
