//! Samplers for argument mappers: the result type of a mapper and the inverse image of
//! sample values it produces.

use super::pipeline::{Mapper, MapperKind};
use super::result_types::mapper_type;
use crate::runtime::{double_na, RLogical, RValue, INT_NA};
use crate::type_checking::samples::sample_string;
use crate::type_checking::{Samples, TypeExpr};

pub trait ArgumentMapperSampler {
    fn mapper(&self) -> &Mapper;

    /// Input value producing `output`, if the mapper can produce it at all.
    fn inverse(&self, output: &RValue) -> Option<RValue>;

    fn map(&self, value: &RValue) -> RValue {
        self.mapper().map(value)
    }

    fn result_types(&self, input: &TypeExpr) -> TypeExpr {
        mapper_type(self.mapper(), input)
    }

    /// Inputs mapping onto the samples of the downstream steps, on the same side.
    fn collect_samples(&self, downstream: &Samples) -> Samples {
        let invert = |values: &[RValue]| -> Vec<RValue> {
            values.iter().filter_map(|v| self.inverse(v)).collect()
        };
        Samples::new(invert(downstream.positive()), invert(downstream.negative()))
    }
}

/// A constant has no inverse.
pub struct MapToValueSampler {
    mapper: Mapper,
}

impl ArgumentMapperSampler for MapToValueSampler {
    fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    fn inverse(&self, _output: &RValue) -> Option<RValue> {
        None
    }
}

pub struct ByteToBooleanSampler {
    mapper: Mapper,
}

impl ArgumentMapperSampler for ByteToBooleanSampler {
    fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    fn inverse(&self, output: &RValue) -> Option<RValue> {
        match output {
            RValue::Bool(b) => Some(RValue::Logical(RLogical::from_bool(*b))),
            _ => None,
        }
    }
}

pub struct DoubleToIntSampler {
    mapper: Mapper,
}

impl ArgumentMapperSampler for DoubleToIntSampler {
    fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    fn inverse(&self, output: &RValue) -> Option<RValue> {
        match output {
            RValue::Int(i) if *i == INT_NA => Some(RValue::Double(double_na())),
            RValue::Int(i) => Some(RValue::Double(*i as f64)),
            _ => None,
        }
    }
}

pub struct CharAtSampler {
    mapper: Mapper,
    index: usize,
}

impl ArgumentMapperSampler for CharAtSampler {
    fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    fn inverse(&self, output: &RValue) -> Option<RValue> {
        match output {
            RValue::Int(i) if *i == INT_NA => Some(RValue::na_str()),
            RValue::Int(code) => {
                let c = char::from_u32(u32::try_from(*code).ok()?)?;
                let mut s = sample_string(self.index as i64)?;
                s.push(c);
                Some(RValue::Str(Some(s)))
            }
            _ => None,
        }
    }
}

pub struct MapperSamplerFactory;

impl MapperSamplerFactory {
    pub fn create(mapper: &Mapper) -> Box<dyn ArgumentMapperSampler> {
        let mapper_copy = mapper.clone();
        match mapper.kind() {
            MapperKind::MapToValue(_) => Box::new(MapToValueSampler { mapper: mapper_copy }),
            MapperKind::MapByteToBoolean => Box::new(ByteToBooleanSampler { mapper: mapper_copy }),
            MapperKind::MapDoubleToInt => Box::new(DoubleToIntSampler { mapper: mapper_copy }),
            MapperKind::MapToCharAt { index, .. } => Box::new(CharAtSampler {
                mapper: mapper_copy,
                index: *index,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_checking::TypeTag;

    #[test]
    fn test_inverse_maps_back() {
        let cases = [
            (Mapper::to_boolean(), RValue::Bool(true)),
            (Mapper::double_to_int(), RValue::Int(42)),
            (Mapper::char_at(2, ' '), RValue::Int('z' as i32)),
        ];
        for (mapper, output) in cases {
            let sampler = MapperSamplerFactory::create(&mapper);
            let input = sampler.inverse(&output).expect("invertible");
            assert_eq!(sampler.map(&input), output);
        }
    }

    #[test]
    fn test_collect_samples_keeps_sides() {
        let sampler = MapperSamplerFactory::create(&Mapper::to_boolean());
        let downstream = Samples::new(vec![RValue::Bool(true)], vec![RValue::Bool(false)]);
        let samples = sampler.collect_samples(&downstream);
        assert_eq!(samples.positive(), &[RValue::Logical(RLogical::True)]);
        assert_eq!(samples.negative(), &[RValue::Logical(RLogical::False)]);
    }

    #[test]
    fn test_constant_has_no_inverse() {
        let sampler = MapperSamplerFactory::create(&Mapper::constant(1));
        let downstream = Samples::positive_only(vec![RValue::Int(1)]);
        assert!(sampler.collect_samples(&downstream).is_empty());
        assert!(sampler
            .result_types(&TypeExpr::anything())
            .is_instance(&RValue::Int(1)));
    }

    #[test]
    fn test_na_inverses() {
        let sampler = MapperSamplerFactory::create(&Mapper::char_at(0, 'x'));
        assert_eq!(sampler.inverse(&RValue::Int(INT_NA)), Some(RValue::na_str()));
        let sampler = MapperSamplerFactory::create(&Mapper::double_to_int());
        let back = sampler.inverse(&RValue::Int(INT_NA)).expect("NA");
        assert!(back.is_na());
        assert_eq!(
            sampler.result_types(&TypeExpr::atom(TypeTag::Double)),
            TypeExpr::atom(TypeTag::Integer)
        );
    }
}
