//! Samplers for argument filters.
//!
//! Every filter gets a table of values it must accept and values it must reject. The tables
//! are checked against [`Filter::test`] when the sampler is built; a table the filter
//! disagrees with is a declaration bug and panics.

use super::pipeline::{
    rtype_filter_classes, CompareOp, CompareSubject, DoubleOp, Filter, FilterKind, MatrixOp,
};
use super::result_types::filter_type;
use crate::runtime::coerce::cast_data;
use crate::runtime::{
    double_na, internal_error, RComplex, RLogical, RType, RValue, RVector, VectorData, INT_NA,
};
use crate::type_checking::samples::sample_string;
use crate::type_checking::{sample_values_for_type, Samples, TypeExpr, TypeTag};

pub trait ArgumentFilterSampler {
    fn filter(&self) -> &Filter;

    /// Samples of the filter alone, independent of any input type.
    fn samples(&self) -> Samples;

    fn test(&self, value: &RValue) -> bool {
        self.filter().test(value)
    }

    fn true_branch_type(&self) -> TypeExpr {
        filter_type(self.filter(), &TypeExpr::anything())
    }

    fn false_branch_type(&self) -> TypeExpr {
        self.true_branch_type().not()
    }

    /// Samples restricted to `input`, plus `input`'s own samples split by the filter.
    fn collect_samples(&self, input: &TypeExpr) -> Samples {
        let own = self.samples();
        let mut positive: Vec<RValue> = own
            .positive()
            .iter()
            .filter(|v| input.is_instance(v))
            .cloned()
            .collect();
        let mut negative: Vec<RValue> = own
            .negative()
            .iter()
            .filter(|v| input.is_instance(v))
            .cloned()
            .collect();
        for v in input.samples().values() {
            if self.test(v) {
                positive.push(v.clone());
            } else {
                negative.push(v.clone());
            }
        }
        Samples::new(positive, negative)
    }
}

// ============================================================================
// LEAF FILTERS
// ============================================================================

pub struct ValueFilterSampler {
    filter: Filter,
    samples: Samples,
}

impl ValueFilterSampler {
    pub fn new(filter: Filter) -> Self {
        let samples = leaf_samples(&filter);
        if let Some(bad) = samples.positive().iter().find(|v| !filter.test(v)) {
            internal_error(format!("filter {:?} rejects its positive sample {}", filter.kind(), bad));
        }
        if let Some(bad) = samples.negative().iter().find(|v| filter.test(v)) {
            internal_error(format!("filter {:?} accepts its negative sample {}", filter.kind(), bad));
        }
        Self { filter, samples }
    }
}

impl ArgumentFilterSampler for ValueFilterSampler {
    fn filter(&self) -> &Filter {
        &self.filter
    }

    fn samples(&self) -> Samples {
        self.samples.clone()
    }
}

fn strings(lengths: &[i64]) -> Vec<RValue> {
    lengths
        .iter()
        .filter_map(|n| sample_string(*n))
        .map(|s| RValue::Str(Some(s)))
        .collect()
}

fn sized(lengths: &[i64]) -> Vec<RValue> {
    lengths
        .iter()
        .filter(|n| **n >= 0)
        .map(|n| RValue::ints(vec![0; *n as usize]))
        .collect()
}

fn matrix(rows: usize, cols: usize) -> RValue {
    let data = VectorData::Int(vec![0; rows * cols]);
    match RVector::with_dims(data, vec![rows, cols]) {
        Ok(m) => RValue::Vector(m),
        Err(e) => internal_error(e),
    }
}

fn repeated(value: &RValue, ty: RType, len: usize) -> RValue {
    let items = VectorData::List(vec![value.clone(); len]);
    RValue::Vector(RVector::from_data(cast_data(&items, ty)))
}

fn other_than(value: &RValue) -> RValue {
    if value.is_null() {
        RValue::Missing
    } else {
        RValue::Null
    }
}

fn scalar_samples(value: &RValue, ty: RType, op: CompareOp) -> Samples {
    use CompareOp::*;
    let (positive, negative) = match (op, ty, value) {
        (Same, ..) | (Eq, RType::Any | RType::Complex | RType::Raw, _) => {
            (vec![value.clone()], vec![other_than(value)])
        }
        (_, RType::Integer, RValue::Int(i)) => {
            let (p, n) = match op {
                Eq => (vec![*i], vec![i.wrapping_add(1)]),
                Gt => (vec![i.wrapping_add(1)], vec![*i]),
                Lt => (vec![i.wrapping_sub(1)], vec![*i]),
                Ge => (vec![*i], vec![i.wrapping_sub(1)]),
                _ => (vec![*i], vec![i.wrapping_add(1)]),
            };
            (
                p.into_iter().map(RValue::Int).collect(),
                n.into_iter().map(RValue::Int).collect(),
            )
        }
        (_, RType::Double, RValue::Double(d)) => {
            let (p, n) = match op {
                Eq => (*d, d + 1.0),
                Gt => (d + 1.0, *d),
                Lt => (d - 1.0, *d),
                Ge => (*d, d - 1.0),
                _ => (*d, d + 1.0),
            };
            (vec![RValue::Double(p)], vec![RValue::Double(n)])
        }
        (Eq, RType::Character, _) => (vec![value.clone()], vec![RValue::na_str()]),
        (Eq, RType::Logical, RValue::Logical(l)) => (
            vec![value.clone()],
            [RLogical::True, RLogical::False, RLogical::Na]
                .into_iter()
                .filter(|o| o != l)
                .map(RValue::Logical)
                .collect(),
        ),
        _ => internal_error(format!(
            "no samples for {:?} comparison with {} of type {}",
            op,
            value,
            ty.name()
        )),
    };
    Samples::new(positive, negative)
}

fn na_test_samples(ty: RType) -> Samples {
    let negative = match ty {
        RType::Integer => vec![RValue::Int(0)],
        RType::Double => vec![RValue::Double(0.0)],
        RType::Logical => vec![
            RValue::Logical(RLogical::True),
            RValue::Logical(RLogical::False),
        ],
        RType::Character => vec![RValue::str("")],
        RType::Complex => vec![RValue::Complex(RComplex::new(0.0, 0.0))],
        other => internal_error(format!("no NA test for type {}", other.name())),
    };
    let positive = match ty {
        RType::Integer => RValue::Int(INT_NA),
        RType::Double => RValue::Double(double_na()),
        RType::Logical => RValue::Logical(RLogical::Na),
        RType::Character => RValue::na_str(),
        _ => RValue::Complex(RComplex::na()),
    };
    Samples::new(vec![positive], negative)
}

fn compare_samples(subject: &CompareSubject, op: CompareOp) -> Samples {
    use CompareOp::*;
    match subject {
        CompareSubject::ScalarValue(value, ty) => scalar_samples(value, *ty, op),
        CompareSubject::NATest(ty) => {
            if op != Eq {
                internal_error(format!("unsupported NA test operator {:?}", op));
            }
            na_test_samples(*ty)
        }
        CompareSubject::StringLength(n) => {
            let n = *n;
            let (p, q) = match op {
                Eq => ([n], [n + 1]),
                Gt => ([n + 1], [n]),
                Lt => ([n - 1], [n]),
                Ge => ([n], [n - 1]),
                Le => ([n], [n + 1]),
                Same => internal_error("string length has no identity comparison"),
            };
            Samples::new(strings(&p), strings(&q))
        }
        CompareSubject::VectorSize(s) => {
            let s = *s;
            let (p, q): (Vec<i64>, Vec<i64>) = match op {
                Eq => (vec![s], vec![s - 1, s + 1]),
                Gt => (vec![s + 1], vec![s - 1, s]),
                Lt => (vec![s - 1], vec![s, s + 1]),
                Ge => (vec![s], vec![s - 1]),
                Le => (vec![s], vec![s + 1]),
                Same => internal_error("vector size has no identity comparison"),
            };
            Samples::new(sized(&p), sized(&q))
        }
        CompareSubject::ElementAt { index, value, ty } => {
            if op != Eq {
                internal_error(format!("unsupported element comparison {:?}", op));
            }
            Samples::new(
                vec![repeated(value, *ty, index + 1)],
                vec![repeated(value, *ty, *index)],
            )
        }
        CompareSubject::Dim { dim, size } => {
            if *dim >= 2 {
                internal_error(format!("dimension {} of a matrix", dim));
            }
            let shaped = |n: usize| {
                if *dim == 0 {
                    matrix(n, 1)
                } else {
                    matrix(1, n)
                }
            };
            match op {
                Eq => Samples::new(vec![shaped(*size)], vec![shaped(size + 1)]),
                Gt => Samples::new(vec![shaped(size + 1)], vec![shaped(*size)]),
                other => internal_error(format!("unsupported dimension comparison {:?}", other)),
            }
        }
    }
}

fn leaf_samples(filter: &Filter) -> Samples {
    match filter.kind() {
        FilterKind::Type(tags) => {
            let positive = tags
                .iter()
                .flat_map(|t| sample_values_for_type(*t))
                .filter(|v| !matches!(v, RValue::Null | RValue::Missing))
                .collect();
            Samples::new(positive, vec![RValue::Null])
        }
        FilterKind::RType(ty) => {
            let positive = rtype_filter_classes(*ty)
                .into_iter()
                .flat_map(sample_values_for_type)
                .collect();
            Samples::new(positive, vec![RValue::Null])
        }
        FilterKind::Compare { subject, op } => compare_samples(subject, *op),
        FilterKind::Matrix(MatrixOp::IsMatrix) => {
            Samples::new(vec![matrix(2, 2)], vec![RValue::ints(vec![0; 4])])
        }
        FilterKind::Matrix(MatrixOp::IsSquareMatrix) => {
            Samples::new(vec![matrix(2, 2)], vec![matrix(2, 3)])
        }
        FilterKind::Double(DoubleOp::IsFinite) => Samples::new(
            vec![RValue::Double(0.0)],
            vec![RValue::Double(double_na())],
        ),
        FilterKind::Double(DoubleOp::IsFractional) => Samples::new(
            vec![RValue::Double(0.5)],
            vec![RValue::Double(0.0), RValue::Double(double_na())],
        ),
        FilterKind::Null => Samples::new(vec![RValue::Null], vec![RValue::Missing, RValue::Int(0)]),
        FilterKind::Missing => Samples::new(vec![RValue::Missing], vec![RValue::Null]),
        FilterKind::And(..) | FilterKind::Or(..) | FilterKind::Not(_) => {
            internal_error("compound filter sampled as a leaf")
        }
    }
}

// ============================================================================
// COMPOUND FILTERS
// ============================================================================

pub struct AndFilterSampler {
    filter: Filter,
    left: Box<dyn ArgumentFilterSampler>,
    right: Box<dyn ArgumentFilterSampler>,
}

impl ArgumentFilterSampler for AndFilterSampler {
    fn filter(&self) -> &Filter {
        &self.filter
    }

    fn samples(&self) -> Samples {
        let (l, r) = (self.left.samples(), self.right.samples());
        let positive = l
            .positive()
            .iter()
            .filter(|v| self.right.test(v))
            .chain(r.positive().iter().filter(|v| self.left.test(v)))
            .cloned()
            .collect();
        let negative = l.negative().iter().chain(r.negative()).cloned().collect();
        Samples::new(positive, negative)
    }
}

pub struct OrFilterSampler {
    filter: Filter,
    left: Box<dyn ArgumentFilterSampler>,
    right: Box<dyn ArgumentFilterSampler>,
}

impl ArgumentFilterSampler for OrFilterSampler {
    fn filter(&self) -> &Filter {
        &self.filter
    }

    fn samples(&self) -> Samples {
        let (l, r) = (self.left.samples(), self.right.samples());
        let positive = l.positive().iter().chain(r.positive()).cloned().collect();
        let negative = l
            .negative()
            .iter()
            .filter(|v| !self.right.test(v))
            .chain(r.negative().iter().filter(|v| !self.left.test(v)))
            .cloned()
            .collect();
        Samples::new(positive, negative)
    }
}

pub struct NotFilterSampler {
    filter: Filter,
    inner: Box<dyn ArgumentFilterSampler>,
}

impl ArgumentFilterSampler for NotFilterSampler {
    fn filter(&self) -> &Filter {
        &self.filter
    }

    fn samples(&self) -> Samples {
        self.inner.samples().swap()
    }
}

pub struct FilterSamplerFactory;

impl FilterSamplerFactory {
    pub fn create(filter: &Filter) -> Box<dyn ArgumentFilterSampler> {
        match filter.kind() {
            FilterKind::And(l, r) => Box::new(AndFilterSampler {
                filter: filter.clone(),
                left: Self::create(l),
                right: Self::create(r),
            }),
            FilterKind::Or(l, r) => Box::new(OrFilterSampler {
                filter: filter.clone(),
                left: Self::create(l),
                right: Self::create(r),
            }),
            FilterKind::Not(inner) => Box::new(NotFilterSampler {
                filter: filter.clone(),
                inner: Self::create(inner),
            }),
            _ => Box::new(ValueFilterSampler::new(filter.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves() -> Vec<Filter> {
        let mut filters = vec![
            Filter::instance_of(&[TypeTag::Integer, TypeTag::StringVector]),
            Filter::matrix(),
            Filter::square_matrix(),
            Filter::finite(),
            Filter::fractional(),
            Filter::null_value(),
            Filter::missing_value(),
            Filter::element_at(2, "x"),
            Filter::dim_eq(0, 3),
            Filter::dim_gt(1, 0),
            Filter::same(RValue::Null),
            Filter::eq(RValue::Logical(RLogical::True)),
        ];
        for ty in [
            RType::Integer,
            RType::Double,
            RType::Logical,
            RType::Character,
            RType::Complex,
            RType::Raw,
        ] {
            filters.push(Filter::rtype(ty));
        }
        for ty in [
            RType::Integer,
            RType::Double,
            RType::Logical,
            RType::Character,
            RType::Complex,
        ] {
            filters.push(Filter::is_na(ty));
        }
        for op in [CompareOp::Eq, CompareOp::Gt, CompareOp::Lt, CompareOp::Ge, CompareOp::Le] {
            filters.push(Filter::string_length(op, 2));
            filters.push(Filter::size(op, 1));
            filters.push(Filter::compare(
                CompareSubject::ScalarValue(RValue::Int(3), RType::Integer),
                op,
            ));
            filters.push(Filter::compare(
                CompareSubject::ScalarValue(RValue::Double(0.5), RType::Double),
                op,
            ));
        }
        filters.push(Filter::eq("abc"));
        filters
    }

    #[test]
    fn test_leaf_tables_agree_with_filters() {
        for f in leaves() {
            let sampler = FilterSamplerFactory::create(&f);
            let samples = sampler.samples();
            assert!(!samples.positive().is_empty(), "{:?}", f.kind());
            assert!(!samples.negative().is_empty(), "{:?}", f.kind());
        }
    }

    #[test]
    fn test_and_sampler_keeps_common_positives() {
        let f = Filter::string_value().and(Filter::string_length(CompareOp::Gt, 0));
        let samples = FilterSamplerFactory::create(&f).samples();
        assert!(samples.positive().iter().all(|v| f.test(v)));
        assert!(samples.negative().iter().all(|v| !f.test(v)));
        assert!(samples.positive().contains(&RValue::str("a")));
    }

    #[test]
    fn test_or_and_not_samplers() {
        let f = Filter::null_value().or(Filter::missing_value());
        let samples = FilterSamplerFactory::create(&f).samples();
        assert!(samples.positive().iter().all(|v| f.test(v)));
        assert_eq!(samples.negative(), &[RValue::Int(0)]);

        let g = Filter::finite().not();
        let sampler = FilterSamplerFactory::create(&g);
        let samples = sampler.samples();
        assert!(samples.positive().iter().all(|v| g.test(v)));
        assert!(samples.negative().iter().all(|v| !g.test(v)));
    }

    #[test]
    fn test_branch_types_partition_values() {
        let sampler = FilterSamplerFactory::create(&Filter::integer_value());
        let t = sampler.true_branch_type();
        let f = sampler.false_branch_type();
        for v in [RValue::Int(1), RValue::str("a"), RValue::Null] {
            assert_ne!(t.is_instance(&v), f.is_instance(&v));
            assert_eq!(t.is_instance(&v), sampler.test(&v));
        }
    }

    #[test]
    fn test_collect_samples_restricts_to_input() {
        let sampler = FilterSamplerFactory::create(&Filter::gt(3));
        let input = TypeExpr::atom(TypeTag::Integer)
            .with_positive_samples([RValue::Int(10), RValue::Int(-4)]);
        let samples = sampler.collect_samples(&input);
        assert!(samples.positive().contains(&RValue::Int(10)));
        assert!(samples.positive().contains(&RValue::Int(4)));
        assert!(samples.negative().contains(&RValue::Int(-4)));
        let strings = TypeExpr::atom(TypeTag::Character);
        assert!(sampler.collect_samples(&strings).is_empty());
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn test_third_dimension_is_unsupported() {
        FilterSamplerFactory::create(&Filter::dim_eq(2, 1));
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn test_ordering_strings_is_unsupported() {
        FilterSamplerFactory::create(&Filter::gt("a"));
    }
}
