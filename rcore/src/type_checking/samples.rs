//! Example values attached to type expressions, filters and mappers.
//!
//! Positive samples belong to the described set, negative samples do not. The sets are
//! kept disjoint; when a value lands on both sides the negative side wins.

use std::f64::consts::PI;

use super::types::{TypeTag, ALL_TAGS};
use crate::runtime::{double_na, RComplex, RLogical, RValue, RVector, VectorData, INT_NA};

#[derive(Debug, Clone, Default)]
pub struct Samples {
    positive: Vec<RValue>,
    negative: Vec<RValue>,
}

fn push_unique(into: &mut Vec<RValue>, value: RValue) {
    if !into.iter().any(|v| v.identical(&value)) {
        into.push(value);
    }
}

fn contains(values: &[RValue], value: &RValue) -> bool {
    values.iter().any(|v| v.identical(value))
}

impl Samples {
    pub fn new(positive: Vec<RValue>, negative: Vec<RValue>) -> Self {
        let mut samples = Samples::default();
        for v in negative {
            push_unique(&mut samples.negative, v);
        }
        for v in positive {
            if !contains(&samples.negative, &v) {
                push_unique(&mut samples.positive, v);
            }
        }
        samples
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn positive_only(values: Vec<RValue>) -> Self {
        Self::new(values, Vec::new())
    }

    pub fn negative_only(values: Vec<RValue>) -> Self {
        Self::new(Vec::new(), values)
    }

    pub fn positive(&self) -> &[RValue] {
        &self.positive
    }

    pub fn negative(&self) -> &[RValue] {
        &self.negative
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    /// Every sample, positives first.
    pub fn values(&self) -> impl Iterator<Item = &RValue> {
        self.positive.iter().chain(self.negative.iter())
    }

    pub fn swap(&self) -> Samples {
        Samples {
            positive: self.negative.clone(),
            negative: self.positive.clone(),
        }
    }

    /// Keeps the samples, on either side, that satisfy `keep`.
    pub fn filter(&self, keep: impl Fn(&RValue) -> bool) -> Samples {
        Samples {
            positive: self.positive.iter().filter(|v| keep(v)).cloned().collect(),
            negative: self.negative.iter().filter(|v| keep(v)).cloned().collect(),
        }
    }

    pub fn with_positive(mut self, values: impl IntoIterator<Item = RValue>) -> Samples {
        for v in values {
            if !contains(&self.negative, &v) {
                push_unique(&mut self.positive, v);
            }
        }
        self
    }

    pub fn with_negative(mut self, values: impl IntoIterator<Item = RValue>) -> Samples {
        for v in values {
            self.positive.retain(|p| !p.identical(&v));
            push_unique(&mut self.negative, v);
        }
        self
    }

    /// Re-splits every sample of `pools` by `member`.
    pub fn classify<'a, F>(pools: impl IntoIterator<Item = &'a Samples>, member: F) -> Samples
    where
        F: Fn(&RValue) -> bool,
    {
        let mut result = Samples::default();
        for pool in pools {
            for v in pool.values() {
                if member(v) {
                    push_unique(&mut result.positive, v.clone());
                } else {
                    push_unique(&mut result.negative, v.clone());
                }
            }
        }
        result.positive.retain(|p| !contains(&result.negative, p));
        result
    }

    pub fn truncate(mut self, max: usize) -> Samples {
        self.positive.truncate(max);
        self.negative.truncate(max);
        self
    }
}

// ============================================================================
// SAMPLE VALUES PER TYPE
// ============================================================================

/// NA scalar of an atomic class (or of the element type of an atomic vector class).
pub fn na_value(tag: TypeTag) -> Option<RValue> {
    Some(match tag {
        TypeTag::Integer | TypeTag::IntVector | TypeTag::AbstractIntVector | TypeTag::Factor => {
            RValue::Int(INT_NA)
        }
        TypeTag::Double | TypeTag::DoubleVector | TypeTag::AbstractDoubleVector => {
            RValue::Double(double_na())
        }
        TypeTag::Logical | TypeTag::LogicalVector | TypeTag::AbstractLogicalVector => {
            RValue::Logical(RLogical::Na)
        }
        TypeTag::Character | TypeTag::StringVector | TypeTag::AbstractStringVector => {
            RValue::Str(None)
        }
        TypeTag::Complex | TypeTag::ComplexVector | TypeTag::AbstractComplexVector => {
            RValue::Complex(RComplex::na())
        }
        _ => return None,
    })
}

/// All NA scalars.
pub fn na_values() -> Vec<RValue> {
    [
        TypeTag::Integer,
        TypeTag::Double,
        TypeTag::Logical,
        TypeTag::Character,
        TypeTag::Complex,
    ]
    .iter()
    .filter_map(|t| na_value(*t))
    .collect()
}

fn vector(data: VectorData) -> RValue {
    RValue::Vector(RVector::from_data(data))
}

fn factor(codes: Vec<i32>, levels: &[&str]) -> RValue {
    let v = RVector::from_data(VectorData::Int(codes));
    v.set_attr("levels", RValue::strings(levels));
    v.set_attr("class", RValue::str("factor"));
    RValue::Vector(v)
}

fn data_frame() -> RValue {
    let v = RVector::from_data(VectorData::List(vec![RValue::ints(vec![1, 2])]));
    v.set_names(Some(vec![Some("a".to_string())]));
    v.set_attr("class", RValue::str("data.frame"));
    RValue::Vector(v)
}

/// Representative values of one class; interfaces get the samples of their classes.
pub fn sample_values_for_type(tag: TypeTag) -> Vec<RValue> {
    if tag.is_interface() {
        return ALL_TAGS
            .iter()
            .filter(|t| !t.is_interface() && tag.is_assignable_from(**t))
            .flat_map(|t| sample_values_for_type(*t))
            .collect();
    }
    match tag {
        TypeTag::Integer => vec![RValue::Int(0), RValue::Int(1), RValue::Int(-1), RValue::Int(INT_NA)],
        TypeTag::Double => vec![
            RValue::Double(0.0),
            RValue::Double(PI),
            RValue::Double(-PI),
            RValue::Double(double_na()),
        ],
        TypeTag::Logical => vec![
            RValue::Logical(RLogical::True),
            RValue::Logical(RLogical::False),
            RValue::Logical(RLogical::Na),
        ],
        TypeTag::Character => vec![RValue::str(""), RValue::str("abc"), RValue::Str(None)],
        TypeTag::Complex => vec![
            RValue::Complex(RComplex::new(0.0, 0.0)),
            RValue::Complex(RComplex::new(PI, -PI)),
            RValue::Complex(RComplex::na()),
        ],
        TypeTag::Raw => vec![RValue::Raw(0), RValue::Raw(255)],
        TypeTag::Boolean => vec![RValue::Bool(true), RValue::Bool(false)],
        TypeTag::Null => vec![RValue::Null],
        TypeTag::Missing => vec![RValue::Missing],
        TypeTag::Function => vec![RValue::function("f")],
        TypeTag::Environment => vec![RValue::Env(crate::runtime::REnvironment {
            name: "sample".to_string(),
        })],
        TypeTag::IntVector => vec![
            vector(VectorData::Int(vec![-1, 0, 1])),
            vector(VectorData::Int(vec![-1, 0, 1, INT_NA])),
            vector(VectorData::Int(vec![INT_NA, INT_NA])),
        ],
        TypeTag::Factor => vec![factor(vec![1, 2, 1], &["a", "b"])],
        TypeTag::DoubleVector => vec![
            vector(VectorData::Double(vec![-PI, 0.0, PI])),
            vector(VectorData::Double(vec![-PI, 0.0, PI, double_na()])),
        ],
        TypeTag::LogicalVector => vec![
            vector(VectorData::Logical(vec![RLogical::True, RLogical::False])),
            vector(VectorData::Logical(vec![RLogical::True, RLogical::Na])),
        ],
        TypeTag::StringVector => vec![
            vector(VectorData::Str(vec![Some("abc".into()), Some("".into())])),
            vector(VectorData::Str(vec![Some("abc".into()), None])),
        ],
        TypeTag::ComplexVector => vec![vector(VectorData::Complex(vec![
            RComplex::new(0.0, 0.0),
            RComplex::new(PI, -PI),
        ]))],
        TypeTag::RawVector => vec![vector(VectorData::Raw(vec![0, 255]))],
        TypeTag::List => vec![
            vector(VectorData::List(vec![RValue::Int(1), RValue::str("a")])),
            vector(VectorData::List(vec![])),
        ],
        TypeTag::DataFrame => vec![data_frame()],
        _ => Vec::new(),
    }
}

/// Edge-case values of a class: NULL, an empty vector, the NA scalar and an NA vector.
pub fn pseudo_values_for_type(tag: TypeTag) -> Vec<RValue> {
    let mut values = vec![RValue::Null];
    if let Some(ty) = element_rtype(tag) {
        values.push(RValue::Vector(RVector::na_filled(ty, 0)));
        if let Some(na) = na_value(tag) {
            values.push(na);
            values.push(RValue::Vector(RVector::na_filled(ty, 2)));
        }
    }
    values
}

fn element_rtype(tag: TypeTag) -> Option<crate::runtime::RType> {
    use crate::runtime::RType;
    Some(match tag {
        TypeTag::Integer | TypeTag::IntVector | TypeTag::AbstractIntVector => RType::Integer,
        TypeTag::Double | TypeTag::DoubleVector | TypeTag::AbstractDoubleVector => RType::Double,
        TypeTag::Logical | TypeTag::LogicalVector | TypeTag::AbstractLogicalVector => {
            RType::Logical
        }
        TypeTag::Character | TypeTag::StringVector | TypeTag::AbstractStringVector => {
            RType::Character
        }
        TypeTag::Complex | TypeTag::ComplexVector | TypeTag::AbstractComplexVector => {
            RType::Complex
        }
        TypeTag::Raw | TypeTag::RawVector | TypeTag::AbstractRawVector => RType::Raw,
        TypeTag::List | TypeTag::AbstractListVector => RType::List,
        _ => return None,
    })
}

/// String of `len` repeated `a`s; `None` for negative lengths.
pub fn sample_string(len: i64) -> Option<String> {
    (len >= 0).then(|| "a".repeat(len as usize))
}
