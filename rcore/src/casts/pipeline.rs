//! Declarative argument pipelines.
//!
//! A builtin declares, once, how each argument is validated and converted: a linear chain of
//! [`PipelineStep`]s where `MapIf` steps fork into nested branch pipelines. Pipelines are
//! immutable once built; the analyser, the samples collector and the executor only read them.

use crate::runtime::{internal_error, RError, RLogical, RType, RValue};
use crate::type_checking::{MarkLookup, SiteId, TypeTag};

// ============================================================================
// FILTERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    /// Identity rather than value equality
    Same,
}

/// What a comparison filter looks at.
#[derive(Debug, Clone)]
pub enum CompareSubject {
    ScalarValue(RValue, RType),
    NATest(RType),
    StringLength(i64),
    VectorSize(i64),
    ElementAt { index: usize, value: RValue, ty: RType },
    Dim { dim: usize, size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixOp {
    IsMatrix,
    IsSquareMatrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleOp {
    IsFinite,
    IsFractional,
}

#[derive(Debug, Clone)]
pub enum FilterKind {
    /// Instance of one of the classes; never NULL or missing
    Type(Vec<TypeTag>),
    /// Scalar or vector of the given R type
    RType(RType),
    Compare {
        subject: CompareSubject,
        op: CompareOp,
    },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    Matrix(MatrixOp),
    Double(DoubleOp),
    Null,
    Missing,
}

/// A predicate over argument values, carrying the identity of its construction site.
#[derive(Debug, Clone)]
pub struct Filter {
    site: SiteId,
    kind: FilterKind,
}

impl Filter {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            site: SiteId::fresh(),
            kind,
        }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// Binds this filter's site to `name`, see [`MarkLookup`].
    pub fn mark(mut self, name: &str) -> Self {
        self.site = MarkLookup::site(name);
        self
    }

    pub fn instance_of(tags: &[TypeTag]) -> Self {
        Self::new(FilterKind::Type(tags.to_vec()))
    }

    pub fn rtype(ty: RType) -> Self {
        Self::new(FilterKind::RType(ty))
    }

    pub fn integer_value() -> Self {
        Self::rtype(RType::Integer)
    }

    pub fn double_value() -> Self {
        Self::rtype(RType::Double)
    }

    pub fn logical_value() -> Self {
        Self::rtype(RType::Logical)
    }

    pub fn string_value() -> Self {
        Self::rtype(RType::Character)
    }

    pub fn atomic_integer_value() -> Self {
        Self::instance_of(&[TypeTag::Integer])
    }

    pub fn atomic_logical_value() -> Self {
        Self::instance_of(&[TypeTag::Logical])
    }

    pub fn compare(subject: CompareSubject, op: CompareOp) -> Self {
        Self::new(FilterKind::Compare { subject, op })
    }

    fn scalar(value: RValue, op: CompareOp) -> Self {
        let ty = match &value {
            RValue::Int(_) => RType::Integer,
            RValue::Double(_) => RType::Double,
            RValue::Logical(_) => RType::Logical,
            RValue::Str(_) => RType::Character,
            RValue::Complex(_) => RType::Complex,
            RValue::Raw(_) => RType::Raw,
            _ => RType::Any,
        };
        Self::compare(CompareSubject::ScalarValue(value, ty), op)
    }

    pub fn eq(value: impl Into<RValue>) -> Self {
        Self::scalar(value.into(), CompareOp::Eq)
    }

    pub fn gt(value: impl Into<RValue>) -> Self {
        Self::scalar(value.into(), CompareOp::Gt)
    }

    pub fn lt(value: impl Into<RValue>) -> Self {
        Self::scalar(value.into(), CompareOp::Lt)
    }

    pub fn gte(value: impl Into<RValue>) -> Self {
        Self::scalar(value.into(), CompareOp::Ge)
    }

    pub fn lte(value: impl Into<RValue>) -> Self {
        Self::scalar(value.into(), CompareOp::Le)
    }

    pub fn same(value: impl Into<RValue>) -> Self {
        Self::scalar(value.into(), CompareOp::Same)
    }

    pub fn is_na(ty: RType) -> Self {
        Self::compare(CompareSubject::NATest(ty), CompareOp::Eq)
    }

    pub fn string_length(op: CompareOp, length: i64) -> Self {
        Self::compare(CompareSubject::StringLength(length), op)
    }

    pub fn size(op: CompareOp, size: i64) -> Self {
        Self::compare(CompareSubject::VectorSize(size), op)
    }

    pub fn element_at(index: usize, value: impl Into<RValue>) -> Self {
        let value = value.into();
        let ty = value.rtype();
        Self::compare(CompareSubject::ElementAt { index, value, ty }, CompareOp::Eq)
    }

    pub fn dim_eq(dim: usize, size: usize) -> Self {
        Self::compare(CompareSubject::Dim { dim, size }, CompareOp::Eq)
    }

    pub fn dim_gt(dim: usize, size: usize) -> Self {
        Self::compare(CompareSubject::Dim { dim, size }, CompareOp::Gt)
    }

    pub fn matrix() -> Self {
        Self::new(FilterKind::Matrix(MatrixOp::IsMatrix))
    }

    pub fn square_matrix() -> Self {
        Self::new(FilterKind::Matrix(MatrixOp::IsSquareMatrix))
    }

    pub fn finite() -> Self {
        Self::new(FilterKind::Double(DoubleOp::IsFinite))
    }

    pub fn fractional() -> Self {
        Self::new(FilterKind::Double(DoubleOp::IsFractional))
    }

    pub fn null_value() -> Self {
        Self::new(FilterKind::Null)
    }

    pub fn missing_value() -> Self {
        Self::new(FilterKind::Missing)
    }

    pub fn and(self, other: Filter) -> Self {
        Self::new(FilterKind::And(Box::new(self), Box::new(other)))
    }

    pub fn or(self, other: Filter) -> Self {
        Self::new(FilterKind::Or(Box::new(self), Box::new(other)))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(FilterKind::Not(Box::new(self)))
    }

    /// Type filters narrow the static type; value filters only refine it.
    pub fn is_narrowing(&self) -> bool {
        match &self.kind {
            FilterKind::Type(_) | FilterKind::RType(_) | FilterKind::Null | FilterKind::Missing => {
                true
            }
            FilterKind::Compare { .. } | FilterKind::Matrix(_) | FilterKind::Double(_) => false,
            FilterKind::And(l, r) => l.is_narrowing() || r.is_narrowing(),
            FilterKind::Or(l, r) => l.is_narrowing() && r.is_narrowing(),
            FilterKind::Not(f) => f.is_narrowing(),
        }
    }

    pub fn test(&self, value: &RValue) -> bool {
        match &self.kind {
            FilterKind::Type(tags) => {
                let class = TypeTag::of(value);
                !matches!(value, RValue::Null | RValue::Missing)
                    && tags.iter().any(|t| t.is_assignable_from(class))
            }
            FilterKind::RType(ty) => {
                let class = TypeTag::of(value);
                rtype_filter_classes(*ty)
                    .iter()
                    .any(|t| t.is_assignable_from(class))
            }
            FilterKind::Compare { subject, op } => compare(subject, *op, value),
            FilterKind::And(l, r) => l.test(value) && r.test(value),
            FilterKind::Or(l, r) => l.test(value) || r.test(value),
            FilterKind::Not(f) => !f.test(value),
            FilterKind::Matrix(op) => match value.as_vector().and_then(|v| v.dims()) {
                Some(dims) if dims.len() == 2 => match op {
                    MatrixOp::IsMatrix => true,
                    MatrixOp::IsSquareMatrix => dims[0] == dims[1],
                },
                _ => false,
            },
            FilterKind::Double(op) => match value {
                RValue::Double(d) => match op {
                    DoubleOp::IsFinite => d.is_finite(),
                    DoubleOp::IsFractional => d.is_finite() && *d != d.floor(),
                },
                _ => false,
            },
            FilterKind::Null => matches!(value, RValue::Null),
            FilterKind::Missing => matches!(value, RValue::Missing),
        }
    }
}

/// Classes an `RType` filter accepts: the scalar and the vector interface of the type.
pub fn rtype_filter_classes(ty: RType) -> Vec<TypeTag> {
    match ty {
        RType::Integer => vec![TypeTag::Integer, TypeTag::AbstractIntVector],
        RType::Double => vec![TypeTag::Double, TypeTag::AbstractDoubleVector],
        RType::Logical => vec![TypeTag::Logical, TypeTag::AbstractLogicalVector],
        RType::Character => vec![TypeTag::Character, TypeTag::AbstractStringVector],
        RType::Complex => vec![TypeTag::AbstractComplexVector],
        RType::Raw => vec![TypeTag::AbstractRawVector],
        other => internal_error(format!("no type filter for R type '{}'", other.name())),
    }
}

fn numeric(value: &RValue) -> Option<f64> {
    match value {
        RValue::Int(i) if !value.is_na() => Some(*i as f64),
        RValue::Double(d) if !d.is_nan() => Some(*d),
        _ => None,
    }
}

fn ordered(op: CompareOp, a: f64, b: f64) -> bool {
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Gt => a > b,
        CompareOp::Lt => a < b,
        CompareOp::Ge => a >= b,
        CompareOp::Le => a <= b,
        CompareOp::Same => a.to_bits() == b.to_bits(),
    }
}

fn compare(subject: &CompareSubject, op: CompareOp, value: &RValue) -> bool {
    match subject {
        CompareSubject::ScalarValue(expected, ty) => match (op, ty) {
            (CompareOp::Same, _) | (CompareOp::Eq, RType::Any) => value.identical(expected),
            (CompareOp::Eq, RType::Character | RType::Logical | RType::Complex | RType::Raw) => {
                value.is_scalar() && !value.is_na() && value.identical(expected)
            }
            (_, RType::Integer | RType::Double) => {
                if value.rtype() != *ty || value.as_vector().is_some() {
                    return false;
                }
                match (numeric(value), numeric(expected)) {
                    (Some(a), Some(b)) => ordered(op, a, b),
                    _ => false,
                }
            }
            _ => internal_error(format!(
                "unsupported comparison {:?} on {}",
                op,
                ty.name()
            )),
        },
        CompareSubject::NATest(ty) => {
            if op != CompareOp::Eq {
                internal_error(format!("unsupported NA test operator {:?}", op));
            }
            value.is_scalar() && value.rtype() == *ty && value.is_na()
        }
        CompareSubject::StringLength(length) => match value {
            RValue::Str(Some(s)) => ordered(op, s.chars().count() as f64, *length as f64),
            _ => false,
        },
        CompareSubject::VectorSize(size) => match value {
            RValue::Vector(v) => ordered(op, v.len() as f64, *size as f64),
            _ => false,
        },
        CompareSubject::ElementAt { index, value: expected, .. } => {
            if op != CompareOp::Eq {
                internal_error(format!("unsupported element comparison {:?}", op));
            }
            match value {
                RValue::Vector(v) => v.get(*index).map_or(false, |e| e.identical(expected)),
                _ => false,
            }
        }
        CompareSubject::Dim { dim, size } => {
            let dims = match value.as_vector().and_then(|v| v.dims()) {
                Some(d) if d.len() == 2 && d.len() > *dim => d,
                _ => return false,
            };
            match op {
                CompareOp::Eq => dims[*dim] == *size,
                CompareOp::Gt => dims[*dim] > *size,
                other => internal_error(format!("unsupported dimension comparison {:?}", other)),
            }
        }
    }
}

// ============================================================================
// MAPPERS
// ============================================================================

#[derive(Debug, Clone)]
pub enum MapperKind {
    MapToValue(RValue),
    MapByteToBoolean,
    MapDoubleToInt,
    MapToCharAt { index: usize, default: char },
}

#[derive(Debug, Clone)]
pub struct Mapper {
    site: SiteId,
    kind: MapperKind,
}

impl Mapper {
    pub fn new(kind: MapperKind) -> Self {
        Self {
            site: SiteId::fresh(),
            kind,
        }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub fn kind(&self) -> &MapperKind {
        &self.kind
    }

    pub fn mark(mut self, name: &str) -> Self {
        self.site = MarkLookup::site(name);
        self
    }

    pub fn constant(value: impl Into<RValue>) -> Self {
        Self::new(MapperKind::MapToValue(value.into()))
    }

    pub fn to_boolean() -> Self {
        Self::new(MapperKind::MapByteToBoolean)
    }

    pub fn double_to_int() -> Self {
        Self::new(MapperKind::MapDoubleToInt)
    }

    pub fn char_at(index: usize, default: char) -> Self {
        Self::new(MapperKind::MapToCharAt { index, default })
    }

    pub fn map(&self, value: &RValue) -> RValue {
        match &self.kind {
            MapperKind::MapToValue(v) => v.clone(),
            MapperKind::MapByteToBoolean => match value {
                RValue::Logical(l) => RValue::Bool(*l == RLogical::True),
                RValue::Bool(b) => RValue::Bool(*b),
                other => internal_error(format!("cannot map {} to a boolean", other)),
            },
            MapperKind::MapDoubleToInt => match value {
                RValue::Double(_) | RValue::Int(_) => {
                    crate::runtime::coerce::cast_scalar(value, RType::Integer)
                }
                other => internal_error(format!("cannot map {} to an integer", other)),
            },
            MapperKind::MapToCharAt { index, default } => match value {
                RValue::Str(None) => RValue::Int(crate::runtime::INT_NA),
                RValue::Str(Some(s)) => {
                    let c = s.chars().nth(*index).unwrap_or(*default);
                    RValue::Int(c as i32)
                }
                RValue::Null => RValue::Int(*default as i32),
                other => internal_error(format!("cannot take a character of {}", other)),
            },
        }
    }
}

// ============================================================================
// STEPS
// ============================================================================

#[derive(Debug, Clone)]
pub struct CoercionStep {
    pub target: RType,
    /// Vector coercions also convert vectors, base coercions are tabled on scalars
    pub vector_coercion: bool,
    pub preserve_names: bool,
    pub preserve_dimensions: bool,
    pub preserve_attributes: bool,
    /// NULL and missing pass through untouched
    pub preserve_non_vector: bool,
}

impl CoercionStep {
    pub fn vector(target: RType) -> Self {
        Self {
            target,
            vector_coercion: true,
            preserve_names: false,
            preserve_dimensions: false,
            preserve_attributes: false,
            preserve_non_vector: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapIfStep {
    pub filter: Filter,
    pub true_branch: Option<Pipeline>,
    pub false_branch: Option<Pipeline>,
    /// When the filter holds, the true branch result is the pipeline result
    pub returns: bool,
}

#[derive(Debug, Clone)]
pub enum PipelineStep {
    FindFirst {
        default: Option<RValue>,
        element: Option<TypeTag>,
        message: Option<RError>,
    },
    Coercion(CoercionStep),
    AttributableCoercion {
        preserve_names: bool,
        preserve_dimensions: bool,
        preserve_attributes: bool,
    },
    Map(Mapper),
    MapIf(MapIfStep),
    Filter {
        filter: Filter,
        message: Option<RError>,
        is_warning: bool,
    },
    NotNA {
        site: SiteId,
        replacement: Option<RValue>,
        message: Option<RError>,
    },
    BoxPrimitive,
    DefaultError(RError),
    DefaultWarning(RError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    FindFirst,
    Coercion,
    AttributableCoercion,
    Map,
    MapIf,
    Filter,
    NotNA,
    BoxPrimitive,
    DefaultError,
    DefaultWarning,
}

impl PipelineStep {
    pub fn kind(&self) -> StepKind {
        match self {
            PipelineStep::FindFirst { .. } => StepKind::FindFirst,
            PipelineStep::Coercion(_) => StepKind::Coercion,
            PipelineStep::AttributableCoercion { .. } => StepKind::AttributableCoercion,
            PipelineStep::Map(_) => StepKind::Map,
            PipelineStep::MapIf(_) => StepKind::MapIf,
            PipelineStep::Filter { .. } => StepKind::Filter,
            PipelineStep::NotNA { .. } => StepKind::NotNA,
            PipelineStep::BoxPrimitive => StepKind::BoxPrimitive,
            PipelineStep::DefaultError(_) => StepKind::DefaultError,
            PipelineStep::DefaultWarning(_) => StepKind::DefaultWarning,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn new(steps: Vec<PipelineStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step at `path`, descending into `MapIf` branches: even indices select a
    /// step, the following entry picks the branch (0 true, 1 false).
    pub fn step_at(&self, path: &[usize]) -> Option<&PipelineStep> {
        let (first, rest) = path.split_first()?;
        let step = self.steps.get(*first)?;
        match rest.split_first() {
            None => Some(step),
            Some((branch, tail)) => match step {
                PipelineStep::MapIf(m) => {
                    let pipeline = if *branch == 0 {
                        m.true_branch.as_ref()
                    } else {
                        m.false_branch.as_ref()
                    }?;
                    pipeline.step_at(tail)
                }
                _ => None,
            },
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Fluent construction of a [`Pipeline`].
///
/// ```
/// use rcore::casts::{Filter, PipelineBuilder};
///
/// let pipeline = PipelineBuilder::new()
///     .as_integer_vector()
///     .find_first_or(0)
///     .must_be(Filter::gte(0))
///     .build();
/// assert_eq!(pipeline.steps().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    steps: Vec<PipelineStep>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn coerce(self, step: CoercionStep) -> Self {
        self.step(PipelineStep::Coercion(step))
    }

    pub fn as_integer_vector(self) -> Self {
        self.coerce(CoercionStep::vector(RType::Integer))
    }

    pub fn as_double_vector(self) -> Self {
        self.coerce(CoercionStep::vector(RType::Double))
    }

    pub fn as_logical_vector(self) -> Self {
        self.coerce(CoercionStep::vector(RType::Logical))
    }

    pub fn as_string_vector(self) -> Self {
        self.coerce(CoercionStep::vector(RType::Character))
    }

    pub fn as_complex_vector(self) -> Self {
        self.coerce(CoercionStep::vector(RType::Complex))
    }

    pub fn as_raw_vector(self) -> Self {
        self.coerce(CoercionStep::vector(RType::Raw))
    }

    /// Vector coercion keeping names, dimensions and attributes.
    pub fn as_vector_preserving(self, target: RType) -> Self {
        self.coerce(CoercionStep {
            preserve_names: true,
            preserve_dimensions: true,
            preserve_attributes: true,
            ..CoercionStep::vector(target)
        })
    }

    fn as_base(self, target: RType) -> Self {
        self.coerce(CoercionStep {
            vector_coercion: false,
            ..CoercionStep::vector(target)
        })
    }

    pub fn as_integer(self) -> Self {
        self.as_base(RType::Integer)
    }

    pub fn as_double(self) -> Self {
        self.as_base(RType::Double)
    }

    pub fn as_logical(self) -> Self {
        self.as_base(RType::Logical)
    }

    pub fn as_string(self) -> Self {
        self.as_base(RType::Character)
    }

    pub fn as_vector(self, preserve_non_vector: bool) -> Self {
        self.coerce(CoercionStep {
            preserve_non_vector,
            ..CoercionStep::vector(RType::Any)
        })
    }

    pub fn as_attributable(
        self,
        preserve_names: bool,
        preserve_dimensions: bool,
        preserve_attributes: bool,
    ) -> Self {
        self.step(PipelineStep::AttributableCoercion {
            preserve_names,
            preserve_dimensions,
            preserve_attributes,
        })
    }

    pub fn find_first(self) -> Self {
        self.step(PipelineStep::FindFirst {
            default: None,
            element: None,
            message: None,
        })
    }

    pub fn find_first_with(self, message: RError) -> Self {
        self.step(PipelineStep::FindFirst {
            default: None,
            element: None,
            message: Some(message),
        })
    }

    pub fn find_first_or(self, default: impl Into<RValue>) -> Self {
        self.step(PipelineStep::FindFirst {
            default: Some(default.into()),
            element: None,
            message: None,
        })
    }

    pub fn find_first_or_null(self) -> Self {
        self.find_first_or(RValue::Null)
    }

    /// First element, declared to be of class `element`.
    pub fn find_first_element(self, element: TypeTag, default: Option<RValue>) -> Self {
        self.step(PipelineStep::FindFirst {
            default,
            element: Some(element),
            message: None,
        })
    }

    pub fn must_be(self, filter: Filter) -> Self {
        self.step(PipelineStep::Filter {
            filter,
            message: None,
            is_warning: false,
        })
    }

    pub fn must_be_with(self, filter: Filter, message: RError) -> Self {
        self.step(PipelineStep::Filter {
            filter,
            message: Some(message),
            is_warning: false,
        })
    }

    pub fn should_be(self, filter: Filter) -> Self {
        self.step(PipelineStep::Filter {
            filter,
            message: None,
            is_warning: true,
        })
    }

    pub fn should_be_with(self, filter: Filter, message: RError) -> Self {
        self.step(PipelineStep::Filter {
            filter,
            message: Some(message),
            is_warning: true,
        })
    }

    pub fn must_not_be_na(self, message: RError) -> Self {
        self.step(PipelineStep::NotNA {
            site: SiteId::fresh(),
            replacement: None,
            message: Some(message),
        })
    }

    pub fn replace_na(self, replacement: impl Into<RValue>) -> Self {
        self.step(PipelineStep::NotNA {
            site: SiteId::fresh(),
            replacement: Some(replacement.into()),
            message: None,
        })
    }

    pub fn map(self, mapper: Mapper) -> Self {
        self.step(PipelineStep::Map(mapper))
    }

    pub fn map_if(self, filter: Filter, mapper: Mapper) -> Self {
        self.map_if_else(filter, Some(Pipeline::new(vec![PipelineStep::Map(mapper)])), None)
    }

    pub fn map_if_else(
        self,
        filter: Filter,
        true_branch: Option<Pipeline>,
        false_branch: Option<Pipeline>,
    ) -> Self {
        self.step(PipelineStep::MapIf(MapIfStep {
            filter,
            true_branch,
            false_branch,
            returns: false,
        }))
    }

    /// Ends the pipeline with the (optionally converted) value when `filter` holds.
    pub fn return_if(self, filter: Filter, true_branch: Option<Pipeline>) -> Self {
        self.step(PipelineStep::MapIf(MapIfStep {
            filter,
            true_branch,
            false_branch: None,
            returns: true,
        }))
    }

    pub fn box_primitive(self) -> Self {
        self.step(PipelineStep::BoxPrimitive)
    }

    pub fn default_error(self, message: RError) -> Self {
        self.step(PipelineStep::DefaultError(message))
    }

    pub fn default_warning(self, message: RError) -> Self {
        self.step(PipelineStep::DefaultWarning(message))
    }

    pub fn build(self) -> Pipeline {
        Pipeline { steps: self.steps }
    }
}
