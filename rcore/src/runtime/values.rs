// Runtime values for RCore
// Scalars, NA sentinels and the R type tags shared by the cast pipeline and the update engine

use std::fmt;

use super::vector::{RVector, VectorData};

/// Integer NA sentinel (`NA_integer_`).
pub const INT_NA: i32 = i32::MIN;

/// Bit pattern of the double NA sentinel (`NA_real_`): a NaN whose low word is 1954.
pub const DOUBLE_NA_BITS: u64 = 0x7FF0_0000_0000_07A2;

pub fn double_na() -> f64 {
    f64::from_bits(DOUBLE_NA_BITS)
}

/// True only for the NA payload, not for other NaNs.
pub fn is_double_na(d: f64) -> bool {
    d.is_nan() && (d.to_bits() & 0xFFFF_FFFF) == 1954
}

pub(crate) fn identical_f64(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || a == b
}

/// R base types. `Any` is only used by coercion targets and scalar comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RType {
    Integer,
    Double,
    Logical,
    Complex,
    Character,
    Raw,
    List,
    Null,
    Missing,
    Function,
    DataFrame,
    Factor,
    Any,
}

impl RType {
    /// Name as reported by `typeof`.
    pub fn name(&self) -> &'static str {
        match self {
            RType::Integer => "integer",
            RType::Double => "double",
            RType::Logical => "logical",
            RType::Complex => "complex",
            RType::Character => "character",
            RType::Raw => "raw",
            RType::List => "list",
            RType::Null => "NULL",
            RType::Missing => "symbol",
            RType::Function => "closure",
            RType::DataFrame => "list",
            RType::Factor => "integer",
            RType::Any => "any",
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            RType::Integer
                | RType::Double
                | RType::Logical
                | RType::Complex
                | RType::Character
                | RType::Raw
        )
    }

    /// Position in the implicit promotion order used by subassignment
    /// (logical < integer < double < complex < character < list).
    pub fn promotion_rank(&self) -> Option<u8> {
        match self {
            RType::Logical => Some(1),
            RType::Integer | RType::Factor => Some(2),
            RType::Double => Some(3),
            RType::Complex => Some(4),
            RType::Character => Some(5),
            RType::List | RType::DataFrame => Some(6),
            _ => None,
        }
    }
}

impl fmt::Display for RType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Three-valued R logical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RLogical {
    False,
    True,
    Na,
}

impl RLogical {
    pub fn from_bool(b: bool) -> Self {
        if b {
            RLogical::True
        } else {
            RLogical::False
        }
    }

    pub fn to_bool(self) -> Option<bool> {
        match self {
            RLogical::True => Some(true),
            RLogical::False => Some(false),
            RLogical::Na => None,
        }
    }

    /// Byte encoding used by the host: TRUE=1, FALSE=0, NA=-1.
    pub fn as_byte(self) -> i8 {
        match self {
            RLogical::True => 1,
            RLogical::False => 0,
            RLogical::Na => -1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RComplex {
    pub re: f64,
    pub im: f64,
}

impl RComplex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn na() -> Self {
        Self {
            re: double_na(),
            im: double_na(),
        }
    }

    pub fn is_na(&self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }

    pub(crate) fn identical(&self, other: &RComplex) -> bool {
        identical_f64(self.re, other.re) && identical_f64(self.im, other.im)
    }
}

/// Opaque closure handle; the core never calls functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RFunction {
    pub name: String,
}

impl RFunction {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct REnvironment {
    pub name: String,
}

/// A runtime value as seen by the cast pipeline and the update engine.
///
/// Scalars are the unboxed forms of length-one vectors; `Bool` is the host boolean
/// produced by byte-to-boolean mappers and is not an R value on its own.
#[derive(Debug, Clone)]
pub enum RValue {
    Null,
    Missing,
    Int(i32),
    Double(f64),
    Logical(RLogical),
    Str(Option<String>),
    Complex(RComplex),
    Raw(u8),
    Bool(bool),
    Function(RFunction),
    Env(REnvironment),
    Vector(RVector),
}

impl RValue {
    pub fn str(s: &str) -> Self {
        RValue::Str(Some(s.to_string()))
    }

    pub fn na_str() -> Self {
        RValue::Str(None)
    }

    pub fn ints(values: Vec<i32>) -> Self {
        RValue::Vector(RVector::from_data(VectorData::Int(values)))
    }

    pub fn doubles(values: Vec<f64>) -> Self {
        RValue::Vector(RVector::from_data(VectorData::Double(values)))
    }

    pub fn logicals(values: Vec<RLogical>) -> Self {
        RValue::Vector(RVector::from_data(VectorData::Logical(values)))
    }

    pub fn strings(values: &[&str]) -> Self {
        RValue::Vector(RVector::from_data(VectorData::Str(
            values.iter().map(|s| Some(s.to_string())).collect(),
        )))
    }

    pub fn list(values: Vec<RValue>) -> Self {
        RValue::Vector(RVector::from_data(VectorData::List(values)))
    }

    pub fn function(name: &str) -> Self {
        RValue::Function(RFunction::new(name))
    }

    pub fn rtype(&self) -> RType {
        match self {
            RValue::Null => RType::Null,
            RValue::Missing => RType::Missing,
            RValue::Int(_) => RType::Integer,
            RValue::Double(_) => RType::Double,
            RValue::Logical(_) | RValue::Bool(_) => RType::Logical,
            RValue::Str(_) => RType::Character,
            RValue::Complex(_) => RType::Complex,
            RValue::Raw(_) => RType::Raw,
            RValue::Function(_) => RType::Function,
            RValue::Env(_) => RType::Any,
            RValue::Vector(v) => {
                if v.is_factor() {
                    RType::Factor
                } else if v.is_data_frame() {
                    RType::DataFrame
                } else {
                    v.element_type()
                }
            }
        }
    }

    /// Name as reported by `typeof`, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            RValue::Env(_) => "environment",
            RValue::Bool(_) => "logical",
            RValue::Vector(v) => v.element_type().name(),
            other => other.rtype().name(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RValue::Null | RValue::Missing => 0,
            RValue::Vector(v) => v.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RValue::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            RValue::Int(_)
                | RValue::Double(_)
                | RValue::Logical(_)
                | RValue::Str(_)
                | RValue::Complex(_)
                | RValue::Raw(_)
        )
    }

    /// NA test for scalars; vectors are NA only when they are a single NA element.
    pub fn is_na(&self) -> bool {
        match self {
            RValue::Int(i) => *i == INT_NA,
            RValue::Double(d) => d.is_nan(),
            RValue::Logical(l) => *l == RLogical::Na,
            RValue::Str(s) => s.is_none(),
            RValue::Complex(c) => c.is_na(),
            RValue::Vector(v) => v.len() == 1 && v.data().is_na_at(0),
            _ => false,
        }
    }

    /// Boxes scalars into a fresh length-one vector; vectors are returned as the same handle.
    pub fn to_vector(&self) -> Option<RVector> {
        let data = match self {
            RValue::Vector(v) => return Some(v.clone()),
            RValue::Int(i) => VectorData::Int(vec![*i]),
            RValue::Double(d) => VectorData::Double(vec![*d]),
            RValue::Logical(l) => VectorData::Logical(vec![*l]),
            RValue::Bool(b) => VectorData::Logical(vec![RLogical::from_bool(*b)]),
            RValue::Str(s) => VectorData::Str(vec![s.clone()]),
            RValue::Complex(c) => VectorData::Complex(vec![*c]),
            RValue::Raw(r) => VectorData::Raw(vec![*r]),
            _ => return None,
        };
        Some(RVector::from_data(data))
    }

    pub fn as_vector(&self) -> Option<&RVector> {
        match self {
            RValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// `identical()` semantics: doubles compare by bits (so NA equals NA) and a scalar
    /// equals a length-one vector of the same type without attributes.
    pub fn identical(&self, other: &RValue) -> bool {
        match (self, other) {
            (RValue::Null, RValue::Null) | (RValue::Missing, RValue::Missing) => true,
            (RValue::Int(a), RValue::Int(b)) => a == b,
            (RValue::Double(a), RValue::Double(b)) => identical_f64(*a, *b),
            (RValue::Logical(a), RValue::Logical(b)) => a == b,
            (RValue::Str(a), RValue::Str(b)) => a == b,
            (RValue::Complex(a), RValue::Complex(b)) => a.identical(b),
            (RValue::Raw(a), RValue::Raw(b)) => a == b,
            (RValue::Bool(a), RValue::Bool(b)) => a == b,
            (RValue::Function(a), RValue::Function(b)) => a == b,
            (RValue::Env(a), RValue::Env(b)) => a == b,
            (RValue::Vector(a), RValue::Vector(b)) => a.identical(b),
            (RValue::Vector(v), s) | (s, RValue::Vector(v)) if s.is_scalar() => {
                match s.to_vector() {
                    Some(boxed) => v.identical(&boxed),
                    None => false,
                }
            }
            _ => false,
        }
    }
}

impl PartialEq for RValue {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl From<i32> for RValue {
    fn from(i: i32) -> Self {
        RValue::Int(i)
    }
}

impl From<f64> for RValue {
    fn from(d: f64) -> Self {
        RValue::Double(d)
    }
}

impl From<&str> for RValue {
    fn from(s: &str) -> Self {
        RValue::str(s)
    }
}

impl From<RVector> for RValue {
    fn from(v: RVector) -> Self {
        RValue::Vector(v)
    }
}

impl fmt::Display for RValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RValue::Null => write!(f, "NULL"),
            RValue::Missing => write!(f, "<missing>"),
            RValue::Int(i) if *i == INT_NA => write!(f, "NA_integer_"),
            RValue::Int(i) => write!(f, "{}L", i),
            RValue::Double(d) if is_double_na(*d) => write!(f, "NA_real_"),
            RValue::Double(d) => write!(f, "{}", d),
            RValue::Logical(RLogical::True) => write!(f, "TRUE"),
            RValue::Logical(RLogical::False) => write!(f, "FALSE"),
            RValue::Logical(RLogical::Na) => write!(f, "NA"),
            RValue::Str(Some(s)) => write!(f, "{:?}", s),
            RValue::Str(None) => write!(f, "NA_character_"),
            RValue::Complex(c) if c.is_na() => write!(f, "NA_complex_"),
            RValue::Complex(c) => write!(f, "{}+{}i", c.re, c.im),
            RValue::Raw(r) => write!(f, "as.raw(0x{:02x})", r),
            RValue::Bool(b) => write!(f, "{}", b),
            RValue::Function(func) => write!(f, "<closure {}>", func.name),
            RValue::Env(env) => write!(f, "<environment {}>", env.name),
            RValue::Vector(v) => write!(f, "{}", v),
        }
    }
}
