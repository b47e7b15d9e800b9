//! The closed universe of runtime types the type algebra reasons about.
//!
//! Interfaces can overlap with each other (a class may implement several), while classes
//! are leaves: two distinct classes never share a value.

use std::fmt;

use super::coverage::Coverage;
use crate::runtime::{RType, RValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    // interfaces
    Any,
    Attributable,
    AbstractVector,
    AbstractIntVector,
    AbstractDoubleVector,
    AbstractLogicalVector,
    AbstractStringVector,
    AbstractComplexVector,
    AbstractRawVector,
    AbstractListVector,
    // scalar classes
    Integer,
    Double,
    Logical,
    Character,
    Complex,
    Raw,
    Boolean,
    Null,
    Missing,
    Function,
    Environment,
    // vector classes
    IntVector,
    Factor,
    DoubleVector,
    LogicalVector,
    StringVector,
    ComplexVector,
    RawVector,
    List,
    DataFrame,
}

pub const ALL_TAGS: [TypeTag; 30] = [
    TypeTag::Any,
    TypeTag::Attributable,
    TypeTag::AbstractVector,
    TypeTag::AbstractIntVector,
    TypeTag::AbstractDoubleVector,
    TypeTag::AbstractLogicalVector,
    TypeTag::AbstractStringVector,
    TypeTag::AbstractComplexVector,
    TypeTag::AbstractRawVector,
    TypeTag::AbstractListVector,
    TypeTag::Integer,
    TypeTag::Double,
    TypeTag::Logical,
    TypeTag::Character,
    TypeTag::Complex,
    TypeTag::Raw,
    TypeTag::Boolean,
    TypeTag::Null,
    TypeTag::Missing,
    TypeTag::Function,
    TypeTag::Environment,
    TypeTag::IntVector,
    TypeTag::Factor,
    TypeTag::DoubleVector,
    TypeTag::LogicalVector,
    TypeTag::StringVector,
    TypeTag::ComplexVector,
    TypeTag::RawVector,
    TypeTag::List,
    TypeTag::DataFrame,
];

impl TypeTag {
    pub fn is_interface(&self) -> bool {
        matches!(
            self,
            TypeTag::Any
                | TypeTag::Attributable
                | TypeTag::AbstractVector
                | TypeTag::AbstractIntVector
                | TypeTag::AbstractDoubleVector
                | TypeTag::AbstractLogicalVector
                | TypeTag::AbstractStringVector
                | TypeTag::AbstractComplexVector
                | TypeTag::AbstractRawVector
                | TypeTag::AbstractListVector
        )
    }

    pub fn direct_supertypes(&self) -> &'static [TypeTag] {
        use TypeTag::*;
        match self {
            Any => &[],
            Attributable => &[Any],
            AbstractVector => &[Attributable],
            AbstractIntVector | AbstractDoubleVector | AbstractLogicalVector
            | AbstractStringVector | AbstractComplexVector | AbstractRawVector
            | AbstractListVector => &[AbstractVector],
            Integer | Double | Logical | Character | Complex | Raw | Boolean | Null | Missing => {
                &[Any]
            }
            Function | Environment => &[Attributable],
            IntVector | Factor => &[AbstractIntVector],
            DoubleVector => &[AbstractDoubleVector],
            LogicalVector => &[AbstractLogicalVector],
            StringVector => &[AbstractStringVector],
            ComplexVector => &[AbstractComplexVector],
            RawVector => &[AbstractRawVector],
            List | DataFrame => &[AbstractListVector],
        }
    }

    /// `self` is `other` or one of its (transitive) supertypes.
    pub fn is_assignable_from(&self, other: TypeTag) -> bool {
        if *self == other || *self == TypeTag::Any {
            return true;
        }
        other
            .direct_supertypes()
            .iter()
            .any(|sup| self.is_assignable_from(*sup))
    }

    /// The most specific class of a runtime value.
    pub fn of(value: &RValue) -> TypeTag {
        match value {
            RValue::Null => TypeTag::Null,
            RValue::Missing => TypeTag::Missing,
            RValue::Int(_) => TypeTag::Integer,
            RValue::Double(_) => TypeTag::Double,
            RValue::Logical(_) => TypeTag::Logical,
            RValue::Str(_) => TypeTag::Character,
            RValue::Complex(_) => TypeTag::Complex,
            RValue::Raw(_) => TypeTag::Raw,
            RValue::Bool(_) => TypeTag::Boolean,
            RValue::Function(_) => TypeTag::Function,
            RValue::Env(_) => TypeTag::Environment,
            RValue::Vector(v) => match value.rtype() {
                RType::Factor => TypeTag::Factor,
                RType::DataFrame => TypeTag::DataFrame,
                _ => TypeTag::vector_of(v.element_type()),
            },
        }
    }

    /// Class of a plain vector with the given element type.
    pub fn vector_of(ty: RType) -> TypeTag {
        match ty {
            RType::Integer => TypeTag::IntVector,
            RType::Double => TypeTag::DoubleVector,
            RType::Logical => TypeTag::LogicalVector,
            RType::Character => TypeTag::StringVector,
            RType::Complex => TypeTag::ComplexVector,
            RType::Raw => TypeTag::RawVector,
            RType::Factor => TypeTag::Factor,
            RType::DataFrame => TypeTag::DataFrame,
            _ => TypeTag::List,
        }
    }

    /// Scalar class for an atomic R type.
    pub fn scalar_of(ty: RType) -> Option<TypeTag> {
        Some(match ty {
            RType::Integer => TypeTag::Integer,
            RType::Double => TypeTag::Double,
            RType::Logical => TypeTag::Logical,
            RType::Character => TypeTag::Character,
            RType::Complex => TypeTag::Complex,
            RType::Raw => TypeTag::Raw,
            RType::Null => TypeTag::Null,
            RType::Missing => TypeTag::Missing,
            RType::Function => TypeTag::Function,
            _ => return None,
        })
    }

    /// Length-one vector wrapper a primitive scalar is boxed into.
    pub fn box_type(&self) -> Option<TypeTag> {
        Some(match self {
            TypeTag::Integer => TypeTag::IntVector,
            TypeTag::Double => TypeTag::DoubleVector,
            TypeTag::Logical | TypeTag::Boolean => TypeTag::LogicalVector,
            TypeTag::Character => TypeTag::StringVector,
            TypeTag::Complex => TypeTag::ComplexVector,
            TypeTag::Raw => TypeTag::RawVector,
            _ => return None,
        })
    }

    /// Coverage of `to` over the values of `from`, ignoring implicit conversions.
    pub fn raw_coverage(from: TypeTag, to: TypeTag) -> Coverage {
        if to.is_assignable_from(from) {
            Coverage::Full
        } else if from.is_assignable_from(to) {
            Coverage::Partial
        } else if from.is_interface() && to.is_interface() {
            // a class implementing both may exist
            Coverage::Potential
        } else {
            Coverage::None
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtyping_is_transitive() {
        assert!(TypeTag::Attributable.is_assignable_from(TypeTag::IntVector));
        assert!(TypeTag::AbstractVector.is_assignable_from(TypeTag::DataFrame));
        assert!(!TypeTag::AbstractVector.is_assignable_from(TypeTag::Integer));
        assert!(TypeTag::Any.is_assignable_from(TypeTag::Missing));
    }

    #[test]
    fn test_raw_coverage_cases() {
        assert_eq!(TypeTag::raw_coverage(TypeTag::IntVector, TypeTag::AbstractVector), Coverage::Full);
        assert_eq!(TypeTag::raw_coverage(TypeTag::AbstractVector, TypeTag::IntVector), Coverage::Partial);
        assert_eq!(
            TypeTag::raw_coverage(TypeTag::AbstractIntVector, TypeTag::AbstractDoubleVector),
            Coverage::Potential
        );
        assert_eq!(TypeTag::raw_coverage(TypeTag::Integer, TypeTag::Double), Coverage::None);
        assert_eq!(TypeTag::raw_coverage(TypeTag::Integer, TypeTag::AbstractVector), Coverage::None);
    }

    #[test]
    fn test_value_classification() {
        assert_eq!(TypeTag::of(&RValue::Int(1)), TypeTag::Integer);
        assert_eq!(TypeTag::of(&RValue::ints(vec![1, 2])), TypeTag::IntVector);
        assert_eq!(TypeTag::of(&RValue::list(vec![])), TypeTag::List);
    }

    #[test]
    fn test_all_tags_listed_once() {
        let mut tags = ALL_TAGS.to_vec();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), ALL_TAGS.len());
    }
}
