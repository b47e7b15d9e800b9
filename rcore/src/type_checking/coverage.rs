//! Coverage lattice and cast tables.
//!
//! `to.coverage_from(from)` answers "how much of `from`'s values does `to` contain":
//!
//! - `Full`: every value (`from ⊆ to`)
//! - `Partial`: some but provably not all values
//! - `Potential`: unknown, a class implementing both sides may exist
//! - `None`: provably disjoint
//!
//! `and` is the lattice meet and `or` the join. `transpose` derives the coverage between
//! polarised atoms (`T` or `Not(T)`) from the coverage between the underlying types.

use lazy_static::lazy_static;

use super::type_expr::{AtomType, Conjunction, TypeExpr};
use super::types::TypeTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Coverage {
    None,
    Potential,
    Partial,
    Full,
}

pub const ALL_COVERAGES: [Coverage; 4] = [
    Coverage::None,
    Coverage::Potential,
    Coverage::Partial,
    Coverage::Full,
];

impl Coverage {
    pub fn and(self, other: Coverage) -> Coverage {
        match (self, other) {
            (Coverage::None, _) | (_, Coverage::None) => Coverage::None,
            (Coverage::Full, x) | (x, Coverage::Full) => x,
            (Coverage::Potential, _) | (_, Coverage::Potential) => Coverage::Potential,
            (Coverage::Partial, Coverage::Partial) => Coverage::Partial,
        }
    }

    pub fn or(self, other: Coverage) -> Coverage {
        match (self, other) {
            (Coverage::Full, _) | (_, Coverage::Full) => Coverage::Full,
            (Coverage::None, x) | (x, Coverage::None) => x,
            (Coverage::Partial, _) | (_, Coverage::Partial) => Coverage::Partial,
            (Coverage::Potential, Coverage::Potential) => Coverage::Potential,
        }
    }

    /// Coverage between `source` and `target` atoms with the given polarities, where `self`
    /// is the coverage between the positive types (`source → target`).
    pub fn transpose(
        self,
        source: &AtomType,
        target: &AtomType,
        source_positive: bool,
        target_positive: bool,
    ) -> Coverage {
        let same = source.key() == target.key();
        match self {
            Coverage::Potential => Coverage::Potential,
            Coverage::Partial => {
                if same {
                    return if source_positive == target_positive {
                        Coverage::Full
                    } else {
                        Coverage::None
                    };
                }
                match (source_positive, target_positive) {
                    (true, true) => Coverage::Partial,
                    (false, true) => Coverage::None,
                    (true, false) => Coverage::Partial,
                    (false, false) => {
                        if source.is_any() {
                            Coverage::None
                        } else {
                            Coverage::Full
                        }
                    }
                }
            }
            Coverage::None => match (source_positive, target_positive) {
                (true, true) => Coverage::None,
                (false, true) => Coverage::Partial,
                (true, false) => Coverage::Full,
                (false, false) => Coverage::Partial,
            },
            Coverage::Full => {
                if same {
                    return if source.is_any() {
                        if source_positive && target_positive {
                            Coverage::Full
                        } else {
                            Coverage::None
                        }
                    } else if source_positive == target_positive {
                        Coverage::Full
                    } else {
                        Coverage::None
                    };
                }
                match (source_positive, target_positive) {
                    (true, true) => Coverage::Full,
                    (false, true) => {
                        if target.is_any() {
                            Coverage::Full
                        } else {
                            Coverage::Partial
                        }
                    }
                    (true, false) => Coverage::None,
                    (false, false) => {
                        if target.is_any() {
                            Coverage::None
                        } else {
                            Coverage::Partial
                        }
                    }
                }
            }
        }
    }
}

/// A directed conversion edge `input → result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cast {
    pub input: TypeTag,
    pub result: TypeTag,
    pub coverage: Coverage,
}

impl Cast {
    pub fn new(input: TypeTag, result: TypeTag, coverage: Coverage) -> Self {
        Self {
            input,
            result,
            coverage,
        }
    }

    pub fn full(input: TypeTag, result: TypeTag) -> Self {
        Self::new(input, result, Coverage::Full)
    }
}

lazy_static! {
    /// Conversions the runtime applies without an explicit coercion: scalar boxing and
    /// numeric widening.
    static ref IMPLICIT_CASTS: Vec<Cast> = vec![
        Cast::full(TypeTag::Integer, TypeTag::IntVector),
        Cast::full(TypeTag::Double, TypeTag::DoubleVector),
        Cast::full(TypeTag::Logical, TypeTag::LogicalVector),
        Cast::full(TypeTag::Character, TypeTag::StringVector),
        Cast::full(TypeTag::Complex, TypeTag::ComplexVector),
        Cast::full(TypeTag::Raw, TypeTag::RawVector),
        Cast::full(TypeTag::Integer, TypeTag::Double),
        Cast::full(TypeTag::Integer, TypeTag::DoubleVector),
        Cast::full(TypeTag::Logical, TypeTag::Integer),
        Cast::full(TypeTag::AbstractIntVector, TypeTag::AbstractDoubleVector),
        Cast::full(TypeTag::AbstractLogicalVector, TypeTag::AbstractIntVector),
    ];
}

pub fn implicit_casts() -> &'static [Cast] {
    &IMPLICIT_CASTS
}

/// True when some implicit cast takes every `from` value into `to`.
pub fn implicitly_convertible(from: TypeTag, to: TypeTag) -> bool {
    IMPLICIT_CASTS.iter().any(|c| {
        TypeTag::raw_coverage(from, c.input) == Coverage::Full
            && TypeTag::raw_coverage(c.result, to) == Coverage::Full
    })
}

/// Coverage of the formal type over the values of `actual`.
pub fn is_convertible(actual: &Conjunction, formal: TypeTag, include_implicits: bool) -> Coverage {
    Conjunction::of_tag(formal).coverage_from(actual, include_implicits)
}

/// A table of casts a coercion node can perform.
#[derive(Debug, Clone, Default)]
pub struct Casts {
    casts: Vec<Cast>,
}

impl Casts {
    pub fn new(casts: Vec<Cast>) -> Self {
        Self { casts }
    }

    pub fn casts(&self) -> &[Cast] {
        &self.casts
    }

    pub fn result_types(&self) -> TypeExpr {
        TypeExpr::union(self.casts.iter().map(|c| c.result))
    }

    /// Casts taking every `from` value and landing entirely inside `to`.
    pub fn find_casts(&self, from: TypeTag, to: TypeTag) -> Vec<&Cast> {
        self.casts
            .iter()
            .filter(|c| {
                TypeTag::raw_coverage(from, c.input) == Coverage::Full
                    && TypeTag::raw_coverage(c.result, to) == Coverage::Full
            })
            .collect()
    }

    /// Result type of applying this table to an argument of type `actual`: the union of the
    /// results of every applicable cast, minus the results only inapplicable casts produce.
    pub fn narrow(&self, actual: &TypeExpr, include_implicits: bool) -> TypeExpr {
        if actual.is_nothing() {
            return self.result_types();
        }
        let conjunctions = actual.conjunctions();
        let (applicable, rest): (Vec<&Cast>, Vec<&Cast>) = self.casts.iter().partition(|c| {
            conjunctions
                .iter()
                .any(|a| is_convertible(a, c.input, include_implicits) != Coverage::None)
        });
        let positive = TypeExpr::union(applicable.iter().map(|c| c.result));
        let negative = rest
            .iter()
            .filter(|c| !applicable.iter().any(|p| p.result == c.result))
            .fold(TypeExpr::anything(), |acc, c| {
                acc.and(&TypeExpr::atom(c.result).not())
            });
        positive.and(&negative)
    }
}
