//! Type expressions: sets of runtime types in disjunctive normal form.
//!
//! A [`TypeExpr`] is an OR of [`Conjunction`]s, each an AND of polarised [`TypeAtom`]s
//! (`T` or `Not(T)`). Atoms are either classes/interfaces of the [`TypeTag`] universe or
//! wildcards: "the part of these upper bounds produced by one pipeline element".
//!
//! # Normal form
//!
//! Every expression is kept normalised:
//!
//! 1. **Contradiction**: a conjunction holding two mutually exclusive atoms is empty and
//!    dropped. Atoms `a`, `b` are exclusive when neither covers the other at all
//!    (`Coverage::None` both ways) or when one lies entirely inside the complement of the
//!    other.
//! 2. **Subsumption inside a conjunction**: an atom fully covered by a sibling is dropped
//!    (`IntVector ∧ AbstractVector` is `IntVector`).
//! 3. **Subsumption across conjunctions**: a conjunction fully covered by another one is
//!    dropped (`IntVector ∨ AbstractVector` is `AbstractVector`).
//!
//! `ANYTHING` is the single conjunction `{Any}`, `NOTHING` is the empty disjunction.
//! Equality compares the normal forms; attached samples do not take part.

use std::fmt;
use std::rc::Rc;

use itertools::Itertools;

use super::coverage::{implicitly_convertible, Coverage};
use super::samples::Samples;
use super::types::TypeTag;
use super::wildcard::{SiteId, WildcardId, WildcardRegistry};
use crate::runtime::RValue;

/// Membership test carried by a wildcard on top of its bounds.
pub type Predicate = Rc<dyn Fn(&RValue) -> bool>;

#[derive(Clone)]
pub struct Wildcard {
    pub id: WildcardId,
    pub bounds: Vec<TypeTag>,
    predicate: Option<Predicate>,
}

impl Wildcard {
    fn contains(&self, value: &RValue) -> bool {
        let class = TypeTag::of(value);
        self.bounds.iter().all(|b| b.is_assignable_from(class))
            && self.predicate.as_ref().map_or(true, |p| p(value))
    }
}

impl fmt::Debug for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}{:?}", self.id, self.bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomKey {
    Tag(TypeTag),
    Wild(WildcardId),
}

#[derive(Debug, Clone)]
pub enum AtomType {
    Tag(TypeTag),
    Wild(Wildcard),
}

impl AtomType {
    pub fn key(&self) -> AtomKey {
        match self {
            AtomType::Tag(t) => AtomKey::Tag(*t),
            AtomType::Wild(w) => AtomKey::Wild(w.id),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, AtomType::Tag(TypeTag::Any))
    }

    fn contains(&self, value: &RValue) -> bool {
        match self {
            AtomType::Tag(t) => t.is_assignable_from(TypeTag::of(value)),
            AtomType::Wild(w) => w.contains(value),
        }
    }

    fn upper_bounds(&self) -> Vec<TypeTag> {
        match self {
            AtomType::Tag(t) => vec![*t],
            AtomType::Wild(w) => w.bounds.clone(),
        }
    }
}

/// Coverage between the positive types of two atoms.
fn type_coverage(from: &AtomType, to: &AtomType) -> Coverage {
    match (from, to) {
        (AtomType::Tag(f), AtomType::Tag(t)) => TypeTag::raw_coverage(*f, *t),
        (AtomType::Wild(a), AtomType::Wild(b)) if a.id == b.id => Coverage::Full,
        (AtomType::Wild(w), AtomType::Tag(t)) => {
            // the wildcard is some subset of its bounds
            if w.bounds.iter().any(|b| TypeTag::raw_coverage(*b, *t) == Coverage::Full) {
                Coverage::Full
            } else if w.bounds.iter().any(|b| TypeTag::raw_coverage(*b, *t) == Coverage::None) {
                Coverage::None
            } else {
                Coverage::Potential
            }
        }
        (from, to) => {
            let disjoint = from.upper_bounds().iter().any(|f| {
                to.upper_bounds()
                    .iter()
                    .any(|t| TypeTag::raw_coverage(*f, *t) == Coverage::None)
            });
            if disjoint {
                Coverage::None
            } else {
                Coverage::Potential
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeAtom {
    pub ty: AtomType,
    pub positive: bool,
}

impl TypeAtom {
    pub fn tag(tag: TypeTag) -> Self {
        Self {
            ty: AtomType::Tag(tag),
            positive: true,
        }
    }

    pub fn negate(&self) -> Self {
        Self {
            ty: self.ty.clone(),
            positive: !self.positive,
        }
    }

    fn sort_key(&self) -> (AtomKey, bool) {
        (self.ty.key(), self.positive)
    }

    /// `Not(Any)`, the empty set.
    fn is_empty_set(&self) -> bool {
        !self.positive && self.ty.is_any()
    }

    pub fn accepts(&self, value: &RValue) -> bool {
        self.ty.contains(value) == self.positive
    }
}

impl PartialEq for TypeAtom {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for TypeAtom {}

impl PartialOrd for TypeAtom {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeAtom {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// How much of `from`'s values the atom `to` contains.
pub fn atom_coverage(from: &TypeAtom, to: &TypeAtom) -> Coverage {
    if from.is_empty_set() {
        return Coverage::Full;
    }
    if to.is_empty_set() {
        return Coverage::None;
    }
    type_coverage(&from.ty, &to.ty).transpose(&from.ty, &to.ty, from.positive, to.positive)
}

fn mutually_exclusive(a: &TypeAtom, b: &TypeAtom) -> bool {
    (atom_coverage(a, b) == Coverage::None && atom_coverage(b, a) == Coverage::None)
        || atom_coverage(a, &b.negate()) == Coverage::Full
        || atom_coverage(b, &a.negate()) == Coverage::Full
}

// ============================================================================
// CONJUNCTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Conjunction {
    atoms: Vec<TypeAtom>,
}

impl Conjunction {
    pub fn of_tag(tag: TypeTag) -> Self {
        Self {
            atoms: vec![TypeAtom::tag(tag)],
        }
    }

    pub fn atoms(&self) -> &[TypeAtom] {
        &self.atoms
    }

    /// Normalised conjunction of `atoms`, or `None` when it is empty.
    fn build(mut atoms: Vec<TypeAtom>) -> Option<Self> {
        atoms.sort();
        atoms.dedup();
        if atoms.is_empty() {
            atoms.push(TypeAtom::tag(TypeTag::Any));
        }
        if atoms.iter().any(|a| a.is_empty_set()) {
            return None;
        }
        for (a, b) in atoms.iter().tuple_combinations() {
            if mutually_exclusive(a, b) {
                return None;
            }
        }
        let n = atoms.len();
        let mut keep = vec![true; n];
        for i in 0..n {
            for j in 0..n {
                if i == j || !keep[j] {
                    continue;
                }
                if atom_coverage(&atoms[j], &atoms[i]) == Coverage::Full {
                    let equivalent = atom_coverage(&atoms[i], &atoms[j]) == Coverage::Full;
                    if equivalent && i < j {
                        continue;
                    }
                    keep[i] = false;
                    break;
                }
            }
        }
        let atoms: Vec<TypeAtom> = atoms
            .into_iter()
            .zip(keep)
            .filter_map(|(a, k)| k.then_some(a))
            .collect();
        Some(Self { atoms })
    }

    fn coverage_of_atom(&self, to: &TypeAtom, include_implicits: bool) -> Coverage {
        let covs: Vec<Coverage> = self.atoms.iter().map(|f| atom_coverage(f, to)).collect();
        let base = if covs.contains(&Coverage::Full) {
            Coverage::Full
        } else if covs.contains(&Coverage::None) {
            Coverage::None
        } else {
            covs.iter().copied().max().unwrap_or(Coverage::None)
        };
        if base == Coverage::Full || !include_implicits || !to.positive {
            return base;
        }
        let AtomType::Tag(target) = &to.ty else {
            return base;
        };
        let implicit = self.atoms.iter().any(|f| match (&f.ty, f.positive) {
            (AtomType::Tag(source), true) => implicitly_convertible(*source, *target),
            _ => false,
        });
        if implicit {
            Coverage::Full
        } else {
            base
        }
    }

    /// How much of `from`'s values this conjunction contains.
    pub fn coverage_from(&self, from: &Conjunction, include_implicits: bool) -> Coverage {
        self.atoms.iter().fold(Coverage::Full, |acc, to| {
            acc.and(from.coverage_of_atom(to, include_implicits))
        })
    }

    pub fn is_instance(&self, value: &RValue) -> bool {
        self.atoms.iter().all(|a| a.accepts(value))
    }

    /// Positive classes of this conjunction, `Any` when it only excludes.
    pub fn positive_tags(&self) -> Vec<TypeTag> {
        let tags: Vec<TypeTag> = self
            .atoms
            .iter()
            .filter(|a| a.positive)
            .flat_map(|a| a.ty.upper_bounds())
            .collect();
        if tags.is_empty() {
            vec![TypeTag::Any]
        } else {
            tags
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .atoms
            .iter()
            .map(|a| {
                let ty = match &a.ty {
                    AtomType::Tag(t) => t.to_string(),
                    AtomType::Wild(w) => format!("?{}{}", w.id, w.bounds.iter().join("&")),
                };
                if a.positive {
                    ty
                } else {
                    format!("!{}", ty)
                }
            })
            .join(" & ");
        f.write_str(&text)
    }
}

// ============================================================================
// TYPE EXPRESSIONS
// ============================================================================

#[derive(Clone)]
pub struct TypeExpr {
    disjuncts: Vec<Conjunction>,
    samples: Samples,
}

impl TypeExpr {
    fn from_conjunctions(conjunctions: impl IntoIterator<Item = Conjunction>) -> Self {
        let mut disjuncts: Vec<Conjunction> = conjunctions.into_iter().collect();
        disjuncts.sort();
        disjuncts.dedup();
        let n = disjuncts.len();
        let mut keep = vec![true; n];
        for i in 0..n {
            for j in 0..n {
                if i == j || !keep[j] {
                    continue;
                }
                if disjuncts[j].coverage_from(&disjuncts[i], false) == Coverage::Full {
                    let equivalent =
                        disjuncts[i].coverage_from(&disjuncts[j], false) == Coverage::Full;
                    if equivalent && i < j {
                        continue;
                    }
                    keep[i] = false;
                    break;
                }
            }
        }
        let disjuncts = disjuncts
            .into_iter()
            .zip(keep)
            .filter_map(|(c, k)| k.then_some(c))
            .collect();
        TypeExpr {
            disjuncts,
            samples: Samples::empty(),
        }
    }

    pub fn anything() -> Self {
        Self::atom(TypeTag::Any)
    }

    pub fn nothing() -> Self {
        TypeExpr {
            disjuncts: Vec::new(),
            samples: Samples::empty(),
        }
    }

    pub fn atom(tag: TypeTag) -> Self {
        TypeExpr {
            disjuncts: vec![Conjunction::of_tag(tag)],
            samples: Samples::empty(),
        }
    }

    pub fn union(tags: impl IntoIterator<Item = TypeTag>) -> Self {
        Self::from_conjunctions(tags.into_iter().map(Conjunction::of_tag))
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        &self.disjuncts
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn is_nothing(&self) -> bool {
        self.disjuncts.is_empty()
    }

    pub fn is_anything(&self) -> bool {
        self.disjuncts.len() == 1
            && self.disjuncts[0].atoms.len() == 1
            && self.disjuncts[0].atoms[0] == TypeAtom::tag(TypeTag::Any)
    }

    pub fn is_instance(&self, value: &RValue) -> bool {
        self.disjuncts.iter().any(|c| c.is_instance(value))
    }

    fn resampled(mut self, pools: &[&Samples]) -> Self {
        let samples = Samples::classify(pools.iter().copied(), |v| self.is_instance(v));
        self.samples = samples;
        self
    }

    pub fn or(&self, other: &TypeExpr) -> TypeExpr {
        Self::from_conjunctions(self.disjuncts.iter().chain(&other.disjuncts).cloned())
            .resampled(&[&self.samples, &other.samples])
    }

    pub fn and(&self, other: &TypeExpr) -> TypeExpr {
        let product = self
            .disjuncts
            .iter()
            .cartesian_product(&other.disjuncts)
            .filter_map(|(a, b)| {
                Conjunction::build(a.atoms.iter().chain(&b.atoms).cloned().collect())
            });
        Self::from_conjunctions(product).resampled(&[&self.samples, &other.samples])
    }

    /// Complement relative to `ANYTHING`, by De Morgan: each conjunction becomes the
    /// disjunction of its negated atoms and those are intersected back into DNF.
    pub fn not(&self) -> TypeExpr {
        let negated = self.disjuncts.iter().fold(TypeExpr::anything(), |acc, c| {
            let alternatives = TypeExpr::from_conjunctions(
                c.atoms
                    .iter()
                    .filter_map(|a| Conjunction::build(vec![a.negate()])),
            );
            acc.and(&alternatives)
        });
        negated.resampled(&[&self.samples])
    }

    /// Refines every conjunction into a wildcard produced by `site`.
    pub fn lower(&self, site: SiteId) -> TypeExpr {
        self.lower_with(site, None)
    }

    /// Like [`TypeExpr::lower`], with a membership test the produced values satisfy.
    pub fn lower_with(&self, site: SiteId, predicate: Option<Predicate>) -> TypeExpr {
        let lowered = self.disjuncts.iter().filter_map(|c| {
            let mut bounds = Vec::new();
            let mut inherited: Vec<Predicate> = Vec::new();
            let mut negatives = Vec::new();
            for atom in &c.atoms {
                match (&atom.ty, atom.positive) {
                    (AtomType::Tag(t), true) => bounds.push(*t),
                    (AtomType::Wild(w), true) => {
                        bounds.extend(w.bounds.iter().copied());
                        if let Some(p) = &w.predicate {
                            inherited.push(p.clone());
                        }
                    }
                    (_, false) => negatives.push(atom.clone()),
                }
            }
            bounds.sort();
            bounds.dedup();
            if bounds.len() > 1 {
                bounds.retain(|b| *b != TypeTag::Any);
            }
            let mut checks = inherited;
            if let Some(p) = &predicate {
                checks.push(p.clone());
            }
            let combined: Option<Predicate> = if checks.is_empty() {
                None
            } else {
                Some(Rc::new(move |v: &RValue| checks.iter().all(|p| p(v))))
            };
            let wildcard = Wildcard {
                id: WildcardRegistry::intern(site, &bounds),
                bounds,
                predicate: combined,
            };
            let mut atoms = negatives;
            atoms.push(TypeAtom {
                ty: AtomType::Wild(wildcard),
                positive: true,
            });
            Conjunction::build(atoms)
        });
        Self::from_conjunctions(lowered).resampled(&[&self.samples])
    }

    /// Most specific classes the expression admits, one entry per conjunction bound.
    pub fn classify(&self) -> Vec<TypeTag> {
        self.disjuncts
            .iter()
            .flat_map(|c| c.positive_tags())
            .sorted()
            .dedup()
            .collect()
    }

    /// Adds positive samples. Panics if one of them is not an instance.
    pub fn with_positive_samples(mut self, values: impl IntoIterator<Item = RValue>) -> TypeExpr {
        let values: Vec<RValue> = values.into_iter().collect();
        if let Some(bad) = values.iter().find(|v| !self.is_instance(v)) {
            crate::runtime::internal_error(format!(
                "positive sample {} is not an instance of {}",
                bad, self
            ));
        }
        self.samples = self.samples.with_positive(values);
        self
    }

    /// Adds negative samples; values that are instances are ignored.
    pub fn with_negative_samples(mut self, values: impl IntoIterator<Item = RValue>) -> TypeExpr {
        let outside: Vec<RValue> = values
            .into_iter()
            .filter(|v| !self.is_instance(v))
            .collect();
        self.samples = self.samples.with_negative(outside);
        self
    }

    pub fn with_samples_from(self, pool: &Samples) -> TypeExpr {
        let current = self.samples.clone();
        self.resampled(&[&current, pool])
    }

    pub fn truncate_samples(mut self, max: usize) -> TypeExpr {
        self.samples = self.samples.truncate(max);
        self
    }
}

/// Type of the first element of a value of class `tag`.
pub fn element_type(tag: TypeTag) -> TypeExpr {
    match tag {
        TypeTag::Integer | TypeTag::IntVector | TypeTag::AbstractIntVector | TypeTag::Factor => {
            TypeExpr::atom(TypeTag::Integer)
        }
        TypeTag::Double | TypeTag::DoubleVector | TypeTag::AbstractDoubleVector => {
            TypeExpr::atom(TypeTag::Double)
        }
        TypeTag::Logical | TypeTag::LogicalVector | TypeTag::AbstractLogicalVector => {
            TypeExpr::atom(TypeTag::Logical)
        }
        TypeTag::Character | TypeTag::StringVector | TypeTag::AbstractStringVector => {
            TypeExpr::atom(TypeTag::Character)
        }
        TypeTag::Complex | TypeTag::ComplexVector | TypeTag::AbstractComplexVector => {
            TypeExpr::atom(TypeTag::Complex)
        }
        TypeTag::Raw | TypeTag::RawVector | TypeTag::AbstractRawVector => {
            TypeExpr::atom(TypeTag::Raw)
        }
        TypeTag::List | TypeTag::AbstractListVector | TypeTag::DataFrame => TypeExpr::anything(),
        TypeTag::Any | TypeTag::Attributable | TypeTag::AbstractVector => {
            TypeExpr::atom(TypeTag::AbstractVector).not()
        }
        other => TypeExpr::atom(other),
    }
}

impl PartialEq for TypeExpr {
    fn eq(&self, other: &Self) -> bool {
        self.disjuncts == other.disjuncts
    }
}

impl fmt::Debug for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeExpr({})", self)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nothing() {
            return f.write_str("Nothing");
        }
        let text = self
            .disjuncts
            .iter()
            .map(|c| {
                if c.atoms.len() > 1 && self.disjuncts.len() > 1 {
                    format!("({})", c)
                } else {
                    c.to_string()
                }
            })
            .join(" | ");
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{RValue, INT_NA};
    use pretty_assertions::assert_eq;

    fn atom(t: TypeTag) -> TypeExpr {
        TypeExpr::atom(t)
    }

    #[test]
    fn test_anything_and_nothing() {
        assert!(TypeExpr::anything().is_anything());
        assert!(TypeExpr::nothing().is_nothing());
        assert!(TypeExpr::anything().not().is_nothing());
        assert!(TypeExpr::nothing().not().is_anything());
    }

    #[test]
    fn test_disjoint_classes_intersect_to_nothing() {
        let both = atom(TypeTag::StringVector).and(&atom(TypeTag::IntVector));
        assert!(both.is_nothing());
    }

    #[test]
    fn test_subsumed_atom_dropped() {
        let e = atom(TypeTag::AbstractVector).and(&atom(TypeTag::StringVector));
        assert_eq!(e, atom(TypeTag::StringVector));
        let u = atom(TypeTag::AbstractVector).or(&atom(TypeTag::StringVector));
        assert_eq!(u, atom(TypeTag::AbstractVector));
    }

    #[test]
    fn test_negated_disjoint_atom_is_redundant() {
        let e = atom(TypeTag::IntVector).and(&atom(TypeTag::StringVector).not());
        assert_eq!(e, atom(TypeTag::IntVector));
    }

    #[test]
    fn test_double_negation_of_disjoint_pair() {
        // NOT(NOT A OR NOT B) == A AND B == NOTHING for disjoint A, B
        let a = atom(TypeTag::StringVector);
        let b = atom(TypeTag::IntVector);
        let e = a.not().or(&b.not()).not();
        assert!(e.is_nothing());
    }

    #[test]
    fn test_subset_and_complement_is_nothing() {
        let e = atom(TypeTag::IntVector).and(&atom(TypeTag::AbstractIntVector).not());
        assert!(e.is_nothing());
    }

    #[test]
    fn test_interfaces_may_overlap() {
        let e = atom(TypeTag::AbstractIntVector).and(&atom(TypeTag::AbstractDoubleVector));
        assert!(!e.is_nothing());
    }

    #[test]
    fn test_is_instance() {
        let num = atom(TypeTag::Integer).or(&atom(TypeTag::Double));
        assert!(num.is_instance(&RValue::Int(5)));
        assert!(!num.is_instance(&RValue::str("s")));
        assert!(num.not().is_instance(&RValue::str("s")));
    }

    #[test]
    fn test_lower_identity_by_site() {
        let site = SiteId::fresh();
        let a = atom(TypeTag::Integer).lower(site);
        let b = atom(TypeTag::Integer).lower(site);
        let c = atom(TypeTag::Integer).lower(SiteId::fresh());
        assert_eq!(a, b);
        assert_ne!(a, c);
        // a wildcard stays inside its bounds
        assert!(a.and(&atom(TypeTag::Double)).is_nothing());
        assert_eq!(a.and(&atom(TypeTag::Integer)), a);
        assert!(a.and(&atom(TypeTag::Integer).not()).is_nothing());
    }

    #[test]
    fn test_lower_with_predicate() {
        let not_na: Predicate = Rc::new(|v: &RValue| !v.is_na());
        let e = atom(TypeTag::Integer).lower_with(SiteId::fresh(), Some(not_na));
        assert!(e.is_instance(&RValue::Int(1)));
        assert!(!e.is_instance(&RValue::Int(INT_NA)));
    }

    #[test]
    fn test_samples_follow_membership() {
        let e = atom(TypeTag::Integer)
            .with_positive_samples(vec![RValue::Int(1)])
            .with_negative_samples(vec![RValue::str("x")]);
        let n = e.not();
        assert!(n.samples().positive().contains(&RValue::str("x")));
        assert!(n.samples().negative().contains(&RValue::Int(1)));
        let back = n.not();
        assert_eq!(back.samples().positive(), &[RValue::Int(1)]);
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn test_bad_positive_sample_panics() {
        let _ = atom(TypeTag::Integer).with_positive_samples(vec![RValue::str("x")]);
    }

    #[test]
    fn test_element_types() {
        assert_eq!(element_type(TypeTag::Factor), atom(TypeTag::Integer));
        assert!(element_type(TypeTag::List).is_anything());
        assert!(element_type(TypeTag::AbstractVector).is_instance(&RValue::Int(1)));
    }

    #[test]
    fn test_display() {
        let e = atom(TypeTag::Null).or(&atom(TypeTag::StringVector));
        assert_eq!(e.to_string(), "Null | StringVector");
        assert_eq!(TypeExpr::nothing().to_string(), "Nothing");
    }
}
