//! Subscript conversion for indexed assignment.
//!
//! A subscript arrives as an R value (a number, a name, a logical mask, a vector of any of
//! those, `NULL` or the missing argument) and is turned into zero-based slots of the
//! target vector. Slots past the current end are legal and make the target grow.

use crate::runtime::{RError, RLogical, RResult, RValue, RVector, VectorData, INT_NA};

/// The subscripts of one assignment: `x[i] <- v` or `x[i, j, ...] <- v`.
#[derive(Debug, Clone)]
pub enum Positions {
    Single(RValue),
    Dims(Vec<RValue>),
}

impl Positions {
    pub fn single(position: impl Into<RValue>) -> Self {
        Positions::Single(position.into())
    }

    pub fn dims(positions: Vec<RValue>) -> Self {
        Positions::Dims(positions)
    }

    /// `x[] <- v`
    pub fn missing() -> Self {
        Positions::Single(RValue::Missing)
    }

    /// One subscript is flat indexing whatever the receiver's dimensions.
    pub fn normalized(&self) -> Positions {
        match self {
            Positions::Dims(ps) if ps.len() == 1 => Positions::Single(ps[0].clone()),
            Positions::Dims(ps) if ps.is_empty() => Positions::missing(),
            other => other.clone(),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Positions::Single(_) => 1,
            Positions::Dims(ps) => ps.len(),
        }
    }
}

// ============================================================================
// Raw subscript views
// ============================================================================

fn int_subscript(i: i32) -> Option<i64> {
    if i == INT_NA {
        None
    } else {
        Some(i as i64)
    }
}

/// Doubles outside the integer range, infinities included, read as NA.
fn double_subscript(d: f64) -> Option<i64> {
    let truncated = d.trunc();
    if d.is_nan() || truncated.abs() > i32::MAX as f64 {
        None
    } else {
        Some(truncated as i64)
    }
}

/// Numeric subscripts, doubles truncated toward zero; `None` marks NA.
pub(crate) fn numeric_subscripts(position: &RValue) -> Option<Vec<Option<i64>>> {
    match position {
        RValue::Int(i) => Some(vec![int_subscript(*i)]),
        RValue::Double(d) => Some(vec![double_subscript(*d)]),
        RValue::Vector(v) => match &*v.data() {
            VectorData::Int(items) => Some(items.iter().map(|i| int_subscript(*i)).collect()),
            VectorData::Double(items) => Some(items.iter().map(|d| double_subscript(*d)).collect()),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn logical_subscripts(position: &RValue) -> Option<Vec<RLogical>> {
    match position {
        RValue::Logical(l) => Some(vec![*l]),
        RValue::Bool(b) => Some(vec![RLogical::from_bool(*b)]),
        RValue::Vector(v) => match &*v.data() {
            VectorData::Logical(items) => Some(items.clone()),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn string_subscripts(position: &RValue) -> Option<Vec<Option<String>>> {
    match position {
        RValue::Str(s) => Some(vec![s.clone()]),
        RValue::Vector(v) => match &*v.data() {
            VectorData::Str(items) => Some(items.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Name used by `invalid subscript type` for subscripts that cannot index at all.
pub(crate) fn invalid_subscript_name(position: &RValue) -> Option<&'static str> {
    match position {
        RValue::Complex(_) => Some("complex"),
        RValue::Raw(_) => Some("raw"),
        RValue::Function(_) => Some("closure"),
        RValue::Env(_) => Some("environment"),
        RValue::Vector(v) => match &*v.data() {
            VectorData::Complex(_) => Some("complex"),
            VectorData::Raw(_) => Some("raw"),
            VectorData::List(_) => Some("list"),
            _ => None,
        },
        _ => None,
    }
}

fn invalid_subscript(position: &RValue) -> RError {
    RError::invalid_subscript_type(invalid_subscript_name(position).unwrap_or_else(|| position.type_name()))
}

// ============================================================================
// Flat subscripts
// ============================================================================

/// Slots selected by a flat subscript, in subscript order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedIndex {
    /// Zero-based target slots; `None` is an NA subscript.
    pub slots: Vec<Option<usize>>,
    /// Length of the target once every slot exists.
    pub new_len: usize,
    /// Names of slots appended by unmatched character subscripts.
    pub new_names: Vec<(usize, Option<String>)>,
}

impl ResolvedIndex {
    fn new(slots: Vec<Option<usize>>, len: usize) -> Self {
        let highest = slots.iter().flatten().map(|s| s + 1).max().unwrap_or(0);
        Self {
            slots,
            new_len: len.max(highest),
            new_names: Vec::new(),
        }
    }

    pub fn has_na(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    /// One past the highest selected slot.
    pub fn highest(&self) -> usize {
        self.slots.iter().flatten().map(|s| s + 1).max().unwrap_or(0)
    }
}

/// Converts a `[<-` subscript against a target of length `len` carrying `names`.
pub fn resolve_flat(position: &RValue, len: usize, names: Option<&[Option<String>]>) -> RResult<ResolvedIndex> {
    if let RValue::Missing = position {
        return Ok(ResolvedIndex::new((0..len).map(Some).collect(), len));
    }
    if let RValue::Null = position {
        return Ok(ResolvedIndex::new(Vec::new(), len));
    }
    if let Some(ints) = numeric_subscripts(position) {
        return resolve_numeric(&ints, len);
    }
    if let Some(mask) = logical_subscripts(position) {
        return Ok(resolve_mask(&mask, len));
    }
    if let Some(strings) = string_subscripts(position) {
        return Ok(resolve_names(&strings, len, names));
    }
    Err(invalid_subscript(position))
}

fn resolve_numeric(ints: &[Option<i64>], len: usize) -> RResult<ResolvedIndex> {
    let negative = ints.iter().flatten().any(|p| *p < 0);
    if negative {
        let mixed = ints.iter().any(|p| match p {
            Some(p) => *p > 0,
            None => true,
        });
        if mixed {
            return Err(RError::Only0Mixed);
        }
        let excluded: Vec<usize> = ints
            .iter()
            .flatten()
            .filter(|p| **p != 0)
            .map(|p| p.unsigned_abs() as usize - 1)
            .collect();
        let slots = (0..len).filter(|i| !excluded.contains(i)).map(Some).collect();
        return Ok(ResolvedIndex::new(slots, len));
    }
    let slots = ints
        .iter()
        .filter(|p| **p != Some(0))
        .map(|p| p.map(|p| p as usize - 1))
        .collect();
    Ok(ResolvedIndex::new(slots, len))
}

/// A mask is recycled over the target; a longer mask extends it.
fn resolve_mask(mask: &[RLogical], len: usize) -> ResolvedIndex {
    if mask.is_empty() {
        return ResolvedIndex::new(Vec::new(), len);
    }
    let span = len.max(mask.len());
    let slots = (0..span)
        .filter_map(|i| match mask[i % mask.len()] {
            RLogical::True => Some(Some(i)),
            RLogical::Na => Some(None),
            RLogical::False => None,
        })
        .collect();
    ResolvedIndex::new(slots, len)
}

/// Names match the first equal existing name; unmatched names append new named slots.
fn resolve_names(strings: &[Option<String>], len: usize, names: Option<&[Option<String>]>) -> ResolvedIndex {
    let mut known: Vec<Option<String>> = match names {
        Some(n) => n.to_vec(),
        None => vec![None; len],
    };
    let mut resolved = ResolvedIndex::new(Vec::new(), len);
    for name in strings {
        let existing = match name {
            Some(_) => known.iter().position(|k| k == name),
            None => None,
        };
        let slot = match existing {
            Some(slot) => slot,
            None => {
                known.push(name.clone());
                resolved.new_names.push((known.len() - 1, name.clone()));
                known.len() - 1
            }
        };
        resolved.slots.push(Some(slot));
    }
    resolved.new_len = known.len().max(len);
    resolved
}

// ============================================================================
// Per-dimension subscripts
// ============================================================================

/// Converts the subscript of one dimension of extent `extent`. Dimensions never grow.
pub fn resolve_dimension(position: &RValue, extent: usize) -> RResult<Vec<Option<usize>>> {
    let resolved = match position {
        RValue::Missing | RValue::Null => resolve_flat(position, extent, None)?,
        p if numeric_subscripts(p).is_some() || logical_subscripts(p).is_some() => {
            if let Some(mask) = logical_subscripts(p) {
                if mask.len() > extent {
                    return Err(RError::SubscriptBounds);
                }
            }
            resolve_flat(p, extent, None)?
        }
        // no dimnames to match against
        p if string_subscripts(p).is_some() => return Err(RError::SubscriptBounds),
        p => return Err(invalid_subscript(p)),
    };
    if resolved.new_len > extent {
        return Err(RError::SubscriptBounds);
    }
    Ok(resolved.slots)
}

// ============================================================================
// Recursive (`[[`) subscripts
// ============================================================================

/// One step of a `[[c(i, j, ...)]]` path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathElement {
    Index(Option<i64>),
    Name(Option<String>),
}

impl PathElement {
    pub fn is_na(&self) -> bool {
        matches!(self, PathElement::Index(None) | PathElement::Name(None))
    }

    /// The element as a single subscript value.
    pub fn to_position(&self) -> RValue {
        match self {
            PathElement::Index(None) => RValue::Int(INT_NA),
            PathElement::Index(Some(p)) => match i32::try_from(*p) {
                Ok(i) => RValue::Int(i),
                Err(_) => RValue::Double(*p as f64),
            },
            PathElement::Name(n) => RValue::Str(n.clone()),
        }
    }
}

/// Splits a `[[` subscript vector into a descent path. Logical subscripts count as 1/0.
pub fn recursion_path(position: &RValue) -> RResult<Vec<PathElement>> {
    if let Some(ints) = numeric_subscripts(position) {
        return Ok(ints.into_iter().map(PathElement::Index).collect());
    }
    if let Some(strings) = string_subscripts(position) {
        return Ok(strings.into_iter().map(PathElement::Name).collect());
    }
    if let Some(mask) = logical_subscripts(position) {
        return Ok(mask
            .into_iter()
            .map(|l| PathElement::Index(l.to_bool().map(i64::from)))
            .collect());
    }
    Err(invalid_subscript(position))
}

/// The remaining path as a subscript vector.
pub fn path_position(path: &[PathElement]) -> RValue {
    match path.first() {
        Some(PathElement::Name(_)) => RValue::Vector(RVector::from_data(VectorData::Str(
            path.iter()
                .map(|e| match e {
                    PathElement::Name(n) => n.clone(),
                    PathElement::Index(i) => i.map(|i| i.to_string()),
                })
                .collect(),
        ))),
        _ => RValue::Vector(RVector::from_data(VectorData::Double(
            path.iter()
                .map(|e| match e {
                    PathElement::Index(Some(i)) => *i as f64,
                    _ => crate::runtime::double_na(),
                })
                .collect(),
        ))),
    }
}

/// Slot of `[[` selecting exactly one element of a vector of length `len`.
#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    Existing(usize),
    /// Past the end; the target grows to `slot + 1`, optionally naming the slot.
    Append(usize, Option<String>),
}

/// Resolves one `[[` step at recursion level `rec_level`; `last` marks the final step,
/// the only one allowed to reach past the end.
pub fn position_in_recursion(
    element: &PathElement,
    len: usize,
    names: Option<&[Option<String>]>,
    rec_level: usize,
    last: bool,
) -> RResult<Subscript> {
    match element {
        PathElement::Index(None) => Err(if last && rec_level > 0 {
            RError::SelectLess1
        } else if rec_level == 0 {
            RError::SelectMore1
        } else {
            RError::NoSuchIndex(rec_level + 1)
        }),
        PathElement::Index(Some(0)) => Err(RError::SelectLess1),
        PathElement::Index(Some(p)) if *p < 0 => from_negative(p.unsigned_abs() as usize, len).map(Subscript::Existing),
        PathElement::Index(Some(p)) => {
            let slot = *p as usize - 1;
            if slot < len {
                Ok(Subscript::Existing(slot))
            } else if last {
                Ok(Subscript::Append(slot, None))
            } else {
                Err(RError::NoSuchIndex(rec_level + 1))
            }
        }
        PathElement::Name(name) => {
            let found = match (name, names) {
                (Some(_), Some(names)) => names.iter().position(|n| n == name),
                _ => None,
            };
            match found {
                Some(slot) => Ok(Subscript::Existing(slot)),
                None if last => Ok(Subscript::Append(len, name.clone())),
                None => Err(RError::NoSuchIndex(rec_level + 1)),
            }
        }
    }
}

/// A negative `[[` subscript must leave exactly one element.
fn from_negative(excluded: usize, len: usize) -> RResult<usize> {
    let remaining: Vec<usize> = (0..len).filter(|i| *i + 1 != excluded).collect();
    match remaining.as_slice() {
        [slot] => Ok(*slot),
        [] => Err(RError::SelectLess1),
        _ => Err(RError::SelectMore1),
    }
}
