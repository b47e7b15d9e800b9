//! Transition table of the update engine.
//!
//! Every assignment is classified into a `(value, position, vector)` triple of closed
//! kinds and [`select`] maps the triple, together with the `[<-`/`[[<-` flag and the
//! recursion level, to one [`Transition`]. Guards are tested most specific first and the
//! order differs between cases: for example an empty replacement is checked before the
//! dimension count for `x[i, j] <- v`, while `[[<-` validates the subscript shape before
//! looking at the replacement.

use super::multi_dim::{check_dimensions, value_size_error};
use super::positions::{invalid_subscript_name, logical_subscripts, numeric_subscripts, string_subscripts, Positions};
use crate::runtime::{RError, RLogical, RValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    /// Functions and environments: storable in lists, never in atomic vectors.
    NonVector,
    Empty,
    Single,
    Multi,
}

impl ValueKind {
    pub fn of(value: &RValue) -> Self {
        match value {
            RValue::Null | RValue::Missing => ValueKind::Null,
            RValue::Function(_) | RValue::Env(_) => ValueKind::NonVector,
            v => match v.len() {
                0 => ValueKind::Empty,
                1 => ValueKind::Single,
                _ => ValueKind::Multi,
            },
        }
    }

    fn len(&self) -> usize {
        match self {
            ValueKind::Null | ValueKind::Empty => 0,
            ValueKind::NonVector | ValueKind::Single => 1,
            ValueKind::Multi => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Null,
    Atomic,
    List,
    Function,
    Environment,
}

impl VectorKind {
    pub fn of(vector: &RValue) -> Self {
        match vector {
            RValue::Null | RValue::Missing => VectorKind::Null,
            RValue::Function(_) => VectorKind::Function,
            RValue::Env(_) => VectorKind::Environment,
            RValue::Vector(v) if v.is_list() => VectorKind::List,
            _ => VectorKind::Atomic,
        }
    }
}

/// A single subscript reduced to what the table distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarPosition {
    Zero,
    Na,
    Negative(usize),
    Positive(usize),
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionKind {
    Missing,
    Null,
    /// Zero-length subscript vector.
    Empty,
    Scalar(ScalarPosition),
    /// Numeric subscript vector longer than one.
    Vector { len: usize, first_zero: bool },
    /// Character subscript vector longer than one.
    Names(usize),
    /// Logical subscript of `[<-`.
    Mask,
    Complex,
    Raw,
    List(usize),
    /// Closures, environments and other unusable subscripts, by type name.
    Invalid(&'static str),
    Dims { count: usize, selects_nothing: bool },
}

impl PositionKind {
    pub fn of(positions: &Positions, is_subset: bool) -> Self {
        match positions.normalized() {
            Positions::Dims(ps) => PositionKind::Dims {
                count: ps.len(),
                selects_nothing: ps.iter().any(|p| !matches!(p, RValue::Missing) && selects_nothing(p)),
            },
            Positions::Single(p) => Self::of_single(&p, is_subset),
        }
    }

    fn of_single(position: &RValue, is_subset: bool) -> Self {
        match position {
            RValue::Missing => return PositionKind::Missing,
            RValue::Null => return PositionKind::Null,
            _ => {}
        }
        match invalid_subscript_name(position) {
            Some("complex") => return PositionKind::Complex,
            Some("raw") => return PositionKind::Raw,
            Some("list") => return PositionKind::List(position.len()),
            Some(name) => return PositionKind::Invalid(name),
            None => {}
        }
        if let Some(ints) = numeric_subscripts(position) {
            return Self::numeric(&ints);
        }
        if let Some(mask) = logical_subscripts(position) {
            if is_subset {
                return PositionKind::Mask;
            }
            let ints: Vec<Option<i64>> = mask.iter().map(|l| l.to_bool().map(i64::from)).collect();
            return Self::numeric(&ints);
        }
        match string_subscripts(position) {
            Some(names) => match names.len() {
                0 => PositionKind::Empty,
                1 => PositionKind::Scalar(ScalarPosition::Name),
                n => PositionKind::Names(n),
            },
            None => PositionKind::Invalid(position.type_name()),
        }
    }

    fn numeric(ints: &[Option<i64>]) -> Self {
        match ints {
            [] => PositionKind::Empty,
            [single] => PositionKind::Scalar(match single {
                None => ScalarPosition::Na,
                Some(0) => ScalarPosition::Zero,
                Some(p) if *p < 0 => ScalarPosition::Negative(p.unsigned_abs() as usize),
                Some(p) => ScalarPosition::Positive(*p as usize),
            }),
            [first, ..] => PositionKind::Vector {
                len: ints.len(),
                first_zero: *first == Some(0),
            },
        }
    }
}

/// True when a subscript can select no slot at all, whatever the receiver.
pub fn selects_nothing(position: &RValue) -> bool {
    if let RValue::Null = position {
        return true;
    }
    if let Some(ints) = numeric_subscripts(position) {
        return ints.iter().all(|p| *p == Some(0));
    }
    if let Some(mask) = logical_subscripts(position) {
        return mask.iter().all(|l| *l == RLogical::False);
    }
    if let Some(names) = string_subscripts(position) {
        return names.is_empty();
    }
    false
}

/// What the engine does for one classified assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The receiver is returned as is.
    Unchanged,
    Fail(RError),
    /// `NULL` receiver: a vector of the value's type is created first.
    CreateFromNull,
    /// Element-wise writes with recycling, NA padding and names.
    WriteElements,
    /// `[[<-` of a whole value into one list slot.
    StoreElement,
    /// `[[<-` of `NULL` into a list: the slot is removed.
    DeleteElement,
    /// `[<-` of `NULL` into a list: every selected slot is removed.
    DeleteElements,
    /// `[[c(i, j, ...)]] <-` descent into nested lists.
    Recurse,
    WriteMultiDim,
}

/// Everything the table looks at.
#[derive(Debug, Clone)]
pub struct UpdateContext {
    pub is_subset: bool,
    pub value: ValueKind,
    pub value_type: &'static str,
    pub position: PositionKind,
    pub selects_nothing: bool,
    pub vector: VectorKind,
    pub vector_type: &'static str,
    pub vector_len: usize,
    pub vector_dims: Option<usize>,
    pub rec_level: usize,
}

impl UpdateContext {
    pub fn new(is_subset: bool, vector: &RValue, value: &RValue, positions: &Positions, rec_level: usize) -> Self {
        let positions = positions.normalized();
        let vector_len = vector.len();
        let selects = match &positions {
            Positions::Single(RValue::Missing) => vector_len == 0,
            Positions::Single(p) => selects_nothing(p),
            Positions::Dims(_) => false,
        };
        let position = PositionKind::of(&positions, is_subset);
        let selects_nothing = match position {
            PositionKind::Dims { selects_nothing, .. } => selects_nothing,
            _ => selects,
        };
        Self {
            is_subset,
            value: ValueKind::of(value),
            value_type: value.type_name(),
            position,
            selects_nothing,
            vector: VectorKind::of(vector),
            vector_type: vector.type_name(),
            vector_len,
            vector_dims: vector.as_vector().and_then(|v| v.dims()).map(|d| d.len()),
            rec_level,
        }
    }

    fn is_list(&self) -> bool {
        self.vector == VectorKind::List
    }
}

/// Picks the transition for `ctx`.
pub fn select(ctx: &UpdateContext) -> Transition {
    match ctx.vector {
        VectorKind::Function => return Transition::Fail(RError::ObjectNotSubsettable("closure".into())),
        VectorKind::Environment => return Transition::Fail(RError::ObjectNotSubsettable("environment".into())),
        _ => {}
    }
    match ctx.position {
        PositionKind::Complex => return Transition::Fail(atomic_subscript_type(ctx, "complex")),
        PositionKind::Raw => return Transition::Fail(atomic_subscript_type(ctx, "raw")),
        PositionKind::List(n) => return Transition::Fail(list_subscript(ctx, n)),
        PositionKind::Dims { count, selects_nothing } => return multi_dim(ctx, count, selects_nothing),
        _ => {}
    }
    if ctx.vector == VectorKind::Null {
        return null_vector(ctx);
    }
    match ctx.value {
        ValueKind::Null => null_value(ctx),
        ValueKind::NonVector if ctx.is_subset || !ctx.is_list() => {
            Transition::Fail(RError::subassign_type_fix(ctx.value_type, ctx.vector_type))
        }
        _ if ctx.is_subset => subset(ctx),
        _ if ctx.is_list() => subscript_list(ctx),
        _ => subscript_atomic(ctx),
    }
}

// ============================================================================
// Subscript type errors
// ============================================================================

fn atomic_subscript_type(ctx: &UpdateContext, name: &str) -> RError {
    if ctx.is_subset || ctx.is_list() || ctx.value == ValueKind::Single {
        return RError::invalid_subscript_type(name);
    }
    match ctx.value {
        ValueKind::Empty => RError::Replacement0,
        _ => RError::MoreSuppliedReplace,
    }
}

fn list_subscript(ctx: &UpdateContext, positions: usize) -> RError {
    if !ctx.is_subset {
        let value_len = ctx.value.len();
        let is_null = ctx.value == ValueKind::Null;
        if ctx.is_list() {
            if positions == 0 {
                return RError::SelectLess1;
            }
        } else {
            if positions <= 1 && value_len == 0 && !is_null {
                return RError::Replacement0;
            }
            if positions == 0 && (value_len == 1 || is_null) {
                return RError::SelectLess1;
            }
            if positions <= 1 && (value_len > 1 || is_null) {
                return RError::MoreSuppliedReplace;
            }
            if positions > 2 && value_len != positions {
                return RError::SelectMore1;
            }
        }
    }
    RError::invalid_subscript_type("list")
}

// ============================================================================
// x[i, j, ...] <- v
// ============================================================================

fn multi_dim(ctx: &UpdateContext, count: usize, selects_nothing: bool) -> Transition {
    if ctx.vector == VectorKind::Null {
        if ctx.value == ValueKind::Null {
            return Transition::Unchanged;
        }
        return match check_dimensions(count, None, ctx.is_subset) {
            Err(e) => Transition::Fail(e),
            Ok(()) => Transition::Fail(RError::IncorrectSubscripts),
        };
    }
    match ctx.value {
        ValueKind::Empty if ctx.is_subset && selects_nothing => return Transition::Unchanged,
        ValueKind::Empty => return Transition::Fail(RError::Replacement0),
        ValueKind::Null if ctx.is_subset => return Transition::Fail(RError::NotMultipleReplacement),
        ValueKind::Null if ctx.is_list() => {
            return Transition::Fail(RError::SubscriptTypes {
                from: "NULL".into(),
                to: "list".into(),
            })
        }
        ValueKind::Null => return Transition::Fail(RError::MoreSuppliedReplace),
        _ => {}
    }
    if let Err(e) = check_dimensions(count, ctx.vector_dims, ctx.is_subset) {
        return Transition::Fail(e);
    }
    if ctx.value == ValueKind::NonVector {
        return Transition::Fail(RError::subassign_type_fix(ctx.value_type, ctx.vector_type));
    }
    Transition::WriteMultiDim
}

// ============================================================================
// NULL receiver
// ============================================================================

fn null_vector(ctx: &UpdateContext) -> Transition {
    match ctx.value {
        ValueKind::Null => return Transition::Unchanged,
        ValueKind::Empty if ctx.is_subset => return Transition::Unchanged,
        ValueKind::Empty => return Transition::Fail(RError::Replacement0),
        ValueKind::NonVector if ctx.is_subset => {
            return Transition::Fail(RError::subassign_type_fix(ctx.value_type, "NULL"))
        }
        _ => {}
    }
    match ctx.position {
        PositionKind::Missing | PositionKind::Null | PositionKind::Empty if ctx.is_subset => Transition::Unchanged,
        PositionKind::Missing | PositionKind::Null | PositionKind::Empty => {
            Transition::Fail(value_size_error(ctx.value.len(), RError::SelectLess1))
        }
        PositionKind::Scalar(ScalarPosition::Negative(_)) => Transition::Fail(RError::SelectMore1),
        PositionKind::Scalar(ScalarPosition::Zero) if ctx.is_subset => Transition::Unchanged,
        PositionKind::Scalar(ScalarPosition::Zero) => Transition::Fail(RError::SelectLess1),
        PositionKind::Scalar(ScalarPosition::Na) if !ctx.is_subset => Transition::Fail(RError::SubscriptBoundsSub),
        PositionKind::Vector { .. } | PositionKind::Names(_) if !ctx.is_subset => {
            Transition::Fail(RError::SelectMore1)
        }
        PositionKind::Invalid(name) => Transition::Fail(RError::invalid_subscript_type(name)),
        _ => Transition::CreateFromNull,
    }
}

// ============================================================================
// NULL replacement
// ============================================================================

fn null_value(ctx: &UpdateContext) -> Transition {
    use PositionKind as P;
    use ScalarPosition as S;
    if ctx.is_list() {
        if ctx.is_subset {
            return match ctx.position {
                P::Null | P::Empty | P::Scalar(S::Zero) | P::Scalar(S::Na) => Transition::Unchanged,
                P::Invalid(name) => Transition::Fail(RError::invalid_subscript_type(name)),
                _ => Transition::DeleteElements,
            };
        }
        return match ctx.position {
            P::Missing | P::Empty => Transition::Fail(RError::SelectLess1),
            P::Null if ctx.vector_len > 1 => Transition::Fail(RError::SelectMore1),
            P::Null => Transition::Fail(RError::SelectLess1),
            P::Scalar(S::Zero) => Transition::Fail(RError::SelectLess1),
            P::Scalar(S::Na) => Transition::Unchanged,
            P::Scalar(S::Positive(_)) | P::Scalar(S::Name) if ctx.vector_len == 0 => Transition::Unchanged,
            P::Scalar(_) => Transition::DeleteElement,
            P::Vector { .. } | P::Names(_) => Transition::Recurse,
            _ => Transition::Fail(RError::SelectMore1),
        };
    }
    if ctx.is_subset {
        return match ctx.position {
            P::Null | P::Empty | P::Scalar(S::Zero) => Transition::Unchanged,
            _ => Transition::Fail(RError::Replacement0),
        };
    }
    match ctx.position {
        P::Scalar(_) => Transition::Fail(RError::MoreSuppliedReplace),
        P::Vector { len, first_zero } => Transition::Fail(path_select_error(len, first_zero)),
        _ => Transition::Fail(RError::Replacement0),
    }
}

// ============================================================================
// x[i] <- v
// ============================================================================

fn subset(ctx: &UpdateContext) -> Transition {
    use PositionKind as P;
    use ScalarPosition as S;
    if ctx.value == ValueKind::Empty {
        return if ctx.selects_nothing {
            Transition::Unchanged
        } else {
            Transition::Fail(RError::Replacement0)
        };
    }
    match ctx.position {
        P::Null | P::Empty | P::Scalar(S::Zero) => Transition::Unchanged,
        P::Scalar(S::Na) if ctx.value == ValueKind::Single => Transition::Unchanged,
        P::Scalar(S::Na) => Transition::Fail(RError::NaSubscripted),
        P::Invalid(name) => Transition::Fail(RError::invalid_subscript_type(name)),
        _ => Transition::WriteElements,
    }
}

// ============================================================================
// x[[i]] <- v
// ============================================================================

/// A numeric path into an atomic vector: `c(0, i)` selects too little, anything else too much.
fn path_select_error(len: usize, first_zero: bool) -> RError {
    if len == 2 && first_zero {
        RError::SelectLess1
    } else {
        RError::SelectMore1
    }
}

fn subscript_atomic(ctx: &UpdateContext) -> Transition {
    use PositionKind as P;
    use ScalarPosition as S;
    let value_len = ctx.value.len();
    match ctx.position {
        P::Missing | P::Null | P::Empty => Transition::Fail(value_size_error(value_len, RError::SelectLess1)),
        P::Vector { .. } if ctx.rec_level > 0 => {
            Transition::Fail(RError::RecursiveIndexingFailed(ctx.rec_level + 1))
        }
        P::Vector { len, first_zero } => Transition::Fail(path_select_error(len, first_zero)),
        P::Names(_) | P::Mask => Transition::Fail(value_size_error(value_len, RError::SelectMore1)),
        P::Scalar(_) if ctx.value == ValueKind::Empty => Transition::Fail(RError::Replacement0),
        P::Scalar(_) if ctx.value == ValueKind::Multi => Transition::Fail(RError::MoreSuppliedReplace),
        P::Scalar(S::Zero) => Transition::Fail(RError::SelectLess1),
        P::Scalar(S::Na) if ctx.vector_len > 1 => Transition::Fail(RError::SelectMore1),
        P::Scalar(S::Na) => Transition::Fail(RError::SelectLess1),
        P::Scalar(S::Negative(p)) if p > ctx.vector_len && ctx.vector_len == 1 => {
            Transition::Fail(RError::SelectLess1)
        }
        P::Scalar(S::Negative(_)) => Transition::Fail(RError::SelectMore1),
        P::Scalar(S::Positive(_)) | P::Scalar(S::Name) => Transition::WriteElements,
        P::Invalid(name) => Transition::Fail(RError::invalid_subscript_type(name)),
        _ => Transition::Fail(RError::SelectMore1),
    }
}

fn subscript_list(ctx: &UpdateContext) -> Transition {
    use PositionKind as P;
    use ScalarPosition as S;
    match ctx.position {
        P::Missing | P::Empty => Transition::Fail(value_size_error(ctx.value.len(), RError::SelectLess1)),
        P::Null => Transition::Fail(RError::SelectMore1),
        P::Vector { .. } | P::Names(_) => Transition::Recurse,
        P::Scalar(S::Zero) => Transition::Fail(RError::SelectLess1),
        P::Scalar(S::Na) if ctx.rec_level > 0 => Transition::Fail(RError::SelectLess1),
        P::Scalar(S::Na) => Transition::Fail(RError::SelectMore1),
        P::Scalar(_) => Transition::StoreElement,
        P::Invalid(name) => Transition::Fail(RError::invalid_subscript_type(name)),
        _ => Transition::Fail(RError::SelectMore1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::INT_NA;

    fn ctx(is_subset: bool, vector: RValue, value: RValue, position: RValue) -> UpdateContext {
        UpdateContext::new(is_subset, &vector, &value, &Positions::Single(position), 0)
    }

    fn transition(is_subset: bool, vector: RValue, value: RValue, position: RValue) -> Transition {
        select(&ctx(is_subset, vector, value, position))
    }

    #[test]
    fn test_position_kinds() {
        let kind = |p: RValue, subset| PositionKind::of(&Positions::Single(p), subset);
        assert_eq!(kind(RValue::Int(0), true), PositionKind::Scalar(ScalarPosition::Zero));
        assert_eq!(kind(RValue::Int(INT_NA), true), PositionKind::Scalar(ScalarPosition::Na));
        assert_eq!(kind(RValue::Double(-2.0), true), PositionKind::Scalar(ScalarPosition::Negative(2)));
        assert_eq!(kind(RValue::ints(vec![0, 1]), false), PositionKind::Vector { len: 2, first_zero: true });
        assert_eq!(kind(RValue::Logical(RLogical::True), true), PositionKind::Mask);
        assert_eq!(
            kind(RValue::Logical(RLogical::True), false),
            PositionKind::Scalar(ScalarPosition::Positive(1))
        );
        assert_eq!(kind(RValue::strings(&["a", "b"]), true), PositionKind::Names(2));
        assert_eq!(kind(RValue::list(vec![]), true), PositionKind::List(0));
        assert_eq!(
            PositionKind::of(&Positions::dims(vec![RValue::Int(1)]), true),
            PositionKind::Scalar(ScalarPosition::Positive(1))
        );
    }

    #[test]
    fn test_unsubsettable_receivers() {
        assert_eq!(
            transition(true, RValue::function("f"), RValue::Int(1), RValue::Int(1)),
            Transition::Fail(RError::ObjectNotSubsettable("closure".into()))
        );
    }

    #[test]
    fn test_subset_na_position() {
        let x = RValue::ints(vec![1, 2, 3]);
        assert_eq!(transition(true, x.clone(), RValue::Int(9), RValue::Int(INT_NA)), Transition::Unchanged);
        assert_eq!(
            transition(true, x, RValue::ints(vec![1, 2]), RValue::Int(INT_NA)),
            Transition::Fail(RError::NaSubscripted)
        );
    }

    #[test]
    fn test_empty_replacement_guard() {
        let x = RValue::ints(vec![1, 2, 3]);
        let empty = RValue::ints(vec![]);
        assert_eq!(transition(true, x.clone(), empty.clone(), RValue::ints(vec![])), Transition::Unchanged);
        assert_eq!(
            transition(true, x.clone(), empty.clone(), RValue::Int(1)),
            Transition::Fail(RError::Replacement0)
        );
        assert_eq!(
            transition(false, x, empty, RValue::Int(1)),
            Transition::Fail(RError::Replacement0)
        );
    }

    #[test]
    fn test_subscript_atomic_shape_errors() {
        let x = RValue::ints(vec![1, 2, 3]);
        assert_eq!(
            transition(false, x.clone(), RValue::Int(1), RValue::ints(vec![1, 2])),
            Transition::Fail(RError::SelectMore1)
        );
        assert_eq!(
            transition(false, x.clone(), RValue::ints(vec![1, 2]), RValue::ints(vec![1, 2])),
            Transition::Fail(RError::MoreSuppliedReplace)
        );
        assert_eq!(
            transition(false, x.clone(), RValue::Int(1), RValue::Int(0)),
            Transition::Fail(RError::SelectLess1)
        );
        assert_eq!(
            transition(false, x.clone(), RValue::ints(vec![1, 2]), RValue::Int(1)),
            Transition::Fail(RError::MoreSuppliedReplace)
        );
        assert_eq!(transition(false, x, RValue::Int(1), RValue::Int(5)), Transition::WriteElements);
    }

    #[test]
    fn test_list_transitions() {
        let l = RValue::list(vec![RValue::Int(1), RValue::Int(2)]);
        assert_eq!(transition(false, l.clone(), RValue::Null, RValue::Int(1)), Transition::DeleteElement);
        assert_eq!(transition(true, l.clone(), RValue::Null, RValue::Int(1)), Transition::DeleteElements);
        assert_eq!(transition(false, l.clone(), RValue::Int(5), RValue::Int(3)), Transition::StoreElement);
        assert_eq!(transition(false, l.clone(), RValue::Int(5), RValue::ints(vec![1, 1])), Transition::Recurse);
        assert_eq!(
            transition(false, l.clone(), RValue::function("f"), RValue::Int(1)),
            Transition::StoreElement
        );
        assert_eq!(
            transition(true, l, RValue::function("f"), RValue::Int(1)),
            Transition::Fail(RError::subassign_type_fix("closure", "list"))
        );
    }

    #[test]
    fn test_null_receiver() {
        assert_eq!(transition(true, RValue::Null, RValue::Int(1), RValue::Int(3)), Transition::CreateFromNull);
        assert_eq!(transition(true, RValue::Null, RValue::Null, RValue::Int(3)), Transition::Unchanged);
        assert_eq!(
            transition(true, RValue::Null, RValue::Int(1), RValue::Int(-1)),
            Transition::Fail(RError::SelectMore1)
        );
        assert_eq!(
            transition(false, RValue::Null, RValue::Int(1), RValue::ints(vec![1, 2])),
            Transition::Fail(RError::SelectMore1)
        );
    }

    #[test]
    fn test_subscript_type_errors() {
        let x = RValue::ints(vec![1, 2]);
        assert_eq!(
            transition(true, x.clone(), RValue::Int(1), RValue::Raw(1)),
            Transition::Fail(RError::invalid_subscript_type("raw"))
        );
        assert_eq!(
            transition(false, x.clone(), RValue::ints(vec![1, 2]), RValue::Raw(1)),
            Transition::Fail(RError::MoreSuppliedReplace)
        );
        assert_eq!(
            transition(true, x, RValue::Int(1), RValue::list(vec![RValue::Int(1)])),
            Transition::Fail(RError::invalid_subscript_type("list"))
        );
    }

    #[test]
    fn test_empty_value_checked_before_dimensions() {
        let m = RValue::ints(vec![1, 2, 3, 4]);
        let positions = Positions::dims(vec![RValue::ints(vec![]), RValue::Int(1), RValue::Int(1)]);
        let c = UpdateContext::new(true, &m, &RValue::ints(vec![]), &positions, 0);
        assert_eq!(select(&c), Transition::Unchanged);
        let c = UpdateContext::new(true, &m, &RValue::Int(1), &positions, 0);
        assert_eq!(select(&c), Transition::Fail(RError::IncorrectSubscripts));
    }
}
