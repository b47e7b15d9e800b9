//! Typed R vectors with copy-on-write sharing.
//!
//! An [`RVector`] is a cheap handle (`Rc<RefCell<..>>`); cloning the handle aliases the
//! same storage the way several bindings can refer to one vector. Whether writing through
//! a handle is legal is decided by the vector's [`SharingState`], never by the handle count:
//!
//! - `Temporary`: freshly produced, not yet bound anywhere.
//! - `NonShared`: bound once, in-place mutation is allowed.
//! - `Shared`: bound more than once, must be copied before any write.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use super::error::{internal_error, RError, RResult};
use super::values::{identical_f64, RComplex, RLogical, RType, RValue, INT_NA};
use indexmap::IndexMap;
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingState {
    Temporary,
    NonShared,
    Shared,
}

/// Element types storable in a [`VectorData`] variant.
pub trait RElement: Clone + fmt::Debug {
    const TYPE: RType;
    /// Value used to pad grown vectors.
    fn na() -> Self;
    fn is_na(&self) -> bool;
}

impl RElement for i32 {
    const TYPE: RType = RType::Integer;
    fn na() -> Self {
        INT_NA
    }
    fn is_na(&self) -> bool {
        *self == INT_NA
    }
}

impl RElement for f64 {
    const TYPE: RType = RType::Double;
    fn na() -> Self {
        super::values::double_na()
    }
    fn is_na(&self) -> bool {
        self.is_nan()
    }
}

impl RElement for RLogical {
    const TYPE: RType = RType::Logical;
    fn na() -> Self {
        RLogical::Na
    }
    fn is_na(&self) -> bool {
        *self == RLogical::Na
    }
}

impl RElement for Option<String> {
    const TYPE: RType = RType::Character;
    fn na() -> Self {
        None
    }
    fn is_na(&self) -> bool {
        self.is_none()
    }
}

impl RElement for RComplex {
    const TYPE: RType = RType::Complex;
    fn na() -> Self {
        RComplex::na()
    }
    fn is_na(&self) -> bool {
        RComplex::is_na(self)
    }
}

// raw has no NA; grown raw vectors are zero padded
impl RElement for u8 {
    const TYPE: RType = RType::Raw;
    fn na() -> Self {
        0
    }
    fn is_na(&self) -> bool {
        false
    }
}

// lists are padded with NULL
impl RElement for RValue {
    const TYPE: RType = RType::List;
    fn na() -> Self {
        RValue::Null
    }
    fn is_na(&self) -> bool {
        false
    }
}

/// Backing storage, one variant per element type.
#[derive(Debug, Clone)]
pub enum VectorData {
    Int(Vec<i32>),
    Double(Vec<f64>),
    Logical(Vec<RLogical>),
    Str(Vec<Option<String>>),
    Complex(Vec<RComplex>),
    Raw(Vec<u8>),
    List(Vec<RValue>),
}

/// Runs `$body` with `$v` bound to the typed `Vec` of whichever variant `$data` holds.
macro_rules! with_elements {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            VectorData::Int($v) => $body,
            VectorData::Double($v) => $body,
            VectorData::Logical($v) => $body,
            VectorData::Str($v) => $body,
            VectorData::Complex($v) => $body,
            VectorData::Raw($v) => $body,
            VectorData::List($v) => $body,
        }
    };
}
pub(crate) use with_elements;

impl VectorData {
    /// Vector of `len` NA elements (NULL for lists, zero for raw).
    pub fn na_filled(ty: RType, len: usize) -> Self {
        match ty {
            RType::Integer | RType::Factor => VectorData::Int(vec![i32::na(); len]),
            RType::Double => VectorData::Double(vec![f64::na(); len]),
            RType::Logical => VectorData::Logical(vec![RLogical::Na; len]),
            RType::Character => VectorData::Str(vec![None; len]),
            RType::Complex => VectorData::Complex(vec![RComplex::na(); len]),
            RType::Raw => VectorData::Raw(vec![0; len]),
            _ => VectorData::List(vec![RValue::Null; len]),
        }
    }

    pub fn empty(ty: RType) -> Self {
        Self::na_filled(ty, 0)
    }

    pub fn len(&self) -> usize {
        with_elements!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> RType {
        match self {
            VectorData::Int(_) => RType::Integer,
            VectorData::Double(_) => RType::Double,
            VectorData::Logical(_) => RType::Logical,
            VectorData::Str(_) => RType::Character,
            VectorData::Complex(_) => RType::Complex,
            VectorData::Raw(_) => RType::Raw,
            VectorData::List(_) => RType::List,
        }
    }

    pub fn is_na_at(&self, index: usize) -> bool {
        with_elements!(self, v => v.get(index).map_or(false, |e| e.is_na()))
    }

    /// Pads to `len` with the element NA, or truncates.
    pub fn resize(&mut self, len: usize) {
        with_elements!(self, v => v.resize(len, RElement::na()))
    }

    /// Element `index` as a scalar value; list elements are returned as stored.
    pub fn get(&self, index: usize) -> Option<RValue> {
        Some(match self {
            VectorData::Int(v) => RValue::Int(*v.get(index)?),
            VectorData::Double(v) => RValue::Double(*v.get(index)?),
            VectorData::Logical(v) => RValue::Logical(*v.get(index)?),
            VectorData::Str(v) => RValue::Str(v.get(index)?.clone()),
            VectorData::Complex(v) => RValue::Complex(*v.get(index)?),
            VectorData::Raw(v) => RValue::Raw(*v.get(index)?),
            VectorData::List(v) => v.get(index)?.clone(),
        })
    }

    /// Copies element `from` of `source` into slot `index`. Both sides hold the same
    /// element type and `index` is within bounds.
    pub fn assign(&mut self, index: usize, source: &VectorData, from: usize) {
        match (self, source) {
            (VectorData::Int(d), VectorData::Int(s)) => d[index] = s[from],
            (VectorData::Double(d), VectorData::Double(s)) => d[index] = s[from],
            (VectorData::Logical(d), VectorData::Logical(s)) => d[index] = s[from],
            (VectorData::Str(d), VectorData::Str(s)) => d[index] = s[from].clone(),
            (VectorData::Complex(d), VectorData::Complex(s)) => d[index] = s[from],
            (VectorData::Raw(d), VectorData::Raw(s)) => d[index] = s[from],
            (VectorData::List(d), VectorData::List(s)) => d[index] = s[from].clone(),
            (d, s) => internal_error(format!(
                "assigning {} elements into {} storage",
                s.element_type(),
                d.element_type()
            )),
        }
    }

    /// Stores `value` as list element `index`.
    pub fn store(&mut self, index: usize, value: RValue) {
        match self {
            VectorData::List(items) => items[index] = value,
            other => internal_error(format!("storing a value into {} storage", other.element_type())),
        }
    }

    fn identical(&self, other: &VectorData) -> bool {
        match (self, other) {
            (VectorData::Int(a), VectorData::Int(b)) => a == b,
            (VectorData::Double(a), VectorData::Double(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| identical_f64(*x, *y))
            }
            (VectorData::Logical(a), VectorData::Logical(b)) => a == b,
            (VectorData::Str(a), VectorData::Str(b)) => a == b,
            (VectorData::Complex(a), VectorData::Complex(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            (VectorData::Raw(a), VectorData::Raw(b)) => a == b,
            (VectorData::List(a), VectorData::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorBody {
    pub data: VectorData,
    pub names: Option<Vec<Option<String>>>,
    pub dims: Option<Vec<usize>>,
    /// Regular attributes (everything but names and dim), e.g. `class` and `levels`.
    pub attributes: IndexMap<String, RValue>,
    pub sharing: SharingState,
}

#[derive(Clone)]
pub struct RVector(Rc<RefCell<VectorBody>>);

impl RVector {
    pub fn from_data(data: VectorData) -> Self {
        RVector(Rc::new(RefCell::new(VectorBody {
            data,
            names: None,
            dims: None,
            attributes: IndexMap::new(),
            sharing: SharingState::Temporary,
        })))
    }

    pub fn na_filled(ty: RType, len: usize) -> Self {
        Self::from_data(VectorData::na_filled(ty, len))
    }

    /// Integer matrix/array helper: `dims` must multiply out to the data length.
    pub fn with_dims(data: VectorData, dims: Vec<usize>) -> RResult<Self> {
        let v = Self::from_data(data);
        v.set_dims(Some(dims))?;
        Ok(v)
    }

    pub fn body(&self) -> Ref<'_, VectorBody> {
        self.0.borrow()
    }

    /// Mutable access to the storage. Callers must have checked [`RVector::is_shared`].
    pub fn body_mut(&self) -> RefMut<'_, VectorBody> {
        self.0.borrow_mut()
    }

    pub fn data(&self) -> Ref<'_, VectorData> {
        Ref::map(self.0.borrow(), |b| &b.data)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> RType {
        self.0.borrow().data.element_type()
    }

    pub fn is_list(&self) -> bool {
        self.element_type() == RType::List
    }

    pub fn get(&self, index: usize) -> Option<RValue> {
        self.0.borrow().data.get(index)
    }

    pub fn ptr_eq(&self, other: &RVector) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ---- sharing protocol ----

    pub fn sharing(&self) -> SharingState {
        self.0.borrow().sharing
    }

    pub fn is_shared(&self) -> bool {
        self.sharing() == SharingState::Shared
    }

    pub fn is_temporary(&self) -> bool {
        self.sharing() == SharingState::Temporary
    }

    pub fn mark_non_temporary(&self) {
        let mut body = self.0.borrow_mut();
        if body.sharing == SharingState::Temporary {
            body.sharing = SharingState::NonShared;
        }
    }

    pub fn make_shared(&self) {
        self.0.borrow_mut().sharing = SharingState::Shared;
    }

    /// Shallow copy: new storage, same attributes, temporary state.
    pub fn copy(&self) -> RVector {
        let mut body = self.0.borrow().clone();
        body.sharing = SharingState::Temporary;
        RVector(Rc::new(RefCell::new(body)))
    }

    /// Copy that also copies nested vectors of a list.
    pub fn deep_copy(&self) -> RVector {
        let copy = self.copy();
        if let VectorData::List(items) = &mut copy.body_mut().data {
            for item in items.iter_mut() {
                if let RValue::Vector(inner) = item {
                    *item = RValue::Vector(inner.deep_copy());
                }
            }
        }
        copy
    }

    // ---- attributes ----

    pub fn names(&self) -> Option<Vec<Option<String>>> {
        self.0.borrow().names.clone()
    }

    pub fn set_names(&self, names: Option<Vec<Option<String>>>) {
        self.0.borrow_mut().names = names;
    }

    pub fn dims(&self) -> Option<Vec<usize>> {
        self.0.borrow().dims.clone()
    }

    pub fn set_dims(&self, dims: Option<Vec<usize>>) -> RResult<()> {
        if let Some(d) = &dims {
            let product: usize = d.iter().product();
            let len = self.len();
            if product != len {
                return Err(RError::DimsDontMatchLength { product, length: len });
            }
        }
        self.0.borrow_mut().dims = dims;
        Ok(())
    }

    pub fn attr(&self, name: &str) -> Option<RValue> {
        self.0.borrow().attributes.get(name).cloned()
    }

    pub fn set_attr(&self, name: &str, value: RValue) {
        self.0.borrow_mut().attributes.insert(name.to_string(), value);
    }

    fn has_class(&self, class: &str) -> bool {
        match self.attr("class") {
            Some(RValue::Vector(v)) => match &*v.data() {
                VectorData::Str(classes) => classes.iter().any(|c| c.as_deref() == Some(class)),
                _ => false,
            },
            Some(RValue::Str(Some(c))) => c == class,
            _ => false,
        }
    }

    pub fn is_factor(&self) -> bool {
        self.element_type() == RType::Integer && self.has_class("factor")
    }

    pub fn is_data_frame(&self) -> bool {
        self.is_list() && self.has_class("data.frame")
    }

    pub fn identical(&self, other: &RVector) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (self.body(), other.body());
        a.data.identical(&b.data)
            && a.names == b.names
            && a.dims == b.dims
            && a.attributes.len() == b.attributes.len()
            && a
                .attributes
                .iter()
                .zip(&b.attributes)
                .all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
    }
}

impl PartialEq for RVector {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl fmt::Debug for RVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body();
        f.debug_struct("RVector")
            .field("data", &body.data)
            .field("names", &body.names)
            .field("dims", &body.dims)
            .field("sharing", &body.sharing)
            .finish()
    }
}

impl fmt::Display for RVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        let items = (0..data.len())
            .filter_map(|i| data.get(i))
            .map(|v| v.to_string())
            .join(", ");
        match &*data {
            VectorData::List(_) => write!(f, "list({})", items),
            _ => write!(f, "c({})", items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_is_temporary_and_detached() {
        let v = RVector::from_data(VectorData::Int(vec![1, 2, 3]));
        v.make_shared();
        let c = v.copy();
        assert!(c.is_temporary());
        assert!(!c.ptr_eq(&v));
        c.body_mut().data = VectorData::Int(vec![9]);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_sharing_transitions() {
        let v = RVector::from_data(VectorData::Double(vec![1.0]));
        assert_eq!(v.sharing(), SharingState::Temporary);
        v.mark_non_temporary();
        assert_eq!(v.sharing(), SharingState::NonShared);
        v.make_shared();
        v.mark_non_temporary();
        assert_eq!(v.sharing(), SharingState::Shared);
    }

    #[test]
    fn test_dims_must_match_length() {
        let v = RVector::from_data(VectorData::Int(vec![1, 2, 3, 4]));
        assert!(v.set_dims(Some(vec![2, 2])).is_ok());
        assert_eq!(
            v.set_dims(Some(vec![3, 2])),
            Err(RError::DimsDontMatchLength { product: 6, length: 4 })
        );
    }

    #[test]
    fn test_resize_pads_with_type_na() {
        let mut d = VectorData::Str(vec![Some("a".into())]);
        d.resize(3);
        assert!(d.is_na_at(1) && d.is_na_at(2));
        let mut l = VectorData::List(vec![]);
        l.resize(2);
        assert_eq!(l.get(1), Some(RValue::Null));
    }

    #[test]
    fn test_assign_copies_one_element() {
        let mut d = VectorData::Double(vec![1.0, 2.0, 3.0]);
        d.assign(2, &VectorData::Double(vec![9.0, 8.0]), 1);
        assert_eq!(d.get(2), Some(RValue::Double(8.0)));
        let mut l = VectorData::List(vec![RValue::Null]);
        l.store(0, RValue::Int(4));
        assert_eq!(l.get(0), Some(RValue::Int(4)));
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn test_assign_rejects_mixed_storage() {
        let mut d = VectorData::Int(vec![1]);
        d.assign(0, &VectorData::Double(vec![1.0]), 0);
    }

    #[test]
    fn test_deep_copy_detaches_nested_vectors() {
        let inner = RVector::from_data(VectorData::Int(vec![1]));
        let outer = RVector::from_data(VectorData::List(vec![RValue::Vector(inner.clone())]));
        let copy = outer.deep_copy();
        match copy.get(0) {
            Some(RValue::Vector(v)) => assert!(!v.ptr_eq(&inner)),
            other => panic!("expected nested vector, got {:?}", other),
        }
    }
}
