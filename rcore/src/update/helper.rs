//! Entry point of the update engine.
//!
//! [`UpdateArrayHelper::update`] evaluates `vector[positions] <- value` (or `[[<-`) and
//! returns the new value of `vector`. The result is either the receiver itself, updated in
//! place, or a fresh vector when the receiver was shared or had to be widened. A shared
//! receiver is never written to.

use tracing::debug;

use super::coerce_vector::{coerce_vector, value_data};
use super::dispatch::{select, Transition, UpdateContext};
use super::multi_dim::SetMultiDimData;
use super::positions::{
    logical_subscripts, path_position, position_in_recursion, recursion_path, resolve_flat, PathElement, Positions,
    Subscript,
};
use crate::config::EngineConfig;
use crate::runtime::{internal_error, RError, RResult, RType, RValue, RVector, SharingState, VectorData, Warnings};

#[derive(Debug, Clone)]
pub struct UpdateArrayHelper {
    is_subset: bool,
    max_recursion_depth: usize,
    max_vector_length: usize,
}

impl UpdateArrayHelper {
    /// `is_subset` selects `[<-`; otherwise the helper implements `[[<-`.
    pub fn new(is_subset: bool) -> Self {
        Self::with_config(is_subset, &EngineConfig::default())
    }

    pub fn with_config(is_subset: bool, config: &EngineConfig) -> Self {
        Self {
            is_subset,
            max_recursion_depth: config.max_recursion_depth,
            max_vector_length: config.max_vector_length,
        }
    }

    pub fn is_subset(&self) -> bool {
        self.is_subset
    }

    pub fn update(
        &self,
        vector: RValue,
        value: RValue,
        positions: &Positions,
        warnings: &mut Warnings,
    ) -> RResult<RValue> {
        self.update_at(vector, value, positions, warnings, 0)
    }

    fn update_at(
        &self,
        vector: RValue,
        value: RValue,
        positions: &Positions,
        warnings: &mut Warnings,
        rec_level: usize,
    ) -> RResult<RValue> {
        let value = match value {
            RValue::Missing => RValue::Null,
            v => v,
        };
        let positions = match positions.normalized() {
            // `[[` reads TRUE/FALSE as 1/0
            Positions::Single(p) if !self.is_subset && logical_subscripts(&p).is_some() => {
                Positions::Single(path_position(&recursion_path(&p)?))
            }
            other => other,
        };
        let ctx = UpdateContext::new(self.is_subset, &vector, &value, &positions, rec_level);
        let transition = select(&ctx);
        debug!(
            subset = self.is_subset,
            rec_level,
            vector = ctx.vector_type,
            value = ctx.value_type,
            ?transition,
            "array update"
        );

        match transition {
            Transition::Unchanged => Ok(vector),
            Transition::Fail(e) => Err(e),
            Transition::CreateFromNull => self.create_from_null(value, single(&positions), warnings),
            Transition::WriteElements => {
                let target = self.prepare_target(&vector, &value)?;
                self.write_elements(&target, &value, single(&positions), warnings)?;
                Ok(RValue::Vector(target))
            }
            Transition::StoreElement => {
                let target = self.prepare_target(&vector, &value)?;
                store_element(&target, value, single(&positions), rec_level, self.max_vector_length)?;
                Ok(RValue::Vector(target))
            }
            Transition::DeleteElement => delete_element(&vector, single(&positions), rec_level),
            Transition::DeleteElements => delete_elements(&vector, single(&positions), self.max_vector_length),
            Transition::Recurse => self.recurse(&vector, value, single(&positions), warnings, rec_level),
            Transition::WriteMultiDim => {
                let target = self.prepare_target(&vector, &value)?;
                let source = if !self.is_subset && target.is_list() {
                    VectorData::List(vec![stored_value(value)])
                } else {
                    value_data(&value, target.element_type())
                };
                let dims = match &positions {
                    Positions::Dims(ps) => ps,
                    Positions::Single(_) => internal_error("multi-dimensional write with a single subscript"),
                };
                SetMultiDimData::new(self.is_subset).write(&target, &source, dims)?;
                Ok(RValue::Vector(target))
            }
        }
    }

    /// The vector elements are written into: the receiver widened to the value's type,
    /// copied when shared.
    fn prepare_target(&self, vector: &RValue, value: &RValue) -> RResult<RVector> {
        let original = vector
            .to_vector()
            .unwrap_or_else(|| internal_error(format!("updating a {}", vector.type_name())));
        let target = coerce_vector(value, &original)?;
        if !target.ptr_eq(&original) {
            debug!(from = %original.element_type(), to = %target.element_type(), "update target widened");
        } else if target.is_shared() {
            debug!(len = target.len(), "copying shared vector before update");
            let copy = target.copy();
            copy.mark_non_temporary();
            return Ok(copy);
        }
        target.mark_non_temporary();
        Ok(target)
    }

    /// Flat element writes with recycling. The target grows to cover every selected slot.
    fn write_elements(
        &self,
        target: &RVector,
        value: &RValue,
        position: &RValue,
        warnings: &mut Warnings,
    ) -> RResult<()> {
        let resolved = resolve_flat(position, target.len(), target.names().as_deref())?;
        let source = value_data(value, target.element_type());
        let value_len = source.len();
        if resolved.has_na() && value_len > 1 {
            return Err(RError::NaSubscripted);
        }
        if resolved.slots.is_empty() {
            return Ok(());
        }
        if value_len == 0 {
            return Err(RError::Replacement0);
        }
        check_length(resolved.new_len, self.max_vector_length)?;

        {
            let mut body = target.body_mut();
            if resolved.new_len > body.data.len() {
                body.data.resize(resolved.new_len);
                body.dims = None;
                if body.names.is_none() && !resolved.new_names.is_empty() {
                    body.names = Some(Vec::new());
                }
                if let Some(names) = &mut body.names {
                    names.resize(resolved.new_len, Some(String::new()));
                }
            }
            for (i, slot) in resolved.slots.iter().enumerate() {
                if let Some(slot) = slot {
                    body.data.assign(*slot, &source, i % value_len);
                }
            }
            if let Some(names) = &mut body.names {
                for (slot, name) in &resolved.new_names {
                    names[*slot] = name.clone();
                }
            }
        }

        if resolved.slots.len() % value_len != 0 {
            warnings.warn(RError::NotMultipleReplacement)?;
        }
        Ok(())
    }

    /// `NULL[i] <- v` and `NULL[[i]] <- v`: the receiver starts as an empty vector of the
    /// value's type, or an empty list when `[[<-` needs to hold the value whole.
    fn create_from_null(&self, value: RValue, position: &RValue, warnings: &mut Warnings) -> RResult<RValue> {
        let element_type = value.to_vector().map(|v| v.element_type());
        match element_type {
            Some(ty) if self.is_subset || value.len() <= 1 => {
                let target = RVector::from_data(VectorData::empty(ty));
                target.mark_non_temporary();
                self.write_elements(&target, &value, position, warnings)?;
                Ok(RValue::Vector(target))
            }
            _ => {
                let target = RVector::from_data(VectorData::empty(RType::List));
                target.mark_non_temporary();
                store_element(&target, value, position, 0, self.max_vector_length)?;
                Ok(RValue::Vector(target))
            }
        }
    }

    /// `x[[c(i, j, ...)]] <- v`: descends one level and updates the selected element.
    fn recurse(
        &self,
        vector: &RValue,
        value: RValue,
        position: &RValue,
        warnings: &mut Warnings,
        rec_level: usize,
    ) -> RResult<RValue> {
        if rec_level >= self.max_recursion_depth {
            return Err(RError::SubscriptBoundsSub);
        }
        let list = match vector.as_vector() {
            Some(v) if v.is_list() => v,
            _ => internal_error(format!("recursive update of a {}", vector.type_name())),
        };
        let path = recursion_path(position)?;
        let (first, tail) = match path.split_first() {
            Some((first, tail)) if !tail.is_empty() => (first, tail),
            _ => internal_error("recursive update with a single-step path"),
        };
        let slot = match position_in_recursion(first, list.len(), list.names().as_deref(), rec_level, false)? {
            Subscript::Existing(slot) => slot,
            Subscript::Append(..) => internal_error("recursive step past the end of a list"),
        };
        if let [last] = tail {
            if last.is_na() {
                return Err(RError::SelectLess1);
            }
        }

        // the outermost level copies the whole nesting, inner levels write into that copy
        let target = if rec_level == 0 {
            let copy = list.deep_copy();
            copy.mark_non_temporary();
            copy
        } else {
            list.clone()
        };
        let inner = target.get(slot).unwrap_or(RValue::Null);
        let rest = match tail {
            [last] => Positions::Single(last.to_position()),
            _ => Positions::Single(path_position(tail)),
        };
        let updated = self.update_at(inner, value, &rest, warnings, rec_level + 1)?;
        target.body_mut().data.store(slot, updated);
        Ok(RValue::Vector(target))
    }
}

fn check_length(len: usize, max: usize) -> RResult<()> {
    if len > max {
        return Err(RError::VectorTooLarge(len));
    }
    Ok(())
}

fn single(positions: &Positions) -> &RValue {
    match positions {
        Positions::Single(p) => p,
        Positions::Dims(ps) => internal_error(format!("{} subscripts where one was expected", ps.len())),
    }
}

/// A value about to live inside a list: shared from now on, unless it already was, in which
/// case the list gets its own copy.
fn stored_value(value: RValue) -> RValue {
    if let RValue::Vector(v) = &value {
        match v.sharing() {
            SharingState::Shared => return RValue::Vector(v.copy()),
            SharingState::NonShared => v.make_shared(),
            SharingState::Temporary => v.mark_non_temporary(),
        }
    }
    value
}

fn single_step(position: &RValue) -> RResult<PathElement> {
    recursion_path(position)?
        .into_iter()
        .next()
        .ok_or(RError::SelectLess1)
}

/// `list[[i]] <- v` with `v` kept whole.
fn store_element(
    target: &RVector,
    value: RValue,
    position: &RValue,
    rec_level: usize,
    max_len: usize,
) -> RResult<()> {
    let element = single_step(position)?;
    let subscript = position_in_recursion(&element, target.len(), target.names().as_deref(), rec_level, true)?;
    if let Subscript::Append(slot, _) = &subscript {
        check_length(slot + 1, max_len)?;
    }
    let value = stored_value(value);
    let mut body = target.body_mut();
    let slot = match subscript {
        Subscript::Existing(slot) => slot,
        Subscript::Append(slot, name) => {
            body.data.resize(slot + 1);
            body.dims = None;
            if body.names.is_none() && name.is_some() {
                body.names = Some(Vec::new());
            }
            if let Some(names) = &mut body.names {
                names.resize(slot + 1, Some(String::new()));
                names[slot] = name;
            }
            slot
        }
    };
    body.data.store(slot, value);
    Ok(())
}

/// `list[[i]] <- NULL`
fn delete_element(vector: &RValue, position: &RValue, rec_level: usize) -> RResult<RValue> {
    let list = list_receiver(vector);
    let element = single_step(position)?;
    match position_in_recursion(&element, list.len(), list.names().as_deref(), rec_level, true)? {
        Subscript::Existing(slot) => {
            let mut deleted = vec![false; list.len()];
            deleted[slot] = true;
            Ok(RValue::Vector(remove_slots(list, &deleted)))
        }
        Subscript::Append(..) => Ok(vector.clone()),
    }
}

/// `list[i] <- NULL`. Selected slots past the end still count: the list is first padded
/// with `NULL` up to the highest one.
fn delete_elements(vector: &RValue, position: &RValue, max_len: usize) -> RResult<RValue> {
    let list = list_receiver(vector);
    let resolved = resolve_flat(position, list.len(), list.names().as_deref())?;
    check_length(resolved.new_len, max_len)?;
    let mut deleted = vec![false; resolved.new_len];
    for slot in resolved.slots.iter().flatten() {
        deleted[*slot] = true;
    }
    Ok(RValue::Vector(remove_slots(list, &deleted)))
}

fn list_receiver(vector: &RValue) -> &RVector {
    match vector.as_vector() {
        Some(v) if v.is_list() => v,
        _ => internal_error(format!("deleting elements of a {}", vector.type_name())),
    }
}

/// Fresh list holding the slots of `list` not marked in `deleted`. `deleted` may be longer
/// than the list; the extra slots read as `NULL` with an empty name.
fn remove_slots(list: &RVector, deleted: &[bool]) -> RVector {
    let body = list.body();
    let items = match &body.data {
        VectorData::List(items) => items,
        other => internal_error(format!("deleting elements of {} storage", other.element_type())),
    };
    let kept: Vec<usize> = (0..deleted.len()).filter(|i| !deleted[*i]).collect();
    let result = RVector::from_data(VectorData::List(
        kept.iter().map(|i| items.get(*i).cloned().unwrap_or(RValue::Null)).collect(),
    ));
    {
        let mut out = result.body_mut();
        out.names = body.names.as_ref().map(|names| {
            kept.iter()
                .map(|i| names.get(*i).cloned().unwrap_or_else(|| Some(String::new())))
                .collect()
        });
        out.attributes = body.attributes.clone();
    }
    debug!(removed = deleted.iter().filter(|d| **d).count(), len = kept.len(), "list elements deleted");
    result.mark_non_temporary();
    result
}
