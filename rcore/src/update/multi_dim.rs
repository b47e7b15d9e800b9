//! Matrix and array assignment: x[i, j, ...] <- v
//! Per-dimension subscripts are resolved against the extents first; only then is anything written

use tracing::trace;

use super::positions::resolve_dimension;
use crate::runtime::{RError, RResult, RValue, RVector, VectorData};

/// Error for a replacement of `value_len` elements where exactly one slot is addressed.
/// `size_one` is what a single-element replacement gets.
pub fn value_size_error(value_len: usize, size_one: RError) -> RError {
    match value_len {
        0 => RError::Replacement0,
        1 => size_one,
        _ => RError::MoreSuppliedReplace,
    }
}

/// The subscript count must equal the receiver's dimension count.
pub fn check_dimensions(count: usize, dims: Option<usize>, is_subset: bool) -> RResult<()> {
    if dims == Some(count) {
        return Ok(());
    }
    Err(match (count, is_subset) {
        (2, true) => RError::IncorrectSubscriptsMatrix,
        (_, true) => RError::IncorrectSubscripts,
        (_, false) => RError::ImproperSubscript,
    })
}

pub struct SetMultiDimData {
    is_subset: bool,
}

impl SetMultiDimData {
    pub fn new(is_subset: bool) -> Self {
        Self { is_subset }
    }

    /// Writes `source` into the cells of `target` selected by `positions`, recycling the
    /// source in column-major order. `target` must be writable and carry dimensions.
    pub fn write(&self, target: &RVector, source: &VectorData, positions: &[RValue]) -> RResult<()> {
        let dims = target.dims().ok_or(RError::IncorrectSubscripts)?;
        check_dimensions(positions.len(), Some(dims.len()), self.is_subset)?;
        let value_len = source.len();

        let mut selected = Vec::with_capacity(dims.len());
        for (position, extent) in positions.iter().zip(&dims) {
            let slots = resolve_dimension(position, *extent)?;
            if !self.is_subset && slots.len() != 1 {
                let base = if slots.is_empty() {
                    RError::SelectLess1
                } else {
                    RError::SelectMore1
                };
                return Err(value_size_error(value_len, base));
            }
            selected.push(slots);
        }

        let replaced: usize = selected.iter().map(Vec::len).product();
        if replaced == 0 {
            return Ok(());
        }
        if value_len == 0 {
            return Err(RError::Replacement0);
        }
        if replaced % value_len != 0 {
            return Err(RError::NotMultipleReplacement);
        }
        if selected.iter().flatten().any(Option::is_none) {
            self.check_na(value_len, target.is_list())?;
        }
        trace!(cells = replaced, dims = ?dims, "multi-dimensional write");

        // acc[k]: distance between neighbouring cells along dimension k
        let mut acc = Vec::with_capacity(dims.len());
        let mut stride = 1;
        for extent in &dims {
            acc.push(stride);
            stride *= extent;
        }
        let mut body = target.body_mut();
        let mut from = 0;
        write_level(&mut body.data, source, &selected, &acc, dims.len(), 0, &mut from);
        Ok(())
    }

    /// NA subscripts are only tolerated as no-ops for a single-element `[<-` replacement.
    fn check_na(&self, value_len: usize, list_target: bool) -> RResult<()> {
        match (value_len, self.is_subset) {
            (1, true) => Ok(()),
            (1, false) => Err(RError::SubscriptBoundsSub),
            (_, true) => Err(RError::NaSubscripted),
            (_, false) if list_target => Err(RError::SubscriptBoundsSub),
            (_, false) => Err(RError::MoreSuppliedReplace),
        }
    }
}

/// Writes every cell below `level`, the outermost dimension being `dims_count`. `offset` is
/// the flat offset contributed by the dimensions already fixed; `from` counts source
/// elements consumed, NA cells included.
fn write_level(
    data: &mut VectorData,
    source: &VectorData,
    selected: &[Vec<Option<usize>>],
    acc: &[usize],
    level: usize,
    offset: usize,
    from: &mut usize,
) {
    let dim = level - 1;
    // the first dimension varies fastest, so outer levels hold the higher dimensions
    for slot in &selected[dim] {
        match slot {
            Some(s) if dim == 0 => data.assign(offset + s * acc[0], source, *from % source.len()),
            Some(s) => write_level(data, source, selected, acc, level - 1, offset + s * acc[dim], from),
            None if dim == 0 => {}
            None => {
                let skipped: usize = selected[..dim].iter().map(Vec::len).product();
                *from += skipped;
                continue;
            }
        }
        if dim == 0 {
            *from += 1;
        }
    }
}
