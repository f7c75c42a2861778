use super::*;
use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

/// Selection along one axis of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceIndex {
    /// Pins the axis to one position and removes it from the view
    Single(isize),
    /// Range with optional start, end, and step. A range without bounds takes the whole axis.
    Range {
        start: Option<isize>,
        end: Option<isize>,
        step: isize,
    },
}

impl SliceIndex {
    /// The whole axis.
    pub const FULL: SliceIndex = SliceIndex::Range {
        start: None,
        end: None,
        step: 1,
    };

    /// Range with a step of 1
    pub fn range(start: Option<isize>, end: Option<isize>) -> Self {
        Self::Range {
            start,
            end,
            step: 1,
        }
    }

    /// Create a new range slice with custom step. Non-positive steps are rejected when slicing.
    pub fn range_with_step(start: Option<isize>, end: Option<isize>, step: isize) -> Self {
        Self::Range { start, end, step }
    }

    /// Builds an index from its components: none for the whole axis, one for a single index,
    /// two for `[start, stop)` and three for `[start, stop)` with a step.
    pub fn from_components(components: &[isize]) -> Result<Self> {
        match *components {
            [] => Ok(Self::FULL),
            [index] => Ok(Self::Single(index)),
            [start, end] => Ok(Self::range(Some(start), Some(end))),
            [start, end, step] => Ok(Self::range_with_step(Some(start), Some(end), step)),
            _ => Err(TensorError::InvalidSliceSpecifier(format!(
                "expected 0 to 3 components, got {components:?}"
            ))),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, SliceIndex::Single(_))
    }

    /// Resolve slice to concrete indices given dimension size. Negative values must have been
    /// converted already.
    fn resolve(&self, dim_size: usize) -> Result<SliceResult> {
        match *self {
            SliceIndex::Single(idx) => {
                if idx < 0 || idx as usize >= dim_size {
                    return Err(TensorError::IndexOutOfBounds(format!(
                        "Index {idx} out of bounds for dimension of size {dim_size}"
                    )));
                }
                Ok(SliceResult::Single(idx as usize))
            }
            SliceIndex::Range { start, end, step } => {
                if step <= 0 {
                    return Err(TensorError::InvalidSliceSpecifier(format!(
                        "step must be positive: {step}"
                    )));
                }

                let clamp = |value: isize| value.clamp(0, dim_size as isize) as usize;
                let start = start.map(clamp).unwrap_or(0);
                let end = end.map(clamp).unwrap_or(dim_size);
                let step = step as usize;
                let size = new_shape_from_slice(&[start], &[end], &[step])[0];

                Ok(SliceResult::Range { start, size, step })
            }
        }
    }
}

/// A slice index resolved against the extent of its axis
#[derive(Debug, Clone, PartialEq)]
enum SliceResult {
    Single(usize),
    Range {
        start: usize,
        size: usize,
        step: usize,
    },
}

/// Exclusive end of an inclusive range. `..=-1` reaches the end of the axis.
fn inclusive_end(end: isize) -> Option<isize> {
    if end == -1 { None } else { Some(end + 1) }
}

macro_rules! impl_slice_index_from {
    ($($int:ty),+) => {
        $(
            impl From<$int> for SliceIndex {
                fn from(index: $int) -> Self {
                    SliceIndex::Single(index as isize)
                }
            }

            impl From<Range<$int>> for SliceIndex {
                fn from(range: Range<$int>) -> Self {
                    SliceIndex::range(Some(range.start as isize), Some(range.end as isize))
                }
            }

            impl From<RangeFrom<$int>> for SliceIndex {
                fn from(range: RangeFrom<$int>) -> Self {
                    SliceIndex::range(Some(range.start as isize), None)
                }
            }

            impl From<RangeTo<$int>> for SliceIndex {
                fn from(range: RangeTo<$int>) -> Self {
                    SliceIndex::range(None, Some(range.end as isize))
                }
            }

            impl From<RangeInclusive<$int>> for SliceIndex {
                fn from(range: RangeInclusive<$int>) -> Self {
                    let (start, end) = range.into_inner();
                    SliceIndex::range(Some(start as isize), inclusive_end(end as isize))
                }
            }

            impl From<RangeToInclusive<$int>> for SliceIndex {
                fn from(range: RangeToInclusive<$int>) -> Self {
                    SliceIndex::range(None, inclusive_end(range.end as isize))
                }
            }
        )+
    };
}

impl_slice_index_from!(usize, isize, i32, i64, u32, u64);

impl From<RangeFull> for SliceIndex {
    fn from(_: RangeFull) -> Self {
        SliceIndex::FULL
    }
}

/// `None` takes the whole axis.
impl From<Option<isize>> for SliceIndex {
    fn from(index: Option<isize>) -> Self {
        index.map_or(SliceIndex::FULL, SliceIndex::Single)
    }
}

/// Builds a `&[SliceIndex]` from integers, Rust ranges or ready-made slice indices.
///
/// ```
/// use ndview::{SliceIndex, s};
///
/// let indices = s![1, 2..4, ..];
/// assert_eq!(indices[0], SliceIndex::Single(1));
/// assert_eq!(indices[2], SliceIndex::FULL);
/// ```
#[macro_export]
macro_rules! s {
    () => {
        &[] as &[$crate::SliceIndex]
    };
    ($($slice:expr),* $(,)?) => {
        &[$($crate::SliceIndex::from($slice)),*]
    };
}

/// Adds a step to a range: `step!(1.., 2)` visits every other position from 1.
#[macro_export]
macro_rules! step {
    ($range:expr, $step:expr) => {{
        match $crate::SliceIndex::from($range) {
            $crate::SliceIndex::Range { start, end, .. } => {
                $crate::SliceIndex::range_with_step(start, end, $step)
            }
            _ => panic!("step! expects a range, not a single index"),
        }
    }};
}

impl Tensor {
    /// Returns a view selecting `indices` per leading axis; trailing axes are kept whole.
    ///
    /// Single indices pin their axis and remove it from the result. The view shares the buffer
    /// of `self`: its strides are the source strides times the step, and the start of each range
    /// moves the initial offset.
    pub fn slice(&self, indices: &[SliceIndex]) -> Result<Tensor> {
        let indices = convert_negative_indices(indices, &self.shape)?;

        let mut shape = Dims::new();
        let mut strides = Dims::new();
        let mut dstrides = Dims::new();
        let mut offsets = Dims::new();
        let mut initial_offset = self.initial_offset;

        for axis in 0..self.rank() {
            let index = indices.get(axis).copied().unwrap_or(SliceIndex::FULL);
            let (start, extent) = match index.resolve(self.shape[axis])? {
                SliceResult::Single(start) => (start, None),
                SliceResult::Range { start, size, step } => (start, Some((size, step))),
            };

            let stride = self.strides[axis];
            let dstride = self.dstrides[axis];
            initial_offset += start * stride;

            if let Some((size, step)) = extent {
                shape.push(size);
                strides.push(stride * step);
                dstrides.push(dstride);
                offsets.push(self.offsets[axis] + start * (stride / dstride));
            }
        }

        tracing::trace!(?shape, ?strides, initial_offset, "slice");

        Ok(self.derive(shape, strides, dstrides, offsets, initial_offset))
    }
}
