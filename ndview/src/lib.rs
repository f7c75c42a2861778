//! Library crate for ndview
//!
//! A dense buffer of homogeneous numbers exposed through any number of strided views. Slicing and
//! squeezing produce views that share the buffer; reshaping, transposing and casting copy.
//!
//! ```
//! use ndview::{Tensor, s};
//!
//! # fn main() -> ndview::Result<()> {
//! let base = Tensor::arange(16)?.reshape([4, 4])?;
//! let window = base.slice(s![0..2, 1..3])?;
//!
//! assert!(window.same_content(&Tensor::from_nested([[1, 2], [5, 6]])?));
//! assert!(window.shares_buffer(&base));
//! # Ok(())
//! # }
//! ```

use dim_vec::dims;
use std::cell::RefCell;
use std::rc::Rc;

mod broadcast;
mod buffer;
mod constructive;
mod display;
mod dtype;
mod error;
mod iterator;
#[cfg(feature = "serde")]
mod json;
mod math;
mod matmul;
mod misc;
mod shape;
mod slicing;
mod view;

#[cfg(test)]
mod property_tests;

pub use crate::broadcast::{Broadcast, BroadcastIter, Operand, broadcast};
pub use crate::buffer::{Buffer, Element};
pub use crate::constructive::{ArrayOptions, Nested};
pub use crate::dtype::DType;
pub use crate::error::TensorError;
pub use crate::iterator::{DataOrderIndices, DataOrderIter, IndexIter, OffsetIter, OuterIter, Region, Values};
pub use crate::matmul::{broadcast_matmul, matmul_2d};
pub use crate::math::dot;
pub use crate::shape::{
    ShapeSpec, calculate_broadcast_dimensions, checked_size, compute_shape, compute_size, convert_negative_indices,
    new_shape_from_axis, new_shape_from_slice, stride_from_shape,
};
pub use crate::slicing::SliceIndex;
pub use dim_vec::Dims;

pub type Result<T> = std::result::Result<T, error::TensorError>;

/// Represents a multi-dimensional view over a shared numeric buffer.
///
/// The element at logical index `idx` lives at buffer position
/// `initial_offset + Σ idx[i] * strides[i]`. Views derived by slicing keep pointing at the
/// buffer of their source, so writes through [`Tensor::set`] are visible to every view of it.
///
/// # Layout
/// Freshly allocated tensors are column-major: `strides[0] == 1` and every further stride is the
/// product of the preceding extents. Constructors that take a sequence of values
/// ([`Tensor::from_iterable`], [`Tensor::from_nested`], [`Tensor::arange`]) still assign values in
/// index order, last axis fastest, independently of that layout.
///
/// # Aliasing
/// Buffers are reference counted without locking, so a tensor is bound to the thread that created
/// it. Writers through aliasing views are not coordinated: the last write wins.
#[derive(Clone)]
pub struct Tensor {
    data: Rc<RefCell<Buffer>>,
    shape: Dims,
    strides: Dims,
    dstrides: Dims,
    offsets: Dims,
    initial_offset: usize,
    length: usize,
    dtype: DType,
    is_view: bool,
}

impl Tensor {
    /// Wraps a buffer laid out column-major for `shape`. The caller guarantees that the buffer
    /// holds exactly `compute_size(shape)` elements.
    pub(crate) fn from_buffer(buffer: Buffer, shape: Dims) -> Self {
        let strides = stride_from_shape(&shape);
        let rank = shape.len();

        Tensor {
            dtype: buffer.dtype(),
            length: compute_size(&shape),
            data: Rc::new(RefCell::new(buffer)),
            dstrides: strides.clone(),
            strides,
            offsets: dims![0; rank],
            shape,
            initial_offset: 0,
            is_view: false,
        }
    }

    /// New metadata over the same buffer.
    pub(crate) fn derive(
        &self,
        shape: Dims,
        strides: Dims,
        dstrides: Dims,
        offsets: Dims,
        initial_offset: usize,
    ) -> Self {
        Tensor {
            data: self.data.clone(),
            length: compute_size(&shape),
            shape,
            strides,
            dstrides,
            offsets,
            initial_offset,
            dtype: self.dtype,
            is_view: true,
        }
    }

    pub(crate) fn buffer(&self) -> &Rc<RefCell<Buffer>> {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Strides of the root buffer layout for each axis of this view.
    pub fn dstrides(&self) -> &[usize] {
        &self.dstrides
    }

    /// Starting coordinate of each axis in root buffer units.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Buffer position of the element at index `(0, ..., 0)`.
    pub fn initial_offset(&self) -> usize {
        self.initial_offset
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements addressed by this view.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// True when the buffer was inherited from another tensor rather than freshly allocated.
    pub fn is_view(&self) -> bool {
        self.is_view
    }

    /// True when both tensors read and write the same buffer.
    pub fn shares_buffer(&self, other: &Tensor) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}
