use super::*;
use std::fmt;

/// Structural equality: same view metadata, same dtype and the same elements in index order.
///
/// Two views over different buffers compare equal when they would address identical layouts.
/// Use [`Tensor::same_content`] to compare only shapes and values.
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length
            && self.shape == other.shape
            && self.offsets == other.offsets
            && self.strides == other.strides
            && self.dstrides == other.dstrides
            && self.initial_offset == other.initial_offset
            && self.dtype == other.dtype
            && self.values().eq(other.values())
    }
}

impl Tensor {
    /// True when both tensors have the same shape and the same values in index order,
    /// whatever their layout and dtype.
    pub fn same_content(&self, other: &Tensor) -> bool {
        self.shape == other.shape && self.values().eq(other.values())
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype)
            .field("elements", &self.to_vec())
            .finish()
    }
}
