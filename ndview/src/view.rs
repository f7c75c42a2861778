use super::*;
use tracing::debug;

impl Tensor {
    /// Buffer position of a logical index. The index is not checked against the shape.
    pub fn compute_real_index(&self, index: &[usize]) -> usize {
        self.initial_offset + self.strides.dot(index)
    }

    // Buffer position of a full, possibly negative, index
    fn get_index(&self, indices: &[isize]) -> Result<usize> {
        if indices.len() < self.rank() {
            return Err(TensorError::InsufficientIndices {
                expected: self.rank(),
                actual: indices.len(),
            });
        }
        if indices.len() > self.rank() {
            return Err(TensorError::IndexOutOfBounds(format!(
                "{} indices for a tensor of rank {}",
                indices.len(),
                self.rank()
            )));
        }

        let mut linear_index = self.initial_offset;
        for (axis, &idx) in indices.iter().enumerate() {
            let extent = self.shape[axis];
            let resolved = if idx < 0 { idx + extent as isize } else { idx };
            if resolved < 0 || resolved as usize >= extent {
                return Err(TensorError::IndexOutOfBounds(format!(
                    "Index {idx} out of bounds for dimension {axis} with size {extent}"
                )));
            }
            linear_index += resolved as usize * self.strides[axis];
        }
        Ok(linear_index)
    }

    /// Element at a full index; negative positions count from the end of their axis.
    pub fn get(&self, indices: &[isize]) -> Result<f64> {
        let linear_index = self.get_index(indices)?;
        Ok(self.data.borrow().get(linear_index))
    }

    /// Writes `value` into the selected part of the buffer.
    ///
    /// With one single index per axis, `value` must be a scalar and one element is written.
    /// Otherwise `indices` select a view as in [`Tensor::slice`] and `value` is broadcast against
    /// its shape: aligned on the last axis, every extent of `value` must equal the view's or be 1.
    /// Nothing is written when validation fails.
    pub fn set(&self, value: impl Into<Operand>, indices: &[SliceIndex]) -> Result<()> {
        let value = value.into();

        let positions: Option<Vec<isize>> = indices
            .iter()
            .map(|index| match *index {
                SliceIndex::Single(position) => Some(position),
                SliceIndex::Range { .. } => None,
            })
            .collect();

        if let Some(positions) = positions.filter(|positions| positions.len() == self.rank()) {
            let scalar = match value {
                Operand::Scalar(scalar) => scalar,
                Operand::Tensor(tensor) => {
                    return Err(TensorError::NonScalarSingleSet(tensor.shape.to_vec()));
                }
            };
            let linear_index = self.get_index(&positions)?;
            self.data.borrow_mut().set(linear_index, scalar);
            return Ok(());
        }

        let target = self.slice(indices)?;
        let source = value.into_tensor();
        let strides = source.broadcast_strides(&target.shape)?;

        // read everything first: source and target may share the buffer
        let values: Vec<f64> = Values::new(
            &source,
            OffsetIter::over(&target.shape, strides, source.initial_offset),
        )
        .collect();

        let mut buffer = self.data.borrow_mut();
        for (offset, value) in target.offsets_iter().zip(values) {
            buffer.set(offset, value);
        }

        Ok(())
    }

    /// Copy of the elements under a new shape of the same size.
    pub fn reshape(&self, shape: impl Into<ShapeSpec>) -> Result<Tensor> {
        let shape = compute_shape(shape)?;
        let size = compute_size(&shape);

        if size != self.length {
            return Err(TensorError::ShapeSizeMismatch {
                shape: shape.to_vec(),
                expected: size,
                actual: self.length,
            });
        }

        debug!(from = ?self.shape, to = ?shape, "reshape copies into a fresh buffer");
        Ok(Tensor::from_logical(self.values(), shape, self.dtype))
    }

    /// One-dimensional copy of the elements in index order.
    pub fn flatten(&self) -> Tensor {
        Tensor::from_logical(self.values(), dims![self.length], self.dtype)
    }

    /// Copy of the elements in a fresh column-major buffer.
    pub fn copy(&self) -> Tensor {
        Tensor::from_logical(self.values(), self.shape.clone(), self.dtype)
    }

    /// Copy of the elements converted into `dtype`.
    pub fn cast(&self, dtype: DType) -> Tensor {
        debug!(from = %self.dtype, to = %dtype, "cast");
        Tensor::from_logical(self.values(), self.shape.clone(), dtype)
    }

    /// View without the axes of extent 1. Shares the buffer.
    pub fn squeeze(&self) -> Tensor {
        let keep: Vec<bool> = self.shape.iter().map(|&extent| extent != 1).collect();

        self.derive(
            self.shape.select(&keep),
            self.strides.select(&keep),
            self.dstrides.select(&keep),
            self.offsets.select(&keep),
            self.initial_offset,
        )
    }

    /// Copy with axis `k` of the result taken from axis `axes[k]` of `self`.
    pub fn permute(&self, axes: &[usize]) -> Result<Tensor> {
        let mut seen = vec![false; self.rank()];
        let valid = axes.len() == self.rank()
            && axes
                .iter()
                .all(|&axis| axis < self.rank() && !std::mem::replace(&mut seen[axis], true));

        if !valid {
            return Err(TensorError::ShapeMismatch(format!(
                "{axes:?} is not a permutation of the axes of shape {:?}",
                self.shape
            )));
        }

        Ok(self.permute_unchecked(axes))
    }

    /// Copy with the axis order reversed.
    pub fn transpose(&self) -> Tensor {
        let axes: Dims = (0..self.rank()).rev().collect();
        self.permute_unchecked(&axes)
    }

    /// Copy with two axes exchanged.
    pub fn swap_axes(&self, dim0: usize, dim1: usize) -> Result<Tensor> {
        if dim0 >= self.rank() || dim1 >= self.rank() {
            return Err(TensorError::IndexOutOfBounds(format!(
                "Invalid dimensions for transpose: {dim0} and {dim1}"
            )));
        }

        let mut axes: Dims = (0..self.rank()).collect();
        axes.swap(dim0, dim1);
        Ok(self.permute_unchecked(&axes))
    }

    fn permute_unchecked(&self, axes: &[usize]) -> Tensor {
        let shape: Dims = axes.iter().map(|&axis| self.shape[axis]).collect();
        debug!(from = ?self.shape, to = ?shape, "permute copies into a fresh buffer");

        let result = Tensor::from_buffer(Buffer::zeros(self.dtype, self.length), shape);
        {
            let source = self.data.borrow();
            let mut target = result.data.borrow_mut();
            let mut offsets = self.offsets_iter();

            for index in self.indices() {
                let Some(offset) = offsets.next() else { break };
                let permuted: usize = axes
                    .iter()
                    .zip(result.strides.iter())
                    .map(|(&axis, &stride)| index[axis] * stride)
                    .sum();
                target.set(permuted, source.get(offset));
            }
        }

        result
    }
}
