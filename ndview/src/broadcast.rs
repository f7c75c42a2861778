use super::*;
use tracing::debug;

/// A right-hand side of a binary operation: a plain number or a tensor.
#[derive(Clone, Debug)]
pub enum Operand {
    Scalar(f64),
    Tensor(Tensor),
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Operand::Scalar(value as f64)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Scalar(value as f64)
    }
}

impl From<Tensor> for Operand {
    fn from(tensor: Tensor) -> Self {
        Operand::Tensor(tensor)
    }
}

impl From<&Tensor> for Operand {
    fn from(tensor: &Tensor) -> Self {
        Operand::Tensor(tensor.clone())
    }
}

impl From<Vec<f64>> for Operand {
    fn from(values: Vec<f64>) -> Self {
        Operand::Tensor(Tensor::from(values))
    }
}

impl Operand {
    /// Tensor form of the operand. A scalar becomes a tensor of shape `[1]` in the smallest
    /// dtype holding it exactly.
    pub fn into_tensor(self) -> Tensor {
        match self {
            Operand::Scalar(value) => Tensor::from_buffer(Buffer::filled(DType::for_value(value), value, 1), dims![1]),
            Operand::Tensor(tensor) => tensor,
        }
    }
}

impl Tensor {
    /// Strides reading `self` as if it had `target` shape: axes of extent 1 and missing leading
    /// axes get stride 0.
    pub(crate) fn broadcast_strides(&self, target: &[usize]) -> Result<Dims> {
        let rank = self.rank();

        // leading axes beyond the target rank can only be dropped when they have extent 1
        let extra = rank.saturating_sub(target.len());
        if let Some(axis) = self.shape[..extra].iter().position(|&extent| extent != 1) {
            return Err(TensorError::UnbroadcastableShapes {
                axis,
                left: self.shape[axis],
                right: 1,
            });
        }

        let pad = target.len() + extra - rank;
        let mut strides = dims![0; target.len()];

        for (axis, &extent) in target.iter().enumerate().skip(pad) {
            let source_axis = axis + extra - pad;
            strides[axis] = match self.shape[source_axis] {
                source if source == extent => self.strides[source_axis],
                1 => 0,
                source => {
                    return Err(TensorError::UnbroadcastableShapes {
                        axis,
                        left: source,
                        right: extent,
                    });
                }
            };
        }

        Ok(strides)
    }
}

/// Two operands resolved against their common broadcast shape.
#[derive(Clone, Debug)]
pub struct Broadcast {
    left: Tensor,
    right: Tensor,
    left_strides: Dims,
    right_strides: Dims,
    shape: Dims,
    dtype: DType,
}

/// Pairs two operands following NumPy broadcasting rules.
///
/// Scalars become tensors of shape `[1]`, vectors become 1-D tensors. The result dtype is the join
/// of both operand dtypes.
pub fn broadcast(left: impl Into<Operand>, right: impl Into<Operand>) -> Result<Broadcast> {
    let left = left.into().into_tensor();
    let right = right.into().into_tensor();

    let shape = calculate_broadcast_dimensions(&left.shape, &right.shape)?;
    let dtype = left.dtype.join(right.dtype);
    debug!(left = ?left.shape, right = ?right.shape, result = ?shape, %dtype, "broadcast");

    Ok(Broadcast {
        left_strides: left.broadcast_strides(&shape)?,
        right_strides: right.broadcast_strides(&shape)?,
        left,
        right,
        shape,
        dtype,
    })
}

impl Broadcast {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// `(left, right, index)` for every index of the broadcast shape, in index order.
    pub fn iter(&self) -> BroadcastIter {
        BroadcastIter {
            left: Values::new(
                &self.left,
                OffsetIter::over(&self.shape, self.left_strides.clone(), self.left.initial_offset),
            ),
            right: Values::new(
                &self.right,
                OffsetIter::over(&self.shape, self.right_strides.clone(), self.right.initial_offset),
            ),
            indices: IndexIter::new(Region::full(&self.shape)),
        }
    }

    /// Fresh tensor of the broadcast shape and dtype holding `f(left, right)` at every index.
    pub fn map(&self, f: impl Fn(f64, f64) -> f64) -> Tensor {
        debug!(shape = ?self.shape, dtype = %self.dtype, "broadcast map");
        let values = self.iter().map(|(left, right, _)| f(left, right));
        Tensor::from_logical(values, self.shape.clone(), self.dtype)
    }
}

/// Element pairs of a [`Broadcast`] with their output index.
pub struct BroadcastIter {
    left: Values<OffsetIter>,
    right: Values<OffsetIter>,
    indices: IndexIter,
}

impl Iterator for BroadcastIter {
    type Item = (f64, f64, Dims);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        Some((self.left.next()?, self.right.next()?, index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl ExactSizeIterator for BroadcastIter {}
