use super::*;
use tracing::debug;

/// Matrix product of two rank-2 tensors.
///
/// The result is a fresh `[m, n]` tensor in the joined dtype of both operands.
pub fn matmul_2d(left: &Tensor, right: &Tensor) -> Result<Tensor> {
    if left.rank() != 2 || right.rank() != 2 {
        return Err(TensorError::UnsupportedOperation(format!(
            "Unsupported dimensions for matmul_2d: {:?} x {:?}",
            left.shape, right.shape
        )));
    }

    let (m, k) = (left.shape[0], left.shape[1]);
    let (k2, n) = (right.shape[0], right.shape[1]);

    if k != k2 {
        return Err(TensorError::ShapeMismatch(format!(
            "Matrix dimensions incompatible for multiplication: {k} != {k2}"
        )));
    }

    let dtype = left.dtype.join(right.dtype);
    let mut result_data = vec![0.0; m * n];
    {
        let a = left.data.borrow();
        let b = right.data.borrow();

        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0;
                for l in 0..k {
                    let a_val = a.get(left.compute_real_index(&[i, l]));
                    let b_val = b.get(right.compute_real_index(&[l, j]));
                    sum += a_val * b_val;
                }
                // column-major, like every fresh tensor
                result_data[i + j * m] = sum;
            }
        }
    }

    Tensor::array(
        Buffer::from_values(dtype, result_data),
        [m, n],
        ArrayOptions::default().unchecked(),
    )
}

/// Matrix product over the two trailing axes, broadcasting all leading (batch) axes.
///
/// Each batch cell is multiplied with [`matmul_2d`] on the trailing sub-matrices selected by
/// slicing, so operands of any layout are accepted.
pub fn broadcast_matmul(left: &Tensor, right: &Tensor) -> Result<Tensor> {
    if left.rank() < 2 || right.rank() < 2 {
        return Err(TensorError::UnsupportedOperation(format!(
            "Unsupported dimensions for matmul: {:?} x {:?}",
            left.shape, right.shape
        )));
    }

    let (left_batch, left_matrix) = left.shape.split_at(left.rank() - 2);
    let (right_batch, right_matrix) = right.shape.split_at(right.rank() - 2);

    if left_matrix[1] != right_matrix[0] {
        return Err(TensorError::ShapeMismatch(format!(
            "Matrix dimensions incompatible for multiplication: {} != {}",
            left_matrix[1], right_matrix[0]
        )));
    }

    let batch = calculate_broadcast_dimensions(left_batch, right_batch)?;
    let mut shape = batch.clone();
    shape.push(left_matrix[0]);
    shape.push(right_matrix[1]);

    debug!(left = ?left.shape, right = ?right.shape, result = ?shape, "broadcast matmul");

    let result = Tensor::zeros(&shape, left.dtype.join(right.dtype))?;
    for index in IndexIter::new(Region::full(&batch)) {
        let left_cell = left.slice(&batch_indices(&index, left_batch))?;
        let right_cell = right.slice(&batch_indices(&index, right_batch))?;
        let product = matmul_2d(&left_cell, &right_cell)?;

        let target: Vec<SliceIndex> = index.iter().map(|&position| SliceIndex::Single(position as isize)).collect();
        result.set(product, &target)?;
    }

    Ok(result)
}

/// Single indices selecting the batch cell `index` of an operand with batch axes `batch`.
/// Axes are aligned on the right and extent-1 axes stay at position 0.
fn batch_indices(index: &[usize], batch: &[usize]) -> Vec<SliceIndex> {
    let pad = index.len() - batch.len();
    batch
        .iter()
        .zip(&index[pad..])
        .map(|(&extent, &position)| SliceIndex::Single(if extent == 1 { 0 } else { position as isize }))
        .collect()
}

impl Tensor {
    /// Matrix multiplication: [`matmul_2d`] for two matrices, [`broadcast_matmul`] otherwise.
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor> {
        match (self.rank(), other.rank()) {
            (2, 2) => matmul_2d(self, other),
            _ => broadcast_matmul(self, other),
        }
    }
}
