use super::*;

/// Computes the dot product of two 1D tensors.
/// Returns an error if the tensors are not 1D or have different sizes.
pub fn dot(left: &Tensor, right: &Tensor) -> Result<f64> {
    if left.rank() != 1 || right.rank() != 1 {
        return Err(TensorError::UnsupportedOperation(format!(
            "Dot product requires 1D tensors, but got shapes {:?} and {:?}",
            left.shape, right.shape
        )));
    }

    if left.shape[0] != right.shape[0] {
        return Err(TensorError::ShapeMismatch(format!(
            "Tensors must have the same size for dot product: {} != {}",
            left.shape[0], right.shape[0]
        )));
    }

    Ok(left.values().zip(right.values()).map(|(a, b)| a * b).sum())
}

impl Tensor {
    /// See [`dot`].
    pub fn dot(&self, other: &Tensor) -> Result<f64> {
        dot(self, other)
    }

    /// Folds every line along `axis` with `f`, starting from `init`.
    ///
    /// The result has the shape of `self` without `axis` (`[1]` for a vector) and keeps the dtype
    /// of `self`, so folded values are converted like any other write.
    pub fn accum_map(&self, axis: usize, init: f64, f: impl Fn(f64, f64) -> f64) -> Result<Tensor> {
        let shape = new_shape_from_axis(&self.shape, axis)?;
        let outer = self.shape.without(axis);

        let mut values = Vec::with_capacity(compute_size(&shape));
        for index in IndexIter::new(Region::full(&outer)) {
            // line through `index` spanning the whole of `axis`
            let (lower, upper): (Dims, Dims) = (0..self.rank())
                .map(|dim| match dim.cmp(&axis) {
                    std::cmp::Ordering::Less => (index[dim], index[dim] + 1),
                    std::cmp::Ordering::Equal => (0, self.shape[axis]),
                    std::cmp::Ordering::Greater => (index[dim - 1], index[dim - 1] + 1),
                })
                .unzip();

            let region = Region::new(Some(lower.as_slice()), &upper, None)?;
            values.push(self.values_in(&region)?.fold(init, &f));
        }

        Ok(Tensor::from_logical(values, shape, self.dtype))
    }

    /// Sum of the elements along `axis`.
    pub fn sum_axis(&self, axis: usize) -> Result<Tensor> {
        self.accum_map(axis, 0.0, |acc, value| acc + value)
    }
}
