use super::*;

/// Per-call options of [`Tensor::array`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArrayOptions {
    /// Element kind of the tensor; the data is converted when it holds another kind.
    pub dtype: Option<DType>,
    pub(crate) disable_checks: bool,
}

impl ArrayOptions {
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Skips the size validation. Only for callers that allocated the buffer for the shape.
    pub(crate) fn unchecked(mut self) -> Self {
        self.disable_checks = true;
        self
    }
}

/// Arbitrarily nested lists of numbers, as accepted by [`Tensor::from_nested`].
#[derive(Clone, Debug, PartialEq)]
pub enum Nested {
    Value(f64),
    List(Vec<Nested>),
}

macro_rules! impl_nested_from {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Nested {
                fn from(value: $ty) -> Self {
                    Nested::Value(value as f64)
                }
            }
        )+
    };
}

impl_nested_from!(f64, f32, i8, u8, i16, u16, i32, u32, i64);

impl<T: Into<Nested>> From<Vec<T>> for Nested {
    fn from(items: Vec<T>) -> Self {
        Nested::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Nested>, const M: usize> From<[T; M]> for Nested {
    fn from(items: [T; M]) -> Self {
        Nested::List(items.into_iter().map(Into::into).collect())
    }
}

impl Nested {
    /// Shape implied by following the first element at every level.
    fn infer_shape(&self) -> Dims {
        let mut shape = Dims::new();
        let mut current = self;

        while let Nested::List(items) = current {
            shape.push(items.len());
            match items.first() {
                Some(first) => current = first,
                None => break,
            }
        }

        shape
    }

    pub(crate) fn collect_leaves(&self, shape: &[usize], depth: usize, leaves: &mut Vec<f64>) -> Result<()> {
        match self {
            Nested::Value(value) if depth == shape.len() => leaves.push(*value),
            Nested::List(items) if depth < shape.len() && items.len() == shape[depth] => {
                for item in items {
                    item.collect_leaves(shape, depth + 1, leaves)?;
                }
            }
            _ => {
                return Err(TensorError::BadData(format!(
                    "ragged nested data at depth {depth}, expected shape {shape:?}"
                )));
            }
        }
        Ok(())
    }

    fn build(shape: &[usize], values: &mut impl Iterator<Item = f64>) -> Nested {
        match shape.split_first() {
            None => Nested::Value(values.next().unwrap_or_default()),
            Some((&extent, rest)) => Nested::List((0..extent).map(|_| Nested::build(rest, values)).collect()),
        }
    }
}

impl Tensor {
    /// Wraps `data` as the physical buffer of a fresh column-major tensor.
    ///
    /// The data is *not* reordered: `data[k]` is the element at buffer position `k`, so for
    /// `shape == [2, 3]` the first two values form the first column.
    pub fn array(data: impl Into<Buffer>, shape: impl Into<ShapeSpec>, options: ArrayOptions) -> Result<Tensor> {
        let shape = compute_shape(shape)?;
        let mut buffer = data.into();

        if !options.disable_checks {
            let size = compute_size(&shape);
            if size != buffer.len() {
                return Err(TensorError::ShapeSizeMismatch {
                    shape: shape.to_vec(),
                    expected: size,
                    actual: buffer.len(),
                });
            }
        }

        if let Some(dtype) = options.dtype {
            if dtype != buffer.dtype() {
                buffer = buffer.cast(dtype);
            }
        }

        Ok(Tensor::from_buffer(buffer, shape))
    }

    /// Creates a new tensor with the given data and shape, keeping the element kind of the data.
    pub fn new(data: impl Into<Buffer>, shape: impl Into<ShapeSpec>) -> Result<Tensor> {
        Tensor::array(data, shape, ArrayOptions::default())
    }

    pub fn zeros(shape: impl Into<ShapeSpec>, dtype: DType) -> Result<Tensor> {
        Tensor::filled(0.0, shape, dtype)
    }

    pub fn ones(shape: impl Into<ShapeSpec>, dtype: DType) -> Result<Tensor> {
        Tensor::filled(1.0, shape, dtype)
    }

    /// Fresh tensor with every element set to `value` converted into `dtype`.
    pub fn filled(value: impl Into<f64>, shape: impl Into<ShapeSpec>, dtype: DType) -> Result<Tensor> {
        let shape = compute_shape(shape)?;
        let buffer = Buffer::filled(dtype, value.into(), compute_size(&shape));

        Ok(Tensor::from_buffer(buffer, shape))
    }

    /// Creates a 1-D `float64` tensor with values from 0 to `end - 1`.
    pub fn arange(end: usize) -> Result<Tensor> {
        Tensor::arange_between(0.0, end as f64, 1.0)
    }

    /// Creates a 1-D `float64` tensor of `start, start + step, ...` stopping before `stop`.
    pub fn arange_between(start: impl Into<f64>, stop: impl Into<f64>, step: impl Into<f64>) -> Result<Tensor> {
        let (start, stop, step) = (start.into(), stop.into(), step.into());

        if step == 0.0 || !step.is_finite() || !start.is_finite() || !stop.is_finite() {
            return Err(TensorError::BadData(format!(
                "cannot build a range from {start} to {stop} with step {step}"
            )));
        }

        let count = ((stop - start) / step).ceil().max(0.0) as usize;
        let values = (0..count).map(|k| start + k as f64 * step);

        Ok(Tensor::from_buffer(Buffer::from_values(DType::Float64, values), dims![count]))
    }

    /// Square identity matrix of side `n`.
    pub fn eye(n: usize, dtype: DType) -> Result<Tensor> {
        let tensor = Tensor::zeros([n, n], dtype)?;
        {
            let mut buffer = tensor.data.borrow_mut();
            for k in 0..n {
                buffer.set(k * (n + 1), 1.0);
            }
        }
        Ok(tensor)
    }

    /// Fills a fresh tensor of `shape` from `values` in index order, last axis fastest.
    pub fn from_iterable<V: Into<f64>>(
        values: impl IntoIterator<Item = V>,
        shape: impl Into<ShapeSpec>,
        dtype: DType,
    ) -> Result<Tensor> {
        let shape = compute_shape(shape)?;
        let values: Vec<f64> = values.into_iter().map(Into::into).collect();
        let size = compute_size(&shape);

        if values.len() != size {
            return Err(TensorError::ShapeSizeMismatch {
                shape: shape.to_vec(),
                expected: size,
                actual: values.len(),
            });
        }

        Ok(Tensor::from_logical(values, shape, dtype))
    }

    /// Builds a `float64` tensor from nested lists, which must be rectangular.
    ///
    /// An empty list gives the empty tensor of shape `[0]`; a bare number gives a rank-0 tensor.
    pub fn from_nested(nested: impl Into<Nested>) -> Result<Tensor> {
        let nested = nested.into();
        let shape = nested.infer_shape();

        let mut leaves = Vec::with_capacity(compute_size(&shape));
        nested.collect_leaves(&shape, 0, &mut leaves)?;

        Ok(Tensor::from_logical(leaves, shape, DType::Float64))
    }

    /// Elements as nested lists in index order.
    pub fn to_nested(&self) -> Nested {
        Nested::build(&self.shape, &mut self.values())
    }

    /// Fresh tensor with `values` assigned to its indices in index order.
    pub(crate) fn from_logical(values: impl IntoIterator<Item = f64>, shape: Dims, dtype: DType) -> Tensor {
        let tensor = Tensor::from_buffer(Buffer::zeros(dtype, compute_size(&shape)), shape);
        {
            let mut buffer = tensor.data.borrow_mut();
            for (offset, value) in tensor.offsets_iter().zip(values) {
                buffer.set(offset, value);
            }
        }
        tensor
    }
}

impl<T: Element> From<Vec<T>> for Tensor {
    fn from(values: Vec<T>) -> Self {
        let len = values.len();
        Tensor::from_buffer(T::wrap(values), dims![len])
    }
}
