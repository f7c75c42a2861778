//! Lazy traversal of tensor indices, buffer offsets and values.
//!
//! Two orders are supported. Index order visits logical indices with the last axis fastest,
//! carrying into earlier axes like an odometer. Data order visits buffer offsets in increasing
//! physical position. Every traversal can be limited to a rectangular [`Region`].

use super::*;

/// Rectangular part of an index space: `lower[i] <= idx[i] < upper[i]`, stepping by `steps[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    lower: Dims,
    upper: Dims,
    steps: Dims,
}

impl Region {
    /// The whole index space of `shape`.
    pub fn full(shape: &[usize]) -> Self {
        let rank = shape.len();
        Region {
            lower: dims![0; rank],
            upper: Dims::from(shape),
            steps: dims![1; rank],
        }
    }

    /// A region bounded above by `upper`. Missing `lower` bounds default to zero and missing
    /// `steps` to one.
    pub fn new(lower: Option<&[usize]>, upper: &[usize], steps: Option<&[usize]>) -> Result<Self> {
        let mut region = Region::full(upper);

        if let Some(lower) = lower {
            if lower.len() != upper.len() {
                return Err(TensorError::ShapeMismatch(format!(
                    "lower bounds {lower:?} and upper bounds {upper:?} differ in rank"
                )));
            }
            region.lower = Dims::from(lower);
        }

        if let Some(steps) = steps {
            if steps.len() != upper.len() {
                return Err(TensorError::ShapeMismatch(format!(
                    "steps {steps:?} and upper bounds {upper:?} differ in rank"
                )));
            }
            if let Some(axis) = steps.iter().position(|&step| step == 0) {
                return Err(TensorError::InvalidSliceSpecifier(format!(
                    "step on axis {axis} must be positive"
                )));
            }
            region.steps = Dims::from(steps);
        }

        Ok(region)
    }

    pub fn rank(&self) -> usize {
        self.upper.len()
    }

    pub fn lower(&self) -> &[usize] {
        &self.lower
    }

    pub fn upper(&self) -> &[usize] {
        &self.upper
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    /// Number of positions visited along each axis.
    pub fn shape(&self) -> Dims {
        new_shape_from_slice(&self.lower, &self.upper, &self.steps)
    }

    /// Number of indices in the region.
    pub fn size(&self) -> usize {
        compute_size(&self.shape())
    }

    /// Checks that the region lies inside `shape`.
    fn check_within(&self, shape: &[usize]) -> Result<()> {
        if self.rank() != shape.len() {
            return Err(TensorError::ShapeMismatch(format!(
                "region of rank {} used on shape {shape:?}",
                self.rank()
            )));
        }
        match self.upper.iter().zip(shape).position(|(upper, extent)| upper > extent) {
            Some(axis) => Err(TensorError::IndexOutOfBounds(format!(
                "region bound {} exceeds extent {} on axis {axis}",
                self.upper[axis], shape[axis]
            ))),
            None => Ok(()),
        }
    }

    /// Same bounds with axes reordered so that `order[k]` becomes axis `k`.
    fn permuted(&self, order: &[usize]) -> Region {
        Region {
            lower: order.iter().map(|&axis| self.lower[axis]).collect(),
            upper: order.iter().map(|&axis| self.upper[axis]).collect(),
            steps: order.iter().map(|&axis| self.steps[axis]).collect(),
        }
    }
}

/// Ripple-carry cursor over a region, tracking the buffer offset of the current index.
#[derive(Clone, Debug)]
struct Odometer {
    region: Region,
    strides: Dims,
    index: Dims,
    offset: usize,
    remaining: usize,
}

impl Odometer {
    /// `strides` may be empty, in which case every offset equals `base`.
    fn new(region: Region, strides: Dims, base: usize) -> Self {
        let offset = base + strides.dot(&region.lower);
        Odometer {
            index: region.lower.clone(),
            remaining: region.size(),
            region,
            strides,
            offset,
        }
    }

    fn next_offset(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let offset = self.offset;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(offset)
    }

    fn next_index(&mut self) -> Option<(Dims, usize)> {
        if self.remaining == 0 {
            return None;
        }
        let current = (self.index.clone(), self.offset);
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(current)
    }

    /// Increments the last axis, resetting every axis that reaches its upper bound and carrying
    /// into the axis before it.
    fn advance(&mut self) {
        for axis in (0..self.region.rank()).rev() {
            let step = self.region.steps[axis];
            let stride = self.strides.get(axis).copied().unwrap_or(0);
            let next = self.index[axis] + step;

            if next < self.region.upper[axis] {
                self.index[axis] = next;
                self.offset += step * stride;
                return;
            }

            self.offset -= (self.index[axis] - self.region.lower[axis]) * stride;
            self.index[axis] = self.region.lower[axis];
        }
    }
}

fn check_strides(region: &Region, strides: &[usize]) -> Result<()> {
    if strides.len() != region.rank() {
        return Err(TensorError::ShapeMismatch(format!(
            "{} strides for a region of rank {}",
            strides.len(),
            region.rank()
        )));
    }
    Ok(())
}

/// Logical indices of a region in index order.
#[derive(Clone, Debug)]
pub struct IndexIter {
    odometer: Odometer,
}

impl IndexIter {
    pub fn new(region: Region) -> Self {
        IndexIter {
            odometer: Odometer::new(region, Dims::new(), 0),
        }
    }
}

impl Iterator for IndexIter {
    type Item = Dims;

    fn next(&mut self) -> Option<Self::Item> {
        self.odometer.next_index().map(|(index, _)| index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.odometer.remaining, Some(self.odometer.remaining))
    }
}

impl ExactSizeIterator for IndexIter {}

/// Buffer offsets `base + Σ idx[i] * strides[i]` of a region in index order.
#[derive(Clone, Debug)]
pub struct OffsetIter {
    odometer: Odometer,
}

impl OffsetIter {
    pub fn new(region: Region, strides: &[usize], base: usize) -> Result<Self> {
        check_strides(&region, strides)?;
        Ok(OffsetIter {
            odometer: Odometer::new(region, Dims::from(strides), base),
        })
    }

    /// Offsets over the whole of `shape`. The caller passes one stride per axis.
    pub(crate) fn over(shape: &[usize], strides: Dims, base: usize) -> Self {
        OffsetIter {
            odometer: Odometer::new(Region::full(shape), strides, base),
        }
    }
}

impl Iterator for OffsetIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        self.odometer.next_offset()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.odometer.remaining, Some(self.odometer.remaining))
    }
}

impl ExactSizeIterator for OffsetIter {}

/// Innermost axis of a data order traversal.
#[derive(Clone, Debug)]
struct Sweep {
    axis: usize,
    lower: usize,
    step: usize,
    count: usize,
    /// Buffer stride of the axis itself.
    axis_stride: usize,
    /// Buffer distance between consecutive visited positions.
    stride: usize,
}

/// Buffer offsets of a region in increasing physical position.
///
/// Axes are ordered by decreasing stride. All but the innermost one are walked in index order;
/// for each of their positions the innermost axis is swept from its first offset to its last
/// offset in fixed steps.
#[derive(Clone, Debug)]
pub struct DataOrderIter {
    outer: Odometer,
    order: Dims,
    sweep: Option<Sweep>,
    index: Dims,
    inner_index: usize,
    cursor: usize,
    left_in_line: usize,
}

impl DataOrderIter {
    pub fn new(region: Region, strides: &[usize], base: usize) -> Result<Self> {
        check_strides(&region, strides)?;
        Ok(Self::build(region, strides, base))
    }

    fn build(region: Region, strides: &[usize], base: usize) -> Self {
        let mut order: Dims = (0..region.rank()).collect();
        order.sort_by(|&a, &b| strides[b].cmp(&strides[a]));

        let shape = region.shape();
        let sweep = order.last().map(|&axis| Sweep {
            axis,
            lower: region.lower[axis],
            step: region.steps[axis],
            count: shape[axis],
            axis_stride: strides[axis],
            stride: region.steps[axis] * strides[axis],
        });

        let outer_axes = &order[..order.len().saturating_sub(1)];
        let outer_strides = outer_axes.iter().map(|&axis| strides[axis]).collect();
        let mut outer = Odometer::new(region.permuted(outer_axes), outer_strides, base);
        if shape.contains(&0) {
            outer.remaining = 0;
        }

        DataOrderIter {
            outer,
            index: region.lower.clone(),
            order,
            sweep,
            inner_index: 0,
            cursor: base,
            left_in_line: 0,
        }
    }

    /// Logical index of the offset most recently returned by `next`.
    pub fn current_index(&self) -> &[usize] {
        &self.index
    }

    /// Same traversal yielding logical indices instead of offsets.
    pub fn indices(self) -> DataOrderIndices {
        DataOrderIndices { inner: self }
    }

    fn remaining(&self) -> usize {
        match &self.sweep {
            Some(sweep) => self.left_in_line + self.outer.remaining * sweep.count,
            None => self.outer.remaining,
        }
    }
}

impl Iterator for DataOrderIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(sweep) = &self.sweep else {
            // rank 0: a single offset
            return self.outer.next_offset();
        };

        if self.left_in_line == 0 {
            let (outer_index, start) = self.outer.next_index()?;
            for (position, value) in outer_index.iter().enumerate() {
                self.index[self.order[position]] = *value;
            }
            self.cursor = start + sweep.lower * sweep.axis_stride;
            self.inner_index = sweep.lower;
            self.left_in_line = sweep.count;
        }

        let offset = self.cursor;
        self.index[sweep.axis] = self.inner_index;
        self.left_in_line -= 1;
        if self.left_in_line > 0 {
            self.cursor += sweep.stride;
            self.inner_index += sweep.step;
        }
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DataOrderIter {}

/// Logical indices in data order, see [`DataOrderIter`].
#[derive(Clone, Debug)]
pub struct DataOrderIndices {
    inner: DataOrderIter,
}

impl Iterator for DataOrderIndices {
    type Item = Dims;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()?;
        Some(Dims::from(self.inner.current_index()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Buffer elements read at the offsets produced by `I`.
pub struct Values<I> {
    buffer: Rc<RefCell<Buffer>>,
    offsets: I,
}

impl<I> Values<I> {
    pub(crate) fn new(tensor: &Tensor, offsets: I) -> Self {
        Values {
            buffer: tensor.buffer().clone(),
            offsets,
        }
    }
}

impl<I: Iterator<Item = usize>> Iterator for Values<I> {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offsets.next()?;
        Some(self.buffer.borrow().get(offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

/// Sub-tensors along the first axis.
pub struct OuterIter<'a> {
    tensor: &'a Tensor,
    current_index: usize,
}

impl<'a> IntoIterator for &'a Tensor {
    type Item = Tensor;
    type IntoIter = OuterIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.outer_iter()
    }
}

impl Iterator for OuterIter<'_> {
    type Item = Tensor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tensor.shape.is_empty() || self.current_index >= self.tensor.shape[0] {
            return None;
        }
        let sub_tensor = self
            .tensor
            .slice(&[SliceIndex::Single(self.current_index as isize)])
            .ok();
        self.current_index += 1;
        sub_tensor
    }
}

impl Tensor {
    /// Logical indices in index order.
    pub fn indices(&self) -> IndexIter {
        IndexIter::new(Region::full(&self.shape))
    }

    pub fn indices_in(&self, region: &Region) -> Result<IndexIter> {
        region.check_within(&self.shape)?;
        Ok(IndexIter::new(region.clone()))
    }

    /// Buffer offsets in index order.
    pub fn offsets_iter(&self) -> OffsetIter {
        OffsetIter::over(&self.shape, self.strides.clone(), self.initial_offset)
    }

    pub fn offsets_in(&self, region: &Region) -> Result<OffsetIter> {
        region.check_within(&self.shape)?;
        OffsetIter::new(region.clone(), &self.strides, self.initial_offset)
    }

    /// Buffer offsets in increasing physical position.
    pub fn data_order_offsets(&self) -> DataOrderIter {
        DataOrderIter::build(Region::full(&self.shape), &self.strides, self.initial_offset)
    }

    pub fn data_order_offsets_in(&self, region: &Region) -> Result<DataOrderIter> {
        region.check_within(&self.shape)?;
        DataOrderIter::new(region.clone(), &self.strides, self.initial_offset)
    }

    /// Logical indices in increasing physical position.
    pub fn data_order_indices(&self) -> DataOrderIndices {
        self.data_order_offsets().indices()
    }

    /// Elements in index order.
    pub fn values(&self) -> Values<OffsetIter> {
        Values::new(self, self.offsets_iter())
    }

    pub fn values_in(&self, region: &Region) -> Result<Values<OffsetIter>> {
        Ok(Values::new(self, self.offsets_in(region)?))
    }

    /// Elements in increasing physical position.
    pub fn values_data_order(&self) -> Values<DataOrderIter> {
        Values::new(self, self.data_order_offsets())
    }

    /// Sub-tensors obtained by pinning the first axis to each of its positions.
    pub fn outer_iter(&self) -> OuterIter<'_> {
        OuterIter {
            tensor: self,
            current_index: 0,
        }
    }

    /// Elements in index order, collected.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_indices(iter: impl Iterator<Item = Dims>) -> Vec<Vec<usize>> {
        iter.map(|index| index.to_vec()).collect()
    }

    #[test]
    fn test_index_order() {
        let indices = collect_indices(IndexIter::new(Region::full(&[2, 3])));
        assert_eq!(
            indices,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
    }

    #[test]
    fn test_partial_region() -> Result<()> {
        let region = Region::new(Some(&[1, 0][..]), &[4, 3], Some(&[2, 2][..]))?;
        assert_eq!(region.size(), 4);

        let iter = IndexIter::new(region);
        assert_eq!(iter.len(), 4);
        assert_eq!(
            collect_indices(iter),
            vec![vec![1, 0], vec![1, 2], vec![3, 0], vec![3, 2]]
        );

        assert!(Region::new(None, &[2, 2], Some(&[1, 0][..])).is_err());
        assert!(Region::new(Some(&[0][..]), &[2, 2], None).is_err());

        Ok(())
    }

    #[test]
    fn test_scalar_and_empty_regions() {
        assert_eq!(IndexIter::new(Region::full(&[])).count(), 1);
        assert_eq!(IndexIter::new(Region::full(&[3, 0, 2])).count(), 0);
        assert_eq!(OffsetIter::new(Region::full(&[]), &[], 7).unwrap().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_offsets_match_real_index() -> Result<()> {
        for shape in [vec![7], vec![3, 4], vec![2, 3, 2, 4]] {
            let tensor = Tensor::zeros(&shape, DType::Float64)?;
            let offsets: Vec<usize> = tensor.offsets_iter().collect();
            let expected: Vec<usize> = tensor
                .indices()
                .map(|index| tensor.compute_real_index(&index))
                .collect();
            assert_eq!(offsets, expected, "shape {shape:?}");
        }

        let view = Tensor::arange(48)?
            .reshape([4, 3, 4])?
            .slice(&[step![1.., 2], SliceIndex::FULL, SliceIndex::range(Some(1), Some(3))])?;
        let offsets: Vec<usize> = view.offsets_iter().collect();
        let expected: Vec<usize> = view
            .indices()
            .map(|index| view.compute_real_index(&index))
            .collect();
        assert_eq!(offsets, expected);

        Ok(())
    }

    #[test]
    fn test_offsets_in_region() -> Result<()> {
        let tensor = Tensor::arange(12)?.reshape([3, 4])?;
        let region = Region::new(Some(&[1, 1][..]), &[3, 3], None)?;

        let values: Vec<f64> = tensor.values_in(&region)?.collect();
        assert_eq!(values, vec![5.0, 6.0, 9.0, 10.0]);

        let too_large = Region::full(&[4, 4]);
        assert!(matches!(
            tensor.offsets_in(&too_large),
            Err(TensorError::IndexOutOfBounds(_))
        ));
        assert!(matches!(
            tensor.offsets_in(&Region::full(&[3])),
            Err(TensorError::ShapeMismatch(_))
        ));

        Ok(())
    }

    #[test]
    fn test_data_order_fresh() -> Result<()> {
        let tensor = Tensor::zeros([2, 3], DType::Int32)?;
        let offsets: Vec<usize> = tensor.data_order_offsets().collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5]);

        assert_eq!(
            collect_indices(tensor.data_order_indices()),
            vec![
                vec![0, 0],
                vec![1, 0],
                vec![0, 1],
                vec![1, 1],
                vec![0, 2],
                vec![1, 2]
            ]
        );

        Ok(())
    }

    #[test]
    fn test_data_order_view() -> Result<()> {
        let base = Tensor::arange(60)?.reshape([3, 4, 5])?;
        let view = base.slice(&[SliceIndex::range(Some(1), None), step![.., 2], SliceIndex::Single(3)])?;

        let offsets: Vec<usize> = view.data_order_offsets().collect();
        assert_eq!(offsets.len(), view.len());
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));

        let mut sorted: Vec<usize> = view.offsets_iter().collect();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);

        // indices agree with their offsets
        let mut iter = view.data_order_offsets();
        while let Some(offset) = iter.next() {
            assert_eq!(view.compute_real_index(iter.current_index()), offset);
        }

        Ok(())
    }

    #[test]
    fn test_data_order_region() -> Result<()> {
        let tensor = Tensor::zeros([4, 3], DType::Float32)?;
        let region = Region::new(Some(&[1, 0][..]), &[4, 3], Some(&[2, 2][..]))?;

        let iter = tensor.data_order_offsets_in(&region)?;
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.collect::<Vec<_>>(), vec![1, 3, 9, 11]);

        let empty = Region::new(Some(&[2, 0][..]), &[2, 3], None)?;
        assert_eq!(tensor.data_order_offsets_in(&empty)?.count(), 0);

        Ok(())
    }

    #[test]
    fn test_data_order_scalar() -> Result<()> {
        let scalar = Tensor::arange(6)?.reshape([2, 3])?.slice(s![1, 2])?;
        assert_eq!(scalar.values_data_order().collect::<Vec<_>>(), vec![5.0]);

        Ok(())
    }

    #[test]
    fn test_iterators_are_independent() -> Result<()> {
        let tensor = Tensor::arange(6)?;
        let mut first = tensor.values();
        let second = tensor.values();

        first.next();
        first.next();
        assert_eq!(first.next(), Some(2.0));
        assert_eq!(second.collect::<Vec<_>>(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        Ok(())
    }

    #[test]
    fn test_outer_iterator() -> Result<()> {
        let tensor = Tensor::arange(16)?.reshape([4, 2, 2])?;

        let mut iter = tensor.into_iter();
        let first = iter.next().unwrap();
        assert_eq!(first.shape(), &[2, 2]);
        assert!(first.same_content(&Tensor::from_nested([[0, 1], [2, 3]])?));
        assert!(iter.next().unwrap().same_content(&Tensor::from_nested([[4, 5], [6, 7]])?));
        assert!(iter.next().unwrap().same_content(&Tensor::from_nested([[8, 9], [10, 11]])?));
        assert!(iter.next().unwrap().same_content(&Tensor::from_nested([[12, 13], [14, 15]])?));
        assert!(iter.next().is_none());

        Ok(())
    }
}
