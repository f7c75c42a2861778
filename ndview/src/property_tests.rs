//! Property-based tests for view metadata, iteration and broadcasting
//!
//! These use proptest to check the addressing invariants over randomly generated shapes and
//! slices rather than a handful of hand-picked cases.

#[cfg(test)]
mod tests {
    use crate::*;
    use proptest::prelude::*;

    // Shapes of rank 1-4 with small extents
    fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..6, 1..=4)
    }

    // Per-axis seeds turned into a range slice by `slice_from_seeds`
    fn seeds_strategy() -> impl Strategy<Value = Vec<(usize, usize, isize)>> {
        prop::collection::vec((0usize..8, 0usize..8, 1isize..4), 4)
    }

    fn slice_from_seeds(shape: &[usize], seeds: &[(usize, usize, isize)]) -> Vec<SliceIndex> {
        shape
            .iter()
            .zip(seeds)
            .map(|(&extent, &(start, len, step))| {
                let start = start % extent;
                let end = (start + len).min(extent);
                SliceIndex::range_with_step(Some(start as isize), Some(end as isize), step)
            })
            .collect()
    }

    fn arange_of(shape: &[usize]) -> Tensor {
        let size: usize = shape.iter().product();
        Tensor::from_iterable((0..size).map(|value| value as f64), shape, DType::Float64).unwrap()
    }

    #[test]
    fn test_proptest_smoke() {
        let tensor = Tensor::zeros([2, 3], DType::Float64).unwrap();
        assert_eq!(tensor.shape(), &[2, 3]);
    }

    proptest! {
        #[test]
        fn prop_offsets_match_real_index(shape in shape_strategy(), seeds in seeds_strategy()) {
            let base = arange_of(&shape);
            let view = base.slice(&slice_from_seeds(&shape, &seeds)).unwrap();

            let offsets: Vec<usize> = view.offsets_iter().collect();
            let expected: Vec<usize> = view.indices().map(|index| view.compute_real_index(&index)).collect();

            prop_assert_eq!(offsets.len(), view.len());
            prop_assert_eq!(offsets, expected);
        }

        #[test]
        fn prop_slice_reads_source_elements(shape in shape_strategy(), seeds in seeds_strategy()) {
            let base = arange_of(&shape);
            let indices = slice_from_seeds(&shape, &seeds);
            let view = base.slice(&indices).unwrap();

            for index in view.indices() {
                let source: Vec<isize> = index
                    .iter()
                    .zip(&indices)
                    .map(|(&position, slice)| match *slice {
                        SliceIndex::Range { start, step, .. } => start.unwrap_or(0) + position as isize * step,
                        SliceIndex::Single(position) => position,
                    })
                    .collect();
                let index: Vec<isize> = index.iter().map(|&position| position as isize).collect();

                prop_assert_eq!(view.get(&index).unwrap(), base.get(&source).unwrap());
            }
        }

        #[test]
        fn prop_slice_extent_is_ceiling(extent in 1usize..40, start in 0usize..40, stop in 0usize..40, step in 1isize..6) {
            let tensor = Tensor::arange(extent).unwrap();
            let view = tensor.slice(&[SliceIndex::range_with_step(Some(start as isize), Some(stop as isize), step)]).unwrap();

            let (start, stop) = (start.min(extent), stop.min(extent));
            let expected = if stop > start { (stop - start).div_ceil(step as usize) } else { 0 };
            prop_assert_eq!(view.shape(), &[expected]);
        }

        #[test]
        fn prop_data_order_is_sorted_permutation(shape in shape_strategy(), seeds in seeds_strategy()) {
            let base = arange_of(&shape);
            let view = base.slice(&slice_from_seeds(&shape, &seeds)).unwrap();

            let data_order: Vec<usize> = view.data_order_offsets().collect();
            prop_assert!(data_order.windows(2).all(|pair| pair[0] < pair[1]));

            let mut index_order: Vec<usize> = view.offsets_iter().collect();
            index_order.sort_unstable();
            prop_assert_eq!(data_order, index_order);
        }

        #[test]
        fn prop_reshape_roundtrip(shape in shape_strategy()) {
            let tensor = arange_of(&shape);

            let flat = tensor.reshape(tensor.len()).unwrap();
            prop_assert_eq!(flat.shape(), &[tensor.len()]);

            let restored = flat.reshape(shape.as_slice()).unwrap();
            prop_assert_eq!(restored, tensor);
        }

        #[test]
        fn prop_transpose_is_involution(shape in shape_strategy()) {
            let tensor = arange_of(&shape);
            prop_assert_eq!(tensor.transpose().transpose(), tensor);
        }

        #[test]
        fn prop_broadcast_is_commutative(shape in shape_strategy(), mask in prop::collection::vec(0u8..3, 4)) {
            // every axis keeps its extent on both sides or collapses to 1 on one side
            let left: Vec<usize> = shape.iter().zip(&mask).map(|(&extent, &m)| if m == 1 { 1 } else { extent }).collect();
            let right: Vec<usize> = shape.iter().zip(&mask).map(|(&extent, &m)| if m == 2 { 1 } else { extent }).collect();

            let a = arange_of(&left);
            let b = arange_of(&right);

            let forward = broadcast(&a, &b).unwrap();
            let backward = broadcast(&b, &a).unwrap();
            prop_assert_eq!(forward.shape(), shape.as_slice());
            prop_assert_eq!(forward.shape(), backward.shape());

            let sum = forward.map(|x, y| x + y);
            prop_assert!(sum.same_content(&backward.map(|x, y| y + x)));
        }

        #[cfg(feature = "serde")]
        #[test]
        fn prop_json_roundtrip(shape in shape_strategy(), seeds in seeds_strategy()) {
            let base = arange_of(&shape);
            prop_assert_eq!(Tensor::from_json(&base.to_json()).unwrap(), base.clone());

            let view = base.slice(&slice_from_seeds(&shape, &seeds)).unwrap();
            prop_assert!(Tensor::from_json(&view.to_json()).unwrap().same_content(&view));
        }
    }
}
