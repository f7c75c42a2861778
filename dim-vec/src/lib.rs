//! Inline vectors for per-axis tensor metadata.
//!
//! Shapes, strides, offsets and index tuples are short sequences of integers whose length is the
//! rank of a tensor. [`DimVec`] keeps up to `N` of them inline and moves to the heap only for
//! higher ranks, so iterating a view does not allocate per yielded index.

use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

/// Number of axes stored inline by [`Dims`].
pub const INLINE_RANK: usize = 6;

/// Axis metadata with the default inline capacity.
pub type Dims = DimVec<usize, INLINE_RANK>;

/// A vector of `Copy` values stored inline up to `N` elements, falling back to the heap beyond.
#[derive(Clone)]
pub struct DimVec<T, const N: usize> {
    data: DimVecData<T, N>,
    len: usize,
}

#[derive(Clone)]
enum DimVecData<T, const N: usize> {
    Inline([T; N]),
    Heap(Vec<T>),
}

impl<T: Copy + Default, const N: usize> DimVec<T, N> {
    /// Creates an empty vector.
    pub fn new() -> Self {
        Self {
            data: DimVecData::Inline([T::default(); N]),
            len: 0,
        }
    }

    /// Creates a vector holding `len` copies of `value`.
    pub fn from_elem(value: T, len: usize) -> Self {
        let mut dims = Self::new();
        dims.resize(len, value);
        dims
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true while the elements still fit into inline storage.
    pub fn is_inline(&self) -> bool {
        matches!(self.data, DimVecData::Inline(_))
    }

    pub fn push(&mut self, value: T) {
        match &mut self.data {
            DimVecData::Inline(arr) if self.len < N => arr[self.len] = value,
            DimVecData::Inline(_) => {
                self.spill();
                if let DimVecData::Heap(vec) = &mut self.data {
                    vec.push(value);
                }
            }
            DimVecData::Heap(vec) => vec.push(value),
        }
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        match &mut self.data {
            DimVecData::Inline(arr) => Some(arr[self.len]),
            DimVecData::Heap(vec) => vec.pop(),
        }
    }

    /// Removes the element at `index`, shifting the tail left.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let removed = match &mut self.data {
            DimVecData::Inline(arr) => {
                let value = arr[index];
                arr.copy_within(index + 1..self.len, index);
                value
            }
            DimVecData::Heap(vec) => vec.remove(index),
        };
        self.len -= 1;
        Some(removed)
    }

    /// Grows or shrinks to `len`, filling new slots with `value`.
    pub fn resize(&mut self, len: usize, value: T) {
        while self.len > len {
            self.pop();
        }
        while self.len < len {
            self.push(value);
        }
    }

    pub fn clear(&mut self) {
        if let DimVecData::Heap(vec) = &mut self.data {
            vec.clear();
        }
        self.len = 0;
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.data {
            DimVecData::Inline(arr) => &arr[..self.len],
            DimVecData::Heap(vec) => vec.as_slice(),
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.data {
            DimVecData::Inline(arr) => &mut arr[..self.len],
            DimVecData::Heap(vec) => vec.as_mut_slice(),
        }
    }

    /// Copy of this vector without the element at `axis`.
    pub fn without(&self, axis: usize) -> Self {
        self.iter()
            .enumerate()
            .filter(|(i, _)| *i != axis)
            .map(|(_, &value)| value)
            .collect()
    }

    /// Copy of this vector keeping only positions where `keep` is true.
    pub fn select(&self, keep: &[bool]) -> Self {
        self.iter()
            .zip(keep)
            .filter(|(_, keep)| **keep)
            .map(|(&value, _)| value)
            .collect()
    }

    /// Copy of this vector in reverse order.
    pub fn reversed(&self) -> Self {
        self.iter().rev().copied().collect()
    }

    fn spill(&mut self) {
        if let DimVecData::Inline(arr) = &self.data {
            let mut vec = Vec::with_capacity(N.max(1) * 2);
            vec.extend_from_slice(&arr[..self.len]);
            self.data = DimVecData::Heap(vec);
        }
    }
}

impl<const N: usize> DimVec<usize, N> {
    /// Product of all elements; 1 for an empty vector.
    pub fn product(&self) -> usize {
        self.iter().product()
    }

    /// Sum of pairwise products with `other`, truncated to the shorter length.
    pub fn dot(&self, other: &[usize]) -> usize {
        self.iter().zip(other).map(|(a, b)| a * b).sum()
    }
}

impl<T: Copy + Default, const N: usize> Default for DimVec<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> Deref for DimVec<T, N> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Copy + Default, const N: usize> DerefMut for DimVec<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Copy + Default + PartialEq, const N: usize> PartialEq for DimVec<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Default + Eq, const N: usize> Eq for DimVec<T, N> {}

impl<T: Copy + Default + PartialEq, const N: usize> PartialEq<[T]> for DimVec<T, N> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Copy + Default + PartialEq, const N: usize, const M: usize> PartialEq<[T; M]> for DimVec<T, N> {
    fn eq(&self, other: &[T; M]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Default + Hash, const N: usize> Hash for DimVec<T, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T: Copy + Default + std::fmt::Debug, const N: usize> std::fmt::Debug for DimVec<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Copy + Default, const N: usize> FromIterator<T> for DimVec<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut dims = Self::new();
        dims.extend(iter);
        dims
    }
}

impl<T: Copy + Default, const N: usize> Extend<T> for DimVec<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T: Copy + Default, const N: usize> IntoIterator for &'a DimVec<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T: Copy + Default, const N: usize> From<&[T]> for DimVec<T, N> {
    fn from(values: &[T]) -> Self {
        values.iter().copied().collect()
    }
}

impl<T: Copy + Default, const N: usize> From<Vec<T>> for DimVec<T, N> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Copy + Default, const N: usize, const M: usize> From<[T; M]> for DimVec<T, N> {
    fn from(values: [T; M]) -> Self {
        values.into_iter().collect()
    }
}

/// Builds a [`DimVec`] from a list of elements or from `value; len`.
#[macro_export]
macro_rules! dims {
    () => {
        $crate::DimVec::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::DimVec::from_elem($elem, $n)
    };
    ($($elem:expr),+ $(,)?) => {
        {
            let mut dims = $crate::DimVec::new();
            $(dims.push($elem);)+
            dims
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_and_index() {
        let mut dims: Dims = DimVec::new();
        assert!(dims.is_empty());

        dims.push(4);
        dims.push(5);
        dims.push(6);
        assert_eq!(dims.len(), 3);
        assert_eq!(dims[0], 4);
        assert_eq!(dims[2], 6);
        assert_eq!(dims, [4, 5, 6]);
    }

    #[test]
    fn test_spill_to_heap() {
        let mut dims: DimVec<usize, 2> = dims![1, 2];
        assert!(dims.is_inline());

        dims.push(3);
        assert!(!dims.is_inline());
        assert_eq!(dims.as_slice(), &[1, 2, 3]);

        assert_eq!(dims.pop(), Some(3));
        assert_eq!(dims.pop(), Some(2));
        assert_eq!(dims.pop(), Some(1));
        assert_eq!(dims.pop(), None);
    }

    #[test]
    fn test_remove_shifts_tail() {
        let mut dims: Dims = dims![1, 5, 1, 7];
        assert_eq!(dims.remove(2), Some(1));
        assert_eq!(dims, [1, 5, 7]);
        assert_eq!(dims.remove(3), None);
    }

    #[test]
    fn test_axis_helpers() {
        let shape: Dims = dims![2, 3, 4];
        assert_eq!(shape.product(), 24);
        assert_eq!(shape.dot(&[1, 2, 6]), 2 + 6 + 24);
        assert_eq!(shape.without(1), [2, 4]);
        assert_eq!(shape.select(&[true, false, true]), [2, 4]);
        assert_eq!(shape.reversed(), [4, 3, 2]);

        let scalar: Dims = dims![];
        assert_eq!(scalar.product(), 1);
    }

    #[test]
    fn test_from_elem_and_resize() {
        let mut dims: Dims = dims![0; 3];
        assert_eq!(dims, [0, 0, 0]);

        dims.resize(8, 9);
        assert_eq!(dims.len(), 8);
        assert!(!dims.is_inline());
        assert_eq!(dims[7], 9);

        dims.resize(1, 0);
        assert_eq!(dims, [0]);

        dims.clear();
        assert!(dims.is_empty());
    }

    #[test]
    fn test_deref_mut() {
        let mut dims: Dims = dims![1, 2, 3];
        dims.swap(0, 2);
        dims[1] = 7;
        assert_eq!(dims, [3, 7, 1]);
    }

    proptest! {
        #[test]
        fn prop_matches_vec(values in prop::collection::vec(0usize..100, 0..16)) {
            let dims: Dims = values.iter().copied().collect();
            prop_assert_eq!(dims.as_slice(), values.as_slice());
            prop_assert_eq!(dims.product(), values.iter().product::<usize>());
            prop_assert_eq!(dims.is_inline(), values.len() <= INLINE_RANK);
        }
    }
}
