//! Pure functions over shapes and strides.
//!
//! Shapes are extents per axis, strides are buffer steps per axis. Fresh tensors use the
//! column-major layout: the first axis is contiguous in the buffer.

use super::*;

/// The ways a shape can be specified before it is normalized by [`compute_shape`].
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeSpec {
    /// A single extent, giving a one-dimensional shape.
    Extent(i64),
    /// A sequence of numbers, each of which has to be a non-negative integer.
    Sequence(Vec<f64>),
    /// An already typed shape buffer.
    Dims(Dims),
    /// Any other input, described for the error message.
    Invalid(String),
}

impl From<usize> for ShapeSpec {
    fn from(extent: usize) -> Self {
        ShapeSpec::Dims(dims![extent])
    }
}

impl From<&[usize]> for ShapeSpec {
    fn from(shape: &[usize]) -> Self {
        ShapeSpec::Dims(Dims::from(shape))
    }
}

impl From<&Vec<usize>> for ShapeSpec {
    fn from(shape: &Vec<usize>) -> Self {
        ShapeSpec::Dims(Dims::from(shape.as_slice()))
    }
}

impl From<Vec<usize>> for ShapeSpec {
    fn from(shape: Vec<usize>) -> Self {
        ShapeSpec::Dims(Dims::from(shape))
    }
}

impl<const M: usize> From<[usize; M]> for ShapeSpec {
    fn from(shape: [usize; M]) -> Self {
        ShapeSpec::Dims(Dims::from(shape))
    }
}

impl<const M: usize> From<&[usize; M]> for ShapeSpec {
    fn from(shape: &[usize; M]) -> Self {
        ShapeSpec::Dims(Dims::from(&shape[..]))
    }
}

impl From<Dims> for ShapeSpec {
    fn from(shape: Dims) -> Self {
        ShapeSpec::Dims(shape)
    }
}

impl From<&Dims> for ShapeSpec {
    fn from(shape: &Dims) -> Self {
        ShapeSpec::Dims(shape.clone())
    }
}

impl From<Vec<f64>> for ShapeSpec {
    fn from(values: Vec<f64>) -> Self {
        ShapeSpec::Sequence(values)
    }
}

impl From<&[f64]> for ShapeSpec {
    fn from(values: &[f64]) -> Self {
        ShapeSpec::Sequence(values.to_vec())
    }
}

#[cfg(feature = "serde")]
impl From<&serde_json::Value> for ShapeSpec {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Number(number) => match number.as_i64() {
                Some(extent) => ShapeSpec::Extent(extent),
                None => ShapeSpec::Sequence(vec![number.as_f64().unwrap_or(f64::NAN)]),
            },
            Value::Array(items) => items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<_>>>()
                .map(ShapeSpec::Sequence)
                .unwrap_or_else(|| ShapeSpec::Invalid(value.to_string())),
            other => ShapeSpec::Invalid(other.to_string()),
        }
    }
}

/// Number of elements addressed by `shape`. A rank-0 shape addresses one element.
///
/// Expects a shape accepted by [`compute_shape`] or [`checked_size`].
pub fn compute_size(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Number of elements addressed by `shape`, failing when the element count or the
/// column-major strides would overflow `usize`.
pub fn checked_size(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |span, &extent| span.checked_mul(extent.max(1)))
        .map(|_| compute_size(shape))
        .ok_or_else(|| TensorError::BadShapeSpecifier(format!("shape {shape:?} addresses more than usize::MAX elements")))
}

/// Normalizes a shape specification into a canonical shape.
///
/// Every accepted shape passes [`checked_size`].
pub fn compute_shape(spec: impl Into<ShapeSpec>) -> Result<Dims> {
    let shape = normalize_shape(spec.into())?;
    checked_size(&shape)?;
    Ok(shape)
}

fn normalize_shape(spec: ShapeSpec) -> Result<Dims> {
    match spec {
        ShapeSpec::Extent(extent) => usize::try_from(extent)
            .map(|extent| dims![extent])
            .map_err(|_| TensorError::BadShapeSpecifier(format!("negative extent {extent}"))),
        ShapeSpec::Sequence(values) => values
            .iter()
            .map(|&value| {
                if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < usize::MAX as f64 {
                    Ok(value as usize)
                } else {
                    Err(TensorError::BadShapeSpecifier(format!(
                        "{value} in {values:?} is not a non-negative integer"
                    )))
                }
            })
            .collect(),
        ShapeSpec::Dims(shape) => Ok(shape),
        ShapeSpec::Invalid(description) => Err(TensorError::BadShapeSpecifier(format!(
            "expected an integer or a sequence of integers, got {description}"
        ))),
    }
}

/// Column-major strides: `stride[0] = 1`, `stride[i + 1] = stride[i] * shape[i]`.
///
/// Zero extents count as one so that strides stay positive for empty tensors.
pub fn stride_from_shape(shape: &[usize]) -> Dims {
    let mut strides = Dims::new();
    let mut stride = 1;
    for &extent in shape {
        strides.push(stride);
        stride *= extent.max(1);
    }
    strides
}

/// Number of positions visited per axis when stepping from `start` (inclusive) to `stop`
/// (exclusive): `ceil((stop - start) / step)`, or zero when `stop <= start`.
pub fn new_shape_from_slice(start: &[usize], stop: &[usize], steps: &[usize]) -> Dims {
    start
        .iter()
        .zip(stop)
        .zip(steps)
        .map(|((&start, &stop), &step)| {
            if stop > start {
                (stop - start).div_ceil(step.max(1))
            } else {
                0
            }
        })
        .collect()
}

/// Shape left after reducing along `axis`. Reducing a vector leaves the one-element shape `[1]`.
pub fn new_shape_from_axis(shape: &[usize], axis: usize) -> Result<Dims> {
    if axis >= shape.len() {
        return Err(TensorError::IndexOutOfBounds(format!(
            "axis {axis} out of bounds for rank {}",
            shape.len()
        )));
    }

    if shape.len() == 1 {
        return Ok(dims![1]);
    }

    Ok(Dims::from(shape).without(axis))
}

/// Shape produced by broadcasting `left` against `right`.
///
/// Shapes are aligned on their last axis. Aligned extents have to agree unless one of them is 1,
/// missing leading axes count as 1, and an empty shape places no constraint at all.
pub fn calculate_broadcast_dimensions(left: &[usize], right: &[usize]) -> Result<Dims> {
    if left.is_empty() {
        return Ok(Dims::from(right));
    }
    if right.is_empty() {
        return Ok(Dims::from(left));
    }

    let rank = left.len().max(right.len());
    let mut shape = dims![0; rank];

    for axis in 0..rank {
        let l = extent_from_right(left, rank, axis);
        let r = extent_from_right(right, rank, axis);

        shape[axis] = match (l, r) {
            (l, r) if l == r => l,
            (1, r) => r,
            (l, 1) => l,
            (l, r) => {
                return Err(TensorError::UnbroadcastableShapes {
                    axis,
                    left: l,
                    right: r,
                });
            }
        };
    }

    checked_size(&shape)?;
    Ok(shape)
}

/// Extent of `shape` at `axis` once right-aligned to `rank` axes; padded axes have extent 1.
fn extent_from_right(shape: &[usize], rank: usize, axis: usize) -> usize {
    let pad = rank - shape.len();
    if axis < pad { 1 } else { shape[axis - pad] }
}

/// Adds the axis extent to every negative component of `indices`.
///
/// Both ends of a range are normalized. The result may still be out of range; resolving against
/// the shape reports single indices and clamps ranges.
pub fn convert_negative_indices(indices: &[SliceIndex], shape: &[usize]) -> Result<Vec<SliceIndex>> {
    if indices.len() > shape.len() {
        return Err(TensorError::InvalidSliceSpecifier(format!(
            "too many indices: {} for rank {}",
            indices.len(),
            shape.len()
        )));
    }

    let normalize = |value: isize, extent: usize| {
        if value < 0 { value + extent as isize } else { value }
    };

    Ok(indices
        .iter()
        .zip(shape)
        .map(|(index, &extent)| match *index {
            SliceIndex::Single(value) => SliceIndex::Single(normalize(value, extent)),
            SliceIndex::Range { start, end, step } => SliceIndex::Range {
                start: start.map(|start| normalize(start, extent)),
                end: end.map(|end| normalize(end, extent)),
                step,
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_size() {
        assert_eq!(compute_size(&[2, 3, 4]), 24);
        assert_eq!(compute_size(&[0]), 0);
        assert_eq!(compute_size(&[5, 0, 2]), 0);
        assert_eq!(compute_size(&[]), 1);
    }

    #[test]
    fn test_checked_size_overflow() -> Result<()> {
        assert_eq!(checked_size(&[2, 3, 4])?, 24);
        assert_eq!(checked_size(&[0, 7])?, 0);

        assert!(matches!(checked_size(&[usize::MAX, 2]), Err(TensorError::BadShapeSpecifier(_))));
        // empty, but the strides of the trailing axes still overflow
        assert!(matches!(checked_size(&[0, 1 << 40, 1 << 40]), Err(TensorError::BadShapeSpecifier(_))));

        assert!(matches!(compute_shape([usize::MAX, 2]), Err(TensorError::BadShapeSpecifier(_))));
        assert!(matches!(
            compute_shape(vec![4294967296.0, 4294967296.0]),
            Err(TensorError::BadShapeSpecifier(_))
        ));
        assert!(matches!(compute_shape(vec![1e30]), Err(TensorError::BadShapeSpecifier(_))));

        Ok(())
    }

    #[test]
    fn test_compute_shape() -> Result<()> {
        assert_eq!(compute_shape(4)?, [4]);
        assert_eq!(compute_shape([2, 3])?, [2, 3]);
        assert_eq!(compute_shape(vec![2.0, 3.0])?, [2, 3]);
        assert_eq!(compute_shape(ShapeSpec::Extent(0))?, [0]);

        assert!(matches!(
            compute_shape(ShapeSpec::Extent(-1)),
            Err(TensorError::BadShapeSpecifier(_))
        ));
        assert!(matches!(
            compute_shape(vec![2.5]),
            Err(TensorError::BadShapeSpecifier(_))
        ));
        assert!(matches!(
            compute_shape(vec![-2.0]),
            Err(TensorError::BadShapeSpecifier(_))
        ));
        assert!(matches!(
            compute_shape(ShapeSpec::Invalid("\"abc\"".to_string())),
            Err(TensorError::BadShapeSpecifier(_))
        ));

        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_compute_shape_from_json() -> Result<()> {
        let value = serde_json::json!([3, 1, 2]);
        assert_eq!(compute_shape(&value)?, [3, 1, 2]);
        assert_eq!(compute_shape(&serde_json::json!(7))?, [7]);
        assert!(compute_shape(&serde_json::json!({"rows": 2})).is_err());
        assert!(compute_shape(&serde_json::json!([2, "x"])).is_err());

        Ok(())
    }

    #[test]
    fn test_stride_from_shape() {
        assert_eq!(stride_from_shape(&[2, 3, 4]), [1, 2, 6]);
        assert_eq!(stride_from_shape(&[5]), [1]);
        assert_eq!(stride_from_shape(&[0, 3]), [1, 1]);
        assert!(stride_from_shape(&[]).is_empty());
    }

    #[test]
    fn test_new_shape_from_slice() {
        assert_eq!(new_shape_from_slice(&[0, 1], &[4, 3], &[1, 1]), [4, 2]);
        // partial final step still counts
        assert_eq!(new_shape_from_slice(&[0], &[5], &[2]), [3]);
        assert_eq!(new_shape_from_slice(&[1], &[7], &[3]), [2]);
        assert_eq!(new_shape_from_slice(&[3], &[3], &[1]), [0]);
        assert_eq!(new_shape_from_slice(&[4], &[2], &[1]), [0]);
    }

    #[test]
    fn test_new_shape_from_axis() -> Result<()> {
        assert_eq!(new_shape_from_axis(&[2, 3, 4], 1)?, [2, 4]);
        assert_eq!(new_shape_from_axis(&[2, 3], 0)?, [3]);
        assert_eq!(new_shape_from_axis(&[7], 0)?, [1]);
        assert!(new_shape_from_axis(&[2, 3], 2).is_err());

        Ok(())
    }

    #[test]
    fn test_broadcast_dimensions() -> Result<()> {
        assert_eq!(calculate_broadcast_dimensions(&[4, 1], &[1, 5])?, [4, 5]);
        assert_eq!(calculate_broadcast_dimensions(&[1, 5], &[4, 1])?, [4, 5]);
        assert_eq!(calculate_broadcast_dimensions(&[2, 3, 4], &[4])?, [2, 3, 4]);
        assert_eq!(calculate_broadcast_dimensions(&[3, 1], &[2, 1, 6])?, [2, 3, 6]);
        assert_eq!(calculate_broadcast_dimensions(&[], &[2, 2])?, [2, 2]);
        assert_eq!(calculate_broadcast_dimensions(&[3], &[])?, [3]);

        let err = calculate_broadcast_dimensions(&[3], &[4]).unwrap_err();
        assert!(matches!(
            err,
            TensorError::UnbroadcastableShapes {
                axis: 0,
                left: 3,
                right: 4
            }
        ));

        let err = calculate_broadcast_dimensions(&[2, 3], &[5, 2, 4]).unwrap_err();
        assert!(matches!(
            err,
            TensorError::UnbroadcastableShapes {
                axis: 2,
                left: 3,
                right: 4
            }
        ));

        Ok(())
    }

    #[test]
    fn test_convert_negative_indices() -> Result<()> {
        let converted = convert_negative_indices(
            &[
                SliceIndex::Single(-1),
                SliceIndex::range(Some(-3), Some(-1)),
                SliceIndex::range(Some(1), None),
            ],
            &[4, 5, 6],
        )?;

        assert_eq!(
            converted,
            vec![
                SliceIndex::Single(3),
                SliceIndex::range(Some(2), Some(4)),
                SliceIndex::range(Some(1), None),
            ]
        );

        assert!(convert_negative_indices(&[SliceIndex::Single(0); 3], &[2, 2]).is_err());

        Ok(())
    }
}
