use super::*;
use std::fmt;

impl fmt::Display for Tensor {
    /// Nested brackets in index order, one line per innermost row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut values = self.values();
        write_nested(f, &self.shape, self.dtype, &mut values, 0)
    }
}

fn write_nested(
    f: &mut fmt::Formatter<'_>,
    shape: &[usize],
    dtype: DType,
    values: &mut impl Iterator<Item = f64>,
    depth: usize,
) -> fmt::Result {
    let Some((&extent, rest)) = shape.split_first() else {
        let value = values.next().unwrap_or_default();
        return if dtype.is_float() {
            write!(f, "{value:?}")
        } else {
            write!(f, "{}", value as i64)
        };
    };

    write!(f, "[")?;
    for k in 0..extent {
        if k > 0 {
            if rest.is_empty() {
                write!(f, ", ")?;
            } else {
                // rows of deeper levels start under the opening bracket
                write!(f, ",{}{:indent$}", "\n".repeat(rest.len()), "", indent = depth + 1)?;
            }
        }
        write_nested(f, rest, dtype, values, depth + 1)?;
    }
    write!(f, "]")
}
