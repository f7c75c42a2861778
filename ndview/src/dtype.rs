use super::*;
use std::fmt;
use std::str::FromStr;

/// Numeric kind of the elements stored in a tensor buffer.
///
/// The set is closed: every buffer holds exactly one of these kinds, and binary operations combine
/// two kinds through [`DType::join`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    #[default]
    Float64,
}

use DType::*;

/// Promotion table indexed by [`DType::ordinal`]: the smallest kind both operands convert into
/// without losing values.
const PROMOTION: [[DType; 8]; 8] = [
    //  Int8     Uint8    Int16    Uint16   Int32    Uint32   Float32  Float64
    [Int8, Int16, Int16, Int32, Int32, Float64, Float32, Float64], // Int8
    [Int16, Uint8, Int16, Uint16, Int32, Uint32, Float32, Float64], // Uint8
    [Int16, Int16, Int16, Int32, Int32, Float64, Float32, Float64], // Int16
    [Int32, Uint16, Int32, Uint16, Int32, Uint32, Float32, Float64], // Uint16
    [Int32, Int32, Int32, Int32, Int32, Float64, Float64, Float64], // Int32
    [Float64, Uint32, Float64, Uint32, Float64, Uint32, Float64, Float64], // Uint32
    [Float32, Float32, Float32, Float32, Float64, Float64, Float32, Float64], // Float32
    [Float64, Float64, Float64, Float64, Float64, Float64, Float64, Float64], // Float64
];

impl DType {
    pub const ALL: [DType; 8] = [Int8, Uint8, Int16, Uint16, Int32, Uint32, Float32, Float64];

    fn ordinal(self) -> usize {
        match self {
            Int8 => 0,
            Uint8 => 1,
            Int16 => 2,
            Uint16 => 3,
            Int32 => 4,
            Uint32 => 5,
            Float32 => 6,
            Float64 => 7,
        }
    }

    /// Width of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float32 => 4,
            Float64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Float32 | Float64)
    }

    pub fn is_signed(self) -> bool {
        !matches!(self, Uint8 | Uint16 | Uint32)
    }

    /// Tag used in the persisted representation.
    pub fn name(self) -> &'static str {
        match self {
            Int8 => "int8",
            Uint8 => "uint8",
            Int16 => "int16",
            Uint16 => "uint16",
            Int32 => "int32",
            Uint32 => "uint32",
            Float32 => "float32",
            Float64 => "float64",
        }
    }

    /// Smallest kind that represents every value of both `self` and `other`.
    pub fn join(self, other: DType) -> DType {
        PROMOTION[self.ordinal()][other.ordinal()]
    }

    /// Smallest kind that represents `value` exactly.
    pub fn for_value(value: f64) -> DType {
        if value.is_finite() && value.fract() == 0.0 {
            if value >= 0.0 {
                if value <= u8::MAX as f64 {
                    return Uint8;
                } else if value <= u16::MAX as f64 {
                    return Uint16;
                } else if value <= u32::MAX as f64 {
                    return Uint32;
                }
            } else if value >= i8::MIN as f64 {
                return Int8;
            } else if value >= i16::MIN as f64 {
                return Int16;
            } else if value >= i32::MIN as f64 {
                return Int32;
            }
            return Float64;
        }

        if (value as f32) as f64 == value || value.is_nan() {
            Float32
        } else {
            Float64
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = TensorError;

    fn from_str(tag: &str) -> Result<Self> {
        DType::ALL
            .into_iter()
            .find(|dtype| dtype.name() == tag)
            .ok_or_else(|| TensorError::BadData(format!("unknown dtype tag '{tag}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_symmetric() {
        for a in DType::ALL {
            for b in DType::ALL {
                assert_eq!(a.join(b), b.join(a), "{a} with {b}");
            }
            assert_eq!(a.join(a), a);
        }
    }

    #[test]
    fn test_join_is_lossless() {
        assert_eq!(Int8.join(Uint8), Int16);
        assert_eq!(Uint8.join(Uint16), Uint16);
        assert_eq!(Int16.join(Uint16), Int32);
        assert_eq!(Int32.join(Uint32), Float64);
        assert_eq!(Uint16.join(Float32), Float32);
        assert_eq!(Int32.join(Float32), Float64);
        assert_eq!(Float32.join(Float64), Float64);
    }

    #[test]
    fn test_for_value() {
        assert_eq!(DType::for_value(0.0), Uint8);
        assert_eq!(DType::for_value(300.0), Uint16);
        assert_eq!(DType::for_value(-1.0), Int8);
        assert_eq!(DType::for_value(-40_000.0), Int32);
        assert_eq!(DType::for_value(5e9), Float64);
        assert_eq!(DType::for_value(0.5), Float32);
        assert_eq!(DType::for_value(0.1), Float64);
    }

    #[test]
    fn test_tags() -> Result<()> {
        for dtype in DType::ALL {
            assert_eq!(dtype.name().parse::<DType>()?, dtype);
        }
        assert!(matches!("complex64".parse::<DType>(), Err(TensorError::BadData(_))));
        assert_eq!(Float32.size_of(), 4);
        assert!(Int16.is_signed() && !Uint16.is_signed());
        assert_eq!(DType::default(), Float64);

        Ok(())
    }
}
