use super::*;

/// Rust element types that back a [`DType`].
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + 'static {
    const DTYPE: DType;

    /// Converts with `as` semantics: floats saturate and truncate toward zero for integer kinds.
    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;

    fn wrap(values: Vec<Self>) -> Buffer;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$variant;

                fn from_f64(value: f64) -> Self {
                    value as $ty
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn wrap(values: Vec<Self>) -> Buffer {
                    Buffer::$variant(values)
                }
            }

            impl From<Vec<$ty>> for Buffer {
                fn from(values: Vec<$ty>) -> Self {
                    Buffer::$variant(values)
                }
            }
        )+
    };
}

impl_element!(
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    f32 => Float32,
    f64 => Float64,
);

/// Flat homogeneous storage shared by every view derived from one root tensor.
#[derive(Clone, Debug, PartialEq)]
pub enum Buffer {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Runs `$body` with `$vec` bound to the typed vector inside a buffer.
macro_rules! with_vec {
    ($buffer:expr, $vec:ident => $body:expr) => {
        match $buffer {
            Buffer::Int8($vec) => $body,
            Buffer::Uint8($vec) => $body,
            Buffer::Int16($vec) => $body,
            Buffer::Uint16($vec) => $body,
            Buffer::Int32($vec) => $body,
            Buffer::Uint32($vec) => $body,
            Buffer::Float32($vec) => $body,
            Buffer::Float64($vec) => $body,
        }
    };
}

/// Builds a buffer of `$dtype` from an expression generic over the element type `$ty`.
macro_rules! for_dtype {
    ($dtype:expr, $ty:ident => $body:expr) => {
        match $dtype {
            DType::Int8 => {
                type $ty = i8;
                Buffer::Int8($body)
            }
            DType::Uint8 => {
                type $ty = u8;
                Buffer::Uint8($body)
            }
            DType::Int16 => {
                type $ty = i16;
                Buffer::Int16($body)
            }
            DType::Uint16 => {
                type $ty = u16;
                Buffer::Uint16($body)
            }
            DType::Int32 => {
                type $ty = i32;
                Buffer::Int32($body)
            }
            DType::Uint32 => {
                type $ty = u32;
                Buffer::Uint32($body)
            }
            DType::Float32 => {
                type $ty = f32;
                Buffer::Float32($body)
            }
            DType::Float64 => {
                type $ty = f64;
                Buffer::Float64($body)
            }
        }
    };
}

impl Buffer {
    /// A buffer of `len` zeros.
    pub fn zeros(dtype: DType, len: usize) -> Self {
        for_dtype!(dtype, T => vec![T::default(); len])
    }

    /// A buffer of `len` copies of `value` converted into `dtype`.
    pub fn filled(dtype: DType, value: f64, len: usize) -> Self {
        for_dtype!(dtype, T => vec![T::from_f64(value); len])
    }

    /// Collects numbers into a buffer of `dtype`, converting each one.
    pub fn from_values(dtype: DType, values: impl IntoIterator<Item = f64>) -> Self {
        let values = values.into_iter();
        for_dtype!(dtype, T => values.map(T::from_f64).collect())
    }

    pub fn dtype(&self) -> DType {
        match self {
            Buffer::Int8(_) => DType::Int8,
            Buffer::Uint8(_) => DType::Uint8,
            Buffer::Int16(_) => DType::Int16,
            Buffer::Uint16(_) => DType::Uint16,
            Buffer::Int32(_) => DType::Int32,
            Buffer::Uint32(_) => DType::Uint32,
            Buffer::Float32(_) => DType::Float32,
            Buffer::Float64(_) => DType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        with_vec!(self, vec => vec.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the element at a physical position.
    ///
    /// Panics if `offset` is outside the buffer: callers resolve offsets from view metadata,
    /// which keeps every reachable offset in range.
    pub fn get(&self, offset: usize) -> f64 {
        with_vec!(self, vec => vec[offset].to_f64())
    }

    /// Writes the element at a physical position, converting `value` into the buffer kind.
    pub fn set(&mut self, offset: usize, value: f64) {
        with_vec!(self, vec => vec[offset] = Element::from_f64(value))
    }

    /// Copy of this buffer converted element-wise into `dtype`.
    pub fn cast(&self, dtype: DType) -> Self {
        if dtype == self.dtype() {
            return self.clone();
        }
        Self::from_values(dtype, (0..self.len()).map(|offset| self.get(offset)))
    }

    /// Typed view of the storage when `T` matches the buffer kind.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        with_vec!(self, vec => (vec as &dyn std::any::Any).downcast_ref::<Vec<T>>().map(Vec::as_slice))
    }
}
