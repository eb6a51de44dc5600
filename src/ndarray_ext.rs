//! ndarray integration
//!
//! Conversions between zanj's [`NdArray`] and ndarray's `ArrayD`.
//!
//! Enable with the `ndarray` feature flag.

use crate::types::{DType, Data, NdArray};
use half::f16;
use ndarray::{ArrayD, IxDyn};
use thiserror::Error;

/// Error type for ndarray conversions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NdarrayError {
    /// DType mismatch between expected and actual
    #[error("dtype mismatch: expected {expected:?}, got {actual:?}")]
    DTypeMismatch { expected: DType, actual: DType },
    /// Shape doesn't match data length
    #[error("shape {shape:?} doesn't match data length {data_len}")]
    ShapeMismatch { shape: Vec<usize>, data_len: usize },
    /// Array is not in standard (contiguous row-major) layout
    #[error("array is not contiguous; call .as_standard_layout().into_owned() first")]
    NotContiguous,
}

/// Trait for element types that map onto a [`Data`] buffer variant
pub trait ArrayType: Sized + Clone + 'static {
    const DTYPE: DType;

    fn from_data(data: &Data) -> Option<&[Self]>;
    fn into_data(vec: Vec<Self>) -> Data;
}

macro_rules! impl_array_type {
    ($ty:ty, $dtype:expr, $variant:ident, $as:ident) => {
        impl ArrayType for $ty {
            const DTYPE: DType = $dtype;

            fn from_data(data: &Data) -> Option<&[Self]> {
                data.$as()
            }

            fn into_data(vec: Vec<Self>) -> Data {
                Data::$variant(vec)
            }
        }
    };
}

impl_array_type!(u8, DType::U8, U8, as_u8);
impl_array_type!(i8, DType::I8, I8, as_i8);
impl_array_type!(u16, DType::U16, U16, as_u16);
impl_array_type!(i16, DType::I16, I16, as_i16);
impl_array_type!(u32, DType::U32, U32, as_u32);
impl_array_type!(i32, DType::I32, I32, as_i32);
impl_array_type!(u64, DType::U64, U64, as_u64);
impl_array_type!(i64, DType::I64, I64, as_i64);
impl_array_type!(f16, DType::F16, F16, as_f16);
impl_array_type!(f32, DType::F32, F32, as_f32);
impl_array_type!(f64, DType::F64, F64, as_f64);

impl NdArray {
    /// Create from an ndarray `ArrayD`.
    ///
    /// Takes ownership of a contiguous array. Returns an error if not
    /// contiguous; use `.as_standard_layout().into_owned()` first.
    pub fn from_ndarray<T: ArrayType>(arr: ArrayD<T>) -> Result<Self, NdarrayError> {
        if !arr.is_standard_layout() {
            return Err(NdarrayError::NotContiguous);
        }
        let shape = arr.shape().to_vec();
        let (vec, offset) = arr.into_raw_vec_and_offset();
        // offset must be 0 (or absent, for empty arrays) so the vec starts
        // at the allocation start
        if !matches!(offset, None | Some(0)) {
            return Err(NdarrayError::NotContiguous);
        }
        let data_len = vec.len();
        NdArray::new(T::into_data(vec), shape.clone())
            .map_err(|_| NdarrayError::ShapeMismatch { shape, data_len })
    }

    /// Convert to an ndarray `ArrayD`
    pub fn to_ndarray<T: ArrayType>(&self) -> Result<ArrayD<T>, NdarrayError> {
        let slice = T::from_data(self.data()).ok_or(NdarrayError::DTypeMismatch {
            expected: T::DTYPE,
            actual: self.dtype(),
        })?;
        ArrayD::from_shape_vec(IxDyn(self.shape()), slice.to_vec()).map_err(|_| {
            NdarrayError::ShapeMismatch {
                shape: self.shape().to_vec(),
                data_len: slice.len(),
            }
        })
    }
}
