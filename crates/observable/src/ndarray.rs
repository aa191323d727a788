//! Dense numeric arrays: a shape, an element type and raw little-endian bytes.
//!
//! The array is deliberately untyped at the Rust level; consumers reinterpret
//! the byte buffer according to [`Dtype`]. The serialization engine persists
//! arrays as `{shape, dtype, data}` with base64-encoded bytes and rebuilds
//! them via [`NdArray::from_bytes`].

use std::any::Any;

use strum_macros::{EnumString, IntoStaticStr};
use thiserror::Error;

use crate::value::Value;

/// Element type of a dense array. The string form (`"u8"`, `"f32"`, ...) is
/// what ends up in persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Dtype {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl Dtype {
    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        match self {
            Dtype::U8 | Dtype::I8 => 1,
            Dtype::U16 | Dtype::I16 => 2,
            Dtype::U32 | Dtype::I32 | Dtype::F32 => 4,
            Dtype::U64 | Dtype::I64 | Dtype::F64 => 8,
        }
    }

    /// Persisted name of the element type.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArrayError {
    #[error("buffer of {got} bytes does not match shape {shape:?} of {dtype:?} ({want} bytes)")]
    SizeMismatch {
        shape: Vec<usize>,
        dtype: Dtype,
        want: usize,
        got: usize,
    },
}

/// A dense numeric array.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    dtype: Dtype,
    data: Vec<u8>,
}

impl NdArray {
    /// Build an array from raw bytes, verifying that the buffer length
    /// matches the shape and element type.
    pub fn from_bytes(shape: Vec<usize>, dtype: Dtype, data: Vec<u8>) -> Result<Self, ArrayError> {
        let want = shape.iter().product::<usize>() * dtype.element_size();
        if want != data.len() {
            return Err(ArrayError::SizeMismatch {
                shape,
                dtype,
                want,
                got: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Build a `u8` array from elements.
    pub fn of_u8(shape: Vec<usize>, elements: &[u8]) -> Result<Self, ArrayError> {
        Self::from_bytes(shape, Dtype::U8, elements.to_vec())
    }

    /// Build an `f32` array from elements (little-endian byte order).
    pub fn of_f32(shape: Vec<usize>, elements: &[f32]) -> Result<Self, ArrayError> {
        let data = elements.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_bytes(shape, Dtype::F32, data)
    }

    /// Reinterpret the same buffer under a new shape.
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self, ArrayError> {
        Self::from_bytes(shape, self.dtype, self.data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Value for NdArray {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        other.as_any().downcast_ref::<NdArray>().is_some_and(|o| o == self)
    }

    fn as_array(&self) -> Option<&NdArray> {
        Some(self)
    }
}
