//! Typed multi-dimensional arrays
//!
//! [`NdArray`] owns a flat element buffer plus a shape and supports
//! numpy-style indexing: exact (possibly negative) indices, and partial or
//! wildcard index vectors that select a sub-array.

use super::DType;
use crate::error::{DecodeError, IndexError};
use half::f16;

/// Flat element storage, one variant per dtype.
///
/// The buffer variant is the single source of truth for an array's dtype,
/// so buffer and dtype can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F16(Vec<f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Data {
    /// Dtype corresponding to the buffer variant
    pub fn dtype(&self) -> DType {
        match self {
            Data::U8(_) => DType::U8,
            Data::I8(_) => DType::I8,
            Data::U16(_) => DType::U16,
            Data::I16(_) => DType::I16,
            Data::U32(_) => DType::U32,
            Data::I32(_) => DType::I32,
            Data::U64(_) => DType::U64,
            Data::I64(_) => DType::I64,
            Data::F16(_) => DType::F16,
            Data::F32(_) => DType::F32,
            Data::F64(_) => DType::F64,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Data::U8(v) => v.len(),
            Data::I8(v) => v.len(),
            Data::U16(v) => v.len(),
            Data::I16(v) => v.len(),
            Data::U32(v) => v.len(),
            Data::I32(v) => v.len(),
            Data::U64(v) => v.len(),
            Data::I64(v) => v.len(),
            Data::F16(v) => v.len(),
            Data::F32(v) => v.len(),
            Data::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty buffer of the given dtype with reserved capacity
    pub fn with_capacity(dtype: DType, cap: usize) -> Data {
        match dtype {
            DType::U8 => Data::U8(Vec::with_capacity(cap)),
            DType::I8 => Data::I8(Vec::with_capacity(cap)),
            DType::U16 => Data::U16(Vec::with_capacity(cap)),
            DType::I16 => Data::I16(Vec::with_capacity(cap)),
            DType::U32 => Data::U32(Vec::with_capacity(cap)),
            DType::I32 => Data::I32(Vec::with_capacity(cap)),
            DType::U64 => Data::U64(Vec::with_capacity(cap)),
            DType::I64 => Data::I64(Vec::with_capacity(cap)),
            DType::F16 => Data::F16(Vec::with_capacity(cap)),
            DType::F32 => Data::F32(Vec::with_capacity(cap)),
            DType::F64 => Data::F64(Vec::with_capacity(cap)),
        }
    }

    /// Element at flat position `i`. Panics if out of range; callers index
    /// through validated selections only.
    pub(crate) fn element(&self, i: usize) -> Element {
        match self {
            Data::U8(v) => Element::U8(v[i]),
            Data::I8(v) => Element::I8(v[i]),
            Data::U16(v) => Element::U16(v[i]),
            Data::I16(v) => Element::I16(v[i]),
            Data::U32(v) => Element::U32(v[i]),
            Data::I32(v) => Element::I32(v[i]),
            Data::U64(v) => Element::U64(v[i]),
            Data::I64(v) => Element::I64(v[i]),
            Data::F16(v) => Element::F16(v[i]),
            Data::F32(v) => Element::F32(v[i]),
            Data::F64(v) => Element::F64(v[i]),
        }
    }

    /// Store `value` at flat position `i`, coercing numerically into the
    /// buffer's element type (typed-array store semantics).
    pub(crate) fn store(&mut self, i: usize, value: &Element) {
        match self {
            Data::U8(v) => v[i] = value.as_i128() as u8,
            Data::I8(v) => v[i] = value.as_i128() as i8,
            Data::U16(v) => v[i] = value.as_i128() as u16,
            Data::I16(v) => v[i] = value.as_i128() as i16,
            Data::U32(v) => v[i] = value.as_i128() as u32,
            Data::I32(v) => v[i] = value.as_i128() as i32,
            Data::U64(v) => v[i] = value.as_i128() as u64,
            Data::I64(v) => v[i] = value.as_i128() as i64,
            Data::F16(v) => v[i] = f16::from_f64(value.as_f64()),
            Data::F32(v) => v[i] = value.as_f64() as f32,
            Data::F64(v) => v[i] = value.as_f64(),
        }
    }

    /// Append `value`, coercing as [`store`](Self::store) does.
    pub(crate) fn push(&mut self, value: &Element) {
        match self {
            Data::U8(v) => v.push(value.as_i128() as u8),
            Data::I8(v) => v.push(value.as_i128() as i8),
            Data::U16(v) => v.push(value.as_i128() as u16),
            Data::I16(v) => v.push(value.as_i128() as i16),
            Data::U32(v) => v.push(value.as_i128() as u32),
            Data::I32(v) => v.push(value.as_i128() as i32),
            Data::U64(v) => v.push(value.as_i128() as u64),
            Data::I64(v) => v.push(value.as_i128() as i64),
            Data::F16(v) => v.push(f16::from_f64(value.as_f64())),
            Data::F32(v) => v.push(value.as_f64() as f32),
            Data::F64(v) => v.push(value.as_f64()),
        }
    }

    /// Widen an `F16` buffer to `F32` elementwise; other variants pass
    /// through unchanged. Pure and total over its input.
    pub fn widen_f16(self) -> Data {
        match self {
            Data::F16(v) => Data::F32(v.into_iter().map(f16::to_f32).collect()),
            other => other,
        }
    }

    /// Borrow as `&[u8]` if that is the element type
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Data::U8(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[i8]` if that is the element type
    pub fn as_i8(&self) -> Option<&[i8]> {
        match self {
            Data::I8(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[u16]` if that is the element type
    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            Data::U16(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[i16]` if that is the element type
    pub fn as_i16(&self) -> Option<&[i16]> {
        match self {
            Data::I16(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[u32]` if that is the element type
    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            Data::U32(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[i32]` if that is the element type
    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            Data::I32(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[u64]` if that is the element type
    pub fn as_u64(&self) -> Option<&[u64]> {
        match self {
            Data::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[i64]` if that is the element type
    pub fn as_i64(&self) -> Option<&[i64]> {
        match self {
            Data::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[f16]` if that is the element type
    pub fn as_f16(&self) -> Option<&[f16]> {
        match self {
            Data::F16(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[f32]` if that is the element type
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Data::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `&[f64]` if that is the element type
    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Data::F64(v) => Some(v),
            _ => None,
        }
    }
}

/// A single element read out of an array
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F16(f16),
    F32(f32),
    F64(f64),
}

impl Element {
    /// Numeric value as f64 (lossy for large 64-bit integers)
    pub fn as_f64(&self) -> f64 {
        match *self {
            Element::U8(v) => v as f64,
            Element::I8(v) => v as f64,
            Element::U16(v) => v as f64,
            Element::I16(v) => v as f64,
            Element::U32(v) => v as f64,
            Element::I32(v) => v as f64,
            Element::U64(v) => v as f64,
            Element::I64(v) => v as f64,
            Element::F16(v) => v.to_f64(),
            Element::F32(v) => v as f64,
            Element::F64(v) => v,
        }
    }

    /// Numeric value as i128 (floats truncated toward zero)
    pub(crate) fn as_i128(&self) -> i128 {
        match *self {
            Element::U8(v) => v as i128,
            Element::I8(v) => v as i128,
            Element::U16(v) => v as i128,
            Element::I16(v) => v as i128,
            Element::U32(v) => v as i128,
            Element::I32(v) => v as i128,
            Element::U64(v) => v as i128,
            Element::I64(v) => v as i128,
            Element::F16(v) => v.to_f64() as i128,
            Element::F32(v) => v as i128,
            Element::F64(v) => v as i128,
        }
    }
}

// Convenience From impls for Element
impl From<u8> for Element {
    fn from(v: u8) -> Self {
        Element::U8(v)
    }
}

impl From<i8> for Element {
    fn from(v: i8) -> Self {
        Element::I8(v)
    }
}

impl From<u16> for Element {
    fn from(v: u16) -> Self {
        Element::U16(v)
    }
}

impl From<i16> for Element {
    fn from(v: i16) -> Self {
        Element::I16(v)
    }
}

impl From<u32> for Element {
    fn from(v: u32) -> Self {
        Element::U32(v)
    }
}

impl From<i32> for Element {
    fn from(v: i32) -> Self {
        Element::I32(v)
    }
}

impl From<u64> for Element {
    fn from(v: u64) -> Self {
        Element::U64(v)
    }
}

impl From<i64> for Element {
    fn from(v: i64) -> Self {
        Element::I64(v)
    }
}

impl From<f16> for Element {
    fn from(v: f16) -> Self {
        Element::F16(v)
    }
}

impl From<f32> for Element {
    fn from(v: f32) -> Self {
        Element::F32(v)
    }
}

impl From<f64> for Element {
    fn from(v: f64) -> Self {
        Element::F64(v)
    }
}

/// One entry of an index vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    /// Exact position along the axis; negative counts from the end
    At(i64),
    /// Wildcard: every position along the axis
    All,
}

impl From<i64> for Index {
    fn from(v: i64) -> Self {
        Index::At(v)
    }
}

/// Result of [`NdArray::get`]
#[derive(Debug, Clone, PartialEq)]
pub enum Sliced {
    /// An exact index selected a single element
    One(Element),
    /// A wildcard or partial index selected a sub-array
    Many(NdArray),
}

impl Sliced {
    /// The single element, if the selection was exact
    pub fn scalar(self) -> Option<Element> {
        match self {
            Sliced::One(el) => Some(el),
            Sliced::Many(_) => None,
        }
    }

    /// The sub-array, if the selection was not exact
    pub fn array(self) -> Option<NdArray> {
        match self {
            Sliced::One(_) => None,
            Sliced::Many(arr) => Some(arr),
        }
    }
}

/// Value assigned by [`NdArray::set`]
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    /// Broadcast one element to every selected position
    Scalar(Element),
    /// Positional values; length must equal the selected count
    Values(Vec<Element>),
}

impl From<Element> for Fill {
    fn from(el: Element) -> Self {
        Fill::Scalar(el)
    }
}

impl From<Vec<Element>> for Fill {
    fn from(vs: Vec<Element>) -> Self {
        Fill::Values(vs)
    }
}

/// Flat positions selected by an index vector
enum Selection {
    One(usize),
    Many { flat: Vec<usize>, shape: Vec<usize> },
}

/// Shaped typed array
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    data: Data,
    shape: Vec<usize>,
}

impl NdArray {
    /// Build from a flat buffer and shape.
    ///
    /// The element count must equal the product of the shape (1 for a
    /// zero-rank shape); construction is all-or-nothing.
    pub fn new(data: Data, shape: Vec<usize>) -> Result<Self, DecodeError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(DecodeError::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(NdArray { data, shape })
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total element count
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Flat elements converted to f64, in row-major order
    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.data.len())
            .map(|i| self.data.element(i).as_f64())
            .collect()
    }

    /// Element at an exact index vector: exactly one entry per axis,
    /// negatives counting from the end of the axis. Use [`get`](Self::get)
    /// for partial or wildcard selection.
    pub fn at(&self, index: &[i64]) -> Result<Element, IndexError> {
        if index.len() != self.shape.len() {
            return Err(IndexError::TooManyIndices {
                given: index.len(),
                rank: self.shape.len(),
            });
        }
        let mut coords = Vec::with_capacity(index.len());
        for (axis, &i) in index.iter().enumerate() {
            coords.push(self.normalize(i, axis)?);
        }
        Ok(self.data.element(self.flat_offset(&coords)))
    }

    /// Select by index vector.
    ///
    /// An exact vector (length == rank, no wildcards) yields the scalar
    /// element; any wildcard or partial vector yields a new array over a
    /// freshly copied buffer (no aliasing with the parent). Missing trailing
    /// entries are implicit wildcards.
    pub fn get(&self, index: &[Index]) -> Result<Sliced, IndexError> {
        match self.select(index)? {
            Selection::One(flat) => Ok(Sliced::One(self.data.element(flat))),
            Selection::Many { flat, shape } => {
                let mut data = Data::with_capacity(self.dtype(), flat.len());
                for &i in &flat {
                    data.push(&self.data.element(i));
                }
                Ok(Sliced::Many(NdArray { data, shape }))
            }
        }
    }

    /// Assign through an index vector.
    ///
    /// An exact vector assigns one element. A wildcard vector broadcasts a
    /// scalar to every selected position, or assigns a value sequence
    /// positionally in the same order [`get`](Self::get) enumerates them.
    pub fn set(&mut self, index: &[Index], fill: impl Into<Fill>) -> Result<(), IndexError> {
        let fill = fill.into();
        match self.select(index)? {
            Selection::One(flat) => match fill {
                Fill::Scalar(el) => {
                    self.data.store(flat, &el);
                    Ok(())
                }
                Fill::Values(vs) if vs.len() == 1 => {
                    self.data.store(flat, &vs[0]);
                    Ok(())
                }
                Fill::Values(vs) => Err(IndexError::BroadcastMismatch {
                    expected: 1,
                    actual: vs.len(),
                }),
            },
            Selection::Many { flat, .. } => match fill {
                Fill::Scalar(el) => {
                    for &i in &flat {
                        self.data.store(i, &el);
                    }
                    Ok(())
                }
                Fill::Values(vs) => {
                    if vs.len() != flat.len() {
                        return Err(IndexError::BroadcastMismatch {
                            expected: flat.len(),
                            actual: vs.len(),
                        });
                    }
                    for (&i, v) in flat.iter().zip(&vs) {
                        self.data.store(i, v);
                    }
                    Ok(())
                }
            },
        }
    }

    /// Normalize a possibly negative component against an axis extent
    fn normalize(&self, index: i64, axis: usize) -> Result<usize, IndexError> {
        let extent = self.shape[axis];
        let adjusted = if index < 0 {
            index + extent as i64
        } else {
            index
        };
        if adjusted < 0 || adjusted as usize >= extent {
            return Err(IndexError::IndexOutOfBounds {
                index,
                axis,
                extent,
            });
        }
        Ok(adjusted as usize)
    }

    /// Row-major flat offset of an in-range coordinate vector
    fn flat_offset(&self, coords: &[usize]) -> usize {
        let mut offset = 0;
        let mut stride = 1;
        for axis in (0..self.shape.len()).rev() {
            offset += coords[axis] * stride;
            stride *= self.shape[axis];
        }
        offset
    }

    fn select(&self, index: &[Index]) -> Result<Selection, IndexError> {
        let rank = self.shape.len();
        let given = index
            .iter()
            .filter(|ix| matches!(ix, Index::At(_)))
            .count();
        if given > rank {
            return Err(IndexError::TooManyIndices { given, rank });
        }

        // Exact index: no wildcards, one entry per axis.
        if index.len() == rank && given == rank {
            let mut coords = Vec::with_capacity(rank);
            for (axis, ix) in index.iter().enumerate() {
                if let Index::At(i) = ix {
                    coords.push(self.normalize(*i, axis)?);
                }
            }
            return Ok(Selection::One(self.flat_offset(&coords)));
        }

        // Wildcard/partial: pad with wildcards up to rank, fix the rest.
        let mut fixed: Vec<Option<usize>> = Vec::with_capacity(rank);
        for axis in 0..rank {
            match index.get(axis) {
                Some(Index::At(i)) => fixed.push(Some(self.normalize(*i, axis)?)),
                Some(Index::All) | None => fixed.push(None),
            }
        }
        let iter_axes: Vec<usize> = (0..rank).filter(|&a| fixed[a].is_none()).collect();
        let shape: Vec<usize> = iter_axes.iter().map(|&a| self.shape[a]).collect();
        let count: usize = shape.iter().product();

        if count == 0 {
            return Ok(Selection::Many {
                flat: Vec::new(),
                shape,
            });
        }

        // Iterative odometer over the iterated axes, last axis fastest;
        // enumeration order matches nested loops in axis order.
        let mut coords: Vec<usize> = fixed.iter().map(|o| o.unwrap_or(0)).collect();
        let mut flat = Vec::with_capacity(count);
        loop {
            flat.push(self.flat_offset(&coords));
            let mut rolled_over = true;
            for &axis in iter_axes.iter().rev() {
                coords[axis] += 1;
                if coords[axis] < self.shape[axis] {
                    rolled_over = false;
                    break;
                }
                coords[axis] = 0;
            }
            if rolled_over {
                break;
            }
        }
        Ok(Selection::Many { flat, shape })
    }
}
