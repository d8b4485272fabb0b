// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! In-memory blocks of data fetched from an array or a table column.

use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use crate::{
    c32, c64,
    element::{Element, ElementType, TypedVec},
    index::{flat_index, supplied_indices, ArrayOrder},
    io::error::DalError,
    num_complex::Complex,
};

/// A borrowed, typed view of a single element of a [`DataBlock`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementRef<'a> {
    Char(&'a i8),
    String(&'a str),
    Bool(&'a bool),
    Short(&'a i16),
    Int(&'a i32),
    UInt(&'a u32),
    Long(&'a i64),
    Float(&'a f32),
    Double(&'a f64),
    Complex(&'a c32),
    DComplex(&'a c64),
    ComplexChar(&'a Complex<i8>),
    ComplexShort(&'a Complex<i16>),
}

impl ElementRef<'_> {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementRef::Char(_) => ElementType::Char,
            ElementRef::String(_) => ElementType::String,
            ElementRef::Bool(_) => ElementType::Bool,
            ElementRef::Short(_) => ElementType::Short,
            ElementRef::Int(_) => ElementType::Int,
            ElementRef::UInt(_) => ElementType::UInt,
            ElementRef::Long(_) => ElementType::Long,
            ElementRef::Float(_) => ElementType::Float,
            ElementRef::Double(_) => ElementType::Double,
            ElementRef::Complex(_) => ElementType::Complex,
            ElementRef::DComplex(_) => ElementType::DComplex,
            ElementRef::ComplexChar(_) => ElementType::ComplexChar,
            ElementRef::ComplexShort(_) => ElementType::ComplexShort,
        }
    }

    /// The value widened to `f64`, for the real numeric types.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ElementRef::Char(&v) => Some(v as f64),
            ElementRef::Short(&v) => Some(v as f64),
            ElementRef::Int(&v) => Some(v as f64),
            ElementRef::UInt(&v) => Some(v as f64),
            ElementRef::Long(&v) => Some(v as f64),
            ElementRef::Float(&v) => Some(v as f64),
            ElementRef::Double(&v) => Some(v),
            _ => None,
        }
    }

    /// The value widened to `c64`, for the complex types.
    pub fn as_c64(&self) -> Option<c64> {
        match *self {
            ElementRef::Complex(v) => Some(c64::new(v.re as f64, v.im as f64)),
            ElementRef::DComplex(&v) => Some(v),
            ElementRef::ComplexChar(v) => Some(c64::new(v.re as f64, v.im as f64)),
            ElementRef::ComplexShort(v) => Some(c64::new(v.re as f64, v.im as f64)),
            _ => None,
        }
    }
}

/// A materialised subset of an array or column.
///
/// The block owns its buffer. Its `order` is fixed when it is fetched, `"c"` for HDF5 and
/// in-memory storage and `"fortran"` for CASA tables, and governs how multi-indices are
/// resolved by [`DataBlock::at`] and [`DataBlock::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    data: TypedVec,
    shape: Vec<usize>,
    order: ArrayOrder,
}

impl DataBlock {
    /// Wrap a buffer. The number of elements must equal the product of `shape`.
    pub fn new(data: TypedVec, shape: Vec<usize>, order: ArrayOrder) -> Result<Self, DalError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(DalError::BadArrayShape {
                argument: "data".to_string(),
                function: "DataBlock::new".to_string(),
                expected: format!("{} elements for shape {:?}", expected, shape),
                received: format!("{} elements", data.len()),
            });
        }
        Ok(Self { data, shape, order })
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn order(&self) -> ArrayOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &TypedVec {
        &self.data
    }

    pub fn into_data(self) -> TypedVec {
        self.data
    }

    fn offset(&self, indices: &[usize]) -> Result<usize, DalError> {
        Ok(flat_index(&self.shape, self.order, indices)?)
    }

    /// Resolve up to three (or more) logical indices, with negative values meaning "not
    /// supplied", to the element they address. The reference borrows the block.
    pub fn at(&self, raw_indices: &[i64]) -> Result<ElementRef<'_>, DalError> {
        let i = self.offset(&supplied_indices(raw_indices))?;
        Ok(self.element(i))
    }

    /// The element at storage offset `i`.
    fn element(&self, i: usize) -> ElementRef<'_> {
        match &self.data {
            TypedVec::Char(v) => ElementRef::Char(&v[i]),
            TypedVec::String(v) => ElementRef::String(v[i].as_str()),
            TypedVec::Bool(v) => ElementRef::Bool(&v[i]),
            TypedVec::Short(v) => ElementRef::Short(&v[i]),
            TypedVec::Int(v) => ElementRef::Int(&v[i]),
            TypedVec::UInt(v) => ElementRef::UInt(&v[i]),
            TypedVec::Long(v) => ElementRef::Long(&v[i]),
            TypedVec::Float(v) => ElementRef::Float(&v[i]),
            TypedVec::Double(v) => ElementRef::Double(&v[i]),
            TypedVec::Complex(v) => ElementRef::Complex(&v[i]),
            TypedVec::DComplex(v) => ElementRef::DComplex(&v[i]),
            TypedVec::ComplexChar(v) => ElementRef::ComplexChar(&v[i]),
            TypedVec::ComplexShort(v) => ElementRef::ComplexShort(&v[i]),
        }
    }

    /// The contents as a slice of `T`, in storage order.
    pub fn as_slice<T: Element>(&self) -> Result<&[T], DalError> {
        T::slice(&self.data)
            .ok_or_else(|| DalError::type_mismatch("block", T::TYPE, self.element_type()))
    }

    /// The element at `indices`.
    pub fn get<T: Element>(&self, indices: &[usize]) -> Result<&T, DalError> {
        let i = self.offset(indices)?;
        Ok(&self.as_slice::<T>()?[i])
    }

    /// Copy the block into an [`ArrayD`] whose memory layout follows the block's order, so
    /// that `array[[i, j]]` addresses the same element as `block.get(&[i, j])`.
    pub fn to_array<T: Element>(&self) -> Result<ArrayD<T>, DalError> {
        let values = self.as_slice::<T>()?.to_vec();
        let shape = IxDyn(&self.shape).set_f(self.order == ArrayOrder::ColumnMajor);
        ArrayD::from_shape_vec(shape, values).map_err(|e| DalError::BadArrayShape {
            argument: "shape".to_string(),
            function: "DataBlock::to_array".to_string(),
            expected: format!("{:?}", self.shape),
            received: e.to_string(),
        })
    }
}

#[cfg(any(test, feature = "approx"))]
impl approx::AbsDiffEq for DataBlock {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    /// Blocks are close when they agree on type, shape and order and every numeric element is
    /// within `epsilon`. Strings and booleans must match exactly.
    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        if self.element_type() != other.element_type()
            || self.shape != other.shape
            || self.order != other.order
        {
            return false;
        }
        (0..self.len()).all(|i| {
            let (a, b) = (self.element(i), other.element(i));
            match (a.as_f64(), b.as_f64(), a.as_c64(), b.as_c64()) {
                (Some(x), Some(y), _, _) => approx::AbsDiffEq::abs_diff_eq(&x, &y, epsilon),
                (_, _, Some(x), Some(y)) => approx::AbsDiffEq::abs_diff_eq(&x, &y, epsilon),
                _ => a == b,
            }
        })
    }
}
