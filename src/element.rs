// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Element types and type-erased element buffers.
//!
//! Every array, attribute and table field has exactly one [`ElementType`], fixed when it is
//! created. Data moves between the storage backends and the typed API as a [`TypedVec`], and
//! the [`Element`] trait connects a Rust scalar type to its tag.

use std::fmt::{self, Debug, Display};

use crate::{c32, c64, num_complex::Complex};

/// The closed set of element types understood by the access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    Char,
    String,
    Bool,
    Short,
    Int,
    UInt,
    Long,
    Float,
    Double,
    /// A pair of 32-bit floats.
    Complex,
    /// A pair of 64-bit floats.
    DComplex,
    /// A pair of 8-bit integers.
    ComplexChar,
    /// A pair of 16-bit integers.
    ComplexShort,
}

impl ElementType {
    pub const ALL: [ElementType; 13] = [
        ElementType::Char,
        ElementType::String,
        ElementType::Bool,
        ElementType::Short,
        ElementType::Int,
        ElementType::UInt,
        ElementType::Long,
        ElementType::Float,
        ElementType::Double,
        ElementType::Complex,
        ElementType::DComplex,
        ElementType::ComplexChar,
        ElementType::ComplexShort,
    ];

    /// The canonical upper case tag, e.g. `"SHORT"`.
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Char => "CHAR",
            ElementType::String => "STRING",
            ElementType::Bool => "BOOL",
            ElementType::Short => "SHORT",
            ElementType::Int => "INT",
            ElementType::UInt => "UINT",
            ElementType::Long => "LONG",
            ElementType::Float => "FLOAT",
            ElementType::Double => "DOUBLE",
            ElementType::Complex => "COMPLEX",
            ElementType::DComplex => "DCOMPLEX",
            ElementType::ComplexChar => "COMPLEX_CHAR",
            ElementType::ComplexShort => "COMPLEX_SHORT",
        }
    }

    /// Parse a canonical tag. Matching ignores case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn is_complex(self) -> bool {
        matches!(
            self,
            ElementType::Complex
                | ElementType::DComplex
                | ElementType::ComplexChar
                | ElementType::ComplexShort
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ElementType::Char
                | ElementType::Short
                | ElementType::Int
                | ElementType::UInt
                | ElementType::Long
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, ElementType::Float | ElementType::Double)
    }

    /// Size in bytes of one element in its native in-memory layout. `None` for strings, which
    /// are variable length.
    pub fn byte_size(self) -> Option<usize> {
        match self {
            ElementType::String => None,
            ElementType::Char | ElementType::Bool => Some(1),
            ElementType::Short | ElementType::ComplexChar => Some(2),
            ElementType::Int | ElementType::UInt | ElementType::Float | ElementType::ComplexShort => {
                Some(4)
            }
            ElementType::Long | ElementType::Double | ElementType::Complex => Some(8),
            ElementType::DComplex => Some(16),
        }
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A homogeneous buffer of elements of one [`ElementType`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypedVec {
    Char(Vec<i8>),
    String(Vec<String>),
    Bool(Vec<bool>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    UInt(Vec<u32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Complex(Vec<c32>),
    DComplex(Vec<c64>),
    ComplexChar(Vec<Complex<i8>>),
    ComplexShort(Vec<Complex<i16>>),
}

/// Evaluate `$body` with `$v` bound to the inner `Vec` of a [`TypedVec`].
macro_rules! with_vec {
    ($tv:expr, $v:ident => $body:expr) => {
        match $tv {
            TypedVec::Char($v) => $body,
            TypedVec::String($v) => $body,
            TypedVec::Bool($v) => $body,
            TypedVec::Short($v) => $body,
            TypedVec::Int($v) => $body,
            TypedVec::UInt($v) => $body,
            TypedVec::Long($v) => $body,
            TypedVec::Float($v) => $body,
            TypedVec::Double($v) => $body,
            TypedVec::Complex($v) => $body,
            TypedVec::DComplex($v) => $body,
            TypedVec::ComplexChar($v) => $body,
            TypedVec::ComplexShort($v) => $body,
        }
    };
}

/// Like [`with_vec`], but re-wraps the result in the same variant.
macro_rules! map_vec {
    ($tv:expr, $v:ident => $body:expr) => {
        match $tv {
            TypedVec::Char($v) => TypedVec::Char($body),
            TypedVec::String($v) => TypedVec::String($body),
            TypedVec::Bool($v) => TypedVec::Bool($body),
            TypedVec::Short($v) => TypedVec::Short($body),
            TypedVec::Int($v) => TypedVec::Int($body),
            TypedVec::UInt($v) => TypedVec::UInt($body),
            TypedVec::Long($v) => TypedVec::Long($body),
            TypedVec::Float($v) => TypedVec::Float($body),
            TypedVec::Double($v) => TypedVec::Double($body),
            TypedVec::Complex($v) => TypedVec::Complex($body),
            TypedVec::DComplex($v) => TypedVec::DComplex($body),
            TypedVec::ComplexChar($v) => TypedVec::ComplexChar($body),
            TypedVec::ComplexShort($v) => TypedVec::ComplexShort($body),
        }
    };
}

/// Apply `$body` to two buffers of the same variant, or evaluate `$mismatch`.
macro_rules! zip_vec {
    ($a:expr, $b:expr, ($x:ident, $y:ident) => $body:expr, _ => $mismatch:expr) => {
        match ($a, $b) {
            (TypedVec::Char($x), TypedVec::Char($y)) => $body,
            (TypedVec::String($x), TypedVec::String($y)) => $body,
            (TypedVec::Bool($x), TypedVec::Bool($y)) => $body,
            (TypedVec::Short($x), TypedVec::Short($y)) => $body,
            (TypedVec::Int($x), TypedVec::Int($y)) => $body,
            (TypedVec::UInt($x), TypedVec::UInt($y)) => $body,
            (TypedVec::Long($x), TypedVec::Long($y)) => $body,
            (TypedVec::Float($x), TypedVec::Float($y)) => $body,
            (TypedVec::Double($x), TypedVec::Double($y)) => $body,
            (TypedVec::Complex($x), TypedVec::Complex($y)) => $body,
            (TypedVec::DComplex($x), TypedVec::DComplex($y)) => $body,
            (TypedVec::ComplexChar($x), TypedVec::ComplexChar($y)) => $body,
            (TypedVec::ComplexShort($x), TypedVec::ComplexShort($y)) => $body,
            _ => $mismatch,
        }
    };
}

/// Evaluate `$body` with the type alias `$T` bound to the Rust type of an [`ElementType`].
macro_rules! dispatch_element {
    ($ty:expr, $T:ident => $body:expr) => {
        match $ty {
            $crate::element::ElementType::Char => {
                type $T = i8;
                $body
            }
            $crate::element::ElementType::String => {
                type $T = String;
                $body
            }
            $crate::element::ElementType::Bool => {
                type $T = bool;
                $body
            }
            $crate::element::ElementType::Short => {
                type $T = i16;
                $body
            }
            $crate::element::ElementType::Int => {
                type $T = i32;
                $body
            }
            $crate::element::ElementType::UInt => {
                type $T = u32;
                $body
            }
            $crate::element::ElementType::Long => {
                type $T = i64;
                $body
            }
            $crate::element::ElementType::Float => {
                type $T = f32;
                $body
            }
            $crate::element::ElementType::Double => {
                type $T = f64;
                $body
            }
            $crate::element::ElementType::Complex => {
                type $T = $crate::c32;
                $body
            }
            $crate::element::ElementType::DComplex => {
                type $T = $crate::c64;
                $body
            }
            $crate::element::ElementType::ComplexChar => {
                type $T = $crate::num_complex::Complex<i8>;
                $body
            }
            $crate::element::ElementType::ComplexShort => {
                type $T = $crate::num_complex::Complex<i16>;
                $body
            }
        }
    };
}
#[allow(unused_imports)]
pub(crate) use dispatch_element;

impl TypedVec {
    /// An empty buffer of the given type.
    pub fn empty(element_type: ElementType) -> Self {
        Self::filled(element_type, 0)
    }

    /// `len` default values (zero, `false` or the empty string) of the given type.
    pub fn filled(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::Char => TypedVec::Char(vec![0; len]),
            ElementType::String => TypedVec::String(vec![String::new(); len]),
            ElementType::Bool => TypedVec::Bool(vec![false; len]),
            ElementType::Short => TypedVec::Short(vec![0; len]),
            ElementType::Int => TypedVec::Int(vec![0; len]),
            ElementType::UInt => TypedVec::UInt(vec![0; len]),
            ElementType::Long => TypedVec::Long(vec![0; len]),
            ElementType::Float => TypedVec::Float(vec![0.0; len]),
            ElementType::Double => TypedVec::Double(vec![0.0; len]),
            ElementType::Complex => TypedVec::Complex(vec![c32::default(); len]),
            ElementType::DComplex => TypedVec::DComplex(vec![c64::default(); len]),
            ElementType::ComplexChar => TypedVec::ComplexChar(vec![Complex::default(); len]),
            ElementType::ComplexShort => TypedVec::ComplexShort(vec![Complex::default(); len]),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            TypedVec::Char(_) => ElementType::Char,
            TypedVec::String(_) => ElementType::String,
            TypedVec::Bool(_) => ElementType::Bool,
            TypedVec::Short(_) => ElementType::Short,
            TypedVec::Int(_) => ElementType::Int,
            TypedVec::UInt(_) => ElementType::UInt,
            TypedVec::Long(_) => ElementType::Long,
            TypedVec::Float(_) => ElementType::Float,
            TypedVec::Double(_) => ElementType::Double,
            TypedVec::Complex(_) => ElementType::Complex,
            TypedVec::DComplex(_) => ElementType::DComplex,
            TypedVec::ComplexChar(_) => ElementType::ComplexChar,
            TypedVec::ComplexShort(_) => ElementType::ComplexShort,
        }
    }

    pub fn len(&self) -> usize {
        with_vec!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the elements at `indices`, in that order, into a new buffer.
    ///
    /// Panics if an index is out of bounds; callers validate against the shape first.
    pub fn gather(&self, indices: &[usize]) -> TypedVec {
        map_vec!(self, v => indices.iter().map(|&i| v[i].clone()).collect())
    }

    /// A copy of the contiguous range `start..start + len`.
    pub fn slice(&self, start: usize, len: usize) -> TypedVec {
        map_vec!(self, v => v[start..start + len].to_vec())
    }

    /// Overwrite the elements at `indices` with the elements of `values`, in order.
    ///
    /// Returns the type of `values` as the error when it does not match this buffer.
    pub fn scatter(&mut self, indices: &[usize], values: &TypedVec) -> Result<(), ElementType> {
        zip_vec!(self, values, (dst, src) => {
            for (&i, value) in indices.iter().zip(src.iter()) {
                dst[i] = value.clone();
            }
            Ok(())
        }, _ => Err(values.element_type()))
    }

    /// Append all elements of `other`.
    pub fn extend_from(&mut self, other: &TypedVec) -> Result<(), ElementType> {
        zip_vec!(self, other, (dst, src) => {
            dst.extend_from_slice(src);
            Ok(())
        }, _ => Err(other.element_type()))
    }
}

impl Display for TypedVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.len() {
            0 => write!(f, "[]"),
            1 => with_vec!(self, v => write!(f, "{:?}", v[0])),
            _ => with_vec!(self, v => write!(f, "{:?}", v)),
        }
    }
}

/// A Rust scalar type that can be stored as an element.
pub trait Element: Clone + Debug + Default + PartialEq + 'static {
    /// The tag stored alongside data of this type.
    const TYPE: ElementType;

    /// Wrap a vector of this type into a [`TypedVec`].
    fn wrap(values: Vec<Self>) -> TypedVec;

    /// Borrow the contents if `values` holds this type.
    fn slice(values: &TypedVec) -> Option<&[Self]>;

    /// Take the contents if `values` holds this type, otherwise hand `values` back.
    fn unwrap(values: TypedVec) -> Result<Vec<Self>, TypedVec>;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const TYPE: ElementType = ElementType::$variant;

                fn wrap(values: Vec<Self>) -> TypedVec {
                    TypedVec::$variant(values)
                }

                fn slice(values: &TypedVec) -> Option<&[Self]> {
                    match values {
                        TypedVec::$variant(v) => Some(v.as_slice()),
                        _ => None,
                    }
                }

                fn unwrap(values: TypedVec) -> Result<Vec<Self>, TypedVec> {
                    match values {
                        TypedVec::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_element!(
    i8 => Char,
    String => String,
    bool => Bool,
    i16 => Short,
    i32 => Int,
    u32 => UInt,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    c32 => Complex,
    c64 => DComplex,
    Complex<i8> => ComplexChar,
    Complex<i16> => ComplexShort,
);

impl<T: Element> From<Vec<T>> for TypedVec {
    fn from(values: Vec<T>) -> Self {
        T::wrap(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for t in ElementType::ALL {
            assert_eq!(ElementType::from_name(t.name()), Some(t));
        }
        assert_eq!(ElementType::from_name("dcomplex"), Some(ElementType::DComplex));
        assert_eq!(ElementType::from_name("QUATERNION"), None);
    }

    #[test]
    fn test_int_and_uint_are_distinct() {
        assert_ne!(ElementType::Int, ElementType::UInt);
        assert_ne!(ElementType::Int.name(), ElementType::UInt.name());
    }

    #[test]
    fn test_filled_has_requested_type_and_len() {
        for t in ElementType::ALL {
            let v = TypedVec::filled(t, 4);
            assert_eq!(v.element_type(), t);
            assert_eq!(v.len(), 4);
        }
        assert!(TypedVec::empty(ElementType::Double).is_empty());
    }

    #[test]
    fn test_gather_scatter() {
        let src = TypedVec::from(vec![10_i16, 11, 12, 13]);
        assert_eq!(src.gather(&[3, 0]), TypedVec::from(vec![13_i16, 10]));

        let mut dst = TypedVec::filled(ElementType::Short, 4);
        dst.scatter(&[1, 2], &TypedVec::from(vec![5_i16, 6])).unwrap();
        assert_eq!(dst, TypedVec::from(vec![0_i16, 5, 6, 0]));

        let err = dst.scatter(&[0], &TypedVec::from(vec![1.0_f32]));
        assert_eq!(err, Err(ElementType::Float));
    }

    #[test]
    fn test_extend_from() {
        let mut a = TypedVec::from(vec![c32::new(1.0, 2.0)]);
        a.extend_from(&TypedVec::from(vec![c32::new(3.0, 4.0)]))
            .unwrap();
        assert_eq!(a.len(), 2);
        assert!(a.extend_from(&TypedVec::from(vec![1_i32])).is_err());
    }

    #[test]
    fn test_element_unwrap() {
        let v = TypedVec::from(vec!["a".to_string()]);
        assert_eq!(<String as Element>::slice(&v), Some(&["a".to_string()][..]));
        assert!(<i32 as Element>::unwrap(v).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(TypedVec::from(vec![1_i32]).to_string(), "1");
        assert_eq!(TypedVec::from(vec![1_i32, 2]).to_string(), "[1, 2]");
        assert_eq!(TypedVec::empty(ElementType::Int).to_string(), "[]");
    }
}
