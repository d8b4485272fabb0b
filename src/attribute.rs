// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Named attributes on files, groups, arrays and tables.
//!
//! An attribute is a scalar or a fixed length vector of one element type. Scalars are written
//! with cardinality 1, `Vec`s and slices with their length. Reading decodes by class: any
//! stored integer can be read as any integer type it fits in, and any stored float as `f32` or
//! `f64`; crossing classes is a [`DalError::TypeMismatch`], distinct from the
//! [`DalError::NotFound`] returned for an absent attribute.

use log::debug;
use num_traits::NumCast;

use crate::{
    element::{ElementType, TypedVec},
    io::{Backend, DalError},
};

/// A value that can be stored as an attribute.
pub trait IntoAttribute {
    fn into_attribute(self) -> TypedVec;
}

/// A value that can be decoded from a stored attribute.
pub trait FromAttribute: Sized {
    /// `name` is only used for error messages.
    fn from_attribute(name: &str, value: TypedVec) -> Result<Self, DalError>;
}

/// Cast every stored integer to `T`.
fn integers<T: NumCast>(name: &str, expected: ElementType, value: TypedVec) -> Result<Vec<T>, DalError> {
    let found = value.element_type();
    let cast: Option<Vec<T>> = match value {
        TypedVec::Char(v) => v.into_iter().map(|x| <T as NumCast>::from(x)).collect(),
        TypedVec::Short(v) => v.into_iter().map(|x| <T as NumCast>::from(x)).collect(),
        TypedVec::Int(v) => v.into_iter().map(|x| <T as NumCast>::from(x)).collect(),
        TypedVec::UInt(v) => v.into_iter().map(|x| <T as NumCast>::from(x)).collect(),
        TypedVec::Long(v) => v.into_iter().map(|x| <T as NumCast>::from(x)).collect(),
        _ => None,
    };
    cast.ok_or_else(|| DalError::type_mismatch(name, expected, found))
}

/// Cast every stored float to `T`.
fn floats<T: NumCast>(name: &str, expected: ElementType, value: TypedVec) -> Result<Vec<T>, DalError> {
    let found = value.element_type();
    let cast: Option<Vec<T>> = match value {
        TypedVec::Float(v) => v.into_iter().map(|x| <T as NumCast>::from(x)).collect(),
        TypedVec::Double(v) => v.into_iter().map(|x| <T as NumCast>::from(x)).collect(),
        _ => None,
    };
    cast.ok_or_else(|| DalError::type_mismatch(name, expected, found))
}

/// Decoding of a whole attribute into a `Vec` of one element type.
pub trait AttributeElement: Sized {
    fn wrap_attribute(values: Vec<Self>) -> TypedVec;

    fn decode_attribute(name: &str, value: TypedVec) -> Result<Vec<Self>, DalError>;
}

macro_rules! attribute_element {
    ($decode:ident: $($ty:ty => $variant:ident),*) => {
        $(
            impl AttributeElement for $ty {
                fn wrap_attribute(values: Vec<Self>) -> TypedVec {
                    TypedVec::$variant(values)
                }

                fn decode_attribute(name: &str, value: TypedVec) -> Result<Vec<Self>, DalError> {
                    $decode(name, ElementType::$variant, value)
                }
            }
        )*
    };
}

attribute_element!(integers: i8 => Char, i16 => Short, i32 => Int, u32 => UInt, i64 => Long);
attribute_element!(floats: f32 => Float, f64 => Double);

impl AttributeElement for bool {
    fn wrap_attribute(values: Vec<Self>) -> TypedVec {
        TypedVec::Bool(values)
    }

    fn decode_attribute(name: &str, value: TypedVec) -> Result<Vec<Self>, DalError> {
        match value {
            TypedVec::Bool(v) => Ok(v),
            other => Err(DalError::type_mismatch(name, ElementType::Bool, other.element_type())),
        }
    }
}

impl AttributeElement for String {
    fn wrap_attribute(values: Vec<Self>) -> TypedVec {
        TypedVec::String(values)
    }

    fn decode_attribute(name: &str, value: TypedVec) -> Result<Vec<Self>, DalError> {
        match value {
            TypedVec::String(v) => Ok(v),
            other => Err(DalError::type_mismatch(name, ElementType::String, other.element_type())),
        }
    }
}

impl<T: AttributeElement> IntoAttribute for T {
    fn into_attribute(self) -> TypedVec {
        T::wrap_attribute(vec![self])
    }
}

impl<T: AttributeElement> IntoAttribute for Vec<T> {
    fn into_attribute(self) -> TypedVec {
        T::wrap_attribute(self)
    }
}

impl<T: AttributeElement + Clone> IntoAttribute for &[T] {
    fn into_attribute(self) -> TypedVec {
        T::wrap_attribute(self.to_vec())
    }
}

impl IntoAttribute for &str {
    fn into_attribute(self) -> TypedVec {
        TypedVec::String(vec![self.to_string()])
    }
}

impl IntoAttribute for TypedVec {
    fn into_attribute(self) -> TypedVec {
        self
    }
}

impl<T: AttributeElement> FromAttribute for T {
    fn from_attribute(name: &str, value: TypedVec) -> Result<Self, DalError> {
        let len = value.len();
        let found = value.element_type();
        let mut values = T::decode_attribute(name, value)?;
        match (values.pop(), len) {
            (Some(v), 1) => Ok(v),
            _ => Err(DalError::TypeMismatch {
                name: name.to_string(),
                expected: "a scalar".to_string(),
                found: format!("{} values of {}", len, found),
            }),
        }
    }
}

impl<T: AttributeElement> FromAttribute for Vec<T> {
    fn from_attribute(name: &str, value: TypedVec) -> Result<Self, DalError> {
        T::decode_attribute(name, value)
    }
}

impl FromAttribute for TypedVec {
    fn from_attribute(_: &str, value: TypedVec) -> Result<Self, DalError> {
        Ok(value)
    }
}

fn check_name(name: &str) -> Result<(), DalError> {
    if name.is_empty() {
        Err(DalError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Anything attributes can be attached to.
pub trait AttributeOwner {
    fn backend(&self) -> &dyn Backend;

    /// The path of this object within its file.
    fn object_path(&self) -> &str;

    /// Create or overwrite the attribute `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lofar_dal::{AttributeOwner, DalFile};
    ///
    /// let file = DalFile::in_memory();
    /// let root = file.root();
    /// root.set_attribute("TELESCOPE", "LOFAR").unwrap();
    /// root.set_attribute("TSYS", vec![1.0_f64, 2.0, 3.0]).unwrap();
    /// assert_eq!(root.get_attribute::<String>("TELESCOPE").unwrap(), "LOFAR");
    /// assert_eq!(root.get_attribute::<Vec<f64>>("TSYS").unwrap(), vec![1.0, 2.0, 3.0]);
    /// ```
    fn set_attribute<V: IntoAttribute>(&self, name: &str, value: V) -> Result<(), DalError>
    where
        Self: Sized,
    {
        check_name(name)?;
        let value = value.into_attribute();
        if value.is_empty() {
            return Err(DalError::BadArrayShape {
                argument: "value".to_string(),
                function: "set_attribute".to_string(),
                expected: "at least one element".to_string(),
                received: "0 elements".to_string(),
            });
        }
        self.backend()
            .write_attribute(self.object_path(), name, &value)
    }

    fn get_attribute<V: FromAttribute>(&self, name: &str) -> Result<V, DalError>
    where
        Self: Sized,
    {
        check_name(name)?;
        let value = self.backend().read_attribute(self.object_path(), name)?;
        V::from_attribute(name, value)
    }

    fn has_attribute(&self, name: &str) -> Result<bool, DalError> {
        Ok(self
            .backend()
            .attribute_names(self.object_path())?
            .iter()
            .any(|n| n == name))
    }

    fn attribute_names(&self) -> Result<Vec<String>, DalError> {
        self.backend().attribute_names(self.object_path())
    }

    fn remove_attribute(&self, name: &str) -> Result<(), DalError> {
        self.backend().delete_attribute(self.object_path(), name)
    }

    /// Every attribute with its rendered value, also logged at debug level.
    fn attribute_summary(&self) -> Result<Vec<(String, String)>, DalError> {
        let path = self.object_path();
        let mut summary = vec![];
        for name in self.backend().attribute_names(path)? {
            let value = self.backend().read_attribute(path, &name)?;
            debug!("{}:{} = {}", path, name, value);
            summary.push((name, value.to_string()));
        }
        Ok(summary)
    }
}
