// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The HDF5 backend.
//!
//! Arrays are datasets, extendible ones are chunked with unlimited maximum extents. Complex
//! elements are stored as a two field compound (`real`, `imag`) of the component type, and
//! strings as variable length UTF-8. Tables are one dimensional, extendible datasets of a
//! packed compound type, marked with the `CLASS = "TABLE"` attribute of the HDF5 table API.
//!
//! Typed I/O goes through the `hdf5` crate. Field-wise table reads and row appends need a
//! compound memory type that is only known at run time, and use `hdf5-sys` directly; every raw
//! handle acquired for those is wrapped in a guard that releases it on all exit paths.

use std::{
    ffi::{c_void, CString},
    path::{Path, PathBuf},
    str::FromStr,
};

use hdf5::{
    types::{
        CompoundField, CompoundType, FloatSize, H5Type, IntSize, TypeDescriptor, VarLenUnicode,
    },
    Dataset, Datatype, Extent, File, Group, Location, Selection, SimpleExtents, SliceOrIndex,
};
use hdf5_sys::{
    h5::hsize_t,
    h5a::{H5Adelete, H5Arename},
    h5d::{H5Dget_space, H5Dread, H5Dwrite},
    h5i::hid_t,
    h5p::H5P_DEFAULT,
    h5s::{H5S_seloper_t, H5Sclose, H5Screate_simple, H5Sselect_hyperslab},
};
use log::{debug, trace, warn};
use ndarray::{Array2, ArrayView1, ArrayViewD, IxDyn};

use super::{
    join_path, rows_in, split_path, ArrayDesc, ArrayInfo, ArrayStore, AttributeStore, Backend,
    DalError, FieldDesc, FileType, GroupStore, IoMode, MemberKind, TableStore,
};
use crate::{
    constants::{
        COMPLEX_IMAG_FIELD, COMPLEX_REAL_FIELD, TABLE_CLASS, TABLE_CLASS_ATTR, TABLE_TITLE_ATTR,
        TABLE_VERSION, TABLE_VERSION_ATTR,
    },
    data::DataBlock,
    element::{dispatch_element, Element, ElementType, TypedVec},
    index::ArrayOrder,
    num_complex::Complex,
    selection::Hyperslab,
};

/// Rows per chunk of a new table.
const TABLE_CHUNK_ROWS: usize = 1024;

/// The on-disk layout of a complex element.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct H5Complex<T> {
    pub real: T,
    pub imag: T,
}

unsafe impl<T: H5Type> H5Type for H5Complex<T> {
    fn type_descriptor() -> TypeDescriptor {
        let size = std::mem::size_of::<T>();
        TypeDescriptor::Compound(CompoundType {
            fields: vec![
                CompoundField::typed::<T>(COMPLEX_REAL_FIELD, 0, 0),
                CompoundField::typed::<T>(COMPLEX_IMAG_FIELD, size, 1),
            ],
            size: 2 * size,
        })
    }
}

/// Conversion between an element type and the values handed to HDF5.
trait Stored: Element {
    type H5: H5Type + Clone;

    fn to_h5(values: &[Self]) -> Result<Vec<Self::H5>, DalError>;

    fn from_h5(values: Vec<Self::H5>) -> Vec<Self>;
}

macro_rules! stored_as_is {
    ($($ty:ty),*) => {
        $(
            impl Stored for $ty {
                type H5 = $ty;

                fn to_h5(values: &[Self]) -> Result<Vec<Self>, DalError> {
                    Ok(values.to_vec())
                }

                fn from_h5(values: Vec<Self>) -> Vec<Self> {
                    values
                }
            }
        )*
    };
}

stored_as_is!(i8, bool, i16, i32, u32, i64, f32, f64);

macro_rules! stored_complex {
    ($($ty:ty),*) => {
        $(
            impl Stored for Complex<$ty> {
                type H5 = H5Complex<$ty>;

                fn to_h5(values: &[Self]) -> Result<Vec<Self::H5>, DalError> {
                    Ok(values
                        .iter()
                        .map(|c| H5Complex { real: c.re, imag: c.im })
                        .collect())
                }

                fn from_h5(values: Vec<Self::H5>) -> Vec<Self> {
                    values
                        .into_iter()
                        .map(|h| Complex::new(h.real, h.imag))
                        .collect()
                }
            }
        )*
    };
}

stored_complex!(f32, f64, i8, i16);

impl Stored for String {
    type H5 = VarLenUnicode;

    fn to_h5(values: &[Self]) -> Result<Vec<Self::H5>, DalError> {
        values
            .iter()
            .map(|s| {
                VarLenUnicode::from_str(s)
                    .map_err(|e| DalError::InvalidString(format!("{:?}: {}", s, e)))
            })
            .collect()
    }

    fn from_h5(values: Vec<Self::H5>) -> Vec<Self> {
        values.into_iter().map(|v| v.as_str().to_string()).collect()
    }
}

/// The HDF5 type of an element.
fn descriptor(element_type: ElementType) -> TypeDescriptor {
    dispatch_element!(element_type, T => <<T as Stored>::H5 as H5Type>::type_descriptor())
}

/// The element type stored with a given HDF5 type, if it is one we understand.
fn element_type_of(desc: &TypeDescriptor) -> Option<ElementType> {
    Some(match desc {
        TypeDescriptor::Integer(IntSize::U1) => ElementType::Char,
        TypeDescriptor::Integer(IntSize::U2) => ElementType::Short,
        TypeDescriptor::Integer(IntSize::U4) => ElementType::Int,
        TypeDescriptor::Integer(IntSize::U8) => ElementType::Long,
        TypeDescriptor::Unsigned(IntSize::U4) => ElementType::UInt,
        TypeDescriptor::Float(FloatSize::U4) => ElementType::Float,
        TypeDescriptor::Float(FloatSize::U8) => ElementType::Double,
        TypeDescriptor::Boolean => ElementType::Bool,
        TypeDescriptor::VarLenUnicode | TypeDescriptor::VarLenAscii => ElementType::String,
        TypeDescriptor::Compound(compound) => {
            let names: Vec<&str> = compound.fields.iter().map(|f| f.name.as_str()).collect();
            if names != [COMPLEX_REAL_FIELD, COMPLEX_IMAG_FIELD] {
                return None;
            }
            match &compound.fields[0].ty {
                TypeDescriptor::Float(FloatSize::U4) => ElementType::Complex,
                TypeDescriptor::Float(FloatSize::U8) => ElementType::DComplex,
                TypeDescriptor::Integer(IntSize::U1) => ElementType::ComplexChar,
                TypeDescriptor::Integer(IntSize::U2) => ElementType::ComplexShort,
                _ => return None,
            }
        }
        _ => return None,
    })
}

fn ffi_error(call: &str, target: &str) -> DalError {
    DalError::Hdf5(hdf5::Error::from(format!("{} failed for {}", call, target)))
}

/// A dataspace id released on drop.
struct SpaceGuard(hid_t);

impl SpaceGuard {
    fn new(id: hid_t, call: &str, target: &str) -> Result<Self, DalError> {
        if id < 0 {
            Err(ffi_error(call, target))
        } else {
            Ok(Self(id))
        }
    }

    /// A one dimensional memory space of `len` elements.
    fn memory(len: usize, target: &str) -> Result<Self, DalError> {
        let dims = [len as hsize_t];
        let id = unsafe { H5Screate_simple(1, dims.as_ptr(), std::ptr::null()) };
        Self::new(id, "H5Screate_simple", target)
    }

    /// The file space of a one dimensional dataset with rows `start..start + count` selected.
    fn rows_of(ds: &Dataset, start: usize, count: usize, target: &str) -> Result<Self, DalError> {
        let space = Self::new(unsafe { H5Dget_space(ds.id()) }, "H5Dget_space", target)?;
        let start = [start as hsize_t];
        let count = [count as hsize_t];
        let status = unsafe {
            H5Sselect_hyperslab(
                space.0,
                H5S_seloper_t::H5S_SELECT_SET,
                start.as_ptr(),
                std::ptr::null(),
                count.as_ptr(),
                std::ptr::null(),
            )
        };
        if status < 0 {
            return Err(ffi_error("H5Sselect_hyperslab", target));
        }
        Ok(space)
    }
}

impl Drop for SpaceGuard {
    fn drop(&mut self) {
        unsafe {
            H5Sclose(self.0);
        }
    }
}

fn point_selection(points: &[Vec<usize>], rank: usize) -> Result<Selection, DalError> {
    let flat: Vec<usize> = points.iter().flatten().copied().collect();
    let coords = Array2::from_shape_vec((points.len(), rank), flat).map_err(|e| {
        DalError::BadArrayShape {
            argument: "points".to_string(),
            function: "point_selection".to_string(),
            expected: format!("{} coordinates per point", rank),
            received: e.to_string(),
        }
    })?;
    Ok(Selection::Points(coords))
}

/// The same region as an HDF5 hyperslab selection.
fn slab_selection(slab: &Hyperslab) -> Selection {
    let dims: Vec<SliceOrIndex> = (0..slab.rank())
        .map(|d| SliceOrIndex::SliceCount {
            start: slab.start()[d],
            // a single block may be longer than the stride
            step: slab.stride()[d].max(slab.block()[d]),
            count: slab.count()[d],
            block: slab.block()[d],
        })
        .collect();
    Selection::Hyperslab(hdf5::Hyperslab::from(dims))
}

fn create_dataset<T: Stored>(parent: &Group, name: &str, desc: &ArrayDesc) -> Result<Dataset, DalError> {
    let extents = if desc.is_extendible() {
        SimpleExtents::new(desc.shape.iter().map(|&d| Extent::resizable(d)))
    } else {
        SimpleExtents::new(desc.shape.iter().map(|&d| Extent::fixed(d)))
    };
    let mut builder = parent.new_dataset::<T::H5>().shape(extents);
    if desc.is_extendible() {
        builder = builder.chunk(desc.chunk.clone());
    }
    Ok(builder.create(name)?)
}

fn write_slab_typed<T: Stored>(ds: &Dataset, slab: &Hyperslab, data: &TypedVec) -> Result<(), DalError> {
    let values = T::slice(data).ok_or_else(|| DalError::type_mismatch(&ds.name(), T::TYPE, data.element_type()))?;
    let stored = T::to_h5(values)?;
    let view = ArrayViewD::from_shape(IxDyn(&slab.shape()), stored.as_slice()).map_err(|e| {
        DalError::BadArrayShape {
            argument: "data".to_string(),
            function: "Hdf5Backend::write_slab".to_string(),
            expected: format!("{} elements", slab.num_points()),
            received: format!("{} elements ({})", stored.len(), e),
        }
    })?;
    ds.write_slice(view, slab_selection(slab))?;
    Ok(())
}

fn read_slab_typed<T: Stored>(ds: &Dataset, slab: &Hyperslab) -> Result<TypedVec, DalError> {
    let stored = ds.read_slice::<T::H5, _, IxDyn>(slab_selection(slab))?;
    Ok(T::wrap(T::from_h5(stored.iter().cloned().collect())))
}

fn write_points_typed<T: Stored>(ds: &Dataset, points: &[Vec<usize>], data: &TypedVec) -> Result<(), DalError> {
    let values = T::slice(data).ok_or_else(|| DalError::type_mismatch(&ds.name(), T::TYPE, data.element_type()))?;
    let stored = T::to_h5(values)?;
    let selection = point_selection(points, ds.ndim())?;
    ds.write_slice(ArrayView1::from(stored.as_slice()), selection)?;
    Ok(())
}

fn read_points_typed<T: Stored>(ds: &Dataset, points: &[Vec<usize>]) -> Result<TypedVec, DalError> {
    let selection = point_selection(points, ds.ndim())?;
    let stored = ds.read_slice_1d::<T::H5, _>(selection)?;
    Ok(T::wrap(T::from_h5(stored.to_vec())))
}

fn read_all_typed<T: Stored>(ds: &Dataset) -> Result<TypedVec, DalError> {
    Ok(T::wrap(T::from_h5(ds.read_raw::<T::H5>()?)))
}

fn write_attr_typed<T: Stored>(loc: &Location, name: &str, value: &TypedVec) -> Result<(), DalError> {
    let values = T::slice(value).ok_or_else(|| DalError::type_mismatch(name, T::TYPE, value.element_type()))?;
    let stored = T::to_h5(values)?;
    if stored.len() == 1 {
        loc.new_attr::<T::H5>()
            .create(name)?
            .write_scalar(&stored[0])?;
    } else {
        let attr = loc
            .new_attr::<T::H5>()
            .shape((stored.len(),))
            .create(name)?;
        attr.write(ArrayView1::from(stored.as_slice()))?;
    }
    Ok(())
}

fn delete_attr(loc: &Location, name: &str) -> Result<(), DalError> {
    let c_name = CString::new(name)?;
    let status = unsafe { H5Adelete(loc.id(), c_name.as_ptr()) };
    if status < 0 {
        return Err(ffi_error("H5Adelete", name));
    }
    Ok(())
}

fn read_attr_typed<T: Stored>(attr: &hdf5::Attribute) -> Result<TypedVec, DalError> {
    Ok(T::wrap(T::from_h5(attr.read_raw::<T::H5>()?)))
}

/// Append the native bytes of element `i` of `column`.
fn push_element_bytes(column: &TypedVec, i: usize, out: &mut Vec<u8>) -> Result<(), DalError> {
    match column {
        TypedVec::Char(v) => out.extend_from_slice(&v[i].to_ne_bytes()),
        TypedVec::Bool(v) => out.push(v[i] as u8),
        TypedVec::Short(v) => out.extend_from_slice(&v[i].to_ne_bytes()),
        TypedVec::Int(v) => out.extend_from_slice(&v[i].to_ne_bytes()),
        TypedVec::UInt(v) => out.extend_from_slice(&v[i].to_ne_bytes()),
        TypedVec::Long(v) => out.extend_from_slice(&v[i].to_ne_bytes()),
        TypedVec::Float(v) => out.extend_from_slice(&v[i].to_ne_bytes()),
        TypedVec::Double(v) => out.extend_from_slice(&v[i].to_ne_bytes()),
        TypedVec::Complex(v) => {
            out.extend_from_slice(&v[i].re.to_ne_bytes());
            out.extend_from_slice(&v[i].im.to_ne_bytes());
        }
        TypedVec::DComplex(v) => {
            out.extend_from_slice(&v[i].re.to_ne_bytes());
            out.extend_from_slice(&v[i].im.to_ne_bytes());
        }
        TypedVec::ComplexChar(v) => {
            out.extend_from_slice(&v[i].re.to_ne_bytes());
            out.extend_from_slice(&v[i].im.to_ne_bytes());
        }
        TypedVec::ComplexShort(v) => {
            out.extend_from_slice(&v[i].re.to_ne_bytes());
            out.extend_from_slice(&v[i].im.to_ne_bytes());
        }
        TypedVec::String(_) => {
            return Err(DalError::Unsupported {
                file_type: FileType::Hdf5,
                operation: "string fields in tables".to_string(),
            })
        }
    }
    Ok(())
}

fn bytes<const N: usize>(b: &[u8]) -> [u8; N] {
    let mut a = [0; N];
    a.copy_from_slice(&b[..N]);
    a
}

macro_rules! decode_real {
    ($raw:expr, $ty:ty, $variant:ident) => {{
        const N: usize = std::mem::size_of::<$ty>();
        TypedVec::$variant(
            $raw.chunks_exact(N)
                .map(|c| <$ty>::from_ne_bytes(bytes::<N>(c)))
                .collect(),
        )
    }};
}

macro_rules! decode_complex {
    ($raw:expr, $ty:ty, $variant:ident) => {{
        const N: usize = std::mem::size_of::<$ty>();
        TypedVec::$variant(
            $raw.chunks_exact(2 * N)
                .map(|c| {
                    Complex::new(
                        <$ty>::from_ne_bytes(bytes::<N>(c)),
                        <$ty>::from_ne_bytes(bytes::<N>(&c[N..])),
                    )
                })
                .collect(),
        )
    }};
}

/// Decode packed native bytes into elements.
fn decode(element_type: ElementType, raw: &[u8]) -> Result<TypedVec, DalError> {
    Ok(match element_type {
        ElementType::Char => decode_real!(raw, i8, Char),
        ElementType::Bool => TypedVec::Bool(raw.iter().map(|&b| b != 0).collect()),
        ElementType::Short => decode_real!(raw, i16, Short),
        ElementType::Int => decode_real!(raw, i32, Int),
        ElementType::UInt => decode_real!(raw, u32, UInt),
        ElementType::Long => decode_real!(raw, i64, Long),
        ElementType::Float => decode_real!(raw, f32, Float),
        ElementType::Double => decode_real!(raw, f64, Double),
        ElementType::Complex => decode_complex!(raw, f32, Complex),
        ElementType::DComplex => decode_complex!(raw, f64, DComplex),
        ElementType::ComplexChar => decode_complex!(raw, i8, ComplexChar),
        ElementType::ComplexShort => decode_complex!(raw, i16, ComplexShort),
        ElementType::String => {
            return Err(DalError::Unsupported {
                file_type: FileType::Hdf5,
                operation: "string fields in tables".to_string(),
            })
        }
    })
}

/// An HDF5 file.
pub struct Hdf5Backend {
    file: File,
    path: PathBuf,
    writable: bool,
}

impl Hdf5Backend {
    /// Create a new file. [`IoMode::CreateNew`] fails if the file exists, every other mode
    /// truncates it.
    pub fn create<P: AsRef<Path>>(path: P, mode: IoMode) -> Result<Self, DalError> {
        let path = path.as_ref();
        let file = match mode {
            IoMode::CreateNew => File::create_excl(path)?,
            _ => File::create(path)?,
        };
        debug!("created HDF5 file {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
            writable: true,
        })
    }

    pub fn open<P: AsRef<Path>>(path: P, mode: IoMode) -> Result<Self, DalError> {
        let path = path.as_ref();
        let file = match mode {
            IoMode::ReadOnly => File::open(path)?,
            IoMode::ReadWrite => File::open_rw(path)?,
            IoMode::Create => File::create(path)?,
            IoMode::CreateNew => File::create_excl(path)?,
        };
        debug!("opened HDF5 file {} ({:?})", path.display(), mode);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            writable: mode.is_writable(),
        })
    }

    fn check_writable(&self, what: &str) -> Result<(), DalError> {
        if self.writable {
            Ok(())
        } else {
            Err(DalError::ReadOnly(what.to_string()))
        }
    }

    fn group(&self, path: &str) -> Result<Group, DalError> {
        match self.member_kind(path) {
            Some(MemberKind::Group) => Ok(self.file.group(path)?),
            Some(_) => Err(DalError::InvalidHandle {
                kind: "group",
                path: path.to_string(),
            }),
            None => {
                let (parent, name) = split_path(path);
                Err(DalError::not_found("group", name, parent))
            }
        }
    }

    fn dataset(&self, path: &str, kind: MemberKind) -> Result<Dataset, DalError> {
        match self.member_kind(path) {
            Some(k) if k == kind => Ok(self.file.dataset(path)?),
            Some(_) => Err(DalError::InvalidHandle {
                kind: kind.name(),
                path: path.to_string(),
            }),
            None => {
                let (parent, name) = split_path(path);
                Err(DalError::not_found(kind.name(), name, parent))
            }
        }
    }

    /// Any object that can carry attributes.
    fn location(&self, path: &str) -> Result<Location, DalError> {
        match self.member_kind(path) {
            Some(MemberKind::Group) => Ok(Location::clone(&self.file.group(path)?)),
            Some(_) => Ok(Location::clone(&self.file.dataset(path)?)),
            None => Err(DalError::InvalidHandle {
                kind: "object",
                path: path.to_string(),
            }),
        }
    }

    /// The parent group of a new object, after checking the name is free.
    fn parent_for(&self, path: &str) -> Result<(Group, String), DalError> {
        let (parent, name) = split_path(path);
        if name.is_empty() {
            return Err(DalError::InvalidName(path.to_string()));
        }
        if let Some(kind) = self.member_kind(path) {
            return Err(DalError::Exists {
                kind: kind.name(),
                name: name.to_string(),
                owner: parent.to_string(),
            });
        }
        Ok((self.group(parent)?, name.to_string()))
    }

    fn compound_of(&self, ds: &Dataset) -> Result<CompoundType, DalError> {
        match ds.dtype()?.to_descriptor()? {
            TypeDescriptor::Compound(compound) => Ok(compound),
            other => Err(DalError::TypeMismatch {
                name: ds.name(),
                expected: "a compound table".to_string(),
                found: format!("{:?}", other),
            }),
        }
    }
}

fn is_table(ds: &Dataset) -> bool {
    let marked = ds
        .attr(TABLE_CLASS_ATTR)
        .and_then(|a| a.read_scalar::<VarLenUnicode>())
        .map(|v| v.as_str() == TABLE_CLASS)
        .unwrap_or(false);
    marked
        || matches!(
            ds.dtype().and_then(|t| t.to_descriptor()),
            Ok(ref desc @ TypeDescriptor::Compound(_)) if element_type_of(desc).is_none()
        )
}

/// Element type and cell shape of a compound field.
fn field_layout(ty: &TypeDescriptor) -> Option<(ElementType, Vec<usize>)> {
    match ty {
        TypeDescriptor::FixedArray(inner, n) => Some((element_type_of(inner)?, vec![*n])),
        other => Some((element_type_of(other)?, vec![])),
    }
}

impl GroupStore for Hdf5Backend {
    fn create_group(&self, path: &str) -> Result<(), DalError> {
        self.check_writable("create a group")?;
        let (parent, name) = self.parent_for(path)?;
        parent.create_group(&name)?;
        debug!("created group {}", path);
        Ok(())
    }

    fn member_kind(&self, path: &str) -> Option<MemberKind> {
        if path == "/" || self.file.group(path).is_ok() {
            return Some(MemberKind::Group);
        }
        let ds = self.file.dataset(path).ok()?;
        Some(if is_table(&ds) {
            MemberKind::Table
        } else {
            MemberKind::Array
        })
    }

    fn list_members(&self, path: &str, kind: MemberKind) -> Result<Vec<String>, DalError> {
        let group = self.group(path)?;
        let mut names = vec![];
        for name in group.member_names()? {
            if self.member_kind(&join_path(path, &name)) == Some(kind) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

impl AttributeStore for Hdf5Backend {
    fn write_attribute(&self, owner: &str, name: &str, value: &TypedVec) -> Result<(), DalError> {
        self.check_writable("write an attribute")?;
        let loc = self.location(owner)?;
        let names = loc.attr_names()?;
        trace!("writing attribute {}:{} = {}", owner, name, value);
        if !names.iter().any(|n| n == name) {
            return dispatch_element!(value.element_type(), T => write_attr_typed::<T>(&loc, name, value));
        }

        // Replace an existing attribute only once the new value is safely written.
        let staged = format!("{}.staged", name);
        if names.iter().any(|n| n == &staged) {
            delete_attr(&loc, &staged)?;
        }
        if let Err(e) =
            dispatch_element!(value.element_type(), T => write_attr_typed::<T>(&loc, &staged, value))
        {
            warn!("keeping the old value of {}:{}: {}", owner, name, e);
            if loc.attr_names()?.iter().any(|n| n == &staged) {
                delete_attr(&loc, &staged)?;
            }
            return Err(e);
        }
        delete_attr(&loc, name)?;
        let c_staged = CString::new(staged.as_str())?;
        let c_name = CString::new(name)?;
        let status = unsafe { H5Arename(loc.id(), c_staged.as_ptr(), c_name.as_ptr()) };
        if status < 0 {
            return Err(ffi_error("H5Arename", name));
        }
        Ok(())
    }

    fn read_attribute(&self, owner: &str, name: &str) -> Result<TypedVec, DalError> {
        let loc = self.location(owner)?;
        if !loc.attr_names()?.iter().any(|n| n == name) {
            return Err(DalError::not_found("attribute", name, owner));
        }
        let attr = loc.attr(name)?;
        let desc = attr.dtype()?.to_descriptor()?;
        let element_type = element_type_of(&desc).ok_or_else(|| DalError::Unsupported {
            file_type: FileType::Hdf5,
            operation: format!("reading attribute {:?} of type {:?}", name, desc),
        })?;
        dispatch_element!(element_type, T => read_attr_typed::<T>(&attr))
    }

    fn attribute_names(&self, owner: &str) -> Result<Vec<String>, DalError> {
        Ok(self.location(owner)?.attr_names()?)
    }

    fn delete_attribute(&self, owner: &str, name: &str) -> Result<(), DalError> {
        self.check_writable("delete an attribute")?;
        let loc = self.location(owner)?;
        if !loc.attr_names()?.iter().any(|n| n == name) {
            return Err(DalError::not_found("attribute", name, owner));
        }
        delete_attr(&loc, name)
    }
}

impl ArrayStore for Hdf5Backend {
    fn create_array(&self, path: &str, desc: &ArrayDesc) -> Result<(), DalError> {
        self.check_writable("create an array")?;
        desc.validate("Hdf5Backend::create_array")?;
        let (parent, name) = self.parent_for(path)?;
        dispatch_element!(desc.element_type, T => create_dataset::<T>(&parent, &name, desc))?;
        debug!(
            "created {} array {} with shape {:?}, chunk {:?}",
            desc.element_type, path, desc.shape, desc.chunk
        );
        Ok(())
    }

    fn array_info(&self, path: &str) -> Result<ArrayInfo, DalError> {
        let ds = self.dataset(path, MemberKind::Array)?;
        let desc = ds.dtype()?.to_descriptor()?;
        let element_type = element_type_of(&desc).ok_or_else(|| DalError::Unsupported {
            file_type: FileType::Hdf5,
            operation: format!("arrays of type {:?}", desc),
        })?;
        Ok(ArrayInfo {
            element_type,
            shape: ds.shape(),
            chunk: ds.chunk().unwrap_or_default(),
            extendible: ds.is_chunked(),
        })
    }

    fn resize_array(&self, path: &str, shape: &[usize]) -> Result<(), DalError> {
        self.check_writable("resize an array")?;
        let ds = self.dataset(path, MemberKind::Array)?;
        if !ds.is_chunked() {
            return Err(DalError::NotExtendible(path.to_string()));
        }
        ds.resize(shape.to_vec())?;
        trace!("resized {} to {:?}", path, shape);
        Ok(())
    }

    fn write_slab(&self, path: &str, slab: &Hyperslab, data: &TypedVec) -> Result<(), DalError> {
        self.check_writable("write an array")?;
        if slab.num_points() == 0 {
            return Ok(());
        }
        let info = self.array_info(path)?;
        if info.element_type != data.element_type() {
            return Err(DalError::type_mismatch(path, info.element_type, data.element_type()));
        }
        let ds = self.dataset(path, MemberKind::Array)?;
        trace!("writing {} elements of {} at {:?}", data.len(), path, slab.start());
        dispatch_element!(info.element_type, T => write_slab_typed::<T>(&ds, slab, data))
    }

    fn read_slab(&self, path: &str, slab: &Hyperslab) -> Result<TypedVec, DalError> {
        let info = self.array_info(path)?;
        if slab.num_points() == 0 {
            return Ok(TypedVec::empty(info.element_type));
        }
        let ds = self.dataset(path, MemberKind::Array)?;
        dispatch_element!(info.element_type, T => read_slab_typed::<T>(&ds, slab))
    }

    fn write_points(&self, path: &str, points: &[Vec<usize>], data: &TypedVec) -> Result<(), DalError> {
        self.check_writable("write an array")?;
        if points.is_empty() {
            return Ok(());
        }
        let info = self.array_info(path)?;
        if info.element_type != data.element_type() {
            return Err(DalError::type_mismatch(path, info.element_type, data.element_type()));
        }
        let ds = self.dataset(path, MemberKind::Array)?;
        dispatch_element!(info.element_type, T => write_points_typed::<T>(&ds, points, data))
    }

    fn read_points(&self, path: &str, points: &[Vec<usize>]) -> Result<TypedVec, DalError> {
        let info = self.array_info(path)?;
        if points.is_empty() {
            return Ok(TypedVec::empty(info.element_type));
        }
        let ds = self.dataset(path, MemberKind::Array)?;
        dispatch_element!(info.element_type, T => read_points_typed::<T>(&ds, points))
    }

    fn read_all(&self, path: &str) -> Result<TypedVec, DalError> {
        let info = self.array_info(path)?;
        if info.shape.contains(&0) {
            return Ok(TypedVec::empty(info.element_type));
        }
        let ds = self.dataset(path, MemberKind::Array)?;
        dispatch_element!(info.element_type, T => read_all_typed::<T>(&ds))
    }
}

impl TableStore for Hdf5Backend {
    fn create_table(&self, path: &str, fields: &[FieldDesc]) -> Result<(), DalError> {
        self.check_writable("create a table")?;
        let (parent, name) = self.parent_for(path)?;
        let mut compound = CompoundType {
            fields: Vec::with_capacity(fields.len()),
            size: 0,
        };
        for (index, field) in fields.iter().enumerate() {
            if field.element_type == ElementType::String {
                return Err(DalError::Unsupported {
                    file_type: FileType::Hdf5,
                    operation: "string fields in tables".to_string(),
                });
            }
            if field.cell_shape.len() > 1 {
                warn!(
                    "field {} of {} is stored flat, its cell shape {:?} is not kept",
                    field.name, path, field.cell_shape
                );
            }
            let element = descriptor(field.element_type);
            let ty = if field.is_array() {
                TypeDescriptor::FixedArray(Box::new(element), field.cell_len())
            } else {
                element
            };
            let size = ty.size();
            compound
                .fields
                .push(CompoundField::new(&field.name, ty, compound.size, index));
            compound.size += size;
        }
        let ds = parent
            .new_dataset_builder()
            .empty_as(&TypeDescriptor::Compound(compound))
            .shape(SimpleExtents::new([Extent::resizable(0)]))
            .chunk(vec![TABLE_CHUNK_ROWS])
            .create(name.as_str())?;
        for (attr, value) in [
            (TABLE_CLASS_ATTR, TABLE_CLASS),
            (TABLE_VERSION_ATTR, TABLE_VERSION),
            (TABLE_TITLE_ATTR, name.as_str()),
        ] {
            ds.new_attr::<VarLenUnicode>()
                .create(attr)?
                .write_scalar(&<String as Stored>::to_h5(&[value.to_string()])?[0])?;
        }
        debug!("created table {} with {} fields", path, fields.len());
        Ok(())
    }

    fn table_fields(&self, path: &str) -> Result<Vec<FieldDesc>, DalError> {
        let ds = self.dataset(path, MemberKind::Table)?;
        let compound = self.compound_of(&ds)?;
        let mut fields = Vec::with_capacity(compound.fields.len());
        for field in &compound.fields {
            match field_layout(&field.ty) {
                Some((element_type, cell_shape)) => fields.push(FieldDesc {
                    name: field.name.clone(),
                    element_type,
                    cell_shape,
                }),
                None => warn!(
                    "skipping field {} of {}: unsupported type {:?}",
                    field.name, path, field.ty
                ),
            }
        }
        Ok(fields)
    }

    fn table_rows(&self, path: &str) -> Result<usize, DalError> {
        let ds = self.dataset(path, MemberKind::Table)?;
        Ok(ds.shape().first().copied().unwrap_or(0))
    }

    fn append_rows(&self, path: &str, columns: &[TypedVec]) -> Result<(), DalError> {
        self.check_writable("append to a table")?;
        let fields = self.table_fields(path)?;
        let rows = rows_in(&fields, columns, "Hdf5Backend::append_rows")?;
        if rows == 0 {
            return Ok(());
        }
        let ds = self.dataset(path, MemberKind::Table)?;
        let compound = self.compound_of(&ds)?;
        if compound.fields.len() != fields.len() {
            return Err(DalError::Unsupported {
                file_type: FileType::Hdf5,
                operation: format!("appending to {} which has fields of unknown type", path),
            });
        }

        // Pack the rows in field order; the memory type uses the same packed offsets.
        let mut packed = Vec::with_capacity(rows * compound.size);
        let mut memory = CompoundType {
            fields: Vec::with_capacity(fields.len()),
            size: 0,
        };
        for (index, field) in compound.fields.iter().enumerate() {
            memory.fields.push(CompoundField::new(
                &field.name,
                field.ty.clone(),
                memory.size,
                index,
            ));
            memory.size += field.ty.size();
        }
        for row in 0..rows {
            for (field, column) in fields.iter().zip(columns) {
                let cell = field.cell_len();
                for i in row * cell..(row + 1) * cell {
                    push_element_bytes(column, i, &mut packed)?;
                }
            }
        }

        let old_rows = ds.shape().first().copied().unwrap_or(0);
        ds.resize(vec![old_rows + rows])?;
        let mem_type = Datatype::from_descriptor(&TypeDescriptor::Compound(memory))?;
        let mem_space = SpaceGuard::memory(rows, path)?;
        let file_space = SpaceGuard::rows_of(&ds, old_rows, rows, path)?;
        let status = unsafe {
            H5Dwrite(
                ds.id(),
                mem_type.id(),
                mem_space.0,
                file_space.0,
                H5P_DEFAULT,
                packed.as_ptr() as *const c_void,
            )
        };
        if status < 0 {
            return Err(ffi_error("H5Dwrite", path));
        }
        trace!("appended {} rows to {}", rows, path);
        Ok(())
    }

    fn read_field(
        &self,
        path: &str,
        field: &str,
        start: usize,
        count: usize,
    ) -> Result<DataBlock, DalError> {
        let ds = self.dataset(path, MemberKind::Table)?;
        let compound = self.compound_of(&ds)?;
        let member = compound
            .fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| DalError::not_found("field", field, path))?;
        let (element_type, cell_shape) =
            field_layout(&member.ty).ok_or_else(|| DalError::Unsupported {
                file_type: FileType::Hdf5,
                operation: format!("reading field {:?} of type {:?}", field, member.ty),
            })?;
        let rows = ds.shape().first().copied().unwrap_or(0);
        if start.saturating_add(count) > rows {
            return Err(DalError::OutOfBounds {
                path: path.to_string(),
                what: "rows",
                end: vec![start.saturating_add(count)],
                extent: vec![rows],
            });
        }

        let mut shape = vec![count];
        shape.extend_from_slice(&cell_shape);
        if count == 0 {
            return DataBlock::new(TypedVec::empty(element_type), shape, ArrayOrder::RowMajor);
        }

        let field_size = member.ty.size();
        let mem_type = Datatype::from_descriptor(&TypeDescriptor::Compound(CompoundType {
            fields: vec![CompoundField::new(field, member.ty.clone(), 0, 0)],
            size: field_size,
        }))?;
        let mem_space = SpaceGuard::memory(count, path)?;
        let file_space = SpaceGuard::rows_of(&ds, start, count, path)?;
        let mut raw = vec![0_u8; count * field_size];
        let status = unsafe {
            H5Dread(
                ds.id(),
                mem_type.id(),
                mem_space.0,
                file_space.0,
                H5P_DEFAULT,
                raw.as_mut_ptr() as *mut c_void,
            )
        };
        if status < 0 {
            return Err(ffi_error("H5Dread", path));
        }
        trace!("read {} rows of {}:{}", count, path, field);
        DataBlock::new(decode(element_type, &raw)?, shape, ArrayOrder::RowMajor)
    }
}

impl Backend for Hdf5Backend {
    fn file_type(&self) -> FileType {
        FileType::Hdf5
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn flush(&self) -> Result<(), DalError> {
        Ok(self.file.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;
    use crate::c32;

    #[test]
    fn test_complex_descriptor() {
        assert_eq!(
            element_type_of(&H5Complex::<f32>::type_descriptor()),
            Some(ElementType::Complex)
        );
        assert_eq!(
            element_type_of(&H5Complex::<i16>::type_descriptor()),
            Some(ElementType::ComplexShort)
        );
        for t in ElementType::ALL {
            assert_eq!(element_type_of(&descriptor(t)), Some(t), "{}", t);
        }
    }

    #[test]
    fn test_decode_packed() {
        let mut raw = vec![];
        let column = TypedVec::from(vec![c32::new(1.0, -2.0), c32::new(3.5, 0.0)]);
        for i in 0..2 {
            push_element_bytes(&column, i, &mut raw).unwrap();
        }
        assert_eq!(raw.len(), 16);
        assert_eq!(decode(ElementType::Complex, &raw).unwrap(), column);
    }

    #[test]
    #[serial]
    fn test_attributes_and_members() {
        let dir = tempdir().unwrap();
        let h5 = Hdf5Backend::create(dir.path().join("a.h5"), IoMode::Create).unwrap();
        h5.create_group("/Station000").unwrap();
        h5.write_attribute("/Station000", "NUM_ANTS", &TypedVec::from(vec![1_u32]))
            .unwrap();
        h5.write_attribute("/Station000", "NUM_ANTS", &TypedVec::from(vec![2_u32]))
            .unwrap();
        h5.write_attribute(
            "/",
            "TSYS",
            &TypedVec::from(vec![1.0_f64, 2.0, 3.0]),
        )
        .unwrap();
        assert_eq!(
            h5.read_attribute("/Station000", "NUM_ANTS").unwrap(),
            TypedVec::from(vec![2_u32])
        );
        assert_eq!(
            h5.read_attribute("/", "TSYS").unwrap(),
            TypedVec::from(vec![1.0_f64, 2.0, 3.0])
        );
        assert!(h5
            .read_attribute("/", "MISSING")
            .unwrap_err()
            .is_not_found());
        h5.delete_attribute("/", "TSYS").unwrap();
        assert!(h5.attribute_names("/").unwrap().is_empty());

        assert_eq!(
            h5.list_members("/", MemberKind::Group).unwrap(),
            vec!["Station000"]
        );
    }

    #[test]
    #[serial]
    fn test_table_round_trip() {
        let dir = tempdir().unwrap();
        let h5 = Hdf5Backend::create(dir.path().join("t.h5"), IoMode::Create).unwrap();
        let fields = [
            FieldDesc::scalar("ID", ElementType::Int),
            FieldDesc::array("POS", ElementType::Double, vec![3]),
            FieldDesc::scalar("VIS", ElementType::Complex),
        ];
        h5.create_table("/table", &fields).unwrap();
        assert_eq!(h5.member_kind("/table"), Some(MemberKind::Table));
        assert_eq!(h5.table_fields("/table").unwrap(), fields.to_vec());

        h5.append_rows(
            "/table",
            &[
                TypedVec::from(vec![7_i32, 8]),
                TypedVec::from(vec![1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]),
                TypedVec::from(vec![c32::new(0.5, 1.5), c32::new(-1.0, 2.0)]),
            ],
        )
        .unwrap();
        assert_eq!(h5.table_rows("/table").unwrap(), 2);

        let pos = h5.read_field("/table", "POS", 1, 1).unwrap();
        assert_eq!(pos.shape(), &[1, 3]);
        assert_eq!(pos.as_slice::<f64>().unwrap(), &[4.0, 5.0, 6.0]);
        let vis = h5.read_field("/table", "VIS", 0, 2).unwrap();
        assert_eq!(vis.as_slice::<c32>().unwrap()[1], c32::new(-1.0, 2.0));
        assert!(h5
            .read_field("/table", "NOPE", 0, 1)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    #[serial]
    fn test_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ro.h5");
        Hdf5Backend::create(&path, IoMode::Create).unwrap();
        let h5 = Hdf5Backend::open(&path, IoMode::ReadOnly).unwrap();
        assert!(matches!(
            h5.create_group("/g"),
            Err(DalError::ReadOnly(_))
        ));
    }

    #[test]
    #[serial]
    fn test_dipole_dataset_survives_reopen() {
        use crate::{
            attribute::AttributeOwner,
            naming::{dipole_dataset_name, station_group_name},
            ArrayDesc, DalFile,
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("L123_tbb.h5");
        {
            let file = DalFile::create(&path, FileType::Hdf5, IoMode::Create).unwrap();
            let station = file.create_group(&station_group_name(0)).unwrap();
            station.set_attribute("NUM_ANTS", 1_u32).unwrap();
            station.set_attribute("STATION_ID", "CS001").unwrap();
            let dipole = station
                .create_array(
                    &dipole_dataset_name(0, 0, 0),
                    &ArrayDesc::new(ElementType::Short, vec![0]).chunked(vec![5000]),
                )
                .unwrap();
            assert_eq!(dipole.dims().unwrap(), vec![0]);
            dipole.extend(&[10]).unwrap();
            dipole.write(0, &(1..=10).collect::<Vec<i16>>()).unwrap();
            file.close().unwrap();
        }

        let file = DalFile::open(&path, IoMode::ReadOnly).unwrap();
        assert_eq!(file.file_type(), FileType::Hdf5);
        let station = file.open_group("Station000").unwrap();
        assert_eq!(station.get_attribute::<u32>("NUM_ANTS").unwrap(), 1);
        assert_eq!(station.get_attribute::<String>("STATION_ID").unwrap(), "CS001");
        let dipole = station.open_array("000000000").unwrap();
        assert!(dipole.is_extendible());
        assert_eq!(dipole.dims().unwrap(), vec![10]);
        assert_eq!(
            dipole.read().unwrap().as_slice::<i16>().unwrap(),
            (1..=10).collect::<Vec<i16>>().as_slice()
        );
        assert!(matches!(dipole.extend(&[20]), Err(DalError::ReadOnly(_))));
    }

    #[test]
    #[serial]
    fn test_chunked_arrays_round_trip() {
        use crate::{attribute::AttributeOwner, DalFile};

        let dir = tempdir().unwrap();
        let file = DalFile::create(dir.path().join("c.h5"), FileType::Hdf5, IoMode::Create).unwrap();
        let root = file.root();

        let ints: Vec<i32> = (0..2500).collect();
        let array = root
            .create_array_with_data("ints", vec![50, 50], vec![10, 10], &ints)
            .unwrap();
        assert_eq!(array.read().unwrap().as_slice::<i32>().unwrap(), ints.as_slice());
        assert_eq!(*array.read().unwrap().get::<i32>(&[3, 7]).unwrap(), 157);

        let vis: Vec<c32> = (0..2500).map(|i| c32::new(i as f32, -(i as f32))).collect();
        let array = root
            .create_array_with_data("vis", vec![2500], vec![1000], &vis)
            .unwrap();
        assert_eq!(array.read_range(2490, 10).unwrap().as_slice::<c32>().unwrap(), &vis[2490..]);

        let raw: Vec<crate::Complex<i16>> =
            (0..100).map(|i| crate::Complex::new(i as i16, 1)).collect();
        let array = root
            .create_array_with_data("raw", vec![100], vec![], &raw)
            .unwrap();
        assert!(!array.is_extendible());
        assert_eq!(
            array.read().unwrap().as_slice::<crate::Complex<i16>>().unwrap(),
            raw.as_slice()
        );
        array
            .set_attribute("UNITS", vec!["counts".to_string(), "counts".to_string()])
            .unwrap();
        assert_eq!(
            array.get_attribute::<Vec<String>>("UNITS").unwrap(),
            vec!["counts", "counts"]
        );
        assert_eq!(root.array_names().unwrap(), vec!["ints", "raw", "vis"]);
    }

    fn extend_and_write_in_chunks<T: Element>(file: &crate::DalFile, name: &str, values: &[T]) {
        let array = file
            .root()
            .create_array(
                name,
                &ArrayDesc::new(T::TYPE, vec![0]).chunked(vec![1000]),
            )
            .unwrap();
        array.extend(&[2500]).unwrap();
        for (offset, len) in [(0, 1000), (1000, 1000), (2000, 500)] {
            array.write(offset, &values[offset..offset + len]).unwrap();
        }
        let reopened = file.root().open_array(name).unwrap();
        assert_eq!(reopened.dims().unwrap(), vec![2500]);
        assert_eq!(reopened.read().unwrap().as_slice::<T>().unwrap(), values);
    }

    #[test]
    #[serial]
    fn test_extend_and_write_in_chunks() {
        use crate::DalFile;

        let dir = tempdir().unwrap();
        let file = DalFile::create(dir.path().join("e.h5"), FileType::Hdf5, IoMode::Create).unwrap();
        extend_and_write_in_chunks(
            &file,
            "short",
            &(0..2500).map(|i| (i % 1000) as i16 - 500).collect::<Vec<_>>(),
        );
        extend_and_write_in_chunks(&file, "int", &(0..2500).collect::<Vec<i32>>());
        extend_and_write_in_chunks(
            &file,
            "complex",
            &(0..2500)
                .map(|i| c32::new(i as f32, 0.5 * i as f32))
                .collect::<Vec<_>>(),
        );
    }

    #[test]
    #[serial]
    fn test_common_attributes_in_hdf5() {
        use crate::{common::CommonAttributes, DalFile};

        let dir = tempdir().unwrap();
        let file = DalFile::create(dir.path().join("m.h5"), FileType::Hdf5, IoMode::Create).unwrap();
        let mut common = CommonAttributes::new("m.h5", "tbb");
        common.observation_nof_stations = Some(1);
        common.observation_stations_list = vec!["CS001".to_string()];
        common.write_to(&file).unwrap();
        assert_eq!(CommonAttributes::read_from(&file).unwrap(), common);
    }

    #[test]
    #[serial]
    fn test_failed_overwrite_keeps_attribute() {
        let dir = tempdir().unwrap();
        let h5 = Hdf5Backend::create(dir.path().join("a.h5"), IoMode::Create).unwrap();
        h5.write_attribute("/", "OBSERVER", &TypedVec::from(vec!["A. Astronomer".to_string()]))
            .unwrap();
        // interior NULs cannot be stored as variable length strings
        assert!(h5
            .write_attribute("/", "OBSERVER", &TypedVec::from(vec!["bad\0name".to_string()]))
            .is_err());
        assert_eq!(
            h5.read_attribute("/", "OBSERVER").unwrap(),
            TypedVec::from(vec!["A. Astronomer".to_string()])
        );
        assert_eq!(h5.attribute_names("/").unwrap(), vec!["OBSERVER"]);

        // a replacement may change type and cardinality
        h5.write_attribute("/", "OBSERVER", &TypedVec::from(vec![1_i32, 2]))
            .unwrap();
        assert_eq!(
            h5.read_attribute("/", "OBSERVER").unwrap(),
            TypedVec::from(vec![1_i32, 2])
        );
        assert_eq!(h5.attribute_names("/").unwrap(), vec!["OBSERVER"]);
    }

    #[test]
    #[serial]
    fn test_set_hyperslab_grows_dataset() {
        use crate::{
            selection::{Hyperslab, SelectionOp},
            DalFile,
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("h.h5");
        {
            let file = DalFile::create(&path, FileType::Hdf5, IoMode::Create).unwrap();
            let mut array = file
                .root()
                .create_array(
                    "000000000",
                    &ArrayDesc::new(ElementType::Short, vec![4]).chunked(vec![4]),
                )
                .unwrap();
            array.write(0, &[1_i16, 2, 3, 4]).unwrap();

            let slab = Hyperslab::new(vec![6], None, Some(vec![4]), None).unwrap();
            assert!(matches!(
                array.set_hyperslab(slab.clone(), SelectionOp::Set, false),
                Err(DalError::OutOfBounds { .. })
            ));
            array.set_hyperslab(slab, SelectionOp::Set, true).unwrap();
            assert_eq!(array.dims().unwrap(), vec![10]);
            array.write_selection(&[7_i16, 8, 9, 10]).unwrap();
            file.close().unwrap();
        }

        let file = DalFile::open(&path, IoMode::ReadOnly).unwrap();
        let array = file.root().open_array("000000000").unwrap();
        assert_eq!(array.dims().unwrap(), vec![10]);
        assert_eq!(
            array.read().unwrap().as_slice::<i16>().unwrap(),
            &[1, 2, 3, 4, 0, 0, 7, 8, 9, 10]
        );
        // blocks of 2 every 3 elements: 0,1  3,4  6,7
        let strided = Hyperslab::new(vec![0], Some(vec![3]), Some(vec![3]), Some(vec![2])).unwrap();
        assert_eq!(
            array.read_hyperslab(&strided).unwrap().as_slice::<i16>().unwrap(),
            &[1, 2, 4, 0, 7, 8]
        );
    }

    #[test]
    #[serial]
    fn test_write_block_2d() {
        use crate::DalFile;

        let dir = tempdir().unwrap();
        let file = DalFile::create(dir.path().join("b.h5"), FileType::Hdf5, IoMode::Create).unwrap();
        let array = file
            .root()
            .create_array("a", &ArrayDesc::new(ElementType::Double, vec![3, 4]))
            .unwrap();
        array
            .write_block(&[1, 1], ndarray::array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].view())
            .unwrap();
        let all = array.read().unwrap().to_array::<f64>().unwrap();
        assert_eq!(all[[1, 1]], 1.0);
        assert_eq!(all[[2, 3]], 6.0);
        assert_eq!(all[[0, 3]], 0.0);
        assert_eq!(
            array.read_range(2, 1).unwrap().as_slice::<f64>().unwrap(),
            &[0.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    #[serial]
    fn test_default_fetch_from_hdf5_table() {
        use crate::DalFile;

        let dir = tempdir().unwrap();
        let file = DalFile::create(dir.path().join("t.h5"), FileType::Hdf5, IoMode::Create).unwrap();
        let beam = file.create_group("beam000").unwrap();
        let table = beam
            .create_table(
                "SB000",
                &[
                    FieldDesc::scalar("TIME", ElementType::Double),
                    FieldDesc::array("XY", ElementType::Complex, vec![2]),
                ],
            )
            .unwrap();
        table
            .append_rows(&[
                TypedVec::from(vec![0.0_f64, 0.5, 1.0]),
                TypedVec::from((0..6).map(|i| c32::new(i as f32, 1.0)).collect::<Vec<_>>()),
            ])
            .unwrap();
        let xy = table.column("XY").unwrap();
        let all = xy.fetch(-1, -1).unwrap();
        assert_eq!(all, xy.fetch(0, 3).unwrap());
        assert_eq!(all.shape(), &[3, 2]);
        assert_eq!(all.order(), ArrayOrder::RowMajor);
        assert_eq!(*all.get::<c32>(&[2, 1]).unwrap(), c32::new(5.0, 1.0));
    }
}
