// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Storage backends.
//!
//! The typed handles in this crate ([`crate::DalFile`], [`crate::Group`], [`crate::DalArray`],
//! [`crate::DalTable`]) never talk to a storage library directly. They address objects by
//! their slash separated path and go through the capability traits defined here, which are
//! implemented by an in-memory backend, an HDF5 backend (feature `hdf5`) and a CASA table
//! backend (feature `ms`).

pub mod error;
pub mod mem;

use std::{
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    data::DataBlock,
    element::{ElementType, TypedVec},
    index::ArrayOrder,
    selection::Hyperslab,
};
pub use error::DalError;
pub use mem::MemBackend;

cfg_if::cfg_if! {
    if #[cfg(feature = "hdf5")] {
        pub mod h5;

        pub use h5::Hdf5Backend;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "ms")] {
        pub mod ms;

        pub use ms::CasaBackend;
    }
}

const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";
const FITS_SIGNATURE: &[u8] = b"SIMPLE  =";

/// The kind of container a file is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    #[default]
    Undefined,
    Hdf5,
    Fits,
    CasaMs,
    CasaImage,
}

impl FileType {
    pub fn name(self) -> &'static str {
        match self {
            FileType::Undefined => "UNDEFINED",
            FileType::Hdf5 => "HDF5",
            FileType::Fits => "FITS",
            FileType::CasaMs => "CASA_MS",
            FileType::CasaImage => "CASA_IMAGE",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "HDF5" => FileType::Hdf5,
            "FITS" => FileType::Fits,
            "CASA_MS" => FileType::CasaMs,
            "CASA_IMAGE" => FileType::CasaImage,
            _ => FileType::Undefined,
        }
    }

    pub fn is_hdf5(self) -> bool {
        self == FileType::Hdf5
    }

    pub fn is_fits(self) -> bool {
        self == FileType::Fits
    }

    /// True for both measurement sets and images.
    pub fn is_casa(self) -> bool {
        matches!(self, FileType::CasaMs | FileType::CasaImage)
    }

    /// The storage order of data fetched from this kind of file.
    pub fn array_order(self) -> ArrayOrder {
        if self.is_casa() {
            ArrayOrder::ColumnMajor
        } else {
            ArrayOrder::RowMajor
        }
    }

    /// Work out the kind of container at `path` from its contents.
    ///
    /// A CASA table is a directory holding a `table.dat`; it is an image when it also holds a
    /// `logtable` but no `ANTENNA` subtable.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self, DalError> {
        let path = path.as_ref();
        if path.is_dir() {
            if !path.join("table.dat").is_file() {
                return Ok(FileType::Undefined);
            }
            if path.join("logtable").is_dir() && !path.join("ANTENNA").is_dir() {
                return Ok(FileType::CasaImage);
            }
            return Ok(FileType::CasaMs);
        }

        let mut magic = [0_u8; 9];
        let mut file = File::open(path)?;
        let mut filled = 0;
        while filled < magic.len() {
            let n = file.read(&mut magic[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        let magic = &magic[..filled];
        Ok(if magic.starts_with(HDF5_SIGNATURE) {
            FileType::Hdf5
        } else if magic.starts_with(FITS_SIGNATURE) {
            FileType::Fits
        } else {
            FileType::Undefined
        })
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IoMode {
    #[default]
    ReadOnly,
    ReadWrite,
    /// Create the file, truncating it if it exists.
    Create,
    /// Create the file, failing if it exists.
    CreateNew,
}

impl IoMode {
    pub fn is_writable(self) -> bool {
        self != IoMode::ReadOnly
    }
}

/// The parameters of a new array.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayDesc {
    pub element_type: ElementType,
    pub shape: Vec<usize>,
    /// Chunk granularity. Empty means a contiguous, fixed size array; otherwise the array is
    /// extendible along every axis.
    pub chunk: Vec<usize>,
}

impl ArrayDesc {
    pub fn new(element_type: ElementType, shape: Vec<usize>) -> Self {
        Self {
            element_type,
            shape,
            chunk: vec![],
        }
    }

    pub fn chunked(mut self, chunk: Vec<usize>) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn is_extendible(&self) -> bool {
        !self.chunk.is_empty()
    }

    pub(crate) fn validate(&self, function: &str) -> Result<(), DalError> {
        if self.shape.is_empty() {
            return Err(DalError::BadArrayShape {
                argument: "shape".to_string(),
                function: function.to_string(),
                expected: "rank >= 1".to_string(),
                received: format!("{:?}", self.shape),
            });
        }
        if self.is_extendible()
            && (self.chunk.len() != self.shape.len() || self.chunk.contains(&0))
        {
            return Err(DalError::BadArrayShape {
                argument: "chunk".to_string(),
                function: function.to_string(),
                expected: format!("{} non-zero extents", self.shape.len()),
                received: format!("{:?}", self.chunk),
            });
        }
        Ok(())
    }
}

/// What a backend reports about an existing array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInfo {
    pub element_type: ElementType,
    pub shape: Vec<usize>,
    pub chunk: Vec<usize>,
    pub extendible: bool,
}

/// One field of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDesc {
    pub name: String,
    pub element_type: ElementType,
    /// Shape of the value stored in each row; empty for scalar fields.
    pub cell_shape: Vec<usize>,
}

impl FieldDesc {
    pub fn scalar<S: Into<String>>(name: S, element_type: ElementType) -> Self {
        Self {
            name: name.into(),
            element_type,
            cell_shape: vec![],
        }
    }

    pub fn array<S: Into<String>>(name: S, element_type: ElementType, cell_shape: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            element_type,
            cell_shape,
        }
    }

    pub fn is_array(&self) -> bool {
        !self.cell_shape.is_empty()
    }

    /// Number of elements per row.
    pub fn cell_len(&self) -> usize {
        self.cell_shape.iter().product()
    }
}

/// The kinds of object that live in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Group,
    Array,
    Table,
}

impl MemberKind {
    pub fn name(self) -> &'static str {
        match self {
            MemberKind::Group => "group",
            MemberKind::Array => "array",
            MemberKind::Table => "table",
        }
    }
}

pub trait GroupStore {
    fn create_group(&self, path: &str) -> Result<(), DalError>;

    fn member_kind(&self, path: &str) -> Option<MemberKind>;

    /// Names (not paths) of the members of the group at `path` of the given kind.
    fn list_members(&self, path: &str, kind: MemberKind) -> Result<Vec<String>, DalError>;
}

pub trait AttributeStore {
    /// Create or overwrite the attribute `name` of the object at `owner`.
    fn write_attribute(&self, owner: &str, name: &str, value: &TypedVec) -> Result<(), DalError>;

    fn read_attribute(&self, owner: &str, name: &str) -> Result<TypedVec, DalError>;

    fn attribute_names(&self, owner: &str) -> Result<Vec<String>, DalError>;

    fn delete_attribute(&self, owner: &str, name: &str) -> Result<(), DalError>;
}

/// Multi-dimensional arrays. Point lists are always in row-major coordinates.
pub trait ArrayStore {
    fn create_array(&self, path: &str, desc: &ArrayDesc) -> Result<(), DalError>;

    /// Queried from the live object every time.
    fn array_info(&self, path: &str) -> Result<ArrayInfo, DalError>;

    fn resize_array(&self, path: &str, shape: &[usize]) -> Result<(), DalError>;

    /// Write `data`, in row-major order, to the elements selected by `slab`.
    fn write_slab(&self, path: &str, slab: &Hyperslab, data: &TypedVec) -> Result<(), DalError>;

    /// The elements selected by `slab`, in row-major order.
    fn read_slab(&self, path: &str, slab: &Hyperslab) -> Result<TypedVec, DalError>;

    /// Write `data[i]` to `points[i]`. Used for selections combined from several hyperslabs.
    fn write_points(&self, path: &str, points: &[Vec<usize>], data: &TypedVec) -> Result<(), DalError>;

    fn read_points(&self, path: &str, points: &[Vec<usize>]) -> Result<TypedVec, DalError>;

    /// The whole array, in row-major order.
    fn read_all(&self, path: &str) -> Result<TypedVec, DalError>;
}

pub trait TableStore {
    fn create_table(&self, path: &str, fields: &[FieldDesc]) -> Result<(), DalError>;

    fn table_fields(&self, path: &str) -> Result<Vec<FieldDesc>, DalError>;

    fn table_rows(&self, path: &str) -> Result<usize, DalError>;

    /// Append rows, one buffer per field holding `rows · cell_len` elements.
    fn append_rows(&self, path: &str, columns: &[TypedVec]) -> Result<(), DalError>;

    /// `count` rows of one field starting at row `start`, tagged with the storage order of the
    /// backend.
    fn read_field(
        &self,
        path: &str,
        field: &str,
        start: usize,
        count: usize,
    ) -> Result<DataBlock, DalError>;
}

/// A complete storage backend.
pub trait Backend: GroupStore + AttributeStore + ArrayStore + TableStore {
    fn file_type(&self) -> FileType;

    /// Where the data lives, if anywhere.
    fn path(&self) -> Option<&Path>;

    fn flush(&self) -> Result<(), DalError> {
        Ok(())
    }
}

/// Open the backend for an existing file, choosing it from the file's contents.
#[cfg_attr(not(any(feature = "hdf5", feature = "ms")), allow(unused_variables))]
pub fn open_backend<P: AsRef<Path>>(path: P, mode: IoMode) -> Result<Box<dyn Backend>, DalError> {
    let path = path.as_ref();
    let file_type = FileType::detect(path)?;
    log::debug!("opening {} as {}", path.display(), file_type);
    match file_type {
        #[cfg(feature = "hdf5")]
        FileType::Hdf5 => Ok(Box::new(Hdf5Backend::open(path, mode)?)),
        #[cfg(feature = "ms")]
        FileType::CasaMs | FileType::CasaImage => {
            Ok(Box::new(CasaBackend::open(path, file_type, mode)?))
        }
        other => {
            log::warn!("no backend for {} ({})", path.display(), other);
            Err(DalError::Unsupported {
                file_type: other,
                operation: format!("opening {}", path.display()),
            })
        }
    }
}

/// Create a new file of `file_type` at `path`.
#[cfg_attr(not(feature = "hdf5"), allow(unused_variables))]
pub fn create_backend<P: AsRef<Path>>(
    path: P,
    file_type: FileType,
    mode: IoMode,
) -> Result<Box<dyn Backend>, DalError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    log::debug!("creating {} as {}", path.display(), file_type);
    match file_type {
        #[cfg(feature = "hdf5")]
        FileType::Hdf5 => Ok(Box::new(Hdf5Backend::create(&path, mode)?)),
        other => Err(DalError::Unsupported {
            file_type: other,
            operation: format!("creating {}", path.display()),
        }),
    }
}

/// Check a set of appended columns against the table fields and return the number of rows
/// they hold.
pub(crate) fn rows_in(
    fields: &[FieldDesc],
    columns: &[TypedVec],
    function: &str,
) -> Result<usize, DalError> {
    if columns.len() != fields.len() {
        return Err(DalError::BadArrayShape {
            argument: "columns".to_string(),
            function: function.to_string(),
            expected: format!("{} columns", fields.len()),
            received: format!("{} columns", columns.len()),
        });
    }
    let mut rows = None;
    for (field, column) in fields.iter().zip(columns) {
        if column.element_type() != field.element_type {
            return Err(DalError::type_mismatch(
                &field.name,
                field.element_type,
                column.element_type(),
            ));
        }
        let cell = field.cell_len();
        if cell == 0 || column.len() % cell != 0 {
            return Err(DalError::BadArrayShape {
                argument: field.name.clone(),
                function: function.to_string(),
                expected: format!("a multiple of {} elements", cell),
                received: format!("{} elements", column.len()),
            });
        }
        let n = column.len() / cell;
        match rows {
            None => rows = Some(n),
            Some(r) if r != n => {
                return Err(DalError::BadArrayShape {
                    argument: field.name.clone(),
                    function: function.to_string(),
                    expected: format!("{} rows", r),
                    received: format!("{} rows", n),
                })
            }
            Some(_) => {}
        }
    }
    Ok(rows.unwrap_or(0))
}

/// Join a child name onto a group path.
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Split a path into its parent group and final name.
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("/", path),
    }
}
