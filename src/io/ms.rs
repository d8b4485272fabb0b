// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Read-only access to CASA tables (measurement sets and images).
//!
//! A CASA container is exposed as a single root group holding one table per table directory:
//! `MAIN` for the container itself and one entry per subtable (`ANTENNA`, `SPECTRAL_WINDOW`,
//! ...). Table keywords are the attributes of their table; the keywords of the main table are
//! also the attributes of the root group. Casacore stores array cells in Fortran order, so
//! every block fetched from here is tagged column-major, with the row axis last.

use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use rubbl_casatables::{GlueDataType, Table, TableOpenMode};

use super::{
    split_path, ArrayDesc, ArrayInfo, ArrayStore, AttributeStore, Backend, DalError, FieldDesc,
    FileType, GroupStore, IoMode, MemberKind, TableStore,
};
use crate::{
    c32, c64,
    data::DataBlock,
    element::{ElementType, TypedVec},
    index::ArrayOrder,
    selection::Hyperslab,
};

/// The name under which the main table of a container is listed.
pub const MAIN_TABLE: &str = "MAIN";

fn casa_error<E: std::fmt::Display>(e: E) -> DalError {
    DalError::Casacore(e.to_string())
}

/// The element type of a casacore column type, if it is one we can read.
fn element_type_of(data_type: GlueDataType) -> Option<ElementType> {
    Some(match data_type {
        GlueDataType::TpBool => ElementType::Bool,
        GlueDataType::TpChar => ElementType::Char,
        GlueDataType::TpShort => ElementType::Short,
        GlueDataType::TpInt => ElementType::Int,
        GlueDataType::TpUInt => ElementType::UInt,
        GlueDataType::TpInt64 => ElementType::Long,
        GlueDataType::TpFloat => ElementType::Float,
        GlueDataType::TpDouble => ElementType::Double,
        GlueDataType::TpComplex => ElementType::Complex,
        GlueDataType::TpDComplex => ElementType::DComplex,
        GlueDataType::TpString => ElementType::String,
        _ => return None,
    })
}

/// Read `count` rows of a column starting at `start`, concatenating array cells.
macro_rules! read_rows {
    ($table:expr, $ty:ty, $variant:ident, $field:expr, $scalar:expr, $start:expr, $count:expr) => {{
        if $scalar {
            let mut all = $table
                .get_col_as_vec::<$ty>($field)
                .map_err(casa_error)?;
            all.truncate($start + $count);
            TypedVec::$variant(all.split_off($start))
        } else {
            let mut values: Vec<$ty> = vec![];
            for row in $start..$start + $count {
                values.extend(
                    $table
                        .get_cell_as_vec::<$ty>($field, row as u64)
                        .map_err(casa_error)?,
                );
            }
            TypedVec::$variant(values)
        }
    }};
}

/// The number of elements in the first cell of an array column.
fn first_cell_len(table: &mut Table, column: &str, element_type: ElementType) -> Result<usize, DalError> {
    macro_rules! len_as {
        ($ty:ty) => {
            table
                .get_cell_as_vec::<$ty>(column, 0)
                .map(|v| v.len())
                .map_err(casa_error)
        };
    }
    match element_type {
        ElementType::Bool => len_as!(bool),
        ElementType::Char => len_as!(i8),
        ElementType::Short => len_as!(i16),
        ElementType::Int => len_as!(i32),
        ElementType::UInt => len_as!(u32),
        ElementType::Long => len_as!(i64),
        ElementType::Float => len_as!(f32),
        ElementType::Double => len_as!(f64),
        ElementType::Complex => len_as!(c32),
        ElementType::DComplex => len_as!(c64),
        ElementType::String => len_as!(String),
        ElementType::ComplexChar | ElementType::ComplexShort => Err(DalError::Unsupported {
            file_type: FileType::CasaMs,
            operation: format!("reading {} columns", element_type),
        }),
    }
}

/// A CASA table container opened for reading.
pub struct CasaBackend {
    root: PathBuf,
    file_type: FileType,
}

impl CasaBackend {
    /// Open the container at `path`. Only [`IoMode::ReadOnly`] is accepted.
    pub fn open<P: AsRef<Path>>(path: P, file_type: FileType, mode: IoMode) -> Result<Self, DalError> {
        let root = path.as_ref().to_path_buf();
        if mode.is_writable() {
            warn!("{} can only be opened read-only", root.display());
            return Err(DalError::Unsupported {
                file_type,
                operation: format!("opening {} with {:?}", root.display(), mode),
            });
        }
        // Fail early on something that is not a table.
        let table = Table::open(&root, TableOpenMode::Read).map_err(casa_error)?;
        debug!(
            "opened {} {} with {} rows in the main table",
            file_type,
            root.display(),
            table.n_rows()
        );
        Ok(Self { root, file_type })
    }

    /// Names of the subtables stored inside the container.
    fn subtables(&self) -> Result<Vec<String>, DalError> {
        let mut names = vec![];
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().join("table.dat").is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// The directory of the table at `path`. The root group stands for the main table.
    fn table_dir(&self, path: &str) -> Result<PathBuf, DalError> {
        let (parent, name) = split_path(path);
        if path == "/" || (parent == "/" && name == MAIN_TABLE) {
            return Ok(self.root.clone());
        }
        let dir = self.root.join(name);
        if parent == "/" && !name.is_empty() && dir.join("table.dat").is_file() {
            Ok(dir)
        } else {
            Err(DalError::not_found("table", name, parent))
        }
    }

    fn open_table(&self, path: &str) -> Result<Table, DalError> {
        let dir = self.table_dir(path)?;
        trace!("opening table {}", dir.display());
        Table::open(&dir, TableOpenMode::Read).map_err(casa_error)
    }

    fn read_only(&self, operation: &str) -> DalError {
        DalError::Unsupported {
            file_type: self.file_type,
            operation: operation.to_string(),
        }
    }

    fn no_arrays(&self) -> DalError {
        self.read_only("n-dimensional arrays")
    }

    /// Read a keyword, trying the value types casacore keywords commonly hold.
    fn read_keyword(&self, table: &mut Table, owner: &str, name: &str) -> Result<TypedVec, DalError> {
        let mut record = table.get_keyword_record().map_err(casa_error)?;
        if let Ok(v) = record.get_field::<String>(name) {
            return Ok(TypedVec::String(vec![v]));
        }
        if let Ok(v) = record.get_field::<bool>(name) {
            return Ok(TypedVec::Bool(vec![v]));
        }
        if let Ok(v) = record.get_field::<i32>(name) {
            return Ok(TypedVec::Int(vec![v]));
        }
        if let Ok(v) = record.get_field::<f64>(name) {
            return Ok(TypedVec::Double(vec![v]));
        }
        if let Ok(v) = record.get_field::<Vec<String>>(name) {
            return Ok(TypedVec::String(v));
        }
        if let Ok(v) = record.get_field::<Vec<i32>>(name) {
            return Ok(TypedVec::Int(v));
        }
        if let Ok(v) = record.get_field::<Vec<f64>>(name) {
            return Ok(TypedVec::Double(v));
        }
        Err(DalError::Unsupported {
            file_type: self.file_type,
            operation: format!("reading keyword {:?} of {}", name, owner),
        })
    }
}

impl GroupStore for CasaBackend {
    fn create_group(&self, _path: &str) -> Result<(), DalError> {
        Err(self.read_only("creating groups"))
    }

    fn member_kind(&self, path: &str) -> Option<MemberKind> {
        if path == "/" {
            Some(MemberKind::Group)
        } else if self.table_dir(path).is_ok() {
            Some(MemberKind::Table)
        } else {
            None
        }
    }

    fn list_members(&self, path: &str, kind: MemberKind) -> Result<Vec<String>, DalError> {
        if path != "/" {
            return Err(DalError::not_found("group", path, "/"));
        }
        Ok(match kind {
            MemberKind::Table => {
                let mut names = vec![MAIN_TABLE.to_string()];
                names.extend(self.subtables()?);
                names
            }
            MemberKind::Group | MemberKind::Array => vec![],
        })
    }
}

impl AttributeStore for CasaBackend {
    fn write_attribute(&self, _owner: &str, _name: &str, _value: &TypedVec) -> Result<(), DalError> {
        Err(self.read_only("writing keywords"))
    }

    fn read_attribute(&self, owner: &str, name: &str) -> Result<TypedVec, DalError> {
        let mut table = self.open_table(owner)?;
        let names = table.table_keyword_names().map_err(casa_error)?;
        if !names.iter().any(|n| n == name) {
            return Err(DalError::not_found("attribute", name, owner));
        }
        self.read_keyword(&mut table, owner, name)
    }

    fn attribute_names(&self, owner: &str) -> Result<Vec<String>, DalError> {
        let mut table = self.open_table(owner)?;
        let subtables = if self.table_dir(owner)? == self.root {
            self.subtables()?
        } else {
            vec![]
        };
        // Subtable references are keywords too, but they are listed as tables.
        Ok(table
            .table_keyword_names()
            .map_err(casa_error)?
            .into_iter()
            .filter(|n| !subtables.contains(n))
            .collect())
    }

    fn delete_attribute(&self, _owner: &str, _name: &str) -> Result<(), DalError> {
        Err(self.read_only("deleting keywords"))
    }
}

impl ArrayStore for CasaBackend {
    fn create_array(&self, _path: &str, _desc: &ArrayDesc) -> Result<(), DalError> {
        Err(self.no_arrays())
    }

    fn array_info(&self, _path: &str) -> Result<ArrayInfo, DalError> {
        Err(self.no_arrays())
    }

    fn resize_array(&self, _path: &str, _shape: &[usize]) -> Result<(), DalError> {
        Err(self.no_arrays())
    }

    fn write_slab(&self, _path: &str, _slab: &Hyperslab, _data: &TypedVec) -> Result<(), DalError> {
        Err(self.no_arrays())
    }

    fn read_slab(&self, _path: &str, _slab: &Hyperslab) -> Result<TypedVec, DalError> {
        Err(self.no_arrays())
    }

    fn write_points(&self, _path: &str, _points: &[Vec<usize>], _data: &TypedVec) -> Result<(), DalError> {
        Err(self.no_arrays())
    }

    fn read_points(&self, _path: &str, _points: &[Vec<usize>]) -> Result<TypedVec, DalError> {
        Err(self.no_arrays())
    }

    fn read_all(&self, _path: &str) -> Result<TypedVec, DalError> {
        Err(self.no_arrays())
    }
}

impl TableStore for CasaBackend {
    fn create_table(&self, _path: &str, _fields: &[FieldDesc]) -> Result<(), DalError> {
        Err(self.read_only("creating tables"))
    }

    fn table_fields(&self, path: &str) -> Result<Vec<FieldDesc>, DalError> {
        let mut table = self.open_table(path)?;
        let rows = table.n_rows();
        let mut fields = vec![];
        for name in table.column_names().map_err(casa_error)? {
            let desc = table.get_col_desc(&name).map_err(casa_error)?;
            let element_type = match element_type_of(desc.data_type()) {
                Some(t) => t,
                None => {
                    warn!(
                        "skipping column {} of {}: unsupported type {:?}",
                        name,
                        path,
                        desc.data_type()
                    );
                    continue;
                }
            };
            let cell_shape = if desc.is_scalar() {
                vec![]
            } else if let Some(shape) = desc.shape() {
                shape.iter().map(|&n| n as usize).collect()
            } else if rows > 0 {
                // Variable shape: describe the cells by the first row.
                vec![first_cell_len(&mut table, &name, element_type)?]
            } else {
                vec![0]
            };
            fields.push(FieldDesc {
                name,
                element_type,
                cell_shape,
            });
        }
        Ok(fields)
    }

    fn table_rows(&self, path: &str) -> Result<usize, DalError> {
        Ok(self.open_table(path)?.n_rows() as usize)
    }

    fn append_rows(&self, _path: &str, _columns: &[TypedVec]) -> Result<(), DalError> {
        Err(self.read_only("appending rows"))
    }

    fn read_field(
        &self,
        path: &str,
        field: &str,
        start: usize,
        count: usize,
    ) -> Result<DataBlock, DalError> {
        let desc = self
            .table_fields(path)?
            .into_iter()
            .find(|f| f.name == field)
            .ok_or_else(|| DalError::not_found("field", field, path))?;
        let mut table = self.open_table(path)?;
        let rows = table.n_rows() as usize;
        if start.saturating_add(count) > rows {
            return Err(DalError::OutOfBounds {
                path: path.to_string(),
                what: "rows",
                end: vec![start.saturating_add(count)],
                extent: vec![rows],
            });
        }

        let scalar = !desc.is_array();
        let data = match desc.element_type {
            ElementType::Bool => read_rows!(table, bool, Bool, field, scalar, start, count),
            ElementType::Char => read_rows!(table, i8, Char, field, scalar, start, count),
            ElementType::Short => read_rows!(table, i16, Short, field, scalar, start, count),
            ElementType::Int => read_rows!(table, i32, Int, field, scalar, start, count),
            ElementType::UInt => read_rows!(table, u32, UInt, field, scalar, start, count),
            ElementType::Long => read_rows!(table, i64, Long, field, scalar, start, count),
            ElementType::Float => read_rows!(table, f32, Float, field, scalar, start, count),
            ElementType::Double => read_rows!(table, f64, Double, field, scalar, start, count),
            ElementType::Complex => read_rows!(table, c32, Complex, field, scalar, start, count),
            ElementType::DComplex => read_rows!(table, c64, DComplex, field, scalar, start, count),
            ElementType::String => read_rows!(table, String, String, field, scalar, start, count),
            other => {
                return Err(DalError::Unsupported {
                    file_type: self.file_type,
                    operation: format!("reading {} columns", other),
                })
            }
        };
        trace!("read {} rows of {}:{}", count, path, field);

        // Fortran order: cell axes first, rows last.
        let mut shape = desc.cell_shape.clone();
        shape.push(count);
        DataBlock::new(data, shape, ArrayOrder::ColumnMajor)
    }
}

impl Backend for CasaBackend {
    fn file_type(&self) -> FileType {
        self.file_type
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.root)
    }
}
