// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tables and per-field column views.

use log::{debug, trace};

use crate::{
    attribute::AttributeOwner,
    data::DataBlock,
    element::{ElementType, TypedVec},
    file::{check_member_name, DalFile},
    io::{split_path, Backend, DalError, FieldDesc},
};

/// A handle to a table: a sequence of rows, each holding one value (or one fixed shape cell of
/// values) per field.
#[derive(Debug)]
pub struct DalTable<'f> {
    file: &'f DalFile,
    path: String,
}

impl<'f> DalTable<'f> {
    pub(crate) fn create(file: &'f DalFile, path: String, fields: &[FieldDesc]) -> Result<Self, DalError> {
        if fields.is_empty() {
            return Err(DalError::BadArrayShape {
                argument: "fields".to_string(),
                function: "DalTable::create".to_string(),
                expected: "at least one field".to_string(),
                received: "none".to_string(),
            });
        }
        for (i, field) in fields.iter().enumerate() {
            check_member_name(&field.name)?;
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(DalError::Exists {
                    kind: "field",
                    name: field.name.clone(),
                    owner: path,
                });
            }
        }
        file.backend().create_table(&path, fields)?;
        debug!("created table {} with {} fields", path, fields.len());
        Ok(Self { file, path })
    }

    pub(crate) fn open(file: &'f DalFile, path: String) -> Result<Self, DalError> {
        // Touch the table so that a missing one is reported here.
        let rows = file.backend().table_rows(&path)?;
        trace!("opened table {} with {} rows", path, rows);
        Ok(Self { file, path })
    }

    pub fn name(&self) -> &str {
        split_path(&self.path).1
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fields(&self) -> Result<Vec<FieldDesc>, DalError> {
        self.file.backend().table_fields(&self.path)
    }

    pub fn field_names(&self) -> Result<Vec<String>, DalError> {
        Ok(self.fields()?.into_iter().map(|f| f.name).collect())
    }

    /// Queried from the file every time.
    pub fn num_rows(&self) -> Result<usize, DalError> {
        self.file.backend().table_rows(&self.path)
    }

    /// Append rows, one buffer per field in field order. Each buffer holds `rows · cell_len`
    /// elements, in row-major order within a cell.
    pub fn append_rows(&self, columns: &[TypedVec]) -> Result<(), DalError> {
        self.file.backend().append_rows(&self.path, columns)?;
        trace!("appended to {}", self.path);
        Ok(())
    }

    /// A view of one field.
    pub fn column(&self, name: &str) -> Result<ColumnView<'f>, DalError> {
        let field = self
            .fields()?
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| DalError::not_found("field", name, &self.path))?;
        Ok(ColumnView {
            file: self.file,
            table: self.path.clone(),
            field,
        })
    }

    pub fn close(self) {
        trace!("closing table {}", self.path);
    }
}

impl AttributeOwner for DalTable<'_> {
    fn backend(&self) -> &dyn Backend {
        self.file.backend()
    }

    fn object_path(&self) -> &str {
        &self.path
    }
}

/// One field of a table, seen across its rows.
///
/// The view describes the field as it was when the view was made, but the number of rows is
/// owned by the table and queried whenever it is needed.
#[derive(Debug)]
pub struct ColumnView<'f> {
    file: &'f DalFile,
    table: String,
    field: FieldDesc,
}

impl ColumnView<'_> {
    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn element_type(&self) -> ElementType {
        self.field.element_type
    }

    /// Whether each row holds a cell of values rather than a single value.
    pub fn is_array(&self) -> bool {
        self.field.is_array()
    }

    pub fn cell_shape(&self) -> &[usize] {
        &self.field.cell_shape
    }

    pub fn num_rows(&self) -> Result<usize, DalError> {
        self.file.backend().table_rows(&self.table)
    }

    /// Read `length` rows starting at row `start`. A negative `start` means the first row and a
    /// negative `length` means every row from `start` to the end.
    ///
    /// The block is tagged with the storage order of the file: row-major with the row axis
    /// first for HDF5 and memory, column-major with the row axis last for CASA tables.
    pub fn fetch(&self, start: i64, length: i64) -> Result<DataBlock, DalError> {
        let start = start.max(0) as usize;
        let length = if length < 0 {
            self.num_rows()?.saturating_sub(start)
        } else {
            length as usize
        };
        trace!(
            "fetching {} rows of {}:{} from {}",
            length,
            self.table,
            self.field.name,
            start
        );
        self.file
            .backend()
            .read_field(&self.table, &self.field.name, start, length)
    }
}
