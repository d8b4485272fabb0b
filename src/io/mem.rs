// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A backend that keeps the whole hierarchy in memory.
//!
//! It follows the HDF5 object model (groups, n-dimensional arrays stored in C order, compound
//! tables and attributes on every object) and is used wherever a scratch file is not wanted.

use std::{cell::RefCell, collections::BTreeMap, path::Path};

use log::trace;

use super::{
    join_path, split_path, ArrayDesc, ArrayInfo, ArrayStore, AttributeStore, Backend, DalError,
    FieldDesc, FileType, GroupStore, MemberKind, TableStore,
};
use crate::{
    data::DataBlock,
    element::TypedVec,
    index::{flat_index, ArrayOrder},
    selection::Hyperslab,
};

#[derive(Debug, Clone)]
struct MemArray {
    desc: ArrayDesc,
    /// Row-major.
    data: TypedVec,
}

#[derive(Debug, Clone)]
struct MemTable {
    fields: Vec<FieldDesc>,
    columns: Vec<TypedVec>,
    rows: usize,
}

#[derive(Debug, Clone)]
enum Object {
    Group,
    Array(MemArray),
    Table(MemTable),
}

impl Object {
    fn kind(&self) -> MemberKind {
        match self {
            Object::Group => MemberKind::Group,
            Object::Array(_) => MemberKind::Array,
            Object::Table(_) => MemberKind::Table,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    object: Object,
    attributes: BTreeMap<String, TypedVec>,
}

/// An in-memory file.
#[derive(Debug)]
pub struct MemBackend {
    nodes: RefCell<BTreeMap<String, Node>>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemBackend {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Node {
                object: Object::Group,
                attributes: BTreeMap::new(),
            },
        );
        Self {
            nodes: RefCell::new(nodes),
        }
    }

    fn insert(&self, path: &str, object: Object) -> Result<(), DalError> {
        let (parent, name) = split_path(path);
        if name.is_empty() {
            return Err(DalError::InvalidName(path.to_string()));
        }
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get(parent) {
            Some(Node {
                object: Object::Group,
                ..
            }) => {}
            Some(_) => {
                return Err(DalError::InvalidHandle {
                    kind: "group",
                    path: parent.to_string(),
                })
            }
            None => return Err(DalError::not_found("group", parent, "/")),
        }
        if let Some(existing) = nodes.get(path) {
            return Err(DalError::Exists {
                kind: existing.object.kind().name(),
                name: name.to_string(),
                owner: parent.to_string(),
            });
        }
        nodes.insert(
            path.to_string(),
            Node {
                object,
                attributes: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn with_array<R>(
        &self,
        path: &str,
        f: impl FnOnce(&mut MemArray) -> Result<R, DalError>,
    ) -> Result<R, DalError> {
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get_mut(path) {
            Some(Node {
                object: Object::Array(array),
                ..
            }) => f(array),
            Some(_) => Err(DalError::InvalidHandle {
                kind: "array",
                path: path.to_string(),
            }),
            None => {
                let (parent, name) = split_path(path);
                Err(DalError::not_found("array", name, parent))
            }
        }
    }

    fn with_table<R>(
        &self,
        path: &str,
        f: impl FnOnce(&mut MemTable) -> Result<R, DalError>,
    ) -> Result<R, DalError> {
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get_mut(path) {
            Some(Node {
                object: Object::Table(table),
                ..
            }) => f(table),
            Some(_) => Err(DalError::InvalidHandle {
                kind: "table",
                path: path.to_string(),
            }),
            None => {
                let (parent, name) = split_path(path);
                Err(DalError::not_found("table", name, parent))
            }
        }
    }
}

/// Flat row-major offsets of `points`, checked against `shape`.
fn offsets(shape: &[usize], points: &[Vec<usize>]) -> Result<Vec<usize>, DalError> {
    points
        .iter()
        .map(|p| Ok(flat_index(shape, ArrayOrder::RowMajor, p)?))
        .collect()
}

impl GroupStore for MemBackend {
    fn create_group(&self, path: &str) -> Result<(), DalError> {
        self.insert(path, Object::Group)
    }

    fn member_kind(&self, path: &str) -> Option<MemberKind> {
        self.nodes.borrow().get(path).map(|n| n.object.kind())
    }

    fn list_members(&self, path: &str, kind: MemberKind) -> Result<Vec<String>, DalError> {
        let nodes = self.nodes.borrow();
        match nodes.get(path) {
            Some(Node {
                object: Object::Group,
                ..
            }) => {}
            _ => return Err(DalError::not_found("group", path, "/")),
        }
        Ok(nodes
            .iter()
            .filter(|(p, n)| {
                p.as_str() != "/" && split_path(p).0 == path && n.object.kind() == kind
            })
            .map(|(p, _)| split_path(p).1.to_string())
            .collect())
    }
}

impl AttributeStore for MemBackend {
    fn write_attribute(&self, owner: &str, name: &str, value: &TypedVec) -> Result<(), DalError> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes.get_mut(owner).ok_or_else(|| DalError::InvalidHandle {
            kind: "object",
            path: owner.to_string(),
        })?;
        node.attributes.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn read_attribute(&self, owner: &str, name: &str) -> Result<TypedVec, DalError> {
        let nodes = self.nodes.borrow();
        let node = nodes.get(owner).ok_or_else(|| DalError::InvalidHandle {
            kind: "object",
            path: owner.to_string(),
        })?;
        node.attributes
            .get(name)
            .cloned()
            .ok_or_else(|| DalError::not_found("attribute", name, owner))
    }

    fn attribute_names(&self, owner: &str) -> Result<Vec<String>, DalError> {
        let nodes = self.nodes.borrow();
        let node = nodes.get(owner).ok_or_else(|| DalError::InvalidHandle {
            kind: "object",
            path: owner.to_string(),
        })?;
        Ok(node.attributes.keys().cloned().collect())
    }

    fn delete_attribute(&self, owner: &str, name: &str) -> Result<(), DalError> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes.get_mut(owner).ok_or_else(|| DalError::InvalidHandle {
            kind: "object",
            path: owner.to_string(),
        })?;
        node.attributes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DalError::not_found("attribute", name, owner))
    }
}

/// Flat row-major offsets of the elements of `slab`, checked against `shape`.
fn slab_offsets(path: &str, shape: &[usize], slab: &Hyperslab) -> Result<Vec<usize>, DalError> {
    if slab.num_points() > 0 && !slab.fits_within(shape) {
        return Err(DalError::OutOfBounds {
            path: path.to_string(),
            what: "hyperslab",
            end: slab.end(),
            extent: shape.to_vec(),
        });
    }
    Ok(slab.flat_offsets(shape))
}

impl ArrayStore for MemBackend {
    fn create_array(&self, path: &str, desc: &ArrayDesc) -> Result<(), DalError> {
        desc.validate("MemBackend::create_array")?;
        let len = desc.shape.iter().product();
        self.insert(
            path,
            Object::Array(MemArray {
                desc: desc.clone(),
                data: TypedVec::filled(desc.element_type, len),
            }),
        )
    }

    fn array_info(&self, path: &str) -> Result<ArrayInfo, DalError> {
        self.with_array(path, |a| {
            Ok(ArrayInfo {
                element_type: a.desc.element_type,
                shape: a.desc.shape.clone(),
                chunk: a.desc.chunk.clone(),
                extendible: a.desc.is_extendible(),
            })
        })
    }

    fn resize_array(&self, path: &str, shape: &[usize]) -> Result<(), DalError> {
        self.with_array(path, |a| {
            if shape.len() != a.desc.shape.len() {
                return Err(DalError::BadArrayShape {
                    argument: "shape".to_string(),
                    function: "MemBackend::resize_array".to_string(),
                    expected: format!("rank {}", a.desc.shape.len()),
                    received: format!("{:?}", shape),
                });
            }
            if !a.desc.is_extendible() {
                return Err(DalError::NotExtendible(path.to_string()));
            }
            // Copy the overlap of the old and new extents into a fresh buffer.
            let overlap: Vec<usize> = a
                .desc
                .shape
                .iter()
                .zip(shape)
                .map(|(&old, &new)| old.min(new))
                .collect();
            let mut data = TypedVec::filled(a.desc.element_type, shape.iter().product());
            if overlap.iter().all(|&n| n > 0) {
                let overlap = Hyperslab::contiguous(vec![0; shape.len()], overlap);
                let from = overlap.flat_offsets(&a.desc.shape);
                let to = overlap.flat_offsets(shape);
                data.scatter(&to, &a.data.gather(&from))
                    .map_err(|found| DalError::type_mismatch(path, a.desc.element_type, found))?;
            }
            trace!("resized {} from {:?} to {:?}", path, a.desc.shape, shape);
            a.desc.shape = shape.to_vec();
            a.data = data;
            Ok(())
        })
    }

    fn write_slab(&self, path: &str, slab: &Hyperslab, data: &TypedVec) -> Result<(), DalError> {
        self.with_array(path, |a| {
            let to = slab_offsets(path, &a.desc.shape, slab)?;
            if to.len() != data.len() {
                return Err(DalError::BadArrayShape {
                    argument: "data".to_string(),
                    function: "MemBackend::write_slab".to_string(),
                    expected: format!("{} elements", to.len()),
                    received: format!("{} elements", data.len()),
                });
            }
            a.data
                .scatter(&to, data)
                .map_err(|found| DalError::type_mismatch(path, a.desc.element_type, found))
        })
    }

    fn read_slab(&self, path: &str, slab: &Hyperslab) -> Result<TypedVec, DalError> {
        self.with_array(path, |a| {
            let from = slab_offsets(path, &a.desc.shape, slab)?;
            Ok(a.data.gather(&from))
        })
    }

    fn write_points(&self, path: &str, points: &[Vec<usize>], data: &TypedVec) -> Result<(), DalError> {
        self.with_array(path, |a| {
            let to = offsets(&a.desc.shape, points)?;
            a.data
                .scatter(&to, data)
                .map_err(|found| DalError::type_mismatch(path, a.desc.element_type, found))
        })
    }

    fn read_points(&self, path: &str, points: &[Vec<usize>]) -> Result<TypedVec, DalError> {
        self.with_array(path, |a| {
            let from = offsets(&a.desc.shape, points)?;
            Ok(a.data.gather(&from))
        })
    }

    fn read_all(&self, path: &str) -> Result<TypedVec, DalError> {
        self.with_array(path, |a| Ok(a.data.clone()))
    }
}

impl TableStore for MemBackend {
    fn create_table(&self, path: &str, fields: &[FieldDesc]) -> Result<(), DalError> {
        self.insert(
            path,
            Object::Table(MemTable {
                fields: fields.to_vec(),
                columns: fields
                    .iter()
                    .map(|f| TypedVec::empty(f.element_type))
                    .collect(),
                rows: 0,
            }),
        )
    }

    fn table_fields(&self, path: &str) -> Result<Vec<FieldDesc>, DalError> {
        self.with_table(path, |t| Ok(t.fields.clone()))
    }

    fn table_rows(&self, path: &str) -> Result<usize, DalError> {
        self.with_table(path, |t| Ok(t.rows))
    }

    fn append_rows(&self, path: &str, columns: &[TypedVec]) -> Result<(), DalError> {
        self.with_table(path, |t| {
            let rows = super::rows_in(&t.fields, columns, "MemBackend::append_rows")?;
            for (column, values) in t.columns.iter_mut().zip(columns) {
                column
                    .extend_from(values)
                    .map_err(|found| DalError::type_mismatch(path, column.element_type(), found))?;
            }
            t.rows += rows;
            Ok(())
        })
    }

    fn read_field(
        &self,
        path: &str,
        field: &str,
        start: usize,
        count: usize,
    ) -> Result<DataBlock, DalError> {
        self.with_table(path, |t| {
            let i = t
                .fields
                .iter()
                .position(|f| f.name == field)
                .ok_or_else(|| DalError::not_found("field", field, path))?;
            if start.saturating_add(count) > t.rows {
                return Err(DalError::OutOfBounds {
                    path: path.to_string(),
                    what: "rows",
                    end: vec![start.saturating_add(count)],
                    extent: vec![t.rows],
                });
            }
            let desc = &t.fields[i];
            let cell = desc.cell_len();
            let mut shape = vec![count];
            shape.extend_from_slice(&desc.cell_shape);
            DataBlock::new(
                t.columns[i].slice(start * cell, count * cell),
                shape,
                ArrayOrder::RowMajor,
            )
        })
    }
}

impl Backend for MemBackend {
    fn file_type(&self) -> FileType {
        FileType::Undefined
    }

    fn path(&self) -> Option<&Path> {
        None
    }
}
