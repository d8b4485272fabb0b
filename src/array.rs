// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multi-dimensional, single-typed arrays.

use log::{debug, trace, warn};
use ndarray::{ArrayView, Dimension};

use crate::{
    attribute::AttributeOwner,
    data::DataBlock,
    element::{Element, ElementType},
    file::DalFile,
    index::ArrayOrder,
    io::{split_path, ArrayDesc, Backend, DalError},
    selection::{Hyperslab, Selection, SelectionOp},
};

/// A handle to an array in a file.
///
/// The element type, rank and chunk shape are fixed when the array is created and are cached
/// here; the extent is not, and is queried from the file every time it is needed.
#[derive(Debug)]
pub struct DalArray<'f> {
    file: &'f DalFile,
    path: String,
    element_type: ElementType,
    rank: usize,
    chunk: Vec<usize>,
    extendible: bool,
    selection: Selection,
}

impl<'f> DalArray<'f> {
    pub(crate) fn create(file: &'f DalFile, path: String, desc: &ArrayDesc) -> Result<Self, DalError> {
        file.backend().create_array(&path, desc)?;
        debug!(
            "created {} array {} with shape {:?}",
            desc.element_type, path, desc.shape
        );
        Self::open(file, path)
    }

    pub(crate) fn open(file: &'f DalFile, path: String) -> Result<Self, DalError> {
        let info = file.backend().array_info(&path)?;
        trace!("opened array {} ({:?})", path, info);
        Ok(Self {
            file,
            path,
            element_type: info.element_type,
            rank: info.shape.len(),
            chunk: info.chunk,
            extendible: info.extendible,
            selection: Selection::default(),
        })
    }

    pub fn name(&self) -> &str {
        split_path(&self.path).1
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Empty for a contiguous array.
    pub fn chunk_shape(&self) -> &[usize] {
        &self.chunk
    }

    pub fn is_extendible(&self) -> bool {
        self.extendible
    }

    /// The current extent, as stored in the file.
    pub fn dims(&self) -> Result<Vec<usize>, DalError> {
        Ok(self.file.backend().array_info(&self.path)?.shape)
    }

    pub fn num_elements(&self) -> Result<usize, DalError> {
        Ok(self.dims()?.iter().product())
    }

    /// Grow the array to `new_shape`.
    ///
    /// # Errors
    ///
    /// - [`DalError::NotExtendible`] if the array was created without chunking,
    /// - [`DalError::BadArrayShape`] if the rank differs,
    /// - [`DalError::ShrinkNotAllowed`] if any axis would get smaller; the array is left
    ///   untouched.
    pub fn extend(&self, new_shape: &[usize]) -> Result<(), DalError> {
        if !self.extendible {
            warn!("{} is not chunked and cannot be extended", self.path);
            return Err(DalError::NotExtendible(self.path.clone()));
        }
        let current = self.dims()?;
        if new_shape.len() != current.len() {
            return Err(DalError::BadArrayShape {
                argument: "new_shape".to_string(),
                function: "DalArray::extend".to_string(),
                expected: format!("rank {}", current.len()),
                received: format!("{:?}", new_shape),
            });
        }
        if new_shape.iter().zip(&current).any(|(new, old)| new < old) {
            return Err(DalError::ShrinkNotAllowed {
                path: self.path.clone(),
                current,
                requested: new_shape.to_vec(),
            });
        }
        if new_shape != current.as_slice() {
            self.file.backend().resize_array(&self.path, new_shape)?;
            debug!("extended {} from {:?} to {:?}", self.path, current, new_shape);
        }
        Ok(())
    }

    fn check_type(&self, found: ElementType) -> Result<(), DalError> {
        if found == self.element_type {
            Ok(())
        } else {
            Err(DalError::type_mismatch(&self.path, self.element_type, found))
        }
    }

    /// Write whole rows of the first axis, starting at row `offset`. `data` is in row-major
    /// order and its length must be a multiple of the number of elements per row.
    pub fn write<T: Element>(&self, offset: usize, data: &[T]) -> Result<(), DalError> {
        self.check_type(T::TYPE)?;
        let dims = self.dims()?;
        let row_len: usize = dims.iter().skip(1).product();
        if row_len == 0 || data.len() % row_len != 0 {
            return Err(DalError::BadArrayShape {
                argument: "data".to_string(),
                function: "DalArray::write".to_string(),
                expected: format!("a multiple of {} elements", row_len),
                received: format!("{} elements", data.len()),
            });
        }
        let num_rows = data.len() / row_len;
        match offset.checked_add(num_rows) {
            Some(end) if end <= dims[0] => {}
            end => {
                warn!(
                    "write of {} rows at {} is outside {} of shape {:?}",
                    num_rows, offset, self.path, dims
                );
                return Err(DalError::OutOfBounds {
                    path: self.path.clone(),
                    what: "rows",
                    end: vec![end.unwrap_or(usize::MAX)],
                    extent: dims,
                });
            }
        }
        if data.is_empty() {
            return Ok(());
        }
        let slab = Hyperslab::rows(offset, num_rows, &dims);
        trace!("writing {} rows at {} of {}", num_rows, offset, self.path);
        self.file
            .backend()
            .write_slab(&self.path, &slab, &T::wrap(data.to_vec()))
    }

    /// Write an n-dimensional block with its first corner at `start`.
    pub fn write_block<T: Element, D: Dimension>(
        &self,
        start: &[usize],
        block: ArrayView<T, D>,
    ) -> Result<(), DalError> {
        self.check_type(T::TYPE)?;
        let slab = Hyperslab::contiguous(start.to_vec(), block.shape().to_vec());
        self.check_fits(&slab)?;
        if block.is_empty() {
            return Ok(());
        }
        let values: Vec<T> = block.iter().cloned().collect();
        self.file
            .backend()
            .write_slab(&self.path, &slab, &T::wrap(values))
    }

    fn check_fits(&self, slab: &Hyperslab) -> Result<(), DalError> {
        let dims = self.dims()?;
        if slab.rank() != dims.len() {
            return Err(DalError::BadArrayShape {
                argument: "hyperslab".to_string(),
                function: "DalArray".to_string(),
                expected: format!("rank {}", dims.len()),
                received: format!("rank {}", slab.rank()),
            });
        }
        if slab.num_points() > 0 && !slab.fits_within(&dims) {
            return Err(DalError::OutOfBounds {
                path: self.path.clone(),
                what: "hyperslab",
                end: slab.end(),
                extent: dims,
            });
        }
        Ok(())
    }

    /// The whole array.
    pub fn read(&self) -> Result<DataBlock, DalError> {
        let dims = self.dims()?;
        let data = self.file.backend().read_all(&self.path)?;
        DataBlock::new(data, dims, ArrayOrder::RowMajor)
    }

    /// `count` rows of the first axis starting at `offset`.
    pub fn read_range(&self, offset: usize, count: usize) -> Result<DataBlock, DalError> {
        let dims = self.dims()?;
        let slab = Hyperslab::rows(offset, count, &dims);
        self.read_hyperslab(&slab)
    }

    /// The elements of one hyperslab, shaped `count · block` per axis.
    pub fn read_hyperslab(&self, slab: &Hyperslab) -> Result<DataBlock, DalError> {
        self.check_fits(slab)?;
        let data = self.file.backend().read_slab(&self.path, slab)?;
        DataBlock::new(data, slab.shape(), ArrayOrder::RowMajor)
    }

    /// Combine `slab` into the current selection.
    ///
    /// When `resize` is set and the hyperslab reaches past the current extent, the array is
    /// first extended just enough to hold it; otherwise such a hyperslab is rejected.
    pub fn set_hyperslab(&mut self, slab: Hyperslab, op: SelectionOp, resize: bool) -> Result<(), DalError> {
        let dims = self.dims()?;
        if slab.rank() != dims.len() {
            return Err(DalError::BadArrayShape {
                argument: "slab".to_string(),
                function: "DalArray::set_hyperslab".to_string(),
                expected: format!("rank {}", dims.len()),
                received: format!("rank {}", slab.rank()),
            });
        }
        if !slab.fits_within(&dims) {
            if !resize {
                return Err(DalError::OutOfBounds {
                    path: self.path.clone(),
                    what: "hyperslab",
                    end: slab.end(),
                    extent: dims,
                });
            }
            let grown: Vec<usize> = dims
                .iter()
                .zip(slab.end())
                .map(|(&d, e)| d.max(e + 1))
                .collect();
            self.extend(&grown)?;
        }
        self.selection.apply(op, slab)?;
        trace!(
            "{} now has {} hyperslabs selected",
            self.path,
            self.selection.history().len()
        );
        Ok(())
    }

    /// The hyperslabs applied so far, in order.
    pub fn hyperslab_history(&self) -> &[(SelectionOp, Hyperslab)] {
        self.selection.history()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Write `data` to the selected points, in row-major order of the points.
    pub fn write_selection<T: Element>(&self, data: &[T]) -> Result<(), DalError> {
        self.check_type(T::TYPE)?;
        let points = self.selection.points();
        if points.len() != data.len() {
            return Err(DalError::BadArrayShape {
                argument: "data".to_string(),
                function: "DalArray::write_selection".to_string(),
                expected: format!("{} elements", points.len()),
                received: format!("{} elements", data.len()),
            });
        }
        if points.is_empty() {
            return Ok(());
        }
        self.file
            .backend()
            .write_points(&self.path, &points, &T::wrap(data.to_vec()))
    }

    /// The selected points, flattened in row-major order of the points.
    pub fn read_selection(&self) -> Result<DataBlock, DalError> {
        let points = self.selection.points();
        let data = self.file.backend().read_points(&self.path, &points)?;
        DataBlock::new(data, vec![points.len()], ArrayOrder::RowMajor)
    }

    /// Release the handle.
    pub fn close(self) {
        trace!("closing array {}", self.path);
    }
}

impl AttributeOwner for DalArray<'_> {
    fn backend(&self) -> &dyn Backend {
        self.file.backend()
    }

    fn object_path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{c32, constants::NUM_ANTS, num_complex::Complex};

    fn extendible<'a>(file: &'a DalFile, name: &str, element_type: ElementType) -> DalArray<'a> {
        file.root()
            .create_array(
                name,
                &ArrayDesc::new(element_type, vec![0]).chunked(vec![1000]),
            )
            .unwrap()
    }

    /// Extend (0,) to (2500,) and write it in chunks of 1000, 1000 and 500.
    fn chunked_round_trip<T: Element>(make: impl Fn(usize) -> T) {
        let file = DalFile::in_memory();
        let array = extendible(&file, "a", T::TYPE);
        array.extend(&[2500]).unwrap();
        let values: Vec<T> = (0..2500).map(&make).collect();
        for (offset, len) in [(0, 1000), (1000, 1000), (2000, 500)] {
            array.write(offset, &values[offset..offset + len]).unwrap();
        }
        let back = array.read().unwrap();
        assert_eq!(back.shape(), &[2500]);
        assert_eq!(back.as_slice::<T>().unwrap(), values.as_slice());
    }

    #[test]
    fn test_chunked_round_trips() {
        chunked_round_trip(|i| i as i16 - 1000);
        chunked_round_trip(|i| i as i32 * 7);
        chunked_round_trip(|i| c32::new(i as f32, -(i as f32) / 2.0));
        chunked_round_trip(|i| Complex::<i16>::new(i as i16, 1));
    }

    #[test]
    fn test_dims_is_idempotent() {
        let file = DalFile::in_memory();
        let array = extendible(&file, "a", ElementType::Int);
        array.extend(&[10]).unwrap();
        assert_eq!(array.dims().unwrap(), vec![10]);
        assert_eq!(array.dims().unwrap(), vec![10]);
        array.extend(&[10]).unwrap();
        assert_eq!(array.dims().unwrap(), vec![10]);
    }

    #[test]
    fn test_extend_errors() {
        let file = DalFile::in_memory();
        let array = extendible(&file, "a", ElementType::Int);
        array.extend(&[10]).unwrap();
        assert!(matches!(
            array.extend(&[5]),
            Err(DalError::ShrinkNotAllowed { .. })
        ));
        assert_eq!(array.dims().unwrap(), vec![10]);
        assert!(matches!(
            array.extend(&[10, 10]),
            Err(DalError::BadArrayShape { .. })
        ));

        let fixed = file
            .root()
            .create_array("fixed", &ArrayDesc::new(ElementType::Int, vec![4]))
            .unwrap();
        assert!(!fixed.is_extendible());
        assert!(matches!(
            fixed.extend(&[8]),
            Err(DalError::NotExtendible(_))
        ));
    }

    #[test]
    fn test_write_errors() {
        let file = DalFile::in_memory();
        let array = file
            .root()
            .create_array("a", &ArrayDesc::new(ElementType::Float, vec![4, 3]))
            .unwrap();
        assert!(matches!(
            array.write(0, &[1.0_f64; 3]),
            Err(DalError::TypeMismatch { .. })
        ));
        assert!(matches!(
            array.write(0, &[1.0_f32; 4]),
            Err(DalError::BadArrayShape { .. })
        ));
        assert!(matches!(
            array.write(3, &[1.0_f32; 6]),
            Err(DalError::OutOfBounds { .. })
        ));
        assert!(matches!(
            array.write(usize::MAX, &[1.0_f32; 3]),
            Err(DalError::OutOfBounds { .. })
        ));
        array.write(3, &[1.0_f32, 2.0, 3.0]).unwrap();
        let last = array.read_range(3, 1).unwrap();
        assert_eq!(last.shape(), &[1, 3]);
        assert_eq!(last.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_write_block_2d() {
        let file = DalFile::in_memory();
        let array = file
            .root()
            .create_array("a", &ArrayDesc::new(ElementType::Double, vec![3, 4]))
            .unwrap();
        array
            .write_block(&[1, 1], array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].view())
            .unwrap();
        let all = array.read().unwrap().to_array::<f64>().unwrap();
        assert_eq!(all[[1, 1]], 1.0);
        assert_eq!(all[[2, 3]], 6.0);
        assert_eq!(all[[0, 0]], 0.0);
        assert!(array
            .write_block(&[2, 2], array![[1.0, 2.0, 3.0]].view())
            .is_err());
        assert_eq!(array.num_elements().unwrap(), 12);
        assert_eq!(array.rank(), 2);
        assert!(array.chunk_shape().is_empty());
    }

    #[test]
    fn test_hyperslab_selection() {
        let file = DalFile::in_memory();
        let mut array = file
            .root()
            .create_array("a", &ArrayDesc::new(ElementType::Int, vec![4, 4]).chunked(vec![2, 2]))
            .unwrap();
        // every other column of the first two rows
        let slab = Hyperslab::new(vec![0, 0], Some(vec![1, 2]), Some(vec![2, 2]), None).unwrap();
        array.set_hyperslab(slab, SelectionOp::Set, false).unwrap();
        let corner = Hyperslab::new(vec![1, 2], None, None, None).unwrap();
        array.set_hyperslab(corner, SelectionOp::Xor, false).unwrap();
        assert_eq!(array.hyperslab_history().len(), 2);

        array.write_selection(&[1_i32, 2, 3]).unwrap();
        let all = array.read().unwrap();
        assert_eq!(*all.get::<i32>(&[0, 0]).unwrap(), 1);
        assert_eq!(*all.get::<i32>(&[0, 2]).unwrap(), 2);
        assert_eq!(*all.get::<i32>(&[1, 0]).unwrap(), 3);
        assert_eq!(*all.get::<i32>(&[1, 2]).unwrap(), 0);
        assert_eq!(
            array.read_selection().unwrap().as_slice::<i32>().unwrap(),
            &[1, 2, 3]
        );
    }

    #[test]
    fn test_set_hyperslab_resize() {
        let file = DalFile::in_memory();
        let mut array = extendible(&file, "a", ElementType::Long);
        let slab = Hyperslab::new(vec![10], None, Some(vec![5]), None).unwrap();
        assert!(matches!(
            array.set_hyperslab(slab.clone(), SelectionOp::Set, false),
            Err(DalError::OutOfBounds { .. })
        ));
        assert!(array.hyperslab_history().is_empty());
        array.set_hyperslab(slab, SelectionOp::Set, true).unwrap();
        assert_eq!(array.dims().unwrap(), vec![15]);
        array.write_selection(&[1_i64, 2, 3, 4, 5]).unwrap();
        assert_eq!(
            array.read_range(10, 5).unwrap().as_slice::<i64>().unwrap(),
            &[1, 2, 3, 4, 5]
        );
        array.clear_selection();
        assert!(array.hyperslab_history().is_empty());
    }

    #[test]
    fn test_array_attributes() {
        let file = DalFile::in_memory();
        let array = extendible(&file, "000000000", ElementType::Short);
        array.set_attribute(NUM_ANTS, 1_u32).unwrap();
        let reopened = file.root().open_array("000000000").unwrap();
        assert_eq!(reopened.name(), "000000000");
        assert_eq!(reopened.get_attribute::<u32>(NUM_ANTS).unwrap(), 1);
        reopened.close();
    }
}
