// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Selecting a subset of the elements of a dataset with hyperslabs.
//!
//! A [`Hyperslab`] is the HDF5 notion of a regular sub-region: along every axis it selects
//! `count` blocks of `block` consecutive elements, the first starting at `start`, each
//! following one `stride` elements after the previous. Several hyperslabs can be combined with
//! a [`SelectionOp`] into a [`Selection`], which remembers every hyperslab applied since the
//! last [`SelectionOp::Set`].
//!
//! # Examples
//!
//! ```rust
//! use lofar_dal::selection::{Hyperslab, Selection, SelectionOp};
//!
//! // every other row of the first 6 rows of a (.., 2) dataset
//! let slab = Hyperslab::new(vec![0, 0], Some(vec![2, 1]), Some(vec![3, 2]), None).unwrap();
//! assert_eq!(slab.num_points(), 6);
//! assert_eq!(slab.end(), vec![4, 1]);
//!
//! let mut sel = Selection::default();
//! sel.apply(SelectionOp::Set, slab).unwrap();
//! sel.apply(SelectionOp::Or, Hyperslab::contiguous(vec![1, 0], vec![1, 2])).unwrap();
//! assert_eq!(sel.points().len(), 8);
//! ```

use std::collections::BTreeSet;

use itertools::Itertools;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    /// Error for bad array shape in provided argument
    BadArrayShape {
        /// The argument name within the function
        argument: String,
        /// The function name
        function: String,
        /// The expected shape
        expected: String,
        /// The shape that was received instead
        received: String,
    },

    #[error("{argument} must be at least 1 along every axis, received {received:?}")]
    /// Zero counts or blocks select nothing and are rejected
    ZeroExtent {
        argument: &'static str,
        received: Vec<usize>,
    },

    #[error("blocks overlap along axis {axis}: block {block} is larger than stride {stride}")]
    OverlappingBlocks {
        axis: usize,
        block: usize,
        stride: usize,
    },

    #[error("gap of {gap} along axis {axis} is not compatible with block {block}")]
    BadGap { axis: usize, gap: i64, block: usize },
}

/// A regular, possibly strided, rectangular region of a dataspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hyperslab {
    start: Vec<usize>,
    stride: Vec<usize>,
    count: Vec<usize>,
    block: Vec<usize>,
}

impl Hyperslab {
    /// Construct a hyperslab. A missing `stride`, `count` or `block` defaults to 1 along every
    /// axis of `start`.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::BadArrayShape`] if the parameters have different lengths,
    /// - [`SelectionError::ZeroExtent`] if a count or block is zero,
    /// - [`SelectionError::OverlappingBlocks`] if consecutive blocks would overlap.
    pub fn new(
        start: Vec<usize>,
        stride: Option<Vec<usize>>,
        count: Option<Vec<usize>>,
        block: Option<Vec<usize>>,
    ) -> Result<Self, SelectionError> {
        let rank = start.len();
        let slab = Self {
            stride: stride.unwrap_or_else(|| vec![1; rank]),
            count: count.unwrap_or_else(|| vec![1; rank]),
            block: block.unwrap_or_else(|| vec![1; rank]),
            start,
        };
        slab.validate()?;
        Ok(slab)
    }

    /// A contiguous box of `shape` elements with its first corner at `start`.
    pub fn contiguous(start: Vec<usize>, shape: Vec<usize>) -> Self {
        let rank = start.len();
        Self {
            start,
            stride: vec![1; rank],
            count: shape,
            block: vec![1; rank],
        }
    }

    /// `num_rows` complete rows of a dataset of `shape`, starting at row `offset` of the first
    /// axis.
    pub fn rows(offset: usize, num_rows: usize, shape: &[usize]) -> Self {
        let mut start = vec![0; shape.len()];
        let mut count = shape.to_vec();
        if let (Some(s), Some(c)) = (start.first_mut(), count.first_mut()) {
            *s = offset;
            *c = num_rows;
        }
        Self::contiguous(start, count)
    }

    fn validate(&self) -> Result<(), SelectionError> {
        let rank = self.start.len();
        for (argument, values) in [
            ("stride", &self.stride),
            ("count", &self.count),
            ("block", &self.block),
        ] {
            if values.len() != rank {
                return Err(SelectionError::BadArrayShape {
                    argument: argument.to_string(),
                    function: "Hyperslab::new".to_string(),
                    expected: format!("{} values, the length of start", rank),
                    received: format!("{:?}", values),
                });
            }
        }
        if self.count.contains(&0) {
            return Err(SelectionError::ZeroExtent {
                argument: "count",
                received: self.count.clone(),
            });
        }
        if self.block.contains(&0) {
            return Err(SelectionError::ZeroExtent {
                argument: "block",
                received: self.block.clone(),
            });
        }
        for axis in 0..rank {
            if self.count[axis] > 1 && self.block[axis] > self.stride[axis] {
                return Err(SelectionError::OverlappingBlocks {
                    axis,
                    block: self.block[axis],
                    stride: self.stride[axis],
                });
            }
        }
        Ok(())
    }

    pub fn rank(&self) -> usize {
        self.start.len()
    }

    pub fn start(&self) -> &[usize] {
        &self.start
    }

    pub fn stride(&self) -> &[usize] {
        &self.stride
    }

    pub fn count(&self) -> &[usize] {
        &self.count
    }

    pub fn block(&self) -> &[usize] {
        &self.block
    }

    /// Elements skipped between consecutive blocks, `stride - block`, per axis.
    pub fn gap(&self) -> Vec<i64> {
        self.stride
            .iter()
            .zip(self.block.iter())
            .map(|(&s, &b)| s as i64 - b as i64)
            .collect()
    }

    /// Set the stride so that `gap` elements are skipped between blocks.
    pub fn set_gap(&mut self, gap: &[i64]) -> Result<(), SelectionError> {
        if gap.len() != self.rank() {
            return Err(SelectionError::BadArrayShape {
                argument: "gap".to_string(),
                function: "Hyperslab::set_gap".to_string(),
                expected: format!("{} values", self.rank()),
                received: format!("{:?}", gap),
            });
        }
        let mut stride = Vec::with_capacity(gap.len());
        for (axis, (&g, &b)) in gap.iter().zip(self.block.iter()).enumerate() {
            let s = b as i64 + g;
            if s < 1 {
                return Err(SelectionError::BadGap {
                    axis,
                    gap: g,
                    block: b,
                });
            }
            stride.push(s as usize);
        }
        let previous = std::mem::replace(&mut self.stride, stride);
        if let Err(e) = self.validate() {
            self.stride = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Number of selected elements, `Π count · block`.
    pub fn num_points(&self) -> usize {
        self.count
            .iter()
            .zip(self.block.iter())
            .map(|(c, b)| c * b)
            .product()
    }

    /// The extent of the selected region per axis, `count · block`.
    pub fn shape(&self) -> Vec<usize> {
        self.count
            .iter()
            .zip(self.block.iter())
            .map(|(c, b)| c * b)
            .collect()
    }

    /// The last selected index per axis, `start + (count - 1) · stride + block - 1`.
    pub fn end(&self) -> Vec<usize> {
        (0..self.rank())
            .map(|d| {
                (self.start[d] + self.count[d].saturating_sub(1) * self.stride[d] + self.block[d])
                    .saturating_sub(1)
            })
            .collect()
    }

    /// Whether every selected element lies within a dataspace of `extent`.
    pub fn fits_within(&self, extent: &[usize]) -> bool {
        extent.len() == self.rank() && self.end().iter().zip(extent).all(|(e, x)| e < x)
    }

    /// The selected coordinates along one axis, ascending.
    fn axis_coords(&self, axis: usize) -> Vec<usize> {
        (0..self.count[axis])
            .flat_map(|c| {
                let first = self.start[axis] + c * self.stride[axis];
                first..first + self.block[axis]
            })
            .collect()
    }

    /// Every selected coordinate, in row-major order.
    pub fn points(&self) -> Vec<Vec<usize>> {
        if self.rank() == 0 {
            return vec![vec![]];
        }
        (0..self.rank())
            .map(|axis| self.axis_coords(axis))
            .multi_cartesian_product()
            .collect()
    }

    /// Row-major offsets of the selected elements in a dataspace of `extent`, in the same
    /// order as [`Hyperslab::points`]. The hyperslab must fit within `extent`.
    pub fn flat_offsets(&self, extent: &[usize]) -> Vec<usize> {
        let mut axis_strides = vec![1; extent.len()];
        for d in (0..extent.len().saturating_sub(1)).rev() {
            axis_strides[d] = axis_strides[d + 1] * extent[d + 1];
        }
        let mut offsets = vec![0];
        for (axis, &step) in axis_strides.iter().enumerate().take(self.rank()) {
            let coords = self.axis_coords(axis);
            offsets = offsets
                .iter()
                .flat_map(|&base| coords.iter().map(move |&c| base + c * step))
                .collect();
        }
        offsets
    }
}

/// How a new hyperslab is combined with the existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionOp {
    /// Replace the selection.
    #[default]
    Set,
    /// Union.
    Or,
    /// Intersection.
    And,
    /// Symmetric difference.
    Xor,
    /// Keep the old selection minus the new hyperslab.
    NotB,
    /// Keep the new hyperslab minus the old selection.
    NotA,
}

/// The ordered history of hyperslabs applied to one dataspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    history: Vec<(SelectionOp, Hyperslab)>,
}

impl Selection {
    /// Record a hyperslab. [`SelectionOp::Set`] discards the history first.
    pub fn apply(&mut self, op: SelectionOp, slab: Hyperslab) -> Result<(), SelectionError> {
        if op != SelectionOp::Set {
            if let Some((_, first)) = self.history.first() {
                if first.rank() != slab.rank() {
                    return Err(SelectionError::BadArrayShape {
                        argument: "slab".to_string(),
                        function: "Selection::apply".to_string(),
                        expected: format!("rank {}", first.rank()),
                        received: format!("rank {}", slab.rank()),
                    });
                }
            }
        } else {
            self.history.clear();
        }
        self.history.push((op, slab));
        Ok(())
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &[(SelectionOp, Hyperslab)] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn rank(&self) -> Option<usize> {
        self.history.first().map(|(_, slab)| slab.rank())
    }

    /// Evaluate the combined selection, in row-major order.
    pub fn points(&self) -> Vec<Vec<usize>> {
        let mut selected: BTreeSet<Vec<usize>> = BTreeSet::new();
        for (op, slab) in &self.history {
            let new: BTreeSet<Vec<usize>> = slab.points().into_iter().collect();
            selected = match op {
                SelectionOp::Set => new,
                SelectionOp::Or => selected.union(&new).cloned().collect(),
                SelectionOp::And => selected.intersection(&new).cloned().collect(),
                SelectionOp::Xor => selected.symmetric_difference(&new).cloned().collect(),
                SelectionOp::NotB => selected.difference(&new).cloned().collect(),
                SelectionOp::NotA => new.difference(&selected).cloned().collect(),
            };
        }
        selected.into_iter().collect()
    }

    /// The smallest extent that contains every hyperslab in the history.
    pub fn required_extent(&self) -> Option<Vec<usize>> {
        let rank = self.rank()?;
        let mut extent = vec![0; rank];
        for (_, slab) in &self.history {
            for (x, e) in extent.iter_mut().zip(slab.end()) {
                *x = (*x).max(e + 1);
            }
        }
        Some(extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let slab = Hyperslab::new(vec![2, 3], None, None, None).unwrap();
        assert_eq!(slab.stride(), &[1, 1]);
        assert_eq!(slab.count(), &[1, 1]);
        assert_eq!(slab.block(), &[1, 1]);
        assert_eq!(slab.num_points(), 1);
        assert_eq!(slab.end(), vec![2, 3]);
        assert_eq!(slab.points(), vec![vec![2, 3]]);
    }

    #[test]
    fn test_strided_blocks() {
        // blocks of 2 every 5 elements, three times: 1,2  6,7  11,12
        let slab = Hyperslab::new(vec![1], Some(vec![5]), Some(vec![3]), Some(vec![2])).unwrap();
        assert_eq!(slab.num_points(), 6);
        assert_eq!(slab.gap(), vec![3]);
        assert_eq!(slab.end(), vec![12]);
        let coords: Vec<usize> = slab.points().into_iter().map(|p| p[0]).collect();
        assert_eq!(coords, vec![1, 2, 6, 7, 11, 12]);
    }

    #[test]
    fn test_set_gap() {
        let mut slab =
            Hyperslab::new(vec![0], Some(vec![4]), Some(vec![2]), Some(vec![2])).unwrap();
        slab.set_gap(&[0]).unwrap();
        assert_eq!(slab.stride(), &[2]);
        assert_eq!(slab.end(), vec![3]);
        assert!(slab.set_gap(&[-1]).is_err());
        assert_eq!(slab.stride(), &[2]);
        assert!(slab.set_gap(&[-3]).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            Hyperslab::new(vec![0, 0], Some(vec![1]), None, None),
            Err(SelectionError::BadArrayShape { .. })
        ));
        assert!(matches!(
            Hyperslab::new(vec![0], None, Some(vec![0]), None),
            Err(SelectionError::ZeroExtent { .. })
        ));
        assert!(matches!(
            Hyperslab::new(vec![0], Some(vec![1]), Some(vec![2]), Some(vec![2])),
            Err(SelectionError::OverlappingBlocks { .. })
        ));
        // a single block may be larger than the stride
        assert!(Hyperslab::new(vec![0], Some(vec![1]), Some(vec![1]), Some(vec![4])).is_ok());
    }

    #[test]
    fn test_rows() {
        let slab = Hyperslab::rows(3, 2, &[10, 4]);
        assert_eq!(slab.start(), &[3, 0]);
        assert_eq!(slab.shape(), vec![2, 4]);
        assert_eq!(slab.points()[0], vec![3, 0]);
        assert_eq!(slab.points()[7], vec![4, 3]);
        assert!(slab.fits_within(&[5, 4]));
        assert!(!slab.fits_within(&[4, 4]));
    }

    #[test]
    fn test_flat_offsets_follow_points() {
        let extent = [6, 7];
        for slab in [
            Hyperslab::rows(2, 3, &extent),
            Hyperslab::new(vec![1, 0], Some(vec![2, 3]), Some(vec![2, 2]), Some(vec![1, 2])).unwrap(),
            Hyperslab::contiguous(vec![5, 6], vec![1, 1]),
        ] {
            let expected: Vec<usize> = slab
                .points()
                .iter()
                .map(|p| crate::index::flat_index(&extent, crate::index::ArrayOrder::RowMajor, p).unwrap())
                .collect();
            assert_eq!(slab.flat_offsets(&extent), expected);
        }
        assert_eq!(Hyperslab::rows(1, 2, &[4]).flat_offsets(&[4]), vec![1, 2]);
    }

    #[test]
    fn test_set_clears_history() {
        let mut sel = Selection::default();
        sel.apply(SelectionOp::Set, Hyperslab::contiguous(vec![0], vec![4]))
            .unwrap();
        sel.apply(SelectionOp::Or, Hyperslab::contiguous(vec![8], vec![2]))
            .unwrap();
        assert_eq!(sel.history().len(), 2);
        assert_eq!(sel.points().len(), 6);
        assert_eq!(sel.required_extent(), Some(vec![10]));

        sel.apply(SelectionOp::Set, Hyperslab::contiguous(vec![1], vec![1]))
            .unwrap();
        assert_eq!(sel.history().len(), 1);
        assert_eq!(sel.points(), vec![vec![1]]);
    }

    #[test]
    fn test_combining_ops() {
        let a = Hyperslab::contiguous(vec![0], vec![4]); // 0..4
        let b = Hyperslab::contiguous(vec![2], vec![4]); // 2..6
        let eval = |op| {
            let mut sel = Selection::default();
            sel.apply(SelectionOp::Set, a.clone()).unwrap();
            sel.apply(op, b.clone()).unwrap();
            sel.points().into_iter().map(|p| p[0]).collect::<Vec<_>>()
        };
        assert_eq!(eval(SelectionOp::Or), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(eval(SelectionOp::And), vec![2, 3]);
        assert_eq!(eval(SelectionOp::Xor), vec![0, 1, 4, 5]);
        assert_eq!(eval(SelectionOp::NotB), vec![0, 1]);
        assert_eq!(eval(SelectionOp::NotA), vec![4, 5]);
    }

    #[test]
    fn test_rank_mismatch_in_history() {
        let mut sel = Selection::default();
        sel.apply(SelectionOp::Set, Hyperslab::contiguous(vec![0], vec![1]))
            .unwrap();
        assert!(sel
            .apply(SelectionOp::Or, Hyperslab::contiguous(vec![0, 0], vec![1, 1]))
            .is_err());
        assert_eq!(sel.history().len(), 1);
    }
}
