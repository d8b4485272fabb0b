// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Translation between logical n-dimensional indices and flat storage offsets.
//!
//! HDF5 datasets are stored in C (row-major) order, while CASA tables store cells in Fortran
//! (column-major) order, with the row number as the slowest axis. A single logical index tuple
//! is resolved against either layout by dispatching on an [`ArrayOrder`] tag carried with the
//! data.
//!
//! # Examples
//!
//! ```rust
//! use lofar_dal::index::{flat_index, ArrayOrder};
//!
//! let shape = [3, 4];
//! assert_eq!(flat_index(&shape, ArrayOrder::RowMajor, &[2, 1]).unwrap(), 2 * 4 + 1);
//! assert_eq!(flat_index(&shape, ArrayOrder::ColumnMajor, &[2, 1]).unwrap(), 2 + 1 * 3);
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("expected {rank} indices for an array of rank {rank}, received {supplied}")]
    /// The number of supplied indices differs from the rank of the shape.
    RankMismatch {
        /// Rank of the shape
        rank: usize,
        /// Number of indices that were supplied
        supplied: usize,
    },

    #[error("index {index} is out of range for axis {axis} of extent {extent}")]
    OutOfRange {
        axis: usize,
        index: usize,
        extent: usize,
    },

    #[error("flat offset {offset} is out of range for {len} elements")]
    FlatOutOfRange { offset: usize, len: usize },

    #[error("unknown array order {0:?}, expected \"c\" or \"fortran\"")]
    UnknownOrder(String),
}

/// The order in which the axes of a multi-dimensional buffer vary in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrayOrder {
    /// C order: the last axis varies fastest.
    #[default]
    RowMajor,
    /// Fortran order: the first axis varies fastest.
    ColumnMajor,
}

impl ArrayOrder {
    /// The tag attached to buffers, `"c"` or `"fortran"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ArrayOrder::RowMajor => "c",
            ArrayOrder::ColumnMajor => "fortran",
        }
    }

    /// The distance in elements between neighbours along each axis of `shape`.
    pub fn strides(self, shape: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; shape.len()];
        match self {
            ArrayOrder::RowMajor => {
                for d in (0..shape.len().saturating_sub(1)).rev() {
                    strides[d] = strides[d + 1] * shape[d + 1];
                }
            }
            ArrayOrder::ColumnMajor => {
                for d in 1..shape.len() {
                    strides[d] = strides[d - 1] * shape[d - 1];
                }
            }
        }
        strides
    }
}

impl fmt::Display for ArrayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrayOrder {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" | "C" => Ok(ArrayOrder::RowMajor),
            "fortran" | "FORTRAN" | "f" | "F" => Ok(ArrayOrder::ColumnMajor),
            other => Err(IndexError::UnknownOrder(other.to_string())),
        }
    }
}

/// Keep only the indices that were actually supplied. Negative values are the "not supplied"
/// sentinel used by callers with a fixed number of index arguments.
pub fn supplied_indices(raw: &[i64]) -> Vec<usize> {
    raw.iter()
        .filter(|&&i| i >= 0)
        .map(|&i| i as usize)
        .collect()
}

/// Compute the flat storage offset of `indices` in a buffer of `shape` laid out in `order`.
///
/// Row-major: `offset = Σ indices[d] · Π shape[d+1..]`.
/// Column-major: `offset = Σ indices[d] · Π shape[..d]`.
///
/// # Errors
///
/// [`IndexError::RankMismatch`] when `indices.len() != shape.len()`, and
/// [`IndexError::OutOfRange`] when an index is not below the extent of its axis.
pub fn flat_index(shape: &[usize], order: ArrayOrder, indices: &[usize]) -> Result<usize, IndexError> {
    if indices.len() != shape.len() {
        return Err(IndexError::RankMismatch {
            rank: shape.len(),
            supplied: indices.len(),
        });
    }
    for (axis, (&index, &extent)) in indices.iter().zip(shape.iter()).enumerate() {
        if index >= extent {
            return Err(IndexError::OutOfRange {
                axis,
                index,
                extent,
            });
        }
    }

    Ok(order
        .strides(shape)
        .iter()
        .zip(indices.iter())
        .map(|(stride, index)| stride * index)
        .sum())
}

/// The inverse of [`flat_index`].
pub fn unravel_index(
    shape: &[usize],
    order: ArrayOrder,
    offset: usize,
) -> Result<Vec<usize>, IndexError> {
    let len: usize = shape.iter().product();
    if offset >= len {
        return Err(IndexError::FlatOutOfRange { offset, len });
    }
    let strides = order.strides(shape);
    Ok(strides
        .iter()
        .zip(shape.iter())
        .map(|(&stride, &extent)| (offset / stride) % extent)
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use itertools::Itertools;

    use super::*;

    fn all_indices(shape: &[usize]) -> Vec<Vec<usize>> {
        if shape.is_empty() {
            return vec![vec![]];
        }
        shape
            .iter()
            .map(|&extent| 0..extent)
            .multi_cartesian_product()
            .collect()
    }

    const SHAPES: &[&[usize]] = &[
        &[1],
        &[7],
        &[2, 3],
        &[3, 2],
        &[4, 1, 5],
        &[2, 3, 4],
        &[3, 2, 2, 2],
    ];

    #[test]
    fn test_offsets_are_unique_and_in_range() {
        for order in [ArrayOrder::RowMajor, ArrayOrder::ColumnMajor] {
            for shape in SHAPES {
                let len: usize = shape.iter().product();
                let mut seen = HashSet::new();
                for idx in all_indices(shape) {
                    let offset = flat_index(shape, order, &idx).unwrap();
                    assert!(offset < len, "{order} {shape:?} {idx:?} -> {offset}");
                    assert!(seen.insert(offset), "{order} {shape:?} {idx:?} collides");
                }
                assert_eq!(seen.len(), len);
            }
        }
    }

    #[test]
    fn test_rank_two_formulas() {
        let (rows, cols) = (5, 3);
        for i in 0..rows {
            for j in 0..cols {
                assert_eq!(
                    flat_index(&[rows, cols], ArrayOrder::RowMajor, &[i, j]).unwrap(),
                    i * cols + j
                );
                assert_eq!(
                    flat_index(&[rows, cols], ArrayOrder::ColumnMajor, &[i, j]).unwrap(),
                    i + j * rows
                );
            }
        }
    }

    #[test]
    fn test_unravel_inverts_flat_index() {
        for order in [ArrayOrder::RowMajor, ArrayOrder::ColumnMajor] {
            for shape in SHAPES {
                for idx in all_indices(shape) {
                    let offset = flat_index(shape, order, &idx).unwrap();
                    assert_eq!(unravel_index(shape, order, offset).unwrap(), idx);
                }
            }
        }
    }

    #[test]
    fn test_rank_mismatch() {
        assert_eq!(
            flat_index(&[2, 3], ArrayOrder::RowMajor, &[1]),
            Err(IndexError::RankMismatch {
                rank: 2,
                supplied: 1
            })
        );
        assert!(flat_index(&[2], ArrayOrder::ColumnMajor, &[0, 0, 0]).is_err());
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            flat_index(&[2, 3], ArrayOrder::RowMajor, &[1, 3]),
            Err(IndexError::OutOfRange {
                axis: 1,
                index: 3,
                extent: 3
            })
        );
        assert!(unravel_index(&[2, 3], ArrayOrder::RowMajor, 6).is_err());
    }

    #[test]
    fn test_supplied_indices_drops_sentinels() {
        assert_eq!(supplied_indices(&[4, -1, -1]), vec![4]);
        assert_eq!(supplied_indices(&[1, 2, -1]), vec![1, 2]);
        assert_eq!(supplied_indices(&[-1, -1, -1]), Vec::<usize>::new());
    }

    #[test]
    fn test_scalar_shape() {
        assert_eq!(flat_index(&[], ArrayOrder::RowMajor, &[]).unwrap(), 0);
    }

    #[test]
    fn test_order_tags() {
        assert_eq!(ArrayOrder::RowMajor.as_str(), "c");
        assert_eq!("fortran".parse::<ArrayOrder>().unwrap(), ArrayOrder::ColumnMajor);
        assert!("z".parse::<ArrayOrder>().is_err());
    }
}
