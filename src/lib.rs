// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A data access layer for LOFAR files: groups, attributes, arrays and tables stored in HDF5
//! files or CASA tables, behind one interface.
//!
//! # Examples
//!
//! ```
//! use lofar_dal::{ArrayDesc, AttributeOwner, DalFile, ElementType};
//!
//! let file = DalFile::in_memory();
//! let station = file.create_group("Station000").unwrap();
//! station.set_attribute("NUM_ANTS", 1_u32).unwrap();
//!
//! let dipole = station
//!     .create_array("000000000", &ArrayDesc::new(ElementType::Short, vec![0]).chunked(vec![5000]))
//!     .unwrap();
//! dipole.extend(&[10]).unwrap();
//! dipole.write(0, &(1..=10).collect::<Vec<i16>>()).unwrap();
//! assert_eq!(dipole.dims().unwrap(), vec![10]);
//! ```

#[allow(non_camel_case_types)]
pub type c32 = num_complex::Complex<f32>;
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

pub mod array;
pub mod attribute;
pub mod common;
pub mod constants;
pub mod data;
pub mod element;
pub mod file;
pub mod index;
pub mod io;
pub mod naming;
pub mod selection;
pub mod table;

/// Information about how the crate was built.
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

// Re-exports.
pub use array::DalArray;
pub use attribute::{AttributeElement, AttributeOwner, FromAttribute, IntoAttribute};
pub use common::CommonAttributes;
pub use data::{DataBlock, ElementRef};
pub use element::{Element, ElementType, TypedVec};
pub use file::{DalFile, Group};
pub use index::ArrayOrder;
pub use io::{ArrayDesc, DalError, FieldDesc, FileType, IoMode};
pub use selection::{Hyperslab, Selection, SelectionOp};
pub use table::{ColumnView, DalTable};

pub use hifitime;
pub use ndarray;
pub use num_complex;
pub use num_complex::Complex;
pub use num_traits;

// If "hdf5" is enabled, re-export the crate here.
#[cfg(feature = "hdf5")]
pub use hdf5;

// If "ms" is enabled, re-export rubbl_casatables here.
#[cfg(feature = "ms")]
pub use rubbl_casatables;

#[cfg(test)]
#[test]
fn hifitime_works_as_expected() {
    use hifitime::Epoch;

    let gps = 1065880128.0;
    let epoch = Epoch::from_gpst_seconds(gps);
    approx::assert_abs_diff_eq!(epoch.as_gpst_seconds(), gps);

    // Observation times are stored as MJD (UTC).
    let mjd_utc = 51544.5;
    let epoch = Epoch::from_mjd_utc(mjd_utc);
    approx::assert_abs_diff_eq!(epoch.to_mjd_utc_days(), mjd_utc, epsilon = 1e-9);
}
