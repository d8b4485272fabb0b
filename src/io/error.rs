use thiserror::Error;

use super::FileType;
use crate::{element::ElementType, index::IndexError, selection::SelectionError};

#[derive(Error, Debug)]
#[allow(clippy::upper_case_acronyms)]
/// All the errors that can occur in storage operations
pub enum DalError {
    #[error("invalid {kind} handle {path:?}")]
    /// The owner, array or table reference is not (or no longer) valid
    InvalidHandle {
        /// What kind of object the handle was meant to refer to
        kind: &'static str,
        path: String,
    },

    #[error("{kind} {name:?} not found in {owner:?}")]
    /// A named attribute, field, group, array or table does not exist
    NotFound {
        kind: &'static str,
        name: String,
        owner: String,
    },

    #[error("{kind} {name:?} already exists in {owner:?}")]
    Exists {
        kind: &'static str,
        name: String,
        owner: String,
    },

    #[error("{name:?} holds {found} data, which cannot be read as {expected}")]
    /// The stored class of the object does not match the requested one
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("invalid name {0:?}")]
    InvalidName(String),

    #[error("string cannot be stored: {0}")]
    InvalidString(String),

    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    BadArrayShape {
        argument: String,
        function: String,
        expected: String,
        received: String,
    },

    #[error("array {0:?} was created without chunking and cannot be extended")]
    NotExtendible(String),

    #[error("cannot shrink array {path:?} from {current:?} to {requested:?}")]
    /// Extending to a smaller extent along any axis is rejected
    ShrinkNotAllowed {
        path: String,
        current: Vec<usize>,
        requested: Vec<usize>,
    },

    #[error("access to {what} ending at {end:?} is outside the extent {extent:?} of {path:?}")]
    OutOfBounds {
        path: String,
        what: &'static str,
        end: Vec<usize>,
        extent: Vec<usize>,
    },

    #[error("{operation} is not supported for {file_type} files")]
    Unsupported {
        file_type: FileType,
        operation: String,
    },

    #[error("the file was opened read-only, cannot {0}")]
    ReadOnly(String),

    #[error(transparent)]
    /// Error derived from [`crate::index::IndexError`]
    Index(#[from] IndexError),

    #[error(transparent)]
    /// Error derived from [`crate::selection::SelectionError`]
    Selection(#[from] SelectionError),

    #[cfg(feature = "hdf5")]
    #[error(transparent)]
    /// Error derived from [`hdf5::Error`]
    Hdf5(#[from] hdf5::Error),

    #[error("casacore: {0}")]
    /// An error reported by the casacore table glue
    Casacore(String),

    #[error(transparent)]
    /// An error when converting a Rust string to a C string.
    BadString(#[from] std::ffi::NulError),

    #[error(transparent)]
    /// An IO error.
    IO(#[from] std::io::Error),
}

impl DalError {
    pub(crate) fn type_mismatch(name: &str, expected: ElementType, found: ElementType) -> Self {
        Self::TypeMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: &str, owner: &str) -> Self {
        Self::NotFound {
            kind,
            name: name.to_string(),
            owner: owner.to_string(),
        }
    }

    /// Whether this is a [`DalError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
