// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Files and the groups inside them.

use std::{fmt, path::Path};

use log::debug;

use crate::{
    array::DalArray,
    attribute::AttributeOwner,
    constants::ROOT_GROUP,
    element::Element,
    io::{
        create_backend, join_path, open_backend, split_path, ArrayDesc, Backend, DalError,
        FieldDesc, FileType, IoMode, MemBackend, MemberKind,
    },
    table::DalTable,
};

/// An open file of any supported type.
///
/// Every group, array and table handle borrows the file it came from, so none of them can
/// outlive it. Dropping the file (or calling [`DalFile::close`]) releases the backend.
pub struct DalFile {
    backend: Box<dyn Backend>,
}

impl fmt::Debug for DalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DalFile")
            .field("file_type", &self.backend.file_type())
            .field("path", &self.backend.path())
            .finish()
    }
}

impl DalFile {
    /// Create a new file of `file_type`.
    pub fn create<P: AsRef<Path>>(path: P, file_type: FileType, mode: IoMode) -> Result<Self, DalError> {
        Ok(Self::from_backend(create_backend(path, file_type, mode)?))
    }

    /// Open an existing file, working out its type from its contents.
    pub fn open<P: AsRef<Path>>(path: P, mode: IoMode) -> Result<Self, DalError> {
        Ok(Self::from_backend(open_backend(path, mode)?))
    }

    /// A file that only lives in memory.
    pub fn in_memory() -> Self {
        Self::from_backend(Box::new(MemBackend::new()))
    }

    pub fn from_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn file_type(&self) -> FileType {
        self.backend.file_type()
    }

    pub fn path(&self) -> Option<&Path> {
        self.backend.path()
    }

    pub fn root(&self) -> Group<'_> {
        Group {
            file: self,
            path: ROOT_GROUP.to_string(),
        }
    }

    pub fn create_group(&self, name: &str) -> Result<Group<'_>, DalError> {
        self.root().create_group(name)
    }

    pub fn open_group(&self, name: &str) -> Result<Group<'_>, DalError> {
        self.root().open_group(name)
    }

    pub fn groups(&self) -> Result<Vec<String>, DalError> {
        self.root().groups()
    }

    /// Open a group, array or table parent by its full path, e.g. `/Station000`.
    pub fn group_at(&self, path: &str) -> Result<Group<'_>, DalError> {
        match self.backend.member_kind(path) {
            Some(MemberKind::Group) => Ok(Group {
                file: self,
                path: path.to_string(),
            }),
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

    pub fn flush(&self) -> Result<(), DalError> {
        self.backend.flush()
    }

    /// Flush and release the file.
    pub fn close(self) -> Result<(), DalError> {
        self.flush()?;
        if let Some(path) = self.path() {
            debug!("closing {}", path.display());
        }
        Ok(())
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

impl AttributeOwner for DalFile {
    fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    fn object_path(&self) -> &str {
        ROOT_GROUP
    }
}

/// Names of direct members may not be empty or contain a path separator.
pub(crate) fn check_member_name(name: &str) -> Result<(), DalError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        Err(DalError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// A group of arrays, tables and other groups.
#[derive(Clone)]
pub struct Group<'f> {
    file: &'f DalFile,
    path: String,
}

impl<'f> Group<'f> {
    /// The last component of the path; `/` for the root group.
    pub fn name(&self) -> &str {
        match split_path(&self.path).1 {
            "" => ROOT_GROUP,
            name => name,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file(&self) -> &'f DalFile {
        self.file
    }

    fn member_path(&self, name: &str) -> Result<String, DalError> {
        check_member_name(name)?;
        Ok(join_path(&self.path, name))
    }

    pub fn create_group(&self, name: &str) -> Result<Group<'f>, DalError> {
        let path = self.member_path(name)?;
        self.file.backend().create_group(&path)?;
        debug!("created group {}", path);
        Ok(Group {
            file: self.file,
            path,
        })
    }

    pub fn open_group(&self, name: &str) -> Result<Group<'f>, DalError> {
        let path = self.member_path(name)?;
        match self.file.backend().member_kind(&path) {
            Some(MemberKind::Group) => Ok(Group {
                file: self.file,
                path,
            }),
            Some(_) => Err(DalError::InvalidHandle {
                kind: "group",
                path,
            }),
            None => Err(DalError::not_found("group", name, &self.path)),
        }
    }

    /// Names of the child groups.
    pub fn groups(&self) -> Result<Vec<String>, DalError> {
        self.file
            .backend()
            .list_members(&self.path, MemberKind::Group)
    }

    pub fn array_names(&self) -> Result<Vec<String>, DalError> {
        self.file
            .backend()
            .list_members(&self.path, MemberKind::Array)
    }

    pub fn table_names(&self) -> Result<Vec<String>, DalError> {
        self.file
            .backend()
            .list_members(&self.path, MemberKind::Table)
    }

    /// Create an array. A non-empty `desc.chunk` makes it extendible.
    pub fn create_array(&self, name: &str, desc: &ArrayDesc) -> Result<DalArray<'f>, DalError> {
        let path = self.member_path(name)?;
        DalArray::create(self.file, path, desc)
    }

    /// Create an array and fill it with `data`, given in row-major order.
    pub fn create_array_with_data<T: Element>(
        &self,
        name: &str,
        shape: Vec<usize>,
        chunk: Vec<usize>,
        data: &[T],
    ) -> Result<DalArray<'f>, DalError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(DalError::BadArrayShape {
                argument: "data".to_string(),
                function: "Group::create_array_with_data".to_string(),
                expected: format!("{} elements for shape {:?}", expected, shape),
                received: format!("{} elements", data.len()),
            });
        }
        let array = self.create_array(name, &ArrayDesc::new(T::TYPE, shape).chunked(chunk))?;
        array.write(0, data)?;
        Ok(array)
    }

    pub fn open_array(&self, name: &str) -> Result<DalArray<'f>, DalError> {
        let path = self.member_path(name)?;
        DalArray::open(self.file, path)
    }

    pub fn create_table(&self, name: &str, fields: &[FieldDesc]) -> Result<DalTable<'f>, DalError> {
        let path = self.member_path(name)?;
        DalTable::create(self.file, path, fields)
    }

    pub fn open_table(&self, name: &str) -> Result<DalTable<'f>, DalError> {
        let path = self.member_path(name)?;
        DalTable::open(self.file, path)
    }
}

impl AttributeOwner for Group<'_> {
    fn backend(&self) -> &dyn Backend {
        self.file.backend()
    }

    fn object_path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{element::ElementType, naming::station_group_name};

    #[test]
    fn test_group_tree() {
        let file = DalFile::in_memory();
        let station = file.create_group(&station_group_name(0)).unwrap();
        assert_eq!(station.name(), "Station000");
        assert_eq!(station.path(), "/Station000");
        station.create_group("sub").unwrap();
        file.create_group("Station001").unwrap();

        assert_eq!(file.groups().unwrap(), vec!["Station000", "Station001"]);
        let reopened = file.open_group("Station000").unwrap();
        assert_eq!(reopened.groups().unwrap(), vec!["sub"]);
        assert_eq!(file.root().name(), "/");
        assert_eq!(file.group_at("/Station000/sub").unwrap().name(), "sub");

        assert!(file.open_group("Station002").unwrap_err().is_not_found());
        assert!(matches!(
            file.create_group("Station000"),
            Err(DalError::Exists { .. })
        ));
    }

    #[test]
    fn test_bad_member_names() {
        let file = DalFile::in_memory();
        for name in ["", "a/b", ".", ".."] {
            assert!(
                matches!(file.create_group(name), Err(DalError::InvalidName(_))),
                "{:?}",
                name
            );
        }
    }

    #[test]
    fn test_member_listing() {
        let file = DalFile::in_memory();
        let group = file.create_group("beam000").unwrap();
        group
            .create_array("000000000", &ArrayDesc::new(ElementType::Short, vec![4]))
            .unwrap();
        group
            .create_table("SB000", &[FieldDesc::scalar("X", ElementType::Float)])
            .unwrap();
        group.create_group("child").unwrap();

        assert_eq!(group.array_names().unwrap(), vec!["000000000"]);
        assert_eq!(group.table_names().unwrap(), vec!["SB000"]);
        assert_eq!(group.groups().unwrap(), vec!["child"]);
        assert!(matches!(
            group.open_group("000000000"),
            Err(DalError::InvalidHandle { .. })
        ));
        assert!(group.open_array("SB000").is_err());
    }

    #[test]
    fn test_create_with_data() {
        let file = DalFile::in_memory();
        let array = file
            .root()
            .create_array_with_data("a", vec![2, 2], vec![], &[1_i32, 2, 3, 4])
            .unwrap();
        assert_eq!(array.read().unwrap().as_slice::<i32>().unwrap(), &[1, 2, 3, 4]);
        assert!(file
            .root()
            .create_array_with_data("b", vec![2, 2], vec![], &[1_i32])
            .is_err());
    }

    #[test]
    fn test_group_attributes() {
        let file = DalFile::in_memory();
        let group = file.create_group("Station000").unwrap();
        group.set_attribute("NUM_ANTS", 1_u32).unwrap();
        file.set_attribute("TELESCOPE", "LOFAR").unwrap();
        assert_eq!(group.get_attribute::<u32>("NUM_ANTS").unwrap(), 1);
        assert!(!group.has_attribute("TELESCOPE").unwrap());
        assert!(file.root().has_attribute("TELESCOPE").unwrap());
    }

    #[test]
    fn test_station_dipole_scenario() {
        use crate::naming::dipole_dataset_name;

        let file = DalFile::in_memory();
        {
            let station = file.create_group(&station_group_name(0)).unwrap();
            let dipole = station
                .create_array(
                    &dipole_dataset_name(0, 0, 0),
                    &ArrayDesc::new(ElementType::Short, vec![0]).chunked(vec![5000]),
                )
                .unwrap();
            station.set_attribute("NUM_ANTS", 1_u32).unwrap();
            dipole.extend(&[10]).unwrap();
            dipole.write(0, &(1..=10).collect::<Vec<i16>>()).unwrap();
            dipole.close();
        }

        let station = file.open_group("Station000").unwrap();
        let dipole = station.open_array("000000000").unwrap();
        assert_eq!(dipole.dims().unwrap(), vec![10]);
        assert_eq!(dipole.dims().unwrap(), vec![10]);
        assert_eq!(
            dipole.read().unwrap().as_slice::<i16>().unwrap(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]
        );
        assert_eq!(station.get_attribute::<u32>("NUM_ANTS").unwrap(), 1);
    }

    #[test]
    fn test_fits_open_fails() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.fits");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"SIMPLE  =                    T")
            .unwrap();
        assert!(matches!(
            DalFile::open(&path, IoMode::ReadOnly),
            Err(DalError::Unsupported { .. })
        ));
        assert!(DalFile::create(&path, FileType::Fits, IoMode::Create).is_err());
    }
}
