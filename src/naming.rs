// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Names of groups, datasets and files that follow the LOFAR conventions.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use lazy_static::lazy_static;

use crate::io::DalError;

/// `Station%03d`
pub fn station_group_name(station: u32) -> String {
    format!("Station{:03}", station)
}

/// `beam%03d`
pub fn beam_group_name(beam: u32) -> String {
    format!("beam{:03}", beam)
}

/// `SB%03d`, the table holding one sub-band of a beam.
pub fn subband_table_name(subband: u32) -> String {
    format!("SB{:03}", subband)
}

/// The 9 digit id of a dipole dataset, made of the station, RSP and RCU numbers.
pub fn dipole_dataset_name(station: u32, rsp: u32, rcu: u32) -> String {
    format!("{:03}{:03}{:03}", station, rsp, rcu)
}

/// The kind of data held in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Visibilities.
    Uv,
    /// Sky images.
    Sky,
    /// Rotation measure synthesis cubes.
    Rm,
    /// Near-field images.
    Nfi,
    /// Dynamic spectra.
    Dynspec,
    /// Beam-formed data.
    Bf,
    /// Transient buffer board dumps.
    Tbb,
}

/// The extension of a file.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileExtension {
    MS,
    h5,
    fits,
    log,
    parset,
    lsm,
    IM,
    PD,
    vds,
    gds,
    conf,
    raw,
    incoherentstokes,
}

lazy_static! {
    static ref KIND_NAMES: Vec<(FileKind, &'static str)> = vec![
        (FileKind::Uv, "uv"),
        (FileKind::Sky, "sky"),
        (FileKind::Rm, "rm"),
        (FileKind::Nfi, "nfi"),
        (FileKind::Dynspec, "dynspec"),
        (FileKind::Bf, "bf"),
        (FileKind::Tbb, "tbb"),
    ];
    static ref KINDS: HashMap<&'static str, FileKind> =
        KIND_NAMES.iter().map(|&(k, n)| (n, k)).collect();
    static ref EXTENSION_NAMES: Vec<(FileExtension, &'static str)> = vec![
        (FileExtension::MS, "MS"),
        (FileExtension::h5, "h5"),
        (FileExtension::fits, "fits"),
        (FileExtension::log, "log"),
        (FileExtension::parset, "parset"),
        (FileExtension::lsm, "lsm"),
        (FileExtension::IM, "IM"),
        (FileExtension::PD, "PD"),
        (FileExtension::vds, "vds"),
        (FileExtension::gds, "gds"),
        (FileExtension::conf, "conf"),
        (FileExtension::raw, "raw"),
        (FileExtension::incoherentstokes, "incoherentstokes"),
    ];
    static ref EXTENSIONS: HashMap<&'static str, FileExtension> =
        EXTENSION_NAMES.iter().map(|&(e, n)| (n, e)).collect();
}

impl FileKind {
    pub fn name(self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, n)| *n)
            .unwrap_or("UNDEFINED")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        KINDS.get(name).copied()
    }
}

impl FileExtension {
    pub fn name(self) -> &'static str {
        EXTENSION_NAMES
            .iter()
            .find(|(e, _)| *e == self)
            .map(|(_, n)| *n)
            .unwrap_or("UNDEFINED")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        EXTENSIONS.get(name).copied()
    }
}

/// A file name of the form `L<observation id>[_<description>]_<kind>.<extension>`, with an
/// optional directory.
///
/// # Examples
///
/// ```
/// use lofar_dal::naming::{FileExtension, FileKind, Filename};
///
/// let name = Filename::new("123456789", FileKind::Tbb, FileExtension::h5).with_description("D20090703");
/// assert_eq!(name.file_name(), "L123456789_D20090703_tbb.h5");
/// assert_eq!(Filename::parse(&name.file_name()).unwrap(), name);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filename {
    pub observation_id: String,
    pub description: Option<String>,
    pub kind: FileKind,
    pub extension: FileExtension,
    pub directory: Option<PathBuf>,
}

impl Filename {
    pub fn new<S: Into<String>>(observation_id: S, kind: FileKind, extension: FileExtension) -> Self {
        Self {
            observation_id: observation_id.into(),
            description: None,
            kind,
            extension,
            directory: None,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        let description = description.into();
        self.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn with_directory<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.directory = Some(directory.as_ref().to_path_buf());
        self
    }

    pub fn file_name(&self) -> String {
        match &self.description {
            Some(d) => format!(
                "L{}_{}_{}.{}",
                self.observation_id,
                d,
                self.kind.name(),
                self.extension.name()
            ),
            None => format!(
                "L{}_{}.{}",
                self.observation_id,
                self.kind.name(),
                self.extension.name()
            ),
        }
    }

    /// The file name joined onto the directory, if there is one.
    pub fn full_path(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.join(self.file_name()),
            None => PathBuf::from(self.file_name()),
        }
    }

    /// Split a file name (without directory) into its parts.
    pub fn parse(name: &str) -> Result<Self, DalError> {
        let invalid = || DalError::InvalidName(name.to_string());
        let stem = name.strip_prefix('L').ok_or_else(invalid)?;
        let (stem, extension) = stem.rsplit_once('.').ok_or_else(invalid)?;
        let extension = FileExtension::from_name(extension).ok_or_else(invalid)?;
        let (stem, kind) = stem.rsplit_once('_').ok_or_else(invalid)?;
        let kind = FileKind::from_name(kind).ok_or_else(invalid)?;
        let (observation_id, description) = match stem.split_once('_') {
            Some((id, d)) => (id, Some(d.to_string())),
            None => (stem, None),
        };
        if observation_id.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            observation_id: observation_id.to_string(),
            description,
            kind,
            extension,
            directory: None,
        })
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_path().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_names() {
        assert_eq!(station_group_name(0), "Station000");
        assert_eq!(station_group_name(17), "Station017");
        assert_eq!(beam_group_name(2), "beam002");
        assert_eq!(subband_table_name(5), "SB005");
        assert_eq!(dipole_dataset_name(0, 0, 0), "000000000");
        assert_eq!(dipole_dataset_name(1, 2, 3), "001002003");
    }

    #[test]
    fn test_kind_and_extension_names() {
        for (kind, name) in KIND_NAMES.iter() {
            assert_eq!(kind.name(), *name);
            assert_eq!(FileKind::from_name(name), Some(*kind));
        }
        for (ext, name) in EXTENSION_NAMES.iter() {
            assert_eq!(ext.name(), *name);
            assert_eq!(FileExtension::from_name(name), Some(*ext));
        }
        assert_eq!(FileExtension::from_name("H5"), None);
    }

    #[test]
    fn test_file_names() {
        let name = Filename::new("123456789", FileKind::Uv, FileExtension::MS);
        assert_eq!(name.file_name(), "L123456789_uv.MS");
        assert_eq!(Filename::parse("L123456789_uv.MS").unwrap(), name);

        let name = name
            .with_description("SB001_test")
            .with_directory("/data");
        assert_eq!(name.file_name(), "L123456789_SB001_test_uv.MS");
        assert_eq!(
            name.full_path(),
            PathBuf::from("/data/L123456789_SB001_test_uv.MS")
        );
        let parsed = Filename::parse("L123456789_SB001_test_uv.MS").unwrap();
        assert_eq!(parsed.description.as_deref(), Some("SB001_test"));
        assert_eq!(parsed.directory, None);
    }

    #[test]
    fn test_bad_file_names() {
        for bad in [
            "123_uv.MS",
            "L123_uv",
            "L123_xx.MS",
            "L123_uv.exe",
            "L_uv.MS",
            "L123.MS",
        ] {
            assert!(Filename::parse(bad).is_err(), "{}", bad);
        }
    }
}
