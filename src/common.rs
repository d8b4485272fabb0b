// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The metadata every LOFAR file carries on its root group.

use hifitime::Epoch;
use log::{trace, warn};

use crate::{
    attribute::{AttributeOwner, FromAttribute},
    built_info::PKG_VERSION,
    constants::*,
    io::DalError,
};

/// File level attributes. Strings that are unknown hold [`UNDEFINED`], numbers that are unknown
/// are `None` and are not written.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonAttributes {
    pub group_type: String,
    pub filename: String,
    pub filetype: String,
    /// When the file was written.
    pub filedate: String,
    pub telescope: String,
    pub observer: String,
    pub project_id: String,
    pub project_title: String,
    pub project_pi: String,
    pub project_co_i: String,
    pub project_contact: String,
    pub observation_id: String,
    pub observation_start: Option<Epoch>,
    pub observation_end: Option<Epoch>,
    pub observation_nof_stations: Option<u32>,
    pub observation_stations_list: Vec<String>,
    pub observation_frequency_min: Option<f64>,
    pub observation_frequency_max: Option<f64>,
    pub observation_frequency_center: Option<f64>,
    pub observation_frequency_unit: String,
    pub observation_nof_bits_per_sample: Option<u32>,
    pub clock_frequency: Option<f64>,
    pub clock_frequency_unit: String,
    pub antenna_set: String,
    pub filter_selection: String,
    pub target: String,
    pub system_version: String,
    pub pipeline_name: String,
    pub pipeline_version: String,
    pub notes: String,
}

impl Default for CommonAttributes {
    fn default() -> Self {
        let undefined = || UNDEFINED.to_string();
        Self {
            group_type: "Root".to_string(),
            filename: undefined(),
            filetype: undefined(),
            filedate: undefined(),
            telescope: DEFAULT_TELESCOPE.to_string(),
            observer: undefined(),
            project_id: undefined(),
            project_title: undefined(),
            project_pi: undefined(),
            project_co_i: undefined(),
            project_contact: undefined(),
            observation_id: undefined(),
            observation_start: None,
            observation_end: None,
            observation_nof_stations: None,
            observation_stations_list: vec![],
            observation_frequency_min: None,
            observation_frequency_max: None,
            observation_frequency_center: None,
            observation_frequency_unit: "MHz".to_string(),
            observation_nof_bits_per_sample: None,
            clock_frequency: None,
            clock_frequency_unit: "MHz".to_string(),
            antenna_set: undefined(),
            filter_selection: undefined(),
            target: undefined(),
            system_version: PKG_VERSION.to_string(),
            pipeline_name: undefined(),
            pipeline_version: undefined(),
            notes: undefined(),
        }
    }
}

/// A string attribute, or [`UNDEFINED`] if it is absent.
fn read_string<O: AttributeOwner>(owner: &O, name: &str) -> Result<String, DalError> {
    read_optional(owner, name).map(|v| v.unwrap_or_else(|| UNDEFINED.to_string()))
}

fn read_optional<O: AttributeOwner, T: FromAttribute>(owner: &O, name: &str) -> Result<Option<T>, DalError> {
    match owner.get_attribute::<T>(name) {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => {
            trace!("{} not set on {}", name, owner.object_path());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl CommonAttributes {
    pub fn new<S: Into<String>>(filename: S, filetype: S) -> Self {
        Self {
            filename: filename.into(),
            filetype: filetype.into(),
            ..Default::default()
        }
    }

    /// Set `FILEDATE` to the current time. If the clock cannot be read it stays as it was.
    pub fn stamp_filedate(&mut self) {
        match Epoch::now() {
            Ok(now) => self.filedate = now.to_string(),
            Err(e) => warn!("could not read the system clock for FILEDATE: {}", e),
        }
    }

    /// Write every attribute to `owner`, overwriting existing values.
    pub fn write_to<O: AttributeOwner>(&self, owner: &O) -> Result<(), DalError> {
        for (name, value) in [
            (GROUPTYPE, &self.group_type),
            (FILENAME, &self.filename),
            (FILETYPE, &self.filetype),
            (FILEDATE, &self.filedate),
            (TELESCOPE, &self.telescope),
            (OBSERVER, &self.observer),
            (PROJECT_ID, &self.project_id),
            (PROJECT_TITLE, &self.project_title),
            (PROJECT_PI, &self.project_pi),
            (PROJECT_CO_I, &self.project_co_i),
            (PROJECT_CONTACT, &self.project_contact),
            (OBSERVATION_ID, &self.observation_id),
            (OBSERVATION_FREQUENCY_UNIT, &self.observation_frequency_unit),
            (CLOCK_FREQUENCY_UNIT, &self.clock_frequency_unit),
            (ANTENNA_SET, &self.antenna_set),
            (FILTER_SELECTION, &self.filter_selection),
            (TARGET, &self.target),
            (SYSTEM_VERSION, &self.system_version),
            (PIPELINE_NAME, &self.pipeline_name),
            (PIPELINE_VERSION, &self.pipeline_version),
            (NOTES, &self.notes),
        ] {
            owner.set_attribute(name, value.as_str())?;
        }

        for (mjd_name, utc_name, epoch) in [
            (OBSERVATION_START_MJD, OBSERVATION_START_UTC, self.observation_start),
            (OBSERVATION_END_MJD, OBSERVATION_END_UTC, self.observation_end),
        ] {
            if let Some(epoch) = epoch {
                owner.set_attribute(mjd_name, epoch.to_mjd_utc_days())?;
                owner.set_attribute(utc_name, epoch.to_string().as_str())?;
            }
        }

        for (name, value) in [
            (OBSERVATION_FREQUENCY_MIN, self.observation_frequency_min),
            (OBSERVATION_FREQUENCY_MAX, self.observation_frequency_max),
            (OBSERVATION_FREQUENCY_CENTER, self.observation_frequency_center),
            (CLOCK_FREQUENCY, self.clock_frequency),
        ] {
            if let Some(value) = value {
                owner.set_attribute(name, value)?;
            }
        }

        for (name, value) in [
            (OBSERVATION_NOF_STATIONS, self.observation_nof_stations),
            (OBSERVATION_NOF_BITS_PER_SAMPLE, self.observation_nof_bits_per_sample),
        ] {
            if let Some(value) = value {
                owner.set_attribute(name, value)?;
            }
        }

        if !self.observation_stations_list.is_empty() {
            owner.set_attribute(
                OBSERVATION_STATIONS_LIST,
                self.observation_stations_list.clone(),
            )?;
        }
        Ok(())
    }

    /// Read the attributes back from `owner`. Absent attributes take their unknown value.
    pub fn read_from<O: AttributeOwner>(owner: &O) -> Result<Self, DalError> {
        let epoch = |name: &str| -> Result<Option<Epoch>, DalError> {
            Ok(read_optional::<O, f64>(owner, name)?.map(Epoch::from_mjd_utc))
        };
        Ok(Self {
            group_type: read_string(owner, GROUPTYPE)?,
            filename: read_string(owner, FILENAME)?,
            filetype: read_string(owner, FILETYPE)?,
            filedate: read_string(owner, FILEDATE)?,
            telescope: read_string(owner, TELESCOPE)?,
            observer: read_string(owner, OBSERVER)?,
            project_id: read_string(owner, PROJECT_ID)?,
            project_title: read_string(owner, PROJECT_TITLE)?,
            project_pi: read_string(owner, PROJECT_PI)?,
            project_co_i: read_string(owner, PROJECT_CO_I)?,
            project_contact: read_string(owner, PROJECT_CONTACT)?,
            observation_id: read_string(owner, OBSERVATION_ID)?,
            observation_start: epoch(OBSERVATION_START_MJD)?,
            observation_end: epoch(OBSERVATION_END_MJD)?,
            observation_nof_stations: read_optional(owner, OBSERVATION_NOF_STATIONS)?,
            observation_stations_list: read_optional(owner, OBSERVATION_STATIONS_LIST)?
                .unwrap_or_default(),
            observation_frequency_min: read_optional(owner, OBSERVATION_FREQUENCY_MIN)?,
            observation_frequency_max: read_optional(owner, OBSERVATION_FREQUENCY_MAX)?,
            observation_frequency_center: read_optional(owner, OBSERVATION_FREQUENCY_CENTER)?,
            observation_frequency_unit: read_string(owner, OBSERVATION_FREQUENCY_UNIT)?,
            observation_nof_bits_per_sample: read_optional(owner, OBSERVATION_NOF_BITS_PER_SAMPLE)?,
            clock_frequency: read_optional(owner, CLOCK_FREQUENCY)?,
            clock_frequency_unit: read_string(owner, CLOCK_FREQUENCY_UNIT)?,
            antenna_set: read_string(owner, ANTENNA_SET)?,
            filter_selection: read_string(owner, FILTER_SELECTION)?,
            target: read_string(owner, TARGET)?,
            system_version: read_string(owner, SYSTEM_VERSION)?,
            pipeline_name: read_string(owner, PIPELINE_NAME)?,
            pipeline_version: read_string(owner, PIPELINE_VERSION)?,
            notes: read_string(owner, NOTES)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::DalFile;

    #[test]
    fn test_defaults() {
        let common = CommonAttributes::new("L123_tbb.h5", "tbb");
        assert_eq!(common.telescope, "LOFAR");
        assert_eq!(common.observer, UNDEFINED);
        assert_eq!(common.system_version, PKG_VERSION);
        assert_eq!(common.observation_start, None);
    }

    #[test]
    fn test_round_trip() {
        let file = DalFile::in_memory();
        let mut common = CommonAttributes::new("L123_tbb.h5", "tbb");
        common.observer = "A. Astronomer".to_string();
        common.observation_start = Some(Epoch::from_gpst_seconds(1065880128.0));
        common.observation_nof_stations = Some(2);
        common.observation_stations_list = vec!["CS001".to_string(), "CS002".to_string()];
        common.clock_frequency = Some(200.0);
        common.stamp_filedate();
        common.write_to(&file).unwrap();

        let back = CommonAttributes::read_from(&file).unwrap();
        assert_eq!(back.filename, "L123_tbb.h5");
        assert_eq!(back.observer, "A. Astronomer");
        assert_eq!(back.observation_nof_stations, Some(2));
        assert_eq!(back.observation_stations_list, common.observation_stations_list);
        assert_eq!(back.clock_frequency, Some(200.0));
        assert_eq!(back.observation_end, None);
        assert_eq!(back.filedate, common.filedate);
        assert_abs_diff_eq!(
            back.observation_start.unwrap().to_mjd_utc_days(),
            common.observation_start.unwrap().to_mjd_utc_days(),
            epsilon = 1e-9
        );
        assert_eq!(
            file.get_attribute::<String>(OBSERVATION_START_UTC).unwrap(),
            common.observation_start.unwrap().to_string()
        );
    }

    #[test]
    fn test_missing_reads_undefined() {
        let file = DalFile::in_memory();
        file.set_attribute(TELESCOPE, "LOFAR").unwrap();
        let back = CommonAttributes::read_from(&file).unwrap();
        assert_eq!(back.telescope, "LOFAR");
        assert_eq!(back.project_title, UNDEFINED);
        assert_eq!(back.clock_frequency, None);
        assert!(back.observation_stations_list.is_empty());

        file.set_attribute(NOTES, 3_i32).unwrap();
        assert!(matches!(
            CommonAttributes::read_from(&file),
            Err(DalError::TypeMismatch { .. })
        ));
    }
}
