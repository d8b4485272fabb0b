// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Attribute names and other fixed strings shared with the LOFAR data products.
//!
//! The core layer treats these as opaque keys. Domain code reads and writes them verbatim.

/// The value written for any common attribute that has not been filled in.
pub const UNDEFINED: &str = "UNDEFINED";

/// Default value of the [`TELESCOPE`] attribute.
pub const DEFAULT_TELESCOPE: &str = "LOFAR";

/// Name of the root group of a hierarchical file.
pub const ROOT_GROUP: &str = "/";

// Attribute names used by the station / dipole / beam collaborators.

pub const TELESCOPE: &str = "TELESCOPE";
pub const OBSERVER: &str = "OBSERVER";
pub const PROJECT: &str = "PROJECT";
pub const OBS_ID: &str = "OBS_ID";
pub const OBSERVATION_ID: &str = "OBSERVATION_ID";
pub const OBS_MODE: &str = "OBS_MODE";
pub const OBSERVATION_MODE: &str = "OBSERVATION_MODE";
pub const NUM_ANTS: &str = "NUM_ANTS";
pub const NUMBER_OF_STATIONS: &str = "NUMBER_OF_STATIONS";
pub const NUMSAMPS: &str = "NUMSAMPS";
pub const NUMBER_OF_SAMPLES: &str = "NUMBER_OF_SAMPLES";
pub const SAMPLE_FREQ: &str = "SAMPLE_FREQ";
pub const DATA_LENGTH: &str = "DATA_LENGTH";
pub const TSYS: &str = "TSYS";
pub const BEAM_DIRECTION_VALUE: &str = "BEAM_DIRECTION_VALUE";
pub const BEAM_DIRECTION_UNIT: &str = "BEAM_DIRECTION_UNIT";
pub const BEAM_DIRECTION_FRAME: &str = "BEAM_DIRECTION_FRAME";
pub const STATION_POSITION_VALUE: &str = "STATION_POSITION_VALUE";
pub const STATION_POSITION_UNIT: &str = "STATION_POSITION_UNIT";
pub const STATION_POSITION_FRAME: &str = "STATION_POSITION_FRAME";
pub const TRIGGER_TYPE: &str = "TRIGGER_TYPE";
pub const TRIGGER_OFFSET: &str = "TRIGGER_OFFSET";
pub const TRIGGERED_ANTENNAS: &str = "TRIGGERED_ANTENNAS";

// Common (file level) attribute names.

pub const GROUPTYPE: &str = "GROUPTYPE";
pub const FILENAME: &str = "FILENAME";
pub const FILETYPE: &str = "FILETYPE";
pub const FILEDATE: &str = "FILEDATE";
pub const PROJECT_ID: &str = "PROJECT_ID";
pub const PROJECT_TITLE: &str = "PROJECT_TITLE";
pub const PROJECT_PI: &str = "PROJECT_PI";
pub const PROJECT_CO_I: &str = "PROJECT_CO_I";
pub const PROJECT_CONTACT: &str = "PROJECT_CONTACT";
pub const OBSERVATION_START_MJD: &str = "OBSERVATION_START_MJD";
pub const OBSERVATION_START_UTC: &str = "OBSERVATION_START_UTC";
pub const OBSERVATION_END_MJD: &str = "OBSERVATION_END_MJD";
pub const OBSERVATION_END_UTC: &str = "OBSERVATION_END_UTC";
pub const OBSERVATION_NOF_STATIONS: &str = "OBSERVATION_NOF_STATIONS";
pub const OBSERVATION_STATIONS_LIST: &str = "OBSERVATION_STATIONS_LIST";
pub const OBSERVATION_FREQUENCY_MIN: &str = "OBSERVATION_FREQUENCY_MIN";
pub const OBSERVATION_FREQUENCY_MAX: &str = "OBSERVATION_FREQUENCY_MAX";
pub const OBSERVATION_FREQUENCY_CENTER: &str = "OBSERVATION_FREQUENCY_CENTER";
pub const OBSERVATION_FREQUENCY_UNIT: &str = "OBSERVATION_FREQUENCY_UNIT";
pub const OBSERVATION_NOF_BITS_PER_SAMPLE: &str = "OBSERVATION_NOF_BITS_PER_SAMPLE";
pub const CLOCK_FREQUENCY: &str = "CLOCK_FREQUENCY";
pub const CLOCK_FREQUENCY_UNIT: &str = "CLOCK_FREQUENCY_UNIT";
pub const ANTENNA_SET: &str = "ANTENNA_SET";
pub const FILTER_SELECTION: &str = "FILTER_SELECTION";
pub const TARGET: &str = "TARGET";
pub const SYSTEM_VERSION: &str = "SYSTEM_VERSION";
pub const PIPELINE_NAME: &str = "PIPELINE_NAME";
pub const PIPELINE_VERSION: &str = "PIPELINE_VERSION";
pub const NOTES: &str = "NOTES";

// Table bookkeeping attributes, compatible with the HDF5 high level table API.

/// Attribute marking a compound dataset as a table.
pub const TABLE_CLASS_ATTR: &str = "CLASS";
/// Value of [`TABLE_CLASS_ATTR`] on tables.
pub const TABLE_CLASS: &str = "TABLE";
pub const TABLE_VERSION_ATTR: &str = "VERSION";
pub const TABLE_VERSION: &str = "3.0";
pub const TABLE_TITLE_ATTR: &str = "TITLE";

/// Compound field names of complex elements.
pub const COMPLEX_REAL_FIELD: &str = "real";
pub const COMPLEX_IMAG_FIELD: &str = "imag";
