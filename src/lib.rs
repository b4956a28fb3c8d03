// Copyright 2023 Viktor Reusch
//
// This file is part of seamark_convert.
//
// seamark_convert is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// seamark_convert is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License
// for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with seamark_convert. If not, see <https://www.gnu.org/licenses/>.

//! Library for converting OpenStreetMap seamarks to chart plotter waypoints.
//!
//! It reads buoys, beacons, wrecks, and moorings exported from OpenStreetMap
//! (for example, using [Overpass Turbo](https://overpass-turbo.eu/)) as
//! [GPX](https://www.topografix.com/gpx.asp) or
//! [KML](https://developers.google.com/kml) and writes them as GPX waypoints
//! with chart plotter symbols and fill colors.
//!
//! See [`convert`] for information on how to use this library.

use std::collections::BTreeSet;
use std::io::{self, Read};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

pub mod classify;
pub mod input;
pub mod output;
pub mod record;
pub mod tags;

pub use classify::{classify_color, classify_symbol, TypeFilter, DEFAULT_PREFIXES};
pub use input::{read_records, InputFormat};
pub use output::{write_document, DocumentWriter};
pub use record::{ClassifiedWaypoint, PointRecord};
pub use tags::TagDictionary;

/// Error returned from the [`convert`] function.
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not well-formed XML.
    #[error("reading XML failed: {0}")]
    Read(#[from] xml::reader::Error),
    /// The input is XML but not of the selected format.
    #[error("expected <{expected}> document but found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
    /// GPX writing failed.
    #[error("writing GPX failed: {0}")]
    Write(#[from] xml::writer::Error),
    /// Reading or writing the underlying streams failed.
    #[error("I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The input format name or file extension is not supported.
    #[error("unknown input format {0:?}")]
    UnknownFormat(String),
}

/// Reason for skipping a single record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// A tag needed for classification or naming is absent.
    #[error("missing tag {0}")]
    MissingTag(&'static str),
    /// The coordinates are not decimal degrees within range.
    #[error("invalid position lat={lat:?} lon={lon:?}")]
    InvalidPosition { lat: String, lon: String },
}

/// Settings of a conversion run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub format: InputFormat,
    pub filter: TypeFilter,
    /// Timestamp of all waypoints. The current time if `None`.
    pub time: Option<DateTime<Utc>>,
}

/// Summary of a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Primary types rejected by the [`TypeFilter`].
    pub ignored_types: BTreeSet<String>,
    /// Symbols of all written waypoints.
    pub used_symbols: BTreeSet<String>,
    /// Number of written waypoints.
    pub waypoints: usize,
    /// Number of records skipped because of a [`RecordError`].
    pub skipped: usize,
}

impl Report {
    pub fn ignore_type(&mut self, primary_type: &str) {
        self.ignored_types.insert(primary_type.to_string());
    }

    pub fn use_symbol(&mut self, symbol: &str) {
        self.used_symbols.insert(symbol.to_string());
    }
}

/// Read seamarks and write chart plotter waypoints.
///
/// A complete GPX or KML file, as selected by `options.format`, is read from
/// `source`. The accepted seamarks are written as a complete GPX file to
/// `sink` in source order. Records which cannot be classified are skipped
/// with a warning.
///
/// If an error occurs, the function returns immediately. The `source` and
/// `sink` might have been modified in this case.
///
/// # Example
/// ```
/// # use seamark_convert::{convert, Options};
/// #
/// let source = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">
///     <wpt lat="50.3" lon="-4.5">
///         <name>Duke Rock</name>
///         <desc>seamark:type=buoy_lateral
/// seamark:colour=green
/// top=conical</desc>
///     </wpt>
/// </gpx>
/// "#;
/// let mut sink = vec![];
///
/// let report = convert(source.as_bytes(), &mut sink, &Options::default())
///     .expect("conversion failed");
///
/// let gpx = String::from_utf8(sink).expect("GPX data is not valid UTF-8");
/// assert!(gpx.contains("<sym>buoy_conical</sym>"));
/// assert!(gpx.contains("<xstyle:color>008000</xstyle:color>"));
/// assert_eq!(report.waypoints, 1);
/// ```
pub fn convert(
    source: impl Read,
    sink: impl io::Write,
    options: &Options,
) -> Result<Report, Error> {
    let records = read_records(source, options.format)?;
    let time = options
        .time
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut report = Report::default();
    let waypoints = records.into_iter().filter_map(|record| {
        let label = record.label().to_string();
        match record.classify(&options.filter, &time, &mut report) {
            Ok(Some(waypoint)) => {
                report.waypoints += 1;
                Some(waypoint)
            }
            Ok(None) => None,
            Err(err) => {
                log::warn!("skipping {label:?}: {err}");
                report.skipped += 1;
                None
            }
        }
    });
    write_document(sink, waypoints)?;

    log::info!(
        "wrote {} waypoints, skipped {} records",
        report.waypoints,
        report.skipped
    );
    Ok(report)
}
