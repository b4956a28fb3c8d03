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

//! Point records before and after classification.

use crate::classify::{classify_color, classify_symbol, TypeFilter};
use crate::tags::{TagDictionary, OSM_ID, SEAMARK_NAME};
use crate::{RecordError, Report};

/// A candidate waypoint as read from the input document.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    /// Name given by the input document.
    pub name: Option<String>,
    /// Latitude as written in the input document.
    pub lat: String,
    /// Longitude as written in the input document.
    pub lon: String,
    pub tags: TagDictionary,
    pub link: Option<String>,
}

/// A waypoint ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedWaypoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// ISO-8601 timestamp shared by all waypoints of a run.
    pub time: String,
    /// One `key=value` line per tag.
    pub description: String,
    pub link: Option<String>,
    /// Never empty.
    pub symbol: String,
    /// RGB hex code or empty for no color.
    pub color: &'static str,
}

impl PointRecord {
    /// Filter and classify this record.
    ///
    /// Returns `Ok(None)` if the record has no primary type or if `filter`
    /// rejects it. Rejected types are added to the `report`, as are the
    /// symbols of successfully classified waypoints.
    pub fn classify(
        self,
        filter: &TypeFilter,
        time: &str,
        report: &mut Report,
    ) -> Result<Option<ClassifiedWaypoint>, RecordError> {
        let Some(primary_type) = self.tags.primary_type() else {
            return Ok(None);
        };
        if !filter.accepts(primary_type) {
            log::info!("ignoring {:?} of type {primary_type}", self.label());
            report.ignore_type(primary_type);
            return Ok(None);
        }

        let (lat, lon) = parse_position(&self.lat, &self.lon)?;
        let name = self.display_name()?.to_string();
        let symbol = classify_symbol(&self.tags, primary_type)?;
        let color = classify_color(&self.tags, &symbol);
        log::debug!("{name:?} is {symbol} with color {color:?}");
        report.use_symbol(&symbol);

        Ok(Some(ClassifiedWaypoint {
            name,
            lat,
            lon,
            time: time.to_string(),
            description: self.tags.to_string(),
            link: self.link,
            symbol,
            color,
        }))
    }

    /// Best-effort name for diagnostics.
    pub fn label(&self) -> &str {
        self.display_name().unwrap_or_default()
    }

    /// The `seamark:name` tag, or else the document's name, or else the OSM ID.
    fn display_name(&self) -> Result<&str, RecordError> {
        self.tags
            .get(SEAMARK_NAME)
            .or(self.name.as_deref())
            .or_else(|| self.tags.get(OSM_ID))
            .ok_or(RecordError::MissingTag(OSM_ID))
    }
}

/// Parse and range-check decimal degrees.
fn parse_position(lat: &str, lon: &str) -> Result<(f64, f64), RecordError> {
    let invalid = || RecordError::InvalidPosition {
        lat: lat.to_string(),
        lon: lon.to_string(),
    };
    let lat_deg: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon_deg: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if (-90.0..=90.0).contains(&lat_deg) && (-180.0..=180.0).contains(&lon_deg) {
        Ok((lat_deg, lon_deg))
    } else {
        Err(invalid())
    }
}
