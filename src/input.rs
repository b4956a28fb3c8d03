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

//! Reading tagged points from GPX and KML exports.
//!
//! Both formats are loaded into a small element tree first. Coordinates are
//! kept as text so that a malformed position only affects its own record.

use std::ffi::OsStr;
use std::fmt::{self, Display};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use xml::reader::{self, XmlEvent};
use xml::ParserConfig;

use crate::record::PointRecord;
use crate::tags::TagDictionary;
use crate::Error;

/// Format of the input document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    #[default]
    Gpx,
    Kml,
}

impl InputFormat {
    /// Detect the format from the extension of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(OsStr::to_str)
            .and_then(|ext| ext.parse().ok())
    }

    /// Local name of the document element.
    fn root(self) -> &'static str {
        match self {
            Self::Gpx => "gpx",
            Self::Kml => "kml",
        }
    }
}

impl FromStr for InputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("gpx") {
            Ok(Self::Gpx)
        } else if s.eq_ignore_ascii_case("kml") {
            Ok(Self::Kml)
        } else {
            Err(Error::UnknownFormat(s.to_string()))
        }
    }
}

impl Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root())
    }
}

/// Read all points from `source` in document order.
pub fn read_records(source: impl Read, format: InputFormat) -> Result<Vec<PointRecord>, Error> {
    let root = read_tree(source)?;
    if root.name != format.root() {
        return Err(Error::UnexpectedRoot {
            expected: format.root(),
            found: root.name,
        });
    }

    let records: Vec<PointRecord> = match format {
        InputFormat::Gpx => root.children_named("wpt").map(convert_waypoint).collect(),
        InputFormat::Kml => {
            let mut placemarks = vec![];
            root.collect_named("Placemark", &mut placemarks);
            placemarks.into_iter().filter_map(convert_placemark).collect()
        }
    };
    Ok(records)
}

/// An XML element with namespace prefixes stripped from all names.
#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|child| child.name == name)
            .map(|child| child.text.as_str())
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Push all descendants called `name` in document order.
    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Node>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }

    /// First descendant called `name` in document order.
    fn find(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find_map(|child| {
                if child.name == name {
                    Some(child)
                } else {
                    child.find(name)
                }
            })
    }
}

/// Parse the complete document from `source` into a tree.
fn read_tree(source: impl Read) -> Result<Node, reader::Error> {
    let reader = ParserConfig::new()
        .ignore_comments(true)
        .create_reader(source);

    let mut stack: Vec<Node> = vec![];
    let mut root = Node::default();
    for event in reader {
        match event? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => stack.push(Node {
                name: name.local_name,
                attrs: attributes
                    .into_iter()
                    .map(|a| (a.name.local_name, a.value))
                    .collect(),
                ..Default::default()
            }),
            XmlEvent::EndElement { .. } => {
                if let Some(node) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = node,
                    }
                }
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            _ => {}
        }
    }
    Ok(root)
}

/// Convert a GPX `<wpt>`.
///
/// The seamark tags are expected as `key=value` lines in the description.
fn convert_waypoint(wpt: &Node) -> PointRecord {
    PointRecord {
        name: Some(wpt.child_text("name").unwrap_or_default().to_string()),
        lat: wpt.attr("lat").unwrap_or_default().to_string(),
        lon: wpt.attr("lon").unwrap_or_default().to_string(),
        tags: TagDictionary::from_description(wpt.child_text("desc").unwrap_or_default()),
        link: wpt
            .children_named("link")
            .find_map(|link| link.attr("href"))
            .map(str::to_string),
    }
}

/// Convert a KML _Placemark_ containing a _Point_.
///
/// The seamark tags are expected as _ExtendedData_ of the placemark.
fn convert_placemark(placemark: &Node) -> Option<PointRecord> {
    let point = placemark.find("Point")?;
    let coordinates = point.find("coordinates").map_or("", |c| c.text.trim());
    // The first `lon,lat[,alt]` tuple.
    let mut axes = coordinates
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .split(',');
    let lon = axes.next().unwrap_or_default().to_string();
    let lat = axes.next().unwrap_or_default().to_string();

    let mut data = vec![];
    placemark.collect_named("Data", &mut data);
    // Names and values are paired by position, so a _Data_ element without a
    // value shifts the pairing of all following ones.
    let keys = data.iter().copied().filter_map(|d| d.attr("name"));
    let values = data
        .iter()
        .copied()
        .flat_map(|d| d.children_named("value"))
        .map(|v| v.text.as_str())
        .filter(|v| !v.is_empty());

    Some(PointRecord {
        name: placemark.find("name").map(|n| n.text.clone()),
        lat,
        lon,
        tags: TagDictionary::from_parallel(keys, values),
        link: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kml(placemarks: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document>{placemarks}</Document></kml>"#
        )
    }

    #[test]
    fn format_from_path() {
        assert_eq!(InputFormat::from_path("data/export.gpx"), Some(InputFormat::Gpx));
        assert_eq!(InputFormat::from_path("export.KML"), Some(InputFormat::Kml));
        assert_eq!(InputFormat::from_path("export.json"), None);
        assert_eq!(InputFormat::from_path("export"), None);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("gpx".parse::<InputFormat>().unwrap(), InputFormat::Gpx);
        assert!(matches!(
            "csv".parse::<InputFormat>(),
            Err(Error::UnknownFormat(f)) if f == "csv"
        ));
    }

    #[test]
    fn gpx_waypoints() {
        let source = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="overpass turbo">
<wpt lat="50.3" lon="-4.5">
  <name>Duke Rock</name>
  <desc>seamark:type=buoy_lateral
seamark:colour=green</desc>
  <link href="https://osm.org/node/1"/>
</wpt>
<wpt lat="50.4" lon="-4.6"/>
</gpx>"#;
        let records = read_records(source.as_bytes(), InputFormat::Gpx).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.name.as_deref(), Some("Duke Rock"));
        assert_eq!(first.lat, "50.3");
        assert_eq!(first.lon, "-4.5");
        assert_eq!(first.tags.primary_type(), Some("buoy_lateral"));
        assert_eq!(first.tags.get("seamark:colour"), Some("green"));
        assert_eq!(first.link.as_deref(), Some("https://osm.org/node/1"));

        let second = &records[1];
        assert_eq!(second.name.as_deref(), Some(""));
        assert!(second.tags.is_empty());
        assert_eq!(second.link, None);
    }

    #[test]
    fn gpx_bad_coordinates_are_kept_as_text() {
        let source = r#"<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">
<wpt lat="abc" lon="-4.5"><desc>seamark:type=wreck</desc></wpt>
<wpt lon="-4.5"/>
</gpx>"#;
        let records = read_records(source.as_bytes(), InputFormat::Gpx).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].lat, "abc");
        assert_eq!(records[1].lat, "");
    }

    #[test]
    fn kml_placemarks() {
        let source = kml(r#"
  <Folder>
    <Placemark>
      <ExtendedData>
        <Data name="@id"><value>123</value></Data>
        <Data name="seamark:type"><value>wreck</value></Data>
      </ExtendedData>
      <Point><coordinates>-4.5,50.3,0</coordinates></Point>
    </Placemark>
  </Folder>
  <Placemark>
    <name>Area</name>
    <LineString><coordinates>-4.5,50.3 -4.6,50.4</coordinates></LineString>
  </Placemark>"#);
        let records = read_records(source.as_bytes(), InputFormat::Kml).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.name, None);
        assert_eq!(record.lat, "50.3");
        assert_eq!(record.lon, "-4.5");
        assert_eq!(record.tags.get("@id"), Some("123"));
        assert_eq!(record.tags.primary_type(), Some("wreck"));
    }

    #[test]
    fn kml_point_in_multi_geometry() {
        let source = kml(r#"
  <Placemark>
    <name>Split</name>
    <MultiGeometry>
      <LineString><coordinates>1,2 3,4</coordinates></LineString>
      <Point><coordinates>
        -4.7,50.5
      </coordinates></Point>
    </MultiGeometry>
  </Placemark>"#);
        let records = read_records(source.as_bytes(), InputFormat::Kml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Split"));
        assert_eq!(records[0].lat, "50.5");
        assert_eq!(records[0].lon, "-4.7");
    }

    #[test]
    fn kml_data_without_value_shifts_pairs() {
        let source = kml(r#"
  <Placemark>
    <ExtendedData>
      <Data name="@id"><value>1</value></Data>
      <Data name="note"><value></value></Data>
      <Data name="seamark:type"><value>buoy_lateral</value></Data>
      <Data name="seamark:buoy_lateral:shape"><value>can</value></Data>
    </ExtendedData>
    <Point><coordinates>-4.5,50.3</coordinates></Point>
  </Placemark>"#);
        let records = read_records(source.as_bytes(), InputFormat::Kml).unwrap();
        let tags = &records[0].tags;
        assert_eq!(
            tags.iter().collect::<Vec<_>>(),
            [("@id", "1"), ("note", "buoy_lateral"), ("seamark:type", "can")]
        );
    }

    #[test]
    fn kml_bad_coordinates_are_kept_as_text() {
        let source = kml("<Placemark><Point><coordinates>abc,def</coordinates></Point></Placemark>");
        let records = read_records(source.as_bytes(), InputFormat::Kml).unwrap();
        assert_eq!(records[0].lon, "abc");
        assert_eq!(records[0].lat, "def");
    }

    #[test]
    fn unreadable_document() {
        assert!(matches!(
            read_records("<gpx".as_bytes(), InputFormat::Gpx),
            Err(Error::Read(_))
        ));
    }

    #[test]
    fn wrong_document_type() {
        let source = kml("");
        assert!(matches!(
            read_records(source.as_bytes(), InputFormat::Gpx),
            Err(Error::UnexpectedRoot { expected: "gpx", found }) if found == "kml"
        ));
    }
}
