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

//! Writing classified waypoints as GPX for the chart plotter.

use std::io::Write;

use xml::common::XmlVersion;
use xml::writer::{self, XmlEvent};
use xml::{EmitterConfig, EventWriter};

use crate::record::ClassifiedWaypoint;

/// Value of the `creator` attribute.
const CREATOR: &str = concat!("seamark_convert ", env!("CARGO_PKG_VERSION"));
const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";
/// Namespace prefixes of the `<gpx>` tag.
const NAMESPACES: &[(&str, &str)] = &[
    ("xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    ("xstyle", "http://www.topografix.com/GPX/gpx_style/0/2"),
    ("xgarmin", "http://www.garmin.com/xmlschemas/GpxExtensions/v3"),
];
const SCHEMA_LOCATION: &str = "http://www.topografix.com/GPX/1/1 \
    http://www.topografix.com/GPX/1/1/gpx.xsd \
    http://www.topografix.com/GPX/gpx_style/0/2 \
    http://www.topografix.com/GPX/gpx_style/0/2/gpx_style.xsd \
    http://www.garmin.com/xmlschemas/GpxExtensions/v3 \
    https://www8.garmin.com/xmlschemas/GpxExtensionsv3.xsd";
/// Content of the `<type>` tag of every waypoint.
const WAYPOINT_TYPE: &str = "Marks";

/// Streams waypoints into a GPX document.
pub struct DocumentWriter<W: Write> {
    writer: EventWriter<W>,
}

impl<W: Write> DocumentWriter<W> {
    /// Write the document header to `sink`.
    pub fn start(sink: W) -> writer::Result<Self> {
        let mut writer = EmitterConfig::new()
            .perform_indent(true)
            .normalize_empty_elements(false)
            .create_writer(sink);

        writer.write(XmlEvent::StartDocument {
            version: XmlVersion::Version10,
            encoding: Some("UTF-8"),
            standalone: None,
        })?;
        let mut gpx = XmlEvent::start_element("gpx")
            .attr("version", "1.1")
            .attr("creator", CREATOR)
            .default_ns(GPX_NS);
        for (prefix, uri) in NAMESPACES {
            gpx = gpx.ns(*prefix, *uri);
        }
        writer.write(gpx.attr("xsi:schemaLocation", SCHEMA_LOCATION))?;

        Ok(Self { writer })
    }

    /// Append a single `<wpt>`.
    pub fn write_waypoint(&mut self, waypoint: &ClassifiedWaypoint) -> writer::Result<()> {
        let lat = waypoint.lat.to_string();
        let lon = waypoint.lon.to_string();
        let w = &mut self.writer;

        w.write(XmlEvent::start_element("wpt").attr("lat", &lat).attr("lon", &lon))?;
        simple_element(w, "time", &waypoint.time)?;
        simple_element(w, "name", &waypoint.name)?;
        simple_element(w, "desc", &waypoint.description)?;
        let href = waypoint.link.as_deref().unwrap_or_default();
        w.write(XmlEvent::start_element("link").attr("href", href))?;
        w.write(XmlEvent::end_element())?;
        simple_element(w, "sym", &waypoint.symbol)?;
        simple_element(w, "type", WAYPOINT_TYPE)?;
        w.write(XmlEvent::start_element("extensions"))?;
        w.write(XmlEvent::start_element("xstyle:fill"))?;
        simple_element(w, "xstyle:color", waypoint.color)?;
        w.write(XmlEvent::end_element())?;
        w.write(XmlEvent::end_element())?;
        w.write(XmlEvent::end_element())
    }

    /// Close the document and return the sink.
    pub fn finish(mut self) -> writer::Result<W> {
        self.writer.write(XmlEvent::end_element())?;
        let mut sink = self.writer.into_inner();
        writeln!(sink)?;
        Ok(sink)
    }
}

/// Write a complete document containing `waypoints` in iteration order.
pub fn write_document<W, I>(sink: W, waypoints: I) -> writer::Result<W>
where
    W: Write,
    I: IntoIterator<Item = ClassifiedWaypoint>,
{
    let mut document = DocumentWriter::start(sink)?;
    for waypoint in waypoints {
        document.write_waypoint(&waypoint)?;
    }
    document.finish()
}

/// Write an element with `name` and text `content`.
fn simple_element<W: Write>(
    writer: &mut EventWriter<W>,
    name: &str,
    content: &str,
) -> writer::Result<()> {
    writer.write(XmlEvent::start_element(name))?;
    if !content.is_empty() {
        writer.write(XmlEvent::characters(content))?;
    }
    writer.write(XmlEvent::end_element())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint() -> ClassifiedWaypoint {
        ClassifiedWaypoint {
            name: "Fish & Chips".to_string(),
            lat: 50.3,
            lon: -4.5,
            time: "2023-05-01T12:00:00Z".to_string(),
            description: "seamark:type=buoy_lateral\nseamark:colour=red\n".to_string(),
            link: Some("https://osm.org/node/1".to_string()),
            symbol: "buoy_can".to_string(),
            color: "FF0000",
        }
    }

    fn render(waypoints: Vec<ClassifiedWaypoint>) -> String {
        let sink = write_document(vec![], waypoints).unwrap();
        String::from_utf8(sink).unwrap()
    }

    #[test]
    fn empty_document() {
        let gpx = render(vec![]);
        assert!(gpx.starts_with("<?xml"));
        assert!(gpx.contains(r#"xmlns="http://www.topografix.com/GPX/1/1""#));
        assert!(gpx.contains("xmlns:xstyle="));
        assert!(gpx.contains("xmlns:xgarmin="));
        assert!(gpx.contains("xsi:schemaLocation="));
        assert!(!gpx.contains("<wpt"));
        assert!(gpx.trim_end().ends_with("</gpx>"));
    }

    #[test]
    fn waypoint_elements() {
        let gpx = render(vec![waypoint()]);
        assert!(gpx.contains(r#"<wpt lat="50.3" lon="-4.5">"#));
        assert!(gpx.contains("<time>2023-05-01T12:00:00Z</time>"));
        assert!(gpx.contains("<name>Fish &amp; Chips</name>"));
        assert!(gpx.contains("seamark:colour=red"));
        assert!(gpx.contains(r#"href="https://osm.org/node/1""#));
        assert!(gpx.contains("<sym>buoy_can</sym>"));
        assert!(gpx.contains("<type>Marks</type>"));
        assert!(gpx.contains("<xstyle:color>FF0000</xstyle:color>"));
    }

    #[test]
    fn link_and_color_are_always_written() {
        let mut plain = waypoint();
        plain.link = None;
        plain.color = "";
        let gpx = render(vec![plain]);
        assert!(gpx.contains(r#"<link href=""></link>"#));
        assert!(gpx.contains("<xstyle:fill>"));
        assert!(gpx.contains("<xstyle:color></xstyle:color>"));
        assert!(gpx.contains("<sym>buoy_can</sym>"));
    }

    #[test]
    fn order_is_preserved() {
        let names = ["first", "second", "third"];
        let waypoints = names
            .iter()
            .map(|name| ClassifiedWaypoint {
                name: name.to_string(),
                ..waypoint()
            })
            .collect();
        let gpx = render(waypoints);
        let positions: Vec<_> = names
            .iter()
            .map(|name| gpx.find(&format!("<name>{name}</name>")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]));
    }
}
