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

//! Rules mapping seamark tags to the symbols and colors of the chart plotter.

use crate::tags::TagDictionary;
use crate::RecordError;

/// Primary type prefixes converted by default.
pub const DEFAULT_PREFIXES: &[&str] = &["buoy", "beacon", "wreck", "mooring"];

/// Tag key holding the category of cardinal marks.
const CARDINAL_CATEGORY: &str = "seamark:buoy_cardinal:category";

/// Shapes of lateral marks in priority order and their symbols.
const LATERAL_SHAPES: &[(&str, &str)] = &[
    ("can", "buoy_can"),
    ("conical", "buoy_conical"),
    ("spherical", "buoy_round"),
    ("pillar", "pillar"),
];

/// Mark colors and their RGB codes.
const COLORS: &[(&str, &str)] = &[("red", "FF0000"), ("green", "008000"), ("yellow", "FFFF00")];

/// Color code of wrecks.
const WRECK_COLOR: &str = "000000";

/// Allow-list of primary seamark types.
///
/// A type is accepted if it starts with one of the configured prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilter {
    prefixes: Vec<String>,
}

impl TypeFilter {
    pub fn new<I>(prefixes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether `primary_type` is converted.
    pub fn accepts(&self, primary_type: &str) -> bool {
        self.prefixes.iter().any(|p| primary_type.starts_with(p.as_str()))
    }
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIXES.iter().copied())
    }
}

/// Determine the waypoint symbol for `tags` of primary type `primary_type`.
///
/// The first matching rule wins:
/// 1. Special purpose buoys are round.
/// 2. Cardinal marks are named after their category.
/// 3. Lateral marks are named after the first shape found among all tag
///    values.
/// 4. Otherwise, the primary type itself is the symbol.
pub fn classify_symbol(tags: &TagDictionary, primary_type: &str) -> Result<String, RecordError> {
    if primary_type == "buoy_special_purpose" {
        return Ok("buoy_round".to_string());
    }

    if primary_type.contains("cardinal") {
        let category = tags
            .get(CARDINAL_CATEGORY)
            .or_else(|| tags.get(&format!("seamark:{primary_type}:category")))
            .ok_or(RecordError::MissingTag(CARDINAL_CATEGORY))?;
        return Ok(format!("buoy_cardinal_{category}"));
    }

    if matches!(primary_type, "beacon_lateral" | "buoy_lateral") {
        let shape = LATERAL_SHAPES
            .iter()
            .find(|(shape, _)| tags.values().any(|v| v == *shape));
        if let Some((_, symbol)) = shape {
            return Ok(symbol.to_string());
        }
    }

    Ok(primary_type.to_string())
}

/// Determine the fill color code for a waypoint with `symbol`.
///
/// Wrecks are always black. Otherwise, the first tag whose key names a
/// `colour` but not a `light` and whose value is a known color decides.
/// Returns an empty string if no color applies.
pub fn classify_color(tags: &TagDictionary, symbol: &str) -> &'static str {
    if is_wreck(symbol) {
        return WRECK_COLOR;
    }

    tags.iter()
        .filter(|(key, _)| is_mark_colour(key))
        .find_map(|(_, value)| color_code(value))
        .unwrap_or_default()
}

fn is_wreck(symbol: &str) -> bool {
    symbol.starts_with("wreck")
}

/// Keys like `seamark:buoy_lateral:colour` but not `seamark:light:colour`.
fn is_mark_colour(key: &str) -> bool {
    key.contains("colour") && !key.contains("light")
}

fn color_code(name: &str) -> Option<&'static str> {
    COLORS
        .iter()
        .find(|(color, _)| *color == name)
        .map(|(_, code)| *code)
}
