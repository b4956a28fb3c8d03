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

//! Flat `key=value` tag dictionaries as exported from OpenStreetMap.

use std::fmt::{self, Display};

/// Tag key holding the primary seamark type.
pub const PRIMARY_TYPE: &str = "seamark:type";
/// Tag key holding the display name of a seamark.
pub const SEAMARK_NAME: &str = "seamark:name";
/// Tag key holding the OSM object ID in Overpass KML exports.
pub const OSM_ID: &str = "@id";

/// Mapping from tag keys to tag values.
///
/// Keys are unique. Iteration yields the tags in the order their keys were
/// first inserted, which determines the rendered description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDictionary {
    tags: Vec<(String, String)>,
}

impl TagDictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the description block of a GPX waypoint.
    ///
    /// Every line has the form `key=value` and is split at the first `=`.
    /// Blank lines are ignored. Lines without `=` are skipped with a warning.
    pub fn from_description(description: &str) -> Self {
        let mut tags = Self::new();
        for line in description.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => tags.insert(key, value),
                None => log::warn!("skipping malformed tag line {line:?}"),
            }
        }
        tags
    }

    /// Pair up parallel sequences of tag keys and tag values.
    ///
    /// Pairs are formed by position. Surplus items of the longer sequence are
    /// dropped.
    pub fn from_parallel<K, V>(keys: K, values: V) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        keys.into_iter().zip(values).collect()
    }

    /// Insert a tag.
    ///
    /// An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.tags.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.tags.push((key, value)),
        }
    }

    /// Look up the value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The primary seamark type, if tagged.
    pub fn primary_type(&self) -> Option<&str> {
        self.get(PRIMARY_TYPE)
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over all values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

/// Renders one `key=value` line per tag.
impl Display for TagDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
