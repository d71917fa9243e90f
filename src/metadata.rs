//! Defines the [`Metadata`], [`Markers`], and [`Error`] types along with the
//! line-oriented parser which pulls a post's tags and description out of its
//! markdown source.
//!
//! A marker is a literal key at the start of a line (leading whitespace is
//! ignored). The value runs from the end of the key to the end of the line.
//! For example, with the default markers:
//!
//! ```md
//! # Hello
//!
//! tags: intro, go
//! desc: Hello world
//! ```

use std::fmt;
use std::fs::File;
use std::path::Path;

/// The metadata extracted from a single post source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    /// The post's tags, trimmed, deduplicated, in source order.
    pub tags: Vec<String>,

    /// The post's description, trimmed.
    pub desc: String,
}

/// The marker keys and tag separator used to parse [`Metadata`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Markers {
    /// The key that introduces the tags line.
    pub tags: String,

    /// The key that introduces the description line.
    pub description: String,

    /// The separator between tags on the tags line.
    pub separator: String,
}

pub const DEFAULT_TAGS_MARKER: &str = "tags:";
pub const DEFAULT_DESCRIPTION_MARKER: &str = "desc:";
pub const DEFAULT_TAG_SEPARATOR: &str = ", ";

impl Default for Markers {
    fn default() -> Self {
        Markers {
            tags: String::from(DEFAULT_TAGS_MARKER),
            description: String::from(DEFAULT_DESCRIPTION_MARKER),
            separator: String::from(DEFAULT_TAG_SEPARATOR),
        }
    }
}

/// The raw result of scanning a source file for markers. Each field is `None`
/// when its marker doesn't appear on any line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scan {
    pub tags: Option<Vec<String>>,
    pub desc: Option<String>,
}

impl Scan {
    /// Converts the scan into [`Metadata`], failing on the first absent
    /// marker.
    pub fn require(self, markers: &Markers) -> Result<Metadata> {
        let tags = self
            .tags
            .ok_or_else(|| Error::MissingMarker(markers.tags.clone()))?;
        let desc = self
            .desc
            .ok_or_else(|| Error::MissingMarker(markers.description.clone()))?;
        Ok(Metadata { tags, desc })
    }

    /// Converts the scan into [`Metadata`], treating absent markers as empty
    /// values.
    pub fn or_empty(self) -> Metadata {
        Metadata {
            tags: self.tags.unwrap_or_default(),
            desc: self.desc.unwrap_or_default(),
        }
    }

    /// Returns the keys of the markers that were not found.
    pub fn missing<'a>(&self, markers: &'a Markers) -> Vec<&'a str> {
        let mut missing = Vec::new();
        if self.tags.is_none() {
            missing.push(markers.tags.as_str());
        }
        if self.desc.is_none() {
            missing.push(markers.description.as_str());
        }
        missing
    }
}

/// Returns the remainder of the first line which starts with `key`, trimmed.
fn find_marker<'a>(input: &'a str, key: &str) -> Option<&'a str> {
    input
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(key))
        .map(str::trim)
}

/// Splits a tags line into its tags. Empty tags are dropped and repeated tags
/// keep only their first occurrence.
fn split_tags(value: &str, separator: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in value.split(separator).map(str::trim) {
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

/// Scans `input` for the tags and description markers.
pub fn scan(input: &str, markers: &Markers) -> Scan {
    Scan {
        tags: find_marker(input, &markers.tags)
            .map(|value| split_tags(value, &markers.separator)),
        desc: find_marker(input, &markers.description).map(str::to_owned),
    }
}

/// Reads the source file at `path` and scans it for markers. The file must be
/// valid UTF-8.
pub fn scan_file(path: &Path, markers: &Markers) -> std::io::Result<Scan> {
    use std::io::Read;
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    Ok(scan(&contents, markers))
}

/// Represents the result of a [`Metadata`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing [`Metadata`] from a post source file.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Returned when no line of the source file starts with the named marker.
    MissingMarker(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingMarker(marker) => {
                write!(f, "missing metadata marker `{}`", marker)
            }
        }
    }
}

impl std::error::Error for Error {}
