//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the catalog, the in-memory slide store and the callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SlideError};

/// One image + description pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideRecord {
    /// Path or URI of the slide image
    pub image_path: String,
    /// Text shown under the image
    pub description: String,
}

impl SlideRecord {
    pub fn new(image_path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            description: description.into(),
        }
    }

    /// Build a record from caller-supplied fields.
    ///
    /// Both fields are required and must be non-empty; the first missing
    /// one is reported by its wire name.
    pub fn from_fields(image_path: Option<&str>, description: Option<&str>) -> Result<Self> {
        let image_path = required("imagePath", image_path)?;
        let description = required("description", description)?;
        Ok(Self::new(image_path, description))
    }
}

/// Return `value` if it is present and non-empty.
pub(crate) fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SlideError::missing(field)),
    }
}

/// Catalog-assigned slide identifier
///
/// Travels as a decimal string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlideId(i64);

impl SlideId {
    pub fn new(raw: i64) -> Self {
        SlideId(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlideId {
    type Err = SlideError;

    /// An identifier that is not a number can never name a stored slide,
    /// so it parses to `NotFound` rather than a parse error.
    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(SlideId)
            .map_err(|_| SlideError::NotFound(s.to_string()))
    }
}

impl Serialize for SlideId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlideId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A slide as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// Unique catalog ID
    pub id: SlideId,
    #[serde(flatten)]
    pub record: SlideRecord,
}

/// Like/dislike counters for one slide
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Reactions {
    pub likes: u32,
    pub dislikes: u32,
}
