//! Common types shared by the matcher, selector and navigation loop

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A point in absolute screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl TryFrom<Vec<f64>> for Point {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y] => Ok(Point::new(x.round() as i32, y.round() as i32)),
            other => Err(format!(
                "expected a point [x, y], got {} values",
                other.len()
            )),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A rectangle in absolute screen coordinates, as produced by calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Absolute screen point of the top-left corner of a box that is
    /// relative to this region.
    pub fn offset(&self, bbox: &BBox) -> Point {
        Point::new(self.x + bbox.x, self.y + bbox.y)
    }
}

impl TryFrom<Vec<f64>> for Region {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y, w, h] => {
                if *w < 1.0 || *h < 1.0 {
                    return Err(format!(
                        "region width and height must be positive, got {w}x{h}"
                    ));
                }
                Ok(Region::new(
                    x.round() as i32,
                    y.round() as i32,
                    w.round() as u32,
                    h.round() as u32,
                ))
            }
            other => Err(format!(
                "expected a region [x, y, width, height], got {} values",
                other.len()
            )),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// A bounding box relative to the region it was recognized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One piece of recognized text together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedWord {
    pub text: String,
    pub bbox: BBox,
}

impl RecognizedWord {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Outcome of resolving noisy text against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched {
        name: String,
        index: usize,
        confidence: f64,
    },
    Unmatched,
}

impl Resolution {
    pub fn index(&self) -> Option<usize> {
        match self {
            Resolution::Matched { index, .. } => Some(*index),
            Resolution::Unmatched => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Resolution::Matched { name, .. } => Some(name),
            Resolution::Unmatched => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Resolution::Matched { confidence, .. } => *confidence,
            Resolution::Unmatched => 0.0,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Resolution::Matched { .. })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Matched {
                name,
                index,
                confidence,
            } => write!(f, "{name} #{index} ({confidence:.3})"),
            Resolution::Unmatched => write!(f, "<unmatched>"),
        }
    }
}

/// The collector expects a `[name, index]` pair with `["", -1]` for no match.
impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        match self {
            Resolution::Matched { name, index, .. } => {
                pair.serialize_element(name)?;
                pair.serialize_element(&(*index as i64))?;
            }
            Resolution::Unmatched => {
                pair.serialize_element("")?;
                pair.serialize_element(&-1i64)?;
            }
        }
        pair.end()
    }
}

/// A recognized overview entry that may be clicked to navigate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub resolution: Resolution,
    pub bbox: BBox,
}

impl Candidate {
    pub fn new(resolution: Resolution, bbox: BBox) -> Self {
        Self { resolution, bbox }
    }
}
