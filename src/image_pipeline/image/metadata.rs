use std::collections::BTreeMap;
use std::fmt;

use crate::image_pipeline::image::GeoTransform;

/// Free-form key/value tags attached to a dataset or to a single band.
pub type Tags = BTreeMap<String, String>;

/// Ground control point: a pixel/line position tied to a world coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Gcp {
    pub id: String,
    pub info: String,
    /// Column position in the raster (fractional pixels)
    pub pixel: f64,
    /// Row position in the raster (fractional pixels)
    pub line: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Gcp {
    pub fn new(pixel: f64, line: f64, x: f64, y: f64, z: f64) -> Self {
        Self {
            id: String::new(),
            info: String::new(),
            pixel,
            line,
            x,
            y,
            z,
        }
    }
}

/// Georeferencing and tags carried alongside the pixel data.
///
/// Georeferencing is held in two schemes at once, the affine one
/// (`geotransform` + `projection_ref`) and the GCP one (`gcps` +
/// `gcp_projection`). Which one is authoritative is only decided when the
/// image is saved: the scheme with the longer projection string wins, ties
/// going to the affine scheme.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub geotransform: GeoTransform,
    pub projection_ref: String,
    pub gcps: Vec<Gcp>,
    pub gcp_projection: String,
    pub meta: Tags,
    /// One entry per band, in band order.
    pub band_meta: Vec<Tags>,
}

/// Georeferencing scheme selected for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Georeferencing {
    Affine,
    Gcp,
}

impl Metadata {
    pub fn with_geotransform(mut self, geotransform: GeoTransform, projection_ref: impl Into<String>) -> Self {
        self.geotransform = geotransform;
        self.projection_ref = projection_ref.into();
        self
    }

    pub fn with_gcps(mut self, gcps: Vec<Gcp>, gcp_projection: impl Into<String>) -> Self {
        self.gcps = gcps;
        self.gcp_projection = gcp_projection.into();
        self
    }

    pub fn authoritative_georeferencing(&self) -> Georeferencing {
        if self.projection_ref.len() >= self.gcp_projection.len() {
            Georeferencing::Affine
        } else {
            Georeferencing::Gcp
        }
    }
}

fn write_tags(f: &mut fmt::Formatter<'_>, tags: &Tags) -> fmt::Result {
    f.write_str("{")?;
    for (i, (key, value)) in tags.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "'{}': '{}'", key, value)?;
    }
    f.write_str("}")
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{'geotransform': {}, 'projection_ref': '{}', 'gcps': [",
            self.geotransform, self.projection_ref
        )?;
        for (i, gcp) in self.gcps.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "({}, {}) -> ({}, {}, {})",
                gcp.pixel, gcp.line, gcp.x, gcp.y, gcp.z
            )?;
        }
        write!(f, "], 'gcp_projection': '{}', 'meta': ", self.gcp_projection)?;
        write_tags(f, &self.meta)?;
        f.write_str(", 'band_meta': [")?;
        for (i, tags) in self.band_meta.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_tags(f, tags)?;
        }
        f.write_str("]}")
    }
}
