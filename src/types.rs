use chrono::{DateTime, NaiveDate, Utc};
use geo::{coord, MultiPolygon, Rect};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Real-valued backscatter raster (row x col); NaN marks no-data
pub type Band = Array2<f32>;

/// Polarization channels for Sentinel-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::VV => write!(f, "VV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::HH => write!(f, "HH"),
        }
    }
}

/// Sentinel-1 acquisition mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionMode {
    IW, // Interferometric Wide swath
    EW, // Extra Wide swath
    SM, // StripMap
    WV, // Wave
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with the given origin and pixel size.
    /// `pixel_height` is stored negative, rows grow southward.
    pub fn north_up(top_left_x: f64, top_left_y: f64, pixel_size: f64) -> Self {
        Self {
            top_left_x,
            pixel_width: pixel_size,
            rotation_x: 0.0,
            top_left_y,
            rotation_y: 0.0,
            pixel_height: -pixel_size,
        }
    }

    /// Map a world coordinate to a (row, col) raster index, or None if the
    /// point falls outside a raster of the given dimensions.
    pub fn index_of(&self, x: f64, y: f64, dims: (usize, usize)) -> Option<(usize, usize)> {
        let col = (x - self.top_left_x) / self.pixel_width;
        let row = (y - self.top_left_y) / self.pixel_height;
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        if row < dims.0 && col < dims.1 {
            Some((row, col))
        } else {
            None
        }
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// Smallest box covering both inputs.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_lon, y: self.min_lat },
            coord! { x: self.max_lon, y: self.max_lat },
        )
    }
}

/// Half-open time window [start, end) over acquisition dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let date = instant.date_naive();
        date >= self.start && date < self.end
    }

    /// Window-start date stamp used for composite band naming (YYYYMMDD).
    pub fn stamp(&self) -> String {
        self.start.format("%Y%m%d").to_string()
    }
}

/// One sensor acquisition: per-polarization backscatter bands on a shared grid.
///
/// Bands arrive in dB as delivered by the catalog; conversion to linear power
/// happens inside the compositing step. The polarization list preserves the
/// catalog band order; the first entry is the reference channel for edge
/// masking.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub acquired: DateTime<Utc>,
    pub mode: AcquisitionMode,
    pub polarizations: Vec<Polarization>,
    pub bands: HashMap<Polarization, Band>,
    pub geo: GeoTransform,
}

impl ImageRecord {
    pub fn band(&self, pol: Polarization) -> Option<&Band> {
        self.bands.get(&pol)
    }

    pub fn has_channel(&self, pol: Polarization) -> bool {
        self.bands.contains_key(&pol)
    }

    /// (rows, cols) of the record's grid; all bands share it.
    pub fn dims(&self) -> (usize, usize) {
        self.polarizations
            .first()
            .and_then(|p| self.bands.get(p))
            .map(|b| b.dim())
            .unwrap_or((0, 0))
    }
}

/// A land parcel polygon with its survey attributes.
///
/// `stratum` is derived, not sourced: parcels arrive untagged and are
/// assigned 1 or 2 by intersection against the Mediterranean reference
/// geometry (see `core::stratify`).
#[derive(Debug, Clone)]
pub struct Parcel {
    pub point_id: i64,
    pub lc1: String,
    pub lu1: String,
    pub stratum: Option<u8>,
    pub geometry: MultiPolygon<f64>,
}

/// Error types for the compositing and sampling pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Malformed filter, date range or bounds handed to an external source.
    /// Fatal, never retried.
    #[error("Invalid query: {0}")]
    Query(String),

    /// A parcel with unresolvable or empty geometry. Surfaced per record,
    /// the pipeline continues for other records.
    #[error("Parcel {point_id}: {reason}")]
    Content { point_id: i64, reason: String },

    /// The execution engine failed mid-evaluation. Fatal for the subset,
    /// with enough context for the caller to retry at a smaller scope.
    #[error("Compute failed for subset '{subset}' ({band_count} bands, {parcel_count} parcels): {reason}")]
    Compute {
        subset: String,
        band_count: usize,
        parcel_count: usize,
        reason: String,
    },

    /// Internal invariant violation (mismatched grids, duplicate band names)
    #[error("Processing error: {0}")]
    Processing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
