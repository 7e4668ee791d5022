//! Run configuration for the compositing and sampling pipeline.
//!
//! Everything here is configuration, not core logic: date range, compositing
//! step, pixel scale, channel list, region rectangles, stratum filter,
//! export naming and the execution-engine chunking hint. The defaults
//! reproduce the 2018 Jan-Jul EU run over the LUCAS Copernicus polygons.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::edge_mask::EdgeMaskParams;
use crate::types::{AcquisitionMode, BoundingBox, Polarization};

/// A labelled export rectangle (analysis stratum partition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRect {
    pub label: String,
    pub bounds: BoundingBox,
}

impl RegionRect {
    pub fn new(label: &str, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            label: label.to_string(),
            bounds: BoundingBox::new(min_lon, min_lat, max_lon, max_lat),
        }
    }
}

/// Full configuration surface of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Inclusive start of the imagery date range
    pub start_date: NaiveDate,
    /// Exclusive end of the imagery date range
    pub end_date: NaiveDate,
    /// Compositing step in days
    pub step_days: i64,
    /// Pixel spacing for zonal sampling, metres
    pub pixel_scale_m: u32,
    /// Polarization channels to composite, in band order
    pub channels: Vec<Polarization>,
    /// Acquisition mode filter for the imagery query
    pub instrument_mode: AcquisitionMode,
    /// Export rectangles; a parcel joins every rectangle it intersects
    pub regions: Vec<RegionRect>,
    /// Mediterranean reference rectangles used for stratum assignment
    pub mediterranean: Vec<BoundingBox>,
    /// Keep only parcels with this stratum, if set
    pub stratum_filter: Option<u8>,
    /// Distance tolerance for the stratum intersection test, in coordinate
    /// units. Absorbs coordinate precision noise at rectangle boundaries.
    pub stratum_tolerance: f64,
    /// Destination folder for exported tables
    pub export_folder: PathBuf,
    /// Leading component of exported file names
    pub export_prefix: String,
    /// Parcels per evaluation chunk. A resource-exhaustion tunable for the
    /// execution engine, not a correctness property.
    pub chunk_size: usize,
    /// Edge-mask parameters
    pub edge_mask: EdgeMaskParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2018, 7, 31).unwrap(),
            step_days: 10,
            pixel_scale_m: 10,
            channels: vec![Polarization::VV, Polarization::VH],
            instrument_mode: AcquisitionMode::IW,
            regions: northern_eu_regions(),
            mediterranean: mediterranean_rects(),
            stratum_filter: Some(1),
            stratum_tolerance: 1e-5,
            export_folder: PathBuf::from("EU_reprod"),
            export_prefix: "S1_point_all".to_string(),
            chunk_size: 512,
            edge_mask: EdgeMaskParams::default(),
        }
    }
}

impl PipelineConfig {
    /// File stem for one subset's export, encoding feature type, cadence,
    /// resolution, date range and subset label, e.g.
    /// `S1_point_all_10d_10m_20180101-20180731_EU_NW1`.
    pub fn export_name(&self, region_label: &str) -> String {
        format!(
            "{}_{}d_{}m_{}-{}_{}",
            self.export_prefix,
            self.step_days,
            self.pixel_scale_m,
            self.start_date.format("%Y%m%d"),
            self.end_date.format("%Y%m%d"),
            region_label,
        )
    }

    /// Envelope of all export rectangles; the parcel source is queried once
    /// over this box.
    pub fn regions_envelope(&self) -> Option<BoundingBox> {
        let mut rects = self.regions.iter().map(|r| r.bounds);
        let first = rects.next()?;
        Some(rects.fold(first, |acc, b| acc.union(&b)))
    }
}

/// Northern EU export rectangles (strata 1), as drawn in the source survey
/// reproduction. Disjoint by construction.
pub fn northern_eu_regions() -> Vec<RegionRect> {
    vec![
        RegionRect::new("EU_NW1", -13.69, 48.00, 0.00, 70.1),
        RegionRect::new("EU_NW2a", 0.00, 48.00, 13.00, 50.0),
        RegionRect::new("EU_NW2b", 0.00, 50.00, 13.00, 70.1),
        RegionRect::new("EU_NE1a", 13.00, 48.00, 23.50, 51.0),
        RegionRect::new("EU_NE1b", 13.00, 51.00, 23.50, 56.0),
        RegionRect::new("EU_NE1c", 13.00, 56.00, 23.50, 60.0),
        RegionRect::new("EU_NE1d", 13.00, 60.00, 23.50, 70.1),
        RegionRect::new("EU_NE2", 23.50, 48.00, 34.70, 70.1),
    ]
}

/// Mediterranean rectangles (strata 2). Used only as the stratum reference
/// geometry; nothing is exported from them.
pub fn mediterranean_rects() -> Vec<BoundingBox> {
    vec![
        BoundingBox::new(-13.69, 32.63, 0.00, 48.0),
        BoundingBox::new(0.00, 35.50, 13.00, 48.0),
        BoundingBox::new(13.00, 32.63, 23.50, 48.0),
        BoundingBox::new(23.50, 32.63, 34.70, 48.0),
    ]
}
