//! s1-composites: Sentinel-1 temporal composites and parcel sampling
//!
//! This library turns a Sentinel-1 backscatter time series into fixed-length,
//! date-stamped feature vectors for land-parcel polygons: edge-masked
//! acquisitions are averaged in linear power per fixed-width time window,
//! the per-window composites are stacked into one multiband raster, and the
//! stack is sampled at each parcel's location into per-region CSV tables for
//! a downstream land-cover classifier.

pub mod config;
pub mod core;
pub mod io;
pub mod pipeline;
pub mod types;

// Re-export main types and functions for easier access
pub use crate::core::{
    partition_windows, CompositeBuilder, CompositeStack, EdgeMaskParams, EdgeMasker,
    ExecutionEngine, LocalEngine, SampleRecord, SampleTable, SamplingPlan,
};
pub use config::{PipelineConfig, RegionRect};
pub use io::{CsvExportSink, ExportSink, ImageQuery, ImageSource, ParcelSource};
pub use pipeline::{Pipeline, RunSummary};
pub use types::{
    AcquisitionMode, Band, BoundingBox, GeoTransform, ImageRecord, Parcel, PipelineError,
    PipelineResult, Polarization, TimeWindow,
};
