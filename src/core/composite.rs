//! Temporal compositing: fold a masked image time series into one multiband
//! stack of per-window averages.
//!
//! Averaging happens in linear power units. Taking the mean of dB values
//! directly is physically wrong (the logarithm does not commute with the
//! sum), so every record is linearized first and the per-window mean is
//! converted back to dB at the end.

use ndarray::Array2;

use crate::core::edge_mask::EdgeMasker;
use crate::core::radiometry::{linear_to_db, record_to_linear};
use crate::types::{
    Band, GeoTransform, ImageRecord, PipelineError, PipelineResult, Polarization, TimeWindow,
};

/// A single named composite band, in dB.
#[derive(Debug, Clone)]
pub struct CompositeBand {
    pub name: String,
    pub data: Band,
}

/// Ordered multiband raster of all per-window composites. Built once by
/// `CompositeBuilder`, read-only afterwards.
#[derive(Debug, Clone)]
pub struct CompositeStack {
    bands: Vec<CompositeBand>,
    geo: GeoTransform,
    dims: (usize, usize),
}

impl CompositeStack {
    pub fn bands(&self) -> &[CompositeBand] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band_names(&self) -> Vec<String> {
        self.bands.iter().map(|b| b.name.clone()).collect()
    }

    pub fn geo(&self) -> &GeoTransform {
        &self.geo
    }

    pub fn dims(&self) -> (usize, usize) {
        self.dims
    }
}

/// Builds the composite stack from an image series.
pub struct CompositeBuilder {
    masker: EdgeMasker,
}

impl CompositeBuilder {
    pub fn new(masker: EdgeMasker) -> Self {
        Self { masker }
    }

    /// Mask and linearize every record once, then average per window and
    /// channel, restore dB, and concatenate bands in window order with
    /// channel order within each window.
    ///
    /// A window with no contributing acquisitions yields an all-no-data
    /// band, not an error.
    pub fn build(
        &self,
        series: &[ImageRecord],
        windows: &[TimeWindow],
        channels: &[Polarization],
    ) -> PipelineResult<CompositeStack> {
        let (dims, geo) = series_grid(series)?;
        log::info!(
            "Compositing {} acquisitions into {} windows x {} channels on a {}x{} grid",
            series.len(),
            windows.len(),
            channels.len(),
            dims.0,
            dims.1
        );

        // One mask + linearization per acquisition, shared across windows
        let prepared: Vec<ImageRecord> = series
            .iter()
            .map(|record| self.masker.apply(record).map(|m| record_to_linear(&m)))
            .collect::<PipelineResult<_>>()?;

        let mut bands = Vec::with_capacity(windows.len() * channels.len());
        for window in windows {
            for &channel in channels {
                let contributing: Vec<&Band> = prepared
                    .iter()
                    .filter(|r| window.contains(r.acquired))
                    .filter_map(|r| r.band(channel))
                    .collect();
                log::debug!(
                    "Window {} {}: {} contributing acquisitions",
                    window.stamp(),
                    channel,
                    contributing.len()
                );

                let mean = mean_ignoring_nodata(&contributing, dims);
                bands.push(CompositeBand {
                    name: format!("{}_{}", channel, window.stamp()),
                    data: linear_to_db(&mean),
                });
            }
        }

        let stack = CompositeStack { bands, geo, dims };
        check_stack_invariants(&stack, windows.len(), channels.len())?;
        log::info!("Composite stack ready: {} bands", stack.band_count());
        Ok(stack)
    }
}

/// Common grid of the series. Mixed shapes or transforms cannot be averaged
/// per-pixel and are rejected.
fn series_grid(series: &[ImageRecord]) -> PipelineResult<((usize, usize), GeoTransform)> {
    let first = series.first().ok_or_else(|| {
        PipelineError::Processing("cannot composite an empty image series".to_string())
    })?;
    let dims = first.dims();
    for record in series {
        if record.dims() != dims || record.geo != first.geo {
            return Err(PipelineError::Processing(format!(
                "acquisition {} is not on the series grid",
                record.acquired
            )));
        }
    }
    Ok((dims, first.geo.clone()))
}

/// Per-pixel arithmetic mean over finite contributions; pixels with no
/// finite contribution stay no-data.
fn mean_ignoring_nodata(bands: &[&Band], dims: (usize, usize)) -> Band {
    let mut sum = Array2::<f32>::zeros(dims);
    let mut count = Array2::<u32>::zeros(dims);
    for band in bands {
        for (idx, &v) in band.indexed_iter() {
            if v.is_finite() {
                sum[idx] += v;
                count[idx] += 1;
            }
        }
    }
    Array2::from_shape_fn(dims, |idx| {
        if count[idx] > 0 {
            sum[idx] / count[idx] as f32
        } else {
            f32::NAN
        }
    })
}

fn check_stack_invariants(
    stack: &CompositeStack,
    window_count: usize,
    channel_count: usize,
) -> PipelineResult<()> {
    if stack.band_count() != window_count * channel_count {
        return Err(PipelineError::Processing(format!(
            "stack has {} bands, expected {} windows x {} channels",
            stack.band_count(),
            window_count,
            channel_count
        )));
    }
    let names = stack.band_names();
    let mut seen = std::collections::HashSet::new();
    for name in &names {
        if !seen.insert(name) {
            return Err(PipelineError::Processing(format!(
                "duplicate composite band name '{}'",
                name
            )));
        }
    }
    Ok(())
}
