//! End-to-end pipeline: imagery query, temporal compositing, parcel
//! stratification, per-subset sampling and export.
//!
//! The stack is built exactly once and then shared read-only by every
//! subset's sampling pass. Subsets export independently: one failed subset
//! is recorded and the remaining subsets proceed, so a partial run leaves
//! every completed export in place. No retries happen here; recovery is a
//! caller decision, typically re-running with a smaller chunk size or a
//! tighter region/window scope.

use crate::config::PipelineConfig;
use crate::core::composite::CompositeBuilder;
use crate::core::edge_mask::EdgeMasker;
use crate::core::sample::{ExecutionEngine, SamplingPlan};
use crate::core::stratify::{assign_stratum, filter_stratum, partition_by_regions, reference_geometry};
use crate::io::catalog::{ImageQuery, ImageSource};
use crate::io::export::{ExportRequest, ExportSink};
use crate::io::parcels::ParcelSource;
use crate::types::{Parcel, PipelineError, PipelineResult};

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    /// Band names of the composite stack, in export column order
    pub band_names: Vec<String>,
    /// File stems of successfully exported subsets
    pub exported: Vec<String>,
    /// Subsets whose sampling or export failed, with the error
    pub failed: Vec<(String, PipelineError)>,
    /// Parcels dropped for unresolvable geometry, across all subsets
    pub skipped_parcels: usize,
}

/// One configured run of the compositing and sampling pipeline.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute the full run against the given capability implementations.
    pub fn run(
        &self,
        imagery: &dyn ImageSource,
        parcels: &dyn ParcelSource,
        engine: &dyn ExecutionEngine,
        sink: &dyn ExportSink,
    ) -> PipelineResult<RunSummary> {
        let config = &self.config;
        log::info!(
            "Pipeline run: {}..{} step {}d, {} channels, {} regions",
            config.start_date,
            config.end_date,
            config.step_days,
            config.channels.len(),
            config.regions.len()
        );

        let windows =
            crate::core::window::partition_windows(config.start_date, config.end_date, config.step_days)?;

        let series = imagery.query(&ImageQuery {
            mode: config.instrument_mode,
            required_channels: config.channels.clone(),
            start: config.start_date,
            end: config.end_date,
        })?;

        let builder = CompositeBuilder::new(EdgeMasker::new(config.edge_mask.clone()));
        let stack = builder.build(&series, &windows, &config.channels)?;

        let subsets = {
            let envelope = config.regions_envelope().ok_or_else(|| {
                PipelineError::Query("no export regions configured".to_string())
            })?;
            let untagged = parcels.query_bounds(&envelope)?;
            let reference = reference_geometry(&config.mediterranean);
            let tagged: Vec<Parcel> = untagged
                .into_iter()
                .map(|p| assign_stratum(p, &reference, config.stratum_tolerance))
                .collect();
            let retained = match config.stratum_filter {
                Some(stratum) => filter_stratum(tagged, stratum),
                None => tagged,
            };
            log::info!("Retained {} parcels after stratum filtering", retained.len());
            partition_by_regions(&retained, &config.regions)
        };

        let mut summary = RunSummary {
            band_names: stack.band_names(),
            exported: Vec::new(),
            failed: Vec::new(),
            skipped_parcels: 0,
        };

        for (label, members) in subsets {
            let plan = SamplingPlan {
                stack: &stack,
                parcels: &members,
                subset_label: label.clone(),
                pixel_scale_m: config.pixel_scale_m,
                chunk_size: config.chunk_size,
            };
            let file_stem = config.export_name(&label);

            let outcome = engine.sample(&plan).and_then(|table| {
                summary.skipped_parcels += table.skipped.len();
                sink.write_table(
                    &table,
                    &ExportRequest {
                        folder: config.export_folder.clone(),
                        file_stem: file_stem.clone(),
                    },
                )
            });

            match outcome {
                Ok(()) => summary.exported.push(file_stem),
                Err(err) => {
                    log::error!("Subset '{}' failed: {}", label, err);
                    summary.failed.push((label, err));
                }
            }
        }

        log::info!(
            "Run finished: {} exported, {} failed, {} parcels skipped",
            summary.exported.len(),
            summary.failed.len(),
            summary.skipped_parcels
        );
        Ok(summary)
    }
}
