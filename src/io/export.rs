//! Tabular export boundary.
//!
//! One self-describing CSV per parcel subset: composite band columns in
//! stack order followed by the kept survey attributes. The sink trait keeps
//! the pipeline indifferent to where tables land (local folder, bucket,
//! drive).

use std::fs;
use std::path::PathBuf;

use crate::core::sample::SampleTable;
use crate::types::PipelineResult;

/// Destination of one subset's table.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub folder: PathBuf,
    /// File stem without extension; the sink appends its format suffix.
    pub file_stem: String,
}

/// Capability interface over the export destination.
pub trait ExportSink {
    fn write_table(&self, table: &SampleTable, request: &ExportRequest) -> PipelineResult<()>;
}

/// Writes CSV files under a local folder, creating it on first use.
pub struct CsvExportSink;

impl ExportSink for CsvExportSink {
    fn write_table(&self, table: &SampleTable, request: &ExportRequest) -> PipelineResult<()> {
        fs::create_dir_all(&request.folder)?;
        let path = request.folder.join(format!("{}.csv", request.file_stem));
        log::info!(
            "Exporting {} rows x {} bands to {}",
            table.records.len(),
            table.band_names.len(),
            path.display()
        );

        let mut writer = csv::Writer::from_path(&path)?;

        let mut header: Vec<String> = table.band_names.clone();
        header.extend(
            ["POINT_ID", "stratum", "LC1", "LU1"]
                .iter()
                .map(|s| s.to_string()),
        );
        writer.write_record(&header)?;

        for record in &table.records {
            let mut row: Vec<String> = record
                .values
                .iter()
                // No-data cells export empty, matching the masked-pixel
                // convention of the upstream table format
                .map(|v| if v.is_finite() { v.to_string() } else { String::new() })
                .collect();
            row.push(record.point_id.to_string());
            row.push(
                record
                    .stratum
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
            );
            row.push(record.lc1.clone());
            row.push(record.lu1.clone());
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }
}
