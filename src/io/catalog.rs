//! Imagery catalog boundary.
//!
//! The pipeline never talks to a hosted catalog directly; it issues an
//! `ImageQuery` through the `ImageSource` capability trait and receives a
//! time-ordered series. `InMemoryCatalog` backs tests and local runs.

use chrono::NaiveDate;

use crate::types::{AcquisitionMode, ImageRecord, PipelineError, PipelineResult, Polarization};

/// Declarative imagery filter: acquisition mode, required channel set and
/// date range (half-open, `[start, end)`).
#[derive(Debug, Clone)]
pub struct ImageQuery {
    pub mode: AcquisitionMode,
    pub required_channels: Vec<Polarization>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ImageQuery {
    fn validate(&self) -> PipelineResult<()> {
        if self.start > self.end {
            return Err(PipelineError::Query(format!(
                "imagery date range start {} is after end {}",
                self.start, self.end
            )));
        }
        if self.required_channels.is_empty() {
            return Err(PipelineError::Query(
                "imagery query requires at least one channel".to_string(),
            ));
        }
        Ok(())
    }
}

/// Capability interface over the imagery catalog.
pub trait ImageSource {
    /// Acquisitions matching the query, ordered by acquisition time.
    fn query(&self, query: &ImageQuery) -> PipelineResult<Vec<ImageRecord>>;
}

/// Catalog over a fixed in-memory record set.
pub struct InMemoryCatalog {
    records: Vec<ImageRecord>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<ImageRecord>) -> Self {
        Self { records }
    }
}

impl ImageSource for InMemoryCatalog {
    fn query(&self, query: &ImageQuery) -> PipelineResult<Vec<ImageRecord>> {
        query.validate()?;

        let mut matches: Vec<ImageRecord> = self
            .records
            .iter()
            .filter(|r| r.mode == query.mode)
            .filter(|r| {
                query
                    .required_channels
                    .iter()
                    .all(|&pol| r.has_channel(pol))
            })
            .filter(|r| {
                let date = r.acquired.date_naive();
                date >= query.start && date < query.end
            })
            .cloned()
            .collect();
        matches.sort_by_key(|r| r.acquired);

        log::info!(
            "Catalog query matched {} of {} acquisitions",
            matches.len(),
            self.records.len()
        );
        Ok(matches)
    }
}
