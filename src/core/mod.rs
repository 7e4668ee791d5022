//! Core compositing and sampling modules

pub mod composite;
pub mod edge_mask;
pub mod radiometry;
pub mod sample;
pub mod stratify;
pub mod window;

// Re-export main types
pub use composite::{CompositeBand, CompositeBuilder, CompositeStack};
pub use edge_mask::{EdgeMaskParams, EdgeMasker};
pub use radiometry::{db_to_linear, linear_to_db, record_to_linear};
pub use sample::{ExecutionEngine, LocalEngine, SampleRecord, SampleTable, SamplingPlan};
pub use stratify::{
    assign_stratum, filter_stratum, partition_by_regions, reference_geometry,
    STRATUM_MEDITERRANEAN, STRATUM_NORTHERN,
};
pub use window::partition_windows;
