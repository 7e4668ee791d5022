//! I/O boundaries: imagery catalog, parcel collection, export sink

pub mod catalog;
pub mod export;
pub mod parcels;

pub use catalog::{ImageQuery, ImageSource, InMemoryCatalog};
pub use export::{CsvExportSink, ExportRequest, ExportSink};
pub use parcels::{InMemoryParcelSource, ParcelSource};
