//! offrag-ingest
//!
//! Turns a flat corpus directory into one text blob per document. See
//! `loader` for the per-file failure policy and `extract` for the formats.

pub mod extract;
pub mod loader;

pub use extract::DocumentFormat;
pub use loader::{CorpusLoader, IngestReport, IngestionFailure};
