use crate::types::{FlowGraph, SummaryBounds};

/// Maps text to fixed-dimension vectors.
///
/// Implementations must return one vector per input in input order, keep
/// `dim()` constant for their lifetime, and be deterministic for identical
/// input text.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Maps one text window to a short summary.
///
/// Must not fail on input shorter than `bounds.min_length`; such input yields
/// a non-empty string or the caller's "too short" sentinel.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, bounds: SummaryBounds) -> anyhow::Result<String>;
}

/// Turns a flow graph into raster image bytes (PNG).
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, graph: &FlowGraph) -> anyhow::Result<Vec<u8>>;
}

impl<F> Summarizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn summarize(&self, text: &str, _bounds: SummaryBounds) -> anyhow::Result<String> {
        Ok(self(text))
    }
}
