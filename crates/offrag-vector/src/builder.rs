use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use offrag_core::error::{Error, ModelStage, Result};
use offrag_core::traits::Embedder;
use offrag_core::types::Chunk;

use crate::index::FlatL2Index;

/// Embeds chunks in batches and loads the vectors into a [`FlatL2Index`].
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    show_progress: bool,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self { embedder, batch_size: batch_size.max(1), show_progress: false }
    }

    pub fn with_progress(mut self, show: bool) -> Self { self.show_progress = show; self }

    /// Vector `i` of the result is the embedding of `chunks[i]`.
    pub fn build(&self, chunks: &[Chunk]) -> Result<FlatL2Index> {
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus { files: 0, failures: 0 });
        }
        let dim = self.embedder.dim();
        let mut index = FlatL2Index::new(dim);
        let pb = self.progress_bar(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).map_err(|e| Error::model(ModelStage::Embedding, format!("{e:#}")))?;
            if vectors.len() != texts.len() {
                return Err(Error::EmbeddingCountMismatch { expected: texts.len(), actual: vectors.len() });
            }
            for v in &vectors { index.add(v)?; }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        tracing::info!(chunks = index.len(), dim, "vector index built");
        Ok(index)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress { return ProgressBar::hidden(); }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)") {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
